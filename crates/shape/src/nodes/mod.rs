//! Leaf type nodes and their factories.

pub mod leaf;

pub use leaf::{
    AnyNode, Anything, Boolean, BooleanNode, Integer, IntegerNode, Leaf, Number, NumberNode,
    Primitive, StringNode, Text, any_value, boolean, integer, number, string,
};
