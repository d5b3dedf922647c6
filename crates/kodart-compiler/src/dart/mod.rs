//! Target language model
//!
//! - `identifier` - Simple names with private/generated facets
//! - `ast` - Concrete syntax tree of the emitted language
//! - `operators` - Closed operator tables with fixed tokens

pub mod ast;
pub mod identifier;
pub mod operators;

pub use ast::*;
pub use identifier::DartSimpleIdentifier;
pub use operators::{DartBinaryOperator, DartPostfixOperator, DartPrefixOperator, DartUnaryOperator};
