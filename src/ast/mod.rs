//! Declaration model and method-body syntax tree for ktj sources

pub mod decl;
pub mod modifier;
pub mod nodes;
mod printer;

pub use decl::*;
pub use modifier::{AccessLevel, Construct, Flag, Modifier};
pub use nodes::*;
pub use printer::DeclPrinter;
