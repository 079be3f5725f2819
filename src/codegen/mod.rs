//! Code generation module for ktj declarations
//!
//! This module turns reviewed declarations into JVM class files: one
//! [`ClassFile`] per declaration, nested ones included.

pub mod attribute;
pub mod class;
pub mod class_writer;
pub mod code;
pub mod constpool;
pub mod defs;
pub mod descriptor;
mod enums;
pub mod error;
pub mod field;
pub mod flag;
pub mod gen;
pub mod method;
pub mod opcodes;
mod record;
pub mod signature;
pub mod slots;
pub mod types;
pub mod writer;

// Re-export commonly used types
pub use class::*;
pub use class_writer::ClassWriter;
pub use constpool::{Constant, ConstantPool};
pub use error::{BytecodeError, ConstPoolError};
pub use method::*;
pub use writer::*;

use indexmap::IndexMap;

use crate::ast::Declaration;
use crate::config::Config;
use crate::error::Result;

/// Generate the class file for one declaration of a reviewed file.
pub fn generate(decl: &Declaration, decls: &IndexMap<String, Declaration>, config: &Config) -> Result<ClassFile> {
    log::debug!("generate {} {}", decl.kind_name(), decl.info().internal_name);
    ClassWriter::new(decl, decls, config).generate()
}
