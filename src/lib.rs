//! ktj Language Compiler (ktjc)
//!
//! Compiles `.ktj` source files to JVM class files.
//!
//! ## Architecture
//!
//! - **parser**: line tokenizer, declaration parser and method-body parser
//! - **ast**: declaration model plus the expression/statement tree
//! - **review**: type-name resolution and declaration-level checks
//! - **codegen**: class file structures and body lowering
//! - **verify**: structural checks on every generated class
//! - **session**: one compilation, from source text to an artifact sink
//! - **bin**: command-line driver
//!
//! ## Compilation Flow
//!
//! ```text
//! ktj source → Parser → Declarations → Review → Codegen → Verify → ArtifactSink
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod consts;
pub mod error;
pub mod parser;
pub mod review;
pub mod session;
pub mod verify;

pub use config::Config;
pub use error::{Error, Result};
pub use session::{ArtifactSink, ClassUnit, MemorySink, Session};

use std::path::Path;

/// Compile one source file in memory and return its class units.
pub fn compile(path: &Path, source: &str, config: &Config) -> Result<Vec<ClassUnit>> {
    let mut session = Session::new(config.clone());
    let mut sink = MemorySink::new();
    session.compile_into(path, source, &mut sink)?;
    Ok(sink.units)
}
