use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for ktjc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Where a declaration or failure originates: source path plus 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: usize,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self { path: path.into(), line }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Error types for the ktj compiler
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Lexical { message: String },

    #[error("{message}")]
    Parse { message: String },

    #[error("redefinition of {kind} '{name}'")]
    Redefinition { kind: &'static str, name: String },

    #[error("illegal modifier '{flag}' on {construct}")]
    IllegalModifier { flag: String, construct: &'static str },

    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("class '{name}' is not accessible here")]
    InaccessibleClass { name: String },

    #[error("invalid static use of '{name}'")]
    InvalidStaticUse { name: String },

    #[error("type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error(transparent)]
    Review(#[from] crate::review::ReviewError),

    #[error("{message}")]
    CodeGen { message: String },

    #[error(transparent)]
    ConstPool(#[from] crate::codegen::error::ConstPoolError),

    #[error(transparent)]
    Bytecode(#[from] crate::codegen::error::BytecodeError),

    #[error("class file verification failed for '{class}': {message}")]
    Verify { class: String, message: String },

    #[error("{source} at {location}")]
    Located {
        #[source]
        source: Box<Error>,
        location: SourceLocation,
    },
}

impl Error {
    pub fn lexical(message: impl Into<String>) -> Self {
        Self::Lexical { message: message.into() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse { message: message.into() }
    }

    pub fn codegen(message: impl Into<String>) -> Self {
        Self::CodeGen { message: message.into() }
    }

    pub fn redefinition(kind: &'static str, name: impl Into<String>) -> Self {
        Self::Redefinition { kind, name: name.into() }
    }

    pub fn unknown_type(name: impl Into<String>) -> Self {
        Self::UnknownType { name: name.into() }
    }

    pub fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch { expected: expected.into(), found: found.into() }
    }

    /// Attach a source location unless one is already attached.
    pub fn at(self, location: SourceLocation) -> Self {
        if self.is_located() {
            self
        } else {
            Self::Located { source: Box::new(self), location }
        }
    }

    pub fn is_located(&self) -> bool {
        matches!(self, Self::Located { .. })
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Located { location, .. } => Some(location),
            _ => None,
        }
    }

    /// The failure without its location wrapper.
    pub fn kind(&self) -> &Error {
        match self {
            Self::Located { source, .. } => source.kind(),
            other => other,
        }
    }
}

/// Attach a location to the error side of a result.
pub trait ResultExt<T> {
    fn at(self, location: impl FnOnce() -> SourceLocation) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn at(self, location: impl FnOnce() -> SourceLocation) -> Result<T> {
        self.map_err(|e| if e.is_located() { e } else { e.at(location()) })
    }
}
