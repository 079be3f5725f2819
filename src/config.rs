//! Compiler configuration

use crate::codegen::defs::major_versions;
use crate::consts::JAVA_LANG_OBJECT;

/// Settings shared by every unit generated in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Class file major version written into every unit
    pub major_version: u16,
    /// Emit the SourceFile attribute
    pub debug: bool,
    /// Emit Signature attributes for generic declarations
    pub emit_signatures: bool,
    /// Internal name used when a class declares no superclass
    pub default_superclass: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // 49 loads with the inference verifier, so no StackMapTable is needed
            major_version: major_versions::JAVA_5_0,
            debug: false,
            emit_signatures: true,
            default_superclass: JAVA_LANG_OBJECT.to_string(),
        }
    }
}

impl Config {
    pub fn with_major_version(mut self, major_version: u16) -> Self {
        self.major_version = major_version;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_signatures(mut self, emit: bool) -> Self {
        self.emit_signatures = emit;
        self
    }

    pub fn with_default_superclass(mut self, internal_name: impl Into<String>) -> Self {
        self.default_superclass = internal_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::default().with_debug(true).with_major_version(50);
        assert!(config.debug);
        assert_eq!(config.major_version, 50);
        assert_eq!(config.default_superclass, "java/lang/Object");
    }
}
