//! Per-compilation session
//!
//! A [`Session`] owns the declaration map of one source file and the class
//! units generated from it. Units reach an [`ArtifactSink`] only after every
//! declaration was generated and verified.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::ast::Declaration;
use crate::codegen::{self, ClassFile, ClassfileWritable};
use crate::config::Config;
use crate::error::{Error, Result, ResultExt};
use crate::parser;
use crate::review;
use crate::verify;

/// One generated class: its internal name, serialized bytes and the
/// structure the bytes were written from.
#[derive(Debug, Clone)]
pub struct ClassUnit {
    pub internal_name: String,
    pub bytes: Vec<u8>,
    pub class_file: ClassFile,
}

impl ClassUnit {
    fn new(internal_name: String, class_file: ClassFile) -> Self {
        let bytes = class_file.to_classfile_bytes();
        Self { internal_name, bytes, class_file }
    }

    /// Relative output path, `<internal name>.class`.
    pub fn file_name(&self) -> PathBuf {
        PathBuf::from(format!("{}.class", self.internal_name))
    }
}

/// Destination for finished class units.
pub trait ArtifactSink {
    fn accept(&mut self, unit: ClassUnit) -> Result<()>;
}

/// Keeps every accepted unit in memory, in acceptance order.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub units: Vec<ClassUnit>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, internal_name: &str) -> Option<&ClassUnit> {
        self.units.iter().find(|u| u.internal_name == internal_name)
    }
}

impl ArtifactSink for MemorySink {
    fn accept(&mut self, unit: ClassUnit) -> Result<()> {
        self.units.push(unit);
        Ok(())
    }
}

/// Writes `<internal name>.class` below a root directory, creating package
/// directories as needed.
#[derive(Debug)]
pub struct DirectorySink {
    root: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), written: Vec::new() }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ArtifactSink for DirectorySink {
    fn accept(&mut self, unit: ClassUnit) -> Result<()> {
        let path = self.root.join(unit.file_name());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &unit.bytes)?;
        log::info!("wrote {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

/// Compilation state for one source file.
#[derive(Debug)]
pub struct Session {
    config: Config,
    decls: IndexMap<String, Declaration>,
    units: Vec<ClassUnit>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self { config, decls: IndexMap::new(), units: Vec::new() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Declarations of the last successful compilation, keyed by qualified name.
    pub fn declarations(&self) -> &IndexMap<String, Declaration> {
        &self.decls
    }

    /// Units waiting to be handed to a sink.
    pub fn units(&self) -> &[ClassUnit] {
        &self.units
    }

    /// Parse, review, generate and verify every declaration of one file.
    ///
    /// `path` is relative to the source root. On failure the session keeps
    /// nothing from this file.
    pub fn compile_source(&mut self, path: &Path, text: &str) -> Result<&[ClassUnit]> {
        self.decls.clear();
        self.units.clear();

        log::info!("compiling {}", path.display());
        let parsed = parser::parse_file(path, text)?;
        let mut decls: IndexMap<String, Declaration> = IndexMap::with_capacity(parsed.declarations.len());
        for decl in parsed.declarations {
            let key = decl.info().qualified.clone();
            if decls.contains_key(&key) {
                let location = decl.info().location();
                return Err(Error::redefinition("declaration", decl.name()).at(location));
            }
            decls.insert(key, decl);
        }
        log::debug!("parsed {}: declarations={}", path.display(), decls.len());

        review::review(&mut decls)?;

        let mut units = Vec::with_capacity(decls.len());
        for decl in decls.values() {
            let class_file = codegen::generate(decl, &decls, &self.config)?;
            verify::verify(&class_file).at(|| decl.info().location())?;
            units.push(ClassUnit::new(decl.info().internal_name.clone(), class_file));
        }
        log::info!("generated {} class(es) from {}", units.len(), path.display());

        self.decls = decls;
        self.units = units;
        Ok(&self.units)
    }

    /// Hand every pending unit to `sink`, in discovery order.
    pub fn emit(&mut self, sink: &mut dyn ArtifactSink) -> Result<usize> {
        let count = self.units.len();
        for unit in self.units.drain(..) {
            log::debug!("emit {}", unit.internal_name);
            sink.accept(unit)?;
        }
        Ok(count)
    }

    /// [`compile_source`](Self::compile_source) followed by [`emit`](Self::emit).
    pub fn compile_into(&mut self, path: &Path, text: &str, sink: &mut dyn ArtifactSink) -> Result<usize> {
        self.compile_source(path, text)?;
        self.emit(sink)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::defs::MAGIC;

    #[test]
    fn units_follow_discovery_order() {
        let src = "type Kind = A | B\npublic class Box {\n    Kind kind\n}\n";
        let mut session = Session::default();
        let names: Vec<_> = session
            .compile_source(Path::new("geo/Shapes.ktj"), src)
            .unwrap()
            .iter()
            .map(|u| u.internal_name.clone())
            .collect();
        assert_eq!(names, vec!["geo/Shapes/Kind", "geo/Shapes/Box"]);
        assert_eq!(session.declarations().len(), 2);
    }

    #[test]
    fn bytes_start_with_magic_and_version() {
        let mut session = Session::new(Config::default().with_major_version(50));
        let units = session.compile_source(Path::new("Hello.ktj"), "class Hello {\n}\n").unwrap();
        let bytes = &units[0].bytes;
        assert_eq!(&bytes[..4], &MAGIC.to_be_bytes());
        assert_eq!(&bytes[6..8], &50u16.to_be_bytes());
        assert_eq!(units[0].file_name(), PathBuf::from("Hello.class"));
    }

    #[test]
    fn failure_leaves_sink_untouched() {
        let src = "class A {\n}\nclass B {\n    int f() {\n        return true\n    }\n}\n";
        let mut session = Session::default();
        let mut sink = MemorySink::new();
        assert!(session.compile_into(Path::new("p/Two.ktj"), src, &mut sink).is_err());
        assert!(sink.units.is_empty());
        assert!(session.units().is_empty());
    }

    #[test]
    fn verifier_failures_carry_the_declaration_location() {
        let mut session = Session::new(Config::default().with_major_version(61));
        let err = session.compile_source(Path::new("p/A.ktj"), "\nclass A {\n}\n").unwrap_err();
        assert!(matches!(err.kind(), Error::Verify { .. }), "{}", err);
        assert!(err.to_string().ends_with("at p/A.ktj:2"), "{}", err);
    }

    #[test]
    fn emit_drains_pending_units() {
        let mut session = Session::default();
        let mut sink = MemorySink::new();
        let count = session.compile_into(Path::new("p/A.ktj"), "class A {\n}\n", &mut sink).unwrap();
        assert_eq!(count, 1);
        assert!(session.units().is_empty());
        assert!(sink.get("p/A").is_some());
    }

    #[test]
    fn directory_sink_creates_package_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(dir.path());
        let mut session = Session::default();
        session.compile_into(Path::new("p/q/A.ktj"), "class A {\n}\n", &mut sink).unwrap();
        let path = dir.path().join("p/q/A.class");
        assert_eq!(sink.written(), &[path.clone()]);
        let bytes = fs::read(path).unwrap();
        assert_eq!(&bytes[..4], &MAGIC.to_be_bytes());
    }
}
