//! Class-file verification
//!
//! Structural checks over every generated [`ClassFile`] before it is handed
//! to an artifact sink: pool indexes and size, access flag combinations,
//! Code attribute presence, decodable bytecode and return opcodes.

pub mod class_access_flags;
pub mod constant_pool;
pub mod fields;
pub mod method_access_flags;
pub mod methods;
mod verifier;

pub use verifier::{verify_class_file, VerifyError, VerifyResult};

use crate::codegen::class::ClassFile;
use crate::error::{Error, Result};

/// Verify a generated class, reporting failures against its internal name.
pub fn verify(class_file: &ClassFile) -> Result<()> {
    verify_class_file(class_file).map_err(|e| Error::Verify {
        class: class_file.this_class_name().unwrap_or("<unknown>").to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser::parse_file;
    use indexmap::IndexMap;
    use std::path::Path;

    fn generate_all(src: &str) -> Vec<ClassFile> {
        let mut decls: IndexMap<_, _> = parse_file(Path::new("p/V.ktj"), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect();
        crate::review::review(&mut decls).unwrap();
        decls.values().map(|d| crate::codegen::generate(d, &decls, &Config::default()).unwrap()).collect()
    }

    #[test]
    fn generated_classes_verify() {
        let src = "\
class V {
    int x = 1
    static int twice(int a) {
        return a * 2
    }
}
type Color = RED | GREEN
data Point = [int x, long y]
interface Shape {
    double area()
}
";
        let classes = generate_all(src);
        assert_eq!(classes.len(), 4);
        for class in &classes {
            verify(class).unwrap();
        }
    }

    #[test]
    fn failure_names_the_class() {
        let mut class = generate_all("class V {\n}\n").remove(0);
        class.major_version = 61;
        let err = verify(&class).unwrap_err();
        assert_eq!(
            err.to_string(),
            "class file verification failed for 'p/V': unsupported class file version 61"
        );
    }
}
