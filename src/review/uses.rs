use indexmap::IndexMap;

use crate::ast::{AccessLevel, Declaration, DeclInfo};
use crate::consts::{is_primitive, PLATFORM_CLASSES};
use crate::error::{Error, Result};

/// Every `uses` target must be a known class the declaration can see, and
/// every static-only name must name a class.
pub(crate) fn validate_uses(info: &DeclInfo, decls: &IndexMap<String, Declaration>) -> Result<()> {
    for name in &info.static_uses {
        match info.uses.get(name) {
            Some(qualified) if !is_primitive(qualified) => {}
            _ => return Err(Error::InvalidStaticUse { name: name.clone() }),
        }
    }
    for (short, qualified) in &info.uses {
        match decls.get(qualified) {
            Some(target) => {
                if !is_accessible(target.info(), info) {
                    return Err(Error::InaccessibleClass { name: short.clone() });
                }
            }
            None if PLATFORM_CLASSES.contains_key(qualified.as_str()) => {}
            None => return Err(Error::unknown_type(qualified.clone())),
        }
    }
    Ok(())
}

/// Private nested declarations are visible from their enclosing declaration
/// and its other nested declarations only.
fn is_accessible(target: &DeclInfo, from: &DeclInfo) -> bool {
    let Some(outer) = &target.outer else { return true };
    if target.modifier.access != AccessLevel::Private {
        return true;
    }
    from.qualified == *outer || from.outer.as_deref() == Some(outer.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use std::path::Path;

    fn decls(src: &str) -> IndexMap<String, Declaration> {
        parse_file(Path::new("p/F.ktj"), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect()
    }

    #[test]
    fn seeded_names_validate() {
        let decls = decls("class A {\n  private type Hidden = X | Y\n}\nclass B {\n}\n");
        for decl in decls.values() {
            validate_uses(decl.info(), &decls).unwrap();
        }
    }

    #[test]
    fn explicit_use_of_private_nested_is_rejected() {
        let decls = decls("use p.F.A.Hidden\nclass A {\n  private type Hidden = X | Y\n}\nclass B {\n}\n");
        let b = &decls["p.F.B"];
        let err = validate_uses(b.info(), &decls).unwrap_err();
        assert_eq!(err.to_string(), "class 'Hidden' is not accessible here");
        validate_uses(decls["p.F.A"].info(), &decls).unwrap();
    }

    #[test]
    fn unknown_platform_class_is_rejected() {
        let decls = decls("use java.util.Frobnicator\nclass A {\n}\n");
        let err = validate_uses(decls["p.F.A"].info(), &decls).unwrap_err();
        assert!(err.to_string().contains("java.util.Frobnicator"));
    }
}
