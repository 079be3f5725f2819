//! Type-name resolution through primitives, generic parameters and uses

use indexmap::IndexMap;

use crate::ast::{Declaration, DeclInfo, GenericParam};
use crate::consts::{is_primitive, JAVA_LANG_OBJECT};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType {
    /// Primitive keyword, `void` included
    Primitive(String),
    /// Generic parameter with its erasure (first bound, source name)
    Generic { name: String, erasure: Option<String> },
    /// Dotted qualified class name
    Class(String),
    Array(Box<ResolvedType>),
}

impl ResolvedType {
    pub fn is_generic(&self) -> bool {
        match self {
            ResolvedType::Generic { .. } => true,
            ResolvedType::Array(inner) => inner.is_generic(),
            _ => false,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ResolvedType::Primitive(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            ResolvedType::Class(name) => Some(name),
            _ => None,
        }
    }
}

/// Resolve a source type name as seen from `info`, with `method_generics`
/// shadowing the declaration's own generic parameters.
pub fn resolve_type(name: &str, info: &DeclInfo, method_generics: &[GenericParam]) -> Result<ResolvedType> {
    if let Some(inner) = name.strip_prefix('[') {
        return Ok(ResolvedType::Array(Box::new(resolve_type(inner, info, method_generics)?)));
    }
    if is_primitive(name) {
        return Ok(ResolvedType::Primitive(name.to_string()));
    }
    let generic = method_generics.iter().find(|g| g.name == name).or_else(|| info.generic(name));
    if let Some(param) = generic {
        return Ok(ResolvedType::Generic { name: param.name.clone(), erasure: param.bounds.first().cloned() });
    }
    match info.uses.get(name) {
        Some(qualified) => Ok(ResolvedType::Class(qualified.clone())),
        None => Err(Error::unknown_type(name)),
    }
}

/// JVM internal name for a dotted class name; file-local declarations
/// carry their own (nested names use `$`).
pub fn internal_name(qualified: &str, decls: &IndexMap<String, Declaration>) -> String {
    match decls.get(qualified) {
        Some(decl) => decl.info().internal_name.clone(),
        None => qualified.replace('.', "/"),
    }
}

/// Field or method descriptor component for a resolved type.
pub fn descriptor(
    ty: &ResolvedType,
    info: &DeclInfo,
    method_generics: &[GenericParam],
    decls: &IndexMap<String, Declaration>,
) -> Result<String> {
    Ok(match ty {
        ResolvedType::Primitive(p) => primitive_descriptor(p).to_string(),
        ResolvedType::Class(q) => format!("L{};", internal_name(q, decls)),
        ResolvedType::Array(inner) => format!("[{}", descriptor(inner, info, method_generics, decls)?),
        ResolvedType::Generic { erasure: Some(bound), .. } => {
            let bound = resolve_type(bound, info, method_generics)?;
            descriptor(&bound, info, method_generics, decls)?
        }
        ResolvedType::Generic { erasure: None, .. } => format!("L{};", JAVA_LANG_OBJECT),
    })
}

/// One-letter code of a primitive keyword.
pub fn primitive_descriptor(name: &str) -> &'static str {
    match name {
        "int" => "I",
        "long" => "J",
        "float" => "F",
        "double" => "D",
        "boolean" => "Z",
        "char" => "C",
        "byte" => "B",
        "short" => "S",
        _ => "V",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Modifier;

    fn info() -> DeclInfo {
        let mut info = DeclInfo::new("Box", Modifier::public(), "pkg/Box.ktj", 4);
        info.uses.insert("String".into(), "java.lang.String".into());
        info.uses.insert("Comparable".into(), "java.lang.Comparable".into());
        let mut t = GenericParam::new("T");
        t.bounds.push("Comparable".into());
        info.generics.push(t);
        info
    }

    #[test]
    fn arrays_are_peeled() {
        let ty = resolve_type("[[int", &info(), &[]).unwrap();
        assert_eq!(
            ty,
            ResolvedType::Array(Box::new(ResolvedType::Array(Box::new(ResolvedType::Primitive("int".into())))))
        );
    }

    #[test]
    fn method_generics_shadow_class_generics() {
        let own = [GenericParam::new("T")];
        let ty = resolve_type("T", &info(), &own).unwrap();
        assert_eq!(ty, ResolvedType::Generic { name: "T".into(), erasure: None });
        let ty = resolve_type("T", &info(), &[]).unwrap();
        assert!(ty.is_generic());
    }

    #[test]
    fn unknown_name_fails() {
        let err = resolve_type("Frob", &info(), &[]).unwrap_err();
        assert_eq!(err.to_string(), "unknown type 'Frob'");
    }

    #[test]
    fn generic_erases_to_first_bound() {
        let decls = IndexMap::new();
        let ty = resolve_type("[T", &info(), &[]).unwrap();
        assert_eq!(descriptor(&ty, &info(), &[], &decls).unwrap(), "[Ljava/lang/Comparable;");
        let own = [GenericParam::new("U")];
        let ty = resolve_type("U", &info(), &own).unwrap();
        assert_eq!(descriptor(&ty, &info(), &own, &decls).unwrap(), "Ljava/lang/Object;");
    }
}
