//! Semantic review between parsing and code generation

use indexmap::IndexMap;

use crate::ast::*;
use crate::error::{Error, Result, ResultExt};

mod class;
pub mod types;
mod uses;

pub use types::{resolve_type, ResolvedType};

#[derive(thiserror::Error, Debug)]
pub enum ReviewError {
    #[error("class '{0}' cannot be both abstract and final")]
    ClassAbstractAndFinal(String),
    #[error("class '{class}' must be abstract to declare abstract method '{method}'")]
    AbstractMethodInConcreteClass { class: String, method: String },
    #[error("'{class}' cannot extend '{target}': {reason}")]
    CannotExtend { class: String, target: String, reason: &'static str },
    #[error("'{target}' in '{owner}' is not an interface")]
    NotAnInterface { owner: String, target: String },
    #[error("bound '{bound}' of generic parameter '{param}' must be a class or interface")]
    IllegalGenericBound { param: String, bound: String },
    #[error("{what} '{name}' cannot have type void")]
    VoidType { what: &'static str, name: String },
}

/// Check every declaration of a file and complete what generation needs.
pub fn review(decls: &mut IndexMap<String, Declaration>) -> Result<()> {
    log::debug!("review start: declarations={}", decls.len());
    for decl in decls.values() {
        let info = decl.info();
        uses::validate_uses(info, decls).at(|| info.location())?;
        review_types(decl)?;
        match decl {
            Declaration::Class(c) => class::review_class(c, decls).at(|| info.location())?,
            Declaration::Interface(i) => class::review_interface(i, decls).at(|| info.location())?,
            Declaration::Enumeration(_) | Declaration::Record(_) => {}
        }
    }
    for decl in decls.values_mut() {
        if let Declaration::Class(c) = decl {
            class::synthesize_default_constructor(c)?;
        }
    }
    log::debug!("review end: ok");
    Ok(())
}

/// Every type name in the declaration resolves, reported at its member's line.
fn review_types(decl: &Declaration) -> Result<()> {
    let info = decl.info();
    check_generics(&info.generics, info, &[]).at(|| info.location())?;
    match decl {
        Declaration::Enumeration(_) => {}
        Declaration::Record(r) => {
            for field in r.fields.values() {
                let location = || info.location_at(field.line);
                reject_void(&field.ty, "component", &field.name).at(location)?;
                resolve_type(&field.ty, info, &[]).at(location)?;
            }
        }
        Declaration::Interface(i) => {
            for method in i.methods.values() {
                review_method(method, info)?;
            }
        }
        Declaration::Class(c) => {
            for field in c.fields.values() {
                resolve_type(&field.ty, info, &[]).at(|| info.location_at(field.line))?;
            }
            for method in c.methods.values() {
                review_method(method, info)?;
            }
            for ctor in c.constructors.values() {
                for param in &ctor.params {
                    let location = || info.location_at(ctor.line);
                    reject_void(&param.ty, "parameter", &param.name).at(location)?;
                    resolve_type(&param.ty, info, &[]).at(location)?;
                }
            }
        }
    }
    Ok(())
}

fn review_method(method: &MethodDecl, info: &DeclInfo) -> Result<()> {
    let location = || info.location_at(method.line);
    check_generics(&method.generics, info, &method.generics).at(location)?;
    if let Some(ret) = &method.return_type {
        resolve_type(ret, info, &method.generics).at(location)?;
    }
    for param in &method.params {
        reject_void(&param.ty, "parameter", &param.name).at(location)?;
        resolve_type(&param.ty, info, &method.generics).at(location)?;
    }
    Ok(())
}

/// `void` and arrays of it only name a missing return value.
fn reject_void(ty: &str, what: &'static str, name: &str) -> Result<()> {
    if ty.trim_start_matches('[') == "void" {
        return Err(ReviewError::VoidType { what, name: name.to_string() }.into());
    }
    Ok(())
}

fn check_generics(params: &[GenericParam], info: &DeclInfo, method_generics: &[GenericParam]) -> Result<()> {
    for param in params {
        for bound in &param.bounds {
            match resolve_type(bound, info, method_generics)? {
                ResolvedType::Class(_) => {}
                _ => {
                    return Err(Error::from(ReviewError::IllegalGenericBound {
                        param: param.name.clone(),
                        bound: bound.clone(),
                    }))
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use std::path::Path;

    fn review_src(path: &str, src: &str) -> Result<IndexMap<String, Declaration>> {
        let mut decls: IndexMap<String, Declaration> = parse_file(Path::new(path), src)?
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect();
        review(&mut decls)?;
        Ok(decls)
    }

    fn review_err(src: &str) -> String {
        review_src("pkg/A.ktj", src).unwrap_err().to_string()
    }

    #[test]
    fn unknown_field_type_reports_member_line() {
        let err = review_err("class A {\n  int x\n  Frob f\n}\n");
        assert_eq!(err, "unknown type 'Frob' at pkg/A.ktj:3");
    }

    #[test]
    fn default_constructor_takes_class_access() {
        let decls = review_src("pkg/A.ktj", "public class A {\n}\n").unwrap();
        let class = decls["pkg.A"].as_class().unwrap();
        let ctor = &class.constructors["<init>()"];
        assert_eq!(ctor.modifier.access, AccessLevel::Public);
        assert!(ctor.super_call.is_none());
    }

    #[test]
    fn abstract_method_needs_abstract_class() {
        let err = review_err("class A {\n  public abstract int f()\n}\n");
        assert!(err.contains("must be abstract"), "{}", err);
        assert!(review_src("pkg/A.ktj", "abstract class A {\n  public abstract int f()\n}\n").is_ok());
    }

    #[test]
    fn cannot_extend_interface_or_enumeration() {
        let err = review_err("class A extends Comparable {\n}\n");
        assert!(err.contains("it is an interface"), "{}", err);
        let err = review_src("pkg/F.ktj", "type K = X | Y\nclass A extends K {\n}\n").unwrap_err().to_string();
        assert!(err.contains("it is final"), "{}", err);
    }

    #[test]
    fn implements_requires_interface() {
        let err = review_err("class A implements String {\n}\n");
        assert!(err.contains("is not an interface"), "{}", err);
    }

    #[test]
    fn super_call_must_name_superclass() {
        let src = "class B {\n}\nclass C {\n}\nclass A extends B {\n  init() : C() {\n  }\n}\n";
        let err = review_src("pkg/F.ktj", src).unwrap_err();
        assert!(matches!(err.kind(), Error::TypeMismatch { .. }));
        assert_eq!(err.location().map(|l| l.line), Some(6));
    }

    #[test]
    fn void_values_are_rejected_at_member_line() {
        let err = review_err("class A {\n  int f(void x) {\n    return 1\n  }\n}\n");
        assert_eq!(err, "parameter 'x' cannot have type void at pkg/A.ktj:2");
        let err = review_err("class A {\n  int n\n  init(int a, void[] b) {\n  }\n}\n");
        assert_eq!(err, "parameter 'b' cannot have type void at pkg/A.ktj:3");
        let err = review_src("pkg/P.ktj", "data P = [int x,\n  void y]\n").unwrap_err().to_string();
        assert_eq!(err, "component 'y' cannot have type void at pkg/P.ktj:2");
    }

    #[test]
    fn generic_bounds_resolve() {
        assert!(review_src("pkg/A.ktj", "class A<T : Comparable> {\n  T value\n}\n").is_ok());
        let err = review_err("class A<T : Nope> {\n}\n");
        assert_eq!(err, "unknown type 'Nope' at pkg/A.ktj:1");
    }
}
