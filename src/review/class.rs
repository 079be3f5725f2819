use indexmap::IndexMap;

use super::types::{resolve_type, ResolvedType};
use super::ReviewError;
use crate::ast::{ClassDecl, ConstructorDecl, Declaration, InterfaceDecl, Modifier};
use crate::consts::PLATFORM_CLASSES;
use crate::error::{Error, Result};

pub(crate) fn review_class(class: &ClassDecl, decls: &IndexMap<String, Declaration>) -> Result<()> {
    let info = &class.info;
    if info.modifier.is_abstract && info.modifier.is_final {
        return Err(ReviewError::ClassAbstractAndFinal(info.name.clone()).into());
    }
    if let Some(superclass) = &class.superclass {
        let target = resolve_type(superclass, info, &[])?;
        check_superclass(&info.name, superclass, &target, decls)?;
    }
    for iface in &class.interfaces {
        let target = resolve_type(iface, info, &[])?;
        check_interface(&info.name, iface, &target, decls)?;
    }
    if !info.modifier.is_abstract {
        if let Some(method) = class.methods.values().find(|m| m.modifier.is_abstract) {
            return Err(ReviewError::AbstractMethodInConcreteClass {
                class: info.name.clone(),
                method: method.name.clone(),
            }
            .into());
        }
    }
    let expected = class.superclass.as_deref().unwrap_or("Object");
    for ctor in class.constructors.values() {
        if let Some(call) = &ctor.super_call {
            if call.target != expected {
                return Err(Error::mismatch(expected, call.target.clone()).at(info.location_at(ctor.line)));
            }
        }
    }
    Ok(())
}

pub(crate) fn review_interface(interface: &InterfaceDecl, decls: &IndexMap<String, Declaration>) -> Result<()> {
    for parent in &interface.extends {
        let target = resolve_type(parent, &interface.info, &[])?;
        check_interface(&interface.info.name, parent, &target, decls)?;
    }
    Ok(())
}

fn check_superclass(
    class: &str,
    source: &str,
    target: &ResolvedType,
    decls: &IndexMap<String, Declaration>,
) -> Result<()> {
    let reason = match target {
        ResolvedType::Class(q) => match decls.get(q) {
            Some(Declaration::Class(c)) if c.info.modifier.is_final => Some("it is final"),
            Some(Declaration::Class(_)) => None,
            Some(Declaration::Interface(_)) => Some("it is an interface"),
            Some(Declaration::Enumeration(_)) | Some(Declaration::Record(_)) => Some("it is final"),
            None if PLATFORM_CLASSES.get(q.as_str()) == Some(&true) => Some("it is an interface"),
            None => None,
        },
        ResolvedType::Primitive(_) => Some("it is a primitive type"),
        ResolvedType::Generic { .. } => Some("it is a generic parameter"),
        ResolvedType::Array(_) => Some("it is an array type"),
    };
    match reason {
        Some(reason) => {
            Err(ReviewError::CannotExtend { class: class.to_string(), target: source.to_string(), reason }.into())
        }
        None => Ok(()),
    }
}

fn check_interface(
    owner: &str,
    source: &str,
    target: &ResolvedType,
    decls: &IndexMap<String, Declaration>,
) -> Result<()> {
    let is_interface = match target {
        ResolvedType::Class(q) => match decls.get(q) {
            Some(decl) => decl.is_interface(),
            None => PLATFORM_CLASSES.get(q.as_str()).copied().unwrap_or(false),
        },
        _ => false,
    };
    if is_interface {
        Ok(())
    } else {
        Err(ReviewError::NotAnInterface { owner: owner.to_string(), target: source.to_string() }.into())
    }
}

/// Give a constructor-less class a no-arg constructor with its own access.
pub(crate) fn synthesize_default_constructor(class: &mut ClassDecl) -> Result<()> {
    if !class.constructors.is_empty() {
        return Ok(());
    }
    log::debug!("synthesizing default constructor for {}", class.info.qualified);
    class.add_constructor(ConstructorDecl {
        params: Vec::new(),
        body: Vec::new(),
        modifier: Modifier::default().with_access(class.info.modifier.access),
        super_call: None,
        line: class.info.line,
    })
}
