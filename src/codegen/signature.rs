//! Generic signature strings for the Signature attribute
//!
//! Class: `<T:Lb;>Lsuper;Liface;`. Method: `<U:Ljava/lang/Object;>(TU;)V`.
//! Field: `TT;`. Bounds that are interfaces take the `::` form.

use super::descriptor::TypeScope;
use crate::ast::{GenericParam, Param};
use crate::consts::JAVA_LANG_OBJECT;
use crate::error::Result;
use crate::review::types::{internal_name, ResolvedType};

/// Signature form of a resolved type; generic parameters stay unerased.
pub fn type_signature(ty: &ResolvedType, scope: &TypeScope) -> String {
    match ty {
        ResolvedType::Primitive(p) => crate::review::types::primitive_descriptor(p).to_string(),
        ResolvedType::Class(q) => format!("L{};", internal_name(q, scope.decls)),
        ResolvedType::Generic { name, .. } => format!("T{};", name),
        ResolvedType::Array(inner) => format!("[{}", type_signature(inner, scope)),
    }
}

/// `<T:...;U::...;>` formal parameter section.
pub fn formal_parameters(params: &[GenericParam], scope: &TypeScope) -> Result<String> {
    let mut sig = String::from("<");
    for param in params {
        sig.push_str(&param.name);
        if param.bounds.is_empty() {
            sig.push_str(&format!(":L{};", JAVA_LANG_OBJECT));
        }
        for (i, bound) in param.bounds.iter().enumerate() {
            let ty = scope.resolve(bound)?;
            let interface_first = i == 0 && ty.class_name().map(|q| scope.is_interface(q)).unwrap_or(false);
            sig.push_str(if interface_first { "::" } else { ":" });
            sig.push_str(&type_signature(&ty, scope));
        }
    }
    sig.push('>');
    Ok(sig)
}

/// Class signature, `None` when the declaration has no generic parameters.
pub fn class_signature(
    scope: &TypeScope,
    superclass: Option<&str>,
    interfaces: &[String],
) -> Result<Option<String>> {
    if scope.info.generics.is_empty() {
        return Ok(None);
    }
    let mut sig = formal_parameters(&scope.info.generics, scope)?;
    match superclass {
        Some(name) => sig.push_str(&type_signature(&scope.resolve(name)?, scope)),
        None => sig.push_str(&format!("L{};", JAVA_LANG_OBJECT)),
    }
    for iface in interfaces {
        sig.push_str(&type_signature(&scope.resolve(iface)?, scope));
    }
    Ok(Some(sig))
}

/// Method signature, `None` unless the method declares generic parameters or
/// mentions a generic type.
pub fn method_signature(
    scope: &TypeScope,
    generics: &[GenericParam],
    params: &[Param],
    return_type: Option<&str>,
) -> Result<Option<String>> {
    let mut types = Vec::with_capacity(params.len());
    for param in params {
        types.push(scope.resolve(&param.ty)?);
    }
    let ret = match return_type {
        Some(ty) => Some(scope.resolve(ty)?),
        None => None,
    };
    let mentions_generic = types.iter().chain(ret.iter()).any(|t| t.is_generic());
    if generics.is_empty() && !mentions_generic {
        return Ok(None);
    }
    let mut sig = if generics.is_empty() { String::new() } else { formal_parameters(generics, scope)? };
    sig.push('(');
    for ty in &types {
        sig.push_str(&type_signature(ty, scope));
    }
    sig.push(')');
    match &ret {
        Some(ty) => sig.push_str(&type_signature(ty, scope)),
        None => sig.push('V'),
    }
    Ok(Some(sig))
}

/// Field signature when the field's type involves a generic parameter.
pub fn field_signature(scope: &TypeScope, ty: &str) -> Result<Option<String>> {
    let resolved = scope.resolve(ty)?;
    Ok(resolved.is_generic().then(|| type_signature(&resolved, scope)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Declaration;
    use crate::parser::parse_file;
    use indexmap::IndexMap;
    use std::path::Path;

    fn decls(src: &str) -> IndexMap<String, Declaration> {
        parse_file(Path::new("p/Box.ktj"), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect()
    }

    #[test]
    fn interface_bound_uses_double_colon() {
        let decls = decls("class Box<T : Comparable, U> {\n}\n");
        let scope = TypeScope::new(decls["p.Box"].info(), &decls);
        let sig = class_signature(&scope, None, &[]).unwrap();
        assert_eq!(sig.as_deref(), Some("<T::Ljava/lang/Comparable;U:Ljava/lang/Object;>Ljava/lang/Object;"));
    }

    #[test]
    fn plain_class_has_no_signature() {
        let decls = decls("class Box {\n}\n");
        let scope = TypeScope::new(decls["p.Box"].info(), &decls);
        assert_eq!(class_signature(&scope, None, &[]).unwrap(), None);
        assert_eq!(field_signature(&scope, "int").unwrap(), None);
    }

    #[test]
    fn generic_members() {
        let decls = decls("class Box<T> {\n}\n");
        let scope = TypeScope::new(decls["p.Box"].info(), &decls);
        assert_eq!(field_signature(&scope, "[T").unwrap().as_deref(), Some("[TT;"));
        let params = [Param::new("v", "T")];
        let sig = method_signature(&scope, &[], &params, None).unwrap();
        assert_eq!(sig.as_deref(), Some("(TT;)V"));
        let own = [GenericParam::new("U")];
        let scope = scope.with_generics(&own);
        let sig = method_signature(&scope, &own, &[Param::new("u", "U")], Some("int")).unwrap();
        assert_eq!(sig.as_deref(), Some("<U:Ljava/lang/Object;>(TU;)I"));
    }
}
