//! Declaration model: classes, interfaces, closed enumerations, records

use std::collections::HashSet;
use std::path::PathBuf;

use indexmap::IndexMap;

use super::modifier::Modifier;
use super::nodes::Calc;
use crate::error::{Error, Result, SourceLocation};
use crate::parser::cursor::SourceLine;

/// Generic parameter with its ordered bounds, e.g. `T : Comparable & Runnable`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericParam {
    pub name: String,
    pub bounds: Vec<String>,
}

impl GenericParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), bounds: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    /// Source type name, arrays written with leading `[`
    pub ty: String,
    pub modifier: Modifier,
    pub line: usize,
    pub init: Option<Calc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: String,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self { name: name.into(), ty: ty.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    /// `None` is void
    pub return_type: Option<String>,
    pub params: Vec<Param>,
    /// Raw body lines, `None` for abstract and native methods
    pub body: Option<Vec<SourceLine>>,
    pub modifier: Modifier,
    pub generics: Vec<GenericParam>,
    pub line: usize,
}

impl MethodDecl {
    /// `name(type,type)`, unique within a declaration.
    pub fn signature_key(&self) -> String {
        signature_key(&self.name, &self.params)
    }

    pub fn generic(&self, name: &str) -> Option<&GenericParam> {
        self.generics.iter().find(|g| g.name == name)
    }
}

/// Explicit `: Super(args)` call heading a constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct SuperCall {
    pub target: String,
    pub args: Vec<Calc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub params: Vec<Param>,
    pub body: Vec<SourceLine>,
    pub modifier: Modifier,
    pub super_call: Option<SuperCall>,
    pub line: usize,
}

impl ConstructorDecl {
    pub fn signature_key(&self) -> String {
        signature_key(crate::codegen::defs::CONSTRUCTOR_METHOD_NAME, &self.params)
    }
}

pub fn signature_key(name: &str, params: &[Param]) -> String {
    let types: Vec<&str> = params.iter().map(|p| p.ty.as_str()).collect();
    format!("{}({})", name, types.join(","))
}

/// State shared by every declaration kind.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclInfo {
    pub name: String,
    /// Dotted lookup key, package segments first
    pub qualified: String,
    /// JVM internal name (`/` between packages, `$` before nested names)
    pub internal_name: String,
    /// Qualified key of the enclosing declaration
    pub outer: Option<String>,
    pub modifier: Modifier,
    pub generics: Vec<GenericParam>,
    /// Short name to dotted qualified name
    pub uses: IndexMap<String, String>,
    pub static_uses: HashSet<String>,
    pub path: PathBuf,
    pub line: usize,
}

impl DeclInfo {
    pub fn new(name: impl Into<String>, modifier: Modifier, path: impl Into<PathBuf>, line: usize) -> Self {
        let name = name.into();
        Self {
            qualified: name.clone(),
            internal_name: name.clone(),
            name,
            outer: None,
            modifier,
            generics: Vec::new(),
            uses: IndexMap::new(),
            static_uses: HashSet::new(),
            path: path.into(),
            line,
        }
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(&self.path, self.line)
    }

    pub fn location_at(&self, line: usize) -> SourceLocation {
        SourceLocation::new(&self.path, line)
    }

    pub fn generic(&self, name: &str) -> Option<&GenericParam> {
        self.generics.iter().find(|g| g.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub info: DeclInfo,
    pub extends: Vec<String>,
    pub methods: IndexMap<String, MethodDecl>,
}

impl InterfaceDecl {
    pub fn new(info: DeclInfo) -> Self {
        Self { info, extends: Vec::new(), methods: IndexMap::new() }
    }

    pub fn add_method(&mut self, method: MethodDecl) -> Result<()> {
        insert_unique(&mut self.methods, method.signature_key(), method, "method")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub info: DeclInfo,
    pub superclass: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: IndexMap<String, FieldDecl>,
    pub methods: IndexMap<String, MethodDecl>,
    pub constructors: IndexMap<String, ConstructorDecl>,
}

impl ClassDecl {
    pub fn new(info: DeclInfo) -> Self {
        Self {
            info,
            superclass: None,
            interfaces: Vec::new(),
            fields: IndexMap::new(),
            methods: IndexMap::new(),
            constructors: IndexMap::new(),
        }
    }

    pub fn add_field(&mut self, field: FieldDecl) -> Result<()> {
        insert_unique(&mut self.fields, field.name.clone(), field, "field")
    }

    pub fn add_method(&mut self, method: MethodDecl) -> Result<()> {
        insert_unique(&mut self.methods, method.signature_key(), method, "method")
    }

    pub fn add_constructor(&mut self, ctor: ConstructorDecl) -> Result<()> {
        insert_unique(&mut self.constructors, ctor.signature_key(), ctor, "constructor")
    }
}

/// Closed symbolic enumeration, `type Color = RED | GREEN`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationDecl {
    pub info: DeclInfo,
    pub values: Vec<String>,
}

impl EnumerationDecl {
    pub fn new(info: DeclInfo) -> Self {
        Self { info, values: Vec::new() }
    }

    /// Repeated names are ignored.
    pub fn add_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }
}

/// Positional record; component order is constructor order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDecl {
    pub info: DeclInfo,
    pub fields: IndexMap<String, FieldDecl>,
}

impl RecordDecl {
    pub fn new(info: DeclInfo) -> Self {
        Self { info, fields: IndexMap::new() }
    }

    pub fn add_field(&mut self, field: FieldDecl) -> Result<()> {
        insert_unique(&mut self.fields, field.name.clone(), field, "field")
    }
}

fn insert_unique<V>(map: &mut IndexMap<String, V>, key: String, value: V, kind: &'static str) -> Result<()> {
    if map.contains_key(&key) {
        return Err(Error::redefinition(kind, key));
    }
    map.insert(key, value);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Enumeration(EnumerationDecl),
    Record(RecordDecl),
    Interface(InterfaceDecl),
    Class(ClassDecl),
}

impl Declaration {
    pub fn info(&self) -> &DeclInfo {
        match self {
            Declaration::Enumeration(d) => &d.info,
            Declaration::Record(d) => &d.info,
            Declaration::Interface(d) => &d.info,
            Declaration::Class(d) => &d.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut DeclInfo {
        match self {
            Declaration::Enumeration(d) => &mut d.info,
            Declaration::Record(d) => &mut d.info,
            Declaration::Interface(d) => &mut d.info,
            Declaration::Class(d) => &mut d.info,
        }
    }

    pub fn name(&self) -> &str {
        &self.info().name
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Declaration::Enumeration(_) => "type",
            Declaration::Record(_) => "data class",
            Declaration::Interface(_) => "interface",
            Declaration::Class(_) => "class",
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self, Declaration::Interface(_))
    }

    /// Enumerations and records compile to final classes.
    pub fn is_final(&self) -> bool {
        match self {
            Declaration::Enumeration(_) | Declaration::Record(_) => true,
            Declaration::Class(c) => c.info.modifier.is_final,
            Declaration::Interface(_) => false,
        }
    }

    /// Methods declared directly, keyed by signature.
    pub fn methods(&self) -> Option<&IndexMap<String, MethodDecl>> {
        match self {
            Declaration::Interface(d) => Some(&d.methods),
            Declaration::Class(d) => Some(&d.methods),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDecl> {
        match self {
            Declaration::Class(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str) -> DeclInfo {
        DeclInfo::new(name, Modifier::public(), "A.ktj", 1)
    }

    fn method(name: &str, params: &[(&str, &str)]) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            return_type: None,
            params: params.iter().map(|(n, t)| Param::new(*n, *t)).collect(),
            body: Some(Vec::new()),
            modifier: Modifier::public(),
            generics: Vec::new(),
            line: 2,
        }
    }

    #[test]
    fn overloads_are_distinct_keys() {
        let mut class = ClassDecl::new(info("A"));
        class.add_method(method("f", &[("a", "int")])).unwrap();
        class.add_method(method("f", &[("a", "long")])).unwrap();
        // parameter names do not take part in the key
        let err = class.add_method(method("f", &[("b", "int")])).unwrap_err();
        assert_eq!(err.to_string(), "redefinition of method 'f(int)'");
        assert_eq!(class.methods.len(), 2);
    }

    #[test]
    fn enumeration_ignores_repeated_values() {
        let mut e = EnumerationDecl::new(info("Color"));
        for v in ["RED", "GREEN", "RED", "BLUE"] {
            e.add_value(v);
        }
        assert_eq!(e.values, vec!["RED", "GREEN", "BLUE"]);
    }

    #[test]
    fn record_keeps_component_order() {
        let mut r = RecordDecl::new(info("P"));
        for name in ["y", "x"] {
            r.add_field(FieldDecl {
                name: name.to_string(),
                ty: "int".to_string(),
                modifier: Modifier::public(),
                line: 1,
                init: None,
            })
            .unwrap();
        }
        let order: Vec<_> = r.fields.keys().cloned().collect();
        assert_eq!(order, vec!["y", "x"]);
    }
}
