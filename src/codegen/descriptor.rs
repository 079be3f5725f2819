//! Field and method descriptors, and the computational kinds behind them

use indexmap::IndexMap;

use crate::ast::{Declaration, DeclInfo, GenericParam, Param};
use crate::error::Result;
use crate::review::types::{self, resolve_type, ResolvedType};

/// Resolution context for type names: one declaration, optionally narrowed
/// to a method's own generic parameters.
#[derive(Clone, Copy)]
pub struct TypeScope<'a> {
    pub info: &'a DeclInfo,
    pub generics: &'a [GenericParam],
    pub decls: &'a IndexMap<String, Declaration>,
}

impl<'a> TypeScope<'a> {
    pub fn new(info: &'a DeclInfo, decls: &'a IndexMap<String, Declaration>) -> Self {
        Self { info, generics: &[], decls }
    }

    pub fn with_generics(self, generics: &'a [GenericParam]) -> Self {
        Self { generics, ..self }
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedType> {
        resolve_type(name, self.info, self.generics)
    }

    /// Erased field descriptor of a source type name.
    pub fn descriptor(&self, name: &str) -> Result<String> {
        let ty = self.resolve(name)?;
        types::descriptor(&ty, self.info, self.generics, self.decls)
    }

    pub fn method_descriptor(&self, params: &[Param], return_type: Option<&str>) -> Result<String> {
        let mut desc = String::from("(");
        for param in params {
            desc.push_str(&self.descriptor(&param.ty)?);
        }
        desc.push(')');
        match return_type {
            Some(ty) => desc.push_str(&self.descriptor(ty)?),
            None => desc.push('V'),
        }
        Ok(desc)
    }

    /// Internal name of a class-typed source name (`String` to
    /// `java/lang/String`, `Outer.Inner` to `pkg/Outer$Inner`).
    pub fn internal_name(&self, name: &str) -> Result<String> {
        let desc = self.descriptor(name)?;
        Ok(class_of(&desc).map(str::to_string).unwrap_or(desc))
    }

    pub fn is_interface(&self, qualified: &str) -> bool {
        match self.decls.get(qualified) {
            Some(decl) => decl.is_interface(),
            None => crate::consts::PLATFORM_CLASSES.get(qualified).copied().unwrap_or(false),
        }
    }
}

/// JVM computational kind of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Int,
    Long,
    Float,
    Double,
    Reference,
    Void,
}

impl Kind {
    pub fn of(descriptor: &str) -> Kind {
        match descriptor.as_bytes().first() {
            Some(b'Z' | b'B' | b'C' | b'S' | b'I') => Kind::Int,
            Some(b'J') => Kind::Long,
            Some(b'F') => Kind::Float,
            Some(b'D') => Kind::Double,
            Some(b'V') => Kind::Void,
            _ => Kind::Reference,
        }
    }

    /// Stack and local slots occupied.
    pub fn width(self) -> u16 {
        match self {
            Kind::Long | Kind::Double => 2,
            Kind::Void => 0,
            _ => 1,
        }
    }

    /// Position in the i/l/f/d/a opcode families.
    pub fn family_offset(self) -> u8 {
        match self {
            Kind::Int => 0,
            Kind::Long => 1,
            Kind::Float => 2,
            Kind::Double => 3,
            Kind::Reference | Kind::Void => 4,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Kind::Int | Kind::Long | Kind::Float | Kind::Double)
    }
}

/// Internal name inside an `L...;` descriptor.
pub fn class_of(descriptor: &str) -> Option<&str> {
    descriptor.strip_prefix('L')?.strip_suffix(';')
}

pub fn is_reference(descriptor: &str) -> bool {
    descriptor.starts_with('L') || descriptor.starts_with('[')
}

/// `L<name>;`
pub fn object(internal_name: &str) -> String {
    format!("L{};", internal_name)
}

/// Parameter descriptors and return descriptor of a method descriptor.
pub fn split_method_descriptor(descriptor: &str) -> Option<(Vec<String>, String)> {
    let inner = descriptor.strip_prefix('(')?;
    let close = inner.find(')')?;
    let (mut rest, ret) = (&inner[..close], &inner[close + 1..]);
    let mut params = Vec::new();
    while !rest.is_empty() {
        let len = field_length(rest)?;
        params.push(rest[..len].to_string());
        rest = &rest[len..];
    }
    Some((params, ret.to_string()))
}

fn field_length(descriptor: &str) -> Option<usize> {
    let dims = descriptor.bytes().take_while(|b| *b == b'[').count();
    let rest = &descriptor[dims..];
    let base = match rest.as_bytes().first()? {
        b'L' => rest.find(';')? + 1,
        b'Z' | b'B' | b'C' | b'S' | b'I' | b'J' | b'F' | b'D' => 1,
        _ => return None,
    };
    Some(dims + base)
}

/// Argument slots a method descriptor consumes, receiver excluded.
pub fn argument_slots(descriptor: &str) -> u16 {
    split_method_descriptor(descriptor)
        .map(|(params, _)| params.iter().map(|p| Kind::of(p).width()).sum())
        .unwrap_or(0)
}
