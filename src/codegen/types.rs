//! Descriptor-level typing used by body lowering: display names, numeric
//! promotion, widening and casts, and file-local subtyping.

use indexmap::IndexMap;

use super::descriptor::{class_of, is_reference, Kind};
use super::opcodes::*;
use crate::ast::Declaration;
use crate::consts::JAVA_LANG_OBJECT;

/// Type of the `null` literal; assignable to every reference.
pub const NULL_TYPE: &str = "null";
pub const BOOLEAN: &str = "Z";
pub const INT: &str = "I";
pub const STRING: &str = "Ljava/lang/String;";
pub const OBJECT: &str = "Ljava/lang/Object;";

/// Source-facing name of a descriptor: `int`, `String`, `long[]`.
pub fn display_name(descriptor: &str) -> String {
    if let Some(inner) = descriptor.strip_prefix('[') {
        return format!("{}[]", display_name(inner));
    }
    let primitive = match descriptor {
        "I" => "int",
        "J" => "long",
        "F" => "float",
        "D" => "double",
        "Z" => "boolean",
        "C" => "char",
        "B" => "byte",
        "S" => "short",
        "V" => "void",
        NULL_TYPE => "null",
        _ => "",
    };
    if !primitive.is_empty() {
        return primitive.to_string();
    }
    let internal = class_of(descriptor).unwrap_or(descriptor);
    let simple = internal.rsplit('/').next().unwrap_or(internal);
    simple.replace('$', ".")
}

pub fn is_numeric(descriptor: &str) -> bool {
    matches!(descriptor, "B" | "S" | "C" | "I" | "J" | "F" | "D")
}

pub fn is_int_family(descriptor: &str) -> bool {
    matches!(descriptor, "B" | "S" | "C" | "I")
}

pub fn is_reference_or_null(descriptor: &str) -> bool {
    descriptor == NULL_TYPE || is_reference(descriptor)
}

/// Binary numeric promotion: double > float > long > int.
pub fn promote(left: &str, right: &str) -> Option<&'static str> {
    if !is_numeric(left) || !is_numeric(right) {
        return None;
    }
    Some(if left == "D" || right == "D" {
        "D"
    } else if left == "F" || right == "F" {
        "F"
    } else if left == "J" || right == "J" {
        "J"
    } else {
        INT
    })
}

/// Opcode turning a value of kind `from` into kind `to`, for the four
/// computational kinds.
fn kind_conversion(from: Kind, to: Kind) -> Option<u8> {
    use Kind::*;
    Some(match (from, to) {
        (Int, Long) => I2L,
        (Int, Float) => I2F,
        (Int, Double) => I2D,
        (Long, Int) => L2I,
        (Long, Float) => L2F,
        (Long, Double) => L2D,
        (Float, Int) => F2I,
        (Float, Long) => F2L,
        (Float, Double) => F2D,
        (Double, Int) => D2I,
        (Double, Long) => D2L,
        (Double, Float) => D2F,
        _ => return None,
    })
}

/// Primitive widening conversion, `Some(vec![])` when no instruction is
/// needed. `None` when `from` does not widen to `to`.
pub fn widening(from: &str, to: &str) -> Option<Vec<u8>> {
    if from == to {
        return Some(Vec::new());
    }
    let allowed = match from {
        "B" => matches!(to, "S" | "I" | "J" | "F" | "D"),
        "S" | "C" | "I" => matches!(to, "I" | "J" | "F" | "D"),
        "J" => matches!(to, "F" | "D"),
        "F" => to == "D",
        _ => false,
    };
    if !allowed {
        return None;
    }
    Some(kind_conversion(Kind::of(from), Kind::of(to)).into_iter().collect())
}

/// Explicit primitive cast, narrowing included; booleans only cast to
/// themselves.
pub fn primitive_cast(from: &str, to: &str) -> Option<Vec<u8>> {
    if from == to {
        return Some(Vec::new());
    }
    if !is_numeric(from) || !is_numeric(to) {
        return None;
    }
    let mut ops: Vec<u8> = kind_conversion(Kind::of(from), Kind::of(to)).into_iter().collect();
    if Kind::of(to) == Kind::Int {
        if Kind::of(from) != Kind::Int {
            ops = kind_conversion(Kind::of(from), Kind::Int).into_iter().collect();
        }
        match to {
            "B" => ops.push(I2B),
            "C" => ops.push(I2C),
            "S" if from != "B" => ops.push(I2S),
            _ => {}
        }
    }
    Some(ops)
}

/// `xastore` for an element descriptor.
pub fn array_store(element: &str) -> u8 {
    match element {
        "I" => IASTORE,
        "J" => LASTORE,
        "F" => FASTORE,
        "D" => DASTORE,
        "Z" | "B" => BASTORE,
        "C" => CASTORE,
        "S" => SASTORE,
        _ => AASTORE,
    }
}

/// `newarray` type code for a primitive element, `None` for references.
pub fn newarray_code(element: &str) -> Option<u8> {
    use super::opcodes::array_types::*;
    Some(match element {
        "Z" => T_BOOLEAN,
        "C" => T_CHAR,
        "F" => T_FLOAT,
        "D" => T_DOUBLE,
        "B" => T_BYTE,
        "S" => T_SHORT,
        "I" => T_INT,
        "J" => T_LONG,
        _ => return None,
    })
}

pub fn find_by_internal<'a>(decls: &'a IndexMap<String, Declaration>, internal: &str) -> Option<&'a Declaration> {
    decls.values().find(|d| d.info().internal_name == internal)
}

/// Direct supertypes of a file-local declaration, as internal names.
pub(crate) fn direct_supertypes(decl: &Declaration, decls: &IndexMap<String, Declaration>) -> Vec<String> {
    let info = decl.info();
    let resolve = |name: &str| -> Option<String> {
        info.uses.get(name).map(|q| crate::review::types::internal_name(q, decls))
    };
    match decl {
        Declaration::Class(c) => {
            let mut out: Vec<String> = c.superclass.as_deref().and_then(resolve).into_iter().collect();
            out.extend(c.interfaces.iter().filter_map(|i| resolve(i)));
            out
        }
        Declaration::Interface(i) => i.extends.iter().filter_map(|e| resolve(e)).collect(),
        Declaration::Enumeration(_) => vec![crate::consts::JAVA_LANG_ENUM.to_string()],
        Declaration::Record(_) => Vec::new(),
    }
}

/// Reflexive subtyping over file-local declarations; everything reaches
/// `java/lang/Object`.
pub fn is_subclass(from: &str, to: &str, decls: &IndexMap<String, Declaration>) -> bool {
    if from == to || to == JAVA_LANG_OBJECT {
        return true;
    }
    let mut pending = vec![from.to_string()];
    let mut seen = Vec::new();
    while let Some(current) = pending.pop() {
        if current == to {
            return true;
        }
        if seen.contains(&current) {
            continue;
        }
        if let Some(decl) = find_by_internal(decls, &current) {
            pending.extend(direct_supertypes(decl, decls));
        }
        seen.push(current);
    }
    false
}

/// What assigning a `from` value to a `to` slot requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// Conversion instructions, possibly none
    Convert(Vec<u8>),
    /// `checkcast` to this internal name (or array descriptor)
    CheckCast(String),
}

pub fn coercion(from: &str, to: &str, decls: &IndexMap<String, Declaration>) -> Option<Coercion> {
    if from == to {
        return Some(Coercion::Convert(Vec::new()));
    }
    if let Some(ops) = widening(from, to) {
        return Some(Coercion::Convert(ops));
    }
    if !is_reference(to) {
        return None;
    }
    if from == NULL_TYPE || to == OBJECT && is_reference(from) {
        return Some(Coercion::Convert(Vec::new()));
    }
    if from == OBJECT {
        let target = class_of(to).unwrap_or(to);
        return Some(Coercion::CheckCast(target.to_string()));
    }
    match (class_of(from), class_of(to)) {
        (Some(f), Some(t)) if is_subclass(f, t, decls) => Some(Coercion::Convert(Vec::new())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use std::path::Path;

    #[test]
    fn display_names() {
        assert_eq!(display_name("I"), "int");
        assert_eq!(display_name("[J"), "long[]");
        assert_eq!(display_name("Ljava/lang/String;"), "String");
        assert_eq!(display_name("Lp/Outer$Inner;"), "Outer.Inner");
    }

    #[test]
    fn promotion_order() {
        assert_eq!(promote("I", "J"), Some("J"));
        assert_eq!(promote("J", "F"), Some("F"));
        assert_eq!(promote("C", "S"), Some("I"));
        assert_eq!(promote("Z", "I"), None);
    }

    #[test]
    fn widening_and_casts() {
        assert_eq!(widening("I", "D"), Some(vec![I2D]));
        assert_eq!(widening("B", "I"), Some(vec![]));
        assert_eq!(widening("D", "I"), None);
        assert_eq!(primitive_cast("D", "B"), Some(vec![D2I, I2B]));
        assert_eq!(primitive_cast("I", "C"), Some(vec![I2C]));
        assert_eq!(primitive_cast("Z", "I"), None);
    }

    #[test]
    fn local_subtypes_and_object_casts() {
        let decls: IndexMap<String, Declaration> = parse_file(
            Path::new("p/Shapes.ktj"),
            "interface Shape {\n}\nclass Base implements Shape {\n}\nclass Square extends Base {\n}\n",
        )
        .unwrap()
        .declarations
        .into_iter()
        .map(|d| (d.info().qualified.clone(), d))
        .collect();
        assert!(is_subclass("p/Shapes/Square", "p/Shapes/Shape", &decls));
        assert!(!is_subclass("p/Shapes/Base", "p/Shapes/Square", &decls));
        assert_eq!(
            coercion(OBJECT, "Lp/Shapes/Square;", &decls),
            Some(Coercion::CheckCast("p/Shapes/Square".into()))
        );
        assert_eq!(coercion(NULL_TYPE, STRING, &decls), Some(Coercion::Convert(vec![])));
        assert_eq!(coercion("I", STRING, &decls), None);
    }
}
