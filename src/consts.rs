use once_cell::sync::Lazy;
use std::collections::HashMap;

// Parser: upper bound on body lines collected for a single member
pub const PARSER_MAX_BODY_LINES: usize = 100_000;

pub const JAVA_LANG_OBJECT: &str = "java/lang/Object";
pub const JAVA_LANG_ENUM: &str = "java/lang/Enum";
pub const JAVA_LANG_STRING: &str = "java/lang/String";
pub const JAVA_LANG_CLASS: &str = "java/lang/Class";
pub const JAVA_LANG_STRING_BUILDER: &str = "java/lang/StringBuilder";

/// Primitive keywords of the source language, including `void`.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "int", "long", "float", "double", "boolean", "char", "byte", "short", "void",
];

/// Names every declaration can use without a `use` line.
pub const IMPLICIT_USES: &[(&str, &str)] = &[
    ("Object", "java.lang.Object"),
    ("String", "java.lang.String"),
    ("Integer", "java.lang.Integer"),
    ("Long", "java.lang.Long"),
    ("Float", "java.lang.Float"),
    ("Double", "java.lang.Double"),
    ("Boolean", "java.lang.Boolean"),
    ("Character", "java.lang.Character"),
    ("Short", "java.lang.Short"),
    ("Byte", "java.lang.Byte"),
    ("Comparable", "java.lang.Comparable"),
    ("Iterable", "java.lang.Iterable"),
    ("Throwable", "java.lang.Throwable"),
    ("Exception", "java.lang.Exception"),
    ("RuntimeException", "java.lang.RuntimeException"),
    ("IllegalArgumentException", "java.lang.IllegalArgumentException"),
    ("IllegalStateException", "java.lang.IllegalStateException"),
    ("UnsupportedOperationException", "java.lang.UnsupportedOperationException"),
];

/// Platform classes known to the compiler, mapped to whether they are interfaces.
pub static PLATFORM_CLASSES: Lazy<HashMap<&'static str, bool>> = Lazy::new(|| {
    let mut classes = HashMap::new();
    for name in [
        "java.lang.Object", "java.lang.String", "java.lang.Integer", "java.lang.Long",
        "java.lang.Float", "java.lang.Double", "java.lang.Boolean", "java.lang.Character",
        "java.lang.Short", "java.lang.Byte", "java.lang.Number", "java.lang.Math",
        "java.lang.System", "java.lang.StringBuilder", "java.lang.Enum", "java.lang.Class",
        "java.lang.Throwable", "java.lang.Exception", "java.lang.Error",
        "java.lang.RuntimeException", "java.lang.IllegalArgumentException",
        "java.lang.IllegalStateException", "java.lang.UnsupportedOperationException",
        "java.lang.IndexOutOfBoundsException", "java.lang.NullPointerException",
        "java.util.ArrayList", "java.util.HashMap", "java.util.HashSet",
        "java.util.LinkedList", "java.util.Objects", "java.util.Arrays",
        "java.util.Collections", "java.io.File", "java.io.PrintStream",
    ] {
        classes.insert(name, false);
    }
    for name in [
        "java.lang.Comparable", "java.lang.Iterable", "java.lang.Runnable",
        "java.lang.CharSequence", "java.lang.Cloneable", "java.io.Serializable",
        "java.util.List", "java.util.Map", "java.util.Set", "java.util.Collection",
        "java.util.Iterator", "java.util.Comparator", "java.util.function.Function",
        "java.util.function.Supplier", "java.util.function.Consumer",
    ] {
        classes.insert(name, true);
    }
    classes
});

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// Long and double occupy two slots; everything else one.
pub fn slot_width(type_name: &str) -> u16 {
    match type_name {
        "long" | "double" => 2,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_table_distinguishes_interfaces() {
        assert_eq!(PLATFORM_CLASSES.get("java.util.List"), Some(&true));
        assert_eq!(PLATFORM_CLASSES.get("java.lang.String"), Some(&false));
        assert!(PLATFORM_CLASSES.get("java.lang.Nope").is_none());
    }

    #[test]
    fn implicit_uses_are_platform_classes() {
        for (_, qualified) in IMPLICIT_USES {
            assert!(PLATFORM_CLASSES.contains_key(qualified), "{} missing", qualified);
        }
    }

    #[test]
    fn wide_types_take_two_slots() {
        assert_eq!(slot_width("double"), 2);
        assert_eq!(slot_width("long"), 2);
        assert_eq!(slot_width("int"), 1);
        assert_eq!(slot_width("[long"), 1);
    }
}
