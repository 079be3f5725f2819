use ktjc::Error;

mod common;

fn error(path: &str, src: &str) -> Error {
    common::compile(path, src).unwrap_err()
}

#[test]
fn test_duplicate_field_is_redefinition() {
    let err = error("p/A.ktj", "class A {\n  int x\n  String x\n}\n");
    assert!(matches!(err.kind(), Error::Redefinition { kind: "field", .. }), "{}", err);
    assert_eq!(err.location().map(|l| l.line), Some(3));
}

#[test]
fn test_duplicate_method_is_redefinition() {
    let src = "class A {\n  int f(int a) {\n    return a\n  }\n  int f(int b) {\n    return b\n  }\n}\n";
    let err = error("p/A.ktj", src);
    assert!(matches!(err.kind(), Error::Redefinition { kind: "method", .. }), "{}", err);
    assert!(err.to_string().contains("'f(int)'"), "{}", err);
}

#[test]
fn test_duplicate_top_level_name() {
    let err = error("p/Two.ktj", "class A {\n}\ntype A = X | Y\n");
    assert!(matches!(err.kind(), Error::Redefinition { .. }), "{}", err);
}

#[test]
fn test_abstract_field_is_illegal() {
    let err = error("p/A.ktj", "class A {\n  abstract int x\n}\n");
    assert!(
        matches!(err.kind(), Error::IllegalModifier { flag, construct: "field" } if flag == "abstract"),
        "{}",
        err
    );
}

#[test]
fn test_private_abstract_method_is_illegal() {
    let err = error("p/A.ktj", "abstract class A {\n  private abstract int f()\n}\n");
    assert!(
        matches!(err.kind(), Error::IllegalModifier { flag, construct: "method" } if flag == "private abstract"),
        "{}",
        err
    );
}

#[test]
fn test_static_class_is_illegal() {
    let err = error("p/A.ktj", "static class A {\n}\n");
    assert!(
        matches!(err.kind(), Error::IllegalModifier { flag, construct: "class" } if flag == "static"),
        "{}",
        err
    );
}

#[test]
fn test_unknown_type_names_type_and_location() {
    let err = error("geo/Shape.ktj", "class Shape {\n  int sides\n\n  Colour colour\n}\n");
    let message = err.to_string();
    assert!(message.contains("Colour"), "{}", message);
    assert!(message.contains("geo/Shape.ktj:4"), "{}", message);
}

#[test]
fn test_enumeration_duplicates_are_ignored() {
    let units = common::compile("p/Color.ktj", "type Color = RED | GREEN | RED\n").unwrap();
    let class = &common::unit(&units, "p/Color").class_file;
    assert_eq!(class.field_names(), vec!["RED", "GREEN", "$VALUES"]);
}
