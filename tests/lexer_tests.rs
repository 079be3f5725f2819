use ktjc::parser::lexer::{FloatKind, IntegerKind};
use ktjc::parser::{tokenize_line, TokenKind};

mod common;

#[test]
fn test_numeric_literal_classification() {
    common::init_logger();
    let tokens = tokenize_line("10 10l 10s 3.5 3.5f 3.5d").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Integer(IntegerKind::Int),
            TokenKind::Integer(IntegerKind::Long),
            TokenKind::Integer(IntegerKind::Short),
            TokenKind::Float(FloatKind::Double),
            TokenKind::Float(FloatKind::Float),
            TokenKind::Float(FloatKind::Double),
        ]
    );
}

#[test]
fn test_operators_between_identifiers() {
    for (line, op) in [("a+b", "+"), ("a==b", "=="), ("a<=b", "<=")] {
        let tokens = tokenize_line(line).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TokenKind::Identifier, TokenKind::Operator, TokenKind::Identifier], "{}", line);
        assert_eq!(tokens[1].text, op);
    }
}

#[test]
fn test_statement_line() {
    let tokens = tokenize_line("    String s = \"hi\" + name.length()").unwrap();
    let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["String", "s", "=", "hi", "+", "name", ".", "length", "(", ")"]);
    assert_eq!(tokens[3].kind, TokenKind::StringLiteral);
    assert_eq!(tokens[0].column, 5);
}

#[test]
fn test_unterminated_string_is_located() {
    let err = common::compile("p/A.ktj", "class A {\n  String s = \"open\n}\n").unwrap_err();
    let location = err.location().expect("located");
    assert_eq!(location.line, 2);
    assert!(err.to_string().ends_with("at p/A.ktj:2"), "{}", err);
}
