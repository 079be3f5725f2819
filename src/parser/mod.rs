//! Parser module for ktj sources
//!
//! Tokenizing, declaration parsing and method-body parsing.

pub mod body;
pub mod cursor;
pub mod lexer;
pub mod parser;

pub use body::{parse_body, ExprParser};
pub use cursor::{SourceLine, TokenCursor};
pub use lexer::{tokenize_line, Lexer, Token, TokenKind};
pub use parser::{ParsedFile, Parser};

use std::path::Path;

use crate::error::Result;

/// Parse one source file; `path` is relative to the source root.
pub fn parse_file(path: &Path, source: &str) -> Result<ParsedFile> {
    Parser::new(path, source)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Declaration;

    #[test]
    fn parse_simple_class() {
        let source = r#"
# greeting holder #
public class Hello {
    public String greeting = "hi"

    public String greet() {
        return this.greeting
    }
}
"#;
        let file = parse_file(Path::new("demo/Hello.ktj"), source).expect("Failed to parse");
        assert_eq!(file.declarations.len(), 1);
        let Declaration::Class(class) = &file.declarations[0] else { panic!("not a class") };
        assert_eq!(class.info.qualified, "demo.Hello");
        assert!(class.fields["greeting"].init.is_some());
        assert_eq!(class.methods["greet()"].line, 6);
    }

    #[test]
    fn parse_errors_carry_path_and_line() {
        let err = parse_file(Path::new("A.ktj"), "class A {\n  int x\n  int x\n}\n").unwrap_err();
        assert_eq!(err.to_string(), "redefinition of field 'x' at A.ktj:3");
    }
}
