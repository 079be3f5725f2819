use logos::Logos;
use std::fmt;

use crate::error::{Error, Result};

/// Width class of an integer literal, chosen by its suffix letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    Int,
    Short,
    Long,
}

/// Width class of a floating literal, chosen by its suffix letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    Float,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    StringLiteral,
    CharLiteral,
    Integer(IntegerKind),
    Float(FloatKind),
    Operator,
    Punctuation,
}

/// One lexical token of a single source line.
///
/// String and char literals hold their decoded contents without quotes.
/// Numeric literals hold the digits without the suffix letter.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    /// 1-based column of the first character
    pub column: usize,
}

impl Token {
    pub fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self { text: text.into(), kind, column: 0 }
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }

    /// Identifier with exactly this text (keywords are identifiers).
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == word
    }

    pub fn is_operator(&self, op: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == op
    }

    pub fn is_punct(&self, ch: char) -> bool {
        self.kind == TokenKind::Punctuation && self.text.len() == ch.len_utf8() && self.text.starts_with(ch)
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::StringLiteral | TokenKind::CharLiteral | TokenKind::Integer(_) | TokenKind::Float(_)
        )
    }

    /// Source spelling of the token, with quotes and suffix restored.
    pub fn to_source(&self) -> String {
        match self.kind {
            TokenKind::StringLiteral => format!("\"{}\"", escape(&self.text)),
            TokenKind::CharLiteral => format!("'{}'", escape(&self.text)),
            TokenKind::Integer(IntegerKind::Long) => format!("{}l", self.text),
            TokenKind::Integer(IntegerKind::Short) => format!("{}s", self.text),
            TokenKind::Float(FloatKind::Float) => format!("{}f", self.text),
            _ => self.text.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_source())
    }
}

#[derive(Logos, Debug, PartialEq, Clone, Copy)]
#[logos(skip r"[ \t\r\n\f]+|#[^#]*#?")]
enum Lexeme {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,
    #[regex(r"[0-9]+i?")]
    Int,
    #[regex(r"[0-9]+s")]
    Short,
    #[regex(r"[0-9]+l")]
    Long,
    #[regex(r"[0-9]+\.[0-9]*f")]
    Float,
    #[regex(r"[0-9]+\.[0-9]*d?")]
    Double,
    #[regex(r"[-+*/!=<>%&|^~]+")]
    Operator,
    #[regex(r#""([^"\\]|\\.)*""#)]
    Str,
    #[regex(r#""([^"\\]|\\.)*"#)]
    UnterminatedStr,
    #[regex(r"'([^'\\]|\\.)'")]
    Char,
    #[regex(r"[(){}\[\],.:;@$?'\\`]")]
    Punct,
}

/// Tokenizer for one line of ktj source
pub struct Lexer<'a> {
    lexer: logos::Lexer<'a, Lexeme>,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { lexer: Lexeme::lexer(line) }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        let lexeme = self.lexer.next()?;
        let slice = self.lexer.slice();
        let column = self.lexer.span().start + 1;
        let token = match lexeme {
            Ok(lexeme) => classify(lexeme, slice),
            // anything logos does not know is single-character punctuation
            Err(()) => Ok(Token::new(slice, TokenKind::Punctuation)),
        };
        Some(token.map(|mut t| {
            t.column = column;
            t
        }))
    }

    /// Get all tokens of the line
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token?);
        }
        Ok(tokens)
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a single line. No state is carried between calls.
pub fn tokenize_line(line: &str) -> Result<Vec<Token>> {
    Lexer::new(line).tokenize()
}

fn classify(lexeme: Lexeme, slice: &str) -> Result<Token> {
    let token = match lexeme {
        Lexeme::Identifier => Token::new(slice, TokenKind::Identifier),
        Lexeme::Int => Token::new(slice.trim_end_matches('i'), TokenKind::Integer(IntegerKind::Int)),
        Lexeme::Short => Token::new(&slice[..slice.len() - 1], TokenKind::Integer(IntegerKind::Short)),
        Lexeme::Long => Token::new(&slice[..slice.len() - 1], TokenKind::Integer(IntegerKind::Long)),
        Lexeme::Float => Token::new(&slice[..slice.len() - 1], TokenKind::Float(FloatKind::Float)),
        Lexeme::Double => Token::new(slice.trim_end_matches('d'), TokenKind::Float(FloatKind::Double)),
        Lexeme::Operator => Token::new(slice, TokenKind::Operator),
        Lexeme::Str => Token::new(unescape(&slice[1..slice.len() - 1]), TokenKind::StringLiteral),
        Lexeme::UnterminatedStr => {
            return Err(Error::lexical(format!("unterminated string literal {}", slice)))
        }
        Lexeme::Char => Token::new(unescape(&slice[1..slice.len() - 1]), TokenKind::CharLiteral),
        Lexeme::Punct => Token::new(slice, TokenKind::Punctuation),
    };
    Ok(token)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &str) -> Vec<TokenKind> {
        tokenize_line(line).expect("tokenize").into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numeric_suffixes_pick_the_kind() {
        use FloatKind::*;
        use IntegerKind::*;
        assert_eq!(kinds("10"), vec![TokenKind::Integer(Int)]);
        assert_eq!(kinds("10i"), vec![TokenKind::Integer(Int)]);
        assert_eq!(kinds("10l"), vec![TokenKind::Integer(Long)]);
        assert_eq!(kinds("10s"), vec![TokenKind::Integer(Short)]);
        assert_eq!(kinds("3.5"), vec![TokenKind::Float(Double)]);
        assert_eq!(kinds("3.5f"), vec![TokenKind::Float(Float)]);
        assert_eq!(kinds("3.5d"), vec![TokenKind::Float(Double)]);
    }

    #[test]
    fn suffix_is_stripped_from_text() {
        let tokens = tokenize_line("42l 1.5f").unwrap();
        assert_eq!(tokens[0].text, "42");
        assert_eq!(tokens[1].text, "1.5");
        assert_eq!(tokens[0].to_source(), "42l");
    }

    #[test]
    fn operators_merge_greedily() {
        let tokens = tokenize_line("a==b").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[1].is_operator("=="));

        let tokens = tokenize_line("a+b").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens[0].is_word("a"));
        assert!(tokens[1].is_operator("+"));
        assert!(tokens[2].is_word("b"));
    }

    #[test]
    fn comments_produce_no_tokens() {
        let tokens = tokenize_line("int x # the x # = 1 # trailing").unwrap();
        let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["int", "x", "=", "1"]);
    }

    #[test]
    fn string_and_char_literals() {
        let tokens = tokenize_line(r#"s = "a \"q\"" 'c' 'x"#).unwrap();
        assert_eq!(tokens[2].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[2].text, "a \"q\"");
        assert_eq!(tokens[3].kind, TokenKind::CharLiteral);
        assert_eq!(tokens[3].text, "c");
        assert!(tokens[4].is_punct('\''));
        assert!(tokens[5].is_word("x"));
    }

    #[test]
    fn unterminated_string_fails() {
        let err = tokenize_line(r#"x = "oops"#).unwrap_err();
        assert!(err.to_string().contains("unterminated string"));
    }

    #[test]
    fn columns_are_one_based() {
        let tokens = tokenize_line("  foo(bar)").unwrap();
        assert_eq!(tokens[0].column, 3);
        assert!(tokens[1].is_punct('('));
        assert_eq!(tokens[1].column, 6);
    }
}
