//! Token cursor over the lines of one source file

use std::path::{Path, PathBuf};

use super::lexer::{tokenize_line, Token};
use crate::error::{Error, Result, ResultExt, SourceLocation};

/// A non-empty tokenized source line.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    /// 1-based line number in the file
    pub number: usize,
    pub tokens: Vec<Token>,
}

impl SourceLine {
    /// Line made of exactly one `}`
    pub fn is_closing_brace(&self) -> bool {
        self.tokens.len() == 1 && self.tokens[0].is_punct('}')
    }

    /// Tokens joined back into source text
    pub fn text(&self) -> String {
        self.tokens.iter().map(Token::to_source).collect::<Vec<_>>().join(" ")
    }
}

/// One cursor shared by the whole file. Empty and comment-only lines are
/// dropped up front, so moving to the next line lands on real tokens.
#[derive(Debug)]
pub struct TokenCursor {
    path: PathBuf,
    lines: Vec<SourceLine>,
    line: usize,
    pos: usize,
}

impl TokenCursor {
    /// Tokenize every line of `source`. Lexical failures carry their line.
    pub fn new(path: &Path, source: &str) -> Result<Self> {
        let mut lines = Vec::new();
        for (index, text) in source.lines().enumerate() {
            let number = index + 1;
            let tokens = tokenize_line(text).at(|| SourceLocation::new(path, number))?;
            if !tokens.is_empty() {
                lines.push(SourceLine { number, tokens });
            }
        }
        Ok(Self::from_lines(path, lines))
    }

    pub fn from_lines(path: &Path, lines: Vec<SourceLine>) -> Self {
        Self { path: path.to_path_buf(), lines, line: 0, pos: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_eof(&self) -> bool {
        self.line >= self.lines.len()
    }

    /// Line number of the current line (last line once exhausted).
    pub fn line_number(&self) -> usize {
        self.lines
            .get(self.line)
            .or_else(|| self.lines.last())
            .map(|l| l.number)
            .unwrap_or(1)
    }

    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(&self.path, self.line_number())
    }

    pub fn current_line(&self) -> Option<&SourceLine> {
        self.lines.get(self.line)
    }

    pub fn at_line_end(&self) -> bool {
        match self.lines.get(self.line) {
            Some(line) => self.pos >= line.tokens.len(),
            None => true,
        }
    }

    /// Token at the cursor, never crossing the line end.
    pub fn peek(&self) -> Option<&Token> {
        self.peek_nth(0)
    }

    pub fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.lines.get(self.line).and_then(|l| l.tokens.get(self.pos + n))
    }

    pub fn next(&mut self) -> Option<Token> {
        let token = self.peek().cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Token at the cursor, moving on to following lines when this one is done.
    pub fn peek_any(&mut self) -> Option<&Token> {
        while self.at_line_end() && !self.is_eof() {
            self.advance_line();
        }
        self.peek()
    }

    pub fn next_any(&mut self) -> Option<Token> {
        self.peek_any();
        self.next()
    }

    /// Move to the start of the next line, dropping what is left of this one.
    pub fn advance_line(&mut self) {
        if self.line < self.lines.len() {
            self.line += 1;
        }
        self.pos = 0;
    }

    /// Consume the remaining tokens of the current line without advancing.
    pub fn rest_of_line(&mut self) -> Vec<Token> {
        let rest = match self.lines.get(self.line) {
            Some(line) if self.pos < line.tokens.len() => line.tokens[self.pos..].to_vec(),
            _ => Vec::new(),
        };
        if let Some(line) = self.lines.get(self.line) {
            self.pos = line.tokens.len();
        }
        rest
    }

    /// Take the whole current line and move past it.
    pub fn take_line(&mut self) -> Option<SourceLine> {
        let line = self.lines.get(self.line).cloned();
        self.advance_line();
        line
    }

    pub fn check_word(&self, word: &str) -> bool {
        self.peek().map_or(false, |t| t.is_word(word))
    }

    pub fn check_punct(&self, ch: char) -> bool {
        self.peek().map_or(false, |t| t.is_punct(ch))
    }

    pub fn check_operator(&self, op: &str) -> bool {
        self.peek().map_or(false, |t| t.is_operator(op))
    }

    pub fn eat_word(&mut self, word: &str) -> bool {
        let hit = self.check_word(word);
        if hit {
            self.pos += 1;
        }
        hit
    }

    pub fn eat_punct(&mut self, ch: char) -> bool {
        let hit = self.check_punct(ch);
        if hit {
            self.pos += 1;
        }
        hit
    }

    pub fn eat_operator(&mut self, op: &str) -> bool {
        let hit = self.check_operator(op);
        if hit {
            self.pos += 1;
        }
        hit
    }

    pub fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(t) if t.is_identifier() => {
                let text = t.text.clone();
                self.pos += 1;
                Ok(text)
            }
            other => Err(unexpected(what, other)),
        }
    }

    pub fn expect_punct(&mut self, ch: char) -> Result<()> {
        if self.eat_punct(ch) {
            Ok(())
        } else {
            Err(unexpected(&format!("'{}'", ch), self.peek()))
        }
    }

    pub fn expect_operator(&mut self, op: &str) -> Result<()> {
        if self.eat_operator(op) {
            Ok(())
        } else {
            Err(unexpected(&format!("'{}'", op), self.peek()))
        }
    }

    pub fn expect_line_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(Error::parse(format!("unexpected token '{}', expected end of line", t))),
        }
    }
}

pub fn unexpected(expected: &str, found: Option<&Token>) -> Error {
    match found {
        Some(t) => Error::parse(format!("expected {}, found '{}'", expected, t)),
        None => Error::parse(format!("expected {}, found end of line", expected)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(src: &str) -> TokenCursor {
        TokenCursor::new(Path::new("t.ktj"), src).expect("cursor")
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let mut c = cursor("\n# only a comment #\nclass A {\n\n}\n");
        assert_eq!(c.line_number(), 3);
        assert!(c.eat_word("class"));
        assert_eq!(c.expect_identifier("name").unwrap(), "A");
        assert!(c.eat_punct('{'));
        assert!(c.at_line_end());
        c.advance_line();
        assert!(c.current_line().unwrap().is_closing_brace());
        assert_eq!(c.line_number(), 5);
    }

    #[test]
    fn next_any_crosses_lines() {
        let mut c = cursor("data P = [int x,\n  int y]");
        c.rest_of_line();
        assert!(c.at_line_end());
        assert!(c.next_any().unwrap().is_word("int"));
        assert_eq!(c.line_number(), 2);
    }

    #[test]
    fn lexical_errors_carry_their_line() {
        let err = TokenCursor::new(Path::new("t.ktj"), "class A {\n  String s = \"x\n}").unwrap_err();
        assert_eq!(err.location().map(|l| l.line), Some(2));
    }
}
