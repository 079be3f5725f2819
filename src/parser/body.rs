//! Statement and expression parsing for method bodies and initializers

use std::collections::BTreeMap;
use std::path::Path;

use super::cursor::{unexpected, SourceLine, TokenCursor};
use super::lexer::{Token, TokenKind};
use crate::ast::{
    BinaryOp, Call, Calc, CalcArg, IfStatement, Load, Statement, StatementKind, SwitchStatement, UnaryOp, Value,
};
use crate::consts::is_primitive;
use crate::error::{Error, Result, ResultExt};

/// Expression parser over the tokens of a single line.
pub struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> ExprParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse `tokens` as exactly one expression.
    pub fn parse_all(tokens: &'a [Token]) -> Result<Calc> {
        let mut parser = Self::new(tokens);
        let calc = parser.parse_expression()?;
        parser.expect_end()?;
        Ok(calc)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_nth(&self, n: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + n)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat_punct(&mut self, ch: char) -> bool {
        let hit = self.peek().map_or(false, |t| t.is_punct(ch));
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn expect_punct(&mut self, ch: char) -> Result<()> {
        if self.eat_punct(ch) {
            Ok(())
        } else {
            Err(unexpected(&format!("'{}'", ch), self.peek()))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            Some(t) if t.is_identifier() => {
                self.pos += 1;
                Ok(t.text.clone())
            }
            other => Err(unexpected(what, other)),
        }
    }

    pub fn expect_end(&self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => Err(Error::parse(format!("unexpected token '{}' after expression", t))),
        }
    }

    pub fn parse_expression(&mut self) -> Result<Calc> {
        let mut tree = self.parse_operand()?;
        while let Some(op) = self.peek().filter(|t| t.kind == TokenKind::Operator).and_then(|t| BinaryOp::from_symbol(&t.text)) {
            self.pos += 1;
            let rhs = self.parse_operand()?;
            tree = tree.push_operator(op, rhs);
        }
        Ok(tree)
    }

    /// `( expr {, expr} )`
    pub fn parse_args(&mut self) -> Result<Vec<Calc>> {
        self.expect_punct('(')?;
        self.parse_list(')')
    }

    fn parse_list(&mut self, close: char) -> Result<Vec<Calc>> {
        let mut items = Vec::new();
        if self.eat_punct(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.eat_punct(close) {
                return Ok(items);
            }
            self.expect_punct(',')?;
        }
    }

    fn parse_operand(&mut self) -> Result<Calc> {
        if let Some(token) = self.peek().filter(|t| t.kind == TokenKind::Operator) {
            let op = UnaryOp::from_symbol(&token.text)
                .ok_or_else(|| Error::parse(format!("unexpected operator '{}'", token.text)))?;
            self.pos += 1;
            let operand = self.parse_operand()?;
            return Ok(apply_unary(op, operand));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Calc> {
        let token = self.next().ok_or_else(|| unexpected("expression", None))?;
        if token.is_literal() || token.is_word("true") || token.is_word("false") || token.is_word("null") {
            return Ok(Calc::leaf(CalcArg::literal(token.clone())));
        }
        if token.is_word("new") {
            let class = self.expect_identifier("class name")?;
            let args = self.parse_args()?;
            return Ok(Calc::leaf(CalcArg::New { class, args }));
        }
        if token.is_identifier() {
            let load = self.parse_load(token.text.clone())?;
            return Ok(Calc::leaf(CalcArg::load(load)));
        }
        if token.is_punct('(') {
            if let Some(target) = self.cast_target() {
                let inner = self.parse_operand()?;
                return Ok(Calc::leaf(CalcArg::Cast { inner, target }));
            }
            let inner = self.parse_expression()?;
            self.expect_punct(')')?;
            return Ok(inner.grouped());
        }
        if token.is_punct('[') {
            let elements = self.parse_list(']')?;
            return Ok(Calc::leaf(CalcArg::ArrayCreation { elements }));
        }
        Err(Error::parse(format!("unexpected token '{}' in expression", token)))
    }

    /// After `(`: consume `TYPE )` when it starts a cast.
    fn cast_target(&mut self) -> Option<String> {
        let name = self.peek().filter(|t| t.is_identifier())?;
        if !is_primitive(&name.text) && !name.text.starts_with(|c: char| c.is_ascii_uppercase()) {
            return None;
        }
        let mut n = 1;
        let mut dims = 0;
        while self.peek_nth(n).map_or(false, |t| t.is_punct('[')) && self.peek_nth(n + 1).map_or(false, |t| t.is_punct(']')) {
            n += 2;
            dims += 1;
        }
        if !self.peek_nth(n).map_or(false, |t| t.is_punct(')')) {
            return None;
        }
        let starts_operand = match self.peek_nth(n + 1) {
            Some(t) => t.is_identifier() || t.is_literal() || t.is_punct('(') || t.is_punct('['),
            None => false,
        };
        if !starts_operand {
            return None;
        }
        self.pos += n + 1;
        Some(format!("{}{}", "[".repeat(dims), name.text))
    }

    /// Identifier already consumed; read qualifiers and the call chain.
    fn parse_load(&mut self, first: String) -> Result<Load> {
        let mut load = if first == "this" && !self.peek().map_or(false, |t| t.is_punct('.')) {
            Load::named(first)
        } else if first == "this" {
            self.expect_punct('.')?;
            let name = self.expect_identifier("member name after 'this.'")?;
            if self.peek().map_or(false, |t| t.is_punct('(')) {
                let args = self.parse_args()?;
                Load { owner: Some(first), call: Some(Call::new(name, args)), ..Load::default() }
            } else {
                Load::named(name).with_owner(first)
            }
        } else if self.peek().map_or(false, |t| t.is_punct('(')) {
            let args = self.parse_args()?;
            Load { call: Some(Call::new(first, args)), ..Load::default() }
        } else if self.eat_punct('.') {
            let second = self.expect_identifier("member name")?;
            if self.peek().map_or(false, |t| t.is_punct('(')) {
                let args = self.parse_args()?;
                Load { call: Some(Call::new(second, args)), ..Load::named(first) }
            } else {
                Load::named(second).with_owner(first)
            }
        } else {
            Load::named(first)
        };

        while self.eat_punct('.') {
            let name = self.expect_identifier("method name")?;
            if !self.peek().map_or(false, |t| t.is_punct('(')) {
                return Err(Error::parse(format!("unsupported field access '.{}'", name)));
            }
            let args = self.parse_args()?;
            load.call = Some(match load.call.take() {
                Some(call) => call.chain(name, args),
                None => Call::new(name, args),
            });
        }
        Ok(load)
    }
}

fn apply_unary(op: UnaryOp, operand: Calc) -> Calc {
    if !operand.grouped {
        if let Some(CalcArg::Value { value, unary: None }) = operand.as_leaf() {
            return Calc::leaf(CalcArg::Value { value: value.clone(), unary: Some(op) });
        }
    }
    Calc::leaf(CalcArg::Value { value: Value::Nested(operand), unary: Some(op) })
}

/// Parse collected body lines into statements.
pub fn parse_body(path: &Path, lines: &[SourceLine]) -> Result<Vec<Statement>> {
    let mut parser = BodyParser { cursor: TokenCursor::from_lines(path, lines.to_vec()) };
    let mut statements = Vec::new();
    while !parser.cursor.is_eof() {
        if parser.cursor.check_punct('}') {
            return Err(Error::parse("unbalanced '}'").at(parser.cursor.location()));
        }
        statements.push(parser.parse_located()?);
    }
    Ok(statements)
}

struct BodyParser {
    cursor: TokenCursor,
}

impl BodyParser {
    fn parse_located(&mut self) -> Result<Statement> {
        let location = self.cursor.location();
        self.parse_statement().at(|| location)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let line = self.cursor.line_number();
        let kind = if self.cursor.eat_word("return") {
            let rest = self.take_rest();
            let value = if rest.is_empty() { None } else { Some(ExprParser::parse_all(&rest)?) };
            StatementKind::Return(value)
        } else if self.cursor.eat_word("throw") {
            let rest = self.take_rest();
            StatementKind::Throw(ExprParser::parse_all(&rest)?)
        } else if self.cursor.eat_word("if") {
            StatementKind::If(self.parse_if()?)
        } else if self.cursor.eat_word("while") {
            let cond = self.block_header()?;
            let body = self.parse_block()?;
            self.close_block_line()?;
            StatementKind::While { cond, body }
        } else if self.cursor.eat_word("switch") {
            StatementKind::Switch(self.parse_switch()?)
        } else {
            let rest = self.take_rest();
            parse_simple(&rest)?
        };
        Ok(Statement::new(kind, line))
    }

    /// Remaining tokens of the line; the cursor moves to the next line.
    fn take_rest(&mut self) -> Vec<Token> {
        let rest = self.cursor.rest_of_line();
        self.cursor.advance_line();
        rest
    }

    /// Condition up to a trailing `{`.
    fn block_header(&mut self) -> Result<Calc> {
        let rest = self.take_rest();
        match rest.split_last() {
            Some((last, cond)) if last.is_punct('{') && !cond.is_empty() => ExprParser::parse_all(cond),
            _ => Err(Error::parse("expected condition followed by '{'")),
        }
    }

    /// Statements up to, not including, the closing `}`.
    fn parse_block(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            if self.cursor.is_eof() {
                return Err(Error::parse("expected '}'"));
            }
            if self.cursor.check_punct('}') {
                return Ok(statements);
            }
            statements.push(self.parse_located()?);
        }
    }

    fn close_block_line(&mut self) -> Result<()> {
        self.cursor.expect_punct('}')?;
        self.cursor.expect_line_end()?;
        self.cursor.advance_line();
        Ok(())
    }

    fn parse_if(&mut self) -> Result<IfStatement> {
        let cond = self.block_header()?;
        let body = self.parse_block()?;
        let mut stmt = IfStatement::new(cond, body);
        loop {
            self.cursor.expect_punct('}')?;
            let trailing = !self.cursor.at_line_end();
            if !trailing {
                self.cursor.advance_line();
            }
            if self.cursor.eat_word("elif") {
                let cond = self.block_header()?;
                let body = self.parse_block()?;
                stmt.tail_mut().elif = Some(Box::new(IfStatement::new(cond, body)));
            } else if self.cursor.eat_word("else") {
                self.cursor.expect_punct('{')?;
                self.cursor.expect_line_end()?;
                self.cursor.advance_line();
                let body = self.parse_block()?;
                stmt.tail_mut().else_body = Some(body);
                self.close_block_line()?;
                return Ok(stmt);
            } else if trailing {
                return Err(unexpected("'elif', 'else' or end of line", self.cursor.peek()));
            } else {
                return Ok(stmt);
            }
        }
    }

    fn parse_switch(&mut self) -> Result<SwitchStatement> {
        let scrutinee = self.block_header()?;
        let mut switch = SwitchStatement { scrutinee, cases: BTreeMap::new(), branches: Vec::new(), default: None };
        loop {
            if self.cursor.is_eof() {
                return Err(Error::parse("expected '}'"));
            }
            let location = self.cursor.location();
            if self.cursor.check_punct('}') {
                self.close_block_line()?;
                return Ok(switch);
            }
            if self.cursor.eat_word("case") {
                let labels = self.case_labels().at(|| location.clone())?;
                let index = switch.branches.len();
                for label in labels {
                    if switch.cases.insert(label, index).is_some() {
                        return Err(Error::parse(format!("duplicate case label {}", label)).at(location));
                    }
                }
                let body = self.parse_block()?;
                self.close_block_line()?;
                switch.branches.push(body);
            } else if self.cursor.eat_word("default") {
                if switch.default.is_some() {
                    return Err(Error::parse("duplicate default branch").at(location));
                }
                self.cursor.expect_punct('{')?;
                self.cursor.expect_line_end()?;
                self.cursor.advance_line();
                let body = self.parse_block()?;
                self.close_block_line()?;
                switch.default = Some(body);
            } else {
                return Err(unexpected("'case' or 'default'", self.cursor.peek()).at(location));
            }
        }
    }

    /// `LIT {, LIT} {` for int and char literals.
    fn case_labels(&mut self) -> Result<Vec<i32>> {
        let mut labels = Vec::new();
        loop {
            let negative = self.cursor.eat_operator("-");
            let token = self.cursor.next().ok_or_else(|| unexpected("case label", None))?;
            let value = match token.kind {
                TokenKind::Integer(_) => {
                    let out_of_range = || Error::parse(format!("case label '{}' out of range", token.text));
                    let magnitude = token.text.parse::<i64>().map_err(|_| out_of_range())?;
                    // the sign is applied first so that -2147483648 fits
                    i32::try_from(if negative { -magnitude } else { magnitude }).map_err(|_| out_of_range())?
                }
                TokenKind::CharLiteral if !negative => token.text.chars().next().map_or(0, |c| c as i32),
                _ => return Err(unexpected("integer or char case label", Some(&token))),
            };
            labels.push(value);
            if self.cursor.eat_punct('{') {
                self.cursor.expect_line_end()?;
                self.cursor.advance_line();
                return Ok(labels);
            }
            self.cursor.expect_punct(',')?;
        }
    }
}

/// Declaration, assignment or call on one line.
fn parse_simple(tokens: &[Token]) -> Result<StatementKind> {
    let (is_final, rest) = match tokens.split_first() {
        Some((first, rest)) if first.is_word("final") => (true, rest),
        _ => (false, tokens),
    };
    if let Some((declared, name, value_at)) = declaration_head(rest) {
        let value = ExprParser::parse_all(&rest[value_at..])?;
        let target = Load { is_final, ..Load::named(name) };
        return Ok(StatementKind::VarAssignment { target, declared: Some(declared), value });
    }
    if is_final {
        return Err(Error::parse("expected variable declaration after 'final'"));
    }
    if let Some(eq) = rest.iter().position(|t| t.is_operator("=")) {
        let target = match ExprParser::parse_all(&rest[..eq])?.as_leaf() {
            Some(CalcArg::Value { value: Value::Load(load), unary: None }) if load.call.is_none() => load.clone(),
            _ => return Err(Error::parse("invalid assignment target")),
        };
        let value = ExprParser::parse_all(&rest[eq + 1..])?;
        return Ok(StatementKind::VarAssignment { target, declared: None, value });
    }
    let calc = ExprParser::parse_all(rest)?;
    match calc.as_leaf() {
        Some(CalcArg::Value { value: Value::Load(load), unary: None }) if load.call.is_some() => {}
        Some(CalcArg::New { .. }) => {}
        _ => return Err(Error::parse(format!("not a statement: {}", calc))),
    }
    Ok(StatementKind::Expr(calc))
}

/// `TYPE NAME =` at the head of a line: returns the type, name and value offset.
fn declaration_head(tokens: &[Token]) -> Option<(String, String, usize)> {
    let ty = tokens.first().filter(|t| t.is_identifier())?;
    let mut i = 1;
    let mut dims = 0;
    while tokens.get(i).map_or(false, |t| t.is_punct('[')) && tokens.get(i + 1).map_or(false, |t| t.is_punct(']')) {
        i += 2;
        dims += 1;
    }
    let name = tokens.get(i).filter(|t| t.is_identifier())?;
    if !tokens.get(i + 1).map_or(false, |t| t.is_operator("=")) {
        return None;
    }
    Some((format!("{}{}", "[".repeat(dims), ty.text), name.text.clone(), i + 2))
}
