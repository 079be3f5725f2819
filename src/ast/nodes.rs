//! Expression and statement nodes for method bodies

use std::collections::BTreeMap;
use std::fmt;

use crate::parser::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    BitOr,
    BitXor,
    BitAnd,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Shl,
    Shr,
    UShr,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        use BinaryOp::*;
        let op = match symbol {
            "||" => Or,
            "&&" => And,
            "|" => BitOr,
            "^" => BitXor,
            "&" => BitAnd,
            "==" => Eq,
            "!=" => Ne,
            "<" => Lt,
            "<=" => Le,
            ">" => Gt,
            ">=" => Ge,
            "<<" => Shl,
            ">>" => Shr,
            ">>>" => UShr,
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Rem,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        use BinaryOp::*;
        match self {
            Or => "||",
            And => "&&",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            Eq => "==",
            Ne => "!=",
            Lt => "<",
            Le => "<=",
            Gt => ">",
            Ge => ">=",
            Shl => "<<",
            Shr => ">>",
            UShr => ">>>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Rem => "%",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;
        match self {
            Or => 1,
            And => 2,
            BitOr => 3,
            BitXor => 4,
            BitAnd => 5,
            Eq | Ne => 6,
            Lt | Le | Gt | Ge => 7,
            Shl | Shr | UShr => 8,
            Add | Sub => 9,
            Mul | Div | Rem => 10,
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::Or | BinaryOp::And)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(UnaryOp::Neg),
            "!" => Some(UnaryOp::Not),
            "~" => Some(UnaryOp::BitNot),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// Arithmetic or logical expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Calc {
    pub kind: CalcKind,
    /// Parenthesised in source; never re-associated
    pub grouped: bool,
    /// Filled in during lowering
    pub ty: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalcKind {
    Leaf(Box<CalcArg>),
    Binary { op: BinaryOp, left: Box<Calc>, right: Box<Calc> },
}

impl Calc {
    pub fn leaf(arg: CalcArg) -> Self {
        Self { kind: CalcKind::Leaf(Box::new(arg)), grouped: false, ty: None }
    }

    pub fn binary(op: BinaryOp, left: Calc, right: Calc) -> Self {
        Self { kind: CalcKind::Binary { op, left: Box::new(left), right: Box::new(right) }, grouped: false, ty: None }
    }

    pub fn grouped(mut self) -> Self {
        self.grouped = true;
        self
    }

    pub fn as_leaf(&self) -> Option<&CalcArg> {
        match &self.kind {
            CalcKind::Leaf(arg) => Some(arg),
            CalcKind::Binary { .. } => None,
        }
    }

    /// The whole current tree becomes the left child of a new `op` node.
    pub fn rotate_left(self, op: BinaryOp, rhs: Calc) -> Calc {
        Calc::binary(op, self, rhs)
    }

    /// `op` is pushed down into the right child, which then takes `rhs`.
    pub fn rotate_right(self, op: BinaryOp, rhs: Calc) -> Calc {
        if self.grouped {
            return self.rotate_left(op, rhs);
        }
        match self.kind {
            CalcKind::Binary { op: own, left, right } => {
                Calc::binary(own, *left, right.push_operator(op, rhs))
            }
            kind => Calc { kind, grouped: false, ty: self.ty }.rotate_left(op, rhs),
        }
    }

    /// Append `op rhs` to a tree built left to right so far.
    pub fn push_operator(self, op: BinaryOp, rhs: Calc) -> Calc {
        let binds_looser = matches!(
            &self.kind,
            CalcKind::Binary { op: own, .. } if own.precedence() < op.precedence()
        );
        if binds_looser && !self.grouped {
            self.rotate_right(op, rhs)
        } else {
            self.rotate_left(op, rhs)
        }
    }
}

impl fmt::Display for Calc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.grouped {
            f.write_str("(")?;
        }
        match &self.kind {
            CalcKind::Leaf(arg) => write!(f, "{}", arg)?,
            CalcKind::Binary { op, left, right } => {
                if self.grouped {
                    write!(f, "{} {} {}", left, op, right)?
                } else {
                    write!(f, "[{} {} {}]", left, op, right)?
                }
            }
        }
        if self.grouped {
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Literal token; `true`, `false` and `null` arrive as identifiers
    Literal(Token),
    Load(Load),
    /// Parenthesised expression under a unary operator
    Nested(Calc),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalcArg {
    Value { value: Value, unary: Option<UnaryOp> },
    Cast { inner: Calc, target: String },
    ArrayCreation { elements: Vec<Calc> },
    New { class: String, args: Vec<Calc> },
}

impl CalcArg {
    pub fn literal(token: Token) -> Self {
        CalcArg::Value { value: Value::Literal(token), unary: None }
    }

    pub fn load(load: Load) -> Self {
        CalcArg::Value { value: Value::Load(load), unary: None }
    }
}

impl fmt::Display for CalcArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcArg::Value { value, unary } => {
                if let Some(op) = unary {
                    f.write_str(op.symbol())?;
                }
                match value {
                    Value::Literal(token) => write!(f, "{}", token),
                    Value::Load(load) => write!(f, "{}", load),
                    Value::Nested(calc) => write!(f, "({})", calc),
                }
            }
            CalcArg::Cast { inner, target } => write!(f, "({}) {}", target, inner),
            CalcArg::ArrayCreation { elements } => write!(f, "[{}]", join(elements)),
            CalcArg::New { class, args } => write!(f, "new {}({})", class, join(args)),
        }
    }
}

/// Variable or field read, optionally followed by a call chain.
///
/// `owner` is `this` or a qualifier written before the name. An empty `name`
/// with a call is a call on the owner (or the current class).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Load {
    pub owner: Option<String>,
    pub name: String,
    pub call: Option<Call>,
    pub is_final: bool,
}

impl Load {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

impl fmt::Display for Load {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(owner) = &self.owner {
            parts.push(owner.clone());
        }
        if !self.name.is_empty() {
            parts.push(self.name.clone());
        }
        if let Some(call) = &self.call {
            parts.push(call.to_string());
        }
        f.write_str(&parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Call {
    pub is_static: bool,
    /// Declaring class, internal name, set when resolved
    pub owner: Option<String>,
    pub name: String,
    pub args: Vec<Calc>,
    pub arg_types: Vec<String>,
    /// Call whose result this call is made on
    pub prev: Option<Box<Call>>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: Vec<Calc>) -> Self {
        Self { name: name.into(), args, ..Self::default() }
    }

    /// A call on the result of `self`.
    pub fn chain(self, name: impl Into<String>, args: Vec<Calc>) -> Call {
        Call { prev: Some(Box::new(self)), ..Call::new(name, args) }
    }

    /// Calls of the chain, first to last.
    pub fn links(&self) -> Vec<&Call> {
        let mut links = match &self.prev {
            Some(prev) => prev.links(),
            None => Vec::new(),
        };
        links.push(self);
        links
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prev) = &self.prev {
            write!(f, "{}.", prev)?;
        }
        write!(f, "{}({})", self.name, join(&self.args))
    }
}

fn join(calcs: &[Calc]) -> String {
    calcs.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: usize,
}

impl Statement {
    pub fn new(kind: StatementKind, line: usize) -> Self {
        Self { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Return(Option<Calc>),
    If(IfStatement),
    While { cond: Calc, body: Vec<Statement> },
    VarAssignment { target: Load, declared: Option<String>, value: Calc },
    Throw(Calc),
    Switch(SwitchStatement),
    Expr(Calc),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub cond: Calc,
    pub body: Vec<Statement>,
    pub elif: Option<Box<IfStatement>>,
    pub else_body: Option<Vec<Statement>>,
}

impl IfStatement {
    pub fn new(cond: Calc, body: Vec<Statement>) -> Self {
        Self { cond, body, elif: None, else_body: None }
    }

    /// Last link of the elif chain, where a further branch attaches.
    pub fn tail_mut(&mut self) -> &mut IfStatement {
        match self.elif {
            Some(ref mut next) => next.tail_mut(),
            None => self,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub scrutinee: Calc,
    /// Case value to branch index
    pub cases: BTreeMap<i32, usize>,
    pub branches: Vec<Vec<Statement>>,
    pub default: Option<Vec<Statement>>,
}

/// Whether control can fall off the end of `statements`.
pub fn terminates(statements: &[Statement]) -> bool {
    match statements.last().map(|s| &s.kind) {
        Some(StatementKind::Return(_)) | Some(StatementKind::Throw(_)) => true,
        Some(StatementKind::If(stmt)) => if_terminates(stmt),
        // there is no `break`, so only a return or throw leaves `while true`
        Some(StatementKind::While { cond, .. }) => is_true_literal(cond),
        Some(StatementKind::Switch(sw)) => {
            sw.default.as_deref().map_or(false, terminates) && sw.branches.iter().all(|b| terminates(b))
        }
        _ => false,
    }
}

fn is_true_literal(calc: &Calc) -> bool {
    match &calc.kind {
        CalcKind::Leaf(arg) => match arg.as_ref() {
            CalcArg::Value { value: Value::Literal(token), unary: None } => token.is_word("true"),
            CalcArg::Value { value: Value::Nested(inner), unary: None } => is_true_literal(inner),
            _ => false,
        },
        CalcKind::Binary { .. } => false,
    }
}

fn if_terminates(stmt: &IfStatement) -> bool {
    if !terminates(&stmt.body) {
        return false;
    }
    match (&stmt.elif, &stmt.else_body) {
        (Some(elif), _) => if_terminates(elif),
        (None, Some(else_body)) => terminates(else_body),
        (None, None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::{IntegerKind, TokenKind};

    fn num(n: &str) -> Calc {
        Calc::leaf(CalcArg::literal(Token::new(n, TokenKind::Integer(IntegerKind::Int))))
    }

    fn build(first: &str, rest: &[(BinaryOp, &str)]) -> Calc {
        rest.iter().fold(num(first), |tree, (op, n)| tree.push_operator(*op, num(n)))
    }

    #[test]
    fn higher_precedence_goes_right() {
        let tree = build("1", &[(BinaryOp::Add, "2"), (BinaryOp::Mul, "3")]);
        assert_eq!(tree.to_string(), "[1 + [2 * 3]]");
    }

    #[test]
    fn lower_precedence_goes_left() {
        let tree = build("1", &[(BinaryOp::Mul, "2"), (BinaryOp::Add, "3")]);
        assert_eq!(tree.to_string(), "[[1 * 2] + 3]");
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        let tree = build("1", &[(BinaryOp::Sub, "2"), (BinaryOp::Sub, "3")]);
        assert_eq!(tree.to_string(), "[[1 - 2] - 3]");
    }

    #[test]
    fn deep_right_push() {
        let tree = build("a", &[(BinaryOp::Or, "b"), (BinaryOp::And, "c"), (BinaryOp::Eq, "d")]);
        assert_eq!(tree.to_string(), "[a || [b && [c == d]]]");
    }

    #[test]
    fn grouped_node_is_not_reassociated() {
        let group = num("1").push_operator(BinaryOp::Add, num("2")).grouped();
        let tree = group.push_operator(BinaryOp::Mul, num("3"));
        assert_eq!(tree.to_string(), "[(1 + 2) * 3]");
    }

    #[test]
    fn rotate_right_on_leaf_falls_back_to_left() {
        let tree = num("1").rotate_right(BinaryOp::Add, num("2"));
        assert_eq!(tree.to_string(), "[1 + 2]");
    }

    #[test]
    fn chain_links_in_call_order() {
        let call = Call::new("f", Vec::new()).chain("g", vec![num("1")]).chain("h", Vec::new());
        let names: Vec<_> = call.links().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["f", "g", "h"]);
        assert_eq!(call.to_string(), "f().g(1).h()");
    }

    #[test]
    fn if_else_termination() {
        let ret = || vec![Statement::new(StatementKind::Return(None), 1)];
        let mut stmt = IfStatement::new(num("1"), ret());
        let open = vec![Statement::new(StatementKind::If(stmt.clone()), 1)];
        assert!(!terminates(&open));
        stmt.else_body = Some(ret());
        let closed = vec![Statement::new(StatementKind::If(stmt), 1)];
        assert!(terminates(&closed));
    }

    #[test]
    fn endless_loop_terminates() {
        let word = |w: &str| Calc::leaf(CalcArg::literal(Token::new(w, TokenKind::Identifier)));
        let ret = vec![Statement::new(StatementKind::Return(None), 2)];
        let endless = vec![Statement::new(StatementKind::While { cond: word("true"), body: ret.clone() }, 1)];
        assert!(terminates(&endless));
        let bounded = vec![Statement::new(StatementKind::While { cond: word("running"), body: ret }, 1)];
        assert!(!terminates(&bounded));
    }
}
