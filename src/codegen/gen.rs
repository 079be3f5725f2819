//! Method body generation
//!
//! A recursive walk from parsed statements and expressions to instructions
//! in a [`Code`] buffer. Names resolve against the slot table first, then
//! the current declaration and its file-local supertypes. `type_of` gives
//! the descriptor an expression leaves on the stack without emitting
//! anything, so a parent can pick conversions before its operands are
//! generated.

use indexmap::IndexMap;

use super::attribute::CodeAttribute;
use super::code::{Code, Label};
use super::constpool::ConstantPool;
use super::defs::CONSTRUCTOR_METHOD_NAME;
use super::descriptor::{class_of, is_reference, object, split_method_descriptor, Kind, TypeScope};
use super::opcodes::*;
use super::slots::Slots;
use super::types::{self, coercion, display_name, Coercion, BOOLEAN, INT, NULL_TYPE, OBJECT, STRING};
use crate::ast::*;
use crate::consts::JAVA_LANG_STRING_BUILDER;
use crate::error::{Error, Result, ResultExt, SourceLocation};
use crate::parser::lexer::{FloatKind, IntegerKind, Token, TokenKind};
use crate::parser::parse_body;
use crate::review::ResolvedType;

/// Field as seen from a use site.
#[derive(Debug, Clone)]
struct FieldRef {
    owner: String,
    name: String,
    desc: String,
    is_static: bool,
    is_final: bool,
    is_private: bool,
}

/// Method picked for one link of a call chain.
#[derive(Debug, Clone)]
struct MethodRef {
    owner: String,
    name: String,
    desc: String,
    params: Vec<String>,
    ret: String,
    is_static: bool,
    is_private: bool,
    on_interface: bool,
}

impl MethodRef {
    fn new(owner: &str, name: &str, desc: String, is_static: bool, is_private: bool, on_interface: bool) -> Result<Self> {
        let (params, ret) = split_method_descriptor(&desc)
            .ok_or_else(|| Error::codegen(format!("malformed method descriptor '{}'", desc)))?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            desc,
            params,
            ret,
            is_static,
            is_private,
            on_interface,
        })
    }

    fn invoke_op(&self) -> u8 {
        if self.is_static {
            INVOKESTATIC
        } else if self.on_interface {
            INVOKEINTERFACE
        } else if self.is_private {
            INVOKESPECIAL
        } else {
            INVOKEVIRTUAL
        }
    }
}

/// Something a name can be read from, and possibly written to.
#[derive(Debug, Clone)]
enum Place {
    This,
    Local { name: String, slot: u16, desc: String, is_final: bool },
    /// `receiver` is `None` for static fields
    Field { receiver: Option<Box<Place>>, field: FieldRef },
    Length(Box<Place>),
}

/// What the head of a load or call chain names.
#[derive(Debug, Clone)]
enum Base {
    /// Unqualified call on the current declaration
    Implicit,
    /// Type name; only static members are reachable
    Type(String),
    Value(Place),
}

pub struct Gen<'a> {
    pool: &'a mut ConstantPool,
    decl: &'a Declaration,
    decls: &'a IndexMap<String, Declaration>,
    scope: TypeScope<'a>,
    code: Code,
    slots: Slots,
    is_static: bool,
    /// `V` for void methods, constructors and `<clinit>`
    return_desc: String,
    /// Constructor or static initializer: final fields of the class are writable
    initializer: bool,
}

/// Code attribute of a concrete method.
pub fn method_code(
    pool: &mut ConstantPool,
    decl: &Declaration,
    decls: &IndexMap<String, Declaration>,
    method: &MethodDecl,
) -> Result<CodeAttribute> {
    let info = decl.info();
    let location = || info.location_at(method.line);
    let body = method
        .body
        .as_deref()
        .ok_or_else(|| Error::codegen(format!("method '{}' has no body", method.name)))
        .at(location)?;
    let statements = parse_body(&info.path, body)?;
    let scope = TypeScope::new(info, decls).with_generics(&method.generics);
    let is_static = method.modifier.is_static;
    let slots = param_slots(&scope, is_static, &method.params).at(location)?;
    let return_desc = match &method.return_type {
        Some(ty) => scope.descriptor(ty).at(location)?,
        None => "V".to_string(),
    };
    let mut gen = Gen { pool, decl, decls, scope, code: Code::new(), slots, is_static, return_desc, initializer: false };
    gen.gen_stats(&statements)?;
    if gen.return_desc != "V" && !terminates(&statements) {
        return Err(Error::codegen("missing return statement").at(location()));
    }
    if gen.code.is_alive() {
        gen.code.emit_return(Kind::Void)?;
    }
    gen.finish().at(location)
}

/// Constructor: super call, instance field initializers, then the body.
pub fn constructor_code(
    pool: &mut ConstantPool,
    decl: &Declaration,
    decls: &IndexMap<String, Declaration>,
    ctor: &ConstructorDecl,
    default_superclass: &str,
) -> Result<CodeAttribute> {
    let Declaration::Class(class) = decl else {
        return Err(Error::codegen(format!("'{}' cannot declare constructors", decl.name())));
    };
    let info = &class.info;
    let location = || info.location_at(ctor.line);
    let scope = TypeScope::new(info, decls);
    let slots = param_slots(&scope, false, &ctor.params).at(location)?;
    let statements = parse_body(&info.path, &ctor.body)?;
    let superclass = match &class.superclass {
        Some(name) => scope.internal_name(name).at(location)?,
        None => default_superclass.to_string(),
    };
    let mut gen = Gen {
        pool,
        decl,
        decls,
        scope,
        code: Code::new(),
        slots,
        is_static: false,
        return_desc: "V".to_string(),
        initializer: true,
    };
    let args = ctor.super_call.as_ref().map(|call| call.args.as_slice()).unwrap_or(&[]);
    gen.gen_super_call(&superclass, args).at(location)?;
    gen.gen_field_inits(class.fields.values().filter(|f| !f.modifier.is_static))?;
    gen.gen_stats(&statements)?;
    if gen.code.is_alive() {
        gen.code.emit_return(Kind::Void)?;
    }
    gen.finish().at(location)
}

/// `<clinit>` running static field initializers; `None` when there are none.
pub fn static_init_code(
    pool: &mut ConstantPool,
    decl: &Declaration,
    decls: &IndexMap<String, Declaration>,
) -> Result<Option<CodeAttribute>> {
    let Declaration::Class(class) = decl else { return Ok(None) };
    let statics: Vec<&FieldDecl> =
        class.fields.values().filter(|f| f.modifier.is_static && f.init.is_some()).collect();
    if statics.is_empty() {
        return Ok(None);
    }
    let mut gen = Gen {
        pool,
        decl,
        decls,
        scope: TypeScope::new(&class.info, decls),
        code: Code::new(),
        slots: Slots::new(),
        is_static: true,
        return_desc: "V".to_string(),
        initializer: true,
    };
    gen.gen_field_inits(statics.into_iter())?;
    gen.code.emit_return(Kind::Void)?;
    gen.finish().map(Some)
}

fn param_slots(scope: &TypeScope, is_static: bool, params: &[Param]) -> Result<Slots> {
    let mut slots = Slots::for_method(is_static, params.iter().map(|p| (p.name.as_str(), p.ty.as_str())))?;
    for param in params {
        slots.set_descriptor(&param.name, &scope.descriptor(&param.ty)?);
    }
    Ok(slots)
}

fn method_descriptor(params: &[String], ret: &str) -> String {
    format!("({}){}", params.concat(), ret)
}

fn slot_count(descs: &[String]) -> u16 {
    descs.iter().map(|d| Kind::of(d).width()).sum()
}

/// Position of a comparison in the `ifeq`..`ifle` and `if_icmpeq`.. families.
fn cond_offset(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Eq => 0,
        BinaryOp::Ne => 1,
        BinaryOp::Lt => 2,
        BinaryOp::Ge => 3,
        BinaryOp::Gt => 4,
        _ => 5,
    }
}

fn negate(op: BinaryOp) -> BinaryOp {
    match op {
        BinaryOp::Eq => BinaryOp::Ne,
        BinaryOp::Ne => BinaryOp::Eq,
        BinaryOp::Lt => BinaryOp::Ge,
        BinaryOp::Ge => BinaryOp::Lt,
        BinaryOp::Gt => BinaryOp::Le,
        BinaryOp::Le => BinaryOp::Gt,
        other => other,
    }
}

fn integral(desc: &str) -> bool {
    types::is_int_family(desc) || desc == "J"
}

/// `StringBuilder.append` overload taking a value of `desc`.
fn append_descriptor(desc: &str) -> Result<&'static str> {
    Ok(match desc {
        "V" => return Err(Error::codegen("'void' cannot be concatenated")),
        "Z" => "Z",
        "C" => "C",
        "B" | "S" | "I" => "I",
        "J" => "J",
        "F" => "F",
        "D" => "D",
        STRING => STRING,
        _ => OBJECT,
    })
}

fn literal_type(token: &Token, negated: bool) -> Result<&'static str> {
    let ty = match token.kind {
        TokenKind::Integer(IntegerKind::Int) => INT,
        TokenKind::Integer(IntegerKind::Short) => "S",
        TokenKind::Integer(IntegerKind::Long) => "J",
        TokenKind::Float(FloatKind::Float) => "F",
        TokenKind::Float(FloatKind::Double) => "D",
        _ if negated => return Err(Error::codegen(format!("bad operand '{}' for unary operator '-'", token))),
        TokenKind::StringLiteral => STRING,
        TokenKind::CharLiteral => "C",
        TokenKind::Identifier if token.text == "true" || token.text == "false" => BOOLEAN,
        TokenKind::Identifier if token.text == "null" => NULL_TYPE,
        _ => return Err(Error::codegen(format!("unexpected literal '{}'", token))),
    };
    Ok(ty)
}

/// Value of an integer literal, sign applied.
fn integer_value(token: &Token, negated: bool) -> Result<i128> {
    let value: i128 = token
        .text
        .parse()
        .map_err(|_| Error::codegen(format!("integer literal '{}' is too large", token)))?;
    Ok(if negated { -value } else { value })
}

/// Int or short literal, possibly negated, that can narrow to byte, short
/// or char.
fn int_constant(calc: &Calc) -> Option<i128> {
    match calc.as_leaf()? {
        CalcArg::Value { value: Value::Literal(token), unary }
            if matches!(token.kind, TokenKind::Integer(IntegerKind::Int | IntegerKind::Short)) =>
        {
            let negated = match unary {
                None => false,
                Some(UnaryOp::Neg) => true,
                Some(_) => return None,
            };
            integer_value(token, negated).ok()
        }
        _ => None,
    }
}

fn fits(value: i128, desc: &str) -> bool {
    match desc {
        "B" => i8::try_from(value).is_ok(),
        "S" => i16::try_from(value).is_ok(),
        "C" => u16::try_from(value).is_ok(),
        _ => false,
    }
}

fn unary_type(op: UnaryOp, ty: &str) -> Result<String> {
    let result = match op {
        UnaryOp::Neg => types::promote(ty, ty),
        UnaryOp::Not => (ty == BOOLEAN).then_some(BOOLEAN),
        UnaryOp::BitNot if integral(ty) => types::promote(ty, ty),
        UnaryOp::BitNot => None,
    };
    result.map(str::to_string).ok_or_else(|| {
        Error::codegen(format!("bad operand type '{}' for unary operator '{}'", display_name(ty), op.symbol()))
    })
}

fn binary_result(op: BinaryOp, lt: &str, rt: &str) -> Result<String> {
    use BinaryOp::*;
    let bad = || {
        Error::codegen(format!(
            "bad operand types for '{}': '{}' and '{}'",
            op,
            display_name(lt),
            display_name(rt)
        ))
    };
    let both_numeric = types::is_numeric(lt) && types::is_numeric(rt);
    let result = match op {
        And | Or => (lt == BOOLEAN && rt == BOOLEAN).then_some(BOOLEAN),
        Eq | Ne => {
            let comparable = both_numeric
                || (lt == BOOLEAN && rt == BOOLEAN)
                || (types::is_reference_or_null(lt) && types::is_reference_or_null(rt));
            comparable.then_some(BOOLEAN)
        }
        Lt | Le | Gt | Ge => both_numeric.then_some(BOOLEAN),
        Add if (lt == STRING || rt == STRING) && lt != "V" && rt != "V" => Some(STRING),
        Add | Sub | Mul | Div | Rem => types::promote(lt, rt),
        BitAnd | BitOr | BitXor if lt == BOOLEAN && rt == BOOLEAN => Some(BOOLEAN),
        BitAnd | BitOr | BitXor => (integral(lt) && integral(rt)).then(|| types::promote(lt, rt)).flatten(),
        Shl | Shr | UShr => (integral(lt) && integral(rt)).then(|| types::promote(lt, lt)).flatten(),
    };
    result.map(str::to_string).ok_or_else(bad)
}

fn arithmetic_base(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add => IADD,
        BinaryOp::Sub => ISUB,
        BinaryOp::Mul => IMUL,
        BinaryOp::Div => IDIV,
        BinaryOp::Rem => IREM,
        BinaryOp::BitAnd => IAND,
        BinaryOp::BitOr => IOR,
        BinaryOp::BitXor => IXOR,
        BinaryOp::Shl => ISHL,
        BinaryOp::Shr => ISHR,
        _ => IUSHR,
    }
}

fn static_context(kind: &str, name: &str) -> Error {
    Error::codegen(format!("non-static {} '{}' cannot be referenced from a static context", kind, name))
}

impl<'a> Gen<'a> {
    fn finish(self) -> Result<CodeAttribute> {
        let max_stack = self.code.max_stack();
        let max_locals = self.slots.max_size();
        let bytes = self.code.finish()?;
        Ok(CodeAttribute::new(self.pool, max_stack, max_locals, bytes)?)
    }

    fn this_internal(&self) -> &'a str {
        let decl: &'a Declaration = self.decl;
        &decl.info().internal_name
    }

    fn location(&self, line: usize) -> SourceLocation {
        self.decl.info().location_at(line)
    }

    fn emit_ops(&mut self, ops: &[u8]) -> Result<()> {
        for op in ops {
            self.code.emitop(*op)?;
        }
        Ok(())
    }

    fn pop_value(&mut self, desc: &str) -> Result<()> {
        match Kind::of(desc).width() {
            0 => {}
            1 => self.code.emitop(POP)?,
            _ => self.code.emitop(POP2)?,
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // initializers

    fn gen_super_call(&mut self, superclass: &str, args: &[Calc]) -> Result<()> {
        self.code.emit_load(Kind::Reference, 0)?;
        let arg_types = self.arg_types(args)?;
        let params = self.constructor_params(superclass, &arg_types, false)?;
        self.gen_args(args, &params)?;
        let index = self.pool.add_method_ref(superclass, CONSTRUCTOR_METHOD_NAME, &method_descriptor(&params, "V"))?;
        self.code.emit_invoke(INVOKESPECIAL, index, slot_count(&params), 0)?;
        Ok(())
    }

    fn gen_field_inits<'f>(&mut self, fields: impl Iterator<Item = &'f FieldDecl>) -> Result<()> {
        for field in fields {
            let location = self.location(field.line);
            self.gen_field_init(field).at(|| location)?;
        }
        Ok(())
    }

    fn gen_field_init(&mut self, field: &FieldDecl) -> Result<()> {
        let Some(init) = &field.init else { return Ok(()) };
        let desc = self.scope.descriptor(&field.ty)?;
        let is_static = field.modifier.is_static;
        if !is_static {
            self.code.emit_load(Kind::Reference, 0)?;
        }
        self.gen_value(init, &desc)?;
        let index = self.pool.add_field_ref(self.this_internal(), &field.name, &desc)?;
        let op = if is_static { PUTSTATIC } else { PUTFIELD };
        self.code.emit_field(op, index, Kind::of(&desc).width())?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // statements

    fn gen_stats(&mut self, statements: &[Statement]) -> Result<()> {
        for stmt in statements {
            self.gen_stmt(stmt)?;
        }
        Ok(())
    }

    /// Statements in their own local-variable scope.
    fn gen_block(&mut self, statements: &[Statement]) -> Result<()> {
        self.slots.new_scope();
        let result = self.gen_stats(statements);
        self.slots.clear_scope();
        result
    }

    fn gen_stmt(&mut self, stmt: &Statement) -> Result<()> {
        let location = self.location(stmt.line);
        if !self.code.is_alive() {
            return Err(Error::codegen("unreachable statement").at(location));
        }
        self.gen_stmt_kind(&stmt.kind).at(|| location)
    }

    fn gen_stmt_kind(&mut self, kind: &StatementKind) -> Result<()> {
        match kind {
            StatementKind::Return(value) => self.gen_return(value.as_ref()),
            StatementKind::If(stmt) => {
                let end = self.code.new_label();
                self.gen_if(stmt, end)?;
                self.code.place(end);
                Ok(())
            }
            StatementKind::While { cond, body } => self.gen_while(cond, body),
            StatementKind::VarAssignment { target, declared: Some(ty), value } => {
                self.gen_declaration(target, ty, value)
            }
            StatementKind::VarAssignment { target, declared: None, value } => self.gen_assignment(target, value),
            StatementKind::Throw(value) => {
                let ty = self.gen_expr(value, None)?;
                if !types::is_reference_or_null(&ty) {
                    return Err(Error::mismatch("Throwable", display_name(&ty)));
                }
                self.code.emitop(ATHROW)?;
                Ok(())
            }
            StatementKind::Switch(switch) => self.gen_switch(switch),
            StatementKind::Expr(calc) => {
                let ty = self.gen_expr(calc, None)?;
                self.pop_value(&ty)
            }
        }
    }

    fn gen_return(&mut self, value: Option<&Calc>) -> Result<()> {
        let desc = self.return_desc.clone();
        match value {
            None if desc != "V" => Err(Error::codegen("missing return value")),
            None => Ok(self.code.emit_return(Kind::Void)?),
            Some(_) if desc == "V" => Err(Error::codegen("cannot return a value from a void method")),
            Some(value) => {
                self.gen_value(value, &desc)?;
                Ok(self.code.emit_return(Kind::of(&desc))?)
            }
        }
    }

    fn gen_if(&mut self, stmt: &IfStatement, end: Label) -> Result<()> {
        let otherwise = self.code.new_label();
        self.gen_cond(&stmt.cond, false, otherwise)?;
        self.gen_block(&stmt.body)?;
        if stmt.elif.is_some() || stmt.else_body.is_some() {
            self.code.emit_jump(GOTO, end)?;
        }
        self.code.place(otherwise);
        if let Some(elif) = &stmt.elif {
            self.gen_if(elif, end)?;
        } else if let Some(body) = &stmt.else_body {
            self.gen_block(body)?;
        }
        Ok(())
    }

    fn gen_while(&mut self, cond: &Calc, body: &[Statement]) -> Result<()> {
        let top = self.code.new_label();
        let end = self.code.new_label();
        self.code.place(top);
        self.gen_cond(cond, false, end)?;
        self.gen_block(body)?;
        self.code.emit_jump(GOTO, top)?;
        self.code.place(end);
        Ok(())
    }

    fn gen_declaration(&mut self, target: &Load, ty: &str, value: &Calc) -> Result<()> {
        let name = &target.name;
        if self.slots.lookup(name).is_some() {
            return Err(Error::redefinition("variable", name.clone()));
        }
        let desc = self.scope.descriptor(ty)?;
        if desc == "V" {
            return Err(Error::codegen(format!("variable '{}' cannot have type void", name)));
        }
        self.gen_value(value, &desc)?;
        let slot = self.slots.bind(name, &desc)?;
        if target.is_final {
            self.slots.set_final(name);
        }
        self.code.emit_store(Kind::of(&desc), slot)?;
        Ok(())
    }

    fn gen_assignment(&mut self, target: &Load, value: &Calc) -> Result<()> {
        let place = match self.resolve_load_base(target)? {
            Base::Value(place) => place,
            _ => return Err(Error::codegen(format!("cannot assign to '{}'", target))),
        };
        let final_error = |name: &str| Error::codegen(format!("cannot assign a value to final variable '{}'", name));
        match place {
            Place::Local { name, slot, desc, is_final } => {
                if is_final {
                    return Err(final_error(&name));
                }
                self.gen_value(value, &desc)?;
                self.code.emit_store(Kind::of(&desc), slot)?;
            }
            Place::Field { receiver, field } => {
                let own = field.owner == self.this_internal()
                    && matches!(receiver.as_deref(), None | Some(Place::This));
                if field.is_final && !(self.initializer && own && field.is_static == self.is_static) {
                    return Err(final_error(&field.name));
                }
                if let Some(receiver) = &receiver {
                    self.gen_place(receiver)?;
                }
                self.gen_value(value, &field.desc)?;
                let index = self.pool.add_field_ref(&field.owner, &field.name, &field.desc)?;
                let op = if field.is_static { PUTSTATIC } else { PUTFIELD };
                self.code.emit_field(op, index, Kind::of(&field.desc).width())?;
            }
            Place::This | Place::Length(_) => {
                return Err(Error::codegen(format!("cannot assign to '{}'", target)));
            }
        }
        Ok(())
    }

    fn gen_switch(&mut self, switch: &SwitchStatement) -> Result<()> {
        let ty = self.gen_expr(&switch.scrutinee, None)?;
        if !types::is_int_family(&ty) {
            return Err(Error::mismatch("int", display_name(&ty)));
        }
        let end = self.code.new_label();
        let branches: Vec<Label> = switch.branches.iter().map(|_| self.code.new_label()).collect();
        let default = if switch.default.is_some() { self.code.new_label() } else { end };
        let mut pairs = Vec::with_capacity(switch.cases.len());
        for (key, index) in &switch.cases {
            let label = branches.get(*index).copied().ok_or_else(|| Error::codegen("case without a branch"))?;
            pairs.push((*key, label));
        }
        self.code.emit_lookupswitch(default, &pairs)?;
        for (label, body) in branches.iter().zip(&switch.branches) {
            self.code.place(*label);
            self.gen_block(body)?;
            self.code.emit_jump(GOTO, end)?;
        }
        if let Some(body) = &switch.default {
            self.code.place(default);
            self.gen_block(body)?;
        }
        self.code.place(end);
        Ok(())
    }

    // ------------------------------------------------------------------
    // conditions

    /// Jump to `target` when `calc` evaluates to `jump_when`; fall through
    /// otherwise.
    fn gen_cond(&mut self, calc: &Calc, jump_when: bool, target: Label) -> Result<()> {
        match &calc.kind {
            CalcKind::Binary { op: BinaryOp::And, left, right } => {
                if jump_when {
                    let skip = self.code.new_label();
                    self.gen_cond(left, false, skip)?;
                    self.gen_cond(right, true, target)?;
                    self.code.place(skip);
                } else {
                    self.gen_cond(left, false, target)?;
                    self.gen_cond(right, false, target)?;
                }
                Ok(())
            }
            CalcKind::Binary { op: BinaryOp::Or, left, right } => {
                if jump_when {
                    self.gen_cond(left, true, target)?;
                    self.gen_cond(right, true, target)?;
                } else {
                    let skip = self.code.new_label();
                    self.gen_cond(left, true, skip)?;
                    self.gen_cond(right, false, target)?;
                    self.code.place(skip);
                }
                Ok(())
            }
            CalcKind::Binary { op, left, right } if op.is_comparison() => {
                self.gen_compare(*op, left, right, jump_when, target)
            }
            CalcKind::Leaf(arg) => match arg.as_ref() {
                CalcArg::Value { value: Value::Nested(inner), unary: Some(UnaryOp::Not) } => {
                    self.gen_cond(inner, !jump_when, target)
                }
                CalcArg::Value { value, unary: Some(UnaryOp::Not) } => {
                    let inner = Calc::leaf(CalcArg::Value { value: value.clone(), unary: None });
                    self.gen_cond(&inner, !jump_when, target)
                }
                CalcArg::Value { value: Value::Nested(inner), unary: None } => self.gen_cond(inner, jump_when, target),
                CalcArg::Value { value: Value::Literal(token), unary: None }
                    if token.is_word("true") || token.is_word("false") =>
                {
                    if token.is_word("true") == jump_when {
                        self.code.emit_jump(GOTO, target)?;
                    }
                    Ok(())
                }
                _ => self.gen_test(calc, jump_when, target),
            },
            CalcKind::Binary { .. } => self.gen_test(calc, jump_when, target),
        }
    }

    /// Evaluate a boolean and branch on it.
    fn gen_test(&mut self, calc: &Calc, jump_when: bool, target: Label) -> Result<()> {
        let ty = self.gen_expr(calc, None)?;
        if ty != BOOLEAN {
            return Err(Error::mismatch("boolean", display_name(&ty)));
        }
        self.code.emit_jump(if jump_when { IFNE } else { IFEQ }, target)?;
        Ok(())
    }

    fn gen_compare(&mut self, op: BinaryOp, left: &Calc, right: &Calc, jump_when: bool, target: Label) -> Result<()> {
        let lt = self.type_of(left, None)?;
        let rt = self.type_of(right, None)?;
        binary_result(op, &lt, &rt)?;
        let cond = if jump_when { op } else { negate(op) };
        if let Some(ty) = types::promote(&lt, &rt) {
            if ty == INT && int_constant(right) == Some(0) {
                self.gen_expr(left, None)?;
                return Ok(self.code.emit_jump(IFEQ + cond_offset(cond), target)?);
            }
            self.gen_expr(left, None)?;
            self.widen(&lt, ty)?;
            self.gen_expr(right, None)?;
            self.widen(&rt, ty)?;
            let below = matches!(op, BinaryOp::Lt | BinaryOp::Le);
            match Kind::of(ty) {
                Kind::Int => return Ok(self.code.emit_jump(IF_ICMPEQ + cond_offset(cond), target)?),
                Kind::Long => self.code.emitop(LCMP)?,
                Kind::Float => self.code.emitop(if below { FCMPG } else { FCMPL })?,
                _ => self.code.emitop(if below { DCMPG } else { DCMPL })?,
            }
            self.code.emit_jump(IFEQ + cond_offset(cond), target)?;
        } else if lt == BOOLEAN {
            self.gen_expr(left, None)?;
            self.gen_expr(right, None)?;
            self.code.emit_jump(IF_ICMPEQ + cond_offset(cond), target)?;
        } else {
            let is_eq = cond == BinaryOp::Eq;
            if rt == NULL_TYPE || lt == NULL_TYPE {
                let operand = if rt == NULL_TYPE { left } else { right };
                self.gen_expr(operand, None)?;
                self.code.emit_jump(if is_eq { IFNULL } else { IFNONNULL }, target)?;
            } else {
                self.gen_expr(left, None)?;
                self.gen_expr(right, None)?;
                self.code.emit_jump(if is_eq { IF_ACMPEQ } else { IF_ACMPNE }, target)?;
            }
        }
        Ok(())
    }

    /// 0 or 1 for a comparison or logical expression.
    fn gen_cond_value(&mut self, calc: &Calc) -> Result<String> {
        let otherwise = self.code.new_label();
        let end = self.code.new_label();
        self.gen_cond(calc, false, otherwise)?;
        self.code.emitop(ICONST_1)?;
        self.code.emit_jump(GOTO, end)?;
        self.code.place(otherwise);
        self.code.emitop(ICONST_0)?;
        self.code.place(end);
        Ok(BOOLEAN.to_string())
    }

    // ------------------------------------------------------------------
    // typing

    /// Descriptor `calc` leaves on the stack. `expected` only shapes array
    /// literals.
    fn type_of(&self, calc: &Calc, expected: Option<&str>) -> Result<String> {
        match &calc.kind {
            CalcKind::Leaf(arg) => self.arg_type(arg, expected),
            CalcKind::Binary { op, left, right } => {
                let lt = self.type_of(left, None)?;
                let rt = self.type_of(right, None)?;
                binary_result(*op, &lt, &rt)
            }
        }
    }

    fn arg_type(&self, arg: &CalcArg, expected: Option<&str>) -> Result<String> {
        match arg {
            CalcArg::Value { value, unary } => {
                let ty = match value {
                    Value::Literal(token) if *unary == Some(UnaryOp::Neg) => {
                        return Ok(literal_type(token, true)?.to_string());
                    }
                    Value::Literal(token) => literal_type(token, false)?.to_string(),
                    Value::Load(load) => self.load_type(load)?,
                    Value::Nested(calc) => self.type_of(calc, expected)?,
                };
                match unary {
                    Some(op) => unary_type(*op, &ty),
                    None => Ok(ty),
                }
            }
            CalcArg::Cast { target, .. } => self.scope.descriptor(target),
            CalcArg::ArrayCreation { elements } => self.array_type(elements, expected),
            CalcArg::New { class, .. } => Ok(object(&self.scope.internal_name(class)?)),
        }
    }

    fn array_type(&self, elements: &[Calc], expected: Option<&str>) -> Result<String> {
        if let Some(expected) = expected.filter(|e| e.starts_with('[')) {
            return Ok(expected.to_string());
        }
        let first = elements
            .first()
            .ok_or_else(|| Error::codegen("cannot infer the element type of an empty array literal"))?;
        match self.type_of(first, None)?.as_str() {
            "V" => Err(Error::codegen("array elements cannot be void")),
            NULL_TYPE => Ok(format!("[{}", OBJECT)),
            ty => Ok(format!("[{}", ty)),
        }
    }

    fn arg_types(&self, args: &[Calc]) -> Result<Vec<String>> {
        args.iter().map(|arg| self.type_of(arg, None)).collect()
    }

    fn load_type(&self, load: &Load) -> Result<String> {
        let base = self.resolve_load_base(load)?;
        match &load.call {
            None => match base {
                Base::Value(place) => Ok(self.place_desc(&place)),
                _ => Err(Error::codegen(format!("'{}' is not a value", load))),
            },
            Some(call) => {
                let methods = self.resolve_chain(&base, call)?;
                Ok(methods.last().map_or_else(|| "V".to_string(), |m| m.ret.clone()))
            }
        }
    }

    // ------------------------------------------------------------------
    // name resolution

    fn resolve_load_base(&self, load: &Load) -> Result<Base> {
        match (&load.owner, load.name.is_empty()) {
            (None, true) => Ok(Base::Implicit),
            (Some(owner), true) => self.resolve_name(owner),
            (None, false) => self.resolve_name(&load.name),
            (Some(owner), false) => {
                let base = self.resolve_name(owner)?;
                Ok(Base::Value(self.resolve_member(base, &load.name)?))
            }
        }
    }

    /// Unqualified name: `this`, a local, a field of the current
    /// declaration, or a type.
    fn resolve_name(&self, name: &str) -> Result<Base> {
        if name == "this" {
            if self.is_static {
                return Err(static_context("variable", "this"));
            }
            return Ok(Base::Value(Place::This));
        }
        if let Some(binding) = self.slots.lookup(name) {
            return Ok(Base::Value(Place::Local {
                name: name.to_string(),
                slot: binding.offset,
                desc: binding.descriptor.clone().unwrap_or_else(|| OBJECT.to_string()),
                is_final: binding.is_final,
            }));
        }
        if let Some(field) = self.find_field(self.this_internal(), name)? {
            let field = self.check_field_access(field)?;
            if field.is_static {
                return Ok(Base::Value(Place::Field { receiver: None, field }));
            }
            if self.is_static {
                return Err(static_context("variable", name));
            }
            return Ok(Base::Value(Place::Field { receiver: Some(Box::new(Place::This)), field }));
        }
        if let Ok(ResolvedType::Class(qualified)) = self.scope.resolve(name) {
            return Ok(Base::Type(crate::review::types::internal_name(&qualified, self.decls)));
        }
        Err(Error::codegen(format!("cannot find symbol '{}'", name)))
    }

    fn resolve_member(&self, base: Base, name: &str) -> Result<Place> {
        let not_found = |owner: &str| {
            Error::codegen(format!("cannot find symbol '{}' in '{}'", name, display_name(&object(owner))))
        };
        match base {
            Base::Implicit => match self.resolve_name(name)? {
                Base::Value(place) => Ok(place),
                _ => Err(Error::codegen(format!("'{}' is not a value", name))),
            },
            Base::Type(owner) => {
                let field = self.find_field(&owner, name)?.ok_or_else(|| not_found(&owner))?;
                let field = self.check_field_access(field)?;
                if !field.is_static {
                    return Err(static_context("variable", name));
                }
                Ok(Place::Field { receiver: None, field })
            }
            Base::Value(place) => {
                let desc = self.place_desc(&place);
                if desc.starts_with('[') && name == "length" {
                    return Ok(Place::Length(Box::new(place)));
                }
                let owner = class_of(&desc).ok_or_else(|| {
                    Error::codegen(format!("cannot access '{}' on '{}'", name, display_name(&desc)))
                })?;
                let field = self.find_field(owner, name)?.ok_or_else(|| not_found(owner))?;
                let field = self.check_field_access(field)?;
                let receiver = if field.is_static { None } else { Some(Box::new(place)) };
                Ok(Place::Field { receiver, field })
            }
        }
    }

    fn check_field_access(&self, field: FieldRef) -> Result<FieldRef> {
        if field.is_private && field.owner != self.this_internal() {
            return Err(Error::codegen(format!(
                "'{}' has private access in '{}'",
                field.name,
                display_name(&object(&field.owner))
            )));
        }
        Ok(field)
    }

    fn place_desc(&self, place: &Place) -> String {
        match place {
            Place::This => object(self.this_internal()),
            Place::Local { desc, .. } => desc.clone(),
            Place::Field { field, .. } => field.desc.clone(),
            Place::Length(_) => INT.to_string(),
        }
    }

    /// Field `name` of a file-local declaration or its local superclasses.
    fn find_field(&self, owner: &str, name: &str) -> Result<Option<FieldRef>> {
        let mut current = Some(owner.to_string());
        while let Some(internal) = current.take() {
            let Some(decl) = types::find_by_internal(self.decls, &internal) else { break };
            let scope = TypeScope::new(decl.info(), self.decls);
            let declared = match decl {
                Declaration::Class(c) => c.fields.get(name),
                Declaration::Record(r) => r.fields.get(name),
                Declaration::Enumeration(e) => {
                    if e.values.iter().any(|v| v == name) {
                        return Ok(Some(FieldRef {
                            desc: object(&internal),
                            owner: internal,
                            name: name.to_string(),
                            is_static: true,
                            is_final: true,
                            is_private: false,
                        }));
                    }
                    None
                }
                Declaration::Interface(_) => None,
            };
            if let Some(field) = declared {
                let modifier = &field.modifier;
                return Ok(Some(FieldRef {
                    desc: scope.descriptor(&field.ty)?,
                    owner: internal,
                    name: name.to_string(),
                    is_static: modifier.is_static,
                    is_final: modifier.is_final || modifier.is_const,
                    is_private: modifier.access == AccessLevel::Private,
                }));
            }
            current = match decl {
                Declaration::Class(c) => c.superclass.as_deref().map(|s| scope.internal_name(s)).transpose()?,
                _ => None,
            };
        }
        Ok(None)
    }

    fn applicable(&self, params: &[String], arg_types: &[String]) -> bool {
        params.len() == arg_types.len()
            && params
                .iter()
                .zip(arg_types)
                .all(|(p, a)| matches!(coercion(a, p, self.decls), Some(Coercion::Convert(_))))
    }

    /// Exact match first, then the first applicable candidate in declaration order.
    fn select(&self, candidates: &[Vec<String>], arg_types: &[String]) -> Option<usize> {
        candidates
            .iter()
            .position(|params| params.as_slice() == arg_types)
            .or_else(|| candidates.iter().position(|params| self.applicable(params, arg_types)))
    }

    fn method_candidates(&self, decl: &Declaration, internal: &str, name: &str) -> Result<Vec<MethodRef>> {
        let scope = TypeScope::new(decl.info(), self.decls);
        let mut candidates = Vec::new();
        match decl {
            Declaration::Class(_) | Declaration::Interface(_) => {
                for method in decl.methods().into_iter().flat_map(|m| m.values()).filter(|m| m.name == name) {
                    let desc = scope
                        .with_generics(&method.generics)
                        .method_descriptor(&method.params, method.return_type.as_deref())?;
                    let is_private = method.modifier.access == AccessLevel::Private;
                    candidates.push(MethodRef::new(
                        internal,
                        name,
                        desc,
                        method.modifier.is_static,
                        is_private,
                        decl.is_interface(),
                    )?);
                }
            }
            Declaration::Record(r) => {
                if let Some(field) = r.fields.get(name) {
                    let desc = format!("(){}", scope.descriptor(&field.ty)?);
                    candidates.push(MethodRef::new(internal, name, desc, false, false, false)?);
                }
            }
            Declaration::Enumeration(_) => {
                let this = object(internal);
                let (desc, is_static) = match name {
                    "values" => (format!("()[{}", this), true),
                    "valueOf" => (format!("({}){}", STRING, this), true),
                    "name" => (format!("(){}", STRING), false),
                    "ordinal" => ("()I".to_string(), false),
                    _ => return Ok(candidates),
                };
                candidates.push(MethodRef::new(internal, name, desc, is_static, false, false)?);
            }
        }
        Ok(candidates)
    }

    /// Method `name` applicable to `arg_types`, searched through `owner`
    /// and its file-local supertypes.
    fn find_method(&self, owner: &str, name: &str, arg_types: &[String]) -> Result<Option<MethodRef>> {
        let mut pending = vec![owner.to_string()];
        let mut seen: Vec<String> = Vec::new();
        while !pending.is_empty() {
            let internal = pending.remove(0);
            if seen.contains(&internal) {
                continue;
            }
            if let Some(decl) = types::find_by_internal(self.decls, &internal) {
                let candidates = self.method_candidates(decl, &internal, name)?;
                let params: Vec<Vec<String>> = candidates.iter().map(|m| m.params.clone()).collect();
                if let Some(index) = self.select(&params, arg_types) {
                    return Ok(candidates.into_iter().nth(index));
                }
                pending.extend(types::direct_supertypes(decl, self.decls));
            }
            seen.push(internal);
        }
        Ok(None)
    }

    /// One resolved method per link of the chain, in call order.
    fn resolve_chain(&self, base: &Base, call: &Call) -> Result<Vec<MethodRef>> {
        let mut methods: Vec<MethodRef> = Vec::new();
        for link in call.links() {
            let arg_types = self.arg_types(&link.args)?;
            let owner = match (methods.last(), base) {
                (Some(prev), _) => class_of(&prev.ret)
                    .ok_or_else(|| {
                        Error::codegen(format!("cannot call '{}' on '{}'", link.name, display_name(&prev.ret)))
                    })?
                    .to_string(),
                (None, Base::Implicit) => self.this_internal().to_string(),
                (None, Base::Type(owner)) => owner.clone(),
                (None, Base::Value(place)) => {
                    let desc = self.place_desc(place);
                    class_of(&desc)
                        .ok_or_else(|| {
                            Error::codegen(format!("cannot call '{}' on '{}'", link.name, display_name(&desc)))
                        })?
                        .to_string()
                }
            };
            let method = self.find_method(&owner, &link.name, &arg_types)?.ok_or_else(|| {
                let shown: Vec<String> = arg_types.iter().map(|t| display_name(t)).collect();
                Error::codegen(format!(
                    "cannot find method '{}({})' in '{}'",
                    link.name,
                    shown.join(", "),
                    display_name(&object(&owner))
                ))
            })?;
            if method.is_private && method.owner != self.this_internal() {
                return Err(Error::codegen(format!(
                    "'{}' has private access in '{}'",
                    method.name,
                    display_name(&object(&method.owner))
                )));
            }
            let needs_instance = match base {
                Base::Type(_) => methods.is_empty(),
                Base::Implicit => methods.is_empty() && self.is_static,
                Base::Value(_) => false,
            };
            if needs_instance && !method.is_static {
                return Err(static_context("method", &method.name));
            }
            methods.push(method);
        }
        Ok(methods)
    }

    // ------------------------------------------------------------------
    // expressions

    /// Generate `calc` and convert it to `expected`.
    fn gen_value(&mut self, calc: &Calc, expected: &str) -> Result<()> {
        if let Some(value) = int_constant(calc).filter(|v| fits(*v, expected)) {
            self.push_int(value as i32)?;
            return Ok(());
        }
        let found = self.gen_expr(calc, Some(expected))?;
        self.coerce(&found, expected)
    }

    fn coerce(&mut self, found: &str, expected: &str) -> Result<()> {
        match coercion(found, expected, self.decls) {
            Some(Coercion::Convert(ops)) => self.emit_ops(&ops),
            Some(Coercion::CheckCast(class)) => {
                let index = self.pool.add_class(&class)?;
                Ok(self.code.emitop2(CHECKCAST, index)?)
            }
            None => Err(Error::mismatch(display_name(expected), display_name(found))),
        }
    }

    fn widen(&mut self, from: &str, to: &str) -> Result<()> {
        let ops = types::widening(from, to).ok_or_else(|| Error::mismatch(display_name(to), display_name(from)))?;
        self.emit_ops(&ops)
    }

    fn gen_args(&mut self, args: &[Calc], params: &[String]) -> Result<()> {
        for (arg, param) in args.iter().zip(params) {
            self.gen_value(arg, param)?;
        }
        Ok(())
    }

    fn gen_expr(&mut self, calc: &Calc, expected: Option<&str>) -> Result<String> {
        match &calc.kind {
            CalcKind::Leaf(arg) => self.gen_arg(arg, expected),
            CalcKind::Binary { op, .. } if op.is_comparison() || op.is_logical() => self.gen_cond_value(calc),
            CalcKind::Binary { op, left, right } => self.gen_binary(calc, *op, left, right),
        }
    }

    fn gen_binary(&mut self, calc: &Calc, op: BinaryOp, left: &Calc, right: &Calc) -> Result<String> {
        let lt = self.type_of(left, None)?;
        let rt = self.type_of(right, None)?;
        let ty = binary_result(op, &lt, &rt)?;
        if ty == STRING {
            return self.gen_concat(calc);
        }
        self.gen_expr(left, None)?;
        self.widen(&lt, &ty)?;
        self.gen_expr(right, None)?;
        if matches!(op, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::UShr) {
            if rt == "J" {
                self.code.emitop(L2I)?;
            }
        } else {
            self.widen(&rt, &ty)?;
        }
        self.code.emitop(arithmetic_base(op) + Kind::of(&ty).family_offset())?;
        Ok(ty)
    }

    /// Operands of a `+` chain that builds a String, left to right.
    fn concat_parts<'c>(&self, calc: &'c Calc, parts: &mut Vec<&'c Calc>) -> Result<()> {
        if let CalcKind::Binary { op: BinaryOp::Add, left, right } = &calc.kind {
            if self.type_of(calc, None)? == STRING {
                self.concat_parts(left, parts)?;
                self.concat_parts(right, parts)?;
                return Ok(());
            }
        }
        parts.push(calc);
        Ok(())
    }

    fn gen_concat(&mut self, calc: &Calc) -> Result<String> {
        let mut parts = Vec::new();
        self.concat_parts(calc, &mut parts)?;
        let builder = JAVA_LANG_STRING_BUILDER;
        let class = self.pool.add_class(builder)?;
        self.code.emitop2(NEW, class)?;
        self.code.emitop(DUP)?;
        let init = self.pool.add_method_ref(builder, CONSTRUCTOR_METHOD_NAME, "()V")?;
        self.code.emit_invoke(INVOKESPECIAL, init, 0, 0)?;
        for part in parts {
            let ty = self.gen_expr(part, None)?;
            let arg = append_descriptor(&ty)?;
            let desc = format!("({}){}", arg, object(builder));
            let append = self.pool.add_method_ref(builder, "append", &desc)?;
            self.code.emit_invoke(INVOKEVIRTUAL, append, Kind::of(arg).width(), 1)?;
        }
        let to_string = self.pool.add_method_ref(builder, "toString", &format!("(){}", STRING))?;
        self.code.emit_invoke(INVOKEVIRTUAL, to_string, 0, 1)?;
        Ok(STRING.to_string())
    }

    fn gen_arg(&mut self, arg: &CalcArg, expected: Option<&str>) -> Result<String> {
        match arg {
            CalcArg::Value { value: Value::Literal(token), unary: Some(UnaryOp::Neg) } => self.gen_literal(token, true),
            CalcArg::Value { value, unary } => {
                let ty = match value {
                    Value::Literal(token) => self.gen_literal(token, false)?,
                    Value::Load(load) => self.gen_load(load)?,
                    Value::Nested(calc) => self.gen_expr(calc, expected)?,
                };
                match unary {
                    Some(op) => self.gen_unary(*op, &ty),
                    None => Ok(ty),
                }
            }
            CalcArg::Cast { inner, target } => self.gen_cast(inner, target),
            CalcArg::ArrayCreation { elements } => self.gen_array(elements, expected),
            CalcArg::New { class, args } => self.gen_new(class, args),
        }
    }

    fn gen_unary(&mut self, op: UnaryOp, ty: &str) -> Result<String> {
        let result = unary_type(op, ty)?;
        match op {
            UnaryOp::Neg => self.code.emitop(INEG + Kind::of(&result).family_offset())?,
            UnaryOp::Not => {
                self.code.emitop(ICONST_1)?;
                self.code.emitop(IXOR)?;
            }
            UnaryOp::BitNot if result == "J" => {
                let index = self.pool.add_long(-1)?;
                self.code.emit_ldc(index, 2)?;
                self.code.emitop(LXOR)?;
            }
            UnaryOp::BitNot => {
                self.code.emitop(ICONST_M1)?;
                self.code.emitop(IXOR)?;
            }
        }
        Ok(result)
    }

    fn push_int(&mut self, value: i32) -> Result<()> {
        if !self.code.emit_int(value)? {
            let index = self.pool.add_integer(value)?;
            self.code.emit_ldc(index, 1)?;
        }
        Ok(())
    }

    fn gen_literal(&mut self, token: &Token, negated: bool) -> Result<String> {
        let ty = literal_type(token, negated)?;
        let out_of_range = || {
            let sign = if negated { "-" } else { "" };
            Error::codegen(format!("literal {}{} is out of range for '{}'", sign, token, display_name(ty)))
        };
        match token.kind {
            TokenKind::Integer(IntegerKind::Long) => {
                let value = i64::try_from(integer_value(token, negated)?).map_err(|_| out_of_range())?;
                match value {
                    0 | 1 => self.code.emitop(LCONST_0 + value as u8)?,
                    _ => {
                        let index = self.pool.add_long(value)?;
                        self.code.emit_ldc(index, 2)?;
                    }
                }
            }
            TokenKind::Integer(IntegerKind::Short) => {
                let value = i16::try_from(integer_value(token, negated)?).map_err(|_| out_of_range())?;
                self.push_int(i32::from(value))?;
            }
            TokenKind::Integer(IntegerKind::Int) => {
                let value = i32::try_from(integer_value(token, negated)?).map_err(|_| out_of_range())?;
                self.push_int(value)?;
            }
            TokenKind::Float(FloatKind::Float) => {
                let value: f32 = token.text.parse().map_err(|_| out_of_range())?;
                let value = if negated { -value } else { value };
                match [0.0f32, 1.0, 2.0].iter().position(|c| c.to_bits() == value.to_bits()) {
                    Some(n) => self.code.emitop(FCONST_0 + n as u8)?,
                    None => {
                        let index = self.pool.add_float(value)?;
                        self.code.emit_ldc(index, 1)?;
                    }
                }
            }
            TokenKind::Float(FloatKind::Double) => {
                let value: f64 = token.text.parse().map_err(|_| out_of_range())?;
                let value = if negated { -value } else { value };
                match [0.0f64, 1.0].iter().position(|c| c.to_bits() == value.to_bits()) {
                    Some(n) => self.code.emitop(DCONST_0 + n as u8)?,
                    None => {
                        let index = self.pool.add_double(value)?;
                        self.code.emit_ldc(index, 2)?;
                    }
                }
            }
            TokenKind::StringLiteral => {
                let index = self.pool.add_string(&token.text)?;
                self.code.emit_ldc(index, 1)?;
            }
            TokenKind::CharLiteral => {
                let ch = token.text.chars().next().map_or(0, u32::from);
                let value = u16::try_from(ch).map_err(|_| out_of_range())?;
                self.push_int(i32::from(value))?;
            }
            _ => match token.text.as_str() {
                "true" => self.code.emitop(ICONST_1)?,
                "false" => self.code.emitop(ICONST_0)?,
                _ => self.code.emitop(ACONST_NULL)?,
            },
        }
        Ok(ty.to_string())
    }

    fn gen_cast(&mut self, inner: &Calc, target: &str) -> Result<String> {
        let to = self.scope.descriptor(target)?;
        let from = self.gen_expr(inner, None)?;
        let cannot = || Error::codegen(format!("cannot cast '{}' to '{}'", display_name(&from), display_name(&to)));
        if !is_reference(&to) {
            let ops = types::primitive_cast(&from, &to).ok_or_else(cannot)?;
            self.emit_ops(&ops)?;
        } else if is_reference(&from) {
            if !matches!(coercion(&from, &to, self.decls), Some(Coercion::Convert(_))) {
                let index = self.pool.add_class(class_of(&to).unwrap_or(&to))?;
                self.code.emitop2(CHECKCAST, index)?;
            }
        } else if from != NULL_TYPE {
            return Err(cannot());
        }
        Ok(to)
    }

    fn gen_array(&mut self, elements: &[Calc], expected: Option<&str>) -> Result<String> {
        let desc = self.array_type(elements, expected)?;
        let element = desc[1..].to_string();
        let length = i32::try_from(elements.len()).map_err(|_| Error::codegen("array literal is too long"))?;
        self.push_int(length)?;
        match types::newarray_code(&element) {
            Some(code) => self.code.emitop1(NEWARRAY, code)?,
            None => {
                let class = self.pool.add_class(class_of(&element).unwrap_or(&element))?;
                self.code.emitop2(ANEWARRAY, class)?;
            }
        }
        for (index, value) in (0..length).zip(elements) {
            self.code.emitop(DUP)?;
            self.push_int(index)?;
            self.gen_value(value, &element)?;
            self.code.emitop(types::array_store(&element))?;
        }
        Ok(desc)
    }

    /// Parameter descriptors of the constructor `new` or a super call
    /// reaches. Classes outside the file take the argument types as given.
    fn constructor_params(&self, internal: &str, arg_types: &[String], instantiate: bool) -> Result<Vec<String>> {
        let Some(decl) = types::find_by_internal(self.decls, internal) else {
            return Ok(arg_types
                .iter()
                .map(|t| if t == NULL_TYPE { OBJECT.to_string() } else { t.clone() })
                .collect());
        };
        let scope = TypeScope::new(decl.info(), self.decls);
        let candidates: Vec<Vec<String>> = match decl {
            Declaration::Class(c) => {
                if instantiate && c.info.modifier.is_abstract {
                    return Err(Error::codegen(format!("'{}' is abstract; cannot be instantiated", c.info.name)));
                }
                c.constructors
                    .values()
                    .map(|ctor| ctor.params.iter().map(|p| scope.descriptor(&p.ty)).collect())
                    .collect::<Result<_>>()?
            }
            Declaration::Record(r) => {
                vec![r.fields.values().map(|f| scope.descriptor(&f.ty)).collect::<Result<_>>()?]
            }
            _ => {
                return Err(Error::codegen(format!("'{}' cannot be instantiated", decl.name())));
            }
        };
        let index = self.select(&candidates, arg_types).ok_or_else(|| {
            let shown: Vec<String> = arg_types.iter().map(|t| display_name(t)).collect();
            Error::codegen(format!("no constructor of '{}' takes ({})", decl.name(), shown.join(", ")))
        })?;
        Ok(candidates[index].clone())
    }

    fn gen_new(&mut self, class: &str, args: &[Calc]) -> Result<String> {
        let desc = self.scope.descriptor(class)?;
        let internal = class_of(&desc)
            .map(str::to_string)
            .ok_or_else(|| Error::codegen(format!("'{}' cannot be instantiated", class)))?;
        let arg_types = self.arg_types(args)?;
        let params = self.constructor_params(&internal, &arg_types, true)?;
        let class_index = self.pool.add_class(&internal)?;
        self.code.emitop2(NEW, class_index)?;
        self.code.emitop(DUP)?;
        self.gen_args(args, &params)?;
        let init = self.pool.add_method_ref(&internal, CONSTRUCTOR_METHOD_NAME, &method_descriptor(&params, "V"))?;
        self.code.emit_invoke(INVOKESPECIAL, init, slot_count(&params), 0)?;
        Ok(object(&internal))
    }

    fn gen_place(&mut self, place: &Place) -> Result<()> {
        match place {
            Place::This => self.code.emit_load(Kind::Reference, 0)?,
            Place::Local { slot, desc, .. } => self.code.emit_load(Kind::of(desc), *slot)?,
            Place::Field { receiver, field } => {
                if let Some(receiver) = receiver {
                    self.gen_place(receiver)?;
                }
                let index = self.pool.add_field_ref(&field.owner, &field.name, &field.desc)?;
                let op = if field.is_static { GETSTATIC } else { GETFIELD };
                self.code.emit_field(op, index, Kind::of(&field.desc).width())?;
            }
            Place::Length(array) => {
                self.gen_place(array)?;
                self.code.emitop(ARRAYLENGTH)?;
            }
        }
        Ok(())
    }

    fn gen_load(&mut self, load: &Load) -> Result<String> {
        let base = self.resolve_load_base(load)?;
        let Some(call) = &load.call else {
            return match base {
                Base::Value(place) => {
                    self.gen_place(&place)?;
                    Ok(self.place_desc(&place))
                }
                _ => Err(Error::codegen(format!("'{}' is not a value", load))),
            };
        };
        let methods = self.resolve_chain(&base, call)?;
        for (i, (link, method)) in call.links().into_iter().zip(&methods).enumerate() {
            if i == 0 {
                if !method.is_static {
                    match &base {
                        Base::Implicit => self.code.emit_load(Kind::Reference, 0)?,
                        Base::Value(place) => self.gen_place(place)?,
                        Base::Type(_) => {}
                    }
                }
            } else if method.is_static {
                // receiver produced by the previous link is not needed
                self.code.emitop(POP)?;
            }
            self.gen_args(&link.args, &method.params)?;
            self.invoke(method)?;
        }
        Ok(methods.last().map_or_else(|| "V".to_string(), |m| m.ret.clone()))
    }

    fn invoke(&mut self, method: &MethodRef) -> Result<()> {
        let index = if method.on_interface {
            self.pool.add_interface_method_ref(&method.owner, &method.name, &method.desc)?
        } else {
            self.pool.add_method_ref(&method.owner, &method.name, &method.desc)?
        };
        let ret = Kind::of(&method.ret).width();
        self.code.emit_invoke(method.invoke_op(), index, slot_count(&method.params), ret)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_file;
    use std::path::Path;

    fn decls(src: &str) -> IndexMap<String, Declaration> {
        let mut decls: IndexMap<String, Declaration> = parse_file(Path::new("p/T.ktj"), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect();
        crate::review::review(&mut decls).unwrap();
        decls
    }

    fn compile(src: &str, key: &str) -> Result<(ConstantPool, CodeAttribute)> {
        let decls = decls(src);
        let decl = &decls["p.T"];
        let method = &decl.methods().unwrap()[key];
        let mut pool = ConstantPool::new();
        let code = method_code(&mut pool, decl, &decls, method)?;
        Ok((pool, code))
    }

    fn ops(code: &CodeAttribute) -> Vec<u8> {
        decode(&code.code).unwrap().iter().map(|i| i.opcode).collect()
    }

    fn class(body: &str) -> String {
        format!("class T {{\n{}\n}}\n", body)
    }

    #[test]
    fn int_addition() {
        let src = class("  int add(int a, int b) {\n    return a + b\n  }");
        let (_, code) = compile(&src, "add(int,int)").unwrap();
        assert_eq!(ops(&code), vec![ILOAD_1, ILOAD_2, IADD, IRETURN]);
        assert_eq!(code.max_stack, 2);
        assert_eq!(code.max_locals, 3);
    }

    #[test]
    fn mixed_operands_are_promoted() {
        let src = class("  static long f(int a, long b) {\n    return a + b\n  }");
        let (_, code) = compile(&src, "f(int,long)").unwrap();
        assert_eq!(ops(&code), vec![ILOAD_0, I2L, LLOAD_1, LADD, LRETURN]);
        assert_eq!(code.max_locals, 3);
    }

    #[test]
    fn string_concatenation_uses_builder() {
        let src = class("  String f(int a) {\n    return \"n=\" + a\n  }");
        let (pool, code) = compile(&src, "f(int)").unwrap();
        assert_eq!(
            ops(&code),
            vec![NEW, DUP, INVOKESPECIAL, LDC, INVOKEVIRTUAL, ILOAD_1, INVOKEVIRTUAL, INVOKEVIRTUAL, ARETURN]
        );
        let insns = decode(&code.code).unwrap();
        let (_, name, desc) = pool.member_ref_at(insns[6].u16_operand().unwrap()).unwrap();
        assert_eq!((name, desc), ("append", "(I)Ljava/lang/StringBuilder;"));
    }

    #[test]
    fn while_loop_counts() {
        let src = class("  int f(int n) {\n    int i = 0\n    while i < n {\n      i = i + 1\n    }\n    return i\n  }");
        let (_, code) = compile(&src, "f(int)").unwrap();
        assert_eq!(
            ops(&code),
            vec![ICONST_0, ISTORE_2, ILOAD_2, ILOAD_1, IF_ICMPGE, ILOAD_2, ICONST_1, IADD, ISTORE_2, GOTO, ILOAD_2, IRETURN]
        );
        assert_eq!(code.max_locals, 3);
    }

    #[test]
    fn if_else_both_return() {
        let src = class("  int sign(int n) {\n    if n < 0 {\n      return -1\n    } else {\n      return 1\n    }\n  }");
        let (_, code) = compile(&src, "sign(int)").unwrap();
        assert_eq!(ops(&code), vec![ILOAD_1, IFGE, ICONST_M1, IRETURN, ICONST_1, IRETURN]);
    }

    #[test]
    fn missing_return_is_reported_at_method() {
        let src = class("  int f(int a) {\n    if a > 0 {\n      return 1\n    }\n  }");
        let err = compile(&src, "f(int)").unwrap_err();
        assert_eq!(err.to_string(), "missing return statement at p/T.ktj:2");
    }

    #[test]
    fn endless_loop_needs_no_trailing_return() {
        let src = class("  int f() {\n    while true {\n      return 1\n    }\n  }");
        let (_, code) = compile(&src, "f()").unwrap();
        assert_eq!(ops(&code), vec![ICONST_1, IRETURN]);
    }

    #[test]
    fn mismatch_is_located_at_statement() {
        let src = class("  void f() {\n    int x = 1\n    String s = x\n  }");
        let err = compile(&src, "f()").unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected 'String', found 'int' at p/T.ktj:4");
    }

    #[test]
    fn dead_code_is_an_error() {
        let src = class("  void f() {\n    return\n    int x = 1\n  }");
        let err = compile(&src, "f()").unwrap_err();
        assert_eq!(err.to_string(), "unreachable statement at p/T.ktj:4");
    }

    #[test]
    fn static_context_rejects_fields() {
        let src = class("  int x = 1\n  static int f() {\n    return x\n  }");
        let err = compile(&src, "f()").unwrap_err();
        assert!(err.to_string().starts_with("non-static variable 'x'"), "{}", err);
    }

    #[test]
    fn final_locals_cannot_be_reassigned() {
        let src = class("  void f() {\n    final int x = 1\n    x = 2\n  }");
        let err = compile(&src, "f()").unwrap_err();
        assert_eq!(err.to_string(), "cannot assign a value to final variable 'x' at p/T.ktj:4");
    }

    #[test]
    fn small_constants_narrow() {
        let src = class("  void f() {\n    byte b = 10\n    char c = 65\n    short s = -300\n  }");
        let (_, code) = compile(&src, "f()").unwrap();
        assert_eq!(ops(&code), vec![BIPUSH, ISTORE_1, BIPUSH, ISTORE_2, SIPUSH, ISTORE_3, RETURN]);
    }

    #[test]
    fn switch_uses_lookupswitch() {
        let src = class(
            "  int f(int k) {\n    switch k {\n      case 1 {\n        return 10\n      }\n      default {\n        return 0\n      }\n    }\n  }",
        );
        let (_, code) = compile(&src, "f(int)").unwrap();
        let insns = decode(&code.code).unwrap();
        assert_eq!(insns[1].opcode, LOOKUPSWITCH);
        let (default, pairs) = insns[1].lookupswitch_targets().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0, 1);
        assert!(default > pairs[0].1);
    }

    #[test]
    fn instance_calls_and_fields() {
        let src = class("  int x\n  int get() {\n    return this.x\n  }\n  int twice() {\n    return get() + get()\n  }");
        let (_, code) = compile(&src, "twice()").unwrap();
        assert_eq!(ops(&code), vec![ALOAD_0, INVOKEVIRTUAL, ALOAD_0, INVOKEVIRTUAL, IADD, IRETURN]);
        let (_, code) = compile(&src, "get()").unwrap();
        assert_eq!(ops(&code), vec![ALOAD_0, GETFIELD, IRETURN]);
    }

    #[test]
    fn unknown_method_names_argument_types() {
        let src = class("  void f() {\n    g(1, \"a\")\n  }");
        let err = compile(&src, "f()").unwrap_err();
        assert_eq!(err.to_string(), "cannot find method 'g(int, String)' in 'T' at p/T.ktj:3");
    }

    #[test]
    fn object_to_local_class_inserts_checkcast() {
        let src = class("  T self(Object o) {\n    T t = o\n    return t\n  }");
        let (_, code) = compile(&src, "self(Object)").unwrap();
        assert_eq!(ops(&code), vec![ALOAD_1, CHECKCAST, ASTORE_2, ALOAD_2, ARETURN]);
    }

    #[test]
    fn short_circuit_condition() {
        let src = class("  boolean f(int a, int b) {\n    return a > 0 && b > 0\n  }");
        let (_, code) = compile(&src, "f(int,int)").unwrap();
        assert_eq!(
            ops(&code),
            vec![ILOAD_1, IFLE, ILOAD_2, IFLE, ICONST_1, GOTO, ICONST_0, IRETURN]
        );
    }

    #[test]
    fn constructor_runs_field_initializers_after_super() {
        let decls = decls(&class("  int x = 5"));
        let decl = &decls["p.T"];
        let ctor = &decl.as_class().unwrap().constructors["<init>()"];
        let mut pool = ConstantPool::new();
        let code = constructor_code(&mut pool, decl, &decls, ctor, "java/lang/Object").unwrap();
        assert_eq!(ops(&code), vec![ALOAD_0, INVOKESPECIAL, ALOAD_0, ICONST_5, PUTFIELD, RETURN]);
    }

    #[test]
    fn static_initializer_only_when_needed() {
        let decls = decls(&class("  static int x = 500\n  int y"));
        let mut pool = ConstantPool::new();
        let code = static_init_code(&mut pool, &decls["p.T"], &decls).unwrap().unwrap();
        assert_eq!(ops(&code), vec![SIPUSH, PUTSTATIC, RETURN]);
        let decls = super::tests::decls(&class("  int y = 1"));
        assert!(static_init_code(&mut pool, &decls["p.T"], &decls).unwrap().is_none());
    }
}
