//! Closed enumerations as `java/lang/Enum` subclasses
//!
//! Layout: one `public static final enum` field per value, the hidden
//! `$VALUES` array, `values()`, `valueOf(String)`, a private
//! `(String, int)` constructor and a `<clinit>` that builds every value with
//! its ordinal before filling the array.

use super::class_writer::ClassWriter;
use super::code::Code;
use super::defs::{CONSTRUCTOR_METHOD_NAME, ENUM_VALUES_FIELD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use super::descriptor::{object, Kind};
use super::flag::access_flags::*;
use super::opcodes::*;
use crate::ast::EnumerationDecl;
use crate::consts::{JAVA_LANG_CLASS, JAVA_LANG_ENUM, JAVA_LANG_OBJECT, JAVA_LANG_STRING};
use crate::error::Result;

pub(super) fn generate_enum(writer: &mut ClassWriter, decl: &EnumerationDecl) -> Result<()> {
    let this = writer.this_internal();
    let this_desc = object(this);
    let array_desc = format!("[{}", this_desc);
    writer.header(JAVA_LANG_ENUM, &[])?;
    writer.add_signature(Some(format!("L{}<{}>;", JAVA_LANG_ENUM, this_desc)))?;

    for value in &decl.values {
        writer.add_field(ACC_PUBLIC | ACC_STATIC | ACC_FINAL | ACC_ENUM, value, &this_desc, None)?;
    }
    let hidden = ACC_PRIVATE | ACC_STATIC | ACC_FINAL | ACC_SYNTHETIC;
    writer.add_field(hidden, ENUM_VALUES_FIELD_NAME, &array_desc, None)?;

    let code = values_code(writer, &array_desc)?;
    writer.add_method(ACC_PUBLIC | ACC_STATIC, "values", &format!("(){}", array_desc), Some(code), None)?;
    let code = value_of_code(writer)?;
    let value_of = format!("(L{};){}", JAVA_LANG_STRING, this_desc);
    writer.add_method(ACC_PUBLIC | ACC_STATIC, "valueOf", &value_of, Some(code), None)?;
    let code = constructor_code(writer)?;
    let ctor = format!("(L{};I)V", JAVA_LANG_STRING);
    writer.add_method(ACC_PRIVATE, CONSTRUCTOR_METHOD_NAME, &ctor, Some(code), None)?;
    let code = static_init_code(writer, decl, &array_desc)?;
    writer.add_method(ACC_STATIC, STATIC_INITIALIZER_METHOD_NAME, "()V", Some(code), None)?;

    log::debug!("enumeration {}: values={}", this, decl.values.len());
    Ok(())
}

fn push_int(writer: &mut ClassWriter, code: &mut Code, value: i32) -> Result<()> {
    if !code.emit_int(value)? {
        let index = writer.pool().add_integer(value)?;
        code.emit_ldc(index, 1)?;
    }
    Ok(())
}

/// `$VALUES.clone()`, cast back to the array type.
fn values_code(writer: &mut ClassWriter, array_desc: &str) -> Result<super::attribute::CodeAttribute> {
    let this = writer.this_internal();
    let mut code = Code::new();
    let field = writer.pool().add_field_ref(this, ENUM_VALUES_FIELD_NAME, array_desc)?;
    code.emit_field(GETSTATIC, field, 1)?;
    let clone = writer.pool().add_method_ref(array_desc, "clone", &format!("()L{};", JAVA_LANG_OBJECT))?;
    code.emit_invoke(INVOKEVIRTUAL, clone, 0, 1)?;
    let array = writer.pool().add_class(array_desc)?;
    code.emitop2(CHECKCAST, array)?;
    code.emit_return(Kind::Reference)?;
    writer.code_attribute(code, 0)
}

/// `Enum.valueOf(X.class, name)` with a checkcast to `X`.
fn value_of_code(writer: &mut ClassWriter) -> Result<super::attribute::CodeAttribute> {
    let this = writer.this_internal();
    let mut code = Code::new();
    let class = writer.pool().add_class(this)?;
    code.emit_ldc(class, 1)?;
    code.emit_load(Kind::Reference, 0)?;
    let desc = format!("(L{};L{};)L{};", JAVA_LANG_CLASS, JAVA_LANG_STRING, JAVA_LANG_ENUM);
    let value_of = writer.pool().add_method_ref(JAVA_LANG_ENUM, "valueOf", &desc)?;
    code.emit_invoke(INVOKESTATIC, value_of, 2, 1)?;
    code.emitop2(CHECKCAST, class)?;
    code.emit_return(Kind::Reference)?;
    writer.code_attribute(code, 1)
}

fn constructor_code(writer: &mut ClassWriter) -> Result<super::attribute::CodeAttribute> {
    let mut code = Code::new();
    code.emit_load(Kind::Reference, 0)?;
    code.emit_load(Kind::Reference, 1)?;
    code.emit_load(Kind::Int, 2)?;
    let desc = format!("(L{};I)V", JAVA_LANG_STRING);
    let init = writer.pool().add_method_ref(JAVA_LANG_ENUM, CONSTRUCTOR_METHOD_NAME, &desc)?;
    code.emit_invoke(INVOKESPECIAL, init, 2, 0)?;
    code.emit_return(Kind::Void)?;
    writer.code_attribute(code, 3)
}

fn static_init_code(
    writer: &mut ClassWriter,
    decl: &EnumerationDecl,
    array_desc: &str,
) -> Result<super::attribute::CodeAttribute> {
    let this = writer.this_internal();
    let this_desc = object(this);
    let mut code = Code::new();
    let class = writer.pool().add_class(this)?;
    let init_desc = format!("(L{};I)V", JAVA_LANG_STRING);
    let init = writer.pool().add_method_ref(this, CONSTRUCTOR_METHOD_NAME, &init_desc)?;
    let mut fields = Vec::with_capacity(decl.values.len());
    for (ordinal, value) in (0..).zip(&decl.values) {
        let field = writer.pool().add_field_ref(this, value, &this_desc)?;
        fields.push(field);
        code.emitop2(NEW, class)?;
        code.emitop(DUP)?;
        let name = writer.pool().add_string(value)?;
        code.emit_ldc(name, 1)?;
        push_int(writer, &mut code, ordinal)?;
        code.emit_invoke(INVOKESPECIAL, init, 2, 0)?;
        code.emit_field(PUTSTATIC, field, 1)?;
    }
    push_int(writer, &mut code, fields.len() as i32)?;
    code.emitop2(ANEWARRAY, class)?;
    for (ordinal, field) in (0..).zip(&fields) {
        code.emitop(DUP)?;
        push_int(writer, &mut code, ordinal)?;
        code.emit_field(GETSTATIC, *field, 1)?;
        code.emitop(AASTORE)?;
    }
    let values = writer.pool().add_field_ref(this, ENUM_VALUES_FIELD_NAME, array_desc)?;
    code.emit_field(PUTSTATIC, values, 1)?;
    code.emit_return(Kind::Void)?;
    writer.code_attribute(code, 0)
}

#[cfg(test)]
mod tests {
    use crate::codegen::class::ClassFile;
    use crate::codegen::opcodes::*;
    use crate::config::Config;
    use crate::parser::parse_file;
    use indexmap::IndexMap;
    use std::path::Path;

    fn generate(src: &str) -> ClassFile {
        let mut decls: IndexMap<_, _> = parse_file(Path::new("p/Color.ktj"), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect();
        crate::review::review(&mut decls).unwrap();
        super::ClassWriter::new(&decls["p.Color"], &decls, &Config::default()).generate().unwrap()
    }

    #[test]
    fn values_become_fields_plus_hidden_array() {
        let class = generate("type Color = RED | GREEN | BLUE\n");
        assert_eq!(class.field_names(), vec!["RED", "GREEN", "BLUE", "$VALUES"]);
        assert_eq!(class.super_class_name(), Some("java/lang/Enum"));
        assert_eq!(class.signature(), Some("Ljava/lang/Enum<Lp/Color;>;"));
        let hidden = class.field("$VALUES").unwrap();
        assert_eq!(hidden.descriptor(&class.constant_pool), Some("[Lp/Color;"));
        assert!(class.method_with("valueOf", "(Ljava/lang/String;)Lp/Color;").is_some());
        assert!(class.method_with("values", "()[Lp/Color;").is_some());
    }

    #[test]
    fn clinit_builds_values_in_order() {
        let class = generate("type Color = RED | GREEN | BLUE\n");
        let clinit = class.method("<clinit>").and_then(|m| m.code.as_ref()).unwrap();
        let insns = decode(&clinit.code).unwrap();
        let names: Vec<&str> = insns
            .iter()
            .filter(|i| i.opcode == LDC)
            .filter_map(|i| match class.constant_pool.get(u16::from(i.u8_operand()?))? {
                crate::codegen::constpool::Constant::String(index) => class.constant_pool.utf8_at(*index),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["RED", "GREEN", "BLUE"]);
        let ordinals: Vec<u8> = insns
            .iter()
            .filter(|i| i.opcode == INVOKESPECIAL)
            .map(|i| insns.iter().rev().find(|p| p.pc < i.pc).map_or(0, |p| p.opcode))
            .collect();
        assert_eq!(ordinals, vec![ICONST_0, ICONST_1, ICONST_2]);
        assert_eq!(insns.last().map(|i| i.opcode), Some(RETURN));
    }
}
