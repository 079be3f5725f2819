//! Positional records: final class, one field per component, a canonical
//! constructor taking the components in order and one accessor each.

use super::attribute::CodeAttribute;
use super::class_writer::ClassWriter;
use super::code::Code;
use super::defs::CONSTRUCTOR_METHOD_NAME;
use super::descriptor::Kind;
use super::flag::{self, access_flags::ACC_PUBLIC};
use super::opcodes::*;
use super::signature;
use crate::ast::RecordDecl;
use crate::consts::JAVA_LANG_OBJECT;
use crate::error::{Result, ResultExt};

pub(super) fn generate_record(writer: &mut ClassWriter, decl: &RecordDecl) -> Result<()> {
    let info = &decl.info;
    let scope = writer.scope();
    writer.header(JAVA_LANG_OBJECT, &[])?;
    let sig = signature::class_signature(&scope, None, &[]).at(|| info.location())?;
    writer.add_signature(sig)?;

    let mut components = Vec::with_capacity(decl.fields.len());
    for field in decl.fields.values() {
        let location = || info.location_at(field.line);
        let desc = scope.descriptor(&field.ty).at(location)?;
        let sig = signature::field_signature(&scope, &field.ty).at(location)?;
        writer.add_field(flag::field_flags(&field.modifier), &field.name, &desc, sig.clone())?;
        components.push((field.name.as_str(), desc, sig));
    }

    let params: String = components.iter().map(|(_, desc, _)| desc.as_str()).collect();
    let code = constructor_code(writer, &components)?;
    writer.add_method(ACC_PUBLIC, CONSTRUCTOR_METHOD_NAME, &format!("({})V", params), Some(code), None)?;

    for (name, desc, sig) in &components {
        let code = accessor_code(writer, name, desc)?;
        let sig = sig.as_ref().map(|s| format!("(){}", s));
        writer.add_method(ACC_PUBLIC, name, &format!("(){}", desc), Some(code), sig)?;
    }
    log::debug!("record {}: components={}", info.internal_name, components.len());
    Ok(())
}

/// `super()`, then one width-correct load and `putfield` per component.
fn constructor_code(writer: &mut ClassWriter, components: &[(&str, String, Option<String>)]) -> Result<CodeAttribute> {
    let this = writer.this_internal();
    let mut code = Code::new();
    code.emit_load(Kind::Reference, 0)?;
    let init = writer.pool().add_method_ref(JAVA_LANG_OBJECT, CONSTRUCTOR_METHOD_NAME, "()V")?;
    code.emit_invoke(INVOKESPECIAL, init, 0, 0)?;
    let mut slot = 1;
    for (name, desc, _) in components {
        let kind = Kind::of(desc);
        code.emit_load(Kind::Reference, 0)?;
        code.emit_load(kind, slot)?;
        let field = writer.pool().add_field_ref(this, name, desc)?;
        code.emit_field(PUTFIELD, field, kind.width())?;
        slot += kind.width();
    }
    code.emit_return(Kind::Void)?;
    writer.code_attribute(code, slot)
}

fn accessor_code(writer: &mut ClassWriter, name: &str, desc: &str) -> Result<CodeAttribute> {
    let this = writer.this_internal();
    let kind = Kind::of(desc);
    let mut code = Code::new();
    code.emit_load(Kind::Reference, 0)?;
    let field = writer.pool().add_field_ref(this, name, desc)?;
    code.emit_field(GETFIELD, field, kind.width())?;
    code.emit_return(kind)?;
    writer.code_attribute(code, 1)
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
        let mut decls: IndexMap<_, _> = parse_file(Path::new("p/P.ktj"), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect();
        crate::review::review(&mut decls).unwrap();
        super::ClassWriter::new(&decls["p.P"], &decls, &Config::default()).generate().unwrap()
    }

    #[test]
    fn canonical_constructor_loads_by_width() {
        let class = generate("data P = [int x, double d, String s]\n");
        let init = class.method_with("<init>", "(IDLjava/lang/String;)V").unwrap();
        let code = init.code.as_ref().unwrap();
        let ops: Vec<u8> = decode(&code.code).unwrap().iter().map(|i| i.opcode).collect();
        assert_eq!(
            ops,
            vec![
                ALOAD_0, INVOKESPECIAL, ALOAD_0, ILOAD_1, PUTFIELD, ALOAD_0, DLOAD_2, PUTFIELD, ALOAD_0,
                ALOAD, PUTFIELD, RETURN
            ]
        );
        assert_eq!(code.max_locals, 5);
        assert_eq!(code.max_stack, 3);
    }

    #[test]
    fn accessors_return_components() {
        let class = generate("data P = [int x, long y]\n");
        assert!(class.method_with("x", "()I").is_some());
        let y = class.method_with("y", "()J").and_then(|m| m.code.as_ref()).unwrap();
        let ops: Vec<u8> = decode(&y.code).unwrap().iter().map(|i| i.opcode).collect();
        assert_eq!(ops, vec![ALOAD_0, GETFIELD, LRETURN]);
    }
}
