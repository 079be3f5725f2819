use super::constant_pool::{expect, ConstantPoolVerifyError};
use super::method_access_flags::{self, MethodAccessFlagsError};
use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::descriptor::{split_method_descriptor, Kind};
use crate::codegen::error::BytecodeError;
use crate::codegen::flag::access_flags;
use crate::codegen::method::MethodInfo;
use crate::codegen::opcodes::{self, *};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MethodVerifyError {
    #[error(transparent)]
    ConstantPool(#[from] ConstantPoolVerifyError),
    #[error(transparent)]
    AccessFlags(#[from] MethodAccessFlagsError),
    #[error("invalid method descriptor '{0}'")]
    InvalidDescriptor(String),
    #[error("method '{0}' must have a Code attribute unless abstract or native")]
    MissingCodeAttribute(String),
    #[error("abstract or native method '{0}' must not have a Code attribute")]
    ForbiddenCodeAttribute(String),
    #[error("method '{name}': {source}")]
    Bytecode { name: String, source: BytecodeError },
    #[error("method '{name}': max_locals {max_locals} below argument slots {needed}")]
    MaxLocals { name: String, max_locals: u16, needed: u16 },
    #[error("return opcode does not match descriptor: expected {expected}, found {found}")]
    ReturnMismatch { expected: &'static str, found: &'static str },
    #[error("duplicate method '{0}{1}'")]
    DuplicateMethod(String, String),
}

pub type Result<T> = std::result::Result<T, MethodVerifyError>;

/// Verify the methods, decoding every Code attribute
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for method in &class_file.methods {
        method_access_flags::verify(class_file, method)?;
        let is_utf8 = |c: &Constant| matches!(c, Constant::Utf8(_));
        expect(class_file, method.name_index, method.name_index, is_utf8)?;
        expect(class_file, method.descriptor_index, method.descriptor_index, is_utf8)?;
        let name = method.name(&class_file.constant_pool).unwrap_or_default();
        let descriptor = method.descriptor(&class_file.constant_pool).unwrap_or_default();
        if !seen.insert((name, descriptor)) {
            return Err(MethodVerifyError::DuplicateMethod(name.to_string(), descriptor.to_string()));
        }
        verify_code(method, name, descriptor)?;
    }
    Ok(())
}

fn verify_code(method: &MethodInfo, name: &str, descriptor: &str) -> Result<()> {
    let bodyless = method.access_flags & (access_flags::ACC_ABSTRACT | access_flags::ACC_NATIVE) != 0;
    let code = match (&method.code, bodyless) {
        (None, true) => return Ok(()),
        (Some(_), true) => return Err(MethodVerifyError::ForbiddenCodeAttribute(name.to_string())),
        (None, false) => return Err(MethodVerifyError::MissingCodeAttribute(name.to_string())),
        (Some(code), false) => code,
    };

    let (params, ret) =
        split_method_descriptor(descriptor).ok_or_else(|| MethodVerifyError::InvalidDescriptor(descriptor.to_string()))?;
    let receiver = u16::from(method.access_flags & access_flags::ACC_STATIC == 0);
    let needed = receiver + params.iter().map(|p| Kind::of(p).width()).sum::<u16>();
    if code.max_locals < needed {
        return Err(MethodVerifyError::MaxLocals { name: name.to_string(), max_locals: code.max_locals, needed });
    }

    let expected = return_opcode(Kind::of(&ret));
    let instructions =
        opcodes::decode(&code.code).map_err(|source| MethodVerifyError::Bytecode { name: name.to_string(), source })?;
    for insn in instructions.iter().filter(|i| is_return(i.opcode)) {
        if insn.opcode != expected {
            return Err(MethodVerifyError::ReturnMismatch {
                expected: return_name(expected),
                found: return_name(insn.opcode),
            });
        }
    }
    Ok(())
}

fn return_opcode(kind: Kind) -> u8 {
    match kind {
        Kind::Int => IRETURN,
        Kind::Long => LRETURN,
        Kind::Float => FRETURN,
        Kind::Double => DRETURN,
        Kind::Reference => ARETURN,
        Kind::Void => RETURN,
    }
}

fn return_name(opcode: u8) -> &'static str {
    match opcode {
        IRETURN => "ireturn",
        LRETURN => "lreturn",
        FRETURN => "freturn",
        DRETURN => "dreturn",
        ARETURN => "areturn",
        _ => "return",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::attribute::CodeAttribute;
    use crate::codegen::flag::access_flags::*;

    fn class_with(flags: u16, descriptor: &str, code: Option<(Vec<u8>, u16)>) -> ClassFile {
        let mut class = ClassFile::new(49);
        let name = class.constant_pool.add_utf8("m").unwrap();
        let desc = class.constant_pool.add_utf8(descriptor).unwrap();
        let code_name = class.constant_pool.add_utf8("Code").unwrap();
        let mut method = MethodInfo::new(flags, name, desc);
        method.code = code.map(|(bytes, max_locals)| CodeAttribute {
            name_index: code_name,
            max_stack: 2,
            max_locals,
            code: bytes,
            attributes: Vec::new(),
        });
        class.methods.push(method);
        class
    }

    #[test]
    fn matching_return_passes() {
        let class = class_with(ACC_PUBLIC | ACC_STATIC, "(I)I", Some((vec![ILOAD_0, IRETURN], 1)));
        assert!(verify(&class).is_ok());
    }

    #[test]
    fn wrong_return_is_reported() {
        let class = class_with(ACC_PUBLIC | ACC_STATIC, "()J", Some((vec![ICONST_0, IRETURN], 0)));
        assert_eq!(
            verify(&class),
            Err(MethodVerifyError::ReturnMismatch { expected: "lreturn", found: "ireturn" })
        );
    }

    #[test]
    fn locals_cover_arguments() {
        let class = class_with(ACC_PUBLIC, "(JD)V", Some((vec![RETURN], 4)));
        assert_eq!(
            verify(&class),
            Err(MethodVerifyError::MaxLocals { name: "m".into(), max_locals: 4, needed: 5 })
        );
    }

    #[test]
    fn abstract_methods_are_bodyless() {
        assert!(verify(&class_with(ACC_PUBLIC | ACC_ABSTRACT, "()V", None)).is_ok());
        assert_eq!(
            verify(&class_with(ACC_PUBLIC | ACC_ABSTRACT, "()V", Some((vec![RETURN], 1)))),
            Err(MethodVerifyError::ForbiddenCodeAttribute("m".into()))
        );
        assert_eq!(
            verify(&class_with(ACC_PUBLIC, "()V", None)),
            Err(MethodVerifyError::MissingCodeAttribute("m".into()))
        );
    }

    #[test]
    fn abstract_excludes_static() {
        let flags = ACC_PUBLIC | ACC_ABSTRACT | ACC_STATIC;
        assert_eq!(
            verify(&class_with(flags, "()V", None)),
            Err(MethodVerifyError::AccessFlags(MethodAccessFlagsError::Abstract(flags)))
        );
    }

    #[test]
    fn truncated_code_fails_to_decode() {
        let class = class_with(ACC_STATIC, "()V", Some((vec![SIPUSH, 1], 0)));
        assert!(matches!(verify(&class), Err(MethodVerifyError::Bytecode { .. })));
    }
}
