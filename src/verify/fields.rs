use super::constant_pool::{expect, ConstantPoolVerifyError};
use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::flag::access_flags;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FieldVerifyError {
    #[error(transparent)]
    ConstantPool(#[from] ConstantPoolVerifyError),
    #[error("invalid field access flags: 0x{0:04x}")]
    InvalidFieldAccessFlags(u16),
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
}

pub type Result<T> = std::result::Result<T, FieldVerifyError>;

pub fn verify(class_file: &ClassFile) -> Result<()> {
    let is_utf8 = |c: &Constant| matches!(c, Constant::Utf8(_));
    let mut seen = std::collections::HashSet::new();
    for field in &class_file.fields {
        expect(class_file, field.name_index, field.name_index, is_utf8)?;
        expect(class_file, field.descriptor_index, field.descriptor_index, is_utf8)?;
        verify_access_flags(field.access_flags)?;
        let name = field.name(&class_file.constant_pool).unwrap_or_default();
        let descriptor = field.descriptor(&class_file.constant_pool).unwrap_or_default();
        if !seen.insert((name, descriptor)) {
            return Err(FieldVerifyError::DuplicateField(name.to_string()));
        }
    }
    Ok(())
}

fn verify_access_flags(flags: u16) -> Result<()> {
    let has = |bit: u16| flags & bit != 0;
    let access = [access_flags::ACC_PUBLIC, access_flags::ACC_PROTECTED, access_flags::ACC_PRIVATE];
    if access.iter().filter(|bit| has(**bit)).count() > 1 {
        return Err(FieldVerifyError::InvalidFieldAccessFlags(flags));
    }
    if has(access_flags::ACC_FINAL) && has(access_flags::ACC_VOLATILE) {
        return Err(FieldVerifyError::InvalidFieldAccessFlags(flags));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::field::FieldInfo;
    use crate::codegen::flag::access_flags::*;

    fn class_with(flags: &[u16]) -> ClassFile {
        let mut class = ClassFile::new(49);
        for (i, flags) in flags.iter().enumerate() {
            let name = class.constant_pool.add_utf8(&format!("f{}", i)).unwrap();
            let desc = class.constant_pool.add_utf8("I").unwrap();
            class.fields.push(FieldInfo::new(*flags, name, desc));
        }
        class
    }

    #[test]
    fn access_bits_are_exclusive() {
        assert!(verify(&class_with(&[ACC_PUBLIC | ACC_STATIC | ACC_FINAL, ACC_PRIVATE])).is_ok());
        let flags = ACC_PUBLIC | ACC_PRIVATE;
        assert_eq!(verify(&class_with(&[flags])), Err(FieldVerifyError::InvalidFieldAccessFlags(flags)));
    }

    #[test]
    fn final_volatile_rejected() {
        let flags = ACC_FINAL | ACC_VOLATILE;
        assert_eq!(verify(&class_with(&[flags])), Err(FieldVerifyError::InvalidFieldAccessFlags(flags)));
    }

    #[test]
    fn name_must_be_utf8() {
        let mut class = ClassFile::new(49);
        let class_index = class.constant_pool.add_class("p/T").unwrap();
        let desc = class.constant_pool.add_utf8("I").unwrap();
        class.fields.push(FieldInfo::new(0, class_index, desc));
        assert_eq!(
            verify(&class),
            Err(FieldVerifyError::ConstantPool(ConstantPoolVerifyError::InvalidConstantPoolIndexType(class_index)))
        );
    }
}
