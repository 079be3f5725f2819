use crate::codegen::class::ClassFile;
use crate::codegen::flag::access_flags;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ClassAccessFlagsError {
    #[error("interface must be abstract: 0x{0:04x}")]
    InterfaceNotAbstract(u16),
    #[error("interface cannot be final, super or enum: 0x{0:04x}")]
    InterfaceFlags(u16),
    #[error("class cannot be both final and abstract: 0x{0:04x}")]
    FinalAndAbstract(u16),
    #[error("class access must be public or package: 0x{0:04x}")]
    Access(u16),
}

pub type Result<T> = std::result::Result<T, ClassAccessFlagsError>;

/// Verify the class-level access flags
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let flags = class_file.access_flags;
    let has = |bit: u16| flags & bit != 0;

    if has(access_flags::ACC_PRIVATE) || has(access_flags::ACC_PROTECTED) {
        return Err(ClassAccessFlagsError::Access(flags));
    }
    if has(access_flags::ACC_INTERFACE) {
        if !has(access_flags::ACC_ABSTRACT) {
            return Err(ClassAccessFlagsError::InterfaceNotAbstract(flags));
        }
        if has(access_flags::ACC_FINAL) || has(access_flags::ACC_SUPER) || has(access_flags::ACC_ENUM) {
            return Err(ClassAccessFlagsError::InterfaceFlags(flags));
        }
    } else if has(access_flags::ACC_FINAL) && has(access_flags::ACC_ABSTRACT) {
        return Err(ClassAccessFlagsError::FinalAndAbstract(flags));
    }
    Ok(())
}
