use crate::codegen::class::ClassFile;
use crate::codegen::flag::access_flags;
use crate::codegen::method::MethodInfo;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MethodAccessFlagsError {
    #[error("more than one access flag: 0x{0:04x}")]
    Access(u16),
    #[error("abstract method with incompatible flags: 0x{0:04x}")]
    Abstract(u16),
    #[error("interface method must be public abstract: 0x{0:04x}")]
    Interface(u16),
}

pub type Result<T> = std::result::Result<T, MethodAccessFlagsError>;

/// Verify method access flags
pub fn verify(class_file: &ClassFile, method: &MethodInfo) -> Result<()> {
    let flags = method.access_flags;
    let has = |bit: u16| flags & bit != 0;
    let access = [access_flags::ACC_PUBLIC, access_flags::ACC_PROTECTED, access_flags::ACC_PRIVATE];
    if access.iter().filter(|bit| has(**bit)).count() > 1 {
        return Err(MethodAccessFlagsError::Access(flags));
    }

    if has(access_flags::ACC_ABSTRACT) {
        let excluded = access_flags::ACC_PRIVATE
            | access_flags::ACC_STATIC
            | access_flags::ACC_FINAL
            | access_flags::ACC_SYNCHRONIZED
            | access_flags::ACC_NATIVE
            | access_flags::ACC_STRICT;
        if flags & excluded != 0 {
            return Err(MethodAccessFlagsError::Abstract(flags));
        }
    }

    // before version 52 every interface method is public abstract
    let class_is_interface = class_file.access_flags & access_flags::ACC_INTERFACE != 0;
    if class_is_interface && !(has(access_flags::ACC_PUBLIC) && has(access_flags::ACC_ABSTRACT)) {
        return Err(MethodAccessFlagsError::Interface(flags));
    }
    Ok(())
}
