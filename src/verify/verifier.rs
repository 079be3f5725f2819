use super::{class_access_flags, constant_pool, fields, methods};
use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::defs::major_versions as version;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum VerifyError {
    #[error("unsupported class file version {0}")]
    UnsupportedVersion(u16),
    #[error("invalid {0} class index {1}")]
    InvalidClassIndex(&'static str, u16),
    #[error(transparent)]
    ConstantPool(#[from] constant_pool::ConstantPoolVerifyError),
    #[error(transparent)]
    ClassAccessFlags(#[from] class_access_flags::ClassAccessFlagsError),
    #[error(transparent)]
    Field(#[from] fields::FieldVerifyError),
    #[error(transparent)]
    Method(#[from] methods::MethodVerifyError),
}

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Verify the ClassFile by running every sub-verifier in order
pub fn verify_class_file(class_file: &ClassFile) -> VerifyResult<()> {
    if !(version::JAVA_1_4..=version::JAVA_8).contains(&class_file.major_version) {
        return Err(VerifyError::UnsupportedVersion(class_file.major_version));
    }
    constant_pool::verify(class_file)?;
    class_access_flags::verify(class_file)?;
    verify_class_index(class_file, "this", class_file.this_class)?;
    verify_class_index(class_file, "super", class_file.super_class)?;
    for index in &class_file.interfaces {
        verify_class_index(class_file, "interface", *index)?;
    }
    fields::verify(class_file)?;
    methods::verify(class_file)?;
    Ok(())
}

fn verify_class_index(class_file: &ClassFile, role: &'static str, index: u16) -> VerifyResult<()> {
    match class_file.constant_pool.get(index) {
        Some(Constant::Class(_)) => Ok(()),
        _ => Err(VerifyError::InvalidClassIndex(role, index)),
    }
}
