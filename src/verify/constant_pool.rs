use crate::codegen::class::ClassFile;
use crate::codegen::constpool::Constant;
use crate::codegen::defs::MAX_CONSTANT_POOL_ENTRIES;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConstantPoolVerifyError {
    #[error("constant pool has {0} entries, more than {max}", max = MAX_CONSTANT_POOL_ENTRIES)]
    TooLarge(usize),
    #[error("invalid constant pool index {0}")]
    InvalidConstantPoolIndex(u16),
    #[error("invalid constant pool index type {0}")]
    InvalidConstantPoolIndexType(u16),
}

pub type Result<T> = std::result::Result<T, ConstantPoolVerifyError>;

/// Verify the constant pool size and the indexes between its entries
pub fn verify(class_file: &ClassFile) -> Result<()> {
    let pool = &class_file.constant_pool;
    if pool.count() > MAX_CONSTANT_POOL_ENTRIES {
        return Err(ConstantPoolVerifyError::TooLarge(pool.count()));
    }
    for (index, constant) in pool.iter() {
        match constant {
            Constant::Class(name) | Constant::String(name) => expect(class_file, index, *name, is_utf8)?,
            Constant::NameAndType(name, descriptor) => {
                expect(class_file, index, *name, is_utf8)?;
                expect(class_file, index, *descriptor, is_utf8)?;
            }
            Constant::FieldRef(class, nat) | Constant::MethodRef(class, nat) | Constant::InterfaceMethodRef(class, nat) => {
                expect(class_file, index, *class, |c| matches!(c, Constant::Class(_)))?;
                expect(class_file, index, *nat, |c| matches!(c, Constant::NameAndType(..)))?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn is_utf8(constant: &Constant) -> bool {
    matches!(constant, Constant::Utf8(_))
}

/// Entry `owner` refers to `target`, which must satisfy `kind`.
pub(super) fn expect(class_file: &ClassFile, owner: u16, target: u16, kind: impl Fn(&Constant) -> bool) -> Result<()> {
    match class_file.constant_pool.get(target) {
        Some(constant) if kind(constant) => Ok(()),
        Some(_) => Err(ConstantPoolVerifyError::InvalidConstantPoolIndexType(owner)),
        None => Err(ConstantPoolVerifyError::InvalidConstantPoolIndex(owner)),
    }
}
