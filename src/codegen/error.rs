//! Specific error types for code generation operations

use thiserror::Error;

/// Errors that can occur during constant pool operations
#[derive(Error, Debug, PartialEq)]
pub enum ConstPoolError {
    #[error("constant pool is out of space")]
    OutOfSpace,
    #[error("invalid constant pool index: {0}")]
    InvalidIndex(u16),
}

/// Errors that can occur during bytecode generation
#[derive(Error, Debug, PartialEq)]
pub enum BytecodeError {
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("branch offset {0} does not fit in 16 bits")]
    BranchTooFar(i64),
    #[error("label {0} was never placed")]
    UnplacedLabel(usize),
    #[error("method code exceeds 65535 bytes")]
    CodeTooLarge,
    #[error("local slot {0} exceeds the addressable range")]
    LocalOutOfRange(u32),
    #[error("malformed instruction at pc {0}")]
    Malformed(usize),
    #[error("opcode 0x{0:02x} needs explicit operands")]
    NeedsOperands(u8),
}
