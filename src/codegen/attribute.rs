//! Attribute structures for Java class files

use super::constpool::ConstantPool;
use super::error::ConstPoolError;

pub const CODE: &str = "Code";
pub const SIGNATURE: &str = "Signature";
pub const SOURCE_FILE: &str = "SourceFile";

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

impl AttributeInfo {
    pub fn new(constant_pool: &mut ConstantPool, name: &str, info: Vec<u8>) -> Result<Self, ConstPoolError> {
        Ok(Self { name_index: constant_pool.add_utf8(name)?, info })
    }

    /// `Signature` attribute holding a generic signature string.
    pub fn signature(constant_pool: &mut ConstantPool, signature: &str) -> Result<Self, ConstPoolError> {
        let index = constant_pool.add_utf8(signature)?;
        Self::new(constant_pool, SIGNATURE, index.to_be_bytes().to_vec())
    }

    pub fn source_file(constant_pool: &mut ConstantPool, file_name: &str) -> Result<Self, ConstPoolError> {
        let index = constant_pool.add_utf8(file_name)?;
        Self::new(constant_pool, SOURCE_FILE, index.to_be_bytes().to_vec())
    }

    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Option<&'a str> {
        constant_pool.utf8_at(self.name_index)
    }

    /// The Utf8 a single-index attribute (Signature, SourceFile) points at.
    pub fn utf8_value<'a>(&self, constant_pool: &'a ConstantPool) -> Option<&'a str> {
        match self.info.as_slice() {
            [hi, lo] => constant_pool.utf8_at(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(self.info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&self.info);
        bytes
    }
}

/// Value of the Signature attribute among `attributes`, if any.
pub fn find_signature<'a>(attributes: &[AttributeInfo], constant_pool: &'a ConstantPool) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name(constant_pool) == Some(SIGNATURE))
        .and_then(|a| a.utf8_value(constant_pool))
}

/// Code attribute of a concrete method. No exception handlers are ever
/// generated, so the table is always written empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttribute {
    pub name_index: u16,
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub attributes: Vec<AttributeInfo>,
}

impl CodeAttribute {
    pub fn new(
        constant_pool: &mut ConstantPool,
        max_stack: u16,
        max_locals: u16,
        code: Vec<u8>,
    ) -> Result<Self, ConstPoolError> {
        Ok(Self { name_index: constant_pool.add_utf8(CODE)?, max_stack, max_locals, code, attributes: Vec::new() })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut info = Vec::new();
        info.extend_from_slice(&self.max_stack.to_be_bytes());
        info.extend_from_slice(&self.max_locals.to_be_bytes());
        info.extend_from_slice(&(self.code.len() as u32).to_be_bytes());
        info.extend_from_slice(&self.code);
        info.extend_from_slice(&0u16.to_be_bytes());
        info.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            info.extend_from_slice(&attribute.to_bytes());
        }
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&(info.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&info);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_points_at_utf8() {
        let mut pool = ConstantPool::new();
        let attr = AttributeInfo::signature(&mut pool, "TT;").unwrap();
        assert_eq!(attr.name(&pool), Some("Signature"));
        assert_eq!(attr.utf8_value(&pool), Some("TT;"));
        assert_eq!(find_signature(&[attr], &pool), Some("TT;"));
    }

    #[test]
    fn code_length_prefix_covers_body() {
        let mut pool = ConstantPool::new();
        let code = CodeAttribute::new(&mut pool, 1, 1, vec![0x2a, 0xb1]).unwrap();
        let bytes = code.to_bytes();
        // name(2) + length(4) + stack(2) + locals(2) + code_len(4) + code(2) + tables(4)
        assert_eq!(bytes.len(), 20);
        assert_eq!(u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]), 14);
    }
}
