//! FieldInfo structure and serialization

use super::attribute::{find_signature, AttributeInfo};
use super::constpool::ConstantPool;

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

impl FieldInfo {
    pub fn new(access_flags: u16, name_index: u16, descriptor_index: u16) -> Self {
        Self { access_flags, name_index, descriptor_index, attributes: Vec::new() }
    }

    pub fn name<'a>(&self, constant_pool: &'a ConstantPool) -> Option<&'a str> {
        constant_pool.utf8_at(self.name_index)
    }

    pub fn descriptor<'a>(&self, constant_pool: &'a ConstantPool) -> Option<&'a str> {
        constant_pool.utf8_at(self.descriptor_index)
    }

    pub fn signature<'a>(&self, constant_pool: &'a ConstantPool) -> Option<&'a str> {
        find_signature(&self.attributes, constant_pool)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&self.access_flags.to_be_bytes());
        bytes.extend_from_slice(&self.name_index.to_be_bytes());
        bytes.extend_from_slice(&self.descriptor_index.to_be_bytes());
        bytes.extend_from_slice(&(self.attributes.len() as u16).to_be_bytes());
        for attribute in &self.attributes {
            bytes.extend_from_slice(&attribute.to_bytes());
        }
        bytes
    }
}
