//! Core classfile structure

use super::attribute::{find_signature, AttributeInfo, SOURCE_FILE};
use super::constpool::ConstantPool;
use super::defs::MAGIC;
use super::field::FieldInfo;
use super::method::MethodInfo;

#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

impl ClassFile {
    pub fn new(major_version: u16) -> Self {
        Self {
            magic: MAGIC,
            minor_version: 0,
            major_version,
            constant_pool: ConstantPool::new(),
            access_flags: 0,
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn this_class_name(&self) -> Option<&str> {
        self.constant_pool.class_name_at(self.this_class)
    }

    pub fn super_class_name(&self) -> Option<&str> {
        self.constant_pool.class_name_at(self.super_class)
    }

    pub fn interface_names(&self) -> Vec<&str> {
        self.interfaces.iter().filter_map(|i| self.constant_pool.class_name_at(*i)).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name(&self.constant_pool) == Some(name))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().filter_map(|f| f.name(&self.constant_pool)).collect()
    }

    /// First method with this name; overloads need [`ClassFile::method_with`].
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name(&self.constant_pool) == Some(name))
    }

    pub fn method_with(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            m.name(&self.constant_pool) == Some(name) && m.descriptor(&self.constant_pool) == Some(descriptor)
        })
    }

    pub fn signature(&self) -> Option<&str> {
        find_signature(&self.attributes, &self.constant_pool)
    }

    pub fn source_file(&self) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name(&self.constant_pool) == Some(SOURCE_FILE))
            .and_then(|a| a.utf8_value(&self.constant_pool))
    }
}
