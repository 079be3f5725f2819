//! Constant pool and constants for Java class files

use std::collections::HashMap;

use super::defs::MAX_CONSTANT_POOL_ENTRIES;
use super::error::ConstPoolError;

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
}

pub mod constant_tags {
    pub const CONSTANT_UTF8: u8 = 1;
    pub const CONSTANT_INTEGER: u8 = 3;
    pub const CONSTANT_FLOAT: u8 = 4;
    pub const CONSTANT_LONG: u8 = 5;
    pub const CONSTANT_DOUBLE: u8 = 6;
    pub const CONSTANT_CLASS: u8 = 7;
    pub const CONSTANT_STRING: u8 = 8;
    pub const CONSTANT_FIELDREF: u8 = 9;
    pub const CONSTANT_METHODREF: u8 = 10;
    pub const CONSTANT_INTERFACEMETHODREF: u8 = 11;
    pub const CONSTANT_NAMEANDTYPE: u8 = 12;
}

/// Identity of a constant for deduplication; floats compare by bit pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Pair(u8, u16, u16),
}

impl Constant {
    pub fn tag(&self) -> u8 {
        use constant_tags::*;
        match self {
            Constant::Utf8(_) => CONSTANT_UTF8,
            Constant::Integer(_) => CONSTANT_INTEGER,
            Constant::Float(_) => CONSTANT_FLOAT,
            Constant::Long(_) => CONSTANT_LONG,
            Constant::Double(_) => CONSTANT_DOUBLE,
            Constant::Class(_) => CONSTANT_CLASS,
            Constant::String(_) => CONSTANT_STRING,
            Constant::FieldRef(..) => CONSTANT_FIELDREF,
            Constant::MethodRef(..) => CONSTANT_METHODREF,
            Constant::InterfaceMethodRef(..) => CONSTANT_INTERFACEMETHODREF,
            Constant::NameAndType(..) => CONSTANT_NAMEANDTYPE,
        }
    }

    /// Pool slots taken: long and double use two.
    pub fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }

    fn key(&self) -> ConstantKey {
        match self {
            Constant::Utf8(value) => ConstantKey::Utf8(value.clone()),
            Constant::Integer(value) => ConstantKey::Integer(*value),
            Constant::Float(value) => ConstantKey::Float(value.to_bits()),
            Constant::Long(value) => ConstantKey::Long(*value),
            Constant::Double(value) => ConstantKey::Double(value.to_bits()),
            Constant::Class(index) | Constant::String(index) => ConstantKey::Pair(self.tag(), *index, 0),
            Constant::FieldRef(a, b)
            | Constant::MethodRef(a, b)
            | Constant::InterfaceMethodRef(a, b)
            | Constant::NameAndType(a, b) => ConstantKey::Pair(self.tag(), *a, *b),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![self.tag()];
        match self {
            Constant::Utf8(value) => {
                let encoded = modified_utf8(value);
                bytes.extend_from_slice(&(encoded.len() as u16).to_be_bytes());
                bytes.extend_from_slice(&encoded);
            }
            Constant::Integer(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Constant::Float(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Constant::Long(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Constant::Double(value) => bytes.extend_from_slice(&value.to_be_bytes()),
            Constant::Class(index) | Constant::String(index) => bytes.extend_from_slice(&index.to_be_bytes()),
            Constant::FieldRef(a, b)
            | Constant::MethodRef(a, b)
            | Constant::InterfaceMethodRef(a, b)
            | Constant::NameAndType(a, b) => {
                bytes.extend_from_slice(&a.to_be_bytes());
                bytes.extend_from_slice(&b.to_be_bytes());
            }
        }
        bytes
    }
}

/// JVM "modified UTF-8": NUL as two bytes, supplementary characters as
/// encoded surrogate pairs.
pub fn modified_utf8(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

/// Deduplicating pool with 1-based indices.
///
/// `slots[i]` holds the constant at index `i + 1`; the slot after a long or
/// double is `None`.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConstantPool {
    slots: Vec<Option<Constant>>,
    lookup: HashMap<ConstantKey, u16>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, constant: Constant) -> Result<u16, ConstPoolError> {
        let key = constant.key();
        if let Some(index) = self.lookup.get(&key) {
            return Ok(*index);
        }
        // count field is u16 and counts index 0
        if self.slots.len() + constant.width() >= MAX_CONSTANT_POOL_ENTRIES {
            return Err(ConstPoolError::OutOfSpace);
        }
        let index = (self.slots.len() + 1) as u16;
        let width = constant.width();
        self.slots.push(Some(constant));
        if width == 2 {
            self.slots.push(None);
        }
        self.lookup.insert(key, index);
        Ok(index)
    }

    pub fn add_utf8(&mut self, value: &str) -> Result<u16, ConstPoolError> {
        self.add(Constant::Utf8(value.to_string()))
    }

    pub fn add_class(&mut self, internal_name: &str) -> Result<u16, ConstPoolError> {
        let name_index = self.add_utf8(internal_name)?;
        self.add(Constant::Class(name_index))
    }

    pub fn add_string(&mut self, value: &str) -> Result<u16, ConstPoolError> {
        let utf8_index = self.add_utf8(value)?;
        self.add(Constant::String(utf8_index))
    }

    pub fn add_integer(&mut self, value: i32) -> Result<u16, ConstPoolError> {
        self.add(Constant::Integer(value))
    }

    pub fn add_float(&mut self, value: f32) -> Result<u16, ConstPoolError> {
        self.add(Constant::Float(value))
    }

    pub fn add_long(&mut self, value: i64) -> Result<u16, ConstPoolError> {
        self.add(Constant::Long(value))
    }

    pub fn add_double(&mut self, value: f64) -> Result<u16, ConstPoolError> {
        self.add(Constant::Double(value))
    }

    pub fn add_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ConstPoolError> {
        let name_index = self.add_utf8(name)?;
        let descriptor_index = self.add_utf8(descriptor)?;
        self.add(Constant::NameAndType(name_index, descriptor_index))
    }

    pub fn add_field_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16, ConstPoolError> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::FieldRef(class_index, name_and_type_index))
    }

    pub fn add_method_ref(&mut self, class: &str, name: &str, descriptor: &str) -> Result<u16, ConstPoolError> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::MethodRef(class_index, name_and_type_index))
    }

    pub fn add_interface_method_ref(
        &mut self,
        class: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ConstPoolError> {
        let class_index = self.add_class(class)?;
        let name_and_type_index = self.add_name_and_type(name, descriptor)?;
        self.add(Constant::InterfaceMethodRef(class_index, name_and_type_index))
    }

    /// Constant at a 1-based index; `None` for 0, out-of-range and the
    /// unusable slot after a wide constant.
    pub fn get(&self, index: u16) -> Option<&Constant> {
        let slot = (index as usize).checked_sub(1)?;
        self.slots.get(slot)?.as_ref()
    }

    pub fn utf8_at(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Utf8(value) => Some(value),
            _ => None,
        }
    }

    /// Internal name behind a Class constant.
    pub fn class_name_at(&self, index: u16) -> Option<&str> {
        match self.get(index)? {
            Constant::Class(name_index) => self.utf8_at(*name_index),
            _ => None,
        }
    }

    /// `(class, name, descriptor)` of a field or method reference.
    pub fn member_ref_at(&self, index: u16) -> Option<(&str, &str, &str)> {
        let (class_index, nat_index) = match self.get(index)? {
            Constant::FieldRef(c, n) | Constant::MethodRef(c, n) | Constant::InterfaceMethodRef(c, n) => (*c, *n),
            _ => return None,
        };
        let (name_index, descriptor_index) = match self.get(nat_index)? {
            Constant::NameAndType(n, d) => (*n, *d),
            _ => return None,
        };
        Some((self.class_name_at(class_index)?, self.utf8_at(name_index)?, self.utf8_at(descriptor_index)?))
    }

    /// Value of the `constant_pool_count` header field.
    pub fn count(&self) -> usize {
        self.slots.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Live constants with their indices, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| ((i + 1) as u16, c)))
    }
}
