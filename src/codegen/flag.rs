//! Access-flag bitmasks computed from declaration modifiers

use crate::ast::{AccessLevel, Declaration, Modifier};

pub mod access_flags {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_SYNCHRONIZED: u16 = 0x0020;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_TRANSIENT: u16 = 0x0080;
    pub const ACC_NATIVE: u16 = 0x0100;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_STRICT: u16 = 0x0800;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ENUM: u16 = 0x4000;
}

use access_flags::*;

pub fn access_bits(access: AccessLevel) -> u16 {
    match access {
        AccessLevel::Public => ACC_PUBLIC,
        AccessLevel::Private => ACC_PRIVATE,
        AccessLevel::Protected => ACC_PROTECTED,
        AccessLevel::PackagePrivate => 0,
    }
}

/// Bits every construct shares: access, final (or const), abstract, static,
/// synchronized.
fn base_bits(modifier: &Modifier) -> u16 {
    let mut flags = access_bits(modifier.access);
    if modifier.is_final || modifier.is_const {
        flags |= ACC_FINAL;
    }
    if modifier.is_abstract {
        flags |= ACC_ABSTRACT;
    }
    if modifier.is_static {
        flags |= ACC_STATIC;
    }
    if modifier.is_synchronized {
        flags |= ACC_SYNCHRONIZED;
    }
    flags
}

/// Class-level flags; only public survives as access, nested private or
/// protected declarations become package-visible units.
pub fn class_flags(decl: &Declaration) -> u16 {
    let modifier = &decl.info().modifier;
    let access = if modifier.access == AccessLevel::Public { ACC_PUBLIC } else { 0 };
    match decl {
        Declaration::Class(_) => {
            let mut flags = access | ACC_SUPER;
            if modifier.is_final {
                flags |= ACC_FINAL;
            }
            if modifier.is_abstract {
                flags |= ACC_ABSTRACT;
            }
            flags
        }
        Declaration::Interface(_) => access | ACC_INTERFACE | ACC_ABSTRACT,
        Declaration::Enumeration(_) => access | ACC_SUPER | ACC_FINAL | ACC_ENUM,
        Declaration::Record(_) => access | ACC_SUPER | ACC_FINAL,
    }
}

pub fn field_flags(modifier: &Modifier) -> u16 {
    let mut flags = base_bits(modifier);
    if modifier.is_volatile {
        flags |= ACC_VOLATILE;
    }
    if modifier.is_transient {
        flags |= ACC_TRANSIENT;
    }
    flags
}

pub fn method_flags(modifier: &Modifier) -> u16 {
    let mut flags = base_bits(modifier);
    if modifier.is_native {
        flags |= ACC_NATIVE;
    }
    if modifier.is_strict {
        flags |= ACC_STRICT;
    }
    flags
}

/// Interface methods are public abstract in class files before version 52.
pub fn interface_method_flags(modifier: &Modifier) -> u16 {
    let flags = method_flags(modifier) & !(ACC_PRIVATE | ACC_PROTECTED);
    flags | ACC_PUBLIC | ACC_ABSTRACT
}
