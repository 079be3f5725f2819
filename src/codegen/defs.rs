//! Generic classfile-specific definitions

/// Header of Java class file (magic number)
pub const MAGIC: u32 = 0xCAFEBABE;

/// Name of a constructor
pub const CONSTRUCTOR_METHOD_NAME: &str = "<init>";

/// Name of a static initializer
pub const STATIC_INITIALIZER_METHOD_NAME: &str = "<clinit>";

/// Hidden array field of a closed enumeration
pub const ENUM_VALUES_FIELD_NAME: &str = "$VALUES";

/// Largest constant pool index the format can address
pub const MAX_CONSTANT_POOL_ENTRIES: usize = 65535;

/// JVM version constants
pub mod major_versions {
    pub const JAVA_1_4: u16 = 48;
    pub const JAVA_5_0: u16 = 49;
    pub const JAVA_6_0: u16 = 50;
    pub const JAVA_7: u16 = 51;
    pub const JAVA_8: u16 = 52;
}
