// Common test utilities
#![allow(dead_code)]

use std::path::Path;

use ktjc::codegen::attribute::CodeAttribute;
use ktjc::codegen::opcodes::decode;
use ktjc::{ClassUnit, Config};

/// Route `log` output through the test harness
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn compile(path: &str, source: &str) -> ktjc::Result<Vec<ClassUnit>> {
    init_logger();
    ktjc::compile(Path::new(path), source, &Config::default())
}

pub fn unit<'a>(units: &'a [ClassUnit], internal_name: &str) -> &'a ClassUnit {
    units
        .iter()
        .find(|u| u.internal_name == internal_name)
        .unwrap_or_else(|| panic!("no unit named {}", internal_name))
}

pub fn code<'a>(unit: &'a ClassUnit, name: &str, descriptor: &str) -> &'a CodeAttribute {
    unit.class_file
        .method_with(name, descriptor)
        .and_then(|m| m.code.as_ref())
        .unwrap_or_else(|| panic!("no code for {}{}", name, descriptor))
}

pub fn opcodes(code: &CodeAttribute) -> Vec<u8> {
    decode(&code.code).unwrap().iter().map(|i| i.opcode).collect()
}
