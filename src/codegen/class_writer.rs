//! Class writer: one declaration in, one class file out
//!
//! Classes and interfaces are written here; closed enumerations and
//! positional records have fixed member layouts and live in
//! [`super::enums`] and [`super::record`].

use indexmap::IndexMap;

use super::attribute::{AttributeInfo, CodeAttribute};
use super::class::ClassFile;
use super::code::Code;
use super::constpool::ConstantPool;
use super::defs::{CONSTRUCTOR_METHOD_NAME, STATIC_INITIALIZER_METHOD_NAME};
use super::descriptor::TypeScope;
use super::field::FieldInfo;
use super::flag::{self, access_flags::ACC_STATIC};
use super::gen;
use super::method::MethodInfo;
use super::signature;
use super::{enums, record};
use crate::ast::*;
use crate::config::Config;
use crate::error::{Result, ResultExt};

pub struct ClassWriter<'a> {
    decl: &'a Declaration,
    decls: &'a IndexMap<String, Declaration>,
    config: &'a Config,
    class_file: ClassFile,
}

impl<'a> ClassWriter<'a> {
    pub fn new(decl: &'a Declaration, decls: &'a IndexMap<String, Declaration>, config: &'a Config) -> Self {
        Self { decl, decls, config, class_file: ClassFile::new(config.major_version) }
    }

    /// Write every member of the declaration and hand back the class file.
    pub fn generate(mut self) -> Result<ClassFile> {
        let decl = self.decl;
        match decl {
            Declaration::Class(class) => self.generate_class(class)?,
            Declaration::Interface(iface) => self.generate_interface(iface)?,
            Declaration::Enumeration(e) => enums::generate_enum(&mut self, e)?,
            Declaration::Record(r) => record::generate_record(&mut self, r)?,
        }
        if self.config.debug {
            self.add_source_file()?;
        }
        Ok(self.class_file)
    }

    pub(super) fn decl(&self) -> &'a Declaration {
        self.decl
    }

    pub(super) fn decls(&self) -> &'a IndexMap<String, Declaration> {
        self.decls
    }

    pub(super) fn config(&self) -> &'a Config {
        self.config
    }

    pub(super) fn scope(&self) -> TypeScope<'a> {
        TypeScope::new(self.decl.info(), self.decls)
    }

    pub(super) fn pool(&mut self) -> &mut ConstantPool {
        &mut self.class_file.constant_pool
    }

    pub(super) fn this_internal(&self) -> &'a str {
        &self.decl.info().internal_name
    }

    /// Access flags, this class, superclass and interfaces.
    pub(super) fn header(&mut self, superclass: &str, interfaces: &[String]) -> Result<()> {
        let this = self.this_internal();
        self.class_file.access_flags = flag::class_flags(self.decl);
        self.class_file.this_class = self.pool().add_class(this)?;
        self.class_file.super_class = self.pool().add_class(superclass)?;
        for iface in interfaces {
            let index = self.pool().add_class(iface)?;
            self.class_file.interfaces.push(index);
        }
        log::trace!("header {}: super={} interfaces={}", this, superclass, interfaces.len());
        Ok(())
    }

    pub(super) fn add_field(&mut self, flags: u16, name: &str, descriptor: &str, sig: Option<String>) -> Result<()> {
        let name_index = self.pool().add_utf8(name)?;
        let descriptor_index = self.pool().add_utf8(descriptor)?;
        let mut field = FieldInfo::new(flags, name_index, descriptor_index);
        if let Some(sig) = sig.filter(|_| self.config.emit_signatures) {
            field.attributes.push(AttributeInfo::signature(self.pool(), &sig)?);
        }
        self.class_file.fields.push(field);
        Ok(())
    }

    pub(super) fn add_method(
        &mut self,
        flags: u16,
        name: &str,
        descriptor: &str,
        code: Option<CodeAttribute>,
        sig: Option<String>,
    ) -> Result<()> {
        let name_index = self.pool().add_utf8(name)?;
        let descriptor_index = self.pool().add_utf8(descriptor)?;
        let mut method = MethodInfo::new(flags, name_index, descriptor_index);
        method.code = code;
        if let Some(sig) = sig.filter(|_| self.config.emit_signatures) {
            method.attributes.push(AttributeInfo::signature(self.pool(), &sig)?);
        }
        self.class_file.methods.push(method);
        Ok(())
    }

    /// Class-level Signature attribute.
    pub(super) fn add_signature(&mut self, sig: Option<String>) -> Result<()> {
        if let Some(sig) = sig.filter(|_| self.config.emit_signatures) {
            let attribute = AttributeInfo::signature(self.pool(), &sig)?;
            self.class_file.attributes.push(attribute);
        }
        Ok(())
    }

    /// Finished buffer of a synthesized method.
    pub(super) fn code_attribute(&mut self, code: Code, max_locals: u16) -> Result<CodeAttribute> {
        let max_stack = code.max_stack();
        let bytes = code.finish()?;
        Ok(CodeAttribute::new(self.pool(), max_stack, max_locals, bytes)?)
    }

    fn add_source_file(&mut self) -> Result<()> {
        let path = &self.decl.info().path;
        let file_name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let attribute = AttributeInfo::source_file(self.pool(), &file_name)?;
        self.class_file.attributes.push(attribute);
        Ok(())
    }

    fn generate_class(&mut self, class: &'a ClassDecl) -> Result<()> {
        let info = &class.info;
        let scope = self.scope();
        let superclass = match &class.superclass {
            Some(name) => scope.internal_name(name).at(|| info.location())?,
            None => self.config.default_superclass.clone(),
        };
        let interfaces = class
            .interfaces
            .iter()
            .map(|name| scope.internal_name(name))
            .collect::<Result<Vec<_>>>()
            .at(|| info.location())?;
        self.header(&superclass, &interfaces)?;
        let sig = signature::class_signature(&scope, class.superclass.as_deref(), &class.interfaces)
            .at(|| info.location())?;
        self.add_signature(sig)?;

        for field in class.fields.values() {
            self.write_field(field).at(|| info.location_at(field.line))?;
        }
        for ctor in class.constructors.values() {
            self.write_constructor(ctor).at(|| info.location_at(ctor.line))?;
        }
        for method in class.methods.values() {
            let flags = flag::method_flags(&method.modifier);
            self.write_method(method, flags).at(|| info.location_at(method.line))?;
        }
        let clinit = gen::static_init_code(&mut self.class_file.constant_pool, self.decl, self.decls)?;
        if clinit.is_some() {
            self.add_method(ACC_STATIC, STATIC_INITIALIZER_METHOD_NAME, "()V", clinit, None)?;
        }
        log::debug!(
            "class {}: fields={} methods={}",
            info.internal_name,
            self.class_file.fields.len(),
            self.class_file.methods.len()
        );
        Ok(())
    }

    fn generate_interface(&mut self, iface: &'a InterfaceDecl) -> Result<()> {
        let info = &iface.info;
        let scope = self.scope();
        let extends = iface
            .extends
            .iter()
            .map(|name| scope.internal_name(name))
            .collect::<Result<Vec<_>>>()
            .at(|| info.location())?;
        self.header(crate::consts::JAVA_LANG_OBJECT, &extends)?;
        let sig = signature::class_signature(&scope, None, &iface.extends).at(|| info.location())?;
        self.add_signature(sig)?;
        for method in iface.methods.values() {
            let flags = flag::interface_method_flags(&method.modifier);
            self.write_method(method, flags).at(|| info.location_at(method.line))?;
        }
        log::debug!("interface {}: methods={}", info.internal_name, self.class_file.methods.len());
        Ok(())
    }

    fn write_field(&mut self, field: &FieldDecl) -> Result<()> {
        let scope = self.scope();
        let descriptor = scope.descriptor(&field.ty)?;
        let sig = signature::field_signature(&scope, &field.ty)?;
        self.add_field(flag::field_flags(&field.modifier), &field.name, &descriptor, sig)
    }

    fn write_constructor(&mut self, ctor: &ConstructorDecl) -> Result<()> {
        let scope = self.scope();
        let descriptor = scope.method_descriptor(&ctor.params, None)?;
        let sig = signature::method_signature(&scope, &[], &ctor.params, None)?;
        let default_superclass = self.config.default_superclass.as_str();
        let code = gen::constructor_code(&mut self.class_file.constant_pool, self.decl, self.decls, ctor, default_superclass)?;
        self.add_method(flag::method_flags(&ctor.modifier), CONSTRUCTOR_METHOD_NAME, &descriptor, Some(code), sig)
    }

    fn write_method(&mut self, method: &MethodDecl, flags: u16) -> Result<()> {
        let scope = self.scope().with_generics(&method.generics);
        let descriptor = scope.method_descriptor(&method.params, method.return_type.as_deref())?;
        let sig =
            signature::method_signature(&scope, &method.generics, &method.params, method.return_type.as_deref())?;
        let bodiless = self.decl.is_interface() || method.modifier.is_abstract || method.modifier.is_native;
        let code = if bodiless {
            None
        } else {
            Some(gen::method_code(&mut self.class_file.constant_pool, self.decl, self.decls, method)?)
        };
        self.add_method(flags, &method.name, &descriptor, code, sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::flag::access_flags::*;
    use crate::parser::parse_file;
    use std::path::Path;

    fn decls(path: &str, src: &str) -> IndexMap<String, Declaration> {
        let mut decls: IndexMap<String, Declaration> = parse_file(Path::new(path), src)
            .unwrap()
            .declarations
            .into_iter()
            .map(|d| (d.info().qualified.clone(), d))
            .collect();
        crate::review::review(&mut decls).unwrap();
        decls
    }

    fn write(decls: &IndexMap<String, Declaration>, key: &str, config: &Config) -> ClassFile {
        ClassWriter::new(&decls[key], decls, config).generate().unwrap()
    }

    #[test]
    fn class_members_and_default_constructor() {
        let decls = decls("p/A.ktj", "public class A {\n  int x = 1\n  static int n = 7\n  public int get() {\n    return x\n  }\n}\n");
        let class = write(&decls, "p.A", &Config::default());
        assert_eq!(class.this_class_name(), Some("p/A"));
        assert_eq!(class.super_class_name(), Some("java/lang/Object"));
        assert_eq!(class.access_flags, ACC_PUBLIC | ACC_SUPER);
        assert_eq!(class.field_names(), vec!["x", "n"]);
        assert!(class.method_with("<init>", "()V").is_some());
        assert!(class.method_with("get", "()I").and_then(|m| m.code.as_ref()).is_some());
        let clinit = class.method("<clinit>").unwrap();
        assert_eq!(clinit.access_flags, ACC_STATIC);
        assert_eq!(class.major_version, 49);
    }

    #[test]
    fn abstract_methods_have_no_code() {
        let decls = decls("p/A.ktj", "abstract class A {\n  public abstract int f(int a)\n}\n");
        let class = write(&decls, "p.A", &Config::default());
        let f = class.method_with("f", "(I)I").unwrap();
        assert!(f.code.is_none());
        assert_eq!(f.access_flags, ACC_PUBLIC | ACC_ABSTRACT);
        assert!(class.method("<clinit>").is_none());
    }

    #[test]
    fn interface_methods_are_public_abstract() {
        let decls = decls("p/Shape.ktj", "interface Shape {\n  double area()\n}\n");
        let class = write(&decls, "p.Shape", &Config::default());
        assert_eq!(class.access_flags & ACC_INTERFACE, ACC_INTERFACE);
        let area = class.method_with("area", "()D").unwrap();
        assert_eq!(area.access_flags, ACC_PUBLIC | ACC_ABSTRACT);
        assert!(area.code.is_none());
    }

    #[test]
    fn generic_class_carries_signatures() {
        let decls = decls("p/Box.ktj", "class Box<T> {\n  T value\n  T get() {\n    return value\n  }\n}\n");
        let class = write(&decls, "p.Box", &Config::default());
        assert_eq!(class.signature(), Some("<T:Ljava/lang/Object;>Ljava/lang/Object;"));
        let value = class.field("value").unwrap();
        assert_eq!(value.descriptor(&class.constant_pool), Some("Ljava/lang/Object;"));
        assert_eq!(value.signature(&class.constant_pool), Some("TT;"));
        let get = class.method("get").unwrap();
        assert_eq!(get.signature(&class.constant_pool), Some("()TT;"));

        let plain = write(&decls, "p.Box", &Config::default().with_signatures(false));
        assert_eq!(plain.signature(), None);
    }

    #[test]
    fn debug_adds_source_file() {
        let decls = decls("p/A.ktj", "class A {\n}\n");
        assert_eq!(write(&decls, "p.A", &Config::default()).source_file(), None);
        let class = write(&decls, "p.A", &Config::default().with_debug(true));
        assert_eq!(class.source_file(), Some("A.ktj"));
    }

    #[test]
    fn local_superclass_and_interfaces() {
        let src = "interface Shape {\n}\nclass Base {\n}\nclass Square extends Base implements Shape {\n}\n";
        let decls = decls("p/Shapes.ktj", src);
        let class = write(&decls, "p.Shapes.Square", &Config::default());
        assert_eq!(class.super_class_name(), Some("p/Shapes/Base"));
        assert_eq!(class.interface_names(), vec!["p/Shapes/Shape"]);
        let init = class.method("<init>").unwrap();
        let code = init.code.as_ref().unwrap();
        let insns = crate::codegen::opcodes::decode(&code.code).unwrap();
        let (owner, name, desc) = class.constant_pool.member_ref_at(insns[1].u16_operand().unwrap()).unwrap();
        assert_eq!((owner, name, desc), ("p/Shapes/Base", "<init>", "()V"));
    }
}
