//! Declaration parser for ktj source files
//!
//! Walks a file line by line with one token cursor and builds the
//! declaration model. Method bodies are only collected here; they are
//! parsed into statements when the method is lowered.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use super::body::ExprParser;
use super::cursor::{unexpected, SourceLine, TokenCursor};
use crate::ast::*;
use crate::consts::{IMPLICIT_USES, PARSER_MAX_BODY_LINES};
use crate::error::{Error, Result, ResultExt};

/// Everything one source file declares, in discovery order.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub declarations: Vec<Declaration>,
}

/// Parser for one ktj file
pub struct Parser {
    cursor: TokenCursor,
    uses: IndexMap<String, String>,
    static_uses: HashSet<String>,
    decls: Vec<Declaration>,
}

impl Parser {
    /// Create a parser; `path` is relative to the source root.
    pub fn new(path: &Path, source: &str) -> Result<Self> {
        Ok(Self {
            cursor: TokenCursor::new(path, source)?,
            uses: IndexMap::new(),
            static_uses: HashSet::new(),
            decls: Vec::new(),
        })
    }

    pub fn parse(mut self) -> Result<ParsedFile> {
        log::debug!("parsing {}", self.cursor.path().display());
        while self.cursor.check_word("use") {
            self.parse_use().at(|| self.cursor.location())?;
        }
        let mut top_level: HashSet<String> = HashSet::new();
        while !self.cursor.is_eof() {
            let name = self.parse_declaration(None).at(|| self.cursor.location())?;
            if let Some(name) = name {
                if !top_level.insert(name.clone()) {
                    let line = self.decls.iter().rev().find(|d| d.name() == name).map_or(0, |d| d.info().line);
                    return Err(Error::redefinition("declaration", name)
                        .at(crate::error::SourceLocation::new(self.cursor.path(), line)));
                }
            }
        }
        self.assign_names();
        self.seed_uses();
        log::debug!("parsed {} declarations from {}", self.decls.len(), self.cursor.path().display());
        Ok(ParsedFile { declarations: self.decls })
    }

    /// `use [static] a.b.C [as D]`
    fn parse_use(&mut self) -> Result<()> {
        self.cursor.expect_identifier("'use'")?;
        let is_static = self.cursor.eat_word("static");
        let mut segments = vec![self.cursor.expect_identifier("qualified name")?];
        while self.cursor.eat_punct('.') {
            segments.push(self.cursor.expect_identifier("name segment")?);
        }
        let short = if self.cursor.eat_word("as") {
            self.cursor.expect_identifier("alias")?
        } else {
            segments.last().cloned().unwrap_or_default()
        };
        self.cursor.expect_line_end()?;
        if self.uses.contains_key(&short) {
            return Err(Error::redefinition("use", short));
        }
        if is_static {
            self.static_uses.insert(short.clone());
        }
        self.uses.insert(short, segments.join("."));
        self.cursor.advance_line();
        Ok(())
    }

    fn parse_modifiers(&mut self) -> Result<Modifier> {
        let mut modifier = Modifier::default();
        let mut access_seen = false;
        while let Some(token) = self.cursor.peek().filter(|t| t.is_identifier()) {
            if let Some(access) = AccessLevel::from_keyword(&token.text) {
                if access_seen {
                    return Err(Error::parse(format!("repeated access modifier '{}'", token.text)));
                }
                access_seen = true;
                modifier.access = access;
            } else if let Some(flag) = Flag::from_keyword(&token.text) {
                modifier.add(flag)?;
            } else {
                break;
            }
            self.cursor.next();
        }
        Ok(modifier)
    }

    fn is_declaration_keyword(&self) -> bool {
        ["class", "interface", "type", "data", "record", "enum"].iter().any(|k| self.cursor.check_word(k))
    }

    /// Parse one declaration; returns its name unless it was skipped.
    fn parse_declaration(&mut self, outer: Option<&str>) -> Result<Option<String>> {
        let modifier = self.parse_modifiers()?;
        self.parse_declaration_body(modifier, outer)
    }

    fn parse_declaration_body(&mut self, modifier: Modifier, outer: Option<&str>) -> Result<Option<String>> {
        let line = self.cursor.line_number();
        let keyword = match self.cursor.next() {
            Some(token) if token.is_identifier() => token.text,
            other => return Err(unexpected("declaration", other.as_ref())),
        };
        let index = self.decls.len();
        let decl = match keyword.as_str() {
            "class" => self.parse_class(modifier, line, outer)?,
            "interface" => self.parse_interface(modifier, line, outer)?,
            "type" => self.parse_enumeration(modifier, line)?,
            "data" => self.parse_record(modifier, line)?,
            "record" | "enum" => {
                log::warn!(
                    "'{}' declarations are not supported, skipping {}:{}",
                    keyword,
                    self.cursor.path().display(),
                    line
                );
                self.skip_construct()?;
                return Ok(None);
            }
            other => return Err(Error::parse(format!("expected declaration, found '{}'", other))),
        };
        let mut decl = decl;
        decl.info_mut().outer = outer.map(str::to_string);
        let name = decl.name().to_string();
        self.decls.insert(index, decl);
        Ok(Some(name))
    }

    fn new_info(&self, name: String, modifier: Modifier, line: usize) -> DeclInfo {
        DeclInfo::new(name, modifier, self.cursor.path(), line)
    }

    /// Drop the rest of the line and any braced block it opens.
    fn skip_construct(&mut self) -> Result<()> {
        let mut depth = brace_delta(&self.cursor.rest_of_line());
        self.cursor.advance_line();
        while depth > 0 {
            let line = self.cursor.take_line().ok_or_else(|| Error::parse("expected '}'"))?;
            depth += brace_delta(&line.tokens);
        }
        Ok(())
    }

    fn parse_type(&mut self) -> Result<String> {
        let name = self.cursor.expect_identifier("type name")?;
        let mut dims = 0;
        while self.cursor.check_punct('[') && self.cursor.peek_nth(1).map_or(false, |t| t.is_punct(']')) {
            self.cursor.next();
            self.cursor.next();
            dims += 1;
        }
        Ok(format!("{}{}", "[".repeat(dims), name))
    }

    fn parse_type_list(&mut self) -> Result<Vec<String>> {
        let mut types = vec![self.parse_type()?];
        while self.cursor.eat_punct(',') {
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    /// `<T : A & B, U>`
    fn parse_generics(&mut self) -> Result<Vec<GenericParam>> {
        let mut params = Vec::new();
        if !self.cursor.eat_operator("<") {
            return Ok(params);
        }
        loop {
            let mut param = GenericParam::new(self.cursor.expect_identifier("generic parameter")?);
            if params.iter().any(|p: &GenericParam| p.name == param.name) {
                return Err(Error::redefinition("generic parameter", param.name));
            }
            if self.cursor.eat_punct(':') {
                param.bounds.push(self.parse_type()?);
                while self.cursor.eat_operator("&") {
                    param.bounds.push(self.parse_type()?);
                }
            }
            params.push(param);
            if self.cursor.eat_punct(',') {
                continue;
            }
            self.cursor.expect_operator(">")?;
            return Ok(params);
        }
    }

    /// `{` closing a header line; the cursor moves to the first member line.
    fn open_block(&mut self) -> Result<()> {
        self.cursor.expect_punct('{')?;
        self.cursor.expect_line_end()?;
        self.cursor.advance_line();
        Ok(())
    }

    fn parse_class(&mut self, modifier: Modifier, line: usize, outer: Option<&str>) -> Result<Declaration> {
        modifier.check(Construct::Class)?;
        let name = self.cursor.expect_identifier("class name")?;
        let mut info = self.new_info(name, modifier, line);
        info.generics = self.parse_generics()?;
        let mut class = ClassDecl::new(info);
        if self.cursor.eat_word("extends") {
            class.superclass = Some(self.parse_type()?);
        }
        if self.cursor.eat_word("implements") {
            class.interfaces = self.parse_type_list()?;
        }
        self.open_block()?;
        let nested = outer.is_none().then(|| class.info.name.clone());
        self.parse_members(nested.as_deref(), |member| match member {
            Member::Field(field) => class.add_field(field),
            Member::Method(method) => {
                if method.body.is_none() && !method.modifier.is_abstract && !method.modifier.is_native {
                    return Err(Error::parse(format!("method '{}' requires a body", method.name)));
                }
                class.add_method(method)
            }
            Member::Constructor(ctor) => class.add_constructor(ctor),
        })?;
        Ok(Declaration::Class(class))
    }

    fn parse_interface(&mut self, modifier: Modifier, line: usize, outer: Option<&str>) -> Result<Declaration> {
        modifier.check(Construct::Interface)?;
        let name = self.cursor.expect_identifier("interface name")?;
        let mut info = self.new_info(name, modifier, line);
        info.generics = self.parse_generics()?;
        let mut interface = InterfaceDecl::new(info);
        if self.cursor.eat_word("extends") {
            interface.extends = self.parse_type_list()?;
        }
        self.open_block()?;
        let nested = outer.is_none().then(|| interface.info.name.clone());
        self.parse_members(nested.as_deref(), |member| match member {
            Member::Field(_) => Err(Error::parse("interfaces cannot declare fields")),
            Member::Constructor(_) => Err(Error::parse("interfaces cannot declare constructors")),
            Member::Method(mut method) => {
                if method.body.is_some() {
                    return Err(Error::parse(format!("interface method '{}' cannot have a body", method.name)));
                }
                method.modifier.is_abstract = true;
                interface.add_method(method)
            }
        })?;
        Ok(Declaration::Interface(interface))
    }

    /// `type Color = RED | GREEN | BLUE`
    fn parse_enumeration(&mut self, modifier: Modifier, line: usize) -> Result<Declaration> {
        modifier.check(Construct::Enumeration)?;
        let name = self.cursor.expect_identifier("type name")?;
        let mut enumeration = EnumerationDecl::new(self.new_info(name, modifier, line));
        self.cursor.expect_operator("=")?;
        enumeration.add_value(self.cursor.expect_identifier("value name")?);
        while self.cursor.eat_operator("|") {
            enumeration.add_value(self.cursor.expect_identifier("value name")?);
        }
        self.cursor.expect_line_end()?;
        self.cursor.advance_line();
        Ok(Declaration::Enumeration(enumeration))
    }

    /// `data Point = [int x, int y]`, components may continue on following lines.
    fn parse_record(&mut self, modifier: Modifier, line: usize) -> Result<Declaration> {
        modifier.check(Construct::Record)?;
        let name = self.cursor.expect_identifier("data class name")?;
        let mut record = RecordDecl::new(self.new_info(name, modifier, line));
        self.cursor.expect_operator("=")?;
        self.cursor.expect_punct('[')?;
        if !self.peek_any_is(']') {
            loop {
                self.cursor.peek_any();
                let line = self.cursor.line_number();
                let modifier = self.parse_modifiers()?;
                modifier.check(Construct::Field)?;
                // components are instance state of the canonical constructor
                if modifier.is_static {
                    return Err(Error::IllegalModifier {
                        flag: "static".to_string(),
                        construct: "data class component",
                    });
                }
                let ty = self.parse_type()?;
                let name = self.cursor.expect_identifier("component name")?;
                record.add_field(FieldDecl { name, ty, modifier, line, init: None })?;
                if self.peek_any_is(',') {
                    self.cursor.next();
                    continue;
                }
                break;
            }
        }
        if !self.peek_any_is(']') {
            return Err(unexpected("']'", self.cursor.peek()));
        }
        self.cursor.next();
        self.cursor.expect_line_end()?;
        self.cursor.advance_line();
        Ok(Declaration::Record(record))
    }

    fn peek_any_is(&mut self, ch: char) -> bool {
        self.cursor.peek_any().map_or(false, |t| t.is_punct(ch))
    }

    /// Members up to the `}` line closing the declaration. `nest_under` is
    /// the enclosing name when nested declarations are still allowed.
    fn parse_members<F>(&mut self, nest_under: Option<&str>, mut accept: F) -> Result<()>
    where
        F: FnMut(Member) -> Result<()>,
    {
        let mut nested_names: HashSet<String> = HashSet::new();
        loop {
            let current = self.cursor.current_line().ok_or_else(|| Error::parse("expected '}'"))?;
            if current.is_closing_brace() {
                self.cursor.advance_line();
                return Ok(());
            }
            let location = self.cursor.location();
            let modifier = self.parse_modifiers().at(|| location.clone())?;
            if self.is_declaration_keyword() {
                let outer = nest_under
                    .ok_or_else(|| Error::parse("declarations nest only one level deep").at(location.clone()))?;
                if let Some(name) = self.parse_declaration_body(modifier, Some(outer)).at(|| location.clone())? {
                    if !nested_names.insert(name.clone()) {
                        return Err(Error::redefinition("declaration", name).at(location));
                    }
                }
                continue;
            }
            let member = self.parse_member(modifier).at(|| location.clone())?;
            accept(member).at(|| location)?;
        }
    }

    fn parse_member(&mut self, modifier: Modifier) -> Result<Member> {
        let line = self.cursor.line_number();
        if self.cursor.check_word("init") && self.cursor.peek_nth(1).map_or(false, |t| t.is_punct('(')) {
            self.cursor.next();
            return self.parse_constructor(modifier, line).map(Member::Constructor);
        }
        let generics = self.parse_generics()?;
        let ty = self.parse_type()?;
        let name = self.cursor.expect_identifier("member name")?;
        if self.cursor.check_punct('(') {
            let return_type = if ty == "void" { None } else { Some(ty) };
            return self.parse_method(modifier, generics, return_type, name, line).map(Member::Method);
        }
        if !generics.is_empty() {
            return Err(Error::parse(format!("field '{}' cannot declare generic parameters", name)));
        }
        if ty == "void" {
            return Err(Error::parse(format!("field '{}' cannot have type void", name)));
        }
        modifier.check(Construct::Field)?;
        let init = if self.cursor.eat_operator("=") {
            let rest = self.cursor.rest_of_line();
            Some(ExprParser::parse_all(&rest)?)
        } else {
            None
        };
        self.cursor.expect_line_end()?;
        self.cursor.advance_line();
        Ok(Member::Field(FieldDecl { name, ty, modifier, line, init }))
    }

    fn parse_params(&mut self) -> Result<Vec<Param>> {
        self.cursor.expect_punct('(')?;
        let mut params: Vec<Param> = Vec::new();
        if self.cursor.eat_punct(')') {
            return Ok(params);
        }
        loop {
            let ty = self.parse_type()?;
            let name = self.cursor.expect_identifier("parameter name")?;
            if params.iter().any(|p| p.name == name) {
                return Err(Error::redefinition("parameter", name));
            }
            params.push(Param::new(name, ty));
            if self.cursor.eat_punct(')') {
                return Ok(params);
            }
            self.cursor.expect_punct(',')?;
        }
    }

    fn parse_method(
        &mut self,
        modifier: Modifier,
        generics: Vec<GenericParam>,
        return_type: Option<String>,
        name: String,
        line: usize,
    ) -> Result<MethodDecl> {
        modifier.check(Construct::Method)?;
        let params = self.parse_params()?;
        let body = if self.cursor.check_punct('{') {
            if modifier.is_abstract || modifier.is_native {
                return Err(Error::parse(format!("{} method '{}' cannot have a body", kind_of(&modifier), name)));
            }
            self.open_block()?;
            Some(self.collect_body()?)
        } else {
            self.cursor.expect_line_end()?;
            self.cursor.advance_line();
            None
        };
        Ok(MethodDecl { name, return_type, params, body, modifier, generics, line })
    }

    /// `init(params) [: Super(args)] {`
    fn parse_constructor(&mut self, modifier: Modifier, line: usize) -> Result<ConstructorDecl> {
        modifier.check(Construct::Constructor)?;
        let params = self.parse_params()?;
        let super_call = if self.cursor.eat_punct(':') {
            let target = self.cursor.expect_identifier("superclass name")?;
            let rest = self.cursor.rest_of_line();
            let mut parser = ExprParser::new(&rest);
            let args = parser.parse_args()?;
            match rest.get(parser.position()..) {
                Some([brace]) if brace.is_punct('{') => {}
                _ => return Err(unexpected("'{'", rest.get(parser.position()))),
            }
            self.cursor.advance_line();
            Some(SuperCall { target, args })
        } else {
            self.open_block()?;
            None
        };
        let body = self.collect_body()?;
        Ok(ConstructorDecl { params, body, modifier, super_call, line })
    }

    /// Lines after an opening `{` up to the `}` line that closes it.
    fn collect_body(&mut self) -> Result<Vec<SourceLine>> {
        let mut lines = Vec::new();
        let mut depth: i64 = 1;
        loop {
            let line = self.cursor.take_line().ok_or_else(|| Error::parse("expected '}'"))?;
            if depth == 1 && line.is_closing_brace() {
                return Ok(lines);
            }
            depth += brace_delta(&line.tokens);
            if depth < 1 {
                return Err(Error::parse("unbalanced '}'")
                    .at(crate::error::SourceLocation::new(self.cursor.path(), line.number)));
            }
            if lines.len() >= PARSER_MAX_BODY_LINES {
                return Err(Error::parse("method body too long"));
            }
            lines.push(line);
        }
    }

    /// Fill in qualified keys and internal names once every declaration is known.
    fn assign_names(&mut self) {
        let path = self.cursor.path().to_path_buf();
        let base = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let mut prefix: Vec<String> = path
            .parent()
            .map(|p| p.iter().map(|s| s.to_string_lossy().into_owned()).collect())
            .unwrap_or_default();
        let top: Vec<&Declaration> = self.decls.iter().filter(|d| d.info().outer.is_none()).collect();
        let single = top.len() == 1 && top[0].name() == base;
        if !single {
            prefix.push(base);
        }

        let mut outer_names: IndexMap<String, (String, String)> = IndexMap::new();
        for decl in self.decls.iter_mut().filter(|d| d.info().outer.is_none()) {
            let info = decl.info_mut();
            let mut segments = prefix.clone();
            segments.push(info.name.clone());
            info.qualified = segments.join(".");
            info.internal_name = segments.join("/");
            outer_names.insert(info.name.clone(), (info.qualified.clone(), info.internal_name.clone()));
        }
        for decl in self.decls.iter_mut() {
            let info = decl.info_mut();
            let Some(outer) = info.outer.clone() else { continue };
            if let Some((qualified, internal)) = outer_names.get(&outer) {
                info.qualified = format!("{}.{}", qualified, info.name);
                info.internal_name = format!("{}${}", internal, info.name);
                info.outer = Some(qualified.clone());
            }
        }
    }

    /// Implicit names, then same-file declarations, then explicit `use` lines.
    fn seed_uses(&mut self) {
        let visible: Vec<(String, String, Option<String>, bool)> = self
            .decls
            .iter()
            .map(|d| {
                let info = d.info();
                let private = info.modifier.access == AccessLevel::Private;
                (info.name.clone(), info.qualified.clone(), info.outer.clone(), private)
            })
            .collect();
        for decl in self.decls.iter_mut() {
            let info = decl.info_mut();
            let mut uses: IndexMap<String, String> =
                IMPLICIT_USES.iter().map(|(short, full)| (short.to_string(), full.to_string())).collect();
            let scope = info.outer.clone().unwrap_or_else(|| info.qualified.clone());
            for (name, qualified, outer, private) in &visible {
                // private nested declarations are seen only from their enclosing scope
                let in_scope = match (outer, private) {
                    (Some(outer), true) => *outer == scope,
                    _ => true,
                };
                if in_scope {
                    uses.insert(name.clone(), qualified.clone());
                }
            }
            for (short, full) in &self.uses {
                uses.insert(short.clone(), full.clone());
            }
            info.uses = uses;
            info.static_uses = self.static_uses.clone();
        }
    }
}

/// A parsed class or interface member.
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
}

fn kind_of(modifier: &Modifier) -> &'static str {
    if modifier.is_native {
        "native"
    } else {
        "abstract"
    }
}

fn brace_delta(tokens: &[super::lexer::Token]) -> i64 {
    tokens.iter().fold(0, |depth, t| {
        if t.is_punct('{') {
            depth + 1
        } else if t.is_punct('}') {
            depth - 1
        } else {
            depth
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, src: &str) -> Result<ParsedFile> {
        Parser::new(Path::new(path), src)?.parse()
    }

    #[test]
    fn single_matching_declaration_drops_file_segment() {
        let file = parse("geo/Point.ktj", "public data Point = [int x, int y]").unwrap();
        let info = file.declarations[0].info();
        assert_eq!(info.qualified, "geo.Point");
        assert_eq!(info.internal_name, "geo/Point");
    }

    #[test]
    fn several_declarations_keep_file_segment() {
        let file = parse("geo/Shapes.ktj", "type Kind = A | B\npublic class Box {\n}\n").unwrap();
        let names: Vec<_> = file.declarations.iter().map(|d| d.info().internal_name.clone()).collect();
        assert_eq!(names, vec!["geo/Shapes/Kind", "geo/Shapes/Box"]);
        assert_eq!(file.declarations[1].info().uses.get("Kind").map(String::as_str), Some("geo.Shapes.Kind"));
    }

    #[test]
    fn nested_declaration_names() {
        let src = "public class Outer {\n  public type Mode = ON | OFF\n  int x\n}\n";
        let file = parse("Outer.ktj", src).unwrap();
        assert_eq!(file.declarations.len(), 2);
        assert_eq!(file.declarations[0].name(), "Outer");
        let inner = file.declarations[1].info();
        assert_eq!(inner.qualified, "Outer.Mode");
        assert_eq!(inner.internal_name, "Outer$Mode");
        assert_eq!(inner.outer.as_deref(), Some("Outer"));
    }

    #[test]
    fn method_body_lines_are_collected() {
        let src = "class A {\n  int f(int a) {\n    if a > 0 {\n      return a\n    }\n    return 0\n  }\n}\n";
        let file = parse("A.ktj", src).unwrap();
        let Declaration::Class(class) = &file.declarations[0] else { panic!("not a class") };
        let method = &class.methods["f(int)"];
        assert_eq!(method.body.as_ref().map(Vec::len), Some(4));
        assert_eq!(method.return_type.as_deref(), Some("int"));
    }

    #[test]
    fn use_lines_override_implicit_names() {
        let src = "use java.util.List\nuse static java.lang.Math as M\nclass A {\n}\n";
        let file = parse("A.ktj", src).unwrap();
        let info = file.declarations[0].info();
        assert_eq!(info.uses.get("List").map(String::as_str), Some("java.util.List"));
        assert_eq!(info.uses.get("M").map(String::as_str), Some("java.lang.Math"));
        assert!(info.static_uses.contains("M"));
        assert_eq!(info.modifier.access, AccessLevel::PackagePrivate);
    }

    #[test]
    fn constructor_with_super_call() {
        let src = "class B extends A {\n  init(int x) : A(x, 1) {\n  }\n}\nclass A {\n  init(int x, int y) {\n  }\n}\n";
        let file = parse("pkg/Two.ktj", src).unwrap();
        let Declaration::Class(class) = &file.declarations[0] else { panic!("not a class") };
        let ctor = &class.constructors["<init>(int)"];
        let call = ctor.super_call.as_ref().unwrap();
        assert_eq!(call.target, "A");
        assert_eq!(call.args.len(), 2);
    }

    #[test]
    fn record_components_may_span_lines() {
        let file = parse("P.ktj", "data P = [int x,\n    long y,\n    String z]\n").unwrap();
        let Declaration::Record(record) = &file.declarations[0] else { panic!("not a record") };
        let names: Vec<_> = record.fields.keys().cloned().collect();
        assert_eq!(names, vec!["x", "y", "z"]);
        assert_eq!(record.fields["y"].line, 2);
    }

    #[test]
    fn static_record_component_is_rejected() {
        let err = parse("P.ktj", "data P = [int x,\n    static int y]\n").unwrap_err();
        assert!(
            matches!(err.kind(), Error::IllegalModifier { flag, construct: "data class component" } if flag == "static"),
            "{}",
            err
        );
        assert_eq!(err.location().map(|l| l.line), Some(2));
    }

    #[test]
    fn reserved_keywords_are_skipped() {
        let file = parse("A.ktj", "enum E {\n  A, B\n}\nclass A {\n}\n").unwrap();
        assert_eq!(file.declarations.len(), 1);
        assert_eq!(file.declarations[0].name(), "A");
    }

    #[test]
    fn interface_methods_are_abstract() {
        let file = parse("I.ktj", "public interface I {\n  int size()\n}\n").unwrap();
        let Declaration::Interface(i) = &file.declarations[0] else { panic!("not an interface") };
        assert!(i.methods["size()"].modifier.is_abstract);
    }

    #[test]
    fn missing_closing_brace() {
        let err = parse("A.ktj", "class A {\n  int x\n").unwrap_err();
        assert!(err.to_string().starts_with("expected '}'"), "{}", err);
    }
}
