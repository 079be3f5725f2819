use super::decl::*;
use super::modifier::Modifier;

/// Declaration printer for debugging and the `parse` command output
pub struct DeclPrinter {
    indent_level: usize,
    output: String,
}

impl Default for DeclPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeclPrinter {
    pub fn new() -> Self {
        Self { indent_level: 0, output: String::new() }
    }

    pub fn print(&mut self, decl: &Declaration) -> String {
        self.output.clear();
        self.visit_declaration(decl);
        self.output.clone()
    }

    fn indent(&mut self) {
        self.indent_level += 2;
    }

    fn dedent(&mut self) {
        if self.indent_level >= 2 {
            self.indent_level -= 2;
        }
    }

    fn writeln(&mut self, s: &str) {
        for _ in 0..self.indent_level {
            self.output.push(' ');
        }
        self.output.push_str(s);
        self.output.push('\n');
    }

    fn visit_declaration(&mut self, decl: &Declaration) {
        let info = decl.info();
        match decl {
            Declaration::Enumeration(e) => {
                let head = header(&info.modifier, "type", &info.name, &[]);
                self.writeln(&format!("{} = {}", head, e.values.join(" | ")));
            }
            Declaration::Record(r) => {
                let components: Vec<String> = r.fields.values().map(field_text).collect();
                let head = header(&info.modifier, "data", &info.name, &[]);
                self.writeln(&format!("{} = [{}]", head, components.join(", ")));
            }
            Declaration::Interface(i) => {
                let mut head = header(&info.modifier, "interface", &info.name, &info.generics);
                if !i.extends.is_empty() {
                    head.push_str(&format!(" extends {}", i.extends.join(", ")));
                }
                self.writeln(&format!("{} {{", head));
                self.indent();
                for method in i.methods.values() {
                    self.visit_method(method);
                }
                self.dedent();
                self.writeln("}");
            }
            Declaration::Class(c) => {
                let mut head = header(&info.modifier, "class", &info.name, &info.generics);
                if let Some(superclass) = &c.superclass {
                    head.push_str(&format!(" extends {}", superclass));
                }
                if !c.interfaces.is_empty() {
                    head.push_str(&format!(" implements {}", c.interfaces.join(", ")));
                }
                self.writeln(&format!("{} {{", head));
                self.indent();
                for field in c.fields.values() {
                    match &field.init {
                        Some(init) => self.writeln(&format!("{} = {}", field_text(field), init)),
                        None => self.writeln(&field_text(field)),
                    }
                }
                for ctor in c.constructors.values() {
                    let mut text = format!("{}init({})", prefix(&ctor.modifier), params_text(&ctor.params));
                    if let Some(call) = &ctor.super_call {
                        let args: Vec<String> = call.args.iter().map(|a| a.to_string()).collect();
                        text.push_str(&format!(" : {}({})", call.target, args.join(", ")));
                    }
                    self.writeln(&format!("{} [{} lines]", text, ctor.body.len()));
                }
                for method in c.methods.values() {
                    self.visit_method(method);
                }
                self.dedent();
                self.writeln("}");
            }
        }
    }

    fn visit_method(&mut self, method: &MethodDecl) {
        let generics = generics_text(&method.generics);
        let generics = if generics.is_empty() { generics } else { format!("{} ", generics) };
        let mut text = format!(
            "{}{}{} {}({})",
            prefix(&method.modifier),
            generics,
            method.return_type.as_deref().map(display_type).unwrap_or_else(|| "void".to_string()),
            method.name,
            params_text(&method.params)
        );
        if let Some(body) = &method.body {
            text.push_str(&format!(" [{} lines]", body.len()));
        }
        self.writeln(&text);
    }
}

fn prefix(modifier: &Modifier) -> String {
    let text = modifier.to_string();
    if text.is_empty() {
        text
    } else {
        format!("{} ", text)
    }
}

fn header(modifier: &Modifier, keyword: &str, name: &str, generics: &[GenericParam]) -> String {
    format!("{}{} {}{}", prefix(modifier), keyword, name, generics_text(generics))
}

fn generics_text(generics: &[GenericParam]) -> String {
    if generics.is_empty() {
        return String::new();
    }
    let params: Vec<String> = generics
        .iter()
        .map(|g| {
            if g.bounds.is_empty() {
                g.name.clone()
            } else {
                format!("{} : {}", g.name, g.bounds.join(" & "))
            }
        })
        .collect();
    format!("<{}>", params.join(", "))
}

fn field_text(field: &FieldDecl) -> String {
    format!("{}{} {}", prefix(&field.modifier), display_type(&field.ty), field.name)
}

fn params_text(params: &[Param]) -> String {
    params.iter().map(|p| format!("{} {}", display_type(&p.ty), p.name)).collect::<Vec<_>>().join(", ")
}

/// `[int` back to `int[]`
fn display_type(ty: &str) -> String {
    let dims = ty.chars().take_while(|c| *c == '[').count();
    format!("{}{}", &ty[dims..], "[]".repeat(dims))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prints_enumeration_on_one_line() {
        let mut e = EnumerationDecl::new(DeclInfo::new("Color", Modifier::public(), "Color.ktj", 1));
        e.add_value("RED");
        e.add_value("GREEN");
        let text = DeclPrinter::new().print(&Declaration::Enumeration(e));
        assert_eq!(text, "public type Color = RED | GREEN\n");
    }

    #[test]
    fn array_types_print_in_source_form() {
        assert_eq!(display_type("[[int"), "int[][]");
        assert_eq!(display_type("String"), "String");
    }
}
