//! Modifiers and their per-construct legality

use std::fmt;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessLevel {
    Public,
    Private,
    Protected,
    #[default]
    PackagePrivate,
}

impl AccessLevel {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            AccessLevel::Public => Some("public"),
            AccessLevel::Private => Some("private"),
            AccessLevel::Protected => Some("protected"),
            AccessLevel::PackagePrivate => None,
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(AccessLevel::Public),
            "private" => Some(AccessLevel::Private),
            "protected" => Some(AccessLevel::Protected),
            _ => None,
        }
    }
}

/// Boolean modifier flags, independent of the access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    Final,
    Const,
    Abstract,
    Synchronized,
    Static,
    Volatile,
    Transient,
    Strict,
    Native,
}

impl Flag {
    pub const ALL: [Flag; 9] = [
        Flag::Final,
        Flag::Const,
        Flag::Abstract,
        Flag::Synchronized,
        Flag::Static,
        Flag::Volatile,
        Flag::Transient,
        Flag::Strict,
        Flag::Native,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Flag::Final => "final",
            Flag::Const => "const",
            Flag::Abstract => "abstract",
            Flag::Synchronized => "synchronized",
            Flag::Static => "static",
            Flag::Volatile => "volatile",
            Flag::Transient => "transient",
            Flag::Strict => "strict",
            Flag::Native => "native",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Flag::ALL.into_iter().find(|f| f.keyword() == word)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The construct a modifier is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construct {
    Field,
    Method,
    Constructor,
    Enumeration,
    Record,
    Interface,
    Class,
}

impl Construct {
    pub fn name(self) -> &'static str {
        match self {
            Construct::Field => "field",
            Construct::Method => "method",
            Construct::Constructor => "constructor",
            Construct::Enumeration => "type",
            Construct::Record => "data class",
            Construct::Interface => "interface",
            Construct::Class => "class",
        }
    }

    pub fn disallowed(self) -> &'static [Flag] {
        use Flag::*;
        match self {
            Construct::Field => &[Final, Abstract, Strict, Native],
            Construct::Method => &[Final, Const, Volatile, Transient],
            Construct::Constructor => {
                &[Final, Const, Abstract, Synchronized, Volatile, Transient, Strict, Native]
            }
            Construct::Enumeration | Construct::Record => {
                &[Abstract, Synchronized, Static, Volatile, Transient, Strict, Native]
            }
            Construct::Interface => &[Const, Final, Synchronized, Static, Volatile, Transient, Strict, Native],
            Construct::Class => &[Const, Synchronized, Static, Volatile, Transient, Strict, Native],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifier {
    pub access: AccessLevel,
    pub is_final: bool,
    pub is_const: bool,
    pub is_abstract: bool,
    pub is_synchronized: bool,
    pub is_static: bool,
    pub is_volatile: bool,
    pub is_transient: bool,
    pub is_strict: bool,
    pub is_native: bool,
}

impl Modifier {
    pub fn public() -> Self {
        Self { access: AccessLevel::Public, ..Self::default() }
    }

    pub fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    pub fn with(mut self, flag: Flag) -> Self {
        self.set(flag);
        self
    }

    pub fn has(&self, flag: Flag) -> bool {
        match flag {
            Flag::Final => self.is_final,
            Flag::Const => self.is_const,
            Flag::Abstract => self.is_abstract,
            Flag::Synchronized => self.is_synchronized,
            Flag::Static => self.is_static,
            Flag::Volatile => self.is_volatile,
            Flag::Transient => self.is_transient,
            Flag::Strict => self.is_strict,
            Flag::Native => self.is_native,
        }
    }

    fn slot(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Final => &mut self.is_final,
            Flag::Const => &mut self.is_const,
            Flag::Abstract => &mut self.is_abstract,
            Flag::Synchronized => &mut self.is_synchronized,
            Flag::Static => &mut self.is_static,
            Flag::Volatile => &mut self.is_volatile,
            Flag::Transient => &mut self.is_transient,
            Flag::Strict => &mut self.is_strict,
            Flag::Native => &mut self.is_native,
        }
    }

    pub fn set(&mut self, flag: Flag) {
        *self.slot(flag) = true;
    }

    /// Set a flag that must not already be present.
    pub fn add(&mut self, flag: Flag) -> Result<()> {
        let slot = self.slot(flag);
        if *slot {
            return Err(Error::parse(format!("repeated modifier '{}'", flag)));
        }
        *slot = true;
        Ok(())
    }

    pub fn flags(&self) -> impl Iterator<Item = Flag> + '_ {
        Flag::ALL.into_iter().filter(move |f| self.has(*f))
    }

    /// Reject flags the construct does not allow.
    pub fn check(&self, construct: Construct) -> Result<()> {
        if let Some(flag) = self.flags().find(|f| construct.disallowed().contains(f)) {
            return Err(Error::IllegalModifier { flag: flag.keyword().to_string(), construct: construct.name() });
        }
        if construct == Construct::Method && self.is_abstract && self.access == AccessLevel::Private {
            return Err(Error::IllegalModifier { flag: "private abstract".to_string(), construct: construct.name() });
        }
        Ok(())
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<&str> = self.access.keyword().into_iter().collect();
        words.extend(self.flags().map(Flag::keyword));
        f.write_str(&words.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abstract_field_is_rejected() {
        let m = Modifier::default().with(Flag::Abstract);
        let err = m.check(Construct::Field).unwrap_err();
        assert_eq!(err.to_string(), "illegal modifier 'abstract' on field");
    }

    #[test]
    fn private_abstract_method_is_rejected() {
        let m = Modifier::default().with_access(AccessLevel::Private).with(Flag::Abstract);
        assert!(m.check(Construct::Method).is_err());
        let m = Modifier::public().with(Flag::Abstract);
        assert!(m.check(Construct::Method).is_ok());
    }

    #[test]
    fn static_class_is_rejected() {
        let m = Modifier::public().with(Flag::Static);
        assert!(m.check(Construct::Class).is_err());
        assert!(m.check(Construct::Field).is_ok());
    }

    #[test]
    fn constructor_accepts_only_access() {
        assert!(Modifier::public().check(Construct::Constructor).is_ok());
        for flag in Flag::ALL {
            let allowed = !Construct::Constructor.disallowed().contains(&flag);
            assert_eq!(Modifier::public().with(flag).check(Construct::Constructor).is_ok(), allowed, "{}", flag);
        }
    }

    #[test]
    fn repeated_flag_fails() {
        let mut m = Modifier::default();
        m.add(Flag::Static).unwrap();
        assert!(m.add(Flag::Static).is_err());
    }

    #[test]
    fn display_lists_keywords() {
        let m = Modifier::public().with(Flag::Static).with(Flag::Const);
        assert_eq!(m.to_string(), "public const static");
    }
}
