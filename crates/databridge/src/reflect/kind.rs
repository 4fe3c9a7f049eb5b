// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field kinds: the closed set of storage shapes a record field can have.
//!
//! Kinds have a compact textual form used by fixtures and diagnostics:
//!
//! ```text
//! bool  int32  int64  float32  float64  string  symbol  text
//! enum<Rarity>          byte_enum<Rarity>      record<Stats>
//! sequence<int32>       map<symbol, float32>   set<string>
//! ref<Texture>          soft_ref               tag     tag_set
//! polymorphic           polymorphic<Effect>
//! ```

use std::fmt;
use std::str::FromStr;

/// Storage kind of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    /// Interned short identifier.
    Symbol,
    /// Localizable text (source string + rendered string).
    Text,
    /// Enum stored as the enumerator's value.
    Enum(String),
    /// Enum stored in a single byte, read back positionally.
    LegacyByteEnum(String),
    /// Nested record of the named type.
    Record(String),
    Sequence(Box<FieldKind>),
    Map(Box<FieldKind>, Box<FieldKind>),
    Set(Box<FieldKind>),
    /// Reference to a loadable object of the named class.
    HardRef(String),
    /// Unresolved object path.
    SoftRef,
    Tag,
    TagSet,
    /// Container holding any record type, optionally restricted to a base.
    Polymorphic { base: Option<String> },
}

impl FieldKind {
    /// Short label used in schemas and warnings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::Text => "text",
            Self::Enum(_) => "enum",
            Self::LegacyByteEnum(_) => "byte_enum",
            Self::Record(_) => "record",
            Self::Sequence(_) => "sequence",
            Self::Map(_, _) => "map",
            Self::Set(_) => "set",
            Self::HardRef(_) => "hard_ref",
            Self::SoftRef => "soft_ref",
            Self::Tag => "tag",
            Self::TagSet => "tag_set",
            Self::Polymorphic { .. } => "polymorphic",
        }
    }

    /// Whether values of this kind are plain text searchable by content.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Symbol | Self::Text)
    }

    pub fn sequence(element: FieldKind) -> Self {
        Self::Sequence(Box::new(element))
    }

    pub fn map(key: FieldKind, value: FieldKind) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    pub fn set(element: FieldKind) -> Self {
        Self::Set(Box::new(element))
    }

    pub fn polymorphic(base: Option<&str>) -> Self {
        Self::Polymorphic {
            base: base.map(str::to_string),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enum(name) => write!(f, "enum<{}>", name),
            Self::LegacyByteEnum(name) => write!(f, "byte_enum<{}>", name),
            Self::Record(name) => write!(f, "record<{}>", name),
            Self::Sequence(elem) => write!(f, "sequence<{}>", elem),
            Self::Map(key, value) => write!(f, "map<{}, {}>", key, value),
            Self::Set(elem) => write!(f, "set<{}>", elem),
            Self::HardRef(class) => write!(f, "ref<{}>", class),
            Self::Polymorphic { base: Some(base) } => write!(f, "polymorphic<{}>", base),
            other => f.write_str(other.label()),
        }
    }
}

/// Error parsing a textual field kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid field kind '{input}': {reason}")]
pub struct ParseKindError {
    pub input: String,
    pub reason: String,
}

impl FromStr for FieldKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = KindParser { src: s, pos: 0 };
        let kind = parser.parse_kind().map_err(|reason| ParseKindError {
            input: s.to_string(),
            reason,
        })?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(ParseKindError {
                input: s.to_string(),
                reason: format!("trailing input at offset {}", parser.pos),
            });
        }
        Ok(kind)
    }
}

struct KindParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> KindParser<'a> {
    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), String> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(format!("expected '{}' at offset {}", expected, self.pos))
        }
    }

    fn ident(&mut self) -> Result<&'a str, String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == ':' || c == '.' || c == '/' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(format!("expected identifier at offset {}", start));
        }
        Ok(&self.src[start..self.pos])
    }

    fn type_arg(&mut self) -> Result<String, String> {
        self.expect('<')?;
        let name = self.ident()?.to_string();
        self.expect('>')?;
        Ok(name)
    }

    fn kind_arg(&mut self) -> Result<FieldKind, String> {
        self.expect('<')?;
        let kind = self.parse_kind()?;
        self.expect('>')?;
        Ok(kind)
    }

    fn parse_kind(&mut self) -> Result<FieldKind, String> {
        let word = self.ident()?;
        let kind = match word {
            "bool" => FieldKind::Bool,
            "int32" => FieldKind::Int32,
            "int64" => FieldKind::Int64,
            "float32" => FieldKind::Float32,
            "float64" => FieldKind::Float64,
            "string" => FieldKind::String,
            "symbol" => FieldKind::Symbol,
            "text" => FieldKind::Text,
            "soft_ref" => FieldKind::SoftRef,
            "tag" => FieldKind::Tag,
            "tag_set" => FieldKind::TagSet,
            "enum" => FieldKind::Enum(self.type_arg()?),
            "byte_enum" => FieldKind::LegacyByteEnum(self.type_arg()?),
            "record" => FieldKind::Record(self.type_arg()?),
            "ref" => FieldKind::HardRef(self.type_arg()?),
            "sequence" => FieldKind::sequence(self.kind_arg()?),
            "set" => FieldKind::set(self.kind_arg()?),
            "map" => {
                self.expect('<')?;
                let key = self.parse_kind()?;
                self.expect(',')?;
                let value = self.parse_kind()?;
                self.expect('>')?;
                FieldKind::map(key, value)
            }
            "polymorphic" => {
                self.skip_ws();
                if self.peek() == Some('<') {
                    FieldKind::Polymorphic {
                        base: Some(self.type_arg()?),
                    }
                } else {
                    FieldKind::Polymorphic { base: None }
                }
            }
            other => return Err(format!("unknown kind '{}'", other)),
        };
        Ok(kind)
    }
}
