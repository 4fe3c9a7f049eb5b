// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field value storage.

use crate::reflect::{RecordInstance, SlotMap, SlotSet};
use std::fmt::Write;

/// Handle to a loaded object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Fully-qualified object path.
    pub path: String,
    /// Class of the referenced object.
    pub class: String,
}

/// A hierarchical dotted tag such as `Weapon.Melee`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainTag(String);

impl DomainTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Top-level segment (`Weapon` for `Weapon.Melee`).
    pub fn root(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Whether this tag equals `other` or is nested below it.
    pub fn matches(&self, other: &DomainTag) -> bool {
        self.0 == other.0
            || (self.0.len() > other.0.len()
                && self.0.starts_with(&other.0)
                && self.0.as_bytes()[other.0.len()] == b'.')
    }
}

impl std::fmt::Display for DomainTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered set of tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<DomainTag>,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag; returns `false` if it was already present.
    pub fn add(&mut self, tag: DomainTag) -> bool {
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, tag: &DomainTag) -> bool {
        self.tags.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainTag> {
        self.tags.iter()
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<DomainTag> for TagSet {
    fn from_iter<I: IntoIterator<Item = DomainTag>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.add(tag);
        }
        set
    }
}

/// Localizable text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    /// Source string, when the text was authored directly.
    pub source: Option<String>,
    /// Display string.
    pub rendered: String,
}

impl Text {
    /// Text authored from a plain string.
    pub fn from_source(s: impl Into<String>) -> Self {
        let s = s.into();
        Self {
            rendered: s.clone(),
            source: Some(s),
        }
    }

    /// Text known only by its rendered form.
    pub fn rendered(s: impl Into<String>) -> Self {
        Self {
            source: None,
            rendered: s.into(),
        }
    }

    /// Source string if present, otherwise the rendered one.
    pub fn as_str(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.rendered)
    }
}

/// Stored value of one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Symbol(String),
    Text(Text),
    /// Enumerator value of a modern enum.
    Enum(i64),
    /// Raw byte of a legacy byte enum.
    Byte(u8),
    Record(RecordInstance),
    Polymorphic(Option<Box<RecordInstance>>),
    Sequence(Vec<FieldValue>),
    Map(SlotMap),
    Set(SlotSet),
    HardRef(Option<ObjectRef>),
    SoftRef(String),
    Tag(Option<DomainTag>),
    TagSet(TagSet),
}

impl FieldValue {
    /// Short label of the stored variant.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::Float32(_) => "float32",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Text(_) => "text",
            Self::Enum(_) => "enum",
            Self::Byte(_) => "byte_enum",
            Self::Record(_) => "record",
            Self::Polymorphic(_) => "polymorphic",
            Self::Sequence(_) => "sequence",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::HardRef(_) => "hard_ref",
            Self::SoftRef(_) => "soft_ref",
            Self::Tag(_) => "tag",
            Self::TagSet(_) => "tag_set",
        }
    }

    /// Canonical identity text used to index map keys and set elements.
    ///
    /// Two values compare equal as keys iff their canonical texts match.
    pub fn canonical_key(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn write_canonical(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = match self {
            Self::Bool(v) => write!(out, "b:{}", v),
            Self::Int32(v) => write!(out, "i:{}", v),
            Self::Int64(v) => write!(out, "i:{}", v),
            Self::Float32(v) => write!(out, "f:{:08x}", v.to_bits()),
            Self::Float64(v) => write!(out, "d:{:016x}", v.to_bits()),
            Self::String(s) | Self::Symbol(s) => write!(out, "s:{}", s),
            Self::Text(t) => write!(out, "s:{}", t.as_str()),
            Self::Enum(v) => write!(out, "e:{}", v),
            Self::Byte(v) => write!(out, "e:{}", v),
            Self::SoftRef(p) => write!(out, "p:{}", p),
            Self::HardRef(r) => write!(out, "p:{}", r.as_ref().map_or("", |r| r.path.as_str())),
            Self::Tag(t) => write!(out, "t:{}", t.as_ref().map_or("", |t| t.as_str())),
            Self::TagSet(set) => {
                out.push_str("T[");
                for tag in set.iter() {
                    out.push_str(tag.as_str());
                    out.push(',');
                }
                out.push(']');
                Ok(())
            }
            Self::Record(inst) => {
                write_record_canonical(inst, out);
                Ok(())
            }
            Self::Polymorphic(inner) => {
                out.push('P');
                if let Some(inst) = inner {
                    write_record_canonical(inst, out);
                }
                Ok(())
            }
            Self::Sequence(items) => {
                out.push('[');
                for item in items {
                    item.write_canonical(out);
                    out.push(',');
                }
                out.push(']');
                Ok(())
            }
            Self::Set(set) => {
                out.push_str("S[");
                for item in set.iter() {
                    item.write_canonical(out);
                    out.push(',');
                }
                out.push(']');
                Ok(())
            }
            Self::Map(map) => {
                out.push_str("M{");
                for (k, v) in map.iter() {
                    k.write_canonical(out);
                    out.push('=');
                    v.write_canonical(out);
                    out.push(',');
                }
                out.push('}');
                Ok(())
            }
        };
    }
}

fn write_record_canonical(inst: &RecordInstance, out: &mut String) {
    out.push_str(inst.record_type());
    out.push('{');
    for value in inst.values() {
        value.write_canonical(out);
        out.push(',');
    }
    out.push('}');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_matching_respects_segments() {
        let melee = DomainTag::new("Weapon.Melee");
        assert!(melee.matches(&DomainTag::new("Weapon")));
        assert!(melee.matches(&DomainTag::new("Weapon.Melee")));
        assert!(!DomainTag::new("WeaponX").matches(&DomainTag::new("Weapon")));
        assert_eq!(melee.root(), "Weapon");
    }

    #[test]
    fn test_tag_set_deduplicates() {
        let mut set = TagSet::new();
        assert!(set.add(DomainTag::new("A.B")));
        assert!(!set.add(DomainTag::new("A.B")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_text_prefers_source() {
        let text = Text {
            source: Some("Sword".into()),
            rendered: "Schwert".into(),
        };
        assert_eq!(text.as_str(), "Sword");
        assert_eq!(Text::rendered("Axe").as_str(), "Axe");
    }

    #[test]
    fn test_canonical_key_distinguishes_kinds() {
        assert_eq!(
            FieldValue::Int32(5).canonical_key(),
            FieldValue::Int64(5).canonical_key()
        );
        assert_ne!(
            FieldValue::Int32(5).canonical_key(),
            FieldValue::String("5".into()).canonical_key()
        );
        assert_eq!(
            FieldValue::Symbol("x".into()).canonical_key(),
            FieldValue::String("x".into()).canonical_key()
        );
    }
}
