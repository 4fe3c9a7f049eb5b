// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record and enum descriptors.

use crate::reflect::FieldKind;

/// A single field of a record type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Storage kind.
    pub kind: FieldKind,
    /// Record type that declares this field.
    pub owner: String,
    /// Index of the field's value in a record instance.
    pub slot: usize,
}

impl FieldDescriptor {
    /// Create a field declared by `owner`. The slot is assigned on registration.
    pub fn new(name: impl Into<String>, kind: FieldKind, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            owner: owner.into(),
            slot: 0,
        }
    }
}

/// A record type with its flattened field list.
///
/// Inherited fields come first, in the parent's order, followed by the
/// type's own fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    name: String,
    parent: Option<String>,
    fields: Vec<FieldDescriptor>,
    wrapper: bool,
}

impl RecordType {
    /// Create a record type from already-flattened fields.
    pub fn new(name: impl Into<String>, parent: Option<String>, fields: Vec<FieldDescriptor>) -> Self {
        let mut record = Self {
            name: name.into(),
            parent,
            fields,
            wrapper: false,
        };
        record.renumber();
        record
    }

    /// Create a polymorphic wrapper type: a record whose whole payload is a
    /// single polymorphic container.
    pub fn polymorphic_wrapper(name: impl Into<String>, base: Option<&str>) -> Self {
        let name = name.into();
        let field = FieldDescriptor::new("value", FieldKind::polymorphic(base), name.clone());
        let mut record = Self::new(name, None, vec![field]);
        record.wrapper = true;
        record
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// All fields, inherited first.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Fields declared by this type itself.
    pub fn own_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.owner == self.name)
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether this is a polymorphic wrapper type.
    pub fn is_polymorphic_wrapper(&self) -> bool {
        self.wrapper
    }

    /// Base hint of the wrapped polymorphic field, if this is a wrapper.
    pub fn wrapper_base(&self) -> Option<&str> {
        if !self.wrapper {
            return None;
        }
        match self.fields.first().map(|f| &f.kind) {
            Some(FieldKind::Polymorphic { base }) => base.as_deref(),
            _ => None,
        }
    }

    /// Prepend the parent's flattened fields to this type's own fields.
    pub(crate) fn inherit_from(&mut self, parent: &RecordType) {
        let mut fields = parent.fields.clone();
        fields.append(&mut self.fields);
        self.fields = fields;
        self.renumber();
    }

    fn renumber(&mut self) {
        for (slot, field) in self.fields.iter_mut().enumerate() {
            field.slot = slot;
        }
    }
}

/// A named enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
}

/// An enum type with enumerators in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub enumerators: Vec<Enumerator>,
}

impl EnumType {
    /// Create an enum whose enumerators take the values 0, 1, 2, ...
    pub fn sequential<I, S>(name: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let enumerators = names
            .into_iter()
            .enumerate()
            .map(|(i, n)| Enumerator {
                name: n.into(),
                value: i as i64,
            })
            .collect();
        Self {
            name: name.into(),
            enumerators,
        }
    }

    /// Create an enum from explicit (name, value) pairs.
    pub fn with_values<I, S>(name: impl Into<String>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let enumerators = pairs
            .into_iter()
            .map(|(n, value)| Enumerator {
                name: n.into(),
                value,
            })
            .collect();
        Self {
            name: name.into(),
            enumerators,
        }
    }

    /// Position of the enumerator holding `value`.
    pub fn position_of_value(&self, value: i64) -> Option<usize> {
        self.enumerators.iter().position(|e| e.value == value)
    }

    /// Name of the enumerator at `position`.
    pub fn name_at(&self, position: usize) -> Option<&str> {
        self.enumerators.get(position).map(|e| e.name.as_str())
    }

    /// Value for a short (`Rare`) or qualified (`Rarity::Rare`) enumerator name.
    pub fn value_of(&self, name: &str) -> Option<i64> {
        let short = match name.split_once("::") {
            Some((prefix, rest)) if prefix == self.name => rest,
            _ => name,
        };
        self.enumerators
            .iter()
            .find(|e| e.name == short)
            .map(|e| e.value)
    }

    /// Enumerator names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.enumerators.iter().map(|e| e.name.as_str())
    }

    /// Value of the first enumerator, used as the default.
    pub fn default_value(&self) -> i64 {
        self.enumerators.first().map(|e| e.value).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_lookup_by_short_and_qualified_name() {
        let rarity = EnumType::with_values("Rarity", [("Common", 0), ("Rare", 5), ("Epic", 9)]);
        assert_eq!(rarity.value_of("Rare"), Some(5));
        assert_eq!(rarity.value_of("Rarity::Epic"), Some(9));
        assert_eq!(rarity.value_of("Other::Epic"), None);
        assert_eq!(rarity.value_of("Legendary"), None);
    }

    #[test]
    fn test_enum_position_is_independent_of_value() {
        let rarity = EnumType::with_values("Rarity", [("Common", 10), ("Rare", 20)]);
        assert_eq!(rarity.position_of_value(20), Some(1));
        assert_eq!(rarity.name_at(1), Some("Rare"));
        assert_eq!(rarity.position_of_value(1), None);
        assert_eq!(rarity.default_value(), 10);
    }

    #[test]
    fn test_inherit_from_puts_parent_fields_first() {
        let base = RecordType::new(
            "Item",
            None,
            vec![FieldDescriptor::new("name", FieldKind::String, "Item")],
        );
        let mut weapon = RecordType::new(
            "Weapon",
            Some("Item".into()),
            vec![FieldDescriptor::new("damage", FieldKind::Int32, "Weapon")],
        );
        weapon.inherit_from(&base);

        let names: Vec<_> = weapon.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "damage"]);
        assert_eq!(weapon.field("damage").map(|f| f.slot), Some(1));
        assert_eq!(weapon.own_fields().count(), 1);
    }

    #[test]
    fn test_polymorphic_wrapper() {
        let wrapper = RecordType::polymorphic_wrapper("InstancedRecord", Some("Effect"));
        assert!(wrapper.is_polymorphic_wrapper());
        assert_eq!(wrapper.wrapper_base(), Some("Effect"));
        assert_eq!(wrapper.fields().len(), 1);
    }
}
