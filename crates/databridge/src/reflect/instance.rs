// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record instances and default instantiation.

use crate::reflect::{FieldKind, FieldValue, SlotMap, SlotSet, TagSet, Text, TypeRegistry};

/// A record value: the type name plus one value per field slot.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInstance {
    record_type: String,
    values: Vec<FieldValue>,
}

impl RecordInstance {
    /// Create an instance from slot values.
    pub fn new(record_type: impl Into<String>, values: Vec<FieldValue>) -> Self {
        Self {
            record_type: record_type.into(),
            values,
        }
    }

    /// Instance with no slots, used when a type cannot be instantiated.
    pub fn empty(record_type: impl Into<String>) -> Self {
        Self::new(record_type, Vec::new())
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, slot: usize) -> Option<&FieldValue> {
        self.values.get(slot)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut FieldValue> {
        self.values.get_mut(slot)
    }

    /// Replace the value in `slot`; returns `false` if the slot does not exist.
    pub fn set(&mut self, slot: usize, value: FieldValue) -> bool {
        match self.values.get_mut(slot) {
            Some(existing) => {
                *existing = value;
                true
            }
            None => false,
        }
    }

    /// Value of the named field, resolved through the registry.
    pub fn field<'a>(&'a self, registry: &dyn TypeRegistry, name: &str) -> Option<&'a FieldValue> {
        let slot = registry.record_type(&self.record_type)?.field(name)?.slot;
        self.values.get(slot)
    }
}

/// Build a default-initialized instance of `type_name`.
///
/// Nested records deeper than `max_depth` are left as empty instances.
/// Returns `None` if the type is not registered.
pub fn default_instance(
    registry: &dyn TypeRegistry,
    type_name: &str,
    max_depth: usize,
) -> Option<RecordInstance> {
    instantiate(registry, type_name, max_depth)
}

fn instantiate(registry: &dyn TypeRegistry, type_name: &str, depth_left: usize) -> Option<RecordInstance> {
    let record = registry.record_type(type_name)?;
    let values = record
        .fields()
        .iter()
        .map(|f| default_value(registry, &f.kind, depth_left))
        .collect();
    Some(RecordInstance::new(type_name, values))
}

/// Default value for a field of `kind`.
pub fn default_value(registry: &dyn TypeRegistry, kind: &FieldKind, depth_left: usize) -> FieldValue {
    match kind {
        FieldKind::Bool => FieldValue::Bool(false),
        FieldKind::Int32 => FieldValue::Int32(0),
        FieldKind::Int64 => FieldValue::Int64(0),
        FieldKind::Float32 => FieldValue::Float32(0.0),
        FieldKind::Float64 => FieldValue::Float64(0.0),
        FieldKind::String => FieldValue::String(String::new()),
        FieldKind::Symbol => FieldValue::Symbol(String::new()),
        FieldKind::Text => FieldValue::Text(Text::default()),
        FieldKind::Enum(name) => FieldValue::Enum(
            registry
                .enum_type(name)
                .map(|e| e.default_value())
                .unwrap_or(0),
        ),
        FieldKind::LegacyByteEnum(_) => FieldValue::Byte(0),
        FieldKind::Record(name) => {
            let nested = if depth_left == 0 {
                None
            } else {
                instantiate(registry, name, depth_left - 1)
            };
            FieldValue::Record(nested.unwrap_or_else(|| RecordInstance::empty(name.clone())))
        }
        FieldKind::Sequence(_) => FieldValue::Sequence(Vec::new()),
        FieldKind::Map(_, _) => FieldValue::Map(SlotMap::new()),
        FieldKind::Set(_) => FieldValue::Set(SlotSet::new()),
        FieldKind::HardRef(_) => FieldValue::HardRef(None),
        FieldKind::SoftRef => FieldValue::SoftRef(String::new()),
        FieldKind::Tag => FieldValue::Tag(None),
        FieldKind::TagSet => FieldValue::TagSet(TagSet::new()),
        FieldKind::Polymorphic { .. } => FieldValue::Polymorphic(None),
    }
}

/// Whether `value` is storage for a field of `kind`.
pub fn value_matches_kind(kind: &FieldKind, value: &FieldValue) -> bool {
    matches!(
        (kind, value),
        (FieldKind::Bool, FieldValue::Bool(_))
            | (FieldKind::Int32, FieldValue::Int32(_))
            | (FieldKind::Int64, FieldValue::Int64(_))
            | (FieldKind::Float32, FieldValue::Float32(_))
            | (FieldKind::Float64, FieldValue::Float64(_))
            | (FieldKind::String, FieldValue::String(_))
            | (FieldKind::Symbol, FieldValue::Symbol(_))
            | (FieldKind::Text, FieldValue::Text(_))
            | (FieldKind::Enum(_), FieldValue::Enum(_))
            | (FieldKind::LegacyByteEnum(_), FieldValue::Byte(_))
            | (FieldKind::Record(_), FieldValue::Record(_))
            | (FieldKind::Sequence(_), FieldValue::Sequence(_))
            | (FieldKind::Map(_, _), FieldValue::Map(_))
            | (FieldKind::Set(_), FieldValue::Set(_))
            | (FieldKind::HardRef(_), FieldValue::HardRef(_))
            | (FieldKind::SoftRef, FieldValue::SoftRef(_))
            | (FieldKind::Tag, FieldValue::Tag(_))
            | (FieldKind::TagSet, FieldValue::TagSet(_))
            | (FieldKind::Polymorphic { .. }, FieldValue::Polymorphic(_))
    )
}
