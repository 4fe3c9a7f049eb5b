// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for RecordType.

use crate::reflect::{FieldDescriptor, FieldKind, RecordType};

/// Builder for creating RecordType instances.
///
/// Fields added here are the type's own fields; inherited fields are
/// prepended when the type is registered.
#[derive(Debug)]
pub struct RecordTypeBuilder {
    name: String,
    parent: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl RecordTypeBuilder {
    /// Create a new builder for a record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            fields: Vec::new(),
        }
    }

    /// Derive from a parent record type.
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Add a field of any kind.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields
            .push(FieldDescriptor::new(name, kind, self.name.clone()));
        self
    }

    /// Add a string field.
    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field(name, FieldKind::String)
    }

    /// Add an enum field.
    pub fn enum_field(self, name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        self.field(name, FieldKind::Enum(enum_name.into()))
    }

    /// Add a nested record field.
    pub fn record_field(self, name: impl Into<String>, record: impl Into<String>) -> Self {
        self.field(name, FieldKind::Record(record.into()))
    }

    /// Add a sequence field.
    pub fn sequence_field(self, name: impl Into<String>, element: FieldKind) -> Self {
        self.field(name, FieldKind::sequence(element))
    }

    /// Add a map field.
    pub fn map_field(self, name: impl Into<String>, key: FieldKind, value: FieldKind) -> Self {
        self.field(name, FieldKind::map(key, value))
    }

    /// Add a polymorphic container field.
    pub fn polymorphic_field(self, name: impl Into<String>, base: Option<&str>) -> Self {
        self.field(name, FieldKind::polymorphic(base))
    }

    /// Build the RecordType.
    pub fn build(self) -> RecordType {
        RecordType::new(self.name, self.parent, self.fields)
    }
}
