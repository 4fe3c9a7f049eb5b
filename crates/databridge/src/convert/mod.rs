// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion between record instances and JSON values.
//!
//! Both directions walk the registry's field list and dispatch on
//! [`FieldKind`]. Problems with individual fields never abort a record:
//! they are reported as [`Warning`]s and processing continues with the
//! next field.
//!
//! # Example
//!
//! ```rust
//! use databridge::convert::Converter;
//! use databridge::reflect::{default_instance, FieldKind, InMemoryRegistry, RecordTypeBuilder};
//! use serde_json::json;
//!
//! let mut registry = InMemoryRegistry::new();
//! registry
//!     .register_record(
//!         RecordTypeBuilder::new("Item")
//!             .string_field("name")
//!             .field("damage", FieldKind::Int32)
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let converter = Converter::new(&registry);
//! let mut item = default_instance(&registry, "Item", 32).unwrap();
//! let mut warnings = Vec::new();
//! assert!(converter.value_to_record(&json!({"name": "Axe", "bogus": 1}), "Item", &mut item, &mut warnings));
//! assert_eq!(warnings.len(), 1);
//! assert_eq!(converter.record_to_value("Item", &item), json!({"name": "Axe", "damage": 0}));
//! ```

mod keys;
mod read;
mod write;

use crate::reflect::{default_instance, RecordInstance, TypeRegistry};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Default name of the discriminator member injected into polymorphic values.
pub const DISCRIMINATOR_FIELD: &str = "_record_type";

/// Input members starting with this prefix are metadata, never fields.
pub const METADATA_PREFIX: char = '_';

/// Default recursion limit for nested records.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Conversion settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Member name carrying the concrete type of a polymorphic value.
    pub discriminator: String,
    /// Maximum nesting depth of records.
    pub max_depth: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            discriminator: DISCRIMINATOR_FIELD.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A non-fatal problem met while converting a record.
///
/// `field` members hold a path such as `stats.damage` or `loot[2]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Warning {
    #[error("unknown field '{field}' in record '{record}'")]
    UnknownField { record: String, field: String },

    #[error("failed to deserialize field '{field}'")]
    FieldFailed { field: String },

    #[error("expected {expected} for '{field}', got {found}")]
    KindMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown enumerator '{name}' for enum '{enum_name}' at '{field}'")]
    UnknownEnumerator {
        field: String,
        enum_name: String,
        name: String,
    },

    #[error("stored value {value} of '{field}' is not an enumerator of '{enum_name}'")]
    InvalidEnumValue {
        field: String,
        enum_name: String,
        value: i64,
    },

    #[error("value {value} for '{field}' is out of range for {kind}")]
    OutOfRange {
        field: String,
        kind: &'static str,
        value: String,
    },

    #[error("polymorphic value at '{field}' is missing its '{discriminator}' member")]
    MissingDiscriminator { field: String, discriminator: String },

    #[error("could not resolve type '{type_name}' for '{field}'")]
    UnresolvedType { field: String, type_name: String },

    #[error("type '{type_name}' at '{field}' does not derive from '{base}'")]
    NotASubtype {
        field: String,
        type_name: String,
        base: String,
    },

    #[error("failed to load object '{path}' for '{field}'")]
    LoadFailed { field: String, path: String },

    #[error("unknown tag '{tag}' for '{field}'")]
    UnknownTag { field: String, tag: String },

    #[error("invalid key '{key}' for map '{field}'")]
    InvalidKey { field: String, key: String },

    #[error("key '{key}' of map '{field}' collides with an earlier key; last value kept")]
    KeyCollision { field: String, key: String },

    #[error("stored value of '{field}' does not match its declared kind {expected}")]
    ValueMismatch { field: String, expected: &'static str },

    #[error("value {value} of '{field}' has no JSON representation")]
    NonFinite { field: String, value: String },

    #[error("record nesting deeper than {limit} at '{field}'")]
    DepthExceeded { field: String, limit: usize },
}

/// Record/JSON converter bound to a registry.
pub struct Converter<'r> {
    registry: &'r dyn TypeRegistry,
    options: ConvertOptions,
}

impl<'r> Converter<'r> {
    /// Converter with default options.
    pub fn new(registry: &'r dyn TypeRegistry) -> Self {
        Self::with_options(registry, ConvertOptions::default())
    }

    pub fn with_options(registry: &'r dyn TypeRegistry, options: ConvertOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &'r dyn TypeRegistry {
        self.registry
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Default-initialized instance of `type_name`, bounded by `max_depth`.
    pub fn instantiate(&self, type_name: &str) -> Option<RecordInstance> {
        default_instance(self.registry, type_name, self.options.max_depth)
    }

    /// Serialize a record. Never fails: an unknown type or mismatched
    /// instance yields an empty object. Field-level problems are logged.
    pub fn record_to_value(&self, type_name: &str, instance: &RecordInstance) -> Value {
        let mut warnings = Vec::new();
        let value = self.record_to_value_reporting(type_name, instance, &mut warnings);
        for warning in &warnings {
            log::warn!("serializing {}: {}", type_name, warning);
        }
        value
    }

    /// Serialize a record, collecting field-level problems into `warnings`.
    pub fn record_to_value_reporting(
        &self,
        type_name: &str,
        instance: &RecordInstance,
        warnings: &mut Vec<Warning>,
    ) -> Value {
        self.read_top_level(type_name, instance, None, warnings)
    }

    /// Serialize only the named top-level fields. An empty projection keeps
    /// every field.
    pub fn record_to_value_projected(
        &self,
        type_name: &str,
        instance: &RecordInstance,
        fields: &HashSet<String>,
    ) -> Value {
        let mut warnings = Vec::new();
        let projection = (!fields.is_empty()).then_some(fields);
        let value = self.read_top_level(type_name, instance, projection, &mut warnings);
        for warning in &warnings {
            log::warn!("serializing {}: {}", type_name, warning);
        }
        value
    }

    /// Apply a JSON object onto an existing record, best effort.
    ///
    /// Returns `false` only if `type_name` is unknown, `instance` is not of
    /// that type, or `value` is not an object. Every other problem becomes a
    /// warning; fields already written are never rolled back.
    pub fn value_to_record(
        &self,
        value: &Value,
        type_name: &str,
        instance: &mut RecordInstance,
        warnings: &mut Vec<Warning>,
    ) -> bool {
        self.write_top_level(value, type_name, instance, warnings)
    }
}

/// Serialize with default options.
pub fn record_to_value(
    registry: &dyn TypeRegistry,
    type_name: &str,
    instance: &RecordInstance,
) -> Value {
    Converter::new(registry).record_to_value(type_name, instance)
}

/// Deserialize with default options.
pub fn value_to_record(
    registry: &dyn TypeRegistry,
    value: &Value,
    type_name: &str,
    instance: &mut RecordInstance,
    warnings: &mut Vec<Warning>,
) -> bool {
    Converter::new(registry).value_to_record(value, type_name, instance, warnings)
}

pub(crate) fn json_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn child_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}
