// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declarative schema of registered record types.
//!
//! Mirrors the conversion engine's kind dispatch so that a client can learn
//! the JSON shape a record accepts before sending it.

use crate::convert::DEFAULT_MAX_DEPTH;
use crate::reflect::{FieldDescriptor, FieldKind, RecordType, TypeRegistry};
use crate::subtypes::SubtypeIndex;
use serde::Serialize;

/// Schema of one record type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordSchema {
    pub struct_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_struct: Option<String>,
    pub fields: Vec<FieldSchema>,
}

/// Schema of a field, or of a sequence element / map key / map value.
///
/// Element schemas carry no `name` and no `declared_in`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldSchema {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_in: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub struct_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldSchema>>,
    /// Set when nested fields were omitted at the depth limit.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_type: Option<Box<FieldSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_type: Option<Box<FieldSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<Box<FieldSchema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub polymorphic_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_subtypes: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_class: Option<String>,
}

/// Builds [`RecordSchema`]s from a registry.
pub struct SchemaDescriber<'a> {
    registry: &'a dyn TypeRegistry,
    subtypes: &'a SubtypeIndex,
    max_depth: usize,
}

impl<'a> SchemaDescriber<'a> {
    pub fn new(registry: &'a dyn TypeRegistry, subtypes: &'a SubtypeIndex) -> Self {
        Self {
            registry,
            subtypes,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Schema of `type_name`, or `None` if the type is not registered.
    ///
    /// With `include_inherited == false` only the type's own fields are
    /// listed at the top level. Nested records always list every field.
    pub fn record_schema(&self, type_name: &str, include_inherited: bool) -> Option<RecordSchema> {
        let record = self.registry.record_type(type_name)?;
        let fields = record
            .fields()
            .iter()
            .filter(|f| include_inherited || f.owner == record.name())
            .map(|f| self.field_schema(f, 0))
            .collect();
        Some(RecordSchema {
            struct_name: record.name().to_string(),
            parent_struct: record.parent().map(str::to_string),
            fields,
        })
    }

    /// Full schemas of every known subtype of `base`, in registry order.
    pub fn subtype_schemas(&self, base: &str) -> Vec<RecordSchema> {
        self.subtypes
            .find_subtypes(self.registry, base)
            .iter()
            .filter_map(|name| self.record_schema(name, true))
            .collect()
    }

    fn field_schema(&self, field: &FieldDescriptor, depth: usize) -> FieldSchema {
        FieldSchema {
            name: Some(field.name.clone()),
            declared_in: Some(field.owner.clone()),
            ..self.kind_schema(&field.kind, depth)
        }
    }

    fn kind_schema(&self, kind: &FieldKind, depth: usize) -> FieldSchema {
        let mut schema = FieldSchema {
            kind: kind.label(),
            ..FieldSchema::default()
        };
        match kind {
            FieldKind::Bool
            | FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Float32
            | FieldKind::Float64
            | FieldKind::String
            | FieldKind::Symbol
            | FieldKind::Text
            | FieldKind::SoftRef
            | FieldKind::Tag
            | FieldKind::TagSet => {}
            FieldKind::Enum(enum_name) | FieldKind::LegacyByteEnum(enum_name) => {
                schema.enum_name = Some(enum_name.clone());
                schema.enum_values = self
                    .registry
                    .enum_type(enum_name)
                    .map(|e| e.names().map(str::to_string).collect());
            }
            FieldKind::Record(type_name) => {
                schema.struct_name = Some(type_name.clone());
                if depth >= self.max_depth {
                    schema.truncated = true;
                } else if let Some(record) = self.registry.record_type(type_name) {
                    schema.fields = Some(self.nested_fields(record, depth + 1));
                }
            }
            FieldKind::Sequence(elem) | FieldKind::Set(elem) => {
                schema.element_type = Some(Box::new(self.kind_schema(elem, depth)));
            }
            FieldKind::Map(key, value) => {
                schema.key_type = Some(Box::new(self.kind_schema(key, depth)));
                schema.value_type = Some(Box::new(self.kind_schema(value, depth)));
            }
            FieldKind::Polymorphic { base } => {
                schema.polymorphic_base = base.clone();
                if let Some(base) = base {
                    if self.registry.record_type(base).is_some() {
                        schema.known_subtypes =
                            Some(self.subtypes.find_subtypes(self.registry, base).to_vec());
                    }
                }
            }
            FieldKind::HardRef(class) => {
                schema.object_class = Some(class.clone());
            }
        }
        schema
    }

    fn nested_fields(&self, record: &RecordType, depth: usize) -> Vec<FieldSchema> {
        record
            .fields()
            .iter()
            .map(|f| self.field_schema(f, depth))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{EnumType, InMemoryRegistry, RecordTypeBuilder};
    use serde_json::json;

    fn registry() -> InMemoryRegistry {
        let mut registry = InMemoryRegistry::new();
        registry
            .register_enum(EnumType::sequential("Rarity", ["Common", "Rare"]))
            .expect("enum");
        let records = [
            RecordTypeBuilder::new("Base").string_field("name").build(),
            RecordTypeBuilder::new("Stats")
                .parent("Base")
                .field("health", FieldKind::Int32)
                .build(),
            RecordTypeBuilder::new("Effect").build(),
            RecordTypeBuilder::new("Burn").parent("Effect").build(),
            RecordTypeBuilder::new("Item")
                .parent("Base")
                .enum_field("rarity", "Rarity")
                .record_field("stats", "Stats")
                .map_field("bonuses", FieldKind::Symbol, FieldKind::sequence(FieldKind::Float32))
                .polymorphic_field("effect", Some("Effect"))
                .polymorphic_field("extra", Some("Unregistered"))
                .field("icon", FieldKind::HardRef("Texture".into()))
                .build(),
            RecordTypeBuilder::new("Node").record_field("next", "Node").build(),
        ];
        for record in records {
            registry.register_record(record).expect("record");
        }
        registry
    }

    #[test]
    fn test_record_schema_shape() {
        let registry = registry();
        let index = SubtypeIndex::new();
        let describer = SchemaDescriber::new(&registry, &index);
        let schema = describer.record_schema("Item", true).expect("Item schema");
        let value = serde_json::to_value(&schema).expect("serialize");

        assert_eq!(value["struct_name"], json!("Item"));
        assert_eq!(value["parent_struct"], json!("Base"));
        assert_eq!(
            value["fields"][0],
            json!({"name": "name", "type": "string", "declared_in": "Base"})
        );
        assert_eq!(
            value["fields"][1],
            json!({
                "name": "rarity",
                "type": "enum",
                "declared_in": "Item",
                "enum_name": "Rarity",
                "enum_values": ["Common", "Rare"]
            })
        );
        assert_eq!(
            value["fields"][2]["fields"],
            json!([
                {"name": "name", "type": "string", "declared_in": "Base"},
                {"name": "health", "type": "int32", "declared_in": "Stats"}
            ])
        );
        assert_eq!(
            value["fields"][3]["value_type"],
            json!({"type": "sequence", "element_type": {"type": "float32"}})
        );
        assert_eq!(value["fields"][4]["known_subtypes"], json!(["Burn"]));
        assert_eq!(value["fields"][5]["polymorphic_base"], json!("Unregistered"));
        assert!(value["fields"][5].get("known_subtypes").is_none());
        assert_eq!(value["fields"][6]["object_class"], json!("Texture"));
    }

    #[test]
    fn test_own_fields_only_at_top_level() {
        let registry = registry();
        let index = SubtypeIndex::new();
        let describer = SchemaDescriber::new(&registry, &index);
        let schema = describer.record_schema("Item", false).expect("Item schema");
        let names: Vec<_> = schema
            .fields
            .iter()
            .filter_map(|f| f.name.as_deref())
            .collect();
        assert_eq!(names, vec!["rarity", "stats", "bonuses", "effect", "extra", "icon"]);
        let stats_fields = schema.fields[1].fields.as_ref().expect("nested fields");
        assert_eq!(stats_fields.len(), 2);
    }

    #[test]
    fn test_self_reference_is_truncated() {
        let registry = registry();
        let index = SubtypeIndex::new();
        let describer = SchemaDescriber::new(&registry, &index).with_max_depth(2);
        let schema = describer.record_schema("Node", true).expect("Node schema");

        let mut depth = 0;
        let mut field = &schema.fields[0];
        while let Some(nested) = &field.fields {
            depth += 1;
            field = &nested[0];
        }
        assert_eq!(depth, 2);
        assert!(field.truncated);
    }

    #[test]
    fn test_subtype_schemas() {
        let registry = registry();
        let index = SubtypeIndex::new();
        let describer = SchemaDescriber::new(&registry, &index);
        let schemas = describer.subtype_schemas("Base");
        let names: Vec<_> = schemas.iter().map(|s| s.struct_name.as_str()).collect();
        assert_eq!(names, vec!["Stats", "Item"]);
        assert!(describer.record_schema("Missing", true).is_none());
    }
}
