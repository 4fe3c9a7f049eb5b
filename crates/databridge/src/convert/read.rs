// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Record -> JSON.

use super::{child_path, Converter, Warning};
use crate::reflect::{FieldKind, FieldValue, RecordInstance, RecordType};
use serde_json::{Map, Value};
use std::collections::HashSet;

impl Converter<'_> {
    pub(super) fn read_top_level(
        &self,
        type_name: &str,
        instance: &RecordInstance,
        projection: Option<&HashSet<String>>,
        warnings: &mut Vec<Warning>,
    ) -> Value {
        let Some(record) = self.registry.record_type(type_name) else {
            log::debug!("record_to_value: unknown type {}", type_name);
            return Value::Object(Map::new());
        };
        if instance.record_type() != type_name || instance.len() != record.fields().len() {
            log::debug!(
                "record_to_value: instance of {} does not match {}",
                instance.record_type(),
                type_name
            );
            return Value::Object(Map::new());
        }

        if record.is_polymorphic_wrapper() {
            return match instance.get(0) {
                Some(FieldValue::Polymorphic(Some(inner))) => {
                    match self.read_polymorphic(inner, 0, "", warnings) {
                        Value::Null => Value::Object(Map::new()),
                        value => value,
                    }
                }
                _ => Value::Object(Map::new()),
            };
        }

        Value::Object(self.read_fields(record, instance, 0, "", projection, warnings))
    }

    fn read_fields(
        &self,
        record: &RecordType,
        instance: &RecordInstance,
        depth: usize,
        path: &str,
        projection: Option<&HashSet<String>>,
        warnings: &mut Vec<Warning>,
    ) -> Map<String, Value> {
        let mut object = Map::new();
        for (field, value) in record.fields().iter().zip(instance.values()) {
            if let Some(keep) = projection {
                if !keep.contains(&field.name) {
                    continue;
                }
            }
            let field_path = child_path(path, &field.name);
            let json = self.read_value(&field.kind, value, depth, &field_path, warnings);
            object.insert(field.name.clone(), json);
        }
        object
    }

    /// Serialize a nested record, checking the depth limit.
    fn read_record(
        &self,
        instance: &RecordInstance,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Option<Map<String, Value>> {
        if depth > self.options.max_depth {
            warnings.push(Warning::DepthExceeded {
                field: path.to_string(),
                limit: self.options.max_depth,
            });
            return None;
        }
        let Some(record) = self.registry.record_type(instance.record_type()) else {
            warnings.push(Warning::UnresolvedType {
                field: path.to_string(),
                type_name: instance.record_type().to_string(),
            });
            return None;
        };
        if instance.len() != record.fields().len() {
            // Instances truncated at the depth limit carry no slots.
            return Some(Map::new());
        }
        Some(self.read_fields(record, instance, depth, path, None, warnings))
    }

    fn read_polymorphic(
        &self,
        inner: &RecordInstance,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Value {
        match self.read_record(inner, depth + 1, path, warnings) {
            Some(mut object) => {
                object.insert(
                    self.options.discriminator.clone(),
                    Value::String(inner.record_type().to_string()),
                );
                Value::Object(object)
            }
            None => Value::Null,
        }
    }

    /// Serialize a single stored value of `kind`.
    pub(crate) fn read_value(
        &self,
        kind: &FieldKind,
        value: &FieldValue,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Value {
        match (kind, value) {
            (FieldKind::Bool, FieldValue::Bool(b)) => Value::Bool(*b),
            (FieldKind::Int32, FieldValue::Int32(v)) => Value::from(*v),
            (FieldKind::Int64, FieldValue::Int64(v)) => Value::from(*v),
            (FieldKind::Float32, FieldValue::Float32(v)) => float_value(f64::from(*v), path, warnings),
            (FieldKind::Float64, FieldValue::Float64(v)) => float_value(*v, path, warnings),
            (FieldKind::String, FieldValue::String(s)) | (FieldKind::Symbol, FieldValue::Symbol(s)) => {
                Value::String(s.clone())
            }
            (FieldKind::Text, FieldValue::Text(text)) => Value::String(text.as_str().to_string()),
            (FieldKind::Enum(enum_name), FieldValue::Enum(stored)) => {
                let Some(enum_type) = self.registry.enum_type(enum_name) else {
                    warnings.push(Warning::UnresolvedType {
                        field: path.to_string(),
                        type_name: enum_name.clone(),
                    });
                    return Value::Null;
                };
                match enum_type
                    .position_of_value(*stored)
                    .and_then(|pos| enum_type.name_at(pos))
                {
                    Some(name) => Value::String(name.to_string()),
                    None => {
                        warnings.push(Warning::InvalidEnumValue {
                            field: path.to_string(),
                            enum_name: enum_name.clone(),
                            value: *stored,
                        });
                        Value::Null
                    }
                }
            }
            (FieldKind::LegacyByteEnum(enum_name), FieldValue::Byte(byte)) => {
                let Some(enum_type) = self.registry.enum_type(enum_name) else {
                    warnings.push(Warning::UnresolvedType {
                        field: path.to_string(),
                        type_name: enum_name.clone(),
                    });
                    return Value::Null;
                };
                // The stored byte is used as a position, not looked up as a value.
                match enum_type.name_at(usize::from(*byte)) {
                    Some(name) => Value::String(name.to_string()),
                    None => {
                        warnings.push(Warning::InvalidEnumValue {
                            field: path.to_string(),
                            enum_name: enum_name.clone(),
                            value: i64::from(*byte),
                        });
                        Value::Null
                    }
                }
            }
            (FieldKind::Tag, FieldValue::Tag(tag)) => {
                Value::String(tag.as_ref().map(|t| t.to_string()).unwrap_or_default())
            }
            (FieldKind::TagSet, FieldValue::TagSet(tags)) => {
                Value::Array(tags.iter().map(|t| Value::String(t.to_string())).collect())
            }
            (FieldKind::Record(_), FieldValue::Record(nested)) => {
                match self.read_record(nested, depth + 1, path, warnings) {
                    Some(object) => Value::Object(object),
                    None => Value::Null,
                }
            }
            (FieldKind::Polymorphic { .. }, FieldValue::Polymorphic(inner)) => match inner {
                Some(inner) => self.read_polymorphic(inner, depth, path, warnings),
                None => Value::Null,
            },
            (FieldKind::SoftRef, FieldValue::SoftRef(p)) => Value::String(p.clone()),
            (FieldKind::HardRef(_), FieldValue::HardRef(object)) => object
                .as_ref()
                .and_then(|o| self.registry.path_of(o))
                .map(Value::String)
                .unwrap_or(Value::Null),
            (FieldKind::Sequence(elem), FieldValue::Sequence(items)) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        self.read_value(elem, item, depth, &format!("{}[{}]", path, i), warnings)
                    })
                    .collect(),
            ),
            (FieldKind::Map(key_kind, value_kind), FieldValue::Map(map)) => {
                let mut object = Map::new();
                for index in 0..map.max_index() {
                    let Some((key, item)) = map.entry_at(index) else {
                        continue;
                    };
                    let key_text = self.key_to_text(key_kind, key, depth, path, warnings);
                    let item_path = format!("{}[{}]", path, key_text);
                    let json = self.read_value(value_kind, item, depth, &item_path, warnings);
                    object.insert(key_text, json);
                }
                Value::Object(object)
            }
            (FieldKind::Set(elem), FieldValue::Set(set)) => Value::Array(
                set.iter()
                    .map(|item| self.read_value(elem, item, depth, path, warnings))
                    .collect(),
            ),
            (kind, _) => {
                warnings.push(Warning::ValueMismatch {
                    field: path.to_string(),
                    expected: kind.label(),
                });
                Value::Null
            }
        }
    }
}

/// JSON number for `v`; NaN and infinities become `null` with a warning.
fn float_value(v: f64, path: &str, warnings: &mut Vec<Warning>) -> Value {
    if !v.is_finite() {
        warnings.push(Warning::NonFinite {
            field: path.to_string(),
            value: v.to_string(),
        });
        return Value::Null;
    }
    Value::from(v)
}
