// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON -> record.

use super::{child_path, json_label, Converter, Warning, METADATA_PREFIX};
use crate::reflect::{
    default_instance, default_value, value_matches_kind, FieldKind, FieldValue, RecordInstance,
    RecordType, Text,
};
use serde_json::{Map, Value};
use std::collections::HashSet;

impl Converter<'_> {
    pub(super) fn write_top_level(
        &self,
        value: &Value,
        type_name: &str,
        instance: &mut RecordInstance,
        warnings: &mut Vec<Warning>,
    ) -> bool {
        let Some(record) = self.registry.record_type(type_name) else {
            log::debug!("value_to_record: unknown type {}", type_name);
            return false;
        };
        if instance.record_type() != type_name || instance.len() != record.fields().len() {
            log::debug!(
                "value_to_record: instance of {} does not match {}",
                instance.record_type(),
                type_name
            );
            return false;
        }
        let Some(object) = value.as_object() else {
            return false;
        };

        if record.is_polymorphic_wrapper() {
            let base = record.wrapper_base();
            if let Some(slot) = instance.get_mut(0) {
                self.write_polymorphic(base, value, slot, 0, "", warnings);
            }
            return true;
        }

        self.write_fields(record, object, instance, 0, "", warnings);
        true
    }

    fn write_fields(
        &self,
        record: &RecordType,
        object: &Map<String, Value>,
        instance: &mut RecordInstance,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) {
        for (name, json) in object {
            if name.starts_with(METADATA_PREFIX) || *name == self.options.discriminator {
                continue;
            }
            let field_path = child_path(path, name);
            let Some(field) = record.field(name) else {
                warnings.push(Warning::UnknownField {
                    record: record.name().to_string(),
                    field: field_path,
                });
                continue;
            };
            let Some(slot) = instance.get_mut(field.slot) else {
                continue;
            };
            if !self.write_value(&field.kind, slot, json, depth, &field_path, warnings) {
                warnings.push(Warning::FieldFailed { field: field_path });
            }
        }
    }

    fn depth_left(&self, depth: usize) -> usize {
        self.options.max_depth.saturating_sub(depth)
    }

    /// Write `json` into `slot`. Returns `false` if the slot was left untouched.
    pub(super) fn write_value(
        &self,
        kind: &FieldKind,
        slot: &mut FieldValue,
        json: &Value,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> bool {
        if json.is_null() {
            if let FieldKind::HardRef(_) = kind {
                *slot = FieldValue::HardRef(None);
                return true;
            }
            return false;
        }
        if !value_matches_kind(kind, slot) {
            *slot = default_value(self.registry, kind, self.depth_left(depth));
        }

        let mismatch = |warnings: &mut Vec<Warning>, expected: &'static str| {
            warnings.push(Warning::KindMismatch {
                field: path.to_string(),
                expected,
                found: json_label(json),
            });
            false
        };

        match kind {
            FieldKind::Bool => match json.as_bool() {
                Some(b) => {
                    *slot = FieldValue::Bool(b);
                    true
                }
                None => mismatch(warnings, "bool"),
            },
            FieldKind::Int32 => {
                let Some(v) = json_integer(json) else {
                    return mismatch(warnings, "number");
                };
                match i32::try_from(v) {
                    Ok(v) => {
                        *slot = FieldValue::Int32(v);
                        true
                    }
                    Err(_) => {
                        warnings.push(Warning::OutOfRange {
                            field: path.to_string(),
                            kind: "int32",
                            value: v.to_string(),
                        });
                        false
                    }
                }
            }
            FieldKind::Int64 => match json_integer(json) {
                Some(v) => {
                    *slot = FieldValue::Int64(v);
                    true
                }
                None => mismatch(warnings, "number"),
            },
            FieldKind::Float32 => match json.as_f64() {
                Some(v) => {
                    *slot = FieldValue::Float32(v as f32);
                    true
                }
                None => mismatch(warnings, "number"),
            },
            FieldKind::Float64 => match json.as_f64() {
                Some(v) => {
                    *slot = FieldValue::Float64(v);
                    true
                }
                None => mismatch(warnings, "number"),
            },
            FieldKind::String | FieldKind::Symbol | FieldKind::Text | FieldKind::SoftRef => {
                let Some(s) = json_text(json) else {
                    return mismatch(warnings, "string");
                };
                *slot = match kind {
                    FieldKind::Symbol => FieldValue::Symbol(s),
                    FieldKind::Text => FieldValue::Text(Text::from_source(s)),
                    FieldKind::SoftRef => FieldValue::SoftRef(s),
                    _ => FieldValue::String(s),
                };
                true
            }
            FieldKind::Enum(enum_name) | FieldKind::LegacyByteEnum(enum_name) => {
                let Some(enum_type) = self.registry.enum_type(enum_name) else {
                    warnings.push(Warning::UnresolvedType {
                        field: path.to_string(),
                        type_name: enum_name.clone(),
                    });
                    return false;
                };
                let Some(name) = json.as_str() else {
                    return mismatch(warnings, "string");
                };
                let Some(v) = enum_type.value_of(name) else {
                    warnings.push(Warning::UnknownEnumerator {
                        field: path.to_string(),
                        enum_name: enum_name.clone(),
                        name: name.to_string(),
                    });
                    return false;
                };
                if let FieldKind::Enum(_) = kind {
                    *slot = FieldValue::Enum(v);
                    return true;
                }
                match u8::try_from(v) {
                    Ok(byte) => {
                        *slot = FieldValue::Byte(byte);
                        true
                    }
                    Err(_) => {
                        warnings.push(Warning::OutOfRange {
                            field: path.to_string(),
                            kind: "byte_enum",
                            value: v.to_string(),
                        });
                        false
                    }
                }
            }
            FieldKind::Record(type_name) => {
                let Some(object) = json.as_object() else {
                    return mismatch(warnings, "object");
                };
                self.write_record(type_name, object, slot, depth + 1, path, warnings)
            }
            FieldKind::Polymorphic { base } => {
                self.write_polymorphic(base.as_deref(), json, slot, depth, path, warnings)
            }
            FieldKind::Sequence(elem) => {
                let Some(array) = json.as_array() else {
                    return mismatch(warnings, "array");
                };
                let FieldValue::Sequence(items) = slot else {
                    return false;
                };
                items.truncate(array.len());
                let depth_left = self.depth_left(depth);
                while items.len() < array.len() {
                    items.push(default_value(self.registry, elem, depth_left));
                }
                for (i, (item, element)) in items.iter_mut().zip(array).enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    self.write_value(elem, item, element, depth, &item_path, warnings);
                }
                true
            }
            FieldKind::Map(key_kind, value_kind) => {
                let Some(object) = json.as_object() else {
                    return mismatch(warnings, "object");
                };
                let FieldValue::Map(map) = slot else {
                    return false;
                };
                map.clear();
                let depth_left = self.depth_left(depth);
                let mut seen = HashSet::new();
                for (key_text, element) in object {
                    let Some(key) = self.text_to_key(key_kind, key_text, depth, path, warnings)
                    else {
                        warnings.push(Warning::InvalidKey {
                            field: path.to_string(),
                            key: key_text.clone(),
                        });
                        continue;
                    };
                    if !seen.insert(key.canonical_key()) {
                        warnings.push(Warning::KeyCollision {
                            field: path.to_string(),
                            key: key_text.clone(),
                        });
                    }
                    let item_path = format!("{}[{}]", path, key_text);
                    let mut item = default_value(self.registry, value_kind, depth_left);
                    self.write_value(value_kind, &mut item, element, depth, &item_path, warnings);
                    map.push_unindexed(key, item);
                }
                map.rehash();
                true
            }
            FieldKind::Set(elem) => {
                let Some(array) = json.as_array() else {
                    return mismatch(warnings, "array");
                };
                let FieldValue::Set(set) = slot else {
                    return false;
                };
                set.clear();
                let depth_left = self.depth_left(depth);
                for (i, element) in array.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    let mut item = default_value(self.registry, elem, depth_left);
                    if self.write_value(elem, &mut item, element, depth, &item_path, warnings) {
                        set.push_unindexed(item);
                    }
                }
                set.rehash();
                true
            }
            FieldKind::HardRef(class) => {
                let Some(object_path) = json.as_str() else {
                    return mismatch(warnings, "string");
                };
                if object_path.is_empty() {
                    *slot = FieldValue::HardRef(None);
                    return true;
                }
                match self.registry.load_object(object_path, class) {
                    Some(object) => {
                        *slot = FieldValue::HardRef(Some(object));
                        true
                    }
                    None => {
                        warnings.push(Warning::LoadFailed {
                            field: path.to_string(),
                            path: object_path.to_string(),
                        });
                        false
                    }
                }
            }
            FieldKind::Tag => {
                let Some(name) = json.as_str() else {
                    return mismatch(warnings, "string");
                };
                if name.is_empty() || name == "None" {
                    *slot = FieldValue::Tag(None);
                    return true;
                }
                match self.registry.resolve_tag(name) {
                    Some(tag) => {
                        *slot = FieldValue::Tag(Some(tag));
                        true
                    }
                    None => {
                        warnings.push(Warning::UnknownTag {
                            field: path.to_string(),
                            tag: name.to_string(),
                        });
                        false
                    }
                }
            }
            FieldKind::TagSet => {
                let Some(array) = json.as_array() else {
                    return mismatch(warnings, "array");
                };
                let FieldValue::TagSet(tags) = slot else {
                    return false;
                };
                tags.clear();
                for (i, element) in array.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    let Some(name) = element.as_str() else {
                        warnings.push(Warning::KindMismatch {
                            field: item_path,
                            expected: "string",
                            found: json_label(element),
                        });
                        continue;
                    };
                    match self.registry.resolve_tag(name) {
                        Some(tag) => {
                            tags.add(tag);
                        }
                        None => warnings.push(Warning::UnknownTag {
                            field: item_path,
                            tag: name.to_string(),
                        }),
                    }
                }
                true
            }
        }
    }

    fn write_record(
        &self,
        type_name: &str,
        object: &Map<String, Value>,
        slot: &mut FieldValue,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> bool {
        if depth > self.options.max_depth {
            warnings.push(Warning::DepthExceeded {
                field: path.to_string(),
                limit: self.options.max_depth,
            });
            return false;
        }
        let Some(record) = self.registry.record_type(type_name) else {
            warnings.push(Warning::UnresolvedType {
                field: path.to_string(),
                type_name: type_name.to_string(),
            });
            return false;
        };
        let stale = match slot {
            FieldValue::Record(nested) => {
                nested.record_type() != type_name || nested.len() != record.fields().len()
            }
            _ => true,
        };
        if stale {
            let Some(fresh) = default_instance(self.registry, type_name, self.depth_left(depth))
            else {
                return false;
            };
            *slot = FieldValue::Record(fresh);
        }
        let FieldValue::Record(nested) = slot else {
            return false;
        };
        self.write_fields(record, object, nested, depth, path, warnings);
        true
    }

    fn write_polymorphic(
        &self,
        base: Option<&str>,
        json: &Value,
        slot: &mut FieldValue,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> bool {
        let Some(object) = json.as_object() else {
            warnings.push(Warning::KindMismatch {
                field: path.to_string(),
                expected: "object",
                found: json_label(json),
            });
            return false;
        };
        let type_name = match object
            .get(&self.options.discriminator)
            .and_then(Value::as_str)
        {
            Some(name) if !name.is_empty() => name,
            _ => {
                warnings.push(Warning::MissingDiscriminator {
                    field: path.to_string(),
                    discriminator: self.options.discriminator.clone(),
                });
                return false;
            }
        };
        let Some(record) = self.registry.record_type(type_name) else {
            warnings.push(Warning::UnresolvedType {
                field: path.to_string(),
                type_name: type_name.to_string(),
            });
            return false;
        };
        if let Some(base) = base {
            if self.registry.record_type(base).is_some()
                && !self.registry.is_descendant_of(type_name, base)
            {
                warnings.push(Warning::NotASubtype {
                    field: path.to_string(),
                    type_name: type_name.to_string(),
                    base: base.to_string(),
                });
                return false;
            }
        }
        let depth = depth + 1;
        if depth > self.options.max_depth {
            warnings.push(Warning::DepthExceeded {
                field: path.to_string(),
                limit: self.options.max_depth,
            });
            return false;
        }
        let Some(mut inner) = default_instance(self.registry, type_name, self.depth_left(depth))
        else {
            return false;
        };
        self.write_fields(record, object, &mut inner, depth, path, warnings);
        *slot = FieldValue::Polymorphic(Some(Box::new(inner)));
        true
    }
}

/// Integer view of a JSON number; fractional values are truncated.
fn json_integer(json: &Value) -> Option<i64> {
    if let Some(v) = json.as_i64() {
        return Some(v);
    }
    json.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)
}

/// String view of a JSON scalar; numbers and bools are rendered as text.
fn json_text(json: &Value) -> Option<String> {
    match json {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
