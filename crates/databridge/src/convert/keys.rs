// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reversible map-key <-> text conversion.
//!
//! JSON object keys are strings, so map keys of every kind are rendered
//! to text. Keys that serialize to a JSON string use that string
//! directly; all other keys use the compact JSON text of their value.
//! [`Converter::text_to_key`] inverts the mapping.

use super::{Converter, Warning};
use crate::reflect::{default_value, FieldKind, FieldValue};
use serde_json::Value;

impl Converter<'_> {
    pub(super) fn key_to_text(
        &self,
        kind: &FieldKind,
        key: &FieldValue,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> String {
        match key {
            FieldValue::String(s) | FieldValue::Symbol(s) => s.clone(),
            FieldValue::Text(text) => text.as_str().to_string(),
            other => match self.read_value(kind, other, depth, path, warnings) {
                Value::String(s) => s,
                json => json.to_string(),
            },
        }
    }

    pub(super) fn text_to_key(
        &self,
        kind: &FieldKind,
        text: &str,
        depth: usize,
        path: &str,
        warnings: &mut Vec<Warning>,
    ) -> Option<FieldValue> {
        let json = match kind {
            FieldKind::String
            | FieldKind::Symbol
            | FieldKind::Text
            | FieldKind::SoftRef
            | FieldKind::Tag
            | FieldKind::Enum(_)
            | FieldKind::LegacyByteEnum(_) => Value::String(text.to_string()),
            FieldKind::HardRef(_) if text == "null" => Value::Null,
            FieldKind::HardRef(_) => Value::String(text.to_string()),
            FieldKind::Bool
            | FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Float32
            | FieldKind::Float64
            | FieldKind::Record(_)
            | FieldKind::Sequence(_)
            | FieldKind::Map(_, _)
            | FieldKind::Set(_)
            | FieldKind::TagSet
            | FieldKind::Polymorphic { .. } => serde_json::from_str(text).ok()?,
        };
        let mut key = default_value(self.registry, kind, self.options.max_depth.saturating_sub(depth));
        let key_path = format!("{}[{}]", path, text);
        if self.write_value(kind, &mut key, &json, depth, &key_path, warnings) {
            Some(key)
        } else {
            None
        }
    }
}
