// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Tag dictionary queries and tag-based row lookup.

use super::{optional_str, required_str, string_list, CommandResult, OpContext, OpError, OpResult};
use crate::reflect::{FieldKind, FieldValue};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Rows whose Tag or TagSet field carries any of the requested tags.
///
/// Matching is exact; a row tagged `Weapon.Melee` does not match a request
/// for `Weapon`.
pub fn resolve_tags(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let tag_field = required_str(params, "tag_field")?;
    if params
        .get("tags")
        .and_then(Value::as_array)
        .map_or(true, Vec::is_empty)
    {
        return Err(OpError::InvalidField(
            "Missing or empty required param: tags (array)".into(),
        ));
    }
    let table = ctx.table(table_path)?;
    let record = ctx.registry.record_type(table.row_type()).ok_or_else(|| {
        OpError::InvalidStructType(format!("DataTable has no row struct: {}", table_path))
    })?;
    let field = record.field(tag_field).ok_or_else(|| {
        OpError::InvalidField(format!("Field '{}' not found in row struct", tag_field))
    })?;
    if !matches!(field.kind, FieldKind::Tag | FieldKind::TagSet) {
        return Err(OpError::InvalidField(format!(
            "Field '{}' is not a tag or tag set",
            tag_field
        )));
    }
    let slot = field.slot;

    let mut requested = string_list(params, "tags");
    let mut unique = HashSet::new();
    requested.retain(|t| unique.insert(t.clone()));
    let fields: HashSet<String> = string_list(params, "fields").into_iter().collect();

    let converter = ctx.converter();
    let mut resolved_tags = HashSet::new();
    let mut resolved = Vec::new();
    for (name, row) in ctx.visible_rows(table) {
        let matched: Vec<String> = match row.get(slot) {
            Some(FieldValue::Tag(Some(tag))) => vec![tag.to_string()],
            Some(FieldValue::TagSet(tags)) => tags.iter().map(ToString::to_string).collect(),
            _ => Vec::new(),
        }
        .into_iter()
        .filter(|t| unique.contains(t))
        .collect();
        if matched.is_empty() {
            continue;
        }
        resolved_tags.extend(matched.iter().cloned());
        resolved.push(json!({
            "row_name": name,
            "row_data": converter.record_to_value_projected(row.record_type(), row, &fields),
            "matched_tags": matched,
        }));
    }

    let unresolved: Vec<&String> = requested
        .iter()
        .filter(|t| !resolved_tags.contains(*t))
        .collect();
    Ok(CommandResult::new(json!({
        "table_path": table_path,
        "tag_field": tag_field,
        "resolved_count": resolved.len(),
        "resolved": resolved,
        "unresolved_tags": unresolved,
    })))
}

pub fn list_tags(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let prefix = optional_str(params, "prefix").unwrap_or("");
    let tags: Vec<Value> = ctx
        .registry
        .tags()
        .filter(|t| t.as_str().starts_with(prefix))
        .map(|t| json!({ "tag": t.as_str() }))
        .collect();
    Ok(CommandResult::new(json!({ "count": tags.len(), "tags": tags })))
}

pub fn validate_tag(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let tag = required_str(params, "tag")?;
    let valid = ctx.registry.resolve_tag(tag).is_some();
    Ok(CommandResult::new(json!({ "tag": tag, "valid": valid })))
}
