// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Curve table queries and row edits.

use super::{attach_warnings, optional_str, required_str, CommandResult, OpContext, OpError, OpResult};
use crate::catalog::{CurveMode, CurveTable};
use serde_json::{json, Map, Value};

fn curve_table<'c>(ctx: &'c OpContext<'_>, path: &str) -> Result<&'c CurveTable, OpError> {
    ctx.catalog
        .curve_table(path)
        .ok_or_else(|| OpError::CurveTableNotFound(path.to_string()))
}

pub fn list_curve_tables(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let path_filter = optional_str(params, "path_filter").unwrap_or("");
    let tables: Vec<Value> = ctx
        .catalog
        .curve_tables()
        .iter()
        .filter(|t| t.path().starts_with(path_filter))
        .map(|t| {
            json!({
                "name": t.name(),
                "path": t.path(),
                "row_count": t.curves().len(),
                "curve_type": t.curve_type(),
            })
        })
        .collect();
    Ok(CommandResult::new(json!({ "curve_tables": tables, "count": tables.len() })))
}

/// Keys of every curve, or of the one named by `row_name`.
pub fn get_curve_table(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let row_filter = optional_str(params, "row_name").unwrap_or("");
    let table = curve_table(ctx, table_path)?;
    let rich = table.mode() == CurveMode::Rich;

    let curves: Vec<Value> = table
        .curves()
        .iter()
        .filter(|c| row_filter.is_empty() || c.name == row_filter)
        .map(|curve| {
            let keys: Vec<Value> = curve
                .keys()
                .iter()
                .map(|key| {
                    let mut entry = Map::new();
                    entry.insert("time".into(), json!(f64::from(key.time)));
                    entry.insert("value".into(), json!(f64::from(key.value)));
                    if rich {
                        entry.insert("interp_mode".into(), json!(key.interp.as_str()));
                    }
                    Value::Object(entry)
                })
                .collect();
            json!({
                "row_name": curve.name,
                "curve_type": table.curve_type(),
                "key_count": keys.len(),
                "keys": keys,
            })
        })
        .collect();

    if !row_filter.is_empty() && curves.is_empty() {
        return Err(OpError::CurveRowNotFound(row_filter.to_string()));
    }
    Ok(CommandResult::new(json!({
        "table_path": table_path,
        "curves": curves,
        "count": curves.len(),
    })))
}

/// Replace every key of one curve with `keys: [{time, value}]`.
///
/// Malformed entries are skipped with a warning; the rest are applied.
pub fn update_curve_table_row(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let row_name = required_str(params, "row_name")?;
    let keys = params
        .get("keys")
        .and_then(Value::as_array)
        .ok_or(OpError::MissingParam("keys (array of {time, value} objects)"))?;

    let table = ctx
        .catalog
        .curve_table_mut(table_path)
        .ok_or_else(|| OpError::CurveTableNotFound(table_path.to_string()))?;
    let curve = table
        .curve_mut(row_name)
        .ok_or_else(|| OpError::CurveRowNotFound(row_name.to_string()))?;

    curve.reset();
    let mut warnings = Vec::new();
    let mut keys_updated = 0;
    for (index, entry) in keys.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            warnings.push(format!("Skipped invalid key entry at index {}", index));
            continue;
        };
        let Some(time) = entry.get("time").and_then(Value::as_f64) else {
            warnings.push(format!("Key at index {} missing 'time' field", index));
            continue;
        };
        let Some(value) = entry.get("value").and_then(Value::as_f64) else {
            warnings.push(format!("Key at index {} missing 'value' field", index));
            continue;
        };
        curve.update_or_add_key(time as f32, value as f32);
        keys_updated += 1;
    }
    log::debug!(
        "updated curve row '{}' in {} with {} keys",
        row_name,
        table_path,
        keys_updated
    );

    let mut data = Map::new();
    data.insert("success".into(), json!(true));
    data.insert("table_path".into(), json!(table_path));
    data.insert("row_name".into(), json!(row_name));
    data.insert("keys_updated".into(), json!(keys_updated));
    attach_warnings(&mut data, &warnings);
    Ok(CommandResult::with_warnings(Value::Object(data), warnings))
}
