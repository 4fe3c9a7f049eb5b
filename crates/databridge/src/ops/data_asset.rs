// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Standalone config assets.

use super::{
    attach_warnings, optional_bool, optional_str, required_object, required_str, warning_strings,
    CommandResult, OpContext, OpError, OpResult,
};
use serde_json::{json, Map, Value};

pub fn list_data_assets(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let class_filter = optional_str(params, "class_filter").unwrap_or("");
    let path_filter = optional_str(params, "path_filter").unwrap_or("");

    let assets: Vec<Value> = ctx
        .catalog
        .assets()
        .iter()
        .filter(|a| a.path().starts_with(path_filter))
        .filter(|a| class_filter.is_empty() || a.class() == class_filter)
        .map(|a| json!({ "name": a.name(), "path": a.path(), "asset_class": a.class() }))
        .collect();
    Ok(CommandResult::new(json!({ "count": assets.len(), "data_assets": assets })))
}

fn asset_path<'p>(params: &'p Map<String, Value>) -> Result<&'p str, OpError> {
    let path = required_str(params, "asset_path")?;
    if path.is_empty() {
        return Err(OpError::InvalidField(
            "Parameter 'asset_path' cannot be empty".into(),
        ));
    }
    Ok(path)
}

pub fn get_data_asset(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let path = asset_path(params)?;
    let asset = ctx
        .catalog
        .asset(path)
        .ok_or_else(|| OpError::AssetNotFound(path.to_string()))?;
    let properties = ctx.converter().record_to_value(asset.class(), asset.data());
    Ok(CommandResult::new(json!({
        "asset_path": path,
        "asset_class": asset.class(),
        "properties": properties,
    })))
}

pub fn update_data_asset(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let path = asset_path(params)?;
    let properties = Value::Object(required_object(params, "properties")?.clone());
    let dry_run = optional_bool(params, "dry_run", false);
    let modified_fields: Vec<&String> = params
        .get("properties")
        .and_then(Value::as_object)
        .map(|o| o.keys().collect())
        .unwrap_or_default();

    let converter = ctx.converter();
    let asset = ctx
        .catalog
        .asset_mut(path)
        .ok_or_else(|| OpError::AssetNotFound(path.to_string()))?;
    let class = asset.class().to_string();
    let mut raised = Vec::new();

    if dry_run {
        let old_values = converter.record_to_value(&class, asset.data());
        let mut preview = asset.data().clone();
        if !converter.value_to_record(&properties, &class, &mut preview, &mut raised) {
            return Err(OpError::Serialization(
                "Failed to deserialize properties for dry-run preview".into(),
            ));
        }
        let new_values = converter.record_to_value(&class, &preview);
        let changes: Vec<Value> = modified_fields
            .iter()
            .map(|field| {
                json!({
                    "field": field,
                    "old_value": old_values.get(field.as_str()).cloned().unwrap_or(Value::Null),
                    "new_value": new_values.get(field.as_str()).cloned().unwrap_or(Value::Null),
                })
            })
            .collect();

        let warnings = warning_strings(&raised);
        let mut data = Map::new();
        data.insert("dry_run".into(), json!(true));
        data.insert("asset_path".into(), json!(path));
        data.insert("change_count".into(), json!(changes.len()));
        data.insert("changes".into(), Value::Array(changes));
        attach_warnings(&mut data, &warnings);
        return Ok(CommandResult::with_warnings(Value::Object(data), warnings));
    }

    if !converter.value_to_record(&properties, &class, asset.data_mut(), &mut raised) {
        return Err(OpError::Serialization(
            "Failed to deserialize properties into DataAsset".into(),
        ));
    }
    log::debug!("updated data asset {}", path);

    let warnings = warning_strings(&raised);
    let mut data = Map::new();
    data.insert("success".into(), json!(true));
    data.insert("asset_path".into(), json!(path));
    data.insert("modified_fields".into(), json!(modified_fields));
    attach_warnings(&mut data, &warnings);
    Ok(CommandResult::with_warnings(Value::Object(data), warnings))
}
