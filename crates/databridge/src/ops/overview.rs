// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! One-shot overview of everything the bridge can address, and name search
//! across it.

use super::datatable::table_summary;
use super::{optional_int, optional_str, CommandResult, OpContext, OpResult};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Number of leading field names listed per table.
const TOP_FIELDS: usize = 8;

/// `search_assets` result cap when no positive `limit` is given.
const DEFAULT_ASSET_SEARCH_LIMIT: usize = 50;

pub fn get_data_catalog(ctx: &OpContext<'_>, _params: &Map<String, Value>) -> OpResult {
    let datatables: Vec<Value> = ctx
        .catalog
        .tables()
        .iter()
        .map(|table| {
            let mut entry = table_summary(ctx, table);
            if let Some(record) = ctx.registry.record_type(table.row_type()) {
                let names: Vec<&str> = record
                    .fields()
                    .iter()
                    .take(TOP_FIELDS)
                    .map(|f| f.name.as_str())
                    .collect();
                entry.insert("top_fields".into(), json!(names));
            }
            Value::Object(entry)
        })
        .collect();

    let mut prefixes: BTreeMap<&str, usize> = BTreeMap::new();
    for tag in ctx.registry.tags() {
        *prefixes.entry(tag.root()).or_default() += 1;
    }
    let tag_prefixes: Vec<Value> = prefixes
        .into_iter()
        .map(|(prefix, count)| json!({ "prefix": prefix, "count": count }))
        .collect();

    // (class, count, example path) in first-appearance order
    let mut classes: Vec<(&str, usize, &str)> = Vec::new();
    for asset in ctx.catalog.assets() {
        match classes.iter_mut().find(|(class, _, _)| *class == asset.class()) {
            Some(entry) => entry.1 += 1,
            None => classes.push((asset.class(), 1, asset.path())),
        }
    }
    let data_asset_classes: Vec<Value> = classes
        .into_iter()
        .map(|(class, count, example)| {
            json!({ "class_name": class, "count": count, "example_path": example })
        })
        .collect();

    Ok(CommandResult::new(json!({
        "datatables": datatables,
        "tag_prefixes": tag_prefixes,
        "data_asset_classes": data_asset_classes,
    })))
}

/// `(name, path, class_name)` of every addressable object: data tables,
/// curve tables, string tables and data assets.
fn addressable<'c>(ctx: &'c OpContext<'_>) -> Vec<(&'c str, &'c str, &'c str)> {
    let catalog = &*ctx.catalog;
    let tables = catalog.tables().iter().map(|t| {
        let class = if t.is_composite() { "CompositeDataTable" } else { "DataTable" };
        (t.name(), t.path(), class)
    });
    let curves = catalog
        .curve_tables()
        .iter()
        .map(|t| (t.name(), t.path(), "CurveTable"));
    let strings = catalog
        .string_tables()
        .iter()
        .map(|t| (t.name(), t.path(), "StringTable"));
    let assets = catalog.assets().iter().map(|a| (a.name(), a.path(), a.class()));
    tables.chain(curves).chain(strings).chain(assets).collect()
}

/// Find objects by name or path substring (case-insensitive), exact class
/// name and path prefix.
pub fn search_assets(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let query = optional_str(params, "query").unwrap_or("").to_lowercase();
    let class_filter = optional_str(params, "class_filter").unwrap_or("");
    let path_filter = optional_str(params, "path_filter").unwrap_or("");
    let limit = optional_int(params, "limit")
        .filter(|&n| n > 0)
        .map_or(DEFAULT_ASSET_SEARCH_LIMIT, |n| n as usize);

    let in_path: Vec<_> = addressable(ctx)
        .into_iter()
        .filter(|(_, path, _)| path.starts_with(path_filter))
        .collect();
    let assets: Vec<Value> = in_path
        .iter()
        .filter(|(name, path, _)| {
            query.is_empty()
                || name.to_lowercase().contains(&query)
                || path.to_lowercase().contains(&query)
        })
        .filter(|(_, _, class)| class_filter.is_empty() || *class == class_filter)
        .take(limit)
        .map(|(name, path, class)| json!({ "name": name, "path": path, "class_name": class }))
        .collect();

    Ok(CommandResult::new(json!({
        "assets": assets,
        "count": assets.len(),
        "total_before_limit": in_path.len(),
    })))
}
