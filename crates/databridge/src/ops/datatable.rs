// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Table commands: listing, schema, reads, search and row writes.
//!
//! Reads through a composite table see the effective rows of its parents.
//! Row writes addressed to a composite are redirected to the parent that
//! provides the row; row creation on a composite is refused.

use super::{
    attach_warnings, glob_match, optional_bool, optional_int, optional_str, required_object,
    required_str, string_list, warning_strings, CommandResult, OpContext, OpError, OpResult,
};
use crate::catalog::DataTable;
use crate::convert::{child_path, Converter};
use crate::layered::{effective_row_names, resolve_row_source};
use crate::reflect::{FieldValue, RecordInstance};
use crate::schema::SchemaDescriber;
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Summary entry of a table, shared with the data catalog.
pub(crate) fn table_summary(ctx: &OpContext<'_>, table: &DataTable) -> Map<String, Value> {
    let row_count = if table.is_composite() {
        effective_row_names(&*ctx.catalog, table.path()).len()
    } else {
        table.rows().len()
    };
    let mut entry = Map::new();
    entry.insert("name".into(), json!(table.name()));
    entry.insert("path".into(), json!(table.path()));
    entry.insert("row_struct".into(), json!(table.row_type()));
    entry.insert("row_count".into(), json!(row_count));
    entry.insert("is_composite".into(), json!(table.is_composite()));
    if let Some(parents) = table.parent_paths() {
        entry.insert("parent_tables".into(), json!(parents));
    }
    entry
}

pub fn list_datatables(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let filter = optional_str(params, "path_filter").unwrap_or("");
    let tables: Vec<Value> = ctx
        .catalog
        .tables()
        .iter()
        .filter(|t| t.path().starts_with(filter))
        .map(|t| Value::Object(table_summary(ctx, t)))
        .collect();
    Ok(CommandResult::new(json!({ "datatables": tables })))
}

fn describer<'c>(ctx: &'c OpContext<'_>) -> SchemaDescriber<'c> {
    SchemaDescriber::new(ctx.registry, ctx.subtypes).with_max_depth(ctx.config.max_depth)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, OpError> {
    serde_json::to_value(value).map_err(|e| OpError::Serialization(e.to_string()))
}

pub fn get_datatable_schema(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let include_inherited = optional_bool(params, "include_inherited", true);
    let table = ctx.table(table_path)?;

    let schema = describer(ctx)
        .record_schema(table.row_type(), include_inherited)
        .ok_or_else(|| {
            OpError::InvalidStructType(format!("DataTable has no row struct: {}", table_path))
        })?;
    Ok(CommandResult::new(json!({
        "table_path": table_path,
        "row_struct_name": table.row_type(),
        "schema": to_json(&schema)?,
    })))
}

pub fn get_struct_schema(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let struct_name = required_str(params, "struct_name")?;
    let include_subtypes = optional_bool(params, "include_subtypes", false);
    let describer = describer(ctx);

    let schema = describer
        .record_schema(struct_name, true)
        .ok_or_else(|| OpError::InvalidStructType(format!("Struct not found: {}", struct_name)))?;
    let mut data = Map::new();
    data.insert("schema".into(), to_json(&schema)?);
    if include_subtypes {
        data.insert(
            "subtypes".into(),
            to_json(&describer.subtype_schemas(struct_name))?,
        );
    }
    Ok(CommandResult::new(Value::Object(data)))
}

pub fn query_datatable(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let table = ctx.table(table_path)?;
    let offset = optional_int(params, "offset").unwrap_or(0).max(0) as usize;
    let limit = optional_int(params, "limit")
        .map(|n| n.max(1) as usize)
        .unwrap_or(ctx.config.default_query_limit);
    let pattern = optional_str(params, "row_name_pattern").unwrap_or("");
    let requested = string_list(params, "row_names");
    let fields: HashSet<String> = string_list(params, "fields").into_iter().collect();

    let visible = ctx.visible_rows(table);
    let exact = !requested.is_empty();
    let mut missing = Vec::new();
    let mut selected: Vec<(String, &RecordInstance)> = Vec::new();
    if exact {
        for name in requested {
            match visible.iter().find(|(n, _)| *n == name) {
                Some((_, data)) => selected.push((name, *data)),
                None => missing.push(name),
            }
        }
    } else {
        selected = visible
            .into_iter()
            .filter(|(name, _)| pattern.is_empty() || glob_match(pattern, name))
            .collect();
    }

    let total_count = selected.len();
    let (skip, take) = if exact { (0, total_count) } else { (offset, limit) };
    let converter = ctx.converter();
    let rows: Vec<Value> = selected
        .iter()
        .skip(skip)
        .take(take)
        .map(|(name, data)| {
            json!({
                "row_name": name,
                "row_data": converter.record_to_value_projected(data.record_type(), data, &fields),
            })
        })
        .collect();

    let mut data = Map::new();
    data.insert("table_path".into(), json!(table_path));
    data.insert("rows".into(), Value::Array(rows));
    data.insert("total_count".into(), json!(total_count));
    data.insert("offset".into(), json!(offset));
    data.insert("limit".into(), json!(limit));
    if !missing.is_empty() {
        data.insert("missing_rows".into(), json!(missing));
    }
    Ok(CommandResult::new(Value::Object(data)))
}

pub fn get_datatable_row(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let row_name = required_str(params, "row_name")?;
    let table = ctx.table(table_path)?;

    let (source, row) = ctx
        .catalog
        .effective_row(table_path, row_name)
        .ok_or_else(|| OpError::RowNotFound(row_name.to_string()))?;

    let mut data = Map::new();
    data.insert("table_path".into(), json!(table_path));
    data.insert("row_name".into(), json!(row_name));
    data.insert("row_struct".into(), json!(table.row_type()));
    data.insert(
        "row_data".into(),
        ctx.converter().record_to_value(row.record_type(), row),
    );
    if table.is_composite() {
        data.insert("source_table_path".into(), json!(source.path()));
    }
    Ok(CommandResult::new(Value::Object(data)))
}

pub fn search_datatable_content(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let search_text = optional_str(params, "search_text")
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            OpError::InvalidValue("Missing or empty required param: search_text".into())
        })?;
    let table = ctx.table(table_path)?;
    let filter = string_list(params, "fields");
    let preview: HashSet<String> = string_list(params, "preview_fields").into_iter().collect();
    let limit = optional_int(params, "limit")
        .map(|n| n.max(1) as usize)
        .unwrap_or(ctx.config.default_search_limit);

    let needle = search_text.to_lowercase();
    let converter = ctx.converter();
    let mut results = Vec::new();
    for (name, row) in ctx.visible_rows(table) {
        if results.len() >= limit {
            break;
        }
        let mut matches = Vec::new();
        let scope = (!filter.is_empty()).then_some(filter.as_slice());
        search_record(&converter, row, "", &needle, scope, &mut matches);
        if matches.is_empty() {
            continue;
        }

        let mut entry = Map::new();
        entry.insert("row_name".into(), json!(name));
        entry.insert(
            "matches".into(),
            Value::Array(
                matches
                    .into_iter()
                    .map(|(field, value)| json!({ "field": field, "value": value }))
                    .collect(),
            ),
        );
        if !preview.is_empty() {
            entry.insert(
                "preview".into(),
                converter.record_to_value_projected(row.record_type(), row, &preview),
            );
        }
        results.push(Value::Object(entry));
    }

    Ok(CommandResult::new(json!({
        "table_path": table_path,
        "search_text": search_text,
        "total_matches": results.len(),
        "limit": limit,
        "results": results,
    })))
}

/// Collect `(path, text)` of every textual field containing `needle`.
///
/// `scope == None` searches every field. Otherwise a field is searched when
/// its path or name is listed; a nested record is entered when it is listed
/// itself (then searched entirely) or when a listed path lies below it.
fn search_record(
    converter: &Converter<'_>,
    instance: &RecordInstance,
    prefix: &str,
    needle: &str,
    scope: Option<&[String]>,
    matches: &mut Vec<(String, String)>,
) {
    let Some(record) = converter.registry().record_type(instance.record_type()) else {
        return;
    };
    for field in record.fields() {
        let Some(value) = instance.get(field.slot) else {
            continue;
        };
        let path = child_path(prefix, &field.name);
        let listed = scope.map_or(true, |s| s.iter().any(|f| *f == path || *f == field.name));

        match value {
            FieldValue::String(s) | FieldValue::Symbol(s) => {
                if listed && s.to_lowercase().contains(needle) {
                    matches.push((path, s.clone()));
                }
            }
            FieldValue::Text(text) => {
                let shown = text
                    .source
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(&text.rendered);
                if listed && shown.to_lowercase().contains(needle) {
                    matches.push((path, shown.to_string()));
                }
            }
            FieldValue::Record(inner) => {
                if listed {
                    search_record(converter, inner, &path, needle, None, matches);
                } else if let Some(scope) = scope {
                    let nested = format!("{}.", path);
                    if scope.iter().any(|f| f.starts_with(&nested)) {
                        search_record(converter, inner, &path, needle, Some(scope), matches);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Build a fresh row of `row_type` from `row_data`.
fn build_row(
    converter: &Converter<'_>,
    row_type: &str,
    row_data: &Value,
) -> Result<(RecordInstance, Vec<String>), OpError> {
    let mut instance = converter.instantiate(row_type).ok_or_else(|| {
        OpError::InvalidStructType(format!("Record type not registered: {}", row_type))
    })?;
    let mut warnings = Vec::new();
    if !converter.value_to_record(row_data, row_type, &mut instance, &mut warnings) {
        return Err(OpError::Serialization(
            "Failed to deserialize row_data".into(),
        ));
    }
    Ok((instance, warning_strings(&warnings)))
}

pub fn add_datatable_row(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let row_name = required_str(params, "row_name")?;
    let row_data = required_object(params, "row_data")?;

    let table = ctx.table(table_path)?;
    if table.is_composite() {
        return Err(OpContext::composite_blocked(table));
    }
    if table.contains_row(row_name) {
        return Err(OpError::RowAlreadyExists(row_name.to_string()));
    }
    let row_type = table.row_type().to_string();

    let (instance, warnings) = build_row(&ctx.converter(), &row_type, &Value::Object(row_data.clone()))?;
    ctx.catalog
        .table_mut(table_path)
        .ok_or_else(|| OpError::TableNotFound(table_path.to_string()))?
        .add_row(row_name, instance)
        .map_err(|_| OpError::RowAlreadyExists(row_name.to_string()))?;
    log::debug!("added row {} to {}", row_name, table_path);

    let mut data = Map::new();
    data.insert("row_name".into(), json!(row_name));
    attach_warnings(&mut data, &warnings);
    Ok(CommandResult::with_warnings(Value::Object(data), warnings))
}

/// Table a row write lands in, and the composite it was addressed to.
fn write_target(
    ctx: &OpContext<'_>,
    table_path: &str,
    row_name: &str,
) -> Result<(String, Option<String>), OpError> {
    let table = ctx.table(table_path)?;
    if !table.is_composite() {
        return Ok((table_path.to_string(), None));
    }
    let source = resolve_row_source(&*ctx.catalog, table_path, row_name).ok_or_else(|| {
        OpError::RowNotInComposite {
            table: table.name().to_string(),
            row: row_name.to_string(),
        }
    })?;
    log::debug!(
        "composite {} resolved to {} for row {}",
        table_path,
        source,
        row_name
    );
    Ok((source, Some(table_path.to_string())))
}

fn redirect_info(data: &mut Map<String, Value>, source: &str, composite: Option<String>) {
    if let Some(composite) = composite {
        data.insert("source_table_path".into(), json!(source));
        data.insert("composite_table_path".into(), json!(composite));
    }
}

pub fn update_datatable_row(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let row_name = required_str(params, "row_name")?;
    let row_data = Value::Object(required_object(params, "row_data")?.clone());
    let dry_run = optional_bool(params, "dry_run", false);
    let modified_fields: Vec<&String> = row_data.as_object().map(|o| o.keys().collect()).unwrap_or_default();

    let (source, composite) = write_target(ctx, table_path, row_name)?;
    let converter = ctx.converter();
    let row = ctx
        .catalog
        .table_mut(&source)
        .and_then(|t| t.row_mut(row_name))
        .ok_or_else(|| OpError::RowNotFound(row_name.to_string()))?;
    let row_type = row.record_type().to_string();

    let mut raised = Vec::new();
    if dry_run {
        let old_values = converter.record_to_value(&row_type, row);
        let mut preview = row.clone();
        if !converter.value_to_record(&row_data, &row_type, &mut preview, &mut raised) {
            return Err(OpError::Serialization(
                "Failed to deserialize row_data into existing row".into(),
            ));
        }
        let new_values = converter.record_to_value(&row_type, &preview);
        let changes: Vec<Value> = modified_fields
            .iter()
            .map(|field| {
                let mut change = Map::new();
                change.insert("field".into(), json!(field));
                if let Some(old) = old_values.get(field.as_str()) {
                    change.insert("old_value".into(), old.clone());
                }
                if let Some(new) = new_values.get(field.as_str()) {
                    change.insert("new_value".into(), new.clone());
                }
                Value::Object(change)
            })
            .collect();

        let warnings = warning_strings(&raised);
        let mut data = Map::new();
        data.insert("dry_run".into(), json!(true));
        data.insert("row_name".into(), json!(row_name));
        redirect_info(&mut data, &source, composite);
        data.insert("changes".into(), Value::Array(changes));
        attach_warnings(&mut data, &warnings);
        return Ok(CommandResult::with_warnings(Value::Object(data), warnings));
    }

    if !converter.value_to_record(&row_data, &row_type, row, &mut raised) {
        return Err(OpError::Serialization(
            "Failed to deserialize row_data into existing row".into(),
        ));
    }
    log::debug!("updated row {} in {}", row_name, source);

    let warnings = warning_strings(&raised);
    let mut data = Map::new();
    data.insert("row_name".into(), json!(row_name));
    redirect_info(&mut data, &source, composite);
    data.insert("modified_fields".into(), json!(modified_fields));
    attach_warnings(&mut data, &warnings);
    Ok(CommandResult::with_warnings(Value::Object(data), warnings))
}

pub fn delete_datatable_row(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let row_name = required_str(params, "row_name")?;

    let (source, composite) = write_target(ctx, table_path, row_name)?;
    ctx.catalog
        .table_mut(&source)
        .and_then(|t| t.remove_row(row_name))
        .ok_or_else(|| OpError::RowNotFound(row_name.to_string()))?;
    log::debug!("deleted row {} from {}", row_name, source);

    let mut data = Map::new();
    data.insert("row_name".into(), json!(row_name));
    redirect_info(&mut data, &source, composite);
    Ok(CommandResult::new(Value::Object(data)))
}

/// How `import_datatable_json` treats rows that already exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImportMode {
    /// Skip existing rows.
    Create,
    /// Apply onto existing rows.
    Upsert,
    /// Empty the table first.
    Replace,
}

impl ImportMode {
    fn parse(mode: &str) -> Result<Self, OpError> {
        match mode {
            "create" => Ok(Self::Create),
            "upsert" => Ok(Self::Upsert),
            "replace" => Ok(Self::Replace),
            other => Err(OpError::InvalidValue(format!(
                "Invalid mode: {}. Must be create, upsert, or replace",
                other
            ))),
        }
    }
}

pub fn import_datatable_json(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let table_path = required_str(params, "table_path")?;
    let rows = params
        .get("rows")
        .and_then(Value::as_array)
        .ok_or(OpError::MissingParam("rows"))?;
    let mode = ImportMode::parse(optional_str(params, "mode").unwrap_or("create"))?;
    let dry_run = optional_bool(params, "dry_run", false);

    let table = ctx.table(table_path)?;
    if table.is_composite() {
        return Err(OpContext::composite_blocked(table));
    }
    let row_type = table.row_type().to_string();
    ctx.require_record_type(&row_type)?;

    let converter = ctx.converter();
    let table = ctx
        .catalog
        .table_mut(table_path)
        .ok_or_else(|| OpError::TableNotFound(table_path.to_string()))?;
    if mode == ImportMode::Replace && !dry_run {
        table.clear_rows();
    }

    let (mut created, mut updated, mut skipped) = (0usize, 0usize, 0usize);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for (index, entry) in rows.iter().enumerate() {
        let Some(entry) = entry.as_object() else {
            errors.push(format!("Row {}: invalid entry (not an object)", index));
            continue;
        };
        let Some(name) = entry.get("row_name").and_then(Value::as_str) else {
            errors.push(format!("Row {}: missing row_name", index));
            continue;
        };
        let Some(row_data) = entry.get("row_data").filter(|d| d.is_object()) else {
            errors.push(format!("Row {} ({}): missing row_data", index, name));
            continue;
        };
        let exists = table.contains_row(name);

        if exists && mode == ImportMode::Create && !dry_run {
            skipped += 1;
            continue;
        }

        let mut raised = Vec::new();
        let applied = if exists && mode == ImportMode::Upsert && !dry_run {
            match table.row_mut(name) {
                Some(existing) => converter.value_to_record(row_data, &row_type, existing, &mut raised),
                None => false,
            }
        } else {
            match converter.instantiate(&row_type) {
                Some(mut fresh) => {
                    let ok = converter.value_to_record(row_data, &row_type, &mut fresh, &mut raised);
                    if ok && !dry_run {
                        if let Some(existing) = table.row_mut(name) {
                            *existing = fresh;
                        } else if let Err(e) = table.add_row(name, fresh) {
                            errors.push(format!("Row {} ({}): {}", index, name, e));
                            continue;
                        }
                    }
                    ok
                }
                None => false,
            }
        };
        if !applied {
            errors.push(format!("Row {} ({}): deserialization failed", index, name));
            continue;
        }
        warnings.extend(
            raised
                .iter()
                .map(|w| format!("Row {} ({}): {}", index, name, w)),
        );

        match (exists, mode) {
            (true, ImportMode::Create) => skipped += 1,
            (true, _) => updated += 1,
            (false, _) => created += 1,
        }
    }
    log::debug!(
        "import into {} ({:?}{}): {} created, {} updated, {} skipped, {} errors",
        table_path,
        mode,
        if dry_run { ", dry run" } else { "" },
        created,
        updated,
        skipped,
        errors.len()
    );

    let mut data = Map::new();
    data.insert("created".into(), json!(created));
    data.insert("updated".into(), json!(updated));
    data.insert("skipped".into(), json!(skipped));
    if !errors.is_empty() {
        data.insert("errors".into(), json!(errors));
    }
    attach_warnings(&mut data, &warnings);
    Ok(CommandResult::with_warnings(Value::Object(data), warnings))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{params, Harness, ALL, BASE, PATCH};
    use super::*;
    use crate::protocol::ErrorCode;

    #[test]
    fn test_list_datatables() {
        let mut h = Harness::new();
        let result = list_datatables(&h.ctx(), &params(json!({}))).expect("list");
        let tables = result.data["datatables"].as_array().expect("array");
        assert_eq!(tables.len(), 3);
        assert_eq!(tables[0]["name"], json!("DT_Base"));
        assert_eq!(tables[0]["row_count"], json!(3));
        assert!(tables[0].get("parent_tables").is_none());
        assert_eq!(tables[2]["is_composite"], json!(true));
        assert_eq!(tables[2]["row_count"], json!(3));
        assert_eq!(tables[2]["parent_tables"], json!([BASE, PATCH]));

        let result =
            list_datatables(&h.ctx(), &params(json!({"path_filter": "/Game/Data/DT_P"}))).expect("list");
        assert_eq!(result.data["datatables"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_schemas() {
        let mut h = Harness::new();
        let result =
            get_datatable_schema(&h.ctx(), &params(json!({"table_path": BASE}))).expect("schema");
        assert_eq!(result.data["row_struct_name"], json!("Item"));
        assert_eq!(result.data["schema"]["fields"][0]["name"], json!("name"));

        let err = get_datatable_schema(&h.ctx(), &params(json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Missing required param: table_path");

        let result = get_struct_schema(
            &h.ctx(),
            &params(json!({"struct_name": "Effect", "include_subtypes": true})),
        )
        .expect("struct schema");
        let subtypes: Vec<&Value> = result.data["subtypes"]
            .as_array()
            .expect("subtypes")
            .iter()
            .map(|s| &s["struct_name"])
            .collect();
        assert_eq!(subtypes, vec!["Burn", "Heal"]);

        let err = get_struct_schema(&h.ctx(), &params(json!({"struct_name": "Nope"}))).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStructType);
        assert_eq!(err.to_string(), "Struct not found: Nope");
    }

    #[test]
    fn test_query_pattern_and_pagination() {
        let mut h = Harness::new();
        let result = query_datatable(
            &h.ctx(),
            &params(json!({"table_path": BASE, "row_name_pattern": "*o*", "offset": 1, "limit": 5, "fields": ["name"]})),
        )
        .expect("query");
        assert_eq!(result.data["total_count"], json!(2));
        assert_eq!(result.data["offset"], json!(1));
        let rows = result.data["rows"].as_array().expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["row_name"], json!("bow"));
        assert_eq!(rows[0]["row_data"], json!({"name": "Long Bow"}));

        let result = query_datatable(&h.ctx(), &params(json!({"table_path": BASE, "limit": 0})))
            .expect("query");
        assert_eq!(result.data["limit"], json!(1));
        assert_eq!(result.data["rows"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_query_exact_names_through_composite() {
        let mut h = Harness::new();
        let result = query_datatable(
            &h.ctx(),
            &params(json!({"table_path": ALL, "row_names": ["bow", "staff", "sword"], "fields": ["name"], "limit": 1})),
        )
        .expect("query");
        let rows = result.data["rows"].as_array().expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["row_name"], json!("bow"));
        assert_eq!(rows[1]["row_data"]["name"], json!("Flame Sword"));
        assert_eq!(result.data["missing_rows"], json!(["staff"]));
    }

    #[test]
    fn test_get_row() {
        let mut h = Harness::new();
        let result = get_datatable_row(&h.ctx(), &params(json!({"table_path": ALL, "row_name": "sword"})))
            .expect("row");
        assert_eq!(result.data["source_table_path"], json!(PATCH));
        assert_eq!(result.data["row_data"]["name"], json!("Flame Sword"));

        let result = get_datatable_row(&h.ctx(), &params(json!({"table_path": BASE, "row_name": "axe"})))
            .expect("row");
        assert!(result.data.get("source_table_path").is_none());
        assert_eq!(result.data["row_struct"], json!("Item"));

        let err = get_datatable_row(&h.ctx(), &params(json!({"table_path": BASE, "row_name": "staff"})))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RowNotFound);
        assert_eq!(err.to_string(), "Row not found: staff");

        let err = get_datatable_row(&h.ctx(), &params(json!({"table_path": "/Nope", "row_name": "x"})))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::TableNotFound);
    }

    #[test]
    fn test_search() {
        let mut h = Harness::new();
        let result = search_datatable_content(
            &h.ctx(),
            &params(json!({"table_path": BASE, "search_text": "SHARP", "preview_fields": ["name"]})),
        )
        .expect("search");
        assert_eq!(result.data["total_matches"], json!(1));
        let hit = &result.data["results"][0];
        assert_eq!(hit["row_name"], json!("sword"));
        assert_eq!(hit["matches"], json!([{"field": "stats.note", "value": "sharp edge"}]));
        assert_eq!(hit["preview"], json!({"name": "Iron Sword"}));

        // Text fields match on their source string.
        let result = search_datatable_content(
            &h.ctx(),
            &params(json!({"table_path": BASE, "search_text": "heavy"})),
        )
        .expect("search");
        assert_eq!(result.data["results"][0]["matches"][0]["field"], json!("description"));

        let result = search_datatable_content(
            &h.ctx(),
            &params(json!({"table_path": BASE, "search_text": "o", "fields": ["name"], "limit": 2})),
        )
        .expect("search");
        assert_eq!(result.data["total_matches"], json!(2));
        assert_eq!(result.data["limit"], json!(2));

        let result = search_datatable_content(
            &h.ctx(),
            &params(json!({"table_path": BASE, "search_text": "edge", "fields": ["stats.note"]})),
        )
        .expect("search");
        assert_eq!(result.data["total_matches"], json!(1));

        let err = search_datatable_content(&h.ctx(), &params(json!({"table_path": BASE, "search_text": ""})))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidValue);
    }

    #[test]
    fn test_add_row() {
        let mut h = Harness::new();
        let result = add_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "row_name": "staff", "row_data": {"name": "Staff", "power": 3}})),
        )
        .expect("add");
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.data["warnings"].as_array().map(Vec::len), Some(1));
        assert!(h.catalog.table(BASE).expect("base").contains_row("staff"));

        let err = add_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "row_name": "staff", "row_data": {}})),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RowAlreadyExists);

        let err = add_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": ALL, "row_name": "wand", "row_data": {}})),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CompositeWriteBlocked);
        assert_eq!(err.details(), Some(json!({"parent_tables": [BASE, PATCH]})));

        let err = add_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "row_name": "wand", "row_data": [1]})),
        )
        .unwrap_err();
        assert_eq!(err, OpError::MissingParam("row_data"));
    }

    #[test]
    fn test_update_row_redirects_through_composite() {
        let mut h = Harness::new();
        let result = update_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": ALL, "row_name": "axe", "row_data": {"name": "Great Axe"}})),
        )
        .expect("update");
        assert_eq!(result.data["source_table_path"], json!(BASE));
        assert_eq!(result.data["composite_table_path"], json!(ALL));
        assert_eq!(result.data["modified_fields"], json!(["name"]));

        let row = get_datatable_row(&h.ctx(), &params(json!({"table_path": BASE, "row_name": "axe"})))
            .expect("row");
        assert_eq!(row.data["row_data"]["name"], json!("Great Axe"));

        let err = update_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": ALL, "row_name": "staff", "row_data": {}})),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Row 'staff' not found in any source table of composite 'DT_All'"
        );
        assert_eq!(err.code(), ErrorCode::RowNotFound);
    }

    #[test]
    fn test_update_dry_run_leaves_row_untouched() {
        let mut h = Harness::new();
        let result = update_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "row_name": "bow", "dry_run": true,
                "row_data": {"name": "Short Bow", "nope": 1}})),
        )
        .expect("dry run");
        assert_eq!(result.data["dry_run"], json!(true));
        assert_eq!(
            result.data["changes"],
            json!([
                {"field": "name", "old_value": "Long Bow", "new_value": "Short Bow"},
                {"field": "nope"}
            ])
        );
        assert_eq!(result.warnings.len(), 1);

        let row = get_datatable_row(&h.ctx(), &params(json!({"table_path": BASE, "row_name": "bow"})))
            .expect("row");
        assert_eq!(row.data["row_data"]["name"], json!("Long Bow"));
        assert!(result.data.get("source_table_path").is_none());
    }

    #[test]
    fn test_update_dry_run_through_composite_names_target() {
        let mut h = Harness::new();
        let result = update_datatable_row(
            &mut h.ctx(),
            &params(json!({"table_path": ALL, "row_name": "sword", "dry_run": true,
                "row_data": {"name": "Frost Sword"}})),
        )
        .expect("dry run");
        assert_eq!(result.data["source_table_path"], json!(PATCH));
        assert_eq!(result.data["composite_table_path"], json!(ALL));
        assert_eq!(
            result.data["changes"],
            json!([{"field": "name", "old_value": "Flame Sword", "new_value": "Frost Sword"}])
        );

        let row = get_datatable_row(&h.ctx(), &params(json!({"table_path": PATCH, "row_name": "sword"})))
            .expect("row");
        assert_eq!(row.data["row_data"]["name"], json!("Flame Sword"));
    }

    #[test]
    fn test_delete_row() {
        let mut h = Harness::new();
        let result = delete_datatable_row(&mut h.ctx(), &params(json!({"table_path": ALL, "row_name": "sword"})))
            .expect("delete");
        assert_eq!(result.data["source_table_path"], json!(PATCH));

        // The base row now shows through.
        let row = get_datatable_row(&h.ctx(), &params(json!({"table_path": ALL, "row_name": "sword"})))
            .expect("row");
        assert_eq!(row.data["source_table_path"], json!(BASE));

        let err = delete_datatable_row(&mut h.ctx(), &params(json!({"table_path": PATCH, "row_name": "sword"})))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::RowNotFound);
    }

    #[test]
    fn test_import_modes() {
        let mut h = Harness::new();
        let rows = json!([
            {"row_name": "sword", "row_data": {"name": "Imported Sword"}},
            {"row_name": "wand", "row_data": {"name": "Wand", "bogus": true}},
            7,
            {"row_data": {}},
            {"row_name": "orb"}
        ]);

        let result = import_datatable_json(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "rows": rows, "dry_run": true})),
        )
        .expect("dry run");
        assert_eq!(result.data["created"], json!(1));
        assert_eq!(result.data["skipped"], json!(1));
        assert_eq!(
            result.data["errors"],
            json!([
                "Row 2: invalid entry (not an object)",
                "Row 3: missing row_name",
                "Row 4 (orb): missing row_data"
            ])
        );
        assert!(result.warnings[0].starts_with("Row 1 (wand): "));
        assert!(!h.catalog.table(BASE).expect("base").contains_row("wand"));

        let result = import_datatable_json(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "rows": rows, "mode": "upsert"})),
        )
        .expect("upsert");
        assert_eq!(result.data["created"], json!(1));
        assert_eq!(result.data["updated"], json!(1));
        let base = h.catalog.table(BASE).expect("base");
        assert_eq!(base.rows().len(), 4);

        let result = import_datatable_json(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "rows": [{"row_name": "only", "row_data": {}}], "mode": "replace"})),
        )
        .expect("replace");
        assert_eq!(result.data["created"], json!(1));
        let names: Vec<&str> = h.catalog.table(BASE).expect("base").row_names().collect();
        assert_eq!(names, vec!["only"]);
    }

    #[test]
    fn test_import_rejections() {
        let mut h = Harness::new();
        let err = import_datatable_json(
            &mut h.ctx(),
            &params(json!({"table_path": BASE, "rows": [], "mode": "merge"})),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid mode: merge. Must be create, upsert, or replace"
        );

        let err = import_datatable_json(&mut h.ctx(), &params(json!({"table_path": ALL, "rows": []})))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::CompositeWriteBlocked);
    }
}
