// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! String tables: listing, key lookup and source string edits.

use super::{glob_match, optional_str, required_str, CommandResult, OpContext, OpError, OpResult};
use serde_json::{json, Map, Value};

pub fn list_string_tables(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let path_filter = optional_str(params, "path_filter").unwrap_or("");
    let tables: Vec<Value> = ctx
        .catalog
        .string_tables()
        .iter()
        .filter(|t| t.path().starts_with(path_filter))
        .map(|t| json!({ "name": t.name(), "path": t.path(), "namespace": t.namespace() }))
        .collect();
    Ok(CommandResult::new(json!({ "string_tables": tables, "count": tables.len() })))
}

/// Entries of one string table, optionally filtered by a key wildcard.
pub fn get_translations(ctx: &OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let path = required_str(params, "string_table_path")?;
    let key_pattern = optional_str(params, "key_pattern").unwrap_or("");
    let table = ctx
        .catalog
        .string_table(path)
        .ok_or_else(|| OpError::StringTableNotFound(path.to_string()))?;

    let entries: Vec<Value> = table
        .entries()
        .filter(|(key, _)| key_pattern.is_empty() || glob_match(key_pattern, key))
        .map(|(key, source)| json!({ "key": key, "source_string": source }))
        .collect();
    Ok(CommandResult::new(json!({
        "string_table_path": path,
        "namespace": table.namespace(),
        "entries": entries,
        "count": entries.len(),
    })))
}

/// Insert or replace the source string stored under `key`.
pub fn set_translation(ctx: &mut OpContext<'_>, params: &Map<String, Value>) -> OpResult {
    let path = required_str(params, "string_table_path")?;
    let key = required_str(params, "key")?;
    let text = required_str(params, "text")?;
    if key.is_empty() {
        return Err(OpError::InvalidField("Parameter 'key' cannot be empty".into()));
    }
    let table = ctx
        .catalog
        .string_table_mut(path)
        .ok_or_else(|| OpError::StringTableNotFound(path.to_string()))?;
    table.set(key, text);
    log::debug!("set translation key '{}' in {}", key, path);

    Ok(CommandResult::new(json!({
        "success": true,
        "string_table_path": path,
        "key": key,
        "text": text,
    })))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{params, Harness};
    use super::*;
    use crate::protocol::ErrorCode;

    const UI: &str = "/Game/Loc/ST_UI.ST_UI";

    #[test]
    fn test_list_string_tables() {
        let mut h = Harness::new();
        let all = list_string_tables(&h.ctx(), &params(json!({}))).expect("list");
        assert_eq!(all.data["count"], json!(2));
        assert_eq!(
            all.data["string_tables"][0],
            json!({"name": "ST_UI", "path": UI, "namespace": "UI"})
        );
        let none = list_string_tables(&h.ctx(), &params(json!({"path_filter": "/Game/Data"})))
            .expect("list");
        assert_eq!(none.data["count"], json!(0));
    }

    #[test]
    fn test_get_translations_with_key_pattern() {
        let mut h = Harness::new();
        let all = get_translations(&h.ctx(), &params(json!({"string_table_path": UI}))).expect("get");
        assert_eq!(all.data["namespace"], json!("UI"));
        assert_eq!(all.data["count"], json!(3));

        let menu = get_translations(
            &h.ctx(),
            &params(json!({"string_table_path": UI, "key_pattern": "menu_*"})),
        )
        .expect("get");
        assert_eq!(
            menu.data["entries"],
            json!([
                {"key": "Menu_Start", "source_string": "Start Game"},
                {"key": "Menu_Quit", "source_string": "Quit"}
            ])
        );

        let err = get_translations(&h.ctx(), &params(json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "Missing required param: string_table_path");
        let err = get_translations(&h.ctx(), &params(json!({"string_table_path": "/Game/Nope"})))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AssetNotFound);
        assert_eq!(err.to_string(), "StringTable not found: /Game/Nope");
    }

    #[test]
    fn test_set_translation() {
        let mut h = Harness::new();
        let result = set_translation(
            &mut h.ctx(),
            &params(json!({"string_table_path": UI, "key": "Menu_Quit", "text": "Exit"})),
        )
        .expect("set");
        assert_eq!(result.data["success"], json!(true));
        set_translation(
            &mut h.ctx(),
            &params(json!({"string_table_path": UI, "key": "Menu_Options", "text": "Options"})),
        )
        .expect("add");

        let table = h.catalog.string_table(UI).expect("table");
        assert_eq!(table.get("Menu_Quit"), Some("Exit"));
        assert_eq!(table.entries().last(), Some(("Menu_Options", "Options")));

        let err = set_translation(
            &mut h.ctx(),
            &params(json!({"string_table_path": UI, "key": "", "text": "x"})),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Parameter 'key' cannot be empty");
        let err = set_translation(&mut h.ctx(), &params(json!({"string_table_path": UI, "key": "k"})))
            .unwrap_err();
        assert_eq!(err, OpError::MissingParam("text"));
    }
}
