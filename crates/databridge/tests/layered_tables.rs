// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reads and writes through composite tables, driven by commands.

use databridge::{BridgeConfig, CommandHandler, ErrorCode, Fixture};
use serde_json::{json, Value};

const A: &str = "/Game/DT_A.DT_A";
const B: &str = "/Game/DT_B.DT_B";
const C: &str = "/Game/DT_C.DT_C";
const ABC: &str = "/Game/DT_ABC.DT_ABC";
const NESTED: &str = "/Game/DT_Nested.DT_Nested";

fn handler() -> CommandHandler {
    let world = json!({
        "records": [{"name": "Stat", "fields": [{"name": "value", "kind": "int32"}]}],
        "tables": [
            {"path": A, "row_type": "Stat", "rows": [
                {"row_name": "x", "row_data": {"value": 1}},
                {"row_name": "y", "row_data": {"value": 1}}
            ]},
            {"path": B, "row_type": "Stat", "rows": [
                {"row_name": "x", "row_data": {"value": 2}}
            ]},
            {"path": C, "row_type": "Stat", "rows": [
                {"row_name": "x", "row_data": {"value": 3}},
                {"row_name": "z", "row_data": {"value": 3}}
            ]},
            {"path": "/Game/DT_D.DT_D", "row_type": "Stat", "rows": [
                {"row_name": "w", "row_data": {"value": 4}}
            ]},
            {"path": ABC, "row_type": "Stat", "parents": [A, B, C]},
            {"path": "/Game/DT_AB.DT_AB", "row_type": "Stat", "parents": [A, B]},
            {"path": NESTED, "row_type": "Stat", "parents": ["/Game/DT_AB.DT_AB", "/Game/DT_D.DT_D"]}
        ]
    });
    let fixture = Fixture::from_json(&world.to_string()).expect("world");
    assert!(fixture.warnings.is_empty());
    CommandHandler::from_fixture(fixture, BridgeConfig::default())
}

fn row(handler: &mut CommandHandler, table: &str, name: &str) -> Value {
    handler
        .execute("get_datatable_row", &json!({"table_path": table, "row_name": name}))
        .expect("row")
        .data
}

#[test]
fn test_last_parent_provides_shared_row() {
    let mut handler = handler();
    let x = row(&mut handler, ABC, "x");
    assert_eq!(x["row_data"]["value"], json!(3));
    assert_eq!(x["source_table_path"], json!(C));

    let y = row(&mut handler, ABC, "y");
    assert_eq!(y["source_table_path"], json!(A));
}

#[test]
fn test_nested_composite_resolves_in_place() {
    let mut handler = handler();
    let x = row(&mut handler, NESTED, "x");
    assert_eq!(x["row_data"]["value"], json!(2));
    assert_eq!(x["source_table_path"], json!(B));

    let w = row(&mut handler, NESTED, "w");
    assert_eq!(w["row_data"]["value"], json!(4));
}

#[test]
fn test_query_lists_rows_in_first_appearance_order() {
    let mut handler = handler();
    let result = handler
        .execute("query_datatable", &json!({"table_path": ABC}))
        .expect("query");
    let names: Vec<&str> = result.data["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|r| r["row_name"].as_str())
        .collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    assert_eq!(result.data["total_count"], json!(3));
    assert_eq!(result.data["rows"][0]["row_data"]["value"], json!(3));
}

#[test]
fn test_update_lands_in_owning_table() {
    let mut handler = handler();
    let result = handler
        .execute(
            "update_datatable_row",
            &json!({"table_path": ABC, "row_name": "y", "row_data": {"value": 9}}),
        )
        .expect("update");
    assert_eq!(result.data["source_table_path"], json!(A));
    assert_eq!(result.data["composite_table_path"], json!(ABC));

    assert_eq!(row(&mut handler, A, "y")["row_data"]["value"], json!(9));
    assert_eq!(row(&mut handler, ABC, "y")["row_data"]["value"], json!(9));
    // Overridden copies of `x` are untouched by a write to `y`.
    assert_eq!(row(&mut handler, B, "x")["row_data"]["value"], json!(2));
}

#[test]
fn test_delete_through_composite_uncovers_lower_layer() {
    let mut handler = handler();
    let result = handler
        .execute("delete_datatable_row", &json!({"table_path": ABC, "row_name": "x"}))
        .expect("delete");
    assert_eq!(result.data["source_table_path"], json!(C));

    let x = row(&mut handler, ABC, "x");
    assert_eq!(x["row_data"]["value"], json!(2));
    assert_eq!(x["source_table_path"], json!(B));
}

#[test]
fn test_composite_misses_and_blocked_writes() {
    let mut handler = handler();
    let err = handler
        .execute(
            "update_datatable_row",
            &json!({"table_path": ABC, "row_name": "nope", "row_data": {"value": 1}}),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::RowNotFound);
    assert_eq!(
        err.to_string(),
        "Row 'nope' not found in any source table of composite 'DT_ABC'"
    );

    let err = handler
        .execute(
            "import_datatable_json",
            &json!({"table_path": ABC, "rows": []}),
        )
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CompositeWriteBlocked);
    assert_eq!(err.details(), Some(json!({"parent_tables": [A, B, C]})));
}
