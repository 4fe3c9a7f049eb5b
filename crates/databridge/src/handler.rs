// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Command routing and the line protocol loop.
//!
//! A [`CommandHandler`] owns the registry, the catalog and the subtype
//! cache. Each request is routed to its operation, timed, and answered with
//! a [`Response`]:
//!
//! ```json
//! {"command": "get_datatable_row", "params": {"table_path": "/Game/DT_Items", "row_name": "sword"}}
//! {"success": true, "data": {...}, "warnings": [], "timing_ms": 0.12}
//! ```

use crate::catalog::Catalog;
use crate::config::BridgeConfig;
use crate::fixture::Fixture;
use crate::ops::{curve_table, data_asset, datatable, localization, overview, tags};
use crate::ops::{CommandResult, OpContext, OpError, OpResult};
use crate::protocol::{decode_request, encode_response, ErrorCode, Request, Response};
use crate::reflect::{InMemoryRegistry, RecordType, RegistryError, TypeRegistry};
use crate::subtypes::SubtypeIndex;
use serde_json::{json, Map, Value};
use std::io::{self, BufRead, Write};
use std::time::Instant;

/// Every command name the handler routes.
pub const COMMANDS: &[&str] = &[
    "ping",
    "get_status",
    "batch",
    "list_datatables",
    "get_datatable_schema",
    "get_struct_schema",
    "query_datatable",
    "get_datatable_row",
    "search_datatable_content",
    "add_datatable_row",
    "update_datatable_row",
    "delete_datatable_row",
    "import_datatable_json",
    "get_data_catalog",
    "search_assets",
    "resolve_tags",
    "list_gameplay_tags",
    "validate_gameplay_tag",
    "list_tags",
    "validate_tag",
    "list_data_assets",
    "get_data_asset",
    "update_data_asset",
    "list_curve_tables",
    "get_curve_table",
    "update_curve_table_row",
    "list_string_tables",
    "get_translations",
    "set_translation",
];

/// Routes commands against one host's data.
pub struct CommandHandler {
    registry: InMemoryRegistry,
    catalog: Catalog,
    subtypes: SubtypeIndex,
    config: BridgeConfig,
}

impl CommandHandler {
    pub fn new(registry: InMemoryRegistry, catalog: Catalog, config: BridgeConfig) -> Self {
        Self {
            registry,
            catalog,
            subtypes: SubtypeIndex::new(),
            config,
        }
    }

    pub fn from_fixture(fixture: Fixture, config: BridgeConfig) -> Self {
        Self::new(fixture.registry, fixture.catalog, config)
    }

    pub fn registry(&self) -> &InMemoryRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn subtypes(&self) -> &SubtypeIndex {
        &self.subtypes
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Register a record type while serving. Cached subtype lists are
    /// rebuilt on next use.
    pub fn register_record(&mut self, record: RecordType) -> Result<(), RegistryError> {
        self.registry.register_record(record)
    }

    /// Run one command.
    pub fn execute(&mut self, command: &str, params: &Value) -> OpResult {
        let params = match params {
            Value::Object(map) => map,
            Value::Null => return self.execute(command, &Value::Object(Map::new())),
            _ => return Err(OpError::InvalidRequest("'params' must be an object".into())),
        };

        match command {
            "ping" => Ok(CommandResult::new(json!({ "message": "pong" }))),
            "get_status" => Ok(self.status()),
            "batch" => self.batch(params),
            _ => self.dispatch(command, params),
        }
    }

    fn dispatch(&mut self, command: &str, params: &Map<String, Value>) -> OpResult {
        let mut ctx = OpContext {
            registry: &self.registry,
            subtypes: &self.subtypes,
            catalog: &mut self.catalog,
            config: &self.config,
        };
        match command {
            "list_datatables" => datatable::list_datatables(&ctx, params),
            "get_datatable_schema" => datatable::get_datatable_schema(&ctx, params),
            "get_struct_schema" => datatable::get_struct_schema(&ctx, params),
            "query_datatable" => datatable::query_datatable(&ctx, params),
            "get_datatable_row" => datatable::get_datatable_row(&ctx, params),
            "search_datatable_content" => datatable::search_datatable_content(&ctx, params),
            "add_datatable_row" => datatable::add_datatable_row(&mut ctx, params),
            "update_datatable_row" => datatable::update_datatable_row(&mut ctx, params),
            "delete_datatable_row" => datatable::delete_datatable_row(&mut ctx, params),
            "import_datatable_json" => datatable::import_datatable_json(&mut ctx, params),
            "get_data_catalog" => overview::get_data_catalog(&ctx, params),
            "search_assets" => overview::search_assets(&ctx, params),
            "resolve_tags" => tags::resolve_tags(&ctx, params),
            "list_gameplay_tags" | "list_tags" => tags::list_tags(&ctx, params),
            "validate_gameplay_tag" | "validate_tag" => tags::validate_tag(&ctx, params),
            "list_data_assets" => data_asset::list_data_assets(&ctx, params),
            "get_data_asset" => data_asset::get_data_asset(&ctx, params),
            "update_data_asset" => data_asset::update_data_asset(&mut ctx, params),
            "list_curve_tables" => curve_table::list_curve_tables(&ctx, params),
            "get_curve_table" => curve_table::get_curve_table(&ctx, params),
            "update_curve_table_row" => curve_table::update_curve_table_row(&mut ctx, params),
            "list_string_tables" => localization::list_string_tables(&ctx, params),
            "get_translations" => localization::get_translations(&ctx, params),
            "set_translation" => localization::set_translation(&mut ctx, params),
            other => {
                log::warn!("Unknown command: {}", other);
                Err(OpError::UnknownCommand(other.to_string()))
            }
        }
    }

    fn status(&self) -> CommandResult {
        CommandResult::new(json!({
            "connected": true,
            "version": crate::VERSION,
            "record_types": self.registry.record_types().count(),
            "tables": self.catalog.tables().len(),
            "assets": self.catalog.assets().len(),
            "curve_tables": self.catalog.curve_tables().len(),
            "string_tables": self.catalog.string_tables().len(),
        }))
    }

    fn batch(&mut self, params: &Map<String, Value>) -> OpResult {
        let commands = params
            .get("commands")
            .and_then(Value::as_array)
            .ok_or(OpError::MissingParam("commands (array)"))?;
        if commands.len() > self.config.max_batch_size {
            return Err(OpError::BatchLimitExceeded {
                size: commands.len(),
                max: self.config.max_batch_size,
            });
        }

        let batch_start = Instant::now();
        let mut results = Vec::with_capacity(commands.len());
        for (index, entry) in commands.iter().enumerate() {
            let Some(entry) = entry.as_object() else {
                results.push(json!({
                    "index": index,
                    "command": "",
                    "success": false,
                    "error_code": ErrorCode::InvalidField,
                    "error_message": "Invalid command entry (not an object)",
                    "timing_ms": 0.0,
                }));
                continue;
            };
            let command = entry.get("command").and_then(Value::as_str).unwrap_or("");
            if command == "batch" {
                let err = OpError::BatchRecursionBlocked;
                results.push(json!({
                    "index": index,
                    "command": command,
                    "success": false,
                    "error_code": err.code(),
                    "error_message": err.to_string(),
                    "timing_ms": 0.0,
                }));
                continue;
            }
            let sub_params = match entry.get("params") {
                Some(p @ Value::Object(_)) => p.clone(),
                _ => Value::Object(Map::new()),
            };

            let start = Instant::now();
            let outcome = self.execute(command, &sub_params);
            let mut result = Map::new();
            result.insert("index".into(), json!(index));
            result.insert("command".into(), json!(command));
            result.insert("success".into(), json!(outcome.is_ok()));
            result.insert("timing_ms".into(), json!(elapsed_ms(start)));
            match outcome {
                Ok(done) => {
                    result.insert("data".into(), done.data);
                    if !done.warnings.is_empty() {
                        result.insert("warnings".into(), json!(done.warnings));
                    }
                }
                Err(err) => {
                    result.insert("error_code".into(), json!(err.code()));
                    result.insert("error_message".into(), json!(err.to_string()));
                }
            }
            results.push(Value::Object(result));
        }

        Ok(CommandResult::new(json!({
            "count": results.len(),
            "results": results,
            "total_timing_ms": elapsed_ms(batch_start),
        })))
    }

    /// Run a decoded request and wrap the outcome in a timed response.
    pub fn handle_request(&mut self, request: &Request) -> Response {
        let start = Instant::now();
        let outcome = self.execute(&request.command, &request.params);
        let timing_ms = elapsed_ms(start);

        if self.config.log_commands {
            match &outcome {
                Ok(_) => log::info!("{} ok ({:.3} ms)", request.command, timing_ms),
                Err(e) => log::info!(
                    "{} failed: {} {} ({:.3} ms)",
                    request.command,
                    e.code(),
                    e,
                    timing_ms
                ),
            }
        }

        match outcome {
            Ok(result) => Response::success(result.data, result.warnings, timing_ms),
            Err(err) => Response::failure(err.code(), err.to_string(), err.details(), timing_ms),
        }
    }

    /// Handle one protocol line. Undecodable input yields an
    /// `INVALID_REQUEST` response.
    pub fn handle_line(&mut self, line: &str) -> Response {
        match decode_request(line) {
            Ok(request) => self.handle_request(&request),
            Err(e) => {
                log::warn!("rejected request line: {}", e);
                Response::failure(ErrorCode::InvalidRequest, e.to_string(), None, 0.0)
            }
        }
    }

    /// Answer every non-blank line of `reader` on `writer` until end of
    /// input. Returns the number of requests handled.
    pub fn serve<R: BufRead, W: Write>(&mut self, reader: R, mut writer: W) -> io::Result<usize> {
        let mut handled = 0;
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            let encoded = encode_response(&response)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{}", encoded)?;
            writer.flush()?;
            handled += 1;
        }
        log::debug!("input closed after {} requests", handled);
        Ok(handled)
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::WORLD;
    use crate::reflect::{FieldKind, RecordTypeBuilder};

    fn handler() -> CommandHandler {
        let fixture = Fixture::from_json(WORLD).expect("world");
        CommandHandler::from_fixture(fixture, BridgeConfig::default())
    }

    #[test]
    fn test_every_listed_command_is_routed() {
        let mut handler = handler();
        for command in COMMANDS {
            let err = handler.execute(command, &json!({})).err();
            assert_ne!(
                err.map(|e| e.code()),
                Some(ErrorCode::UnknownCommand),
                "{} is not routed",
                command
            );
        }
        let err = handler.execute("drop_everything", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: drop_everything");
    }

    #[test]
    fn test_ping_and_status() {
        let mut handler = handler();
        let pong = handler.execute("ping", &Value::Null).expect("ping");
        assert_eq!(pong.data, json!({"message": "pong"}));

        let status = handler.execute("get_status", &json!({})).expect("status");
        assert_eq!(status.data["connected"], json!(true));
        assert_eq!(status.data["tables"], json!(3));
        assert_eq!(status.data["assets"], json!(3));

        let err = handler.execute("ping", &json!([1])).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn test_gameplay_tag_names_share_the_tag_queries() {
        let mut handler = handler();
        let listed = handler
            .execute("list_gameplay_tags", &json!({"prefix": "Weapon"}))
            .expect("list");
        let aliased = handler
            .execute("list_tags", &json!({"prefix": "Weapon"}))
            .expect("list");
        assert_eq!(listed.data, aliased.data);

        let valid = handler
            .execute("validate_gameplay_tag", &json!({"tag": "Damage.Fire"}))
            .expect("validate");
        assert_eq!(
            valid.data,
            handler
                .execute("validate_tag", &json!({"tag": "Damage.Fire"}))
                .expect("validate")
                .data
        );
    }

    #[test]
    fn test_curve_row_edit_over_the_wire() {
        let mut handler = handler();
        let response = handler.handle_line(
            r#"{"command":"update_curve_table_row","params":{"table_path":"/Game/Curves/CT_Xp.CT_Xp","row_name":"gold_per_level","keys":[{"time":1.0,"value":8.0},{"time":2.0}]}}"#,
        );
        assert!(response.success);
        assert_eq!(response.warnings, vec!["Key at index 1 missing 'value' field"]);

        let read = handler
            .execute(
                "get_curve_table",
                &json!({"table_path": "/Game/Curves/CT_Xp.CT_Xp", "row_name": "gold_per_level"}),
            )
            .expect("read");
        assert_eq!(read.data["curves"][0]["keys"][0]["value"], json!(8.0));

        let status = handler.execute("get_status", &json!({})).expect("status");
        assert_eq!(status.data["curve_tables"], json!(2));
        assert_eq!(status.data["string_tables"], json!(2));
    }

    #[test]
    fn test_batch_entries() {
        let mut handler = handler();
        let result = handler
            .execute(
                "batch",
                &json!({"commands": [
                    {"command": "ping"},
                    "oops",
                    {"command": "batch", "params": {"commands": []}},
                    {"command": "get_datatable_row", "params": {"table_path": "/Nope", "row_name": "x"}}
                ]}),
            )
            .expect("batch");
        let results = result.data["results"].as_array().expect("results");
        assert_eq!(result.data["count"], json!(4));

        assert_eq!(results[0]["success"], json!(true));
        assert_eq!(results[0]["data"]["message"], json!("pong"));
        assert_eq!(results[1]["command"], json!(""));
        assert_eq!(results[1]["error_code"], json!("INVALID_FIELD"));
        assert_eq!(results[2]["error_code"], json!("BATCH_RECURSION_BLOCKED"));
        assert_eq!(results[3]["index"], json!(3));
        assert_eq!(results[3]["error_code"], json!("TABLE_NOT_FOUND"));
        assert!(result.data["total_timing_ms"].as_f64().is_some());
    }

    #[test]
    fn test_batch_limits() {
        let mut handler = handler();
        let commands: Vec<Value> = (0..21).map(|_| json!({"command": "ping"})).collect();
        let err = handler
            .execute("batch", &json!({ "commands": commands }))
            .unwrap_err();
        assert_eq!(err.to_string(), "Batch size 21 exceeds maximum of 20");

        let err = handler.execute("batch", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Missing required param: commands (array)");
    }

    #[test]
    fn test_handle_line_and_errors() {
        let mut handler = handler();
        let response = handler.handle_line("not json");
        assert!(!response.success);
        assert_eq!(response.error_code(), Some(ErrorCode::InvalidRequest));

        let response = handler.handle_line(
            r#"{"command":"add_datatable_row","params":{"table_path":"/Game/Data/DT_All.DT_All","row_name":"x","row_data":{}}}"#,
        );
        let error = response.error.expect("error body");
        assert_eq!(error.code, ErrorCode::CompositeWriteBlocked);
        assert!(error.details.is_some());
    }

    #[test]
    fn test_serve_answers_each_line() {
        let mut handler = handler();
        let input = "{\"command\":\"ping\"}\n\n{\"command\":\"nope\"}\n";
        let mut output = Vec::new();
        let handled = handler.serve(input.as_bytes(), &mut output).expect("serve");
        assert_eq!(handled, 2);

        let text = String::from_utf8(output).expect("utf8");
        let lines: Vec<Response> = text
            .lines()
            .map(|l| serde_json::from_str(l).expect("response"))
            .collect();
        assert!(lines[0].success);
        assert_eq!(lines[1].error_code(), Some(ErrorCode::UnknownCommand));
    }

    #[test]
    fn test_new_subtype_visible_after_registration() {
        let mut handler = handler();
        let params = json!({"struct_name": "Effect", "include_subtypes": true});
        let before = handler.execute("get_struct_schema", &params).expect("schema");
        assert_eq!(before.data["subtypes"].as_array().map(Vec::len), Some(2));

        handler
            .register_record(
                RecordTypeBuilder::new("Freeze")
                    .parent("Effect")
                    .field("slow", FieldKind::Float32)
                    .build(),
            )
            .expect("register");
        let after = handler.execute("get_struct_schema", &params).expect("schema");
        assert_eq!(after.data["subtypes"].as_array().map(Vec::len), Some(3));
    }
}
