// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Databridge
//!
//! Reads and edits runtime-typed configuration records as JSON. Record
//! shapes are not known at compile time; they come from a [`TypeRegistry`]
//! describing record types, enums, tags and loadable objects.
//!
//! # Features
//!
//! - **Conversion** -- record <-> JSON in both directions, with warnings
//!   instead of hard failures for unknown fields and bad values
//! - **Schemas** -- JSON-ready description of any record type
//! - **Subtype index** -- cached discovery of polymorphic subtypes
//! - **Layered tables** -- composite tables overlaying ordered parents, with
//!   writes routed to the table that owns the row
//! - **Command handler** -- line-delimited JSON protocol over the catalog
//!
//! # Architecture
//!
//! ```text
//! CommandHandler
//! +-- InMemoryRegistry  (record types, enums, tags, objects)
//! +-- Catalog           (data, curve and string tables + data assets)
//! +-- SubtypeIndex      (per-base subtype cache)
//! +-- ops::*            (one function per command)
//!     +-- Converter         (record <-> JSON)
//!     +-- SchemaDescriber   (record type -> schema)
//!     +-- layered           (composite row resolution)
//! ```
//!
//! # Example
//!
//! ```rust
//! use databridge::{BridgeConfig, CommandHandler, Fixture};
//!
//! let world = r#"{
//!     "records": [{"name": "Item", "fields": [{"name": "name", "kind": "string"}]}],
//!     "tables": [{
//!         "path": "/Game/DT_Items.DT_Items",
//!         "row_type": "Item",
//!         "rows": [{"row_name": "sword", "row_data": {"name": "Sword"}}]
//!     }]
//! }"#;
//! let fixture = Fixture::from_json(world).unwrap();
//! let mut handler = CommandHandler::from_fixture(fixture, BridgeConfig::default());
//!
//! let response = handler.handle_line(
//!     r#"{"command":"get_datatable_row","params":{"table_path":"/Game/DT_Items.DT_Items","row_name":"sword"}}"#,
//! );
//! assert!(response.success);
//! ```

pub mod catalog;
pub mod config;
pub mod convert;
pub mod fixture;
pub mod handler;
pub mod layered;
pub mod ops;
pub mod protocol;
pub mod reflect;
pub mod schema;
pub mod subtypes;

pub use catalog::{
    Catalog, CatalogError, Curve, CurveKey, CurveMode, CurveTable, DataAsset, DataTable,
    InterpMode, StringTable,
};
pub use config::{BridgeConfig, ConfigError};
pub use convert::{ConvertOptions, Converter, Warning};
pub use fixture::{Fixture, FixtureError, World};
pub use handler::{CommandHandler, COMMANDS};
pub use layered::{effective_row_names, resolve_row_source, TableGraph};
pub use ops::{CommandResult, OpError};
pub use protocol::{decode_request, encode_response, ErrorCode, Request, Response};
pub use reflect::{
    FieldKind, FieldValue, InMemoryRegistry, RecordInstance, RecordType, RecordTypeBuilder,
    TypeRegistry,
};
pub use schema::{FieldSchema, RecordSchema, SchemaDescriber};
pub use subtypes::SubtypeIndex;

/// Crate version reported by `get_status`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
