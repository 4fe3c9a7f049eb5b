// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type model for configuration records.
//!
//! Record shapes are discovered at runtime through a [`TypeRegistry`]
//! rather than known at compile time.
//!
//! # Features
//!
//! - **RecordType**: flattened field list with declaring-type information
//! - **FieldKind**: closed set of storage kinds, matched exhaustively
//! - **RecordInstance**: slot-indexed field storage
//! - **SlotMap / SlotSet**: tombstoned slot tables for map and set fields
//!
//! # Example
//!
//! ```rust
//! use databridge::reflect::{
//!     default_instance, FieldKind, FieldValue, InMemoryRegistry, RecordTypeBuilder,
//! };
//!
//! let mut registry = InMemoryRegistry::new();
//! registry
//!     .register_record(
//!         RecordTypeBuilder::new("Item")
//!             .string_field("name")
//!             .field("damage", FieldKind::Int32)
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let mut item = default_instance(&registry, "Item", 32).unwrap();
//! item.set(1, FieldValue::Int32(12));
//! assert_eq!(item.field(&registry, "damage"), Some(&FieldValue::Int32(12)));
//! ```

mod builder;
mod descriptor;
mod instance;
mod kind;
mod registry;
mod table;
mod value;

pub use builder::RecordTypeBuilder;
pub use descriptor::{EnumType, Enumerator, FieldDescriptor, RecordType};
pub use instance::{default_instance, default_value, value_matches_kind, RecordInstance};
pub use kind::{FieldKind, ParseKindError};
pub use registry::{InMemoryRegistry, RegistryError, TypeRegistry, INSTANCED_RECORD};
pub use table::{SlotMap, SlotSet};
pub use value::{DomainTag, FieldValue, ObjectRef, TagSet, Text};
