// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type registry: the reflection boundary the conversion engine reads.
//!
//! The host process owns record types, enums, the tag dictionary and the
//! loadable objects. [`TypeRegistry`] is the read-only view the engine
//! needs; [`InMemoryRegistry`] is a self-contained implementation used by
//! fixtures, the CLI and tests.

use crate::reflect::{DomainTag, EnumType, ObjectRef, RecordType};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Name of the built-in polymorphic wrapper type.
pub const INSTANCED_RECORD: &str = "InstancedRecord";

/// Read-only view of the host's reflection data.
pub trait TypeRegistry {
    /// Look up a record type by name.
    fn record_type(&self, name: &str) -> Option<&RecordType>;

    /// Every registered record type, in registration order.
    fn record_types(&self) -> Box<dyn Iterator<Item = &RecordType> + '_>;

    /// Look up an enum type by name.
    fn enum_type(&self, name: &str) -> Option<&EnumType>;

    /// Resolve a dotted tag name against the tag dictionary.
    fn resolve_tag(&self, name: &str) -> Option<DomainTag>;

    /// Every known tag, sorted.
    fn tags(&self) -> Box<dyn Iterator<Item = &DomainTag> + '_>;

    /// Load the object at `path`, requiring it to be an instance of `class`.
    fn load_object(&self, path: &str, class: &str) -> Option<ObjectRef>;

    /// Fully-qualified path of a loaded object, if it is still known.
    fn path_of(&self, object: &ObjectRef) -> Option<String>;

    /// Counter bumped whenever the set of record types changes.
    fn generation(&self) -> u64;

    /// Whether `name` is `base` or derives from it.
    fn is_descendant_of(&self, name: &str, base: &str) -> bool {
        let mut current = Some(name);
        // Bounded: a foreign registry may contain parent cycles.
        for _ in 0..=self.record_types().count() {
            match current {
                Some(n) if n == base => return true,
                Some(n) => current = self.record_type(n).and_then(|r| r.parent()),
                None => return false,
            }
        }
        false
    }
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("type '{0}' is already registered")]
    DuplicateType(String),

    #[error("type '{child}' derives from unregistered type '{parent}'")]
    UnknownParent { child: String, parent: String },

    #[error("field '{field}' of '{record}' shadows an inherited field")]
    DuplicateField { record: String, field: String },

    #[error("invalid tag '{0}'")]
    InvalidTag(String),

    #[error("object '{path}' has unregistered class '{class}'")]
    UnknownClass { path: String, class: String },
}

/// Simple [`HashMap`]-backed [`TypeRegistry`].
#[derive(Debug)]
pub struct InMemoryRegistry {
    records: Vec<RecordType>,
    record_index: HashMap<String, usize>,
    enums: HashMap<String, EnumType>,
    tags: BTreeSet<DomainTag>,
    classes: HashMap<String, Option<String>>,
    objects: HashMap<String, ObjectRef>,
    generation: u64,
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRegistry {
    /// Create a registry holding only the built-in wrapper type.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            records: Vec::new(),
            record_index: HashMap::new(),
            enums: HashMap::new(),
            tags: BTreeSet::new(),
            classes: HashMap::new(),
            objects: HashMap::new(),
            generation: 0,
        };
        registry.insert_record(RecordType::polymorphic_wrapper(INSTANCED_RECORD, None));
        registry
    }

    /// Register a record type. Its parent, if any, must already be registered.
    pub fn register_record(&mut self, mut record: RecordType) -> Result<(), RegistryError> {
        if self.record_index.contains_key(record.name()) {
            return Err(RegistryError::DuplicateType(record.name().to_string()));
        }
        if let Some(parent_name) = record.parent() {
            let parent = self
                .record_type(parent_name)
                .ok_or_else(|| RegistryError::UnknownParent {
                    child: record.name().to_string(),
                    parent: parent_name.to_string(),
                })?;
            if let Some(dup) = record.fields().iter().find(|f| parent.field(&f.name).is_some()) {
                return Err(RegistryError::DuplicateField {
                    record: record.name().to_string(),
                    field: dup.name.clone(),
                });
            }
            let parent = parent.clone();
            record.inherit_from(&parent);
        }
        self.insert_record(record);
        Ok(())
    }

    fn insert_record(&mut self, record: RecordType) {
        log::debug!("registered record type {}", record.name());
        self.record_index
            .insert(record.name().to_string(), self.records.len());
        self.records.push(record);
        self.generation += 1;
    }

    /// Register an enum type.
    pub fn register_enum(&mut self, enum_type: EnumType) -> Result<(), RegistryError> {
        if self.enums.contains_key(&enum_type.name) {
            return Err(RegistryError::DuplicateType(enum_type.name.clone()));
        }
        self.enums.insert(enum_type.name.clone(), enum_type);
        Ok(())
    }

    /// Register a dotted tag and all of its ancestors.
    pub fn register_tag(&mut self, name: &str) -> Result<(), RegistryError> {
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(RegistryError::InvalidTag(name.to_string()));
        }
        let mut end = 0;
        for segment in name.split('.') {
            end += segment.len();
            self.tags.insert(DomainTag::new(&name[..end]));
            end += 1;
        }
        Ok(())
    }

    /// Register an object class, optionally deriving from `parent`.
    pub fn register_class(&mut self, name: impl Into<String>, parent: Option<&str>) {
        self.classes.insert(name.into(), parent.map(str::to_string));
    }

    /// Register a loadable object.
    pub fn register_object(
        &mut self,
        path: impl Into<String>,
        class: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let path = path.into();
        let class = class.into();
        if !self.classes.contains_key(&class) {
            return Err(RegistryError::UnknownClass { path, class });
        }
        self.objects
            .insert(path.clone(), ObjectRef { path, class });
        Ok(())
    }

    /// Number of registered record types, including the built-in wrapper.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    fn class_derives(&self, class: &str, base: &str) -> bool {
        let mut current = Some(class);
        for _ in 0..=self.classes.len() {
            match current {
                Some(c) if c == base => return true,
                Some(c) => current = self.classes.get(c).and_then(|p| p.as_deref()),
                None => return false,
            }
        }
        false
    }
}

impl TypeRegistry for InMemoryRegistry {
    fn record_type(&self, name: &str) -> Option<&RecordType> {
        self.record_index.get(name).map(|&i| &self.records[i])
    }

    fn record_types(&self) -> Box<dyn Iterator<Item = &RecordType> + '_> {
        Box::new(self.records.iter())
    }

    fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enums.get(name)
    }

    fn resolve_tag(&self, name: &str) -> Option<DomainTag> {
        let tag = DomainTag::new(name);
        self.tags.contains(&tag).then_some(tag)
    }

    fn tags(&self) -> Box<dyn Iterator<Item = &DomainTag> + '_> {
        Box::new(self.tags.iter())
    }

    fn load_object(&self, path: &str, class: &str) -> Option<ObjectRef> {
        let object = self.objects.get(path)?;
        if self.class_derives(&object.class, class) {
            Some(object.clone())
        } else {
            log::debug!(
                "object {} is a {}, not a {}",
                path,
                object.class,
                class
            );
            None
        }
    }

    fn path_of(&self, object: &ObjectRef) -> Option<String> {
        self.objects
            .get(&object.path)
            .map(|o| o.path.clone())
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}
