// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON world files.
//!
//! A world declares the reflection data (enums, record types, tags, object
//! classes and objects) plus the tables and assets of a host. Curve and
//! string tables carry plain numbers and text and bypass the converter. Row and asset
//! data is written through the conversion engine, so a world file exercises
//! the same code path as a client write.
//!
//! ```json
//! {
//!   "enums":   [{ "name": "Rarity", "values": ["Common", "Rare"] }],
//!   "records": [{ "name": "Item", "fields": [{ "name": "name", "kind": "string" }] }],
//!   "tags":    ["Weapon.Melee"],
//!   "tables":  [{ "path": "/Game/DT_Items", "row_type": "Item",
//!                 "rows": [{ "row_name": "sword", "row_data": { "name": "Sword" } }] }]
//! }
//! ```

use crate::catalog::{
    Catalog, CatalogError, CurveKey, CurveMode, CurveTable, DataAsset, DataTable, StringTable,
};
use crate::convert::Converter;
use crate::reflect::{
    EnumType, FieldKind, InMemoryRegistry, ParseKindError, RecordInstance, RecordTypeBuilder,
    RegistryError, TypeRegistry,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// World loading errors.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record '{record}': {source}")]
    Kind {
        record: String,
        #[source]
        source: ParseKindError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("'{path}' uses unregistered record type '{type_name}'")]
    UnknownRecordType { path: String, type_name: String },

    #[error("'{path}': data for '{name}' is not a JSON object")]
    InvalidData { path: String, name: String },
}

/// Declarative world description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct World {
    pub enums: Vec<EnumSpec>,
    pub records: Vec<RecordSpec>,
    pub tags: Vec<String>,
    pub classes: Vec<ClassSpec>,
    pub objects: Vec<ObjectSpec>,
    pub tables: Vec<TableSpec>,
    pub assets: Vec<AssetSpec>,
    pub curve_tables: Vec<CurveTableSpec>,
    pub string_tables: Vec<StringTableSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnumSpec {
    pub name: String,
    pub values: Vec<EnumValueSpec>,
}

/// Enumerator given by name (sequential value) or with an explicit value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EnumValueSpec {
    Name(String),
    Valued { name: String, value: i64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Textual kind, e.g. `map<symbol, record<Stats>>`.
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassSpec {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectSpec {
    pub path: String,
    pub class: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableSpec {
    pub path: String,
    pub row_type: String,
    #[serde(default)]
    pub rows: Vec<RowSpec>,
    /// Parent table paths; makes the table composite.
    #[serde(default)]
    pub parents: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RowSpec {
    pub row_name: String,
    pub row_data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetSpec {
    pub path: String,
    pub class: String,
    #[serde(default)]
    pub properties: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurveTableSpec {
    pub path: String,
    #[serde(default)]
    pub mode: CurveMode,
    #[serde(default)]
    pub rows: Vec<CurveRowSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurveRowSpec {
    pub row_name: String,
    #[serde(default)]
    pub keys: Vec<CurveKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StringTableSpec {
    pub path: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub entries: Vec<StringEntrySpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StringEntrySpec {
    pub key: String,
    pub text: String,
}

/// A loaded world.
#[derive(Debug)]
pub struct Fixture {
    pub registry: InMemoryRegistry,
    pub catalog: Catalog,
    /// Conversion warnings raised while applying rows and assets.
    pub warnings: Vec<String>,
}

impl Fixture {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, FixtureError> {
        let world: World = serde_json::from_str(content)?;
        world.build()
    }
}

impl World {
    /// Register the world's types and populate its catalog.
    pub fn build(self) -> Result<Fixture, FixtureError> {
        let registry = self.build_registry()?;
        let mut catalog = Catalog::new();
        let mut warnings = Vec::new();
        let converter = Converter::new(&registry);

        for table in self.tables {
            if registry.record_type(&table.row_type).is_none() {
                return Err(FixtureError::UnknownRecordType {
                    path: table.path,
                    type_name: table.row_type,
                });
            }
            let built = match table.parents {
                Some(parents) => DataTable::composite(table.path, table.row_type, parents),
                None => {
                    let mut plain = DataTable::plain(table.path, table.row_type);
                    for row in table.rows {
                        let data = apply(
                            &converter,
                            plain.path(),
                            Some(&row.row_name),
                            plain.row_type(),
                            &row.row_data,
                            &mut warnings,
                        )?;
                        plain.add_row(row.row_name, data)?;
                    }
                    plain
                }
            };
            catalog.add_table(built)?;
        }

        for asset in self.assets {
            if registry.record_type(&asset.class).is_none() {
                return Err(FixtureError::UnknownRecordType {
                    path: asset.path,
                    type_name: asset.class,
                });
            }
            let properties = if asset.properties.is_null() {
                Value::Object(serde_json::Map::new())
            } else {
                asset.properties
            };
            let data = apply(
                &converter,
                &asset.path,
                None,
                &asset.class,
                &properties,
                &mut warnings,
            )?;
            catalog.add_asset(DataAsset::new(asset.path, data))?;
        }

        for spec in self.curve_tables {
            let mut table = CurveTable::new(spec.path, spec.mode);
            for row in spec.rows {
                table.add_curve(row.row_name, row.keys)?;
            }
            catalog.add_curve_table(table)?;
        }

        for spec in self.string_tables {
            let mut table = StringTable::new(spec.path, spec.namespace);
            for entry in spec.entries {
                table.set(entry.key, entry.text);
            }
            catalog.add_string_table(table)?;
        }

        log::debug!(
            "fixture loaded: {} record types, {} tables, {} assets, {} curve tables, {} string tables, {} warnings",
            registry.record_count(),
            catalog.tables().len(),
            catalog.assets().len(),
            catalog.curve_tables().len(),
            catalog.string_tables().len(),
            warnings.len()
        );
        Ok(Fixture {
            registry,
            catalog,
            warnings,
        })
    }

    fn build_registry(&self) -> Result<InMemoryRegistry, FixtureError> {
        let mut registry = InMemoryRegistry::new();

        for spec in &self.enums {
            // Unvalued enumerators continue from the previous value.
            let mut next = 0;
            let pairs: Vec<(String, i64)> = spec
                .values
                .iter()
                .map(|v| {
                    let value = match v {
                        EnumValueSpec::Name(_) => next,
                        EnumValueSpec::Valued { value, .. } => *value,
                    };
                    next = value + 1;
                    (v.name().to_string(), value)
                })
                .collect();
            let enum_type = EnumType::with_values(spec.name.clone(), pairs);
            registry.register_enum(enum_type)?;
        }

        // Parents must be registered before their children.
        for spec in &self.records {
            let mut builder = RecordTypeBuilder::new(spec.name.clone());
            if let Some(parent) = &spec.parent {
                builder = builder.parent(parent.clone());
            }
            for field in &spec.fields {
                let kind: FieldKind = field.kind.parse().map_err(|source| FixtureError::Kind {
                    record: spec.name.clone(),
                    source,
                })?;
                builder = builder.field(field.name.clone(), kind);
            }
            registry.register_record(builder.build())?;
        }

        for tag in &self.tags {
            registry.register_tag(tag)?;
        }
        for class in &self.classes {
            registry.register_class(class.name.clone(), class.parent.as_deref());
        }
        for object in &self.objects {
            registry.register_object(object.path.clone(), object.class.clone())?;
        }
        Ok(registry)
    }
}

impl EnumValueSpec {
    fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Valued { name, .. } => name,
        }
    }
}

/// Build an instance of `type_name` from `data`. `row` names the row when
/// the owner is a table.
fn apply(
    converter: &Converter<'_>,
    owner: &str,
    row: Option<&str>,
    type_name: &str,
    data: &Value,
    warnings: &mut Vec<String>,
) -> Result<RecordInstance, FixtureError> {
    let invalid = || FixtureError::InvalidData {
        path: owner.to_string(),
        name: row.unwrap_or(owner).to_string(),
    };
    let mut instance = converter.instantiate(type_name).ok_or_else(invalid)?;
    let mut raised = Vec::new();
    if !converter.value_to_record(data, type_name, &mut instance, &mut raised) {
        return Err(invalid());
    }
    let label = match row {
        Some(row) => format!("{}/{}", owner, row),
        None => owner.to_string(),
    };
    warnings.extend(raised.iter().map(|w| format!("{}: {}", label, w)));
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InterpMode;
    use crate::reflect::FieldValue;

    const WORLD: &str = r#"{
        "enums": [
            { "name": "Rarity", "values": ["Common", "Rare"] },
            { "name": "Flags", "values": [{ "name": "None", "value": 0 }, { "name": "Big", "value": 8 }, "Bigger"] }
        ],
        "records": [
            { "name": "Effect", "fields": [{ "name": "magnitude", "kind": "float32" }] },
            { "name": "Burn", "parent": "Effect", "fields": [{ "name": "duration", "kind": "float64" }] },
            { "name": "Item", "fields": [
                { "name": "name", "kind": "string" },
                { "name": "rarity", "kind": "enum<Rarity>" },
                { "name": "effect", "kind": "polymorphic<Effect>" }
            ] },
            { "name": "Settings", "fields": [{ "name": "volume", "kind": "float32" }] }
        ],
        "tags": ["Weapon.Melee"],
        "classes": [{ "name": "Texture" }],
        "objects": [{ "path": "/Game/Tex/Icon", "class": "Texture" }],
        "tables": [
            { "path": "/Game/DT_Base", "row_type": "Item", "rows": [
                { "row_name": "sword", "row_data": { "name": "Sword", "rarity": "Rare", "bogus": 1 } }
            ] },
            { "path": "/Game/DT_All", "row_type": "Item", "parents": ["/Game/DT_Base"] }
        ],
        "assets": [{ "path": "/Game/Settings", "class": "Settings", "properties": { "volume": 0.5 } }],
        "curve_tables": [{ "path": "/Game/CT_Xp", "mode": "simple", "rows": [
            { "row_name": "xp", "keys": [{ "time": 2.0, "value": 20.0 }, { "time": 1.0, "value": 10.0, "interp_mode": "constant" }] }
        ] }],
        "string_tables": [{ "path": "/Game/ST_UI", "namespace": "UI", "entries": [{ "key": "ok", "text": "OK" }] }]
    }"#;

    #[test]
    fn test_world_loads() {
        let fixture = Fixture::from_json(WORLD).expect("world");
        let registry = &fixture.registry;
        assert!(registry.record_type("Burn").is_some());
        assert!(registry.is_descendant_of("Burn", "Effect"));
        assert_eq!(registry.enum_type("Flags").and_then(|e| e.value_of("Bigger")), Some(9));
        assert!(registry.resolve_tag("Weapon").is_some());

        let sword = fixture
            .catalog
            .table("/Game/DT_Base")
            .and_then(|t| t.row("sword"))
            .expect("sword");
        assert_eq!(
            sword.field(registry, "name"),
            Some(&FieldValue::String("Sword".into()))
        );
        assert_eq!(sword.field(registry, "rarity"), Some(&FieldValue::Enum(1)));
        assert!(fixture.catalog.table("/Game/DT_All").expect("composite").is_composite());
        assert_eq!(fixture.catalog.assets().len(), 1);

        let curves = fixture.catalog.curve_table("/Game/CT_Xp").expect("curve table");
        assert_eq!(curves.curve_type(), "SimpleCurve");
        let keys = curves.curve("xp").expect("xp").keys();
        assert_eq!(keys[0].time, 1.0);
        assert_eq!(keys[0].interp, InterpMode::Constant);
        assert_eq!(keys[1].interp, InterpMode::Linear);
        let strings = fixture.catalog.string_table("/Game/ST_UI").expect("string table");
        assert_eq!(strings.namespace(), "UI");
        assert_eq!(strings.get("ok"), Some("OK"));

        assert_eq!(fixture.warnings.len(), 1);
        assert!(fixture.warnings[0].starts_with("/Game/DT_Base/sword: "));
    }

    #[test]
    fn test_world_errors() {
        let bad_kind = r#"{ "records": [{ "name": "X", "fields": [{ "name": "a", "kind": "map<int32>" }] }] }"#;
        assert!(matches!(Fixture::from_json(bad_kind), Err(FixtureError::Kind { .. })));

        let orphan = r#"{ "records": [{ "name": "X", "parent": "Missing" }] }"#;
        assert!(matches!(Fixture::from_json(orphan), Err(FixtureError::Registry(_))));

        let unknown_row_type = r#"{ "tables": [{ "path": "/T", "row_type": "Nope" }] }"#;
        assert!(matches!(
            Fixture::from_json(unknown_row_type),
            Err(FixtureError::UnknownRecordType { .. })
        ));

        let not_object = r#"{ "records": [{ "name": "X" }],
            "tables": [{ "path": "/T", "row_type": "X", "rows": [{ "row_name": "a", "row_data": 3 }] }] }"#;
        assert!(matches!(
            Fixture::from_json(not_object),
            Err(FixtureError::InvalidData { .. })
        ));

        assert!(matches!(Fixture::from_json("{"), Err(FixtureError::Json(_))));

        let repeated_curve = r#"{ "curve_tables": [{ "path": "/C", "rows": [{ "row_name": "a" }, { "row_name": "a" }] }] }"#;
        assert!(matches!(
            Fixture::from_json(repeated_curve),
            Err(FixtureError::Catalog(CatalogError::RowExists { .. }))
        ));
    }
}
