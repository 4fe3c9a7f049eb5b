// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory tables and config assets.
//!
//! A [`Catalog`] holds row tables (plain or composite), curve tables, string
//! tables and data assets, each addressed by its object path. Rows and assets
//! store [`RecordInstance`]s of a registered record type.

use crate::layered::{resolve_row_source, TableGraph};
use crate::reflect::RecordInstance;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Catalog mutation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("path '{0}' is already in use")]
    DuplicatePath(String),

    #[error("row '{row}' already exists in '{table}'")]
    RowExists { table: String, row: String },

    #[error("table '{0}' is composite and owns no rows")]
    CompositeTable(String),
}

/// A named row.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub name: String,
    pub data: RecordInstance,
}

/// Where a table's rows come from.
#[derive(Debug, Clone, PartialEq)]
pub enum TableLayout {
    /// The table owns its rows.
    Plain(Vec<Row>),
    /// The table overlays parent tables; later parents win.
    Composite(Vec<String>),
}

/// A row table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    path: String,
    row_type: String,
    layout: TableLayout,
}

impl DataTable {
    pub fn plain(path: impl Into<String>, row_type: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            row_type: row_type.into(),
            layout: TableLayout::Plain(Vec::new()),
        }
    }

    pub fn composite(
        path: impl Into<String>,
        row_type: impl Into<String>,
        parents: Vec<String>,
    ) -> Self {
        Self {
            path: path.into(),
            row_type: row_type.into(),
            layout: TableLayout::Composite(parents),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Short name derived from the path.
    pub fn name(&self) -> &str {
        object_name(&self.path)
    }

    pub fn row_type(&self) -> &str {
        &self.row_type
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.layout, TableLayout::Composite(_))
    }

    pub fn parent_paths(&self) -> Option<&[String]> {
        match &self.layout {
            TableLayout::Composite(parents) => Some(parents.as_slice()),
            TableLayout::Plain(_) => None,
        }
    }

    /// Own rows; empty for a composite table.
    pub fn rows(&self) -> &[Row] {
        match &self.layout {
            TableLayout::Plain(rows) => rows.as_slice(),
            TableLayout::Composite(_) => &[],
        }
    }

    pub fn row(&self, name: &str) -> Option<&RecordInstance> {
        self.rows().iter().find(|r| r.name == name).map(|r| &r.data)
    }

    pub fn row_mut(&mut self, name: &str) -> Option<&mut RecordInstance> {
        match &mut self.layout {
            TableLayout::Plain(rows) => rows
                .iter_mut()
                .find(|r| r.name == name)
                .map(|r| &mut r.data),
            TableLayout::Composite(_) => None,
        }
    }

    pub fn contains_row(&self, name: &str) -> bool {
        self.row(name).is_some()
    }

    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.rows().iter().map(|r| r.name.as_str())
    }

    /// Append a row.
    pub fn add_row(&mut self, name: impl Into<String>, data: RecordInstance) -> Result<(), CatalogError> {
        let name = name.into();
        let path = self.path.clone();
        let TableLayout::Plain(rows) = &mut self.layout else {
            return Err(CatalogError::CompositeTable(path));
        };
        if rows.iter().any(|r| r.name == name) {
            return Err(CatalogError::RowExists { table: path, row: name });
        }
        rows.push(Row { name, data });
        Ok(())
    }

    /// Remove a row, returning its data.
    pub fn remove_row(&mut self, name: &str) -> Option<RecordInstance> {
        let TableLayout::Plain(rows) = &mut self.layout else {
            return None;
        };
        let index = rows.iter().position(|r| r.name == name)?;
        Some(rows.remove(index).data)
    }

    /// Drop every row of a plain table.
    pub fn clear_rows(&mut self) {
        if let TableLayout::Plain(rows) = &mut self.layout {
            rows.clear();
        }
    }
}

/// A standalone config asset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataAsset {
    path: String,
    data: RecordInstance,
}

impl DataAsset {
    pub fn new(path: impl Into<String>, data: RecordInstance) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        object_name(&self.path)
    }

    /// Record type of the asset's properties.
    pub fn class(&self) -> &str {
        self.data.record_type()
    }

    pub fn data(&self) -> &RecordInstance {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut RecordInstance {
        &mut self.data
    }
}

/// Keys closer than this in time are the same key.
pub const KEY_TIME_TOLERANCE: f32 = 1.0e-4;

/// How the curves of a curve table are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveMode {
    /// Per-key interpolation.
    #[default]
    Rich,
    /// One interpolation for the whole curve.
    Simple,
}

/// Interpolation between a key and the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpMode {
    #[default]
    Linear,
    Constant,
    Cubic,
}

impl InterpMode {
    /// Wire name, e.g. `RCIM_Linear`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "RCIM_Linear",
            Self::Constant => "RCIM_Constant",
            Self::Cubic => "RCIM_Cubic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CurveKey {
    pub time: f32,
    pub value: f32,
    #[serde(default, rename = "interp_mode")]
    pub interp: InterpMode,
}

/// A named curve; keys stay sorted by time.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub name: String,
    keys: Vec<CurveKey>,
}

impl Curve {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            keys: Vec::new(),
        }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    /// Drop every key.
    pub fn reset(&mut self) {
        self.keys.clear();
    }

    /// Set the value of the key at `time`, adding a linear key when none
    /// lies within [`KEY_TIME_TOLERANCE`].
    pub fn update_or_add_key(&mut self, time: f32, value: f32) {
        self.insert_key(CurveKey {
            time,
            value,
            interp: InterpMode::Linear,
        });
    }

    fn insert_key(&mut self, key: CurveKey) {
        if let Some(existing) = self
            .keys
            .iter_mut()
            .find(|k| (k.time - key.time).abs() < KEY_TIME_TOLERANCE)
        {
            existing.value = key.value;
            return;
        }
        let index = self.keys.partition_point(|k| k.time < key.time);
        self.keys.insert(index, key);
    }
}

/// Named float curves sampled by time.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveTable {
    path: String,
    mode: CurveMode,
    curves: Vec<Curve>,
}

impl CurveTable {
    pub fn new(path: impl Into<String>, mode: CurveMode) -> Self {
        Self {
            path: path.into(),
            mode,
            curves: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        object_name(&self.path)
    }

    pub fn mode(&self) -> CurveMode {
        self.mode
    }

    /// `RichCurve`, `SimpleCurve`, or `Empty` for a table without rows.
    pub fn curve_type(&self) -> &'static str {
        match (self.curves.is_empty(), self.mode) {
            (true, _) => "Empty",
            (false, CurveMode::Rich) => "RichCurve",
            (false, CurveMode::Simple) => "SimpleCurve",
        }
    }

    pub fn curves(&self) -> &[Curve] {
        &self.curves
    }

    pub fn curve(&self, row: &str) -> Option<&Curve> {
        self.curves.iter().find(|c| c.name == row)
    }

    pub fn curve_mut(&mut self, row: &str) -> Option<&mut Curve> {
        self.curves.iter_mut().find(|c| c.name == row)
    }

    /// Append a curve built from `keys`.
    pub fn add_curve(
        &mut self,
        name: impl Into<String>,
        keys: impl IntoIterator<Item = CurveKey>,
    ) -> Result<(), CatalogError> {
        let name = name.into();
        if self.curve(&name).is_some() {
            return Err(CatalogError::RowExists {
                table: self.path.clone(),
                row: name,
            });
        }
        let mut curve = Curve::new(name);
        for key in keys {
            curve.insert_key(key);
        }
        self.curves.push(curve);
        Ok(())
    }
}

/// Localized source strings under one namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct StringTable {
    path: String,
    namespace: String,
    entries: Vec<(String, String)>,
}

impl StringTable {
    pub fn new(path: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        object_name(&self.path)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// `(key, source string)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or replace the source string of `key`.
    pub fn set(&mut self, key: impl Into<String>, text: impl Into<String>) {
        let key = key.into();
        let text = text.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((key, text)),
        }
    }
}

/// Tables and assets of one host, in insertion order.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: Vec<DataTable>,
    table_index: HashMap<String, usize>,
    assets: Vec<DataAsset>,
    asset_index: HashMap<String, usize>,
    curve_tables: Vec<CurveTable>,
    curve_index: HashMap<String, usize>,
    string_tables: Vec<StringTable>,
    string_index: HashMap<String, usize>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: DataTable) -> Result<(), CatalogError> {
        if self.table_index.contains_key(table.path()) {
            return Err(CatalogError::DuplicatePath(table.path().to_string()));
        }
        log::debug!("catalog: added table {} ({})", table.path(), table.row_type());
        self.table_index
            .insert(table.path().to_string(), self.tables.len());
        self.tables.push(table);
        Ok(())
    }

    pub fn add_asset(&mut self, asset: DataAsset) -> Result<(), CatalogError> {
        if self.asset_index.contains_key(asset.path()) {
            return Err(CatalogError::DuplicatePath(asset.path().to_string()));
        }
        self.asset_index
            .insert(asset.path().to_string(), self.assets.len());
        self.assets.push(asset);
        Ok(())
    }

    pub fn add_curve_table(&mut self, table: CurveTable) -> Result<(), CatalogError> {
        if self.curve_index.contains_key(table.path()) {
            return Err(CatalogError::DuplicatePath(table.path().to_string()));
        }
        log::debug!("catalog: added curve table {} ({} rows)", table.path(), table.curves().len());
        self.curve_index
            .insert(table.path().to_string(), self.curve_tables.len());
        self.curve_tables.push(table);
        Ok(())
    }

    pub fn add_string_table(&mut self, table: StringTable) -> Result<(), CatalogError> {
        if self.string_index.contains_key(table.path()) {
            return Err(CatalogError::DuplicatePath(table.path().to_string()));
        }
        self.string_index
            .insert(table.path().to_string(), self.string_tables.len());
        self.string_tables.push(table);
        Ok(())
    }

    pub fn tables(&self) -> &[DataTable] {
        &self.tables
    }

    pub fn table(&self, path: &str) -> Option<&DataTable> {
        self.table_index.get(path).map(|&i| &self.tables[i])
    }

    pub fn table_mut(&mut self, path: &str) -> Option<&mut DataTable> {
        let index = *self.table_index.get(path)?;
        self.tables.get_mut(index)
    }

    pub fn assets(&self) -> &[DataAsset] {
        &self.assets
    }

    pub fn asset(&self, path: &str) -> Option<&DataAsset> {
        self.asset_index.get(path).map(|&i| &self.assets[i])
    }

    pub fn asset_mut(&mut self, path: &str) -> Option<&mut DataAsset> {
        let index = *self.asset_index.get(path)?;
        self.assets.get_mut(index)
    }

    pub fn curve_tables(&self) -> &[CurveTable] {
        &self.curve_tables
    }

    pub fn curve_table(&self, path: &str) -> Option<&CurveTable> {
        self.curve_index.get(path).map(|&i| &self.curve_tables[i])
    }

    pub fn curve_table_mut(&mut self, path: &str) -> Option<&mut CurveTable> {
        let index = *self.curve_index.get(path)?;
        self.curve_tables.get_mut(index)
    }

    pub fn string_tables(&self) -> &[StringTable] {
        &self.string_tables
    }

    pub fn string_table(&self, path: &str) -> Option<&StringTable> {
        self.string_index.get(path).map(|&i| &self.string_tables[i])
    }

    pub fn string_table_mut(&mut self, path: &str) -> Option<&mut StringTable> {
        let index = *self.string_index.get(path)?;
        self.string_tables.get_mut(index)
    }

    /// Plain table providing `row` when read through `table`, with the row.
    ///
    /// For a plain table this is the table itself.
    pub fn effective_row(&self, table: &str, row: &str) -> Option<(&DataTable, &RecordInstance)> {
        let target = self.table(table)?;
        let source = if target.is_composite() {
            self.table(&resolve_row_source(self, table, row)?)?
        } else {
            target
        };
        source.row(row).map(|data| (source, data))
    }
}

impl TableGraph for Catalog {
    fn parents(&self, table: &str) -> Option<&[String]> {
        self.table(table)?.parent_paths()
    }

    fn owns_row(&self, table: &str, row: &str) -> bool {
        self.table(table).is_some_and(|t| t.contains_row(row))
    }

    fn row_names(&self, table: &str) -> Vec<String> {
        self.table(table)
            .map(|t| t.row_names().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// `DT_Items` for `/Game/Data/DT_Items.DT_Items`.
fn object_name(path: &str) -> &str {
    let leaf = path.rsplit('/').next().unwrap_or(path);
    leaf.split('.').next().unwrap_or(leaf)
}
