// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Command implementations.
//!
//! Every operation takes its JSON `params` object and returns either a
//! [`CommandResult`] (response data plus conversion warnings) or an
//! [`OpError`] that maps onto a protocol [`ErrorCode`].

pub mod curve_table;
pub mod data_asset;
pub mod datatable;
pub mod localization;
pub mod overview;
pub mod tags;

use crate::catalog::{Catalog, DataTable};
use crate::config::BridgeConfig;
use crate::convert::{Converter, Warning};
use crate::layered::effective_row_names;
use crate::protocol::ErrorCode;
use crate::reflect::{RecordInstance, TypeRegistry};
use crate::subtypes::SubtypeIndex;
use serde_json::{json, Map, Value};
use thiserror::Error;

/// Successful command output.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
}

impl CommandResult {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(data: Value, warnings: Vec<String>) -> Self {
        Self { data, warnings }
    }
}

/// Command failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpError {
    #[error("Missing required param: {0}")]
    MissingParam(&'static str),

    #[error("{0}")]
    InvalidField(String),

    #[error("{0}")]
    InvalidValue(String),

    #[error("DataTable not found: {0}")]
    TableNotFound(String),

    #[error("Row not found: {0}")]
    RowNotFound(String),

    #[error("Row '{row}' not found in any source table of composite '{table}'")]
    RowNotInComposite { table: String, row: String },

    #[error("DataAsset not found: {0}")]
    AssetNotFound(String),

    #[error("CurveTable not found: {0}")]
    CurveTableNotFound(String),

    #[error("Row '{0}' not found in CurveTable")]
    CurveRowNotFound(String),

    #[error("StringTable not found: {0}")]
    StringTableNotFound(String),

    #[error("Row already exists: {0}")]
    RowAlreadyExists(String),

    #[error("{0}")]
    InvalidStructType(String),

    #[error("{0}")]
    Serialization(String),

    #[error("Cannot write rows to composite table '{table}'. Write to one of its source tables instead.")]
    CompositeWriteBlocked { table: String, parents: Vec<String> },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Batch size {size} exceeds maximum of {max}")]
    BatchLimitExceeded { size: usize, max: usize },

    #[error("Nested batch commands are not allowed")]
    BatchRecursionBlocked,

    #[error("{0}")]
    InvalidRequest(String),
}

impl OpError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingParam(_) | Self::InvalidField(_) => ErrorCode::InvalidField,
            Self::InvalidValue(_) => ErrorCode::InvalidValue,
            Self::TableNotFound(_) | Self::CurveTableNotFound(_) => ErrorCode::TableNotFound,
            Self::RowNotFound(_) | Self::RowNotInComposite { .. } | Self::CurveRowNotFound(_) => {
                ErrorCode::RowNotFound
            }
            Self::AssetNotFound(_) | Self::StringTableNotFound(_) => ErrorCode::AssetNotFound,
            Self::RowAlreadyExists(_) => ErrorCode::RowAlreadyExists,
            Self::InvalidStructType(_) => ErrorCode::InvalidStructType,
            Self::Serialization(_) => ErrorCode::SerializationError,
            Self::CompositeWriteBlocked { .. } => ErrorCode::CompositeWriteBlocked,
            Self::UnknownCommand(_) => ErrorCode::UnknownCommand,
            Self::BatchLimitExceeded { .. } => ErrorCode::BatchLimitExceeded,
            Self::BatchRecursionBlocked => ErrorCode::BatchRecursionBlocked,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
        }
    }

    /// Structured error details, if any.
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::CompositeWriteBlocked { parents, .. } => Some(json!({ "parent_tables": parents })),
            _ => None,
        }
    }
}

pub type OpResult = Result<CommandResult, OpError>;

/// State an operation runs against.
pub struct OpContext<'a> {
    pub registry: &'a dyn TypeRegistry,
    pub subtypes: &'a SubtypeIndex,
    pub catalog: &'a mut Catalog,
    pub config: &'a BridgeConfig,
}

impl<'a> OpContext<'a> {
    /// Converter configured from the bridge settings.
    pub fn converter(&self) -> Converter<'a> {
        Converter::with_options(self.registry, self.config.convert_options())
    }

    pub(crate) fn table(&self, path: &str) -> Result<&DataTable, OpError> {
        self.catalog
            .table(path)
            .ok_or_else(|| OpError::TableNotFound(path.to_string()))
    }

    /// Rows visible through `table`: its own rows, or the effective rows
    /// of a composite.
    pub(crate) fn visible_rows<'s>(
        &'s self,
        table: &'s DataTable,
    ) -> Vec<(String, &'s RecordInstance)> {
        if !table.is_composite() {
            return table
                .rows()
                .iter()
                .map(|row| (row.name.clone(), &row.data))
                .collect();
        }
        effective_row_names(&*self.catalog, table.path())
            .into_iter()
            .filter_map(|name| {
                let (_, data) = self.catalog.effective_row(table.path(), &name)?;
                Some((name, data))
            })
            .collect()
    }

    /// Error for a write against a composite table.
    pub(crate) fn composite_blocked(table: &DataTable) -> OpError {
        OpError::CompositeWriteBlocked {
            table: table.name().to_string(),
            parents: table.parent_paths().map(<[String]>::to_vec).unwrap_or_default(),
        }
    }

    pub(crate) fn require_record_type(&self, type_name: &str) -> Result<(), OpError> {
        if self.registry.record_type(type_name).is_none() {
            return Err(OpError::InvalidStructType(format!(
                "Record type not registered: {}",
                type_name
            )));
        }
        Ok(())
    }
}

pub(crate) fn required_str<'p>(params: &'p Map<String, Value>, key: &'static str) -> Result<&'p str, OpError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or(OpError::MissingParam(key))
}

pub(crate) fn optional_str<'p>(params: &'p Map<String, Value>, key: &str) -> Option<&'p str> {
    params.get(key).and_then(Value::as_str)
}

pub(crate) fn optional_bool(params: &Map<String, Value>, key: &str, default: bool) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Integer parameter; fractional numbers are truncated.
pub(crate) fn optional_int(params: &Map<String, Value>, key: &str) -> Option<i64> {
    let value = params.get(key)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

pub(crate) fn required_object<'p>(
    params: &'p Map<String, Value>,
    key: &'static str,
) -> Result<&'p Map<String, Value>, OpError> {
    params
        .get(key)
        .and_then(Value::as_object)
        .ok_or(OpError::MissingParam(key))
}

/// String members of an array parameter; other members are ignored.
pub(crate) fn string_list(params: &Map<String, Value>, key: &str) -> Vec<String> {
    params
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn warning_strings(warnings: &[Warning]) -> Vec<String> {
    warnings.iter().map(ToString::to_string).collect()
}

/// Insert `warnings` into `data` when non-empty.
pub(crate) fn attach_warnings(data: &mut Map<String, Value>, warnings: &[String]) {
    if !warnings.is_empty() {
        data.insert("warnings".into(), json!(warnings));
    }
}

/// Case-insensitive glob matching (supports * and ?).
///
/// Runs in O(pattern * text): on a mismatch only the most recent `*` is
/// retried, one text position further.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut pi, mut ti) = (0, 0);
    // (pattern index after the star, text index the star currently absorbs up to)
    let mut star: Option<(usize, usize)> = None;

    while ti < text.len() {
        match pattern.get(pi) {
            Some('*') => {
                pi += 1;
                star = Some((pi, ti));
            }
            Some('?') => {
                pi += 1;
                ti += 1;
            }
            Some(&c) if chars_eq(c, text[ti]) => {
                pi += 1;
                ti += 1;
            }
            _ => match star {
                Some((star_pi, star_ti)) => {
                    pi = star_pi;
                    ti = star_ti + 1;
                    star = Some((star_pi, ti));
                }
                None => return false,
            },
        }
    }
    pattern[pi..].iter().all(|&c| c == '*')
}

fn chars_eq(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("Sword_*", "Sword_Iron"));
        assert!(glob_match("sword_*", "Sword_Iron"));
        assert!(glob_match("*_??", "Axe_02"));
        assert!(!glob_match("*_??", "Axe_2"));
        assert!(glob_match("*", ""));
        assert!(!glob_match("Bow", "Bows"));
        assert!(glob_match("*a*b*", "xxaYYbzz"));
        assert!(glob_match("a*b?c", "aXXbYc"));
        assert!(!glob_match("a*b?c", "aXXbc"));
    }

    #[test]
    fn test_glob_many_stars_stays_fast() {
        let start = std::time::Instant::now();
        for stars in [4, 8, 16, 32] {
            let pattern = format!("{}b", "*a".repeat(stars));
            assert!(!glob_match(&pattern, &"a".repeat(200)));
            assert!(glob_match(&pattern, &format!("{}b", "a".repeat(200))));
        }
        assert!(start.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_error_codes_and_details() {
        let err = OpError::CompositeWriteBlocked {
            table: "DT_All".into(),
            parents: vec!["/Game/DT_A".into()],
        };
        assert_eq!(err.code(), ErrorCode::CompositeWriteBlocked);
        assert_eq!(err.details(), Some(json!({"parent_tables": ["/Game/DT_A"]})));
        assert_eq!(OpError::MissingParam("table_path").code(), ErrorCode::InvalidField);
        assert_eq!(
            OpError::MissingParam("table_path").to_string(),
            "Missing required param: table_path"
        );
        assert!(OpError::RowNotFound("x".into()).details().is_none());
    }

    #[test]
    fn test_param_helpers() {
        let params = json!({"name": "a", "n": 3.9, "flag": true, "list": ["x", 1, "y"]});
        let params = params.as_object().expect("object");
        assert_eq!(required_str(params, "name"), Ok("a"));
        assert_eq!(required_str(params, "missing"), Err(OpError::MissingParam("missing")));
        assert_eq!(optional_int(params, "n"), Some(3));
        assert!(optional_bool(params, "flag", false));
        assert!(optional_bool(params, "other", true));
        assert_eq!(string_list(params, "list"), vec!["x", "y"]);
        assert!(required_object(params, "name").is_err());
    }
}
