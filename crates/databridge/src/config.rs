// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridge configuration.
//!
//! Supports both programmatic and file-based configuration.

use crate::convert::{ConvertOptions, DEFAULT_MAX_DEPTH, DISCRIMINATOR_FIELD};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Maximum number of commands in one `batch` request.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Maximum nesting depth of records during conversion and schema description.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Member carrying the concrete type of polymorphic values.
    #[serde(default = "default_discriminator_field")]
    pub discriminator_field: String,

    /// Page size of `query_datatable` when no limit is given.
    #[serde(default = "default_query_limit")]
    pub default_query_limit: usize,

    /// Result cap of `search_datatable_content` when no limit is given.
    #[serde(default = "default_search_limit")]
    pub default_search_limit: usize,

    /// Log every executed command.
    #[serde(default)]
    pub log_commands: bool,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_max_batch_size() -> usize {
    20
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_discriminator_field() -> String {
    DISCRIMINATOR_FIELD.to_string()
}

fn default_query_limit() -> usize {
    25
}

fn default_search_limit() -> usize {
    20
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_depth: default_max_depth(),
            discriminator_field: default_discriminator_field(),
            default_query_limit: default_query_limit(),
            default_search_limit: default_search_limit(),
            log_commands: false,
            log_level: default_log_level(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid("max_batch_size must be at least 1".into()));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        if self.default_query_limit == 0 || self.default_search_limit == 0 {
            return Err(ConfigError::Invalid("default limits must be at least 1".into()));
        }
        if self.discriminator_field.is_empty() {
            return Err(ConfigError::Invalid("discriminator_field is empty".into()));
        }
        if !self.discriminator_field.starts_with(crate::convert::METADATA_PREFIX) {
            return Err(ConfigError::Invalid(format!(
                "discriminator_field '{}' must start with '{}'",
                self.discriminator_field,
                crate::convert::METADATA_PREFIX
            )));
        }
        Ok(())
    }

    /// Conversion options derived from this configuration.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            discriminator: self.discriminator_field.clone(),
            max_depth: self.max_depth,
        }
    }

    /// Serialize to TOML text.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
