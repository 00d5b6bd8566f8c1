// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_CATALOG_PATH, DEFAULT_SUCCESS_THRESHOLD};
use crate::config::filter::FilterPatterns;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Complete configuration of one ingestion workflow.
///
/// Loaded from YAML, JSON or TOML; the format is picked by file extension.
///
/// # Example
/// ```yaml
/// source:
///   type: sample-database
///   service_name: local_warehouse
///   service_connection:
///     databases:
///       - name: analytics
///         schemas:
///           - name: public
///             tables:
///               - name: orders
///   source_config:
///     mark_deleted_entities: true
///     filter_patterns:
///       table:
///         excludes: ["_tmp$"]
/// sink:
///   type: metadata-catalog
/// catalog:
///   path: catalog.json
/// workflow_config:
///   logger_level: debug
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    pub source: SourceSection,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub workflow_config: WorkflowSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceSection {
    #[serde(rename = "type")]
    pub source_type: String,
    pub service_name: String,
    /// Connector-specific connection settings, passed through untouched.
    #[serde(default)]
    pub service_connection: serde_json::Value,
    #[serde(default)]
    pub source_config: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub mark_deleted_entities: bool,
    #[serde(default)]
    pub filter_patterns: FilterPatterns,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mark_deleted_entities: true,
            filter_patterns: FilterPatterns::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkType {
    /// Apply records to the local catalog store
    #[default]
    MetadataCatalog,
    /// Append every record as one JSON document per line
    JsonLines,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SinkConfig {
    #[serde(rename = "type", default)]
    pub sink_type: SinkType,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[serde(alias = "TRACE")]
    Trace,
    #[serde(alias = "DEBUG")]
    Debug,
    #[default]
    #[serde(alias = "INFO")]
    Info,
    #[serde(alias = "WARN", alias = "WARNING", alias = "warning")]
    Warn,
    #[serde(alias = "ERROR")]
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub logger_level: LogLevel,
    /// Minimum success percentage for a run to count as successful.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: f64,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            logger_level: LogLevel::default(),
            success_threshold: DEFAULT_SUCCESS_THRESHOLD,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from(DEFAULT_CATALOG_PATH)
}

fn default_success_threshold() -> f64 {
    DEFAULT_SUCCESS_THRESHOLD
}

/// Config file formats, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat { extension }),
        }
    }
}

pub fn parse_config(content: &str, format: ConfigFormat) -> Result<WorkflowConfig, ConfigError> {
    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    Ok(config)
}

/// Load a workflow config from a YAML, JSON or TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WorkflowConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format)
}

/// Load a workflow config and check the values serde cannot.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<WorkflowConfig, ConfigError> {
    let config = load_config(path)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &WorkflowConfig) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if config.source.source_type.trim().is_empty() {
        problems.push("source.type must not be empty".to_string());
    }
    if config.source.service_name.trim().is_empty() {
        problems.push("source.service_name must not be empty".to_string());
    }
    let threshold = config.workflow_config.success_threshold;
    if !(0.0..=100.0).contains(&threshold) {
        problems.push(format!(
            "workflow_config.success_threshold must be between 0 and 100, got {}",
            threshold
        ));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid(problems))
    }
}
