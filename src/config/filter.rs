// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Include/exclude name filters.
//!
//! Patterns are regular expressions compiled once when the config is loaded; a
//! bad pattern is a config error, never a per-record failure.

use crate::errors::ConfigError;
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
struct RawFilterPattern {
    #[serde(default)]
    includes: Vec<String>,
    #[serde(default)]
    excludes: Vec<String>,
}

/// A name passes when it matches no exclude and, if includes are given, at
/// least one include.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawFilterPattern")]
pub struct FilterPattern {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl FilterPattern {
    pub fn new<S: AsRef<str>>(includes: &[S], excludes: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            includes: compile(includes)?,
            excludes: compile(excludes)?,
        })
    }

    pub fn is_filtered(&self, name: &str) -> bool {
        if self.excludes.iter().any(|re| re.is_match(name)) {
            return true;
        }
        !self.includes.is_empty() && !self.includes.iter().any(|re| re.is_match(name))
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern.as_ref()).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.as_ref().to_string(),
                source,
            })
        })
        .collect()
}

impl TryFrom<RawFilterPattern> for FilterPattern {
    type Error = ConfigError;

    fn try_from(raw: RawFilterPattern) -> Result<Self, Self::Error> {
        FilterPattern::new(&raw.includes, &raw.excludes)
    }
}

/// Optional filter per hierarchy level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterPatterns {
    #[serde(default)]
    pub database: Option<FilterPattern>,
    #[serde(default)]
    pub schema: Option<FilterPattern>,
    #[serde(default)]
    pub table: Option<FilterPattern>,
    #[serde(default)]
    pub stored_procedure: Option<FilterPattern>,
    #[serde(default)]
    pub dashboard: Option<FilterPattern>,
    #[serde(default)]
    pub chart: Option<FilterPattern>,
    #[serde(default)]
    pub data_model: Option<FilterPattern>,
    #[serde(default)]
    pub pipeline: Option<FilterPattern>,
    #[serde(default)]
    pub topic: Option<FilterPattern>,
    #[serde(default)]
    pub mlmodel: Option<FilterPattern>,
    #[serde(default)]
    pub container: Option<FilterPattern>,
}

/// `true` when `pattern` is set and rejects `name`.
pub fn filter_by(pattern: Option<&FilterPattern>, name: &str) -> bool {
    pattern.is_some_and(|pattern| pattern.is_filtered(name))
}
