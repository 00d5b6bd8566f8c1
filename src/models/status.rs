// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-step outcome accounting.
//!
//! A [`Status`] is created when a workflow step starts and appended to for every
//! record the step touches. Successes, failures, warnings and filtered records are
//! kept in disjoint buckets; nothing is ever removed. At the end of the run the
//! buckets drive the success percentage and the process exit code.

use crate::models::either::StackTraceError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A record excluded on purpose, e.g. by an include/exclude filter pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilteredRecord {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusWarning {
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub records: Vec<String>,
    pub updated_records: Vec<String>,
    pub warnings: Vec<StatusWarning>,
    pub filtered: Vec<FilteredRecord>,
    pub failures: Vec<StackTraceError>,
    pub start_time: DateTime<Utc>,
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            updated_records: Vec::new(),
            warnings: Vec::new(),
            filtered: Vec::new(),
            failures: Vec::new(),
            start_time: Utc::now(),
        }
    }

    pub fn scanned(&mut self, key: impl Into<String>) {
        self.records.push(key.into());
    }

    /// Successful record that updated an entity already in the catalog.
    pub fn updated(&mut self, key: impl Into<String>) {
        self.updated_records.push(key.into());
    }

    pub fn failed(&mut self, error: StackTraceError) {
        self.failures.push(error);
    }

    pub fn failure(
        &mut self,
        key: impl Into<String>,
        error: impl Into<String>,
        stack_trace: Option<String>,
    ) {
        self.failures.push(StackTraceError {
            name: key.into(),
            error: error.into(),
            stack_trace,
        });
    }

    pub fn warning(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(StatusWarning {
            name: key.into(),
            message: message.into(),
        });
    }

    pub fn filtered(&mut self, key: impl Into<String>, reason: impl Into<String>) {
        self.filtered.push(FilteredRecord {
            name: key.into(),
            reason: reason.into(),
        });
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Successful records, including updates.
    pub fn success_count(&self) -> usize {
        self.records.len() + self.updated_records.len()
    }

    /// Percentage of processed records that succeeded, rounded to two decimals.
    ///
    /// A step that processed nothing and failed nothing counts as 100%.
    pub fn calculate_success(&self) -> f64 {
        let succeeded = self.success_count() as f64;
        let failed = self.failures.len() as f64;
        if succeeded + failed == 0.0 {
            return 100.0;
        }
        let pct = succeeded * 100.0 / (succeeded + failed);
        (pct * 100.0).round() / 100.0
    }

    pub fn failure_names(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_status_is_fully_successful() {
        let status = Status::new();
        assert_eq!(status.calculate_success(), 100.0);
        assert!(!status.has_failures());
    }

    #[test]
    fn test_calculate_success_rounds() {
        let mut status = Status::new();
        status.scanned("a");
        status.scanned("b");
        status.failure("c", "boom", None);
        assert_eq!(status.calculate_success(), 66.67);
    }

    #[test]
    fn test_updates_count_as_success() {
        let mut status = Status::new();
        status.updated("a");
        status.failed(StackTraceError::new("b", "boom"));
        assert_eq!(status.calculate_success(), 50.0);
        assert_eq!(status.failure_names(), vec!["b"]);
    }

    #[test]
    fn test_filtered_and_warnings_do_not_affect_success() {
        let mut status = Status::new();
        status.scanned("a");
        status.filtered("tmp_table", "excluded by table filter pattern");
        status.warning("schema", "producer yielded no items");
        assert_eq!(status.calculate_success(), 100.0);
        assert!(status.has_warnings());
        assert_eq!(status.filtered.len(), 1);
    }
}
