// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Connectors that read their whole hierarchy from `service_connection`.
//!
//! They make the CLI runnable without any vendor system and double as the
//! reference implementation of each family trait. Each sample item may carry an
//! `error` field; its processor then reports that message as a failure, which
//! lets a config exercise partial-failure runs.

pub mod dashboard;
pub mod database;
pub mod pipeline;

pub use dashboard::SampleDashboardSource;
pub use database::SampleDatabaseSource;
pub use pipeline::SamplePipelineSource;

use crate::config::{filter_by, FilterPattern, SourceSection};
use crate::errors::WorkflowError;
use crate::models::StackTraceError;
use crate::topology::{Produce, Produced};
use serde::de::DeserializeOwned;

/// Anything a sample producer lists by name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Deserialize the connector-specific part of the source section.
pub(crate) fn parse_connection<T: DeserializeOwned>(source: &SourceSection) -> Result<T, WorkflowError> {
    serde_json::from_value(source.service_connection.clone()).map_err(|error| {
        WorkflowError::SourceCreationFailed {
            source_type: source.source_type.clone(),
            reason: format!("invalid service_connection: {}", error),
        }
    })
}

/// Yield clones of `items`, reporting the ones `pattern` rejects as filtered.
pub(crate) fn produce_filtered<'a, T>(
    items: &'a [T],
    pattern: Option<&'a FilterPattern>,
    level: &'static str,
) -> Produce<'a, T>
where
    T: Named + Clone + 'static,
{
    Box::new(items.iter().map(move |item| {
        if filter_by(pattern, item.name()) {
            Ok(Produced::filtered(
                item.name(),
                format!("{} filtered out by pattern", level),
            ))
        } else {
            Ok(Produced::Item(item.clone()))
        }
    }))
}

/// A producer that fails once, e.g. when its parent is missing from the scope.
pub(crate) fn produce_error<'a, T: 'static>(error: impl Into<StackTraceError>) -> Produce<'a, T> {
    Box::new(std::iter::once(Err(error.into())))
}

/// Failure configured on a sample item.
pub(crate) fn simulated_failure(name: &str, error: &Option<String>) -> Option<StackTraceError> {
    error
        .as_ref()
        .map(|message| StackTraceError::new(name, message.as_str()))
}
