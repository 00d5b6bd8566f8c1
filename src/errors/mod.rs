// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod catalog;
mod config;
mod execution;
mod validation;
mod workflow;

pub use catalog::{CatalogError, SinkError};
pub use config::ConfigError;
pub use execution::ExecutionError;
pub use validation::ValidationError;
pub use workflow::WorkflowError;
