// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod filter;
mod loader;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use filter::{filter_by, FilterPattern, FilterPatterns};
pub use loader::{
    load_and_validate_config, load_config, parse_config, validate_config, CatalogConfig,
    ConfigFormat, LogLevel, SinkConfig, SinkType, SourceConfig, SourceSection, WorkflowConfig,
    WorkflowSettings,
};
