// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Success percentage below which a run is reported as failed.
pub const DEFAULT_SUCCESS_THRESHOLD: f64 = 100.0;
/// Catalog store used when the config has no `catalog` section.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.json";
/// Output of the JSON-lines sink when no `path` is configured.
pub const DEFAULT_JSON_LINES_PATH: &str = "records.jsonl";
/// Environment variable that overrides `workflow_config.logger_level`.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";
