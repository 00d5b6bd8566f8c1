// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod catalog;
pub mod json_lines;
#[cfg(test)]
pub mod memory;

pub use catalog::{CatalogSink, CatalogStore, LocalCatalog};
pub use json_lines::JsonLinesSink;
