// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod cache;
pub mod deletion;
pub mod runner;
pub mod stop;
#[cfg(test)]
pub mod integration_tests;

pub use cache::FingerprintCache;
pub use deletion::{
    mark_deleted_under, mark_deleted_under_seen, mark_entities_as_deleted, SourceState,
};
pub use runner::{run_topology, RunReport, RunnerOptions};
pub use stop::StopSignal;
