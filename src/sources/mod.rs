// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Source families and the bundled connectors.
//!
//! Each family module declares a typed connector trait and the topology that
//! drives it. `sample_data` implements the database, dashboard and pipeline
//! families from config; `factory` maps `source.type` to a runnable source.

pub mod dashboard;
pub mod database;
pub mod factory;
pub mod messaging;
pub mod mlmodel;
pub mod pipeline;
pub mod sample_data;
pub mod storage;

pub use dashboard::{dashboard_topology, DashboardServiceSource};
pub use database::{database_topology, DatabaseServiceSource};
pub use factory::SourceFactory;
pub use messaging::{messaging_topology, MessagingServiceSource};
pub use mlmodel::{mlmodel_topology, MlModelServiceSource};
pub use pipeline::{pipeline_topology, PipelineServiceSource};
pub use storage::{storage_topology, StorageServiceSource};
