// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod either;
mod entity;
mod record;
mod status;

pub use either::{Either, StackTraceError};
pub use entity::{CreateEntityRequest, EntityRef, EntityType, Fqn};
pub use record::{
    AddLineageRequest, CatalogEntity, DeleteEntity, ExecutionState, PatchRequest,
    PipelineStatusRecord, Record,
};
pub use status::{FilteredRecord, Status, StatusWarning};
