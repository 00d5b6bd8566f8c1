// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod catalog;
pub mod connector;
pub mod sink;

pub use catalog::MetadataCatalog;
pub use connector::{Connector, ServiceSpec};
pub use sink::Sink;
