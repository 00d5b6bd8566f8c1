// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SinkError;
use crate::models::{Either, Record, Status};

/// Destination of every record the runner accepts.
///
/// A sink keeps its own [`Status`]: a record the source produced successfully can
/// still fail to be written.
pub trait Sink {
    fn write_record(&mut self, record: &Record) -> Either<()>;

    fn status(&self) -> &Status;

    /// Flush and persist; called once after the run, even an interrupted one.
    fn close(&mut self) -> Result<(), SinkError>;
}
