// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SinkError;
use crate::models::{Either, Record, StackTraceError, Status};
use crate::traits::Sink;

/// In-memory sink for tests; optionally rejects records by key.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<Record>,
    pub reject: Vec<String>,
    pub closed: bool,
    status: Status,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(keys: &[&str]) -> Self {
        Self {
            reject: keys.iter().map(|key| key.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.records.iter().map(Record::key).collect()
    }
}

impl Sink for MemorySink {
    fn write_record(&mut self, record: &Record) -> Either<()> {
        let key = record.key();
        if self.reject.contains(&key) {
            let failure = StackTraceError::new(key, "rejected by sink");
            self.status.failed(failure.clone());
            return Err(failure);
        }
        self.status.scanned(key);
        self.records.push(record.clone());
        Ok(())
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.closed = true;
        Ok(())
    }
}
