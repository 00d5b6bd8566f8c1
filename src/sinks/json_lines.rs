// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::SinkError;
use crate::models::{Either, Record, StackTraceError, Status};
use crate::traits::Sink;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sink that writes every record as one JSON document per line.
pub struct JsonLinesSink {
    path: PathBuf,
    writer: BufWriter<File>,
    status: Status,
}

impl JsonLinesSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| SinkError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            status: Status::new(),
        })
    }

    fn append(&mut self, record: &Record) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer
            .write_all(b"\n")
            .map_err(|source| SinkError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

impl Sink for JsonLinesSink {
    fn write_record(&mut self, record: &Record) -> Either<()> {
        match self.append(record) {
            Ok(()) => {
                self.status.scanned(record.key());
                Ok(())
            }
            Err(error) => {
                let failure = StackTraceError::from_error(record.key(), &error);
                self.status.failed(failure.clone());
                Err(failure)
            }
        }
    }

    fn status(&self) -> &Status {
        &self.status
    }

    fn close(&mut self) -> Result<(), SinkError> {
        self.writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateEntityRequest, EntityType};

    #[test]
    fn test_writes_one_record_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let mut sink = JsonLinesSink::create(&path).unwrap();

        for name in ["orders", "customers"] {
            let request = CreateEntityRequest::new(EntityType::Table, name, None);
            sink.write_record(&Record::Create(request)).unwrap();
        }
        sink.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Record = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.key(), "orders");
        assert!(lines[1].contains("\"kind\":\"create\""));
        assert_eq!(sink.status().records, vec!["orders", "customers"]);
    }

    #[test]
    fn test_unwritable_path() {
        let result = JsonLinesSink::create("/definitely/not/a/dir/records.jsonl");
        assert!(matches!(result, Err(SinkError::Io { .. })));
    }
}
