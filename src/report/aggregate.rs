//! Station-indexed aggregation of per-station results.
//!
//! One aggregator per report. The aggregator is owned by the thread driving
//! the run; workers hand their results back and never touch it.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::domain::Station;
use crate::error::PipelineError;

/// Collects `station → result` entries in insertion order.
#[derive(Debug)]
pub struct ResultAggregator<T> {
    entries: Vec<(String, T)>,
    closed: bool,
}

impl<T> ResultAggregator<T> {
    pub fn begin() -> Self {
        Self {
            entries: Vec::new(),
            closed: false,
        }
    }

    /// Add one station's result.
    ///
    /// A station already present is rejected and the first entry is kept.
    pub fn append(&mut self, station: &Station, result: T) -> Result<(), PipelineError> {
        if self.closed {
            return Err(PipelineError::AggregationClosed {
                operation: format!("append {station}"),
            });
        }
        if self.entries.iter().any(|(id, _)| id == station.id()) {
            return Err(PipelineError::DuplicateStation {
                station: station.id().to_string(),
            });
        }
        self.entries.push((station.id().to_string(), result));
        Ok(())
    }

    /// Close the aggregator and hand out the report.
    pub fn finish(&mut self) -> Result<AggregatedReport<T>, PipelineError> {
        if self.closed {
            return Err(PipelineError::AggregationClosed {
                operation: "finish".to_string(),
            });
        }
        self.closed = true;
        Ok(AggregatedReport {
            entries: std::mem::take(&mut self.entries),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finished, immutable report. Serializes as `{ "<station>": <result>, ... }`.
#[derive(Debug, Clone)]
pub struct AggregatedReport<T> {
    entries: Vec<(String, T)>,
}

impl<T> AggregatedReport<T> {
    pub fn stations(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(id, _)| id.as_str())
    }

    pub fn get(&self, station: &str) -> Option<&T> {
        self.entries.iter().find(|(id, _)| id == station).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Serialize> Serialize for AggregatedReport<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (station, result) in &self.entries {
            map.serialize_entry(station, result)?;
        }
        map.end()
    }
}

impl<T: Serialize> AggregatedReport<T> {
    /// Write the report as pretty JSON.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a reader never sees a half-written report.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let tmp = path.with_extension("json.partial");
        let file = File::create(&tmp)
            .map_err(|e| PipelineError::io(format!("failed to create {}", tmp.display()), e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| PipelineError::io(format!("failed to write {}", tmp.display()), e.into()))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| PipelineError::io(format!("failed to write {}", tmp.display()), e))?;
        drop(writer);
        fs::rename(&tmp, path)
            .map_err(|e| PipelineError::io(format!("failed to move report to {}", path.display()), e))
    }
}
