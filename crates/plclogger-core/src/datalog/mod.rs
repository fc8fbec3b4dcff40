//! Data Logging
//!
//! Runs the sampling loop and writes one timestamped record per cycle.

mod format;
mod recorder;
mod stats;

pub use format::{data_file_name, CsvSink, MemorySink, RecordSink, SinkError};
pub use recorder::{DataLogger, SessionState, SessionSummary, StopReason};
pub use stats::CycleStats;

use chrono::{DateTime, Local};
use serde::Serialize;
use std::time::Duration;

use crate::tag::{TagRegistry, TagValue};

/// Name of the first column of every record
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// Format of the `Timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// One row of tag values for a single cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    /// Wall-clock time the record was built
    pub timestamp: DateTime<Local>,
    /// Start of the cycle, measured from the start of the session
    pub offset: Duration,
    /// `(description, value)` pairs in declaration order
    pub values: Vec<(String, Option<TagValue>)>,
}

impl SampleRecord {
    /// Snapshot the registry's current values
    pub fn capture(registry: &TagRegistry, timestamp: DateTime<Local>, offset: Duration) -> Self {
        let values = registry
            .iter()
            .map(|t| (t.description.clone(), t.value().cloned()))
            .collect();

        Self {
            timestamp,
            offset,
            values,
        }
    }

    /// Column names, starting with [`TIMESTAMP_COLUMN`]
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(TIMESTAMP_COLUMN.to_string())
            .chain(self.values.iter().map(|(d, _)| d.clone()))
            .collect()
    }

    /// Look up a value by column name
    pub fn get(&self, description: &str) -> Option<&TagValue> {
        self.values
            .iter()
            .find(|(d, _)| d == description)
            .and_then(|(_, v)| v.as_ref())
    }

    /// Formatted cells, empty for missing values
    pub fn to_row(&self) -> Vec<String> {
        std::iter::once(self.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .chain(
                self.values
                    .iter()
                    .map(|(_, v)| v.as_ref().map(|v| v.to_string()).unwrap_or_default()),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;
    use chrono::TimeZone;

    #[test]
    fn test_record_layout() {
        let registry = TagRegistry::new(vec![
            Tag::new("Speed", "Motor Speed"),
            Tag::new("Count", "Parts"),
        ])
        .unwrap();
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        let record = SampleRecord::capture(&registry, ts, Duration::from_secs(3));

        assert_eq!(record.columns(), vec!["Timestamp", "Motor Speed", "Parts"]);
        assert_eq!(record.get("Parts"), None);
        assert_eq!(record.to_row(), vec!["2024-03-09 14:05:07.000", "", ""]);
    }
}
