//! Cycle timing diagnostics

use std::time::Duration;

use super::SampleRecord;

/// Report timing roughly this often (cumulative cycle time)
pub const REPORT_EVERY: Duration = Duration::from_secs(10);

/// Tracks how much of the sampling interval each cycle's work consumes
#[derive(Debug, Clone)]
pub struct CycleStats {
    interval: Duration,
    /// Cycle time accumulated since the last report
    since_report: Duration,
    cycles_since_report: u64,
    last_work: Duration,
    max_work: Duration,
    overruns: u64,
}

impl CycleStats {
    /// Create stats for the given sampling interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            since_report: Duration::ZERO,
            cycles_since_report: 0,
            last_work: Duration::ZERO,
            max_work: Duration::ZERO,
            overruns: 0,
        }
    }

    /// Record a cycle's work time (read + write, before sleeping)
    pub fn record_work(&mut self, work: Duration) {
        self.last_work = work;
        self.max_work = self.max_work.max(work);
        if work >= self.interval {
            self.overruns += 1;
        }
    }

    /// Add a finished cycle's total time; returns true when a report is due
    pub fn record_cycle(&mut self, total: Duration) -> bool {
        self.since_report += total;
        self.cycles_since_report += 1;
        self.since_report >= REPORT_EVERY
    }

    /// Work time as a percentage of the sampling interval
    pub fn percentage(work: Duration, interval: Duration) -> f64 {
        work.as_secs_f64() / interval.as_secs_f64() * 100.0
    }

    /// Emit the periodic timing line, with the latest record if there is
    /// one, and start a new window
    pub fn report(&mut self, latest: Option<&SampleRecord>) {
        if let Some(record) = latest {
            tracing::info!("Data: {}", Self::describe(record));
        }
        tracing::info!(
            cycles = self.cycles_since_report,
            overruns = self.overruns,
            max_work_ms = self.max_work.as_secs_f64() * 1000.0,
            "[EXECUTION TIME] {:.4} seconds. Percentage of sample interval {:.4}%",
            self.last_work.as_secs_f64(),
            Self::percentage(self.last_work, self.interval),
        );
        self.since_report = Duration::ZERO;
        self.cycles_since_report = 0;
    }

    /// One-line `column: value` rendering of a record
    pub fn describe(record: &SampleRecord) -> String {
        record
            .columns()
            .into_iter()
            .zip(record.to_row())
            .map(|(column, cell)| format!("{column}: {cell}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Longest work time seen in the session
    pub fn max_work(&self) -> Duration {
        self.max_work
    }

    /// Cycles whose work took at least the full interval
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}
