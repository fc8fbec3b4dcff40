//! Data logger session
//!
//! Validates every tag, then reads them on a fixed cadence and hands one
//! record per cycle to the sink until cancelled, stopped by a condition or
//! failed.

use chrono::Local;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};
use uuid::Uuid;

use super::{CycleStats, RecordSink, SampleRecord, TIMESTAMP_COLUMN};
use crate::condition::ConditionGate;
use crate::config::DataLoggerConfig;
use crate::error::SessionError;
use crate::source::TagSource;
use crate::tag::TagRegistry;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started yet
    Idle,
    /// Reading every tag once before sampling
    Validating,
    /// Sampling
    Running,
    /// Ended normally
    Stopped,
    /// Ended on an error
    Failed,
}

impl SessionState {
    /// Whether the session has ended
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Failed)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionState::Idle => "idle",
            SessionState::Validating => "validating",
            SessionState::Running => "running",
            SessionState::Stopped => "stopped",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a session stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown token was cancelled
    Cancelled,
    /// A stop condition fired
    StopCondition,
    /// The configured number of cycles ran
    CycleLimit,
}

/// Result of a session that ended normally
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session identifier, also attached to the session's log span
    pub id: Uuid,
    /// Why sampling ended
    pub reason: StopReason,
    /// Cycles started
    pub cycles: u64,
    /// Records written
    pub records: u64,
    /// Cycle timing
    pub stats: CycleStats,
}

/// One logging session against a controller
pub struct DataLogger<S, K> {
    id: Uuid,
    config: DataLoggerConfig,
    registry: TagRegistry,
    gate: ConditionGate,
    source: S,
    sink: K,
    state: SessionState,
    cycle_limit: Option<u64>,
    span: Span,
}

impl<S: TagSource, K: RecordSink> DataLogger<S, K> {
    /// Create a session reading from `source` and writing to `sink`
    pub fn new(config: DataLoggerConfig, source: S, sink: K) -> Self {
        let id = Uuid::new_v4();
        let span = tracing::info_span!(
            "session",
            id = %id,
            controller = %config.controller_address()
        );

        Self {
            id,
            registry: config.tags().clone(),
            gate: ConditionGate::new(&config),
            config,
            source,
            sink,
            state: SessionState::Idle,
            cycle_limit: None,
            span,
        }
    }

    /// Stop after `cycles` cycles (at least one cycle always runs)
    pub fn with_cycle_limit(mut self, cycles: u64) -> Self {
        self.cycle_limit = Some(cycles);
        self
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Configuration the session runs with
    pub fn config(&self) -> &DataLoggerConfig {
        &self.config
    }

    /// Tags as of the latest cycle
    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    /// The output sink
    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Give back the sink
    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Run the session to completion.
    ///
    /// Cancelling `shutdown` ends the session promptly, whether it is reading
    /// tags or sleeping between cycles. A cycle interrupted by cancellation
    /// writes no record. The sink is closed on every exit path.
    pub async fn run(
        &mut self,
        shutdown: CancellationToken,
    ) -> Result<SessionSummary, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyRun);
        }

        let span = self.span.clone();
        self.run_session(shutdown).instrument(span).await
    }

    async fn run_session(
        &mut self,
        shutdown: CancellationToken,
    ) -> Result<SessionSummary, SessionError> {
        tracing::info!(
            tags = self.registry.len(),
            interval = ?self.config.sampling_interval(),
            "Starting data logger."
        );

        self.state = SessionState::Validating;
        if !self.registry.validate_all(&mut self.source).await {
            let invalid = self.registry.invalid_tags();
            tracing::error!(
                "Not all tags are valid for the selected controller: {}",
                invalid.join(", ")
            );
            self.close_sink();
            self.state = SessionState::Failed;
            return Err(SessionError::Validation { invalid });
        }

        let columns: Vec<String> = std::iter::once(TIMESTAMP_COLUMN.to_string())
            .chain(self.registry.descriptions())
            .collect();
        if let Err(e) = self.sink.write_header(&columns) {
            tracing::error!(error = %e, "Could not write the record header.");
            self.close_sink();
            self.state = SessionState::Failed;
            return Err(e.into());
        }

        self.state = SessionState::Running;
        let result = self.sample(&shutdown).await;
        let closed = self.sink.close();

        match (result, closed) {
            (Ok(summary), Ok(())) => {
                self.state = SessionState::Stopped;
                tracing::info!(
                    reason = ?summary.reason,
                    cycles = summary.cycles,
                    records = summary.records,
                    "Data logger stopped."
                );
                Ok(summary)
            }
            (Ok(_), Err(e)) => {
                self.state = SessionState::Failed;
                tracing::error!(error = %e, "Could not close the output.");
                Err(e.into())
            }
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "Could not close the output.");
                }
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    async fn sample(
        &mut self,
        shutdown: &CancellationToken,
    ) -> Result<SessionSummary, SessionError> {
        let interval = self.config.sampling_interval();
        let session_start = Instant::now();
        let mut stats = CycleStats::new(interval);
        let mut cycles: u64 = 0;
        let mut records: u64 = 0;
        let mut last_record: Option<SampleRecord> = None;

        if self.gate.is_gated() && !self.gate.is_started() {
            tracing::info!(
                pending = ?self.gate.pending_start(),
                "Waiting for start conditions."
            );
        }

        let reason = loop {
            if shutdown.is_cancelled() {
                break StopReason::Cancelled;
            }

            let start = Instant::now();
            cycles += 1;

            let update = tokio::select! {
                update = self.registry.update_all(&mut self.source) => update,
                _ = shutdown.cancelled() => break StopReason::Cancelled,
            };
            let report = match update {
                Ok(report) => report,
                Err(source) => {
                    let elapsed = session_start.elapsed();
                    tracing::error!(
                        cycle = cycles,
                        ?elapsed,
                        error = %source,
                        "Lost connection to the controller."
                    );
                    return Err(SessionError::Source {
                        cycle: cycles,
                        elapsed,
                        source,
                    });
                }
            };
            for failure in &report.failures {
                tracing::warn!(
                    cycle = cycles,
                    tag = %failure.tag,
                    error = %failure.error,
                    "Tag read failed."
                );
            }
            for tag in &report.null_reads {
                tracing::warn!(cycle = cycles, tag = %tag, "Tag returned no value.");
            }

            let decision = self.gate.evaluate(&self.registry, start.into_std());
            if decision.record {
                if shutdown.is_cancelled() {
                    break StopReason::Cancelled;
                }
                let record =
                    SampleRecord::capture(&self.registry, Local::now(), start - session_start);
                if let Err(e) = self.sink.append(&record) {
                    tracing::error!(cycle = cycles, error = %e, "Could not write record.");
                    return Err(e.into());
                }
                records += 1;
                last_record = Some(record);
            }

            let work = start.elapsed();
            stats.record_work(work);

            if decision.stop {
                tracing::info!(cycle = cycles, "Stop condition met.");
                break StopReason::StopCondition;
            }
            if self.cycle_limit.is_some_and(|limit| cycles >= limit) {
                break StopReason::CycleLimit;
            }

            if work < interval {
                let cancelled = tokio::select! {
                    _ = tokio::time::sleep(interval - work) => false,
                    _ = shutdown.cancelled() => true,
                };
                if cancelled {
                    break StopReason::Cancelled;
                }
            } else {
                tracing::debug!(
                    cycle = cycles,
                    ?work,
                    "Cycle overran the sampling interval."
                );
            }

            if stats.record_cycle(start.elapsed()) {
                stats.report(last_record.as_ref());
            }
        };

        if reason == StopReason::Cancelled {
            tracing::info!(cycle = cycles, "Data logger cancelled.");
        }

        Ok(SessionSummary {
            id: self.id,
            reason,
            cycles,
            records,
            stats,
        })
    }

    fn close_sink(&mut self) {
        if let Err(e) = self.sink.close() {
            tracing::warn!(error = %e, "Could not close the output.");
        }
    }
}
