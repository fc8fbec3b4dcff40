//! # PLC Logger Core Library
//!
//! Core functionality for logging PLC tag values to files.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Edge triggers with optional retrigger cooldown
//! - A tag registry with per-cycle validity tracking
//! - Start/stop condition gating
//! - A fixed-cadence sampling loop with cancellable sleeps
//! - CSV and in-memory record sinks
//!
//! ## Example
//!
//! ```rust,ignore
//! use plclogger_core::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! let config = DataLoggerConfig::from_path("config.json")?;
//! let sink = CsvSink::append_to(data_file_name(chrono::Local::now()))?;
//! let mut logger = DataLogger::new(config, SimulatedController::new(), sink);
//!
//! let summary = logger.run(CancellationToken::new()).await?;
//! println!("{} records", summary.records);
//! ```

pub mod condition;
pub mod config;
pub mod datalog;
pub mod error;
pub mod paths;
pub mod source;
pub mod tag;
pub mod trigger;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::condition::{ConditionGate, GateDecision};
    pub use crate::config::{Condition, DataLoggerConfig};
    pub use crate::datalog::{
        data_file_name, CsvSink, DataLogger, MemorySink, RecordSink, SampleRecord,
        SessionState, SessionSummary, StopReason,
    };
    pub use crate::error::{ConfigError, SessionError};
    pub use crate::paths::ProgramDirs;
    pub use crate::source::{SimulatedController, SourceError, TagSource};
    pub use crate::tag::{Tag, TagRegistry, TagValue};
    pub use crate::trigger::{EdgeRetrigger, EdgeTransitionType, EdgeTrigger};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
