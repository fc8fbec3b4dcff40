//! Error types shared across the logger

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::datalog::SinkError;
use crate::source::SourceError;

/// Which gate a condition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Condition that opens recording
    Start,
    /// Condition that ends the session
    Stop,
}

impl std::fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionKind::Start => f.write_str("Start"),
            ConditionKind::Stop => f.write_str("Stop"),
        }
    }
}

/// Errors raised while building a logger configuration.
///
/// All of these are fatal and surface before any tag is read.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Config file missing section {0}.")]
    MissingField(&'static str),

    #[error("Sampling interval must be a positive number of seconds, got {0}")]
    InvalidSamplingInterval(f64),

    #[error("Controller address must not be empty")]
    EmptyControllerAddress,

    #[error("At least one tag must be configured")]
    EmptyTags,

    #[error("Tag '{0}' is declared more than once")]
    DuplicateTag(String),

    #[error("{kind} condition tag '{tag}' does not exist in tags.")]
    UnknownConditionTag { kind: ConditionKind, tag: String },

    #[error("Unknown transition type '{0}'")]
    UnknownTransition(String),

    #[error(
        "Retrigger cooldown for tag '{tag}' must be a positive number of seconds, got {seconds}"
    )]
    InvalidRetrigger { tag: String, seconds: f64 },
}

/// Errors that end a logging session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Not all tags are valid for the selected controller: {}", .invalid.join(", "))]
    Validation { invalid: Vec<String> },

    #[error("Controller failure on cycle {cycle} after {elapsed:?}: {source}")]
    Source {
        cycle: u64,
        elapsed: Duration,
        #[source]
        source: SourceError,
    },

    #[error("Output sink failure: {0}")]
    Sink(#[from] SinkError),

    #[error("Session has already run")]
    AlreadyRun,
}
