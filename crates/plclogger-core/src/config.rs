//! Logger configuration
//!
//! [`DataLoggerConfig`] is validated once at construction and immutable
//! afterwards. It can be built in code or loaded from a JSON file:
//!
//! ```json
//! {
//!   "Data Logger Config": {
//!     "Sampling Interval": 1.0,
//!     "PLC IP Address": "192.168.1.10",
//!     "Tags": [{ "name": "Line_Running", "description": "Line Running" }],
//!     "Start Condition": [{ "Tag Name": "Line_Running", "Edge Transition": "Rising" }],
//!     "Stop Condition": { "Tag Name": "Line_Running", "Edge Transition": "Falling" }
//!   }
//! }
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{ConditionKind, ConfigError};
use crate::tag::{Tag, TagRegistry};
use crate::trigger::EdgeTransitionType;

/// Default config file name inside the program folder
pub const CONFIG_FILE_NAME: &str = "config.json";

/// A tag transition that gates the session
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Tag whose boolean reading is monitored
    pub tag: Tag,
    /// Transition that satisfies the condition
    pub edge_transition: EdgeTransitionType,
    /// Re-arm a directional trigger after this long
    pub retrigger: Option<Duration>,
}

impl Condition {
    /// Create a condition without retriggering
    pub fn new(tag: Tag, edge_transition: EdgeTransitionType) -> Self {
        Self {
            tag,
            edge_transition,
            retrigger: None,
        }
    }

    /// Re-arm the condition's trigger after `cooldown`
    pub fn with_retrigger(mut self, cooldown: Duration) -> Self {
        self.retrigger = Some(cooldown);
        self
    }
}

/// Validated configuration for one logging session
#[derive(Debug, Clone)]
pub struct DataLoggerConfig {
    sampling_interval: Duration,
    controller_address: String,
    tags: TagRegistry,
    start_conditions: Vec<Condition>,
    stop_conditions: Vec<Condition>,
}

impl DataLoggerConfig {
    /// Create a configuration without start/stop conditions.
    ///
    /// # Arguments
    /// * `sampling_interval` - Target seconds between cycle starts (> 0)
    /// * `controller_address` - Controller address, e.g. an IP
    /// * `tags` - Tags to sample, in column order
    pub fn new(
        sampling_interval: f64,
        controller_address: impl Into<String>,
        tags: Vec<Tag>,
    ) -> Result<Self, ConfigError> {
        let sampling_interval = positive_seconds(sampling_interval)
            .ok_or(ConfigError::InvalidSamplingInterval(sampling_interval))?;

        let controller_address = controller_address.into();
        if controller_address.trim().is_empty() {
            return Err(ConfigError::EmptyControllerAddress);
        }

        Ok(Self {
            sampling_interval,
            controller_address,
            tags: TagRegistry::new(tags)?,
            start_conditions: Vec::new(),
            stop_conditions: Vec::new(),
        })
    }

    /// Attach start conditions; every referenced tag must be declared
    pub fn with_start_conditions(
        mut self,
        conditions: Vec<Condition>,
    ) -> Result<Self, ConfigError> {
        self.check_conditions(ConditionKind::Start, &conditions)?;
        self.start_conditions = drop_inert_retriggers(ConditionKind::Start, conditions);
        Ok(self)
    }

    /// Attach stop conditions; every referenced tag must be declared
    pub fn with_stop_conditions(
        mut self,
        conditions: Vec<Condition>,
    ) -> Result<Self, ConfigError> {
        self.check_conditions(ConditionKind::Stop, &conditions)?;
        self.stop_conditions = drop_inert_retriggers(ConditionKind::Stop, conditions);
        Ok(self)
    }

    fn check_conditions(
        &self,
        kind: ConditionKind,
        conditions: &[Condition],
    ) -> Result<(), ConfigError> {
        for condition in conditions {
            if !self.tags.contains(&condition.tag) {
                return Err(ConfigError::UnknownConditionTag {
                    kind,
                    tag: condition.tag.name.clone(),
                });
            }
            if let Some(cooldown) = condition.retrigger {
                if cooldown.is_zero() {
                    return Err(ConfigError::InvalidRetrigger {
                        tag: condition.tag.name.clone(),
                        seconds: 0.0,
                    });
                }
            }
        }
        Ok(())
    }

    /// Load a configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse a configuration from JSON text
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(content)?;
        let data = file
            .data_logger
            .ok_or(ConfigError::MissingField("'Data Logger Config'"))?;

        let sampling_interval = data.sampling_interval.ok_or(ConfigError::MissingField(
            "'Data Logger Config'.'Sampling Interval'",
        ))?;

        let controller_address = data
            .controller_address
            .filter(|a| !a.trim().is_empty())
            .ok_or(ConfigError::MissingField(
                "'Data Logger Config'.'PLC IP Address'",
            ))?;

        let tags = data
            .tags
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingField("'Data Logger Config'.'Tags'"))?;

        let start = resolve_conditions(ConditionKind::Start, data.start_conditions, &tags)?;
        let stop = resolve_conditions(ConditionKind::Stop, data.stop_conditions, &tags)?;

        Self::new(sampling_interval, controller_address, tags)?
            .with_start_conditions(start)?
            .with_stop_conditions(stop)
    }

    /// Target time between the start of consecutive cycles
    pub fn sampling_interval(&self) -> Duration {
        self.sampling_interval
    }

    /// Address of the controller to sample
    pub fn controller_address(&self) -> &str {
        &self.controller_address
    }

    /// Declared tags in column order
    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Conditions that must all fire before records are emitted
    pub fn start_conditions(&self) -> &[Condition] {
        &self.start_conditions
    }

    /// Conditions of which any one ends the session
    pub fn stop_conditions(&self) -> &[Condition] {
        &self.stop_conditions
    }
}

/// A retrigger only re-arms directional transitions; on `Both` it is ignored
fn drop_inert_retriggers(kind: ConditionKind, conditions: Vec<Condition>) -> Vec<Condition> {
    conditions
        .into_iter()
        .map(|mut c| {
            if !c.edge_transition.is_directional() && c.retrigger.take().is_some() {
                tracing::warn!(
                    tag = %c.tag.name,
                    "{} condition retrigger ignored: it has no effect on '{}' transitions.",
                    kind,
                    c.edge_transition
                );
            }
            c
        })
        .collect()
}

fn positive_seconds(seconds: f64) -> Option<Duration> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    let duration = Duration::try_from_secs_f64(seconds).ok()?;
    (!duration.is_zero()).then_some(duration)
}

fn resolve_conditions(
    kind: ConditionKind,
    raw: Option<OneOrMany<RawCondition>>,
    tags: &[Tag],
) -> Result<Vec<Condition>, ConfigError> {
    let raw = match raw {
        Some(OneOrMany::One(c)) => vec![c],
        Some(OneOrMany::Many(c)) => c,
        None => return Ok(Vec::new()),
    };

    raw.into_iter()
        .map(|c| -> Result<Condition, ConfigError> {
            let tag = tags
                .iter()
                .find(|t| t.name == c.tag_name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownConditionTag {
                    kind,
                    tag: c.tag_name.clone(),
                })?;

            let mut condition = Condition::new(tag, c.edge_transition.parse()?);
            if let Some(seconds) = c.retrigger_seconds {
                let cooldown =
                    positive_seconds(seconds).ok_or_else(|| ConfigError::InvalidRetrigger {
                        tag: c.tag_name.clone(),
                        seconds,
                    })?;
                condition = condition.with_retrigger(cooldown);
            }
            Ok(condition)
        })
        .collect()
}

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(rename = "Data Logger Config")]
    data_logger: Option<RawLoggerConfig>,
}

#[derive(Deserialize)]
struct RawLoggerConfig {
    #[serde(rename = "Sampling Interval")]
    sampling_interval: Option<f64>,
    #[serde(rename = "PLC IP Address")]
    controller_address: Option<String>,
    #[serde(rename = "Tags")]
    tags: Option<Vec<Tag>>,
    #[serde(rename = "Start Condition")]
    start_conditions: Option<OneOrMany<RawCondition>>,
    #[serde(rename = "Stop Condition")]
    stop_conditions: Option<OneOrMany<RawCondition>>,
}

#[derive(Deserialize)]
struct RawCondition {
    #[serde(rename = "Tag Name")]
    tag_name: String,
    #[serde(rename = "Edge Transition")]
    edge_transition: String,
    #[serde(rename = "Retrigger Seconds")]
    retrigger_seconds: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}
