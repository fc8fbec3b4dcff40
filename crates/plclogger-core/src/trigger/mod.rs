//! Edge Triggers
//!
//! Detects transitions on boolean signals and optionally re-arms
//! directional triggers after a cooldown.

mod edge;
mod retrigger;

pub use edge::EdgeTrigger;
pub use retrigger::EdgeRetrigger;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

/// Direction of a boolean transition that fires a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeTransitionType {
    /// false -> true
    Rising,
    /// true -> false
    Falling,
    /// Any change
    Both,
}

impl EdgeTransitionType {
    /// Decide whether moving from `previous` to `current` is a qualifying edge.
    ///
    /// An unset `previous` never fires: the first observation only
    /// establishes the baseline.
    pub fn fires(self, previous: Option<bool>, current: bool) -> bool {
        match (self, previous) {
            (_, None) => false,
            (EdgeTransitionType::Rising, Some(prev)) => !prev && current,
            (EdgeTransitionType::Falling, Some(prev)) => prev && !current,
            (EdgeTransitionType::Both, Some(prev)) => prev != current,
        }
    }

    /// Whether the type has a direction (and can therefore be re-armed)
    pub fn is_directional(self) -> bool {
        !matches!(self, EdgeTransitionType::Both)
    }

    /// Name as written in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeTransitionType::Rising => "Rising",
            EdgeTransitionType::Falling => "Falling",
            EdgeTransitionType::Both => "Both",
        }
    }
}

impl FromStr for EdgeTransitionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rising" => Ok(EdgeTransitionType::Rising),
            "falling" => Ok(EdgeTransitionType::Falling),
            "both" => Ok(EdgeTransitionType::Both),
            _ => Err(ConfigError::UnknownTransition(s.to_string())),
        }
    }
}

impl std::fmt::Display for EdgeTransitionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
