//! Start/stop gating
//!
//! Each configured [`Condition`] gets its own edge trigger. Recording opens
//! once every start condition has fired at least once, and the session ends
//! the first time any stop condition fires.

use std::time::Instant;

use crate::config::{Condition, DataLoggerConfig};
use crate::error::ConditionKind;
use crate::tag::TagRegistry;
use crate::trigger::{EdgeRetrigger, EdgeTrigger};

/// What the loop should do with the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateDecision {
    /// Emit a record for this cycle
    pub record: bool,
    /// End the session after this cycle
    pub stop: bool,
}

enum Detector {
    Edge(EdgeTrigger),
    Cooldown(EdgeRetrigger),
}

impl Detector {
    fn tick(&mut self, now: Instant) {
        if let Detector::Cooldown(retrigger) = self {
            retrigger.tick(now);
        }
    }

    fn evaluate_at(&mut self, current: bool, now: Instant) -> bool {
        match self {
            Detector::Edge(trigger) => trigger.evaluate_at(current, now),
            Detector::Cooldown(retrigger) => retrigger.evaluate_at(current, now),
        }
    }
}

struct Monitor {
    kind: ConditionKind,
    tag_name: String,
    tag_index: usize,
    detector: Detector,
    /// Has fired at least once
    latched: bool,
}

impl Monitor {
    fn new(kind: ConditionKind, condition: &Condition, tag_index: usize) -> Self {
        let tag_name = condition.tag.name.clone();
        let transition = condition.edge_transition;

        let label = tag_name.clone();
        let trigger = EdgeTrigger::with_callback(transition, move || {
            tracing::info!(tag = %label, %transition, "{} condition fired.", kind);
        });

        let detector = match condition.retrigger {
            Some(cooldown) => Detector::Cooldown(EdgeRetrigger::new(trigger, cooldown)),
            None => Detector::Edge(trigger),
        };

        Self {
            kind,
            tag_name,
            tag_index,
            detector,
            latched: false,
        }
    }

    /// Returns whether the monitor fired on this observation
    fn observe(&mut self, registry: &TagRegistry, now: Instant) -> bool {
        self.detector.tick(now);

        let Some(tag) = registry.get_index(self.tag_index) else {
            return false;
        };
        if !tag.is_valid() {
            return false;
        }
        let Some(signal) = tag.value().and_then(|v| v.as_bool()) else {
            tracing::debug!(
                tag = %self.tag_name,
                kind = %self.kind,
                "Condition tag has no boolean reading; skipped."
            );
            return false;
        };

        let fired = self.detector.evaluate_at(signal, now);
        self.latched |= fired;
        fired
    }
}

/// Evaluates start and stop conditions against each cycle's snapshot
pub struct ConditionGate {
    start: Vec<Monitor>,
    stop: Vec<Monitor>,
    started: bool,
}

impl ConditionGate {
    /// Build monitors for every condition in `config`
    pub fn new(config: &DataLoggerConfig) -> Self {
        let build = |kind: ConditionKind, conditions: &[Condition]| -> Vec<Monitor> {
            conditions
                .iter()
                .filter_map(|c| {
                    config
                        .tags()
                        .position_of(&c.tag)
                        .map(|index| Monitor::new(kind, c, index))
                })
                .collect()
        };

        let start = build(ConditionKind::Start, config.start_conditions());
        let stop = build(ConditionKind::Stop, config.stop_conditions());
        let started = start.is_empty();

        Self {
            start,
            stop,
            started,
        }
    }

    /// Whether recording has opened
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether any start or stop conditions are configured
    pub fn is_gated(&self) -> bool {
        !self.start.is_empty() || !self.stop.is_empty()
    }

    /// Start conditions that have not fired yet
    pub fn pending_start(&self) -> Vec<&str> {
        self.start
            .iter()
            .filter(|m| !m.latched)
            .map(|m| m.tag_name.as_str())
            .collect()
    }

    /// Evaluate every condition against the freshly updated registry
    pub fn evaluate(&mut self, registry: &TagRegistry, now: Instant) -> GateDecision {
        for monitor in &mut self.start {
            monitor.observe(registry, now);
        }

        let mut stop = false;
        for monitor in &mut self.stop {
            stop |= monitor.observe(registry, now);
        }

        if !self.started && self.start.iter().all(|m| m.latched) {
            self.started = true;
            tracing::info!("All start conditions met; recording.");
        }

        GateDecision {
            record: self.started,
            stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceError, TagSource};
    use crate::tag::{Tag, TagValue};
    use crate::trigger::EdgeTransitionType;
    use std::collections::HashMap;
    use std::time::Duration;

    struct Signals(HashMap<&'static str, Option<TagValue>>);

    impl TagSource for Signals {
        async fn read(&mut self, tag_name: &str) -> Result<Option<TagValue>, SourceError> {
            Ok(self.0.get(tag_name).cloned().flatten())
        }
    }

    fn declared() -> Vec<Tag> {
        vec![
            Tag::new("Run", "Run"),
            Tag::new("Ready", "Ready"),
            Tag::new("Done", "Done"),
        ]
    }

    fn condition(name: &str, edge: EdgeTransitionType) -> Condition {
        Condition::new(Tag::new(name, name), edge)
    }

    async fn step(
        gate: &mut ConditionGate,
        registry: &mut TagRegistry,
        values: [(&'static str, bool); 3],
        now: Instant,
    ) -> GateDecision {
        let mut source = Signals(
            values
                .into_iter()
                .map(|(k, v)| (k, Some(TagValue::Bool(v))))
                .collect(),
        );
        registry.update_all(&mut source).await.unwrap();
        gate.evaluate(registry, now)
    }

    #[tokio::test]
    async fn test_ungated_records_immediately() {
        let config = DataLoggerConfig::new(1.0, "plc", declared()).unwrap();
        let mut gate = ConditionGate::new(&config);
        let mut registry = config.tags().clone();

        assert!(!gate.is_gated());
        let d = step(
            &mut gate,
            &mut registry,
            [("Run", false), ("Ready", false), ("Done", false)],
            Instant::now(),
        )
        .await;
        assert_eq!(d, GateDecision { record: true, stop: false });
    }

    #[tokio::test]
    async fn test_all_start_conditions_required() {
        let config = DataLoggerConfig::new(1.0, "plc", declared())
            .unwrap()
            .with_start_conditions(vec![
                condition("Run", EdgeTransitionType::Rising),
                condition("Ready", EdgeTransitionType::Rising),
            ])
            .unwrap();
        let mut gate = ConditionGate::new(&config);
        let mut registry = config.tags().clone();
        let now = Instant::now();

        // Baseline
        let d = step(
            &mut gate,
            &mut registry,
            [("Run", false), ("Ready", false), ("Done", false)],
            now,
        )
        .await;
        assert!(!d.record);

        // Only Run rises
        let d = step(
            &mut gate,
            &mut registry,
            [("Run", true), ("Ready", false), ("Done", false)],
            now,
        )
        .await;
        assert!(!d.record);
        assert_eq!(gate.pending_start(), vec!["Ready"]);

        // Run drops again, Ready rises: both have latched
        let d = step(
            &mut gate,
            &mut registry,
            [("Run", false), ("Ready", true), ("Done", false)],
            now,
        )
        .await;
        assert!(d.record);
        assert!(gate.is_started());

        // Stays open
        let d = step(
            &mut gate,
            &mut registry,
            [("Run", false), ("Ready", false), ("Done", false)],
            now,
        )
        .await;
        assert!(d.record);
    }

    #[tokio::test]
    async fn test_any_stop_condition_stops() {
        let config = DataLoggerConfig::new(1.0, "plc", declared())
            .unwrap()
            .with_stop_conditions(vec![
                condition("Done", EdgeTransitionType::Rising),
                condition("Run", EdgeTransitionType::Falling),
            ])
            .unwrap();
        let mut gate = ConditionGate::new(&config);
        let mut registry = config.tags().clone();
        let now = Instant::now();

        let d = step(
            &mut gate,
            &mut registry,
            [("Run", true), ("Ready", false), ("Done", false)],
            now,
        )
        .await;
        assert_eq!(d, GateDecision { record: true, stop: false });

        let d = step(
            &mut gate,
            &mut registry,
            [("Run", false), ("Ready", false), ("Done", false)],
            now,
        )
        .await;
        assert_eq!(d, GateDecision { record: true, stop: true });
    }

    #[tokio::test]
    async fn test_invalid_tag_does_not_feed_trigger() {
        let config = DataLoggerConfig::new(1.0, "plc", declared())
            .unwrap()
            .with_stop_conditions(vec![condition("Done", EdgeTransitionType::Both)])
            .unwrap();
        let mut gate = ConditionGate::new(&config);
        let mut registry = config.tags().clone();
        let now = Instant::now();

        step(
            &mut gate,
            &mut registry,
            [("Run", true), ("Ready", true), ("Done", false)],
            now,
        )
        .await;

        // Done goes null for a cycle
        let mut source = Signals(HashMap::from([
            ("Run", Some(TagValue::Bool(true))),
            ("Ready", Some(TagValue::Bool(true))),
            ("Done", None),
        ]));
        registry.update_all(&mut source).await.unwrap();
        assert!(!gate.evaluate(&registry, now).stop);

        // Still false compared to the last real reading
        let d = step(
            &mut gate,
            &mut registry,
            [("Run", true), ("Ready", true), ("Done", false)],
            now,
        )
        .await;
        assert!(!d.stop);
    }

    #[tokio::test]
    async fn test_stop_retrigger_refires_sustained_signal() {
        let config = DataLoggerConfig::new(1.0, "plc", declared())
            .unwrap()
            .with_stop_conditions(vec![condition("Done", EdgeTransitionType::Rising)
                .with_retrigger(Duration::from_secs(10))])
            .unwrap();
        let mut gate = ConditionGate::new(&config);
        let mut registry = config.tags().clone();
        let t0 = Instant::now();
        let at = |s: u64| t0 + Duration::from_secs(s);

        let idle = [("Run", true), ("Ready", true), ("Done", false)];
        let done = [("Run", true), ("Ready", true), ("Done", true)];

        assert!(!step(&mut gate, &mut registry, idle, at(0)).await.stop);
        assert!(step(&mut gate, &mut registry, done, at(1)).await.stop);

        // Held high: quiet until the cooldown since the last fire has elapsed
        assert!(!step(&mut gate, &mut registry, done, at(5)).await.stop);
        assert!(!step(&mut gate, &mut registry, done, at(10)).await.stop);
        assert!(step(&mut gate, &mut registry, done, at(11)).await.stop);
    }
}
