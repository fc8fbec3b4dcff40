//! Cooldown re-arming for directional triggers

use std::time::{Duration, Instant};

use super::{EdgeTransitionType, EdgeTrigger};

/// Re-arms a directional [`EdgeTrigger`] once `cooldown` has passed since it
/// last fired, so a signal that stays asserted fires again on the next
/// evaluation.
#[derive(Debug)]
pub struct EdgeRetrigger {
    trigger: EdgeTrigger,
    cooldown: Duration,
}

impl EdgeRetrigger {
    /// Wrap `trigger` with the given cooldown
    pub fn new(trigger: EdgeTrigger, cooldown: Duration) -> Self {
        Self { trigger, cooldown }
    }

    /// Called once per sampling cycle, independent of trigger activity
    pub fn tick(&mut self, now: Instant) {
        let transition = self.trigger.transition();
        if !transition.is_directional() {
            return;
        }

        if now.saturating_duration_since(self.trigger.last_fired_at()) < self.cooldown {
            return;
        }

        match transition {
            EdgeTransitionType::Rising => self.trigger.force_last_input(false),
            EdgeTransitionType::Falling => self.trigger.force_last_input(true),
            EdgeTransitionType::Both => {}
        }
    }

    /// Feed an observation to the wrapped trigger
    pub fn evaluate_at(&mut self, current: bool, now: Instant) -> bool {
        self.trigger.evaluate_at(current, now)
    }

    /// Cooldown before the trigger is re-armed
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// The wrapped trigger
    pub fn trigger(&self) -> &EdgeTrigger {
        &self.trigger
    }

    /// Unwrap the trigger
    pub fn into_inner(self) -> EdgeTrigger {
        self.trigger
    }
}
