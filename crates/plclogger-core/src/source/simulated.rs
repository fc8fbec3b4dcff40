//! Simulated controller for running the logger without hardware
//!
//! Models a production line that alternates between idle and running
//! phases of random length. While running, a motor spins up, parts are
//! counted and a supply tank drains; while idle the tank refills.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tokio::time::Instant;

use super::{SourceError, TagSource};
use crate::tag::TagValue;

/// Tags exposed by [`SimulatedController`]
pub const SIMULATED_TAGS: &[&str] = &[
    "Line_Running",
    "Motor_Speed",
    "Part_Count",
    "Tank_Level",
    "Batch_Active",
    "Fault_Code",
];

const RAMP_UP_MS: u64 = 2_000;
const RAMP_DOWN_MS: u64 = 3_000;
const NOMINAL_SPEED_RPM: f64 = 1_750.0;
/// Parts produced per motor revolution
const PARTS_PER_REV: f64 = 0.01;

/// Simulated controller that answers tag reads with synthetic process data
pub struct SimulatedController {
    /// Clock origin for reads through [`TagSource`]
    origin: Instant,
    /// Time of the first update (ms)
    start_time_ms: Option<u64>,
    /// Last update time (ms)
    last_update_ms: u64,
    /// Time of next line start (ms from start)
    next_start_at_ms: u64,
    line_state: LineState,
    motor_speed: f64,
    part_count: i64,
    /// Fraction of the next part already produced
    part_progress: f64,
    tank_level: f64,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LineState {
    /// Line stopped, waiting for the next batch
    Idle,
    /// Motor spinning up
    Accelerating { start_ms: u64 },
    /// Producing parts
    Running { start_ms: u64, duration_ms: u64 },
    /// Motor coasting down
    Stopping { start_ms: u64 },
}

impl Default for SimulatedController {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedController {
    /// Create a simulator seeded from system entropy
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a simulator with a fixed seed, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(mut rng: StdRng) -> Self {
        let first_start = rng.gen_range(5_000..15_000);

        Self {
            origin: Instant::now(),
            start_time_ms: None,
            last_update_ms: 0,
            next_start_at_ms: first_start,
            line_state: LineState::Idle,
            motor_speed: 0.0,
            part_count: 0,
            part_progress: 0.0,
            tank_level: 80.0,
            rng,
        }
    }

    /// Advance the simulation and return every tag value
    ///
    /// # Arguments
    /// * `elapsed_ms` - Milliseconds since the simulation clock started
    pub fn update(&mut self, elapsed_ms: u64) -> HashMap<&'static str, TagValue> {
        let start = *self.start_time_ms.get_or_insert(elapsed_ms);
        let sim_time = elapsed_ms.saturating_sub(start);
        let delta_ms = elapsed_ms.saturating_sub(self.last_update_ms.max(start));
        self.last_update_ms = elapsed_ms;
        let dt = delta_ms as f64 / 1000.0;

        self.update_line_state(sim_time);

        let target = self.target_speed(sim_time);
        // RPM/sec
        let rate = if target > self.motor_speed { 1_200.0 } else { 800.0 };
        let max_change = rate * dt;
        self.motor_speed += (target - self.motor_speed).clamp(-max_change, max_change);

        let producing = matches!(self.line_state, LineState::Running { .. });
        if producing {
            self.part_progress += self.motor_speed / 60.0 * dt * PARTS_PER_REV;
            let finished = self.part_progress.floor();
            self.part_count += finished as i64;
            self.part_progress -= finished;
            self.tank_level -= 0.8 * dt;
        } else {
            self.tank_level += 0.5 * dt;
        }
        self.tank_level = self.tank_level.clamp(5.0, 95.0);

        let t = sim_time as f64 / 1000.0;
        let speed = if self.motor_speed > 1.0 {
            self.motor_speed + 6.0 * (t * 3.1).sin()
        } else {
            0.0
        };
        let level = self.tank_level + 0.3 * (t * 0.7).sin();

        let line_running = !matches!(self.line_state, LineState::Idle);

        let mut data = HashMap::new();
        data.insert("Line_Running", TagValue::Bool(line_running));
        data.insert("Motor_Speed", TagValue::Real(speed.max(0.0)));
        data.insert("Part_Count", TagValue::Int(self.part_count));
        data.insert("Tank_Level", TagValue::Real(level.clamp(0.0, 100.0)));
        data.insert("Batch_Active", TagValue::Bool(producing));
        data.insert("Fault_Code", TagValue::Int(0));
        data
    }

    fn update_line_state(&mut self, sim_time: u64) {
        match self.line_state {
            LineState::Idle => {
                if sim_time >= self.next_start_at_ms {
                    self.line_state = LineState::Accelerating { start_ms: sim_time };
                }
            }
            LineState::Accelerating { start_ms } => {
                if sim_time >= start_ms + RAMP_UP_MS {
                    let duration_ms = self.rng.gen_range(20_000..60_000);
                    self.line_state = LineState::Running {
                        start_ms: sim_time,
                        duration_ms,
                    };
                }
            }
            LineState::Running {
                start_ms,
                duration_ms,
            } => {
                if sim_time >= start_ms + duration_ms {
                    self.line_state = LineState::Stopping { start_ms: sim_time };
                }
            }
            LineState::Stopping { start_ms } => {
                if sim_time >= start_ms + RAMP_DOWN_MS {
                    self.line_state = LineState::Idle;
                    self.next_start_at_ms = sim_time + self.rng.gen_range(10_000..30_000);
                }
            }
        }
    }

    fn target_speed(&self, sim_time: u64) -> f64 {
        match self.line_state {
            LineState::Idle => 0.0,
            LineState::Accelerating { start_ms } => {
                let ramp = sim_time.saturating_sub(start_ms) as f64;
                let progress = (ramp / RAMP_UP_MS as f64).min(1.0);
                NOMINAL_SPEED_RPM * progress
            }
            LineState::Running { .. } => NOMINAL_SPEED_RPM,
            LineState::Stopping { .. } => 0.0,
        }
    }
}

impl TagSource for SimulatedController {
    async fn read(&mut self, tag_name: &str) -> Result<Option<TagValue>, SourceError> {
        let elapsed_ms = self.origin.elapsed().as_millis() as u64;
        let mut values = self.update(elapsed_ms);
        values
            .remove(tag_name)
            .map(Some)
            .ok_or_else(|| SourceError::UnknownTag(tag_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulator_exposes_all_tags() {
        let mut sim = SimulatedController::with_seed(7);
        let data = sim.update(0);

        for name in SIMULATED_TAGS {
            assert!(data.contains_key(name), "missing {}", name);
        }
        assert_eq!(data["Line_Running"], TagValue::Bool(false));
        assert_eq!(data["Part_Count"], TagValue::Int(0));
    }

    #[test]
    fn test_line_starts_and_counts_parts() {
        let mut sim = SimulatedController::with_seed(42);

        let mut saw_running = false;
        let mut last_count = 0;
        // Two simulated minutes at 100 ms resolution
        for ms in (0..120_000).step_by(100) {
            let data = sim.update(ms);
            if data["Line_Running"] == TagValue::Bool(true) {
                saw_running = true;
            }
            if let TagValue::Int(count) = data["Part_Count"] {
                assert!(count >= last_count, "part count went backwards");
                last_count = count;
            }
        }

        assert!(saw_running);
        assert!(last_count > 0);
    }

    #[test]
    fn test_idle_motor_is_stopped() {
        let mut sim = SimulatedController::with_seed(3);
        // First start is at least 5 s out
        for ms in (0..4_000).step_by(250) {
            let data = sim.update(ms);
            assert_eq!(data["Motor_Speed"], TagValue::Real(0.0));
            assert_eq!(data["Batch_Active"], TagValue::Bool(false));
        }
    }

    #[tokio::test]
    async fn test_unknown_tag_read() {
        let mut sim = SimulatedController::with_seed(1);
        let err = sim.read("Not_A_Tag").await.unwrap_err();
        assert!(matches!(err, SourceError::UnknownTag(ref n) if n == "Not_A_Tag"));

        let value = sim.read("Fault_Code").await.unwrap();
        assert_eq!(value, Some(TagValue::Int(0)));
    }
}
