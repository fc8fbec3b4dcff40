//! Single edge detector

use std::fmt;
use std::time::Instant;

use super::EdgeTransitionType;

type Callback = Box<dyn FnMut() + Send>;

/// Detects one kind of transition between consecutive boolean observations.
///
/// Every call to [`EdgeTrigger::evaluate`] replaces the stored baseline with the
/// new observation, whether or not it fired.
pub struct EdgeTrigger {
    transition: EdgeTransitionType,
    /// Previous observation, `None` until the first evaluation
    last_input: Option<bool>,
    /// When the trigger last fired (construction time until then)
    last_fired_at: Instant,
    callback: Option<Callback>,
}

impl EdgeTrigger {
    /// Create a trigger without a callback
    pub fn new(transition: EdgeTransitionType) -> Self {
        Self {
            transition,
            last_input: None,
            last_fired_at: Instant::now(),
            callback: None,
        }
    }

    /// Create a trigger that runs `callback` every time it fires
    pub fn with_callback<F>(transition: EdgeTransitionType, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            callback: Some(Box::new(callback)),
            ..Self::new(transition)
        }
    }

    /// Rising-edge trigger
    pub fn rising() -> Self {
        Self::new(EdgeTransitionType::Rising)
    }

    /// Falling-edge trigger
    pub fn falling() -> Self {
        Self::new(EdgeTransitionType::Falling)
    }

    /// Trigger on any change
    pub fn both() -> Self {
        Self::new(EdgeTransitionType::Both)
    }

    /// Feed the current observation, returning whether it fired
    pub fn evaluate(&mut self, current: bool) -> bool {
        self.evaluate_at(current, Instant::now())
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit clock reading
    pub fn evaluate_at(&mut self, current: bool, now: Instant) -> bool {
        let fired = self.transition.fires(self.last_input, current);
        self.last_input = Some(current);

        if fired {
            self.last_fired_at = now;
            if let Some(callback) = self.callback.as_mut() {
                callback();
            }
        }

        fired
    }

    /// Transition type this trigger detects
    pub fn transition(&self) -> EdgeTransitionType {
        self.transition
    }

    /// Last observation fed to the trigger
    pub fn last_input(&self) -> Option<bool> {
        self.last_input
    }

    /// Time of the last fire
    pub fn last_fired_at(&self) -> Instant {
        self.last_fired_at
    }

    /// Overwrite the baseline used for the next evaluation
    pub(crate) fn force_last_input(&mut self, value: bool) {
        self.last_input = Some(value);
    }
}

impl fmt::Debug for EdgeTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdgeTrigger")
            .field("transition", &self.transition)
            .field("last_input", &self.last_input)
            .field("last_fired_at", &self.last_fired_at)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}
