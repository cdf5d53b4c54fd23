use std::time::{Duration, Instant};

use crate::error::EngineError;

/// Cooperative deadline threaded through engine entry points. Checked at
/// stacking-group boundaries during composition and before each candidate
/// during optimization; nothing is ever killed mid-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
        }
    }

    pub fn at(at: Instant) -> Self {
        Self { at }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// The sooner of two deadlines.
    pub fn earliest(self, other: Deadline) -> Deadline {
        if self.at <= other.at {
            self
        } else {
            other
        }
    }

    pub fn check_composition(&self) -> Result<(), EngineError> {
        if self.expired() {
            Err(EngineError::CalculationTimeout)
        } else {
            Ok(())
        }
    }

    pub fn check_optimization(&self) -> Result<(), EngineError> {
        if self.expired() {
            Err(EngineError::OptimizationTimeout)
        } else {
            Ok(())
        }
    }
}
