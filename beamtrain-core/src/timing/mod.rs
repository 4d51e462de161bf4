//! # Simulated Time & Scheduling
//!
//! The coordinator runs inside a single-threaded, cooperative discrete-event
//! timeline. Every signal executes to completion at its timestamp; the only
//! work the coordinator defers is the group-training trigger, inserted a few
//! microseconds after the event that armed it so the collaborator's own
//! dispatch is not re-entered.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 EventScheduler (trait)                       │
//! ├──────────────────────────────┬───────────────────────────────┤
//! │ EventQueue<SimEvent>         │ RecordingScheduler            │
//! │ (simulation driver)          │ (tests: records, never fires) │
//! └──────────────────────────────┴───────────────────────────────┘
//! ```

mod queue;
mod recording;

use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Serialize};

use crate::coordinator::DeferredAction;

pub use queue::{EventQueue, QueuedEvent};
pub use recording::{RecordedAction, RecordingScheduler};

/// Simulated timestamp in nanoseconds since run start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_secs_f64(secs: f64) -> Self {
        SimTime((secs * 1e9).round().max(0.0) as u64)
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1e9
    }
}

impl Add<SimDuration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.9}s", self.as_secs_f64())
    }
}

/// Simulated span in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimDuration(pub u64);

impl SimDuration {
    pub fn from_micros(us: u64) -> Self {
        SimDuration(us.saturating_mul(1_000))
    }

    pub fn from_millis(ms: u64) -> Self {
        SimDuration(ms.saturating_mul(1_000_000))
    }

    pub fn as_nanos(&self) -> u64 {
        self.0
    }
}

/// Scheduler the coordinator uses to defer its own actions
///
/// Implementations insert the action into the timeline; they never run it
/// synchronously.
pub trait EventScheduler {
    /// Current simulated time
    fn now(&self) -> SimTime;

    /// Insert `action` at `now() + delay`
    fn schedule(&mut self, delay: SimDuration, action: DeferredAction);

    /// Scheduler name (for logging)
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_time_arithmetic() {
        let t = SimTime::from_secs_f64(1.5) + SimDuration::from_micros(1);
        assert_eq!(t.as_nanos(), 1_500_001_000);
        assert_eq!(SimTime(u64::MAX) + SimDuration(5), SimTime(u64::MAX));
    }

    #[test]
    fn test_sim_time_display() {
        assert_eq!(SimTime(1_000_000_000).to_string(), "1.000000000s");
    }
}
