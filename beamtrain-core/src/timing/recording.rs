//! Recording scheduler for testing
//!
//! Records every deferred action without ever firing it, so tests can assert
//! what the coordinator scheduled and when.

use crate::coordinator::DeferredAction;

use super::{EventScheduler, SimDuration, SimTime};

/// A recorded deferred action
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAction {
    /// Time the action was scheduled from
    pub scheduled_at: SimTime,
    pub delay: SimDuration,
    pub action: DeferredAction,
}

impl RecordedAction {
    pub fn fires_at(&self) -> SimTime {
        self.scheduled_at + self.delay
    }
}

/// Scheduler that records actions instead of running them
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    now: SimTime,
    recorded: Vec<RecordedAction>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock; tests drive time by hand
    pub fn set_now(&mut self, now: SimTime) {
        self.now = now;
    }

    pub fn recorded(&self) -> &[RecordedAction] {
        &self.recorded
    }

    pub fn count(&self) -> usize {
        self.recorded.len()
    }

    pub fn clear(&mut self) {
        self.recorded.clear();
    }
}

impl EventScheduler for RecordingScheduler {
    fn now(&self) -> SimTime {
        self.now
    }

    fn schedule(&mut self, delay: SimDuration, action: DeferredAction) {
        self.recorded.push(RecordedAction {
            scheduled_at: self.now,
            delay,
            action,
        });
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}
