//! Simulation Driver
//!
//! Replays a [`Scenario`] through a [`PhaseCoordinator`] on a deterministic
//! discrete-event timeline. The driver owns the event queue and the
//! [`RunContext`]; the coordinator only sees them for the duration of one
//! dispatch.
//!
//! # Example
//!
//! ```rust
//! use beamtrain_core::collaborator::{RecordingCodebook, RecordingMac};
//! use beamtrain_core::config::RunConfig;
//! use beamtrain_core::coordinator::Signal;
//! use beamtrain_core::model::{Station, StationId, StationRole};
//! use beamtrain_core::simulation::{Scenario, Simulator};
//! use beamtrain_core::trace::NullTraceSink;
//!
//! let scenario = Scenario::new(vec![
//!     Station::new(0, StationRole::Coordinator),
//!     Station::new(1, StationRole::Client),
//! ])
//! .at(1_000, Signal::AssociationCompleted {
//!     station: StationId(1),
//!     coordinator: StationId(0),
//!     aid: 1,
//! })
//! .at(2_000, Signal::DataIntervalStarted { station: StationId(1) });
//!
//! let mut simulator = Simulator::new(
//!     RunConfig::default(),
//!     scenario,
//!     RecordingMac::new(),
//!     RecordingCodebook::new(),
//!     NullTraceSink::new(),
//! ).unwrap();
//! let report = simulator.run().unwrap();
//! assert_eq!(report.events_dispatched, 2);
//! assert_eq!(simulator.coordinator().mac().count(), 1);
//! ```

mod report;
mod scenario;

use chrono::Utc;
use tracing::{error, info};

use crate::collaborator::{CodebookController, MacController};
use crate::config::RunConfig;
use crate::coordinator::{DeferredAction, PhaseCoordinator, RunContext, Signal, SignalContext};
use crate::error::Result;
use crate::timing::{EventQueue, EventScheduler, SimDuration, SimTime};
use crate::trace::TraceSink;

pub use report::{LinkReport, RunReport};
pub use scenario::{Scenario, ScriptedEvent};

/// Payload of a queued event
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// Scripted collaborator signal
    Signal(Signal),
    /// Work the coordinator deferred
    Deferred(DeferredAction),
}

impl EventScheduler for EventQueue<SimEvent> {
    fn now(&self) -> SimTime {
        EventQueue::now(self)
    }

    /// Deferred work inherits the trace index of the event that scheduled it
    fn schedule(&mut self, delay: SimDuration, action: DeferredAction) {
        let at = EventQueue::now(self) + delay;
        let trace_index = self.trace_index();
        self.push_at(at, trace_index, SimEvent::Deferred(action));
    }

    fn name(&self) -> &'static str {
        "event-queue"
    }
}

/// Scenario replay driver
pub struct Simulator<M, C, S> {
    coordinator: PhaseCoordinator<M, C, S>,
    queue: EventQueue<SimEvent>,
    run: RunContext,
    horizon: SimTime,
    dispatched: u64,
}

impl<M, C, S> Simulator<M, C, S>
where
    M: MacController,
    C: CodebookController,
    S: TraceSink,
{
    /// Validate the inputs, register the stations and load the script
    pub fn new(config: RunConfig, scenario: Scenario, mac: M, codebook: C, sink: S) -> Result<Self> {
        config.validate()?;
        scenario.validate()?;

        let horizon = config.simulation_horizon();
        let mut coordinator =
            PhaseCoordinator::new(config, mac, codebook, sink).with_group_id(scenario.group_id);
        for station in scenario.stations {
            coordinator.register_station(station)?;
        }

        let mut queue = EventQueue::new();
        for event in scenario.events {
            queue.push_at(event.time(), event.trace_index, SimEvent::Signal(event.signal));
        }
        info!(events = queue.len(), horizon = %horizon, "Scenario loaded");

        Ok(Self {
            coordinator,
            queue,
            run: RunContext::new(),
            horizon,
            dispatched: 0,
        })
    }

    /// Dispatch events in time order until the queue drains or the horizon
    /// passes
    ///
    /// A fatal error aborts the run; no further events are dispatched.
    pub fn run(&mut self) -> Result<RunReport> {
        let started_at = Utc::now();

        while let Some(time) = self.queue.peek_time() {
            if time > self.horizon {
                info!(
                    pending = self.queue.len(),
                    "Simulation horizon {} reached", self.horizon
                );
                break;
            }
            if let Err(err) = self.step() {
                error!(code = err.error_code(), fatal = err.is_fatal(), "Run aborted: {}", err);
                return Err(err);
            }
        }

        self.coordinator.finish()?;
        let report = RunReport::new(
            started_at,
            self.queue.now(),
            self.dispatched,
            self.coordinator.config(),
            &self.run,
            self.coordinator.links(),
        );
        info!(
            run_id = %report.run_id,
            dispatched = report.events_dispatched,
            incomplete = report.incomplete_links().len(),
            "Run finished at {}", report.simulated_until
        );
        Ok(report)
    }

    /// Dispatch the next event, ignoring the horizon
    ///
    /// Returns `false` once the queue is empty.
    pub fn step(&mut self) -> Result<bool> {
        let Some(event) = self.queue.pop() else {
            return Ok(false);
        };
        let ctx = SignalContext::new(event.time, event.trace_index);
        match &event.payload {
            SimEvent::Signal(signal) => {
                self.coordinator
                    .handle(&mut self.run, &mut self.queue, ctx, signal)?
            }
            SimEvent::Deferred(action) => self.coordinator.on_deferred(ctx, action)?,
        }
        self.dispatched += 1;
        Ok(true)
    }

    pub fn coordinator(&self) -> &PhaseCoordinator<M, C, S> {
        &self.coordinator
    }

    pub fn run_context(&self) -> &RunContext {
        &self.run
    }

    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    pub fn horizon(&self) -> SimTime {
        self.horizon
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{RecordingCodebook, RecordingMac};
    use crate::model::{AccessPeriod, Station, StationId, StationRole};
    use crate::trace::InMemoryTraceSink;

    const AP: StationId = StationId(0);
    const STA: StationId = StationId(1);

    fn sweep(station: StationId, peer: StationId) -> Signal {
        Signal::SectorSweepCompleted {
            station,
            peer,
            antenna_id: 1,
            sector_id: 3,
            access_period: AccessPeriod::Dti,
        }
    }

    fn simulator(
        config: RunConfig,
        scenario: Scenario,
    ) -> Simulator<RecordingMac, RecordingCodebook, InMemoryTraceSink> {
        Simulator::new(
            config,
            scenario,
            RecordingMac::new(),
            RecordingCodebook::new(),
            InMemoryTraceSink::new(),
        )
        .unwrap()
    }

    fn stations() -> Vec<Station> {
        vec![
            Station::new(0, StationRole::Coordinator),
            Station::new(1, StationRole::Client),
        ]
    }

    #[test]
    fn test_deferred_trigger_runs_after_delay() {
        let config = RunConfig {
            group_training_links: 2,
            ..RunConfig::default()
        };
        let scenario = Scenario::new(stations())
            .at(100, sweep(STA, AP))
            .at(200, sweep(AP, STA))
            .at(1_000, Signal::CoordinatorDataIntervalStarted { coordinator: AP });
        let mut sim = simulator(config, scenario);

        let report = sim.run().unwrap();
        assert_eq!(report.events_dispatched, 4);
        assert!(report.group_training_triggered);
        assert_eq!(sim.now(), SimTime(2_000));
        assert_eq!(sim.coordinator().mac().group_training_starts(), 1);
    }

    #[test]
    fn test_events_past_horizon_are_not_dispatched() {
        let config = RunConfig {
            simulation_time_s: 0.001,
            ..RunConfig::default()
        };
        let late = config.simulation_horizon().as_nanos() + 1;
        let scenario = Scenario::new(stations())
            .at(10, sweep(STA, AP))
            .at(late, sweep(AP, STA));
        let mut sim = simulator(config, scenario);

        let report = sim.run().unwrap();
        assert_eq!(report.events_dispatched, 1);
        assert_eq!(report.links.len(), 1);
        assert_eq!(sim.pending(), 1);
    }

    #[test]
    fn test_fatal_error_aborts_run() {
        let scenario = Scenario::new(stations())
            .at(10, Signal::MimoPhaseComplete { station: STA })
            .at(20, sweep(STA, AP));
        let mut sim = simulator(RunConfig::default(), scenario);

        let err = sim.run().unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(sim.pending(), 1);
        assert!(sim.coordinator().links().is_empty());
    }

    #[test]
    fn test_deferred_inherits_trace_index() {
        let mut queue: EventQueue<SimEvent> = EventQueue::new();
        queue.push_at(SimTime(50), 9, SimEvent::Signal(sweep(STA, AP)));
        queue.pop();
        EventScheduler::schedule(
            &mut queue,
            SimDuration::from_micros(1),
            DeferredAction::StartGroupTraining {
                coordinator: AP,
                group_id: 1,
            },
        );
        let event = queue.pop().unwrap();
        assert_eq!(event.time, SimTime(1_050));
        assert_eq!(event.trace_index, 9);
    }
}
