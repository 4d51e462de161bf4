//! # Beamtrain Core - MU-MIMO Beam Training
//!
//! Coordinates multi-user beam training between an access point and its
//! client stations:
//!
//! - **Phase Coordinator**: advances every station pair through sector
//!   sweep, SISO feedback, candidate selection and the MIMO phase, strictly
//!   in response to signals from the MAC/PHY collaborator
//! - **Candidate Reducer**: pure K-best selection, minimum-stream ranking
//!   and transmit-antenna diversity reduction
//! - **Trace Sinks**: fixed-schema CSV records of every measurement,
//!   candidate and phase transition
//!
//! ## Core Principle
//!
//! > A phase only advances when the collaborator says it completed.
//!
//! Signals that arrive for unknown pairs or out of order abort the run.
//!
//! ## Example
//!
//! ```rust
//! use beamtrain_core::{select_k_best, FeedbackKey, FeedbackMap, Snr};
//!
//! let mut feedback = FeedbackMap::new();
//! feedback.insert(FeedbackKey::new(1, 1, 1), Snr::new(2.0).unwrap());
//! feedback.insert(FeedbackKey::new(1, 1, 2), Snr::new(8.0).unwrap());
//! feedback.insert(FeedbackKey::new(2, 1, 1), Snr::new(4.0).unwrap());
//!
//! let best = select_k_best(&feedback, 2, 2, 1);
//! assert_eq!(best.len(), 2);
//! assert_eq!(best[0].sector_for(1), Some(2));
//! assert_eq!(best[0].metric, Snr::new(4.0).unwrap());
//! ```

pub mod collaborator;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod model;
pub mod reducer;
pub mod simulation;
pub mod timing;
pub mod trace;

// Re-export main types
pub use collaborator::{CodebookController, MacController, MacInstruction, RecordingCodebook, RecordingMac};
pub use config::RunConfig;
pub use coordinator::{
    DeferredAction, LinkKey, LinkTrainingState, Phase, PhaseCoordinator, RunContext, Signal,
    SignalContext,
};
pub use error::{BeamError, ErrorCategory, Result};
pub use model::{
    AntennaConfiguration, AntennaSector, FeedbackKey, FeedbackMap, MimoCombination,
    SectorCombination, Snr, Station, StationId, StationRole,
};
pub use reducer::{min_stream_snr, reduce_for_diversity, select_k_best, RankedCombinations};
pub use simulation::{RunReport, Scenario, Simulator};
pub use timing::{EventScheduler, SimDuration, SimTime};
pub use trace::{CsvTraceSink, InMemoryTraceSink, NullTraceSink, TraceRecord, TraceSink};
