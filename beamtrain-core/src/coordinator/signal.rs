//! Signals delivered by the MAC/PHY collaborator

use serde::{Deserialize, Serialize};

use crate::model::{
    candidate_lists, feedback_entries, AccessPeriod, FeedbackMap, MimoCombination, SisoMeasurement, StationId,
    TxCandidateTable,
};
use crate::timing::SimTime;

use super::FrameEventKind;

/// Where and when a signal is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalContext {
    pub time: SimTime,
    /// Channel-model trace index in effect
    pub trace_index: u32,
}

impl SignalContext {
    pub fn new(time: SimTime, trace_index: u32) -> Self {
        Self { time, trace_index }
    }
}

/// Phase-completion and bookkeeping signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum Signal {
    /// A client finished associating with the coordinator
    AssociationCompleted {
        station: StationId,
        coordinator: StationId,
        aid: u16,
    },
    /// A data transmission interval started at a client
    DataIntervalStarted { station: StationId },
    /// A data transmission interval started at the coordinator
    CoordinatorDataIntervalStarted { coordinator: StationId },
    /// Sector sweep finished and found the best transmit configuration
    SectorSweepCompleted {
        station: StationId,
        peer: StationId,
        antenna_id: u8,
        sector_id: u8,
        access_period: AccessPeriod,
    },
    /// A client was polled for its SISO feedback
    FeedbackPollReceived { station: StationId, from: StationId },
    /// Raw SISO samples measured by `station` from `from`'s transmissions
    SisoMeasurementsReported {
        station: StationId,
        from: StationId,
        measurements: Vec<SisoMeasurement>,
    },
    /// The coordinator collected all SISO feedback
    SisoPhaseComplete {
        station: StationId,
        #[serde(with = "feedback_entries")]
        feedback: FeedbackMap,
        n_tx: u8,
        n_rx: u8,
    },
    /// Candidate sectors actually scheduled for MIMO measurement
    MimoCandidatesSelected {
        station: StationId,
        group_id: u8,
        #[serde(with = "candidate_lists")]
        candidates: TxCandidateTable,
    },
    /// Every MIMO combination `station` measured from `from`
    MimoPhaseMeasurementsReported {
        station: StationId,
        from: StationId,
        combinations: Vec<MimoCombination>,
        /// Whether distinct receive configurations were measured
        distinct_rx: bool,
        n_tx: u8,
        n_rx: u8,
    },
    MimoPhaseComplete { station: StationId },
    /// Receive SNR of a successfully received frame
    RxSnrReported { station: StationId, snr_db: f64 },
    FrameEvent { station: StationId, kind: FrameEventKind },
}

impl Signal {
    /// Stable signal name, matching the serialized tag
    pub fn name(&self) -> &'static str {
        match self {
            Signal::AssociationCompleted { .. } => "association_completed",
            Signal::DataIntervalStarted { .. } => "data_interval_started",
            Signal::CoordinatorDataIntervalStarted { .. } => "coordinator_data_interval_started",
            Signal::SectorSweepCompleted { .. } => "sector_sweep_completed",
            Signal::FeedbackPollReceived { .. } => "feedback_poll_received",
            Signal::SisoMeasurementsReported { .. } => "siso_measurements_reported",
            Signal::SisoPhaseComplete { .. } => "siso_phase_complete",
            Signal::MimoCandidatesSelected { .. } => "mimo_candidates_selected",
            Signal::MimoPhaseMeasurementsReported { .. } => "mimo_phase_measurements_reported",
            Signal::MimoPhaseComplete { .. } => "mimo_phase_complete",
            Signal::RxSnrReported { .. } => "rx_snr_reported",
            Signal::FrameEvent { .. } => "frame_event",
        }
    }

    /// Station the signal was raised at
    pub fn station(&self) -> StationId {
        match self {
            Signal::AssociationCompleted { station, .. }
            | Signal::DataIntervalStarted { station }
            | Signal::SectorSweepCompleted { station, .. }
            | Signal::FeedbackPollReceived { station, .. }
            | Signal::SisoMeasurementsReported { station, .. }
            | Signal::SisoPhaseComplete { station, .. }
            | Signal::MimoCandidatesSelected { station, .. }
            | Signal::MimoPhaseMeasurementsReported { station, .. }
            | Signal::MimoPhaseComplete { station }
            | Signal::RxSnrReported { station, .. }
            | Signal::FrameEvent { station, .. } => *station,
            Signal::CoordinatorDataIntervalStarted { coordinator } => *coordinator,
        }
    }
}

/// Work the coordinator defers to a later simulated time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DeferredAction {
    StartGroupTraining { coordinator: StationId, group_id: u8 },
}
