//! Per-link training state and the run-wide context

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{SectorCombination, StationId};

/// Training phase of one station pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Idle,
    SectorSweep,
    SisoFeedback,
    CandidateSelection,
    MimoPhase,
    Complete,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::SectorSweep => "SectorSweep",
            Phase::SisoFeedback => "SisoFeedback",
            Phase::CandidateSelection => "CandidateSelection",
            Phase::MimoPhase => "MimoPhase",
            Phase::Complete => "Complete",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Phase::Complete)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered station pair `src -> dst`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub src: StationId,
    pub dst: StationId,
}

impl LinkKey {
    pub fn new(src: StationId, dst: StationId) -> Self {
        Self { src, dst }
    }

    /// Whether either end of the link is `station`
    pub fn touches(&self, station: StationId) -> bool {
        self.src == station || self.dst == station
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Training state of one station pair
///
/// Created when the pair's first sector sweep completes and kept until the
/// run ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkTrainingState {
    pub phase: Phase,
    /// Measurements received across all phases
    pub measurements: u32,
    /// Best-known candidates from the last K-best selection
    pub candidates: Vec<SectorCombination>,
}

impl LinkTrainingState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            measurements: 0,
            candidates: Vec::new(),
        }
    }
}

impl Default for LinkTrainingState {
    fn default() -> Self {
        Self::new()
    }
}

/// Frame-level counters reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameCounters {
    pub transmitted: u64,
    pub received: u64,
    pub dropped: u64,
    pub mac_tx_failed: u64,
}

/// Kind of frame-level event counted in [`FrameCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameEventKind {
    PhyTxEnd,
    PhyRxEnd,
    PhyRxDrop,
    MacTxDataFailed,
}

impl FrameCounters {
    pub fn count(&mut self, kind: FrameEventKind) {
        match kind {
            FrameEventKind::PhyTxEnd => self.transmitted += 1,
            FrameEventKind::PhyRxEnd => self.received += 1,
            FrameEventKind::PhyRxDrop => self.dropped += 1,
            FrameEventKind::MacTxDataFailed => self.mac_tx_failed += 1,
        }
    }
}

/// Run-wide counters and flags, owned by the simulation driver
///
/// Only the coordinator mutates it, from the single dispatch loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunContext {
    beamformed_links: u32,
    group_trigger_fired: bool,
    group_training_completed: bool,
    frame_counters: FrameCounters,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beamformed_links(&self) -> u32 {
        self.beamformed_links
    }

    pub fn record_beamformed_link(&mut self) -> u32 {
        self.beamformed_links += 1;
        self.beamformed_links
    }

    pub fn group_trigger_fired(&self) -> bool {
        self.group_trigger_fired
    }

    pub fn mark_group_trigger_fired(&mut self) {
        self.group_trigger_fired = true;
    }

    pub fn group_training_completed(&self) -> bool {
        self.group_training_completed
    }

    pub fn mark_group_training_completed(&mut self) {
        self.group_training_completed = true;
    }

    pub fn frame_counters(&self) -> &FrameCounters {
        &self.frame_counters
    }

    pub fn count_frame(&mut self, kind: FrameEventKind) {
        self.frame_counters.count(kind);
    }
}
