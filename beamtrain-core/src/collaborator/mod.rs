//! Collaborator interfaces
//!
//! The coordinator never transmits frames or touches antenna weights itself.
//! It issues instructions through two seams:
//!
//! - [`MacController`]: the MAC/PHY layer that runs sweeps, feedback
//!   exchanges and the MIMO phases.
//! - [`CodebookController`]: the codebook that maps identifiers to physical
//!   antenna configurations and can be refined with extra steering vectors.
//!
//! The recording implementations keep every instruction for inspection. The
//! scenario driver uses them as stand-ins for a real MAC, since the signals
//! that would follow each instruction are already scripted.

mod recording;

use serde::Serialize;

use crate::error::Result;
use crate::model::{MacAddress, SectorCombination, StationId};

pub use recording::{RecordingCodebook, RecordingMac};

/// Instruction issued to the MAC/PHY collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "instruction", rename_all = "snake_case")]
pub enum MacInstruction {
    /// Run a transmit sector sweep towards the BSS coordinator
    StartSectorSweep { station: StationId, bssid: MacAddress },
    /// Answer a feedback poll
    SendFeedbackReport {
        station: StationId,
        target: MacAddress,
        include_awv: bool,
    },
    /// Begin multi-user beam training for a group
    StartGroupTraining { coordinator: StationId, group_id: u8 },
    /// Begin the MIMO phase with the selected candidates
    StartMimoPhase {
        station: StationId,
        candidates: Vec<SectorCombination>,
        use_awv: bool,
    },
}

impl MacInstruction {
    pub fn station(&self) -> StationId {
        match self {
            MacInstruction::StartSectorSweep { station, .. }
            | MacInstruction::SendFeedbackReport { station, .. }
            | MacInstruction::StartMimoPhase { station, .. } => *station,
            MacInstruction::StartGroupTraining { coordinator, .. } => *coordinator,
        }
    }
}

/// MAC/PHY layer driven by the coordinator
pub trait MacController {
    fn start_sector_sweep(&mut self, station: StationId, bssid: MacAddress) -> Result<()>;

    /// `include_awv` selects steering-vector detail instead of sector level
    fn send_feedback_report(&mut self, station: StationId, target: MacAddress, include_awv: bool) -> Result<()>;

    fn start_group_training(&mut self, coordinator: StationId, group_id: u8) -> Result<()>;

    fn start_mimo_phase(&mut self, station: StationId, candidates: &[SectorCombination], use_awv: bool) -> Result<()>;

    /// Controller name (for logging)
    fn name(&self) -> &'static str;
}

/// Codebook refined by the coordinator before fine phases
pub trait CodebookController {
    /// Append refinement steering vectors to every sector of `station`'s codebook
    ///
    /// Called once when the station's first sweep starts and once more
    /// before the fine phase.
    fn append_refinement_steering_vectors(&mut self, station: StationId) -> Result<()>;

    /// Codebook name (for logging)
    fn name(&self) -> &'static str;
}
