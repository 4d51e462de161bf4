//! Recording collaborators
//!
//! Record every instruction for inspection in tests and scenario replays.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{MacAddress, SectorCombination, StationId};

use super::{CodebookController, MacController, MacInstruction};

/// MAC collaborator that records instructions
#[derive(Debug, Default)]
pub struct RecordingMac {
    instructions: Vec<MacInstruction>,
}

impl RecordingMac {
    pub fn new() -> Self {
        Self::default()
    }

    /// All instructions in issue order
    pub fn instructions(&self) -> &[MacInstruction] {
        &self.instructions
    }

    /// Instructions addressed to one station
    pub fn for_station(&self, station: StationId) -> Vec<&MacInstruction> {
        self.instructions
            .iter()
            .filter(|i| i.station() == station)
            .collect()
    }

    pub fn group_training_starts(&self) -> usize {
        self.instructions
            .iter()
            .filter(|i| matches!(i, MacInstruction::StartGroupTraining { .. }))
            .count()
    }

    pub fn count(&self) -> usize {
        self.instructions.len()
    }

    pub fn clear(&mut self) {
        self.instructions.clear();
    }
}

impl MacController for RecordingMac {
    fn start_sector_sweep(&mut self, station: StationId, bssid: MacAddress) -> Result<()> {
        self.instructions
            .push(MacInstruction::StartSectorSweep { station, bssid });
        Ok(())
    }

    fn send_feedback_report(&mut self, station: StationId, target: MacAddress, include_awv: bool) -> Result<()> {
        self.instructions.push(MacInstruction::SendFeedbackReport {
            station,
            target,
            include_awv,
        });
        Ok(())
    }

    fn start_group_training(&mut self, coordinator: StationId, group_id: u8) -> Result<()> {
        self.instructions
            .push(MacInstruction::StartGroupTraining { coordinator, group_id });
        Ok(())
    }

    fn start_mimo_phase(&mut self, station: StationId, candidates: &[SectorCombination], use_awv: bool) -> Result<()> {
        self.instructions.push(MacInstruction::StartMimoPhase {
            station,
            candidates: candidates.to_vec(),
            use_awv,
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Codebook collaborator that counts refinements per station
#[derive(Debug, Default)]
pub struct RecordingCodebook {
    refinements: BTreeMap<StationId, usize>,
}

impl RecordingCodebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `station`'s codebook was refined
    pub fn refinements(&self, station: StationId) -> usize {
        self.refinements.get(&station).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.refinements.values().sum()
    }
}

impl CodebookController for RecordingCodebook {
    fn append_refinement_steering_vectors(&mut self, station: StationId) -> Result<()> {
        *self.refinements.entry(station).or_default() += 1;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_mac() {
        let mut mac = RecordingMac::new();
        mac.start_sector_sweep(StationId(1), MacAddress::sequential(0)).unwrap();
        mac.start_group_training(StationId(0), 1).unwrap();

        assert_eq!(mac.count(), 2);
        assert_eq!(mac.group_training_starts(), 1);
        assert_eq!(mac.for_station(StationId(1)).len(), 1);

        mac.clear();
        assert_eq!(mac.count(), 0);
    }

    #[test]
    fn test_recording_codebook() {
        let mut codebook = RecordingCodebook::new();
        codebook.append_refinement_steering_vectors(StationId(2)).unwrap();
        codebook.append_refinement_steering_vectors(StationId(2)).unwrap();

        assert_eq!(codebook.refinements(StationId(2)), 2);
        assert_eq!(codebook.refinements(StationId(3)), 0);
        assert_eq!(codebook.total(), 2);
    }
}
