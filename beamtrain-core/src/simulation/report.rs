//! End-of-run summary

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::RunConfig;
use crate::coordinator::{FrameCounters, LinkKey, LinkTrainingState, Phase, RunContext};
use crate::error::{BeamError, Result};
use crate::model::{SectorCombination, StationId};
use crate::timing::SimTime;

/// Final state of one station pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkReport {
    pub src: StationId,
    pub dst: StationId,
    pub phase: Phase,
    pub measurements: u32,
    pub candidates: Vec<SectorCombination>,
}

impl LinkReport {
    pub fn from_state(key: LinkKey, state: &LinkTrainingState) -> Self {
        Self {
            src: key.src,
            dst: key.dst,
            phase: state.phase,
            measurements: state.measurements,
            candidates: state.candidates.clone(),
        }
    }
}

/// Summary of one run, written next to the trace files
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Simulated time of the last dispatched event
    pub simulated_until: SimTime,
    pub events_dispatched: u64,
    pub config: RunConfig,
    pub beamformed_links: u32,
    pub group_training_triggered: bool,
    pub group_training_completed: bool,
    pub frame_counters: FrameCounters,
    pub links: Vec<LinkReport>,
}

impl RunReport {
    pub(crate) fn new<'a, I>(
        started_at: DateTime<Utc>,
        simulated_until: SimTime,
        events_dispatched: u64,
        config: &RunConfig,
        run: &RunContext,
        links: I,
    ) -> Self
    where
        I: IntoIterator<Item = (&'a LinkKey, &'a LinkTrainingState)>,
    {
        Self {
            run_id: Uuid::new_v4(),
            started_at,
            finished_at: Utc::now(),
            simulated_until,
            events_dispatched,
            config: config.clone(),
            beamformed_links: run.beamformed_links(),
            group_training_triggered: run.group_trigger_fired(),
            group_training_completed: run.group_training_completed(),
            frame_counters: *run.frame_counters(),
            links: links
                .into_iter()
                .map(|(key, state)| LinkReport::from_state(*key, state))
                .collect(),
        }
    }

    /// Links left short of `Complete` when the run ended
    ///
    /// Not an error: a station that never reports completion stays in its
    /// phase until the horizon.
    pub fn incomplete_links(&self) -> Vec<&LinkReport> {
        self.links.iter().filter(|l| !l.phase.is_complete()).collect()
    }

    pub fn is_complete(&self) -> bool {
        !self.links.is_empty() && self.incomplete_links().is_empty()
    }

    /// Wall-clock duration of the run in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|e| BeamError::trace_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn links() -> BTreeMap<LinkKey, LinkTrainingState> {
        let mut links = BTreeMap::new();
        let mut done = LinkTrainingState::new();
        done.phase = Phase::Complete;
        links.insert(LinkKey::new(StationId(0), StationId(1)), done);
        let mut stuck = LinkTrainingState::new();
        stuck.phase = Phase::SisoFeedback;
        links.insert(LinkKey::new(StationId(1), StationId(0)), stuck);
        links
    }

    #[test]
    fn test_incomplete_links_listed() {
        let links = links();
        let report = RunReport::new(
            Utc::now(),
            SimTime(5),
            7,
            &RunConfig::default(),
            &RunContext::new(),
            &links,
        );

        let incomplete = report.incomplete_links();
        assert_eq!(incomplete.len(), 1);
        assert_eq!(incomplete[0].src, StationId(1));
        assert!(!report.is_complete());
        assert!(report.duration_ms() >= 0);
    }

    #[test]
    fn test_report_json_fields() {
        let links = links();
        let report = RunReport::new(
            Utc::now(),
            SimTime(5),
            7,
            &RunConfig::default(),
            &RunContext::new(),
            &links,
        );
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["events_dispatched"], 7);
        assert_eq!(json["simulated_until"], 5);
        assert_eq!(json["links"][0]["phase"], "Complete");
        assert_eq!(json["config"]["k_best_combinations"], 15);
        assert!(json["run_id"].is_string());
    }
}
