//! Scenario descriptions
//!
//! A scenario lists the participating stations and a timed script of the
//! signals the MAC/PHY collaborator would raise. Scenarios are JSON:
//!
//! ```json
//! {
//!   "stations": [
//!     {"id": 0, "address": "00:00:00:00:00:01", "role": "coordinator", "antenna_arrays": 2},
//!     {"id": 1, "address": "00:00:00:00:00:02", "role": "client"}
//!   ],
//!   "group_id": 1,
//!   "events": [
//!     {"time_ns": 1000, "signal": "data_interval_started", "station": 1}
//!   ]
//! }
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::coordinator::{Signal, DEFAULT_GROUP_ID};
use crate::error::{BeamError, Result};
use crate::model::{Station, StationId};
use crate::timing::SimTime;

/// One scripted signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedEvent {
    pub time_ns: u64,
    /// Channel-model trace index in effect when the signal fires
    #[serde(default)]
    pub trace_index: u32,
    #[serde(flatten)]
    pub signal: Signal,
}

impl ScriptedEvent {
    pub fn new(time_ns: u64, signal: Signal) -> Self {
        Self {
            time_ns,
            trace_index: 0,
            signal,
        }
    }

    pub fn with_trace_index(mut self, trace_index: u32) -> Self {
        self.trace_index = trace_index;
        self
    }

    pub fn time(&self) -> SimTime {
        SimTime(self.time_ns)
    }
}

/// Stations and signal script of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub stations: Vec<Station>,

    /// MU group trained once enough links are beamformed
    #[serde(default = "default_group_id")]
    pub group_id: u8,

    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

fn default_group_id() -> u8 { DEFAULT_GROUP_ID }

impl Scenario {
    pub fn new(stations: Vec<Station>) -> Self {
        Self {
            stations,
            group_id: DEFAULT_GROUP_ID,
            events: Vec::new(),
        }
    }

    /// Append a scripted signal
    pub fn at(mut self, time_ns: u64, signal: Signal) -> Self {
        self.events.push(ScriptedEvent::new(time_ns, signal));
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BeamError::ScenarioError {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json(&contents)
    }

    /// Check station identities and that every signal names a known station
    pub fn validate(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        for station in &self.stations {
            if !ids.insert(station.id) {
                return Err(BeamError::ScenarioError {
                    reason: format!("duplicate station id {}", station.id),
                });
            }
        }

        let coordinators = self.stations.iter().filter(|s| s.is_coordinator()).count();
        if coordinators != 1 {
            return Err(BeamError::ScenarioError {
                reason: format!("expected exactly one coordinator station, found {}", coordinators),
            });
        }

        for (idx, event) in self.events.iter().enumerate() {
            let station = event.signal.station();
            if !ids.contains(&station) {
                return Err(BeamError::ScenarioError {
                    reason: format!(
                        "event {} ({}) names unknown station {}",
                        idx,
                        event.signal.name(),
                        station
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn coordinator(&self) -> Option<StationId> {
        self.stations.iter().find(|s| s.is_coordinator()).map(|s| s.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StationRole;

    fn stations() -> Vec<Station> {
        vec![
            Station::new(0, StationRole::Coordinator),
            Station::new(1, StationRole::Client),
        ]
    }

    #[test]
    fn test_parse_flattened_events() {
        let json = r#"{
            "stations": [
                {"id": 0, "address": "00:00:00:00:00:01", "role": "coordinator", "antenna_arrays": 2},
                {"id": 1, "address": "00:00:00:00:00:02", "role": "client"}
            ],
            "events": [
                {"time_ns": 1000, "trace_index": 3, "signal": "data_interval_started", "station": 1},
                {"time_ns": 2000, "signal": "coordinator_data_interval_started", "coordinator": 0}
            ]
        }"#;
        let scenario = Scenario::from_json(json).unwrap();
        assert_eq!(scenario.group_id, 1);
        assert_eq!(scenario.events.len(), 2);
        assert_eq!(scenario.events[0].trace_index, 3);
        assert_eq!(
            scenario.events[0].signal,
            Signal::DataIntervalStarted {
                station: StationId(1)
            }
        );
        assert_eq!(scenario.stations[0].antenna_arrays, 2);
        assert_eq!(scenario.stations[1].sectors_per_array, 64);
        assert_eq!(scenario.coordinator(), Some(StationId(0)));
    }

    #[test]
    fn test_rejects_missing_coordinator() {
        let scenario = Scenario::new(vec![Station::new(1, StationRole::Client)]);
        let err = scenario.validate().unwrap_err();
        assert_eq!(err.error_code(), "SCENARIO_ERROR");
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut list = stations();
        list.push(Station::new(1, StationRole::Client));
        assert!(Scenario::new(list).validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_station_in_script() {
        let scenario = Scenario::new(stations()).at(
            10,
            Signal::DataIntervalStarted {
                station: StationId(7),
            },
        );
        assert!(scenario.validate().is_err());
    }
}
