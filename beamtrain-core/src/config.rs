//! Run configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BeamError, Result};
use crate::timing::{SimDuration, SimTime};

/// Slack added past the configured simulation time (one beacon interval plus
/// a millisecond), so the last interval's signals are still dispatched
const HORIZON_SLACK_MS: u64 = 101;

/// Configuration of one beam-training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of K-best candidates tested in the MIMO phase
    #[serde(default = "default_k_best")]
    pub k_best_combinations: usize,

    /// Antenna array geometry of the coordinator (selects its codebook)
    #[serde(default = "default_array_config_ap")]
    pub array_config_ap: String,

    /// Antenna array geometry of the clients
    #[serde(default = "default_array_config_sta")]
    pub array_config_sta: String,

    /// Channel-model dataset folder
    #[serde(default = "default_qd_channel_folder")]
    pub qd_channel_folder: String,

    /// Output directory for trace files
    #[serde(default = "default_traces_folder")]
    pub traces_folder: PathBuf,

    /// Machine-readable mode: suppresses the human-facing log
    #[serde(default)]
    pub csv: bool,

    #[serde(default)]
    pub verbose: bool,

    /// Simulated duration in seconds
    #[serde(default = "default_simulation_time")]
    pub simulation_time_s: f64,

    /// Beamformed links required before group training is triggered
    #[serde(default = "default_group_training_links")]
    pub group_training_links: u32,

    /// Delay between the trigger check and the group-training instruction
    #[serde(default = "default_group_trigger_delay")]
    pub group_trigger_delay_us: u64,

    /// Include steering-vector detail in SISO feedback reports
    #[serde(default)]
    pub feedback_includes_awv: bool,

    /// Use steering-vector refinement in the MIMO phase
    #[serde(default)]
    pub mimo_phase_uses_awv: bool,
}

fn default_k_best() -> usize { 15 }
fn default_array_config_ap() -> String { "28x_AzEl_SU-MIMO_2x2_27".to_string() }
fn default_array_config_sta() -> String { "28x_AzEl_27".to_string() }
fn default_qd_channel_folder() -> String { "IndoorMuMimo120/Output/Ns3".to_string() }
fn default_traces_folder() -> PathBuf { PathBuf::from("Traces/") }
fn default_simulation_time() -> f64 { 10.0 }
fn default_group_training_links() -> u32 { 4 }
fn default_group_trigger_delay() -> u64 { 1 }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            k_best_combinations: default_k_best(),
            array_config_ap: default_array_config_ap(),
            array_config_sta: default_array_config_sta(),
            qd_channel_folder: default_qd_channel_folder(),
            traces_folder: default_traces_folder(),
            csv: false,
            verbose: false,
            simulation_time_s: default_simulation_time(),
            group_training_links: default_group_training_links(),
            group_trigger_delay_us: default_group_trigger_delay(),
            feedback_includes_awv: false,
            mimo_phase_uses_awv: false,
        }
    }
}

impl RunConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BeamError::InvalidConfig {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: RunConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.group_training_links == 0 {
            return Err(BeamError::InvalidConfig {
                reason: "group_training_links must be at least 1".to_string(),
            });
        }
        if !self.simulation_time_s.is_finite() || self.simulation_time_s <= 0.0 {
            return Err(BeamError::InvalidConfig {
                reason: format!(
                    "simulation_time_s must be a positive number, got {}",
                    self.simulation_time_s
                ),
            });
        }
        if self.traces_folder.as_os_str().is_empty() {
            return Err(BeamError::InvalidConfig {
                reason: "traces_folder must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Last simulated instant at which events are still dispatched
    pub fn simulation_horizon(&self) -> SimTime {
        SimTime::from_secs_f64(self.simulation_time_s) + SimDuration::from_millis(HORIZON_SLACK_MS)
    }

    pub fn group_trigger_delay(&self) -> SimDuration {
        SimDuration::from_micros(self.group_trigger_delay_us)
    }
}
