//! Antenna configurations

use std::fmt;

use serde::{Deserialize, Serialize};

/// One physical beam pattern: array, sector and optional steering vector
///
/// `awv_id` is `None` at sector resolution and `Some` once the codebook has
/// been refined for beam refinement phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AntennaConfiguration {
    pub antenna_id: u8,
    pub sector_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub awv_id: Option<u8>,
}

impl AntennaConfiguration {
    pub fn sector(antenna_id: u8, sector_id: u8) -> Self {
        Self {
            antenna_id,
            sector_id,
            awv_id: None,
        }
    }

    pub fn with_awv(mut self, awv_id: u8) -> Self {
        self.awv_id = Some(awv_id);
        self
    }
}

impl fmt::Display for AntennaConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.awv_id {
            Some(awv) => write!(f, "A{}/S{}/AWV{}", self.antenna_id, self.sector_id, awv),
            None => write!(f, "A{}/S{}", self.antenna_id, self.sector_id),
        }
    }
}

/// Sector choice on one antenna array
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AntennaSector {
    pub antenna_id: u8,
    pub sector_id: u8,
}

impl AntennaSector {
    pub fn new(antenna_id: u8, sector_id: u8) -> Self {
        Self {
            antenna_id,
            sector_id,
        }
    }
}

/// Access period during which a sector sweep found its best configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPeriod {
    /// Beacon header interval: training-only access
    Bhi,
    /// Data transmission interval: the committed access period
    Dti,
}

impl AccessPeriod {
    /// Whether a sweep completed in this period establishes a beamformed link
    pub fn is_committed(&self) -> bool {
        matches!(self, AccessPeriod::Dti)
    }
}
