//! Station identity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BeamError;

/// Stable numeric identity of a station, unique within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 48-bit link-layer address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Address allocated sequentially from a counter, `00:00:00:00:00:01` first
    pub fn sequential(n: u32) -> Self {
        let b = n.to_be_bytes();
        MacAddress([0, 0, b[0], b[1], b[2], b[3]])
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = BeamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BeamError::ScenarioError {
            reason: format!("'{}' is not a MAC address", s),
        };
        let mut bytes = [0u8; 6];
        let mut parts = s.split(':');
        for byte in bytes.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            *byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = BeamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacAddress> for String {
    fn from(addr: MacAddress) -> String {
        addr.to_string()
    }
}

/// Role a station plays in the basic service set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StationRole {
    /// Access point coordinating the BSS and the group training
    Coordinator,
    /// Client station
    Client,
}

impl StationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationRole::Coordinator => "ap",
            StationRole::Client => "sta",
        }
    }
}

impl fmt::Display for StationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A participant in the training protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub address: MacAddress,
    pub role: StationRole,
    /// Number of antenna arrays
    #[serde(default = "default_one")]
    pub antenna_arrays: u8,
    /// Sectors defined per antenna array in the codebook
    #[serde(default = "default_sectors")]
    pub sectors_per_array: u8,
}

fn default_one() -> u8 { 1 }
fn default_sectors() -> u8 { 64 }

impl Station {
    pub fn new(id: u32, role: StationRole) -> Self {
        Self {
            id: StationId(id),
            address: MacAddress::sequential(id),
            role,
            antenna_arrays: 1,
            sectors_per_array: default_sectors(),
        }
    }

    pub fn with_antenna_arrays(mut self, arrays: u8) -> Self {
        self.antenna_arrays = arrays;
        self
    }

    pub fn is_coordinator(&self) -> bool {
        self.role == StationRole::Coordinator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address_display_and_parse() {
        let addr = MacAddress::sequential(3);
        assert_eq!(addr.to_string(), "00:00:00:00:00:03");
        let parsed: MacAddress = "00:00:00:00:00:03".parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_mac_address_rejects_garbage() {
        assert!("00:00:00".parse::<MacAddress>().is_err());
        assert!("00:00:00:00:00:zz".parse::<MacAddress>().is_err());
        assert!("00:00:00:00:00:01:02".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_station_serde_defaults() {
        let station: Station = serde_json::from_str(
            r#"{"id": 2, "address": "00:00:00:00:00:02", "role": "client"}"#,
        )
        .unwrap();
        assert_eq!(station.id, StationId(2));
        assert_eq!(station.antenna_arrays, 1);
        assert!(!station.is_coordinator());
    }
}
