//! Linear signal-to-noise ratios

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BeamError, Result};

/// Convert a linear power ratio to decibels
pub fn ratio_to_db(ratio: f64) -> f64 {
    10.0 * ratio.log10()
}

/// Convert decibels to a linear power ratio
pub fn db_to_ratio(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// A signal-to-noise ratio stored as a linear power ratio
///
/// Invariant: the ratio is finite and never negative. Construction goes
/// through [`Snr::new`] or [`Snr::from_db`], both of which reject values
/// that break it, so ordering between two `Snr` values is total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Snr(f64);

impl Snr {
    pub const ZERO: Snr = Snr(0.0);

    /// Create from a linear ratio
    pub fn new(linear: f64) -> Result<Self> {
        if linear.is_finite() && linear >= 0.0 {
            Ok(Snr(linear))
        } else {
            Err(BeamError::InvalidSnr { value: linear })
        }
    }

    /// Create from a value in dB
    pub fn from_db(db: f64) -> Result<Self> {
        if db.is_nan() {
            return Err(BeamError::InvalidSnr { value: db });
        }
        Snr::new(db_to_ratio(db))
    }

    pub fn linear(self) -> f64 {
        self.0
    }

    pub fn to_db(self) -> f64 {
        ratio_to_db(self.0)
    }
}

impl Eq for Snr {}

impl PartialOrd for Snr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Snr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl TryFrom<f64> for Snr {
    type Error = BeamError;

    fn try_from(value: f64) -> Result<Self> {
        Snr::new(value)
    }
}

impl From<Snr> for f64 {
    fn from(snr: Snr) -> f64 {
        snr.0
    }
}

impl fmt::Display for Snr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} dB", self.to_db())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_round_trip() {
        let snr = Snr::new(100.0).unwrap();
        assert!((snr.to_db() - 20.0).abs() < 1e-12);
        let back = Snr::from_db(snr.to_db()).unwrap();
        assert!((back.linear() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_negative_and_nan() {
        assert!(matches!(
            Snr::new(-0.5),
            Err(BeamError::InvalidSnr { .. })
        ));
        assert!(Snr::new(f64::NAN).is_err());
        assert!(Snr::new(f64::INFINITY).is_err());
        assert!(Snr::from_db(f64::NAN).is_err());
    }

    #[test]
    fn test_zero_is_allowed() {
        let snr = Snr::new(0.0).unwrap();
        assert_eq!(snr, Snr::ZERO);
        assert_eq!(snr.to_db(), f64::NEG_INFINITY);
    }

    #[test]
    fn test_ordering() {
        let a = Snr::new(2.0).unwrap();
        let b = Snr::new(8.0).unwrap();
        assert!(a < b);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_deserialize_rejects_negative() {
        assert!(serde_json::from_str::<Snr>("-3.0").is_err());
        let snr: Snr = serde_json::from_str("4.0").unwrap();
        assert_eq!(snr.linear(), 4.0);
    }
}
