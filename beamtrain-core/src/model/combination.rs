//! Measurements and candidate combinations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AntennaConfiguration, AntennaSector, Snr};

/// Signal quality measured for one transmit/receive configuration pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    pub tx: AntennaConfiguration,
    pub rx: AntennaConfiguration,
    pub snr: Snr,
}

/// One entry of a client's SISO feedback report
///
/// The peer's transmit configuration has already been resolved from the
/// short-SSW identifier by the codebook collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SisoMeasurement {
    pub rx_antenna_id: u8,
    pub peer_tx: AntennaSector,
    pub snr: Snr,
}

/// Key of the aggregated SISO feedback map held by the coordinator
///
/// Ordering is antenna, then reporting station, then sector. The reducer
/// relies on it for deterministic iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedbackKey {
    pub tx_antenna_id: u8,
    /// Association id of the station that reported the measurement
    pub peer_aid: u16,
    pub tx_sector_id: u8,
}

impl FeedbackKey {
    pub fn new(tx_antenna_id: u8, peer_aid: u16, tx_sector_id: u8) -> Self {
        Self {
            tx_antenna_id,
            peer_aid,
            tx_sector_id,
        }
    }
}

/// Aggregated SISO feedback: `(antenna, peer, sector) -> SNR`
pub type FeedbackMap = BTreeMap<FeedbackKey, Snr>;

/// Candidate sector lists per transmit antenna, as scheduled for MIMO measurement
pub type TxCandidateTable = BTreeMap<u8, Vec<u8>>;

/// Serde adapter writing a [`FeedbackMap`] as a list of entries
///
/// JSON object keys must be strings, so the struct-keyed map is carried as
/// `[{"tx_antenna_id":1,"peer_aid":1,"tx_sector_id":4,"snr":12.5}, ...]`.
pub mod feedback_entries {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{FeedbackKey, FeedbackMap, Snr};

    #[derive(Serialize, Deserialize)]
    struct Entry {
        tx_antenna_id: u8,
        peer_aid: u16,
        tx_sector_id: u8,
        snr: Snr,
    }

    pub fn serialize<S: Serializer>(map: &FeedbackMap, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = map
            .iter()
            .map(|(key, snr)| Entry {
                tx_antenna_id: key.tx_antenna_id,
                peer_aid: key.peer_aid,
                tx_sector_id: key.tx_sector_id,
                snr: *snr,
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FeedbackMap, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|e| (FeedbackKey::new(e.tx_antenna_id, e.peer_aid, e.tx_sector_id), e.snr))
            .collect())
    }
}

/// Serde adapter writing a [`TxCandidateTable`] as a list of entries
///
/// `[{"antenna_id":1,"sectors":[6,6,5]}, ...]`; numeric map keys do not
/// survive internally tagged enums.
pub mod candidate_lists {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::TxCandidateTable;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        antenna_id: u8,
        sectors: Vec<u8>,
    }

    pub fn serialize<S: Serializer>(table: &TxCandidateTable, serializer: S) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = table
            .iter()
            .map(|(antenna_id, sectors)| Entry {
                antenna_id: *antenna_id,
                sectors: sectors.clone(),
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TxCandidateTable, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries.into_iter().map(|e| (e.antenna_id, e.sectors)).collect())
    }
}

/// One sector choice per transmit antenna, scored by its weakest antenna
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorCombination {
    /// Sector per antenna, ascending antenna id
    pub sectors: Vec<AntennaSector>,
    /// Minimum per-antenna SNR across `sectors`
    pub metric: Snr,
}

impl SectorCombination {
    pub fn sector_for(&self, antenna_id: u8) -> Option<u8> {
        self.sectors
            .iter()
            .find(|s| s.antenna_id == antenna_id)
            .map(|s| s.sector_id)
    }
}

/// A MIMO-phase measurement: one transmit and one receive configuration set
/// with the SNR of every `tx × rx` stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MimoCombination {
    /// Transmit configuration identifier assigned by the measuring station
    pub tx_id: u16,
    /// Receive configuration identifier
    pub rx_id: u16,
    pub tx: Vec<AntennaConfiguration>,
    pub rx: Vec<AntennaConfiguration>,
    /// Per-stream SNR, transmit-major: stream `(i, j)` at `i * rx.len() + j`
    pub stream_snr: Vec<Snr>,
}

impl MimoCombination {
    pub fn n_tx(&self) -> usize {
        self.tx.len()
    }

    pub fn n_rx(&self) -> usize {
        self.rx.len()
    }

    /// Streams as individual measurement samples, transmit-major
    pub fn streams(&self) -> impl Iterator<Item = MeasurementSample> + '_ {
        let n_rx = self.rx.len();
        self.stream_snr.iter().enumerate().filter_map(move |(idx, snr)| {
            let tx = self.tx.get(idx / n_rx.max(1))?;
            let rx = self.rx.get(idx % n_rx.max(1))?;
            Some(MeasurementSample {
                tx: *tx,
                rx: *rx,
                snr: *snr,
            })
        })
    }

    /// The stream that bounds the combination's quality
    pub fn weakest_stream(&self) -> Option<MeasurementSample> {
        self.streams().min_by(|a, b| a.snr.cmp(&b.snr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snr(v: f64) -> Snr {
        Snr::new(v).unwrap()
    }

    #[test]
    fn test_feedback_key_order() {
        let mut map = FeedbackMap::new();
        map.insert(FeedbackKey::new(2, 1, 1), snr(1.0));
        map.insert(FeedbackKey::new(1, 2, 1), snr(1.0));
        map.insert(FeedbackKey::new(1, 1, 9), snr(1.0));
        let keys: Vec<_> = map.keys().copied().collect();
        assert_eq!(keys[0], FeedbackKey::new(1, 1, 9));
        assert_eq!(keys[1], FeedbackKey::new(1, 2, 1));
        assert_eq!(keys[2], FeedbackKey::new(2, 1, 1));
    }

    #[test]
    fn test_feedback_entries_json() {
        #[derive(Serialize, Deserialize)]
        struct Holder {
            #[serde(with = "feedback_entries")]
            feedback: FeedbackMap,
        }

        let json = r#"{"feedback":[{"tx_antenna_id":1,"peer_aid":3,"tx_sector_id":7,"snr":5.0}]}"#;
        let holder: Holder = serde_json::from_str(json).unwrap();
        assert_eq!(holder.feedback[&FeedbackKey::new(1, 3, 7)].linear(), 5.0);
        let out = serde_json::to_string(&holder).unwrap();
        assert!(out.contains("\"tx_sector_id\":7"));
    }

    #[test]
    fn test_mimo_streams_are_tx_major() {
        let combo = MimoCombination {
            tx_id: 1,
            rx_id: 1,
            tx: vec![AntennaConfiguration::sector(1, 3), AntennaConfiguration::sector(2, 5)],
            rx: vec![AntennaConfiguration::sector(1, 1), AntennaConfiguration::sector(2, 2)],
            stream_snr: vec![snr(1.0), snr(2.0), snr(3.0), snr(4.0)],
        };
        let streams: Vec<_> = combo.streams().collect();
        assert_eq!(streams.len(), 4);
        assert_eq!(streams[1].tx.antenna_id, 1);
        assert_eq!(streams[1].rx.antenna_id, 2);
        assert_eq!(streams[2].tx.antenna_id, 2);
        assert_eq!(streams[2].rx.antenna_id, 1);
        assert_eq!(streams[3].snr.linear(), 4.0);
    }

    #[test]
    fn test_weakest_stream_names_its_antennas() {
        let combo = MimoCombination {
            tx_id: 4,
            rx_id: 2,
            tx: vec![AntennaConfiguration::sector(1, 3), AntennaConfiguration::sector(2, 5)],
            rx: vec![AntennaConfiguration::sector(1, 9)],
            stream_snr: vec![snr(40.0), snr(12.5)],
        };
        let weakest = combo.weakest_stream().unwrap();
        assert_eq!(weakest.tx, AntennaConfiguration::sector(2, 5));
        assert_eq!(weakest.rx, AntennaConfiguration::sector(1, 9));
        assert_eq!(weakest.snr, snr(12.5));

        let empty = MimoCombination {
            stream_snr: Vec::new(),
            ..combo
        };
        assert!(empty.weakest_stream().is_none());
    }
}
