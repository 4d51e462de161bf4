//! Trace Sink
//!
//! Persists every measurement, candidate and phase-completion record the
//! coordinator produces. Column order is part of the external contract and
//! is fixed by [`TraceRecord::header`] and [`TraceRecord::csv_row`].
//!
//! Sinks are append-only within a run. File identity is keyed by the
//! source station, so each station's SISO and MIMO tables land in their own
//! files; sector-sweep results, phase transitions and receive SNR samples
//! share one file each.
//!
//! # Example
//!
//! ```rust
//! use beamtrain_core::trace::{InMemoryTraceSink, TraceRecord, TraceSink, TraceTable};
//! use beamtrain_core::model::StationId;
//! use beamtrain_core::timing::SimTime;
//!
//! let mut sink = InMemoryTraceSink::new();
//! sink.record(TraceRecord::RxSnr {
//!     station: StationId(0),
//!     time: SimTime(1_000),
//!     snr_db: 12.5,
//! }).unwrap();
//! assert_eq!(sink.records_in(TraceTable::RxSnr).len(), 1);
//! ```

mod csv;
mod memory;

use std::fmt::Write as _;

use crate::coordinator::Phase;
use crate::error::Result;
use crate::model::{AntennaConfiguration, AntennaSector, Snr, StationId, StationRole};
use crate::timing::SimTime;

pub use self::csv::CsvTraceSink;
pub use memory::{InMemoryTraceSink, NullTraceSink};

/// Destination of persisted records
pub trait TraceSink {
    /// Append one record
    fn record(&mut self, record: TraceRecord) -> Result<()>;

    /// Push buffered records to durable storage
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Sink name (for logging)
    fn name(&self) -> &'static str;
}

/// Output table a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TraceTable {
    SectorSweep,
    SisoMeasurement,
    SisoResult,
    MimoCandidates,
    MimoMeasurement,
    MimoMeasurementReduced,
    PhaseCompletion,
    RxSnr,
}

impl TraceTable {
    /// Whether every station shares one file for this table
    pub fn is_shared(&self) -> bool {
        matches!(
            self,
            TraceTable::SectorSweep | TraceTable::PhaseCompletion | TraceTable::RxSnr
        )
    }

    /// File name for this table and source station
    pub fn file_name(&self, src: StationId) -> String {
        match self {
            TraceTable::SectorSweep => "sls_results.csv".to_string(),
            TraceTable::PhaseCompletion => "phase_log.csv".to_string(),
            TraceTable::RxSnr => "snr_values.csv".to_string(),
            TraceTable::SisoMeasurement => format!("siso_phase_measurements_{}.csv", src),
            TraceTable::SisoResult => format!("siso_phase_results_{}.csv", src),
            TraceTable::MimoCandidates => format!("mimo_tx_candidates_{}.csv", src),
            TraceTable::MimoMeasurement => format!("mimo_phase_measurements_{}.csv", src),
            TraceTable::MimoMeasurementReduced => {
                format!("mimo_phase_measurements_reduced_{}.csv", src)
            }
        }
    }
}

/// A finalized record ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    /// Best configuration found by a sector sweep
    SectorSweep {
        src: StationId,
        dst: StationId,
        trace_index: u32,
        sector_id: u8,
        antenna_id: u8,
        role: StationRole,
        bss_id: StationId,
        time: SimTime,
    },
    /// One raw SISO feedback sample reported by a client
    SisoMeasurement {
        src: StationId,
        dst: StationId,
        trace_index: u32,
        rx_antenna_id: u8,
        peer_tx_antenna_id: u8,
        peer_tx_sector_id: u8,
        snr: Snr,
        time: SimTime,
    },
    /// One row of the aggregated feedback map fed to K-best selection
    SisoResult {
        src: StationId,
        dst: StationId,
        trace_index: u32,
        station_aid: u16,
        tx_antenna_id: u8,
        tx_sector_id: u8,
        snr: Snr,
        time: SimTime,
    },
    /// One candidate row: sector per antenna as scheduled for MIMO measurement
    MimoCandidates {
        src: StationId,
        dst: StationId,
        trace_index: u32,
        sectors: Vec<AntennaSector>,
    },
    /// One measured MIMO combination, full table or diversity-reduced table
    MimoMeasurement {
        reduced: bool,
        src: StationId,
        dst: StationId,
        trace_index: u32,
        tx: Vec<AntennaConfiguration>,
        rx: Vec<AntennaConfiguration>,
        stream_snr: Vec<Snr>,
        min_stream_snr: Snr,
    },
    /// A link moved between phases
    PhaseCompletion {
        src: StationId,
        dst: StationId,
        from: Phase,
        to: Phase,
        time: SimTime,
    },
    /// Receive SNR of a frame at a station
    RxSnr {
        station: StationId,
        time: SimTime,
        snr_db: f64,
    },
}

impl TraceRecord {
    pub fn table(&self) -> TraceTable {
        match self {
            TraceRecord::SectorSweep { .. } => TraceTable::SectorSweep,
            TraceRecord::SisoMeasurement { .. } => TraceTable::SisoMeasurement,
            TraceRecord::SisoResult { .. } => TraceTable::SisoResult,
            TraceRecord::MimoCandidates { .. } => TraceTable::MimoCandidates,
            TraceRecord::MimoMeasurement { reduced: false, .. } => TraceTable::MimoMeasurement,
            TraceRecord::MimoMeasurement { reduced: true, .. } => {
                TraceTable::MimoMeasurementReduced
            }
            TraceRecord::PhaseCompletion { .. } => TraceTable::PhaseCompletion,
            TraceRecord::RxSnr { .. } => TraceTable::RxSnr,
        }
    }

    /// Station whose file the record belongs to
    pub fn src(&self) -> StationId {
        match self {
            TraceRecord::SectorSweep { src, .. }
            | TraceRecord::SisoMeasurement { src, .. }
            | TraceRecord::SisoResult { src, .. }
            | TraceRecord::MimoCandidates { src, .. }
            | TraceRecord::MimoMeasurement { src, .. }
            | TraceRecord::PhaseCompletion { src, .. } => *src,
            TraceRecord::RxSnr { station, .. } => *station,
        }
    }

    pub fn file_name(&self) -> String {
        self.table().file_name(self.src())
    }

    /// Header line for this record's table
    ///
    /// Variable-width tables (candidates, MIMO measurements) size their
    /// header from the record itself.
    pub fn header(&self) -> String {
        match self {
            TraceRecord::SectorSweep { .. } => {
                "SRC_ID,DST_ID,TRACE_IDX,SECTOR_ID,ANTENNA_ID,ROLE,BSS_ID,Timestamp".to_string()
            }
            TraceRecord::SisoMeasurement { .. } => {
                "SRC_ID,DST_ID,TRACE_IDX,RX_ANTENNA_ID,PEER_TX_ANTENNA_ID,PEER_TX_SECTOR_ID,SNR,Timestamp"
                    .to_string()
            }
            TraceRecord::SisoResult { .. } => {
                "SRC_ID,DST_ID,TRACE_IDX,STA_AID,TX_ANTENNA_ID,TX_SECTOR_ID,SNR,Timestamp".to_string()
            }
            TraceRecord::MimoCandidates { sectors, .. } => {
                let mut header = String::from("SRC_ID,DST_ID,TRACE_IDX");
                for i in 1..=sectors.len() {
                    let _ = write!(header, ",ANTENNA_ID{i},SECTOR_ID{i}");
                }
                header
            }
            TraceRecord::MimoMeasurement { tx, rx, stream_snr, .. } => {
                let mut header = String::from("SRC_ID,DST_ID,TRACE_IDX");
                for i in 1..=tx.len() {
                    let _ = write!(header, ",TX_ANTENNA_ID{i},TX_SECTOR_ID{i},TX_AWV_ID{i}");
                }
                for i in 1..=rx.len() {
                    let _ = write!(header, ",RX_ANTENNA_ID{i},RX_SECTOR_ID{i},RX_AWV_ID{i}");
                }
                for _ in stream_snr {
                    header.push_str(",SNR");
                }
                header.push_str(",min_Stream_SNR");
                header
            }
            TraceRecord::PhaseCompletion { .. } => {
                "SRC_ID,DST_ID,FROM_PHASE,TO_PHASE,Timestamp".to_string()
            }
            TraceRecord::RxSnr { .. } => "Timestamp,SNR".to_string(),
        }
    }

    /// Comma-separated row, SNR columns in dB
    pub fn csv_row(&self) -> String {
        match self {
            TraceRecord::SectorSweep {
                src,
                dst,
                trace_index,
                sector_id,
                antenna_id,
                role,
                bss_id,
                time,
            } => format!(
                "{},{},{},{},{},{},{},{}",
                src, dst, trace_index, sector_id, antenna_id, role, bss_id, time.as_nanos()
            ),
            TraceRecord::SisoMeasurement {
                src,
                dst,
                trace_index,
                rx_antenna_id,
                peer_tx_antenna_id,
                peer_tx_sector_id,
                snr,
                time,
            } => format!(
                "{},{},{},{},{},{},{},{}",
                src,
                dst,
                trace_index,
                rx_antenna_id,
                peer_tx_antenna_id,
                peer_tx_sector_id,
                snr.to_db(),
                time.as_nanos()
            ),
            TraceRecord::SisoResult {
                src,
                dst,
                trace_index,
                station_aid,
                tx_antenna_id,
                tx_sector_id,
                snr,
                time,
            } => format!(
                "{},{},{},{},{},{},{},{}",
                src,
                dst,
                trace_index,
                station_aid,
                tx_antenna_id,
                tx_sector_id,
                snr.to_db(),
                time.as_nanos()
            ),
            TraceRecord::MimoCandidates {
                src,
                dst,
                trace_index,
                sectors,
            } => {
                let mut row = format!("{},{},{}", src, dst, trace_index);
                for s in sectors {
                    let _ = write!(row, ",{},{}", s.antenna_id, s.sector_id);
                }
                row
            }
            TraceRecord::MimoMeasurement {
                src,
                dst,
                trace_index,
                tx,
                rx,
                stream_snr,
                min_stream_snr,
                ..
            } => {
                let mut row = format!("{},{},{}", src, dst, trace_index);
                for config in tx.iter().chain(rx) {
                    let _ = write!(
                        row,
                        ",{},{},{}",
                        config.antenna_id,
                        config.sector_id,
                        config.awv_id.unwrap_or(0)
                    );
                }
                for snr in stream_snr {
                    let _ = write!(row, ",{}", snr.to_db());
                }
                let _ = write!(row, ",{}", min_stream_snr.to_db());
                row
            }
            TraceRecord::PhaseCompletion {
                src,
                dst,
                from,
                to,
                time,
            } => format!("{},{},{},{},{}", src, dst, from, to, time.as_nanos()),
            TraceRecord::RxSnr { time, snr_db, .. } => format!("{},{}", time.as_nanos(), snr_db),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_sweep_columns() {
        let record = TraceRecord::SectorSweep {
            src: StationId(2),
            dst: StationId(0),
            trace_index: 4,
            sector_id: 17,
            antenna_id: 1,
            role: StationRole::Client,
            bss_id: StationId(0),
            time: SimTime(123),
        };
        assert_eq!(record.csv_row(), "2,0,4,17,1,sta,0,123");
        assert_eq!(record.file_name(), "sls_results.csv");
        assert_eq!(record.header().split(',').count(), 8);
    }

    #[test]
    fn test_siso_result_snr_in_db() {
        let record = TraceRecord::SisoResult {
            src: StationId(0),
            dst: StationId(1),
            trace_index: 0,
            station_aid: 1,
            tx_antenna_id: 2,
            tx_sector_id: 9,
            snr: Snr::new(100.0).unwrap(),
            time: SimTime(5),
        };
        assert_eq!(record.csv_row(), "0,1,0,1,2,9,20,5");
        assert_eq!(record.file_name(), "siso_phase_results_0.csv");
    }

    #[test]
    fn test_mimo_measurement_header_matches_row_width() {
        let record = TraceRecord::MimoMeasurement {
            reduced: true,
            src: StationId(1),
            dst: StationId(0),
            trace_index: 2,
            tx: vec![
                AntennaConfiguration::sector(1, 3).with_awv(2),
                AntennaConfiguration::sector(2, 4),
            ],
            rx: vec![AntennaConfiguration::sector(1, 1)],
            stream_snr: vec![Snr::new(10.0).unwrap(), Snr::new(1.0).unwrap()],
            min_stream_snr: Snr::new(1.0).unwrap(),
        };
        let header_cols = record.header().split(',').count();
        let row_cols = record.csv_row().split(',').count();
        assert_eq!(header_cols, row_cols);
        assert_eq!(header_cols, 3 + 3 * 2 + 3 + 2 + 1);
        assert!(record.csv_row().starts_with("1,0,2,1,3,2,2,4,0,1,1,0,10,0,0"));
        assert_eq!(record.table(), TraceTable::MimoMeasurementReduced);
        assert_eq!(record.file_name(), "mimo_phase_measurements_reduced_1.csv");
    }

    #[test]
    fn test_candidate_row() {
        let record = TraceRecord::MimoCandidates {
            src: StationId(0),
            dst: StationId(0),
            trace_index: 1,
            sectors: vec![AntennaSector::new(1, 5), AntennaSector::new(2, 8)],
        };
        assert_eq!(record.header(), "SRC_ID,DST_ID,TRACE_IDX,ANTENNA_ID1,SECTOR_ID1,ANTENNA_ID2,SECTOR_ID2");
        assert_eq!(record.csv_row(), "0,0,1,1,5,2,8");
    }
}
