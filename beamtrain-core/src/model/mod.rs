//! Data model shared by the reducer, the coordinator and the trace sinks
//!
//! All values here are immutable measurement or identity records. SNR values
//! are carried as linear ratios ([`Snr`]); decibels appear only when a record
//! is formatted for output.

mod antenna;
mod combination;
mod snr;
mod station;

pub use antenna::{AccessPeriod, AntennaConfiguration, AntennaSector};
pub use combination::{
    FeedbackKey, FeedbackMap, MeasurementSample, MimoCombination, SectorCombination,
    SisoMeasurement, TxCandidateTable,
};
pub use combination::{candidate_lists, feedback_entries};
pub use snr::{db_to_ratio, ratio_to_db, Snr};
pub use station::{MacAddress, Station, StationId, StationRole};
