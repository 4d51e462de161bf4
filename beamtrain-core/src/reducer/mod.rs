//! Candidate Reducer
//!
//! Pure functions that turn raw measurement sets into short, ranked candidate
//! lists. Nothing here holds state or performs I/O; calling a function twice
//! on the same input yields the same output.
//!
//! - [`select_k_best`]: SISO feedback map to the K best per-antenna sector
//!   combinations, scored by the weakest antenna.
//! - [`min_stream_snr`] / [`RankedCombinations`]: MIMO measurements ranked by
//!   their weakest stream.
//! - [`reduce_for_diversity`]: drop ranked MIMO combinations that repeat a
//!   transmit configuration when no receive diversity was explored.
//!
//! ## Example
//!
//! ```rust
//! use beamtrain_core::model::{FeedbackKey, FeedbackMap, Snr};
//! use beamtrain_core::reducer::select_k_best;
//!
//! let mut feedback = FeedbackMap::new();
//! feedback.insert(FeedbackKey::new(1, 1, 1), Snr::new(2.0).unwrap());
//! feedback.insert(FeedbackKey::new(1, 1, 2), Snr::new(8.0).unwrap());
//! feedback.insert(FeedbackKey::new(2, 1, 1), Snr::new(4.0).unwrap());
//!
//! let best = select_k_best(&feedback, 2, 2, 1);
//! assert_eq!(best.len(), 2);
//! assert_eq!(best[0].metric.linear(), 4.0);
//! ```

mod diversity;
mod kbest;

pub use diversity::{min_stream_snr, reduce_for_diversity, RankedCombination, RankedCombinations};
pub use kbest::select_k_best;
