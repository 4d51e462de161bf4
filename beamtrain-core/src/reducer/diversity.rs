//! Minimum-stream ranking and transmit diversity reduction

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{BeamError, Result};
use crate::model::{MimoCombination, Snr};

/// Weakest stream of a multi-stream combination
///
/// Fails with [`BeamError::EmptyStreams`] when there are no streams; callers
/// guarantee positive antenna counts, so an empty slice is a contract bug.
pub fn min_stream_snr(streams: &[Snr]) -> Result<Snr> {
    streams.iter().copied().min().ok_or(BeamError::EmptyStreams)
}

/// A MIMO combination together with its minimum-stream score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCombination {
    pub score: Snr,
    pub combination: MimoCombination,
}

/// MIMO combinations ordered by descending minimum-stream SNR
///
/// Ties go to the earliest transmit configuration id, then the earliest
/// receive configuration id. Building the ranking never consumes the
/// measurements it was built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankedCombinations {
    entries: Vec<RankedCombination>,
}

impl RankedCombinations {
    /// Score every combination by its weakest stream and sort
    pub fn rank_by_min_stream<'a, I>(combinations: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a MimoCombination>,
    {
        let mut entries = combinations
            .into_iter()
            .map(|combination| {
                Ok(RankedCombination {
                    score: min_stream_snr(&combination.stream_snr)?,
                    combination: combination.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        entries.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.combination.tx_id.cmp(&b.combination.tx_id))
                .then_with(|| a.combination.rx_id.cmp(&b.combination.rx_id))
        });

        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedCombination> {
        self.entries.iter()
    }

    pub fn best(&self) -> Option<&RankedCombination> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<RankedCombination> {
        self.entries
    }
}

/// Keep the ranked combinations that add exploitable diversity
///
/// Walks `ranked` best-first. When `distinct_rx_allowed` is true (distinct
/// receive configurations were measured) every combination is kept. Otherwise a
/// combination is kept only if its transmit configuration id has not been
/// kept already. Output order is the ranking order.
pub fn reduce_for_diversity(ranked: &RankedCombinations, distinct_rx_allowed: bool) -> Vec<RankedCombination> {
    let mut seen_tx = HashSet::new();
    ranked
        .iter()
        .filter(|entry| distinct_rx_allowed || seen_tx.insert(entry.combination.tx_id))
        .cloned()
        .collect()
}
