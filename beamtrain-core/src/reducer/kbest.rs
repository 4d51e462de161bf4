//! K-best sector combination selection over SISO feedback

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BinaryHeap};

use tracing::{debug, warn};

use crate::model::{AntennaSector, FeedbackMap, SectorCombination, Snr};

/// A scored combination; `Greater` means better
#[derive(Debug, PartialEq, Eq)]
struct Scored {
    metric: Snr,
    /// Sector id per antenna, ascending antenna order
    sectors: Vec<u8>,
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        self.metric
            .cmp(&other.metric)
            // lower sector ids win ties
            .then_with(|| other.sectors.cmp(&self.sectors))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Select the `k` best transmit sector combinations from a SISO feedback map
///
/// A combination is one sector per transmit antenna for the first `n_tx`
/// antennas (ascending id) present in `feedback`. A sector's quality is the
/// lowest SNR any peer reported for it, and a combination's metric is the
/// minimum over its antennas, since the weakest antenna bounds the usable
/// multiplexing gain.
///
/// The result is sorted by descending metric; ties go to the lowest sector
/// id on the lowest-indexed antenna where the combinations differ. When
/// fewer than `k` combinations exist all of them are returned. An empty map,
/// or one covering fewer than `n_tx` antennas, yields an empty list.
///
/// `n_rx` is the number of receiving stations the feedback covers; receive
/// selection itself happens in the MIMO phase.
///
/// The search is exponential in `n_tx` in the worst case (the product of the
/// per-antenna sector counts). Branches whose running minimum already falls
/// below the current k-th best are cut, which keeps realistic maps (a few
/// strong sectors per array) cheap. Callers pass the number of antenna
/// arrays, which stays in single digits.
pub fn select_k_best(feedback: &FeedbackMap, k: usize, n_tx: u8, n_rx: u8) -> Vec<SectorCombination> {
    if feedback.is_empty() {
        warn!("K-best selection over an empty feedback map; no candidates");
        return Vec::new();
    }
    if k == 0 || n_tx == 0 || n_rx == 0 {
        warn!(k, n_tx, n_rx, "K-best selection requested zero candidates or antennas");
        return Vec::new();
    }

    // antenna -> sector -> weakest reported SNR
    let mut per_antenna: BTreeMap<u8, BTreeMap<u8, Snr>> = BTreeMap::new();
    for (key, snr) in feedback {
        per_antenna
            .entry(key.tx_antenna_id)
            .or_default()
            .entry(key.tx_sector_id)
            .and_modify(|s| *s = (*s).min(*snr))
            .or_insert(*snr);
    }

    if per_antenna.len() < n_tx as usize {
        warn!(
            antennas = per_antenna.len(),
            n_tx, "Feedback covers fewer antennas than requested; no candidates"
        );
        return Vec::new();
    }

    // sectors strongest first, so a search level can stop at the first miss
    let antennas: Vec<(u8, Vec<(u8, Snr)>)> = per_antenna
        .into_iter()
        .take(n_tx as usize)
        .map(|(antenna, sectors)| {
            let mut sectors: Vec<(u8, Snr)> = sectors.into_iter().collect();
            sectors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            (antenna, sectors)
        })
        .collect();

    let mut search = Search {
        antennas: &antennas,
        k,
        best: BinaryHeap::with_capacity(k + 1),
        evaluated: 0,
    };
    search.descend(0, None, &mut Vec::with_capacity(antennas.len()));

    let evaluated = search.evaluated;
    let result = finish(search.best, &antennas);
    debug!(evaluated, selected = result.len(), "K-best selection done");
    result
}

/// Depth-first walk of the sector product, keeping the k best in a min-heap
struct Search<'a> {
    antennas: &'a [(u8, Vec<(u8, Snr)>)],
    k: usize,
    best: BinaryHeap<Reverse<Scored>>,
    evaluated: usize,
}

impl Search<'_> {
    /// Metric a combination must reach to enter the heap once it is full
    fn floor(&self) -> Option<Snr> {
        if self.best.len() < self.k {
            return None;
        }
        self.best.peek().map(|Reverse(worst)| worst.metric)
    }

    fn descend(&mut self, depth: usize, bound: Option<Snr>, sectors: &mut Vec<u8>) {
        let antennas = self.antennas;
        let choices = match antennas.get(depth) {
            Some((_, choices)) => choices,
            None => {
                if let Some(metric) = bound {
                    self.offer(Scored {
                        metric,
                        sectors: sectors.clone(),
                    });
                }
                return;
            }
        };

        for &(sector, snr) in choices {
            let metric = bound.map_or(snr, |b| b.min(snr));
            // equal metrics still compete on sector ids
            if self.floor().map_or(false, |floor| metric < floor) {
                break;
            }
            sectors.push(sector);
            self.descend(depth + 1, Some(metric), sectors);
            sectors.pop();
        }
    }

    fn offer(&mut self, candidate: Scored) {
        self.evaluated += 1;
        let keep = self.best.len() < self.k
            || self
                .best
                .peek()
                .map_or(true, |Reverse(worst)| candidate > *worst);
        if keep {
            self.best.push(Reverse(candidate));
            if self.best.len() > self.k {
                self.best.pop();
            }
        }
    }
}

fn finish(best: BinaryHeap<Reverse<Scored>>, antennas: &[(u8, Vec<(u8, Snr)>)]) -> Vec<SectorCombination> {
    best.into_sorted_vec()
        .into_iter()
        .map(|Reverse(scored)| SectorCombination {
            sectors: antennas
                .iter()
                .zip(scored.sectors)
                .map(|((antenna, _), sector)| AntennaSector::new(*antenna, sector))
                .collect(),
            metric: scored.metric,
        })
        .collect()
}
