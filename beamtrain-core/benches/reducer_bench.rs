//! Benchmarks for the candidate reducer
//!
//! K-best selection over realistic codebook sizes, and MIMO ranking with
//! diversity reduction.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use beamtrain_core::model::AntennaConfiguration;
use beamtrain_core::{
    reduce_for_diversity, select_k_best, FeedbackKey, FeedbackMap, MimoCombination, RankedCombinations, Snr,
};

/// Feedback from `peers` stations over `antennas` arrays of `sectors` sectors
fn feedback_map(antennas: u8, sectors: u8, peers: u16) -> FeedbackMap {
    let mut feedback = FeedbackMap::new();
    for antenna in 1..=antennas {
        for sector in 0..sectors {
            for peer in 1..=peers {
                let value = ((u32::from(antenna) * 31 + u32::from(sector) * 17 + u32::from(peer) * 7) % 97) as f64;
                feedback.insert(FeedbackKey::new(antenna, peer, sector), Snr::new(value).unwrap());
            }
        }
    }
    feedback
}

fn combinations(count: u16) -> Vec<MimoCombination> {
    (0..count)
        .map(|i| {
            let tx_id = i / 4 + 1;
            let rx_id = i % 4 + 1;
            MimoCombination {
                tx_id,
                rx_id,
                tx: vec![
                    AntennaConfiguration::sector(1, (tx_id % 64) as u8),
                    AntennaConfiguration::sector(2, (tx_id % 64) as u8),
                ],
                rx: vec![
                    AntennaConfiguration::sector(1, rx_id as u8),
                    AntennaConfiguration::sector(2, rx_id as u8),
                ],
                stream_snr: (0..4u16)
                    .map(|s| Snr::new(f64::from((i * 13 + s * 29) % 101)).unwrap())
                    .collect(),
            }
        })
        .collect()
}

fn bench_k_best(c: &mut Criterion) {
    let mut group = c.benchmark_group("k_best");

    for sectors in [16u8, 64] {
        let feedback = feedback_map(2, sectors, 2);
        group.bench_function(BenchmarkId::new("2_antennas", sectors), |b| {
            b.iter(|| black_box(select_k_best(black_box(&feedback), 15, 2, 2)))
        });
    }

    let feedback = feedback_map(3, 32, 4);
    group.bench_function(BenchmarkId::new("3_antennas", 32), |b| {
        b.iter(|| black_box(select_k_best(black_box(&feedback), 15, 3, 4)))
    });

    group.finish();
}

fn bench_diversity(c: &mut Criterion) {
    let mut group = c.benchmark_group("mimo_ranking");
    let measured = combinations(256);

    group.bench_function(BenchmarkId::new("rank", "256_combinations"), |b| {
        b.iter(|| black_box(RankedCombinations::rank_by_min_stream(black_box(&measured)).unwrap()))
    });

    let ranked = RankedCombinations::rank_by_min_stream(&measured).unwrap();
    group.bench_function(BenchmarkId::new("reduce", "256_combinations"), |b| {
        b.iter(|| black_box(reduce_for_diversity(black_box(&ranked), false)))
    });

    group.finish();
}

criterion_group!(benches, bench_k_best, bench_diversity);
criterion_main!(benches);
