//! Trace file output
//!
//! Replays the demo scenario into a CSV sink and checks the file layout the
//! analysis scripts read.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use beamtrain_core::collaborator::{RecordingCodebook, RecordingMac};
use beamtrain_core::{CsvTraceSink, RunConfig, Scenario, Simulator};

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn demo_scenario() -> Scenario {
    Scenario::from_json(include_str!("../../demos/two_client_group.json"))
        .expect("Failed to parse two_client_group.json")
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
        .lines()
        .map(str::to_string)
        .collect()
}

/// Data rows per file name, header excluded
fn row_counts(dir: &Path) -> BTreeMap<String, usize> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |ext| ext == "csv"))
        .map(|path| {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            (name, read_lines(&path).len() - 1)
        })
        .collect()
}

fn replay_into(dir: &Path) -> usize {
    let sink = CsvTraceSink::new(dir).expect("Failed to create trace directory");
    let mut sim = Simulator::new(
        RunConfig::default(),
        demo_scenario(),
        RecordingMac::new(),
        RecordingCodebook::new(),
        sink,
    )
    .expect("Failed to build simulator");
    let report = sim.run().expect("Run failed");
    report
        .write_json(&dir.join("run_summary.json"))
        .expect("Failed to write summary");
    sim.coordinator().sink().rows_written()
}

#[test]
fn test_demo_trace_files_and_row_counts() {
    let dir = fresh_dir("beamtrain-trace-output-counts");
    let rows = replay_into(&dir);

    let counts = row_counts(&dir);
    let expected: BTreeMap<String, usize> = [
        ("sls_results.csv", 5),
        ("phase_log.csv", 20),
        ("snr_values.csv", 1),
        ("siso_phase_measurements_1.csv", 4),
        ("siso_phase_measurements_2.csv", 4),
        ("siso_phase_results_0.csv", 8),
        ("mimo_tx_candidates_0.csv", 4),
        ("mimo_phase_measurements_1.csv", 4),
        ("mimo_phase_measurements_reduced_1.csv", 3),
        ("mimo_phase_measurements_2.csv", 2),
        ("mimo_phase_measurements_reduced_2.csv", 2),
    ]
    .into_iter()
    .map(|(name, n)| (name.to_string(), n))
    .collect();

    assert_eq!(counts, expected);
    assert_eq!(rows, expected.values().sum::<usize>());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_demo_trace_headers_and_rows() {
    let dir = fresh_dir("beamtrain-trace-output-rows");
    replay_into(&dir);

    let sls = read_lines(&dir.join("sls_results.csv"));
    assert_eq!(sls[0], "SRC_ID,DST_ID,TRACE_IDX,SECTOR_ID,ANTENNA_ID,ROLE,BSS_ID,Timestamp");
    assert_eq!(sls[1], "1,0,0,12,1,sta,0,102600000");
    assert_eq!(sls[3], "0,1,0,5,1,ap,0,103050000");

    let phases = read_lines(&dir.join("phase_log.csv"));
    assert_eq!(phases[0], "SRC_ID,DST_ID,FROM_PHASE,TO_PHASE,Timestamp");
    assert_eq!(phases[1], "1,0,Idle,SectorSweep,102600000");
    assert!(phases.last().unwrap().starts_with("2,0,MimoPhase,Complete,"));

    let candidates = read_lines(&dir.join("mimo_tx_candidates_0.csv"));
    assert_eq!(
        candidates[0],
        "SRC_ID,DST_ID,TRACE_IDX,ANTENNA_ID1,SECTOR_ID1,ANTENNA_ID2,SECTOR_ID2"
    );
    assert_eq!(candidates[1], "0,0,1,1,6,2,17");

    let mimo = read_lines(&dir.join("mimo_phase_measurements_reduced_1.csv"));
    assert_eq!(
        mimo[0],
        "SRC_ID,DST_ID,TRACE_IDX,\
         TX_ANTENNA_ID1,TX_SECTOR_ID1,TX_AWV_ID1,\
         TX_ANTENNA_ID2,TX_SECTOR_ID2,TX_AWV_ID2,\
         RX_ANTENNA_ID1,RX_SECTOR_ID1,RX_AWV_ID1,\
         SNR,SNR,min_Stream_SNR"
    );
    // Best-first: transmit configuration 2 has the strongest weakest stream
    assert!(mimo[1].starts_with("1,0,1,1,6,0,2,18,0,1,13,0,"));

    let snr = read_lines(&dir.join("snr_values.csv"));
    assert_eq!(snr, vec!["Timestamp,SNR", "103500500,18.4"]);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_run_summary_json() {
    let dir = fresh_dir("beamtrain-trace-output-summary");
    replay_into(&dir);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.join("run_summary.json")).unwrap()).unwrap();
    assert_eq!(summary["beamformed_links"], 4);
    assert_eq!(summary["group_training_triggered"], true);
    assert_eq!(summary["group_training_completed"], true);
    assert_eq!(summary["links"].as_array().map(Vec::len), Some(4));
    assert_eq!(summary["frame_counters"]["dropped"], 1);
    assert_eq!(summary["config"]["k_best_combinations"], 15);
    assert!(summary["run_id"].is_string());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_trace_directory_is_created() {
    let dir = fresh_dir("beamtrain-trace-output-nested").join("a").join("b");
    let sink = CsvTraceSink::new(&dir).unwrap();
    assert!(dir.is_dir());
    assert_eq!(sink.directory(), dir.as_path());
    assert!(sink.files().is_empty());

    let _ = fs::remove_dir_all(std::env::temp_dir().join("beamtrain-trace-output-nested"));
}
