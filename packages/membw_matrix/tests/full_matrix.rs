//! End-to-end measurement against the real platform.
//!
//! These tests perform actual binding, placement and timed copies, just with a
//! transfer size small enough to keep the run fast on large machines.

#![cfg(target_os = "linux")]

use std::fs;

use membw_matrix::{RunInput, run};
use new_zealand::nz;

#[test]
fn full_matrix_run_produces_a_complete_document() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("matrix.json");

    let input = RunInput {
        transfer_size: 256 * 1024,
        passes: nz!(2),
        output: Some(path.clone()),
    };

    let summary = run(&input).expect("measurement run failed");

    assert!(summary.matrix.is_complete());
    assert_eq!(summary.matrix.rows().len(), summary.matrix.side());

    for (expected_consumer, row) in summary.matrix.rows().iter().enumerate() {
        assert_eq!(row.consumer(), expected_consumer);

        let mut previous_producer = None;
        for cell in row.cells() {
            assert!(previous_producer < Some(cell.producer()));
            previous_producer = Some(cell.producer());

            assert!(cell.bytes_per_sec().is_finite());
            assert!(cell.bytes_per_sec() >= 0.0);
        }
    }

    let contents = fs::read_to_string(&path).expect("output file missing");
    assert!(contents.starts_with('{'));
    assert!(contents.ends_with('}'));
}

#[test]
fn run_without_output_path_only_logs() {
    let input = RunInput {
        transfer_size: 64 * 1024,
        passes: nz!(1),
        output: None,
    };

    let summary = run(&input).expect("measurement run failed");

    assert!(summary.matrix.is_complete());
}
