//! Driver-level behavior: warmup rebasing and summary-line output-file
//! appending, driven through the public `SimulationDriver` API.

use std::fs::File;
use std::io::Write;

use cachesim::config::{PolicyKind, SimulatorConfig};
use cachesim::driver::SimulationDriver;
use tempfile::tempdir;

fn write_oracle_general(path: &std::path::Path, records: &[(u32, u64, u32, i64)]) {
    let mut f = File::create(path).unwrap();
    for &(t, id, size, next) in records {
        f.write_all(&t.to_le_bytes()).unwrap();
        f.write_all(&id.to_le_bytes()).unwrap();
        f.write_all(&size.to_le_bytes()).unwrap();
        f.write_all(&next.to_le_bytes()).unwrap();
    }
}

/// Scenario 3: warmup = 10, raw clock_times {5,7,16,17}, ids {a,b,a,c}. The
/// driver rebases against the first request's clock_time (5), so the two
/// later requests land at rebased times 11 and 12 and are the only ones
/// counted; `a`'s warmup access at rebased time 0 already populated the
/// cache, so the counted `a` access at rebased time 11 is a hit and only
/// `c` at rebased time 12 is a miss. Expected miss ratio 0.5.
#[test]
fn warmup_rebases_clock_time_and_excludes_warmup_requests() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    write_oracle_general(
        &path,
        &[
            (5, 1, 10, -1),  // a, rebased 0, warmup
            (7, 2, 10, -1),  // b, rebased 2, warmup
            (16, 1, 10, -1), // a, rebased 11, counted hit
            (17, 3, 10, -1), // c, rebased 12, counted miss
        ],
    );
    let mut config = SimulatorConfig::new(&path, 10_000);
    config.policy = PolicyKind::Lru;
    config.warmup_seconds = 10;
    let driver = SimulationDriver::new(config).unwrap();
    let summary = driver.run().unwrap();

    assert_eq!(summary.req_count, 2);
    assert_eq!(summary.miss_count, 1);
    assert!((summary.miss_ratio - 0.5).abs() < 1e-9);
}

#[test]
fn summary_line_is_appended_to_output_file() {
    let dir = tempdir().unwrap();
    let trace_path = dir.path().join("t.oracleGeneral");
    write_oracle_general(&trace_path, &[(0, 1, 10, -1), (1, 2, 10, -1)]);
    let output_path = dir.path().join("reports").join("summary.txt");

    let mut config = SimulatorConfig::new(&trace_path, 10_000);
    config.output_path = Some(output_path.clone());
    let driver = SimulationDriver::new(config).unwrap();
    driver.run().unwrap();

    let contents = std::fs::read_to_string(&output_path).unwrap();
    assert!(contents.contains("miss ratio"));
    assert!(contents.contains("MQPS"));
}

#[test]
fn empty_trace_yields_zero_requests() {
    let dir = tempdir().unwrap();
    let trace_path = dir.path().join("t.oracleGeneral");
    write_oracle_general(&trace_path, &[]);
    let config = SimulatorConfig::new(&trace_path, 10_000);
    let driver = SimulationDriver::new(config).unwrap();
    let summary = driver.run().unwrap();
    assert_eq!(summary.req_count, 0);
}

/// §7: a request whose object is larger than the cache's entire capacity
/// must run to completion as a counted miss, not abort the run.
#[test]
fn oversized_object_is_a_miss_not_a_fatal_error() {
    let dir = tempdir().unwrap();
    let trace_path = dir.path().join("t.oracleGeneral");
    write_oracle_general(
        &trace_path,
        &[(0, 1, 10_000, -1), (1, 2, 5, -1), (2, 2, 5, -1)],
    );
    let config = SimulatorConfig::new(&trace_path, 100);
    let driver = SimulationDriver::new(config).unwrap();
    let summary = driver.run().unwrap();

    assert_eq!(summary.req_count, 3);
    assert_eq!(summary.miss_count, 2);
}
