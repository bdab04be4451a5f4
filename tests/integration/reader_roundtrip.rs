//! Reader round-trip and ordering properties, exercised against the
//! oracle-general binary layout and a plain CSV trace through the public
//! `config::SimulatorConfig` + `reader::open` path.

use std::fs::File;
use std::io::Write;

use cachesim::config::{ReaderConfig, SimulatorConfig, TraceFormat};
use cachesim::error::SimError;
use cachesim::reader;
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

#[test]
fn binary_reader_order_matches_on_disk_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    write_oracle_general(
        &path,
        &[(0, 10, 1, -1), (1, 20, 1, -1), (2, 30, 1, -1)],
    );
    let config = SimulatorConfig::new(&path, 1_000);
    let mut reader = reader::open(&config).unwrap();
    let ids: Vec<u64> = (0..3)
        .map(|_| reader.read_one().unwrap().obj_id)
        .collect();
    assert_eq!(ids, vec![10, 20, 30]);
    assert!(matches!(reader.read_one(), Err(SimError::EndOfStream)));
}

#[test]
fn binary_reader_go_back_one_replays_same_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    write_oracle_general(&path, &[(0, 10, 1, -1), (1, 20, 1, -1)]);
    let config = SimulatorConfig::new(&path, 1_000);
    let mut reader = reader::open(&config).unwrap();
    let first = reader.read_one().unwrap();
    reader.go_back_one().unwrap();
    let replay = reader.read_one().unwrap();
    assert_eq!(first.obj_id, replay.obj_id);
}

#[test]
fn text_reader_go_back_one_replays_same_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.csv");
    {
        let mut f = File::create(&path).unwrap();
        writeln!(f, "1,100,10").unwrap();
        writeln!(f, "2,200,20").unwrap();
    }
    let mut config = SimulatorConfig::new(&path, 1_000);
    config.trace_format = TraceFormat::Csv;
    config.reader = ReaderConfig {
        time_col: Some(1),
        obj_id_col: Some(2),
        obj_size_col: Some(3),
        ..ReaderConfig::default()
    };
    let mut reader = reader::open(&config).unwrap();
    let first = reader.read_one().unwrap();
    reader.go_back_one().unwrap();
    let replay = reader.read_one().unwrap();
    assert_eq!(first.obj_id, replay.obj_id);
}

#[test]
fn sampler_is_deterministic_across_two_readers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    let records: Vec<(u32, u64, u32, i64)> =
        (0..200).map(|i| (i, i as u64, 1, -1)).collect();
    write_oracle_general(&path, &records);

    let mut config = SimulatorConfig::new(&path, 1_000);
    config.sampler_ratio = Some(0.5);

    let mut reader_a = reader::open(&config).unwrap();
    let mut reader_b = reader::open(&config).unwrap();

    let mut ids_a = Vec::new();
    while let Ok(req) = reader_a.read_one() {
        ids_a.push(req.obj_id);
    }
    let mut ids_b = Vec::new();
    while let Ok(req) = reader_b.read_one() {
        ids_b.push(req.obj_id);
    }
    assert_eq!(ids_a, ids_b);
}

#[test]
fn ignore_obj_size_rewrites_every_size_to_one() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    write_oracle_general(&path, &[(0, 1, 500, -1), (1, 2, 999, -1)]);
    let mut config = SimulatorConfig::new(&path, 1_000);
    config.reader.ignore_obj_size = true;
    let mut reader = reader::open(&config).unwrap();
    while let Ok(req) = reader.read_one() {
        assert_eq!(req.obj_size, 1);
    }
}

/// Scenario 4 (§8): the oracle-general converter itself is out of scope
/// (see SPEC_FULL.md's Out-of-scope line), but the backward-reading
/// primitive it depends on, `read_one_above`, is in scope and must let a
/// caller reconstruct `next_access_vtime` by walking a trace in reverse.
/// This test plays the role of that small in-test converter: forward pass
/// to learn the record count, then a `read_one_above` walk back to front,
/// replaying the same two-pass shape SPEC_FULL.md §9 describes.
#[test]
fn read_one_above_reconstructs_oracle_next_access_vtimes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    // t=1..5, ids A=1,B=2,A=1,C=3,B=2; next_access_vtime left unknown (-1)
    // in the file itself — it is the converter's job to fill it in.
    write_oracle_general(
        &path,
        &[(1, 1, 10, -1), (2, 2, 10, -1), (3, 1, 10, -1), (4, 3, 10, -1), (5, 2, 10, -1)],
    );
    let config = SimulatorConfig::new(&path, 1_000);
    let mut reader = reader::open(&config).unwrap();

    let mut forward_ids = Vec::new();
    while let Ok(req) = reader.read_one() {
        forward_ids.push(req.obj_id);
    }
    assert_eq!(forward_ids, vec![1, 2, 1, 3, 2]);

    // Walk back from the end, one record at a time, confirming the reverse
    // order matches and collecting it for the next-access computation.
    let mut backward_ids = Vec::new();
    loop {
        match reader.read_one_above() {
            Ok(req) => backward_ids.push(req.obj_id),
            Err(SimError::EndOfStream) => break,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    let mut expected_reverse = forward_ids.clone();
    expected_reverse.reverse();
    assert_eq!(backward_ids, expected_reverse);

    // Pass 2: fold over the reversed sequence, recording each id's most
    // recent later occurrence, producing next_access_vtime per the
    // forward-order index.
    use std::collections::HashMap;
    let mut last_seen: HashMap<u64, i64> = HashMap::new();
    let mut next_access_vtime = vec![-1i64; forward_ids.len()];
    for idx in (0..forward_ids.len()).rev() {
        let id = forward_ids[idx];
        next_access_vtime[idx] = *last_seen.get(&id).unwrap_or(&-1);
        last_seen.insert(id, idx as i64);
    }
    assert_eq!(next_access_vtime, vec![2, 4, -1, -1, -1]);
}

#[test]
fn working_set_size_counts_distinct_objects() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.oracleGeneral");
    write_oracle_general(
        &path,
        &[(0, 1, 1, -1), (1, 1, 1, -1), (2, 2, 1, -1), (3, 3, 1, -1)],
    );
    let config = SimulatorConfig::new(&path, 1_000);
    let mut reader = reader::open(&config).unwrap();
    assert_eq!(reader.working_set_size(1).unwrap(), 3);
}
