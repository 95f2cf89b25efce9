//! `bloark build` specs — archive-to-warehouse end-to-end behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::prelude::*;
use std::fs;

fn count_with_extension(dir: &std::path::Path, extension: &str) -> usize {
    fs::read_dir(dir)
        .expect("read_dir")
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some(extension))
        .count()
}

#[test]
fn single_article_archive_produces_one_sealed_warehouse() {
    let src = tempfile::tempdir().expect("tempdir");
    let out = tempfile::tempdir().expect("tempdir");
    write_bz2_fixture(&src.path().join("dump.xml.bz2"), SINGLE_ARTICLE_XML);

    cli()
        .args(&[
            "build",
            src.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
        ])
        .passes()
        .stdout_has("processed 1 archive(s)");

    assert_eq!(count_with_extension(out.path(), "zst"), 1);
    let metadata = fs::read_to_string(out.path().join("warehouse_00000.metadata")).expect("read metadata");
    let line: serde_json::Value = serde_json::from_str(metadata.lines().next().expect("one line")).expect("json");
    assert_eq!(line["id"], serde_json::json!("42"));
    assert_eq!(line["title"], serde_json::json!("Alpha"));
    assert_eq!(line["categories"], serde_json::json!(["Greeting"]));
    assert_eq!(line["byte_start"], serde_json::json!(0));

    // P1: the sealed payload decodes to a non-empty sequence of JSON lines
    // whose article_id matches the metadata entry addressing them.
    let compressed = fs::read(out.path().join("warehouse_00000.jsonl.zst")).expect("read payload");
    let payload = zstd::decode_all(compressed.as_slice()).expect("decode zstd frame");
    let payload = String::from_utf8(payload).expect("utf8 payload");
    let mut payload_lines = payload.lines();
    let record: serde_json::Value = serde_json::from_str(payload_lines.next().expect("one record")).expect("json");
    assert_eq!(record["article_id"], line["id"]);
    assert!(payload_lines.next().is_none(), "exactly one revision record");
}

#[test]
fn multi_article_archive_keeps_metadata_sorted_and_non_overlapping() {
    let src = tempfile::tempdir().expect("tempdir");
    let out = tempfile::tempdir().expect("tempdir");
    write_bz2_fixture(&src.path().join("dump.xml.bz2"), MULTI_ARTICLE_XML);

    cli()
        .args(&[
            "build",
            src.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
        ])
        .passes();

    let metadata = fs::read_to_string(out.path().join("warehouse_00000.metadata")).expect("read metadata");
    let mut last_end = 0u64;
    let mut count = 0;
    for line in metadata.lines() {
        let entry: serde_json::Value = serde_json::from_str(line).expect("json");
        let start = entry["byte_start"].as_u64().expect("byte_start");
        let end = entry["byte_end"].as_u64().expect("byte_end");
        assert!(start >= last_end, "metadata ordered by byte_start");
        assert!(start < end, "segment must be non-empty");
        last_end = end;
        count += 1;
    }
    assert_eq!(count, 3);
}

#[test]
fn a_tiny_max_size_forces_one_warehouse_per_article() {
    let src = tempfile::tempdir().expect("tempdir");
    let out = tempfile::tempdir().expect("tempdir");
    write_bz2_fixture(&src.path().join("dump.xml.bz2"), MULTI_ARTICLE_XML);

    cli()
        .args(&[
            "build",
            src.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
            "--max-size",
            "1",
        ])
        .passes();

    assert_eq!(count_with_extension(out.path(), "zst"), 3, "a tiny max-size seals a warehouse per article");
}

#[test]
fn missing_input_path_fails_with_no_partial_output() {
    let out = tempfile::tempdir().expect("tempdir");
    cli()
        .args(&["build", "/no/such/path/here", out.path().to_str().unwrap()])
        .fails()
        .stderr_has("Error:");
}
