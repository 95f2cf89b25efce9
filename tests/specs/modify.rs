//! `bloark modify` specs — modifier no-op end-to-end via the CLI's
//! identity chain.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::prelude::*;
use std::fs;

#[test]
fn identity_modify_reproduces_the_same_records() {
    let src = tempfile::tempdir().expect("tempdir");
    let built = tempfile::tempdir().expect("tempdir");
    let modified = tempfile::tempdir().expect("tempdir");
    write_bz2_fixture(&src.path().join("dump.xml.bz2"), MULTI_ARTICLE_XML);

    cli()
        .args(&[
            "build",
            src.path().to_str().unwrap(),
            built.path().to_str().unwrap(),
        ])
        .passes();

    cli()
        .args(&[
            "modify",
            built.path().to_str().unwrap(),
            modified.path().to_str().unwrap(),
        ])
        .passes()
        .stdout_has("replayed 1 warehouse(s)");

    let metadata = fs::read_to_string(modified.path().join("warehouse_00000.metadata")).expect("read metadata");
    let ids: Vec<String> = metadata
        .lines()
        .map(|line| {
            let entry: serde_json::Value = serde_json::from_str(line).expect("json");
            entry["id"].as_str().expect("id").to_string()
        })
        .collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert!(modified.path().join("warehouse_00000.jsonl.zst").exists());
}
