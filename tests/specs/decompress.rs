//! `bloark decompress` specs.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::prelude::*;
use std::fs;

#[test]
fn decompresses_a_bz2_archive_into_the_output_directory() {
    let src = tempfile::tempdir().expect("tempdir");
    let out = tempfile::tempdir().expect("tempdir");
    write_bz2_fixture(&src.path().join("dump.xml.bz2"), SINGLE_ARTICLE_XML);

    cli()
        .args(&[
            "decompress",
            src.path().join("dump.xml.bz2").to_str().unwrap(),
            out.path().to_str().unwrap(),
        ])
        .passes()
        .stdout_eq("decompressed 1 archive(s)\n");

    let contents = fs::read_to_string(out.path().join("dump.xml")).expect("read decompressed");
    assert!(contents.contains("Alpha"));
}

#[test]
fn missing_input_fails() {
    let out = tempfile::tempdir().expect("tempdir");
    cli()
        .args(&["decompress", "/no/such/archive.bz2", out.path().to_str().unwrap()])
        .fails();
}
