//! `bloark glimpse` specs — shape fingerprinting, end-to-end via the CLI.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::prelude::*;

#[test]
fn glimpses_the_only_record_in_a_freshly_built_warehouse() {
    let src = tempfile::tempdir().expect("tempdir");
    let out = tempfile::tempdir().expect("tempdir");
    write_bz2_fixture(&src.path().join("dump.xml.bz2"), SINGLE_ARTICLE_XML);

    cli()
        .args(&[
            "build",
            src.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
        ])
        .passes();

    let run = cli()
        .args(&["glimpse", out.path().to_str().unwrap()])
        .passes();
    let printed: serde_json::Value = serde_json::from_str(&run.stdout()).expect("json output");
    assert_eq!(printed["record"]["article_id"], serde_json::json!("42"));
    assert_eq!(printed["shape"]["article_id"], serde_json::json!("str"));
}

#[test]
fn glimpse_on_an_empty_directory_fails() {
    let out = tempfile::tempdir().expect("tempdir");
    cli().args(&["glimpse", out.path().to_str().unwrap()]).fails();
}
