// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `bloark glimpse` — pick a random warehouse, decode its first record,
//! and print it alongside its structural shape.

use anyhow::{Context, Result};
use bloark_engine::Reader;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct GlimpseArgs {
    /// Warehouse payload (`*.jsonl.zst`), or directory of them, to sample
    pub input: PathBuf,
}

pub fn handle(args: GlimpseArgs, workers: usize) -> Result<()> {
    let temp_dir = std::env::temp_dir().join(format!("bloark-glimpse-{}", std::process::id()));
    let mut reader = Reader::new(&temp_dir).with_workers(workers);
    reader
        .preload(&args.input)
        .context("preloading warehouses")?;

    let result = reader.glimpse().context("glimpse failed");
    let _ = std::fs::remove_dir_all(&temp_dir);
    let glimpse = result?;

    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "record": glimpse.record,
            "shape": glimpse.shape,
        }))
        .context("rendering glimpse as json")?
    );
    Ok(())
}
