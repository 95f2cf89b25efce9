// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glimpse / Reader: batch-decompress already-built warehouses, or
//! take a quick peek at one without touching the rest — a uniformly
//! random warehouse, its first record, and a structural shape fingerprint
//! built by recursively replacing every scalar with its type name (so two
//! records with the same fields but different values report the same
//! shape).

use crate::error::GlimpseError;
use crate::worker_pool::WorkerPool;
use bloark_codecs::decompress_zstd;
use bloark_core::{list_files, read_line_at};
use rand::Rng;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The first record of a randomly chosen warehouse, plus its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Glimpse {
    pub record: Value,
    pub shape: Value,
}

pub struct Reader {
    output_dir: PathBuf,
    workers: usize,
    files: Vec<PathBuf>,
}

impl Reader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: 1,
            files: Vec::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Preload a warehouse payload (`*.jsonl.zst`) or a directory of them.
    /// May be called multiple times.
    pub fn preload(&mut self, path: &Path) -> Result<(), GlimpseError> {
        if !path.exists() {
            return Err(GlimpseError::Filesystem(bloark_core::FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
            }));
        }
        if path.is_dir() {
            self.files.extend(list_files(path, Some(&["zst"]))?);
        } else {
            self.files.push(path.to_path_buf());
        }
        Ok(())
    }

    /// Decompress every preloaded warehouse straight into `output_dir`.
    /// Returns the number of warehouses decompressed.
    pub async fn decompress(&self) -> Result<usize, GlimpseError> {
        if self.files.is_empty() {
            return Err(GlimpseError::NoInputFiles);
        }
        fs::create_dir_all(&self.output_dir).map_err(|source| bloark_core::FsError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        let output_dir = self.output_dir.clone();
        let run = Arc::new(move |file: PathBuf| -> Vec<PathBuf> {
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                return Vec::new();
            };
            let Some(stem) = name.strip_suffix(".zst") else {
                tracing::warn!(file = %file.display(), "unsupported file format, skipped");
                return Vec::new();
            };
            let dst = output_dir.join(stem);
            if let Err(err) = decompress_zstd(&file, &dst) {
                tracing::error!(file = %file.display(), error = %err, "decompression failed");
            }
            Vec::new()
        });

        let pool = WorkerPool::new(self.workers);
        pool.drive(self.files.clone(), run).await;

        Ok(self.files.len())
    }

    /// Randomly select one preloaded warehouse, decode its first record,
    /// and compute a shape fingerprint, without materializing the rest of
    /// the payload.
    pub fn glimpse(&self) -> Result<Glimpse, GlimpseError> {
        if self.files.is_empty() {
            return Err(GlimpseError::NoInputFiles);
        }

        let picked = {
            let index = rand::thread_rng().gen_range(0..self.files.len());
            &self.files[index]
        };
        tracing::info!(file = %picked.display(), "glimpsing warehouse");

        let glimpse_dir = self.output_dir.join(".glimpse");
        fs::create_dir_all(&glimpse_dir).map_err(|source| bloark_core::FsError::Io {
            path: glimpse_dir.clone(),
            source,
        })?;

        let decompressed_path = glimpse_dir.join(
            picked
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(".zst"))
                .unwrap_or("glimpse.jsonl"),
        );
        let result = decompress_zstd(picked, &decompressed_path).map_err(GlimpseError::from).and_then(|()| {
            let line = read_line_at(&decompressed_path, 0)?;
            let record: Value = serde_json::from_str(&line)?;
            let shape = shape_of(&record);
            Ok(Glimpse { record, shape })
        });

        bloark_core::cleanup_dir(&glimpse_dir, |path, err| {
            tracing::warn!(path = %path.display(), error = %err, "glimpse cleanup failed");
        });

        result
    }
}

/// Recursively replace every scalar with its JSON type name, every empty
/// object/array with `"empty"`, and every non-empty array with
/// `[shape_of(first_item), length]`.
fn shape_of(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            if map.is_empty() {
                Value::String("empty".to_string())
            } else {
                let mut shape = Map::new();
                for (key, item) in map {
                    shape.insert(key.clone(), shape_of(item));
                }
                Value::Object(shape)
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                Value::String("empty".to_string())
            } else {
                Value::Array(vec![shape_of(&items[0]), Value::from(items.len())])
            }
        }
        Value::String(_) => Value::String("str".to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Value::String("int".to_string()),
        Value::Number(_) => Value::String("float".to_string()),
        Value::Bool(_) => Value::String("bool".to_string()),
        Value::Null => Value::String("NoneType".to_string()),
    }
}

#[cfg(test)]
#[path = "glimpse_tests.rs"]
mod tests;
