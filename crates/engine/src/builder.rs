// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builder pipeline: decompress → process → cleanup, driving per-input
//! archive extraction and per-article warehouse packing through the worker
//! pool. Implements a direct-write variant: the process stage appends
//! straight into an assigned warehouse, so the pack stage (record-level
//! reordering via `bulk_assign`) is never needed on this path.

use crate::error::BuilderError;
use crate::worker_pool::WorkerPool;
use bloark_codecs::{compress_zstd, decompress_7z, decompress_bz2, walk, XmlValue};
use bloark_core::{extract_categories, file_size, is_redirect, list_files, Metadata};
use bloark_storage::{compressed_payload_path, metadata_path, payload_path, Base, WarehouseAllocator};
use serde_json::{json, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;
/// `<mediawiki>` is depth 1 under the implicit document root and `<page>`
/// is depth 2 in `bloark_codecs::xml::walk`'s counting (ancestors plus
/// self, starting from the root's immediate children at 1).
const PAGE_DEPTH: usize = 2;
const ZSTD_LEVEL: i32 = 3;

/// Summary returned by a completed build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub archives_processed: usize,
    pub warehouses_sealed: usize,
}

pub struct Builder {
    output_dir: PathBuf,
    workers: usize,
    max_size: u64,
    compress: bool,
    files: Vec<PathBuf>,
}

impl Builder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: 1,
            max_size: DEFAULT_MAX_SIZE,
            compress: true,
            files: Vec::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Preload a file or directory of archives to process. May be called
    /// multiple times.
    pub fn preload(&mut self, path: &Path) -> Result<(), BuilderError> {
        if !path.exists() {
            return Err(BuilderError::Filesystem(bloark_core::FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "path does not exist"),
            }));
        }
        if path.is_dir() {
            self.files.extend(list_files(path, Some(&["7z", "bz2"]))?);
        } else {
            self.files.push(path.to_path_buf());
        }
        Ok(())
    }

    pub async fn build(&self) -> Result<BuildReport, BuilderError> {
        if self.files.is_empty() {
            return Err(BuilderError::NoInputFiles);
        }

        bloark_core::prepare_output_dir(&self.output_dir)?;
        let temp_dir = self.output_dir.join("temp");
        fs::create_dir_all(&temp_dir).map_err(|source| bloark_core::FsError::Io {
            path: temp_dir.clone(),
            source,
        })?;

        let ctx = Arc::new(BuildContext {
            output_dir: self.output_dir.clone(),
            temp_dir: temp_dir.clone(),
            allocator: Arc::new(WarehouseAllocator::new(
                &self.output_dir,
                self.max_size,
                self.compress,
            )),
            compress: self.compress,
        });

        let archives_processed = self.files.len();
        let initial: Vec<BuildTask> = self
            .files
            .iter()
            .cloned()
            .map(BuildTask::Decompress)
            .collect();

        let pool = WorkerPool::new(self.workers);
        let run_ctx = Arc::clone(&ctx);
        let run = Arc::new(move |task: BuildTask| run_build_task(task, &run_ctx));
        pool.drive(initial, run).await;

        let finalize_tasks: Vec<BuildTask> = ctx
            .allocator
            .available_bases()
            .into_iter()
            .filter_map(|base| match ctx.allocator.finalize(base) {
                Ok(()) if ctx.compress => Some(BuildTask::Cleanup(payload_path(&ctx.output_dir, base))),
                Ok(()) => None,
                Err(err) => {
                    tracing::error!(warehouse = %base, error = %err, "finalize failed");
                    None
                }
            })
            .collect();
        let warehouses_sealed = finalize_tasks.len();

        let run_ctx = Arc::clone(&ctx);
        let run = Arc::new(move |task: BuildTask| run_build_task(task, &run_ctx));
        pool.drive(finalize_tasks, run).await;

        bloark_core::cleanup_dir(&temp_dir, |path, err| {
            tracing::warn!(path = %path.display(), error = %err, "temp cleanup failed");
        });

        Ok(BuildReport {
            archives_processed,
            warehouses_sealed,
        })
    }
}

struct BuildContext {
    output_dir: PathBuf,
    temp_dir: PathBuf,
    allocator: Arc<WarehouseAllocator>,
    compress: bool,
}

enum BuildTask {
    Decompress(PathBuf),
    Process(PathBuf),
    Cleanup(PathBuf),
}

fn run_build_task(task: BuildTask, ctx: &BuildContext) -> Vec<BuildTask> {
    match task {
        BuildTask::Decompress(archive) => run_decompress(&archive, ctx),
        BuildTask::Process(xml_path) => run_process(&xml_path, ctx),
        BuildTask::Cleanup(payload) => run_cleanup(&payload, ctx),
    }
}

fn run_decompress(archive: &Path, ctx: &BuildContext) -> Vec<BuildTask> {
    if !archive.exists() {
        tracing::error!(archive = %archive.display(), "archive does not exist");
        return Vec::new();
    }
    let dst_dir = ctx.temp_dir.join(uuid::Uuid::new_v4().to_string());
    let extension = archive.extension().and_then(|e| e.to_str()).unwrap_or("");
    let extracted = match extension {
        "7z" => match decompress_7z(archive, &dst_dir) {
            Ok(files) => files,
            Err(err) => {
                tracing::error!(archive = %archive.display(), error = %err, "7z decompression failed");
                return Vec::new();
            }
        },
        "bz2" => {
            if let Err(err) = fs::create_dir_all(&dst_dir) {
                tracing::error!(archive = %archive.display(), error = %err, "failed to create temp dir");
                return Vec::new();
            }
            let dst_path = dst_dir.join(archive.file_stem().unwrap_or_default());
            match decompress_bz2(archive, &dst_path) {
                Ok(()) => vec![dst_path],
                Err(err) => {
                    tracing::error!(archive = %archive.display(), error = %err, "bz2 decompression failed");
                    return Vec::new();
                }
            }
        }
        other => {
            tracing::warn!(archive = %archive.display(), extension = other, "unsupported archive type, skipped");
            return Vec::new();
        }
    };
    extracted.into_iter().map(BuildTask::Process).collect()
}

fn run_process(xml_path: &Path, ctx: &BuildContext) -> Vec<BuildTask> {
    let mut sealed = Vec::new();
    let result = walk(xml_path, PAGE_DEPTH, |_stack, page| {
        process_page(&page, ctx, &mut sealed);
        true
    });
    if let Err(err) = result {
        tracing::error!(xml_path = %xml_path.display(), error = %err, "xml parse failed, file abandoned");
    }

    let _ = fs::remove_file(xml_path);
    if let Some(parent) = xml_path.parent() {
        let _ = fs::remove_dir(parent);
    }

    sealed.into_iter().map(BuildTask::Cleanup).collect()
}

fn run_cleanup(payload: &Path, ctx: &BuildContext) -> Vec<BuildTask> {
    if !payload.exists() {
        tracing::warn!(payload = %payload.display(), "cleanup skipped: payload missing");
        return Vec::new();
    }
    let base = base_from_payload_path(payload);
    let compressed = base
        .map(|b| compressed_payload_path(&ctx.output_dir, b))
        .unwrap_or_else(|| payload.with_extension("jsonl.zst"));
    match compress_zstd(payload, &compressed, ZSTD_LEVEL) {
        Ok(()) => {
            let _ = fs::remove_file(payload);
            tracing::info!(payload = %payload.display(), "warehouse packed");
        }
        Err(err) => {
            tracing::error!(payload = %payload.display(), error = %err, "compression failed");
        }
    }
    Vec::new()
}

fn base_from_payload_path(payload: &Path) -> Option<Base> {
    let stem = payload.file_stem()?.to_str()?;
    let index = stem.strip_prefix("warehouse_")?;
    index.parse::<u64>().ok().map(Base)
}

/// Runs the per-article accumulator over one already-materialized
/// `<page>` subtree. Each `walk()` callback already
/// owns exactly one complete article, so there is no cross-callback
/// "previous article" state to finalize on the next `<title>` — the whole
/// title → id → revisions → finalize sequence happens within this call.
fn process_page(page: &XmlValue, ctx: &BuildContext, sealed: &mut Vec<PathBuf>) {
    let (Some(title), Some(id)) = (
        page.get("title").and_then(XmlValue::as_leaf),
        page.get("id").and_then(XmlValue::as_leaf),
    ) else {
        return;
    };

    let base = match ctx.allocator.assign() {
        Ok(base) => base,
        Err(err) => {
            tracing::error!(error = %err, "allocator assign failed");
            return;
        }
    };

    let payload = payload_path(&ctx.output_dir, base);
    let byte_start = match file_size(&payload) {
        Ok(size) => size,
        Err(err) => {
            tracing::error!(error = %err, "failed to read warehouse size");
            return;
        }
    };

    let mut file = match OpenOptions::new().create(true).append(true).open(&payload) {
        Ok(file) => file,
        Err(source) => {
            tracing::error!(path = %payload.display(), error = %source, "failed to open warehouse payload");
            return;
        }
    };

    let mut bytes_written: u64 = 0;
    let mut source_revision: Option<String> = None;
    let mut last_valid_text: Option<String> = None;

    for revision in page.iter_field("revision") {
        let revision_id = revision.get("id").and_then(XmlValue::as_leaf);
        let parent_id = revision.get("parentid").and_then(XmlValue::as_leaf);
        let timestamp = revision.get("timestamp").and_then(XmlValue::as_leaf);
        let text_content = extract_text(revision);

        let mut record = serde_json::Map::new();
        record.insert("article_id".to_string(), json!(id));
        if let Some(rid) = revision_id {
            record.insert("revision_id".to_string(), json!(rid));
        }
        if let Some(pid) = parent_id {
            record.insert("parent_id".to_string(), json!(pid));
        }
        if let Some(ts) = timestamp {
            record.insert("timestamp".to_string(), json!(ts));
        }
        record.insert(
            "text".to_string(),
            json!({ "#text": text_content.as_deref().unwrap_or("") }),
        );

        let line = Value::Object(record).to_string();
        if let Err(err) = writeln!(file, "{line}") {
            tracing::error!(path = %payload.display(), error = %err, "failed to append record");
            continue;
        }
        bytes_written += line.len() as u64 + 1;

        let text_content = text_content.unwrap_or_default();
        if !is_redirect(&text_content) {
            source_revision = revision_id.map(str::to_string);
            last_valid_text = Some(text_content);
        }
    }

    let byte_end = byte_start + bytes_written;
    let categories = last_valid_text
        .as_deref()
        .map(extract_categories)
        .unwrap_or_default();
    let metadata = Metadata {
        id: id.to_string(),
        title: title.to_string(),
        source_revision,
        categories,
        byte_start,
        byte_end,
    };

    if let Err(err) = append_metadata_line(&ctx.output_dir, base, &metadata) {
        tracing::error!(error = %err, "failed to write metadata line");
    }

    match ctx.allocator.release(base) {
        Ok(Some(sealed_path)) => sealed.push(sealed_path),
        Ok(None) => {}
        Err(err) => tracing::error!(warehouse = %base, error = %err, "release failed"),
    }
}

fn extract_text(revision: &XmlValue) -> Option<String> {
    match revision.get("text") {
        Some(XmlValue::Leaf(s)) => Some(s.clone()),
        Some(text @ XmlValue::Map(_)) => text.get("#text").and_then(XmlValue::as_leaf).map(str::to_string),
        _ => None,
    }
}

fn append_metadata_line(output_dir: &Path, base: Base, metadata: &Metadata) -> std::io::Result<()> {
    let path = metadata_path(output_dir, base);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", metadata.to_line().map_err(std::io::Error::other)?)
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
