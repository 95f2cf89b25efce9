// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec adapters: wrap the external 7z / bz2 / zstd libraries as
//! stream decompressors/compressors. Concurrent calls from different
//! workers are expected; each call is single-threaded internally.

use bzip2::read::BzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("7z extraction of {path} failed: {source}")]
    SevenZ {
        path: PathBuf,
        #[source]
        source: sevenz_rust::Error,
    },
}

impl CodecError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Expand a 7z archive into `dst_dir`. Writes straight into `dst_dir` since
/// the caller is expected to hand each worker a fresh temp directory.
pub fn decompress_7z(src: &Path, dst_dir: &Path) -> Result<Vec<PathBuf>, CodecError> {
    fs::create_dir_all(dst_dir).map_err(|e| CodecError::io(dst_dir, e))?;
    sevenz_rust::decompress_file(src, dst_dir).map_err(|source| CodecError::SevenZ {
        path: src.to_path_buf(),
        source,
    })?;
    let mut extracted = Vec::new();
    collect_files(dst_dir, &mut extracted).map_err(|e| CodecError::io(dst_dir, e))?;
    extracted.sort();
    Ok(extracted)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}

/// Stream-decompress a single bz2 file to `dst_path`. Writes to a temp
/// sibling and renames into place so a failure never leaves a partial
/// destination behind.
pub fn decompress_bz2(src: &Path, dst_path: &Path) -> Result<(), CodecError> {
    let src_file = File::open(src).map_err(|e| CodecError::io(src, e))?;
    let mut decoder = BzDecoder::new(BufReader::new(src_file));
    let tmp_path = dst_path.with_extension("part");
    {
        let tmp_file = File::create(&tmp_path).map_err(|e| CodecError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(tmp_file);
        io::copy(&mut decoder, &mut writer).map_err(|e| CodecError::io(src, e))?;
    }
    fs::rename(&tmp_path, dst_path).map_err(|e| CodecError::io(dst_path, e))
}

/// Stream-decompress a zstd frame to `dst_path`.
pub fn decompress_zstd(src: &Path, dst_path: &Path) -> Result<(), CodecError> {
    let src_file = File::open(src).map_err(|e| CodecError::io(src, e))?;
    let tmp_path = dst_path.with_extension("part");
    {
        let tmp_file = File::create(&tmp_path).map_err(|e| CodecError::io(&tmp_path, e))?;
        zstd::stream::copy_decode(BufReader::new(src_file), BufWriter::new(tmp_file))
            .map_err(|e| CodecError::io(src, e))?;
    }
    fs::rename(&tmp_path, dst_path).map_err(|e| CodecError::io(dst_path, e))
}

/// Stream-compress `src` into a zstd frame at `dst_path`, at the given
/// compression level.
pub fn compress_zstd(src: &Path, dst_path: &Path, level: i32) -> Result<(), CodecError> {
    let src_file = File::open(src).map_err(|e| CodecError::io(src, e))?;
    let tmp_path = dst_path.with_extension("part");
    {
        let tmp_file = File::create(&tmp_path).map_err(|e| CodecError::io(&tmp_path, e))?;
        zstd::stream::copy_encode(BufReader::new(src_file), BufWriter::new(tmp_file), level)
            .map_err(|e| CodecError::io(src, e))?;
    }
    fs::rename(&tmp_path, dst_path).map_err(|e| CodecError::io(dst_path, e))
}

/// Best-effort uncompressed-size estimate. Mirrors the original
/// implementation's `get_estimated_size`: for a `.zst` file, reads the
/// frame header's optional content-size field and doubles it; every other
/// extension (including `.7z`, for which no archive-metadata read is
/// available here without extracting) falls back to `filesize * 2`.
pub fn estimate_uncompressed_size(path: &Path) -> Result<u64, CodecError> {
    let meta = fs::metadata(path).map_err(|e| CodecError::io(path, e))?;
    if path.extension().and_then(|e| e.to_str()) == Some("zst") {
        if let Some(size) = zstd_frame_content_size(path)? {
            return Ok(size.saturating_mul(2));
        }
    }
    Ok(meta.len().saturating_mul(2))
}

/// Read the leading bytes of a zstd frame and pull its content-size field,
/// if the frame header carries one (streamed/multi-frame output often
/// doesn't).
fn zstd_frame_content_size(path: &Path) -> Result<Option<u64>, CodecError> {
    let mut file = File::open(path).map_err(|e| CodecError::io(path, e))?;
    let mut header = [0u8; 18];
    let n = file.read(&mut header).map_err(|e| CodecError::io(path, e))?;
    Ok(zstd::zstd_safe::get_frame_content_size(&header[..n]).ok().flatten())
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
