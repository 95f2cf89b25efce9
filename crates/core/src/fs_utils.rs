// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path enumeration, directory preparation/cleanup, and byte-offset line
//! indexing. These are the primitives the builder and modifier
//! pipelines use to discover input archives and random-access metadata
//! sidecars without loading a whole file into memory.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    fn at(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Recursively enumerate regular files under `root`, skipping dotfiles,
/// deduplicated and deterministically sorted by path.
///
/// When `extensions` is given, only files whose final extension matches
/// (case-insensitive, without the leading dot) are kept.
pub fn list_files(root: &Path, extensions: Option<&[&str]>) -> Result<Vec<PathBuf>, FsError> {
    let mut out = Vec::new();
    walk(root, extensions, &mut out)?;
    out.sort();
    out.dedup();
    Ok(out)
}

fn walk(dir: &Path, extensions: Option<&[&str]>, out: &mut Vec<PathBuf>) -> Result<(), FsError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(source) => return Err(FsError::at(dir, source)),
    };
    for entry in entries {
        let entry = entry.map_err(|source| FsError::at(dir, source))?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry
            .file_type()
            .map_err(|source| FsError::at(&path, source))?;
        if file_type.is_dir() {
            walk(&path, extensions, out)?;
        } else if file_type.is_file() && matches_extension(&path, extensions) {
            out.push(path);
        }
    }
    Ok(())
}

fn matches_extension(path: &Path, extensions: Option<&[&str]>) -> bool {
    let Some(extensions) = extensions else {
        return true;
    };
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(ext))
}

/// Recursively remove `path` if it exists, then (re)create it as an empty
/// directory.
pub fn prepare_output_dir(path: &Path) -> Result<(), FsError> {
    if path.exists() {
        fs::remove_dir_all(path).map_err(|source| FsError::at(path, source))?;
    }
    fs::create_dir_all(path).map_err(|source| FsError::at(path, source))
}

/// Best-effort recursive removal. Every filesystem error encountered is
/// reported to `on_error` rather than aborting the rest of the walk.
pub fn cleanup_dir(path: &Path, mut on_error: impl FnMut(&Path, &io::Error)) {
    if let Err(err) = remove_recursive(path, &mut on_error) {
        on_error(path, &err);
    }
}

fn remove_recursive(dir: &Path, on_error: &mut impl FnMut(&Path, &io::Error)) -> io::Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            if let Err(err) = remove_recursive(&path, on_error) {
                on_error(&path, &err);
            }
            if let Err(err) = fs::remove_dir(&path) {
                if err.kind() != io::ErrorKind::NotFound {
                    on_error(&path, &err);
                }
            }
        } else if let Err(err) = fs::remove_file(&path) {
            if err.kind() != io::ErrorKind::NotFound {
                on_error(&path, &err);
            }
        }
    }
    fs::remove_dir(dir).or_else(|err| {
        if err.kind() == io::ErrorKind::NotFound {
            Ok(())
        } else {
            Err(err)
        }
    })
}

/// Byte offset of the first byte of each non-empty line in `path`.
pub fn line_offsets(path: &Path) -> Result<Vec<u64>, FsError> {
    let file = File::open(path).map_err(|source| FsError::at(path, source))?;
    let mut reader = BufReader::new(file);
    let mut offsets = Vec::new();
    let mut offset: u64 = 0;
    let mut line = Vec::new();
    loop {
        line.clear();
        let start = offset;
        let bytes_read = reader
            .read_until(b'\n', &mut line)
            .map_err(|source| FsError::at(path, source))?;
        if bytes_read == 0 {
            break;
        }
        offset += bytes_read as u64;
        let content_len = if line.last() == Some(&b'\n') {
            line.len() - 1
        } else {
            line.len()
        };
        if content_len > 0 {
            offsets.push(start);
        }
    }
    Ok(offsets)
}

/// Seek to `offset` and read a single line, without mmap-ing the whole file.
pub fn read_line_at(path: &Path, offset: u64) -> Result<String, FsError> {
    let mut file = File::open(path).map_err(|source| FsError::at(path, source))?;
    file.seek(SeekFrom::Start(offset))
        .map_err(|source| FsError::at(path, source))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|source| FsError::at(path, source))?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(line)
}

/// Current length, in bytes, of the file at `path`.
pub fn file_size(path: &Path) -> Result<u64, FsError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| FsError::at(path, source))
}

#[cfg(test)]
#[path = "fs_utils_tests.rs"]
mod tests;
