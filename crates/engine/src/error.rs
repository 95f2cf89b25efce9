// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the build/modify/glimpse pipelines.

use bloark_codecs::{CodecError, XmlWalkError};
use bloark_core::{FsError, RecordError};
use bloark_storage::AllocatorError;
use thiserror::Error;

/// Errors surfaced by [`crate::builder::Builder::build`]. Only
/// `NoInputFiles` ever reaches the caller directly; everything else is
/// logged at its stage boundary and the run continues best-effort.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("no input files were preloaded")]
    NoInputFiles,
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("xml parse error: {0}")]
    Parse(#[from] XmlWalkError),
    #[error("allocator error: {0}")]
    Allocator(#[from] AllocatorError),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
}

/// Errors surfaced by [`crate::modifier::Modifier::start`].
#[derive(Debug, Error)]
pub enum ModifierError {
    #[error("no input warehouses were preloaded")]
    NoInputFiles,
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("record error: {0}")]
    Record(#[from] RecordError),
    #[error("allocator error: {0}")]
    Allocator(#[from] AllocatorError),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
}

/// Errors surfaced by [`crate::glimpse::Reader`].
#[derive(Debug, Error)]
pub enum GlimpseError {
    #[error("no input files were preloaded")]
    NoInputFiles,
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
