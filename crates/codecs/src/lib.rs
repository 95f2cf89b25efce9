// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloark-codecs: byte-stream codec adapters (7z/bz2/zstd) and the
//! depth-limited XML stream adapter consumed by the builder and modifier
//! pipelines.

pub mod codec;
pub mod xml;

pub use codec::{
    compress_zstd, decompress_7z, decompress_bz2, decompress_zstd, estimate_uncompressed_size,
    CodecError,
};
pub use xml::{walk, XmlValue, XmlWalkError};
