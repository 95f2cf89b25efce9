// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bloark-engine: the user-facing pipelines built on top of the codec,
//! storage, and core crates — [`builder::Builder`] (dump archives to
//! warehouses), [`modifier::Modifier`] (warehouse to warehouse, via a
//! user-supplied modifier chain), [`glimpse::Reader`] (random-sample a
//! warehouse, or batch-decompress a set of them), and
//! [`decompressor::Decompressor`] (a standalone archive-decompression
//! batch job) — all driven by the shared [`worker_pool::WorkerPool`].

pub mod builder;
pub mod decompressor;
pub mod error;
pub mod glimpse;
pub mod modifier;
pub mod worker_pool;

pub use builder::{BuildReport, Builder};
pub use decompressor::{Decompressor, DecompressorError};
pub use error::{BuilderError, GlimpseError, ModifierError};
pub use glimpse::{Glimpse, Reader};
pub use modifier::{ModifierProfile, ModifyReport, Modifier};
pub use worker_pool::WorkerPool;
