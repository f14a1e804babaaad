// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # pipeline
//!
//! The end-to-end digit classification sample: compile a serialized
//! model for the accelerator once, then run ten verified, timed
//! inference passes — one per digit.
//!
//! # Type-State Pipeline
//!
//! ```text
//! DigitPipeline<Unbuilt>
//!     │  .build()            parse + compile, one-shot
//!     ▼
//! DigitPipeline<Built>
//!     │  .infer()            ten digits: adapt → H2D → execute → D2H → verify
//!     ▼
//!   InferenceReport
//!     │  .teardown()         consumes the pipeline; terminal
//!     ▼
//!   (torn down)
//! ```
//!
//! Invalid orderings are compile errors: there is no way to call
//! `infer()` before `build()`, and nothing can be called after
//! `teardown()` consumed the value.
//!
//! # Failure model
//!
//! Every stage error is fatal for the run. The loop neither retries,
//! falls back to a lower precision, nor skips a failing digit — it
//! aborts and reports which stage failed. Parser-library resources are
//! released on every exit path via the guard the pipeline holds.

mod config;
mod data;
mod error;
mod input;
mod metrics;
mod sample;
pub mod synthetic;
mod verify;

pub use config::SampleConfig;
pub use data::{locate_file, read_digit_image};
pub use error::{InputError, PipelineError};
pub use input::{ascii_art, write_normalized, DigitImage};
pub use metrics::{DigitOutcome, InferenceReport};
pub use sample::{Built, DigitPipeline, PipelineState, Unbuilt};
pub use verify::{classify, verify};

/// Number of digit classes, and therefore of per-digit inference runs.
pub const DIGITS: usize = 10;
