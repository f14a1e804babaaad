// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the sample pipeline.
//!
//! [`PipelineError`] aggregates every stage's error so callers see which
//! stage failed; none of them is recoverable within a run.

use std::path::PathBuf;

/// Errors from adapting a raw image into the input binding.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// The image's pixel count does not match the declared input shape.
    /// The adapter never truncates or pads.
    #[error(
        "image has {got_pixels} pixels, declared {height}x{width} input requires {expected_pixels}"
    )]
    DimensionMismatch {
        height: usize,
        width: usize,
        expected_pixels: usize,
        got_pixels: usize,
    },

    /// The target host region is smaller than one input sample.
    #[error("host buffer holds {got} elements, input binding requires {expected}")]
    BufferTooSmall { expected: usize, got: usize },
}

/// Any failure of the build → infer → verify pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The model description could not be parsed.
    #[error("model parsing failed: {0}")]
    Parse(#[from] graph_ir::ParseError),

    /// The compiler found no feasible kernel plan.
    #[error("engine compilation failed: {0}")]
    Compilation(#[from] accel_backend::CompilationError),

    /// The engine violates the single rank-3 input contract.
    #[error("engine topology violation: {0}")]
    Topology(#[from] accel_backend::TopologyError),

    /// Input adaptation failed.
    #[error("input preparation failed: {0}")]
    Input(#[from] InputError),

    /// A host/device copy failed.
    #[error("host/device transfer failed: {0}")]
    Transfer(#[from] buffer_manager::TransferError),

    /// The accelerator faulted during a forward pass.
    #[error("inference execution failed: {0}")]
    Execution(#[from] accel_backend::ExecutionError),

    /// The resolved sample configuration is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required data file was not found in any configured directory.
    #[error("data file '{name}' not found in {searched:?}")]
    DataFileNotFound {
        name: String,
        searched: Vec<PathBuf>,
    },

    /// A data file exists but could not be read.
    #[error("failed to read data file '{path}': {source}")]
    DataRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
