// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for shape handling.

/// Errors that can occur when converting between shape representations.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// A shape had a different rank than the conversion requires.
    #[error("rank mismatch: expected rank {expected}, got rank {got}")]
    RankMismatch { expected: usize, got: usize },

    /// A shape contained a zero-sized dimension where elements are required.
    #[error("shape {shape} has zero elements")]
    ZeroElements { shape: String },
}
