// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model description parsing.

/// Errors that can occur while loading a serialized model description.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The model description file could not be read.
    #[error("failed to read model description: {0}")]
    ModelRead(#[from] std::io::Error),

    /// The model description JSON is malformed.
    #[error("malformed model description: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A tensor name declared by the caller is absent from the graph.
    #[error("declared tensor '{name}' is not present in the model graph")]
    TensorNotFound { name: String },

    /// The weight file could not be loaded or parsed.
    #[error("failed to load weights: {0}")]
    WeightRead(String),

    /// A weight tensor referenced by an op was not found in the weight file.
    #[error("weight tensor not found: {name}")]
    WeightNotFound { name: String },

    /// A weight tensor uses an element type other than 32-bit float.
    #[error("weight tensor '{name}' has unsupported element type {dtype}")]
    UnsupportedWeightType { name: String, dtype: String },

    /// An operation entry in the description is invalid.
    #[error("invalid op '{op}': {detail}")]
    InvalidOp { op: String, detail: String },
}
