// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # graph-ir
//!
//! The serialized model description and its in-memory form.
//!
//! A model on disk is a directory containing:
//! - `graph.json` — the operation list (see [`GraphManifest`]).
//! - `weights.safetensors` — 32-bit float weight tensors.
//!
//! [`GraphLoader`] combines both into a [`ComputationGraph`], checking
//! that the tensor names declared by the caller actually exist in the
//! model. The graph is a plain value: loading has no side effects beyond
//! the returned object, and the loader neither owns nor caches it.
//!
//! # Parser lifecycle
//!
//! The parsing layer keeps process-wide state that must be released
//! exactly once at shutdown. [`ParserLibrary`] wraps that state in a
//! reference-counted guard: acquire one before loading, and the resources
//! are released when the last guard drops — on every exit path, not only
//! the successful one.
//!
//! # Example
//! ```
//! use graph_ir::{ComputationGraph, TensorBinding};
//! use tensor_core::{Dims3, TensorOrder};
//!
//! let input = TensorBinding::new("in", Dims3::new(1, 28, 28), TensorOrder::Nchw);
//! let graph = ComputationGraph::new("empty", input, "out");
//! assert_eq!(graph.num_ops(), 0);
//! ```

mod error;
mod graph;
mod lifecycle;
mod loader;
mod manifest;
mod op;

pub use error::ParseError;
pub use graph::{ComputationGraph, TensorBinding, WeightTensor};
pub use lifecycle::ParserLibrary;
pub use loader::GraphLoader;
pub use manifest::{GraphManifest, ManifestOp};
pub use op::{OpDef, OpKind};
