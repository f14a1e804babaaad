// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Accelerator`] trait: the narrow seam between the pipeline and
//! whatever compiles and runs the model.
//!
//! Keeping the interface to a single `compile` call (execution hangs off
//! the returned engine) means the pipeline logic can be exercised with a
//! fake accelerator in tests — no hardware, no opaque vendor runtime.

use crate::{BuilderConfig, CompilationError, CompiledEngine};
use graph_ir::ComputationGraph;

/// A device that can compile a computation graph into an executable
/// engine.
///
/// Compilation is one-shot and synchronous: it is expected to run once
/// at process start, has no cancellation, and its cost is not amortized.
pub trait Accelerator: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &'static str;

    /// Number of hardware sub-partitions this device exposes.
    fn partition_count(&self) -> usize {
        0
    }

    /// Compiles the graph under the given configuration.
    ///
    /// Returns a [`CompiledEngine`] whose topology satisfies the sample
    /// contract (one rank-3 input), or a [`CompilationError`] when no
    /// kernel plan satisfies the precision/shape/workspace constraints.
    fn compile(
        &self,
        graph: &ComputationGraph,
        config: &BuilderConfig,
    ) -> Result<CompiledEngine, CompilationError>;
}
