// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for compilation and execution.

/// Errors that can occur while compiling a graph into an engine.
#[derive(Debug, thiserror::Error)]
pub enum CompilationError {
    /// No kernel satisfies the op's shape/precision constraints.
    #[error("no feasible kernel plan for op '{op}': {detail}")]
    NoKernelPlan { op: String, detail: String },

    /// A kernel's scratch requirement exceeds the workspace budget.
    #[error(
        "kernel workspace for op '{op}' requires {required_bytes} bytes, budget is {budget_bytes}"
    )]
    WorkspaceExceeded {
        op: String,
        required_bytes: usize,
        budget_bytes: usize,
    },

    /// Quantized-integer precision needs a dynamic-range scale on every
    /// tensor, and this one has none.
    #[error("quantized-integer precision requires a scale for tensor '{tensor}'")]
    MissingScale { tensor: String },

    /// The requested accelerator partition does not exist.
    #[error("accelerator partition {requested} out of range: {available} available")]
    PartitionOutOfRange { requested: usize, available: usize },

    /// The builder configuration itself is invalid.
    #[error("invalid builder configuration: {0}")]
    InvalidConfig(String),

    /// The built engine violates the single rank-3 input contract.
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// The engine shape contract: exactly one input, three dimensions.
///
/// Downstream buffer sizing assumes this topology, so a violation is a
/// fatal precondition failure rather than something to adapt around.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// The engine exposes a number of inputs other than one.
    #[error("engine must expose exactly one input binding, found {found}")]
    InputCount { found: usize },

    /// The single input binding is not rank 3.
    #[error("engine input '{name}' must have a 3-dimensional shape, found rank {rank}")]
    InputRank { name: String, rank: usize },
}

/// Errors raised by a forward pass.
///
/// Any of these is an accelerator-side fault: the run is aborted and no
/// partial output is considered valid.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The device binding table does not match the engine's binding count.
    #[error("binding table has {got} entries, engine expects {expected}")]
    BindingTableArity { expected: usize, got: usize },

    /// A device region is sized differently than its binding requires.
    #[error("device region for binding '{binding}' holds {got} elements, expected {expected}")]
    BindingSize {
        binding: String,
        expected: usize,
        got: usize,
    },

    /// The requested batch exceeds what the engine was built for.
    #[error("batch size {requested} exceeds engine maximum {max}")]
    BatchTooLarge { requested: usize, max: usize },

    /// Accessing a device region failed.
    #[error("device fault on binding '{binding}': {source}")]
    Device {
        binding: String,
        #[source]
        source: DeviceError,
    },

    /// A runtime shape inconsistency surfaced mid-pass.
    #[error("runtime fault in op '{op}': {detail}")]
    RuntimeFault { op: String, detail: String },
}

/// Low-level device memory faults.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The region's lock was poisoned by a previous fault.
    #[error("device region poisoned by a previous fault")]
    Poisoned,

    /// A copy length does not match the region size.
    #[error("copy of {got} elements does not match device region of {expected}")]
    LengthMismatch { expected: usize, got: usize },
}
