// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The compiled engine and its execution context.
//!
//! A [`CompiledEngine`] is the immutable artifact the compiler produces:
//! a binding table, the chosen precision, the batch ceiling, and an
//! opaque executor. It is shared read-only state — cloning is an `Arc`
//! bump — and stays valid for the whole inference session.
//!
//! An [`ExecutionContext`] is the mutable per-run handle. It validates
//! the device binding table against the engine's contract, then hands
//! off to the executor for one synchronous forward pass. One context is
//! created once and reused sequentially; concurrent contexts would each
//! need their own buffers, sharing only the engine.

use crate::{DeviceBuffer, ExecutionError, PrecisionMode, TopologyError};
use std::sync::Arc;
use tensor_core::{Dims3, Shape};

/// Whether a binding feeds the engine or is produced by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BindingKind {
    /// Host writes, engine reads.
    Input,
    /// Engine writes, host reads.
    Output,
}

/// One named slot in the engine's binding table.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BindingDesc {
    /// Tensor name.
    pub name: String,
    /// Per-sample shape of the binding.
    pub shape: Shape,
    /// Direction of the binding.
    pub kind: BindingKind,
}

impl BindingDesc {
    /// Elements per sample.
    pub fn num_elements(&self) -> usize {
        self.shape.num_elements()
    }
}

/// Executes one forward pass against an already-validated binding table.
///
/// Implementations live behind the compiler: the reference accelerator
/// installs its lowered kernel chain here, and tests install fakes.
pub trait EngineExecutor: Send + Sync {
    /// Runs one synchronous forward pass.
    ///
    /// `bindings` is ordered exactly like the engine's binding table and
    /// each region is sized `elements × batch_size`; the context checks
    /// both before delegating.
    fn execute(&self, batch_size: usize, bindings: &[DeviceBuffer]) -> Result<(), ExecutionError>;
}

struct EngineInner {
    bindings: Vec<BindingDesc>,
    precision: PrecisionMode,
    max_batch_size: usize,
    workspace_bytes: usize,
    executor: Box<dyn EngineExecutor>,
}

/// The optimized, immutable executable artifact.
#[derive(Clone)]
pub struct CompiledEngine {
    inner: Arc<EngineInner>,
}

impl CompiledEngine {
    /// Assembles an engine from its parts. Called by compiler backends;
    /// the pipeline obtains engines through [`crate::Accelerator::compile`].
    pub fn new(
        bindings: Vec<BindingDesc>,
        precision: PrecisionMode,
        max_batch_size: usize,
        workspace_bytes: usize,
        executor: Box<dyn EngineExecutor>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                bindings,
                precision,
                max_batch_size,
                workspace_bytes,
                executor,
            }),
        }
    }

    /// The binding table, inputs before outputs.
    pub fn bindings(&self) -> &[BindingDesc] {
        &self.inner.bindings
    }

    /// Looks up a binding by name.
    pub fn binding(&self, name: &str) -> Option<&BindingDesc> {
        self.inner.bindings.iter().find(|b| b.name == name)
    }

    /// Position of a binding in the table.
    pub fn binding_index(&self, name: &str) -> Option<usize> {
        self.inner.bindings.iter().position(|b| b.name == name)
    }

    /// Number of input bindings.
    pub fn num_inputs(&self) -> usize {
        self.inner
            .bindings
            .iter()
            .filter(|b| b.kind == BindingKind::Input)
            .count()
    }

    /// Number of output bindings.
    pub fn num_outputs(&self) -> usize {
        self.inner.bindings.len() - self.num_inputs()
    }

    /// The precision the kernels were selected for.
    pub fn precision(&self) -> PrecisionMode {
        self.inner.precision
    }

    /// Largest batch the engine accepts.
    pub fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size
    }

    /// High-water scratch requirement across the kernel plan.
    pub fn workspace_bytes(&self) -> usize {
        self.inner.workspace_bytes
    }

    /// Checks the sample's shape contract: exactly one input binding,
    /// and that binding 3-dimensional.
    ///
    /// Downstream buffer sizing assumes this; any other topology is a
    /// fatal precondition violation.
    pub fn ensure_canonical_topology(&self) -> Result<(), TopologyError> {
        let inputs: Vec<&BindingDesc> = self
            .inner
            .bindings
            .iter()
            .filter(|b| b.kind == BindingKind::Input)
            .collect();

        if inputs.len() != 1 {
            return Err(TopologyError::InputCount {
                found: inputs.len(),
            });
        }
        let input = inputs[0];
        if input.shape.rank() != 3 {
            return Err(TopologyError::InputRank {
                name: input.name.clone(),
                rank: input.shape.rank(),
            });
        }
        Ok(())
    }

    /// The single input binding's shape as named dimensions.
    ///
    /// Only meaningful after [`Self::ensure_canonical_topology`] passed.
    pub fn input_dims(&self) -> Result<Dims3, TopologyError> {
        self.ensure_canonical_topology()?;
        let input = self
            .inner
            .bindings
            .iter()
            .find(|b| b.kind == BindingKind::Input)
            .expect("canonical topology has one input");
        Dims3::from_shape(&input.shape).map_err(|_| TopologyError::InputRank {
            name: input.name.clone(),
            rank: input.shape.rank(),
        })
    }

    /// Creates a fresh execution context bound to this engine.
    pub fn create_execution_context(&self) -> ExecutionContext {
        ExecutionContext {
            engine: self.clone(),
        }
    }

    /// Returns a summary string describing the engine.
    pub fn summary(&self) -> String {
        format!(
            "Engine: {} inputs / {} outputs, precision {}, max batch {}, workspace {} B",
            self.num_inputs(),
            self.num_outputs(),
            self.inner.precision,
            self.inner.max_batch_size,
            self.inner.workspace_bytes,
        )
    }
}

impl std::fmt::Debug for CompiledEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledEngine")
            .field("bindings", &self.inner.bindings)
            .field("precision", &self.inner.precision)
            .field("max_batch_size", &self.inner.max_batch_size)
            .field("workspace_bytes", &self.inner.workspace_bytes)
            .finish()
    }
}

/// Mutable per-run handle derived from a [`CompiledEngine`].
///
/// Not shared across concurrent invocations; the engine it references is.
#[derive(Debug)]
pub struct ExecutionContext {
    engine: CompiledEngine,
}

impl ExecutionContext {
    /// The engine this context executes.
    pub fn engine(&self) -> &CompiledEngine {
        &self.engine
    }

    /// Triggers one synchronous forward pass.
    ///
    /// Validates batch size, binding-table arity, and per-region sizes
    /// against the engine contract, then delegates to the executor. Any
    /// failure is fatal for the run — no partial output is valid.
    pub fn execute(
        &mut self,
        batch_size: usize,
        bindings: &[DeviceBuffer],
    ) -> Result<(), ExecutionError> {
        let engine = &self.engine;

        if batch_size > engine.max_batch_size() {
            return Err(ExecutionError::BatchTooLarge {
                requested: batch_size,
                max: engine.max_batch_size(),
            });
        }
        if bindings.len() != engine.bindings().len() {
            return Err(ExecutionError::BindingTableArity {
                expected: engine.bindings().len(),
                got: bindings.len(),
            });
        }
        for (desc, region) in engine.bindings().iter().zip(bindings) {
            let expected = desc.num_elements() * batch_size;
            if region.len() != expected {
                return Err(ExecutionError::BindingSize {
                    binding: desc.name.clone(),
                    expected,
                    got: region.len(),
                });
            }
        }

        engine.inner.executor.execute(batch_size, bindings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Executor that records nothing and always succeeds.
    struct NoopExecutor;

    impl EngineExecutor for NoopExecutor {
        fn execute(&self, _: usize, _: &[DeviceBuffer]) -> Result<(), ExecutionError> {
            Ok(())
        }
    }

    fn canonical_engine() -> CompiledEngine {
        CompiledEngine::new(
            vec![
                BindingDesc {
                    name: "in".into(),
                    shape: Shape::new(vec![1, 28, 28]),
                    kind: BindingKind::Input,
                },
                BindingDesc {
                    name: "out".into(),
                    shape: Shape::vector(10),
                    kind: BindingKind::Output,
                },
            ],
            PrecisionMode::Standard,
            1,
            0,
            Box::new(NoopExecutor),
        )
    }

    #[test]
    fn test_binding_lookup() {
        let engine = canonical_engine();
        assert_eq!(engine.num_inputs(), 1);
        assert_eq!(engine.num_outputs(), 1);
        assert_eq!(engine.binding_index("in"), Some(0));
        assert_eq!(engine.binding_index("out"), Some(1));
        assert!(engine.binding("missing").is_none());
        assert_eq!(engine.binding("out").unwrap().num_elements(), 10);
    }

    #[test]
    fn test_canonical_topology_ok() {
        let engine = canonical_engine();
        engine.ensure_canonical_topology().unwrap();
        let dims = engine.input_dims().unwrap();
        assert_eq!(dims, Dims3::new(1, 28, 28));
    }

    #[test]
    fn test_topology_two_inputs() {
        let engine = CompiledEngine::new(
            vec![
                BindingDesc {
                    name: "a".into(),
                    shape: Shape::new(vec![1, 28, 28]),
                    kind: BindingKind::Input,
                },
                BindingDesc {
                    name: "b".into(),
                    shape: Shape::new(vec![1, 28, 28]),
                    kind: BindingKind::Input,
                },
                BindingDesc {
                    name: "out".into(),
                    shape: Shape::vector(10),
                    kind: BindingKind::Output,
                },
            ],
            PrecisionMode::Standard,
            1,
            0,
            Box::new(NoopExecutor),
        );
        assert!(matches!(
            engine.ensure_canonical_topology(),
            Err(TopologyError::InputCount { found: 2 })
        ));
    }

    #[test]
    fn test_topology_wrong_rank() {
        let engine = CompiledEngine::new(
            vec![
                BindingDesc {
                    name: "in".into(),
                    shape: Shape::matrix(28, 28),
                    kind: BindingKind::Input,
                },
                BindingDesc {
                    name: "out".into(),
                    shape: Shape::vector(10),
                    kind: BindingKind::Output,
                },
            ],
            PrecisionMode::Standard,
            1,
            0,
            Box::new(NoopExecutor),
        );
        assert!(matches!(
            engine.ensure_canonical_topology(),
            Err(TopologyError::InputRank { rank: 2, .. })
        ));
    }

    #[test]
    fn test_execute_validation() {
        let engine = canonical_engine();
        let mut ctx = engine.create_execution_context();

        let input = DeviceBuffer::allocate(784);
        let output = DeviceBuffer::allocate(10);

        // Happy path.
        ctx.execute(1, &[input.clone(), output.clone()]).unwrap();

        // Batch too large.
        assert!(matches!(
            ctx.execute(2, &[input.clone(), output.clone()]),
            Err(ExecutionError::BatchTooLarge { requested: 2, max: 1 })
        ));

        // Wrong arity.
        assert!(matches!(
            ctx.execute(1, &[input.clone()]),
            Err(ExecutionError::BindingTableArity { expected: 2, got: 1 })
        ));

        // Wrong region size.
        let small = DeviceBuffer::allocate(4);
        assert!(matches!(
            ctx.execute(1, &[input, small]),
            Err(ExecutionError::BindingSize { .. })
        ));
    }

    #[test]
    fn test_engine_clone_shares() {
        let engine = canonical_engine();
        let clone = engine.clone();
        assert_eq!(clone.bindings().len(), engine.bindings().len());
        assert_eq!(clone.precision(), engine.precision());
    }

    #[test]
    fn test_summary() {
        let s = canonical_engine().summary();
        assert!(s.contains("1 inputs / 1 outputs"));
        assert!(s.contains("standard"));
    }
}
