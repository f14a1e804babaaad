// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The in-process software accelerator.
//!
//! [`ReferenceAccelerator`] implements [`Accelerator`] entirely on the
//! CPU: compilation runs the kernel planner and lowers weights into
//! precision-specific storage, and the resulting engine executes the
//! kernel chain sample by sample. It exists so the whole pipeline can
//! build, run, and be tested without accelerator hardware, while keeping
//! the exact contract a hardware backend would have.

mod kernels;

pub(crate) use kernels::quantize_i8;

use crate::planner::{plan_kernels, FcWeights, Kernel, KernelPlan};
use crate::{
    Accelerator, BindingDesc, BindingKind, BuilderConfig, CompilationError, CompiledEngine,
    DeviceBuffer, EngineExecutor, ExecutionError, TopologyError,
};
use graph_ir::ComputationGraph;
use std::collections::HashMap;
use tensor_core::Shape;

/// Software implementation of the accelerator contract.
///
/// # Example
/// ```
/// use accel_backend::{Accelerator, ReferenceAccelerator};
///
/// let accel = ReferenceAccelerator::new();
/// assert_eq!(accel.name(), "reference");
/// assert_eq!(accel.partition_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ReferenceAccelerator {
    partitions: usize,
}

impl ReferenceAccelerator {
    /// Creates a reference accelerator with no sub-partitions.
    pub fn new() -> Self {
        Self { partitions: 0 }
    }

    /// Creates a reference accelerator exposing `partitions`
    /// sub-partitions, for exercising the placement path.
    pub fn with_partitions(partitions: usize) -> Self {
        Self { partitions }
    }
}

impl Default for ReferenceAccelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accelerator for ReferenceAccelerator {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn partition_count(&self) -> usize {
        self.partitions
    }

    fn compile(
        &self,
        graph: &ComputationGraph,
        config: &BuilderConfig,
    ) -> Result<CompiledEngine, CompilationError> {
        if config.max_batch_size == 0 {
            return Err(CompilationError::InvalidConfig(
                "max batch size must be at least 1".into(),
            ));
        }
        if let Some(partition) = config.partition {
            if partition >= self.partitions {
                return Err(CompilationError::PartitionOutOfRange {
                    requested: partition,
                    available: self.partitions,
                });
            }
        }

        // The engine's inputs are exactly the graph's external tensors.
        // Anything other than the one declared input is a topology the
        // sample's buffer sizing cannot handle.
        let externals = graph.external_inputs();
        if externals.len() != 1 {
            return Err(TopologyError::InputCount {
                found: externals.len(),
            }
            .into());
        }

        let plan = plan_kernels(graph, config)?;

        if let Some(partition) = config.partition {
            let placed = plan.kernels.iter().filter(|k| k.on_partition).count();
            tracing::info!(
                "{placed} of {} kernels placed on partition {partition}",
                plan.kernels.len(),
            );
        }

        let input = graph.input();
        let bindings = vec![
            BindingDesc {
                name: input.name.clone(),
                shape: input.dims.to_shape(),
                kind: BindingKind::Input,
            },
            BindingDesc {
                name: graph.output_name().to_string(),
                shape: Shape::vector(plan.output_elements),
                kind: BindingKind::Output,
            },
        ];

        let executor = ReferenceExecutor {
            input_name: input.name.clone(),
            output_name: graph.output_name().to_string(),
            input_elements: input.dims.volume(),
            output_elements: plan.output_elements,
            kernels: plan.kernels,
        };

        let engine = CompiledEngine::new(
            bindings,
            config.precision,
            config.max_batch_size,
            plan.workspace_bytes,
            Box::new(executor),
        );
        engine.ensure_canonical_topology()?;

        tracing::info!("compiled '{}': {}", graph.name, engine.summary());
        Ok(engine)
    }
}

/// Executes the lowered kernel chain, one sample at a time.
struct ReferenceExecutor {
    input_name: String,
    output_name: String,
    input_elements: usize,
    output_elements: usize,
    kernels: Vec<KernelPlan>,
}

impl ReferenceExecutor {
    fn run_kernel(&self, plan: &KernelPlan, input: &[f32]) -> Result<Vec<f32>, ExecutionError> {
        let mut out = vec![0.0f32; plan.out_elements];
        match &plan.kernel {
            Kernel::FullyConnected {
                weights,
                bias,
                in_features,
                ..
            } => {
                if input.len() != *in_features {
                    return Err(ExecutionError::RuntimeFault {
                        op: plan.op_name.clone(),
                        detail: format!(
                            "activation has {} elements, kernel expects {in_features}",
                            input.len()
                        ),
                    });
                }
                match weights {
                    FcWeights::F32 { weights } => {
                        kernels::fully_connected_f32(input, weights, bias, &mut out)
                    }
                    FcWeights::F16 { weights } => {
                        kernels::fully_connected_f16(input, weights, bias, &mut out)
                    }
                    FcWeights::I8 {
                        weights,
                        weight_scale,
                        input_scale,
                    } => kernels::fully_connected_i8(
                        input,
                        weights,
                        bias,
                        *input_scale,
                        *weight_scale,
                        &mut out,
                    ),
                }
            }
            Kernel::Relu => {
                out.copy_from_slice(input);
                kernels::relu(&mut out);
            }
            Kernel::Softmax => {
                out.copy_from_slice(input);
                kernels::softmax(&mut out);
            }
        }
        Ok(out)
    }
}

impl EngineExecutor for ReferenceExecutor {
    fn execute(&self, batch_size: usize, bindings: &[DeviceBuffer]) -> Result<(), ExecutionError> {
        // The context validated arity and sizes against the binding
        // table this executor was built with: [input, output].
        let input_region = &bindings[0];
        let output_region = &bindings[1];

        let mut staged_in = vec![0.0f32; self.input_elements * batch_size];
        input_region
            .copy_to_host(&mut staged_in)
            .map_err(|source| ExecutionError::Device {
                binding: self.input_name.clone(),
                source,
            })?;

        let mut staged_out = vec![0.0f32; self.output_elements * batch_size];

        for b in 0..batch_size {
            let mut activations: HashMap<&str, Vec<f32>> = HashMap::new();
            let sample = &staged_in[b * self.input_elements..(b + 1) * self.input_elements];
            activations.insert(self.input_name.as_str(), sample.to_vec());

            for plan in &self.kernels {
                let input = activations.get(plan.input.as_str()).ok_or_else(|| {
                    ExecutionError::RuntimeFault {
                        op: plan.op_name.clone(),
                        detail: format!("activation '{}' unavailable", plan.input),
                    }
                })?;
                let out = self.run_kernel(plan, input)?;
                activations.insert(plan.output.as_str(), out);
            }

            let result = activations.get(self.output_name.as_str()).ok_or_else(|| {
                ExecutionError::RuntimeFault {
                    op: self.output_name.clone(),
                    detail: "output tensor was never produced".into(),
                }
            })?;
            staged_out[b * self.output_elements..(b + 1) * self.output_elements]
                .copy_from_slice(result);
        }

        output_region
            .copy_from_host(&staged_out)
            .map_err(|source| ExecutionError::Device {
                binding: self.output_name.clone(),
                source,
            })
    }
}
