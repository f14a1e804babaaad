// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Kernel planning: lowering graph ops into precision-specific kernels.
//!
//! The planner walks the op list in execution order, propagating
//! per-tensor element counts, selecting one kernel per op for the
//! requested precision, lowering weights into the kernel's storage
//! format, and accounting scratch memory against the workspace budget.
//! Any op it cannot satisfy makes the whole compilation fail — there is
//! no fallback to a different precision.
//!
//! Partition placement is the one graceful degradation: when a partition
//! is selected, kernels the partition cannot run stay on the default
//! execution path, logged at debug level.

use crate::{BuilderConfig, CompilationError, PrecisionMode};
use graph_ir::{ComputationGraph, OpDef, OpKind};
use half::f16;
use std::collections::HashMap;

/// Weight storage for a lowered fully-connected kernel.
#[derive(Debug)]
pub(crate) enum FcWeights {
    F32 {
        weights: Vec<f32>,
    },
    F16 {
        weights: Vec<f16>,
    },
    I8 {
        weights: Vec<i8>,
        weight_scale: f32,
        input_scale: f32,
    },
}

/// A lowered, precision-specific kernel.
#[derive(Debug)]
pub(crate) enum Kernel {
    FullyConnected {
        weights: FcWeights,
        bias: Vec<f32>,
        in_features: usize,
        out_features: usize,
    },
    Relu,
    /// Softmax always runs in f32; there is no narrow-precision kernel
    /// for it, matching how accelerators keep normalization layers in
    /// higher precision.
    Softmax,
}

/// One planned kernel with its dataflow.
#[derive(Debug)]
pub(crate) struct KernelPlan {
    pub op_name: String,
    pub input: String,
    pub output: String,
    pub kernel: Kernel,
    pub out_elements: usize,
    /// True when the kernel was placed on the selected partition.
    pub on_partition: bool,
}

/// The full plan for an engine.
#[derive(Debug)]
pub(crate) struct EnginePlan {
    pub kernels: Vec<KernelPlan>,
    pub output_elements: usize,
    /// High-water scratch requirement across all kernels.
    pub workspace_bytes: usize,
}

/// Plans kernels for every op in the graph.
pub(crate) fn plan_kernels(
    graph: &ComputationGraph,
    config: &BuilderConfig,
) -> Result<EnginePlan, CompilationError> {
    let mut elements: HashMap<&str, usize> = HashMap::new();
    elements.insert(graph.input().name.as_str(), graph.input().dims.volume());

    let mut kernels = Vec::with_capacity(graph.num_ops());
    let mut max_workspace = 0usize;

    for op in graph.ops() {
        let in_elements = *elements.get(op.input.as_str()).ok_or_else(|| {
            CompilationError::NoKernelPlan {
                op: op.name.clone(),
                detail: format!("consumes unknown tensor '{}'", op.input),
            }
        })?;

        if config.precision == PrecisionMode::QuantizedInt8 {
            ensure_scales(graph, op)?;
        }

        let (kernel, out_elements, workspace_bytes) = match op.kind {
            OpKind::FullyConnected => lower_fully_connected(graph, op, config, in_elements)?,
            OpKind::Relu => (Kernel::Relu, in_elements, 0),
            OpKind::Softmax => (Kernel::Softmax, in_elements, in_elements * 4),
        };

        if workspace_bytes > config.workspace.as_bytes() {
            return Err(CompilationError::WorkspaceExceeded {
                op: op.name.clone(),
                required_bytes: workspace_bytes,
                budget_bytes: config.workspace.as_bytes(),
            });
        }
        max_workspace = max_workspace.max(workspace_bytes);

        let on_partition = match (config.partition, op.kind) {
            (Some(_), OpKind::FullyConnected) => true,
            (Some(partition), kind) => {
                tracing::debug!(
                    "op '{}' ({kind}) not supported on partition {partition}, \
                     falling back to default execution path",
                    op.name,
                );
                false
            }
            (None, _) => false,
        };

        elements.insert(op.output.as_str(), out_elements);
        kernels.push(KernelPlan {
            op_name: op.name.clone(),
            input: op.input.clone(),
            output: op.output.clone(),
            kernel,
            out_elements,
            on_partition,
        });
    }

    let output_elements = *elements.get(graph.output_name()).ok_or_else(|| {
        CompilationError::NoKernelPlan {
            op: graph.output_name().to_string(),
            detail: "declared output tensor is never produced".into(),
        }
    })?;

    Ok(EnginePlan {
        kernels,
        output_elements,
        workspace_bytes: max_workspace,
    })
}

/// Checks that every tensor the op touches carries a dynamic-range scale.
fn ensure_scales(graph: &ComputationGraph, op: &OpDef) -> Result<(), CompilationError> {
    let mut names: Vec<&str> = vec![&op.input, &op.output];
    names.extend(op.weight_names.iter().map(String::as_str));
    for name in names {
        if graph.scale(name).is_none() {
            return Err(CompilationError::MissingScale {
                tensor: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Lowers a fully-connected op into a kernel for the configured precision.
fn lower_fully_connected(
    graph: &ComputationGraph,
    op: &OpDef,
    config: &BuilderConfig,
    in_elements: usize,
) -> Result<(Kernel, usize, usize), CompilationError> {
    let weight_name = op.weight_names.first().ok_or_else(|| {
        CompilationError::NoKernelPlan {
            op: op.name.clone(),
            detail: "fully-connected op has no weight tensor".into(),
        }
    })?;
    let weight = graph
        .weight(weight_name)
        .ok_or_else(|| CompilationError::NoKernelPlan {
            op: op.name.clone(),
            detail: format!("weight tensor '{weight_name}' missing from the graph"),
        })?;

    let (out_features, in_features) = match weight.shape.dims() {
        &[out, inp] => (out, inp),
        dims => {
            return Err(CompilationError::NoKernelPlan {
                op: op.name.clone(),
                detail: format!("weight must be rank 2, found rank {}", dims.len()),
            })
        }
    };
    if in_features != in_elements {
        return Err(CompilationError::NoKernelPlan {
            op: op.name.clone(),
            detail: format!(
                "weight expects {in_features} input features, activation has {in_elements}"
            ),
        });
    }

    let bias = match op.weight_names.get(1) {
        Some(bias_name) => {
            let bias = graph.weight(bias_name).ok_or_else(|| {
                CompilationError::NoKernelPlan {
                    op: op.name.clone(),
                    detail: format!("bias tensor '{bias_name}' missing from the graph"),
                }
            })?;
            if bias.data.len() != out_features {
                return Err(CompilationError::NoKernelPlan {
                    op: op.name.clone(),
                    detail: format!(
                        "bias has {} elements, expected {out_features}",
                        bias.data.len()
                    ),
                });
            }
            bias.data.clone()
        }
        None => vec![0.0; out_features],
    };

    let (weights, workspace_bytes) = match config.precision {
        PrecisionMode::Standard => (
            FcWeights::F32 {
                weights: weight.data.clone(),
            },
            (in_features + out_features) * 4,
        ),
        PrecisionMode::ReducedPrecision => (
            FcWeights::F16 {
                weights: weight.data.iter().copied().map(f16::from_f32).collect(),
            },
            in_features * 2 + out_features * 4,
        ),
        PrecisionMode::QuantizedInt8 => {
            // ensure_scales ran before lowering.
            let weight_scale = graph
                .scale(weight_name)
                .ok_or_else(|| CompilationError::MissingScale {
                    tensor: weight_name.clone(),
                })?;
            let input_scale =
                graph
                    .scale(&op.input)
                    .ok_or_else(|| CompilationError::MissingScale {
                        tensor: op.input.clone(),
                    })?;
            (
                FcWeights::I8 {
                    weights: crate::reference::quantize_i8(&weight.data, weight_scale),
                    weight_scale,
                    input_scale,
                },
                in_features + out_features * 4,
            )
        }
    };

    Ok((
        Kernel::FullyConnected {
            weights,
            bias,
            in_features,
            out_features,
        },
        out_features,
        workspace_bytes,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkspaceBudget;
    use graph_ir::{TensorBinding, WeightTensor};
    use tensor_core::{Dims3, Shape, TensorOrder};

    fn small_graph() -> ComputationGraph {
        let input = TensorBinding::new("in", Dims3::new(1, 2, 2), TensorOrder::Nchw);
        let mut g = ComputationGraph::new("small", input, "out");
        g.insert_weight(WeightTensor::new(
            "fc.weight",
            Shape::matrix(3, 4),
            vec![0.1; 12],
        ));
        g.insert_weight(WeightTensor::new("fc.bias", Shape::vector(3), vec![0.0; 3]));
        g.push_op(
            OpKind::FullyConnected,
            "fc",
            "in",
            "fc_out",
            vec!["fc.weight".into(), "fc.bias".into()],
        );
        g.push_op(OpKind::Softmax, "prob", "fc_out", "out", vec![]);
        g
    }

    #[test]
    fn test_plan_standard() {
        let plan = plan_kernels(&small_graph(), &BuilderConfig::default()).unwrap();
        assert_eq!(plan.kernels.len(), 2);
        assert_eq!(plan.output_elements, 3);
        assert!(plan.workspace_bytes > 0);
        assert!(!plan.kernels[0].on_partition);
    }

    #[test]
    fn test_plan_shape_mismatch() {
        let input = TensorBinding::new("in", Dims3::new(1, 3, 3), TensorOrder::Nchw);
        let mut g = ComputationGraph::new("bad", input, "out");
        g.insert_weight(WeightTensor::new(
            "fc.weight",
            Shape::matrix(3, 4), // expects 4 features, input has 9
            vec![0.1; 12],
        ));
        g.push_op(
            OpKind::FullyConnected,
            "fc",
            "in",
            "out",
            vec!["fc.weight".into()],
        );
        let err = plan_kernels(&g, &BuilderConfig::default()).unwrap_err();
        assert!(matches!(err, CompilationError::NoKernelPlan { op, .. } if op == "fc"));
    }

    #[test]
    fn test_plan_workspace_exceeded() {
        let config = BuilderConfig {
            workspace: WorkspaceBudget::from_bytes(8),
            ..Default::default()
        };
        let err = plan_kernels(&small_graph(), &config).unwrap_err();
        assert!(matches!(err, CompilationError::WorkspaceExceeded { .. }));
    }

    #[test]
    fn test_plan_int8_missing_scale() {
        let config = BuilderConfig {
            precision: PrecisionMode::QuantizedInt8,
            ..Default::default()
        };
        let err = plan_kernels(&small_graph(), &config).unwrap_err();
        assert!(matches!(err, CompilationError::MissingScale { .. }));
    }

    #[test]
    fn test_plan_int8_with_scales() {
        let mut g = small_graph();
        g.set_uniform_scale(127.0);
        let config = BuilderConfig {
            precision: PrecisionMode::QuantizedInt8,
            ..Default::default()
        };
        let plan = plan_kernels(&g, &config).unwrap();
        match &plan.kernels[0].kernel {
            Kernel::FullyConnected {
                weights: FcWeights::I8 { weight_scale, .. },
                ..
            } => assert_eq!(*weight_scale, 127.0),
            _ => panic!("expected an int8 fully-connected kernel"),
        }
    }

    #[test]
    fn test_plan_partition_placement() {
        let config = BuilderConfig {
            partition: Some(0),
            ..Default::default()
        };
        let plan = plan_kernels(&small_graph(), &config).unwrap();
        assert!(plan.kernels[0].on_partition); // fully-connected
        assert!(!plan.kernels[1].on_partition); // softmax falls back
    }

    #[test]
    fn test_plan_missing_bias_defaults_to_zero() {
        let input = TensorBinding::new("in", Dims3::new(1, 2, 2), TensorOrder::Nchw);
        let mut g = ComputationGraph::new("nobias", input, "out");
        g.insert_weight(WeightTensor::new(
            "fc.weight",
            Shape::matrix(3, 4),
            vec![0.1; 12],
        ));
        g.push_op(
            OpKind::FullyConnected,
            "fc",
            "in",
            "out",
            vec!["fc.weight".into()],
        );
        let plan = plan_kernels(&g, &BuilderConfig::default()).unwrap();
        match &plan.kernels[0].kernel {
            Kernel::FullyConnected { bias, .. } => assert_eq!(bias, &vec![0.0; 3]),
            _ => panic!("expected a fully-connected kernel"),
        }
    }
}
