// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The in-memory computation graph.
//!
//! A [`ComputationGraph`] holds the ordered op list, the weight store,
//! the declared input/output bindings, and an optional per-tensor scale
//! map used by the quantized-integer precision path. It is a plain value:
//! construct it via [`crate::GraphLoader`] or programmatically for tests.

use crate::{OpDef, OpKind};
use std::collections::HashMap;
use std::fmt;
use tensor_core::{DType, Dims3, Shape, TensorOrder};

/// A named input or output slot, declared once before compilation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TensorBinding {
    /// Tensor name inside the model graph.
    pub name: String,
    /// Rank-3 shape (channels, height, width).
    pub dims: Dims3,
    /// Declared data layout order.
    pub order: TensorOrder,
}

impl TensorBinding {
    /// Creates a new binding declaration.
    pub fn new(name: impl Into<String>, dims: Dims3, order: TensorOrder) -> Self {
        Self {
            name: name.into(),
            dims,
            order,
        }
    }
}

/// A weight tensor with its data resident on the host.
#[derive(Debug, Clone)]
pub struct WeightTensor {
    /// Tensor name (key in the SafeTensors file).
    pub name: String,
    /// Shape of the tensor.
    pub shape: Shape,
    /// Element data, always 32-bit float at this stage.
    pub data: Vec<f32>,
}

impl WeightTensor {
    /// Creates a weight tensor, asserting data/shape agreement.
    pub fn new(name: impl Into<String>, shape: Shape, data: Vec<f32>) -> Self {
        let name = name.into();
        debug_assert_eq!(shape.num_elements(), data.len(), "weight '{name}'");
        Self { name, shape, data }
    }

    /// Size of the tensor data in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes(DType::F32)
    }
}

/// The complete model: ops in execution order plus their weights.
///
/// # Example
/// ```
/// use graph_ir::{ComputationGraph, OpKind, TensorBinding};
/// use tensor_core::{Dims3, TensorOrder};
///
/// let input = TensorBinding::new("in", Dims3::new(1, 28, 28), TensorOrder::Nchw);
/// let mut graph = ComputationGraph::new("demo", input, "out");
/// graph.push_op(OpKind::Softmax, "prob", "in", "out", vec![]);
/// assert_eq!(graph.num_ops(), 1);
/// assert!(graph.has_tensor("out"));
/// ```
#[derive(Debug, Clone)]
pub struct ComputationGraph {
    /// Human-readable model name.
    pub name: String,
    /// Ordered operation list.
    ops: Vec<OpDef>,
    /// Weight store keyed by tensor name.
    weights: HashMap<String, WeightTensor>,
    /// The single declared input binding.
    input: TensorBinding,
    /// The declared output tensor name.
    output_name: String,
    /// Per-tensor dynamic-range scales for the quantized-integer path.
    scales: HashMap<String, f32>,
}

impl ComputationGraph {
    /// Creates an empty graph with declared input/output bindings.
    pub fn new(
        name: impl Into<String>,
        input: TensorBinding,
        output_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ops: Vec::new(),
            weights: HashMap::new(),
            input,
            output_name: output_name.into(),
            scales: HashMap::new(),
        }
    }

    /// Appends an op; the execution index is assigned from the current
    /// op count.
    pub fn push_op(
        &mut self,
        kind: OpKind,
        name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
        weight_names: Vec<String>,
    ) {
        let index = self.ops.len();
        self.ops.push(OpDef {
            name: name.into(),
            kind,
            index,
            input: input.into(),
            output: output.into(),
            weight_names,
        });
    }

    /// Inserts a weight tensor into the store.
    pub fn insert_weight(&mut self, weight: WeightTensor) {
        self.weights.insert(weight.name.clone(), weight);
    }

    /// Looks up a weight tensor by name.
    pub fn weight(&self, name: &str) -> Option<&WeightTensor> {
        self.weights.get(name)
    }

    /// Returns the ops in execution order.
    pub fn ops(&self) -> &[OpDef] {
        &self.ops
    }

    /// Returns the number of ops.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Returns the declared input binding.
    pub fn input(&self) -> &TensorBinding {
        &self.input
    }

    /// Returns the declared output tensor name.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Returns `true` if `name` is an activation tensor of this graph
    /// (the declared input or any op output).
    pub fn has_tensor(&self, name: &str) -> bool {
        self.input.name == name || self.ops.iter().any(|op| op.output == name)
    }

    /// Names of every tensor in the graph: the input, all op outputs,
    /// and all weights.
    pub fn tensor_names(&self) -> Vec<String> {
        let mut names = vec![self.input.name.clone()];
        names.extend(self.ops.iter().map(|op| op.output.clone()));
        names.extend(self.weights.keys().cloned());
        names
    }

    /// Activation tensors that are consumed by some op but produced by
    /// none — the graph's external inputs.
    ///
    /// A well-formed single-input model returns exactly the declared
    /// input name here; anything else is a topology violation that the
    /// compiler turns into an error.
    pub fn external_inputs(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut externals = Vec::new();
        for op in &self.ops {
            let consumed = op.input.as_str();
            let produced_earlier = self.ops[..op.index]
                .iter()
                .any(|earlier| earlier.output == consumed);
            if !produced_earlier && !self.weights.contains_key(consumed) && seen.insert(consumed) {
                externals.push(consumed.to_string());
            }
        }
        externals
    }

    /// Applies one uniform dynamic-range scale to every tensor in the
    /// graph — input, op outputs, and weights alike.
    ///
    /// This stands in for a full calibration procedure: real deployments
    /// would derive one scale per tensor from representative data.
    pub fn set_uniform_scale(&mut self, scale: f32) {
        for name in self.tensor_names() {
            self.scales.insert(name, scale);
        }
        tracing::debug!(
            "applied uniform scale {scale} to {} tensors",
            self.scales.len(),
        );
    }

    /// Returns the dynamic-range scale for a tensor, if one was set.
    pub fn scale(&self, name: &str) -> Option<f32> {
        self.scales.get(name).copied()
    }

    /// Total weight bytes across the store.
    pub fn total_weight_bytes(&self) -> usize {
        self.weights.values().map(|w| w.size_bytes()).sum()
    }

    /// Returns a summary string describing the model.
    pub fn summary(&self) -> String {
        let weight_kb = self.total_weight_bytes() as f64 / 1024.0;
        format!(
            "Model '{}': {} ops, {} weight tensors ({:.1} KB), input {} '{}' ({}), output '{}'",
            self.name,
            self.ops.len(),
            self.weights.len(),
            weight_kb,
            self.input.dims,
            self.input.name,
            self.input.order,
            self.output_name,
        )
    }
}

impl fmt::Display for ComputationGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for op in &self.ops {
            writeln!(f, "  {}", op.summary())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mlp_graph() -> ComputationGraph {
        let input = TensorBinding::new("in", Dims3::new(1, 28, 28), TensorOrder::Nchw);
        let mut g = ComputationGraph::new("mlp", input, "out");
        g.insert_weight(WeightTensor::new(
            "fc1.weight",
            Shape::matrix(10, 784),
            vec![0.0; 7840],
        ));
        g.insert_weight(WeightTensor::new(
            "fc1.bias",
            Shape::vector(10),
            vec![0.0; 10],
        ));
        g.push_op(
            OpKind::FullyConnected,
            "fc1",
            "in",
            "fc1_out",
            vec!["fc1.weight".into(), "fc1.bias".into()],
        );
        g.push_op(OpKind::Softmax, "prob", "fc1_out", "out", vec![]);
        g
    }

    #[test]
    fn test_push_op_assigns_indices() {
        let g = mlp_graph();
        assert_eq!(g.ops()[0].index, 0);
        assert_eq!(g.ops()[1].index, 1);
    }

    #[test]
    fn test_has_tensor() {
        let g = mlp_graph();
        assert!(g.has_tensor("in"));
        assert!(g.has_tensor("fc1_out"));
        assert!(g.has_tensor("out"));
        assert!(!g.has_tensor("fc1.weight")); // weights are not activations
        assert!(!g.has_tensor("missing"));
    }

    #[test]
    fn test_external_inputs_single() {
        let g = mlp_graph();
        assert_eq!(g.external_inputs(), vec!["in".to_string()]);
    }

    #[test]
    fn test_external_inputs_multiple() {
        let input = TensorBinding::new("in", Dims3::new(1, 28, 28), TensorOrder::Nchw);
        let mut g = ComputationGraph::new("two-headed", input, "out");
        g.push_op(OpKind::Relu, "r1", "in", "mid", vec![]);
        g.push_op(OpKind::Relu, "r2", "side", "out", vec![]);
        assert_eq!(
            g.external_inputs(),
            vec!["in".to_string(), "side".to_string()]
        );
    }

    #[test]
    fn test_uniform_scale_covers_all_tensors() {
        let mut g = mlp_graph();
        assert_eq!(g.scale("in"), None);

        g.set_uniform_scale(127.0);
        assert_eq!(g.scale("in"), Some(127.0));
        assert_eq!(g.scale("fc1_out"), Some(127.0));
        assert_eq!(g.scale("out"), Some(127.0));
        assert_eq!(g.scale("fc1.weight"), Some(127.0));
        assert_eq!(g.scale("fc1.bias"), Some(127.0));
    }

    #[test]
    fn test_total_weight_bytes() {
        let g = mlp_graph();
        assert_eq!(g.total_weight_bytes(), (7840 + 10) * 4);
    }

    #[test]
    fn test_summary() {
        let g = mlp_graph();
        let s = g.summary();
        assert!(s.contains("mlp"));
        assert!(s.contains("2 ops"));
        assert!(s.contains("1x28x28"));
    }
}
