// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model loading from description + SafeTensors files.
//!
//! The loader reads a model directory containing:
//! - `graph.json` — the operation list (see [`GraphManifest`]).
//! - `weights.safetensors` — weight tensors, 32-bit float only.
//!
//! The caller declares the input binding (name, rank-3 shape, layout
//! order) and the output tensor name up front; if either name is absent
//! from the parsed graph, loading fails. Nothing is cached: the loader
//! populates and returns a fresh [`ComputationGraph`] each call.

use crate::{ComputationGraph, GraphManifest, OpKind, ParseError, TensorBinding, WeightTensor};
use std::collections::HashMap;
use std::path::Path;
use tensor_core::Shape;

/// Model description filename.
const MANIFEST_FILE: &str = "graph.json";

/// Weight filename.
const WEIGHTS_FILE: &str = "weights.safetensors";

/// Loads a serialized model description into a [`ComputationGraph`].
///
/// # Example
/// ```no_run
/// use graph_ir::{GraphLoader, TensorBinding};
/// use std::path::Path;
/// use tensor_core::{Dims3, TensorOrder};
///
/// let input = TensorBinding::new("in", Dims3::new(1, 28, 28), TensorOrder::Nchw);
/// let graph = GraphLoader::load(Path::new("./models/lenet-mlp"), input, "out").unwrap();
/// println!("{}", graph.summary());
/// ```
pub struct GraphLoader;

impl GraphLoader {
    /// Loads and validates a model from the given directory.
    ///
    /// Steps:
    /// 1. Parse and validate `graph.json`.
    /// 2. Read all weight tensors from `weights.safetensors`.
    /// 3. Assemble the graph and check the declared binding names.
    pub fn load(
        model_dir: &Path,
        input: TensorBinding,
        output_name: &str,
    ) -> Result<ComputationGraph, ParseError> {
        let manifest = GraphManifest::from_file(&model_dir.join(MANIFEST_FILE))?;
        let weights = Self::read_weights(&model_dir.join(WEIGHTS_FILE))?;
        Self::from_manifest_and_weights(&manifest, weights, input, output_name)
    }

    /// Builds a graph from an already-parsed description and weight map.
    ///
    /// Useful for tests and the synthetic demo, where no files exist.
    pub fn from_manifest_and_weights(
        manifest: &GraphManifest,
        weights: HashMap<String, WeightTensor>,
        input: TensorBinding,
        output_name: &str,
    ) -> Result<ComputationGraph, ParseError> {
        manifest.validate()?;

        let mut graph = ComputationGraph::new(manifest.name.clone(), input, output_name);

        for (_, weight) in weights {
            graph.insert_weight(weight);
        }

        for op in &manifest.ops {
            // validate() already guaranteed the kind parses.
            let kind = OpKind::from_str_loose(&op.kind).ok_or_else(|| ParseError::InvalidOp {
                op: op.name.clone(),
                detail: format!("unrecognized op kind '{}'", op.kind),
            })?;

            for wname in &op.weights {
                if graph.weight(wname).is_none() {
                    return Err(ParseError::WeightNotFound {
                        name: wname.clone(),
                    });
                }
            }
            if kind.has_weights() && op.weights.is_empty() {
                return Err(ParseError::InvalidOp {
                    op: op.name.clone(),
                    detail: "fully_connected op declares no weight tensors".into(),
                });
            }

            graph.push_op(
                kind,
                op.name.clone(),
                op.input.clone(),
                op.output.clone(),
                op.weights.clone(),
            );
        }

        // The declared names must exist in the parsed graph. A model that
        // does not contain them is a configuration error, not something
        // to silently rewire.
        let input_name = graph.input().name.clone();
        if graph.external_inputs().iter().all(|t| t != &input_name) {
            return Err(ParseError::TensorNotFound { name: input_name });
        }
        if !graph.has_tensor(output_name) {
            return Err(ParseError::TensorNotFound {
                name: output_name.to_string(),
            });
        }

        tracing::info!("{}", graph.summary());
        Ok(graph)
    }

    /// Reads every tensor from a SafeTensors file into host memory.
    ///
    /// Memory-maps the file, then copies tensor data out; the graph owns
    /// its weights outright so the file handle does not outlive loading.
    fn read_weights(path: &Path) -> Result<HashMap<String, WeightTensor>, ParseError> {
        let file = std::fs::File::open(path)?;
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| ParseError::WeightRead(format!("mmap failed: {e}")))?;
        let tensors = safetensors::SafeTensors::deserialize(&mmap)
            .map_err(|e| ParseError::WeightRead(format!("SafeTensors parse error: {e}")))?;

        let mut weights = HashMap::new();
        for (name, view) in tensors.tensors() {
            if view.dtype() != safetensors::Dtype::F32 {
                return Err(ParseError::UnsupportedWeightType {
                    name: name.to_string(),
                    dtype: format!("{:?}", view.dtype()),
                });
            }
            let shape = Shape::new(view.shape().to_vec());
            // pod_collect_to_vec tolerates the unaligned views a
            // SafeTensors buffer hands out.
            let data: Vec<f32> = bytemuck::pod_collect_to_vec(view.data());
            if data.len() != shape.num_elements() {
                return Err(ParseError::WeightRead(format!(
                    "tensor '{name}': {} elements for shape {shape}",
                    data.len(),
                )));
            }
            weights.insert(name.clone(), WeightTensor::new(name, shape, data));
        }

        Ok(weights)
    }
}
