// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON model description parsing.
//!
//! The description (`graph.json`) lists the model's operations in
//! execution order and maps them to weight tensor names in the
//! SafeTensors file.
//!
//! # Format
//! ```json
//! {
//!   "name": "lenet-mlp",
//!   "ops": [
//!     { "name": "fc1", "kind": "fully_connected", "input": "in",
//!       "output": "fc1_out", "weights": ["fc1.weight", "fc1.bias"] },
//!     { "name": "relu1", "kind": "relu", "input": "fc1_out", "output": "relu1_out" },
//!     { "name": "prob", "kind": "softmax", "input": "relu1_out", "output": "out" }
//!   ]
//! }
//! ```

use crate::ParseError;
use std::collections::HashSet;
use std::path::Path;

/// Top-level model description, deserialized from `graph.json`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GraphManifest {
    /// Human-readable model name.
    pub name: String,
    /// Operation entries in execution order.
    pub ops: Vec<ManifestOp>,
}

/// A single operation entry in the description.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ManifestOp {
    /// Operation name.
    pub name: String,
    /// Operation kind string (e.g. `"fully_connected"`).
    pub kind: String,
    /// Name of the consumed activation tensor.
    pub input: String,
    /// Name of the produced activation tensor.
    pub output: String,
    /// Weight tensor names in the SafeTensors file.
    #[serde(default)]
    pub weights: Vec<String>,
}

impl GraphManifest {
    /// Loads a description from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, ParseError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a description from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let manifest: Self = serde_json::from_str(json)?;
        Ok(manifest)
    }

    /// Structural checks that do not require weight data.
    ///
    /// - at least one op;
    /// - op and output-tensor names are unique;
    /// - every op kind is recognized;
    /// - each op consumes either the graph input or an earlier op's output.
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.ops.is_empty() {
            return Err(ParseError::InvalidOp {
                op: self.name.clone(),
                detail: "model description contains no operations".into(),
            });
        }

        let mut op_names = HashSet::new();
        let mut produced = HashSet::new();

        for op in &self.ops {
            if !op_names.insert(op.name.as_str()) {
                return Err(ParseError::InvalidOp {
                    op: op.name.clone(),
                    detail: "duplicate op name".into(),
                });
            }
            if crate::OpKind::from_str_loose(&op.kind).is_none() {
                return Err(ParseError::InvalidOp {
                    op: op.name.clone(),
                    detail: format!("unrecognized op kind '{}'", op.kind),
                });
            }
            if !produced.insert(op.output.as_str()) {
                return Err(ParseError::InvalidOp {
                    op: op.name.clone(),
                    detail: format!("tensor '{}' is produced twice", op.output),
                });
            }
        }

        Ok(())
    }
}
