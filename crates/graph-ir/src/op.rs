// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Operation definitions for the computation graph.
//!
//! Each [`OpDef`] describes one operation: its kind, the activation
//! tensors it consumes and produces, and the names of its weight tensors.
//! Weight *data* lives in the graph's weight store, not here.

/// The kind of computation an operation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// Dense projection: `y = W·x + b`.
    FullyConnected,
    /// Elementwise `max(0, x)`.
    Relu,
    /// Normalizes a score vector into a probability-like distribution.
    Softmax,
}

impl OpKind {
    /// Parses an op kind from a manifest string.
    ///
    /// Accepts snake_case plus common aliases.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fully_connected" | "fullyconnected" | "fc" | "dense" | "linear" => {
                Some(Self::FullyConnected)
            }
            "relu" => Some(Self::Relu),
            "softmax" => Some(Self::Softmax),
            _ => None,
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullyConnected => "fully_connected",
            Self::Relu => "relu",
            Self::Softmax => "softmax",
        }
    }

    /// Returns `true` if the op kind carries weight tensors.
    pub fn has_weights(&self) -> bool {
        matches!(self, Self::FullyConnected)
    }
}

impl std::fmt::Display for OpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation in the computation graph.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OpDef {
    /// Unique identifier (e.g. `"fc1"`).
    pub name: String,
    /// The kind of computation.
    pub kind: OpKind,
    /// Index in execution order (0-based).
    pub index: usize,
    /// Name of the activation tensor this op consumes.
    pub input: String,
    /// Name of the activation tensor this op produces.
    pub output: String,
    /// Names of weight tensors (keys into the graph's weight store).
    ///
    /// For a fully-connected op this is `[weight]` or `[weight, bias]`;
    /// empty for weightless ops.
    pub weight_names: Vec<String>,
}

impl OpDef {
    /// Returns a concise summary string for display.
    pub fn summary(&self) -> String {
        format!(
            "[{}] {} ({}) {} -> {}",
            self.index, self.name, self.kind, self.input, self.output,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_loose() {
        assert_eq!(OpKind::from_str_loose("fc"), Some(OpKind::FullyConnected));
        assert_eq!(OpKind::from_str_loose("Dense"), Some(OpKind::FullyConnected));
        assert_eq!(OpKind::from_str_loose("relu"), Some(OpKind::Relu));
        assert_eq!(OpKind::from_str_loose("softmax"), Some(OpKind::Softmax));
        assert_eq!(OpKind::from_str_loose("conv3d"), None);
    }

    #[test]
    fn test_has_weights() {
        assert!(OpKind::FullyConnected.has_weights());
        assert!(!OpKind::Relu.has_weights());
        assert!(!OpKind::Softmax.has_weights());
    }

    #[test]
    fn test_summary() {
        let op = OpDef {
            name: "fc1".into(),
            kind: OpKind::FullyConnected,
            index: 0,
            input: "in".into(),
            output: "fc1_out".into(),
            weight_names: vec!["fc1.weight".into(), "fc1.bias".into()],
        };
        let s = op.summary();
        assert!(s.contains("[0]"));
        assert!(s.contains("fully_connected"));
        assert!(s.contains("in -> fc1_out"));
    }
}
