// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Data layout order for image-shaped bindings.

/// Memory ordering of an image tensor's elements.
///
/// Declared once per input binding, before compilation. The sample model
/// uses [`TensorOrder::Nchw`]; `Nhwc` exists because serialized models
/// from channels-last ecosystems declare it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorOrder {
    /// Channels, then height, then width (channels-first).
    Nchw,
    /// Height, then width, then channels (channels-last).
    Nhwc,
}

impl TensorOrder {
    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nchw => "nchw",
            Self::Nhwc => "nhwc",
        }
    }
}

impl std::fmt::Display for TensorOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", TensorOrder::Nchw), "nchw");
        assert_eq!(format!("{}", TensorOrder::Nhwc), "nhwc");
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&TensorOrder::Nchw).unwrap();
        assert_eq!(json, "\"nchw\"");
        let back: TensorOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TensorOrder::Nchw);
    }
}
