// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Numeric precision modes for compiled engines.

/// The numeric representation an engine's kernels compute in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrecisionMode {
    /// 32-bit float kernels.
    Standard,
    /// 16-bit float kernels (weights and activations pass through f16).
    ReducedPrecision,
    /// 8-bit integer kernels; every tensor must carry a dynamic-range
    /// scale at compile time.
    QuantizedInt8,
}

impl PrecisionMode {
    /// Resolves the precision from the sample's command-line style flags.
    ///
    /// Int8 dominates when both flags are set, matching how the builder
    /// flags combine in the original sample.
    pub fn from_flags(int8: bool, fp16: bool) -> Self {
        if int8 {
            Self::QuantizedInt8
        } else if fp16 {
            Self::ReducedPrecision
        } else {
            Self::Standard
        }
    }

    /// Returns a human-readable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ReducedPrecision => "reduced-precision",
            Self::QuantizedInt8 => "quantized-int8",
        }
    }
}

impl Default for PrecisionMode {
    fn default() -> Self {
        Self::Standard
    }
}

impl std::fmt::Display for PrecisionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(PrecisionMode::from_flags(false, false), PrecisionMode::Standard);
        assert_eq!(
            PrecisionMode::from_flags(false, true),
            PrecisionMode::ReducedPrecision
        );
        assert_eq!(
            PrecisionMode::from_flags(true, false),
            PrecisionMode::QuantizedInt8
        );
        // Int8 wins when both are requested.
        assert_eq!(
            PrecisionMode::from_flags(true, true),
            PrecisionMode::QuantizedInt8
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", PrecisionMode::Standard), "standard");
        assert_eq!(
            format!("{}", PrecisionMode::QuantizedInt8),
            "quantized-int8"
        );
    }
}
