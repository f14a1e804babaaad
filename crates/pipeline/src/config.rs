// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Sample configuration, from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! data_dirs = ["data/mnist", "data/samples/mnist"]
//! int8 = false
//! fp16 = false
//! batch_size = 1
//! workspace = "16M"
//! input_name = "in"
//! output_name = "out"
//! ```

use crate::PipelineError;
use accel_backend::{BuilderConfig, PrecisionMode, WorkspaceBudget};
use graph_ir::TensorBinding;
use std::path::{Path, PathBuf};
use tensor_core::{Dims3, TensorOrder};

/// The resolved configuration the pipeline consumes.
///
/// Argument parsing happens elsewhere; this struct only carries the
/// outcome.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SampleConfig {
    /// Directories searched, in order, for the model and digit files.
    #[serde(default = "default_data_dirs")]
    pub data_dirs: Vec<PathBuf>,
    /// Select quantized-integer kernels.
    #[serde(default)]
    pub int8: bool,
    /// Select reduced-precision kernels.
    #[serde(default)]
    pub fp16: bool,
    /// Accelerator sub-partition for partition-capable kernels.
    #[serde(default)]
    pub partition: Option<usize>,
    /// Batch size the engine and buffers are sized for.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Per-kernel workspace ceiling, human-readable.
    #[serde(default = "default_workspace")]
    pub workspace: String,
    /// Declared input tensor name.
    #[serde(default = "default_input_name")]
    pub input_name: String,
    /// Declared input layout order.
    #[serde(default = "default_input_order")]
    pub input_order: TensorOrder,
    /// Declared output tensor name.
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Declared input shape. Kept last so the TOML table serialises
    /// after the scalar fields.
    #[serde(default = "default_input_dims")]
    pub input_dims: Dims3,
}

fn default_data_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("data/mnist"),
        PathBuf::from("data/samples/mnist"),
    ]
}

fn default_batch_size() -> usize {
    1
}

fn default_workspace() -> String {
    "16M".to_string()
}

fn default_input_name() -> String {
    "in".to_string()
}

fn default_input_dims() -> Dims3 {
    Dims3::new(1, 28, 28)
}

fn default_input_order() -> TensorOrder {
    TensorOrder::Nchw
}

fn default_output_name() -> String {
    "out".to_string()
}

impl SampleConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, PipelineError> {
        toml::from_str(toml_str)
            .map_err(|e| PipelineError::Config(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("TOML serialise error: {e}")))
    }

    /// The precision resolved from the int8/fp16 flags.
    pub fn precision(&self) -> PrecisionMode {
        PrecisionMode::from_flags(self.int8, self.fp16)
    }

    /// The input binding declaration for the graph loader.
    pub fn input_binding(&self) -> TensorBinding {
        TensorBinding::new(self.input_name.clone(), self.input_dims, self.input_order)
    }

    /// The builder configuration for the compiler.
    pub fn builder_config(&self) -> Result<BuilderConfig, PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config("batch size must be at least 1".into()));
        }
        let workspace = WorkspaceBudget::parse(&self.workspace)?;
        Ok(BuilderConfig {
            precision: self.precision(),
            partition: self.partition,
            workspace,
            max_batch_size: self.batch_size,
        })
    }
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            data_dirs: default_data_dirs(),
            int8: false,
            fp16: false,
            partition: None,
            batch_size: default_batch_size(),
            workspace: default_workspace(),
            input_name: default_input_name(),
            input_order: default_input_order(),
            output_name: default_output_name(),
            input_dims: default_input_dims(),
        }
    }
}
