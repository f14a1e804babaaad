// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Locating and reading sample data files.
//!
//! The model description and the ten per-digit images are searched for
//! in the configured data directories, in order. Digit files are raw
//! header-less pixel grids named `<digit>.raw`.

use crate::{DigitImage, PipelineError};
use std::path::{Path, PathBuf};

/// Searches the data directories, in order, for a file.
pub fn locate_file(name: &str, dirs: &[PathBuf]) -> Result<PathBuf, PipelineError> {
    for dir in dirs {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(PipelineError::DataFileNotFound {
        name: name.to_string(),
        searched: dirs.to_vec(),
    })
}

/// Locates the directory containing the model description.
///
/// The model is a directory-level artifact (`graph.json` plus
/// `weights.safetensors` side by side), so this resolves the directory
/// that holds the description file.
pub fn locate_model_dir(dirs: &[PathBuf]) -> Result<PathBuf, PipelineError> {
    let manifest = locate_file("graph.json", dirs)?;
    Ok(manifest
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Reads the raw image bytes for one digit.
///
/// The byte count is *not* validated here — the input adapter checks it
/// against the declared input shape and rejects mismatches.
pub fn read_digit_image(digit: usize, dirs: &[PathBuf]) -> Result<DigitImage, PipelineError> {
    let path = locate_file(&format!("{digit}.raw"), dirs)?;
    let pixels = std::fs::read(&path).map_err(|source| PipelineError::DataRead {
        path: path.clone(),
        source,
    })?;
    Ok(DigitImage::new(pixels))
}
