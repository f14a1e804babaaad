// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for host/device transfers.

use accel_backend::DeviceError;

/// Errors that can occur while allocating or copying paired buffers.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// A binding would require a zero-sized buffer.
    #[error("cannot allocate zero-sized paired buffer for binding '{binding}'")]
    ZeroSizedBinding { binding: String },

    /// A host/device copy failed.
    #[error("transfer failed for binding '{binding}': {source}")]
    Device {
        binding: String,
        #[source]
        source: DeviceError,
    },
}
