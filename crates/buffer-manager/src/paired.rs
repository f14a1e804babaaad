// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! One host region paired with its mirrored device region.

use crate::TransferError;
use accel_backend::{BindingKind, DeviceBuffer};

/// A (host, device) pair for one binding.
///
/// The host side is an ordinary `Vec<f32>` the pipeline reads and
/// writes; the device side is opaque and only touched by the copy
/// operations below. Both regions hold `elements` f32 values and share
/// their lifetime: dropping the pair releases both.
pub struct PairedBuffer {
    name: String,
    kind: BindingKind,
    elements: usize,
    host: Vec<f32>,
    device: DeviceBuffer,
}

impl PairedBuffer {
    /// Allocates a zeroed pair for a binding.
    pub fn new(name: impl Into<String>, kind: BindingKind, elements: usize) -> Self {
        Self {
            name: name.into(),
            kind,
            elements,
            host: vec![0.0; elements],
            device: DeviceBuffer::allocate(elements),
        }
    }

    /// Binding name this pair belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direction of the binding.
    pub fn kind(&self) -> BindingKind {
        self.kind
    }

    /// Number of f32 elements on each side.
    pub fn elements(&self) -> usize {
        self.elements
    }

    /// Read access to the host region.
    pub fn host(&self) -> &[f32] {
        &self.host
    }

    /// Write access to the host region.
    pub fn host_mut(&mut self) -> &mut [f32] {
        &mut self.host
    }

    /// A handle to the device region for the binding table.
    pub fn device(&self) -> DeviceBuffer {
        self.device.clone()
    }

    /// Synchronous host → device copy of the whole region.
    pub fn copy_to_device(&self) -> Result<(), TransferError> {
        self.device
            .copy_from_host(&self.host)
            .map_err(|source| TransferError::Device {
                binding: self.name.clone(),
                source,
            })
    }

    /// Synchronous device → host copy of the whole region.
    pub fn copy_to_host(&mut self) -> Result<(), TransferError> {
        self.device
            .copy_to_host(&mut self.host)
            .map_err(|source| TransferError::Device {
                binding: self.name.clone(),
                source,
            })
    }
}

impl std::fmt::Debug for PairedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairedBuffer")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("elements", &self.elements)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_roundtrip() {
        let mut pair = PairedBuffer::new("in", BindingKind::Input, 4);
        pair.host_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        pair.copy_to_device().unwrap();

        // Clobber the host side, then read back from the device.
        pair.host_mut().fill(0.0);
        pair.copy_to_host().unwrap();
        assert_eq!(pair.host(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_device_handle_shares_region() {
        let mut pair = PairedBuffer::new("out", BindingKind::Output, 2);
        let handle = pair.device();
        handle.copy_from_host(&[9.0, 8.0]).unwrap();

        pair.copy_to_host().unwrap();
        assert_eq!(pair.host(), &[9.0, 8.0]);
    }

    #[test]
    fn test_metadata() {
        let pair = PairedBuffer::new("in", BindingKind::Input, 784);
        assert_eq!(pair.name(), "in");
        assert_eq!(pair.kind(), BindingKind::Input);
        assert_eq!(pair.elements(), 784);
        assert!(pair.host().iter().all(|&x| x == 0.0));
    }
}
