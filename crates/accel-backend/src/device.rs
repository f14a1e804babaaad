// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Opaque device-resident memory regions.
//!
//! A [`DeviceBuffer`] stands in for accelerator memory: the host side
//! never indexes into it directly. Data moves only through the explicit
//! [`DeviceBuffer::copy_from_host`] / [`DeviceBuffer::copy_to_host`]
//! operations, and kernels access the region during an execute call.
//!
//! Buffers are cheap handles over shared storage (the same region can sit
//! in a paired buffer and in a binding table simultaneously), mirroring
//! how a raw device pointer would be passed around.

use crate::DeviceError;
use std::sync::{Arc, Mutex, MutexGuard};

/// A device-resident memory region holding `len` f32 elements.
#[derive(Clone)]
pub struct DeviceBuffer {
    cells: Arc<Mutex<Vec<f32>>>,
    len: usize,
}

impl DeviceBuffer {
    /// Allocates a zero-initialised device region.
    pub fn allocate(len: usize) -> Self {
        Self {
            cells: Arc::new(Mutex::new(vec![0.0; len])),
            len,
        }
    }

    /// Number of elements in the region.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the region holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Synchronous host-to-device copy of the full region.
    pub fn copy_from_host(&self, src: &[f32]) -> Result<(), DeviceError> {
        if src.len() != self.len {
            return Err(DeviceError::LengthMismatch {
                expected: self.len,
                got: src.len(),
            });
        }
        self.lock()?.copy_from_slice(src);
        Ok(())
    }

    /// Synchronous device-to-host copy of the full region.
    pub fn copy_to_host(&self, dst: &mut [f32]) -> Result<(), DeviceError> {
        if dst.len() != self.len {
            return Err(DeviceError::LengthMismatch {
                expected: self.len,
                got: dst.len(),
            });
        }
        dst.copy_from_slice(&self.lock()?);
        Ok(())
    }

    /// Direct access for kernels during an execute call.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Vec<f32>>, DeviceError> {
        self.cells.lock().map_err(|_| DeviceError::Poisoned)
    }
}

impl std::fmt::Debug for DeviceBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let buf = DeviceBuffer::allocate(4);
        let mut host = vec![1.0; 4];
        buf.copy_to_host(&mut host).unwrap();
        assert_eq!(host, vec![0.0; 4]);
    }

    #[test]
    fn test_roundtrip() {
        let buf = DeviceBuffer::allocate(3);
        buf.copy_from_host(&[1.0, 2.0, 3.0]).unwrap();

        let mut host = vec![0.0; 3];
        buf.copy_to_host(&mut host).unwrap();
        assert_eq!(host, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_length_mismatch() {
        let buf = DeviceBuffer::allocate(3);
        let result = buf.copy_from_host(&[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(DeviceError::LengthMismatch {
                expected: 3,
                got: 2
            })
        ));

        let mut too_big = vec![0.0; 5];
        assert!(buf.copy_to_host(&mut too_big).is_err());
    }

    #[test]
    fn test_handles_share_storage() {
        let buf = DeviceBuffer::allocate(2);
        let handle = buf.clone();
        buf.copy_from_host(&[7.0, 8.0]).unwrap();

        let mut host = vec![0.0; 2];
        handle.copy_to_host(&mut host).unwrap();
        assert_eq!(host, vec![7.0, 8.0]);
    }
}
