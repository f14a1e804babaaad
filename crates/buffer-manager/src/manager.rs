// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The buffer manager: one paired buffer per engine binding.

use crate::{PairedBuffer, TransferError, TransferStats};
use accel_backend::{BindingKind, CompiledEngine, DeviceBuffer};

/// Owns every paired buffer of an inference session.
///
/// Buffers are allocated once from the engine's binding table — per
/// binding, element count × batch size — and live until the manager
/// drops. Pairs keep the engine's binding order, so
/// [`BufferManager::device_binding_table`] lines up with what the
/// execution context expects.
pub struct BufferManager {
    buffers: Vec<PairedBuffer>,
    batch_size: usize,
    stats: TransferStats,
}

impl BufferManager {
    /// Allocates paired buffers for every binding of `engine`.
    pub fn new(engine: &CompiledEngine, batch_size: usize) -> Result<Self, TransferError> {
        let mut buffers = Vec::with_capacity(engine.bindings().len());

        for desc in engine.bindings() {
            let elements = desc.num_elements() * batch_size;
            if elements == 0 {
                return Err(TransferError::ZeroSizedBinding {
                    binding: desc.name.clone(),
                });
            }
            buffers.push(PairedBuffer::new(desc.name.clone(), desc.kind, elements));
        }

        tracing::debug!(
            "allocated {} paired buffers for batch size {batch_size}",
            buffers.len(),
        );

        Ok(Self {
            buffers,
            batch_size,
            stats: TransferStats::default(),
        })
    }

    /// Batch size the buffers were sized for.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Read access to a binding's host region.
    pub fn host_buffer(&self, name: &str) -> Option<&[f32]> {
        self.buffers
            .iter()
            .find(|b| b.name() == name)
            .map(PairedBuffer::host)
    }

    /// Write access to a binding's host region.
    pub fn host_buffer_mut(&mut self, name: &str) -> Option<&mut [f32]> {
        self.buffers
            .iter_mut()
            .find(|b| b.name() == name)
            .map(PairedBuffer::host_mut)
    }

    /// Bulk-copies every input binding's host region to its device
    /// region. Must complete before the next execute call.
    pub fn copy_inputs_to_device(&mut self) -> Result<(), TransferError> {
        for buffer in self.buffers.iter().filter(|b| b.kind() == BindingKind::Input) {
            buffer.copy_to_device()?;
            self.stats.record_h2d(buffer.elements() * 4);
        }
        Ok(())
    }

    /// Bulk-copies every output binding's device region back to its
    /// host region. Only meaningful after an execute call returned.
    pub fn copy_outputs_to_host(&mut self) -> Result<(), TransferError> {
        let mut moved = Vec::new();
        for buffer in self
            .buffers
            .iter_mut()
            .filter(|b| b.kind() == BindingKind::Output)
        {
            buffer.copy_to_host()?;
            moved.push(buffer.elements() * 4);
        }
        for bytes in moved {
            self.stats.record_d2h(bytes);
        }
        Ok(())
    }

    /// Device handles in the engine's binding order, for the execution
    /// context.
    pub fn device_binding_table(&self) -> Vec<DeviceBuffer> {
        self.buffers.iter().map(PairedBuffer::device).collect()
    }

    /// Snapshot of the transfer counters.
    pub fn stats(&self) -> TransferStats {
        self.stats
    }
}

impl std::fmt::Debug for BufferManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferManager")
            .field("bindings", &self.buffers.len())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accel_backend::{
        BindingDesc, CompiledEngine, EngineExecutor, ExecutionError, PrecisionMode,
    };
    use tensor_core::Shape;

    struct NoopExecutor;

    impl EngineExecutor for NoopExecutor {
        fn execute(&self, _: usize, _: &[DeviceBuffer]) -> Result<(), ExecutionError> {
            Ok(())
        }
    }

    fn engine(input_elems: (usize, usize, usize), output_elems: usize) -> CompiledEngine {
        CompiledEngine::new(
            vec![
                BindingDesc {
                    name: "in".into(),
                    shape: Shape::new(vec![input_elems.0, input_elems.1, input_elems.2]),
                    kind: BindingKind::Input,
                },
                BindingDesc {
                    name: "out".into(),
                    shape: Shape::vector(output_elems),
                    kind: BindingKind::Output,
                },
            ],
            PrecisionMode::Standard,
            4,
            0,
            Box::new(NoopExecutor),
        )
    }

    #[test]
    fn test_allocation_sizes() {
        let engine = engine((1, 28, 28), 10);
        let buffers = BufferManager::new(&engine, 1).unwrap();
        assert_eq!(buffers.host_buffer("in").unwrap().len(), 784);
        assert_eq!(buffers.host_buffer("out").unwrap().len(), 10);
        assert!(buffers.host_buffer("missing").is_none());
    }

    #[test]
    fn test_allocation_scales_with_batch() {
        let engine = engine((1, 28, 28), 10);
        let buffers = BufferManager::new(&engine, 4).unwrap();
        assert_eq!(buffers.host_buffer("in").unwrap().len(), 784 * 4);
        assert_eq!(buffers.host_buffer("out").unwrap().len(), 40);
        assert_eq!(buffers.batch_size(), 4);
    }

    #[test]
    fn test_zero_sized_binding_rejected() {
        let engine = engine((1, 28, 28), 10);
        let result = BufferManager::new(&engine, 0);
        assert!(matches!(
            result,
            Err(TransferError::ZeroSizedBinding { .. })
        ));
    }

    #[test]
    fn test_input_copy_reaches_device() {
        let engine = engine((1, 2, 2), 2);
        let mut buffers = BufferManager::new(&engine, 1).unwrap();

        buffers
            .host_buffer_mut("in")
            .unwrap()
            .copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        buffers.copy_inputs_to_device().unwrap();

        // Read the device side back through the binding table handle.
        let table = buffers.device_binding_table();
        let mut device_view = vec![0.0; 4];
        table[0].copy_to_host(&mut device_view).unwrap();
        assert_eq!(device_view, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_output_copy_reaches_host() {
        let engine = engine((1, 2, 2), 2);
        let mut buffers = BufferManager::new(&engine, 1).unwrap();

        // Simulate the engine writing the output region.
        let table = buffers.device_binding_table();
        table[1].copy_from_host(&[0.25, 0.75]).unwrap();

        buffers.copy_outputs_to_host().unwrap();
        assert_eq!(buffers.host_buffer("out").unwrap(), &[0.25, 0.75]);
    }

    #[test]
    fn test_binding_table_order_matches_engine() {
        let engine = engine((1, 28, 28), 10);
        let buffers = BufferManager::new(&engine, 1).unwrap();
        let table = buffers.device_binding_table();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].len(), 784);
        assert_eq!(table[1].len(), 10);
    }

    #[test]
    fn test_stats_accumulate() {
        let engine = engine((1, 2, 2), 2);
        let mut buffers = BufferManager::new(&engine, 1).unwrap();

        buffers.copy_inputs_to_device().unwrap();
        buffers.copy_inputs_to_device().unwrap();
        buffers.copy_outputs_to_host().unwrap();

        let stats = buffers.stats();
        assert_eq!(stats.h2d_copies, 2);
        assert_eq!(stats.bytes_to_device, 2 * 4 * 4);
        assert_eq!(stats.d2h_copies, 1);
        assert_eq!(stats.bytes_to_host, 2 * 4);
    }
}
