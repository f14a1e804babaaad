// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buffer-manager
//!
//! Paired host/device memory for every binding of a compiled engine.
//!
//! # Key Components
//!
//! - [`PairedBuffer`] — one host region and its mirrored device region
//!   for a single binding. Both sides are sized together from the
//!   engine's per-binding element count × batch size, and freed together
//!   when the pair drops.
//! - [`BufferManager`] — owns one pair per binding, keyed by the
//!   engine's binding table. The rest of the pipeline writes inputs and
//!   reads outputs through the host regions; data crosses to the device
//!   only through the explicit bulk copy operations.
//! - [`TransferStats`] — copy counts and bytes moved, for reporting.
//!
//! # Ordering
//!
//! The caller drives the sequence: fill host input →
//! [`BufferManager::copy_inputs_to_device`] → execute →
//! [`BufferManager::copy_outputs_to_host`] → read host output. A paired
//! region is never read on one side before the corresponding copy
//! completed; nothing here is asynchronous.
//!
//! # Example
//! ```no_run
//! # fn demo(engine: &accel_backend::CompiledEngine) -> Result<(), buffer_manager::TransferError> {
//! use buffer_manager::BufferManager;
//!
//! let mut buffers = BufferManager::new(engine, 1)?;
//! buffers.host_buffer_mut("in").unwrap().fill(0.5);
//! buffers.copy_inputs_to_device()?;
//! // ... execute ...
//! buffers.copy_outputs_to_host()?;
//! let scores = buffers.host_buffer("out").unwrap();
//! # let _ = scores;
//! # Ok(())
//! # }
//! ```

mod error;
mod manager;
mod paired;
mod stats;

pub use error::TransferError;
pub use manager::BufferManager;
pub use paired::PairedBuffer;
pub use stats::TransferStats;
