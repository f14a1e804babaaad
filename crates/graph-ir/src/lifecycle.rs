// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Process-wide parser-library lifecycle.
//!
//! The parsing layer keeps shared state for the lifetime of the process
//! (interned schema tables in the original implementation). Shutting it
//! down is a process-wide operation that must happen exactly once, after
//! the last user is done.
//!
//! [`ParserLibrary`] models that as a reference-counted guard instead of
//! a free-standing shutdown call: every pipeline holds one for as long as
//! it may parse, and the shared state is released when the final guard
//! drops. Failure paths release it exactly like success paths.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of live guards in this process.
static ACTIVE_GUARDS: AtomicUsize = AtomicUsize::new(0);

/// RAII guard for the parser library's process-wide state.
///
/// # Example
/// ```
/// use graph_ir::ParserLibrary;
///
/// let guard = ParserLibrary::initialise();
/// assert!(ParserLibrary::active_count() >= 1);
/// drop(guard);
/// ```
#[derive(Debug)]
pub struct ParserLibrary {
    _priv: (),
}

impl ParserLibrary {
    /// Acquires a handle on the parser library, initialising the shared
    /// state if this is the first live guard.
    pub fn initialise() -> Self {
        let previous = ACTIVE_GUARDS.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            tracing::debug!("parser library initialised");
        }
        Self { _priv: () }
    }

    /// Returns the number of live guards (diagnostics and tests).
    pub fn active_count() -> usize {
        ACTIVE_GUARDS.load(Ordering::SeqCst)
    }
}

impl Drop for ParserLibrary {
    fn drop(&mut self) {
        let previous = ACTIVE_GUARDS.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            tracing::debug!("parser library resources released");
        }
    }
}
