//! Runtime kernel dispatch by data type signature.
//!
//! A [`DispatchTable`] maps declared dtype signatures to type-specialized
//! kernels, with an optional generic fallback. Resolution is exact
//! positional equality over the full signature, first match wins; it runs
//! once per call, not per element. A signature with no entry and no
//! default is a host configuration error, reported loudly rather than
//! silently swallowed.

use crate::dtype::DataType;
use crate::{NdError, Result};

/// An ordered table of `(signature, kernel)` entries plus an optional
/// default kernel.
///
/// The kernel type `K` is whatever the call site needs, typically a
/// function pointer or boxed closure over views; see [`crate::ops`] for
/// the intended wiring.
pub struct DispatchTable<K> {
    entries: Vec<(Vec<DataType>, K)>,
    default: Option<K>,
}

impl<K> DispatchTable<K> {
    pub fn new() -> Self {
        DispatchTable {
            entries: Vec::new(),
            default: None,
        }
    }

    /// Register a kernel for an exact dtype signature. Entries are matched
    /// in registration order.
    pub fn entry(mut self, signature: &[DataType], kernel: K) -> Self {
        self.entries.push((signature.to_vec(), kernel));
        self
    }

    /// Register the fallback kernel.
    pub fn default_kernel(mut self, kernel: K) -> Self {
        self.default = Some(kernel);
        self
    }

    /// Select the kernel for a runtime dtype signature.
    ///
    /// # Errors
    /// [`NdError::NoMatchingKernel`] when no entry matches and no default
    /// was registered.
    pub fn resolve(&self, signature: &[DataType]) -> Result<&K> {
        for (candidate, kernel) in &self.entries {
            if candidate.as_slice() == signature {
                return Ok(kernel);
            }
        }
        self.default.as_ref().ok_or_else(|| NdError::NoMatchingKernel {
            signature: signature.to_vec(),
        })
    }
}

impl<K> Default for DispatchTable<K> {
    fn default() -> Self {
        DispatchTable::new()
    }
}
