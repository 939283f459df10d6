//! The boundary between the native helpers and the host object model
//!
//! Helpers only know handles and the primitives below. They never look at a
//! value's representation, so any object model that can answer these
//! questions can sit behind them.

use std::fmt;

use crate::error::HostResult;
use crate::handle::PyHandle;

/// Comparison operators the host knows how to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
        })
    }
}

/// Object-model primitives exposed by the host runtime.
///
/// Handles passed in are borrowed for the duration of the call. Every
/// [`PyRef`] handed back is a new reference owned by the caller, except the
/// one produced by [`HostRuntime::none`], which follows the runtime's
/// reference convention.
pub trait HostRuntime {
    /// Whether the value is a whole number (booleans included)
    fn is_integral(&self, handle: PyHandle) -> HostResult<bool>;

    fn number_add(&self, left: PyHandle, right: PyHandle) -> HostResult<PyRef<'_, Self>>;

    fn number_subtract(&self, left: PyHandle, right: PyHandle) -> HostResult<PyRef<'_, Self>>;

    /// Canonical textual rendering of a value
    fn render(&self, handle: PyHandle) -> HostResult<String>;

    fn is_true(&self, handle: PyHandle) -> HostResult<bool>;

    fn rich_compare(
        &self,
        left: PyHandle,
        right: PyHandle,
        op: CompareOp,
    ) -> HostResult<PyRef<'_, Self>>;

    fn type_name(&self, handle: PyHandle) -> HostResult<&'static str>;

    /// The canonical absence value.
    ///
    /// Under [`RefConvention::NewReference`](crate::handle::RefConvention) an
    /// extra reference is registered and the returned [`PyRef`] owns it.
    /// Under `Borrowed` the count is left alone and the reference is borrowed.
    fn none(&self) -> PyRef<'_, Self>;

    fn incref(&self, handle: PyHandle);

    fn decref(&self, handle: PyHandle);
}

/// A handle paired with the runtime it belongs to.
///
/// An owned reference releases itself when dropped; a borrowed one never
/// touches the reference count.
pub struct PyRef<'rt, R: HostRuntime + ?Sized> {
    runtime: &'rt R,
    handle: PyHandle,
    owned: bool,
}

impl<'rt, R: HostRuntime + ?Sized> PyRef<'rt, R> {
    /// Take ownership of a reference the caller already holds
    pub fn owned(runtime: &'rt R, handle: PyHandle) -> Self {
        Self {
            runtime,
            handle,
            owned: true,
        }
    }

    pub fn borrowed(runtime: &'rt R, handle: PyHandle) -> Self {
        Self {
            runtime,
            handle,
            owned: false,
        }
    }

    /// Register a new reference to a borrowed handle and own it
    pub fn new_reference(runtime: &'rt R, handle: PyHandle) -> Self {
        runtime.incref(handle);
        Self::owned(runtime, handle)
    }

    pub fn handle(&self) -> PyHandle {
        self.handle
    }

    pub fn runtime(&self) -> &'rt R {
        self.runtime
    }

    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// Give up the reference without releasing it
    pub fn into_raw(self) -> PyHandle {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }

    /// Turn this into an owned reference, registering one if it was borrowed
    pub fn into_owned(self) -> Self {
        if self.owned {
            self
        } else {
            Self::new_reference(self.runtime, self.into_raw())
        }
    }
}

impl<R: HostRuntime + ?Sized> Clone for PyRef<'_, R> {
    fn clone(&self) -> Self {
        if self.owned {
            Self::new_reference(self.runtime, self.handle)
        } else {
            Self::borrowed(self.runtime, self.handle)
        }
    }
}

impl<R: HostRuntime + ?Sized> Drop for PyRef<'_, R> {
    fn drop(&mut self) {
        if self.owned {
            self.runtime.decref(self.handle);
        }
    }
}

impl<R: HostRuntime + ?Sized> fmt::Debug for PyRef<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PyRef")
            .field("handle", &self.handle)
            .field("owned", &self.owned)
            .finish()
    }
}
