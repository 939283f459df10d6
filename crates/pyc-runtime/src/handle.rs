//! Handle-based object model backing the pyc runtime
//!
//! Values are stored in a concurrent table and referenced through opaque
//! [`PyHandle`]s, so neither the helpers nor generated C code ever depend on
//! how a value is laid out.
//!
//! ## Interned values
//!
//! The following values are interned (always the same handle):
//! - `None` → Handle(1)
//! - `True` → Handle(2)
//! - `False` → Handle(3)
//!
//! Interned values are allocated when the table is created and are never
//! deallocated. Their reference counts are still tracked, and never drop
//! below the one reference held by the table itself.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use num_bigint::BigInt;
use tracing::trace;

use crate::error::{HostError, HostResult};
use crate::host::{CompareOp, HostRuntime, PyRef};
use crate::value::{PyBoxed, PyValue};

/// An opaque handle that indirectly references a [`PyBoxed`] value.
/// Crosses the C ABI as a plain `uint64_t`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PyHandle(u64);

impl PyHandle {
    /// The handle no value ever has
    pub const INVALID: PyHandle = PyHandle(0);
    pub const NONE: PyHandle = PyHandle(1);
    pub const TRUE: PyHandle = PyHandle(2);
    pub const FALSE: PyHandle = PyHandle(3);

    const FIRST_DYNAMIC: u64 = 4;

    pub const fn from_raw(raw: u64) -> Self {
        PyHandle(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_invalid(self) -> bool {
        self.0 == 0
    }

    pub const fn is_interned(self) -> bool {
        self.0 >= 1 && self.0 < Self::FIRST_DYNAMIC
    }

    pub const fn from_bool(value: bool) -> Self {
        if value { PyHandle::TRUE } else { PyHandle::FALSE }
    }
}

impl fmt::Display for PyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocation counters for a [`HandleTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub allocated: u64,
    pub deallocated: u64,
    pub peak_count: u64,
}

/// Handle table that manages handles to [`PyBoxed`] values
pub struct HandleTable {
    table: DashMap<u64, Box<PyBoxed>>,
    counter: AtomicU64,
    stats: Mutex<HandleStats>,
}

impl HandleTable {
    /// Create a new handle table with pre-populated interned values
    pub fn new() -> Self {
        let table = DashMap::new();
        table.insert(PyHandle::NONE.0, Box::new(PyBoxed::new(PyValue::None)));
        table.insert(PyHandle::TRUE.0, Box::new(PyBoxed::new(PyValue::Bool(true))));
        table.insert(PyHandle::FALSE.0, Box::new(PyBoxed::new(PyValue::Bool(false))));

        Self {
            table,
            counter: AtomicU64::new(PyHandle::FIRST_DYNAMIC),
            stats: Mutex::new(HandleStats::default()),
        }
    }

    /// Store a value and return a handle holding its only reference
    pub fn create_handle(&self, value: PyValue) -> PyHandle {
        let handle = PyHandle(self.counter.fetch_add(1, Ordering::Relaxed));
        self.table.insert(handle.0, Box::new(PyBoxed::new(value)));

        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.allocated += 1;
        let live = stats.allocated - stats.deallocated;
        if live > stats.peak_count {
            stats.peak_count = live;
        }
        drop(stats);

        trace!(%handle, "allocated");
        handle
    }

    pub fn is_valid(&self, handle: PyHandle) -> bool {
        !handle.is_invalid() && self.table.contains_key(&handle.0)
    }

    /// Execute a closure with access to the boxed value
    pub fn with_value<T, F>(&self, handle: PyHandle, f: F) -> Option<T>
    where
        F: FnOnce(&PyBoxed) -> T,
    {
        if handle.is_invalid() {
            return None;
        }

        self.table.get(&handle.0).map(|boxed| f(&boxed))
    }

    /// Register another reference, returning the new count
    pub fn retain(&self, handle: PyHandle) -> Option<u32> {
        self.with_value(handle, PyBoxed::retain)
    }

    /// Drop a reference and deallocate the value once nothing refers to it.
    /// Returns the remaining count, or `None` for an unknown handle.
    pub fn release(&self, handle: PyHandle) -> Option<u32> {
        let remaining = self.with_value(handle, |boxed| {
            if handle.is_interned() && boxed.ref_count() <= 1 {
                // The table's own reference keeps interned values alive
                return boxed.ref_count();
            }
            boxed.release()
        })?;

        if remaining == 0 && self.table.remove(&handle.0).is_some() {
            let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
            stats.deallocated += 1;
            trace!(%handle, "deallocated");
        }

        Some(remaining)
    }

    pub fn ref_count(&self, handle: PyHandle) -> Option<u32> {
        self.with_value(handle, PyBoxed::ref_count)
    }

    /// Number of live non-interned values
    pub fn live_count(&self) -> usize {
        self.table.len().saturating_sub(PyHandle::FIRST_DYNAMIC as usize - 1)
    }

    pub fn stats(&self) -> HandleStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

/// How references to the shared absence value are handed out.
///
/// Hosts differ on whether a function returning `None` must give its caller a
/// counted reference. This is decided once per runtime, and only
/// [`HostRuntime::none`] looks at it.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RefConvention {
    /// The recipient owns the returned reference and must release it
    #[default]
    NewReference = 0,
    /// The recipient only borrows the returned reference
    Borrowed = 1,
}

impl RefConvention {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(RefConvention::NewReference),
            1 => Some(RefConvention::Borrowed),
            _ => None,
        }
    }
}

/// Runtime context that owns the handle table and the reference convention
pub struct Runtime {
    handles: HandleTable,
    convention: RefConvention,
    last_error: Mutex<Option<String>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_convention(RefConvention::default())
    }

    pub fn with_convention(convention: RefConvention) -> Self {
        Self {
            handles: HandleTable::new(),
            convention,
            last_error: Mutex::new(None),
        }
    }

    pub fn convention(&self) -> RefConvention {
        self.convention
    }

    /// Allocate a value and own the only reference to it
    pub fn alloc(&self, value: PyValue) -> PyRef<'_, Self> {
        PyRef::owned(self, self.handles.create_handle(value))
    }

    pub fn new_int(&self, value: impl Into<BigInt>) -> PyRef<'_, Self> {
        self.alloc(PyValue::Int(value.into()))
    }

    pub fn new_str(&self, value: impl Into<String>) -> PyRef<'_, Self> {
        self.alloc(PyValue::Str(value.into()))
    }

    /// A new reference to one of the interned booleans
    pub fn new_bool(&self, value: bool) -> PyRef<'_, Self> {
        PyRef::new_reference(self, PyHandle::from_bool(value))
    }

    pub fn is_valid(&self, handle: PyHandle) -> bool {
        self.handles.is_valid(handle)
    }

    pub fn with_value<T, F>(&self, handle: PyHandle, f: F) -> HostResult<T>
    where
        F: FnOnce(&PyValue) -> T,
    {
        self.handles
            .with_value(handle, |boxed| f(&boxed.value))
            .ok_or(HostError::InvalidHandle(handle))
    }

    /// A copy of the value behind a handle
    pub fn value(&self, handle: PyHandle) -> HostResult<PyValue> {
        self.with_value(handle, PyValue::clone)
    }

    /// Current reference count, or 0 for an unknown handle
    pub fn ref_count(&self, handle: PyHandle) -> u32 {
        self.handles.ref_count(handle).unwrap_or(0)
    }

    pub fn live_count(&self) -> usize {
        self.handles.live_count()
    }

    pub fn stats(&self) -> HandleStats {
        self.handles.stats()
    }

    pub(crate) fn set_last_error(&self, message: impl Into<String>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.into());
    }

    pub(crate) fn clear_last_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Message of the most recent helper failure seen through the C ABI
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn integral(&self, handle: PyHandle) -> HostResult<BigInt> {
        self.with_value(handle, PyValue::as_integral)?
            .ok_or(HostError::NotANumber(handle))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for Runtime {
    fn is_integral(&self, handle: PyHandle) -> HostResult<bool> {
        self.with_value(handle, PyValue::is_integral)
    }

    fn number_add(&self, left: PyHandle, right: PyHandle) -> HostResult<PyRef<'_, Self>> {
        let sum = self.integral(left)? + self.integral(right)?;
        Ok(self.new_int(sum))
    }

    fn number_subtract(&self, left: PyHandle, right: PyHandle) -> HostResult<PyRef<'_, Self>> {
        let difference = self.integral(left)? - self.integral(right)?;
        Ok(self.new_int(difference))
    }

    fn render(&self, handle: PyHandle) -> HostResult<String> {
        self.with_value(handle, PyValue::to_string)
    }

    fn is_true(&self, handle: PyHandle) -> HostResult<bool> {
        self.with_value(handle, PyValue::is_true)
    }

    fn rich_compare(
        &self,
        left: PyHandle,
        right: PyHandle,
        op: CompareOp,
    ) -> HostResult<PyRef<'_, Self>> {
        let left = self.value(left)?;
        let equal = self.with_value(right, |right| left.equals(right))?;
        let result = match op {
            CompareOp::Eq => equal,
            CompareOp::Ne => !equal,
        };
        Ok(self.new_bool(result))
    }

    fn type_name(&self, handle: PyHandle) -> HostResult<&'static str> {
        self.with_value(handle, PyValue::type_name)
    }

    fn none(&self) -> PyRef<'_, Self> {
        match self.convention {
            RefConvention::NewReference => PyRef::new_reference(self, PyHandle::NONE),
            RefConvention::Borrowed => PyRef::borrowed(self, PyHandle::NONE),
        }
    }

    fn incref(&self, handle: PyHandle) {
        self.handles.retain(handle);
    }

    fn decref(&self, handle: PyHandle) {
        self.handles.release(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interned_handles_are_prepopulated() {
        let runtime = Runtime::new();
        assert!(runtime.is_valid(PyHandle::NONE));
        assert!(runtime.is_valid(PyHandle::TRUE));
        assert!(runtime.is_valid(PyHandle::FALSE));
        assert!(!runtime.is_valid(PyHandle::INVALID));
        assert_eq!(runtime.value(PyHandle::NONE).unwrap(), PyValue::None);
        assert_eq!(runtime.live_count(), 0);
    }

    #[test]
    fn test_release_deallocates_at_zero() {
        let runtime = Runtime::new();
        let handle = runtime.new_int(5).into_raw();
        assert_eq!(runtime.ref_count(handle), 1);

        runtime.incref(handle);
        assert_eq!(runtime.ref_count(handle), 2);

        runtime.decref(handle);
        assert!(runtime.is_valid(handle));
        runtime.decref(handle);
        assert!(!runtime.is_valid(handle));

        let stats = runtime.stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.deallocated, 1);
        assert_eq!(stats.peak_count, 1);
    }

    #[test]
    fn test_interned_values_survive_over_release() {
        let runtime = Runtime::new();
        runtime.decref(PyHandle::NONE);
        runtime.decref(PyHandle::NONE);
        assert!(runtime.is_valid(PyHandle::NONE));
        assert_eq!(runtime.ref_count(PyHandle::NONE), 1);
    }

    #[test]
    fn test_py_ref_drop_releases() {
        let runtime = Runtime::new();
        {
            let value = runtime.new_str("hello");
            let copy = value.clone();
            assert_eq!(runtime.ref_count(value.handle()), 2);
            drop(copy);
            assert_eq!(runtime.ref_count(value.handle()), 1);
        }
        assert_eq!(runtime.live_count(), 0);
    }

    #[test]
    fn test_none_follows_convention() {
        let counted = Runtime::with_convention(RefConvention::NewReference);
        let none = counted.none();
        assert!(none.is_owned());
        assert_eq!(counted.ref_count(PyHandle::NONE), 2);
        drop(none);
        assert_eq!(counted.ref_count(PyHandle::NONE), 1);

        let borrowed = Runtime::with_convention(RefConvention::Borrowed);
        let none = borrowed.none();
        assert!(!none.is_owned());
        assert_eq!(borrowed.ref_count(PyHandle::NONE), 1);
        drop(none);
        assert_eq!(borrowed.ref_count(PyHandle::NONE), 1);
    }

    #[test]
    fn test_rich_compare() {
        let runtime = Runtime::new();
        let one = runtime.new_int(1);
        let t = runtime.new_bool(true);
        let s = runtime.new_str("1");

        let eq = runtime
            .rich_compare(one.handle(), t.handle(), CompareOp::Eq)
            .unwrap();
        assert_eq!(eq.handle(), PyHandle::TRUE);

        let ne = runtime
            .rich_compare(one.handle(), s.handle(), CompareOp::Ne)
            .unwrap();
        assert_eq!(ne.handle(), PyHandle::TRUE);
    }

    #[test]
    fn test_invalid_handle_is_reported() {
        let runtime = Runtime::new();
        let missing = PyHandle::from_raw(999);
        assert_eq!(
            runtime.render(missing),
            Err(HostError::InvalidHandle(missing))
        );
        assert_eq!(
            runtime.is_integral(PyHandle::INVALID),
            Err(HostError::InvalidHandle(PyHandle::INVALID))
        );
    }

    #[test]
    fn test_convention_from_raw() {
        assert_eq!(RefConvention::from_raw(0), Some(RefConvention::NewReference));
        assert_eq!(RefConvention::from_raw(1), Some(RefConvention::Borrowed));
        assert_eq!(RefConvention::from_raw(7), None);
    }
}
