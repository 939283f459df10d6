//! C ABI for code emitted by the pyc compiler
//!
//! Every helper returns a [`PycResult`] so C callers can tell a failure from a
//! value: on error the status is non-zero, the handle is invalid, and the
//! message is available through [`pyc_last_error`].

use std::ffi::c_char;

use num_bigint::BigInt;
use tracing::warn;

use crate::arithmetic;
use crate::builtins;
use crate::error::{HelperError, HelperResult};
use crate::handle::{PyHandle, RefConvention, Runtime};
use crate::host::{CompareOp, HostRuntime, PyRef};

/// Outcome tag of a helper call
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PycStatus {
    Ok = 0,
    UnsupportedOperand = 1,
    InvalidHandle = 2,
    Io = 3,
}

impl From<&HelperError> for PycStatus {
    fn from(error: &HelperError) -> Self {
        match error {
            HelperError::UnsupportedOperand { .. } => PycStatus::UnsupportedOperand,
            HelperError::Host(_) => PycStatus::InvalidHandle,
            HelperError::Io(_) => PycStatus::Io,
        }
    }
}

/// Tagged result of a helper call
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PycResult {
    pub status: PycStatus,
    /// New reference to the result; invalid unless `status` is `Ok`
    pub handle: PyHandle,
}

impl PycResult {
    fn ok(handle: PyHandle) -> Self {
        Self {
            status: PycStatus::Ok,
            handle,
        }
    }

    fn error(status: PycStatus) -> Self {
        Self {
            status,
            handle: PyHandle::INVALID,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == PycStatus::Ok
    }
}

fn finish(runtime: &Runtime, result: HelperResult<PyRef<'_, Runtime>>) -> PycResult {
    match result {
        Ok(value) => {
            runtime.clear_last_error();
            PycResult::ok(value.into_raw())
        }
        Err(error) => {
            let status = PycStatus::from(&error);
            warn!(%error, "helper failed");
            runtime.set_last_error(format!("{}: {error}", error.exception_name()));
            PycResult::error(status)
        }
    }
}

fn null_runtime() -> PycResult {
    PycResult::error(PycStatus::InvalidHandle)
}

/// Create a runtime. `convention` is 0 for new references to `None`, 1 for
/// borrowed ones; any other value returns null.
#[unsafe(no_mangle)]
pub extern "C" fn pyc_runtime_new(convention: u8) -> *mut Runtime {
    match RefConvention::from_raw(convention) {
        Some(convention) => Box::into_raw(Box::new(Runtime::with_convention(convention))),
        None => std::ptr::null_mut(),
    }
}

/// Destroy a runtime and every value it owns
///
/// # Safety
/// `runtime` must be null or a pointer returned by [`pyc_runtime_new`] that
/// has not been destroyed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_runtime_destroy(runtime: *mut Runtime) {
    if !runtime.is_null() {
        unsafe {
            drop(Box::from_raw(runtime));
        }
    }
}

/// Create an int from a machine integer
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_int_from_i64(runtime: *const Runtime, value: i64) -> PyHandle {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return PyHandle::INVALID;
    };
    runtime.new_int(value).into_raw()
}

/// Create an int from decimal digits with an optional leading `-`.
/// Returns the invalid handle when the text is not an integer.
///
/// # Safety
/// `runtime` must be null or a live runtime pointer, and `data` must point to
/// `length` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_int_from_str(
    runtime: *const Runtime,
    data: *const u8,
    length: usize,
) -> PyHandle {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return PyHandle::INVALID;
    };
    let bytes = unsafe { bytes_from_raw(data, length) };
    let parsed = std::str::from_utf8(bytes)
        .ok()
        .and_then(|text| text.parse::<BigInt>().ok());
    match parsed {
        Some(value) => runtime.new_int(value).into_raw(),
        None => PyHandle::INVALID,
    }
}

/// Create a str from UTF-8 bytes. Invalid sequences are replaced.
///
/// # Safety
/// `runtime` must be null or a live runtime pointer, and `data` must point to
/// `length` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_str_from_utf8(
    runtime: *const Runtime,
    data: *const u8,
    length: usize,
) -> PyHandle {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return PyHandle::INVALID;
    };
    let bytes = unsafe { bytes_from_raw(data, length) };
    runtime
        .new_str(String::from_utf8_lossy(bytes).into_owned())
        .into_raw()
}

/// New reference to `True` or `False`
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_bool(runtime: *const Runtime, value: bool) -> PyHandle {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return PyHandle::INVALID;
    };
    runtime.new_bool(value).into_raw()
}

/// The absence value, counted according to the runtime's convention
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_none(runtime: *const Runtime) -> PyHandle {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return PyHandle::INVALID;
    };
    runtime.none().into_raw()
}

/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_incref(runtime: *const Runtime, handle: PyHandle) {
    if let Some(runtime) = unsafe { runtime.as_ref() } {
        runtime.incref(handle);
    }
}

/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_decref(runtime: *const Runtime, handle: PyHandle) {
    if let Some(runtime) = unsafe { runtime.as_ref() } {
        runtime.decref(handle);
    }
}

/// Reference count of a handle, 0 if unknown
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_ref_count(runtime: *const Runtime, handle: PyHandle) -> u32 {
    match unsafe { runtime.as_ref() } {
        Some(runtime) => runtime.ref_count(handle),
        None => 0,
    }
}

/// Truthiness: 1 or 0, or -1 for an invalid handle
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_is_true(runtime: *const Runtime, handle: PyHandle) -> i32 {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return -1;
    };
    match runtime.is_true(handle) {
        Ok(truth) => i32::from(truth),
        Err(error) => {
            runtime.set_last_error(format!("SystemError: {error}"));
            -1
        }
    }
}

/// Convert an integral value to a machine integer for use as an exit code.
/// Returns false when the value is not integral or does not fit.
///
/// # Safety
/// `runtime` must be null or a live runtime pointer and `out` must be valid
/// for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_as_i64(runtime: *const Runtime, handle: PyHandle, out: *mut i64) -> bool {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return false;
    };
    if out.is_null() {
        return false;
    }
    let value = runtime
        .with_value(handle, |value| value.as_integral())
        .ok()
        .flatten()
        .and_then(|n| i64::try_from(n).ok());
    match value {
        Some(value) => {
            unsafe { *out = value };
            true
        }
        None => false,
    }
}

/// `left + right` on integral values
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_add(runtime: *const Runtime, left: PyHandle, right: PyHandle) -> PycResult {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return null_runtime();
    };
    finish(runtime, arithmetic::add(runtime, left, right))
}

/// `left - right` on integral values
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_sub(runtime: *const Runtime, left: PyHandle, right: PyHandle) -> PycResult {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return null_runtime();
    };
    finish(runtime, arithmetic::subtract(runtime, left, right))
}

/// Compare two values; `op` is 0 for `==` and 1 for `!=`
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_compare(
    runtime: *const Runtime,
    left: PyHandle,
    right: PyHandle,
    op: u8,
) -> PycResult {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return null_runtime();
    };
    let op = match op {
        0 => CompareOp::Eq,
        1 => CompareOp::Ne,
        _ => return PycResult::error(PycStatus::InvalidHandle),
    };
    let result = runtime
        .rich_compare(left, right, op)
        .map_err(HelperError::from);
    finish(runtime, result)
}

/// Print a value and a newline to stdout, returning the absence value
///
/// # Safety
/// `runtime` must be null or a live runtime pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_print(runtime: *const Runtime, value: PyHandle) -> PycResult {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return null_runtime();
    };
    finish(runtime, builtins::print(runtime, value))
}

/// Copy the last error message into `buffer` (not NUL-terminated) and return
/// its full length in bytes, or 0 when there is none.
///
/// # Safety
/// `runtime` must be null or a live runtime pointer and `buffer` must be null
/// or valid for `buffer_size` bytes of writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn pyc_last_error(
    runtime: *const Runtime,
    buffer: *mut c_char,
    buffer_size: usize,
) -> usize {
    let Some(runtime) = (unsafe { runtime.as_ref() }) else {
        return 0;
    };
    let Some(message) = runtime.last_error() else {
        return 0;
    };

    let bytes = message.as_bytes();
    let copy_len = bytes.len().min(buffer_size);
    if !buffer.is_null() && copy_len > 0 {
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buffer.cast::<u8>(), copy_len);
        }
    }
    bytes.len()
}

unsafe fn bytes_from_raw<'a>(data: *const u8, length: usize) -> &'a [u8] {
    if data.is_null() || length == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(data, length) }
    }
}
