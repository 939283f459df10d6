//! pyc runtime library.
//!
//! Provides the native helpers that programs compiled by pyc call into:
//! - A handle-based host object model (`handle`, `value`)
//! - The object-model boundary the helpers are written against (`host`)
//! - Integer addition and subtraction with typed failures (`arithmetic`)
//! - Printing (`builtins`)
//! - A C ABI over all of the above (`ffi`)

pub mod arithmetic;
pub mod builtins;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod host;
pub mod value;


pub use arithmetic::{BinaryOp, add, subtract};
pub use builtins::{print, print_to};
pub use error::{HelperError, HelperResult, HostError, HostResult};
pub use handle::{HandleStats, PyHandle, RefConvention, Runtime};
pub use host::{CompareOp, HostRuntime, PyRef};
pub use value::PyValue;
