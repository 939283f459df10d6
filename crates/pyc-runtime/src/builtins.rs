//! Built-in functions available to compiled programs

use std::io::{self, Write};

use tracing::trace;

use crate::error::HelperResult;
use crate::handle::PyHandle;
use crate::host::{HostRuntime, PyRef};

/// Print a value followed by a newline to standard output.
///
/// Returns the absence value under the runtime's reference convention.
pub fn print<R>(runtime: &R, value: PyHandle) -> HelperResult<PyRef<'_, R>>
where
    R: HostRuntime + ?Sized,
{
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_to(runtime, value, &mut out)
}

/// [`print`] with an explicit destination
pub fn print_to<'rt, R, W>(
    runtime: &'rt R,
    value: PyHandle,
    out: &mut W,
) -> HelperResult<PyRef<'rt, R>>
where
    R: HostRuntime + ?Sized,
    W: Write + ?Sized,
{
    let text = runtime.render(value)?;
    trace!(%value, "print");
    writeln!(out, "{text}")?;
    Ok(runtime.none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{RefConvention, Runtime};

    #[test]
    fn test_print_int() {
        let runtime = Runtime::new();
        let value = runtime.new_int(42);
        let mut out = Vec::new();
        let result = print_to(&runtime, value.handle(), &mut out).unwrap();
        assert_eq!(out, b"42\n");
        assert_eq!(result.handle(), PyHandle::NONE);
    }

    #[test]
    fn test_print_result_outlives_the_writer() {
        let runtime = Runtime::new();
        let none = {
            let mut out = Vec::new();
            print_to(&runtime, PyHandle::FALSE, &mut out).unwrap()
        };
        assert_eq!(none.handle(), PyHandle::NONE);
        drop(none);
        assert_eq!(runtime.ref_count(PyHandle::NONE), 1);
    }

    #[test]
    fn test_print_renders_host_text() {
        let runtime = Runtime::new();
        let text = runtime.new_str("hello world");
        let mut out = Vec::new();
        print_to(&runtime, text.handle(), &mut out).unwrap();
        print_to(&runtime, PyHandle::TRUE, &mut out).unwrap();
        print_to(&runtime, PyHandle::NONE, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "hello world\nTrue\nNone\n");
    }

    #[test]
    fn test_print_is_idempotent() {
        let runtime = Runtime::new();
        let value = runtime.new_int(-3);
        let mut first = Vec::new();
        let mut second = Vec::new();
        let a = print_to(&runtime, value.handle(), &mut first).unwrap();
        let b = print_to(&runtime, value.handle(), &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(a.handle(), b.handle());
        assert_eq!(runtime.ref_count(value.handle()), 1);
    }

    #[test]
    fn test_print_counts_none_under_new_reference() {
        let runtime = Runtime::with_convention(RefConvention::NewReference);
        let value = runtime.new_int(1);
        let before = runtime.ref_count(PyHandle::NONE);
        let none = print_to(&runtime, value.handle(), &mut io::sink()).unwrap();
        assert_eq!(runtime.ref_count(PyHandle::NONE), before + 1);
        drop(none);
        assert_eq!(runtime.ref_count(PyHandle::NONE), before);
    }

    #[test]
    fn test_print_leaves_none_alone_when_borrowed() {
        let runtime = Runtime::with_convention(RefConvention::Borrowed);
        let value = runtime.new_int(1);
        let before = runtime.ref_count(PyHandle::NONE);
        let none = print_to(&runtime, value.handle(), &mut io::sink()).unwrap();
        assert!(!none.is_owned());
        assert_eq!(runtime.ref_count(PyHandle::NONE), before);
    }

    #[test]
    fn test_print_invalid_handle_fails() {
        let runtime = Runtime::new();
        let mut out = Vec::new();
        assert!(print_to(&runtime, PyHandle::from_raw(77), &mut out).is_err());
        assert!(out.is_empty());
    }
}
