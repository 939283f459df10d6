//! Value representation for the pyc host object model
//!
//! Values live behind handles in the [`HandleTable`](crate::handle::HandleTable);
//! helpers never see this type directly and go through
//! [`HostRuntime`](crate::host::HostRuntime) instead.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use num_bigint::BigInt;
use num_traits::Zero;

/// A host runtime value
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PyValue {
    None,
    Bool(bool),
    /// Arbitrary-precision integer
    Int(BigInt),
    Str(String),
}

impl PyValue {
    pub fn int(value: impl Into<BigInt>) -> Self {
        PyValue::Int(value.into())
    }

    pub fn str(value: impl Into<String>) -> Self {
        PyValue::Str(value.into())
    }

    /// Name of the value's type as the host reports it in diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            PyValue::None => "NoneType",
            PyValue::Bool(_) => "bool",
            PyValue::Int(_) => "int",
            PyValue::Str(_) => "str",
        }
    }

    /// Whole-number view of the value. Booleans count as 0 and 1.
    pub fn as_integral(&self) -> Option<BigInt> {
        match self {
            PyValue::Bool(b) => Some(BigInt::from(u8::from(*b))),
            PyValue::Int(n) => Some(n.clone()),
            PyValue::None | PyValue::Str(_) => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, PyValue::Bool(_) | PyValue::Int(_))
    }

    pub fn is_true(&self) -> bool {
        match self {
            PyValue::None => false,
            PyValue::Bool(b) => *b,
            PyValue::Int(n) => !n.is_zero(),
            PyValue::Str(s) => !s.is_empty(),
        }
    }

    /// Value equality, with `True == 1` and `False == 0` like the host's ints
    pub fn equals(&self, other: &PyValue) -> bool {
        match (self.as_integral(), other.as_integral()) {
            (Some(l), Some(r)) => l == r,
            _ => match (self, other) {
                (PyValue::None, PyValue::None) => true,
                (PyValue::Str(l), PyValue::Str(r)) => l == r,
                _ => false,
            },
        }
    }
}

/// Canonical textual rendering (`str()` in the host language)
impl fmt::Display for PyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyValue::None => f.write_str("None"),
            PyValue::Bool(true) => f.write_str("True"),
            PyValue::Bool(false) => f.write_str("False"),
            PyValue::Int(n) => write!(f, "{n}"),
            PyValue::Str(s) => f.write_str(s),
        }
    }
}

/// A value together with its reference count
#[derive(Debug)]
pub struct PyBoxed {
    pub value: PyValue,
    ref_count: AtomicU32,
}

impl PyBoxed {
    /// Box a value with a single owner
    pub fn new(value: PyValue) -> Self {
        Self {
            value,
            ref_count: AtomicU32::new(1),
        }
    }

    pub fn retain(&self) -> u32 {
        self.ref_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Drop one reference and return the remaining count
    pub fn release(&self) -> u32 {
        let previous = self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_follows_str_rules() {
        assert_eq!(PyValue::None.to_string(), "None");
        assert_eq!(PyValue::Bool(true).to_string(), "True");
        assert_eq!(PyValue::Bool(false).to_string(), "False");
        assert_eq!(PyValue::int(-12).to_string(), "-12");
        assert_eq!(PyValue::str("hi there").to_string(), "hi there");
    }

    #[test]
    fn test_booleans_are_integral() {
        assert_eq!(PyValue::Bool(true).as_integral(), Some(BigInt::from(1)));
        assert_eq!(PyValue::Bool(false).as_integral(), Some(BigInt::from(0)));
        assert!(!PyValue::str("1").is_integral());
        assert!(!PyValue::None.is_integral());
    }

    #[test]
    fn test_equality_treats_bool_as_int() {
        assert!(PyValue::Bool(true).equals(&PyValue::int(1)));
        assert!(!PyValue::Bool(true).equals(&PyValue::int(2)));
        assert!(!PyValue::str("1").equals(&PyValue::int(1)));
        assert!(PyValue::None.equals(&PyValue::None));
    }

    #[test]
    fn test_boxed_ref_counting() {
        let boxed = PyBoxed::new(PyValue::int(7));
        assert_eq!(boxed.ref_count(), 1);
        assert_eq!(boxed.retain(), 2);
        assert_eq!(boxed.release(), 1);
        assert_eq!(boxed.release(), 0);
        // Releasing past zero stays at zero
        assert_eq!(boxed.release(), 0);
    }
}
