//! Error types for the runtime helpers

use derive_more::{Display, Error, From};

use crate::arithmetic::BinaryOp;
use crate::handle::PyHandle;

pub type HostResult<T> = Result<T, HostError>;
pub type HelperResult<T> = Result<T, HelperError>;

/// Failures reported by the host object model itself
#[derive(Display, Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HostError {
    #[display("invalid handle: {_0}")]
    InvalidHandle(#[error(not(source))] PyHandle),

    #[display("object {_0} is not a number")]
    NotANumber(#[error(not(source))] PyHandle),
}

/// Failures of the native helpers
#[derive(Display, Debug, Error, From)]
pub enum HelperError {
    /// At least one operand of `+` or `-` is not integral
    #[display("unsupported operand type(s) for {op}: '{left}' and '{right}'")]
    UnsupportedOperand {
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    },

    #[display("{_0}")]
    #[from]
    Host(#[error(source)] HostError),

    #[display("failed to write output: {_0}")]
    #[from]
    Io(#[error(source)] std::io::Error),
}

impl HelperError {
    pub(crate) fn unsupported_operand(
        op: BinaryOp,
        left: &'static str,
        right: &'static str,
    ) -> Self {
        HelperError::UnsupportedOperand { op, left, right }
    }

    /// Name of the host exception this error maps to
    pub fn exception_name(&self) -> &'static str {
        match self {
            HelperError::UnsupportedOperand { .. } => "TypeError",
            HelperError::Host(_) => "SystemError",
            HelperError::Io(_) => "OSError",
        }
    }

    pub fn is_unsupported_operand(&self) -> bool {
        matches!(self, HelperError::UnsupportedOperand { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_operand_message() {
        let err = HelperError::unsupported_operand(BinaryOp::Add, "int", "str");
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
        assert_eq!(err.exception_name(), "TypeError");
        assert!(err.is_unsupported_operand());
    }

    #[test]
    fn test_host_error_converts() {
        let err: HelperError = HostError::InvalidHandle(PyHandle::INVALID).into();
        assert!(!err.is_unsupported_operand());
        assert_eq!(err.to_string(), "invalid handle: #0");
    }

    #[test]
    fn test_error_sources() {
        use std::error::Error as _;

        let err: HelperError = HostError::NotANumber(PyHandle::NONE).into();
        let source = err.source().map(|e| e.to_string());
        assert_eq!(source.as_deref(), Some("object #1 is not a number"));
        assert!(HostError::InvalidHandle(PyHandle::INVALID).source().is_none());
        assert!(
            HelperError::unsupported_operand(BinaryOp::Sub, "str", "int")
                .source()
                .is_none()
        );
    }
}
