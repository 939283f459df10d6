//! Arithmetic helpers for host values
//!
//! Both operands are classified before any arithmetic happens. Only whole
//! numbers (booleans included) reach the host's numeric primitives; anything
//! else is rejected with [`HelperError::UnsupportedOperand`].

use std::fmt;

use tracing::debug;

use crate::error::{HelperError, HelperResult};
use crate::handle::PyHandle;
use crate::host::{HostRuntime, PyRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Add two integral values
pub fn add<'rt, R>(runtime: &'rt R, left: PyHandle, right: PyHandle) -> HelperResult<PyRef<'rt, R>>
where
    R: HostRuntime + ?Sized,
{
    // TODO: consult a type's own `__add__` before falling back to ints
    // TODO: concatenate `str` operands
    check_operands(runtime, BinaryOp::Add, left, right)?;
    Ok(runtime.number_add(left, right)?)
}

/// Subtract `right` from `left`
pub fn subtract<'rt, R>(
    runtime: &'rt R,
    left: PyHandle,
    right: PyHandle,
) -> HelperResult<PyRef<'rt, R>>
where
    R: HostRuntime + ?Sized,
{
    check_operands(runtime, BinaryOp::Sub, left, right)?;
    Ok(runtime.number_subtract(left, right)?)
}

/// Dispatch a binary operator to its helper
pub fn binary<'rt, R>(
    runtime: &'rt R,
    op: BinaryOp,
    left: PyHandle,
    right: PyHandle,
) -> HelperResult<PyRef<'rt, R>>
where
    R: HostRuntime + ?Sized,
{
    match op {
        BinaryOp::Add => add(runtime, left, right),
        BinaryOp::Sub => subtract(runtime, left, right),
    }
}

fn check_operands<R>(runtime: &R, op: BinaryOp, left: PyHandle, right: PyHandle) -> HelperResult<()>
where
    R: HostRuntime + ?Sized,
{
    let left_integral = runtime.is_integral(left)?;
    let right_integral = runtime.is_integral(right)?;
    if left_integral && right_integral {
        return Ok(());
    }

    let left_type = runtime.type_name(left)?;
    let right_type = runtime.type_name(right)?;
    debug!(%op, left_type, right_type, "unsupported operand types");
    Err(HelperError::unsupported_operand(op, left_type, right_type))
}
