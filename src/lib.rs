//! pyc: a compiler and runner for a small Python subset.
//!
//! Source is parsed with tree-sitter into [`ast::Module`], then either
//! evaluated directly on a [`pyc_runtime::Runtime`] or lowered to C that links
//! against the same runtime.

pub mod ast;
pub mod build;
pub mod builtins;
pub mod codegen;
pub mod errors;
pub mod eval;
pub mod parser;

pub use crate::build::{BuildOptions, build_executable};
pub use crate::codegen::{CEmitter, emit_c};
pub use crate::errors::{BuildError, CodegenError, EvalError, ParseError, PycError};
pub use crate::eval::{Interpreter, run_module};
pub use crate::parser::{PythonParser, parse};
