//! Error types for the pyc front end

use std::path::PathBuf;

use derive_more::{Display, Error, From};
use pyc_runtime::{HelperError, HostError};

use crate::ast::Span;

pub type ParseResult<T> = Result<T, ParseError>;
pub type EvalResult<T> = Result<T, EvalError>;
pub type CodegenResult<T> = Result<T, CodegenError>;
pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Display, Debug, Error)]
pub enum ParseError {
    #[display("failed to load the Python grammar: {_0}")]
    Language(#[error(source)] tree_sitter::LanguageError),

    #[display("parser produced no syntax tree")]
    NoTree,

    #[display("invalid syntax at {_0}")]
    Syntax(#[error(not(source))] Span),

    #[display("unsupported statement `{kind}` at {span}")]
    UnsupportedStatement { kind: String, span: Span },

    #[display("unsupported expression `{kind}` at {span}")]
    UnsupportedExpression { kind: String, span: Span },

    #[display("invalid literal `{text}` at {span}")]
    InvalidLiteral { text: String, span: Span },
}

impl ParseError {
    pub(crate) fn unsupported_statement(kind: &str, span: Span) -> Self {
        ParseError::UnsupportedStatement {
            kind: kind.to_owned(),
            span,
        }
    }

    pub(crate) fn unsupported_expression(kind: &str, span: Span) -> Self {
        ParseError::UnsupportedExpression {
            kind: kind.to_owned(),
            span,
        }
    }
}

impl From<tree_sitter::LanguageError> for ParseError {
    fn from(error: tree_sitter::LanguageError) -> Self {
        ParseError::Language(error)
    }
}

/// Runtime failures while evaluating a program
#[derive(Display, Debug, Error, From)]
pub enum EvalError {
    #[display("name '{_0}' is not defined")]
    UndefinedName(#[error(not(source))] String),

    /// A function-local name read before anything was assigned to it
    #[display("cannot access local variable '{_0}' where it is not associated with a value")]
    UnboundLocal(#[error(not(source))] String),

    #[display("'{type_name}' object is not callable")]
    NotCallable { type_name: &'static str },

    #[display("{function}() takes {expected} positional argument(s) but {given} were given")]
    Arity {
        function: String,
        expected: usize,
        given: usize,
    },

    #[display("maximum recursion depth exceeded")]
    RecursionLimit,

    #[display("{_0}")]
    #[from]
    Helper(#[error(source)] HelperError),
}

impl From<HostError> for EvalError {
    fn from(error: HostError) -> Self {
        EvalError::Helper(HelperError::Host(error))
    }
}

impl EvalError {
    /// Name of the exception a Python program would observe
    pub fn exception_name(&self) -> &'static str {
        match self {
            EvalError::UndefinedName(_) => "NameError",
            EvalError::UnboundLocal(_) => "UnboundLocalError",
            EvalError::NotCallable { .. } | EvalError::Arity { .. } => "TypeError",
            EvalError::RecursionLimit => "RecursionError",
            EvalError::Helper(e) => e.exception_name(),
        }
    }
}

#[derive(Display, Debug, Error)]
pub enum CodegenError {
    #[display("name '{name}' is not defined at {span}")]
    UndefinedName { name: String, span: Span },

    #[display("'{name}' is not a function at {span}")]
    NotAFunction { name: String, span: Span },

    #[display("function '{name}' cannot be used as a value at {span}")]
    FunctionValue { name: String, span: Span },
}

/// Failures turning emitted C into an executable
#[derive(Display, Debug, Error, From)]
pub enum BuildError {
    #[display("I/O error while building: {_0}")]
    #[from]
    Io(#[error(source)] std::io::Error),

    #[display("could not find libpyc_runtime.a; set PYC_RUNTIME_LIB or pass --runtime")]
    RuntimeNotFound,

    #[display("failed to start C compiler `{compiler}`: {source}")]
    CompilerUnavailable {
        compiler: String,
        source: std::io::Error,
    },

    #[display("C compiler `{compiler}` failed ({status}) building {}:\n{stderr}", output.display())]
    CompilerFailed {
        compiler: String,
        status: std::process::ExitStatus,
        output: PathBuf,
        stderr: String,
    },
}

/// Anything the command-line driver can fail with
#[derive(Display, Debug, Error, From)]
pub enum PycError {
    #[display("{_0}")]
    Io(#[error(source)] std::io::Error),

    #[display("{_0}")]
    Parse(#[error(source)] ParseError),

    #[display("{}: {_0}", _0.exception_name())]
    Eval(#[error(source)] EvalError),

    #[display("{_0}")]
    Codegen(#[error(source)] CodegenError),

    #[display("{_0}")]
    Build(#[error(source)] BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_eval_errors_render_as_python_exceptions() {
        let err = PycError::from(EvalError::UnboundLocal("x".to_owned()));
        assert_eq!(
            err.to_string(),
            "UnboundLocalError: cannot access local variable 'x' where it is not associated with a value"
        );
        let err = PycError::from(EvalError::UndefinedName("y".to_owned()));
        assert_eq!(err.to_string(), "NameError: name 'y' is not defined");
    }

    #[test]
    fn test_sources_are_chained() {
        let err = PycError::from(EvalError::from(HostError::InvalidHandle(
            pyc_runtime::PyHandle::INVALID,
        )));
        let eval = err.source().unwrap();
        let helper = eval.source().unwrap();
        assert_eq!(helper.source().unwrap().to_string(), "invalid handle: #0");

        assert!(ParseError::Syntax(Span::new(0, 1, 1)).source().is_none());
        assert!(EvalError::RecursionLimit.source().is_none());
    }
}
