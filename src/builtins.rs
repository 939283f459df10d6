//! Built-in functions available to pyc programs without a definition.
//!
//! Each builtin maps to a runtime helper; the evaluator calls the helper
//! directly and the C emitter calls its exported symbol.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
}

const BUILTINS: &[(&str, Builtin)] = &[("print", Builtin::Print)];

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        BUILTINS
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|&(_, builtin)| builtin)
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
        }
    }

    /// Number of positional arguments the builtin takes
    pub fn arity(self) -> usize {
        match self {
            Builtin::Print => 1,
        }
    }

    /// Symbol exported by the runtime's C ABI
    pub fn c_symbol(self) -> &'static str {
        match self {
            Builtin::Print => "pyc_print",
        }
    }
}
