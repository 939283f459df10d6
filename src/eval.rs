//! Tree-walking evaluator over runtime handles
//!
//! Every value is a handle in a [`Runtime`]. Arithmetic and printing go
//! through the runtime helpers, so the evaluator exercises exactly the code
//! that compiled programs call.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::rc::Rc;

use pyc_runtime::{HostRuntime, PyHandle, PyRef, Runtime, arithmetic, builtins};
use tracing::{debug, trace, warn};

use crate::ast::*;
use crate::builtins::Builtin;
use crate::errors::{EvalError, EvalResult};

/// Nested calls deeper than this raise `RecursionError`
pub const MAX_CALL_DEPTH: usize = 200;

type Value<'rt> = PyRef<'rt, Runtime>;

/// A `def` that has executed, with the names its body binds
struct Function {
    definition: FunctionDefinition,
    /// Parameters and every assigned name
    locals: HashSet<Identifier>,
    /// Names of the `def`s directly inside the body
    functions: HashSet<Identifier>,
    /// Defined inside another function; such a function sees its own name
    nested: bool,
}

impl Function {
    fn new(definition: &FunctionDefinition, nested: bool) -> Self {
        let bindings = Bindings::of(&definition.body);
        let locals = definition
            .parameters
            .iter()
            .chain(bindings.assigned.iter().copied())
            .cloned()
            .collect();
        let functions = bindings
            .functions
            .iter()
            .map(|(def, _)| def.name.clone())
            .collect();
        Self {
            definition: definition.clone(),
            locals,
            functions,
            nested,
        }
    }

    fn name(&self) -> &str {
        &self.definition.name
    }
}

#[derive(Default)]
struct Frame<'rt> {
    locals: HashMap<Identifier, Value<'rt>>,
    functions: HashMap<Identifier, Rc<Function>>,
    /// The function this frame executes; `None` for module code
    owner: Option<Rc<Function>>,
}

enum Flow<'rt> {
    Normal,
    Return(Value<'rt>),
}

enum Callee {
    Function(Rc<Function>),
    Builtin(Builtin),
}

pub struct Interpreter<'rt, W> {
    runtime: &'rt Runtime,
    out: W,
    globals: Frame<'rt>,
    depth: usize,
}

impl<'rt, W: Write> Interpreter<'rt, W> {
    pub fn new(runtime: &'rt Runtime, out: W) -> Self {
        Self {
            runtime,
            out,
            globals: Frame::default(),
            depth: 0,
        }
    }

    /// Execute a module, then its `main()` if it defines one.
    ///
    /// Returns the exit code: `main()`'s result when that is an int, else 0.
    pub fn run(&mut self, module: &Module) -> EvalResult<i32> {
        if let Flow::Return(_) = self.exec_block(&module.body, &mut None)? {
            warn!("'return' outside function");
        }

        let Some(main) = self.globals.functions.get("main").cloned() else {
            return Ok(0);
        };
        let result = self.call_function(main, Vec::new())?;
        Ok(exit_code(self.runtime, result.handle()))
    }

    /// A module-level variable, if bound
    pub fn global(&self, name: &str) -> Option<PyHandle> {
        self.globals.locals.get(name).map(PyRef::handle)
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn scope<'s>(&'s mut self, frame: &'s mut Option<Frame<'rt>>) -> &'s mut Frame<'rt> {
        match frame {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }

    fn exec_block(&mut self, block: &Block, frame: &mut Option<Frame<'rt>>) -> EvalResult<Flow<'rt>> {
        for statement in block {
            if let Flow::Return(value) = self.exec(statement, frame)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(
        &mut self,
        (statement, span): &Spanned<Statement>,
        frame: &mut Option<Frame<'rt>>,
    ) -> EvalResult<Flow<'rt>> {
        trace!(%span, "exec");
        match statement {
            Statement::Assign(assign) => {
                let value = self.eval(&assign.value, frame)?;
                self.scope(frame).locals.insert(assign.target.clone(), value);
            }
            Statement::FunctionDef(def) => {
                let function = Rc::new(Function::new(def, frame.is_some()));
                self.scope(frame).functions.insert(def.name.clone(), function);
            }
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value, frame)?,
                    None => self.runtime.none(),
                };
                return Ok(Flow::Return(value));
            }
            Statement::If(stmt) => {
                let runtime = self.runtime;
                let condition = self.eval(&stmt.condition, frame)?;
                let branch = if runtime.is_true(condition.handle())? {
                    &stmt.body
                } else {
                    &stmt.orelse
                };
                drop(condition);
                return self.exec_block(branch, frame);
            }
            Statement::Expression(expr) => {
                self.eval(expr, frame)?;
            }
            Statement::Pass => {}
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, (expr, _): &Spanned<Expr>, frame: &mut Option<Frame<'rt>>) -> EvalResult<Value<'rt>> {
        let runtime = self.runtime;
        Ok(match expr {
            Expr::Int(value) => runtime.new_int(value.clone()),
            Expr::Str(value) => runtime.new_str(value.as_str()),
            Expr::Bool(value) => runtime.new_bool(*value),
            Expr::None => runtime.none(),
            Expr::Name(name) => self.lookup(name, frame)?.clone(),
            Expr::Binary(binary) => {
                let left = self.eval(&binary.left, frame)?;
                let right = self.eval(&binary.right, frame)?;
                arithmetic::binary(runtime, binary.operator, left.handle(), right.handle())?
            }
            Expr::BoolOp(bool_op) => self.eval_bool_op(bool_op, frame)?,
            Expr::Compare(compare) => self.eval_compare(compare, frame)?,
            Expr::Call(call) => self.eval_call(call, frame)?,
        })
    }

    fn eval_bool_op(
        &mut self,
        expr: &BoolExpression,
        frame: &mut Option<Frame<'rt>>,
    ) -> EvalResult<Value<'rt>> {
        let runtime = self.runtime;
        let mut values = expr.values.iter();
        let mut current = match values.next() {
            Some(first) => self.eval(first, frame)?,
            None => return Ok(runtime.none()),
        };

        for value in values {
            let truth = runtime.is_true(current.handle())?;
            let decided = match expr.operator {
                BoolOperator::Or => truth,
                BoolOperator::And => !truth,
            };
            if decided {
                return Ok(current);
            }
            current = self.eval(value, frame)?;
        }
        Ok(current)
    }

    fn eval_compare(
        &mut self,
        expr: &CompareExpression,
        frame: &mut Option<Frame<'rt>>,
    ) -> EvalResult<Value<'rt>> {
        let runtime = self.runtime;
        let mut left = self.eval(&expr.left, frame)?;
        let mut result = None;

        for (op, right) in &expr.comparisons {
            let right = self.eval(right, frame)?;
            let comparison = runtime.rich_compare(left.handle(), right.handle(), *op)?;
            if !runtime.is_true(comparison.handle())? {
                return Ok(comparison);
            }
            result = Some(comparison);
            left = right;
        }

        Ok(result.unwrap_or(left))
    }

    fn eval_call(
        &mut self,
        call: &CallExpression,
        frame: &mut Option<Frame<'rt>>,
    ) -> EvalResult<Value<'rt>> {
        let callee = self.callee(&call.function, frame)?;
        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.eval(argument, frame))
            .collect::<EvalResult<Vec<_>>>()?;

        match callee {
            Callee::Function(function) => self.call_function(function, arguments),
            Callee::Builtin(builtin) => self.call_builtin(builtin, arguments),
        }
    }

    fn call_function(
        &mut self,
        function: Rc<Function>,
        arguments: Vec<Value<'rt>>,
    ) -> EvalResult<Value<'rt>> {
        let def = &function.definition;
        if arguments.len() != def.parameters.len() {
            return Err(EvalError::Arity {
                function: def.name.clone(),
                expected: def.parameters.len(),
                given: arguments.len(),
            });
        }
        if self.depth >= MAX_CALL_DEPTH {
            return Err(EvalError::RecursionLimit);
        }

        debug!(function = %def.name, depth = self.depth, "call");
        let mut frame = Some(Frame {
            locals: def.parameters.iter().cloned().zip(arguments).collect(),
            functions: HashMap::new(),
            owner: Some(Rc::clone(&function)),
        });

        self.depth += 1;
        let flow = self.exec_block(&def.body, &mut frame);
        self.depth -= 1;

        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(self.runtime.none()),
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, arguments: Vec<Value<'rt>>) -> EvalResult<Value<'rt>> {
        if arguments.len() != builtin.arity() {
            return Err(EvalError::Arity {
                function: builtin.name().to_owned(),
                expected: builtin.arity(),
                given: arguments.len(),
            });
        }

        match builtin {
            Builtin::Print => {
                let value = arguments[0].handle();
                let none = builtins::print_to(self.runtime, value, &mut self.out)?;
                Ok(none)
            }
        }
    }

    fn lookup<'s>(&'s self, name: &str, frame: &'s Option<Frame<'rt>>) -> EvalResult<&'s Value<'rt>> {
        if let Some(frame) = frame {
            if let Some(value) = frame.locals.get(name) {
                return Ok(value);
            }
            if frame.owner.as_ref().is_some_and(|owner| owner.locals.contains(name)) {
                return Err(EvalError::UnboundLocal(name.to_owned()));
            }
        }
        self.globals
            .locals
            .get(name)
            .ok_or_else(|| EvalError::UndefinedName(name.to_owned()))
    }

    fn callee(&self, name: &str, frame: &Option<Frame<'rt>>) -> EvalResult<Callee> {
        if let Some(frame) = frame {
            if let Some(function) = frame.functions.get(name) {
                return Ok(Callee::Function(Rc::clone(function)));
            }
            if let Some(owner) = &frame.owner {
                if owner.functions.contains(name) {
                    return Err(EvalError::UnboundLocal(name.to_owned()));
                }
                if owner.nested && owner.name() == name {
                    return Ok(Callee::Function(Rc::clone(owner)));
                }
                if owner.locals.contains(name) {
                    return Err(match frame.locals.get(name) {
                        Some(value) => self.not_callable(value),
                        None => EvalError::UnboundLocal(name.to_owned()),
                    });
                }
            }
        }

        if let Some(function) = self.globals.functions.get(name) {
            return Ok(Callee::Function(Rc::clone(function)));
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Ok(Callee::Builtin(builtin));
        }
        Err(match self.globals.locals.get(name) {
            Some(value) => self.not_callable(value),
            None => EvalError::UndefinedName(name.to_owned()),
        })
    }

    fn not_callable(&self, value: &Value<'rt>) -> EvalError {
        match self.runtime.type_name(value.handle()) {
            Ok(type_name) => EvalError::NotCallable { type_name },
            Err(error) => error.into(),
        }
    }
}

fn exit_code(runtime: &Runtime, handle: PyHandle) -> i32 {
    runtime
        .with_value(handle, |value| value.as_integral())
        .ok()
        .flatten()
        .and_then(|n| i64::try_from(n).ok())
        .map(|n| n as i32)
        .unwrap_or(0)
}

/// Parse-free entry point: run a module on a fresh runtime, printing to `out`
pub fn run_module<W: Write>(runtime: &Runtime, module: &Module, out: W) -> EvalResult<i32> {
    Interpreter::new(runtime, out).run(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pyc_runtime::{PyValue, RefConvention};

    fn run_source(source: &str) -> (EvalResult<i32>, String) {
        let runtime = Runtime::new();
        let module = parse(source).unwrap();
        let mut out = Vec::new();
        let result = run_module(&runtime, &module, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_print_arithmetic() {
        let (result, out) = run_source("print(3 + 4)\nprint(10 - 15)\nprint(True + 2)\n");
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "7\n-5\n3\n");
    }

    #[test]
    fn test_main_result_is_exit_code() {
        let source = "def main():\n    x = 40\n    return x + 2\n";
        let (result, out) = run_source(source);
        assert_eq!(result.unwrap(), 42);
        assert!(out.is_empty());
    }

    #[test]
    fn test_functions_and_globals() {
        let source = "\
base = 100

def offset(a, b):
    return base + a - b

def main():
    print(offset(5, 2))
    return 0
";
        let (result, out) = run_source(source);
        assert_eq!(result.unwrap(), 0);
        assert_eq!(out, "103\n");
    }

    #[test]
    fn test_recursion_with_if() {
        let source = "\
def count(n):
    if n == 0:
        return 0
    return 1 + count(n - 1)

print(count(25))
";
        let (result, out) = run_source(source);
        assert!(result.is_ok());
        assert_eq!(out, "25\n");
    }

    #[test]
    fn test_elif_else() {
        let source = "\
def classify(n):
    if n == 0:
        return 'zero'
    elif n == 1:
        return 'one'
    else:
        return 'many'

print(classify(0))
print(classify(1))
print(classify(7))
";
        let (_, out) = run_source(source);
        assert_eq!(out, "zero\none\nmany\n");
    }

    #[test]
    fn test_or_and_short_circuit() {
        let source = "\
print(0 or 5)
print(3 or undefined_name)
print(0 and undefined_name)
print(2 and 'yes')
print(None or False or 'last')
";
        let (result, out) = run_source(source);
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(out, "5\n3\n0\nyes\nlast\n");
    }

    #[test]
    fn test_comparison_chain() {
        let (_, out) = run_source("print(1 == 1 != 2)\nprint(1 == 2 != 3)\nprint('a' != 'a')\n");
        assert_eq!(out, "True\nFalse\nFalse\n");
    }

    #[test]
    fn test_function_without_return_gives_none() {
        let (_, out) = run_source("def f():\n    pass\n\nprint(f())\n");
        assert_eq!(out, "None\n");
    }

    #[test]
    fn test_big_integers() {
        let source = "print(9223372036854775807 + 9223372036854775807)\nprint(-9223372036854775808 - 1)\n";
        let (_, out) = run_source(source);
        assert_eq!(out, "18446744073709551614\n-9223372036854775809\n");
    }

    #[test]
    fn test_type_error_from_helper() {
        let (result, out) = run_source("print(1)\nprint(5 + 'text')\nprint(2)\n");
        let err = result.unwrap_err();
        assert_eq!(err.exception_name(), "TypeError");
        assert_eq!(
            err.to_string(),
            "unsupported operand type(s) for +: 'int' and 'str'"
        );
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_name_and_call_errors() {
        let (result, _) = run_source("print(missing)\n");
        assert!(matches!(result, Err(EvalError::UndefinedName(ref name)) if name == "missing"));

        let (result, _) = run_source("x = 1\nx()\n");
        assert!(matches!(result, Err(EvalError::NotCallable { type_name: "int" })));

        let (result, _) = run_source("def f(a):\n    return a\n\nf(1, 2)\n");
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "f() takes 1 positional argument(s) but 2 were given");

        let (result, _) = run_source("print(1, 2)\n");
        assert!(matches!(result, Err(EvalError::Arity { .. })));
    }

    #[test]
    fn test_def_binds_when_executed() {
        let (result, _) = run_source("if False:\n    def main():\n        return 3\n");
        assert_eq!(result.unwrap(), 0);

        let source = "\
def f():
    return 1

print(f())

def f():
    return 2

print(f())
";
        let (result, out) = run_source(source);
        assert!(result.is_ok());
        assert_eq!(out, "1\n2\n");

        let (result, _) = run_source("g()\ndef g():\n    pass\n");
        assert!(matches!(result, Err(EvalError::UndefinedName(ref name)) if name == "g"));
    }

    #[test]
    fn test_main_with_parameters_is_a_type_error() {
        let (result, _) = run_source("def main(argv):\n    return 0\n");
        let err = result.unwrap_err();
        assert_eq!(err.exception_name(), "TypeError");
        assert_eq!(err.to_string(), "main() takes 1 positional argument(s) but 0 were given");
    }

    #[test]
    fn test_assignment_makes_name_local() {
        let source = "\
x = 1

def f():
    print(x)
    x = 2

f()
";
        let (result, out) = run_source(source);
        let err = result.unwrap_err();
        assert_eq!(err.exception_name(), "UnboundLocalError");
        assert!(matches!(err, EvalError::UnboundLocal(ref name) if name == "x"));
        assert!(out.is_empty());

        let (result, out) = run_source("def f(flag):\n    if flag:\n        y = 1\n    return y\n\nprint(f(True))\nf(False)\n");
        assert!(matches!(result, Err(EvalError::UnboundLocal(ref name)) if name == "y"));
        assert_eq!(out, "1\n");
    }

    #[test]
    fn test_local_def_called_before_definition() {
        let source = "\
def helper():
    return 0

def f():
    helper()
    def helper():
        return 1
    return helper()

f()
";
        let (result, _) = run_source(source);
        assert!(matches!(result, Err(EvalError::UnboundLocal(ref name)) if name == "helper"));
    }

    #[test]
    fn test_nested_function_sees_its_own_name() {
        let source = "\
def outer(n):
    def countdown(k):
        if k == 0:
            return 'done'
        return countdown(k - 1)
    return countdown(n)

print(outer(5))
";
        let (result, out) = run_source(source);
        assert!(result.is_ok(), "{result:?}");
        assert_eq!(out, "done\n");
    }

    #[test]
    fn test_recursion_limit() {
        let (result, _) = run_source("def f():\n    return f()\n\nf()\n");
        assert!(matches!(result, Err(EvalError::RecursionLimit)));
    }

    #[test]
    fn test_run_releases_every_value() {
        for convention in [RefConvention::NewReference, RefConvention::Borrowed] {
            let runtime = Runtime::with_convention(convention);
            let module = parse(
                "x = 1\ny = 'two'\ndef f(a):\n    print(a)\n    return a + 1\n\nz = f(x) + f(2)\nprint(None)\n",
            )
            .unwrap();
            {
                let mut interpreter = Interpreter::new(&runtime, Vec::new());
                interpreter.run(&module).unwrap();
                let z = interpreter.global("z").unwrap();
                assert_eq!(runtime.value(z).unwrap(), PyValue::int(5));
                let out = interpreter.into_output();
                assert_eq!(out, b"1\n2\nNone\n");
            }
            assert_eq!(runtime.live_count(), 0);
            assert_eq!(runtime.ref_count(PyHandle::NONE), 1);
        }
    }
}
