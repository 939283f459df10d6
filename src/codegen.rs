//! C source emission
//!
//! Lowers a module to one C translation unit that links against the
//! `pyc-runtime` static library. Every value is a `PycHandle`, all arithmetic
//! and printing goes through the runtime's exported helpers, and a failing
//! helper ends the process with the runtime's error message.
//!
//! Function bodies are hoisted to file scope, but a name is bound to a body
//! only when its `def` statement runs: every scope keeps an `int` slot per
//! function name recording which definition is current, and calls dispatch
//! on it. A nested `def` sees its own locals, its own nested functions, its
//! own name and the module's names, but not the enclosing function's locals.
//!
//! Reads of names that may be unbound are checked at run time and raise the
//! same `NameError`/`UnboundLocalError` the evaluator reports.

use std::collections::HashMap;

use num_bigint::BigInt;
use pyc_runtime::{BinaryOp, CompareOp, RefConvention};
use tracing::{debug, warn};

use crate::ast::*;
use crate::builtins::Builtin;
use crate::errors::{CodegenError, CodegenResult, EvalError, PycError};

const INDENT: &str = "    ";

const PRELUDE: &str = r#"/* Generated by pyc. Link against the pyc_runtime library. */
#include <stdbool.h>
#include <stddef.h>
#include <stdint.h>
#include <stdio.h>
#include <stdlib.h>

typedef uint64_t PycHandle;
typedef struct PycRuntime PycRuntime;
typedef struct {
    uint8_t status;
    PycHandle handle;
} PycResult;

PycRuntime *pyc_runtime_new(uint8_t convention);
void pyc_runtime_destroy(PycRuntime *rt);
PycHandle pyc_int_from_i64(const PycRuntime *rt, int64_t value);
PycHandle pyc_int_from_str(const PycRuntime *rt, const char *data, size_t length);
PycHandle pyc_str_from_utf8(const PycRuntime *rt, const char *data, size_t length);
PycHandle pyc_bool(const PycRuntime *rt, bool value);
PycHandle pyc_none(const PycRuntime *rt);
int32_t pyc_is_true(const PycRuntime *rt, PycHandle handle);
bool pyc_as_i64(const PycRuntime *rt, PycHandle handle, int64_t *out);
PycResult pyc_add(const PycRuntime *rt, PycHandle left, PycHandle right);
PycResult pyc_sub(const PycRuntime *rt, PycHandle left, PycHandle right);
PycResult pyc_compare(const PycRuntime *rt, PycHandle left, PycHandle right, uint8_t op);
PycResult pyc_print(const PycRuntime *rt, PycHandle value);
size_t pyc_last_error(const PycRuntime *rt, char *buffer, size_t buffer_size);

static PycRuntime *pyc_rt;

static void pyc_fail(void) {
    char message[512];
    size_t length = pyc_last_error(pyc_rt, message, sizeof message);
    if (length == 0) {
        fputs("SystemError: invalid handle\n", stderr);
    } else {
        if (length > sizeof message) {
            length = sizeof message;
        }
        fprintf(stderr, "%.*s\n", (int)length, message);
    }
    pyc_runtime_destroy(pyc_rt);
    exit(1);
}

static PycHandle pyc_check(PycResult result) {
    if (result.status != 0) {
        pyc_fail();
    }
    return result.handle;
}

static void pyc_raise(const char *message) {
    fprintf(stderr, "%s\n", message);
    pyc_runtime_destroy(pyc_rt);
    exit(1);
}

static PycHandle pyc_load(PycHandle handle, const char *message) {
    if (handle == 0) {
        pyc_raise(message);
    }
    return handle;
}

static bool pyc_truthy(PycHandle handle) {
    int32_t truth = pyc_is_true(pyc_rt, handle);
    if (truth < 0) {
        pyc_fail();
    }
    return truth != 0;
}
"#;

#[derive(Clone, Debug)]
struct FunctionSymbol {
    c_name: String,
    arity: usize,
}

#[derive(Clone, Debug)]
struct Variable {
    c_name: String,
    /// Raised when the variable is read while unbound; parameters never are
    unbound: Option<String>,
}

/// How a scope binds a function name
#[derive(Clone, Debug)]
enum FunctionBinding {
    /// A nested function's own name inside its body
    Direct(FunctionSymbol),
    /// `slot` holds 0 until a `def` runs, then the 1-based index of that
    /// definition
    Slot {
        slot: String,
        definitions: Vec<FunctionSymbol>,
        unbound: String,
    },
}

#[derive(Default)]
struct Scope {
    variables: HashMap<Identifier, Variable>,
    functions: HashMap<Identifier, FunctionBinding>,
}

impl Scope {
    fn slots(&self) -> Vec<&str> {
        let mut slots: Vec<&str> = self
            .functions
            .values()
            .filter_map(|binding| match binding {
                FunctionBinding::Slot { slot, .. } => Some(slot.as_str()),
                FunctionBinding::Direct(_) => None,
            })
            .collect();
        slots.sort_by_key(|slot| slot_order(slot));
        slots
    }
}

enum Callee {
    Function {
        binding: FunctionBinding,
        /// Called when the slot is still empty
        fallback: Option<Builtin>,
    },
    Builtin(Builtin),
}

/// The message a program prints for `error`, `Kind: message`
fn runtime_error(error: EvalError) -> String {
    PycError::Eval(error).to_string()
}

fn arity_error(function: &str, expected: usize, given: usize) -> String {
    runtime_error(EvalError::Arity {
        function: function.to_owned(),
        expected,
        given,
    })
}

/// Counter suffix of a fresh name, so declarations come out in creation order
fn slot_order(name: &str) -> usize {
    name.rsplit('_')
        .next()
        .and_then(|suffix| suffix.parse().ok())
        .unwrap_or(0)
}

pub struct CEmitter {
    convention: RefConvention,
    counter: usize,
    indent: usize,
    out: String,
    module: Scope,
    /// The slot assignment each `def` statement performs, by statement span
    definitions: HashMap<Span, String>,
    prototypes: Vec<String>,
    functions: Vec<String>,
}

impl CEmitter {
    pub fn new(convention: RefConvention) -> Self {
        Self {
            convention,
            counter: 0,
            indent: 0,
            out: String::new(),
            module: Scope::default(),
            definitions: HashMap::new(),
            prototypes: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Translate a whole module into a C program
    pub fn emit(mut self, module: &Module) -> CodegenResult<String> {
        let bindings = Bindings::of(&module.body);

        let mut scope = Scope::default();
        let declared = self.declare_functions(&mut scope, &bindings, |name| {
            EvalError::UndefinedName(name.to_owned())
        });
        let mut globals = Vec::new();
        for &name in &bindings.assigned {
            let c_name = self.fresh(name);
            scope.variables.insert(
                name.clone(),
                Variable {
                    c_name: c_name.clone(),
                    unbound: Some(runtime_error(EvalError::UndefinedName(name.clone()))),
                },
            );
            globals.push(c_name);
        }
        let slots: Vec<String> = scope.slots().into_iter().map(str::to_owned).collect();
        self.module = scope;

        for (def, symbol) in &declared {
            self.emit_function(def, symbol, false)?;
        }

        self.line("static void pyc_module_init(void) {");
        self.indent += 1;
        self.emit_block(&module.body, None)?;
        self.indent -= 1;
        self.line("}");
        let init = std::mem::take(&mut self.out);

        let main = self.module.functions.get("main").cloned();
        self.emit_entry_point(main.as_ref());
        let entry = std::mem::take(&mut self.out);

        debug!(
            functions = self.functions.len(),
            globals = globals.len(),
            "emitted C module"
        );

        let mut program = String::from(PRELUDE);
        if !globals.is_empty() || !slots.is_empty() {
            program.push('\n');
            for global in &globals {
                program.push_str(&format!("static PycHandle {global} = 0;\n"));
            }
            for slot in &slots {
                program.push_str(&format!("static int {slot} = 0;\n"));
            }
        }
        if !self.prototypes.is_empty() {
            program.push('\n');
            for prototype in &self.prototypes {
                program.push_str(prototype);
                program.push('\n');
            }
        }
        for function in &self.functions {
            program.push('\n');
            program.push_str(function);
        }
        program.push('\n');
        program.push_str(&init);
        program.push('\n');
        program.push_str(&entry);
        Ok(program)
    }

    /// Give every `def` in `bindings` a C function and a slot in `scope`,
    /// and remember which slot value each `def` statement stores
    fn declare_functions<'a>(
        &mut self,
        scope: &mut Scope,
        bindings: &Bindings<'a>,
        unbound: impl Fn(&str) -> EvalError,
    ) -> Vec<(&'a FunctionDefinition, FunctionSymbol)> {
        let mut declared = Vec::new();
        for &(def, span) in &bindings.functions {
            let symbol = FunctionSymbol {
                c_name: self.fresh(&def.name),
                arity: def.parameters.len(),
            };
            if !scope.functions.contains_key(&def.name) {
                let slot = self.fresh(&format!("{}_slot", def.name));
                scope.functions.insert(
                    def.name.clone(),
                    FunctionBinding::Slot {
                        slot,
                        definitions: Vec::new(),
                        unbound: runtime_error(unbound(&def.name)),
                    },
                );
            }
            if let Some(FunctionBinding::Slot { slot, definitions, .. }) =
                scope.functions.get_mut(&def.name)
            {
                definitions.push(symbol.clone());
                self.definitions
                    .insert(span, format!("{slot} = {};", definitions.len()));
            }
            declared.push((def, symbol));
        }
        declared
    }

    fn emit_function(
        &mut self,
        def: &FunctionDefinition,
        symbol: &FunctionSymbol,
        nested: bool,
    ) -> CodegenResult<()> {
        let bindings = Bindings::of(&def.body);
        let mut scope = Scope::default();

        let mut parameters = Vec::new();
        for parameter in &def.parameters {
            let c_name = self.fresh(parameter);
            scope.variables.insert(
                parameter.clone(),
                Variable {
                    c_name: c_name.clone(),
                    unbound: None,
                },
            );
            parameters.push(format!("PycHandle {c_name}"));
        }
        let mut locals = Vec::new();
        for &name in &bindings.assigned {
            if !scope.variables.contains_key(name) {
                let c_name = self.fresh(name);
                scope.variables.insert(
                    name.clone(),
                    Variable {
                        c_name: c_name.clone(),
                        unbound: Some(runtime_error(EvalError::UnboundLocal(name.clone()))),
                    },
                );
                locals.push(c_name);
            }
        }

        let nested_functions = self.declare_functions(&mut scope, &bindings, |name| {
            EvalError::UnboundLocal(name.to_owned())
        });
        if nested && !scope.functions.contains_key(&def.name) {
            scope
                .functions
                .insert(def.name.clone(), FunctionBinding::Direct(symbol.clone()));
        }
        // Nested bodies are finished before this one starts writing
        for (nested_def, nested_symbol) in &nested_functions {
            self.emit_function(nested_def, nested_symbol, true)?;
        }

        let parameters = if parameters.is_empty() {
            "void".to_owned()
        } else {
            parameters.join(", ")
        };
        let signature = format!("static PycHandle {}({parameters})", symbol.c_name);
        self.prototypes.push(format!("{signature};"));

        self.line(&format!("{signature} {{"));
        self.indent += 1;
        for local in &locals {
            self.line(&format!("PycHandle {local} = 0;"));
        }
        for slot in scope.slots() {
            self.line(&format!("int {slot} = 0;"));
        }
        self.emit_block(&def.body, Some(&scope))?;
        self.line("return pyc_none(pyc_rt);");
        self.indent -= 1;
        self.line("}");

        self.functions.push(std::mem::take(&mut self.out));
        Ok(())
    }

    fn emit_entry_point(&mut self, main: Option<&FunctionBinding>) {
        self.line("int main(void) {");
        self.indent += 1;
        self.line(&format!(
            "pyc_rt = pyc_runtime_new({});",
            self.convention as u8
        ));
        self.line("if (pyc_rt == NULL) {");
        self.line(&format!("{INDENT}return 1;"));
        self.line("}");
        self.line("pyc_module_init();");
        self.line("int64_t status = 0;");
        if let Some(FunctionBinding::Slot { slot, definitions, .. }) = main {
            self.line(&format!("if ({slot} != 0) {{"));
            self.indent += 1;
            self.line("PycHandle result = 0;");
            self.emit_dispatch(slot, definitions, "main", "result", &[], None);
            self.line("if (!pyc_as_i64(pyc_rt, result, &status)) {");
            self.line(&format!("{INDENT}status = 0;"));
            self.line("}");
            self.indent -= 1;
            self.line("}");
        }
        self.line("pyc_runtime_destroy(pyc_rt);");
        self.line("return (int)status;");
        self.indent -= 1;
        self.line("}");
    }

    fn emit_block(&mut self, block: &Block, scope: Option<&Scope>) -> CodegenResult<()> {
        for statement in block {
            self.emit_statement(statement, scope)?;
        }
        Ok(())
    }

    fn emit_statement(
        &mut self,
        (statement, span): &Spanned<Statement>,
        scope: Option<&Scope>,
    ) -> CodegenResult<()> {
        match statement {
            Statement::Assign(assign) => {
                let value = self.emit_expr(&assign.value, scope)?;
                let target = self.variable(&assign.target, scope).ok_or_else(|| {
                    CodegenError::UndefinedName {
                        name: assign.target.clone(),
                        span: *span,
                    }
                })?;
                self.line(&format!("{} = {value};", target.c_name));
            }
            // The body was hoisted when the enclosing scope was declared
            Statement::FunctionDef(def) => match self.definitions.get(span).cloned() {
                Some(bind) => self.line(&bind),
                None => warn!(%span, name = %def.name, "definition without a slot"),
            },
            Statement::Return(value) => {
                let value = match value {
                    Some(value) => self.emit_expr(value, scope)?,
                    None => "pyc_none(pyc_rt)".to_owned(),
                };
                if scope.is_some() {
                    self.line(&format!("return {value};"));
                } else {
                    warn!(%span, "'return' outside function");
                    self.line("return;");
                }
            }
            Statement::If(stmt) => {
                let condition = self.emit_expr(&stmt.condition, scope)?;
                self.line(&format!("if (pyc_truthy({condition})) {{"));
                self.indent += 1;
                self.emit_block(&stmt.body, scope)?;
                self.indent -= 1;
                if !stmt.orelse.is_empty() {
                    self.line("} else {");
                    self.indent += 1;
                    self.emit_block(&stmt.orelse, scope)?;
                    self.indent -= 1;
                }
                self.line("}");
            }
            Statement::Expression(expr) => {
                self.emit_expr(expr, scope)?;
            }
            Statement::Pass => {}
        }
        Ok(())
    }

    /// Emit the statements computing `expr` and return the C expression
    /// naming its handle
    fn emit_expr(&mut self, (expr, span): &Spanned<Expr>, scope: Option<&Scope>) -> CodegenResult<String> {
        match expr {
            Expr::Int(value) => Ok(self.temp(&int_constructor(value))),
            Expr::Str(value) => Ok(self.temp(&format!(
                "pyc_str_from_utf8(pyc_rt, {}, {})",
                c_string_literal(value),
                value.len()
            ))),
            Expr::Bool(value) => Ok(self.temp(&format!("pyc_bool(pyc_rt, {value})"))),
            Expr::None => Ok(self.temp("pyc_none(pyc_rt)")),
            Expr::Name(name) => self.load(name, *span, scope),
            Expr::Binary(binary) => {
                let left = self.emit_expr(&binary.left, scope)?;
                let right = self.emit_expr(&binary.right, scope)?;
                let helper = match binary.operator {
                    BinaryOp::Add => "pyc_add",
                    BinaryOp::Sub => "pyc_sub",
                };
                Ok(self.temp(&format!("pyc_check({helper}(pyc_rt, {left}, {right}))")))
            }
            Expr::BoolOp(bool_op) => self.emit_bool_op(bool_op, scope),
            Expr::Compare(compare) => self.emit_compare(compare, scope),
            Expr::Call(call) => self.emit_call(call, *span, scope),
        }
    }

    fn emit_bool_op(&mut self, expr: &BoolExpression, scope: Option<&Scope>) -> CodegenResult<String> {
        let mut values = expr.values.iter();
        let Some(first) = values.next() else {
            return Ok(self.temp("pyc_none(pyc_rt)"));
        };
        let first = self.emit_expr(first, scope)?;
        let result = self.temp(&first);

        let mut depth = 0;
        for value in values {
            let test = match expr.operator {
                BoolOperator::Or => format!("if (!pyc_truthy({result})) {{"),
                BoolOperator::And => format!("if (pyc_truthy({result})) {{"),
            };
            self.line(&test);
            self.indent += 1;
            depth += 1;
            let value = self.emit_expr(value, scope)?;
            self.line(&format!("{result} = {value};"));
        }
        self.close_blocks(depth);
        Ok(result)
    }

    fn emit_compare(&mut self, expr: &CompareExpression, scope: Option<&Scope>) -> CodegenResult<String> {
        let mut left = self.emit_expr(&expr.left, scope)?;
        let result = self.fresh("t");
        self.line(&format!("PycHandle {result} = 0;"));

        let mut depth = 0;
        for (index, (op, right)) in expr.comparisons.iter().enumerate() {
            if index > 0 {
                self.line(&format!("if (pyc_truthy({result})) {{"));
                self.indent += 1;
                depth += 1;
            }
            let right = self.emit_expr(right, scope)?;
            self.line(&format!(
                "{result} = pyc_check(pyc_compare(pyc_rt, {left}, {right}, {}));",
                compare_code(*op)
            ));
            left = right;
        }
        self.close_blocks(depth);
        Ok(result)
    }

    /// The callee is resolved before the arguments are evaluated, and the
    /// arity is checked after, as the evaluator does
    fn emit_call(&mut self, call: &CallExpression, span: Span, scope: Option<&Scope>) -> CodegenResult<String> {
        let callee = self.callee(&call.function, span, scope)?;
        if let Callee::Function {
            binding: FunctionBinding::Slot { slot, unbound, .. },
            fallback: None,
        } = &callee
        {
            self.line(&format!("if ({slot} == 0) {{"));
            self.line(&format!("{INDENT}pyc_raise({});", c_string_literal(unbound)));
            self.line("}");
        }

        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.emit_expr(argument, scope))
            .collect::<CodegenResult<Vec<_>>>()?;
        let result = self.fresh("t");
        self.line(&format!("PycHandle {result} = 0;"));
        match callee {
            Callee::Function {
                binding: FunctionBinding::Direct(symbol),
                ..
            } => self.emit_invoke(&symbol, &call.function, &result, &arguments),
            Callee::Function {
                binding: FunctionBinding::Slot { slot, definitions, .. },
                fallback,
            } => self.emit_dispatch(&slot, &definitions, &call.function, &result, &arguments, fallback),
            Callee::Builtin(builtin) => self.emit_builtin(builtin, &result, &arguments),
        }
        Ok(result)
    }

    /// `switch` on a slot to the definition currently bound to `name`
    fn emit_dispatch(
        &mut self,
        slot: &str,
        definitions: &[FunctionSymbol],
        name: &str,
        result: &str,
        arguments: &[String],
        fallback: Option<Builtin>,
    ) {
        self.line(&format!("switch ({slot}) {{"));
        for (index, symbol) in definitions.iter().enumerate() {
            self.line(&format!("case {}:", index + 1));
            self.indent += 1;
            self.emit_invoke(symbol, name, result, arguments);
            self.line("break;");
            self.indent -= 1;
        }
        if let Some(builtin) = fallback {
            self.line("default:");
            self.indent += 1;
            self.emit_builtin(builtin, result, arguments);
            self.line("break;");
            self.indent -= 1;
        }
        self.line("}");
    }

    fn emit_invoke(&mut self, symbol: &FunctionSymbol, name: &str, result: &str, arguments: &[String]) {
        if arguments.len() == symbol.arity {
            self.line(&format!("{result} = {}({});", symbol.c_name, arguments.join(", ")));
        } else {
            let message = arity_error(name, symbol.arity, arguments.len());
            self.line(&format!("pyc_raise({});", c_string_literal(&message)));
        }
    }

    fn emit_builtin(&mut self, builtin: Builtin, result: &str, arguments: &[String]) {
        if arguments.len() == builtin.arity() {
            self.line(&format!(
                "{result} = pyc_check({}(pyc_rt, {}));",
                builtin.c_symbol(),
                arguments.join(", ")
            ));
        } else {
            let message = arity_error(builtin.name(), builtin.arity(), arguments.len());
            self.line(&format!("pyc_raise({});", c_string_literal(&message)));
        }
    }

    fn load(&mut self, name: &str, span: Span, scope: Option<&Scope>) -> CodegenResult<String> {
        if let Some(variable) = self.variable(name, scope) {
            return Ok(match variable.unbound {
                Some(message) => self.temp(&format!(
                    "pyc_load({}, {})",
                    variable.c_name,
                    c_string_literal(&message)
                )),
                None => variable.c_name,
            });
        }
        if self.function(name, scope).is_some() || Builtin::lookup(name).is_some() {
            return Err(CodegenError::FunctionValue {
                name: name.to_owned(),
                span,
            });
        }
        Err(CodegenError::UndefinedName {
            name: name.to_owned(),
            span,
        })
    }

    fn callee(&self, name: &str, span: Span, scope: Option<&Scope>) -> CodegenResult<Callee> {
        if let Some(scope) = scope {
            if let Some(binding) = scope.functions.get(name) {
                return Ok(Callee::Function {
                    binding: binding.clone(),
                    fallback: None,
                });
            }
            if scope.variables.contains_key(name) {
                return Err(CodegenError::NotAFunction {
                    name: name.to_owned(),
                    span,
                });
            }
        }
        if let Some(binding) = self.module.functions.get(name) {
            return Ok(Callee::Function {
                binding: binding.clone(),
                fallback: Builtin::lookup(name),
            });
        }
        if let Some(builtin) = Builtin::lookup(name) {
            return Ok(Callee::Builtin(builtin));
        }
        if self.module.variables.contains_key(name) {
            return Err(CodegenError::NotAFunction {
                name: name.to_owned(),
                span,
            });
        }
        Err(CodegenError::UndefinedName {
            name: name.to_owned(),
            span,
        })
    }

    fn variable(&self, name: &str, scope: Option<&Scope>) -> Option<Variable> {
        scope
            .and_then(|scope| scope.variables.get(name))
            .or_else(|| self.module.variables.get(name))
            .cloned()
    }

    fn function<'a>(&'a self, name: &str, scope: Option<&'a Scope>) -> Option<&'a FunctionBinding> {
        scope
            .and_then(|scope| scope.functions.get(name))
            .or_else(|| self.module.functions.get(name))
    }

    fn fresh(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{}_{}", c_identifier(prefix), self.counter)
    }

    /// Declare a temporary initialised to `init` and return its name
    fn temp(&mut self, init: &str) -> String {
        let name = self.fresh("t");
        self.line(&format!("PycHandle {name} = {init};"));
        name
    }

    fn close_blocks(&mut self, depth: usize) {
        for _ in 0..depth {
            self.indent -= 1;
            self.line("}");
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

/// Translate a module into a C program using the given reference convention
pub fn emit_c(module: &Module, convention: RefConvention) -> CodegenResult<String> {
    CEmitter::new(convention).emit(module)
}

fn compare_code(op: CompareOp) -> u8 {
    match op {
        CompareOp::Eq => 0,
        CompareOp::Ne => 1,
    }
}

fn int_constructor(value: &BigInt) -> String {
    match i64::try_from(value) {
        // INT64_MIN has no literal spelling in C
        Ok(small) if small != i64::MIN => format!("pyc_int_from_i64(pyc_rt, INT64_C({small}))"),
        _ => {
            let digits = value.to_string();
            format!("pyc_int_from_str(pyc_rt, \"{digits}\", {})", digits.len())
        }
    }
}

fn c_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn c_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for byte in value.bytes() {
        match byte {
            b'"' => literal.push_str("\\\""),
            b'\\' => literal.push_str("\\\\"),
            b'?' => literal.push_str("\\?"),
            b'\n' => literal.push_str("\\n"),
            b'\r' => literal.push_str("\\r"),
            b'\t' => literal.push_str("\\t"),
            0x20..=0x7e => literal.push(char::from(byte)),
            _ => literal.push_str(&format!("\\{byte:03o}")),
        }
    }
    literal.push('"');
    literal
}
