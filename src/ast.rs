//! Syntax tree for the Python subset pyc understands

use std::fmt;

use num_bigint::BigInt;
use pyc_runtime::{BinaryOp, CompareOp};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    /// 1-based line of `start`
    pub line: usize,
}

impl Span {
    pub const fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}", self.line)
    }
}

pub type Spanned<T> = (T, Span);

pub type Identifier = String;

pub type Block = Vec<Spanned<Statement>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    Assign(Assignment),
    FunctionDef(FunctionDefinition),
    Return(Option<Spanned<Expr>>),
    If(IfStatement),
    Expression(Spanned<Expr>),
    Pass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub target: Identifier,
    pub value: Spanned<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionDefinition {
    pub name: Identifier,
    pub parameters: Vec<Identifier>,
    pub body: Block,
}

/// `if`/`elif`/`else`; an `elif` becomes a nested `If` in `orelse`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IfStatement {
    pub condition: Spanned<Expr>,
    pub body: Block,
    pub orelse: Block,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Int(BigInt),
    Str(String),
    Bool(bool),
    None,
    Name(Identifier),
    Binary(BinaryExpression),
    BoolOp(BoolExpression),
    Compare(CompareExpression),
    Call(CallExpression),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinaryExpression {
    pub left: Box<Spanned<Expr>>,
    pub operator: BinaryOp,
    pub right: Box<Spanned<Expr>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoolOperator {
    And,
    Or,
}

/// `a or b or c`, flattened
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolExpression {
    pub operator: BoolOperator,
    pub values: Vec<Spanned<Expr>>,
}

/// A comparison chain `a == b != c`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompareExpression {
    pub left: Box<Spanned<Expr>>,
    pub comparisons: Vec<(CompareOp, Spanned<Expr>)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallExpression {
    pub function: Identifier,
    pub arguments: Vec<Spanned<Expr>>,
}

/// Names a block binds, without descending into nested functions.
///
/// Assignments anywhere in a function body, including inside `if` arms,
/// make the name local to that function for the whole body.
#[derive(Default)]
pub struct Bindings<'a> {
    /// Assigned names, first occurrence first
    pub assigned: Vec<&'a Identifier>,
    /// Every `def` in program order, duplicates included
    pub functions: Vec<(&'a FunctionDefinition, Span)>,
}

impl<'a> Bindings<'a> {
    pub fn of(block: &'a Block) -> Self {
        let mut bindings = Self::default();
        bindings.collect(block);
        bindings
    }

    fn collect(&mut self, block: &'a Block) {
        for (statement, span) in block {
            match statement {
                Statement::Assign(assign) => {
                    if !self.assigned.contains(&&assign.target) {
                        self.assigned.push(&assign.target);
                    }
                }
                Statement::FunctionDef(def) => self.functions.push((def, *span)),
                Statement::If(stmt) => {
                    self.collect(&stmt.body);
                    self.collect(&stmt.orelse);
                }
                Statement::Return(_) | Statement::Expression(_) | Statement::Pass => {}
            }
        }
    }

    pub fn defines_function(&self, name: &str) -> bool {
        self.functions.iter().any(|(def, _)| def.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_bindings_cover_if_arms_but_not_nested_bodies() {
        let module = parse(
            "\
x = 1
if x:
    y = 2
    def f():
        z = 3
else:
    x = 4
def f():
    pass
",
        )
        .unwrap();
        let bindings = Bindings::of(&module.body);
        assert_eq!(bindings.assigned, [&"x".to_owned(), &"y".to_owned()]);
        let lines: Vec<_> = bindings.functions.iter().map(|(_, span)| span.line).collect();
        assert_eq!(lines, [4, 8]);
        assert!(bindings.defines_function("f"));
        assert!(!bindings.defines_function("z"));
    }
}
