//! Python front end built on tree-sitter
//!
//! The tree-sitter Python grammar produces a concrete syntax tree; this module
//! lowers the part of it pyc supports into [`crate::ast`] and rejects the rest
//! with a diagnostic naming the construct.

use num_bigint::BigInt;
use pyc_runtime::{BinaryOp, CompareOp};
use tree_sitter::{Node, Parser};

use crate::ast::*;
use crate::errors::{ParseError, ParseResult};

pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> ParseResult<Self> {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
        Ok(PythonParser { parser })
    }

    pub fn parse(&mut self, source: &str) -> ParseResult<Module> {
        let tree = self.parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            let node = first_error(root).unwrap_or(root);
            return Err(ParseError::Syntax(span_of(node)));
        }

        let lowering = Lowering { source };
        Ok(Module {
            body: lowering.block(root)?,
        })
    }
}

/// Parse a complete module
pub fn parse(source: &str) -> ParseResult<Module> {
    PythonParser::new()?.parse(source)
}

fn span_of(node: Node) -> Span {
    Span::new(node.start_byte(), node.end_byte(), node.start_position().row + 1)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

struct Lowering<'src> {
    source: &'src str,
}

impl<'src> Lowering<'src> {
    fn text(&self, node: Node) -> &'src str {
        &self.source[node.byte_range()]
    }

    fn field<'tree>(&self, node: Node<'tree>, name: &str) -> ParseResult<Node<'tree>> {
        node.child_by_field_name(name)
            .ok_or_else(|| ParseError::Syntax(span_of(node)))
    }

    /// Named children other than comments
    fn operands<'tree>(&self, node: Node<'tree>) -> Vec<Node<'tree>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .collect()
    }

    fn block(&self, node: Node) -> ParseResult<Block> {
        self.operands(node)
            .into_iter()
            .map(|child| self.statement(child))
            .collect()
    }

    fn statement(&self, node: Node) -> ParseResult<Spanned<Statement>> {
        let span = span_of(node);
        let statement = match node.kind() {
            "expression_statement" => match self.operands(node).as_slice() {
                [inner] if inner.kind() == "assignment" => self.assignment(*inner)?,
                [inner] => Statement::Expression(self.expr(*inner)?),
                _ => return Err(ParseError::unsupported_statement("tuple expression", span)),
            },
            "function_definition" => Statement::FunctionDef(self.function_definition(node)?),
            "return_statement" => match self.operands(node).as_slice() {
                [] => Statement::Return(None),
                [value] => Statement::Return(Some(self.expr(*value)?)),
                _ => return Err(ParseError::unsupported_statement("return of a tuple", span)),
            },
            "if_statement" => Statement::If(self.if_statement(node)?),
            "pass_statement" => Statement::Pass,
            kind => return Err(ParseError::unsupported_statement(kind, span)),
        };
        Ok((statement, span))
    }

    fn assignment(&self, node: Node) -> ParseResult<Statement> {
        // TODO: support assigning to a tuple
        let left = self.field(node, "left")?;
        if left.kind() != "identifier" {
            let kind = format!("assignment to {}", left.kind());
            return Err(ParseError::unsupported_statement(&kind, span_of(left)));
        }
        let Some(right) = node.child_by_field_name("right") else {
            return Err(ParseError::unsupported_statement(
                "annotation without value",
                span_of(node),
            ));
        };

        Ok(Statement::Assign(Assignment {
            target: self.text(left).to_owned(),
            value: self.expr(right)?,
        }))
    }

    fn function_definition(&self, node: Node) -> ParseResult<FunctionDefinition> {
        let name = self.text(self.field(node, "name")?).to_owned();

        let mut parameters = Vec::new();
        for parameter in self.operands(self.field(node, "parameters")?) {
            if parameter.kind() != "identifier" {
                return Err(ParseError::unsupported_statement(
                    parameter.kind(),
                    span_of(parameter),
                ));
            }
            parameters.push(self.text(parameter).to_owned());
        }

        let body = self.block(self.field(node, "body")?)?;
        Ok(FunctionDefinition {
            name,
            parameters,
            body,
        })
    }

    fn if_statement(&self, node: Node) -> ParseResult<IfStatement> {
        let condition = self.expr(self.field(node, "condition")?)?;
        let body = self.block(self.field(node, "consequence")?)?;

        let mut cursor = node.walk();
        let alternatives: Vec<Node> = node
            .children_by_field_name("alternative", &mut cursor)
            .collect();

        Ok(IfStatement {
            condition,
            body,
            orelse: self.alternatives(&alternatives)?,
        })
    }

    fn alternatives(&self, clauses: &[Node]) -> ParseResult<Block> {
        let Some((clause, rest)) = clauses.split_first() else {
            return Ok(Vec::new());
        };

        match clause.kind() {
            "else_clause" => self.block(self.field(*clause, "body")?),
            "elif_clause" => {
                let nested = IfStatement {
                    condition: self.expr(self.field(*clause, "condition")?)?,
                    body: self.block(self.field(*clause, "consequence")?)?,
                    orelse: self.alternatives(rest)?,
                };
                Ok(vec![(Statement::If(nested), span_of(*clause))])
            }
            kind => Err(ParseError::unsupported_statement(kind, span_of(*clause))),
        }
    }

    fn expr(&self, node: Node) -> ParseResult<Spanned<Expr>> {
        let span = span_of(node);
        let expr = match node.kind() {
            "integer" => Expr::Int(self.integer(node)?),
            "string" => Expr::Str(self.string(node)?),
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "none" => Expr::None,
            "identifier" => Expr::Name(self.text(node).to_owned()),
            "parenthesized_expression" => match self.operands(node).as_slice() {
                [inner] => return self.expr(*inner).map(|(expr, _)| (expr, span)),
                _ => return Err(ParseError::unsupported_expression("tuple", span)),
            },
            "binary_operator" => Expr::Binary(self.binary(node)?),
            "boolean_operator" => Expr::BoolOp(self.boolean(node)?),
            "comparison_operator" => Expr::Compare(self.comparison(node)?),
            "call" => Expr::Call(self.call(node)?),
            "unary_operator" => self.unary(node)?,
            kind => return Err(ParseError::unsupported_expression(kind, span)),
        };
        Ok((expr, span))
    }

    fn binary(&self, node: Node) -> ParseResult<BinaryExpression> {
        let operator = self.field(node, "operator")?;
        let operator = match operator.kind() {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            kind => return Err(ParseError::unsupported_expression(kind, span_of(operator))),
        };

        Ok(BinaryExpression {
            left: Box::new(self.expr(self.field(node, "left")?)?),
            operator,
            right: Box::new(self.expr(self.field(node, "right")?)?),
        })
    }

    fn boolean(&self, node: Node) -> ParseResult<BoolExpression> {
        let operator = self.field(node, "operator")?;
        let operator = match operator.kind() {
            "and" => BoolOperator::And,
            "or" => BoolOperator::Or,
            kind => return Err(ParseError::unsupported_expression(kind, span_of(operator))),
        };

        let mut values = Vec::new();
        let left = self.expr(self.field(node, "left")?)?;
        match left {
            // `a or b or c` parses as `(a or b) or c`
            (Expr::BoolOp(inner), _) if inner.operator == operator => values.extend(inner.values),
            left => values.push(left),
        }
        values.push(self.expr(self.field(node, "right")?)?);

        Ok(BoolExpression { operator, values })
    }

    fn comparison(&self, node: Node) -> ParseResult<CompareExpression> {
        let mut operands = Vec::new();
        let mut operators = Vec::new();

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.is_named() {
                if child.kind() != "comment" {
                    operands.push(self.expr(child)?);
                }
                continue;
            }
            operators.push(match child.kind() {
                "==" => CompareOp::Eq,
                "!=" => CompareOp::Ne,
                kind => return Err(ParseError::unsupported_expression(kind, span_of(child))),
            });
        }

        let mut operands = operands.into_iter();
        let Some(left) = operands.next() else {
            return Err(ParseError::Syntax(span_of(node)));
        };
        if operands.len() != operators.len() {
            return Err(ParseError::Syntax(span_of(node)));
        }

        Ok(CompareExpression {
            left: Box::new(left),
            comparisons: operators.into_iter().zip(operands).collect(),
        })
    }

    fn call(&self, node: Node) -> ParseResult<CallExpression> {
        let function = self.field(node, "function")?;
        if function.kind() != "identifier" {
            let kind = format!("call of {}", function.kind());
            return Err(ParseError::unsupported_expression(&kind, span_of(function)));
        }

        let arguments = self.field(node, "arguments")?;
        if arguments.kind() != "argument_list" {
            return Err(ParseError::unsupported_expression(
                arguments.kind(),
                span_of(arguments),
            ));
        }

        let arguments = self
            .operands(arguments)
            .into_iter()
            .map(|argument| match argument.kind() {
                "keyword_argument" | "list_splat" | "dictionary_splat" => Err(
                    ParseError::unsupported_expression(argument.kind(), span_of(argument)),
                ),
                _ => self.expr(argument),
            })
            .collect::<ParseResult<Vec<_>>>()?;

        Ok(CallExpression {
            function: self.text(function).to_owned(),
            arguments,
        })
    }

    /// Only signs on integer literals are supported
    fn unary(&self, node: Node) -> ParseResult<Expr> {
        let operator = self.field(node, "operator")?;
        let argument = self.field(node, "argument")?;
        let negate = match operator.kind() {
            "-" => true,
            "+" => false,
            kind => return Err(ParseError::unsupported_expression(kind, span_of(operator))),
        };

        match self.expr(argument)? {
            (Expr::Int(value), _) if negate => Ok(Expr::Int(-value)),
            (Expr::Int(value), _) => Ok(Expr::Int(value)),
            _ => {
                let kind = format!("unary {}", operator.kind());
                Err(ParseError::unsupported_expression(&kind, span_of(node)))
            }
        }
    }

    fn integer(&self, node: Node) -> ParseResult<BigInt> {
        let text = self.text(node);
        let digits = text.replace('_', "").to_ascii_lowercase();
        let (radix, body) = if let Some(rest) = digits.strip_prefix("0x") {
            (16, rest)
        } else if let Some(rest) = digits.strip_prefix("0o") {
            (8, rest)
        } else if let Some(rest) = digits.strip_prefix("0b") {
            (2, rest)
        } else {
            (10, digits.as_str())
        };

        BigInt::parse_bytes(body.as_bytes(), radix).ok_or_else(|| ParseError::InvalidLiteral {
            text: text.to_owned(),
            span: span_of(node),
        })
    }

    fn string(&self, node: Node) -> ParseResult<String> {
        let text = self.text(node);
        let span = span_of(node);
        let invalid = || ParseError::InvalidLiteral {
            text: text.to_owned(),
            span,
        };

        let quote = text.find(['\'', '"']).ok_or_else(invalid)?;
        let (prefix, quoted) = text.split_at(quote);
        let prefix = prefix.to_ascii_lowercase();
        if prefix.contains('f') {
            return Err(ParseError::unsupported_expression("f-string", span));
        }
        if prefix.contains('b') {
            return Err(ParseError::unsupported_expression("bytes", span));
        }

        let delimiter = if quoted.starts_with("\"\"\"") || quoted.starts_with("'''") {
            &quoted[..3]
        } else {
            &quoted[..1]
        };
        let inner = quoted
            .strip_prefix(delimiter)
            .and_then(|rest| rest.strip_suffix(delimiter))
            .ok_or_else(invalid)?;

        if prefix.contains('r') {
            Ok(inner.to_owned())
        } else {
            Ok(unescape(inner))
        }
    }
}

/// Resolve backslash escapes. Unknown escapes are kept verbatim.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            // Line continuation
            Some('\n') => {}
            Some(kind @ ('x' | 'u')) => {
                let width = if kind == 'x' { 2 } else { 4 };
                let digits: String = (0..width)
                    .filter_map(|_| chars.next_if(char::is_ascii_hexdigit))
                    .collect();
                let decoded = u32::from_str_radix(&digits, 16)
                    .ok()
                    .filter(|_| digits.len() == width)
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
