use crate::ast::{BinaryOp, LiteralNode};
use crate::error::{CompileError, Span};
use crate::value::{Kind, Literal};

/// One element of a statement's right-hand side after identifiers have been
/// resolved to their current values.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Value(LiteralNode),
    Operator {
        op: BinaryOp,
        span: Span,
        line: usize,
    },
}

impl Term {
    pub fn span(&self) -> &Span {
        match self {
            Term::Value(node) => &node.span,
            Term::Operator { span, .. } => span,
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Term::Value(node) => node.line,
            Term::Operator { line, .. } => *line,
        }
    }
}

struct PendingOp {
    op: BinaryOp,
    span: Span,
    line: usize,
}

/// Operator-precedence reducer over two stacks.
pub struct Evaluator {
    operands: Vec<LiteralNode>,
    operators: Vec<PendingOp>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            operands: Vec::new(),
            operators: Vec::new(),
        }
    }

    /// Collapses `terms` into a single literal.
    ///
    /// A lone value is returned unchanged whatever its kind. Anything longer
    /// is integer arithmetic: `*` and `/` bind tighter than `+` and `-`, equal
    /// precedence associates to the left and division truncates toward zero.
    /// A `-` where an operand is expected negates the int that follows it.
    pub fn evaluate(&mut self, terms: &[Term]) -> Result<LiteralNode, CompileError> {
        self.operands.clear();
        self.operators.clear();

        let (first, last) = match (terms.first(), terms.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(CompileError::syntax_error(
                    Span::new(0, 0),
                    1,
                    "Expected expression".to_string(),
                ))
            }
        };

        if let [Term::Value(node)] = terms {
            return Ok(node.clone());
        }

        let mut expect_operand = true;
        let mut iter = terms.iter().peekable();

        while let Some(term) = iter.next() {
            match term {
                Term::Value(node) => {
                    if !expect_operand {
                        return Err(CompileError::syntax_error(
                            node.span.clone(),
                            node.line,
                            format!("Expected an operator before {}", node.value),
                        ));
                    }
                    self.push_operand(node.clone())?;
                    expect_operand = false;
                }
                Term::Operator { op, span, line } if expect_operand => {
                    let operand = match (op, iter.peek()) {
                        (BinaryOp::Subtract, Some(Term::Value(node))) => node,
                        _ => {
                            return Err(CompileError::syntax_error(
                                span.clone(),
                                *line,
                                format!("Expected an operand before '{}'", op),
                            ))
                        }
                    };
                    let negated = negate(operand, span, *line)?;
                    iter.next();

                    // `-1.5` on its own is a literal, not arithmetic.
                    if terms.len() == 2 {
                        return Ok(negated);
                    }
                    self.push_operand(negated)?;
                    expect_operand = false;
                }
                Term::Operator { op, span, line } => {
                    while let Some(top) = self.operators.last() {
                        if top.op.precedence() < op.precedence() {
                            break;
                        }
                        self.apply()?;
                    }
                    self.operators.push(PendingOp {
                        op: *op,
                        span: span.clone(),
                        line: *line,
                    });
                    expect_operand = true;
                }
            }
        }

        if expect_operand {
            return Err(CompileError::syntax_error(
                last.span().clone(),
                last.line(),
                "Expected an operand at the end of the expression".to_string(),
            ));
        }

        while !self.operators.is_empty() {
            self.apply()?;
        }

        let mut result = self.operands.pop().ok_or_else(|| {
            CompileError::syntax_error(
                first.span().clone(),
                first.line(),
                "Expected expression".to_string(),
            )
        })?;
        result.span = first.span().to(last.span());
        result.line = first.line();
        Ok(result)
    }

    fn push_operand(&mut self, node: LiteralNode) -> Result<(), CompileError> {
        if node.kind() != Kind::Int {
            return Err(non_int_operand(&node));
        }
        self.operands.push(node);
        Ok(())
    }

    fn apply(&mut self) -> Result<(), CompileError> {
        let pending = self.operators.pop();
        let right = self.operands.pop();
        let left = self.operands.pop();

        let (pending, left, right) = match (pending, left, right) {
            (Some(pending), Some(left), Some(right)) => (pending, left, right),
            _ => {
                return Err(CompileError::syntax_error(
                    Span::new(0, 0),
                    1,
                    "Malformed expression".to_string(),
                ))
            }
        };

        let (l, r) = match (&left.value, &right.value) {
            (Literal::Int(l), Literal::Int(r)) => (*l, *r),
            (Literal::Int(_), _) => return Err(non_int_operand(&right)),
            _ => return Err(non_int_operand(&left)),
        };

        let value = match pending.op {
            BinaryOp::Add => l.checked_add(r),
            BinaryOp::Subtract => l.checked_sub(r),
            BinaryOp::Multiply => l.checked_mul(r),
            BinaryOp::Divide => {
                if r == 0 {
                    return Err(CompileError::semantic_error(
                        pending.span.clone(),
                        pending.line,
                        "Division by zero".to_string(),
                    ));
                }
                l.checked_div(r)
            }
        }
        .ok_or_else(|| overflow(&pending.span, pending.line))?;

        log::trace!("reduce {} {} {} = {}", l, pending.op, r, value);
        self.operands.push(LiteralNode::new(
            Literal::Int(value),
            left.span.to(&right.span),
            left.line,
        ));
        Ok(())
    }
}

fn negate(node: &LiteralNode, minus: &Span, line: usize) -> Result<LiteralNode, CompileError> {
    let value = match &node.value {
        Literal::Int(n) => Literal::Int(n.checked_neg().ok_or_else(|| overflow(minus, line))?),
        Literal::Float(x) => Literal::Float(-x),
        Literal::String(_) => {
            return Err(CompileError::semantic_error(
                minus.to(&node.span),
                line,
                format!("Cannot negate string value {}", node.value),
            ))
        }
    };
    Ok(LiteralNode::new(value, minus.to(&node.span), line))
}

fn non_int_operand(node: &LiteralNode) -> CompileError {
    CompileError::semantic_error(
        node.span.clone(),
        node.line,
        format!(
            "Arithmetic is only defined for int operands, found {} {}",
            node.kind(),
            node.value
        ),
    )
    .with_help("Only a single float or string value can stand alone on the right-hand side.")
}

fn overflow(span: &Span, line: usize) -> CompileError {
    CompileError::semantic_error(
        span.clone(),
        line,
        "Integer overflow in constant expression".to_string(),
    )
}

/// Reduces `terms` with a fresh [`Evaluator`].
pub fn reduce(terms: &[Term]) -> Result<LiteralNode, CompileError> {
    Evaluator::new().evaluate(terms)
}
