use crate::error::Span;
use crate::value::{Kind, Literal};
use std::fmt;

/// Root of a parsed compilation unit. Handed read-only to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Function(FunctionDecl),
    Print {
        value: LiteralNode,
        span: Span,
    },
    Return {
        value: LiteralNode,
        span: Span,
    },
    /// A declaration such as `int x = 2 * 3;`.
    Equation {
        name: String,
        kind: Kind,
        value: LiteralNode,
        span: Span,
    },
    VariableUpdate {
        name: String,
        value: LiteralNode,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Function(function) => &function.span,
            Stmt::Print { span, .. } => span,
            Stmt::Return { span, .. } => span,
            Stmt::Equation { span, .. } => span,
            Stmt::VariableUpdate { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Parameters,
    pub return_kind: Kind,
    pub body: FunctionBody,
    pub span: Span,
}

impl FunctionDecl {
    /// The value of the terminal `return`, if the body has one.
    pub fn return_value(&self) -> Option<&LiteralNode> {
        match self.body.statements.last() {
            Some(Stmt::Return { value, .. }) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameters {
    pub params: Vec<Parameter>,
}

impl Parameters {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|param| param.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: Kind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionBody {
    pub statements: Vec<Stmt>,
}

/// A literal leaf: LiteralInt, LiteralFloat or LiteralString depending on
/// the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralNode {
    pub value: Literal,
    pub span: Span,
    pub line: usize,
}

impl LiteralNode {
    pub fn new(value: Literal, span: Span, line: usize) -> Self {
        Self { value, span, line }
    }

    pub fn kind(&self) -> Kind {
        self.value.kind()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Add | BinaryOp::Subtract => 1,
            BinaryOp::Multiply | BinaryOp::Divide => 2,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

// Tree rendering used by `starship --ast`.

const BRANCH: &str = "├─ ";
const CORNER: &str = "└─ ";
const PIPE: &str = "│  ";
const GAP: &str = "   ";

struct TreeWriter<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
}

impl TreeWriter<'_, '_> {
    fn node(&mut self, prefix: &str, last: bool, label: &str) -> Result<String, fmt::Error> {
        let glyph = if last { CORNER } else { BRANCH };
        writeln!(self.f, "{}{}{}", prefix, glyph, label)?;
        Ok(format!("{}{}", prefix, if last { GAP } else { PIPE }))
    }

    fn literal(&mut self, prefix: &str, last: bool, node: &LiteralNode) -> fmt::Result {
        let label = match node.kind() {
            Kind::Int => "LiteralInt",
            Kind::Float => "LiteralFloat",
            Kind::String => "LiteralString",
        };
        self.node(prefix, last, &format!("{} {}", label, node.value))?;
        Ok(())
    }

    fn statements(&mut self, prefix: &str, statements: &[Stmt]) -> fmt::Result {
        for (i, stmt) in statements.iter().enumerate() {
            self.statement(prefix, i + 1 == statements.len(), stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, prefix: &str, last: bool, stmt: &Stmt) -> fmt::Result {
        match stmt {
            Stmt::Function(function) => {
                let child = self.node(
                    prefix,
                    last,
                    &format!("FunctionDeclaration {} -> {}", function.name, function.return_kind),
                )?;
                let params = self.node(&child, false, "Parameters")?;
                for (i, param) in function.parameters.params.iter().enumerate() {
                    let is_last = i + 1 == function.parameters.len();
                    self.node(&params, is_last, &format!("Parameter {}: {}", param.name, param.kind))?;
                }
                let body = self.node(&child, true, "FunctionBody")?;
                self.statements(&body, &function.body.statements)
            }
            Stmt::Print { value, .. } => {
                let child = self.node(prefix, last, "PrintStatement")?;
                self.literal(&child, true, value)
            }
            Stmt::Return { value, .. } => {
                let child = self.node(prefix, last, "Return")?;
                self.literal(&child, true, value)
            }
            Stmt::Equation {
                name, kind, value, ..
            } => {
                let child = self.node(prefix, last, &format!("Equation {} {}", kind, name))?;
                self.literal(&child, true, value)
            }
            Stmt::VariableUpdate { name, value, .. } => {
                let child = self.node(prefix, last, &format!("VariableUpdate {}", name))?;
                self.literal(&child, true, value)
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Program")?;
        TreeWriter { f }.statements("", &self.statements)
    }
}
