// Starship compiler front end
//
// Turns Starship source text into a validated, constant-folded AST for the
// code-generation backend: a hand-written scanner, a recursive-descent parser
// with inline semantic checks, and a two-stack arithmetic evaluator.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod runner;
pub mod symbols;
pub mod value;

// Re-export commonly used items
pub use ast::{FunctionDecl, LiteralNode, Program, Stmt};
pub use error::{CompileError, ErrorKind, Span, Warning};
pub use evaluator::{reduce, Evaluator, Term};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{Compilation, Parser};
pub use symbols::{Symbol, SymbolTable};
pub use value::{Kind, Literal};

// Re-export main functions
pub use runner::{compile, run, Options};
