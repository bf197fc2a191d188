use crate::ast::{
    BinaryOp, FunctionBody, FunctionDecl, LiteralNode, Parameter, Parameters, Program, Stmt,
};
use crate::error::{CompileError, ErrorKind, Span, Warning};
use crate::evaluator::{Evaluator, Term};
use crate::lexer::{Token, TokenType};
use crate::symbols::{SymbolError, SymbolTable};
use crate::value::{Kind, Literal};
use std::collections::{HashMap, HashSet};

/// Everything a successful parse produces.
#[derive(Debug)]
pub struct Compilation {
    pub program: Program,
    pub symbols: SymbolTable,
    pub warnings: Vec<Warning>,
}

/// How a name that is not in the symbol table is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Declarations, updates and returns stop the compilation.
    Fatal,
    /// Print statements warn and are dropped.
    Warn,
}

/// Right-hand side terms. Unknown print names are stood in for by `0`.
struct Resolved {
    terms: Vec<Term>,
    unresolved: bool,
}

struct FunctionFrame {
    name: String,
    parameters: Parameters,
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    symbols: SymbolTable,
    evaluator: Evaluator,
    warnings: Vec<Warning>,
    declared_at: HashMap<String, Token>,
    functions: HashSet<String>,
    frame: Option<FunctionFrame>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let terminated = matches!(tokens.last(), Some(token) if token.token_type == TokenType::Eof);
        if !terminated {
            let (end, line) = tokens
                .last()
                .map(|token| (token.span.end, token.line))
                .unwrap_or((0, 1));
            tokens.push(Token::new(TokenType::Eof, String::new(), Span::new(end, end), line));
        }

        Self {
            tokens,
            current: 0,
            symbols: SymbolTable::new(),
            evaluator: Evaluator::new(),
            warnings: Vec::new(),
            declared_at: HashMap::new(),
            functions: HashSet::new(),
            frame: None,
        }
    }

    pub fn parse(mut self) -> Result<Compilation, CompileError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.statement()? {
                statements.push(stmt);
            }
        }

        self.report_unused();
        log::debug!(
            "parsed {} top-level statements, {} warnings",
            statements.len(),
            self.warnings.len()
        );

        Ok(Compilation {
            program: Program { statements },
            symbols: self.symbols,
            warnings: self.warnings,
        })
    }

    /// Parses one statement. Returns `None` for statements that produce no
    /// node: a bare `;`, a kind keyword awaiting its identifier, or a print
    /// statement that referenced an unknown name.
    fn statement(&mut self) -> Result<Option<Stmt>, CompileError> {
        let token = self.peek().clone();

        match token.token_type {
            TokenType::Fn => {
                if let Some(frame) = &self.frame {
                    return Err(CompileError::syntax_error(
                        token.span.clone(),
                        token.line,
                        format!("Function declarations are not allowed inside function '{}'", frame.name),
                    )
                    .with_help("Declare functions at the top level of the file."));
                }
                self.advance();
                self.function().map(Some)
            }
            TokenType::Print => {
                self.advance();
                self.print_statement()
            }
            TokenType::Return => {
                if self.frame.is_none() {
                    return Err(CompileError::syntax_error(
                        token.span.clone(),
                        token.line,
                        format!("'return' outside of a function at line {}", token.line),
                    ));
                }
                self.advance();
                self.return_statement().map(Some)
            }
            TokenType::Identifier => match self.lookback_kind() {
                Some(kind) => self.declaration(kind).map(Some),
                None => self.update().map(Some),
            },
            TokenType::IntType | TokenType::FloatType | TokenType::StringType => {
                self.advance();
                if !self.check(&TokenType::Identifier) {
                    return Err(self.error_at_current(&format!(
                        "Expected variable name after '{}'",
                        token.lexeme
                    )));
                }
                Ok(None)
            }
            TokenType::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenType::Import => Err(CompileError::syntax_error(
                token.span.clone(),
                token.line,
                format!("Imports are not supported (line {})", token.line),
            )
            .with_help("'import' is reserved for a future module system.")),
            other => Err(CompileError::syntax_error(
                token.span.clone(),
                token.line,
                format!("Unexpected {} at line {}", other, token.line),
            )),
        }
    }

    fn function(&mut self) -> Result<Stmt, CompileError> {
        let fn_token = self.previous().clone();
        let name = self
            .consume(TokenType::Identifier, "Expected function name after 'fn'")?
            .clone();
        self.validate_name(&name)?;

        if !self.functions.insert(name.lexeme.clone()) {
            return Err(CompileError::semantic_error(
                name.span.clone(),
                name.line,
                format!("Function '{}' is already defined", name.lexeme),
            ));
        }

        let parameters = self.parameters()?;
        self.consume_with_help(
            TokenType::Arrow,
            "Expected '->' after parameter list",
            "Functions declare their return kind: fn name() -> int { ... }",
        )?;
        let return_kind = self.kind_annotation("Expected return kind after '->'")?;

        log::debug!(
            "function '{}' with {} parameters returning {}",
            name.lexeme,
            parameters.len(),
            return_kind
        );

        self.frame = Some(FunctionFrame {
            name: name.lexeme.clone(),
            parameters: parameters.clone(),
        });
        let body = self.function_body(&name.lexeme);
        self.frame = None;
        let body = body?;

        match body.statements.last() {
            Some(Stmt::Return { value, .. }) if value.kind() != return_kind => {
                return Err(CompileError::semantic_error(
                    value.span.clone(),
                    value.line,
                    format!(
                        "Function '{}' returns {} but is declared to return {}",
                        name.lexeme,
                        value.kind(),
                        return_kind
                    ),
                ));
            }
            Some(Stmt::Return { .. }) => {}
            _ => {
                return Err(CompileError::semantic_error(
                    name.span.clone(),
                    name.line,
                    format!(
                        "Function '{}' is declared to return {} but has no return statement",
                        name.lexeme, return_kind
                    ),
                )
                .with_help("End the function body with 'return <expression>;'."));
            }
        }

        Ok(Stmt::Function(FunctionDecl {
            name: name.lexeme,
            parameters,
            return_kind,
            body,
            span: fn_token.span.to(&self.previous().span),
        }))
    }

    fn parameters(&mut self) -> Result<Parameters, CompileError> {
        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;

        let mut params: Vec<Parameter> = Vec::new();
        if !self.check(&TokenType::RightParen) {
            loop {
                let name = self
                    .consume(TokenType::Identifier, "Expected parameter name")?
                    .clone();
                self.validate_name(&name)?;
                self.consume_with_help(
                    TokenType::Colon,
                    &format!("Expected ':' after parameter '{}'", name.lexeme),
                    "Every parameter needs a kind annotation, e.g. 'count: int'.",
                )?;
                let kind = self.kind_annotation(&format!(
                    "Expected kind for parameter '{}'",
                    name.lexeme
                ))?;

                if params.iter().any(|param| param.name == name.lexeme) {
                    return Err(CompileError::semantic_error(
                        name.span.clone(),
                        name.line,
                        format!("Duplicate parameter '{}'", name.lexeme),
                    ));
                }

                params.push(Parameter {
                    name: name.lexeme.clone(),
                    kind,
                    span: name.span.to(&self.previous().span),
                });

                if !self.match_types(&[TokenType::Comma]) {
                    break;
                }
            }
        }

        self.consume(TokenType::RightParen, "Expected ')' after parameters")?;
        Ok(Parameters { params })
    }

    fn function_body(&mut self, name: &str) -> Result<FunctionBody, CompileError> {
        self.consume(TokenType::LeftBrace, "Expected '{' before function body")?;

        let mut statements = Vec::new();
        while !self.check(&TokenType::RightBrace) && !self.is_at_end() {
            let Some(stmt) = self.statement()? else {
                continue;
            };
            let is_return = matches!(stmt, Stmt::Return { .. });
            statements.push(stmt);

            if is_return {
                while self.match_types(&[TokenType::Semicolon]) {}
                if !self.check(&TokenType::RightBrace) && !self.is_at_end() {
                    return Err(self
                        .error_at_current(&format!(
                            "'return' must be the last statement in function '{}'",
                            name
                        ))
                        .with_help("Statements after 'return' can never run."));
                }
            }
        }

        self.consume_with_help(
            TokenType::RightBrace,
            "Expected '}' after function body",
            format!("The body of '{}' must be closed with '}}'.", name),
        )?;
        Ok(FunctionBody { statements })
    }

    fn print_statement(&mut self) -> Result<Option<Stmt>, CompileError> {
        let keyword = self.previous().clone();
        let tokens = self.statement_tokens("print statement")?;
        let inner = self.strip_parentheses(&keyword, &tokens)?;

        match self.fold(inner, Lookup::Warn, &keyword, "'print('")? {
            Some(value) => {
                log::debug!("print {}", value.value);
                Ok(Some(Stmt::Print {
                    value,
                    span: keyword.span.to(&self.previous().span),
                }))
            }
            None => {
                log::debug!("dropping print statement at line {}", keyword.line);
                Ok(None)
            }
        }
    }

    fn return_statement(&mut self) -> Result<Stmt, CompileError> {
        let keyword = self.previous().clone();
        let tokens = self.statement_tokens("return value")?;
        let value = self.fold_fatal(&tokens, &keyword, "'return'")?;

        Ok(Stmt::Return {
            value,
            span: keyword.span.to(&self.previous().span),
        })
    }

    fn declaration(&mut self, kind: Kind) -> Result<Stmt, CompileError> {
        let kind_token = self.previous().clone();
        let name = self.advance().clone();
        self.validate_name(&name)?;

        let equals = self
            .consume_with_help(
                TokenType::Equal,
                &format!("Expected '=' after variable name '{}'", name.lexeme),
                "Declarations need an initializer, e.g. 'int x = 1;'.",
            )?
            .clone();
        let tokens = self.statement_tokens("variable declaration")?;
        let value = self.fold_fatal(&tokens, &equals, "'='")?;

        if value.kind() != kind {
            return Err(CompileError::semantic_error(
                value.span.clone(),
                value.line,
                format!(
                    "Cannot initialize {} variable '{}' with {} value {}",
                    kind,
                    name.lexeme,
                    value.kind(),
                    value.value
                ),
            ));
        }

        self.symbols
            .declare(&name.lexeme, kind, value.value.clone())
            .map_err(|err| symbol_error(err, &name))?;
        self.declared_at.insert(name.lexeme.clone(), name.clone());

        Ok(Stmt::Equation {
            name: name.lexeme,
            kind,
            value,
            span: kind_token.span.to(&self.previous().span),
        })
    }

    fn update(&mut self) -> Result<Stmt, CompileError> {
        let name = self.advance().clone();
        self.validate_name(&name)?;

        if self.symbols.lookup(&name.lexeme).is_none() {
            if self.is_parameter(&name.lexeme) {
                return Err(CompileError::semantic_error(
                    name.span.clone(),
                    name.line,
                    format!("Cannot assign to parameter '{}'", name.lexeme),
                ));
            }
            return Err(CompileError::semantic_error(
                name.span.clone(),
                name.line,
                format!("Undefined variable '{}'", name.lexeme),
            )
            .with_help(format!(
                "Declare it before updating it, e.g. 'int {} = 0;'.",
                name.lexeme
            )));
        }

        let equals = self
            .consume(
                TokenType::Equal,
                &format!("Expected '=' after variable name '{}'", name.lexeme),
            )?
            .clone();
        let tokens = self.statement_tokens("assignment")?;
        let value = self.fold_fatal(&tokens, &equals, "'='")?;

        self.symbols
            .assign(&name.lexeme, value.value.clone())
            .map_err(|err| symbol_error(err, &name))?;

        Ok(Stmt::VariableUpdate {
            name: name.lexeme.clone(),
            value,
            span: name.span.to(&self.previous().span),
        })
    }

    /// Collects the tokens of a statement's right-hand side and consumes the
    /// terminating `;`.
    fn statement_tokens(&mut self, context: &str) -> Result<Vec<Token>, CompileError> {
        let mut tokens = Vec::new();
        while !self.check(&TokenType::Semicolon)
            && !self.check(&TokenType::RightBrace)
            && !self.is_at_end()
        {
            tokens.push(self.advance().clone());
        }

        self.consume(TokenType::Semicolon, &format!("Expected ';' after {}", context))?;
        Ok(tokens)
    }

    fn strip_parentheses<'t>(
        &self,
        keyword: &Token,
        tokens: &'t [Token],
    ) -> Result<&'t [Token], CompileError> {
        match tokens {
            [open, inner @ .., close]
                if open.token_type == TokenType::LeftParen
                    && close.token_type == TokenType::RightParen =>
            {
                Ok(inner)
            }
            [open, ..] if open.token_type == TokenType::LeftParen => {
                let last = &tokens[tokens.len() - 1];
                Err(CompileError::syntax_error(
                    last.span.clone(),
                    last.line,
                    format!("Expected ')' after print expression at line {}", last.line),
                ))
            }
            _ => {
                let at = tokens.first().unwrap_or(keyword);
                Err(CompileError::syntax_error(
                    at.span.clone(),
                    at.line,
                    format!("Expected '(' after 'print' at line {}", at.line),
                )
                .with_help("Print statements look like 'print(x + 1);'."))
            }
        }
    }

    fn fold_fatal(
        &mut self,
        tokens: &[Token],
        anchor: &Token,
        after: &str,
    ) -> Result<LiteralNode, CompileError> {
        match self.fold(tokens, Lookup::Fatal, anchor, after)? {
            Some(value) => Ok(value),
            None => Err(CompileError::syntax_error(
                anchor.span.clone(),
                anchor.line,
                format!("Expected expression after {}", after),
            )),
        }
    }

    /// Resolves identifiers to their current values and reduces the result.
    /// Returns `None` when a print statement referenced an unknown name.
    fn fold(
        &mut self,
        tokens: &[Token],
        lookup: Lookup,
        anchor: &Token,
        after: &str,
    ) -> Result<Option<LiteralNode>, CompileError> {
        if tokens.is_empty() {
            return Err(CompileError::syntax_error(
                anchor.span.clone(),
                anchor.line,
                format!("Expected expression after {}", after),
            ));
        }

        let resolved = self.resolve(tokens, lookup)?;
        if !resolved.unresolved {
            return self.evaluator.evaluate(&resolved.terms).map(Some);
        }

        // Placeholder values make any arithmetic outcome meaningless, but a
        // malformed expression is still malformed.
        match self.evaluator.evaluate(&resolved.terms) {
            Err(err) if err.kind == ErrorKind::SyntaxError => Err(err),
            _ => Ok(None),
        }
    }

    fn resolve(
        &mut self,
        tokens: &[Token],
        lookup: Lookup,
    ) -> Result<Resolved, CompileError> {
        let mut terms = Vec::with_capacity(tokens.len());
        let mut unresolved = false;

        for token in tokens {
            let literal = |value: Literal| {
                Term::Value(LiteralNode::new(value, token.span.clone(), token.line))
            };

            match token.token_type {
                TokenType::Integer => {
                    let n = token.lexeme.parse::<i64>().map_err(|_| {
                        CompileError::lex_error(
                            token.span.clone(),
                            token.line,
                            format!("Invalid integer literal '{}'", token.lexeme),
                        )
                    })?;
                    terms.push(literal(Literal::Int(n)));
                }
                TokenType::Float => {
                    let n = token.lexeme.parse::<f64>().map_err(|_| {
                        CompileError::lex_error(
                            token.span.clone(),
                            token.line,
                            format!("Invalid float literal '{}'", token.lexeme),
                        )
                    })?;
                    terms.push(literal(Literal::Float(n)));
                }
                TokenType::String => terms.push(literal(Literal::String(token.lexeme.clone()))),
                TokenType::Identifier => {
                    if let Some(symbol) = self.symbols.lookup(&token.lexeme) {
                        let value = symbol.value.clone();
                        self.symbols.mark_used(&token.lexeme);
                        terms.push(literal(value));
                        continue;
                    }

                    let parameter = self.is_parameter(&token.lexeme);
                    match (lookup, parameter) {
                        (Lookup::Fatal, true) => {
                            return Err(CompileError::semantic_error(
                                token.span.clone(),
                                token.line,
                                format!(
                                    "Parameter '{}' cannot be used in a constant expression",
                                    token.lexeme
                                ),
                            )
                            .with_help("Only declared variables have a value at compile time."))
                        }
                        (Lookup::Fatal, false) => {
                            return Err(CompileError::semantic_error(
                                token.span.clone(),
                                token.line,
                                format!("Undefined variable '{}'", token.lexeme),
                            ))
                        }
                        (Lookup::Warn, _) => {
                            let message = if parameter {
                                format!("Parameter '{}' has no compile-time value", token.lexeme)
                            } else {
                                format!("Undefined variable '{}' in print statement", token.lexeme)
                            };
                            self.warnings.push(
                                Warning::new(token.span.clone(), token.line, message)
                                    .with_help("The print statement is skipped."),
                            );
                            unresolved = true;
                            // Stands in for the unknown value so the shape of
                            // the expression is still checked.
                            terms.push(literal(Literal::Int(0)));
                        }
                    }
                }
                t if t.is_operator() => {
                    let op = match t {
                        TokenType::Plus => BinaryOp::Add,
                        TokenType::Minus => BinaryOp::Subtract,
                        TokenType::Star => BinaryOp::Multiply,
                        _ => BinaryOp::Divide,
                    };
                    terms.push(Term::Operator {
                        op,
                        span: token.span.clone(),
                        line: token.line,
                    });
                }
                TokenType::LeftParen | TokenType::RightParen => {
                    return Err(CompileError::syntax_error(
                        token.span.clone(),
                        token.line,
                        format!(
                            "Parenthesized sub-expressions are not supported (line {})",
                            token.line
                        ),
                    )
                    .with_help("Write the expression without grouping; '*' and '/' already bind tighter than '+' and '-'."))
                }
                other => {
                    return Err(CompileError::syntax_error(
                        token.span.clone(),
                        token.line,
                        format!("Unexpected {} in expression at line {}", other, token.line),
                    ))
                }
            }
        }

        Ok(Resolved { terms, unresolved })
    }

    fn kind_annotation(&mut self, message: &str) -> Result<Kind, CompileError> {
        match self.peek().token_type.as_kind() {
            Some(kind) => {
                self.advance();
                Ok(kind)
            }
            None => Err(self
                .error_at_current(message)
                .with_help("Valid kinds are 'int', 'float' and 'string'.")),
        }
    }

    fn validate_name(&self, token: &Token) -> Result<(), CompileError> {
        let valid = token
            .lexeme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(CompileError::semantic_error(
                token.span.clone(),
                token.line,
                format!("Invalid name '{}'", token.lexeme),
            )
            .with_help("Names may only contain ASCII letters, digits and '_'."))
        }
    }

    fn is_parameter(&self, name: &str) -> bool {
        self.frame
            .as_ref()
            .is_some_and(|frame| frame.parameters.contains(name))
    }

    /// The kind named by the token just before the cursor, if it is a kind
    /// keyword. This is the only place the parser looks backwards.
    fn lookback_kind(&self) -> Option<Kind> {
        if self.current == 0 {
            return None;
        }
        self.previous().token_type.as_kind()
    }

    fn report_unused(&mut self) {
        for symbol in self.symbols.unused() {
            let Some(token) = self.declared_at.get(&symbol.name) else {
                continue;
            };
            self.warnings.push(
                Warning::new(
                    token.span.clone(),
                    token.line,
                    format!("Variable '{}' is declared but never used", symbol.name),
                )
                .with_help("Remove the declaration or print the variable."),
            );
        }
    }

    fn error_at_current(&self, message: &str) -> CompileError {
        let token = self.peek();
        let span = if self.is_at_end() && self.current > 0 {
            // At EOF, point just past the last real token
            Span::single(self.tokens[self.current - 1].span.end)
        } else {
            token.span.clone()
        };
        CompileError::syntax_error(
            span,
            token.line,
            format!("{}, found {} at line {}", message, token.token_type, token.line),
        )
    }

    fn match_types(&mut self, types: &[TokenType]) -> bool {
        for token_type in types {
            if self.check(token_type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, token_type: &TokenType) -> bool {
        self.peek().token_type == *token_type
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<&Token, CompileError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: impl Into<String>,
    ) -> Result<&Token, CompileError> {
        if self.check(&token_type) {
            Ok(self.advance())
        } else {
            Err(self.error_at_current(message).with_help(help))
        }
    }
}

fn symbol_error(err: SymbolError, target: &Token) -> CompileError {
    let message = match &err {
        SymbolError::AlreadyDeclared(var) => format!("Variable '{}' is already declared", var),
        SymbolError::Undefined(var) => format!("Undefined variable '{}'", var),
        SymbolError::KindMismatch {
            name,
            expected,
            found,
        } => format!(
            "Cannot assign {} value to variable '{}' of kind {}",
            found, name, expected
        ),
    };
    CompileError::semantic_error(target.span.clone(), target.line, message)
}
