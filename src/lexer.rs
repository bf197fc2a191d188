use crate::error::{CompileError, Span};
use crate::value::Kind;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    // Single-character tokens
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Equal,
    Plus,
    Minus,
    Star,
    Slash,

    // Two character tokens
    Arrow,

    // Literals
    Identifier,
    Integer,
    Float,
    String,

    // Keywords
    Fn,
    Print,
    Return,
    Import,
    IntType,
    FloatType,
    StringType,

    // Special
    Eof,
}

impl TokenType {
    /// The declared kind named by a kind keyword (`int`, `float`, `string`).
    pub fn as_kind(&self) -> Option<Kind> {
        match self {
            TokenType::IntType => Some(Kind::Int),
            TokenType::FloatType => Some(Kind::Float),
            TokenType::StringType => Some(Kind::String),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenType::Plus | TokenType::Minus | TokenType::Star | TokenType::Slash
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TokenType::LeftParen => "'('",
            TokenType::RightParen => "')'",
            TokenType::LeftBrace => "'{'",
            TokenType::RightBrace => "'}'",
            TokenType::Comma => "','",
            TokenType::Colon => "':'",
            TokenType::Semicolon => "';'",
            TokenType::Dot => "'.'",
            TokenType::Equal => "'='",
            TokenType::Plus => "'+'",
            TokenType::Minus => "'-'",
            TokenType::Star => "'*'",
            TokenType::Slash => "'/'",
            TokenType::Arrow => "'->'",
            TokenType::Identifier => "identifier",
            TokenType::Integer => "integer literal",
            TokenType::Float => "float literal",
            TokenType::String => "string literal",
            TokenType::Fn => "keyword 'fn'",
            TokenType::Print => "keyword 'print'",
            TokenType::Return => "keyword 'return'",
            TokenType::Import => "keyword 'import'",
            TokenType::IntType => "keyword 'int'",
            TokenType::FloatType => "keyword 'float'",
            TokenType::StringType => "keyword 'string'",
            TokenType::Eof => "end of input",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,
    pub span: Span,
    pub line: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span, line: usize) -> Self {
        Self {
            token_type,
            lexeme,
            span,
            line,
        }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    start: usize,
    start_line: usize,
    current: usize,
    line: usize,
    keywords: HashMap<&'static str, TokenType>,
}

impl Lexer {
    pub fn new(source: impl Into<String>) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("fn", TokenType::Fn);
        keywords.insert("print", TokenType::Print);
        keywords.insert("return", TokenType::Return);
        keywords.insert("import", TokenType::Import);
        keywords.insert("int", TokenType::IntType);
        keywords.insert("float", TokenType::FloatType);
        keywords.insert("string", TokenType::StringType);

        Self {
            source: source.into(),
            tokens: Vec::new(),
            start: 0,
            start_line: 1,
            current: 0,
            line: 1,
            keywords,
        }
    }

    /// Scans the whole source. The returned stream always ends with one `Eof`.
    pub fn scan_tokens(mut self) -> Result<Vec<Token>, CompileError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenType::Eof,
            String::new(),
            Span::new(self.current, self.current),
            self.line,
        ));

        log::debug!("scanned {} tokens over {} lines", self.tokens.len(), self.line);
        Ok(self.tokens)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) -> Result<(), CompileError> {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            ':' => self.add_token(TokenType::Colon),
            ';' => self.add_token(TokenType::Semicolon),
            '=' => self.add_token(TokenType::Equal),
            '+' => self.add_token(TokenType::Plus),
            '*' => self.add_token(TokenType::Star),
            '-' => {
                let token_type = if self.match_char('>') {
                    TokenType::Arrow
                } else {
                    TokenType::Minus
                };
                self.add_token(token_type);
            }
            '/' => {
                if self.match_char('/') {
                    // Comment goes until end of line
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }
            '.' => {
                if self.follows_integer() && self.peek().is_ascii_digit() {
                    self.merge_float()?;
                } else {
                    self.add_token(TokenType::Dot);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number()?,
            c if c.is_alphabetic() => self.identifier(),
            _ => {
                return Err(CompileError::lex_error(
                    Span::new(self.start, self.current),
                    self.line,
                    format!("Unrecognized character '{}' at line {}", c, self.line),
                ));
            }
        }

        Ok(())
    }

    fn advance(&mut self) -> char {
        match self.source[self.current..].chars().next() {
            Some(c) => {
                self.current += c.len_utf8();
                c
            }
            None => '\0',
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn peek(&self) -> char {
        self.source[self.current..].chars().next().unwrap_or('\0')
    }

    fn string(&mut self) -> Result<(), CompileError> {
        while self.peek() != '"' && !self.is_at_end() {
            if self.advance() == '\n' {
                self.line += 1;
            }
        }

        if self.is_at_end() {
            return Err(CompileError::lex_error(
                Span::new(self.start, self.current),
                self.start_line,
                format!("Unterminated string literal starting at line {}", self.start_line),
            )
            .with_help("Close the string with a matching '\"'."));
        }

        // Consume the closing "
        self.advance();

        let contents = &self.source[self.start + 1..self.current - 1];
        self.add_token_with_content(TokenType::String, contents.to_string());
        Ok(())
    }

    fn number(&mut self) -> Result<(), CompileError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let digits = &self.source[self.start..self.current];
        if digits.parse::<i64>().is_err() {
            return Err(CompileError::lex_error(
                Span::new(self.start, self.current),
                self.line,
                format!("Integer literal '{}' does not fit in 64 bits", digits),
            ));
        }
        self.add_token(TokenType::Integer);
        Ok(())
    }

    /// True when the `.` just consumed sits directly against an integer token.
    fn follows_integer(&self) -> bool {
        matches!(
            self.tokens.last(),
            Some(token) if token.token_type == TokenType::Integer && token.span.end == self.start
        )
    }

    /// Pops the integer emitted just before the `.` and re-emits it together
    /// with the fraction as a single float token.
    fn merge_float(&mut self) -> Result<(), CompileError> {
        let integer = match self.tokens.pop() {
            Some(token) => token,
            None => return Ok(()),
        };

        while self.peek().is_ascii_digit() {
            self.advance();
        }

        self.start = integer.span.start;
        let text = &self.source[self.start..self.current];
        if text.parse::<f64>().is_err() {
            return Err(CompileError::lex_error(
                Span::new(self.start, self.current),
                self.line,
                format!("Invalid float literal '{}'", text),
            ));
        }

        log::trace!("merged '{}' into float '{}'", integer.lexeme, text);
        self.add_token(TokenType::Float);
        Ok(())
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = &self.source[self.start..self.current];
        let token_type = self
            .keywords
            .get(text)
            .copied()
            .unwrap_or(TokenType::Identifier);

        self.add_token(token_type);
    }

    fn add_token(&mut self, token_type: TokenType) {
        let text = &self.source[self.start..self.current];
        self.add_token_with_content(token_type, text.to_string());
    }

    fn add_token_with_content(&mut self, token_type: TokenType, lexeme: String) {
        log::trace!("token {:?} {:?} at line {}", token_type, lexeme, self.start_line);
        self.tokens.push(Token::new(
            token_type,
            lexeme,
            Span::new(self.start, self.current),
            self.start_line,
        ));
    }
}
