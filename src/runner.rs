use crate::error::CompileError;
use crate::lexer::{Lexer, Token};
use crate::parser::{Compilation, Parser};

/// What the driver should dump besides diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub dump_tokens: bool,
    pub dump_ast: bool,
}

/// Scans and parses `source` without printing anything.
pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    let tokens = Lexer::new(source).scan_tokens()?;
    Parser::new(tokens).parse()
}

/// Runs the front end and reports diagnostics on stderr.
///
/// Warnings are reported and do not affect the result; the first error is
/// reported and returned.
pub fn run(
    source: &str,
    filename: Option<&str>,
    options: &Options,
) -> Result<Compilation, CompileError> {
    // Lexical analysis
    let tokens = match Lexer::new(source).scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            report_error(&error, source, filename);
            return Err(error);
        }
    };

    if options.dump_tokens {
        print_tokens(&tokens);
    }

    // Parsing and semantic checks
    let compilation = match Parser::new(tokens).parse() {
        Ok(compilation) => compilation,
        Err(error) => {
            report_error(&error, source, filename);
            return Err(error);
        }
    };

    for warning in &compilation.warnings {
        if let Err(io_error) = warning.report(source, filename) {
            log::error!("could not render warning: {}", io_error);
            eprintln!("{}", warning);
        }
    }

    if options.dump_ast {
        print!("{}", compilation.program);
    }

    Ok(compilation)
}

fn report_error(error: &CompileError, source: &str, filename: Option<&str>) {
    if let Err(io_error) = error.report(source, filename) {
        log::error!("could not render diagnostic: {}", io_error);
        eprintln!("{}", error);
    }
}

fn print_tokens(tokens: &[Token]) {
    println!("Tokens:");
    for token in tokens {
        println!("[{:?}, {:?}, line {}]", token.token_type, token.lexeme, token.line);
    }
}
