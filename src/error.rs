use ariadne::{Color, Config, Fmt, IndexType, Label, Report, ReportKind, Source};
use std::ops::Range;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    SyntaxError,
    SemanticError,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::SyntaxError => "Syntax Error",
            ErrorKind::SemanticError => "Semantic Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::LexError => Color::Red,
            ErrorKind::SyntaxError => Color::Yellow,
            ErrorKind::SemanticError => Color::Magenta,
        }
    }
}

/// A fatal diagnostic. Any of these stops the compilation.
#[derive(Debug, Clone, Error)]
#[error("{} (line {line}): {message}", .kind.label())]
pub struct CompileError {
    pub kind: ErrorKind,
    pub span: Span,
    pub line: usize,
    pub message: String,
    pub help: Option<String>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, span: Span, line: usize, message: String) -> Self {
        Self {
            kind,
            span,
            line,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn lex_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, line, message)
    }

    pub fn syntax_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::SyntaxError, span, line, message)
    }

    pub fn semantic_error(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::SemanticError, span, line, message)
    }

    /// Renders the error against its source on stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<input>");
        self.to_report(filename, true)
            .eprint((filename, Source::from(source)))
    }

    fn to_report<'a>(
        &self,
        filename: &'a str,
        colored: bool,
    ) -> Report<'a, (&'a str, Range<usize>)> {
        let color = self.kind.color();
        build_report(
            ReportKind::Error,
            filename,
            &self.span,
            format!("{}: {}", self.kind.label().fg(color), self.message),
            &self.message,
            color,
            self.help.as_deref(),
            colored,
        )
    }
}

/// An advisory diagnostic. Compilation carries on after one of these.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub span: Span,
    pub line: usize,
    pub message: String,
    pub help: Option<String>,
}

impl Warning {
    pub fn new(span: Span, line: usize, message: String) -> Self {
        Self {
            span,
            line,
            message,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn report(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<input>");
        build_report(
            ReportKind::Warning,
            filename,
            &self.span,
            self.message.clone(),
            &self.message,
            Color::Yellow,
            self.help.as_deref(),
            true,
        )
        .eprint((filename, Source::from(source)))
    }
}

/// Spans are byte offsets into the source, so ariadne is told to index by
/// byte rather than by char.
#[allow(clippy::too_many_arguments)]
fn build_report<'a>(
    kind: ReportKind<'a>,
    filename: &'a str,
    span: &Span,
    header: String,
    label: &str,
    color: Color,
    help: Option<&str>,
    colored: bool,
) -> Report<'a, (&'a str, Range<usize>)> {
    let config = Config::default()
        .with_index_type(IndexType::Byte)
        .with_color(colored);

    let mut report_builder = Report::build(kind, filename, span.start)
        .with_config(config)
        .with_message(header)
        .with_label(
            Label::new((filename, span.start..span.end))
                .with_message(label)
                .with_color(color),
        );

    if let Some(help_text) = help {
        report_builder =
            report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
    }

    report_builder.finish()
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Warning (line {}): {}", self.line, self.message)
    }
}
