// Integration tests for the Starship front end
//
// A table-driven robustness suite over whole source snippets, followed by
// end-to-end checks of the trees and diagnostics the front end produces.

use starship::error::{CompileError, ErrorKind};
use starship::lexer::{Lexer, TokenType};
use starship::parser::Compilation;
use starship::value::{Kind, Literal};
use starship::{compile, reduce, Stmt, Term};

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_kind: Option<ErrorKind>,
    pub expected_error_contains: Option<String>,
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite
    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

/// Run a single test case
fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| compile_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected compilation to fail, but it succeeded".to_string())
            }
            (Err(error), false) => {
                if let Some(kind) = test.expected_kind {
                    if error.kind != kind {
                        return TestResult::Fail(format!(
                            "Expected {:?}, got {:?}: {}",
                            kind, error.kind, error.message
                        ));
                    }
                }
                match &test.expected_error_contains {
                    Some(expected) if !error.message.contains(expected) => {
                        TestResult::Fail(format!(
                            "Error message '{}' doesn't contain expected text '{}'",
                            error.message, expected
                        ))
                    }
                    _ => TestResult::Pass,
                }
            }
            (Err(error), true) => TestResult::Fail(format!(
                "Expected compilation to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn compile_input(input: &str) -> Result<Compilation, CompileError> {
    compile(input)
}

/// Test case builder for convenience
impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_kind: None,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str, kind: ErrorKind) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_kind: Some(kind),
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(
        name: &str,
        input: &str,
        kind: ErrorKind,
        expected_msg: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_kind: Some(kind),
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_lexical_tests() -> TestSuite {
    let mut suite = TestSuite::new("Lexical Tests");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  \r\n"));
    suite.add_test(TestCase::should_succeed("only_comment", "// nothing here\n"));

    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "string s = \"hello;",
        ErrorKind::LexError,
        "Unterminated string",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unrecognized_character",
        "int x = 1;\nint y = x % 2;",
        ErrorKind::LexError,
        "'%' at line 2",
    ));
    suite.add_test(TestCase::should_fail(
        "integer_too_large",
        "int x = 123456789012345678901234567890;",
        ErrorKind::LexError,
    ));

    suite
}

fn create_declaration_tests() -> TestSuite {
    let mut suite = TestSuite::new("Declaration Tests");

    suite.add_test(TestCase::should_succeed("int_declaration", "int x = 1;"));
    suite.add_test(TestCase::should_succeed("float_declaration", "float f = 2.75;"));
    suite.add_test(TestCase::should_succeed("string_declaration", "string s = \"hi\";"));
    suite.add_test(TestCase::should_succeed("negative_literal", "int x = -5 * 2;"));
    suite.add_test(TestCase::should_succeed(
        "initializer_reads_variable",
        "int a = 2;\nint b = a * a;",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "int_from_string",
        "int x = \"a\";",
        ErrorKind::SemanticError,
        "Cannot initialize int variable 'x' with string",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "float_from_int",
        "float f = 3;",
        ErrorKind::SemanticError,
        "Cannot initialize float variable 'f' with int",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_initializer",
        "int x;",
        ErrorKind::SyntaxError,
        "Expected '=' after variable name 'x'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_initializer",
        "int x = ;",
        ErrorKind::SyntaxError,
        "Expected expression after '='",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_semicolon",
        "int x = 1",
        ErrorKind::SyntaxError,
        "Expected ';' after variable declaration",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "initializer_reads_undeclared",
        "int x = y + 1;",
        ErrorKind::SemanticError,
        "Undefined variable 'y'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "redeclaration",
        "int x = 1;\nint x = 2;",
        ErrorKind::SemanticError,
        "already declared",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "float_arithmetic",
        "float f = 1.5 + 2.5;",
        ErrorKind::SemanticError,
        "only defined for int operands",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "string_arithmetic",
        "string s = \"a\" + \"b\";",
        ErrorKind::SemanticError,
        "only defined for int operands",
    ));

    suite
}

fn create_expression_tests() -> TestSuite {
    let mut suite = TestSuite::new("Expression Tests");

    suite.add_test(TestCase::should_succeed("precedence", "int x = 2 + 3 * 4;"));
    suite.add_test(TestCase::should_succeed("long_chain", "int x = 1 + 2 - 3 * 4 / 5 + 6;"));

    suite.add_test(TestCase::should_fail_with_message(
        "parenthesized_expression",
        "int x = (1 + 2) * 3;",
        ErrorKind::SyntaxError,
        "Parenthesized sub-expressions are not supported",
    ));
    suite.add_test(TestCase::should_fail(
        "trailing_operator",
        "int x = 1 +;",
        ErrorKind::SyntaxError,
    ));
    suite.add_test(TestCase::should_fail(
        "leading_operator",
        "int x = * 2;",
        ErrorKind::SyntaxError,
    ));
    suite.add_test(TestCase::should_fail(
        "adjacent_operands",
        "int x = 1 2;",
        ErrorKind::SyntaxError,
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "division_by_zero",
        "int x = 1 / 0;",
        ErrorKind::SemanticError,
        "Division by zero",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "keyword_in_expression",
        "int x = 1 + print;",
        ErrorKind::SyntaxError,
        "Unexpected keyword 'print' in expression",
    ));

    suite
}

fn create_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Function Tests");

    suite.add_test(TestCase::should_succeed(
        "simple_main",
        "fn main() -> int { return 2 + 3; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "parameters",
        "fn scale(value: float, times: int) -> float { return 1.5; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "body_with_statements",
        "fn main() -> int {\n  int x = 4;\n  print(x);\n  x = x * 2;\n  return x;\n}",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_arrow",
        "fn main() int { return 1; }",
        ErrorKind::SyntaxError,
        "Expected '->' after parameter list",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_return_kind",
        "fn main() -> { return 1; }",
        ErrorKind::SyntaxError,
        "Expected return kind after '->'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "parameter_without_kind",
        "fn f(a, b: int) -> int { return 1; }",
        ErrorKind::SyntaxError,
        "Expected ':' after parameter 'a'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "duplicate_parameter",
        "fn f(a: int, a: int) -> int { return 1; }",
        ErrorKind::SemanticError,
        "Duplicate parameter 'a'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "return_kind_mismatch",
        "fn name() -> string { return 42; }",
        ErrorKind::SemanticError,
        "Function 'name' returns int but is declared to return string",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_body",
        "fn main() -> int { return 1;",
        ErrorKind::SyntaxError,
        "Expected '}' after function body",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_body",
        "fn main() -> int return 1;",
        ErrorKind::SyntaxError,
        "Expected '{' before function body",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "statement_after_return",
        "fn main() -> int { return 1; int x = 2; }",
        ErrorKind::SyntaxError,
        "'return' must be the last statement in function 'main'",
    ));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statement Tests");

    suite.add_test(TestCase::should_succeed("print_literal", "print(\"hello\");"));
    suite.add_test(TestCase::should_succeed("print_expression", "print(6 * 7);"));
    suite.add_test(TestCase::should_succeed("update", "int x = 1;\nx = 2;\nprint(x);"));
    suite.add_test(TestCase::should_succeed("print_unknown_name", "print(nobody);"));

    suite.add_test(TestCase::should_fail_with_message(
        "update_unknown_name",
        "nobody = 1;",
        ErrorKind::SemanticError,
        "Undefined variable 'nobody'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unexpected_leading_token",
        "int x = 1;\n}",
        ErrorKind::SyntaxError,
        "Unexpected '}' at line 2",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "leading_literal",
        "42;",
        ErrorKind::SyntaxError,
        "Unexpected integer literal at line 1",
    ));
    suite.add_test(TestCase::should_fail(
        "return_at_top_level",
        "return 1;",
        ErrorKind::SyntaxError,
    ));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_front_end_tests() {
    let suites = vec![
        create_lexical_tests(),
        create_declaration_tests(),
        create_expression_tests(),
        create_function_tests(),
        create_statement_tests(),
    ];

    let mut failed_suites = Vec::new();
    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            failed_suites.push(results.suite_name);
        }
    }

    assert!(failed_suites.is_empty(), "failing suites: {:?}", failed_suites);
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn token_stream_counts_lexical_units() {
    let tokens = Lexer::new("float ratio = 12.5;\nprint(ratio);").scan_tokens().unwrap();
    // float ratio = 12.5 ; print ( ratio ) ; Eof
    assert_eq!(tokens.len(), 11);
    assert_eq!(tokens[3].token_type, TokenType::Float);
    assert_eq!(tokens[3].lexeme, "12.5");
    assert_eq!(tokens.last().unwrap().token_type, TokenType::Eof);
}

#[test]
fn main_function_folds_its_return() {
    let compilation = compile("fn main() -> int { return 2 + 3; }").unwrap();
    assert_eq!(compilation.program.statements.len(), 1);

    let Stmt::Function(function) = &compilation.program.statements[0] else {
        panic!("expected a function declaration");
    };
    assert_eq!(function.name, "main");
    assert!(function.parameters.is_empty());
    assert_eq!(function.return_kind, Kind::Int);
    assert_eq!(function.body.statements.len(), 1);
    match &function.body.statements[0] {
        Stmt::Return { value, .. } => assert_eq!(value.value, Literal::Int(5)),
        other => panic!("expected a return, got {:?}", other),
    }
}

#[test]
fn declared_variable_prints_its_value() {
    let compilation = compile("int x = 5;\nprint(x);").unwrap();
    match &compilation.program.statements[1] {
        Stmt::Print { value, .. } => {
            assert_eq!(value.value, Literal::Int(5));
            assert_eq!(value.kind(), Kind::Int);
        }
        other => panic!("expected a print, got {:?}", other),
    }
    assert!(compilation.symbols.lookup("x").unwrap().used);
}

#[test]
fn kind_mismatch_is_semantic_error() {
    let err = compile("int x = \"a\";").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SemanticError);
    assert_eq!(err.line, 1);
}

// Print-time lookups are advisory while update-time lookups are fatal.
#[test]
fn undeclared_print_warns_but_undeclared_update_fails() {
    let compilation = compile("print(missing);\nint y = 1;\nprint(y);").unwrap();
    assert_eq!(compilation.warnings.len(), 1);
    assert!(compilation.warnings[0].message.contains("missing"));
    assert_eq!(compilation.warnings[0].line, 1);
    assert_eq!(compilation.program.statements.len(), 2);

    let err = compile("missing = 1;").unwrap_err();
    assert_eq!(err.kind, ErrorKind::SemanticError);
    assert!(err.message.contains("Undefined variable 'missing'"));
}

#[test]
fn unused_variables_are_only_warnings() {
    let compilation = compile("int never = 1;\nstring read = \"x\";\nprint(read);").unwrap();
    assert_eq!(compilation.warnings.len(), 1);
    assert!(compilation.warnings[0].message.contains("'never'"));
}

#[test]
fn whole_program_tree() {
    let source = "\
int base = 10;
float rate = 0.5;
fn compute(n: int) -> int {
    int scaled = base * 3 - 4 / 2;
    print(scaled);
    return scaled;
}
base = base + 1;
print(base);
print(rate);
";
    let compilation = compile(source).unwrap();
    assert!(compilation.warnings.is_empty(), "{:?}", compilation.warnings);

    let expected = "\
Program
├─ Equation int base
│  └─ LiteralInt 10
├─ Equation float rate
│  └─ LiteralFloat 0.5
├─ FunctionDeclaration compute -> int
│  ├─ Parameters
│  │  └─ Parameter n: int
│  └─ FunctionBody
│     ├─ Equation int scaled
│     │  └─ LiteralInt 28
│     ├─ PrintStatement
│     │  └─ LiteralInt 28
│     └─ Return
│        └─ LiteralInt 28
├─ VariableUpdate base
│  └─ LiteralInt 11
├─ PrintStatement
│  └─ LiteralInt 11
└─ PrintStatement
   └─ LiteralFloat 0.5
";
    assert_eq!(compilation.program.to_string(), expected);
}

#[test]
fn evaluator_is_usable_on_its_own() {
    let tokens = Lexer::new("10 - 2 - 3").scan_tokens().unwrap();
    let terms: Vec<Term> = tokens
        .iter()
        .filter(|t| t.token_type != TokenType::Eof)
        .map(|t| match t.token_type {
            TokenType::Integer => Term::Value(starship::LiteralNode::new(
                Literal::Int(t.lexeme.parse().unwrap()),
                t.span.clone(),
                t.line,
            )),
            TokenType::Minus => Term::Operator {
                op: starship::ast::BinaryOp::Subtract,
                span: t.span.clone(),
                line: t.line,
            },
            other => panic!("unexpected token {:?}", other),
        })
        .collect();

    let result = reduce(&terms).unwrap();
    assert_eq!(result.value, Literal::Int(5));
}
