//! # Formatter Module
//!
//! This module renders a parsed program back into mini-c source text. It is
//! the structural printer of the compiler: the output of the formatter
//! re-parses into an AST that is structurally equal to the one it was
//! printed from, which the parser's round-trip tests rely on.
//!
//! ## Architecture Overview
//!
//! Formatting mirrors the AST shape through a small visitor trait:
//!
//! ```text
//! AST Nodes  →  Format Trait  →  FormatterContext  →  Source Text
//!  (parsed)      (visitor)       (lines + depth)       (String)
//! ```
//!
//! Every AST node implements [`Format`] and delegates to its children, so
//! complex constructs format by composition. The [`FormatterContext`] owns
//! the accumulated output and the current block depth; it knows the three
//! layout shapes mini-c source is made of and nothing else:
//!
//! - **Lines**: every declaration and statement occupies one indented line
//!   ([`FormatterContext::line`]).
//! - **Braced blocks**: a `{ ... }` body one level deeper, with the closing
//!   brace left open-ended so `else` can continue the line
//!   ([`FormatterContext::braced`]).
//! - **Separated lists**: parameter and argument lists joined with `", "`
//!   ([`FormatterContext::join`]).
//!
//! Free-form text inside a line goes through the [`std::fmt::Write`] impl,
//! so nodes can use `write!` directly on the context.
//!
//! ## Style Rules
//!
//! The printed source follows one fixed style:
//!
//! - 4 spaces per block level, spaces only
//! - spaces around binary operators and `=`
//! - one declaration or statement per line
//! - `{` on the same line as its header, `}` aligned with the header
//! - parentheses only where precedence demands them (see
//!   `expression::format_operand`)
//! - float literals always keep a decimal point so they lex as floats again
//!
//! ## Round-Trip Guarantee
//!
//! For every accepted program `p`: `parse(format(parse(p)))` is structurally
//! equal to `parse(p)`. Two properties carry this:
//!
//! - expression printing re-inserts parentheses exactly where the child
//!   binds looser than its context requires, so the re-parsed tree has the
//!   same shape;
//! - literal printing never changes the token class (a whole-valued float
//!   prints as `5.0`, not `5`).
//!
//! Positions are not preserved; node equality ignores them by design.

mod expression;
mod statement;

use std::fmt::{self, Write};

use crate::parser::ast::Program;

/// Visitor implemented by every AST node that can print itself.
pub trait Format {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result;
}

/// Output sink for formatting. Tracks the accumulated text and the current
/// block depth; the three helpers below cover every layout shape a mini-c
/// program contains.
#[derive(Debug, Default)]
pub struct FormatterContext {
    out: String,
    depth: usize,
}

impl Write for FormatterContext {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.out.write_str(s)
    }
}

impl FormatterContext {
    const INDENT: &'static str = "    ";

    fn pad(&mut self) -> fmt::Result {
        for _ in 0..self.depth {
            self.out.write_str(Self::INDENT)?;
        }
        Ok(())
    }

    /// Writes one line at the current depth: indentation, then whatever `f`
    /// produces, then the line break. Declarations and statements are
    /// printed through this.
    pub fn line<F>(&mut self, f: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.pad()?;
        f(self)?;
        self.out.write_char('\n')
    }

    /// Writes a `{ ... }` block whose body `f` runs one level deeper. The
    /// closing brace is aligned with the block header and is not followed
    /// by a line break, so a parent can continue the line (`} else {`).
    pub fn braced<F>(&mut self, f: F) -> fmt::Result
    where
        F: FnOnce(&mut Self) -> fmt::Result,
    {
        self.out.write_str("{\n")?;
        self.depth += 1;
        let body = f(self);
        self.depth -= 1;
        body?;
        self.pad()?;
        self.out.write_char('}')
    }

    /// Formats `items` with `separator` between consecutive elements.
    /// Parameter lists and argument lists are the two users.
    pub fn join<T: Format>(&mut self, items: &[T], separator: &str) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.write_str(separator)?;
            }
            item.format(self)?;
        }
        Ok(())
    }

    pub fn finish(self) -> String {
        self.out
    }
}

/// Prints a whole program. Infallible in practice since the sink is a
/// `String`; the `fmt::Result` plumbing exists so `write!` composes.
pub fn format_program(program: &Program) -> String {
    let mut ctx = FormatterContext::default();

    program
        .format(&mut ctx)
        .expect("writing to a string cannot fail");

    ctx.finish()
}

#[cfg(test)]
mod tests {
    use crate::{lexer::Lexer, parser::Parser};

    use super::*;

    fn roundtrip(source: &str) {
        let tokens = Lexer::new(source).lex().expect("lexing failed");
        let program = Parser::new(tokens)
            .parse_program()
            .expect("program should parse");

        let formatted = format_program(&program);

        let tokens = Lexer::new(&formatted).lex().expect("formatted output should lex");
        let reparsed = Parser::new(tokens)
            .parse_program()
            .unwrap_or_else(|e| panic!("formatted output should re-parse: {e}\n{formatted}"));

        assert_eq!(program, reparsed, "formatted output:\n{formatted}");
    }

    #[test]
    fn test_roundtrip_globals_and_externs() {
        roundtrip("extern int print_int(int x); int g; float fs[4]; bool b;");
    }

    #[test]
    fn test_roundtrip_expressions() {
        roundtrip(
            "int f(int a, int b) { return a + b * (a - b) / 2 % 3; } \
             bool g(int a, bool c) { return !(a < 3) && c || a != 4; }",
        );
    }

    #[test]
    fn test_roundtrip_assignment_chain() {
        roundtrip("int f(void) { int a; int b; a = b = 3; return -a; }");
    }

    #[test]
    fn test_roundtrip_control_flow() {
        roundtrip(
            "int fib(int n) { \
               int a; int b; int t; int i; \
               a = 0; b = 1; i = 0; \
               while (i < n) { t = a + b; a = b; b = t; i = i + 1; } \
               if (n <= 0) { return 0; } else { return a; } \
             }",
        );
    }

    #[test]
    fn test_roundtrip_arrays() {
        roundtrip(
            "int m[10][10]; \
             int sum(int a[10], int n) { \
               int i; int total; \
               i = 0; total = 0; \
               while (i < n) { total = total + a[i] + m[i][i]; i = i + 1; } \
               return total; \
             }",
        );
    }

    #[test]
    fn test_roundtrip_float_literals_keep_their_dot() {
        roundtrip("float f(void) { float x; x = 5.0; x = 0.5; x = 3.14; return x; }");
    }

    #[test]
    fn test_roundtrip_while_with_statement_body() {
        roundtrip("void f(int x) { while (x > 0) x = x - 1; }");
    }

    #[test]
    fn test_roundtrip_void_function_and_calls() {
        roundtrip(
            "extern int print_int(int x); \
             void tick(void) { print_int(1); } \
             void run(int n) { while (n > 0) { tick(); n = n - 1; } }",
        );
    }

    #[test]
    fn test_block_layout() {
        let tokens = Lexer::new("int f(void) { int x; x = 1; { x = 2; } return x; }")
            .lex()
            .unwrap();
        let program = Parser::new(tokens).parse_program().unwrap();

        assert_eq!(
            "int f(void) {\n    int x;\n    x = 1;\n    {\n        x = 2;\n    }\n    return x;\n}\n",
            format_program(&program)
        );
    }
}
