//! Structurally recursive pass from the AST to SSA IR. Mutable bindings live
//! in stack slots so control flow needs no phi placement; promotions are
//! applied wherever a value meets a differently-typed use site.

mod context;
mod declaration;
mod error;
mod expression;
mod statement;

pub use context::{Binding, LowererContext};
pub use declaration::register_extern;
pub use error::LowerError;

use log::debug;

use crate::parser::ast::Program;

pub trait Lower {
    type Output;

    fn lower(&self, ctx: &mut LowererContext) -> Result<Self::Output, LowerError>;
}

/// Lowers a whole program: extern prototypes first (handle registration
/// only), then every top-level declaration in source order. The first error
/// aborts; no partial IR is handed back.
pub fn lower_program(program: &Program, ctx: &mut LowererContext) -> Result<(), LowerError> {
    debug!(
        "lowering program: {} extern(s), {} declaration(s)",
        program.externs.len(),
        program.declarations.len()
    );

    for prototype in &program.externs {
        register_extern(prototype, ctx)?;
    }

    for declaration in &program.declarations {
        declaration.lower(ctx)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{lexer::Lexer, parser::Parser};

    use super::*;

    fn lower_source(source: &str) -> Result<String, LowerError> {
        let tokens = Lexer::new(source).lex().expect("lexing failed");
        let program = Parser::new(tokens)
            .parse_program()
            .expect("program should parse");

        let mut ctx = LowererContext::new("test");
        lower_program(&program, &mut ctx)?;

        Ok(ctx.finish().print_to_string())
    }

    #[test]
    fn test_int_to_float_assignment_widens() {
        let ir = lower_source("int f(void) { float x; int i; x = i; return 0; }").unwrap();

        assert!(ir.contains("sitofp i32"), "missing widening in:\n{ir}");
    }

    #[test]
    fn test_float_to_int_assignment_is_rejected() {
        let error = lower_source("int f(void) { int i; float x; i = x; return 0; }").unwrap_err();

        assert_eq!(
            LowerError::IllegalConversion {
                from: "float".into(),
                to: "int".into(),
                position: Default::default(),
            },
            error
        );
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        let error = lower_source("int f(void) { return y; }").unwrap_err();

        assert!(matches!(error, LowerError::UndefinedVariable { ref name, .. } if name == "y"));
    }

    #[test]
    fn test_duplicate_global_is_fatal() {
        let error = lower_source("int g; float g; int f(void) { return 0; }").unwrap_err();

        assert!(matches!(error, LowerError::DuplicateGlobal { ref name, .. } if name == "g"));
    }

    #[test]
    fn test_function_redefinition_is_fatal() {
        let error =
            lower_source("int f(void) { return 0; } int f(void) { return 1; }").unwrap_err();

        assert!(matches!(error, LowerError::RedefinedFunction { ref name, .. } if name == "f"));
    }

    #[test]
    fn test_arity_mismatch_is_fatal() {
        let error =
            lower_source("int id(int n) { return n; } int f(void) { return id(1, 2); }")
                .unwrap_err();

        assert!(matches!(
            error,
            LowerError::ArityMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_void_call_as_value_is_rejected() {
        let error =
            lower_source("void v(void) {} int f(void) { int x; x = v(); return x; }").unwrap_err();

        assert!(matches!(error, LowerError::VoidValue { ref name, .. } if name == "v"));
    }

    #[test]
    fn test_void_call_as_statement_is_allowed() {
        let ir = lower_source("void v(void) {} int f(void) { v(); return 0; }").unwrap();

        assert!(ir.contains("call void @v()"));
    }

    #[test]
    fn test_return_value_in_void_function_is_rejected() {
        let error = lower_source("void f(void) { return 1; }").unwrap_err();

        assert!(matches!(error, LowerError::ReturnValueInVoidFunction { .. }));
    }

    #[test]
    fn test_bare_return_in_value_function_is_rejected() {
        let error = lower_source("int f(void) { return; }").unwrap_err();

        assert!(matches!(error, LowerError::MissingReturnValue { .. }));
    }

    #[test]
    fn test_implicit_returns() {
        let ir = lower_source("void v(void) {} int f(void) { int x; x = 1; }").unwrap();

        assert!(ir.contains("ret void"));
        assert!(ir.contains("ret i32 0"));
    }

    #[test]
    fn test_shadowed_binding_is_restored_after_block() {
        // the inner x is a float; the final store goes back to the outer int
        let ir = lower_source(
            "int f(void) { int x; { float x; x = 1.5; } x = 2; return x; }",
        )
        .unwrap();

        assert!(ir.contains("store i32 2, ptr %x.addr.1"), "in:\n{ir}");
    }

    #[test]
    fn test_extern_then_definition_shares_the_symbol() {
        let ir = lower_source(
            "extern int helper(int x); int helper(int x) { return x; } \
             int f(void) { return helper(3); }",
        )
        .unwrap();

        assert!(!ir.contains("declare i32 @helper"));
        assert!(ir.contains("define i32 @helper(i32 %x)"));
        assert_eq!(1, ir.matches("@helper(").count() - ir.matches("call i32 @helper(").count());
    }

    #[test]
    fn test_extern_definition_mismatch_is_fatal() {
        let error =
            lower_source("extern int helper(int x); float helper(int x) { return 1.0; }")
                .unwrap_err();

        assert!(matches!(error, LowerError::PrototypeMismatch { ref name, .. } if name == "helper"));
    }

    #[test]
    fn test_modulo_rejects_float_operands() {
        let error = lower_source("int f(float x) { return 4 % x; }").unwrap_err();

        assert!(matches!(error, LowerError::InvalidOperands { ref op, .. } if op == "%"));
    }

    #[test]
    fn test_logical_operators_are_not_short_circuiting() {
        // both calls must be emitted even though the left side decides
        let ir = lower_source(
            "int one(void) { return 1; } int two(void) { return 2; } \
             bool f(void) { return one() && two(); }",
        )
        .unwrap();

        assert!(ir.contains("call i32 @one()"));
        assert!(ir.contains("call i32 @two()"));
        assert!(ir.contains("and i1"));
    }

    #[test]
    fn test_array_as_bare_value_is_rejected() {
        let error = lower_source("int f(void) { int a[3]; return a; }").unwrap_err();

        assert!(matches!(error, LowerError::ArrayAsValue { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_subscript_count_must_match_rank() {
        let error = lower_source("int b[4][4]; int f(void) { return b[1]; }").unwrap_err();

        assert!(matches!(
            error,
            LowerError::SubscriptMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_declared_array_indexing_uses_leading_zero_gep() {
        let ir = lower_source("int b[4][4]; int f(int i) { return b[i][2]; }").unwrap();

        assert!(
            ir.contains("getelementptr [4 x [4 x i32]], ptr @b, i32 0, i32 %i."),
            "in:\n{ir}"
        );
    }

    #[test]
    fn test_param_array_indexing_linearizes_offset() {
        let ir = lower_source("int f(int a[10][5], int i, int j) { return a[i][j]; }").unwrap();

        // offset = i * 5 + j on the decayed element pointer
        assert!(ir.contains("mul i32"), "in:\n{ir}");
        assert!(ir.contains("getelementptr i32, ptr %a.ptr."), "in:\n{ir}");
    }

    #[test]
    fn test_array_argument_decays_to_pointer() {
        let ir = lower_source(
            "int total(int a[10]) { return a[0]; } \
             int g[10]; \
             int f(void) { int l[10]; return total(g) + total(l); }",
        )
        .unwrap();

        assert!(ir.contains("call i32 @total(ptr @g)"), "in:\n{ir}");
        assert!(ir.contains("call i32 @total(ptr %l.addr."), "in:\n{ir}");
    }

    #[test]
    fn test_scalar_argument_to_array_parameter_is_rejected() {
        let error =
            lower_source("int total(int a[10]) { return a[0]; } int f(void) { return total(5); }")
                .unwrap_err();

        assert!(matches!(error, LowerError::InvalidArrayArgument { .. }));
    }

    #[test]
    fn test_condition_promotes_int_to_bool() {
        let ir = lower_source("int f(int x) { if (x) { return 1; } return 0; }").unwrap();

        assert!(ir.contains("icmp ne i32"), "in:\n{ir}");
        assert!(ir.contains("br i1"));
    }

    #[test]
    fn test_statements_after_return_are_skipped() {
        let ir = lower_source("int f(void) { return 1; return 2; }").unwrap();

        assert!(ir.contains("ret i32 1"));
        assert!(!ir.contains("ret i32 2"));
    }

    #[test]
    fn test_if_with_both_branches_returning_leaves_no_dangling_block() {
        let ir = lower_source(
            "int f(int x) { if (x) { return 1; } else { return 2; } }",
        )
        .unwrap();

        // the merge block is unreachable and must not survive serialization
        assert!(!ir.contains("if.end"), "in:\n{ir}");
    }

    #[test]
    fn test_while_loop_block_structure() {
        let ir = lower_source(
            "int f(int n) { int i; i = 0; while (i < n) { i = i + 1; } return i; }",
        )
        .unwrap();

        assert!(ir.contains("while.condition"));
        assert!(ir.contains("while.body"));
        assert!(ir.contains("while.end"));
        assert!(ir.contains("icmp slt i32"));
    }

    #[test]
    fn test_float_comparison_uses_unordered_predicates() {
        let ir = lower_source("bool f(float x, float y) { return x < y; }").unwrap();

        assert!(ir.contains("fcmp ult float"));
    }

    #[test]
    fn test_mixed_arithmetic_promotes_to_float() {
        let ir = lower_source("float f(int i, float x) { return i + x; }").unwrap();

        assert!(ir.contains("sitofp i32"));
        assert!(ir.contains("fadd float"));
    }

    #[test]
    fn test_unary_minus_on_float_uses_fneg() {
        let ir = lower_source("float f(float x) { return -x; }").unwrap();

        assert!(ir.contains("fneg float"));
    }

    #[test]
    fn test_assignment_yields_the_stored_value() {
        let ir = lower_source("int f(void) { int a; int b; a = b = 3; return a; }").unwrap();

        // the inner store's value feeds the outer store
        assert_eq!(2, ir.matches("store i32 3").count(), "in:\n{ir}");
    }
}
