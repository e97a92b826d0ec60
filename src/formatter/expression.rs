//! Printing of expressions.
//!
//! The structural concern here is parenthesization. The AST has no
//! parenthesis node; grouping is implied by the tree shape. Printing walks
//! the tree with a minimum binding strength and re-inserts `(` `)` exactly
//! where a child binds looser than its position requires, so the printed
//! text re-parses into the same tree.
//!
//! ## Binding strengths
//!
//! Levels mirror the parser's stratification, tighter is larger:
//!
//! ```text
//! 1  =            (right-associative)
//! 2  ||
//! 3  &&
//! 4  ==  !=
//! 5  <  <=  >  >=
//! 6  +  -
//! 7  *  /  %
//! 8  -  !          (prefix)
//! 9  literals, names, indexing, calls
//! ```
//!
//! A left-associative binary at level `n` requires level `n` on its left
//! child and level `n + 1` on its right child; a prefix operator requires
//! level 8 of its operand. Everything else prints bare.

use std::fmt::{self, Write};

use crate::{
    formatter::{Format, FormatterContext},
    parser::ast::{
        ArrayIndex, Assign, AssignTarget, Binary, BinaryOperator, Call, Expression, Unary,
        Variable,
    },
};

fn precedence(expression: &Expression) -> u8 {
    match expression {
        Expression::Assign(_) => 1,
        Expression::Binary(binary) => binary_precedence(binary.op),
        Expression::Unary(_) => 8,
        Expression::IntLit(..)
        | Expression::FloatLit(..)
        | Expression::BoolLit(..)
        | Expression::Variable(_)
        | Expression::ArrayIndex(_)
        | Expression::Call(_) => 9,
    }
}

fn binary_precedence(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Or => 2,
        BinaryOperator::And => 3,
        BinaryOperator::Equal | BinaryOperator::NotEqual => 4,
        BinaryOperator::LessThan
        | BinaryOperator::LessOrEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterOrEqual => 5,
        BinaryOperator::Add | BinaryOperator::Subtract => 6,
        BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 7,
    }
}

/// Prints `expression`, wrapped in parentheses when it binds looser than
/// the position it appears in demands.
fn format_operand(
    expression: &Expression,
    min_precedence: u8,
    ctx: &mut FormatterContext,
) -> fmt::Result {
    if precedence(expression) < min_precedence {
        ctx.write_str("(")?;
        expression.format(ctx)?;
        ctx.write_str(")")
    } else {
        expression.format(ctx)
    }
}

impl Format for Expression {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        match self {
            Expression::IntLit(value, _) => write!(ctx, "{value}"),
            Expression::FloatLit(value, _) => {
                // keep the dot so the literal lexes as a float again
                if value.fract() == 0.0 && value.is_finite() {
                    write!(ctx, "{value:.1}")
                } else {
                    write!(ctx, "{value}")
                }
            }
            Expression::BoolLit(value, _) => ctx.write_str(if *value { "true" } else { "false" }),
            Expression::Variable(variable) => variable.format(ctx),
            Expression::ArrayIndex(index) => index.format(ctx),
            Expression::Unary(unary) => unary.format(ctx),
            Expression::Binary(binary) => binary.format(ctx),
            Expression::Assign(assign) => assign.format(ctx),
            Expression::Call(call) => call.format(ctx),
        }
    }
}

impl Format for Variable {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        ctx.write_str(&self.name)
    }
}

impl Format for ArrayIndex {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        ctx.write_str(&self.name)?;
        for index in &self.indices {
            ctx.write_str("[")?;
            index.format(ctx)?;
            ctx.write_str("]")?;
        }
        Ok(())
    }
}

impl Format for Unary {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        write!(ctx, "{}", self.op)?;
        format_operand(&self.operand, 8, ctx)
    }
}

impl Format for Binary {
    /// Left-associative printing: the right child needs strictly tighter
    /// binding than the operator itself, otherwise `a - (b - c)` would
    /// print the same as `a - b - c`.
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        let level = binary_precedence(self.op);

        format_operand(&self.left, level, ctx)?;
        write!(ctx, " {} ", self.op)?;
        format_operand(&self.right, level + 1, ctx)
    }
}

impl Format for Assign {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        match &self.target {
            AssignTarget::Variable(variable) => variable.format(ctx)?,
            AssignTarget::ArrayIndex(index) => index.format(ctx)?,
        }
        ctx.write_str(" = ")?;
        self.value.format(ctx)
    }
}

impl Format for Call {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        ctx.write_str(&self.callee)?;
        ctx.write_str("(")?;
        ctx.join(&self.args, ", ")?;
        ctx.write_str(")")
    }
}
