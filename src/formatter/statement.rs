//! Printing of declarations, statements and blocks.
//!
//! Layout responsibilities live here: which constructs claim a line of
//! their own, where blocks open and close, and how control-flow headers
//! continue onto their bodies. Everything expression-shaped is delegated
//! to the expression formatter.

use std::fmt::{self, Write};

use crate::{
    formatter::{Format, FormatterContext},
    parser::ast::{
        Block, Declaration, FunctionDeclaration, If, LocalDeclaration, Parameter, Program,
        Prototype, Return, Statement, WhileLoop,
    },
};

impl Format for Program {
    /// Prints extern prototypes first, then the top-level declarations, all
    /// in source order and one per line. This matches the grammar: a
    /// program is an extern list followed by a declaration list, so the
    /// printed text is directly re-parseable.
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        for prototype in &self.externs {
            ctx.line(|ctx| {
                ctx.write_str("extern ")?;
                prototype.format(ctx)?;
                ctx.write_str(";")
            })?;
        }

        for declaration in &self.declarations {
            ctx.line(|ctx| declaration.format(ctx))?;
        }

        Ok(())
    }
}

impl Format for Prototype {
    /// `<type> <name>(<params>)`. An empty parameter list prints as
    /// `(void)`, the explicit spelling, so a prototype never depends on the
    /// reader knowing that `()` and `(void)` are the same thing.
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        write!(ctx, "{} {}(", self.return_type, self.name)?;
        if self.parameters.is_empty() {
            ctx.write_str("void")?;
        } else {
            ctx.join(&self.parameters, ", ")?;
        }
        ctx.write_str(")")
    }
}

impl Format for Parameter {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        write!(ctx, "{} {}", self.type_name, self.name)?;
        for dim in &self.dimensions {
            write!(ctx, "[{dim}]")?;
        }
        Ok(())
    }
}

impl Format for Declaration {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        match self {
            Declaration::GlobalScalar {
                type_name, name, ..
            } => {
                write!(ctx, "{type_name} {name};")
            }
            Declaration::GlobalArray {
                element_type,
                name,
                dimensions,
                ..
            } => {
                write!(ctx, "{element_type} {name}")?;
                for dim in dimensions {
                    write!(ctx, "[{dim}]")?;
                }
                ctx.write_str(";")
            }
            Declaration::Function(function) => function.format(ctx),
        }
    }
}

impl Format for FunctionDeclaration {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        self.prototype.format(ctx)?;
        ctx.write_str(" ")?;
        self.body.format(ctx)
    }
}

impl Format for Block {
    /// Local declarations print before the statements, as the grammar
    /// requires; both get a line each inside the braces.
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        ctx.braced(|ctx| {
            for declaration in &self.declarations {
                ctx.line(|ctx| declaration.format(ctx))?;
            }
            for statement in &self.statements {
                ctx.line(|ctx| statement.format(ctx))?;
            }
            Ok(())
        })
    }
}

impl Format for LocalDeclaration {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        match self {
            LocalDeclaration::Scalar {
                type_name, name, ..
            } => write!(ctx, "{type_name} {name};"),
            LocalDeclaration::Array {
                element_type,
                name,
                dimensions,
                ..
            } => {
                write!(ctx, "{element_type} {name}")?;
                for dim in dimensions {
                    write!(ctx, "[{dim}]")?;
                }
                ctx.write_str(";")
            }
        }
    }
}

impl Format for Statement {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        match self {
            Statement::Expression(expression) => {
                expression.format(ctx)?;
                ctx.write_str(";")
            }
            Statement::Block(block) => block.format(ctx),
            Statement::If(if_stmt) => if_stmt.format(ctx),
            Statement::While(while_loop) => while_loop.format(ctx),
            Statement::Return(ret) => ret.format(ctx),
        }
    }
}

impl Format for If {
    /// `if (<cond>) { ... }` with an optional `else { ... }` continuing on
    /// the closing brace's line. Both branches are always braced, so the
    /// dangling-else question never arises in printed output.
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        ctx.write_str("if (")?;
        self.condition.format(ctx)?;
        ctx.write_str(") ")?;
        self.then_block.format(ctx)?;
        if let Some(else_block) = &self.else_block {
            ctx.write_str(" else ")?;
            else_block.format(ctx)?;
        }
        Ok(())
    }
}

impl Format for WhileLoop {
    /// The body is any statement. A block body opens braces on the header
    /// line; a single-statement body continues the line after `)`.
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        ctx.write_str("while (")?;
        self.condition.format(ctx)?;
        ctx.write_str(") ")?;
        self.body.format(ctx)
    }
}

impl Format for Return {
    fn format(&self, ctx: &mut FormatterContext) -> fmt::Result {
        match &self.value {
            Some(value) => {
                ctx.write_str("return ")?;
                value.format(ctx)?;
                ctx.write_str(";")
            }
            None => ctx.write_str("return;"),
        }
    }
}
