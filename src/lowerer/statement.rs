//! # Statement Lowering
//!
//! This module lowers statements and blocks into SSA instructions and the
//! control-flow graph. It is where basic blocks are created, where the
//! insertion point moves, and where scope save/restore happens.
//!
//! ## Control Flow Strategy
//!
//! All mutable bindings live in entry-block stack slots, so control flow
//! needs no phi placement: every block loads what it needs and stores what
//! it changes. The two branching constructs follow fixed block shapes:
//!
//! ```text
//! If:     current → (if.then, if.else?) → if.end
//! While:  current → while.condition → (while.body | while.end)
//!                   while.body → while.condition
//! ```
//!
//! After either construct, the insertion point is the merge/exit block, so
//! subsequent statements continue there.
//!
//! ## Terminator Discipline
//!
//! Every emitted basic block ends in exactly one terminator:
//!
//! - branches back to a header or onward to a merge block are only emitted
//!   when the current block is still open (`Builder::has_terminator`);
//! - a `return` terminates the block, and the enclosing [`Block`] stops
//!   lowering the statements after it;
//! - a merge block that ends up unreachable (both branches returned) is
//!   dropped at serialization time.
//!
//! ## Scope Discipline
//!
//! A block's local declarations shadow outer bindings for the extent of the
//! block only. The displaced bindings are recorded on the way in and put
//! back, in reverse order, on the way out.

use log::debug;

use crate::{
    ir::IrType,
    parser::ast::{Block, Expression, If, LocalDeclaration, Return, Statement, TypeName, WhileLoop},
};

use super::{
    context::{ArrayInfo, ScalarSlot},
    expression::{coerce_to_bool, lower_call},
    Lower, LowerError, LowererContext,
};

impl Lower for Statement {
    type Output = ();

    /// Dispatches one statement to its lowering.
    ///
    /// The only logic of its own is the expression-statement case: a call
    /// to a void function is legal as a whole statement and nowhere else,
    /// so the call is emitted directly instead of going through expression
    /// lowering (which would reject the missing value).
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        match self {
            Statement::Expression(expression) => {
                // a call to a void function is legal here and only here
                if let Expression::Call(call) = expression {
                    lower_call(call, ctx)?;
                } else {
                    expression.lower(ctx)?;
                }
                Ok(())
            }
            Statement::Block(block) => block.lower(ctx),
            Statement::If(if_stmt) => if_stmt.lower(ctx),
            Statement::While(while_loop) => while_loop.lower(ctx),
            Statement::Return(ret) => ret.lower(ctx),
        }
    }
}

impl Lower for Block {
    type Output = ();

    /// Lowers `{ local_decl* stmt* }`.
    ///
    /// ## Local Declarations
    ///
    /// Each declaration first displaces any function-local binding of the
    /// same name (the saved record restores it later), then materializes
    /// storage:
    ///
    /// - **Scalars**: an entry-block alloca plus a store of the typed zero
    ///   value, so every variable reads as zero before its first
    ///   assignment.
    /// - **Arrays**: an entry-block alloca of the aggregate type plus a
    ///   `zeroinitializer` store, zeroing the whole storage each time the
    ///   block is entered.
    ///
    /// Allocas always land in the entry block regardless of how deeply the
    /// block nests; only the zero store executes at the block's position,
    /// which is what re-zeroes loop-local variables on every iteration.
    ///
    /// ## Statements
    ///
    /// Statements lower in order. Once the current basic block has a
    /// terminator (a `return` was lowered), the remaining statements of the
    /// block are unreachable and are skipped entirely.
    ///
    /// ## Exit
    ///
    /// Saved bindings are restored in reverse declaration order, so the
    /// outer meaning of every shadowed name is observable again after the
    /// closing brace.
    ///
    /// # Errors
    ///
    /// Propagates the first error from any declaration or statement; the
    /// saved bindings are not restored in that case because compilation
    /// aborts.
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        let mut saved = Vec::with_capacity(self.declarations.len());

        for declaration in &self.declarations {
            saved.push(ctx.shadow(declaration.name()));

            match declaration {
                LocalDeclaration::Scalar {
                    type_name, name, ..
                } => {
                    let ty = LowererContext::ir_type(*type_name);
                    let ptr = ctx.builder.build_entry_alloca(name, &ty);
                    let zero = ctx.zero_value(*type_name);
                    ctx.builder.build_store(&zero, &ptr);
                    ctx.declare_local_scalar(
                        name,
                        ScalarSlot {
                            type_name: *type_name,
                            ptr,
                        },
                    );
                }
                LocalDeclaration::Array {
                    element_type,
                    name,
                    dimensions,
                    ..
                } => {
                    let element = LowererContext::ir_type(*element_type);
                    let aggregate = IrType::array_of(element, dimensions);
                    let ptr = ctx.builder.build_entry_alloca(name, &aggregate);
                    ctx.builder.build_zero_store(&aggregate, &ptr);
                    ctx.declare_local_array(
                        name,
                        ArrayInfo {
                            element_type: *element_type,
                            dimensions: dimensions.clone(),
                            ptr,
                        },
                    );
                }
            }
        }

        for statement in &self.statements {
            statement.lower(ctx)?;

            // a return already ended this block; whatever follows in the
            // source is unreachable and is skipped
            if ctx.builder.has_terminator() {
                break;
            }
        }

        while let Some(binding) = saved.pop() {
            ctx.restore(binding);
        }

        Ok(())
    }
}

impl Lower for If {
    type Output = ();

    /// Lowers `if (cond) { ... } else { ... }`.
    ///
    /// ## Block Structure
    ///
    /// Two or three blocks are appended to the current function:
    ///
    /// ```llvm
    ///   %ifcond = icmp ne i32 %x, 0
    ///   br i1 %ifcond, label %if.then, label %if.else
    ///
    /// if.then:
    ///   ...
    ///   br label %if.end
    ///
    /// if.else:                          ; only when an else branch exists
    ///   ...
    ///   br label %if.end
    ///
    /// if.end:
    ///   ; insertion point after the statement
    /// ```
    ///
    /// Without an `else`, the false edge of the conditional branch targets
    /// `if.end` directly.
    ///
    /// ## Condition Handling
    ///
    /// The condition value is coerced to `i1` through the promotion matrix
    /// (`int` and `float` compare against zero), so any scalar condition
    /// branches correctly.
    ///
    /// ## Terminators
    ///
    /// Each branch gets its jump to `if.end` only if it did not already
    /// terminate itself with a `return`. When both branches return, the
    /// merge block stays empty and unreachable, and serialization drops it.
    ///
    /// # Errors
    ///
    /// Fails when the condition cannot lower or cannot coerce to bool, or
    /// when either branch fails.
    ///
    /// # Panics
    ///
    /// Statements only lower inside a function body; the current-function
    /// handle is an invariant of the walk.
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        let condition = self.condition.lower(ctx)?;
        let condition = coerce_to_bool(condition, self.condition.position(), ctx)?;

        let function = ctx
            .current_function
            .expect("statements are lowered inside a function")
            .id;

        let then_block = ctx.builder.append_basic_block(function, "if.then");
        let else_block = self
            .else_block
            .as_ref()
            .map(|_| ctx.builder.append_basic_block(function, "if.else"));
        let merge_block = ctx.builder.append_basic_block(function, "if.end");

        ctx.builder
            .build_conditional_branch(&condition, then_block, else_block.unwrap_or(merge_block));

        ctx.builder.position_at_end(then_block);
        self.then_block.lower(ctx)?;
        if !ctx.builder.has_terminator() {
            ctx.builder.build_unconditional_branch(merge_block);
        }

        if let (Some(else_ast), Some(else_block)) = (&self.else_block, else_block) {
            ctx.builder.position_at_end(else_block);
            else_ast.lower(ctx)?;
            if !ctx.builder.has_terminator() {
                ctx.builder.build_unconditional_branch(merge_block);
            }
        }

        ctx.builder.position_at_end(merge_block);

        Ok(())
    }
}

impl Lower for WhileLoop {
    type Output = ();

    /// Lowers `while (cond) body`.
    ///
    /// ## Block Structure
    ///
    /// Three blocks implement condition-controlled iteration:
    ///
    /// ```llvm
    ///   br label %while.condition
    ///
    /// while.condition:
    ///   %loopcond = icmp slt i32 %i, %n
    ///   br i1 %loopcond, label %while.body, label %while.end
    ///
    /// while.body:
    ///   ...
    ///   br label %while.condition
    ///
    /// while.end:
    ///   ; insertion point after the loop
    /// ```
    ///
    /// ## Condition Evaluation
    ///
    /// The condition lowers inside `while.condition`, so it re-evaluates at
    /// the top of every iteration and sees the stores the body made. As
    /// with `if`, the value is coerced to `i1` through the promotion
    /// matrix.
    ///
    /// ## Body and Back Edge
    ///
    /// The body may be any statement; a block body manages its own scope.
    /// The back edge to the condition is emitted only when the body fell
    /// through, so a body that returns keeps its `ret` as the sole
    /// terminator.
    ///
    /// # Errors
    ///
    /// Fails when the condition cannot lower or coerce to bool, or when the
    /// body fails.
    ///
    /// # Panics
    ///
    /// Statements only lower inside a function body; the current-function
    /// handle is an invariant of the walk.
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        let function = ctx
            .current_function
            .expect("statements are lowered inside a function")
            .id;

        let condition_block = ctx.builder.append_basic_block(function, "while.condition");
        let body_block = ctx.builder.append_basic_block(function, "while.body");
        let end_block = ctx.builder.append_basic_block(function, "while.end");

        ctx.builder.build_unconditional_branch(condition_block);

        // the condition re-evaluates at the top of every iteration
        ctx.builder.position_at_end(condition_block);
        let condition = self.condition.lower(ctx)?;
        let condition = coerce_to_bool(condition, self.condition.position(), ctx)?;
        ctx.builder
            .build_conditional_branch(&condition, body_block, end_block);

        ctx.builder.position_at_end(body_block);
        self.body.lower(ctx)?;
        if !ctx.builder.has_terminator() {
            ctx.builder.build_unconditional_branch(condition_block);
        }

        ctx.builder.position_at_end(end_block);

        Ok(())
    }
}

impl Lower for Return {
    type Output = ();

    /// Lowers `return;` and `return expr;`.
    ///
    /// ## Type Checking
    ///
    /// The statement is checked against the enclosing function's declared
    /// return type:
    ///
    /// - a value in a `void` function is rejected;
    /// - a bare `return` in a value-returning function is rejected;
    /// - otherwise the value is promoted to the declared return type, which
    ///   widens `int` to `float` but refuses the narrowing direction.
    ///
    /// ## Terminator Placement
    ///
    /// `ret` terminates the current block. The enclosing [`Block`] notices
    /// the terminator and skips the statements after it, which keeps every
    /// block at exactly one terminator.
    ///
    /// # Errors
    ///
    /// [`LowerError::ReturnValueInVoidFunction`],
    /// [`LowerError::MissingReturnValue`], or an
    /// [`LowerError::IllegalConversion`] from promoting the value.
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        let current = ctx
            .current_function
            .expect("return is lowered inside a function");

        match &self.value {
            Some(expression) => {
                if current.return_type == TypeName::Void {
                    return Err(LowerError::ReturnValueInVoidFunction {
                        position: self.position,
                    });
                }

                let value = expression.lower(ctx)?;
                let target = LowererContext::ir_type(current.return_type);
                let value = ctx.promote(value, &target).map_err(|(from, to)| {
                    LowerError::IllegalConversion {
                        from: from.into(),
                        to: to.into(),
                        position: expression.position(),
                    }
                })?;

                debug!("emitting return of type {target}");
                ctx.builder.build_return(Some(&value));
            }
            None => {
                if current.return_type != TypeName::Void {
                    return Err(LowerError::MissingReturnValue {
                        position: self.position,
                    });
                }
                ctx.builder.build_return(None);
            }
        }

        Ok(())
    }
}
