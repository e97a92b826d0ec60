//! # Expression Lowering
//!
//! This module turns expression nodes into SSA values. Every lowering
//! returns the [`Value`] it produced, typed as `i32`, `float` or `i1`;
//! statement-level code decides what to do with it.
//!
//! ## Type Promotion
//!
//! Wherever a value meets a differently-typed use site, the promotion
//! matrix from [`LowererContext::promote`] applies:
//!
//! | from \ to | int        | float               | bool          |
//! |-----------|------------|---------------------|---------------|
//! | int       | id         | `sitofp`            | `icmp ne 0`   |
//! | float     | rejected   | id                  | `fcmp une 0`  |
//! | bool      | `zext`     | `zext` + `sitofp`   | id            |
//!
//! Binary operands are first brought to a common type: float wins over
//! int, int wins over bool. Rejections surface as
//! [`LowerError::IllegalConversion`] at the offending operand's position.
//!
//! ## Addressing
//!
//! Scalar variables load from their stack slot or global. Array elements
//! go through [`lower_element_pointer`], which produces a pointer in one of
//! two shapes:
//!
//! - declared arrays: one GEP over the aggregate type with a leading zero
//!   index and one index per subscript;
//! - array parameters: the stored pointer is loaded back and indexed with
//!   a single linearized offset, because the aggregate's outermost extent
//!   was erased at the call boundary.
//!
//! ## Error Policy
//!
//! Every semantic error is fatal and reported at the position of the token
//! that introduced the offending node; no partial instructions are cleaned
//! up because compilation stops at the first error.

use crate::{
    ir::{FloatPredicate, IntPredicate, IrType, Value},
    lexer::Span,
    parser::ast::{
        ArrayIndex, Assign, AssignTarget, Binary, BinaryOperator, Call, Expression, Parameter,
        TypeName, Unary, UnaryOperator,
    },
};

use super::{
    context::{ArrayInfo, Binding},
    Lower, LowerError, LowererContext,
};

impl Lower for Expression {
    type Output = Value;

    /// Lowers one expression to the SSA value it denotes.
    ///
    /// ## Variable References
    ///
    /// Names resolve in scope order (local scalars, local arrays, parameter
    /// arrays, globals). A scalar reference emits a `load` from its slot.
    /// An array name in a value position is rejected; arrays only appear
    /// subscripted or as call arguments.
    ///
    /// ## Calls
    ///
    /// A call in value position must produce a value, so a void callee is
    /// rejected here with [`LowerError::VoidValue`]. Statement position
    /// goes through [`lower_call`] directly and accepts void.
    ///
    /// # Errors
    ///
    /// Undefined names, array-as-value uses, void calls in value position,
    /// and anything the operator or call lowering below rejects.
    fn lower(&self, ctx: &mut LowererContext) -> Result<Value, LowerError> {
        match self {
            Expression::IntLit(value, _) => Ok(ctx.builder.const_int(*value)),
            Expression::FloatLit(value, _) => Ok(ctx.builder.const_float(*value)),
            Expression::BoolLit(value, _) => Ok(ctx.builder.const_bool(*value)),
            Expression::Variable(variable) => match ctx.find_binding(&variable.name) {
                Some(Binding::LocalScalar(slot)) | Some(Binding::GlobalScalar(slot)) => {
                    let ty = LowererContext::ir_type(slot.type_name);
                    let ptr = slot.ptr.clone();
                    Ok(ctx.builder.build_load(ty, &ptr, &variable.name))
                }
                Some(_) => Err(LowerError::ArrayAsValue {
                    name: variable.name.clone(),
                    position: variable.position,
                }),
                None => Err(LowerError::UndefinedVariable {
                    name: variable.name.clone(),
                    position: variable.position,
                }),
            },
            Expression::ArrayIndex(index) => {
                let (ptr, element_type) = lower_element_pointer(index, ctx)?;
                let ty = LowererContext::ir_type(element_type);
                Ok(ctx
                    .builder
                    .build_load(ty, &ptr, &format!("{}.elem", index.name)))
            }
            Expression::Unary(unary) => unary.lower(ctx),
            Expression::Binary(binary) => binary.lower(ctx),
            Expression::Assign(assign) => assign.lower(ctx),
            Expression::Call(call) => {
                lower_call(call, ctx)?.ok_or_else(|| LowerError::VoidValue {
                    name: call.callee.clone(),
                    position: call.position,
                })
            }
        }
    }
}

impl Lower for Unary {
    type Output = Value;

    /// Lowers prefix `-` and `!`.
    ///
    /// - `-` emits `fneg` on floats and `sub 0, x` otherwise;
    /// - `!` coerces the operand to `i1` first, then complements it with
    ///   `xor i1 x, true`.
    ///
    /// Prefix operators stack, so `!!x` lowers as two complements over one
    /// coercion chain.
    fn lower(&self, ctx: &mut LowererContext) -> Result<Value, LowerError> {
        let operand = self.operand.lower(ctx)?;

        match self.op {
            UnaryOperator::Minus => {
                if operand.ty() == &IrType::Float {
                    Ok(ctx.builder.build_fneg(&operand, "neg"))
                } else {
                    Ok(ctx.builder.build_neg(&operand, "neg"))
                }
            }
            UnaryOperator::Not => {
                let operand = coerce_to_bool(operand, self.operand.position(), ctx)?;
                Ok(ctx.builder.build_not(&operand, "not"))
            }
        }
    }
}

impl Lower for Binary {
    type Output = Value;

    /// Lowers a binary operation.
    ///
    /// ## Logical Operators
    ///
    /// `&&` and `||` are **not** short-circuiting: both operands are
    /// evaluated unconditionally (observable when they call functions with
    /// side effects), coerced to `i1`, and combined with bitwise
    /// `and`/`or`.
    ///
    /// ## Arithmetic and Comparisons
    ///
    /// The operands are first brought to their common type, then the
    /// operator dispatches on it:
    ///
    /// ```llvm
    /// %add = add i32 %a, %b          ; int operands
    /// %add = fadd float %a, %b       ; float operands
    /// %cmp = icmp slt i32 %a, %b     ; signed comparison family
    /// %cmp = fcmp ult float %a, %b   ; unordered comparison family
    /// ```
    ///
    /// Comparisons always produce `i1`. `%` is integer-only (`srem`);
    /// float operands are rejected rather than miscompiled.
    ///
    /// # Errors
    ///
    /// [`LowerError::InvalidOperands`] for a float `%`, plus any conversion
    /// failure from the common-type step.
    fn lower(&self, ctx: &mut LowererContext) -> Result<Value, LowerError> {
        let lhs = self.left.lower(ctx)?;
        let rhs = self.right.lower(ctx)?;

        // `&&` and `||` are not short-circuiting: both operands are already
        // evaluated, coerced to bool and combined bitwise.
        if matches!(self.op, BinaryOperator::And | BinaryOperator::Or) {
            let lhs = coerce_to_bool(lhs, self.left.position(), ctx)?;
            let rhs = coerce_to_bool(rhs, self.right.position(), ctx)?;
            return Ok(match self.op {
                BinaryOperator::And => ctx.builder.build_and(&lhs, &rhs, "and"),
                _ => ctx.builder.build_or(&lhs, &rhs, "or"),
            });
        }

        let (lhs, rhs) = promote_to_common_type(lhs, rhs, self, ctx)?;
        let is_float = lhs.ty() == &IrType::Float;

        let value = match self.op {
            BinaryOperator::Add => {
                if is_float {
                    ctx.builder.build_fadd(&lhs, &rhs, "add")
                } else {
                    ctx.builder.build_add(&lhs, &rhs, "add")
                }
            }
            BinaryOperator::Subtract => {
                if is_float {
                    ctx.builder.build_fsub(&lhs, &rhs, "sub")
                } else {
                    ctx.builder.build_sub(&lhs, &rhs, "sub")
                }
            }
            BinaryOperator::Multiply => {
                if is_float {
                    ctx.builder.build_fmul(&lhs, &rhs, "mul")
                } else {
                    ctx.builder.build_mul(&lhs, &rhs, "mul")
                }
            }
            BinaryOperator::Divide => {
                if is_float {
                    ctx.builder.build_fdiv(&lhs, &rhs, "div")
                } else {
                    ctx.builder.build_sdiv(&lhs, &rhs, "div")
                }
            }
            BinaryOperator::Modulo => {
                if is_float {
                    return Err(LowerError::InvalidOperands {
                        op: "%".into(),
                        position: self.position,
                    });
                }
                ctx.builder.build_srem(&lhs, &rhs, "rem")
            }
            BinaryOperator::Equal
            | BinaryOperator::NotEqual
            | BinaryOperator::LessThan
            | BinaryOperator::LessOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterOrEqual => {
                if is_float {
                    let predicate = float_predicate(self.op);
                    ctx.builder.build_float_compare(predicate, &lhs, &rhs, "cmp")
                } else {
                    let predicate = int_predicate(self.op);
                    ctx.builder.build_int_compare(predicate, &lhs, &rhs, "cmp")
                }
            }
            BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
        };

        Ok(value)
    }
}

impl Lower for Assign {
    type Output = Value;

    /// Lowers `target = value`.
    ///
    /// ## Evaluation Order
    ///
    /// The right-hand side is evaluated first, then the target address is
    /// resolved, then the value is promoted to the target's declared type
    /// and stored. The promotion widens `int` to `float` but rejects the
    /// narrowing direction, so `int = float` is a compile error.
    ///
    /// ## Targets
    ///
    /// The parser already guaranteed the target is a variable or an array
    /// element, so this code only distinguishes the two address shapes:
    ///
    /// - a scalar target stores into its stack slot or global;
    /// - an array-element target stores through the element pointer from
    ///   [`lower_element_pointer`], promoted to the element type.
    ///
    /// A bare array name as target is rejected; there is no whole-array
    /// assignment.
    ///
    /// ## Result
    ///
    /// The assignment expression yields the **stored** (promoted) value,
    /// which is what makes `a = b = 3` chain.
    ///
    /// # Errors
    ///
    /// Undefined target names, array targets without subscripts, and
    /// illegal narrowing on the stored value.
    fn lower(&self, ctx: &mut LowererContext) -> Result<Value, LowerError> {
        let value = self.value.lower(ctx)?;

        let (ptr, target_type) = match &self.target {
            AssignTarget::Variable(variable) => match ctx.find_binding(&variable.name) {
                Some(Binding::LocalScalar(slot)) | Some(Binding::GlobalScalar(slot)) => {
                    (slot.ptr.clone(), slot.type_name)
                }
                Some(_) => {
                    return Err(LowerError::AssignToArray {
                        name: variable.name.clone(),
                        position: variable.position,
                    })
                }
                None => {
                    return Err(LowerError::UndefinedVariable {
                        name: variable.name.clone(),
                        position: variable.position,
                    })
                }
            },
            AssignTarget::ArrayIndex(index) => {
                let (ptr, element_type) = lower_element_pointer(index, ctx)?;
                (ptr, element_type)
            }
        };

        let target_ir = LowererContext::ir_type(target_type);
        let value = ctx
            .promote(value, &target_ir)
            .map_err(|(from, to)| LowerError::IllegalConversion {
                from: from.into(),
                to: to.into(),
                position: self.value.position(),
            })?;

        ctx.builder.build_store(&value, &ptr);

        // the assignment expression yields the stored value
        Ok(value)
    }
}

fn int_predicate(op: BinaryOperator) -> IntPredicate {
    match op {
        BinaryOperator::Equal => IntPredicate::EQ,
        BinaryOperator::NotEqual => IntPredicate::NE,
        BinaryOperator::LessThan => IntPredicate::SLT,
        BinaryOperator::LessOrEqual => IntPredicate::SLE,
        BinaryOperator::GreaterThan => IntPredicate::SGT,
        BinaryOperator::GreaterOrEqual => IntPredicate::SGE,
        _ => unreachable!("not a comparison"),
    }
}

fn float_predicate(op: BinaryOperator) -> FloatPredicate {
    match op {
        BinaryOperator::Equal => FloatPredicate::UEQ,
        BinaryOperator::NotEqual => FloatPredicate::UNE,
        BinaryOperator::LessThan => FloatPredicate::ULT,
        BinaryOperator::LessOrEqual => FloatPredicate::ULE,
        BinaryOperator::GreaterThan => FloatPredicate::UGT,
        BinaryOperator::GreaterOrEqual => FloatPredicate::UGE,
        _ => unreachable!("not a comparison"),
    }
}

/// Brings both operands of a binary operation to their common type: float if
/// either side is float, otherwise int if either side is int, otherwise both
/// are already bool.
fn promote_to_common_type(
    lhs: Value,
    rhs: Value,
    binary: &Binary,
    ctx: &mut LowererContext,
) -> Result<(Value, Value), LowerError> {
    let common = if lhs.ty() == &IrType::Float || rhs.ty() == &IrType::Float {
        IrType::Float
    } else if lhs.ty() == &IrType::I32 || rhs.ty() == &IrType::I32 {
        IrType::I32
    } else {
        IrType::I1
    };

    let lhs = ctx
        .promote(lhs, &common)
        .map_err(|(from, to)| LowerError::IllegalConversion {
            from: from.into(),
            to: to.into(),
            position: binary.left.position(),
        })?;
    let rhs = ctx
        .promote(rhs, &common)
        .map_err(|(from, to)| LowerError::IllegalConversion {
            from: from.into(),
            to: to.into(),
            position: binary.right.position(),
        })?;

    Ok((lhs, rhs))
}

/// Coerces a condition or logical operand to `i1`, attaching `position` to
/// the diagnostic when the value cannot become a bool.
pub(super) fn coerce_to_bool(
    value: Value,
    position: Span,
    ctx: &mut LowererContext,
) -> Result<Value, LowerError> {
    ctx.promote(value, &IrType::I1)
        .map_err(|(from, to)| LowerError::IllegalConversion {
            from: from.into(),
            to: to.into(),
            position,
        })
}

/// Computes the address of `name[i]...[k]`, returning the element pointer
/// and the element type.
///
/// ## Declared Arrays
///
/// Locally and globally declared arrays still have their aggregate type, so
/// one GEP walks it: a leading zero index steps through the pointer, then
/// one index per subscript selects the element.
///
/// ```llvm
/// %arrayidx = getelementptr [10 x [10 x i32]], ptr @b, i32 0, i32 %i, i32 %j
/// ```
///
/// ## Array Parameters
///
/// A parameter decayed to a raw element pointer at the call boundary, so
/// the declared dimensions fold the subscripts into one linear offset
/// `i1*(d2*...*dk) + i2*(d3*...*dk) + ... + ik`, and a single GEP on the
/// element type applies it:
///
/// ```llvm
/// %base     = load ptr, ptr %a.addr
/// %offset   = mul i32 %i, 10
/// %offset2  = add i32 %offset, %j
/// %arrayidx = getelementptr i32, ptr %base, i32 %offset2
/// ```
///
/// ## Index Expressions
///
/// Every index is coerced to `i32`; a float index is rejected rather than
/// truncated. The subscript count must equal the declared rank in both
/// shapes.
///
/// # Errors
///
/// Undefined names, subscripting a scalar, a wrong subscript count, or an
/// index that cannot become `i32`.
pub(super) fn lower_element_pointer(
    index: &ArrayIndex,
    ctx: &mut LowererContext,
) -> Result<(Value, TypeName), LowerError> {
    let (info, is_param) = match ctx.find_binding(&index.name) {
        Some(Binding::LocalArray(info)) | Some(Binding::GlobalArray(info)) => (info.clone(), false),
        Some(Binding::ParamArray(info)) => (info.clone(), true),
        Some(_) => {
            return Err(LowerError::NotAnArray {
                name: index.name.clone(),
                position: index.position,
            })
        }
        None => {
            return Err(LowerError::UndefinedVariable {
                name: index.name.clone(),
                position: index.position,
            })
        }
    };

    if index.indices.len() != info.dimensions.len() {
        return Err(LowerError::SubscriptMismatch {
            name: index.name.clone(),
            expected: info.dimensions.len(),
            found: index.indices.len(),
            position: index.position,
        });
    }

    let mut indices = Vec::with_capacity(index.indices.len());
    for expr in &index.indices {
        let value = expr.lower(ctx)?;
        let value =
            ctx.promote(value, &IrType::I32)
                .map_err(|(from, to)| LowerError::IllegalConversion {
                    from: from.into(),
                    to: to.into(),
                    position: expr.position(),
                })?;
        indices.push(value);
    }

    let element_ir = LowererContext::ir_type(info.element_type);

    let ptr = if is_param {
        let base = ctx
            .builder
            .build_load(IrType::Ptr, &info.ptr, &format!("{}.ptr", index.name));

        let mut offset = indices[0].clone();
        for (k, value) in indices.iter().enumerate().skip(1) {
            let dim = ctx.builder.const_int(info.dimensions[k] as i32);
            offset = ctx.builder.build_mul(&offset, &dim, "offset");
            offset = ctx.builder.build_add(&offset, value, "offset");
        }

        ctx.builder
            .build_gep(&element_ir, &base, &[offset], "arrayidx")
    } else {
        let aggregate = IrType::array_of(element_ir, &info.dimensions);

        let mut gep_indices = vec![ctx.builder.const_int(0)];
        gep_indices.extend(indices);

        ctx.builder
            .build_gep(&aggregate, &info.ptr, &gep_indices, "arrayidx")
    };

    Ok((ptr, info.element_type))
}

/// Resolves and emits a call, returning `None` for a void callee.
///
/// ## Resolution and Arity
///
/// The callee must already be registered (an extern prototype or an earlier
/// definition); forward references do not resolve. The argument count must
/// match the declared parameter count exactly.
///
/// ## Argument Passing
///
/// Each argument is matched against its declared parameter:
///
/// - **Scalar parameters**: the argument lowers to a value and is promoted
///   to the parameter type (widening only).
/// - **Array parameters**: the argument must be the bare identifier of a
///   compatible array; its address decays to a pointer via
///   [`lower_array_argument`].
///
/// ## Result
///
/// `Some(value)` for value-returning callees, `None` for void ones. The
/// caller decides whether a missing value is legal in its context, which is
/// how void calls end up statement-only.
///
/// # Errors
///
/// Unknown callee, arity mismatch, or any per-argument conversion failure.
pub(super) fn lower_call(
    call: &Call,
    ctx: &mut LowererContext,
) -> Result<Option<Value>, LowerError> {
    let Some(info) = ctx.lookup_function(&call.callee).cloned() else {
        return Err(LowerError::UndefinedFunction {
            name: call.callee.clone(),
            position: call.position,
        });
    };

    if call.args.len() != info.params.len() {
        return Err(LowerError::ArityMismatch {
            name: call.callee.clone(),
            expected: info.params.len(),
            found: call.args.len(),
            position: call.position,
        });
    }

    let mut args = Vec::with_capacity(call.args.len());
    for (arg, param) in call.args.iter().zip(&info.params) {
        if param.is_array() {
            args.push(lower_array_argument(arg, param, &call.callee, ctx)?);
        } else {
            let value = arg.lower(ctx)?;
            let target = LowererContext::ir_type(param.type_name);
            let value =
                ctx.promote(value, &target)
                    .map_err(|(from, to)| LowerError::IllegalConversion {
                        from: from.into(),
                        to: to.into(),
                        position: arg.position(),
                    })?;
            args.push(value);
        }
    }

    Ok(ctx.builder.build_call(info.id, &args, "call"))
}

/// Decays an array argument to the pointer the callee expects.
///
/// The argument must be the bare identifier of an array whose element type
/// and rank match the parameter's; the outermost extent is free to differ
/// since only the decayed pointer crosses the call boundary. A declared
/// array contributes its own address; an array parameter forwards the
/// pointer stored in its slot.
fn lower_array_argument(
    arg: &Expression,
    param: &Parameter,
    callee: &str,
    ctx: &mut LowererContext,
) -> Result<Value, LowerError> {
    let mismatch = |position| LowerError::InvalidArrayArgument {
        callee: callee.into(),
        expected: param.type_name.to_string(),
        position,
    };

    let Expression::Variable(variable) = arg else {
        return Err(mismatch(arg.position()));
    };

    let (info, is_param): (ArrayInfo, bool) = match ctx.find_binding(&variable.name) {
        Some(Binding::LocalArray(info)) | Some(Binding::GlobalArray(info)) => {
            (info.clone(), false)
        }
        Some(Binding::ParamArray(info)) => (info.clone(), true),
        Some(_) => return Err(mismatch(variable.position)),
        None => {
            return Err(LowerError::UndefinedVariable {
                name: variable.name.clone(),
                position: variable.position,
            })
        }
    };

    // element type and rank must match; the outermost extent is free to
    // differ since only the decayed pointer crosses the call boundary
    if info.element_type != param.type_name || info.dimensions.len() != param.dimensions.len() {
        return Err(mismatch(variable.position));
    }

    if is_param {
        // already a pointer; pass the stored address along
        Ok(ctx
            .builder
            .build_load(IrType::Ptr, &info.ptr, &format!("{}.ptr", variable.name)))
    } else {
        Ok(Value::new(info.ptr.repr(), IrType::Ptr))
    }
}
