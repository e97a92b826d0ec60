//! # Top-Level Lowering
//!
//! This module lowers the program's outer layer: extern prototypes, global
//! variables and arrays, and function definitions.
//!
//! ## Ordering
//!
//! Extern prototypes register first (handle only, no body), then the
//! top-level declarations lower in source order. Name resolution inside a
//! function body therefore sees every extern plus everything declared
//! above it, but nothing below; forward references between functions do
//! not resolve.
//!
//! ## Globals
//!
//! Global scalars and arrays emit zero-initialized module globals with
//! common linkage:
//!
//! ```llvm
//! @g = common global i32 0
//! @b = common global [10 x [10 x i32]] zeroinitializer
//! ```
//!
//! ## Functions
//!
//! A definition either creates a fresh module function or fills in the
//! body of a matching extern declaration. Each body lowers with fresh
//! per-function symbol tables; parameters are spilled to entry-block stack
//! slots so the body can treat them like any other variable.

use log::debug;

use crate::{
    ir::{IrType, Value},
    parser::ast::{Declaration, FunctionDeclaration, Parameter, Prototype, TypeName},
};

use super::{
    context::{ArrayInfo, CurrentFunction, FunctionInfo, ScalarSlot},
    Lower, LowerError, LowererContext,
};

/// IR-level parameter list of a prototype: arrays decay to opaque pointers.
fn ir_params(parameters: &[Parameter]) -> Vec<(String, IrType)> {
    parameters
        .iter()
        .map(|param| {
            let ty = if param.is_array() {
                IrType::Ptr
            } else {
                LowererContext::ir_type(param.type_name)
            };
            (param.name.clone(), ty)
        })
        .collect()
}

/// Whether a definition's parameter list is interchangeable with the
/// declared one. Scalar types must agree and arrays must stay arrays;
/// extents are not compared because they never reach the signature.
fn signatures_match(declared: &[Parameter], defined: &[Parameter]) -> bool {
    declared.len() == defined.len()
        && declared.iter().zip(defined).all(|(a, b)| {
            a.type_name == b.type_name && a.is_array() == b.is_array()
        })
}

/// Registers an extern prototype: a `declare` line in the module plus a
/// function-table entry, but no body.
///
/// The runtime (or a test driver) supplies the implementation at link
/// time, so only the handle and signature matter here. A name that is
/// already in the function table is a redefinition and is fatal.
///
/// # Errors
///
/// [`LowerError::RedefinedFunction`] when the name is already taken.
pub fn register_extern(
    prototype: &Prototype,
    ctx: &mut LowererContext,
) -> Result<(), LowerError> {
    if ctx.lookup_function(&prototype.name).is_some() {
        return Err(LowerError::RedefinedFunction {
            name: prototype.name.clone(),
            position: prototype.position,
        });
    }

    let id = ctx.builder.add_function(
        &prototype.name,
        LowererContext::ir_type(prototype.return_type),
        ir_params(&prototype.parameters),
        true,
    );

    ctx.register_function(
        &prototype.name,
        FunctionInfo {
            id,
            return_type: prototype.return_type,
            params: prototype.parameters.clone(),
            is_defined: false,
        },
    );

    debug!("registered extern prototype '{}'", prototype.name);

    Ok(())
}

impl Lower for Declaration {
    type Output = ();

    /// Lowers one top-level declaration.
    ///
    /// Globals only need a handle and a zero initializer; functions carry
    /// the real work and are handled by `FunctionDeclaration`'s lowering
    /// below. Global names share one namespace with functions, since both
    /// become module-level symbols.
    ///
    /// # Errors
    ///
    /// [`LowerError::DuplicateGlobal`] when the name is already a global
    /// or a function, plus anything function lowering reports.
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        match self {
            Declaration::GlobalScalar {
                type_name,
                name,
                position,
            } => {
                if ctx.is_global_defined(name) || ctx.lookup_function(name).is_some() {
                    return Err(LowerError::DuplicateGlobal {
                        name: name.clone(),
                        position: *position,
                    });
                }

                let ty = LowererContext::ir_type(*type_name);
                let ptr = ctx.builder.add_global(name, ty);
                ctx.declare_global_scalar(
                    name,
                    ScalarSlot {
                        type_name: *type_name,
                        ptr,
                    },
                );
                Ok(())
            }
            Declaration::GlobalArray {
                element_type,
                name,
                dimensions,
                position,
            } => {
                if ctx.is_global_defined(name) || ctx.lookup_function(name).is_some() {
                    return Err(LowerError::DuplicateGlobal {
                        name: name.clone(),
                        position: *position,
                    });
                }

                let element = LowererContext::ir_type(*element_type);
                let aggregate = IrType::array_of(element, dimensions);
                let ptr = ctx.builder.add_global(name, aggregate);
                ctx.declare_global_array(
                    name,
                    ArrayInfo {
                        element_type: *element_type,
                        dimensions: dimensions.clone(),
                        ptr,
                    },
                );
                Ok(())
            }
            Declaration::Function(function) => function.lower(ctx),
        }
    }
}

impl Lower for FunctionDeclaration {
    type Output = ();

    /// Lowers one function definition.
    ///
    /// ## Symbol Handling
    ///
    /// Three cases on the function name:
    ///
    /// - already **defined**: fatal redefinition;
    /// - an **extern declaration**: the signatures must be interchangeable,
    ///   and the existing module handle turns into a definition, adopting
    ///   the defining occurrence's parameter names;
    /// - **fresh**: a new module function with external linkage.
    ///
    /// The function-table entry registers before the body lowers, so the
    /// body can call itself and recursion resolves.
    ///
    /// ## Parameter Materialization
    ///
    /// Every parameter is spilled into an entry-block stack slot:
    ///
    /// ```llvm
    /// define i32 @f(i32 %n, ptr %a) {
    /// entry:
    ///   %n.addr = alloca i32
    ///   %a.addr = alloca ptr
    ///   store i32 %n, ptr %n.addr
    ///   store ptr %a, ptr %a.addr
    ///   ...
    /// ```
    ///
    /// Scalar parameters enter the local-scalar table; array parameters
    /// enter the parameter-array table with their declared element type and
    /// dimensions, which later drives the linearized indexing.
    ///
    /// ## Implicit Return
    ///
    /// When the body falls off the end with the last block unterminated, a
    /// `ret void` or a `ret` of the typed zero value is appended, so every
    /// function ends properly no matter how its control flow was written.
    ///
    /// # Errors
    ///
    /// [`LowerError::RedefinedFunction`], [`LowerError::PrototypeMismatch`],
    /// [`LowerError::DuplicateGlobal`] on a name collision with a global,
    /// plus anything the body reports.
    fn lower(&self, ctx: &mut LowererContext) -> Result<(), LowerError> {
        let Prototype {
            return_type,
            name,
            parameters,
            position,
        } = &self.prototype;

        if ctx.is_global_defined(name) {
            return Err(LowerError::DuplicateGlobal {
                name: name.clone(),
                position: *position,
            });
        }

        let id = match ctx.lookup_function(name) {
            Some(info) if info.is_defined => {
                return Err(LowerError::RedefinedFunction {
                    name: name.clone(),
                    position: *position,
                });
            }
            Some(info) => {
                // a body for an earlier extern declaration
                if info.return_type != *return_type
                    || !signatures_match(&info.params, parameters)
                {
                    return Err(LowerError::PrototypeMismatch {
                        name: name.clone(),
                        position: *position,
                    });
                }
                let id = info.id;
                ctx.builder.set_function_defined(id, ir_params(parameters));
                id
            }
            None => ctx.builder.add_function(
                name,
                LowererContext::ir_type(*return_type),
                ir_params(parameters),
                false,
            ),
        };

        // visible from its own body, so recursion resolves
        ctx.register_function(
            name,
            FunctionInfo {
                id,
                return_type: *return_type,
                params: parameters.clone(),
                is_defined: true,
            },
        );

        debug!("lowering function '{name}'");

        ctx.begin_function(CurrentFunction {
            id,
            return_type: *return_type,
        });

        let entry = ctx.builder.append_basic_block(id, "entry");
        ctx.builder.position_at_end(entry);

        // every parameter is materialized into a stack slot; array
        // parameters store the incoming decayed pointer
        for (index, param) in parameters.iter().enumerate() {
            let incoming = ctx.builder.param_value(id, index);

            if param.is_array() {
                let slot = ctx.builder.build_entry_alloca(&param.name, &IrType::Ptr);
                ctx.builder.build_store(&incoming, &slot);
                ctx.declare_param_array(
                    &param.name,
                    ArrayInfo {
                        element_type: param.type_name,
                        dimensions: param.dimensions.clone(),
                        ptr: slot,
                    },
                );
            } else {
                let ty = LowererContext::ir_type(param.type_name);
                let slot = ctx.builder.build_entry_alloca(&param.name, &ty);
                ctx.builder.build_store(&incoming, &slot);
                ctx.declare_local_scalar(
                    &param.name,
                    ScalarSlot {
                        type_name: param.type_name,
                        ptr: slot,
                    },
                );
            }
        }

        self.body.lower(ctx)?;

        // fall off the end: void functions return, value functions yield zero
        if !ctx.builder.has_terminator() {
            if *return_type == TypeName::Void {
                ctx.builder.build_return(None);
            } else {
                let ty = LowererContext::ir_type(*return_type);
                let zero = Value::new(ty.null_value(), ty);
                ctx.builder.build_return(Some(&zero));
            }
        }

        Ok(())
    }
}
