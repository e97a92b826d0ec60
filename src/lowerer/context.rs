use std::collections::HashMap;

use crate::{
    ir::{Builder, FloatPredicate, FunctionId, IntPredicate, IrType, Module, Value},
    parser::ast::{Parameter, TypeName},
};

/// Stack slot of a scalar binding (local, parameter or global).
#[derive(Debug, Clone)]
pub struct ScalarSlot {
    pub type_name: TypeName,
    pub ptr: Value,
}

/// Metadata of an array binding. For locally or globally declared arrays
/// `ptr` addresses the aggregate itself; for array parameters it addresses
/// the slot holding the decayed pointer.
#[derive(Debug, Clone)]
pub struct ArrayInfo {
    pub element_type: TypeName,
    pub dimensions: Vec<usize>,
    pub ptr: Value,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub id: FunctionId,
    pub return_type: TypeName,
    pub params: Vec<Parameter>,
    pub is_defined: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct CurrentFunction {
    pub id: FunctionId,
    pub return_type: TypeName,
}

/// Resolved meaning of a name, in lookup order: local scalars, local arrays,
/// parameter arrays, then globals.
pub enum Binding<'a> {
    LocalScalar(&'a ScalarSlot),
    LocalArray(&'a ArrayInfo),
    ParamArray(&'a ArrayInfo),
    GlobalScalar(&'a ScalarSlot),
    GlobalArray(&'a ArrayInfo),
}

/// Bindings displaced by a block-local declaration, put back on block exit.
pub struct SavedBinding {
    name: String,
    scalar: Option<ScalarSlot>,
    array: Option<ArrayInfo>,
    param_array: Option<ArrayInfo>,
}

/// All state threaded through lowering: the IR builder plus the symbol
/// tables of the compilation unit and of the function currently being
/// lowered. Per-function tables are cleared between functions.
pub struct LowererContext {
    pub builder: Builder,
    functions: HashMap<String, FunctionInfo>,
    global_scalars: HashMap<String, ScalarSlot>,
    global_arrays: HashMap<String, ArrayInfo>,
    local_scalars: HashMap<String, ScalarSlot>,
    local_arrays: HashMap<String, ArrayInfo>,
    param_arrays: HashMap<String, ArrayInfo>,
    pub current_function: Option<CurrentFunction>,
}

impl LowererContext {
    pub fn new(module_name: &str) -> Self {
        Self {
            builder: Builder::new(module_name),
            functions: HashMap::new(),
            global_scalars: HashMap::new(),
            global_arrays: HashMap::new(),
            local_scalars: HashMap::new(),
            local_arrays: HashMap::new(),
            param_arrays: HashMap::new(),
            current_function: None,
        }
    }

    pub fn finish(self) -> Module {
        self.builder.finish()
    }

    // ---- functions ------------------------------------------------------

    pub fn register_function(&mut self, name: &str, info: FunctionInfo) {
        self.functions.insert(name.into(), info);
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.get(name)
    }

    pub fn mark_function_defined(&mut self, name: &str) {
        if let Some(info) = self.functions.get_mut(name) {
            info.is_defined = true;
        }
    }

    /// Resets the per-function tables; called when lowering of a function
    /// body begins.
    pub fn begin_function(&mut self, current: CurrentFunction) {
        self.local_scalars.clear();
        self.local_arrays.clear();
        self.param_arrays.clear();
        self.current_function = Some(current);
    }

    // ---- bindings -------------------------------------------------------

    pub fn declare_local_scalar(&mut self, name: &str, slot: ScalarSlot) {
        self.local_scalars.insert(name.into(), slot);
    }

    pub fn declare_local_array(&mut self, name: &str, info: ArrayInfo) {
        self.local_arrays.insert(name.into(), info);
    }

    pub fn declare_param_array(&mut self, name: &str, info: ArrayInfo) {
        self.param_arrays.insert(name.into(), info);
    }

    pub fn declare_global_scalar(&mut self, name: &str, slot: ScalarSlot) {
        self.global_scalars.insert(name.into(), slot);
    }

    pub fn declare_global_array(&mut self, name: &str, info: ArrayInfo) {
        self.global_arrays.insert(name.into(), info);
    }

    pub fn is_global_defined(&self, name: &str) -> bool {
        self.global_scalars.contains_key(name) || self.global_arrays.contains_key(name)
    }

    pub fn find_binding(&self, name: &str) -> Option<Binding<'_>> {
        if let Some(slot) = self.local_scalars.get(name) {
            return Some(Binding::LocalScalar(slot));
        }
        if let Some(info) = self.local_arrays.get(name) {
            return Some(Binding::LocalArray(info));
        }
        if let Some(info) = self.param_arrays.get(name) {
            return Some(Binding::ParamArray(info));
        }
        if let Some(slot) = self.global_scalars.get(name) {
            return Some(Binding::GlobalScalar(slot));
        }
        if let Some(info) = self.global_arrays.get(name) {
            return Some(Binding::GlobalArray(info));
        }
        None
    }

    /// Displaces the function-local bindings of `name` ahead of a shadowing
    /// declaration. The returned record restores the outer meaning.
    pub fn shadow(&mut self, name: &str) -> SavedBinding {
        SavedBinding {
            name: name.into(),
            scalar: self.local_scalars.remove(name),
            array: self.local_arrays.remove(name),
            param_array: self.param_arrays.remove(name),
        }
    }

    pub fn restore(&mut self, saved: SavedBinding) {
        self.local_scalars.remove(&saved.name);
        self.local_arrays.remove(&saved.name);
        self.param_arrays.remove(&saved.name);

        if let Some(slot) = saved.scalar {
            self.local_scalars.insert(saved.name.clone(), slot);
        }
        if let Some(info) = saved.array {
            self.local_arrays.insert(saved.name.clone(), info);
        }
        if let Some(info) = saved.param_array {
            self.param_arrays.insert(saved.name, info);
        }
    }

    // ---- types and promotion --------------------------------------------

    pub fn ir_type(type_name: TypeName) -> IrType {
        match type_name {
            TypeName::Int => IrType::I32,
            TypeName::Float => IrType::Float,
            TypeName::Bool => IrType::I1,
            TypeName::Void => IrType::Void,
        }
    }

    /// Source-level spelling of an IR type, for diagnostics.
    pub fn source_type(ty: &IrType) -> &'static str {
        match ty {
            IrType::I1 => "bool",
            IrType::I32 => "int",
            IrType::Float => "float",
            IrType::Void => "void",
            IrType::Ptr | IrType::Array(..) => "array",
        }
    }

    pub fn zero_value(&self, type_name: TypeName) -> Value {
        match type_name {
            TypeName::Int => self.builder.const_int(0),
            TypeName::Float => self.builder.const_float(0.0),
            TypeName::Bool => self.builder.const_bool(false),
            TypeName::Void => unreachable!("void has no value"),
        }
    }

    /// Applies the implicit promotion matrix. Widening conversions are
    /// emitted; anything else (notably float to int) is refused and reported
    /// as an `(from, to)` pair for the caller to attach a position to.
    pub fn promote(
        &mut self,
        value: Value,
        target: &IrType,
    ) -> Result<Value, (&'static str, &'static str)> {
        if value.ty() == target {
            return Ok(value);
        }

        match (value.ty().clone(), target) {
            (IrType::I32, IrType::Float) => Ok(self.builder.build_sitofp(&value, "tofloat")),
            (IrType::I1, IrType::I32) => Ok(self.builder.build_zext_to_i32(&value, "toint")),
            (IrType::I1, IrType::Float) => {
                let widened = self.builder.build_zext_to_i32(&value, "toint");
                Ok(self.builder.build_sitofp(&widened, "tofloat"))
            }
            (IrType::I32, IrType::I1) => {
                let zero = self.builder.const_int(0);
                Ok(self
                    .builder
                    .build_int_compare(IntPredicate::NE, &value, &zero, "tobool"))
            }
            (IrType::Float, IrType::I1) => {
                let zero = self.builder.const_float(0.0);
                Ok(self
                    .builder
                    .build_float_compare(FloatPredicate::UNE, &value, &zero, "tobool"))
            }
            (from, to) => Err((Self::source_type(&from), Self::source_type(to))),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ir::IrType;

    use super::*;

    fn context_with_function() -> LowererContext {
        let mut ctx = LowererContext::new("test");
        let function = ctx
            .builder
            .add_function("f", IrType::Void, vec![], false);
        let entry = ctx.builder.append_basic_block(function, "entry");
        ctx.builder.position_at_end(entry);
        ctx
    }

    #[test]
    fn test_lookup_order_prefers_local_scalars() {
        let mut ctx = context_with_function();

        ctx.declare_global_scalar(
            "x",
            ScalarSlot {
                type_name: TypeName::Float,
                ptr: Value::new("@x", IrType::Ptr),
            },
        );
        ctx.declare_local_scalar(
            "x",
            ScalarSlot {
                type_name: TypeName::Int,
                ptr: Value::new("%x.addr.1", IrType::Ptr),
            },
        );

        match ctx.find_binding("x") {
            Some(Binding::LocalScalar(slot)) => assert_eq!(TypeName::Int, slot.type_name),
            _ => panic!("expected the local binding"),
        }
    }

    #[test]
    fn test_shadow_and_restore_round_trip() {
        let mut ctx = context_with_function();

        ctx.declare_local_scalar(
            "x",
            ScalarSlot {
                type_name: TypeName::Float,
                ptr: Value::new("%outer", IrType::Ptr),
            },
        );

        let saved = ctx.shadow("x");
        assert!(ctx.find_binding("x").is_none());

        ctx.declare_local_scalar(
            "x",
            ScalarSlot {
                type_name: TypeName::Int,
                ptr: Value::new("%inner", IrType::Ptr),
            },
        );

        ctx.restore(saved);
        match ctx.find_binding("x") {
            Some(Binding::LocalScalar(slot)) => {
                assert_eq!(TypeName::Float, slot.type_name);
                assert_eq!("%outer", slot.ptr.repr());
            }
            _ => panic!("expected the outer binding back"),
        }
    }

    #[test]
    fn test_promotion_matrix_accepts_widening() {
        let mut ctx = context_with_function();

        let int_value = ctx.builder.const_int(3);
        let promoted = ctx.promote(int_value, &IrType::Float).unwrap();
        assert_eq!(&IrType::Float, promoted.ty());

        let bool_value = ctx.builder.const_bool(true);
        let promoted = ctx.promote(bool_value, &IrType::I32).unwrap();
        assert_eq!(&IrType::I32, promoted.ty());
    }

    #[test]
    fn test_promotion_matrix_rejects_narrowing() {
        let mut ctx = context_with_function();

        let float_value = ctx.builder.const_float(1.5);
        assert_eq!(
            Err(("float", "int")),
            ctx.promote(float_value, &IrType::I32)
        );
    }
}
