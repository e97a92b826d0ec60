use super::{
    float_repr, Block, BlockId, FloatPredicate, Function, FunctionId, Global, IntPredicate,
    IrType, Module, Value,
};

/// The SSA-construction service. Owns the module under construction and a
/// current insertion point; every `build_*` call appends one instruction
/// there. Instructions requested after a block already has its terminator
/// are dropped, so a serialized block always has exactly one terminator.
pub struct Builder {
    module: Module,
    position: Option<BlockId>,
}

impl Builder {
    pub fn new(module_name: &str) -> Self {
        Self {
            module: Module::new(module_name),
            position: None,
        }
    }

    pub fn finish(self) -> Module {
        self.module
    }

    // ---- functions and blocks -------------------------------------------

    pub fn add_function(
        &mut self,
        name: &str,
        return_type: IrType,
        params: Vec<(String, IrType)>,
        is_declaration: bool,
    ) -> FunctionId {
        self.module.functions.push(Function {
            name: name.into(),
            return_type,
            params,
            blocks: vec![],
            is_declaration,
            alloca_count: 0,
            temp_count: 0,
        });

        FunctionId(self.module.functions.len() - 1)
    }

    /// Turns a declaration (from an `extern`) into a definition, adopting
    /// the parameter names of the defining occurrence.
    pub fn set_function_defined(&mut self, function: FunctionId, params: Vec<(String, IrType)>) {
        let function = &mut self.module.functions[function.0];
        function.is_declaration = false;
        function.params = params;
    }

    pub fn return_type(&self, function: FunctionId) -> &IrType {
        &self.module.functions[function.0].return_type
    }

    /// The incoming value of the n-th parameter inside the function body.
    pub fn param_value(&self, function: FunctionId, index: usize) -> Value {
        let (name, ty) = &self.module.functions[function.0].params[index];
        Value::new(format!("%{name}"), ty.clone())
    }

    pub fn append_basic_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let label = if self.module.functions[function.0].blocks.is_empty() {
            name.to_string()
        } else {
            let n = self.next_temp(function);
            format!("{name}.{n}")
        };

        self.module.functions[function.0]
            .blocks
            .push(Block::new(label));

        BlockId {
            function: function.0,
            block: self.module.functions[function.0].blocks.len() - 1,
        }
    }

    pub fn position_at_end(&mut self, block: BlockId) {
        self.position = Some(block);
    }

    pub fn insert_block(&self) -> Option<BlockId> {
        self.position
    }

    pub fn current_function(&self) -> Option<FunctionId> {
        self.position.map(|block| FunctionId(block.function))
    }

    /// Whether the current insertion block already ends in a terminator.
    pub fn has_terminator(&self) -> bool {
        self.position
            .map(|position| {
                self.module.functions[position.function].blocks[position.block]
                    .terminator
                    .is_some()
            })
            .unwrap_or(false)
    }

    fn block_label(&self, block: BlockId) -> String {
        self.module.functions[block.function].blocks[block.block]
            .label
            .clone()
    }

    fn next_temp(&mut self, function: FunctionId) -> usize {
        let function = &mut self.module.functions[function.0];
        function.temp_count += 1;
        function.temp_count
    }

    fn fresh_name(&mut self, hint: &str) -> String {
        let function = self
            .current_function()
            .expect("an insertion point is required");
        let n = self.next_temp(function);
        format!("%{hint}.{n}")
    }

    fn current_block_mut(&mut self) -> &mut Block {
        let position = self.position.expect("an insertion point is required");
        &mut self.module.functions[position.function].blocks[position.block]
    }

    fn push(&mut self, instruction: String) {
        if self.has_terminator() {
            return;
        }
        self.current_block_mut().instructions.push(instruction);
    }

    fn terminate(&mut self, terminator: String, successors: Vec<String>) {
        if self.has_terminator() {
            return;
        }
        let block = self.current_block_mut();
        block.terminator = Some(terminator);
        block.successors = successors;
    }

    // ---- constants ------------------------------------------------------

    pub fn const_int(&self, value: i32) -> Value {
        Value::new(value.to_string(), IrType::I32)
    }

    pub fn const_float(&self, value: f32) -> Value {
        Value::new(float_repr(value), IrType::Float)
    }

    pub fn const_bool(&self, value: bool) -> Value {
        Value::new(if value { "true" } else { "false" }, IrType::I1)
    }

    // ---- memory ---------------------------------------------------------

    /// Allocates a stack slot in the entry block of the current function,
    /// ahead of any ordinary instruction already emitted there.
    pub fn build_entry_alloca(&mut self, name: &str, ty: &IrType) -> Value {
        let reg = self.fresh_name(&format!("{name}.addr"));
        let position = self.position.expect("an insertion point is required");

        let function = &mut self.module.functions[position.function];
        let at = function.alloca_count;
        function.alloca_count += 1;
        function.blocks[0]
            .instructions
            .insert(at, format!("{reg} = alloca {ty}"));

        Value::new(reg, IrType::Ptr)
    }

    pub fn build_load(&mut self, ty: IrType, ptr: &Value, hint: &str) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!("{reg} = load {ty}, ptr {}", ptr.repr()));
        Value::new(reg, ty)
    }

    pub fn build_store(&mut self, value: &Value, ptr: &Value) {
        self.push(format!("store {}, ptr {}", value.operand(), ptr.repr()));
    }

    /// Zeroes out aggregate storage, used when a local array comes into
    /// scope.
    pub fn build_zero_store(&mut self, ty: &IrType, ptr: &Value) {
        self.push(format!(
            "store {ty} {}, ptr {}",
            ty.null_value(),
            ptr.repr()
        ));
    }

    pub fn add_global(&mut self, name: &str, ty: IrType) -> Value {
        self.module.globals.push(Global {
            name: name.into(),
            ty,
        });
        Value::new(format!("@{name}"), IrType::Ptr)
    }

    // ---- arithmetic -----------------------------------------------------

    fn build_arith(&mut self, op: &str, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!("{reg} = {op} {}, {}", lhs.operand(), rhs.repr()));
        Value::new(reg, lhs.ty().clone())
    }

    pub fn build_add(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("add", lhs, rhs, hint)
    }

    pub fn build_sub(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("sub", lhs, rhs, hint)
    }

    pub fn build_mul(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("mul", lhs, rhs, hint)
    }

    pub fn build_sdiv(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("sdiv", lhs, rhs, hint)
    }

    pub fn build_srem(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("srem", lhs, rhs, hint)
    }

    pub fn build_fadd(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("fadd", lhs, rhs, hint)
    }

    pub fn build_fsub(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("fsub", lhs, rhs, hint)
    }

    pub fn build_fmul(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("fmul", lhs, rhs, hint)
    }

    pub fn build_fdiv(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("fdiv", lhs, rhs, hint)
    }

    /// `0 - value` / `fneg value`.
    pub fn build_neg(&mut self, value: &Value, hint: &str) -> Value {
        let zero = Value::new("0", value.ty().clone());
        self.build_arith("sub", &zero, value, hint)
    }

    pub fn build_fneg(&mut self, value: &Value, hint: &str) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!("{reg} = fneg {}", value.operand()));
        Value::new(reg, value.ty().clone())
    }

    // ---- comparisons and logic ------------------------------------------

    pub fn build_int_compare(
        &mut self,
        predicate: IntPredicate,
        lhs: &Value,
        rhs: &Value,
        hint: &str,
    ) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!(
            "{reg} = icmp {predicate} {}, {}",
            lhs.operand(),
            rhs.repr()
        ));
        Value::new(reg, IrType::I1)
    }

    pub fn build_float_compare(
        &mut self,
        predicate: FloatPredicate,
        lhs: &Value,
        rhs: &Value,
        hint: &str,
    ) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!(
            "{reg} = fcmp {predicate} {}, {}",
            lhs.operand(),
            rhs.repr()
        ));
        Value::new(reg, IrType::I1)
    }

    pub fn build_and(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("and", lhs, rhs, hint)
    }

    pub fn build_or(&mut self, lhs: &Value, rhs: &Value, hint: &str) -> Value {
        self.build_arith("or", lhs, rhs, hint)
    }

    /// Boolean complement, `xor i1 value, true`.
    pub fn build_not(&mut self, value: &Value, hint: &str) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!("{reg} = xor {}, true", value.operand()));
        Value::new(reg, IrType::I1)
    }

    // ---- conversions ----------------------------------------------------

    pub fn build_zext_to_i32(&mut self, value: &Value, hint: &str) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!("{reg} = zext {} to i32", value.operand()));
        Value::new(reg, IrType::I32)
    }

    pub fn build_sitofp(&mut self, value: &Value, hint: &str) -> Value {
        let reg = self.fresh_name(hint);
        self.push(format!("{reg} = sitofp {} to float", value.operand()));
        Value::new(reg, IrType::Float)
    }

    // ---- addressing -----------------------------------------------------

    pub fn build_gep(
        &mut self,
        pointee: &IrType,
        ptr: &Value,
        indices: &[Value],
        hint: &str,
    ) -> Value {
        let reg = self.fresh_name(hint);
        let indices = indices
            .iter()
            .map(Value::operand)
            .collect::<Vec<_>>()
            .join(", ");
        self.push(format!(
            "{reg} = getelementptr {pointee}, ptr {}, {indices}",
            ptr.repr()
        ));
        Value::new(reg, IrType::Ptr)
    }

    // ---- calls and control flow -----------------------------------------

    /// Emits a call; returns `None` for calls to void functions.
    pub fn build_call(&mut self, function: FunctionId, args: &[Value], hint: &str) -> Option<Value> {
        let callee = &self.module.functions[function.0];
        let name = callee.name.clone();
        let return_type = callee.return_type.clone();

        let args = args
            .iter()
            .map(Value::operand)
            .collect::<Vec<_>>()
            .join(", ");

        if return_type == IrType::Void {
            self.push(format!("call void @{name}({args})"));
            None
        } else {
            let reg = self.fresh_name(hint);
            self.push(format!("{reg} = call {return_type} @{name}({args})"));
            Some(Value::new(reg, return_type))
        }
    }

    pub fn build_unconditional_branch(&mut self, dest: BlockId) {
        let label = self.block_label(dest);
        self.terminate(format!("br label %{label}"), vec![label]);
    }

    pub fn build_conditional_branch(
        &mut self,
        condition: &Value,
        then_block: BlockId,
        else_block: BlockId,
    ) {
        let then_label = self.block_label(then_block);
        let else_label = self.block_label(else_block);
        self.terminate(
            format!(
                "br i1 {}, label %{then_label}, label %{else_label}",
                condition.repr()
            ),
            vec![then_label, else_label],
        );
    }

    pub fn build_return(&mut self, value: Option<&Value>) {
        match value {
            Some(value) => self.terminate(format!("ret {}", value.operand()), vec![]),
            None => self.terminate("ret void".into(), vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_have_exactly_one_terminator() {
        let mut builder = Builder::new("test");
        let function = builder.add_function("f", IrType::I32, vec![], false);
        let entry = builder.append_basic_block(function, "entry");
        builder.position_at_end(entry);

        builder.build_return(Some(&builder.const_int(1)));
        builder.build_return(Some(&builder.const_int(2)));
        let dead = builder.build_add(&builder.const_int(1), &builder.const_int(2), "add");
        assert_eq!(&IrType::I32, dead.ty());

        let printed = builder.finish().print_to_string();
        assert_eq!(1, printed.matches("ret i32").count());
        assert!(printed.contains("ret i32 1"));
        assert!(!printed.contains("add"));
    }

    #[test]
    fn test_unreachable_blocks_are_pruned() {
        let mut builder = Builder::new("test");
        let function = builder.add_function("f", IrType::Void, vec![], false);
        let entry = builder.append_basic_block(function, "entry");
        let orphan = builder.append_basic_block(function, "orphan");

        builder.position_at_end(entry);
        builder.build_return(None);
        builder.position_at_end(orphan);
        builder.build_return(None);

        let printed = builder.finish().print_to_string();
        assert!(!printed.contains("orphan"));
    }

    #[test]
    fn test_entry_allocas_come_before_other_instructions() {
        let mut builder = Builder::new("test");
        let function = builder.add_function("f", IrType::Void, vec![], false);
        let entry = builder.append_basic_block(function, "entry");
        builder.position_at_end(entry);

        let first = builder.build_entry_alloca("x", &IrType::I32);
        builder.build_store(&builder.const_int(3), &first);
        let second = builder.build_entry_alloca("y", &IrType::Float);
        builder.build_store(&builder.const_float(1.0), &second);
        builder.build_return(None);

        let printed = builder.finish().print_to_string();
        let alloca_y = printed.find("alloca float").unwrap();
        let store_x = printed.find("store i32 3").unwrap();
        assert!(alloca_y < store_x);
    }

    #[test]
    fn test_declaration_prints_parameter_types_only() {
        let mut builder = Builder::new("test");
        builder.add_function(
            "print_int",
            IrType::I32,
            vec![("x".into(), IrType::I32)],
            true,
        );

        let printed = builder.finish().print_to_string();
        assert!(printed.contains("declare i32 @print_int(i32)"));
    }

    #[test]
    fn test_global_rendering() {
        let mut builder = Builder::new("test");
        builder.add_global("g", IrType::I32);
        builder.add_global("b", IrType::array_of(IrType::I32, &[10, 10]));

        let printed = builder.finish().print_to_string();
        assert!(printed.contains("@g = common global i32 0"));
        assert!(printed.contains("@b = common global [10 x [10 x i32]] zeroinitializer"));
    }
}
