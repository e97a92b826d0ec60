use std::fmt::Display;

/// The closed set of types the emitted IR works with. Arrays nest from the
/// outermost dimension inwards; `Ptr` is an opaque pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    I1,
    I32,
    Float,
    Void,
    Ptr,
    Array(Box<IrType>, usize),
}

impl IrType {
    /// Builds `[d1 x [d2 x ... element]]` from an element type and an
    /// outermost-first dimension list.
    pub fn array_of(element: IrType, dimensions: &[usize]) -> IrType {
        dimensions
            .iter()
            .rev()
            .fold(element, |inner, dim| IrType::Array(Box::new(inner), *dim))
    }

    /// Textual null value of this type, used for global initializers and
    /// implicit returns.
    pub fn null_value(&self) -> String {
        match self {
            IrType::I1 => "false".into(),
            IrType::I32 => "0".into(),
            IrType::Float => float_repr(0.0),
            IrType::Ptr => "null".into(),
            IrType::Array(..) => "zeroinitializer".into(),
            IrType::Void => unreachable!("void has no value"),
        }
    }
}

impl Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::I1 => f.write_str("i1"),
            IrType::I32 => f.write_str("i32"),
            IrType::Float => f.write_str("float"),
            IrType::Void => f.write_str("void"),
            IrType::Ptr => f.write_str("ptr"),
            IrType::Array(element, dim) => write!(f, "[{dim} x {element}]"),
        }
    }
}

/// Renders a `float` constant in the 64-bit hexadecimal form LLVM accepts
/// for any single-precision value.
pub fn float_repr(value: f32) -> String {
    format!("0x{:016X}", (value as f64).to_bits())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntPredicate {
    EQ,
    NE,
    SLT,
    SLE,
    SGT,
    SGE,
}

impl Display for IntPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IntPredicate::EQ => "eq",
            IntPredicate::NE => "ne",
            IntPredicate::SLT => "slt",
            IntPredicate::SLE => "sle",
            IntPredicate::SGT => "sgt",
            IntPredicate::SGE => "sge",
        })
    }
}

/// Unordered comparisons, matching the behavior of the float comparison
/// family the language exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatPredicate {
    UEQ,
    UNE,
    ULT,
    ULE,
    UGT,
    UGE,
}

impl Display for FloatPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FloatPredicate::UEQ => "ueq",
            FloatPredicate::UNE => "une",
            FloatPredicate::ULT => "ult",
            FloatPredicate::ULE => "ule",
            FloatPredicate::UGT => "ugt",
            FloatPredicate::UGE => "uge",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_type_nests_outermost_first() {
        let ty = IrType::array_of(IrType::I32, &[10, 5]);
        assert_eq!("[10 x [5 x i32]]", ty.to_string());
    }

    #[test]
    fn test_float_repr_is_exact_for_f32() {
        assert_eq!("0x3FE0000000000000", float_repr(0.5));
        assert_eq!("0x0000000000000000", float_repr(0.0));
    }
}
