use std::fmt::Display;

/// Scalar type spelled in the source. `Void` is only legal as a function
/// return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TypeName {
    Int,
    Float,
    Bool,
    Void,
}

impl Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::Bool => "bool",
            TypeName::Void => "void",
        })
    }
}
