use crate::lexer::Span;

use super::{Block, TypeName};

/// A function parameter. `dimensions` is empty for a scalar parameter; for an
/// array parameter the outermost dimension is informational only, since the
/// argument decays to a pointer at the call boundary.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameter {
    pub type_name: TypeName,
    pub name: String,
    pub dimensions: Vec<usize>,
    pub position: Span,
}

impl Parameter {
    pub fn is_array(&self) -> bool {
        !self.dimensions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prototype {
    pub return_type: TypeName,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub position: Span,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDeclaration {
    pub prototype: Prototype,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Declaration {
    GlobalScalar {
        type_name: TypeName,
        name: String,
        position: Span,
    },
    GlobalArray {
        element_type: TypeName,
        name: String,
        dimensions: Vec<usize>,
        position: Span,
    },
    Function(FunctionDeclaration),
}

/// A parsed compilation unit: extern prototypes first, then top-level
/// declarations in source order.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Program {
    pub externs: Vec<Prototype>,
    pub declarations: Vec<Declaration>,
}
