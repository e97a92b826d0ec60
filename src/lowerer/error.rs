use std::{error::Error, fmt::Display};

use crate::lexer::Span;

/// Semantic errors surfaced while lowering the AST to IR. All of them are
/// fatal; the first one aborts compilation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LowerError {
    UndefinedVariable {
        name: String,
        position: Span,
    },
    UndefinedFunction {
        name: String,
        position: Span,
    },
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        position: Span,
    },
    SubscriptMismatch {
        name: String,
        expected: usize,
        found: usize,
        position: Span,
    },
    IllegalConversion {
        from: String,
        to: String,
        position: Span,
    },
    InvalidOperands {
        op: String,
        position: Span,
    },
    InvalidArrayArgument {
        callee: String,
        expected: String,
        position: Span,
    },
    ArrayAsValue {
        name: String,
        position: Span,
    },
    AssignToArray {
        name: String,
        position: Span,
    },
    NotAnArray {
        name: String,
        position: Span,
    },
    VoidValue {
        name: String,
        position: Span,
    },
    DuplicateGlobal {
        name: String,
        position: Span,
    },
    RedefinedFunction {
        name: String,
        position: Span,
    },
    PrototypeMismatch {
        name: String,
        position: Span,
    },
    ReturnValueInVoidFunction {
        position: Span,
    },
    MissingReturnValue {
        position: Span,
    },
}

impl LowerError {
    pub fn position(&self) -> Span {
        match self {
            LowerError::UndefinedVariable { position, .. }
            | LowerError::UndefinedFunction { position, .. }
            | LowerError::ArityMismatch { position, .. }
            | LowerError::SubscriptMismatch { position, .. }
            | LowerError::IllegalConversion { position, .. }
            | LowerError::InvalidOperands { position, .. }
            | LowerError::InvalidArrayArgument { position, .. }
            | LowerError::ArrayAsValue { position, .. }
            | LowerError::AssignToArray { position, .. }
            | LowerError::NotAnArray { position, .. }
            | LowerError::VoidValue { position, .. }
            | LowerError::DuplicateGlobal { position, .. }
            | LowerError::RedefinedFunction { position, .. }
            | LowerError::PrototypeMismatch { position, .. }
            | LowerError::ReturnValueInVoidFunction { position }
            | LowerError::MissingReturnValue { position } => *position,
        }
    }

    fn message(&self) -> String {
        match self {
            LowerError::UndefinedVariable { name, .. } => {
                format!("unknown variable name '{name}'")
            }
            LowerError::UndefinedFunction { name, .. } => {
                format!("unknown function referenced '{name}'")
            }
            LowerError::ArityMismatch {
                name,
                expected,
                found,
                ..
            } => format!(
                "function '{name}' expects {expected} argument(s) but {found} were given"
            ),
            LowerError::SubscriptMismatch {
                name,
                expected,
                found,
                ..
            } => format!(
                "array '{name}' expects {expected} subscript(s) but {found} were given"
            ),
            LowerError::IllegalConversion { from, to, .. } => {
                format!("cannot implicitly convert '{from}' to '{to}'")
            }
            LowerError::InvalidOperands { op, .. } => {
                format!("invalid operands to operator '{op}'")
            }
            LowerError::InvalidArrayArgument {
                callee, expected, ..
            } => format!("call to '{callee}' expects an array of '{expected}' here"),
            LowerError::ArrayAsValue { name, .. } => {
                format!("array '{name}' cannot be used as a value")
            }
            LowerError::AssignToArray { name, .. } => {
                format!("cannot assign to array '{name}' without subscripts")
            }
            LowerError::NotAnArray { name, .. } => {
                format!("'{name}' is not an array")
            }
            LowerError::VoidValue { name, .. } => {
                format!("void function '{name}' used as a value")
            }
            LowerError::DuplicateGlobal { name, .. } => {
                format!("global '{name}' is already defined")
            }
            LowerError::RedefinedFunction { name, .. } => {
                format!("function '{name}' cannot be redefined")
            }
            LowerError::PrototypeMismatch { name, .. } => {
                format!("definition of '{name}' does not match its declaration")
            }
            LowerError::ReturnValueInVoidFunction { .. } => {
                "cannot return a value from a void function".into()
            }
            LowerError::MissingReturnValue { .. } => {
                "non-void function must return a value".into()
            }
        }
    }
}

impl Display for LowerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.position().diagnostic(self.message()).as_str())
    }
}

impl Error for LowerError {}
