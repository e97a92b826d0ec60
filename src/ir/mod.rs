//! In-memory model of a textual LLVM module. The lowerer drives this through
//! [`Builder`]; nothing here knows about the source language.

mod builder;
mod types;

pub use builder::*;
pub use types::*;

use std::collections::{HashSet, VecDeque};
use std::fmt::Write;

/// An SSA value: a register, parameter, global or immediate, together with
/// its type.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    repr: String,
    ty: IrType,
}

impl Value {
    pub fn new(repr: impl Into<String>, ty: IrType) -> Self {
        Self {
            repr: repr.into(),
            ty,
        }
    }

    pub fn repr(&self) -> &str {
        &self.repr
    }

    pub fn ty(&self) -> &IrType {
        &self.ty
    }

    /// Rendered as an operand: `<type> <repr>`.
    pub fn operand(&self) -> String {
        format!("{} {}", self.ty, self.repr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId {
    pub(crate) function: usize,
    pub(crate) block: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Block {
    pub(crate) label: String,
    pub(crate) instructions: Vec<String>,
    pub(crate) terminator: Option<String>,
    pub(crate) successors: Vec<String>,
}

impl Block {
    pub(crate) fn new(label: String) -> Self {
        Self {
            label,
            instructions: vec![],
            terminator: None,
            successors: vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Function {
    pub(crate) name: String,
    pub(crate) return_type: IrType,
    pub(crate) params: Vec<(String, IrType)>,
    pub(crate) blocks: Vec<Block>,
    pub(crate) is_declaration: bool,
    pub(crate) alloca_count: usize,
    pub(crate) temp_count: usize,
}

impl Function {
    /// Labels of blocks reachable from the entry block. Blocks that became
    /// unreachable during lowering (e.g. the merge block of an `if` whose
    /// branches both return) are not serialized.
    fn reachable_labels(&self) -> HashSet<String> {
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(entry) = self.blocks.first() {
            reachable.insert(entry.label.clone());
            queue.push_back(0);
        }

        while let Some(index) = queue.pop_front() {
            let successors = self.blocks[index].successors.clone();
            for successor in successors {
                if reachable.insert(successor.clone()) {
                    if let Some(position) =
                        self.blocks.iter().position(|block| block.label == successor)
                    {
                        queue.push_back(position);
                    }
                }
            }
        }

        reachable
    }

    fn print(&self, out: &mut String) {
        let params = self
            .params
            .iter()
            .map(|(name, ty)| {
                if self.is_declaration {
                    ty.to_string()
                } else {
                    format!("{ty} %{name}")
                }
            })
            .collect::<Vec<_>>()
            .join(", ");

        if self.is_declaration {
            let _ = writeln!(out, "declare {} @{}({})", self.return_type, self.name, params);
            return;
        }

        let _ = writeln!(out, "define {} @{}({}) {{", self.return_type, self.name, params);

        let reachable = self.reachable_labels();
        for block in &self.blocks {
            if !reachable.contains(&block.label) {
                continue;
            }

            let _ = writeln!(out, "{}:", block.label);
            for instruction in &block.instructions {
                let _ = writeln!(out, "  {instruction}");
            }
            if let Some(terminator) = &block.terminator {
                let _ = writeln!(out, "  {terminator}");
            }
        }

        let _ = writeln!(out, "}}");
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Global {
    pub(crate) name: String,
    pub(crate) ty: IrType,
}

/// A whole compilation unit. Built through [`Builder`], then serialized with
/// [`Module::print_to_string`].
#[derive(Debug, Clone)]
pub struct Module {
    pub(crate) name: String,
    pub(crate) globals: Vec<Global>,
    pub(crate) functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            globals: vec![],
            functions: vec![],
        }
    }

    pub fn print_to_string(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "; ModuleID = '{}'", self.name);
        let _ = writeln!(out, "source_filename = \"{}\"", self.name);

        if !self.globals.is_empty() {
            let _ = writeln!(out);
        }
        for global in &self.globals {
            let _ = writeln!(
                out,
                "@{} = common global {} {}",
                global.name,
                global.ty,
                global.ty.null_value()
            );
        }

        for function in &self.functions {
            let _ = writeln!(out);
            function.print(&mut out);
        }

        out
    }
}
