//! Value operands: the things instructions read.

use crate::function::{ArgRef, InstRef};

/// Unique identifier for a module-level global variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalId(pub u32);

/// A value operand of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operand {
    /// The result of another instruction.
    Inst(InstRef),
    /// A module-level global variable.
    Global(GlobalId),
    /// A formal parameter of the enclosing function.
    Arg(ArgRef),
    /// An integer literal.
    Const(i64),
}

impl Operand {
    /// True for integer literals, which carry no aliasing identity.
    pub fn is_const_int(&self) -> bool {
        matches!(self, Operand::Const(_))
    }

    /// True for the integer literal one.
    pub fn is_one(&self) -> bool {
        matches!(self, Operand::Const(1))
    }
}

/// The callee of a call instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Callee {
    /// Call through a known symbol name.
    Direct(String),
    /// Call through a function pointer; the target cannot be resolved.
    Indirect(Operand),
}

impl Callee {
    /// The target symbol name, if the call is direct.
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Callee::Direct(sym) => Some(sym),
            Callee::Indirect(_) => None,
        }
    }
}
