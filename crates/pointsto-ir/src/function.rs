//! Functions and their instructions.
//!
//! Instructions live in a flat per-function list; an `InstRef` is the owning
//! function plus a position in that list. Result names are uniquified on
//! insertion (LLVM behavior), so name + function identifies a value — the
//! property the alias layer's canonical hashing depends on.

use crate::types::TypeId;
use crate::value::{Callee, Operand};
use rustc_hash::FxHashSet;

/// Unique identifier for a function within a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(pub u32);

/// Reference to an instruction: owning function plus position in its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstRef {
    pub func: FunctionId,
    pub index: u32,
}

/// Reference to a formal parameter of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArgRef {
    pub func: FunctionId,
    pub index: u32,
}

/// A formal parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
}

/// An instruction operation together with its operands.
#[derive(Debug, Clone)]
pub enum InstKind {
    /// Stack allocation of one slot of the given type.
    Alloca { allocated: TypeId },
    /// Read through a pointer.
    Load { ptr: Operand },
    /// Write `value` through `ptr`.
    Store { value: Operand, ptr: Operand },
    /// Derived address: base plus a sequence of structural indices.
    GetElementPtr { base: Operand, indices: Vec<Operand> },
    /// Pointer reinterpretation of `value` from `from` to `to`.
    Bitcast {
        value: Operand,
        from: TypeId,
        to: TypeId,
    },
    /// Function call.
    Call { callee: Callee, args: Vec<Operand> },
    /// Return, with or without a value.
    Ret { value: Option<Operand> },
    /// Two-operand arithmetic; no memory identity of its own.
    Add { lhs: Operand, rhs: Operand },
}

impl InstKind {
    /// True for operations that define an SSA result. Calls may or may not
    /// (void-returning callees); the builder resolves that from whether a
    /// result name was supplied.
    fn is_void(&self) -> bool {
        matches!(self, InstKind::Store { .. } | InstKind::Ret { .. })
    }
}

/// One instruction: an SSA result name plus the operation.
#[derive(Debug, Clone)]
pub struct Inst {
    /// Result name, unique within the function; empty when the instruction
    /// produces no value.
    pub name: String,
    pub kind: InstKind,
}

impl Inst {
    /// Debug intrinsics (`llvm.dbg.*`) are transparent to the instruction
    /// sequencing queries.
    pub fn is_debug(&self) -> bool {
        match &self.kind {
            InstKind::Call {
                callee: Callee::Direct(sym),
                ..
            } => sym.starts_with("llvm.dbg."),
            _ => false,
        }
    }

    /// True when the instruction defines an SSA value.
    pub fn has_result(&self) -> bool {
        !self.name.is_empty()
    }
}

/// A function: named parameters plus a flat instruction list.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    params: Vec<Param>,
    insts: Vec<Inst>,
    /// Names already taken by parameters or instruction results.
    used_names: FxHashSet<String>,
    /// Counter for auto-generated `%0`-style result names.
    next_tmp: u32,
}

impl Function {
    pub(crate) fn new(name: String, params: Vec<Param>) -> Self {
        let mut func = Function {
            name,
            params: Vec::new(),
            insts: Vec::new(),
            used_names: FxHashSet::default(),
            next_tmp: 0,
        };
        for param in params {
            let name = func.claim_name(&param.name);
            func.params.push(Param { name, ty: param.ty });
        }
        func
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    /// Looks up a parameter by position.
    ///
    /// Panics if `index` is out of range.
    pub fn param(&self, index: u32) -> &Param {
        &self.params[index as usize]
    }

    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// Looks up an instruction by position.
    ///
    /// Panics if `index` is out of range.
    pub fn inst(&self, index: u32) -> &Inst {
        &self.insts[index as usize]
    }

    /// Appends an instruction, resolving its result name, and returns its
    /// position. An empty `name` for a value-producing operation gets an
    /// auto-generated numeric name; an empty name for a call marks a void
    /// call.
    pub(crate) fn push(&mut self, name: &str, kind: InstKind) -> u32 {
        let resolved = if kind.is_void() || (name.is_empty() && matches!(kind, InstKind::Call { .. }))
        {
            String::new()
        } else if name.is_empty() {
            self.fresh_tmp_name()
        } else {
            self.claim_name(name)
        };
        let index = self.insts.len() as u32;
        self.insts.push(Inst {
            name: resolved,
            kind,
        });
        index
    }

    /// Position of the nearest earlier non-debug instruction.
    pub fn prev_non_debug(&self, index: u32) -> Option<u32> {
        let mut i = index;
        while i > 0 {
            i -= 1;
            if !self.insts[i as usize].is_debug() {
                return Some(i);
            }
        }
        None
    }

    /// Position of the nearest later non-debug instruction.
    pub fn next_non_debug(&self, index: u32) -> Option<u32> {
        let mut i = index + 1;
        while (i as usize) < self.insts.len() {
            if !self.insts[i as usize].is_debug() {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    fn claim_name(&mut self, base: &str) -> String {
        if self.used_names.insert(base.to_owned()) {
            return base.to_owned();
        }
        let mut n = 1u32;
        loop {
            let candidate = format!("{base}{n}");
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn fresh_tmp_name(&mut self) -> String {
        loop {
            let candidate = self.next_tmp.to_string();
            self.next_tmp += 1;
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
