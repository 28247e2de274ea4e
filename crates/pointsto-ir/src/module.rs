//! The module: functions, globals and the type table, with text rendering.
//!
//! Rendering is LLVM-flavored and exists for diagnostics and display tests;
//! nothing parses it back.

use crate::function::{Function, FunctionId, Inst, InstKind, InstRef, Param};
use crate::types::{Type, TypeId, TypeTable};
use crate::value::{Callee, GlobalId, Operand};
use rustc_hash::FxHashMap;
use std::borrow::Cow;
use std::fmt::Write as _;

/// A module-level global variable.
#[derive(Debug, Clone)]
pub struct GlobalVar {
    pub name: String,
    pub ty: TypeId,
}

/// One translation unit: the root of the IR.
#[derive(Debug, Default)]
pub struct Module {
    name: String,
    types: TypeTable,
    globals: Vec<GlobalVar>,
    global_names: FxHashMap<String, GlobalId>,
    functions: Vec<Function>,
    function_names: FxHashMap<String, FunctionId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Module::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // -- types ---------------------------------------------------------

    pub fn intern_type(&mut self, ty: Type) -> TypeId {
        self.types.intern(ty)
    }

    pub fn void_type(&mut self) -> TypeId {
        self.types.intern(Type::Void)
    }

    pub fn int_type(&mut self, bits: u32) -> TypeId {
        self.types.intern(Type::Int(bits))
    }

    pub fn float_type(&mut self) -> TypeId {
        self.types.intern(Type::Float)
    }

    pub fn ptr_type(&mut self, pointee: TypeId) -> TypeId {
        self.types.intern(Type::Ptr(pointee))
    }

    pub fn array_type(&mut self, elem: TypeId, len: u64) -> TypeId {
        self.types.intern(Type::Array { elem, len })
    }

    pub fn struct_type(&mut self, name: impl Into<String>) -> TypeId {
        self.types.intern(Type::Struct(name.into()))
    }

    /// Looks up a type. Panics if `id` was not minted by this module.
    pub fn ty(&self, id: TypeId) -> &Type {
        self.types.get(id)
    }

    /// Renders a type as LLVM-flavored text.
    pub fn render_type(&self, id: TypeId) -> String {
        self.types.render(id)
    }

    // -- globals -------------------------------------------------------

    /// Returns the global named `name`, creating it on first request.
    /// A later request under the same name returns the existing global
    /// regardless of `ty`.
    pub fn add_global(&mut self, name: impl Into<String>, ty: TypeId) -> GlobalId {
        let name = name.into();
        if let Some(&id) = self.global_names.get(&name) {
            return id;
        }
        let id = GlobalId(self.globals.len() as u32);
        self.global_names.insert(name.clone(), id);
        self.globals.push(GlobalVar { name, ty });
        id
    }

    /// Looks up a global. Panics if `id` was not minted by this module.
    pub fn global(&self, id: GlobalId) -> &GlobalVar {
        &self.globals[id.0 as usize]
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &GlobalVar)> {
        self.globals
            .iter()
            .enumerate()
            .map(|(i, g)| (GlobalId(i as u32), g))
    }

    // -- functions -----------------------------------------------------

    /// Adds a function. Colliding names are suffixed (`f`, `f.1`, ...), so
    /// every function keeps a distinct name.
    pub fn add_function(&mut self, name: &str, params: &[(&str, TypeId)]) -> FunctionId {
        let mut unique = name.to_owned();
        let mut n = 1u32;
        while self.function_names.contains_key(&unique) {
            unique = format!("{name}.{n}");
            n += 1;
        }
        let id = FunctionId(self.functions.len() as u32);
        self.function_names.insert(unique.clone(), id);
        let params = params
            .iter()
            .map(|&(name, ty)| Param {
                name: name.to_owned(),
                ty,
            })
            .collect();
        self.functions.push(Function::new(unique, params));
        id
    }

    /// Looks up a function. Panics if `id` was not minted by this module.
    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }

    pub fn function_by_name(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i as u32), f))
    }

    /// Appends an instruction to `func` and returns a reference to it.
    /// See [`Function`] for how result names are resolved.
    ///
    /// Panics if `func` was not minted by this module.
    pub fn push_inst(&mut self, func: FunctionId, name: &str, kind: InstKind) -> InstRef {
        let index = self.functions[func.0 as usize].push(name, kind);
        InstRef { func, index }
    }

    /// Looks up an instruction. Panics if `at` was not minted by this module.
    pub fn inst(&self, at: InstRef) -> &Inst {
        self.function(at.func).inst(at.index)
    }

    /// The nearest earlier non-debug instruction in the same function.
    pub fn prev_non_debug(&self, at: InstRef) -> Option<InstRef> {
        self.function(at.func)
            .prev_non_debug(at.index)
            .map(|index| InstRef {
                func: at.func,
                index,
            })
    }

    /// The nearest later non-debug instruction in the same function.
    pub fn next_non_debug(&self, at: InstRef) -> Option<InstRef> {
        self.function(at.func)
            .next_non_debug(at.index)
            .map(|index| InstRef {
                func: at.func,
                index,
            })
    }

    // -- names and rendering -------------------------------------------

    /// The bare name of an operand: result name for instructions, variable
    /// name for globals, parameter name for arguments, and the literal text
    /// for integer constants (which have no name of their own).
    pub fn operand_name(&self, op: &Operand) -> Cow<'_, str> {
        match *op {
            Operand::Inst(at) => Cow::Borrowed(self.inst(at).name.as_str()),
            Operand::Global(id) => Cow::Borrowed(self.global(id).name.as_str()),
            Operand::Arg(arg) => {
                Cow::Borrowed(self.function(arg.func).param(arg.index).name.as_str())
            }
            Operand::Const(value) => Cow::Owned(value.to_string()),
        }
    }

    /// Renders an operand with its sigil: `%local`, `@global`, or a literal.
    pub fn render_operand(&self, op: &Operand) -> String {
        match *op {
            Operand::Inst(_) | Operand::Arg(_) => format!("%{}", self.operand_name(op)),
            Operand::Global(_) => format!("@{}", self.operand_name(op)),
            Operand::Const(value) => value.to_string(),
        }
    }

    /// Renders one instruction as a line of LLVM-flavored text.
    pub fn render_inst(&self, at: InstRef) -> String {
        let inst = self.inst(at);
        let mut out = String::new();
        if inst.has_result() {
            let _ = write!(out, "%{} = ", inst.name);
        }
        match &inst.kind {
            InstKind::Alloca { allocated } => {
                let _ = write!(out, "alloca {}", self.render_type(*allocated));
            }
            InstKind::Load { ptr } => {
                let _ = write!(out, "load {}", self.render_operand(ptr));
            }
            InstKind::Store { value, ptr } => {
                let _ = write!(
                    out,
                    "store {}, {}",
                    self.render_operand(value),
                    self.render_operand(ptr)
                );
            }
            InstKind::GetElementPtr { base, indices } => {
                let _ = write!(out, "getelementptr {}", self.render_operand(base));
                for idx in indices {
                    let _ = write!(out, ", {}", self.render_operand(idx));
                }
            }
            InstKind::Bitcast { value, from, to } => {
                let _ = write!(
                    out,
                    "bitcast {} {} to {}",
                    self.render_type(*from),
                    self.render_operand(value),
                    self.render_type(*to)
                );
            }
            InstKind::Call { callee, args } => {
                match callee {
                    Callee::Direct(sym) => {
                        let _ = write!(out, "call @{sym}(");
                    }
                    Callee::Indirect(target) => {
                        let _ = write!(out, "call {}(", self.render_operand(target));
                    }
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.render_operand(arg));
                }
                out.push(')');
            }
            InstKind::Ret { value: Some(value) } => {
                let _ = write!(out, "ret {}", self.render_operand(value));
            }
            InstKind::Ret { value: None } => out.push_str("ret void"),
            InstKind::Add { lhs, rhs } => {
                let _ = write!(
                    out,
                    "add {}, {}",
                    self.render_operand(lhs),
                    self.render_operand(rhs)
                );
            }
        }
        out
    }
}

/// Convenience for tests and drivers: every instruction of every function,
/// in program order.
pub fn all_insts(module: &Module) -> Vec<InstRef> {
    let mut insts = Vec::new();
    for (id, func) in module.functions() {
        for index in 0..func.insts().len() as u32 {
            insts.push(InstRef { func: id, index });
        }
    }
    insts
}
