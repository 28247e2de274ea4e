//! Minimal LLVM-flavored IR substrate for the pointsto analyses.
//!
//! This crate models just enough of a compiler's intermediate representation
//! for memory analyses to run over: a [`Module`] owning functions with flat
//! instruction lists, globals, and an interned [`TypeTable`] with textual
//! rendering. The analyses in `pointsto-core` only read from it.
//!
//! What the analyses require of the model:
//! - operand access and bare-name resolution (names unique per scope),
//! - parent-function lookup (carried inside [`InstRef`] / [`ArgRef`]),
//! - "is an integer literal" / "is the literal one" operand tests,
//! - injective textual type rendering,
//! - a call's target symbol, absent for indirect calls,
//! - previous/next non-debug instruction walking.
//!
//! Design: ids are plain `u32` newtypes into module-owned vectors; nothing
//! here borrows arena memory, so analysis results can outlive any traversal.

pub mod function;
pub mod module;
pub mod types;
pub mod value;

pub use function::{ArgRef, Function, FunctionId, Inst, InstKind, InstRef, Param};
pub use module::{all_insts, GlobalVar, Module};
pub use types::{Type, TypeId, TypeTable};
pub use value::{Callee, GlobalId, Operand};
