//! Canonical-identity and interning layer for abstract memory locations.
//!
//! Given heterogeneous instruction operands — runtime values, stack and heap
//! allocation sites, function arguments, type descriptors and synthetic
//! names — this crate produces one canonical token per distinct logical
//! location, deduplicated across the whole analysis run. A points-to
//! analysis downstream treats the token as the unit aliasing relationships
//! are computed over, so at-most-one-token-per-location is a soundness
//! requirement, not an optimization.
//!
//! ```text
//! token::AliasToken (identity model, leaf)
//!  └─> bank::TokenBank (interning engine + per-instruction extraction)
//! ```
//!
//! A driver visits each instruction of each function and calls
//! [`TokenBank::extract`]; extraction interns a token per relevant operand
//! and returns their ids in instruction-operand order. Repeated requests for
//! the same location always return the same [`TokenId`].
//!
//! ```
//! use pointsto_core::TokenBank;
//! use pointsto_ir::{InstKind, Module};
//!
//! let mut module = Module::new("demo");
//! let i32_ty = module.int_type(32);
//! let main = module.add_function("main", &[]);
//! let slot = module.push_inst(main, "x", InstKind::Alloca { allocated: i32_ty });
//!
//! let mut bank = TokenBank::new();
//! let tokens = bank.extract(&module, slot);
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(bank[tokens[0]].name(&module), "x");
//! assert_eq!(bank[tokens[1]].name(&module), "x-orig");
//! ```

pub mod bank;
pub mod token;

pub use bank::{TokenBank, TokenId};
pub use token::{fold_access_path, AliasToken, TokenDisplay, TokenKind, ValueRef};
