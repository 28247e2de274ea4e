//! Canonical identities for abstract memory locations.
//!
//! An [`AliasToken`] names one logical location discovered while walking the
//! IR: a runtime value, a typed heap object, a formal parameter, or a
//! synthetic placeholder with no IR value behind it. Downstream points-to
//! analysis treats each token as the unit aliasing relationships are
//! computed over, so two tokens must compare equal exactly when they denote
//! the same location.

use pointsto_ir::{ArgRef, FunctionId, GlobalId, InstRef, Module, Operand, TypeId};
use std::borrow::Cow;
use std::fmt;

/// Payload of a value-kind token: a concrete runtime value that is not a
/// formal parameter (parameters get [`TokenKind::Arg`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueRef {
    /// The result of an instruction.
    Inst(InstRef),
    /// A module-level global variable.
    Global(GlobalId),
    /// A value derived from an integer literal.
    Const(i64),
}

/// The four identity kinds a token can carry. Exactly one payload exists per
/// token; there is no kind flag to drift out of sync with it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    /// A concrete runtime value.
    Value(ValueRef),
    /// A location keyed by a type rather than a value: the object a typed
    /// heap allocation produced.
    Mem(TypeId),
    /// A formal parameter.
    Arg(ArgRef),
    /// A synthetic location, e.g. "the value originally stored into a fresh
    /// stack slot".
    Named(String),
}

/// Canonical identity of one abstract memory location.
///
/// A token is global exactly when it has no owning function; there is no
/// separate global flag. The derived ordering compares payload identity,
/// then scope, then field index, and is total (tags order by declaration),
/// though the engine only ever compares tokens of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AliasToken {
    kind: TokenKind,
    /// Owning function; `None` for module-scoped (global) identities.
    scope: Option<FunctionId>,
    /// Folded access-path offset; `None` means the whole object.
    field: Option<i64>,
}

impl AliasToken {
    /// Token for a generic value operand. Formal parameters become `Arg`
    /// tokens scoped to their function; instruction results are scoped to
    /// their parent function; globals and integer literals have no function
    /// context and are module-scoped.
    pub fn of_operand(op: &Operand) -> Self {
        match *op {
            Operand::Arg(arg) => AliasToken {
                kind: TokenKind::Arg(arg),
                scope: Some(arg.func),
                field: None,
            },
            Operand::Inst(at) => AliasToken {
                kind: TokenKind::Value(ValueRef::Inst(at)),
                scope: Some(at.func),
                field: None,
            },
            Operand::Global(id) => AliasToken {
                kind: TokenKind::Value(ValueRef::Global(id)),
                scope: None,
                field: None,
            },
            Operand::Const(value) => AliasToken {
                kind: TokenKind::Value(ValueRef::Const(value)),
                scope: None,
                field: None,
            },
        }
    }

    /// Token for the result of an instruction.
    pub fn of_inst(at: InstRef) -> Self {
        AliasToken {
            kind: TokenKind::Value(ValueRef::Inst(at)),
            scope: Some(at.func),
            field: None,
        }
    }

    /// Token for a formal parameter, scoped to its owning function.
    pub fn of_arg(arg: ArgRef) -> Self {
        AliasToken {
            kind: TokenKind::Arg(arg),
            scope: Some(arg.func),
            field: None,
        }
    }

    /// Token keyed by a type. Types are not associated with any function.
    pub fn of_type(ty: TypeId) -> Self {
        AliasToken {
            kind: TokenKind::Mem(ty),
            scope: None,
            field: None,
        }
    }

    /// Synthetic token with an explicit name; global when no function is
    /// given.
    pub fn named(name: impl Into<String>, func: Option<FunctionId>) -> Self {
        AliasToken {
            kind: TokenKind::Named(name.into()),
            scope: func,
            field: None,
        }
    }

    /// Copy of this token carrying an explicit field offset.
    pub fn with_field(mut self, index: i64) -> Self {
        self.field = Some(index);
        self
    }

    /// Copy of this token with the field offset folded from an access-path
    /// index sequence. See [`fold_access_path`].
    pub fn with_access_path<'a>(self, indices: impl IntoIterator<Item = &'a Operand>) -> Self {
        self.with_field(fold_access_path(indices))
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    /// Owning function, or `None` for global tokens.
    pub fn scope(&self) -> Option<FunctionId> {
        self.scope
    }

    /// Field offset, or `None` for the whole object.
    pub fn field_index(&self) -> Option<i64> {
        self.field
    }

    /// True for type-keyed tokens: the model treats those as heap locations.
    pub fn is_mem(&self) -> bool {
        matches!(self.kind, TokenKind::Mem(_))
    }

    /// True for formal-parameter tokens.
    pub fn is_arg(&self) -> bool {
        matches!(self.kind, TokenKind::Arg(_))
    }

    /// True for value tokens with no owning function: module-level globals
    /// and values with no function context.
    pub fn is_global_var(&self) -> bool {
        matches!(self.kind, TokenKind::Value(_)) && self.scope.is_none()
    }

    /// Seed-point classification for the downstream analysis.
    pub fn is_alloca_arg_or_global(&self) -> bool {
        self.is_mem() || self.is_global_var() || self.is_arg()
    }

    /// True when the token is owned by exactly `func`.
    pub fn same_func(&self, func: FunctionId) -> bool {
        self.scope == Some(func)
    }

    /// The underlying value for value-kind tokens; absent for the others.
    pub fn value(&self) -> Option<ValueRef> {
        match self.kind {
            TokenKind::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The token's bare name: the value's, parameter's, or synthetic name.
    /// Type-keyed tokens have no name.
    pub fn name<'a>(&'a self, module: &'a Module) -> Cow<'a, str> {
        match &self.kind {
            TokenKind::Value(ValueRef::Inst(at)) => {
                Cow::Borrowed(module.inst(*at).name.as_str())
            }
            TokenKind::Value(ValueRef::Global(id)) => {
                Cow::Borrowed(module.global(*id).name.as_str())
            }
            TokenKind::Value(ValueRef::Const(value)) => Cow::Owned(value.to_string()),
            TokenKind::Arg(arg) => {
                Cow::Borrowed(module.function(arg.func).param(arg.index).name.as_str())
            }
            TokenKind::Named(name) => Cow::Borrowed(name.as_str()),
            TokenKind::Mem(_) => Cow::Borrowed(""),
        }
    }

    /// Renderer for diagnostics: `[function] name[field]`, with the type
    /// text in place of a name for type-keyed tokens.
    pub fn display<'a>(&'a self, module: &'a Module) -> TokenDisplay<'a> {
        TokenDisplay {
            token: self,
            module,
        }
    }
}

/// Folds a structural index sequence into a compact field offset:
/// `acc = acc*2 + 1` for each index that is the integer literal one, and
/// `acc = acc*2` for every other index. The empty sequence folds to 0.
///
/// This is a deliberate approximation, not a general path-sensitive offset:
/// it biases toward telling the 0th and 1st field of two-field/tagged
/// structures apart, and collapses every other index shape. Constants other
/// than one (including zero and negatives) are indistinguishable from
/// non-constant indices.
pub fn fold_access_path<'a>(indices: impl IntoIterator<Item = &'a Operand>) -> i64 {
    indices
        .into_iter()
        .fold(0, |acc, idx| acc * 2 + i64::from(idx.is_one()))
}

/// Module-contextual display adapter for [`AliasToken`].
pub struct TokenDisplay<'a> {
    token: &'a AliasToken,
    module: &'a Module,
}

impl fmt::Display for TokenDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(func) = self.token.scope {
            write!(f, "[{}] ", self.module.function(func).name())?;
        }
        match &self.token.kind {
            TokenKind::Mem(ty) => write!(f, "{}", self.module.render_type(*ty))?,
            _ => write!(f, "{}", self.token.name(self.module))?,
        }
        if let Some(index) = self.token.field {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pointsto_ir::InstKind;

    fn demo() -> (Module, FunctionId) {
        let mut module = Module::new("demo");
        let i32_ty = module.int_type(32);
        let func = module.add_function("main", &[("argc", i32_ty)]);
        (module, func)
    }

    #[test]
    fn operands_classify_by_kind() {
        let (mut module, func) = demo();
        let i32_ty = module.int_type(32);
        let g = module.add_global("g", i32_ty);
        let p = module.push_inst(func, "p", InstKind::Alloca { allocated: i32_ty });

        let from_inst = AliasToken::of_operand(&Operand::Inst(p));
        assert_eq!(from_inst.scope(), Some(func));
        assert!(!from_inst.is_global_var());
        assert!(from_inst.same_func(func));
        assert_eq!(from_inst.value(), Some(ValueRef::Inst(p)));

        let from_global = AliasToken::of_operand(&Operand::Global(g));
        assert!(from_global.is_global_var());
        assert!(from_global.is_alloca_arg_or_global());
        assert_eq!(from_global.scope(), None);

        let from_arg = AliasToken::of_operand(&Operand::Arg(ArgRef { func, index: 0 }));
        assert!(from_arg.is_arg());
        assert!(!from_arg.is_global_var());
        assert_eq!(from_arg.scope(), Some(func));

        let from_const = AliasToken::of_operand(&Operand::Const(7));
        assert!(from_const.is_global_var());
        assert_eq!(from_const.value(), Some(ValueRef::Const(7)));
    }

    #[test]
    fn type_tokens_are_mem() {
        let (mut module, _) = demo();
        let foo = module.struct_type("class.Foo");
        let token = AliasToken::of_type(foo);
        assert!(token.is_mem());
        assert!(token.is_alloca_arg_or_global());
        assert_eq!(token.scope(), None);
        assert!(!token.is_global_var());
        assert_eq!(token.name(&module), "");
        assert_eq!(token.value(), None);
    }

    #[test]
    fn named_tokens_scope_by_function() {
        let (module, func) = demo();
        let local = AliasToken::named("p-orig", Some(func));
        assert_eq!(local.scope(), Some(func));
        assert!(local.same_func(func));
        assert_eq!(local.name(&module), "p-orig");

        let global = AliasToken::named("env", None);
        assert_eq!(global.scope(), None);
        // Named tokens are never global *variables*.
        assert!(!global.is_global_var());
    }

    #[test]
    fn access_path_folding() {
        let (_, func) = demo();
        let zero = Operand::Const(0);
        let one = Operand::Const(1);
        assert_eq!(fold_access_path([&zero, &one, &one]), 3);
        assert_eq!(fold_access_path([&one]), 1);
        assert_eq!(fold_access_path([&one, &zero]), 2);

        let empty: [&Operand; 0] = [];
        assert_eq!(fold_access_path(empty), 0);

        // Constants other than one count like non-constants.
        let two = Operand::Const(2);
        let dynamic = Operand::Arg(ArgRef { func, index: 0 });
        assert_eq!(fold_access_path([&two, &dynamic, &one]), 1);
    }

    #[test]
    fn access_paths_fold_from_instructions() {
        let (mut module, func) = demo();
        let pair = module.struct_type("struct.pair");
        let base = module.push_inst(func, "s", InstKind::Alloca { allocated: pair });
        let gep = module.push_inst(
            func,
            "fld",
            InstKind::GetElementPtr {
                base: Operand::Inst(base),
                indices: vec![Operand::Const(0), Operand::Const(1), Operand::Const(1)],
            },
        );

        let InstKind::GetElementPtr { indices, .. } = &module.inst(gep).kind else {
            unreachable!()
        };
        let token = AliasToken::of_inst(gep).with_access_path(indices);
        assert_eq!(token.field_index(), Some(3));
    }

    #[test]
    fn with_field_marks_offsets() {
        let (_, func) = demo();
        let token = AliasToken::named("slot", Some(func));
        assert_eq!(token.field_index(), None);
        let offset = token.clone().with_field(3);
        assert_eq!(offset.field_index(), Some(3));
        assert_ne!(token, offset);

        let zero = Operand::Const(0);
        let folded = token.with_access_path([&zero]);
        // An empty-or-zero path is still a field mark, distinct from the
        // whole object.
        assert_eq!(folded.field_index(), Some(0));
    }

    #[test]
    fn ordering_is_strict_and_total() {
        let (_, func) = demo();
        let a = AliasToken::named("a", Some(func));
        let b = AliasToken::named("b", Some(func));
        let b_field = b.clone().with_field(1);
        assert!(a < b);
        assert!(b < b_field);
        assert!(a < b_field);
        assert!(!(a < a.clone()));
    }

    #[test]
    fn display_formats() {
        let (mut module, func) = demo();
        let i32_ty = module.int_type(32);
        let p = module.push_inst(func, "p", InstKind::Alloca { allocated: i32_ty });
        let foo = module.struct_type("class.Foo");
        let foop = module.ptr_type(foo);

        let scoped = AliasToken::of_inst(p).with_field(3);
        insta::assert_snapshot!(scoped.display(&module).to_string(), @"[main] p[3]");

        let mem = AliasToken::of_type(foop);
        insta::assert_snapshot!(mem.display(&module).to_string(), @"%class.Foo*");

        let g = module.add_global("g", i32_ty);
        let global = AliasToken::of_operand(&Operand::Global(g));
        insta::assert_snapshot!(global.display(&module).to_string(), @"g");
    }
}
