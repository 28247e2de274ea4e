//! The token bank: at-most-one token per distinct location.
//!
//! [`TokenBank`] owns every [`AliasToken`] it hands out. Get-or-create
//! accessors compute a canonical key for the candidate identity and either
//! return the id of the existing entry or insert the candidate; callers may
//! rely on id equality to mean "same location". The extract accessors apply
//! instruction-specific rules to turn one instruction's operands into the
//! ordered token list the downstream analysis reasons over.
//!
//! Single-threaded by design: one bank per analysis run, the bank is the
//! sole mutator, and tokens live until the bank is dropped.

use crate::token::AliasToken;
use indexmap::IndexMap;
use pointsto_ir::{ArgRef, FunctionId, InstKind, InstRef, Module, Operand, TypeId};
use rustc_hash::FxBuildHasher;
use std::ops::Index;
use tracing::debug;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Mangled-name prefix of raw allocation routines (`operator new` family).
const RAW_ALLOC_PREFIX: &str = "_Zn";
/// Mangled-name prefix of class/namespace-qualified routines; a call to one
/// right at an allocation site is taken to be the constructor call.
const QUALIFIED_PREFIX: &str = "_ZN";

/// Stable identity of an interned token. Ids from the same bank compare
/// equal exactly when the tokens denote the same location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenId(pub u32);

/// Interning store for [`AliasToken`]s, keyed by canonical identity text.
#[derive(Debug, Default)]
pub struct TokenBank {
    store: FxIndexMap<String, AliasToken>,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-create for a pre-built candidate. The bank takes ownership;
    /// if an equal token already exists the candidate is simply dropped and
    /// the existing id returned.
    pub fn intern(&mut self, module: &Module, token: AliasToken) -> TokenId {
        let key = canonical_key(module, &token);
        let entry = self.store.entry(key);
        let id = TokenId(entry.index() as u32);
        entry.or_insert(token);
        id
    }

    /// Get-or-create for a generic value operand.
    pub fn intern_operand(&mut self, module: &Module, op: &Operand) -> TokenId {
        self.intern(module, AliasToken::of_operand(op))
    }

    /// Get-or-create for an instruction's result value.
    pub fn intern_inst(&mut self, module: &Module, at: InstRef) -> TokenId {
        self.intern(module, AliasToken::of_inst(at))
    }

    /// Get-or-create for a formal parameter.
    pub fn intern_arg(&mut self, module: &Module, arg: ArgRef) -> TokenId {
        self.intern(module, AliasToken::of_arg(arg))
    }

    /// Get-or-create for a type-keyed heap location.
    pub fn intern_type(&mut self, module: &Module, ty: TypeId) -> TokenId {
        self.intern(module, AliasToken::of_type(ty))
    }

    /// Get-or-create for a synthetic named location; pass `None` for a
    /// module-scoped one.
    pub fn intern_named(
        &mut self,
        module: &Module,
        name: impl Into<String>,
        func: Option<FunctionId>,
    ) -> TokenId {
        self.intern(module, AliasToken::named(name, func))
    }

    /// True when an equal token has already been interned.
    pub fn contains(&self, module: &Module, token: &AliasToken) -> bool {
        self.store.contains_key(&canonical_key(module, token))
    }

    pub fn get(&self, id: TokenId) -> Option<&AliasToken> {
        self.store.get_index(id.0 as usize).map(|(_, token)| token)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// All interned tokens in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &AliasToken)> {
        self.store
            .values()
            .enumerate()
            .map(|(i, token)| (TokenId(i as u32), token))
    }

    /// The ordered list of tokens relevant to one instruction's memory
    /// effects. Instruction kinds with no extraction rule yield an empty
    /// list after logging a diagnostic.
    pub fn extract(&mut self, module: &Module, at: InstRef) -> Vec<TokenId> {
        match &module.inst(at).kind {
            InstKind::Store { value, ptr } => self.extract_store(module, value, ptr),
            InstKind::Load { ptr } => self.extract_load(module, at, ptr),
            InstKind::Alloca { .. } => self.extract_alloca(module, at),
            InstKind::Bitcast { value, from, to } => {
                self.extract_bitcast(module, at, value, *from, *to)
            }
            InstKind::Ret { value } => self.extract_ret(module, value.as_ref()),
            _ => {
                debug!(inst = %module.render_inst(at), "unsupported instruction kind");
                Vec::new()
            }
        }
    }

    /// `store value, ptr`: the stored value (unless it is an integer
    /// literal, which carries no aliasing identity) followed by the
    /// destination pointer.
    fn extract_store(&mut self, module: &Module, value: &Operand, ptr: &Operand) -> Vec<TokenId> {
        let mut tokens = Vec::with_capacity(2);
        if !value.is_const_int() {
            tokens.push(self.intern_operand(module, value));
        }
        tokens.push(self.intern_operand(module, ptr));
        tokens
    }

    /// `x = load ptr`: the loaded result itself, then the source pointer.
    fn extract_load(&mut self, module: &Module, at: InstRef, ptr: &Operand) -> Vec<TokenId> {
        vec![self.intern_inst(module, at), self.intern_operand(module, ptr)]
    }

    /// `x = alloca ty`: the allocation site, then a synthetic `<name>-orig`
    /// placeholder for the value that will eventually be stored into the
    /// fresh slot, scoped to the enclosing function.
    fn extract_alloca(&mut self, module: &Module, at: InstRef) -> Vec<TokenId> {
        let slot = self.intern_inst(module, at);
        let orig = format!("{}-orig", module.inst(at).name);
        let placeholder = self.intern_named(module, orig, Some(at.func));
        vec![slot, placeholder]
    }

    /// `ret value`: the returned value unless it is absent or an integer
    /// literal, in which case there is nothing to track.
    fn extract_ret(&mut self, module: &Module, value: Option<&Operand>) -> Vec<TokenId> {
        match value {
            Some(value) if !value.is_const_int() => {
                vec![self.intern_operand(module, value)]
            }
            _ => Vec::new(),
        }
    }

    /// `x = bitcast value from to`: the cast result first; then, when the
    /// cast sits inside the allocate-then-construct idiom, the type-keyed
    /// token of the heap object being produced; otherwise the cast's source
    /// operand.
    fn extract_bitcast(
        &mut self,
        module: &Module,
        at: InstRef,
        value: &Operand,
        from: TypeId,
        to: TypeId,
    ) -> Vec<TokenId> {
        let mut tokens = Vec::with_capacity(2);
        tokens.push(self.intern_inst(module, at));
        if let Some(heap_ty) = recognize_heap_allocation(module, at, from, to) {
            tokens.push(self.intern_type(module, heap_ty));
        }
        if tokens.len() == 1 {
            tokens.push(self.intern_operand(module, value));
        }
        tokens
    }
}

impl Index<TokenId> for TokenBank {
    type Output = AliasToken;

    fn index(&self, id: TokenId) -> &AliasToken {
        &self.store[id.0 as usize]
    }
}

/// Canonical identity text for a token.
///
/// Components, in fixed order: a kind discriminant, a `G` marker for global
/// value tokens, the (sigiled) name, the scope function's name, the type
/// rendering for type-keyed tokens, and the field index. Separators keep
/// component boundaries from blurring, the discriminant keeps same-named
/// identities of different kinds apart, and sigils keep instruction results
/// (`%`), globals (`@`) and literals apart — together with unique IR names
/// and injective type rendering this makes two tokens equal exactly when
/// their keys are equal.
fn canonical_key(module: &Module, token: &AliasToken) -> String {
    use crate::token::{TokenKind, ValueRef};

    let mut key = String::new();
    key.push(match token.kind() {
        TokenKind::Value(_) => 'v',
        TokenKind::Mem(_) => 'm',
        TokenKind::Arg(_) => 'a',
        TokenKind::Named(_) => 'n',
    });
    if token.is_global_var() {
        key.push('G');
    }
    key.push(':');
    match token.kind() {
        TokenKind::Value(ValueRef::Inst(at)) => {
            key.push('%');
            key.push_str(&module.inst(*at).name);
        }
        TokenKind::Value(ValueRef::Global(id)) => {
            key.push('@');
            key.push_str(&module.global(*id).name);
        }
        _ => key.push_str(&token.name(module)),
    }
    key.push(':');
    if let Some(func) = token.scope() {
        key.push_str(module.function(func).name());
    }
    key.push(':');
    if let TokenKind::Mem(ty) = token.kind() {
        key.push_str(&module.render_type(*ty));
    }
    key.push(':');
    match token.field_index() {
        Some(index) => key.push_str(&index.to_string()),
        None => key.push_str("-1"),
    }
    key
}

/// Bounded matcher for the allocate-then-construct idiom around a pointer
/// cast. Two shapes are recognized, both anchored at `cast`:
///
/// ```text
/// forward:   call @_Zn..     ; raw allocation
///            cast            ; <- here
///            call @_ZN..     ; constructor
///
/// backward:  call @_Zn..     ; raw allocation
///            cast'           ; earlier cast of the raw pointer
///            call @_ZN..     ; constructor
///            cast            ; <- here
/// ```
///
/// Returns the type to key the heap object by: the cast's destination type
/// in the forward shape, its source type in the backward shape. Debug
/// intrinsics between the steps are skipped. Any step that is not a call
/// with a resolvable direct callee (e.g. an indirect call) suppresses the
/// match.
fn recognize_heap_allocation(
    module: &Module,
    cast: InstRef,
    from: TypeId,
    to: TypeId,
) -> Option<TypeId> {
    let prev = module.prev_non_debug(cast)?;
    let sym = call_symbol(module, prev)?;
    if sym.starts_with(RAW_ALLOC_PREFIX) {
        let next = module.next_non_debug(cast)?;
        let next_sym = call_symbol(module, next)?;
        if next_sym.starts_with(QUALIFIED_PREFIX) {
            return Some(to);
        }
    } else if sym.starts_with(QUALIFIED_PREFIX) {
        let earlier_cast = module.prev_non_debug(prev)?;
        if !matches!(module.inst(earlier_cast).kind, InstKind::Bitcast { .. }) {
            return None;
        }
        let alloc = module.prev_non_debug(earlier_cast)?;
        let alloc_sym = call_symbol(module, alloc)?;
        if alloc_sym.starts_with(RAW_ALLOC_PREFIX) {
            return Some(from);
        }
    }
    None
}

/// The direct callee symbol of a call instruction; `None` for non-calls and
/// for calls through function pointers.
fn call_symbol(module: &Module, at: InstRef) -> Option<&str> {
    match &module.inst(at).kind {
        InstKind::Call { callee, .. } => callee.symbol(),
        _ => None,
    }
}
