//! Types in the IR, interned in a per-module table.
//!
//! Struct types are nominal (identified by name, like LLVM named structs);
//! everything else is structural. Interning keeps the textual rendering
//! injective over ids: two distinct `TypeId`s never render to the same
//! string, which the alias layer's canonical hashing relies on.

use rustc_hash::FxHashMap;

/// Unique identifier for an interned type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub u32);

/// A type in the IR.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    /// Integer of the given bit width (`i1`, `i8`, `i32`, ...).
    Int(u32),
    /// 64-bit floating point.
    Float,
    /// Pointer to another type.
    Ptr(TypeId),
    /// Fixed-size array.
    Array { elem: TypeId, len: u64 },
    /// A named (nominal) struct such as `%class.Foo`.
    Struct(String),
}

/// Interning table for types: requesting the same type twice returns the
/// same `TypeId`.
#[derive(Debug, Default)]
pub struct TypeTable {
    types: Vec<Type>,
    dedup: FxHashMap<Type, TypeId>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `ty`, creating an entry on first request.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.dedup.get(&ty) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.dedup.insert(ty.clone(), id);
        self.types.push(ty);
        id
    }

    /// Looks up an interned type.
    ///
    /// Panics if `id` was not minted by this table.
    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0 as usize]
    }

    /// Renders a type as LLVM-flavored text (`i32`, `i8*`, `[4 x i32]`,
    /// `%class.Foo`).
    pub fn render(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Void => "void".to_string(),
            Type::Int(bits) => format!("i{bits}"),
            Type::Float => "double".to_string(),
            Type::Ptr(inner) => format!("{}*", self.render(*inner)),
            Type::Array { elem, len } => format!("[{} x {}]", len, self.render(*elem)),
            Type::Struct(name) => format!("%{name}"),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
