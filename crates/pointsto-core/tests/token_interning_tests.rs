//! Interning laws: idempotent identity, no duplicates, scope separation.

use pointsto_core::{AliasToken, TokenBank};
use pointsto_ir::{all_insts, ArgRef, FunctionId, InstKind, InstRef, Module, Operand};

fn fixture() -> (Module, FunctionId, FunctionId, InstRef) {
    let mut module = Module::new("test");
    let i32_ty = module.int_type(32);
    let f = module.add_function("f", &[("n", i32_ty)]);
    let g = module.add_function("g", &[("n", i32_ty)]);
    let p = module.push_inst(f, "p", InstKind::Alloca { allocated: i32_ty });
    (module, f, g, p)
}

#[test]
fn every_accessor_is_idempotent() {
    let (mut module, f, _, p) = fixture();
    let i32_ty = module.int_type(32);
    let global = module.add_global("counter", i32_ty);
    let foo = module.struct_type("class.Foo");
    let arg = ArgRef { func: f, index: 0 };

    let mut bank = TokenBank::new();
    assert_eq!(bank.intern_inst(&module, p), bank.intern_inst(&module, p));
    assert_eq!(bank.intern_arg(&module, arg), bank.intern_arg(&module, arg));
    assert_eq!(
        bank.intern_type(&module, foo),
        bank.intern_type(&module, foo)
    );
    assert_eq!(
        bank.intern_named(&module, "x-orig", Some(f)),
        bank.intern_named(&module, "x-orig", Some(f))
    );
    assert_eq!(
        bank.intern_operand(&module, &Operand::Global(global)),
        bank.intern_operand(&module, &Operand::Global(global))
    );
    assert_eq!(bank.len(), 5);
}

#[test]
fn prebuilt_candidates_meet_their_accessor_twins() {
    let (module, f, _, p) = fixture();

    let mut bank = TokenBank::new();
    let via_accessor = bank.intern_inst(&module, p);
    let via_candidate = bank.intern(&module, AliasToken::of_inst(p));
    assert_eq!(via_accessor, via_candidate);

    let named = AliasToken::named("x-orig", Some(f));
    assert!(!bank.contains(&module, &named));
    let id = bank.intern(&module, named.clone());
    assert!(bank.contains(&module, &named));
    assert_eq!(bank[id], named);
}

#[test]
fn scopes_separate_identities() {
    let (module, f, g, _) = fixture();

    let mut bank = TokenBank::new();
    let in_f = bank.intern_named(&module, "tmp", Some(f));
    let in_g = bank.intern_named(&module, "tmp", Some(g));
    let global = bank.intern_named(&module, "tmp", None);
    assert_ne!(in_f, in_g);
    assert_ne!(in_f, global);
    assert_ne!(in_g, global);

    // Same parameter position in different functions stays distinct even
    // though both parameters are named "n".
    let arg_f = bank.intern_arg(&module, ArgRef { func: f, index: 0 });
    let arg_g = bank.intern_arg(&module, ArgRef { func: g, index: 0 });
    assert_ne!(arg_f, arg_g);
}

#[test]
fn interned_type_ids_follow_type_interning() {
    let (mut module, _, _, _) = fixture();
    let foo_a = module.struct_type("class.Foo");
    let foo_b = module.struct_type("class.Foo");
    let foop = module.ptr_type(foo_a);

    let mut bank = TokenBank::new();
    assert_eq!(
        bank.intern_type(&module, foo_a),
        bank.intern_type(&module, foo_b)
    );
    assert_ne!(
        bank.intern_type(&module, foo_a),
        bank.intern_type(&module, foop)
    );
}

#[test]
fn store_never_holds_duplicates() {
    let (mut module, f, _, p) = fixture();
    let i32_ty = module.int_type(32);
    let global = module.add_global("shared", i32_ty);
    let q = module.push_inst(f, "q", InstKind::Alloca { allocated: i32_ty });
    module.push_inst(
        f,
        "",
        InstKind::Store {
            value: Operand::Global(global),
            ptr: Operand::Inst(p),
        },
    );
    let loaded = module.push_inst(f, "x", InstKind::Load { ptr: Operand::Inst(q) });
    module.push_inst(
        f,
        "",
        InstKind::Ret {
            value: Some(Operand::Inst(loaded)),
        },
    );

    let mut bank = TokenBank::new();
    // Walk everything twice: the second pass must not add anything.
    for at in all_insts(&module) {
        bank.extract(&module, at);
    }
    let after_first = bank.len();
    for at in all_insts(&module) {
        bank.extract(&module, at);
    }
    assert_eq!(bank.len(), after_first);

    let tokens: Vec<_> = bank.iter().collect();
    for (i, (_, a)) in tokens.iter().enumerate() {
        for (_, b) in &tokens[i + 1..] {
            assert_ne!(a, b, "two distinct entries compare equal");
        }
    }
}

#[test]
fn ids_resolve_in_insertion_order() {
    let (module, f, _, p) = fixture();

    let mut bank = TokenBank::new();
    let first = bank.intern_inst(&module, p);
    let second = bank.intern_named(&module, "p-orig", Some(f));
    assert!(first < second);

    let ids: Vec<_> = bank.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![first, second]);

    assert!(bank.get(first).is_some());
    assert!(bank.get(pointsto_core::TokenId(99)).is_none());
}
