use pretty_assertions::assert_eq;

use super::*;

#[test]
fn primitives_have_fixed_ids() {
    let pool = TypePool::new();
    assert_eq!(pool.get(TypeId::INT), Ty::Int);
    assert_eq!(pool.get(TypeId::NUMBER), Ty::Number);
    assert_eq!(pool.get(TypeId::BOOLEAN), Ty::Boolean);
    assert_eq!(pool.get(TypeId::VOID), Ty::Void);
    assert_eq!(pool.intern(Ty::Int), TypeId::INT);
}

#[test]
fn compound_types_are_hash_consed() {
    let pool = TypePool::new();
    let a = pool.array(TypeId::INT);
    let b = pool.array(TypeId::INT);
    assert_eq!(a, b);
    assert_ne!(a, pool.array(TypeId::NUMBER));
}

#[test]
fn nested_nullable_collapses() {
    let pool = TypePool::new();
    let once = pool.nullable(TypeId::INT);
    assert_eq!(pool.nullable(once), once);
}

#[test]
fn substitute_replaces_bound_params() {
    let interner = StringInterner::new();
    let pool = TypePool::new();
    let t = interner.intern("T");
    let t_array = pool.array(pool.param(t));

    let mut subst = Substitution::default();
    subst.insert(t, TypeId::NUMBER);

    assert_eq!(pool.substitute(t_array, &subst), pool.array(TypeId::NUMBER));
    assert!(pool.is_generic(t_array));
    assert!(!pool.is_generic(pool.substitute(t_array, &subst)));
}

#[test]
fn substitute_leaves_unbound_params() {
    let interner = StringInterner::new();
    let pool = TypePool::new();
    let u = pool.param(interner.intern("U"));
    assert_eq!(pool.substitute(u, &Substitution::default()), u);
}

#[test]
fn display_uses_source_syntax() {
    let interner = StringInterner::new();
    let pool = TypePool::new();
    let point = pool.class(ClassId::from_raw(0), interner.intern("Point"));
    let maybe_int = pool.nullable(TypeId::INT);

    assert_eq!(pool.display(pool.array(TypeId::INT), &interner), "int[]");
    assert_eq!(pool.display(maybe_int, &interner), "int | undefined");
    assert_eq!(pool.display(pool.array(maybe_int), &interner), "(int | undefined)[]");
    assert_eq!(pool.display(point, &interner), "Point");
    assert_eq!(
        pool.display(pool.builtin(BuiltinObject::Math), &interner),
        "Math"
    );
}
