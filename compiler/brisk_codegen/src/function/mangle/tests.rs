use brisk_ir::{ClassId, Name, ProgramBuilder, TypeId};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

fn program_with_point() -> (brisk_ir::Program, TypeId) {
    let mut b = ProgramBuilder::new();
    let (_, point) = b.class("Point", &[("x", TypeId::NUMBER)]);
    (b.finish(), point)
}

#[test]
fn free_function_with_primitive_params() {
    let (program, _) = program_with_point();
    let m = Mangler::new(&program);
    assert_eq!(
        m.mangle_specialization(None, "max3", &[TypeId::INT; 3], &[]),
        "_brisk_4max3$int$int$int"
    );
}

#[test]
fn method_carries_owner() {
    let (program, point) = program_with_point();
    let m = Mangler::new(&program);
    assert_eq!(m.mangle_specialization(Some("Point"), "norm", &[], &[]), "_brisk_5Point.4norm");
    assert_eq!(
        m.mangle_specialization(Some("Point"), "scale", &[point, TypeId::NUMBER], &[]),
        "_brisk_5Point.5scale$C5Point$number"
    );
}

#[test]
fn compound_types_nest() {
    let (program, _) = program_with_point();
    let m = Mangler::new(&program);
    let ints = program.types.array(TypeId::INT);
    let opt_ints = program.types.nullable(ints);
    let mut out = String::new();
    m.encode_type(&mut out, opt_ints);
    assert_eq!(out, "NAint");
}

#[test]
fn type_arguments_distinguish_generic_instances() {
    let (program, _) = program_with_point();
    let m = Mangler::new(&program);
    let a = m.mangle_specialization(None, "identity", &[TypeId::INT], &[TypeId::INT]);
    let b = m.mangle_specialization(None, "identity", &[TypeId::NUMBER], &[TypeId::NUMBER]);
    assert_eq!(a, "_brisk_8identity$int$$int");
    assert_ne!(a, b);
}

#[test]
fn length_prefix_separates_owner_and_name() {
    let (program, _) = program_with_point();
    let m = Mangler::new(&program);
    assert_ne!(
        m.mangle_specialization(Some("a"), "bc", &[], &[]),
        m.mangle_specialization(Some("ab"), "c", &[], &[])
    );
}

#[test]
fn class_and_param_names_are_read_from_interner() {
    let (program, _) = program_with_point();
    let m = Mangler::new(&program);
    let other = program.types.class(ClassId::from_raw(7), Name::EMPTY);
    let mut out = String::new();
    m.encode_type(&mut out, other);
    assert_eq!(out, "C0");
}

fn primitive() -> impl Strategy<Value = TypeId> {
    prop_oneof![
        Just(TypeId::INT),
        Just(TypeId::NUMBER),
        Just(TypeId::BOOLEAN),
    ]
}

proptest! {
    #[test]
    fn mangling_is_deterministic(params in prop::collection::vec(primitive(), 0..6)) {
        let (program, _) = program_with_point();
        let m = Mangler::new(&program);
        let first = m.mangle_specialization(None, "f", &params, &[]);
        let second = m.mangle_specialization(None, "f", &params, &[]);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn distinct_param_types_give_distinct_names(
        a in prop::collection::vec(primitive(), 0..5),
        b in prop::collection::vec(primitive(), 0..5),
    ) {
        let (program, _) = program_with_point();
        let m = Mangler::new(&program);
        let left = m.mangle_specialization(None, "f", &a, &[]);
        let right = m.mangle_specialization(None, "f", &b, &[]);
        prop_assert_eq!(a == b, left == right);
    }
}
