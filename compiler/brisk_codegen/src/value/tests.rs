#![allow(clippy::unwrap_used)]

use std::rc::Rc;

use brisk_ir::{Program, ProgramBuilder, Substitution};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::config::CodegenConfig;
use crate::context::{Env, UnitState};
use crate::dispatch::Registry;
use crate::ir::{Linkage, Op};

/// Run `f` inside a function taking `(int, number, boolean)`.
fn with_cx<R>(program: &Program, f: impl FnOnce(&mut CodegenCx<'_, '_>) -> R) -> R {
    let registry = Registry::standard();
    let config = CodegenConfig::default();
    let env = Env {
        program,
        registry: &registry,
        config: &config,
    };
    let mut unit = UnitState::new("test");
    let func = unit.module.define_function(
        "f".to_owned(),
        vec![IrType::I32, IrType::F64, IrType::I1],
        IrType::Void,
        Linkage::Internal,
    );
    let mut cx = unit.function_cx(env, func, Rc::new(Substitution::default()), TypeId::VOID);
    f(&mut cx)
}

fn param_of(cx: &CodegenCx<'_, '_>, ty: TypeId) -> Value {
    let index = match ty {
        TypeId::INT => 0,
        TypeId::NUMBER => 1,
        _ => 2,
    };
    Value::rvalue(cx.param(index), ty)
}

fn empty_program() -> Program {
    ProgramBuilder::new().finish()
}

#[test]
fn numeric_class_of_primitives() {
    let pool = TypePool::new();
    assert_eq!(NumericClass::of(&pool, TypeId::INT), Some(NumericClass::Integer));
    assert_eq!(NumericClass::of(&pool, TypeId::NUMBER), Some(NumericClass::Float));
    assert_eq!(NumericClass::of(&pool, TypeId::BOOLEAN), Some(NumericClass::Boolean));
    assert_eq!(NumericClass::of(&pool, TypeId::VOID), None);
    assert_eq!(NumericClass::of(&pool, pool.array(TypeId::INT)), None);
}

#[test]
fn int_widens_to_number_implicitly() {
    let program = empty_program();
    with_cx(&program, |cx| {
        let value = param_of(cx, TypeId::INT)
            .cast_implicit(TypeId::NUMBER, cx, Span::DUMMY)
            .unwrap();
        assert_eq!(value.ty(), TypeId::NUMBER);
        let operand = value.operand(cx, Span::DUMMY).unwrap();
        assert_eq!(cx.value_ir_type(operand), IrType::F64);
    });
}

#[test]
fn number_to_int_needs_explicit_cast() {
    let program = empty_program();
    with_cx(&program, |cx| {
        let err = param_of(cx, TypeId::NUMBER)
            .cast_implicit(TypeId::INT, cx, Span::new(2, 5))
            .unwrap_err();
        assert_eq!(
            err,
            CodegenError::UnsupportedOperation {
                op: "implicit conversion to `int`".into(),
                ty: "number".into(),
                span: Span::new(2, 5),
            }
        );

        let value = param_of(cx, TypeId::NUMBER)
            .cast_explicit(TypeId::INT, cx, Span::DUMMY)
            .unwrap();
        let operand = value.operand(cx, Span::DUMMY).unwrap();
        assert_eq!(cx.value_ir_type(operand), IrType::I32);
    });
}

#[test]
fn identical_types_convert_without_code() {
    let program = empty_program();
    with_cx(&program, |cx| {
        let param = cx.param(1);
        let value = Value::rvalue(param, TypeId::NUMBER)
            .cast_implicit(TypeId::NUMBER, cx, Span::DUMMY)
            .unwrap();
        assert_eq!(value.operand(cx, Span::DUMMY).unwrap(), param);
    });
}

#[test]
fn boxing_a_primitive_raises_gc_flag() {
    let program = empty_program();
    let nullable_int = program.types.nullable(TypeId::INT);
    with_cx(&program, |cx| {
        assert!(!cx.unit.gc_required());
        let boxed = param_of(cx, TypeId::INT)
            .cast_implicit(nullable_int, cx, Span::DUMMY)
            .unwrap();
        assert_eq!(boxed.ty(), nullable_int);
        assert!(cx.unit.gc_required());
        assert!(cx.unit.module.lookup("brisk_box_i32").is_some());
    });
}

#[test]
fn unboxing_is_explicit_only() {
    let program = empty_program();
    let nullable_int = program.types.nullable(TypeId::INT);
    with_cx(&program, |cx| {
        let null = cx.builder().const_null();
        let err = Value::rvalue(null, nullable_int)
            .cast_implicit(TypeId::INT, cx, Span::DUMMY)
            .unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedOperation { .. }));

        let value = Value::rvalue(null, nullable_int)
            .cast_explicit(TypeId::INT, cx, Span::DUMMY)
            .unwrap();
        let operand = value.operand(cx, Span::DUMMY).unwrap();
        assert_eq!(cx.value_ir_type(operand), IrType::I32);
    });
}

#[test]
fn void_value_has_no_operand() {
    let program = empty_program();
    with_cx(&program, |cx| {
        let span = Span::new(4, 9);
        let err = Value::unit().operand(cx, span).unwrap_err();
        assert!(matches!(err, CodegenError::Internal { .. }));
        assert_eq!(err.span(), span);
    });
}

#[test]
fn local_place_loads_and_stores_through_its_slot() {
    let program = empty_program();
    with_cx(&program, |cx| {
        let slot = cx.builder().alloca(IrType::I32);
        let place = AssignableValue {
            place: Place::Local {
                slot,
                ir_ty: IrType::I32,
            },
            ty: TypeId::INT,
        };
        let value = param_of(cx, TypeId::INT);
        let result = place.assign(cx, value, Span::DUMMY).unwrap();
        assert_eq!(result.ty(), TypeId::INT);
        let loaded = place.load(cx, Span::DUMMY).unwrap();

        let func = cx.unit.module.functions().next().unwrap().1;
        assert!(matches!(func.value(loaded).op, Op::Load { ptr } if ptr == slot));
        assert!(func
            .instructions()
            .any(|(_, data)| matches!(data.op, Op::Store { ptr, .. } if ptr == slot)));
    });
}

fn primitive() -> impl Strategy<Value = TypeId> {
    prop_oneof![Just(TypeId::INT), Just(TypeId::NUMBER), Just(TypeId::BOOLEAN)]
}

proptest! {
    #[test]
    fn implicit_conversion_only_widens(from in primitive(), to in primitive()) {
        let program = empty_program();
        let ok = with_cx(&program, |cx| {
            param_of(cx, from).cast_implicit(to, cx, Span::DUMMY).is_ok()
        });
        prop_assert_eq!(ok, from == to || (from == TypeId::INT && to == TypeId::NUMBER));
    }

    #[test]
    fn explicit_conversion_extends_implicit(from in primitive(), to in primitive()) {
        let program = empty_program();
        let (implicit, explicit) = with_cx(&program, |cx| {
            let implicit = param_of(cx, from).cast_implicit(to, cx, Span::DUMMY).is_ok();
            let explicit = param_of(cx, from).cast_explicit(to, cx, Span::DUMMY).is_ok();
            (implicit, explicit)
        });
        prop_assert!(!implicit || explicit);
        let narrowing = matches!(
            (from, to),
            (TypeId::NUMBER, TypeId::INT) | (TypeId::BOOLEAN, TypeId::INT) | (TypeId::INT, TypeId::BOOLEAN)
        );
        prop_assert_eq!(explicit, implicit || narrowing);
    }

    #[test]
    fn converted_values_carry_the_target_type(from in primitive(), to in primitive()) {
        let program = empty_program();
        with_cx(&program, |cx| {
            if let Ok(value) = param_of(cx, from).cast_explicit(to, cx, Span::DUMMY) {
                assert_eq!(value.ty(), to);
            }
        });
    }
}
