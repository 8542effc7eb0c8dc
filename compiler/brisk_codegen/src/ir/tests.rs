#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use super::*;

fn define(module: &mut Module, name: &str, params: Vec<IrType>, ret: IrType) -> FunctionId {
    let id = module.define_function(name.to_owned(), params, ret, Linkage::Internal);
    IrBuilder::append_block(module.function_mut(id), "entry");
    id
}

#[test]
fn struct_layout_uses_natural_alignment() {
    let def = StructDef {
        name: "T".into(),
        fields: vec![IrType::I1, IrType::F64, IrType::I32],
    };
    assert_eq!(def.offsets(), vec![0, 8, 16]);
    assert_eq!(def.size_align(), (24, 8));
}

#[test]
fn empty_struct_has_zero_size() {
    let def = StructDef {
        name: "Empty".into(),
        fields: Vec::new(),
    };
    assert_eq!(def.size_align(), (0, 1));
}

#[test]
fn external_declarations_are_deduplicated() {
    let mut module = Module::new("m");
    let a = module.declare_external("brisk_random", &[], IrType::F64, FnAttrs::empty(), false);
    let b = module.declare_external("brisk_random", &[], IrType::F64, FnAttrs::empty(), false);
    assert_eq!(a, b);
    assert_eq!(module.functions().count(), 1);
    assert!(module.function(a.unwrap()).is_declaration());
}

#[test]
fn redeclaring_with_another_signature_conflicts() {
    let mut module = Module::new("m");
    module
        .declare_external("sink", &[IrType::I32], IrType::Void, FnAttrs::empty(), false)
        .unwrap();
    let err = module
        .declare_external("sink", &[IrType::F64], IrType::Void, FnAttrs::empty(), false)
        .unwrap_err();
    assert_eq!(
        err,
        SymbolConflict {
            name: "sink".into(),
            existing: "void (i32)".into(),
            requested: "void (double)".into(),
        }
    );
    assert_eq!(module.functions().count(), 1);
}

#[test]
fn declaring_over_a_definition_conflicts() {
    let mut module = Module::new("m");
    define(&mut module, "f", Vec::new(), IrType::Void);
    let err = module
        .declare_external("f", &[], IrType::Void, FnAttrs::empty(), false)
        .unwrap_err();
    assert_eq!(err.existing, "void ()");
}

#[test]
fn params_are_the_first_values() {
    let mut module = Module::new("m");
    let f = define(&mut module, "f", vec![IrType::I32, IrType::F64], IrType::Void);
    let func = module.function(f);
    assert_eq!(func.value_type(func.param(0)), IrType::I32);
    assert_eq!(func.value_type(func.param(1)), IrType::F64);
    assert_eq!(func.value(func.param(1)).op, Op::Param(1));
}

#[test]
fn allocas_are_hoisted_to_entry_block() {
    let mut module = Module::new("m");
    let f = define(&mut module, "f", Vec::new(), IrType::Void);
    let func = module.function_mut(f);
    let body = IrBuilder::append_block(func, "body");

    let mut bx = IrBuilder::new(func, BlockId::from_index(0));
    let one = bx.const_i32(1);
    bx.br(body);

    let mut bx = IrBuilder::new(func, body);
    let slot = bx.alloca(IrType::I32);
    bx.store(one, slot);
    bx.ret_void();

    let entry = func.block(BlockId::from_index(0));
    assert_eq!(entry.insts.first().copied(), Some(slot));
    assert_eq!(entry.insts.len(), 2);
}

#[test]
fn printer_renders_function_and_exports() {
    let mut module = Module::new("demo");
    let f = define(&mut module, "add", vec![IrType::I32, IrType::I32], IrType::I32);
    let func = module.function_mut(f);
    let (a, b) = (func.param(0), func.param(1));
    let mut bx = IrBuilder::new(func, BlockId::from_index(0));
    let sum = bx.binary(BinOp::Add, a, b);
    bx.ret(sum);
    module.export("add", f);

    let text = module.to_string();
    assert_eq!(
        text,
        "; module 'demo'\n\
         \n\
         define i32 @add(i32 %v0, i32 %v1) {\n\
         entry0:\n\
         \x20 %v2 = add i32 %v0, %v1\n\
         \x20 ret i32 %v2\n\
         }\n\
         \n\
         ; export add = @add\n"
    );
}

#[test]
fn printer_renders_declarations_with_attributes() {
    let mut module = Module::new("m");
    module
        .declare_external(
            "llvm.sqrt.f64",
            &[IrType::F64],
            IrType::F64,
            FnAttrs::NO_SIDE_EFFECTS | FnAttrs::NO_UNWIND,
            false,
        )
        .unwrap();
    module
        .declare_external(
            "brisk_array_new_i32",
            &[IrType::I32],
            IrType::Ptr,
            FnAttrs::NO_UNWIND | FnAttrs::NOALIAS_RETURN,
            true,
        )
        .unwrap();
    let text = module.to_string();
    assert!(text.contains("declare double @llvm.sqrt.f64(double) #[readnone nounwind]"));
    assert!(text.contains("declare ptr @brisk_array_new_i32(i32, ...) #[nounwind noalias]"));
}

#[test]
fn calls_are_listed_with_attributes() {
    let mut module = Module::new("m");
    let ext = module
        .declare_external("g", &[IrType::I32], IrType::Void, FnAttrs::empty(), false)
        .unwrap();
    let f = define(&mut module, "f", Vec::new(), IrType::Void);
    let func = module.function_mut(f);
    let mut bx = IrBuilder::new(func, BlockId::from_index(0));
    let arg = bx.const_i32(7);
    bx.call(ext, IrType::Void, &[arg], FnAttrs::NO_UNWIND);
    bx.ret_void();

    let calls: Vec<_> = module.function(f).calls().collect();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, ext);
    assert_eq!(calls[0].1.as_slice(), &[arg]);
    assert_eq!(calls[0].2, FnAttrs::NO_UNWIND);
    assert!(module.to_string().contains("call void @g(i32 %v0) #[nounwind]"));
}
