//! Entry points of the runtime support library.
//!
//! Generated code calls these for heap allocation, boxing, and array
//! storage. They are declared on first use; the library itself is linked
//! later. Entry points that may allocate raise the unit's GC-required flag
//! when called (see [`CodegenCx::call_runtime`](crate::context::CodegenCx::call_runtime)).

use crate::ir::{FnAttrs, IrType};
use crate::object::ElementStorage;

/// A runtime library function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeFn {
    /// `ptr brisk_object_alloc(i64 size, i64 align)`
    ObjectAlloc,
    /// `ptr brisk_box_<ty>(<ty>)`: heap cell for a nullable primitive.
    Box(IrType),
    /// `ptr brisk_array_new_<sfx>(i32 len, ...)`: array from element operands.
    ArrayNew(ElementStorage),
    /// `ptr brisk_array_from_buffer_<sfx>(ptr data, i32 len)`: copies `len` elements.
    ArrayFromBuffer(ElementStorage),
    /// `ptr brisk_array_with_length_<sfx>(i32 len)`: zero-filled.
    ArrayWithLength(ElementStorage),
    /// `i32 brisk_array_push_<sfx>(ptr, <elem>)`: returns the new length.
    ArrayPush(ElementStorage),
    /// `<elem> brisk_array_pop_<sfx>(ptr)`
    ArrayPop(ElementStorage),
    /// `<elem> brisk_array_get_<sfx>(ptr, i32)`: bounds-checked.
    ArrayGet(ElementStorage),
    /// `void brisk_array_set_<sfx>(ptr, i32, <elem>)`: bounds-checked.
    ArraySet(ElementStorage),
    /// `double brisk_math_random()`
    MathRandom,
}

impl RuntimeFn {
    /// Linker symbol.
    pub fn symbol(self) -> String {
        match self {
            RuntimeFn::ObjectAlloc => "brisk_object_alloc".to_owned(),
            RuntimeFn::Box(ty) => format!("brisk_box_{}", scalar_suffix(ty)),
            RuntimeFn::ArrayNew(s) => format!("brisk_array_new_{}", s.suffix()),
            RuntimeFn::ArrayFromBuffer(s) => format!("brisk_array_from_buffer_{}", s.suffix()),
            RuntimeFn::ArrayWithLength(s) => format!("brisk_array_with_length_{}", s.suffix()),
            RuntimeFn::ArrayPush(s) => format!("brisk_array_push_{}", s.suffix()),
            RuntimeFn::ArrayPop(s) => format!("brisk_array_pop_{}", s.suffix()),
            RuntimeFn::ArrayGet(s) => format!("brisk_array_get_{}", s.suffix()),
            RuntimeFn::ArraySet(s) => format!("brisk_array_set_{}", s.suffix()),
            RuntimeFn::MathRandom => "brisk_math_random".to_owned(),
        }
    }

    /// Parameter types, return type, and whether extra arguments follow.
    pub fn signature(self) -> (Vec<IrType>, IrType, bool) {
        use IrType::{Ptr, Void, F64, I32, I64};
        match self {
            RuntimeFn::ObjectAlloc => (vec![I64, I64], Ptr, false),
            RuntimeFn::Box(ty) => (vec![ty], Ptr, false),
            RuntimeFn::ArrayNew(_) => (vec![I32], Ptr, true),
            RuntimeFn::ArrayFromBuffer(_) => (vec![Ptr, I32], Ptr, false),
            RuntimeFn::ArrayWithLength(_) => (vec![I32], Ptr, false),
            RuntimeFn::ArrayPush(s) => (vec![Ptr, s.ir_type()], I32, false),
            RuntimeFn::ArrayPop(s) => (vec![Ptr], s.ir_type(), false),
            RuntimeFn::ArrayGet(s) => (vec![Ptr, I32], s.ir_type(), false),
            RuntimeFn::ArraySet(s) => (vec![Ptr, I32, s.ir_type()], Void, false),
            RuntimeFn::MathRandom => (Vec::new(), F64, false),
        }
    }

    /// Declaration attributes.
    pub fn attrs(self) -> FnAttrs {
        match self {
            RuntimeFn::ObjectAlloc
            | RuntimeFn::Box(_)
            | RuntimeFn::ArrayNew(_)
            | RuntimeFn::ArrayFromBuffer(_)
            | RuntimeFn::ArrayWithLength(_) => FnAttrs::NO_UNWIND | FnAttrs::NOALIAS_RETURN,
            RuntimeFn::MathRandom => FnAttrs::NO_UNWIND,
            // Growth and bounds checks can trap.
            RuntimeFn::ArrayPush(_)
            | RuntimeFn::ArrayPop(_)
            | RuntimeFn::ArrayGet(_)
            | RuntimeFn::ArraySet(_) => FnAttrs::empty(),
        }
    }

    /// True if a call may allocate collector-managed memory.
    pub fn allocates(self) -> bool {
        matches!(
            self,
            RuntimeFn::ObjectAlloc
                | RuntimeFn::Box(_)
                | RuntimeFn::ArrayNew(_)
                | RuntimeFn::ArrayFromBuffer(_)
                | RuntimeFn::ArrayWithLength(_)
                | RuntimeFn::ArrayPush(_)
        )
    }
}

fn scalar_suffix(ty: IrType) -> &'static str {
    match ty {
        IrType::I1 => "i1",
        IrType::I32 => "i32",
        IrType::I64 => "i64",
        IrType::F64 => "f64",
        IrType::Ptr => "ptr",
        IrType::Void => "void",
    }
}
