//! Arrays.
//!
//! An array is a pointer to a runtime-managed header
//! `{ i32 len, i32 cap, ptr data }`. The element's static type selects the
//! storage of `data`: primitives are stored inline, nullable and reference
//! elements are stored as pointers. Each storage has its own family of
//! runtime entry points (`brisk_array_*_<i32|f64|i1|ptr>`).

use brisk_ir::{Name, NodeId, NodeKind, SignatureId, Span, Ty, TypeId, TypePool};

use super::{ObjectCapabilities, ObjectReference};
use crate::context::CodegenCx;
use crate::config::AccessMode;
use crate::dispatch::literals;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{Const, IrType, ValueId};
use crate::runtime::RuntimeFn;
use crate::value::{AssignableValue, Place, Value};

/// Header field holding the length.
pub const LENGTH_FIELD: u32 = 0;
/// Header field holding the data pointer.
pub const DATA_FIELD: u32 = 2;

/// How elements are stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementStorage {
    /// Unboxed `i32`, `f64`, or `i1`.
    Inline(IrType),
    /// Pointers to boxed or heap values.
    Boxed,
}

impl ElementStorage {
    pub fn ir_type(self) -> IrType {
        match self {
            ElementStorage::Inline(ty) => ty,
            ElementStorage::Boxed => IrType::Ptr,
        }
    }

    /// Runtime symbol suffix.
    pub fn suffix(self) -> &'static str {
        match self.ir_type() {
            IrType::I1 => "i1",
            IrType::I32 => "i32",
            IrType::F64 => "f64",
            IrType::I64 => "i64",
            IrType::Ptr | IrType::Void => "ptr",
        }
    }
}

/// Element type and storage of an array type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArrayLayout {
    pub element: TypeId,
    pub storage: ElementStorage,
}

impl ArrayLayout {
    /// Layout of the array type `array_ty`.
    pub fn of(pool: &TypePool, array_ty: TypeId, span: Span) -> CodegenResult<Self> {
        let Ty::Array(element) = pool.get(array_ty) else {
            return Err(CodegenError::internal("array layout of a non-array type", span));
        };
        let storage = match pool.get(element) {
            Ty::Int => ElementStorage::Inline(IrType::I32),
            Ty::Number => ElementStorage::Inline(IrType::F64),
            Ty::Boolean => ElementStorage::Inline(IrType::I1),
            Ty::Nullable(_) | Ty::Array(_) | Ty::Class { .. } => ElementStorage::Boxed,
            Ty::Void | Ty::BuiltIn(_) => {
                return Err(CodegenError::unsupported_operation(
                    "array of",
                    match pool.get(element) {
                        Ty::BuiltIn(object) => object.name(),
                        _ => "void",
                    },
                    span,
                ))
            }
            Ty::Param(_) => {
                return Err(CodegenError::internal(
                    "array of an unsubstituted type parameter",
                    span,
                ))
            }
        };
        Ok(ArrayLayout { element, storage })
    }

    pub fn element_ir(self) -> IrType {
        self.storage.ir_type()
    }
}

/// Array from element operands: `brisk_array_new_<sfx>(len, e0, e1, ...)`.
pub fn construct_from_values(
    cx: &mut CodegenCx<'_, '_>,
    layout: ArrayLayout,
    elements: &[ValueId],
    span: Span,
) -> CodegenResult<ValueId> {
    let len = cx.builder().const_i32(i32::try_from(elements.len()).unwrap_or(i32::MAX));
    let mut args = Vec::with_capacity(elements.len() + 1);
    args.push(len);
    args.extend_from_slice(elements);
    cx.call_runtime(RuntimeFn::ArrayNew(layout.storage), &args, span)
}

/// Array copied from `len` elements at `buffer`.
pub fn construct_from_buffer(
    cx: &mut CodegenCx<'_, '_>,
    layout: ArrayLayout,
    buffer: ValueId,
    len: ValueId,
    span: Span,
) -> CodegenResult<ValueId> {
    cx.call_runtime(RuntimeFn::ArrayFromBuffer(layout.storage), &[buffer, len], span)
}

/// `[e0, e1, ...]` of static type `array_ty`.
///
/// Long literals of primitive constants become global data copied through
/// the raw-buffer entry point; everything else is built from operands.
pub fn generate_literal(
    cx: &mut CodegenCx<'_, '_>,
    array_ty: TypeId,
    elements: &[NodeId],
    span: Span,
) -> CodegenResult<Value> {
    let layout = ArrayLayout::of(cx.pool(), array_ty, span)?;

    let address = match constant_elements(cx, layout, elements)? {
        Some(data) if data.len() > cx.config().literal_buffer_threshold => {
            let len = i32::try_from(data.len()).unwrap_or(i32::MAX);
            let global = cx.add_literal_global(layout.element_ir(), data);
            let mut bx = cx.builder();
            let buffer = bx.global_addr(global);
            let len = bx.const_i32(len);
            construct_from_buffer(cx, layout, buffer, len, span)?
        }
        _ => {
            let operands = elements
                .iter()
                .map(|&element| cx.generate_operand(element, layout.element))
                .collect::<CodegenResult<Vec<_>>>()?;
            construct_from_values(cx, layout, &operands, span)?
        }
    };
    Ok(Value::Object(ObjectReference {
        kind: super::ObjectKind::Array(layout),
        address: Some(address),
        ty: array_ty,
    }))
}

/// Constant data for `elements` if every one is a primitive literal that
/// converts to the element type without code.
fn constant_elements(
    cx: &CodegenCx<'_, '_>,
    layout: ArrayLayout,
    elements: &[NodeId],
) -> CodegenResult<Option<Vec<Const>>> {
    if !matches!(layout.storage, ElementStorage::Inline(_)) {
        return Ok(None);
    }
    let mut data = Vec::with_capacity(elements.len());
    for &element in elements {
        let node = cx.node(element);
        let constant = match &node.kind {
            NodeKind::NumericLiteral(text) => {
                let ty = cx.node_type(node);
                let value = literals::numeric_const(cx, *text, ty, node.span)?;
                match (value, layout.element_ir()) {
                    (Const::Int { value, .. }, IrType::F64) if ty == TypeId::INT => {
                        Const::f64(value as f64)
                    }
                    (value, ir) if value.ty() == ir => value,
                    _ => return Ok(None),
                }
            }
            NodeKind::BooleanLiteral(value) if layout.element_ir() == IrType::I1 => Const::bool(*value),
            _ => return Ok(None),
        };
        data.push(constant);
    }
    Ok(Some(data))
}

/// `array.length`
pub fn length(cx: &mut CodegenCx<'_, '_>, array: ValueId) -> ValueId {
    let header = cx.array_header();
    let mut bx = cx.builder();
    let ptr = bx.field_ptr(array, header, LENGTH_FIELD);
    bx.load(IrType::I32, ptr)
}

/// Inline address of element `index`; no bounds check.
fn element_address(cx: &mut CodegenCx<'_, '_>, layout: ArrayLayout, array: ValueId, index: ValueId) -> ValueId {
    let header = cx.array_header();
    let mut bx = cx.builder();
    let data_ptr = bx.field_ptr(array, header, DATA_FIELD);
    let data = bx.load(IrType::Ptr, data_ptr);
    bx.element_ptr(data, layout.element_ir(), index)
}

/// Read element `index`.
pub fn load_element(
    cx: &mut CodegenCx<'_, '_>,
    layout: ArrayLayout,
    array: ValueId,
    index: ValueId,
    span: Span,
) -> CodegenResult<ValueId> {
    match cx.config().access {
        AccessMode::Checked => cx.call_runtime(RuntimeFn::ArrayGet(layout.storage), &[array, index], span),
        AccessMode::Unchecked => {
            let ptr = element_address(cx, layout, array, index);
            Ok(cx.builder().load(layout.element_ir(), ptr))
        }
    }
}

/// Write element `index`.
pub fn store_element(
    cx: &mut CodegenCx<'_, '_>,
    layout: ArrayLayout,
    array: ValueId,
    index: ValueId,
    value: ValueId,
    span: Span,
) -> CodegenResult<()> {
    match cx.config().access {
        AccessMode::Checked => {
            cx.call_runtime(RuntimeFn::ArraySet(layout.storage), &[array, index, value], span)?;
        }
        AccessMode::Unchecked => {
            let ptr = element_address(cx, layout, array, index);
            cx.builder().store(value, ptr);
        }
    }
    Ok(())
}

fn unsupported_member(cx: &CodegenCx<'_, '_>, member: Name, span: Span) -> CodegenError {
    CodegenError::UnsupportedBuiltIn {
        object: "Array".to_owned(),
        member: cx.name(member).to_owned(),
        span,
    }
}

impl ObjectCapabilities for ArrayLayout {
    fn type_name(&self, cx: &CodegenCx<'_, '_>) -> String {
        let array = cx.pool().array(self.element);
        cx.display_type(array)
    }

    fn get_field(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        member: Name,
        span: Span,
    ) -> CodegenResult<Value> {
        match cx.name(member) {
            "length" => {
                let array = this.require_address(cx, span)?;
                let len = length(cx, array);
                Ok(Value::rvalue(len, TypeId::INT))
            }
            _ => Err(unsupported_member(cx, member, span)),
        }
    }

    fn call_method(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        member: Name,
        args: &[NodeId],
        _signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        match cx.name(member) {
            "push" => {
                let array = this.require_address(cx, span)?;
                let Some(&item) = args.first() else {
                    return Err(CodegenError::MissingArgument {
                        function: "Array.push".to_owned(),
                        param: "item".to_owned(),
                        span,
                    });
                };
                let value = cx.generate_operand(item, self.element)?;
                let len = cx.call_runtime(RuntimeFn::ArrayPush(self.storage), &[array, value], span)?;
                Ok(Value::rvalue(len, TypeId::INT))
            }
            "pop" => {
                let array = this.require_address(cx, span)?;
                let value = cx.call_runtime(RuntimeFn::ArrayPop(self.storage), &[array], span)?;
                cx.value_of(value, self.element, span)
            }
            _ => Err(unsupported_member(cx, member, span)),
        }
    }

    /// `new Array<T>()` or `new Array<T>(length)`.
    fn construct(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        args: &[NodeId],
        _signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        let len = match args {
            [] => cx.builder().const_i32(0),
            [len] => cx.generate_operand(*len, TypeId::INT)?,
            _ => {
                let ty = self.type_name(cx);
                return Err(CodegenError::unsupported_operation(
                    "new Array with element arguments",
                    ty,
                    span,
                ));
            }
        };
        let address = cx.call_runtime(RuntimeFn::ArrayWithLength(self.storage), &[len], span)?;
        let ty = cx.pool().array(self.element);
        Ok(Value::Object(ObjectReference {
            kind: super::ObjectKind::Array(*self),
            address: Some(address),
            ty,
        }))
    }

    fn index(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        index: NodeId,
        span: Span,
    ) -> CodegenResult<Value> {
        let array = this.require_address(cx, span)?;
        let index = cx.generate_operand(index, TypeId::INT)?;
        Ok(Value::Assignable(AssignableValue {
            place: Place::Element {
                array,
                index,
                layout: *self,
            },
            ty: self.element,
        }))
    }
}

#[cfg(test)]
mod tests {
    use brisk_ir::{ClassId, Name};

    use super::*;

    #[test]
    fn primitive_elements_are_inline() {
        let pool = TypePool::new();
        let ints = pool.array(TypeId::INT);
        let layout = ArrayLayout::of(&pool, ints, Span::DUMMY).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(layout.storage, ElementStorage::Inline(IrType::I32));
        assert_eq!(layout.element, TypeId::INT);
    }

    #[test]
    fn nullable_and_reference_elements_are_boxed() {
        let pool = TypePool::new();
        let opt = pool.nullable(TypeId::NUMBER);
        let point = pool.class(ClassId::from_raw(0), Name::from_raw(1));
        let nested = pool.array(TypeId::BOOLEAN);
        for element in [opt, point, nested] {
            let layout = ArrayLayout::of(&pool, pool.array(element), Span::DUMMY)
                .unwrap_or_else(|e| panic!("{e}"));
            assert_eq!(layout.storage, ElementStorage::Boxed);
            assert_eq!(layout.element_ir(), IrType::Ptr);
        }
    }

    #[test]
    fn storage_suffixes() {
        assert_eq!(ElementStorage::Inline(IrType::F64).suffix(), "f64");
        assert_eq!(ElementStorage::Inline(IrType::I1).suffix(), "i1");
        assert_eq!(ElementStorage::Boxed.suffix(), "ptr");
    }

    #[test]
    fn non_array_type_is_internal_error() {
        let pool = TypePool::new();
        assert!(matches!(
            ArrayLayout::of(&pool, TypeId::INT, Span::DUMMY),
            Err(CodegenError::Internal { .. })
        ));
    }
}
