//! Typed values.
//!
//! Every expression generator yields a [`Value`]: a low-level operand
//! paired with its static type. Conversions between static types go
//! through [`Value::cast_implicit`] and [`Value::cast_explicit`], which
//! encode the numeric rules:
//!
//! | from → to | implicit | explicit |
//! |---|---|---|
//! | `int` → `number` | `sitofp` | `sitofp` |
//! | `number` → `int` | error | `fptosi` |
//! | `boolean` ↔ `int` | error | `zext` / `icmp ne 0` |
//! | `T` → `T \| undefined` | box / retag | box / retag |
//! | `T \| undefined` → `T` | error | unbox |
//!
//! Identical types convert as a no-op. Nothing else converts.

use brisk_ir::{Span, Ty, TypeId, TypePool};

use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{CastOp, IntPredicate, IrType, StructId, ValueId};
use crate::object::{self, ArrayLayout, ObjectReference};
use crate::runtime::RuntimeFn;

/// Operator family of a primitive type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NumericClass {
    Integer,
    Float,
    Boolean,
}

impl NumericClass {
    /// Classification of `ty`; `None` for non-primitive types.
    pub fn of(pool: &TypePool, ty: TypeId) -> Option<Self> {
        match pool.get(ty) {
            Ty::Int => Some(NumericClass::Integer),
            Ty::Number => Some(NumericClass::Float),
            Ty::Boolean => Some(NumericClass::Boolean),
            _ => None,
        }
    }
}

/// Storage location of an assignable value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Place {
    /// Stack slot of a local or parameter.
    Local { slot: ValueId, ir_ty: IrType },
    /// Field of a class instance.
    Field {
        object: ValueId,
        struct_ty: StructId,
        index: u32,
        ir_ty: IrType,
    },
    /// Element of an array.
    Element {
        array: ValueId,
        index: ValueId,
        layout: ArrayLayout,
    },
}

/// An lvalue: a place plus the static type stored there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignableValue {
    pub place: Place,
    pub ty: TypeId,
}

impl AssignableValue {
    /// Read the current contents.
    pub fn load(&self, cx: &mut CodegenCx<'_, '_>, span: Span) -> CodegenResult<ValueId> {
        Ok(match &self.place {
            Place::Local { slot, ir_ty } => cx.builder().load(*ir_ty, *slot),
            Place::Field {
                object,
                struct_ty,
                index,
                ir_ty,
            } => {
                let mut bx = cx.builder();
                let ptr = bx.field_ptr(*object, *struct_ty, *index);
                bx.load(*ir_ty, ptr)
            }
            Place::Element {
                array,
                index,
                layout,
            } => object::array::load_element(cx, *layout, *array, *index, span)?,
        })
    }

    /// Store an operand already of this place's type.
    pub fn store(&self, cx: &mut CodegenCx<'_, '_>, operand: ValueId, span: Span) -> CodegenResult<()> {
        match &self.place {
            Place::Local { slot, .. } => cx.builder().store(operand, *slot),
            Place::Field {
                object,
                struct_ty,
                index,
                ..
            } => {
                let mut bx = cx.builder();
                let ptr = bx.field_ptr(*object, *struct_ty, *index);
                bx.store(operand, ptr);
            }
            Place::Element {
                array,
                index,
                layout,
            } => object::array::store_element(cx, *layout, *array, *index, operand, span)?,
        }
        Ok(())
    }

    /// Assign `value`, converting it implicitly to this place's type.
    ///
    /// Yields the stored value.
    pub fn assign(&self, cx: &mut CodegenCx<'_, '_>, value: Value, span: Span) -> CodegenResult<Value> {
        let operand = value.cast_implicit(self.ty, cx, span)?.operand(cx, span)?;
        self.store(cx, operand, span)?;
        cx.value_of(operand, self.ty, span)
    }
}

/// A generated value and its static type.
#[derive(Clone, Debug)]
pub enum Value {
    /// Computed operand.
    Rvalue { operand: ValueId, ty: TypeId },
    /// Assignment target; read lazily.
    Assignable(AssignableValue),
    /// Handle to a heap entity or built-in singleton.
    Object(ObjectReference),
}

impl Value {
    /// The value of `void` expressions and statements.
    pub fn unit() -> Self {
        Value::Rvalue {
            operand: ValueId::NONE,
            ty: TypeId::VOID,
        }
    }

    pub fn rvalue(operand: ValueId, ty: TypeId) -> Self {
        Value::Rvalue { operand, ty }
    }

    /// Static type.
    pub fn ty(&self) -> TypeId {
        match self {
            Value::Rvalue { ty, .. } => *ty,
            Value::Assignable(place) => place.ty,
            Value::Object(object) => object.ty,
        }
    }

    pub fn is_void(&self) -> bool {
        self.ty() == TypeId::VOID
    }

    /// True if the static type supports object operations (member access,
    /// method calls, indexing).
    pub fn is_object(&self, pool: &TypePool) -> bool {
        matches!(
            pool.get(self.ty()),
            Ty::Array(_) | Ty::Class { .. } | Ty::BuiltIn(_)
        )
    }

    /// The low-level operand, loading assignable values.
    ///
    /// `span` locates the expression that needs the operand.
    pub fn operand(&self, cx: &mut CodegenCx<'_, '_>, span: Span) -> CodegenResult<ValueId> {
        match self {
            Value::Rvalue { operand, ty } => {
                if operand.is_none() {
                    let printed = cx.display_type(*ty);
                    return Err(CodegenError::internal(
                        format!("a `{printed}` expression has no value"),
                        span,
                    ));
                }
                Ok(*operand)
            }
            Value::Assignable(place) => place.load(cx, span),
            Value::Object(object) => Ok(object.operand(cx)),
        }
    }

    /// View as an object reference.
    ///
    /// Fails with `UnsupportedOperation` if the static type has no object
    /// operations.
    pub fn into_object(self, cx: &mut CodegenCx<'_, '_>, span: Span) -> CodegenResult<ObjectReference> {
        if let Value::Object(object) = self {
            return Ok(object);
        }
        let ty = self.ty();
        if !self.is_object(cx.pool()) {
            return Err(CodegenError::unsupported_operation(
                "member access",
                cx.display_type(ty),
                span,
            ));
        }
        let address = self.operand(cx, span)?;
        ObjectReference::from_address(cx, address, ty, span)
    }

    /// Convert to `target` without an explicit narrowing construct.
    pub fn cast_implicit(self, target: TypeId, cx: &mut CodegenCx<'_, '_>, span: Span) -> CodegenResult<Value> {
        self.convert(target, false, cx, span)
    }

    /// Convert to `target` as written by an explicit cast.
    pub fn cast_explicit(self, target: TypeId, cx: &mut CodegenCx<'_, '_>, span: Span) -> CodegenResult<Value> {
        self.convert(target, true, cx, span)
    }

    fn convert(
        self,
        target: TypeId,
        explicit: bool,
        cx: &mut CodegenCx<'_, '_>,
        span: Span,
    ) -> CodegenResult<Value> {
        let source = self.ty();
        if source == target {
            return Ok(self);
        }
        let pool = cx.pool();
        match (pool.get(source), pool.get(target)) {
            (Ty::Int, Ty::Number) => {
                let v = self.operand(cx, span)?;
                let widened = cx.builder().cast(CastOp::SiToFp, v, IrType::F64);
                Ok(Value::rvalue(widened, target))
            }
            (Ty::Number, Ty::Int) if explicit => {
                let v = self.operand(cx, span)?;
                let narrowed = cx.builder().cast(CastOp::FpToSi, v, IrType::I32);
                Ok(Value::rvalue(narrowed, target))
            }
            (Ty::Boolean, Ty::Int) if explicit => {
                let v = self.operand(cx, span)?;
                let extended = cx.builder().cast(CastOp::ZExt, v, IrType::I32);
                Ok(Value::rvalue(extended, target))
            }
            (Ty::Int, Ty::Boolean) if explicit => {
                let v = self.operand(cx, span)?;
                let mut bx = cx.builder();
                let zero = bx.const_i32(0);
                let truth = bx.icmp(IntPredicate::Ne, v, zero);
                Ok(Value::rvalue(truth, target))
            }
            (source_ty, Ty::Nullable(inner)) if !matches!(source_ty, Ty::Nullable(_)) => {
                let value = self.convert(inner, explicit, cx, span)?;
                box_value(cx, value, target, span)
            }
            (Ty::Nullable(inner), _) if explicit && inner == target => unbox_value(cx, self, target, span),
            _ => {
                let op = if explicit {
                    format!("conversion to `{}`", cx.display_type(target))
                } else {
                    format!("implicit conversion to `{}`", cx.display_type(target))
                };
                Err(CodegenError::unsupported_operation(op, cx.display_type(source), span))
            }
        }
    }
}

/// `T` to `T | undefined`: primitives get a heap cell, references keep
/// their pointer.
fn box_value(cx: &mut CodegenCx<'_, '_>, value: Value, nullable: TypeId, span: Span) -> CodegenResult<Value> {
    let inner_ir = cx.layout(value.ty(), span)?;
    let operand = value.operand(cx, span)?;
    let boxed = match inner_ir {
        IrType::Ptr => operand,
        IrType::I1 | IrType::I32 | IrType::F64 => cx.call_runtime(RuntimeFn::Box(inner_ir), &[operand], span)?,
        IrType::I64 | IrType::Void => {
            return Err(CodegenError::unsupported_operation(
                "implicit conversion to nullable",
                cx.display_type(value.ty()),
                span,
            ))
        }
    };
    Ok(Value::rvalue(boxed, nullable))
}

/// `T | undefined` to `T`: primitives are loaded from their cell.
fn unbox_value(cx: &mut CodegenCx<'_, '_>, value: Value, inner: TypeId, span: Span) -> CodegenResult<Value> {
    let inner_ir = cx.layout(inner, span)?;
    let cell = value.operand(cx, span)?;
    let operand = match inner_ir {
        IrType::Ptr => cell,
        other => cx.builder().load(other, cell),
    };
    cx.value_of(operand, inner, span)
}

#[cfg(test)]
mod tests;
