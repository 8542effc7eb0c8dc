//! Runtime object model.
//!
//! Heap entities and built-in singletons are reached through an
//! [`ObjectReference`]: a tagged [`ObjectKind`] plus an optional address.
//! Every kind implements [`ObjectCapabilities`], the shared surface for
//! member access, method calls, construction, and indexing; the reference
//! selects the implementation by tag.
//!
//! - Classes: [`TypeDescriptor`], one per class, built once per unit.
//! - Arrays: [`ArrayLayout`], inline or boxed element storage.
//! - Built-ins: [`BuiltinObject`] with a closed member table.

pub mod array;
pub(crate) mod builtin;
mod class;

use std::rc::Rc;

use brisk_ir::{BuiltinObject, Name, NodeId, SignatureId, Span, Ty, TypeId};

pub use array::{ArrayLayout, ElementStorage};
pub use class::{FieldInfo, TypeDescriptor};

use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::ValueId;
use crate::value::Value;

/// Operations every object kind supports.
///
/// Operations a kind does not define fail with `UnsupportedOperation`
/// (or `UnsupportedBuiltIn` for built-in members).
pub trait ObjectCapabilities {
    /// Printed type name for diagnostics.
    fn type_name(&self, cx: &CodegenCx<'_, '_>) -> String;

    /// `this.member`
    fn get_field(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        member: Name,
        span: Span,
    ) -> CodegenResult<Value>;

    /// `this.member(args)`; `signature` is set for declared methods.
    fn call_method(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        member: Name,
        args: &[NodeId],
        signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value>;

    /// `new T(args)`
    fn construct(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        args: &[NodeId],
        signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value>;

    /// `this[index]`
    fn index(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        index: NodeId,
        span: Span,
    ) -> CodegenResult<Value> {
        let _ = (this, index);
        Err(CodegenError::unsupported_operation("[]", self.type_name(cx), span))
    }
}

/// Kind of object behind a reference.
#[derive(Clone, Debug)]
pub enum ObjectKind {
    Class(Rc<TypeDescriptor>),
    Array(ArrayLayout),
    BuiltIn(BuiltinObject),
}

/// Handle to an object.
///
/// `address` is `None` for built-in singletons and for a class name used
/// as the receiver of a static method.
#[derive(Clone, Debug)]
pub struct ObjectReference {
    pub kind: ObjectKind,
    pub address: Option<ValueId>,
    pub ty: TypeId,
}

impl ObjectReference {
    /// A class instance at `address`.
    pub fn instance(descriptor: Rc<TypeDescriptor>, address: ValueId) -> Self {
        let ty = descriptor.ty;
        ObjectReference {
            kind: ObjectKind::Class(descriptor),
            address: Some(address),
            ty,
        }
    }

    /// The class itself, as receiver of static methods.
    pub fn class_static(descriptor: Rc<TypeDescriptor>) -> Self {
        let ty = descriptor.ty;
        ObjectReference {
            kind: ObjectKind::Class(descriptor),
            address: None,
            ty,
        }
    }

    pub fn builtin(object: BuiltinObject, ty: TypeId) -> Self {
        ObjectReference {
            kind: ObjectKind::BuiltIn(object),
            address: None,
            ty,
        }
    }

    /// Reference to the object of static type `ty` at `address`.
    pub fn from_address(
        cx: &mut CodegenCx<'_, '_>,
        address: ValueId,
        ty: TypeId,
        span: Span,
    ) -> CodegenResult<Self> {
        match cx.pool().get(ty) {
            Ty::Class { id, .. } => Ok(Self::instance(cx.descriptor(id)?, address)),
            Ty::Array(_) => Ok(ObjectReference {
                kind: ObjectKind::Array(ArrayLayout::of(cx.pool(), ty, span)?),
                address: Some(address),
                ty,
            }),
            Ty::BuiltIn(object) => Ok(Self::builtin(object, ty)),
            _ => Err(CodegenError::internal(
                format!("`{}` is not an object type", cx.display_type(ty)),
                span,
            )),
        }
    }

    fn capabilities(&self) -> &dyn ObjectCapabilities {
        match &self.kind {
            ObjectKind::Class(descriptor) => descriptor.as_ref(),
            ObjectKind::Array(layout) => layout,
            ObjectKind::BuiltIn(object) => object,
        }
    }

    /// Address operand; the null pointer for address-less references.
    pub fn operand(&self, cx: &mut CodegenCx<'_, '_>) -> ValueId {
        match self.address {
            Some(address) => address,
            None => cx.builder().const_null(),
        }
    }

    /// Address, or an internal error for address-less references.
    pub fn require_address(&self, cx: &CodegenCx<'_, '_>, span: Span) -> CodegenResult<ValueId> {
        self.address.ok_or_else(|| {
            CodegenError::internal(
                format!("`{}` used without an instance", self.capabilities().type_name(cx)),
                span,
            )
        })
    }

    pub fn get_field(&self, cx: &mut CodegenCx<'_, '_>, member: Name, span: Span) -> CodegenResult<Value> {
        self.capabilities().get_field(cx, self, member, span)
    }

    pub fn call_method(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        member: Name,
        args: &[NodeId],
        signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        self.capabilities()
            .call_method(cx, self, member, args, signature, span)
    }

    pub fn index(&self, cx: &mut CodegenCx<'_, '_>, index: NodeId, span: Span) -> CodegenResult<Value> {
        self.capabilities().index(cx, self, index, span)
    }
}

/// `new T(args)` for an object type.
pub fn construct(
    cx: &mut CodegenCx<'_, '_>,
    ty: TypeId,
    args: &[NodeId],
    signature: Option<SignatureId>,
    span: Span,
) -> CodegenResult<Value> {
    match cx.pool().get(ty) {
        Ty::Class { id, .. } => {
            let descriptor = cx.descriptor(id)?;
            descriptor.construct(cx, args, signature, span)
        }
        Ty::Array(_) => ArrayLayout::of(cx.pool(), ty, span)?.construct(cx, args, signature, span),
        Ty::BuiltIn(object) => object.construct(cx, args, signature, span),
        _ => Err(CodegenError::unsupported_operation("new", cx.display_type(ty), span)),
    }
}
