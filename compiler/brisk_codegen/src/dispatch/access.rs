//! Names, `this`, member and element access.

use brisk_ir::{Node, NodeKind, Symbol, SyntaxKind};

use super::{payload_mismatch, NodeGenerator};
use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::object::ObjectReference;
use crate::scope::ScopeBinding;
use crate::value::{AssignableValue, Place, Value};

/// Locals first, then program-level symbols.
pub struct Identifier;

impl NodeGenerator for Identifier {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Identifier(name) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Identifier, node));
        };

        if let Some(binding) = cx.scope.lookup(name) {
            return match binding {
                ScopeBinding::Immutable { value, ty } => cx.value_of(value, ty, node.span),
                ScopeBinding::Mutable { ptr, ir_ty, ty } => Ok(Value::Assignable(AssignableValue {
                    place: Place::Local { slot: ptr, ir_ty },
                    ty,
                })),
            };
        }

        match cx.program().symbol(name) {
            Some(Symbol::BuiltIn(object)) => {
                let ty = cx.pool().builtin(object);
                Ok(Value::Object(ObjectReference::builtin(object, ty)))
            }
            Some(Symbol::Class(class)) => {
                let descriptor = cx.descriptor(class)?;
                Ok(Value::Object(ObjectReference::class_static(descriptor)))
            }
            Some(Symbol::Function(_)) => Err(CodegenError::unsupported_operation(
                "function reference",
                cx.name(name),
                node.span,
            )),
            None => Err(CodegenError::internal(
                format!("unresolved identifier `{}`", cx.name(name)),
                node.span,
            )),
        }
    }
}

pub struct This;

impl NodeGenerator for This {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        match cx.this() {
            Some(this) => Ok(Value::Object(this.clone())),
            None => Err(CodegenError::internal(
                "`this` outside of an instance method",
                node.span,
            )),
        }
    }
}

/// `object.property`
pub struct Member;

impl NodeGenerator for Member {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Member { object, property } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Member, node));
        };
        let target = cx.generate(object)?.into_object(cx, node.span)?;
        target.get_field(cx, property, node.span)
    }
}

/// `object[index]`
pub struct Index;

impl NodeGenerator for Index {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Index { object, index } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Index, node));
        };
        let target = cx.generate(object)?.into_object(cx, node.span)?;
        target.index(cx, index, node.span)
    }
}
