//! Calls and construction.

use brisk_ir::{Node, NodeKind, SyntaxKind};

use super::{payload_mismatch, NodeGenerator};
use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::function;
use crate::object;
use crate::value::Value;

/// `f(args)` and `receiver.m(args)`.
///
/// Member callees dispatch on the receiver's object kind; plain callees go
/// straight to the resolved signature.
pub struct Call;

impl NodeGenerator for Call {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Call {
            callee,
            args,
            signature,
        } = &node.kind
        else {
            return Err(payload_mismatch(SyntaxKind::Call, node));
        };
        let callee = cx.node(*callee);

        if let NodeKind::Member { object, property } = callee.kind {
            let receiver = cx.generate(object)?.into_object(cx, callee.span)?;
            return receiver.call_method(cx, property, args, *signature, node.span);
        }

        match signature {
            Some(signature) => function::emit_call(cx, *signature, None, args, node.span),
            None => Err(CodegenError::internal(
                "call without a resolved signature",
                node.span,
            )),
        }
    }
}

/// `new T(args)`; `T` is the node's type.
pub struct New;

impl NodeGenerator for New {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::New {
            args, signature, ..
        } = &node.kind
        else {
            return Err(payload_mismatch(SyntaxKind::New, node));
        };
        let ty = cx.node_type(node);
        object::construct(cx, ty, args, *signature, node.span)
    }
}
