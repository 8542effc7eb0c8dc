//! Literal generators.

use brisk_ir::{Name, Node, NodeKind, Span, SyntaxKind, Ty, TypeId};

use super::{payload_mismatch, NodeGenerator};
use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::Const;
use crate::object::array;
use crate::value::Value;

/// Parse `int` literal text: decimal, `0x`, `0o`, `0b`, `_` separators,
/// and integral exponent forms such as `1e3`.
pub(crate) fn parse_int(text: &str) -> Option<i32> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    if let Some((radix, rest)) = radix_prefix(&digits) {
        let value = i64::from_str_radix(rest, radix).ok()?;
        return i32::try_from(value).ok();
    }
    if let Ok(value) = digits.parse::<i64>() {
        return i32::try_from(value).ok();
    }
    let value = digits.parse::<f64>().ok()?;
    let in_range = value.is_finite()
        && value.fract() == 0.0
        && value >= f64::from(i32::MIN)
        && value <= f64::from(i32::MAX);
    in_range.then_some(value as i32)
}

/// Parse `number` literal text.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();
    if let Some((radix, rest)) = radix_prefix(&digits) {
        return u64::from_str_radix(rest, radix).ok().map(|v| v as f64);
    }
    digits.parse::<f64>().ok()
}

fn radix_prefix(text: &str) -> Option<(u32, &str)> {
    let prefix = text.get(..2)?;
    let radix = match prefix {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    Some((radix, &text[2..]))
}

/// Constant for numeric literal `text` at static type `ty`.
pub(crate) fn numeric_const(cx: &CodegenCx<'_, '_>, text: Name, ty: TypeId, span: Span) -> CodegenResult<Const> {
    let text = cx.name(text);
    let invalid = |ty: &str| CodegenError::InvalidLiteral {
        text: text.to_owned(),
        ty: ty.to_owned(),
        span,
    };
    match cx.pool().get(ty) {
        Ty::Int => parse_int(text).map(Const::i32).ok_or_else(|| invalid("int")),
        Ty::Number => parse_number(text).map(Const::f64).ok_or_else(|| invalid("number")),
        _ => Err(CodegenError::internal(
            format!("numeric literal typed `{}`", cx.display_type(ty)),
            span,
        )),
    }
}

pub struct NumericLiteral;

impl NodeGenerator for NumericLiteral {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::NumericLiteral(text) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::NumericLiteral, node));
        };
        let ty = cx.node_type(node);
        let constant = numeric_const(cx, text, ty, node.span)?;
        Ok(Value::rvalue(cx.const_value(constant), ty))
    }
}

pub struct BooleanLiteral;

impl NodeGenerator for BooleanLiteral {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::BooleanLiteral(value) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::BooleanLiteral, node));
        };
        Ok(Value::rvalue(cx.builder().const_bool(value), TypeId::BOOLEAN))
    }
}

/// `undefined`: the null pointer at the node's nullable or reference type.
pub struct UndefinedLiteral;

impl NodeGenerator for UndefinedLiteral {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let ty = cx.node_type(node);
        match cx.pool().get(ty) {
            Ty::Nullable(_) | Ty::Array(_) | Ty::Class { .. } => {
                let null = cx.builder().const_null();
                Ok(Value::rvalue(null, ty))
            }
            _ => Err(CodegenError::unsupported_operation(
                "undefined",
                cx.display_type(ty),
                node.span,
            )),
        }
    }
}

pub struct ArrayLiteral;

impl NodeGenerator for ArrayLiteral {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::ArrayLiteral(elements) = &node.kind else {
            return Err(payload_mismatch(SyntaxKind::ArrayLiteral, node));
        };
        let ty = cx.node_type(node);
        array::generate_literal(cx, ty, elements, node.span)
    }
}
