//! Operator generators.
//!
//! Arithmetic picks integer or float instructions from the static result
//! type; operands are widened to it implicitly, never narrowed. Logical
//! operators short-circuit and take `boolean` operands only.

use brisk_ir::{BinaryOp, Node, NodeId, NodeKind, Span, SyntaxKind, Ty, TypeId, UnaryOp, UpdateOp};

use super::{payload_mismatch, NodeGenerator};
use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{BinOp, Const, FloatPredicate, IntPredicate, IrType, ValueId};
use crate::object::builtin;
use crate::value::{NumericClass, Value};

fn unsupported(cx: &CodegenCx<'_, '_>, op: &str, ty: TypeId, span: Span) -> CodegenError {
    CodegenError::unsupported_operation(op, cx.display_type(ty), span)
}

/// Generate a `boolean` condition operand.
pub(crate) fn condition(cx: &mut CodegenCx<'_, '_>, id: NodeId) -> CodegenResult<ValueId> {
    let span = cx.node(id).span;
    let value = cx.generate(id)?;
    if value.ty() != TypeId::BOOLEAN {
        return Err(unsupported(cx, "condition", value.ty(), span));
    }
    value.operand(cx, span)
}

/// Numeric class of an arithmetic operand, or `UnsupportedOperation`.
fn arithmetic_class(cx: &CodegenCx<'_, '_>, op: BinaryOp, value: &Value, span: Span) -> CodegenResult<NumericClass> {
    match NumericClass::of(cx.pool(), value.ty()) {
        Some(class @ (NumericClass::Integer | NumericClass::Float)) => Ok(class),
        _ => Err(unsupported(cx, op.as_symbol(), value.ty(), span)),
    }
}

/// Strict (non-short-circuit) binary operator on generated operands.
pub(crate) fn lower_binary(
    cx: &mut CodegenCx<'_, '_>,
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    result_ty: TypeId,
    span: Span,
) -> CodegenResult<Value> {
    use BinaryOp as B;

    match op {
        B::Add | B::Sub | B::Mul | B::Div | B::Rem => {
            arithmetic_class(cx, op, &lhs, span)?;
            arithmetic_class(cx, op, &rhs, span)?;
            let (ty, inst) = match NumericClass::of(cx.pool(), result_ty) {
                Some(NumericClass::Integer) => (
                    TypeId::INT,
                    match op {
                        B::Add => BinOp::Add,
                        B::Sub => BinOp::Sub,
                        B::Mul => BinOp::Mul,
                        B::Div => BinOp::SDiv,
                        _ => BinOp::SRem,
                    },
                ),
                Some(NumericClass::Float) => (
                    TypeId::NUMBER,
                    match op {
                        B::Add => BinOp::FAdd,
                        B::Sub => BinOp::FSub,
                        B::Mul => BinOp::FMul,
                        B::Div => BinOp::FDiv,
                        _ => BinOp::FRem,
                    },
                ),
                _ => return Err(unsupported(cx, op.as_symbol(), result_ty, span)),
            };
            let l = lhs.cast_implicit(ty, cx, span)?.operand(cx, span)?;
            let r = rhs.cast_implicit(ty, cx, span)?.operand(cx, span)?;
            Ok(Value::rvalue(cx.builder().binary(inst, l, r), ty))
        }

        B::Exp => {
            arithmetic_class(cx, op, &lhs, span)?;
            arithmetic_class(cx, op, &rhs, span)?;
            let base = lhs.cast_implicit(TypeId::NUMBER, cx, span)?.operand(cx, span)?;
            let exponent = rhs.cast_implicit(TypeId::NUMBER, cx, span)?.operand(cx, span)?;
            let result = builtin::emit_pow(cx, base, exponent, span)?;
            Ok(Value::rvalue(result, TypeId::NUMBER))
        }

        B::BitAnd | B::BitOr | B::BitXor | B::Shl | B::Shr | B::UShr => {
            for value in [&lhs, &rhs] {
                if NumericClass::of(cx.pool(), value.ty()) != Some(NumericClass::Integer) {
                    return Err(unsupported(cx, op.as_symbol(), value.ty(), span));
                }
            }
            let l = lhs.operand(cx, span)?;
            let r = rhs.operand(cx, span)?;
            let mut bx = cx.builder();
            let result = match op {
                B::BitAnd => bx.binary(BinOp::And, l, r),
                B::BitOr => bx.binary(BinOp::Or, l, r),
                B::BitXor => bx.binary(BinOp::Xor, l, r),
                _ => {
                    let mask = bx.const_i32(31);
                    let count = bx.binary(BinOp::And, r, mask);
                    let inst = match op {
                        B::Shl => BinOp::Shl,
                        B::Shr => BinOp::AShr,
                        _ => BinOp::LShr,
                    };
                    bx.binary(inst, l, count)
                }
            };
            Ok(Value::rvalue(result, TypeId::INT))
        }

        B::Eq | B::NotEq | B::StrictEq | B::StrictNotEq | B::Lt | B::LtEq | B::Gt | B::GtEq => {
            compare(cx, op, lhs, rhs, span)
        }

        B::And | B::Or => Err(CodegenError::internal(
            "short-circuit operator lowered strictly",
            span,
        )),
    }
}

fn is_pointer(cx: &CodegenCx<'_, '_>, ty: TypeId) -> bool {
    cx.layout(ty, Span::DUMMY).is_ok_and(|ir| ir == IrType::Ptr)
}

/// Payload type of a `T | undefined` whose `T` lives in a heap cell.
fn boxed_payload(cx: &CodegenCx<'_, '_>, ty: TypeId) -> Option<TypeId> {
    let pool = cx.pool();
    match pool.get(ty) {
        Ty::Nullable(inner) if NumericClass::of(pool, inner).is_some() => Some(inner),
        _ => None,
    }
}

/// Operand of an equality where at least one side is a boxed primitive.
struct EqualityOperand {
    operand: ValueId,
    /// Type compared once both sides are present.
    payload: TypeId,
    boxed: bool,
}

impl EqualityOperand {
    fn new(cx: &mut CodegenCx<'_, '_>, value: Value, span: Span) -> CodegenResult<Self> {
        let operand = value.operand(cx, span)?;
        Ok(match boxed_payload(cx, value.ty()) {
            Some(payload) => EqualityOperand {
                operand,
                payload,
                boxed: true,
            },
            None => EqualityOperand {
                operand,
                payload: value.ty(),
                boxed: false,
            },
        })
    }

    /// `cell == null` for boxed operands, `false` otherwise.
    fn is_undefined(&self, cx: &mut CodegenCx<'_, '_>) -> ValueId {
        let mut bx = cx.builder();
        if self.boxed {
            let null = bx.const_null();
            bx.icmp(IntPredicate::Eq, self.operand, null)
        } else {
            bx.const_bool(false)
        }
    }

    /// The payload; boxed operands are loaded from their cell.
    fn payload(&self, cx: &mut CodegenCx<'_, '_>, span: Span) -> CodegenResult<Value> {
        if !self.boxed {
            return Ok(Value::rvalue(self.operand, self.payload));
        }
        let ir_ty = cx.layout(self.payload, span)?;
        let loaded = cx.builder().load(ir_ty, self.operand);
        Ok(Value::rvalue(loaded, self.payload))
    }
}

/// `==`/`===` with a `T | undefined` primitive on either side.
///
/// Two undefined sides are equal and a single undefined side is unequal.
/// Otherwise the payloads are compared in their own block, which is only
/// entered when both cells are present.
fn compare_boxed(
    cx: &mut CodegenCx<'_, '_>,
    lhs: Value,
    rhs: Value,
    negated: bool,
    span: Span,
) -> CodegenResult<Value> {
    let lhs = EqualityOperand::new(cx, lhs, span)?;
    let rhs = EqualityOperand::new(cx, rhs, span)?;
    let lhs_undefined = lhs.is_undefined(cx);
    let rhs_undefined = rhs.is_undefined(cx);
    let mut bx = cx.builder();
    let both = bx.binary(BinOp::And, lhs_undefined, rhs_undefined);
    let either = bx.binary(BinOp::Or, lhs_undefined, rhs_undefined);
    let entry = cx.current_block();
    let payload_block = cx.append_block("eq.payload");
    let merge = cx.append_block("eq.end");
    cx.builder().cond_br(either, merge, payload_block);

    cx.position_at(payload_block);
    let l = lhs.payload(cx, span)?;
    let r = rhs.payload(cx, span)?;
    let equal = compare(cx, BinaryOp::StrictEq, l, r, span)?.operand(cx, span)?;
    let payload_end = cx.current_block();
    cx.builder().br(merge);

    cx.position_at(merge);
    let mut bx = cx.builder();
    let mut result = bx.phi(IrType::I1, &[(both, entry), (equal, payload_end)]);
    if negated {
        let truth = bx.const_bool(true);
        result = bx.binary(BinOp::Xor, result, truth);
    }
    Ok(Value::rvalue(result, TypeId::BOOLEAN))
}

fn compare(cx: &mut CodegenCx<'_, '_>, op: BinaryOp, lhs: Value, rhs: Value, span: Span) -> CodegenResult<Value> {
    use BinaryOp as B;
    use NumericClass::{Boolean, Float, Integer};

    let equality = matches!(op, B::Eq | B::NotEq | B::StrictEq | B::StrictNotEq);
    let negated = matches!(op, B::NotEq | B::StrictNotEq);
    if boxed_payload(cx, lhs.ty()).is_some() || boxed_payload(cx, rhs.ty()).is_some() {
        if !equality {
            let ty = if boxed_payload(cx, lhs.ty()).is_some() { lhs.ty() } else { rhs.ty() };
            return Err(unsupported(cx, op.as_symbol(), ty, span));
        }
        return compare_boxed(cx, lhs, rhs, negated, span);
    }
    let pool = cx.pool();

    let result = match (NumericClass::of(pool, lhs.ty()), NumericClass::of(pool, rhs.ty())) {
        (Some(Integer), Some(Integer)) => {
            let pred = match op {
                B::Lt => IntPredicate::Slt,
                B::LtEq => IntPredicate::Sle,
                B::Gt => IntPredicate::Sgt,
                B::GtEq => IntPredicate::Sge,
                _ if negated => IntPredicate::Ne,
                _ => IntPredicate::Eq,
            };
            let l = lhs.operand(cx, span)?;
            let r = rhs.operand(cx, span)?;
            cx.builder().icmp(pred, l, r)
        }
        (Some(Integer | Float), Some(Integer | Float)) => {
            let pred = match op {
                B::Lt => FloatPredicate::Olt,
                B::LtEq => FloatPredicate::Ole,
                B::Gt => FloatPredicate::Ogt,
                B::GtEq => FloatPredicate::Oge,
                _ if negated => FloatPredicate::Une,
                _ => FloatPredicate::Oeq,
            };
            let l = lhs.cast_implicit(TypeId::NUMBER, cx, span)?.operand(cx, span)?;
            let r = rhs.cast_implicit(TypeId::NUMBER, cx, span)?.operand(cx, span)?;
            cx.builder().fcmp(pred, l, r)
        }
        (Some(Boolean), Some(Boolean)) if equality => {
            let pred = if negated { IntPredicate::Ne } else { IntPredicate::Eq };
            let l = lhs.operand(cx, span)?;
            let r = rhs.operand(cx, span)?;
            cx.builder().icmp(pred, l, r)
        }
        // Class, array and reference-nullable operands compare by identity.
        (None, None) if equality && is_pointer(cx, lhs.ty()) && is_pointer(cx, rhs.ty()) => {
            let pred = if negated { IntPredicate::Ne } else { IntPredicate::Eq };
            let l = lhs.operand(cx, span)?;
            let r = rhs.operand(cx, span)?;
            cx.builder().icmp(pred, l, r)
        }
        _ => return Err(unsupported(cx, op.as_symbol(), lhs.ty(), span)),
    };
    Ok(Value::rvalue(result, TypeId::BOOLEAN))
}

/// `a && b`, `a || b`
fn short_circuit(
    cx: &mut CodegenCx<'_, '_>,
    op: BinaryOp,
    left: NodeId,
    right: NodeId,
    span: Span,
) -> CodegenResult<Value> {
    let lhs = cx.generate(left)?;
    if lhs.ty() != TypeId::BOOLEAN {
        return Err(unsupported(cx, op.as_symbol(), lhs.ty(), span));
    }
    let lhs = lhs.operand(cx, span)?;
    let lhs_block = cx.current_block();
    let rhs_block = cx.append_block("logic.rhs");
    let merge = cx.append_block("logic.end");
    if op == BinaryOp::And {
        cx.builder().cond_br(lhs, rhs_block, merge);
    } else {
        cx.builder().cond_br(lhs, merge, rhs_block);
    }

    cx.position_at(rhs_block);
    let rhs = cx.generate(right)?;
    if rhs.ty() != TypeId::BOOLEAN {
        return Err(unsupported(cx, op.as_symbol(), rhs.ty(), span));
    }
    let rhs = rhs.operand(cx, span)?;
    let rhs_end = cx.current_block();
    cx.builder().br(merge);

    cx.position_at(merge);
    let result = cx
        .builder()
        .phi(IrType::I1, &[(lhs, lhs_block), (rhs, rhs_end)]);
    Ok(Value::rvalue(result, TypeId::BOOLEAN))
}

pub struct Paren;

impl NodeGenerator for Paren {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Paren(inner) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Paren, node));
        };
        cx.generate(inner)
    }
}

pub struct Binary;

impl NodeGenerator for Binary {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Binary { op, left, right } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Binary, node));
        };
        let result_ty = cx.node_type(node);
        let value = if matches!(op, BinaryOp::And | BinaryOp::Or) {
            short_circuit(cx, op, left, right, node.span)?
        } else {
            let lhs = cx.generate(left)?;
            let rhs = cx.generate(right)?;
            lower_binary(cx, op, lhs, rhs, result_ty, node.span)?
        };
        value.cast_implicit(result_ty, cx, node.span)
    }
}

pub struct Unary;

impl NodeGenerator for Unary {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Unary { op, operand } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Unary, node));
        };
        let value = cx.generate(operand)?;
        let ty = value.ty();
        let class = NumericClass::of(cx.pool(), ty);
        let result = match (op, class) {
            (UnaryOp::Neg, Some(NumericClass::Integer)) => {
                let v = value.operand(cx, node.span)?;
                let mut bx = cx.builder();
                let zero = bx.const_i32(0);
                bx.binary(BinOp::Sub, zero, v)
            }
            (UnaryOp::Neg, Some(NumericClass::Float)) => {
                let v = value.operand(cx, node.span)?;
                cx.builder().fneg(v)
            }
            (UnaryOp::Plus, Some(NumericClass::Integer | NumericClass::Float)) => value.operand(cx, node.span)?,
            (UnaryOp::Not, Some(NumericClass::Boolean)) => {
                let v = value.operand(cx, node.span)?;
                let mut bx = cx.builder();
                let one = bx.const_bool(true);
                bx.binary(BinOp::Xor, v, one)
            }
            (UnaryOp::BitNot, Some(NumericClass::Integer)) => {
                let v = value.operand(cx, node.span)?;
                let mut bx = cx.builder();
                let ones = bx.const_i32(-1);
                bx.binary(BinOp::Xor, v, ones)
            }
            _ => return Err(unsupported(cx, op.as_symbol(), ty, node.span)),
        };
        let result_ty = cx.node_type(node);
        Value::rvalue(result, ty).cast_implicit(result_ty, cx, node.span)
    }
}

/// `++x`, `x++`, `--x`, `x--`
pub struct Update;

impl NodeGenerator for Update {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Update { op, prefix, target } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Update, node));
        };
        let Value::Assignable(place) = cx.generate(target)? else {
            return Err(CodegenError::internal(
                format!("operand of `{}` is not assignable", op.as_symbol()),
                node.span,
            ));
        };
        let (inst, one) = match (NumericClass::of(cx.pool(), place.ty), op) {
            (Some(NumericClass::Integer), UpdateOp::Increment) => (BinOp::Add, Const::i32(1)),
            (Some(NumericClass::Integer), UpdateOp::Decrement) => (BinOp::Sub, Const::i32(1)),
            (Some(NumericClass::Float), UpdateOp::Increment) => (BinOp::FAdd, Const::f64(1.0)),
            (Some(NumericClass::Float), UpdateOp::Decrement) => (BinOp::FSub, Const::f64(1.0)),
            _ => return Err(unsupported(cx, op.as_symbol(), place.ty, node.span)),
        };
        let old = place.load(cx, node.span)?;
        let mut bx = cx.builder();
        let one = bx.const_value(one);
        let new = bx.binary(inst, old, one);
        place.store(cx, new, node.span)?;
        Ok(Value::rvalue(if prefix { new } else { old }, place.ty))
    }
}

/// `x = v` and compound `x op= v`.
pub struct Assign;

impl NodeGenerator for Assign {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Assign { op, target, value } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Assign, node));
        };
        let Value::Assignable(place) = cx.generate(target)? else {
            return Err(CodegenError::internal(
                "assignment to a non-assignable expression",
                node.span,
            ));
        };
        match op {
            None => {
                let value = cx.generate(value)?;
                place.assign(cx, value, node.span)
            }
            Some(op @ (BinaryOp::And | BinaryOp::Or)) => Err(unsupported(
                cx,
                &format!("{}=", op.as_symbol()),
                place.ty,
                node.span,
            )),
            Some(op) => {
                let current = Value::rvalue(place.load(cx, node.span)?, place.ty);
                let rhs = cx.generate(value)?;
                let result = lower_binary(cx, op, current, rhs, place.ty, node.span)?;
                place.assign(cx, result, node.span)
            }
        }
    }
}

/// `cond ? a : b`
pub struct Conditional;

impl Conditional {
    fn arm(cx: &mut CodegenCx<'_, '_>, expr: NodeId, ty: TypeId, span: Span) -> CodegenResult<Option<ValueId>> {
        let value = cx.generate(expr)?;
        if ty == TypeId::VOID {
            return Ok(None);
        }
        value.cast_implicit(ty, cx, span)?.operand(cx, span).map(Some)
    }
}

impl NodeGenerator for Conditional {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Conditional {
            cond,
            then_expr,
            else_expr,
        } = node.kind
        else {
            return Err(payload_mismatch(SyntaxKind::Conditional, node));
        };
        let ty = cx.node_type(node);
        let cond = condition(cx, cond)?;
        let then_block = cx.append_block("cond.then");
        let else_block = cx.append_block("cond.else");
        let merge = cx.append_block("cond.end");
        cx.builder().cond_br(cond, then_block, else_block);

        cx.position_at(then_block);
        let then_value = Self::arm(cx, then_expr, ty, node.span)?;
        let then_end = cx.current_block();
        cx.builder().br(merge);

        cx.position_at(else_block);
        let else_value = Self::arm(cx, else_expr, ty, node.span)?;
        let else_end = cx.current_block();
        cx.builder().br(merge);

        cx.position_at(merge);
        match (then_value, else_value) {
            (Some(a), Some(b)) => {
                let ir_ty = cx.layout(ty, node.span)?;
                let phi = cx.builder().phi(ir_ty, &[(a, then_end), (b, else_end)]);
                cx.value_of(phi, ty, node.span)
            }
            _ => Ok(Value::unit()),
        }
    }
}

/// Explicit conversion to the node's type.
pub struct Cast;

impl NodeGenerator for Cast {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Cast(inner) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Cast, node));
        };
        let value = cx.generate(inner)?;
        let target = cx.node_type(node);
        value.cast_explicit(target, cx, node.span)
    }
}
