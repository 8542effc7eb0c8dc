//! Built-in singleton objects.
//!
//! `Math` members map either to constants, to LLVM intrinsics (declared with
//! the configured intrinsic hints), or to libm functions. Every argument is
//! converted implicitly to `number` and every result is a `number`.
//! `min` and `max` take any number of arguments; every other member rejects
//! arguments beyond its arity.

use brisk_ir::{BuiltinObject, Name, NodeId, SignatureId, Span, TypeId};

use super::{ObjectCapabilities, ObjectReference};
use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{BinOp, FloatPredicate, FnAttrs, ValueId};
use crate::runtime::RuntimeFn;
use crate::value::Value;

/// Lowering of one `Math` member.
#[derive(Clone, Copy, Debug, PartialEq)]
enum MathMember {
    Constant(f64),
    /// LLVM intrinsic; pure.
    Intrinsic { symbol: &'static str, arity: usize },
    /// C library function; may set `errno`.
    Libm { symbol: &'static str, arity: usize },
    /// Pairwise intrinsic calls over all arguments; `empty` without any.
    Fold { symbol: &'static str, empty: f64 },
    /// Nearest integer, halves toward positive infinity.
    Round,
    Random,
}

fn math_member(name: &str) -> Option<MathMember> {
    use std::f64::consts;
    use MathMember::{Constant, Fold, Intrinsic, Libm, Random, Round};

    Some(match name {
        "PI" => Constant(consts::PI),
        "E" => Constant(consts::E),
        "LN2" => Constant(consts::LN_2),
        "LN10" => Constant(consts::LN_10),
        "LOG2E" => Constant(consts::LOG2_E),
        "LOG10E" => Constant(consts::LOG10_E),
        "SQRT2" => Constant(consts::SQRT_2),
        "SQRT1_2" => Constant(consts::FRAC_1_SQRT_2),

        "abs" => Intrinsic { symbol: "llvm.fabs.f64", arity: 1 },
        "ceil" => Intrinsic { symbol: "llvm.ceil.f64", arity: 1 },
        "floor" => Intrinsic { symbol: "llvm.floor.f64", arity: 1 },
        "trunc" => Intrinsic { symbol: "llvm.trunc.f64", arity: 1 },
        "sqrt" => Intrinsic { symbol: "llvm.sqrt.f64", arity: 1 },
        "exp" => Intrinsic { symbol: "llvm.exp.f64", arity: 1 },
        "log" => Intrinsic { symbol: "llvm.log.f64", arity: 1 },
        "sin" => Intrinsic { symbol: "llvm.sin.f64", arity: 1 },
        "cos" => Intrinsic { symbol: "llvm.cos.f64", arity: 1 },
        "pow" => Intrinsic { symbol: "llvm.pow.f64", arity: 2 },
        "min" => Fold { symbol: "llvm.minimum.f64", empty: f64::INFINITY },
        "max" => Fold { symbol: "llvm.maximum.f64", empty: f64::NEG_INFINITY },

        "tan" => Libm { symbol: "tan", arity: 1 },
        "asin" => Libm { symbol: "asin", arity: 1 },
        "acos" => Libm { symbol: "acos", arity: 1 },
        "atan" => Libm { symbol: "atan", arity: 1 },
        "atan2" => Libm { symbol: "atan2", arity: 2 },

        "round" => Round,
        "random" => Random,
        _ => return None,
    })
}

const ARG_NAMES: [&str; 2] = ["x", "y"];

fn unsupported_member(object: BuiltinObject, member: &str, span: Span) -> CodegenError {
    CodegenError::UnsupportedBuiltIn {
        object: object.name().to_owned(),
        member: member.to_owned(),
        span,
    }
}

fn generate_numbers(cx: &mut CodegenCx<'_, '_>, args: &[NodeId]) -> CodegenResult<Vec<ValueId>> {
    args.iter()
        .map(|&arg| cx.generate_operand(arg, TypeId::NUMBER))
        .collect()
}

/// Generate exactly `arity` arguments of `Math.<member>` as `number`
/// operands.
fn numeric_args(
    cx: &mut CodegenCx<'_, '_>,
    member: &str,
    args: &[NodeId],
    arity: usize,
    span: Span,
) -> CodegenResult<Vec<ValueId>> {
    if args.len() < arity {
        return Err(CodegenError::MissingArgument {
            function: format!("Math.{member}"),
            param: ARG_NAMES[args.len()].to_owned(),
            span,
        });
    }
    if args.len() > arity {
        return Err(CodegenError::unsupported_operation(
            format!("`Math.{member}` with {} arguments", args.len()),
            BuiltinObject::Math.name(),
            span,
        ));
    }
    generate_numbers(cx, args)
}

/// Call `llvm.pow.f64` on two `number` operands.
pub(crate) fn emit_pow(
    cx: &mut CodegenCx<'_, '_>,
    base: ValueId,
    exponent: ValueId,
    span: Span,
) -> CodegenResult<ValueId> {
    let hints = cx.config().intrinsic_hints;
    let pow = cx.declare_math_function("llvm.pow.f64", 2, hints, span)?;
    Ok(cx.call_function(pow, &[base, exponent], hints))
}

/// `r = floor(x)`, then `r + 1` when `x - r >= 0.5`.
///
/// Adding one half before flooring would round the largest double below
/// 0.5 up to 1.
fn emit_round(cx: &mut CodegenCx<'_, '_>, x: ValueId, span: Span) -> CodegenResult<ValueId> {
    let hints = cx.config().intrinsic_hints;
    let floor = cx.declare_math_function("llvm.floor.f64", 1, hints, span)?;
    let down = cx.call_function(floor, &[x], hints);
    let mut bx = cx.builder();
    let fraction = bx.binary(BinOp::FSub, x, down);
    let half = bx.const_f64(0.5);
    let round_up = bx.fcmp(FloatPredicate::Oge, fraction, half);
    let one = bx.const_f64(1.0);
    let up = bx.binary(BinOp::FAdd, down, one);
    Ok(bx.select(round_up, up, down))
}

impl ObjectCapabilities for BuiltinObject {
    fn type_name(&self, _cx: &CodegenCx<'_, '_>) -> String {
        self.name().to_owned()
    }

    fn get_field(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        _this: &ObjectReference,
        member: Name,
        span: Span,
    ) -> CodegenResult<Value> {
        let name = cx.name(member);
        match (self, math_member(name)) {
            (BuiltinObject::Math, Some(MathMember::Constant(value))) => {
                let operand = cx.builder().const_f64(value);
                Ok(Value::rvalue(operand, TypeId::NUMBER))
            }
            (BuiltinObject::Math, Some(_)) => Err(CodegenError::unsupported_operation(
                format!("method reference `{name}`"),
                self.name(),
                span,
            )),
            (BuiltinObject::Math, None) => Err(unsupported_member(*self, name, span)),
        }
    }

    fn call_method(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        _this: &ObjectReference,
        member: Name,
        args: &[NodeId],
        _signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        let name = cx.name(member);
        let result = match math_member(name) {
            Some(MathMember::Intrinsic { symbol, arity }) => {
                let operands = numeric_args(cx, name, args, arity, span)?;
                let hints = cx.config().intrinsic_hints;
                let callee = cx.declare_math_function(symbol, arity, hints, span)?;
                cx.call_function(callee, &operands, hints)
            }
            Some(MathMember::Libm { symbol, arity }) => {
                let operands = numeric_args(cx, name, args, arity, span)?;
                let callee = cx.declare_math_function(symbol, arity, FnAttrs::empty(), span)?;
                cx.call_function(callee, &operands, FnAttrs::empty())
            }
            Some(MathMember::Fold { symbol, empty }) => {
                let operands = generate_numbers(cx, args)?;
                let Some((&first, rest)) = operands.split_first() else {
                    let operand = cx.builder().const_f64(empty);
                    return Ok(Value::rvalue(operand, TypeId::NUMBER));
                };
                let hints = cx.config().intrinsic_hints;
                let callee = cx.declare_math_function(symbol, 2, hints, span)?;
                rest.iter()
                    .fold(first, |acc, &next| cx.call_function(callee, &[acc, next], hints))
            }
            Some(MathMember::Round) => {
                let operands = numeric_args(cx, name, args, 1, span)?;
                emit_round(cx, operands[0], span)?
            }
            Some(MathMember::Random) => {
                numeric_args(cx, name, args, 0, span)?;
                cx.call_runtime(RuntimeFn::MathRandom, &[], span)?
            }
            Some(MathMember::Constant(_)) => {
                return Err(CodegenError::unsupported_operation(
                    format!("call of constant `{name}`"),
                    self.name(),
                    span,
                ))
            }
            None => return Err(unsupported_member(*self, name, span)),
        };
        Ok(Value::rvalue(result, TypeId::NUMBER))
    }

    fn construct(
        &self,
        _cx: &mut CodegenCx<'_, '_>,
        _args: &[NodeId],
        _signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        Err(CodegenError::unsupported_operation("new", self.name(), span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_table_classifies_members() {
        assert_eq!(
            math_member("sqrt"),
            Some(MathMember::Intrinsic {
                symbol: "llvm.sqrt.f64",
                arity: 1
            })
        );
        assert_eq!(
            math_member("atan2"),
            Some(MathMember::Libm {
                symbol: "atan2",
                arity: 2
            })
        );
        assert_eq!(math_member("round"), Some(MathMember::Round));
        assert_eq!(math_member("frobnicate"), None);
    }

    #[test]
    fn min_and_max_fold_from_their_identities() {
        assert_eq!(
            math_member("min"),
            Some(MathMember::Fold {
                symbol: "llvm.minimum.f64",
                empty: f64::INFINITY
            })
        );
        assert_eq!(
            math_member("max"),
            Some(MathMember::Fold {
                symbol: "llvm.maximum.f64",
                empty: f64::NEG_INFINITY
            })
        );
    }

    #[test]
    fn constants_match_std() {
        assert_eq!(math_member("PI"), Some(MathMember::Constant(std::f64::consts::PI)));
        assert_eq!(
            math_member("SQRT1_2"),
            Some(MathMember::Constant(std::f64::consts::FRAC_1_SQRT_2))
        );
    }

    #[test]
    fn member_names_are_case_sensitive() {
        assert_eq!(math_member("pi"), None);
        assert_eq!(math_member("Sqrt"), None);
    }
}
