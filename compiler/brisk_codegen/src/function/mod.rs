//! Function resolution and specialization.
//!
//! A call site names a declaration plus concrete type arguments (overload
//! and generic resolution happened in the front end). [`canonicalize`]
//! turns that into a [`ResolvedFunction`]: concrete parameter types, which
//! parameters the call supplies, and the concrete return type.
//! [`specialize`] mangles it and generates the body at most once per
//! compilation; later requests for the same symbol are cache hits.
//!
//! Omitted parameters are not part of the low-level signature. The callee
//! initializes them from their default expressions, so `f(1)` and `f(1, 2)`
//! are separate specializations.

mod mangle;

use std::rc::Rc;

use brisk_ir::{ClassId, FuncId, Name, NodeId, Program, SignatureId, Span, Substitution, Ty, TypeId};
use tracing::debug;

pub use mangle::{Mangler, MANGLE_PREFIX};

use crate::context::{CodegenCx, Env, UnitState};
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{FnAttrs, FunctionId, IrType, Linkage, ValueId};
use crate::layout;
use crate::object::{array, ArrayLayout, ObjectReference};
use crate::value::Value;

/// One parameter of a specialization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedParam {
    pub name: Name,
    pub ty: TypeId,
    pub optional: bool,
    pub variadic: bool,
    pub default: Option<NodeId>,
    /// Passed by the caller; otherwise initialized from `default`.
    pub supplied: bool,
    pub span: Span,
}

/// A concrete specialization of one declaration.
#[derive(Clone, Debug)]
pub struct ResolvedFunction {
    pub func: FuncId,
    pub name: &'static str,
    pub owner: Option<ClassId>,
    pub params: Vec<ResolvedParam>,
    pub ret: TypeId,
    pub is_instance: bool,
    pub type_args: Vec<TypeId>,
    pub subst: Rc<Substitution>,
}

impl ResolvedFunction {
    pub fn supplied_params(&self) -> impl Iterator<Item = &ResolvedParam> {
        self.params.iter().filter(|p| p.supplied)
    }

    /// `Owner.name` or `name`.
    pub fn display_name(&self, program: &Program) -> String {
        match self.owner {
            Some(class) => format!("{}.{}", program.name(program.class(class).name), self.name),
            None => self.name.to_owned(),
        }
    }
}

/// Resolve `func` instantiated with `type_args` for a call passing
/// `arg_count` arguments.
///
/// A variadic parameter is always supplied: it receives the trailing
/// arguments packed into an array, possibly empty.
pub fn canonicalize(
    program: &Program,
    func: FuncId,
    type_args: &[TypeId],
    arg_count: usize,
    span: Span,
) -> CodegenResult<ResolvedFunction> {
    let decl = program.function(func);
    let pool = &program.types;
    let name = program.name(decl.name);

    if decl.type_params.len() != type_args.len() {
        return Err(CodegenError::internal(
            format!(
                "`{name}` expects {} type arguments, the call site has {}",
                decl.type_params.len(),
                type_args.len()
            ),
            span,
        ));
    }
    let subst: Substitution = decl
        .type_params
        .iter()
        .copied()
        .zip(type_args.iter().copied())
        .collect();

    let concrete = |ty: TypeId| -> CodegenResult<TypeId> {
        let ty = pool.substitute(ty, &subst);
        if pool.is_generic(ty) {
            return Err(CodegenError::internal(
                format!("`{name}` specialized at generic type `{}`", program.display_type(ty)),
                span,
            ));
        }
        Ok(ty)
    };

    let has_variadic = decl.params.iter().any(|p| p.variadic);
    if arg_count > decl.params.len() && !has_variadic {
        return Err(CodegenError::internal(
            format!(
                "`{name}` takes {} arguments, the call site passes {arg_count}",
                decl.params.len()
            ),
            span,
        ));
    }

    let mut params = Vec::with_capacity(decl.params.len());
    for (i, param) in decl.params.iter().enumerate() {
        let supplied = param.variadic || i < arg_count;
        if !supplied && param.default.is_none() {
            let function = match decl.owner {
                Some(class) => format!("{}.{name}", program.name(program.class(class).name)),
                None => name.to_owned(),
            };
            return Err(CodegenError::MissingArgument {
                function,
                param: program.name(param.name).to_owned(),
                span,
            });
        }
        params.push(ResolvedParam {
            name: param.name,
            ty: concrete(param.ty)?,
            optional: param.optional,
            variadic: param.variadic,
            default: param.default,
            supplied,
            span: param.span,
        });
    }

    let ret = concrete(decl.ret)?;
    Ok(ResolvedFunction {
        func,
        name,
        owner: decl.owner,
        ret,
        is_instance: decl.is_instance(),
        params,
        type_args: type_args.to_vec(),
        subst: Rc::new(subst),
    })
}

/// Symbol of a specialization.
pub fn mangled_name(program: &Program, resolved: &ResolvedFunction) -> String {
    let owner = resolved
        .owner
        .map(|class| program.name(program.class(class).name));
    let params: Vec<TypeId> = resolved.supplied_params().map(|p| p.ty).collect();
    Mangler::new(program).mangle_specialization(owner, resolved.name, &params, &resolved.type_args)
}

/// Low-level parameter types: the receiver, then each supplied parameter.
fn lowered_params(program: &Program, resolved: &ResolvedFunction) -> CodegenResult<Vec<IrType>> {
    let receiver = resolved.is_instance.then_some(IrType::Ptr);
    receiver
        .into_iter()
        .map(Ok)
        .chain(
            resolved
                .supplied_params()
                .map(|p| layout::ir_type(&program.types, p.ty, p.span)),
        )
        .collect()
}

/// The definition for `resolved`, generating it on first request.
///
/// Declarations without a body resolve to an external declaration named
/// after the source function.
pub fn specialize(
    env: Env<'_>,
    unit: &mut UnitState,
    resolved: &ResolvedFunction,
    span: Span,
) -> CodegenResult<FunctionId> {
    let program = env.program;
    let params = lowered_params(program, resolved)?;
    let ret = layout::ir_type(&program.types, resolved.ret, span)?;

    let Some(body) = program.function(resolved.func).body else {
        return unit.declare_external(resolved.name, &params, ret, FnAttrs::empty(), false, span);
    };

    let symbol = mangled_name(program, resolved);
    if let Some(&id) = unit.specializations.get(&symbol) {
        unit.stats.cache_hits += 1;
        debug!(%symbol, "specialization cache hit");
        return Ok(id);
    }

    let id = unit
        .module
        .define_function(symbol.clone(), params, ret, Linkage::Internal);
    unit.specializations.insert(symbol.clone(), id);
    unit.stats.generated += 1;
    debug!(%symbol, "generating specialization");

    let mut cx = unit.function_cx(env, id, Rc::clone(&resolved.subst), resolved.ret);
    let mut next_param = 0;
    if resolved.is_instance {
        let Some(owner) = resolved.owner else {
            return Err(CodegenError::internal(
                format!("instance method `{}` has no owning class", resolved.name),
                span,
            ));
        };
        let descriptor = cx.descriptor(owner)?;
        let receiver = cx.param(0);
        cx.set_this(ObjectReference::instance(descriptor, receiver));
        next_param = 1;
    }

    for param in &resolved.params {
        let value = if param.supplied {
            let value = cx.param(next_param);
            next_param += 1;
            value
        } else if let Some(default) = param.default {
            cx.generate_operand(default, param.ty)?
        } else {
            return Err(CodegenError::internal(
                "omitted parameter without a default",
                param.span,
            ));
        };
        cx.bind_local(param.name, value, param.ty, param.span)?;
    }

    cx.generate(body)?;
    cx.finish_body();
    Ok(id)
}

/// Generate a call through signature `signature`.
///
/// `receiver` is the instance address for instance methods and
/// constructors.
pub fn emit_call(
    cx: &mut CodegenCx<'_, '_>,
    signature: SignatureId,
    receiver: Option<ValueId>,
    args: &[NodeId],
    span: Span,
) -> CodegenResult<Value> {
    let program = cx.program();
    let signature = program.signature(signature);
    let type_args: Vec<TypeId> = signature
        .type_args
        .iter()
        .map(|&ty| cx.resolve_type(ty))
        .collect();
    let resolved = canonicalize(program, signature.func, &type_args, args.len(), span)?;

    let mut operands: Vec<ValueId> = receiver.into_iter().collect();
    for (i, param) in resolved.params.iter().enumerate() {
        if param.variadic {
            let layout = match cx.pool().get(param.ty) {
                Ty::Array(_) => ArrayLayout::of(cx.pool(), param.ty, param.span)?,
                _ => {
                    return Err(CodegenError::internal(
                        "rest parameter without an array type",
                        param.span,
                    ))
                }
            };
            let rest = args
                .get(i..)
                .unwrap_or_default()
                .iter()
                .map(|&arg| cx.generate_operand(arg, layout.element))
                .collect::<CodegenResult<Vec<_>>>()?;
            operands.push(array::construct_from_values(cx, layout, &rest, span)?);
        } else if param.supplied {
            operands.push(cx.generate_operand(args[i], param.ty)?);
        }
    }

    let callee = specialize(cx.env, cx.unit, &resolved, span)?;
    let result = cx.call_function(callee, &operands, FnAttrs::empty());
    cx.value_of(result, resolved.ret, span)
}
