//! User-defined classes.

use brisk_ir::{ClassId, FuncId, Name, NodeId, SignatureId, Span, TypeId};
use rustc_hash::FxHashMap;

use super::{ObjectCapabilities, ObjectReference};
use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::function;
use crate::ir::{IrType, StructDef, StructId};
use crate::runtime::RuntimeFn;
use crate::value::{AssignableValue, Place, Value};

/// A field of a class layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: Name,
    pub ty: TypeId,
    pub ir_ty: IrType,
}

/// Layout, method table, and constructor of one class.
///
/// Instances are `%class.<Name>` structs holding the fields in declaration
/// order, allocated through the runtime.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    pub class: ClassId,
    pub name: &'static str,
    /// Instance type.
    pub ty: TypeId,
    pub layout: StructId,
    pub fields: Vec<FieldInfo>,
    pub size: u64,
    pub align: u64,
    methods: FxHashMap<Name, FuncId>,
    pub constructor: Option<FuncId>,
}

impl TypeDescriptor {
    pub(crate) fn build(cx: &mut CodegenCx<'_, '_>, class: ClassId) -> CodegenResult<Self> {
        let program = cx.program();
        let decl = program.class(class);
        let name = program.name(decl.name);

        let fields = decl
            .fields
            .iter()
            .map(|field| {
                Ok(FieldInfo {
                    name: field.name,
                    ty: field.ty,
                    ir_ty: cx.layout(field.ty, field.span)?,
                })
            })
            .collect::<CodegenResult<Vec<_>>>()?;
        let def = StructDef {
            name: format!("class.{name}"),
            fields: fields.iter().map(|f| f.ir_ty).collect(),
        };
        let (size, align) = def.size_align();
        let layout = cx.unit.module.add_struct(def.name, def.fields);

        let methods = decl
            .methods
            .iter()
            .map(|&id| (program.function(id).name, id))
            .collect();

        Ok(TypeDescriptor {
            class,
            name,
            ty: program.types.class(class, decl.name),
            layout,
            fields,
            size,
            align,
            methods,
            constructor: decl.constructor,
        })
    }

    /// Index and info of the field called `name`.
    pub fn field(&self, name: Name) -> Option<(u32, &FieldInfo)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .map(|(i, f)| (i as u32, f))
    }

    pub fn method(&self, name: Name) -> Option<FuncId> {
        self.methods.get(&name).copied()
    }
}

impl ObjectCapabilities for TypeDescriptor {
    fn type_name(&self, _cx: &CodegenCx<'_, '_>) -> String {
        self.name.to_owned()
    }

    fn get_field(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        member: Name,
        span: Span,
    ) -> CodegenResult<Value> {
        let Some((index, field)) = self.field(member) else {
            let member_name = cx.name(member);
            return Err(if self.method(member).is_some() {
                CodegenError::unsupported_operation(
                    format!("method reference `{member_name}`"),
                    self.name,
                    span,
                )
            } else {
                CodegenError::internal(
                    format!("class `{}` has no field `{member_name}`", self.name),
                    span,
                )
            });
        };
        let object = this.require_address(cx, span)?;
        Ok(Value::Assignable(AssignableValue {
            place: Place::Field {
                object,
                struct_ty: self.layout,
                index,
                ir_ty: field.ir_ty,
            },
            ty: field.ty,
        }))
    }

    fn call_method(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        this: &ObjectReference,
        member: Name,
        args: &[NodeId],
        signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        let Some(signature) = signature else {
            return Err(CodegenError::internal(
                format!("call of `{}.{}` has no resolved signature", self.name, cx.name(member)),
                span,
            ));
        };
        let func = cx.program().signature(signature).func;
        let receiver = if cx.program().function(func).is_instance() {
            Some(this.require_address(cx, span)?)
        } else {
            None
        };
        function::emit_call(cx, signature, receiver, args, span)
    }

    fn construct(
        &self,
        cx: &mut CodegenCx<'_, '_>,
        args: &[NodeId],
        signature: Option<SignatureId>,
        span: Span,
    ) -> CodegenResult<Value> {
        let mut bx = cx.builder();
        let size = bx.const_i64(self.size as i64);
        let align = bx.const_i64(self.align as i64);
        let address = cx.call_runtime(RuntimeFn::ObjectAlloc, &[size, align], span)?;

        match (self.constructor, signature) {
            (Some(_), Some(signature)) => {
                function::emit_call(cx, signature, Some(address), args, span)?;
            }
            (None, None) if args.is_empty() => {}
            _ => {
                return Err(CodegenError::internal(
                    format!("`new {}` does not match the class constructor", self.name),
                    span,
                ))
            }
        }

        let descriptor = cx.descriptor(self.class)?;
        Ok(Value::Object(ObjectReference::instance(descriptor, address)))
    }
}
