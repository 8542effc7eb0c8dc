//! Code generation context.
//!
//! [`UnitState`] is the per-compilation state: the module under
//! construction, the specialization cache, class descriptors, and the
//! GC-required flag. [`CodegenCx`] is the per-function view over it: the
//! function being built, the insertion block, the lexical scope, and the
//! type-parameter substitution of the current specialization.
//!
//! A `CodegenCx` mutably borrows its `UnitState`, so a nested function body
//! gets its own context (via [`UnitState::function_cx`]) that lives only
//! as long as the call that generates it.

use std::rc::Rc;

use brisk_ir::{ClassId, Name, Node, NodeId, Program, Span, Substitution, Ty, TypeId, TypePool};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::CodegenConfig;
use crate::dispatch::Registry;
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{
    BlockId, Const, FnAttrs, FunctionId, GlobalId, IrBuilder, IrType, Module, StructId, ValueId,
};
use crate::layout;
use crate::object::{ObjectReference, TypeDescriptor};
use crate::runtime::RuntimeFn;
use crate::scope::Scope;
use crate::stack::ensure_sufficient_stack;
use crate::value::Value;

/// Read-only inputs shared by every context of one compilation.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub program: &'a Program,
    pub registry: &'a Registry,
    pub config: &'a CodegenConfig,
}

/// Counters reported with the compiled module.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodegenStats {
    /// Specializations generated.
    pub generated: usize,
    /// Specialization requests served from the cache.
    pub cache_hits: usize,
}

/// One-way flag: can be raised, never lowered.
#[derive(Clone, Copy, Debug, Default)]
struct GcFlag(bool);

impl GcFlag {
    /// Raise the flag; true if it was not yet raised.
    fn raise(&mut self) -> bool {
        !std::mem::replace(&mut self.0, true)
    }

    fn is_set(self) -> bool {
        self.0
    }
}

/// Break and continue targets of an enclosing loop.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LoopTarget {
    pub break_to: BlockId,
    pub continue_to: BlockId,
}

/// State of one compilation unit.
pub struct UnitState {
    pub(crate) module: Module,
    /// Mangled name to generated definition.
    pub(crate) specializations: FxHashMap<String, FunctionId>,
    descriptors: FxHashMap<ClassId, Rc<TypeDescriptor>>,
    array_header: Option<StructId>,
    gc: GcFlag,
    pub(crate) stats: CodegenStats,
}

impl UnitState {
    pub fn new(module_name: &str) -> Self {
        UnitState {
            module: Module::new(module_name),
            specializations: FxHashMap::default(),
            descriptors: FxHashMap::default(),
            array_header: None,
            gc: GcFlag::default(),
            stats: CodegenStats::default(),
        }
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn stats(&self) -> CodegenStats {
        self.stats
    }

    /// True once any allocating construct has been generated.
    pub fn gc_required(&self) -> bool {
        self.gc.is_set()
    }

    /// Record that the module needs a collector. Idempotent.
    pub fn raise_gc(&mut self) {
        if self.gc.raise() {
            debug!(module = %self.module.name, "GC-required flag raised");
        }
    }

    /// Declare an external symbol, rejecting a second use of the name with
    /// another signature.
    pub(crate) fn declare_external(
        &mut self,
        name: &str,
        params: &[IrType],
        ret: IrType,
        attrs: FnAttrs,
        variadic: bool,
        span: Span,
    ) -> CodegenResult<FunctionId> {
        self.module
            .declare_external(name, params, ret, attrs, variadic)
            .map_err(|conflict| {
                CodegenError::unsupported_operation(
                    format!("external declaration `{}: {}`", conflict.name, conflict.requested),
                    conflict.existing,
                    span,
                )
            })
    }

    pub(crate) fn into_parts(self) -> (Module, bool, CodegenStats) {
        (self.module, self.gc.is_set(), self.stats)
    }

    /// Context for generating the body of `function`, which must have no
    /// blocks yet. Creates the entry block.
    pub(crate) fn function_cx<'a>(
        &mut self,
        env: Env<'a>,
        function: FunctionId,
        subst: Rc<Substitution>,
        return_ty: TypeId,
    ) -> CodegenCx<'a, '_> {
        let block = IrBuilder::append_block(self.module.function_mut(function), "entry");
        CodegenCx {
            env,
            unit: self,
            function,
            block,
            scope: Scope::new(),
            subst,
            return_ty,
            this: None,
            loops: Vec::new(),
        }
    }
}

/// Per-function code generation context.
pub struct CodegenCx<'a, 'u> {
    pub(crate) env: Env<'a>,
    pub(crate) unit: &'u mut UnitState,
    function: FunctionId,
    block: BlockId,
    pub(crate) scope: Scope,
    subst: Rc<Substitution>,
    return_ty: TypeId,
    this: Option<ObjectReference>,
    loops: Vec<LoopTarget>,
}

impl<'a> CodegenCx<'a, '_> {
    // -- Dispatch --

    /// Generate `id` through the registry.
    ///
    /// A kind without a registered generator fails with `UnsupportedSyntax`.
    pub fn generate(&mut self, id: NodeId) -> CodegenResult<Value> {
        let node = self.env.program.node(id);
        let kind = node.kind.syntax_kind();
        trace!(%kind, span = %node.span, "generate");
        let registry = self.env.registry;
        match registry.get(kind) {
            Some(generator) => ensure_sufficient_stack(|| generator.generate(self, node)),
            None => Err(CodegenError::UnsupportedSyntax {
                kind: kind.to_string(),
                span: node.span,
            }),
        }
    }

    /// Generate `id`, convert it implicitly to `ty`, and return its operand.
    pub fn generate_operand(&mut self, id: NodeId, ty: TypeId) -> CodegenResult<ValueId> {
        let span = self.node(id).span;
        let value = self.generate(id)?;
        value.cast_implicit(ty, self, span)?.operand(self, span)
    }

    // -- Program queries --

    pub fn program(&self) -> &'a Program {
        self.env.program
    }

    pub fn config(&self) -> &'a CodegenConfig {
        self.env.config
    }

    pub fn pool(&self) -> &'a TypePool {
        &self.env.program.types
    }

    pub fn node(&self, id: NodeId) -> &'a Node {
        self.env.program.node(id)
    }

    pub fn name(&self, name: Name) -> &'static str {
        self.env.program.name(name)
    }

    /// `ty` with the current specialization's type arguments applied.
    pub fn resolve_type(&self, ty: TypeId) -> TypeId {
        self.pool().substitute(ty, &self.subst)
    }

    /// Concrete static type of a node.
    pub fn node_type(&self, node: &Node) -> TypeId {
        self.resolve_type(node.ty)
    }

    pub fn display_type(&self, ty: TypeId) -> String {
        self.env.program.display_type(ty)
    }

    pub fn layout(&self, ty: TypeId, span: Span) -> CodegenResult<IrType> {
        layout::ir_type(self.pool(), ty, span)
    }

    /// Wrap an operand of static type `ty` as a [`Value`], as an object
    /// reference when the type is object-like.
    pub fn value_of(&mut self, operand: ValueId, ty: TypeId, span: Span) -> CodegenResult<Value> {
        match self.pool().get(ty) {
            Ty::Void => Ok(Value::unit()),
            Ty::Array(_) | Ty::Class { .. } | Ty::BuiltIn(_) => Ok(Value::Object(
                ObjectReference::from_address(self, operand, ty, span)?,
            )),
            Ty::Int | Ty::Number | Ty::Boolean | Ty::Nullable(_) | Ty::Param(_) => {
                Ok(Value::rvalue(operand, ty))
            }
        }
    }

    // -- Function state --

    pub fn return_ty(&self) -> TypeId {
        self.return_ty
    }

    pub fn this(&self) -> Option<&ObjectReference> {
        self.this.as_ref()
    }

    pub(crate) fn set_this(&mut self, this: ObjectReference) {
        self.this = Some(this);
    }

    /// The n-th low-level parameter of the current function.
    pub fn param(&self, index: usize) -> ValueId {
        self.unit.module.function(self.function).param(index)
    }

    pub(crate) fn push_loop(&mut self, target: LoopTarget) {
        self.loops.push(target);
    }

    pub(crate) fn pop_loop(&mut self) {
        self.loops.pop();
    }

    pub(crate) fn innermost_loop(&self) -> Option<LoopTarget> {
        self.loops.last().copied()
    }

    /// Store `value` in a fresh stack slot bound to `name`.
    pub(crate) fn bind_local(&mut self, name: Name, value: ValueId, ty: TypeId, span: Span) -> CodegenResult<()> {
        let ir_ty = self.layout(ty, span)?;
        let mut bx = self.builder();
        let slot = bx.alloca(ir_ty);
        bx.store(value, slot);
        self.scope.bind_mutable(name, slot, ir_ty, ty);
        Ok(())
    }

    /// Terminate the open block: `ret void` for `void` functions,
    /// `unreachable` otherwise.
    pub(crate) fn finish_body(&mut self) {
        if self.is_terminated() {
            return;
        }
        let returns_void = self.return_ty == TypeId::VOID;
        let mut bx = self.builder();
        if returns_void {
            bx.ret_void();
        } else {
            bx.unreachable();
        }
    }

    // -- Instruction emission --

    /// Builder positioned at the current block.
    pub fn builder(&mut self) -> IrBuilder<'_> {
        IrBuilder::new(self.unit.module.function_mut(self.function), self.block)
    }

    pub fn current_block(&self) -> BlockId {
        self.block
    }

    pub fn append_block(&mut self, label: &str) -> BlockId {
        IrBuilder::append_block(self.unit.module.function_mut(self.function), label)
    }

    pub fn position_at(&mut self, block: BlockId) {
        self.block = block;
    }

    pub fn is_terminated(&self) -> bool {
        self.unit
            .module
            .function(self.function)
            .block(self.block)
            .terminator
            .is_some()
    }

    pub fn value_ir_type(&self, value: ValueId) -> IrType {
        self.unit.module.function(self.function).value_type(value)
    }

    pub fn const_value(&mut self, value: Const) -> ValueId {
        self.builder().const_value(value)
    }

    /// Call a function of the module.
    pub fn call_function(&mut self, callee: FunctionId, args: &[ValueId], attrs: FnAttrs) -> ValueId {
        let ret = self.unit.module.function(callee).ret;
        self.builder().call(callee, ret, args, attrs)
    }

    /// Call a runtime entry point, declaring it on first use.
    ///
    /// Raises the GC-required flag for entry points that allocate.
    pub fn call_runtime(
        &mut self,
        function: RuntimeFn,
        args: &[ValueId],
        span: Span,
    ) -> CodegenResult<ValueId> {
        let (params, ret, variadic) = function.signature();
        let callee = self.unit.declare_external(
            &function.symbol(),
            &params,
            ret,
            function.attrs(),
            variadic,
            span,
        )?;
        if function.allocates() {
            self.unit.raise_gc();
        }
        Ok(self.builder().call(callee, ret, args, FnAttrs::empty()))
    }

    /// Declare an intrinsic or libm function over `f64`.
    pub fn declare_math_function(
        &mut self,
        symbol: &str,
        arity: usize,
        attrs: FnAttrs,
        span: Span,
    ) -> CodegenResult<FunctionId> {
        let params = vec![IrType::F64; arity];
        self.unit
            .declare_external(symbol, &params, IrType::F64, attrs, false, span)
    }

    // -- Layouts --

    /// The `{ i32 len, i32 cap, ptr data }` array header, registered once.
    pub fn array_header(&mut self) -> StructId {
        if let Some(id) = self.unit.array_header {
            return id;
        }
        let id = self
            .unit
            .module
            .add_struct("brisk.array", vec![IrType::I32, IrType::I32, IrType::Ptr]);
        self.unit.array_header = Some(id);
        id
    }

    /// Descriptor of `class`, built on first request.
    pub fn descriptor(&mut self, class: ClassId) -> CodegenResult<Rc<TypeDescriptor>> {
        if let Some(descriptor) = self.unit.descriptors.get(&class) {
            return Ok(Rc::clone(descriptor));
        }
        let descriptor = Rc::new(TypeDescriptor::build(self, class)?);
        debug!(
            class = descriptor.name,
            size = descriptor.size,
            fields = descriptor.fields.len(),
            "class descriptor built"
        );
        self.unit.descriptors.insert(class, Rc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Add constant array data as a module global.
    pub fn add_literal_global(&mut self, elem_ty: IrType, data: Vec<Const>) -> GlobalId {
        let name = format!("brisk.lit.{}", self.unit.module.globals().len());
        self.unit.module.add_global(name, elem_ty, data)
    }
}
