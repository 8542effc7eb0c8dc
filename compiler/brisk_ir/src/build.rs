//! Programmatic construction of typed programs.
//!
//! Front ends lower their checked trees through [`ProgramBuilder`]; the code
//! generator's tests use it to assemble programs without a parser. Each
//! node receives its own synthetic span so diagnostics stay attributable.

use crate::{
    BinaryOp, BuiltinObject, ClassDecl, ClassId, FieldDecl, FuncId, FunctionDecl, Name, Node,
    NodeArena, NodeId, NodeKind, Program, Signature, SignatureId, Span, StringInterner, Symbol,
    SymbolTable, TypeId, TypePool, UnaryOp, UpdateOp,
};

/// Incremental builder for a [`Program`].
pub struct ProgramBuilder {
    interner: StringInterner,
    types: TypePool,
    nodes: NodeArena,
    functions: Vec<FunctionDecl>,
    classes: Vec<ClassDecl>,
    signatures: Vec<Signature>,
    symbols: SymbolTable,
    entry_points: Vec<FuncId>,
    next_offset: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder {
            interner: StringInterner::new(),
            types: TypePool::new(),
            nodes: NodeArena::new(),
            functions: Vec::new(),
            classes: Vec::new(),
            signatures: Vec::new(),
            symbols: SymbolTable::new(),
            entry_points: Vec::new(),
            next_offset: 0,
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn types(&self) -> &TypePool {
        &self.types
    }

    pub fn array_ty(&self, element: TypeId) -> TypeId {
        self.types.array(element)
    }

    pub fn nullable_ty(&self, inner: TypeId) -> TypeId {
        self.types.nullable(inner)
    }

    /// The type of a generic parameter named `name`.
    pub fn param_ty(&self, name: &str) -> TypeId {
        self.types.param(self.interner.intern(name))
    }

    fn next_span(&mut self) -> Span {
        let start = self.next_offset;
        self.next_offset += 1;
        Span::new(start, start + 1)
    }

    /// Allocate a node with a fresh span.
    pub fn node(&mut self, kind: NodeKind, ty: TypeId) -> NodeId {
        let span = self.next_span();
        self.nodes.alloc(Node { kind, span, ty })
    }

    /// Span assigned to a previously built node.
    pub fn span_of(&self, id: NodeId) -> Span {
        self.nodes.get(id).span
    }

    // --- Expressions ---

    pub fn int(&mut self, value: i64) -> NodeId {
        self.int_text(&value.to_string())
    }

    /// An `int` literal with verbatim token text (`0xff`, `1e3`, ...).
    pub fn int_text(&mut self, text: &str) -> NodeId {
        let text = self.interner.intern(text);
        self.node(NodeKind::NumericLiteral(text), TypeId::INT)
    }

    pub fn num(&mut self, value: f64) -> NodeId {
        let text = self.interner.intern(&format!("{value:?}"));
        self.node(NodeKind::NumericLiteral(text), TypeId::NUMBER)
    }

    pub fn bool(&mut self, value: bool) -> NodeId {
        self.node(NodeKind::BooleanLiteral(value), TypeId::BOOLEAN)
    }

    /// `undefined` in a context expecting `ty`.
    pub fn undefined(&mut self, ty: TypeId) -> NodeId {
        self.node(NodeKind::UndefinedLiteral, ty)
    }

    pub fn ident(&mut self, name: &str, ty: TypeId) -> NodeId {
        let name = self.interner.intern(name);
        self.node(NodeKind::Identifier(name), ty)
    }

    pub fn this(&mut self, ty: TypeId) -> NodeId {
        self.node(NodeKind::This, ty)
    }

    pub fn paren(&mut self, inner: NodeId) -> NodeId {
        let ty = self.nodes.get(inner).ty;
        self.node(NodeKind::Paren(inner), ty)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: NodeId, ty: TypeId) -> NodeId {
        self.node(NodeKind::Unary { op, operand }, ty)
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId, ty: TypeId) -> NodeId {
        self.node(NodeKind::Binary { op, left, right }, ty)
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let ty = self.nodes.get(target).ty;
        self.node(
            NodeKind::Assign {
                op: None,
                target,
                value,
            },
            ty,
        )
    }

    /// `target op= value`
    pub fn compound_assign(&mut self, op: BinaryOp, target: NodeId, value: NodeId) -> NodeId {
        let ty = self.nodes.get(target).ty;
        self.node(
            NodeKind::Assign {
                op: Some(op),
                target,
                value,
            },
            ty,
        )
    }

    /// `++x` / `x++` (and the decrement forms).
    pub fn update(&mut self, op: UpdateOp, prefix: bool, target: NodeId) -> NodeId {
        let ty = self.nodes.get(target).ty;
        self.node(NodeKind::Update { op, prefix, target }, ty)
    }

    /// `cond ? then_expr : else_expr` of type `ty`.
    pub fn conditional(&mut self, cond: NodeId, then_expr: NodeId, else_expr: NodeId, ty: TypeId) -> NodeId {
        self.node(
            NodeKind::Conditional {
                cond,
                then_expr,
                else_expr,
            },
            ty,
        )
    }

    /// Explicit conversion of `inner` to `ty`.
    pub fn cast(&mut self, inner: NodeId, ty: TypeId) -> NodeId {
        self.node(NodeKind::Cast(inner), ty)
    }

    pub fn member(&mut self, object: NodeId, property: &str, ty: TypeId) -> NodeId {
        let property = self.interner.intern(property);
        self.node(NodeKind::Member { object, property }, ty)
    }

    pub fn index(&mut self, object: NodeId, index: NodeId, ty: TypeId) -> NodeId {
        self.node(NodeKind::Index { object, index }, ty)
    }

    /// Array literal of `element` typed values.
    pub fn array(&mut self, elements: Vec<NodeId>, element: TypeId) -> NodeId {
        let ty = self.types.array(element);
        self.node(NodeKind::ArrayLiteral(elements), ty)
    }

    /// Direct call of a declared function, resolved to `func<type_args>`.
    ///
    /// The result type is the declared return type with `type_args`
    /// substituted.
    pub fn call(&mut self, func: FuncId, args: Vec<NodeId>, type_args: Vec<TypeId>) -> NodeId {
        let decl = &self.functions[func.index()];
        let name = decl.name;
        let ret = self.instantiate(func, decl.ret, &type_args);
        let signature = self.signature(func, type_args);
        let callee = self.node(NodeKind::Identifier(name), TypeId::VOID);
        self.node(
            NodeKind::Call {
                callee,
                args,
                signature: Some(signature),
            },
            ret,
        )
    }

    /// Method call `receiver.method(args)` resolved to `func`.
    pub fn method_call(&mut self, receiver: NodeId, func: FuncId, args: Vec<NodeId>) -> NodeId {
        let decl = &self.functions[func.index()];
        let (name, ret) = (decl.name, decl.ret);
        let signature = self.signature(func, Vec::new());
        let callee = self.node(
            NodeKind::Member {
                object: receiver,
                property: name,
            },
            TypeId::VOID,
        );
        self.node(
            NodeKind::Call {
                callee,
                args,
                signature: Some(signature),
            },
            ret,
        )
    }

    /// Call of a member with no declaration (array and built-in members).
    pub fn member_call(
        &mut self,
        object: NodeId,
        member: &str,
        args: Vec<NodeId>,
        ty: TypeId,
    ) -> NodeId {
        let callee = self.member(object, member, TypeId::VOID);
        self.node(
            NodeKind::Call {
                callee,
                args,
                signature: None,
            },
            ty,
        )
    }

    /// `new C(args)` for a declared class.
    pub fn new_object(&mut self, class: ClassId, args: Vec<NodeId>) -> NodeId {
        let decl = &self.classes[class.index()];
        let (name, constructor) = (decl.name, decl.constructor);
        let ty = self.types.class(class, name);
        let signature = constructor.map(|func| self.signature(func, Vec::new()));
        let callee = self.node(NodeKind::Identifier(name), ty);
        self.node(
            NodeKind::New {
                callee,
                args,
                signature,
            },
            ty,
        )
    }

    /// `new Array<element>(length)`.
    pub fn new_array(&mut self, element: TypeId, length: NodeId) -> NodeId {
        let ty = self.types.array(element);
        let callee = self.ident("Array", TypeId::VOID);
        self.node(
            NodeKind::New {
                callee,
                args: vec![length],
                signature: None,
            },
            ty,
        )
    }

    // --- Statements ---

    pub fn var(&mut self, name: &str, ty: TypeId, init: Option<NodeId>, mutable: bool) -> NodeId {
        let name = self.interner.intern(name);
        self.node(
            NodeKind::VariableDeclaration {
                name,
                init,
                mutable,
            },
            ty,
        )
    }

    pub fn expr_stmt(&mut self, expr: NodeId) -> NodeId {
        self.node(NodeKind::ExpressionStatement(expr), TypeId::VOID)
    }

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.node(NodeKind::Block(statements), TypeId::VOID)
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        self.node(NodeKind::Return(value), TypeId::VOID)
    }

    pub fn if_else(&mut self, cond: NodeId, then_branch: NodeId, else_branch: Option<NodeId>) -> NodeId {
        self.node(
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            },
            TypeId::VOID,
        )
    }

    pub fn while_loop(&mut self, cond: NodeId, body: NodeId) -> NodeId {
        self.node(NodeKind::While { cond, body }, TypeId::VOID)
    }

    pub fn do_while(&mut self, body: NodeId, cond: NodeId) -> NodeId {
        self.node(NodeKind::DoWhile { body, cond }, TypeId::VOID)
    }

    pub fn for_loop(
        &mut self,
        init: Option<NodeId>,
        cond: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    ) -> NodeId {
        self.node(
            NodeKind::For {
                init,
                cond,
                update,
                body,
            },
            TypeId::VOID,
        )
    }

    pub fn break_stmt(&mut self) -> NodeId {
        self.node(NodeKind::Break, TypeId::VOID)
    }

    pub fn continue_stmt(&mut self) -> NodeId {
        self.node(NodeKind::Continue, TypeId::VOID)
    }

    // --- Declarations ---

    /// Add a function declaration. Free functions are bound in the symbol
    /// table under their name.
    ///
    /// Bodies are attached separately with [`set_body`](Self::set_body) so a
    /// body can call its own function.
    pub fn declare_function(&mut self, decl: FunctionDecl) -> FuncId {
        let id = FuncId::from_raw(u32::try_from(self.functions.len()).unwrap_or(u32::MAX));
        if decl.owner.is_none() {
            self.symbols.insert(decl.name, Symbol::Function(id));
        }
        self.functions.push(decl);
        id
    }

    pub fn set_body(&mut self, func: FuncId, body: NodeId) {
        self.functions[func.index()].body = Some(body);
    }

    pub fn function_mut(&mut self, func: FuncId) -> &mut FunctionDecl {
        &mut self.functions[func.index()]
    }

    /// Declare a class with the given fields; returns its id and instance type.
    pub fn class(&mut self, name: &str, fields: &[(&str, TypeId)]) -> (ClassId, TypeId) {
        let name = self.interner.intern(name);
        let id = ClassId::from_raw(u32::try_from(self.classes.len()).unwrap_or(u32::MAX));
        let fields = fields
            .iter()
            .map(|&(field, ty)| FieldDecl {
                name: self.interner.intern(field),
                ty,
                span: Span::DUMMY,
            })
            .collect();
        self.classes.push(ClassDecl {
            name,
            fields,
            methods: Vec::new(),
            constructor: None,
            span: Span::DUMMY,
        });
        self.symbols.insert(name, Symbol::Class(id));
        (id, self.types.class(id, name))
    }

    /// Declare a method of `class`.
    pub fn method(&mut self, class: ClassId, mut decl: FunctionDecl) -> FuncId {
        decl.owner = Some(class);
        let id = self.declare_function(decl);
        self.classes[class.index()].methods.push(id);
        id
    }

    /// Declare the constructor of `class`; its return type is `void`.
    pub fn constructor(&mut self, class: ClassId, mut decl: FunctionDecl) -> FuncId {
        decl.owner = Some(class);
        decl.is_static = false;
        decl.ret = TypeId::VOID;
        let id = self.declare_function(decl);
        self.classes[class.index()].constructor = Some(id);
        id
    }

    /// Record a resolved call signature.
    pub fn signature(&mut self, func: FuncId, type_args: Vec<TypeId>) -> SignatureId {
        let id = SignatureId::from_raw(u32::try_from(self.signatures.len()).unwrap_or(u32::MAX));
        self.signatures.push(Signature { func, type_args });
        id
    }

    /// Bind a built-in singleton under its source name; returns its type.
    pub fn builtin(&mut self, object: BuiltinObject) -> TypeId {
        let name = self.interner.intern(object.name());
        self.symbols.insert(name, Symbol::BuiltIn(object));
        self.types.builtin(object)
    }

    /// Mark a function as an exported entry point.
    pub fn export(&mut self, func: FuncId) {
        self.functions[func.index()].exported = true;
        if !self.entry_points.contains(&func) {
            self.entry_points.push(func);
        }
    }

    pub fn finish(self) -> Program {
        Program {
            interner: self.interner,
            types: self.types,
            nodes: self.nodes,
            functions: self.functions,
            classes: self.classes,
            signatures: self.signatures,
            symbols: self.symbols,
            entry_points: self.entry_points,
        }
    }

    fn instantiate(&self, func: FuncId, ty: TypeId, type_args: &[TypeId]) -> TypeId {
        let decl = &self.functions[func.index()];
        if decl.type_params.is_empty() {
            return ty;
        }
        let subst = decl
            .type_params
            .iter()
            .copied()
            .zip(type_args.iter().copied())
            .collect();
        self.types.substitute(ty, &subst)
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nodes_get_distinct_spans() {
        let mut b = ProgramBuilder::new();
        let one = b.int(1);
        let two = b.int(2);
        assert_ne!(b.span_of(one), b.span_of(two));
    }

    #[test]
    fn update_and_compound_assign_take_the_target_type() {
        let mut b = ProgramBuilder::new();
        let x = b.ident("x", TypeId::NUMBER);
        let bump = b.update(UpdateOp::Increment, false, x);
        let y = b.ident("y", TypeId::INT);
        let two = b.int(2);
        let scaled = b.compound_assign(BinaryOp::Mul, y, two);
        let program = b.finish();
        assert_eq!(program.node(bump).ty, TypeId::NUMBER);
        assert_eq!(program.node(scaled).ty, TypeId::INT);
        assert!(matches!(
            program.node(scaled).kind,
            NodeKind::Assign {
                op: Some(BinaryOp::Mul),
                ..
            }
        ));
    }

    #[test]
    fn free_functions_are_bound_in_symbol_table() {
        let mut b = ProgramBuilder::new();
        let name = b.name("f");
        let f = b.declare_function(FunctionDecl::new(name, Vec::new(), TypeId::VOID));
        let program = b.finish();
        assert_eq!(program.symbol(name), Some(Symbol::Function(f)));
    }

    #[test]
    fn methods_are_not_bound_globally() {
        let mut b = ProgramBuilder::new();
        let (point, _) = b.class("Point", &[("x", TypeId::INT)]);
        let name = b.name("norm");
        let m = b.method(point, FunctionDecl::new(name, Vec::new(), TypeId::NUMBER));
        let program = b.finish();
        assert_eq!(program.symbol(name), None);
        assert_eq!(program.class(point).methods, vec![m]);
        assert_eq!(program.function(m).owner, Some(point));
    }

    #[test]
    fn generic_call_result_is_instantiated() {
        let mut b = ProgramBuilder::new();
        let t = b.param_ty("T");
        let mut decl = FunctionDecl::new(b.name("first"), Vec::new(), t);
        decl.type_params.push(b.name("T"));
        let f = b.declare_function(decl);
        let call = b.call(f, Vec::new(), vec![TypeId::NUMBER]);
        let program = b.finish();
        assert_eq!(program.node(call).ty, TypeId::NUMBER);
    }

    #[test]
    fn export_is_idempotent() {
        let mut b = ProgramBuilder::new();
        let name = b.name("main");
        let f = b.declare_function(FunctionDecl::new(name, Vec::new(), TypeId::VOID));
        b.export(f);
        b.export(f);
        let program = b.finish();
        assert_eq!(program.entry_points, vec![f]);
        assert!(program.function(f).exported);
    }

    #[test]
    fn builtin_binds_symbol_and_type() {
        let mut b = ProgramBuilder::new();
        let ty = b.builtin(BuiltinObject::Math);
        let math = b.name("Math");
        let program = b.finish();
        assert_eq!(program.symbol(math), Some(Symbol::BuiltIn(BuiltinObject::Math)));
        assert_eq!(program.display_type(ty), "Math");
    }
}
