//! A fully resolved program as handed to the code generator.

use rustc_hash::FxHashMap;

use crate::{
    BuiltinObject, ClassDecl, ClassId, FuncId, FunctionDecl, Name, Node, NodeArena, NodeId,
    Signature, SignatureId, StringInterner, TypeId, TypePool,
};

/// What a global name refers to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Symbol {
    Function(FuncId),
    Class(ClassId),
    BuiltIn(BuiltinObject),
}

/// Global names visible from every function body.
#[derive(Default)]
pub struct SymbolTable {
    map: FxHashMap<Name, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, returning the symbol it shadowed, if any.
    pub fn insert(&mut self, name: Name, symbol: Symbol) -> Option<Symbol> {
        self.map.insert(name, symbol)
    }

    pub fn get(&self, name: Name) -> Option<Symbol> {
        self.map.get(&name).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// The typed tree, declarations, and symbol table of one compilation unit.
///
/// Immutable once built, except that the [`TypePool`] accepts new
/// (substituted) types through a shared reference.
pub struct Program {
    pub interner: StringInterner,
    pub types: TypePool,
    pub nodes: NodeArena,
    pub functions: Vec<FunctionDecl>,
    pub classes: Vec<ClassDecl>,
    pub signatures: Vec<Signature>,
    pub symbols: SymbolTable,
    /// Exported functions, in declaration order.
    pub entry_points: Vec<FuncId>,
}

impl Program {
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        self.nodes.get(id)
    }

    #[inline]
    pub fn function(&self, id: FuncId) -> &FunctionDecl {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.index()]
    }

    #[inline]
    pub fn signature(&self, id: SignatureId) -> &Signature {
        &self.signatures[id.index()]
    }

    pub fn symbol(&self, name: Name) -> Option<Symbol> {
        self.symbols.get(name)
    }

    /// Resolve an interned name.
    #[inline]
    pub fn name(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// Print a type in source syntax.
    pub fn display_type(&self, ty: TypeId) -> String {
        self.types.display(ty, &self.interner)
    }

    /// Iterate over all function declarations with their ids.
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &FunctionDecl)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, decl)| (FuncId::from_raw(u32::try_from(i).unwrap_or(u32::MAX)), decl))
    }
}
