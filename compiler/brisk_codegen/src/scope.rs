//! Lexical scopes for generated function bodies.
//!
//! `Scope` uses `im::HashMap` for O(1) structural-sharing clone, so a child
//! scope for a block costs nothing. Each binding records whether the name
//! is an SSA value (`const`) or a stack slot (`let`, parameters).

use brisk_ir::{Name, TypeId};
use im::HashMap;

use crate::ir::{IrType, ValueId};

/// How a local name is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeBinding {
    /// SSA value; cannot be reassigned.
    Immutable { value: ValueId, ty: TypeId },
    /// Stack slot with explicit load/store.
    Mutable {
        /// Pointer to the alloca'd slot.
        ptr: ValueId,
        /// Type of the stored value (needed for `load`).
        ir_ty: IrType,
        ty: TypeId,
    },
}

impl ScopeBinding {
    /// Static type of the bound name.
    pub fn ty(self) -> TypeId {
        match self {
            ScopeBinding::Immutable { ty, .. } | ScopeBinding::Mutable { ty, .. } => ty,
        }
    }
}

/// A lexical scope with variable bindings.
#[derive(Clone, Default)]
pub struct Scope {
    bindings: HashMap<Name, ScopeBinding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a child scope that inherits all parent bindings.
    #[must_use]
    pub fn child(&self) -> Self {
        self.clone()
    }

    pub fn bind_immutable(&mut self, name: Name, value: ValueId, ty: TypeId) {
        self.bindings
            .insert(name, ScopeBinding::Immutable { value, ty });
    }

    pub fn bind_mutable(&mut self, name: Name, ptr: ValueId, ir_ty: IrType, ty: TypeId) {
        self.bindings
            .insert(name, ScopeBinding::Mutable { ptr, ir_ty, ty });
    }

    pub fn lookup(&self, name: Name) -> Option<ScopeBinding> {
        self.bindings.get(&name).copied()
    }

    pub fn contains(&self, name: Name) -> bool {
        self.bindings.contains_key(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: u32) -> Name {
        Name::from_raw(n)
    }

    #[test]
    fn empty_scope_lookup_returns_none() {
        let scope = Scope::new();
        assert!(scope.lookup(name(1)).is_none());
        assert!(!scope.contains(name(1)));
    }

    #[test]
    fn bindings_record_their_type() {
        let mut scope = Scope::new();
        scope.bind_immutable(name(1), ValueId::NONE, TypeId::INT);
        scope.bind_mutable(name(2), ValueId::NONE, IrType::F64, TypeId::NUMBER);

        assert_eq!(scope.lookup(name(1)).map(ScopeBinding::ty), Some(TypeId::INT));
        assert!(matches!(
            scope.lookup(name(2)),
            Some(ScopeBinding::Mutable {
                ir_ty: IrType::F64,
                ..
            })
        ));
    }

    #[test]
    fn child_mutations_do_not_leak_to_parent() {
        let mut parent = Scope::new();
        parent.bind_immutable(name(1), ValueId::NONE, TypeId::INT);

        let mut child = parent.child();
        child.bind_immutable(name(2), ValueId::NONE, TypeId::BOOLEAN);
        assert!(child.contains(name(1)));
        assert!(child.contains(name(2)));
        assert!(!parent.contains(name(2)));
    }

    #[test]
    fn child_can_shadow_parent_binding() {
        let mut parent = Scope::new();
        parent.bind_immutable(name(1), ValueId::NONE, TypeId::INT);

        let mut child = parent.child();
        child.bind_mutable(name(1), ValueId::NONE, IrType::F64, TypeId::NUMBER);
        assert_eq!(parent.lookup(name(1)).map(ScopeBinding::ty), Some(TypeId::INT));
        assert_eq!(child.lookup(name(1)).map(ScopeBinding::ty), Some(TypeId::NUMBER));
    }
}
