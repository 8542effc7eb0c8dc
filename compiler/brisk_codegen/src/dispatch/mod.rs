//! Syntax-kind-directed dispatch.
//!
//! The [`Registry`] maps each supported [`SyntaxKind`] to one
//! [`NodeGenerator`]. [`CodegenCx::generate`] looks the node's kind up
//! and fails closed with `UnsupportedSyntax` for anything unregistered.
//!
//! The standard registry covers the compiled subset; embedders can build
//! a narrower one with [`Registry::empty`] and [`Registry::register`].

mod access;
mod calls;
mod control_flow;
pub(crate) mod literals;
pub(crate) mod operators;

use brisk_ir::{Node, SyntaxKind};
use rustc_hash::FxHashMap;

use crate::context::CodegenCx;
use crate::error::{CodegenError, CodegenResult};
use crate::value::Value;

/// Generates code for one kind of node.
pub trait NodeGenerator {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value>;
}

/// Table from syntax kind to generator.
pub struct Registry {
    generators: FxHashMap<SyntaxKind, Box<dyn NodeGenerator>>,
}

impl Registry {
    /// A registry that rejects every kind.
    pub fn empty() -> Self {
        Registry {
            generators: FxHashMap::default(),
        }
    }

    /// Generators for the full compiled subset.
    pub fn standard() -> Self {
        let mut registry = Self::empty();

        registry.register(SyntaxKind::NumericLiteral, literals::NumericLiteral);
        registry.register(SyntaxKind::BooleanLiteral, literals::BooleanLiteral);
        registry.register(SyntaxKind::UndefinedLiteral, literals::UndefinedLiteral);
        registry.register(SyntaxKind::ArrayLiteral, literals::ArrayLiteral);

        registry.register(SyntaxKind::Identifier, access::Identifier);
        registry.register(SyntaxKind::This, access::This);
        registry.register(SyntaxKind::Member, access::Member);
        registry.register(SyntaxKind::Index, access::Index);

        registry.register(SyntaxKind::Paren, operators::Paren);
        registry.register(SyntaxKind::Unary, operators::Unary);
        registry.register(SyntaxKind::Binary, operators::Binary);
        registry.register(SyntaxKind::Update, operators::Update);
        registry.register(SyntaxKind::Assign, operators::Assign);
        registry.register(SyntaxKind::Conditional, operators::Conditional);
        registry.register(SyntaxKind::Cast, operators::Cast);

        registry.register(SyntaxKind::Call, calls::Call);
        registry.register(SyntaxKind::New, calls::New);

        registry.register(SyntaxKind::VariableDeclaration, control_flow::VariableDeclaration);
        registry.register(SyntaxKind::ExpressionStatement, control_flow::ExpressionStatement);
        registry.register(SyntaxKind::Block, control_flow::Block);
        registry.register(SyntaxKind::If, control_flow::If);
        registry.register(SyntaxKind::While, control_flow::While);
        registry.register(SyntaxKind::DoWhile, control_flow::DoWhile);
        registry.register(SyntaxKind::For, control_flow::For);
        registry.register(SyntaxKind::Return, control_flow::Return);
        registry.register(SyntaxKind::Break, control_flow::Break);
        registry.register(SyntaxKind::Continue, control_flow::Continue);
        registry.register(SyntaxKind::Empty, control_flow::Empty);

        registry
    }

    /// Install `generator` for `kind`, replacing any previous one.
    pub fn register(&mut self, kind: SyntaxKind, generator: impl NodeGenerator + 'static) {
        self.generators.insert(kind, Box::new(generator));
    }

    pub fn get(&self, kind: SyntaxKind) -> Option<&dyn NodeGenerator> {
        self.generators.get(&kind).map(Box::as_ref)
    }

    pub fn contains(&self, kind: SyntaxKind) -> bool {
        self.generators.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

/// A generator was handed a node whose payload is not its kind.
pub(crate) fn payload_mismatch(expected: SyntaxKind, node: &Node) -> CodegenError {
    CodegenError::internal(
        format!(
            "{expected} generator received a {} node",
            node.kind.syntax_kind()
        ),
        node.span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_rejects_excluded_kinds() {
        let registry = Registry::standard();
        for kind in [
            SyntaxKind::StringLiteral,
            SyntaxKind::TemplateLiteral,
            SyntaxKind::ObjectLiteral,
            SyntaxKind::ArrowFunction,
            SyntaxKind::Switch,
            SyntaxKind::Try,
            SyntaxKind::ForOf,
            SyntaxKind::Await,
        ] {
            assert!(!registry.contains(kind), "{kind} should be rejected");
        }
    }

    #[test]
    fn standard_registry_covers_the_subset() {
        let registry = Registry::standard();
        assert_eq!(registry.len(), 28);
        assert!(registry.contains(SyntaxKind::Binary));
        assert!(registry.contains(SyntaxKind::DoWhile));
        assert!(Registry::empty().is_empty());
    }
}
