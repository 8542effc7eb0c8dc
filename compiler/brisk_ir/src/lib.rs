//! Typed program representation for the Brisk compiler.
//!
//! This crate is the contract between the front end (parser and type
//! checker) and the code generator:
//!
//! - [`Span`] and interned [`Name`]s for locations and identifiers
//! - [`TypePool`] holding hash-consed static types ([`TypeId`], [`Ty`])
//! - [`NodeArena`] holding the typed tree ([`Node`], [`NodeKind`])
//! - Declarations ([`FunctionDecl`], [`ClassDecl`]) and resolved call
//!   [`Signature`]s
//! - [`Program`] bundling all of the above with a [`SymbolTable`]
//!
//! [`ProgramBuilder`] assembles programs incrementally.

mod build;
mod builtin;
mod decl;
mod interner;
mod name;
mod node;
mod program;
mod span;
mod types;

pub use build::ProgramBuilder;
pub use builtin::BuiltinObject;
pub use decl::{
    ClassDecl, ClassId, FieldDecl, FuncId, FunctionDecl, Param, Signature, SignatureId,
};
pub use interner::StringInterner;
pub use name::Name;
pub use node::{BinaryOp, Node, NodeArena, NodeId, NodeKind, SyntaxKind, UnaryOp, UpdateOp};
pub use program::{Program, Symbol, SymbolTable};
pub use span::Span;
pub use types::{Substitution, Ty, TypeId, TypePool};
