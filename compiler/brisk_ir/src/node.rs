//! The typed program tree.
//!
//! Nodes live in a flat [`NodeArena`] and refer to each other by
//! [`NodeId`]. Every node carries the static type the front end resolved
//! for it (`void` for statements).
//!
//! [`NodeKind`] covers everything the front end can hand over, including
//! constructs the restricted subset rejects; the code generator decides
//! which kinds it supports.

use std::fmt;

use crate::{FuncId, Name, SignatureId, Span, TypeId};

/// Index of a node in the [`NodeArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "cache", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    /// `**`
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    /// Source spelling of the operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Exp => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::StrictEq => "===",
            BinaryOp::StrictNotEq => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Comparison operators yield `boolean` regardless of operand type.
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::StrictEq
                | BinaryOp::StrictNotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

/// Prefix unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `+x`
    Plus,
    /// `!x`
    Not,
    /// `~x`
    BitNot,
}

impl UnaryOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

/// `++` / `--`.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub const fn as_symbol(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

/// Node payloads.
#[derive(Clone, Debug)]
pub enum NodeKind {
    // --- Literals ---
    /// Numeric literal; the token text is kept so the code generator can
    /// check it against the resolved type.
    NumericLiteral(Name),
    BooleanLiteral(bool),
    UndefinedLiteral,
    StringLiteral(Name),
    TemplateLiteral(Vec<NodeId>),
    RegExpLiteral(Name),
    ObjectLiteral(Vec<NodeId>),
    ArrayLiteral(Vec<NodeId>),

    // --- Names ---
    Identifier(Name),
    This,

    // --- Operators ---
    Paren(NodeId),
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    Update {
        op: UpdateOp,
        prefix: bool,
        target: NodeId,
    },
    /// `target = value`, or `target op= value` when `op` is set.
    Assign {
        op: Option<BinaryOp>,
        target: NodeId,
        value: NodeId,
    },
    Conditional {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    /// Explicit conversion to the node's type (`<int>x`, `x as int`).
    Cast(NodeId),
    Typeof(NodeId),
    Delete(NodeId),
    Spread(NodeId),
    Await(NodeId),
    Yield(Option<NodeId>),

    // --- Access and calls ---
    Member {
        object: NodeId,
        property: Name,
    },
    Index {
        object: NodeId,
        index: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
        /// `None` for members of built-in objects and arrays.
        signature: Option<SignatureId>,
    },
    New {
        callee: NodeId,
        args: Vec<NodeId>,
        /// The constructor signature, if the class declares one.
        signature: Option<SignatureId>,
    },
    ArrowFunction(FuncId),
    FunctionExpression(FuncId),

    // --- Statements ---
    /// `let`/`var` (mutable) or `const` binding; the node's type is the
    /// declared type.
    VariableDeclaration {
        name: Name,
        init: Option<NodeId>,
        mutable: bool,
    },
    ExpressionStatement(NodeId),
    Block(Vec<NodeId>),
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        cond: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForIn {
        binding: Name,
        iterable: NodeId,
        body: NodeId,
    },
    ForOf {
        binding: Name,
        iterable: NodeId,
        body: NodeId,
    },
    Switch {
        discriminant: NodeId,
        cases: Vec<NodeId>,
    },
    Try {
        block: NodeId,
        handler: Option<NodeId>,
        finalizer: Option<NodeId>,
    },
    Throw(NodeId),
    Labeled {
        label: Name,
        body: NodeId,
    },
    Return(Option<NodeId>),
    Break,
    Continue,
    Empty,
}

/// Field-less discriminant of [`NodeKind`], used as the dispatch key.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum SyntaxKind {
    NumericLiteral,
    BooleanLiteral,
    UndefinedLiteral,
    StringLiteral,
    TemplateLiteral,
    RegExpLiteral,
    ObjectLiteral,
    ArrayLiteral,
    Identifier,
    This,
    Paren,
    Unary,
    Binary,
    Update,
    Assign,
    Conditional,
    Cast,
    Typeof,
    Delete,
    Spread,
    Await,
    Yield,
    Member,
    Index,
    Call,
    New,
    ArrowFunction,
    FunctionExpression,
    VariableDeclaration,
    ExpressionStatement,
    Block,
    If,
    While,
    DoWhile,
    For,
    ForIn,
    ForOf,
    Switch,
    Try,
    Throw,
    Labeled,
    Return,
    Break,
    Continue,
    Empty,
}

impl SyntaxKind {
    /// Every syntax kind, in declaration order.
    pub const ALL: [SyntaxKind; 45] = [
        SyntaxKind::NumericLiteral,
        SyntaxKind::BooleanLiteral,
        SyntaxKind::UndefinedLiteral,
        SyntaxKind::StringLiteral,
        SyntaxKind::TemplateLiteral,
        SyntaxKind::RegExpLiteral,
        SyntaxKind::ObjectLiteral,
        SyntaxKind::ArrayLiteral,
        SyntaxKind::Identifier,
        SyntaxKind::This,
        SyntaxKind::Paren,
        SyntaxKind::Unary,
        SyntaxKind::Binary,
        SyntaxKind::Update,
        SyntaxKind::Assign,
        SyntaxKind::Conditional,
        SyntaxKind::Cast,
        SyntaxKind::Typeof,
        SyntaxKind::Delete,
        SyntaxKind::Spread,
        SyntaxKind::Await,
        SyntaxKind::Yield,
        SyntaxKind::Member,
        SyntaxKind::Index,
        SyntaxKind::Call,
        SyntaxKind::New,
        SyntaxKind::ArrowFunction,
        SyntaxKind::FunctionExpression,
        SyntaxKind::VariableDeclaration,
        SyntaxKind::ExpressionStatement,
        SyntaxKind::Block,
        SyntaxKind::If,
        SyntaxKind::While,
        SyntaxKind::DoWhile,
        SyntaxKind::For,
        SyntaxKind::ForIn,
        SyntaxKind::ForOf,
        SyntaxKind::Switch,
        SyntaxKind::Try,
        SyntaxKind::Throw,
        SyntaxKind::Labeled,
        SyntaxKind::Return,
        SyntaxKind::Break,
        SyntaxKind::Continue,
        SyntaxKind::Empty,
    ];
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl NodeKind {
    /// The dispatch key for this payload.
    pub fn syntax_kind(&self) -> SyntaxKind {
        match self {
            NodeKind::NumericLiteral(_) => SyntaxKind::NumericLiteral,
            NodeKind::BooleanLiteral(_) => SyntaxKind::BooleanLiteral,
            NodeKind::UndefinedLiteral => SyntaxKind::UndefinedLiteral,
            NodeKind::StringLiteral(_) => SyntaxKind::StringLiteral,
            NodeKind::TemplateLiteral(_) => SyntaxKind::TemplateLiteral,
            NodeKind::RegExpLiteral(_) => SyntaxKind::RegExpLiteral,
            NodeKind::ObjectLiteral(_) => SyntaxKind::ObjectLiteral,
            NodeKind::ArrayLiteral(_) => SyntaxKind::ArrayLiteral,
            NodeKind::Identifier(_) => SyntaxKind::Identifier,
            NodeKind::This => SyntaxKind::This,
            NodeKind::Paren(_) => SyntaxKind::Paren,
            NodeKind::Unary { .. } => SyntaxKind::Unary,
            NodeKind::Binary { .. } => SyntaxKind::Binary,
            NodeKind::Update { .. } => SyntaxKind::Update,
            NodeKind::Assign { .. } => SyntaxKind::Assign,
            NodeKind::Conditional { .. } => SyntaxKind::Conditional,
            NodeKind::Cast(_) => SyntaxKind::Cast,
            NodeKind::Typeof(_) => SyntaxKind::Typeof,
            NodeKind::Delete(_) => SyntaxKind::Delete,
            NodeKind::Spread(_) => SyntaxKind::Spread,
            NodeKind::Await(_) => SyntaxKind::Await,
            NodeKind::Yield(_) => SyntaxKind::Yield,
            NodeKind::Member { .. } => SyntaxKind::Member,
            NodeKind::Index { .. } => SyntaxKind::Index,
            NodeKind::Call { .. } => SyntaxKind::Call,
            NodeKind::New { .. } => SyntaxKind::New,
            NodeKind::ArrowFunction(_) => SyntaxKind::ArrowFunction,
            NodeKind::FunctionExpression(_) => SyntaxKind::FunctionExpression,
            NodeKind::VariableDeclaration { .. } => SyntaxKind::VariableDeclaration,
            NodeKind::ExpressionStatement(_) => SyntaxKind::ExpressionStatement,
            NodeKind::Block(_) => SyntaxKind::Block,
            NodeKind::If { .. } => SyntaxKind::If,
            NodeKind::While { .. } => SyntaxKind::While,
            NodeKind::DoWhile { .. } => SyntaxKind::DoWhile,
            NodeKind::For { .. } => SyntaxKind::For,
            NodeKind::ForIn { .. } => SyntaxKind::ForIn,
            NodeKind::ForOf { .. } => SyntaxKind::ForOf,
            NodeKind::Switch { .. } => SyntaxKind::Switch,
            NodeKind::Try { .. } => SyntaxKind::Try,
            NodeKind::Throw(_) => SyntaxKind::Throw,
            NodeKind::Labeled { .. } => SyntaxKind::Labeled,
            NodeKind::Return(_) => SyntaxKind::Return,
            NodeKind::Break => SyntaxKind::Break,
            NodeKind::Continue => SyntaxKind::Continue,
            NodeKind::Empty => SyntaxKind::Empty,
        }
    }
}

/// A node: payload, location, and resolved static type.
#[derive(Clone, Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub ty: TypeId,
}

/// Flat storage for the program tree.
#[derive(Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its id.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        debug_assert!(
            (id.0 as usize) < self.nodes.len(),
            "NodeId {} out of bounds (arena has {} nodes)",
            id.0,
            self.nodes.len()
        );
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
