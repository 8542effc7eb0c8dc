//! The low-level module this crate produces.
//!
//! A small SSA instruction set in the shape of LLVM IR: typed values,
//! basic blocks with one terminator each, functions with attribute sets,
//! named struct layouts, and global constant arrays. Every entity is stored
//! in a `Vec` and referenced by a `Copy` id; a `NONE` sentinel marks absent
//! values.

mod builder;
mod printer;

pub use builder::IrBuilder;

use std::fmt;

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

// ---------------------------------------------------------------------------
// ID newtypes
// ---------------------------------------------------------------------------

macro_rules! ir_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Sentinel for "absent".
            pub const NONE: Self = Self(u32::MAX);

            /// True if this is the `NONE` sentinel.
            #[inline]
            pub fn is_none(self) -> bool {
                self.0 == u32::MAX
            }

            /// The raw index.
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_none() {
                    write!(f, concat!($prefix, "<none>"))
                } else {
                    write!(f, concat!($prefix, "{}"), self.0)
                }
            }
        }
    };
}

ir_id!(
    /// An SSA value within one function.
    ValueId,
    "%v"
);
ir_id!(
    /// A basic block within one function.
    BlockId,
    "bb"
);
ir_id!(
    /// A function (definition or declaration) within the module.
    FunctionId,
    "fn"
);
ir_id!(
    /// A global constant within the module.
    GlobalId,
    "@g"
);
ir_id!(
    /// A named struct layout within the module.
    StructId,
    "%s"
);

// ---------------------------------------------------------------------------
// Types and constants
// ---------------------------------------------------------------------------

/// Low-level value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    I1,
    I32,
    I64,
    F64,
    Ptr,
}

impl IrType {
    /// Store size in bytes.
    pub const fn size(self) -> u64 {
        match self {
            IrType::Void => 0,
            IrType::I1 => 1,
            IrType::I32 => 4,
            IrType::I64 | IrType::F64 | IrType::Ptr => 8,
        }
    }

    /// ABI alignment in bytes.
    pub const fn align(self) -> u64 {
        match self {
            IrType::Void => 1,
            other => other.size(),
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, IrType::F64)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IrType::Void => "void",
            IrType::I1 => "i1",
            IrType::I32 => "i32",
            IrType::I64 => "i64",
            IrType::F64 => "double",
            IrType::Ptr => "ptr",
        })
    }
}

/// A constant operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Const {
    Int { ty: IrType, value: i64 },
    /// IEEE bits of an `f64`, so constants stay `Eq`.
    Float(u64),
    Null,
}

impl Const {
    pub fn i32(value: i32) -> Self {
        Const::Int {
            ty: IrType::I32,
            value: i64::from(value),
        }
    }

    pub fn i64(value: i64) -> Self {
        Const::Int {
            ty: IrType::I64,
            value,
        }
    }

    pub fn bool(value: bool) -> Self {
        Const::Int {
            ty: IrType::I1,
            value: i64::from(value),
        }
    }

    pub fn f64(value: f64) -> Self {
        Const::Float(value.to_bits())
    }

    pub fn ty(self) -> IrType {
        match self {
            Const::Int { ty, .. } => ty,
            Const::Float(_) => IrType::F64,
            Const::Null => IrType::Ptr,
        }
    }

    /// Zero value of `ty`; `None` for `void`.
    pub fn zero(ty: IrType) -> Option<Self> {
        match ty {
            IrType::Void => None,
            IrType::F64 => Some(Const::f64(0.0)),
            IrType::Ptr => Some(Const::Null),
            ty => Some(Const::Int { ty, value: 0 }),
        }
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// Two-operand arithmetic and bitwise instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    SDiv,
    SRem,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    And,
    Or,
    Xor,
    Shl,
    AShr,
    LShr,
}

impl BinOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::SRem => "srem",
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
            BinOp::FRem => "frem",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::AShr => "ashr",
            BinOp::LShr => "lshr",
        }
    }
}

/// Integer comparison predicates (signed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
}

impl IntPredicate {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            IntPredicate::Eq => "eq",
            IntPredicate::Ne => "ne",
            IntPredicate::Slt => "slt",
            IntPredicate::Sle => "sle",
            IntPredicate::Sgt => "sgt",
            IntPredicate::Sge => "sge",
        }
    }
}

/// Float comparison predicates.
///
/// Ordered predicates are false when either operand is NaN; `Une` is true.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatPredicate {
    Oeq,
    Une,
    Olt,
    Ole,
    Ogt,
    Oge,
}

impl FloatPredicate {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            FloatPredicate::Oeq => "oeq",
            FloatPredicate::Une => "une",
            FloatPredicate::Olt => "olt",
            FloatPredicate::Ole => "ole",
            FloatPredicate::Ogt => "ogt",
            FloatPredicate::Oge => "oge",
        }
    }
}

/// Conversion instructions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastOp {
    /// Signed int to float.
    SiToFp,
    /// Float to signed int, truncating toward zero.
    FpToSi,
    /// Zero extension (`i1` to `i32`).
    ZExt,
}

impl CastOp {
    pub const fn mnemonic(self) -> &'static str {
        match self {
            CastOp::SiToFp => "sitofp",
            CastOp::FpToSi => "fptosi",
            CastOp::ZExt => "zext",
        }
    }
}

bitflags! {
    /// Function and call-site attributes.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct FnAttrs: u8 {
        /// No observable side effects; calls may be folded or removed.
        const NO_SIDE_EFFECTS = 1 << 0;
        /// Cannot fail or unwind.
        const NO_UNWIND = 1 << 1;
        /// Returned pointer aliases nothing else.
        const NOALIAS_RETURN = 1 << 2;
    }
}

impl FnAttrs {
    /// Attribute spellings in a fixed order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        [
            (FnAttrs::NO_SIDE_EFFECTS, "readnone"),
            (FnAttrs::NO_UNWIND, "nounwind"),
            (FnAttrs::NOALIAS_RETURN, "noalias"),
        ]
        .into_iter()
        .filter(move |(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
    }
}

/// A symbol requested with a signature other than the one it already has.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolConflict {
    pub name: String,
    pub existing: String,
    pub requested: String,
}

/// `ret (params, ...)` in printer syntax.
fn signature_text(params: &[IrType], ret: IrType, variadic: bool) -> String {
    let mut parts: Vec<String> = params.iter().map(ToString::to_string).collect();
    if variadic {
        parts.push("...".to_owned());
    }
    format!("{ret} ({})", parts.join(", "))
}

/// Call argument list; most calls have at most four operands.
pub type Args = SmallVec<[ValueId; 4]>;

/// An instruction producing (at most) one value.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Const(Const),
    /// The n-th function parameter.
    Param(u32),
    Binary {
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    FNeg(ValueId),
    ICmp {
        pred: IntPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    FCmp {
        pred: FloatPredicate,
        lhs: ValueId,
        rhs: ValueId,
    },
    Cast {
        op: CastOp,
        value: ValueId,
    },
    /// Stack slot of the given type; always placed in the entry block.
    Alloca(IrType),
    Load {
        ptr: ValueId,
    },
    Store {
        value: ValueId,
        ptr: ValueId,
    },
    /// Address of field `index` of the struct at `base`.
    FieldPtr {
        base: ValueId,
        struct_ty: StructId,
        index: u32,
    },
    /// Address of element `index` in a contiguous `elem_ty` buffer.
    ElementPtr {
        base: ValueId,
        elem_ty: IrType,
        index: ValueId,
    },
    GlobalAddr(GlobalId),
    Call {
        callee: FunctionId,
        args: Args,
        attrs: FnAttrs,
    },
    Phi {
        incoming: SmallVec<[(ValueId, BlockId); 2]>,
    },
    Select {
        cond: ValueId,
        then_value: ValueId,
        else_value: ValueId,
    },
}

/// Block terminators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminator {
    Ret(Option<ValueId>),
    Br(BlockId),
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Unreachable,
}

/// Value metadata: the defining instruction and its result type.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueData {
    pub op: Op,
    pub ty: IrType,
}

/// A basic block.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub label: String,
    pub insts: Vec<ValueId>,
    pub terminator: Option<Terminator>,
}

/// Linkage of a function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Linkage {
    /// Defined here, visible only inside the module.
    Internal,
    /// Defined here and listed in the module's exports.
    Export,
    /// Declared here, defined by the runtime or another module.
    External,
}

/// A function definition or declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: String,
    pub params: Vec<IrType>,
    pub ret: IrType,
    pub attrs: FnAttrs,
    pub linkage: Linkage,
    /// Accepts extra trailing arguments (C varargs).
    pub variadic: bool,
    pub values: Vec<ValueData>,
    pub blocks: Vec<Block>,
    /// Number of allocas at the head of the entry block.
    entry_allocas: usize,
}

impl Function {
    fn new(name: String, params: Vec<IrType>, ret: IrType, linkage: Linkage) -> Self {
        let values = params
            .iter()
            .enumerate()
            .map(|(i, &ty)| ValueData {
                op: Op::Param(u32::try_from(i).unwrap_or(u32::MAX)),
                ty,
            })
            .collect();
        Function {
            name,
            params,
            ret,
            attrs: FnAttrs::empty(),
            linkage,
            variadic: false,
            values,
            blocks: Vec::new(),
            entry_allocas: 0,
        }
    }

    /// The value of parameter `index`.
    pub fn param(&self, index: usize) -> ValueId {
        ValueId::from_index(index)
    }

    pub fn is_declaration(&self) -> bool {
        self.linkage == Linkage::External
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.index()]
    }

    pub fn value_type(&self, id: ValueId) -> IrType {
        self.values[id.index()].ty
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId::from_index)
    }

    /// Iterate over every instruction in block order.
    pub fn instructions(&self) -> impl Iterator<Item = (ValueId, &ValueData)> {
        self.blocks
            .iter()
            .flat_map(|b| b.insts.iter())
            .map(|&v| (v, self.value(v)))
    }

    /// Every call instruction with its callee and arguments.
    pub fn calls(&self) -> impl Iterator<Item = (FunctionId, &Args, FnAttrs)> {
        self.instructions().filter_map(|(_, data)| match &data.op {
            Op::Call {
                callee,
                args,
                attrs,
            } => Some((*callee, args, *attrs)),
            _ => None,
        })
    }
}

/// A named struct layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<IrType>,
}

impl StructDef {
    /// Byte offset of each field under natural alignment.
    pub fn offsets(&self) -> Vec<u64> {
        let mut offset = 0;
        self.fields
            .iter()
            .map(|ty| {
                offset = align_to(offset, ty.align());
                let here = offset;
                offset += ty.size();
                here
            })
            .collect()
    }

    /// Total size (padded to alignment) and alignment.
    pub fn size_align(&self) -> (u64, u64) {
        let align = self.fields.iter().map(|t| t.align()).max().unwrap_or(1);
        let end = match (self.offsets().last(), self.fields.last()) {
            (Some(&offset), Some(ty)) => offset + ty.size(),
            _ => 0,
        };
        (align_to(end, align), align)
    }
}

fn align_to(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align) * align
}

/// A global constant array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Global {
    pub name: String,
    pub elem_ty: IrType,
    pub data: Vec<Const>,
}

/// A compiled module.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Module {
    pub name: String,
    functions: Vec<Function>,
    symbols: FxHashMap<String, FunctionId>,
    structs: Vec<StructDef>,
    globals: Vec<Global>,
    exports: Vec<(String, FunctionId)>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a function definition shell. Blocks are appended by the builder.
    pub fn define_function(
        &mut self,
        name: String,
        params: Vec<IrType>,
        ret: IrType,
        linkage: Linkage,
    ) -> FunctionId {
        let id = FunctionId::from_index(self.functions.len());
        self.symbols.insert(name.clone(), id);
        self.functions.push(Function::new(name, params, ret, linkage));
        id
    }

    /// Declare an external function, or return the existing declaration of
    /// `name`.
    ///
    /// Attributes of the first declaration win. A symbol already bound to a
    /// definition or to a different signature is a conflict.
    pub fn declare_external(
        &mut self,
        name: &str,
        params: &[IrType],
        ret: IrType,
        attrs: FnAttrs,
        variadic: bool,
    ) -> Result<FunctionId, SymbolConflict> {
        if let Some(&id) = self.symbols.get(name) {
            let existing = &self.functions[id.index()];
            if existing.is_declaration()
                && existing.params == params
                && existing.ret == ret
                && existing.variadic == variadic
            {
                return Ok(id);
            }
            return Err(SymbolConflict {
                name: name.to_owned(),
                existing: signature_text(&existing.params, existing.ret, existing.variadic),
                requested: signature_text(params, ret, variadic),
            });
        }
        let id = self.define_function(name.to_owned(), params.to_vec(), ret, Linkage::External);
        let func = &mut self.functions[id.index()];
        func.attrs = attrs;
        func.variadic = variadic;
        Ok(id)
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    pub fn lookup(&self, name: &str) -> Option<FunctionId> {
        self.symbols.get(name).copied()
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId::from_index(i), f))
    }

    /// Functions with bodies.
    pub fn definitions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions().filter(|(_, f)| !f.is_declaration())
    }

    pub fn add_struct(&mut self, name: impl Into<String>, fields: Vec<IrType>) -> StructId {
        let id = StructId::from_index(self.structs.len());
        self.structs.push(StructDef {
            name: name.into(),
            fields,
        });
        id
    }

    pub fn struct_def(&self, id: StructId) -> &StructDef {
        &self.structs[id.index()]
    }

    pub fn structs(&self) -> &[StructDef] {
        &self.structs
    }

    pub fn add_global(&mut self, name: impl Into<String>, elem_ty: IrType, data: Vec<Const>) -> GlobalId {
        let id = GlobalId::from_index(self.globals.len());
        self.globals.push(Global {
            name: name.into(),
            elem_ty,
            data,
        });
        id
    }

    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn globals(&self) -> &[Global] {
        &self.globals
    }

    /// Record `func` as exported under `name` and give it export linkage.
    pub fn export(&mut self, name: impl Into<String>, func: FunctionId) {
        self.functions[func.index()].linkage = Linkage::Export;
        self.exports.push((name.into(), func));
    }

    pub fn exports(&self) -> &[(String, FunctionId)] {
        &self.exports
    }

    /// The exported function named `name`.
    pub fn export_named(&self, name: &str) -> Option<FunctionId> {
        self.exports
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, id)| id)
    }
}

#[cfg(test)]
mod tests;
