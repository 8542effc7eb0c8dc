//! Instruction builder over one function.
//!
//! `IrBuilder` borrows a [`Function`] and an insertion block. It is
//! short-lived: the code generation context creates one per emission step
//! and keeps the current block itself.

use smallvec::SmallVec;

use super::{
    Args, BinOp, Block, BlockId, CastOp, Const, FloatPredicate, FnAttrs, Function, FunctionId,
    GlobalId, IntPredicate, IrType, Op, StructId, Terminator, ValueData, ValueId,
};

/// Appends instructions to a block of one function.
pub struct IrBuilder<'f> {
    func: &'f mut Function,
    block: BlockId,
}

impl<'f> IrBuilder<'f> {
    pub fn new(func: &'f mut Function, block: BlockId) -> Self {
        Self { func, block }
    }

    /// Append a new empty block to `func`.
    pub fn append_block(func: &mut Function, label: &str) -> BlockId {
        let id = BlockId::from_index(func.blocks.len());
        func.blocks.push(Block {
            label: format!("{label}{}", id.raw()),
            ..Block::default()
        });
        id
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn value_type(&self, value: ValueId) -> IrType {
        self.func.value_type(value)
    }

    /// True if the insertion block already ends in a terminator.
    pub fn is_terminated(&self) -> bool {
        self.func.blocks[self.block.index()].terminator.is_some()
    }

    fn push(&mut self, op: Op, ty: IrType) -> ValueId {
        let id = ValueId::from_index(self.func.values.len());
        self.func.values.push(ValueData { op, ty });
        debug_assert!(
            !self.is_terminated(),
            "instruction appended after terminator in {}",
            self.func.name
        );
        self.func.blocks[self.block.index()].insts.push(id);
        id
    }

    // -- Constants --

    pub fn const_value(&mut self, value: Const) -> ValueId {
        self.push(Op::Const(value), value.ty())
    }

    pub fn const_i32(&mut self, value: i32) -> ValueId {
        self.const_value(Const::i32(value))
    }

    pub fn const_i64(&mut self, value: i64) -> ValueId {
        self.const_value(Const::i64(value))
    }

    pub fn const_f64(&mut self, value: f64) -> ValueId {
        self.const_value(Const::f64(value))
    }

    pub fn const_bool(&mut self, value: bool) -> ValueId {
        self.const_value(Const::bool(value))
    }

    pub fn const_null(&mut self) -> ValueId {
        self.const_value(Const::Null)
    }

    // -- Arithmetic --

    pub fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.value_type(lhs);
        self.push(Op::Binary { op, lhs, rhs }, ty)
    }

    pub fn fneg(&mut self, value: ValueId) -> ValueId {
        self.push(Op::FNeg(value), IrType::F64)
    }

    pub fn icmp(&mut self, pred: IntPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push(Op::ICmp { pred, lhs, rhs }, IrType::I1)
    }

    pub fn fcmp(&mut self, pred: FloatPredicate, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.push(Op::FCmp { pred, lhs, rhs }, IrType::I1)
    }

    pub fn cast(&mut self, op: CastOp, value: ValueId, to: IrType) -> ValueId {
        self.push(Op::Cast { op, value }, to)
    }

    pub fn select(&mut self, cond: ValueId, then_value: ValueId, else_value: ValueId) -> ValueId {
        let ty = self.value_type(then_value);
        self.push(
            Op::Select {
                cond,
                then_value,
                else_value,
            },
            ty,
        )
    }

    // -- Memory --

    /// Stack slot in the entry block, ahead of every non-alloca instruction.
    pub fn alloca(&mut self, ty: IrType) -> ValueId {
        let id = ValueId::from_index(self.func.values.len());
        self.func.values.push(ValueData {
            op: Op::Alloca(ty),
            ty: IrType::Ptr,
        });
        let at = self.func.entry_allocas;
        self.func.blocks[0].insts.insert(at, id);
        self.func.entry_allocas += 1;
        id
    }

    pub fn load(&mut self, ty: IrType, ptr: ValueId) -> ValueId {
        self.push(Op::Load { ptr }, ty)
    }

    pub fn store(&mut self, value: ValueId, ptr: ValueId) {
        self.push(Op::Store { value, ptr }, IrType::Void);
    }

    pub fn field_ptr(&mut self, base: ValueId, struct_ty: StructId, index: u32) -> ValueId {
        self.push(
            Op::FieldPtr {
                base,
                struct_ty,
                index,
            },
            IrType::Ptr,
        )
    }

    pub fn element_ptr(&mut self, base: ValueId, elem_ty: IrType, index: ValueId) -> ValueId {
        self.push(
            Op::ElementPtr {
                base,
                elem_ty,
                index,
            },
            IrType::Ptr,
        )
    }

    pub fn global_addr(&mut self, global: GlobalId) -> ValueId {
        self.push(Op::GlobalAddr(global), IrType::Ptr)
    }

    // -- Calls --

    /// Call `callee`, whose return type is `ret`. `void` calls still get an
    /// id so call sites can be inspected.
    pub fn call(&mut self, callee: FunctionId, ret: IrType, args: &[ValueId], attrs: FnAttrs) -> ValueId {
        self.push(
            Op::Call {
                callee,
                args: Args::from_slice(args),
                attrs,
            },
            ret,
        )
    }

    pub fn phi(&mut self, ty: IrType, incoming: &[(ValueId, BlockId)]) -> ValueId {
        self.push(
            Op::Phi {
                incoming: SmallVec::from_slice(incoming),
            },
            ty,
        )
    }

    // -- Terminators --

    fn terminate(&mut self, term: Terminator) {
        let block = &mut self.func.blocks[self.block.index()];
        debug_assert!(block.terminator.is_none(), "block terminated twice");
        block.terminator = Some(term);
    }

    pub fn ret(&mut self, value: ValueId) {
        self.terminate(Terminator::Ret(Some(value)));
    }

    pub fn ret_void(&mut self) {
        self.terminate(Terminator::Ret(None));
    }

    pub fn br(&mut self, target: BlockId) {
        self.terminate(Terminator::Br(target));
    }

    pub fn cond_br(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }
}
