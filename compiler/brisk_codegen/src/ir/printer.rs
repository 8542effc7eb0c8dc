//! Textual rendering of a [`Module`].
//!
//! The output is LLVM-flavored and fully determined by the module contents:
//! functions, structs, and globals print in creation order and values print
//! by id.

use std::fmt::{self, Write};

use super::{Const, Function, IrType, Linkage, Module, Op, Terminator, ValueId};

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Const::Int { ty, value } => write!(f, "{ty} {value}"),
            Const::Float(bits) => write!(f, "double {:?}", f64::from_bits(bits)),
            Const::Null => f.write_str("ptr null"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module '{}'", self.name)?;

        for def in self.structs() {
            let fields: Vec<String> = def.fields.iter().map(ToString::to_string).collect();
            writeln!(f, "%{} = type {{ {} }}", def.name, fields.join(", "))?;
        }

        for global in self.globals() {
            let data: Vec<String> = global.data.iter().map(ToString::to_string).collect();
            writeln!(
                f,
                "@{} = private constant [{} x {}] [{}]",
                global.name,
                global.data.len(),
                global.elem_ty,
                data.join(", ")
            )?;
        }

        for (_, func) in self.functions() {
            writeln!(f)?;
            write_function(f, self, func)?;
        }

        if !self.exports().is_empty() {
            writeln!(f)?;
        }
        for (name, id) in self.exports() {
            writeln!(f, "; export {name} = @{}", self.function(*id).name)?;
        }
        Ok(())
    }
}

fn write_attrs(out: &mut impl Write, attrs: super::FnAttrs) -> fmt::Result {
    let names: Vec<&str> = attrs.names().collect();
    if !names.is_empty() {
        write!(out, " #[{}]", names.join(" "))?;
    }
    Ok(())
}

fn write_function(f: &mut fmt::Formatter<'_>, module: &Module, func: &Function) -> fmt::Result {
    if func.is_declaration() {
        let mut params: Vec<String> = func.params.iter().map(ToString::to_string).collect();
        if func.variadic {
            params.push("...".to_owned());
        }
        write!(f, "declare {} @{}({})", func.ret, func.name, params.join(", "))?;
        write_attrs(f, func.attrs)?;
        return writeln!(f);
    }

    let linkage = match func.linkage {
        Linkage::Internal => "internal ",
        Linkage::Export | Linkage::External => "",
    };
    let params: Vec<String> = func
        .params
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{ty} {:?}", func.param(i)))
        .collect();
    write!(
        f,
        "define {linkage}{} @{}({})",
        func.ret,
        func.name,
        params.join(", ")
    )?;
    write_attrs(f, func.attrs)?;
    writeln!(f, " {{")?;

    for block_id in func.block_ids() {
        let block = func.block(block_id);
        writeln!(f, "{}:", block.label)?;
        for &value in &block.insts {
            f.write_str("  ")?;
            write_inst(f, module, func, value)?;
            writeln!(f)?;
        }
        f.write_str("  ")?;
        match &block.terminator {
            Some(term) => write_terminator(f, func, term)?,
            None => f.write_str("; missing terminator")?,
        }
        writeln!(f)?;
    }
    writeln!(f, "}}")
}

/// `<type> <value>` operand syntax.
fn operand(func: &Function, value: ValueId) -> String {
    format!("{} {value:?}", func.value_type(value))
}

fn write_inst(
    f: &mut fmt::Formatter<'_>,
    module: &Module,
    func: &Function,
    value: ValueId,
) -> fmt::Result {
    let data = func.value(value);
    if data.ty != IrType::Void {
        write!(f, "{value:?} = ")?;
    }
    match &data.op {
        Op::Const(c) => write!(f, "const {c}"),
        Op::Param(i) => write!(f, "param {i}"),
        Op::Binary { op, lhs, rhs } => write!(
            f,
            "{} {}, {rhs:?}",
            op.mnemonic(),
            operand(func, *lhs)
        ),
        Op::FNeg(v) => write!(f, "fneg {}", operand(func, *v)),
        Op::ICmp { pred, lhs, rhs } => write!(
            f,
            "icmp {} {}, {rhs:?}",
            pred.mnemonic(),
            operand(func, *lhs)
        ),
        Op::FCmp { pred, lhs, rhs } => write!(
            f,
            "fcmp {} {}, {rhs:?}",
            pred.mnemonic(),
            operand(func, *lhs)
        ),
        Op::Cast { op, value: v } => write!(
            f,
            "{} {} to {}",
            op.mnemonic(),
            operand(func, *v),
            data.ty
        ),
        Op::Alloca(ty) => write!(f, "alloca {ty}"),
        Op::Load { ptr } => write!(f, "load {}, ptr {ptr:?}", data.ty),
        Op::Store { value: v, ptr } => write!(f, "store {}, ptr {ptr:?}", operand(func, *v)),
        Op::FieldPtr {
            base,
            struct_ty,
            index,
        } => write!(
            f,
            "getelementptr %{}, ptr {base:?}, i32 0, i32 {index}",
            module.struct_def(*struct_ty).name
        ),
        Op::ElementPtr {
            base,
            elem_ty,
            index,
        } => write!(
            f,
            "getelementptr {elem_ty}, ptr {base:?}, {}",
            operand(func, *index)
        ),
        Op::GlobalAddr(global) => write!(f, "globaladdr @{}", module.global(*global).name),
        Op::Call {
            callee,
            args,
            attrs,
        } => {
            let args: Vec<String> = args.iter().map(|&a| operand(func, a)).collect();
            write!(
                f,
                "call {} @{}({})",
                data.ty,
                module.function(*callee).name,
                args.join(", ")
            )?;
            write_attrs(f, *attrs)
        }
        Op::Phi { incoming } => {
            let arms: Vec<String> = incoming
                .iter()
                .map(|(v, b)| format!("[ {v:?}, %{} ]", func.block(*b).label))
                .collect();
            write!(f, "phi {} {}", data.ty, arms.join(", "))
        }
        Op::Select {
            cond,
            then_value,
            else_value,
        } => write!(
            f,
            "select i1 {cond:?}, {}, {}",
            operand(func, *then_value),
            operand(func, *else_value)
        ),
    }
}

fn write_terminator(f: &mut fmt::Formatter<'_>, func: &Function, term: &Terminator) -> fmt::Result {
    match term {
        Terminator::Ret(Some(v)) => write!(f, "ret {}", operand(func, *v)),
        Terminator::Ret(None) => f.write_str("ret void"),
        Terminator::Br(target) => write!(f, "br label %{}", func.block(*target).label),
        Terminator::CondBr {
            cond,
            then_block,
            else_block,
        } => write!(
            f,
            "br i1 {cond:?}, label %{}, label %{}",
            func.block(*then_block).label,
            func.block(*else_block).label
        ),
        Terminator::Unreachable => f.write_str("unreachable"),
    }
}
