//! Statements.
//!
//! Statements yield the unit value. After a terminator (`return`,
//! `break`, `continue`) the remaining statements of a block go into a fresh
//! block with no predecessors, so every instruction has a home.

use brisk_ir::{Node, NodeKind, SyntaxKind, TypeId};

use super::operators::condition;
use super::{payload_mismatch, NodeGenerator};
use crate::context::{CodegenCx, LoopTarget};
use crate::error::{CodegenError, CodegenResult};
use crate::ir::{BlockId, Const};
use crate::value::Value;

/// Branch to `target` unless the current block already ends.
fn branch_if_open(cx: &mut CodegenCx<'_, '_>, target: BlockId) {
    if !cx.is_terminated() {
        cx.builder().br(target);
    }
}

/// `let`/`var`/`const`.
///
/// `const` with an initializer binds the SSA value directly; everything
/// else gets a stack slot. Uninitialized slots hold zero, or null for
/// pointer types.
pub struct VariableDeclaration;

impl NodeGenerator for VariableDeclaration {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::VariableDeclaration {
            name,
            init,
            mutable,
        } = node.kind
        else {
            return Err(payload_mismatch(SyntaxKind::VariableDeclaration, node));
        };
        let ty = cx.node_type(node);
        match init {
            Some(init) if !mutable => {
                let value = cx.generate_operand(init, ty)?;
                cx.scope.bind_immutable(name, value, ty);
            }
            Some(init) => {
                let value = cx.generate_operand(init, ty)?;
                cx.bind_local(name, value, ty, node.span)?;
            }
            None => {
                let ir_ty = cx.layout(ty, node.span)?;
                let Some(zero) = Const::zero(ir_ty) else {
                    return Err(CodegenError::unsupported_operation(
                        "variable of type",
                        cx.display_type(ty),
                        node.span,
                    ));
                };
                let value = cx.const_value(zero);
                cx.bind_local(name, value, ty, node.span)?;
            }
        }
        Ok(Value::unit())
    }
}

pub struct ExpressionStatement;

impl NodeGenerator for ExpressionStatement {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::ExpressionStatement(expr) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::ExpressionStatement, node));
        };
        cx.generate(expr)?;
        Ok(Value::unit())
    }
}

/// `{ ... }` with its own lexical scope.
pub struct Block;

impl NodeGenerator for Block {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Block(statements) = &node.kind else {
            return Err(payload_mismatch(SyntaxKind::Block, node));
        };
        let outer = cx.scope.child();
        for &statement in statements {
            if cx.is_terminated() {
                let dead = cx.append_block("dead");
                cx.position_at(dead);
            }
            cx.generate(statement)?;
        }
        cx.scope = outer;
        Ok(Value::unit())
    }
}

pub struct If;

impl NodeGenerator for If {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::If {
            cond,
            then_branch,
            else_branch,
        } = node.kind
        else {
            return Err(payload_mismatch(SyntaxKind::If, node));
        };
        let cond = condition(cx, cond)?;
        let then_block = cx.append_block("if.then");
        let else_block = else_branch.map(|_| cx.append_block("if.else"));
        let merge = cx.append_block("if.end");
        cx.builder()
            .cond_br(cond, then_block, else_block.unwrap_or(merge));

        cx.position_at(then_block);
        cx.generate(then_branch)?;
        branch_if_open(cx, merge);

        if let (Some(else_branch), Some(else_block)) = (else_branch, else_block) {
            cx.position_at(else_block);
            cx.generate(else_branch)?;
            branch_if_open(cx, merge);
        }

        cx.position_at(merge);
        Ok(Value::unit())
    }
}

pub struct While;

impl NodeGenerator for While {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::While { cond, body } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::While, node));
        };
        let header = cx.append_block("while.cond");
        let body_block = cx.append_block("while.body");
        let exit = cx.append_block("while.end");
        cx.builder().br(header);

        cx.position_at(header);
        let cond = condition(cx, cond)?;
        cx.builder().cond_br(cond, body_block, exit);

        cx.position_at(body_block);
        cx.push_loop(LoopTarget {
            break_to: exit,
            continue_to: header,
        });
        cx.generate(body)?;
        cx.pop_loop();
        branch_if_open(cx, header);

        cx.position_at(exit);
        Ok(Value::unit())
    }
}

pub struct DoWhile;

impl NodeGenerator for DoWhile {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::DoWhile { body, cond } = node.kind else {
            return Err(payload_mismatch(SyntaxKind::DoWhile, node));
        };
        let body_block = cx.append_block("do.body");
        let latch = cx.append_block("do.cond");
        let exit = cx.append_block("do.end");
        cx.builder().br(body_block);

        cx.position_at(body_block);
        cx.push_loop(LoopTarget {
            break_to: exit,
            continue_to: latch,
        });
        cx.generate(body)?;
        cx.pop_loop();
        branch_if_open(cx, latch);

        cx.position_at(latch);
        let cond = condition(cx, cond)?;
        cx.builder().cond_br(cond, body_block, exit);

        cx.position_at(exit);
        Ok(Value::unit())
    }
}

/// `for (init; cond; update) body`; `init` bindings are scoped to the loop.
pub struct For;

impl NodeGenerator for For {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::For {
            init,
            cond,
            update,
            body,
        } = node.kind
        else {
            return Err(payload_mismatch(SyntaxKind::For, node));
        };
        let outer = cx.scope.child();
        if let Some(init) = init {
            cx.generate(init)?;
        }

        let header = cx.append_block("for.cond");
        let body_block = cx.append_block("for.body");
        let step = cx.append_block("for.update");
        let exit = cx.append_block("for.end");
        cx.builder().br(header);

        cx.position_at(header);
        match cond {
            Some(cond) => {
                let cond = condition(cx, cond)?;
                cx.builder().cond_br(cond, body_block, exit);
            }
            None => cx.builder().br(body_block),
        }

        cx.position_at(body_block);
        cx.push_loop(LoopTarget {
            break_to: exit,
            continue_to: step,
        });
        cx.generate(body)?;
        cx.pop_loop();
        branch_if_open(cx, step);

        cx.position_at(step);
        if let Some(update) = update {
            cx.generate(update)?;
        }
        cx.builder().br(header);

        cx.position_at(exit);
        cx.scope = outer;
        Ok(Value::unit())
    }
}

pub struct Return;

impl NodeGenerator for Return {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let NodeKind::Return(value) = node.kind else {
            return Err(payload_mismatch(SyntaxKind::Return, node));
        };
        let return_ty = cx.return_ty();
        match (value, return_ty == TypeId::VOID) {
            (Some(value), false) => {
                let operand = cx.generate_operand(value, return_ty)?;
                cx.builder().ret(operand);
            }
            (Some(value), true) => {
                cx.generate(value)?;
                cx.builder().ret_void();
            }
            (None, true) => cx.builder().ret_void(),
            (None, false) => {
                return Err(CodegenError::internal(
                    format!(
                        "`return` without a value in a function returning `{}`",
                        cx.display_type(return_ty)
                    ),
                    node.span,
                ))
            }
        }
        Ok(Value::unit())
    }
}

pub struct Break;

impl NodeGenerator for Break {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let Some(target) = cx.innermost_loop() else {
            return Err(CodegenError::internal("`break` outside of a loop", node.span));
        };
        cx.builder().br(target.break_to);
        Ok(Value::unit())
    }
}

pub struct Continue;

impl NodeGenerator for Continue {
    fn generate<'a>(&self, cx: &mut CodegenCx<'a, '_>, node: &'a Node) -> CodegenResult<Value> {
        let Some(target) = cx.innermost_loop() else {
            return Err(CodegenError::internal(
                "`continue` outside of a loop",
                node.span,
            ));
        };
        cx.builder().br(target.continue_to);
        Ok(Value::unit())
    }
}

pub struct Empty;

impl NodeGenerator for Empty {
    fn generate<'a>(&self, _cx: &mut CodegenCx<'a, '_>, _node: &'a Node) -> CodegenResult<Value> {
        Ok(Value::unit())
    }
}
