// transforms/collapse.rs
//! Statement-level simplification after inlining.
//!
//! - `if` / `else if` with a computable condition becomes the statements of
//!   the taken branch, collapsed in turn (inside a block when the branch
//!   declares names); the other branches are dropped without being evaluated
//! - a `for` whose condition is false for its initial iterator value becomes
//!   its initializer
//! - assigned values that compute are replaced by literals
//!
//! Heap allocation, construction and index assignment have no collapse rule
//! and are reported.

use brim_identity::Span;
use brim_syntax::ast::*;

use super::literal_expr;
use crate::consteval::{BoundEnv, ComputeEnv, try_compute};
use crate::diagnostics::{SemaResult, sema_err};

pub fn collapse(stmts: Vec<Stmt>, env: &mut dyn ComputeEnv, ids: &mut NodeIdGen) -> SemaResult<Vec<Stmt>> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        collapse_stmt(stmt, env, ids, &mut out)?;
    }
    Ok(out)
}

fn collapse_block(block: Block, env: &mut dyn ComputeEnv, ids: &mut NodeIdGen) -> SemaResult<Block> {
    Ok(Block {
        stmts: collapse(block.stmts, env, ids)?,
        span: block.span,
    })
}

fn collapse_stmt(stmt: Stmt, env: &mut dyn ComputeEnv, ids: &mut NodeIdGen, out: &mut Vec<Stmt>) -> SemaResult<()> {
    match stmt {
        Stmt::If(if_stmt) => collapse_if(if_stmt, env, ids, out)?,
        Stmt::For(for_stmt) => {
            if loop_never_runs(&for_stmt, env) {
                tracing::trace!(node = %for_stmt.id, "dead loop replaced by its initializer");
                if let Some(init) = for_stmt.init {
                    collapse_stmt(*init, env, ids, out)?;
                }
            } else {
                out.push(Stmt::For(ForStmt {
                    body: collapse_block(for_stmt.body, env, ids)?,
                    ..for_stmt
                }));
            }
        }
        Stmt::While(w) => out.push(Stmt::While(WhileStmt {
            body: collapse_block(w.body, env, ids)?,
            ..w
        })),
        Stmt::Block(b) => out.push(Stmt::Block(collapse_block(b, env, ids)?)),
        Stmt::Assign(assign) => {
            if matches!(assign.target.ungrouped().kind, ExprKind::Index(_)) {
                return Err(sema_err!(assign.span, CollapseNotImplemented {
                    what: "index assignment".to_string(),
                }));
            }
            reject_construction(&assign.value)?;
            let value = match try_compute(&assign.value, None, env, None) {
                Some(item) => literal_expr(item, ids, assign.value.span),
                None => assign.value,
            };
            out.push(Stmt::Assign(AssignStmt { value, ..assign }));
        }
        Stmt::Var(v) => {
            if let Some(init) = &v.init {
                reject_construction(init)?;
            }
            out.push(Stmt::Var(v));
        }
        Stmt::Expr(e) => {
            reject_construction(&e.expr)?;
            out.push(Stmt::Expr(e));
        }
        Stmt::Return(r) => {
            if let Some(value) = &r.value {
                reject_construction(value)?;
            }
            out.push(Stmt::Return(r));
        }
        other @ (Stmt::Const(_) | Stmt::Break(_) | Stmt::Continue(_)) => out.push(other),
    }
    Ok(())
}

fn collapse_if(if_stmt: IfStmt, env: &mut dyn ComputeEnv, ids: &mut NodeIdGen, out: &mut Vec<Stmt>) -> SemaResult<()> {
    let decided = try_compute(&if_stmt.condition, None, env, None).and_then(|v| v.truthy());
    match decided {
        Some(true) => splice_branch(if_stmt.then_branch, env, ids, out)?,
        Some(false) => match if_stmt.else_branch {
            Some(ElseBranch::Block(b)) => splice_branch(b, env, ids, out)?,
            Some(ElseBranch::If(nested)) => collapse_if(*nested, env, ids, out)?,
            None => {}
        },
        None => {
            let then_branch = collapse_block(if_stmt.then_branch, env, ids)?;
            let else_branch = match if_stmt.else_branch {
                Some(ElseBranch::Block(b)) => Some(ElseBranch::Block(collapse_block(b, env, ids)?)),
                Some(ElseBranch::If(nested)) => {
                    let span = nested.span;
                    let mut folded = Vec::new();
                    collapse_if(*nested, env, ids, &mut folded)?;
                    match folded.len() {
                        0 => None,
                        1 if matches!(folded[0], Stmt::If(_)) => match folded.remove(0) {
                            Stmt::If(kept) => Some(ElseBranch::If(Box::new(kept))),
                            _ => None,
                        },
                        _ => Some(ElseBranch::Block(Block { stmts: folded, span })),
                    }
                }
                None => None,
            };
            out.push(Stmt::If(IfStmt {
                then_branch,
                else_branch,
                ..if_stmt
            }));
        }
    }
    Ok(())
}

/// Statements of a taken branch. A branch that declares names keeps its own
/// block so those names stay scoped to it.
fn splice_branch(branch: Block, env: &mut dyn ComputeEnv, ids: &mut NodeIdGen, out: &mut Vec<Stmt>) -> SemaResult<()> {
    let stmts = collapse(branch.stmts, env, ids)?;
    if stmts.iter().any(|s| matches!(s, Stmt::Var(_) | Stmt::Const(_))) {
        out.push(Stmt::Block(Block {
            stmts,
            span: branch.span,
        }));
    } else {
        out.extend(stmts);
    }
    Ok(())
}

/// Condition is false with the initializer's value bound.
fn loop_never_runs(for_stmt: &ForStmt, env: &mut dyn ComputeEnv) -> bool {
    let (Some(init), Some(condition)) = (&for_stmt.init, &for_stmt.condition) else {
        return false;
    };
    let (name, value) = match init.as_ref() {
        Stmt::Var(VarStmt {
            name, init: Some(e), ..
        }) => (*name, e),
        Stmt::Assign(a) => match a.target.ungrouped().kind {
            ExprKind::Identifier(name) => (name, &a.value),
            _ => return false,
        },
        _ => return false,
    };
    let Some(start) = try_compute(value, None, env, None) else {
        return false;
    };
    let mut bound = BoundEnv::new(env);
    bound.bind(name, start);
    try_compute(condition, None, &mut bound, None).and_then(|v| v.truthy()) == Some(false)
}

fn reject_construction(expr: &Expr) -> SemaResult<()> {
    match find_construction(expr) {
        Some((what, span)) => Err(sema_err!(span, CollapseNotImplemented {
            what: what.to_string(),
        })),
        None => Ok(()),
    }
}

fn find_construction(expr: &Expr) -> Option<(&'static str, Span)> {
    match &expr.kind {
        ExprKind::New(_) => Some(("new", expr.span)),
        ExprKind::Construct(_) => Some(("constructor call", expr.span)),
        ExprKind::Binary(bin) => find_construction(&bin.left).or_else(|| find_construction(&bin.right)),
        ExprKind::Unary(un) => find_construction(&un.operand),
        ExprKind::Call(call) => call.args.iter().find_map(|a| find_construction(&a.value)),
        ExprKind::MethodCall(mc) => find_construction(&mc.object)
            .or_else(|| mc.args.iter().find_map(|a| find_construction(&a.value))),
        ExprKind::Field(f) => find_construction(&f.object),
        ExprKind::Index(idx) => find_construction(&idx.object).or_else(|| find_construction(&idx.index)),
        ExprKind::Cast(c) => find_construction(&c.value),
        ExprKind::AddressOf(inner) | ExprKind::Deref(inner) | ExprKind::Grouping(inner) => find_construction(inner),
        ExprKind::Keyword(kw) => find_construction(&kw.operand),
        ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::CharLiteral(_)
        | ExprKind::BoolLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::Identifier(_) => None,
    }
}
