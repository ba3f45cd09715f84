// transforms/unroll.rs
//! Compile-time loop unrolling.
//!
//! A `for` loop is unrollable when its iterator starts at a computable value,
//! is only updated by the loop header (`i = expr`), and the condition and
//! update compute with the iterator bound. Unrolling materialises one block
//! per iteration with the iterator replaced by its literal value.

use brim_identity::{Span, Symbol};
use brim_syntax::ast::*;

use super::literal_expr;
use super::substitute::Substitution;
use crate::consteval::{BoundEnv, ComputeEnv, try_compute};
use crate::data_item::DataItem;
use crate::diagnostics::{SemaResult, internal_err, sema_err};

struct LoopShape<'a> {
    iterator: Symbol,
    start: DataItem,
    condition: &'a Expr,
    update: &'a Expr,
}

fn loop_shape<'a>(for_stmt: &'a ForStmt, env: &mut dyn ComputeEnv) -> Option<LoopShape<'a>> {
    let (iterator, init) = match for_stmt.init.as_deref()? {
        Stmt::Var(VarStmt {
            name, init: Some(e), ..
        }) => (*name, e),
        Stmt::Assign(a) => (assigned_name(a)?, &a.value),
        _ => return None,
    };
    let update = match for_stmt.update.as_deref()? {
        Stmt::Assign(a) if assigned_name(a) == Some(iterator) => &a.value,
        _ => return None,
    };
    Some(LoopShape {
        iterator,
        start: try_compute(init, None, env, None)?,
        condition: for_stmt.condition.as_ref()?,
        update,
    })
}

fn assigned_name(a: &AssignStmt) -> Option<Symbol> {
    match a.target.ungrouped().kind {
        ExprKind::Identifier(name) => Some(name),
        _ => None,
    }
}

pub fn is_unrollable(for_stmt: &ForStmt, env: &mut dyn ComputeEnv) -> bool {
    let Some(shape) = loop_shape(for_stmt, env) else {
        return false;
    };
    if assigns(&for_stmt.body.stmts, shape.iterator) || jumps_out(&for_stmt.body.stmts) {
        return false;
    }
    let mut bound = BoundEnv::new(env);
    bound.bind(shape.iterator, shape.start);
    try_compute(shape.condition, None, &mut bound, None)
        .and_then(|v| v.truthy())
        .is_some()
        && try_compute(shape.update, None, &mut bound, None).is_some()
}

/// One block per iteration, in order. More than `max_iterations` iterations
/// is a fatal error.
pub fn unroll(
    for_stmt: &ForStmt,
    env: &mut dyn ComputeEnv,
    ids: &mut NodeIdGen,
    max_iterations: usize,
    span: Span,
) -> SemaResult<Vec<Block>> {
    let values = iteration_values(for_stmt, env, max_iterations, span)?;
    Ok(unrolled_blocks(for_stmt, &values, ids, span))
}

/// The iterator's value on entry to each iteration.
pub fn iteration_values(
    for_stmt: &ForStmt,
    env: &mut dyn ComputeEnv,
    max_iterations: usize,
    span: Span,
) -> SemaResult<Vec<DataItem>> {
    let Some(shape) = loop_shape(for_stmt, env) else {
        return Err(internal_err!(span, ImpossibleState {
            detail: "unroll of a loop that is not unrollable".to_string(),
        }));
    };

    let mut values = Vec::new();
    let mut current = shape.start;
    let mut bound = BoundEnv::new(env);
    loop {
        bound.bind(shape.iterator, current);
        let keep_going = try_compute(shape.condition, None, &mut bound, None).and_then(|v| v.truthy());
        match keep_going {
            Some(true) => {}
            Some(false) => break,
            None => {
                return Err(internal_err!(span, ImpossibleState {
                    detail: "loop condition stopped being computable".to_string(),
                }));
            }
        }
        if values.len() == max_iterations {
            return Err(sema_err!(span, UnrollLimitExceeded { limit: max_iterations }));
        }
        values.push(current);

        current = try_compute(shape.update, None, &mut bound, None).ok_or_else(|| {
            internal_err!(span, ImpossibleState {
                detail: "loop update stopped being computable".to_string(),
            })
        })?;
    }
    Ok(values)
}

/// Copies of the loop body with fresh ids, the iterator replaced by each
/// value in turn.
pub fn unrolled_blocks(for_stmt: &ForStmt, values: &[DataItem], ids: &mut NodeIdGen, span: Span) -> Vec<Block> {
    let Some(iterator) = loop_iterator(for_stmt) else {
        return Vec::new();
    };
    let blocks: Vec<Block> = values
        .iter()
        .map(|value| {
            let literal = literal_expr(*value, ids, span);
            let mut subst = Substitution::new(ids);
            subst.replace(iterator, literal);
            subst.block(&for_stmt.body)
        })
        .collect();
    tracing::debug!(node = %for_stmt.id, iterations = blocks.len(), "unrolled loop");
    blocks
}

fn loop_iterator(for_stmt: &ForStmt) -> Option<Symbol> {
    match for_stmt.init.as_deref()? {
        Stmt::Var(v) => Some(v.name),
        Stmt::Assign(a) => assigned_name(a),
        _ => None,
    }
}

/// Whether any statement assigns or redeclares `name`.
fn assigns(stmts: &[Stmt], name: Symbol) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Assign(a) => assigned_name(a) == Some(name),
        Stmt::Var(v) => v.name == name,
        Stmt::Const(c) => c.name == name,
        Stmt::If(s) => if_assigns(s, name),
        Stmt::While(w) => assigns(&w.body.stmts, name),
        Stmt::For(f) => {
            f.init.as_deref().is_some_and(|s| assigns(std::slice::from_ref(s), name))
                || f.update.as_deref().is_some_and(|s| assigns(std::slice::from_ref(s), name))
                || assigns(&f.body.stmts, name)
        }
        Stmt::Block(b) => assigns(&b.stmts, name),
        Stmt::Expr(_) | Stmt::Return(_) | Stmt::Break(_) | Stmt::Continue(_) => false,
    })
}

fn if_assigns(s: &IfStmt, name: Symbol) -> bool {
    assigns(&s.then_branch.stmts, name)
        || match &s.else_branch {
            Some(ElseBranch::Block(b)) => assigns(&b.stmts, name),
            Some(ElseBranch::If(nested)) => if_assigns(nested, name),
            None => false,
        }
}

/// `break` or `continue` belonging to this loop (not to a nested one).
fn jumps_out(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Break(_) | Stmt::Continue(_) => true,
        Stmt::If(s) => if_jumps(s),
        Stmt::Block(b) => jumps_out(&b.stmts),
        _ => false,
    })
}

fn if_jumps(s: &IfStmt) -> bool {
    jumps_out(&s.then_branch.stmts)
        || match &s.else_branch {
            Some(ElseBranch::Block(b)) => jumps_out(&b.stmts),
            Some(ElseBranch::If(nested)) => if_jumps(nested),
            None => false,
        }
}
