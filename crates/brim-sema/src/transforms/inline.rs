// transforms/inline.rs
//! Macro inlining.
//!
//! Every inlining occurrence gets its own substitution environment:
//! parameters map to the caller's argument expressions and every local the
//! macro declares is renamed to a fresh symbol, so names in the arguments can
//! never be captured by the macro body.

use brim_identity::{Interner, Span, Symbol};
use brim_syntax::ast::*;

use super::substitute::Substitution;
use crate::diagnostics::{SemaResult, sema_err};

/// The shape an inlined macro reduces to.
#[derive(Debug, Clone)]
pub enum InlineResult {
    /// Body was a single `return expr`
    Expr(Expr),
    /// Body was a single other statement
    Stmt(Stmt),
    Block(Block),
}

impl InlineResult {
    pub fn as_expr(&self) -> Option<&Expr> {
        match self {
            InlineResult::Expr(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_stmts(self) -> Vec<Stmt> {
        match self {
            InlineResult::Expr(expr) => {
                let span = expr.span;
                vec![Stmt::Expr(ExprStmt { expr, span })]
            }
            InlineResult::Stmt(stmt) => vec![stmt],
            InlineResult::Block(block) => block.stmts,
        }
    }
}

pub fn inline_macro(
    params: &[Symbol],
    body: &Block,
    args: &[Expr],
    ids: &mut NodeIdGen,
    interner: &mut Interner,
    span: Span,
) -> SemaResult<InlineResult> {
    if params.len() != args.len() {
        return Err(sema_err!(span, WrongArgumentCount {
            expected: params.len(),
            found: args.len(),
        }));
    }

    let mut locals = Vec::new();
    collect_declared(&body.stmts, &mut locals);

    let mut subst = Substitution::new(ids).stop_at_return();
    for local in locals {
        let fresh = interner.fresh(local);
        subst.rename(local, fresh);
    }
    // Parameters win over same-named locals
    for (param, arg) in params.iter().zip(args) {
        subst.replace(*param, arg.clone());
    }
    let mut copied = subst.block(body);

    if copied.stmts.len() == 1 {
        return Ok(match copied.stmts.remove(0) {
            Stmt::Return(ReturnStmt {
                value: Some(expr), ..
            }) => InlineResult::Expr(expr),
            stmt => InlineResult::Stmt(stmt),
        });
    }
    Ok(InlineResult::Block(copied))
}

/// Names declared by `var`, `const` and `for` initialisers, at any depth.
fn collect_declared(stmts: &[Stmt], out: &mut Vec<Symbol>) {
    for stmt in stmts {
        match stmt {
            Stmt::Var(v) => out.push(v.name),
            Stmt::Const(c) => out.push(c.name),
            Stmt::If(s) => collect_if(s, out),
            Stmt::While(s) => collect_declared(&s.body.stmts, out),
            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    collect_declared(std::slice::from_ref(init.as_ref()), out);
                }
                collect_declared(&s.body.stmts, out);
            }
            Stmt::Block(b) => collect_declared(&b.stmts, out),
            Stmt::Assign(_) | Stmt::Expr(_) | Stmt::Return(_) | Stmt::Break(_) | Stmt::Continue(_) => {}
        }
    }
}

fn collect_if(s: &IfStmt, out: &mut Vec<Symbol>) {
    collect_declared(&s.then_branch.stmts, out);
    match &s.else_branch {
        Some(ElseBranch::Block(b)) => collect_declared(&b.stmts, out),
        Some(ElseBranch::If(nested)) => collect_if(nested, out),
        None => {}
    }
}
