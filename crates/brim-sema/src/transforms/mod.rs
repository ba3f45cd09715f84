// transforms/mod.rs
//! AST rewrites run during analysis: macro inlining, collapsing of
//! statically decided control flow, and loop unrolling.
//!
//! All rewrites produce new trees with fresh node ids; the input is never
//! mutated.

mod collapse;
mod inline;
mod substitute;
mod unroll;


pub use collapse::collapse;
pub use inline::{InlineResult, inline_macro};
pub use substitute::{Replacement, Substitution, renumber};
pub use unroll::{is_unrollable, iteration_values, unroll, unrolled_blocks};

use brim_identity::Span;
use brim_syntax::{Expr, ExprKind, NodeIdGen};

use crate::data_item::DataItem;

/// Literal expression holding a computed value.
pub fn literal_expr(value: DataItem, ids: &mut NodeIdGen, span: Span) -> Expr {
    let kind = match value {
        DataItem::Integer(v) => ExprKind::IntLiteral(v as i64),
        DataItem::Byte(v) => ExprKind::IntLiteral(v as i64),
        DataItem::Float(v) => ExprKind::FloatLiteral(v as f64),
        DataItem::Char(c) => ExprKind::CharLiteral(c),
        DataItem::Bool(b) => ExprKind::BoolLiteral(b),
    };
    Expr {
        id: ids.next_id(),
        kind,
        span,
    }
}
