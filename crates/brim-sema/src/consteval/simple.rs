// consteval/simple.rs
//
// Restricted evaluator for contexts where only literals and operator chains
// over literals are legal (enum member values). It never looks up names,
// calls or macros.

use brim_syntax::{BinaryOp, Expr, ExprKind};

use super::ops::{fold_binary, fold_unary};
use crate::data_item::DataItem;

pub fn try_compute_simple(expr: &Expr) -> Option<DataItem> {
    match &expr.kind {
        ExprKind::IntLiteral(v) => Some(DataItem::Integer(*v as i32)),
        ExprKind::FloatLiteral(v) => Some(DataItem::Float(*v as f32)),
        ExprKind::CharLiteral(c) => Some(DataItem::Char(*c)),
        ExprKind::BoolLiteral(b) => Some(DataItem::Bool(*b)),
        ExprKind::Grouping(inner) => try_compute_simple(inner),
        ExprKind::Unary(un) => fold_unary(un.op, try_compute_simple(&un.operand)?),
        ExprKind::Binary(bin) => match bin.op {
            BinaryOp::And => {
                if !try_compute_simple(&bin.left)?.truthy()? {
                    return Some(DataItem::Bool(false));
                }
                Some(DataItem::Bool(try_compute_simple(&bin.right)?.truthy()?))
            }
            BinaryOp::Or => {
                if try_compute_simple(&bin.left)?.truthy()? {
                    return Some(DataItem::Bool(true));
                }
                Some(DataItem::Bool(try_compute_simple(&bin.right)?.truthy()?))
            }
            op => fold_binary(op, try_compute_simple(&bin.left)?, try_compute_simple(&bin.right)?),
        },
        _ => None,
    }
}
