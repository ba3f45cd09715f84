// consteval/mod.rs
//
// Best-effort compile-time evaluation of expressions.
//
// `try_compute` never fails loudly: anything it cannot decide statically is
// `None`, and callers pick the diagnostic. Names, `sizeof`, `.Length` and
// macros are answered by a `ComputeEnv` so the evaluator stays independent
// of analyzer state.

mod ops;
mod simple;

#[cfg(test)]
mod tests;

use rustc_hash::FxHashMap;

use brim_identity::{Span, Symbol};
use brim_syntax::{BinaryOp, CallExpr, Expr, ExprKind, FieldExpr, NodeId};

use crate::data_item::DataItem;
use crate::type_arena::TypeId;

pub use ops::{fold_binary, fold_unary};
pub use simple::try_compute_simple;

/// Values already known for sub-expressions, consulted before evaluating.
pub type ComputeMemo = FxHashMap<NodeId, DataItem>;

/// Everything the evaluator needs from its surroundings.
pub trait ComputeEnv {
    /// Value of a compile-time constant in scope.
    fn constant(&self, _name: Symbol) -> Option<DataItem> {
        None
    }

    /// Size in slots measured by a `sizeof` call. `None` when `call` is not
    /// `sizeof` or the measured type is unknown. The operand is typed, never
    /// evaluated.
    fn size_of(&mut self, _call: &CallExpr, _span: Span) -> Option<u32> {
        None
    }

    /// `arr.Length` on fixed-size arrays and `Enum.Member`.
    fn field_value(&mut self, _field: &FieldExpr) -> Option<DataItem> {
        None
    }

    /// Inline a macro call that reduces to a single expression.
    fn expand_macro(&mut self, _call: &CallExpr, _span: Span) -> Option<Expr> {
        None
    }
}

/// Knows nothing beyond literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiteralEnv;

impl ComputeEnv for LiteralEnv {}

/// Overlays name bindings on another environment (loop iterators during
/// unrolling).
pub struct BoundEnv<'a> {
    inner: &'a mut dyn ComputeEnv,
    bindings: FxHashMap<Symbol, DataItem>,
}

impl<'a> BoundEnv<'a> {
    pub fn new(inner: &'a mut dyn ComputeEnv) -> Self {
        Self {
            inner,
            bindings: FxHashMap::default(),
        }
    }

    pub fn bind(&mut self, name: Symbol, value: DataItem) {
        self.bindings.insert(name, value);
    }

    pub fn binding(&self, name: Symbol) -> Option<DataItem> {
        self.bindings.get(&name).copied()
    }
}

impl ComputeEnv for BoundEnv<'_> {
    fn constant(&self, name: Symbol) -> Option<DataItem> {
        self.bindings
            .get(&name)
            .copied()
            .or_else(|| self.inner.constant(name))
    }

    fn size_of(&mut self, call: &CallExpr, span: Span) -> Option<u32> {
        self.inner.size_of(call, span)
    }

    fn field_value(&mut self, field: &FieldExpr) -> Option<DataItem> {
        self.inner.field_value(field)
    }

    fn expand_macro(&mut self, call: &CallExpr, span: Span) -> Option<Expr> {
        self.inner.expand_macro(call, span)
    }
}

/// Evaluate `expr` at compile time.
///
/// `expected` picks literal widths (an integer literal in `0..=255` where a
/// byte is expected becomes a `Byte`). `&&` and `||` stop as soon as the left
/// operand decides the result, so the right operand may be uncomputable.
pub fn try_compute(
    expr: &Expr,
    expected: Option<TypeId>,
    env: &mut dyn ComputeEnv,
    memo: Option<&ComputeMemo>,
) -> Option<DataItem> {
    if let Some(memo) = memo
        && let Some(value) = memo.get(&expr.id)
    {
        return Some(*value);
    }

    match &expr.kind {
        ExprKind::IntLiteral(v) => Some(ops::int_literal(*v, expected)),
        ExprKind::FloatLiteral(v) => Some(DataItem::Float(*v as f32)),
        ExprKind::CharLiteral(c) => Some(DataItem::Char(*c)),
        ExprKind::BoolLiteral(b) => Some(DataItem::Bool(*b)),
        ExprKind::Grouping(inner) => try_compute(inner, expected, env, memo),
        ExprKind::Identifier(name) => env.constant(*name),
        ExprKind::Unary(un) => {
            let value = try_compute(&un.operand, expected, env, memo)?;
            fold_unary(un.op, value)
        }
        ExprKind::Binary(bin) => match bin.op {
            BinaryOp::And => {
                if !try_compute(&bin.left, None, env, memo)?.truthy()? {
                    return Some(DataItem::Bool(false));
                }
                let right = try_compute(&bin.right, None, env, memo)?;
                Some(DataItem::Bool(right.truthy()?))
            }
            BinaryOp::Or => {
                if try_compute(&bin.left, None, env, memo)?.truthy()? {
                    return Some(DataItem::Bool(true));
                }
                let right = try_compute(&bin.right, None, env, memo)?;
                Some(DataItem::Bool(right.truthy()?))
            }
            op => {
                let operand_expected = if op.is_comparison() { None } else { expected };
                let left = try_compute(&bin.left, operand_expected, env, memo)?;
                let right = try_compute(&bin.right, operand_expected, env, memo)?;
                fold_binary(op, left, right)
            }
        },
        ExprKind::Call(call) => {
            if let Some(size) = env.size_of(call, expr.span) {
                return Some(DataItem::Integer(size as i32));
            }
            let inlined = env.expand_macro(call, expr.span)?;
            try_compute(&inlined, expected, env, memo)
        }
        ExprKind::Field(field) => env.field_value(field),
        _ => None,
    }
}
