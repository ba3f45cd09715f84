// consteval/ops.rs
//
// Operator folding over DataItems, shared by both evaluators.
//
// Mixed operands promote along Byte < Char < Integer < Float; Bool counts as
// Byte. Integer arithmetic wraps.
//
// Division and modulo return the left operand unchanged. This is the
// long-standing compile-time behaviour and is pinned by tests; runtime
// division is unaffected.

use brim_syntax::{BinaryOp, UnaryOp};

use crate::data_item::DataItem;
use crate::type_arena::TypeId;

/// Literal width from the expected type: small non-negative integers become
/// bytes where a byte is expected.
pub fn int_literal(value: i64, expected: Option<TypeId>) -> DataItem {
    match expected {
        Some(TypeId::BYTE) if (0..=255).contains(&value) => DataItem::Byte(value as u8),
        Some(TypeId::FLOAT) => DataItem::Float(value as f32),
        _ => DataItem::Integer(value as i32),
    }
}

pub fn fold_unary(op: UnaryOp, value: DataItem) -> Option<DataItem> {
    match op {
        UnaryOp::Not => Some(DataItem::Bool(!value.truthy()?)),
        UnaryOp::Neg => match value {
            DataItem::Integer(v) => Some(DataItem::Integer(v.wrapping_neg())),
            DataItem::Float(v) => Some(DataItem::Float(-v)),
            DataItem::Byte(v) => Some(DataItem::Byte(v.wrapping_neg())),
            DataItem::Char(_) | DataItem::Bool(_) => None,
        },
        UnaryOp::BitNot => match value {
            DataItem::Integer(v) => Some(DataItem::Integer(!v)),
            DataItem::Byte(v) => Some(DataItem::Byte(!v)),
            _ => None,
        },
    }
}

fn rank(item: DataItem) -> u8 {
    match item {
        DataItem::Bool(_) | DataItem::Byte(_) => 0,
        DataItem::Char(_) => 1,
        DataItem::Integer(_) => 2,
        DataItem::Float(_) => 3,
    }
}

fn as_float(item: DataItem) -> f32 {
    match item {
        DataItem::Float(v) => v,
        DataItem::Integer(v) => v as f32,
        DataItem::Byte(v) => v as f32,
        DataItem::Char(c) => c as u32 as f32,
        DataItem::Bool(b) => b as u8 as f32,
    }
}

/// Fold a non-logical binary operator. `&&` and `||` are handled by the
/// evaluators because they short-circuit.
pub fn fold_binary(op: BinaryOp, left: DataItem, right: DataItem) -> Option<DataItem> {
    if let (DataItem::Bool(a), DataItem::Bool(b)) = (left, right) {
        match op {
            BinaryOp::Eq => return Some(DataItem::Bool(a == b)),
            BinaryOp::Ne => return Some(DataItem::Bool(a != b)),
            _ => {}
        }
    }

    match rank(left).max(rank(right)) {
        3 => fold_float(op, as_float(left), as_float(right)),
        2 => fold_integer(op, left.as_integer()? as i32, right.as_integer()? as i32),
        1 => fold_char(op, left.as_integer()? as u32, right.as_integer()? as u32),
        _ => fold_byte(op, left.as_integer()? as u8, right.as_integer()? as u8),
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: T, b: T) -> Option<DataItem> {
    let result = match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => return None,
    };
    Some(DataItem::Bool(result))
}

fn fold_float(op: BinaryOp, a: f32, b: f32) -> Option<DataItem> {
    match op {
        BinaryOp::Add => Some(DataItem::Float(a + b)),
        BinaryOp::Sub => Some(DataItem::Float(a - b)),
        BinaryOp::Mul => Some(DataItem::Float(a * b)),
        BinaryOp::Div | BinaryOp::Mod => Some(DataItem::Float(a)),
        _ if op.is_comparison() => compare(op, a, b),
        _ => None,
    }
}

fn fold_integer(op: BinaryOp, a: i32, b: i32) -> Option<DataItem> {
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Mod => a,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        _ if op.is_comparison() => return compare(op, a, b),
        _ => return None,
    };
    Some(DataItem::Integer(value))
}

fn fold_char(op: BinaryOp, a: u32, b: u32) -> Option<DataItem> {
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Mod => a,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        _ if op.is_comparison() => return compare(op, a, b),
        _ => return None,
    };
    char::from_u32(value).map(DataItem::Char)
}

fn fold_byte(op: BinaryOp, a: u8, b: u8) -> Option<DataItem> {
    let value = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::Div | BinaryOp::Mod => a,
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        BinaryOp::Shl => a.wrapping_shl(b as u32),
        BinaryOp::Shr => a.wrapping_shr(b as u32),
        _ if op.is_comparison() => return compare(op, a, b),
        _ => return None,
    };
    Some(DataItem::Byte(value))
}
