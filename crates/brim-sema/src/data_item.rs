// src/data_item.rs
//
// DataItem: a compile-time scalar tagged with its runtime type.

use std::fmt;

use crate::type_arena::{BuiltinKind, TypeId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataItem {
    Integer(i32),
    Float(f32),
    Byte(u8),
    Char(char),
    /// Stored as a byte at runtime.
    Bool(bool),
}

impl DataItem {
    pub fn builtin_kind(self) -> BuiltinKind {
        match self {
            DataItem::Integer(_) => BuiltinKind::Integer,
            DataItem::Float(_) => BuiltinKind::Float,
            DataItem::Byte(_) | DataItem::Bool(_) => BuiltinKind::Byte,
            DataItem::Char(_) => BuiltinKind::Char,
        }
    }

    pub fn type_id(self) -> TypeId {
        self.builtin_kind().type_id()
    }

    /// Same runtime type tag. Bool and Byte share one.
    pub fn same_type(self, other: DataItem) -> bool {
        self.builtin_kind() == other.builtin_kind()
    }

    /// Truth value of a condition. Floats are not conditions.
    pub fn truthy(self) -> Option<bool> {
        match self {
            DataItem::Bool(b) => Some(b),
            DataItem::Integer(v) => Some(v != 0),
            DataItem::Byte(v) => Some(v != 0),
            DataItem::Char(c) => Some(c != '\0'),
            DataItem::Float(_) => None,
        }
    }

    /// Integral value, for array sizes and indices.
    pub fn as_integer(self) -> Option<i64> {
        match self {
            DataItem::Integer(v) => Some(v as i64),
            DataItem::Byte(v) => Some(v as i64),
            DataItem::Char(c) => Some(c as i64),
            DataItem::Bool(b) => Some(b as i64),
            DataItem::Float(_) => None,
        }
    }

    /// Convert to the given builtin, as an explicit cast would.
    pub fn convert_to(self, kind: BuiltinKind) -> Option<DataItem> {
        let result = match (self, kind) {
            (_, BuiltinKind::Void) => return None,
            (DataItem::Float(f), BuiltinKind::Float) => DataItem::Float(f),
            (DataItem::Float(f), BuiltinKind::Integer) => DataItem::Integer(f as i32),
            (DataItem::Float(f), BuiltinKind::Byte) => DataItem::Byte(f as u8),
            (DataItem::Float(_), BuiltinKind::Char) => return None,
            (item, BuiltinKind::Float) => DataItem::Float(item.as_integer()? as f32),
            (item, BuiltinKind::Integer) => DataItem::Integer(item.as_integer()? as i32),
            (item, BuiltinKind::Byte) => DataItem::Byte(item.as_integer()? as u8),
            (item, BuiltinKind::Char) => DataItem::Char(char::from_u32(item.as_integer()? as u32)?),
        };
        Some(result)
    }
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataItem::Integer(v) => write!(f, "{}", v),
            DataItem::Float(v) => write!(f, "{:?}", v),
            DataItem::Byte(v) => write!(f, "{}b", v),
            DataItem::Char(c) => write!(f, "'{}'", c.escape_default()),
            DataItem::Bool(b) => write!(f, "{}", b),
        }
    }
}
