// type_arena/sema_type.rs
//
// SemaType: the canonical structure behind every TypeId.

use brim_identity::{ClassId, EnumId, StructId, Symbol};

use super::type_id::{TypeId, TypeIdVec};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BuiltinKind {
    Void,
    Byte,
    Integer,
    Float,
    Char,
}

impl BuiltinKind {
    pub fn type_id(self) -> TypeId {
        match self {
            BuiltinKind::Void => TypeId::VOID,
            BuiltinKind::Byte => TypeId::BYTE,
            BuiltinKind::Integer => TypeId::INTEGER,
            BuiltinKind::Float => TypeId::FLOAT,
            BuiltinKind::Char => TypeId::CHAR,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinKind::Void => "void",
            BuiltinKind::Byte => "byte",
            BuiltinKind::Integer => "int",
            BuiltinKind::Float => "float",
            BuiltinKind::Char => "char",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "void" => Some(BuiltinKind::Void),
            "byte" => Some(BuiltinKind::Byte),
            "int" => Some(BuiltinKind::Integer),
            "float" => Some(BuiltinKind::Float),
            "char" => Some(BuiltinKind::Char),
            _ => None,
        }
    }
}

/// Exactly one variant is active; struct/class/enum carry the definition
/// handle, so equality on them is nominal.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum SemaType {
    /// Sentinel at index 0. Reaching it in layout is a compiler defect.
    Invalid,
    Builtin(BuiltinKind),
    Struct {
        struct_id: StructId,
        type_args: TypeIdVec,
    },
    Class {
        class_id: ClassId,
        type_args: TypeIdVec,
    },
    Enum(EnumId),
    /// Signature value: owns its parameter and return types.
    Function {
        params: TypeIdVec,
        ret: TypeId,
    },
    Pointer(TypeId),
    StackArray {
        element: TypeId,
        size: u32,
    },
    /// Unresolved template parameter, replaced by substitution.
    GenericPlaceholder(Symbol),
}
