// src/lib.rs
//
// Shared identity primitives for the Brim compiler crates.
// Defines Symbol, Span, Interner and the typed entity handles.

mod entities;
mod intern;
mod span;
mod symbol;

pub use entities::{
    ClassId, ConstructorId, EntityId, EnumId, FileId, FunctionId, GeneralFunctionId, GlobalId,
    MacroId, OperatorId, StructId,
};
pub use intern::Interner;
pub use span::Span;
pub use symbol::Symbol;
