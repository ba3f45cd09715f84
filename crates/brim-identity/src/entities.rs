//! First-class identity types for language entities.
//!
//! Every symbol table in the semantic core is an append-only arena. These
//! handles are the stable indices into those arenas, so a struct reference
//! can never be confused with a function reference.

/// Common interface over all entity handles, used by the generic arenas.
pub trait EntityId: Copy + Eq + std::hash::Hash + std::fmt::Debug {
    fn from_index(index: u32) -> Self;
    fn to_index(self) -> u32;
}

macro_rules! define_entity_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u32);

        impl $name {
            pub fn new(index: u32) -> Self {
                Self(index)
            }

            pub fn index(self) -> u32 {
                self.0
            }
        }

        impl EntityId for $name {
            fn from_index(index: u32) -> Self {
                Self(index)
            }

            fn to_index(self) -> u32 {
                self.0
            }
        }
    };
}

define_entity_id! {
    /// Identity for a source file. Definitions are keyed by (name, file).
    pub struct FileId;
}

define_entity_id! {
    /// Identity for a struct definition (stack value type)
    pub struct StructId;
}

define_entity_id! {
    /// Identity for a class definition (heap reference type)
    pub struct ClassId;
}

define_entity_id! {
    /// Identity for an enum definition
    pub struct EnumId;
}

define_entity_id! {
    /// Identity for a free function or method
    pub struct FunctionId;
}

define_entity_id! {
    /// Identity for a user-defined operator
    pub struct OperatorId;
}

define_entity_id! {
    /// Identity for a constructor
    pub struct ConstructorId;
}

define_entity_id! {
    /// Identity for a general function (indexers, destructor, clone)
    pub struct GeneralFunctionId;
}

define_entity_id! {
    /// Identity for an untyped macro
    pub struct MacroId;
}

define_entity_id! {
    /// Identity for a global variable (top-level `var` in a file)
    pub struct GlobalId;
}
