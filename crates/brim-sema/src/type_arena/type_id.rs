// type_arena/type_id.rs
//
// TypeId: interned type handle with reserved constants for the builtins.

use smallvec::SmallVec;

/// Concrete type identity in the TypeArena.
///
/// Unlike `StructId` (which identifies a struct *definition* like `struct List<T>`),
/// `TypeId` identifies a concrete type (like `List<int>`).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    // Reserved TypeIds, interned at these indices by TypeArena::new()

    /// Invalid type (must be 0 for is_invalid() check)
    pub const INVALID: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const BYTE: TypeId = TypeId(2);
    pub const INTEGER: TypeId = TypeId(3);
    pub const FLOAT: TypeId = TypeId(4);
    pub const CHAR: TypeId = TypeId(5);

    /// First non-reserved TypeId index (for dynamic types)
    pub const FIRST_DYNAMIC: u32 = 6;

    pub fn index(self) -> u32 {
        self.0
    }

    pub(super) fn from_raw(index: u32) -> Self {
        TypeId(index)
    }

    #[inline]
    pub fn is_invalid(self) -> bool {
        self == Self::INVALID
    }

    #[inline]
    pub fn is_void(self) -> bool {
        self == Self::VOID
    }

    /// Byte, int, float or char (no arena needed)
    #[inline]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::BYTE | Self::INTEGER | Self::FLOAT | Self::CHAR)
    }

    /// Byte, int or char (no arena needed)
    #[inline]
    pub fn is_integral(self) -> bool {
        matches!(self, Self::BYTE | Self::INTEGER | Self::CHAR)
    }

    #[inline]
    pub fn is_builtin(self) -> bool {
        self.0 >= Self::VOID.0 && self.0 < Self::FIRST_DYNAMIC
    }
}

/// Type argument and parameter lists; four inline covers nearly every signature.
pub type TypeIdVec = SmallVec<[TypeId; 4]>;
