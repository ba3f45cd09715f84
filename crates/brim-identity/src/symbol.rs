// symbol.rs
//
// Unique identifier for interned strings.

/// Unique identifier for symbols (interned strings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    /// Create a Symbol from a raw index. Only the interner should use this.
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    /// A high-bit symbol that never collides with interned names.
    /// Used for placeholder type parameters during unification.
    pub fn synthetic(offset: u32) -> Self {
        Self(0x8000_0000 + offset)
    }

    pub fn is_synthetic(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}
