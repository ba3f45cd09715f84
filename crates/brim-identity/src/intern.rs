// intern.rs
//
// String interning for Symbol IDs.

use std::hash::BuildHasher;

use crate::Symbol;
use rustc_hash::FxBuildHasher;

/// Separator used for generated names. Not a legal identifier character,
/// so generated names never collide with user-written ones.
const GENERATED_SEPARATOR: char = '#';

/// Interns strings to unique Symbol IDs
#[derive(Debug, Clone)]
pub struct Interner {
    map: hashbrown::HashMap<String, Symbol, FxBuildHasher>,
    strings: Vec<String>,
    generated: u32,
}

impl Default for Interner {
    fn default() -> Self {
        Self {
            map: hashbrown::HashMap::with_hasher(FxBuildHasher),
            strings: Vec::new(),
            generated: 0,
        }
    }
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, s: &str) -> Symbol {
        use hashbrown::hash_map::RawEntryMut;

        let hash = self.map.hasher().hash_one(s);
        let entry = self.map.raw_entry_mut().from_hash(hash, |k| k == s);

        match entry {
            RawEntryMut::Occupied(e) => *e.get(),
            RawEntryMut::Vacant(e) => {
                let sym = Symbol::new(self.strings.len() as u32);
                let owned = s.to_string();
                self.strings.push(owned.clone());
                e.insert_hashed_nocheck(hash, owned, sym);
                sym
            }
        }
    }

    pub fn resolve(&self, sym: Symbol) -> &str {
        match self.strings.get(sym.index() as usize) {
            Some(s) => s,
            None => "<synthetic>",
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Look up a string to get its symbol, if it has been interned.
    pub fn lookup(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    /// Produce a brand-new symbol derived from `base`.
    ///
    /// Used for hygienic renaming: every call returns a symbol that is
    /// distinct from every other symbol, including earlier fresh ones.
    pub fn fresh(&mut self, base: Symbol) -> Symbol {
        self.generated += 1;
        let name = format!(
            "{}{}{}",
            self.resolve(base),
            GENERATED_SEPARATOR,
            self.generated
        );
        self.intern(&name)
    }

    /// Strip the generated suffix from a name produced by [`Interner::fresh`].
    pub fn display_name(&self, sym: Symbol) -> &str {
        let s = self.resolve(sym);
        match s.find(GENERATED_SEPARATOR) {
            Some(pos) => &s[..pos],
            None => s,
        }
    }

    /// Seed the primitive type keywords so they get stable low indices.
    pub fn seed_builtin_symbols(&mut self) {
        for name in ["void", "byte", "int", "float", "char", "func"] {
            let _ = self.intern(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_returns_same_symbol() {
        let mut interner = Interner::new();
        let s1 = interner.intern("hello");
        let s2 = interner.intern("hello");
        let s3 = interner.intern("world");

        assert_eq!(s1, s2);
        assert_ne!(s1, s3);
    }

    #[test]
    fn resolve_returns_original_string() {
        let mut interner = Interner::new();
        let sym = interner.intern("test");
        assert_eq!(interner.resolve(sym), "test");
    }

    #[test]
    fn fresh_symbols_never_repeat() {
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let a = interner.fresh(x);
        let b = interner.fresh(x);
        assert_ne!(a, b);
        assert_ne!(a, x);
        assert_eq!(interner.display_name(a), "x");
        assert_eq!(interner.lookup("x"), Some(x));
    }
}
