// src/well_known.rs
//
// Symbols the analyzer compares against by identity: builtin type keywords,
// special function names and recognised attributes.

use brim_identity::{Interner, Symbol};

/// Interned once per analysis so hot paths compare `Symbol`s, not strings.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownNames {
    pub void: Symbol,
    pub byte: Symbol,
    pub int: Symbol,
    pub float: Symbol,
    pub char: Symbol,
    pub func: Symbol,
    pub sizeof: Symbol,
    pub length: Symbol,
    pub this: Symbol,
    pub destructor: Symbol,
    pub clone: Symbol,
    pub indexer_get: Symbol,
    pub indexer_set: Symbol,
    /// `[External("host_name")]`
    pub external: Symbol,
    /// `[Define("alias")]`
    pub define: Symbol,
    /// `[CodeEntry]`
    pub code_entry: Symbol,
    /// Type replacer consulted for conditions and comparisons
    pub boolean: Symbol,
    /// Type replacer consulted for string literals
    pub string: Symbol,
}

impl WellKnownNames {
    pub fn new(interner: &mut Interner) -> Self {
        Self {
            void: interner.intern("void"),
            byte: interner.intern("byte"),
            int: interner.intern("int"),
            float: interner.intern("float"),
            char: interner.intern("char"),
            func: interner.intern("func"),
            sizeof: interner.intern("sizeof"),
            length: interner.intern("Length"),
            this: interner.intern("this"),
            destructor: interner.intern("destructor"),
            clone: interner.intern("clone"),
            indexer_get: interner.intern("indexer_get"),
            indexer_set: interner.intern("indexer_set"),
            external: interner.intern("External"),
            define: interner.intern("Define"),
            code_entry: interner.intern("CodeEntry"),
            boolean: interner.intern("boolean"),
            string: interner.intern("string"),
        }
    }

    pub fn is_known_attribute(&self, name: Symbol) -> bool {
        name == self.external || name == self.define || name == self.code_entry
    }
}
