//! Central registry for all language entities.
//!
//! Every kind of definition lives in its own append-only arena addressed by
//! a typed handle. Lookups are linear scans over `(table, predicate)`; the
//! tables are small and declaration order is part of the lookup contract.
//!
//! - `types` - struct, class and enum registration and name lookup
//! - `callables` - functions, operators, constructors and general functions
//! - `usage` - usage counters written by the reference collector

mod callables;
mod types;
mod usage;

pub use callables::CandidateList;
pub use types::OwnerKey;
pub use usage::{UsageCount, UsageTable};

use std::marker::PhantomData;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use brim_identity::{
    ClassId, ConstructorId, EntityId, EnumId, FunctionId, GeneralFunctionId, GlobalId, MacroId,
    OperatorId, StructId,
};

use crate::entity_defs::{AggregateDef, CallableDef, EnumDef, GlobalDef, MacroDef};
use crate::type_arena::TypeId;

/// Append-only arena of definitions indexed by a typed handle.
#[derive(Debug, Clone)]
pub struct DefTable<I, D> {
    items: Vec<D>,
    _id: PhantomData<I>,
}

impl<I: EntityId, D> Default for DefTable<I, D> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            _id: PhantomData,
        }
    }
}

impl<I: EntityId, D> DefTable<I, D> {
    pub fn push(&mut self, def: D) -> I {
        let id = I::from_index(self.items.len() as u32);
        self.items.push(def);
        id
    }

    pub fn get(&self, id: I) -> &D {
        &self.items[id.to_index() as usize]
    }

    pub fn get_mut(&mut self, id: I) -> &mut D {
        &mut self.items[id.to_index() as usize]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (I, &D)> + '_ {
        self.items
            .iter()
            .enumerate()
            .map(|(i, d)| (I::from_index(i as u32), d))
    }

    pub fn ids(&self) -> impl Iterator<Item = I> + use<I, D> {
        (0..self.items.len() as u32).map(I::from_index)
    }

    /// First entry in declaration order satisfying `pred`
    pub fn find(&self, pred: impl Fn(&D) -> bool) -> Option<I> {
        self.iter().find(|(_, d)| pred(d)).map(|(id, _)| id)
    }

    /// Every entry satisfying `pred`, in declaration order
    pub fn filter(&self, pred: impl Fn(&D) -> bool) -> SmallVec<[I; 4]> {
        self.iter()
            .filter(|(_, d)| pred(d))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Central registry for all language entities
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    pub structs: DefTable<StructId, AggregateDef>,
    pub classes: DefTable<ClassId, AggregateDef>,
    pub enums: DefTable<EnumId, EnumDef>,
    pub functions: DefTable<FunctionId, CallableDef>,
    pub operators: DefTable<OperatorId, CallableDef>,
    pub constructors: DefTable<ConstructorId, CallableDef>,
    pub general_functions: DefTable<GeneralFunctionId, CallableDef>,
    pub macros: DefTable<MacroId, MacroDef>,
    pub globals: DefTable<GlobalId, GlobalDef>,

    /// `[Define("alias")]` stand-in types, e.g. "boolean" or "string"
    type_replacers: FxHashMap<String, TypeId>,
    entry_point: Option<FunctionId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type replacer. Returns false if the alias is taken.
    pub fn define_type_replacer(&mut self, alias: &str, ty: TypeId) -> bool {
        if self.type_replacers.contains_key(alias) {
            return false;
        }
        self.type_replacers.insert(alias.to_string(), ty);
        true
    }

    pub fn type_replacer(&self, alias: &str) -> Option<TypeId> {
        self.type_replacers.get(alias).copied()
    }

    pub fn set_entry_point(&mut self, id: FunctionId) {
        self.entry_point = Some(id);
    }

    pub fn entry_point(&self) -> Option<FunctionId> {
        self.entry_point
    }
}
