// src/generic.rs
//
// Template machinery: type argument bindings, unification of declared
// parameter types against call-site argument types, and the instantiation cache.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use brim_identity::Symbol;

use crate::entity_defs::CallableRef;
use crate::type_arena::{SemaType, TypeArena, TypeId};

/// Ordered generic-name to concrete-type bindings.
///
/// Kept sorted by name so two maps with the same bindings compare and hash
/// equal regardless of the order they were bound in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeArguments {
    bindings: SmallVec<[(Symbol, TypeId); 4]>,
}

impl TypeArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Symbol) -> Option<TypeId> {
        self.bindings
            .binary_search_by_key(&name, |(n, _)| *n)
            .ok()
            .map(|i| self.bindings[i].1)
    }

    /// Bind `name`, or check an existing binding. Returns false on conflict.
    pub fn bind(&mut self, name: Symbol, ty: TypeId) -> bool {
        match self.bindings.binary_search_by_key(&name, |(n, _)| *n) {
            Ok(i) => self.bindings[i].1 == ty,
            Err(i) => {
                self.bindings.insert(i, (name, ty));
                true
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, TypeId)> + '_ {
        self.bindings.iter().copied()
    }

    /// Substitution map for `TypeArena::substitute`.
    pub fn to_map(&self) -> FxHashMap<Symbol, TypeId> {
        self.bindings.iter().copied().collect()
    }
}

/// Unify a declared parameter type against a passed argument type.
///
/// A placeholder whose name is in `generic_names` binds on first sight; every
/// later sight must be exactly the same type. Struct and class parameters
/// unify their type arguments against the passed type's recorded arguments.
/// Everything else must match exactly, with no implicit widening.
pub fn unify(
    arena: &TypeArena,
    param: TypeId,
    arg: TypeId,
    generic_names: &[Symbol],
    bindings: &mut TypeArguments,
) -> bool {
    if param == arg && arena.all_generics_defined(param) {
        return true;
    }

    match (arena.get(param), arena.get(arg)) {
        (SemaType::GenericPlaceholder(name), _) if generic_names.contains(name) => {
            tracing::trace!(?name, ?arg, "unify binding");
            bindings.bind(*name, arg)
        }
        (SemaType::Pointer(p), SemaType::Pointer(a)) => unify(arena, *p, *a, generic_names, bindings),
        (
            SemaType::StackArray {
                element: pe,
                size: ps,
            },
            SemaType::StackArray {
                element: ae,
                size: as_,
            },
        ) => ps == as_ && unify(arena, *pe, *ae, generic_names, bindings),
        (
            SemaType::Function {
                params: pp,
                ret: pr,
            },
            SemaType::Function {
                params: ap,
                ret: ar,
            },
        ) => {
            pp.len() == ap.len()
                && pp
                    .iter()
                    .zip(ap.iter())
                    .all(|(p, a)| unify(arena, *p, *a, generic_names, bindings))
                && unify(arena, *pr, *ar, generic_names, bindings)
        }
        (
            SemaType::Struct {
                struct_id: pid,
                type_args: pargs,
            },
            SemaType::Struct {
                struct_id: aid,
                type_args: aargs,
            },
        ) => {
            pid == aid
                && pargs.len() == aargs.len()
                && pargs
                    .iter()
                    .zip(aargs.iter())
                    .all(|(p, a)| unify(arena, *p, *a, generic_names, bindings))
        }
        (
            SemaType::Class {
                class_id: pid,
                type_args: pargs,
            },
            SemaType::Class {
                class_id: aid,
                type_args: aargs,
            },
        ) => {
            pid == aid
                && pargs.len() == aargs.len()
                && pargs
                    .iter()
                    .zip(aargs.iter())
                    .all(|(p, a)| unify(arena, *p, *a, generic_names, bindings))
        }
        _ => param == arg,
    }
}

/// Cache of template instances keyed by (origin, bindings).
///
/// Identical instantiations return the same handle. Instances are also kept
/// in creation order for the code generator.
#[derive(Debug, Clone, Default)]
pub struct TemplateCache {
    instances: FxHashMap<(CallableRef, TypeArguments), CallableRef>,
    order: Vec<CallableRef>,
    hits: u32,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, origin: CallableRef, args: &TypeArguments) -> Option<CallableRef> {
        let found = self.instances.get(&(origin, args.clone())).copied();
        if found.is_some() {
            self.hits += 1;
        }
        found
    }

    pub fn insert(&mut self, origin: CallableRef, args: TypeArguments, instance: CallableRef) {
        self.instances.insert((origin, args), instance);
        self.order.push(instance);
    }

    /// All instances in creation order
    pub fn instances(&self) -> &[CallableRef] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of lookups answered from the cache
    pub fn hits(&self) -> u32 {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brim_identity::{FunctionId, StructId};
    use smallvec::smallvec;

    fn sym(i: u32) -> Symbol {
        Symbol::new_for_test(i)
    }

    #[test]
    fn bindings_are_order_independent() {
        let mut a = TypeArguments::new();
        assert!(a.bind(sym(2), TypeId::INTEGER));
        assert!(a.bind(sym(1), TypeId::FLOAT));
        let mut b = TypeArguments::new();
        assert!(b.bind(sym(1), TypeId::FLOAT));
        assert!(b.bind(sym(2), TypeId::INTEGER));
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_generic_must_match_exactly() {
        let mut arena = TypeArena::new();
        let t = arena.placeholder(sym(5));
        let names = [sym(5)];
        let mut bindings = TypeArguments::new();
        assert!(unify(&arena, t, TypeId::INTEGER, &names, &mut bindings));
        assert!(unify(&arena, t, TypeId::INTEGER, &names, &mut bindings));
        // No widening from byte to the already bound int
        assert!(!unify(&arena, t, TypeId::BYTE, &names, &mut bindings));
    }

    #[test]
    fn nested_struct_arguments_unify() {
        let mut arena = TypeArena::new();
        let t = arena.placeholder(sym(5));
        let list_t = arena.struct_type(StructId::new(0), smallvec![t]);
        let ptr_list_t = arena.pointer(list_t);
        let list_char = arena.struct_type(StructId::new(0), smallvec![TypeId::CHAR]);
        let ptr_list_char = arena.pointer(list_char);

        let mut bindings = TypeArguments::new();
        assert!(unify(&arena, ptr_list_t, ptr_list_char, &[sym(5)], &mut bindings));
        assert_eq!(bindings.get(sym(5)), Some(TypeId::CHAR));

        let other = arena.struct_type(StructId::new(1), smallvec![TypeId::CHAR]);
        let mut fresh = TypeArguments::new();
        assert!(!unify(&arena, list_t, other, &[sym(5)], &mut fresh));
    }

    #[test]
    fn cache_returns_same_instance() {
        let origin = CallableRef::Function(FunctionId::new(0));
        let instance = CallableRef::Function(FunctionId::new(3));
        let mut args = TypeArguments::new();
        args.bind(sym(1), TypeId::INTEGER);

        let mut cache = TemplateCache::new();
        assert_eq!(cache.get(origin, &args), None);
        cache.insert(origin, args.clone(), instance);
        assert_eq!(cache.get(origin, &args), Some(instance));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.instances(), &[instance]);
    }
}
