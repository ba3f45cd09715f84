// src/overload.rs
//
// Overload and template resolution shared by functions, methods, operators,
// constructors and general functions.
//
// Resolution runs in three rounds and stops at the first round that finds
// anything:
// 1. non-template candidates whose parameter types equal the argument types
// 2. template candidates that unify with the argument types
// 3. non-template candidates reachable through implicit conversions
//
// More than one winner in a round is ambiguous.

use smallvec::SmallVec;

use brim_identity::{Interner, Span, Symbol};

use crate::diagnostics::{SemaResult, internal_err};
use crate::entity_defs::{CallableDef, CallableRef, ParamDef};
use crate::entity_registry::{CandidateList, EntityRegistry};
use crate::generic::{TemplateCache, TypeArguments, unify};
use crate::type_arena::{TypeArena, TypeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A concrete declaration
    Exact(CallableRef),
    /// A template and the bindings that instantiate it
    Template {
        origin: CallableRef,
        args: TypeArguments,
    },
}

/// Several candidates matched equally well.
#[derive(Debug, Clone)]
pub struct Ambiguous {
    pub candidates: CandidateList,
}

/// Argument types at a call site, receiver first for member calls.
#[derive(Debug, Clone, Copy)]
pub struct CallShape<'a> {
    pub arg_types: &'a [TypeId],
    /// `f<int, char>(...)`, bound to the candidate's own type parameters in order
    pub explicit_type_args: &'a [TypeId],
}

impl<'a> CallShape<'a> {
    pub fn new(arg_types: &'a [TypeId]) -> Self {
        Self {
            arg_types,
            explicit_type_args: &[],
        }
    }
}

/// Pick the callable a call with `shape` refers to. `converts(i, param)`
/// answers whether argument `i` converts implicitly to `param`.
pub fn resolve_overload(
    registry: &EntityRegistry,
    arena: &TypeArena,
    candidates: &[CallableRef],
    shape: CallShape<'_>,
    converts: &dyn Fn(usize, TypeId) -> bool,
) -> Result<Option<Resolution>, Ambiguous> {
    let explicit = !shape.explicit_type_args.is_empty();

    if !explicit {
        let exact = pick(candidates, |def| {
            !def.is_template
                && def.params.len() == shape.arg_types.len()
                && def.param_types().eq(shape.arg_types.iter().copied())
        }, registry)?;
        if let Some(found) = exact {
            return Ok(Some(Resolution::Exact(found)));
        }
    }

    let mut unified: SmallVec<[(CallableRef, TypeArguments); 2]> = SmallVec::new();
    for &candidate in candidates {
        let def = registry.callable(candidate);
        if !def.is_template {
            continue;
        }
        if let Some(args) = try_unify(arena, def, shape) {
            tracing::trace!(?candidate, bindings = args.len(), "template candidate unified");
            unified.push((candidate, args));
        }
    }
    match unified.len() {
        0 => {}
        1 => {
            let (origin, args) = unified.remove(0);
            return Ok(Some(Resolution::Template { origin, args }));
        }
        _ => {
            return Err(Ambiguous {
                candidates: unified.into_iter().map(|(c, _)| c).collect(),
            });
        }
    }

    if explicit {
        return Ok(None);
    }
    let converted = pick(candidates, |def| {
        !def.is_template
            && def.params.len() == shape.arg_types.len()
            && def.param_types().enumerate().all(|(i, param)| converts(i, param))
    }, registry)?;
    Ok(converted.map(Resolution::Exact))
}

fn pick(
    candidates: &[CallableRef],
    accept: impl Fn(&CallableDef) -> bool,
    registry: &EntityRegistry,
) -> Result<Option<CallableRef>, Ambiguous> {
    let matching: CandidateList = candidates
        .iter()
        .copied()
        .filter(|c| accept(registry.callable(*c)))
        .collect();
    match matching.len() {
        0 => Ok(None),
        1 => Ok(Some(matching[0])),
        _ => Err(Ambiguous {
            candidates: matching,
        }),
    }
}

fn try_unify(arena: &TypeArena, def: &CallableDef, shape: CallShape<'_>) -> Option<TypeArguments> {
    if def.params.len() != shape.arg_types.len() || shape.explicit_type_args.len() > def.type_params.len() {
        return None;
    }
    let names: SmallVec<[Symbol; 4]> = def.generic_names().collect();
    let mut bindings = TypeArguments::new();
    for (name, ty) in def.type_params.iter().zip(shape.explicit_type_args) {
        bindings.bind(*name, *ty);
    }
    let all_unify = def
        .param_types()
        .zip(shape.arg_types)
        .all(|(param, arg)| unify(arena, param, *arg, &names, &mut bindings));
    if !all_unify {
        tracing::trace!(name = ?def.name, "template candidate rejected");
        return None;
    }
    // Every generic must be pinned down by the arguments
    names.iter().all(|n| bindings.get(*n).is_some()).then_some(bindings)
}

/// Pick a function used as a value (`var f: func<int, int> = square;`).
/// A single non-template candidate needs no expected type; otherwise the
/// expected function type must select exactly one.
pub fn select_function_value(
    registry: &EntityRegistry,
    arena: &TypeArena,
    candidates: &[CallableRef],
    expected: Option<TypeId>,
) -> Result<Option<CallableRef>, Ambiguous> {
    let concrete: CandidateList = candidates
        .iter()
        .copied()
        .filter(|c| !registry.callable(*c).is_template)
        .collect();
    if concrete.len() == 1 && candidates.len() == 1 {
        return Ok(Some(concrete[0]));
    }
    let Some((params, ret)) = expected.and_then(|ty| arena.unwrap_function(ty)) else {
        return if concrete.is_empty() {
            Ok(None)
        } else {
            Err(Ambiguous {
                candidates: candidates.iter().copied().collect(),
            })
        };
    };
    pick(&concrete, |def| def.ret == ret && def.param_types().eq(params.iter().copied()), registry)
}

/// Instantiate `origin` with `args`, or return the existing instance.
/// The flag is true when a new instance was created and still needs its
/// body checked.
pub fn instantiate(
    registry: &mut EntityRegistry,
    arena: &mut TypeArena,
    cache: &mut TemplateCache,
    interner: &Interner,
    origin: CallableRef,
    args: TypeArguments,
    span: Span,
) -> SemaResult<(CallableRef, bool)> {
    if let Some(existing) = cache.get(origin, &args) {
        return Ok((existing, false));
    }

    let def = registry.callable(origin);
    let map = args.to_map();
    let mut params = Vec::with_capacity(def.params.len());
    for p in &def.params {
        params.push(ParamDef {
            name: p.name,
            ty: arena.substitute(p.ty, &map),
            modifier: p.modifier,
        });
    }
    let ret = arena.substitute(def.ret, &map);
    let owner = def.owner.map(|o| arena.substitute(o, &map));

    for ty in params.iter().map(|p| p.ty).chain(std::iter::once(ret)).chain(owner) {
        if let Some(param) = arena.first_placeholder(ty) {
            return Err(internal_err!(span, UnresolvedGeneric {
                name: interner.display_name(def.name).to_string(),
                param: interner.resolve(param).to_string(),
            }));
        }
    }

    let instance = CallableDef {
        name: def.name,
        kind: def.kind,
        file: def.file,
        params,
        ret,
        type_params: Vec::new(),
        owner,
        owner_type_params: Vec::new(),
        is_template: false,
        body: def.body.clone(),
        external: def.external.clone(),
        template_origin: Some(origin),
        type_args: args.clone(),
        span: def.span,
    };
    let handle = registry.push_callable(instance);
    tracing::debug!(?origin, instance = ?handle, "instantiated template");
    cache.insert(origin, args, handle);
    Ok((handle, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use brim_identity::{FileId, StructId};
    use smallvec::smallvec;

    use crate::entity_defs::CallableKind;

    fn sym(i: u32) -> Symbol {
        Symbol::new_for_test(i)
    }

    fn func(name: Symbol, params: &[TypeId], ret: TypeId, type_params: Vec<Symbol>) -> CallableDef {
        CallableDef {
            name,
            kind: CallableKind::Function,
            file: FileId::new(0),
            params: params
                .iter()
                .enumerate()
                .map(|(i, ty)| ParamDef {
                    name: sym(100 + i as u32),
                    ty: *ty,
                    modifier: None,
                })
                .collect(),
            ret,
            is_template: !type_params.is_empty(),
            type_params,
            owner: None,
            owner_type_params: Vec::new(),
            body: None,
            external: None,
            template_origin: None,
            type_args: TypeArguments::new(),
            span: Span::default(),
        }
    }

    fn exact_only(_: usize, _: TypeId) -> bool {
        false
    }

    #[test]
    fn exact_match_beats_template() {
        let mut arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let t = arena.placeholder(sym(1));
        let generic = registry.push_callable(func(sym(0), &[t], t, vec![sym(1)]));
        let concrete = registry.push_callable(func(sym(0), &[TypeId::INTEGER], TypeId::INTEGER, vec![]));
        let candidates = [generic, concrete];

        let found = resolve_overload(&registry, &arena, &candidates, CallShape::new(&[TypeId::INTEGER]), &exact_only);
        assert_eq!(found.unwrap(), Some(Resolution::Exact(concrete)));

        let found = resolve_overload(&registry, &arena, &candidates, CallShape::new(&[TypeId::CHAR]), &exact_only);
        match found.unwrap() {
            Some(Resolution::Template { origin, args }) => {
                assert_eq!(origin, generic);
                assert_eq!(args.get(sym(1)), Some(TypeId::CHAR));
            }
            other => panic!("expected template resolution, got {other:?}"),
        }
    }

    #[test]
    fn identical_signatures_are_ambiguous() {
        let arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let a = registry.push_callable(func(sym(0), &[TypeId::FLOAT], TypeId::VOID, vec![]));
        let b = registry.push_callable(func(sym(0), &[TypeId::FLOAT], TypeId::VOID, vec![]));
        let err = resolve_overload(&registry, &arena, &[a, b], CallShape::new(&[TypeId::FLOAT]), &exact_only)
            .unwrap_err();
        assert_eq!(err.candidates.as_slice(), &[a, b]);
    }

    #[test]
    fn conversions_are_the_last_resort() {
        let arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let f = registry.push_callable(func(sym(0), &[TypeId::FLOAT], TypeId::VOID, vec![]));
        let widen = |_: usize, param: TypeId| param == TypeId::FLOAT;
        let found = resolve_overload(&registry, &arena, &[f], CallShape::new(&[TypeId::INTEGER]), &widen);
        assert_eq!(found.unwrap(), Some(Resolution::Exact(f)));
        let none = resolve_overload(&registry, &arena, &[f], CallShape::new(&[TypeId::INTEGER]), &exact_only);
        assert_eq!(none.unwrap(), None);
    }

    #[test]
    fn explicit_type_args_pre_bind() {
        let mut arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let t = arena.placeholder(sym(1));
        // make<T>() -> T: only explicit arguments can bind T
        let make = registry.push_callable(func(sym(0), &[], t, vec![sym(1)]));
        assert_eq!(
            resolve_overload(&registry, &arena, &[make], CallShape::new(&[]), &exact_only).unwrap(),
            None
        );
        let shape = CallShape {
            arg_types: &[],
            explicit_type_args: &[TypeId::BYTE],
        };
        let found = resolve_overload(&registry, &arena, &[make], shape, &exact_only).unwrap();
        assert!(matches!(found, Some(Resolution::Template { origin, .. }) if origin == make));
    }

    #[test]
    fn instantiation_is_cached_and_concrete() {
        let mut arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let mut cache = TemplateCache::new();
        let mut interner = Interner::new();
        let name = interner.intern("first");
        let t = interner.intern("T");
        let t_ty = arena.placeholder(t);
        let list_t = arena.struct_type(StructId::new(0), smallvec![t_ty]);
        let origin = registry.push_callable(func(name, &[list_t], t_ty, vec![t]));

        let mut args = TypeArguments::new();
        args.bind(t, TypeId::INTEGER);
        let (first, created) =
            instantiate(&mut registry, &mut arena, &mut cache, &interner, origin, args.clone(), Span::default())
                .unwrap();
        assert!(created);
        let (second, created) =
            instantiate(&mut registry, &mut arena, &mut cache, &interner, origin, args, Span::default()).unwrap();
        assert!(!created);
        assert_eq!(first, second);

        let def = registry.callable(first);
        assert_eq!(def.template_origin, Some(origin));
        assert_eq!(def.ret, TypeId::INTEGER);
        assert!(def.param_types().all(|ty| arena.all_generics_defined(ty)));
        // Instances never show up as candidates themselves
        assert_eq!(registry.free_functions_named(name).as_slice(), &[origin]);
    }

    #[test]
    fn unbound_generic_is_internal_error() {
        let mut arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let mut cache = TemplateCache::new();
        let mut interner = Interner::new();
        let name = interner.intern("g");
        let t = interner.intern("T");
        let u = interner.intern("U");
        let u_ty = arena.placeholder(u);
        let origin = registry.push_callable(func(name, &[u_ty], TypeId::VOID, vec![t, u]));
        let mut args = TypeArguments::new();
        args.bind(t, TypeId::INTEGER);
        let err = instantiate(&mut registry, &mut arena, &mut cache, &interner, origin, args, Span::default())
            .unwrap_err();
        assert_eq!(err.kind(), crate::diagnostics::ErrorKind::Internal);
    }

    #[test]
    fn function_value_needs_expected_type_when_overloaded() {
        let mut arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let a = registry.push_callable(func(sym(0), &[TypeId::INTEGER], TypeId::INTEGER, vec![]));
        assert_eq!(select_function_value(&registry, &arena, &[a], None).unwrap(), Some(a));

        let b = registry.push_callable(func(sym(0), &[TypeId::FLOAT], TypeId::FLOAT, vec![]));
        assert!(select_function_value(&registry, &arena, &[a, b], None).is_err());
        let expected = arena.function(smallvec![TypeId::FLOAT], TypeId::FLOAT);
        assert_eq!(select_function_value(&registry, &arena, &[a, b], Some(expected)).unwrap(), Some(b));
    }
}
