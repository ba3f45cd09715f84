//! Callable registration and candidate lookup.

use smallvec::SmallVec;

use brim_identity::Symbol;
use brim_syntax::OperatorKind;

use super::EntityRegistry;
use crate::entity_defs::{CallableDef, CallableKind, CallableRef, GeneralKind};
use crate::type_arena::TypeArena;

use super::types::OwnerKey;

pub type CandidateList = SmallVec<[CallableRef; 4]>;

impl EntityRegistry {
    pub fn callable(&self, r: CallableRef) -> &CallableDef {
        match r {
            CallableRef::Function(id) => self.functions.get(id),
            CallableRef::Operator(id) => self.operators.get(id),
            CallableRef::Constructor(id) => self.constructors.get(id),
            CallableRef::General(id) => self.general_functions.get(id),
        }
    }

    pub fn callable_mut(&mut self, r: CallableRef) -> &mut CallableDef {
        match r {
            CallableRef::Function(id) => self.functions.get_mut(id),
            CallableRef::Operator(id) => self.operators.get_mut(id),
            CallableRef::Constructor(id) => self.constructors.get_mut(id),
            CallableRef::General(id) => self.general_functions.get_mut(id),
        }
    }

    /// Store a callable in the arena matching its kind.
    pub fn push_callable(&mut self, def: CallableDef) -> CallableRef {
        match def.kind {
            CallableKind::Function => CallableRef::Function(self.functions.push(def)),
            CallableKind::Operator(_) => CallableRef::Operator(self.operators.push(def)),
            CallableKind::Constructor => CallableRef::Constructor(self.constructors.push(def)),
            CallableKind::General(_) => CallableRef::General(self.general_functions.push(def)),
        }
    }

    /// Every callable, grouped by arena, each group in declaration order.
    pub fn all_callables(&self) -> Vec<CallableRef> {
        let mut all = Vec::with_capacity(
            self.functions.len()
                + self.operators.len()
                + self.constructors.len()
                + self.general_functions.len(),
        );
        all.extend(self.functions.ids().map(CallableRef::Function));
        all.extend(self.operators.ids().map(CallableRef::Operator));
        all.extend(self.constructors.ids().map(CallableRef::Constructor));
        all.extend(self.general_functions.ids().map(CallableRef::General));
        all
    }

    /// Free functions (no owner) with this name. Instances are excluded;
    /// they are reached through the template cache.
    pub fn free_functions_named(&self, name: Symbol) -> CandidateList {
        self.functions
            .filter(|f| f.name == name && f.owner.is_none() && !f.is_instance())
            .into_iter()
            .map(CallableRef::Function)
            .collect()
    }

    pub fn methods_named(&self, arena: &TypeArena, owner: OwnerKey, name: Symbol) -> CandidateList {
        self.functions
            .filter(|f| f.name == name && !f.is_instance() && self.owned_by(arena, f, owner))
            .into_iter()
            .map(CallableRef::Function)
            .collect()
    }

    pub fn operators_for(&self, op: OperatorKind) -> CandidateList {
        self.operators
            .filter(|f| f.kind == CallableKind::Operator(op) && !f.is_instance())
            .into_iter()
            .map(CallableRef::Operator)
            .collect()
    }

    pub fn constructors_for(&self, arena: &TypeArena, owner: OwnerKey) -> CandidateList {
        self.constructors
            .filter(|f| !f.is_instance() && self.owned_by(arena, f, owner))
            .into_iter()
            .map(CallableRef::Constructor)
            .collect()
    }

    pub fn general_functions_for(
        &self,
        arena: &TypeArena,
        owner: OwnerKey,
        kind: GeneralKind,
    ) -> CandidateList {
        self.general_functions
            .filter(|f| {
                f.kind == CallableKind::General(kind)
                    && !f.is_instance()
                    && self.owned_by(arena, f, owner)
            })
            .into_iter()
            .map(CallableRef::General)
            .collect()
    }

    fn owned_by(&self, arena: &TypeArena, def: &CallableDef, owner: OwnerKey) -> bool {
        def.owner
            .and_then(|ty| OwnerKey::of(arena, ty))
            .is_some_and(|key| key == owner)
    }

    /// An earlier declaration with the same kind, name, owner and parameter
    /// types as `def`, if any.
    pub fn find_duplicate_callable(&self, arena: &TypeArena, def: &CallableDef) -> Option<CallableRef> {
        let def_owner = def.owner.and_then(|ty| OwnerKey::of(arena, ty));
        let same = |other: &CallableDef| {
            !other.is_instance()
                && other.kind == def.kind
                && other.name == def.name
                && other.type_params.len() == def.type_params.len()
                && other.owner.and_then(|ty| OwnerKey::of(arena, ty)) == def_owner
                && other.params.len() == def.params.len()
                && other.param_types().eq(def.param_types())
        };
        self.all_callables()
            .into_iter()
            .find(|r| same(self.callable(*r)))
    }
}
