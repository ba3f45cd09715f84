// type_arena/arena.rs
//
// TypeArena: per-compilation storage with automatic deduplication.

use rustc_hash::FxHashMap;

use brim_identity::{ClassId, EnumId, StructId, Symbol};

use super::sema_type::{BuiltinKind, SemaType};
use super::type_id::{TypeId, TypeIdVec};

pub struct TypeArena {
    /// Interned types, indexed by TypeId
    types: Vec<SemaType>,
    /// Deduplication map
    pub(super) intern_map: FxHashMap<SemaType, TypeId>,
}

impl std::fmt::Debug for TypeArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeArena")
            .field("types_count", &self.types.len())
            .finish_non_exhaustive()
    }
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    /// Create a new TypeArena with the builtins pre-interned at their reserved ids
    pub fn new() -> Self {
        let mut arena = Self {
            types: Vec::new(),
            intern_map: FxHashMap::default(),
        };

        let invalid = arena.intern(SemaType::Invalid);
        debug_assert_eq!(invalid, TypeId::INVALID);
        for kind in [
            BuiltinKind::Void,
            BuiltinKind::Byte,
            BuiltinKind::Integer,
            BuiltinKind::Float,
            BuiltinKind::Char,
        ] {
            let id = arena.intern(SemaType::Builtin(kind));
            debug_assert_eq!(id, kind.type_id());
        }
        debug_assert_eq!(arena.types.len() as u32, TypeId::FIRST_DYNAMIC);

        arena
    }

    /// Intern a type, returning existing TypeId if already interned
    fn intern(&mut self, ty: SemaType) -> TypeId {
        let next_id = TypeId::from_raw(self.types.len() as u32);
        *self.intern_map.entry(ty.clone()).or_insert_with(|| {
            self.types.push(ty);
            next_id
        })
    }

    pub fn get(&self, id: TypeId) -> &SemaType {
        &self.types[id.index() as usize]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // Builders. Compound types built from an invalid part are invalid.

    pub fn builtin(&self, kind: BuiltinKind) -> TypeId {
        kind.type_id()
    }

    pub fn pointer(&mut self, to: TypeId) -> TypeId {
        if to.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Pointer(to))
    }

    pub fn stack_array(&mut self, element: TypeId, size: u32) -> TypeId {
        if element.is_invalid() {
            return TypeId::INVALID;
        }
        self.intern(SemaType::StackArray { element, size })
    }

    pub fn function(&mut self, params: TypeIdVec, ret: TypeId) -> TypeId {
        if ret.is_invalid() || params.iter().any(|p| p.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Function { params, ret })
    }

    pub fn struct_type(&mut self, struct_id: StructId, type_args: TypeIdVec) -> TypeId {
        if type_args.iter().any(|a| a.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Struct {
            struct_id,
            type_args,
        })
    }

    pub fn class_type(&mut self, class_id: ClassId, type_args: TypeIdVec) -> TypeId {
        if type_args.iter().any(|a| a.is_invalid()) {
            return TypeId::INVALID;
        }
        self.intern(SemaType::Class {
            class_id,
            type_args,
        })
    }

    pub fn enum_type(&mut self, enum_id: EnumId) -> TypeId {
        self.intern(SemaType::Enum(enum_id))
    }

    pub fn placeholder(&mut self, name: Symbol) -> TypeId {
        self.intern(SemaType::GenericPlaceholder(name))
    }

    // Queries

    pub fn builtin_kind(&self, id: TypeId) -> Option<BuiltinKind> {
        match self.get(id) {
            SemaType::Builtin(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn unwrap_pointer(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            SemaType::Pointer(to) => Some(*to),
            _ => None,
        }
    }

    pub fn unwrap_stack_array(&self, id: TypeId) -> Option<(TypeId, u32)> {
        match self.get(id) {
            SemaType::StackArray { element, size } => Some((*element, *size)),
            _ => None,
        }
    }

    pub fn unwrap_function(&self, id: TypeId) -> Option<(&TypeIdVec, TypeId)> {
        match self.get(id) {
            SemaType::Function { params, ret } => Some((params, *ret)),
            _ => None,
        }
    }

    pub fn unwrap_struct(&self, id: TypeId) -> Option<(StructId, &TypeIdVec)> {
        match self.get(id) {
            SemaType::Struct {
                struct_id,
                type_args,
            } => Some((*struct_id, type_args)),
            _ => None,
        }
    }

    pub fn unwrap_class(&self, id: TypeId) -> Option<(ClassId, &TypeIdVec)> {
        match self.get(id) {
            SemaType::Class {
                class_id,
                type_args,
            } => Some((*class_id, type_args)),
            _ => None,
        }
    }

    pub fn unwrap_enum(&self, id: TypeId) -> Option<EnumId> {
        match self.get(id) {
            SemaType::Enum(enum_id) => Some(*enum_id),
            _ => None,
        }
    }

    pub fn is_pointer(&self, id: TypeId) -> bool {
        matches!(self.get(id), SemaType::Pointer(_))
    }

    pub fn is_class(&self, id: TypeId) -> bool {
        matches!(self.get(id), SemaType::Class { .. })
    }

    pub fn is_placeholder(&self, id: TypeId) -> bool {
        matches!(self.get(id), SemaType::GenericPlaceholder(_))
    }

    /// True iff no generic placeholder is reachable from `id`.
    pub fn all_generics_defined(&self, id: TypeId) -> bool {
        self.first_placeholder(id).is_none()
    }

    /// The first placeholder reachable from `id`, depth first.
    pub fn first_placeholder(&self, id: TypeId) -> Option<Symbol> {
        match self.get(id) {
            SemaType::GenericPlaceholder(name) => Some(*name),
            SemaType::Invalid | SemaType::Builtin(_) | SemaType::Enum(_) => None,
            SemaType::Pointer(inner) => self.first_placeholder(*inner),
            SemaType::StackArray { element, .. } => self.first_placeholder(*element),
            SemaType::Function { params, ret } => params
                .iter()
                .find_map(|p| self.first_placeholder(*p))
                .or_else(|| self.first_placeholder(*ret)),
            SemaType::Struct { type_args, .. } | SemaType::Class { type_args, .. } => {
                type_args.iter().find_map(|a| self.first_placeholder(*a))
            }
        }
    }
}
