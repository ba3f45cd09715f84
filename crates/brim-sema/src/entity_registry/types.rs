//! Type definition lookup by name.
//!
//! Two definitions with the same name in different files are distinct
//! entities. Name lookup prefers the requesting file, then declaration order.

use brim_identity::{ClassId, EnumId, FileId, GlobalId, MacroId, StructId, Symbol};

use super::EntityRegistry;
use crate::entity_defs::AggregateDef;
use crate::type_arena::{SemaType, TypeArena, TypeId};

/// The definition that owns members: methods, constructors and general
/// functions hang off a struct or class regardless of its type arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnerKey {
    Struct(StructId),
    Class(ClassId),
}

impl OwnerKey {
    pub fn of(arena: &TypeArena, ty: TypeId) -> Option<Self> {
        match arena.get(ty) {
            SemaType::Struct { struct_id, .. } => Some(OwnerKey::Struct(*struct_id)),
            SemaType::Class { class_id, .. } => Some(OwnerKey::Class(*class_id)),
            _ => None,
        }
    }
}

impl EntityRegistry {
    pub fn find_struct(&self, name: Symbol, file: FileId) -> Option<StructId> {
        self.structs
            .find(|s| s.name == name && s.file == file)
            .or_else(|| self.structs.find(|s| s.name == name))
    }

    pub fn find_class(&self, name: Symbol, file: FileId) -> Option<ClassId> {
        self.classes
            .find(|c| c.name == name && c.file == file)
            .or_else(|| self.classes.find(|c| c.name == name))
    }

    pub fn find_enum(&self, name: Symbol, file: FileId) -> Option<EnumId> {
        self.enums
            .find(|e| e.name == name && e.file == file)
            .or_else(|| self.enums.find(|e| e.name == name))
    }

    pub fn find_macro(&self, name: Symbol, file: FileId) -> Option<MacroId> {
        self.macros
            .find(|m| m.name == name && m.file == file)
            .or_else(|| self.macros.find(|m| m.name == name))
    }

    pub fn find_global(&self, name: Symbol, file: FileId) -> Option<GlobalId> {
        self.globals
            .find(|g| g.name == name && g.file == file)
            .or_else(|| self.globals.find(|g| g.name == name))
    }

    /// Any struct, class or enum with this name declared in exactly this file.
    pub fn type_defined_in_file(&self, name: Symbol, file: FileId) -> bool {
        self.structs.find(|s| s.name == name && s.file == file).is_some()
            || self.classes.find(|c| c.name == name && c.file == file).is_some()
            || self.enums.find(|e| e.name == name && e.file == file).is_some()
    }

    /// Struct or class definition behind a type, if it is one.
    pub fn aggregate_of(&self, arena: &TypeArena, ty: TypeId) -> Option<&AggregateDef> {
        match OwnerKey::of(arena, ty)? {
            OwnerKey::Struct(id) => Some(self.structs.get(id)),
            OwnerKey::Class(id) => Some(self.classes.get(id)),
        }
    }

    pub fn aggregate(&self, owner: OwnerKey) -> &AggregateDef {
        match owner {
            OwnerKey::Struct(id) => self.structs.get(id),
            OwnerKey::Class(id) => self.classes.get(id),
        }
    }
}
