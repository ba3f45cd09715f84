// src/layout.rs
//
// Sizes and field offsets. All sizes are in stack slots.
//
// Structs are packed in declaration order: each field's offset is the sum of
// the stack sizes of the fields before it. Classes are a one-slot reference
// on the stack and carry the packed field block on the heap.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use brim_identity::{Interner, Span, StructId, Symbol};

use crate::diagnostics::{CompileError, SemaResult, internal_err, sema_err};
use crate::entity_defs::AggregateDef;
use crate::entity_registry::EntityRegistry;
use crate::type_arena::{SemaType, TypeArena, TypeId};
use crate::type_display::display_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: Symbol,
    pub offset: u32,
    /// Field type with the owner's type arguments substituted
    pub ty: TypeId,
}

pub struct Layout<'a> {
    arena: &'a mut TypeArena,
    registry: &'a EntityRegistry,
    interner: &'a Interner,
}

impl<'a> Layout<'a> {
    pub fn new(arena: &'a mut TypeArena, registry: &'a EntityRegistry, interner: &'a Interner) -> Self {
        Self {
            arena,
            registry,
            interner,
        }
    }

    /// Slots the value occupies where it is stored directly.
    pub fn size_on_stack(&mut self, ty: TypeId, span: Span) -> SemaResult<u32> {
        let mut visiting = SmallVec::new();
        self.stack_size(ty, span, &mut visiting)
    }

    /// Slots the value occupies on the heap. Pointers and functions have none.
    pub fn size_on_heap(&mut self, ty: TypeId, span: Span) -> SemaResult<u32> {
        match self.arena.get(ty).clone() {
            SemaType::Class { .. } => {
                let mut visiting = SmallVec::new();
                self.fields_size(ty, span, &mut visiting)
            }
            SemaType::Pointer(_) | SemaType::Function { .. } => Err(sema_err!(
                span,
                NoHeapSize {
                    name: display_type(self.arena, self.registry, self.interner, ty)
                }
            )),
            _ => self.size_on_stack(ty, span),
        }
    }

    /// Size of the value itself: heap size for classes, stack size otherwise.
    pub fn size(&mut self, ty: TypeId, span: Span) -> SemaResult<u32> {
        if self.arena.is_class(ty) {
            self.size_on_heap(ty, span)
        } else {
            self.size_on_stack(ty, span)
        }
    }

    fn stack_size(
        &mut self,
        ty: TypeId,
        span: Span,
        visiting: &mut SmallVec<[StructId; 8]>,
    ) -> SemaResult<u32> {
        match self.arena.get(ty).clone() {
            SemaType::Invalid => Err(internal_err!(span, InvalidTypeLayout {})),
            SemaType::Builtin(_)
            | SemaType::Class { .. }
            | SemaType::Enum(_)
            | SemaType::Function { .. }
            | SemaType::Pointer(_) => Ok(1),
            SemaType::StackArray { element, size } => {
                let element_size = self.stack_size(element, span, visiting)?;
                size.checked_mul(element_size)
                    .ok_or_else(|| self.too_large(ty, span))
            }
            SemaType::GenericPlaceholder(name) => Err(sema_err!(
                span,
                SizeOfGeneric {
                    name: self.interner.resolve(name).to_string()
                }
            )),
            SemaType::Struct { struct_id, .. } => {
                if visiting.contains(&struct_id) {
                    let name = self.registry.structs.get(struct_id).name;
                    return Err(sema_err!(
                        span,
                        RecursiveStruct {
                            name: self.interner.resolve(name).to_string()
                        }
                    ));
                }
                visiting.push(struct_id);
                let total = self.fields_size(ty, span, visiting);
                visiting.pop();
                total
            }
        }
    }

    fn fields_size(
        &mut self,
        ty: TypeId,
        span: Span,
        visiting: &mut SmallVec<[StructId; 8]>,
    ) -> SemaResult<u32> {
        let mut total: u32 = 0;
        for field_ty in self.field_types(ty) {
            let size = self.stack_size(field_ty, span, visiting)?;
            total = total
                .checked_add(size)
                .ok_or_else(|| self.too_large(ty, span))?;
        }
        Ok(total)
    }

    fn too_large(&self, ty: TypeId, span: Span) -> CompileError {
        sema_err!(span, TypeTooLarge {
            ty: display_type(self.arena, self.registry, self.interner, ty),
        })
    }

    /// Substituted field types in declaration order.
    fn field_types(&mut self, ty: TypeId) -> Vec<TypeId> {
        let Some((def, subs)) = self.definition(ty) else {
            return Vec::new();
        };
        def.fields
            .iter()
            .map(|f| self.arena.substitute(f.ty, &subs))
            .collect()
    }

    fn definition(&self, ty: TypeId) -> Option<(&'a AggregateDef, FxHashMap<Symbol, TypeId>)> {
        let registry: &'a EntityRegistry = self.registry;
        let (def, args) = match self.arena.get(ty) {
            SemaType::Struct {
                struct_id,
                type_args,
            } => (registry.structs.get(*struct_id), type_args.clone()),
            SemaType::Class {
                class_id,
                type_args,
            } => (registry.classes.get(*class_id), type_args.clone()),
            _ => return None,
        };
        let subs = def
            .type_params
            .iter()
            .copied()
            .zip(args.iter().copied())
            .collect();
        Some((def, subs))
    }

    /// Every field of a struct or class with its packed offset.
    pub fn field_slots(&mut self, ty: TypeId, span: Span) -> SemaResult<Vec<FieldSlot>> {
        let Some((def, subs)) = self.definition(ty) else {
            return Ok(Vec::new());
        };
        let mut slots = Vec::with_capacity(def.fields.len());
        let mut offset: u32 = 0;
        for field in &def.fields {
            let field_ty = self.arena.substitute(field.ty, &subs);
            slots.push(FieldSlot {
                name: field.name,
                offset,
                ty: field_ty,
            });
            let size = self.size_on_stack(field_ty, span)?;
            offset = offset
                .checked_add(size)
                .ok_or_else(|| self.too_large(ty, span))?;
        }
        Ok(slots)
    }

    /// Offset of `field` within a struct or class, and its substituted type.
    pub fn field_offset(&mut self, ty: TypeId, field: Symbol, span: Span) -> SemaResult<Option<FieldSlot>> {
        Ok(self
            .field_slots(ty, span)?
            .into_iter()
            .find(|slot| slot.name == field))
    }
}
