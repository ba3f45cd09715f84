// type_arena/substitution.rs
//
// Type substitution methods for generic instantiation.

use rustc_hash::FxHashMap;

use brim_identity::Symbol;

use super::arena::TypeArena;
use super::sema_type::SemaType;
use super::type_id::{TypeId, TypeIdVec};

impl TypeArena {
    /// Substitute generic placeholders with concrete types.
    ///
    /// Same input produces the same TypeId through interning.
    pub fn substitute(&mut self, ty: TypeId, subs: &FxHashMap<Symbol, TypeId>) -> TypeId {
        if subs.is_empty() {
            return ty;
        }

        // Clone the interned type to release the borrow
        match self.get(ty).clone() {
            SemaType::GenericPlaceholder(name) => subs.get(&name).copied().unwrap_or(ty),
            SemaType::Invalid | SemaType::Builtin(_) | SemaType::Enum(_) => ty,
            SemaType::Pointer(inner) => {
                let new_inner = self.substitute(inner, subs);
                self.pointer(new_inner)
            }
            SemaType::StackArray { element, size } => {
                let new_element = self.substitute(element, subs);
                self.stack_array(new_element, size)
            }
            SemaType::Function { params, ret } => {
                let new_params: TypeIdVec =
                    params.iter().map(|&p| self.substitute(p, subs)).collect();
                let new_ret = self.substitute(ret, subs);
                self.function(new_params, new_ret)
            }
            SemaType::Struct {
                struct_id,
                type_args,
            } => {
                let new_args: TypeIdVec =
                    type_args.iter().map(|&a| self.substitute(a, subs)).collect();
                self.struct_type(struct_id, new_args)
            }
            SemaType::Class {
                class_id,
                type_args,
            } => {
                let new_args: TypeIdVec =
                    type_args.iter().map(|&a| self.substitute(a, subs)).collect();
                self.class_type(class_id, new_args)
            }
        }
    }

    /// Read-only substitution: returns the substituted type only if it is
    /// already interned. Used where the arena is borrowed immutably.
    pub fn lookup_substitute(&self, ty: TypeId, subs: &FxHashMap<Symbol, TypeId>) -> Option<TypeId> {
        if subs.is_empty() {
            return Some(ty);
        }

        let rebuilt = match self.get(ty) {
            SemaType::GenericPlaceholder(name) => return Some(subs.get(name).copied().unwrap_or(ty)),
            SemaType::Invalid | SemaType::Builtin(_) | SemaType::Enum(_) => return Some(ty),
            SemaType::Pointer(inner) => {
                let new_inner = self.lookup_substitute(*inner, subs)?;
                if new_inner == *inner {
                    return Some(ty);
                }
                SemaType::Pointer(new_inner)
            }
            SemaType::StackArray { element, size } => {
                let new_element = self.lookup_substitute(*element, subs)?;
                if new_element == *element {
                    return Some(ty);
                }
                SemaType::StackArray {
                    element: new_element,
                    size: *size,
                }
            }
            SemaType::Function { params, ret } => {
                let new_params: Option<TypeIdVec> = params
                    .iter()
                    .map(|&p| self.lookup_substitute(p, subs))
                    .collect();
                SemaType::Function {
                    params: new_params?,
                    ret: self.lookup_substitute(*ret, subs)?,
                }
            }
            SemaType::Struct {
                struct_id,
                type_args,
            } => {
                let new_args: Option<TypeIdVec> = type_args
                    .iter()
                    .map(|&a| self.lookup_substitute(a, subs))
                    .collect();
                SemaType::Struct {
                    struct_id: *struct_id,
                    type_args: new_args?,
                }
            }
            SemaType::Class {
                class_id,
                type_args,
            } => {
                let new_args: Option<TypeIdVec> = type_args
                    .iter()
                    .map(|&a| self.lookup_substitute(a, subs))
                    .collect();
                SemaType::Class {
                    class_id: *class_id,
                    type_args: new_args?,
                }
            }
        };
        self.intern_map.get(&rebuilt).copied()
    }
}
