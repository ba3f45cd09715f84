// src/type_display.rs
//
// Human-readable rendering of types and call signatures for diagnostics.

use brim_identity::{Interner, Symbol};

use crate::entity_registry::EntityRegistry;
use crate::type_arena::{SemaType, TypeArena, TypeId};

pub fn display_type(arena: &TypeArena, registry: &EntityRegistry, interner: &Interner, ty: TypeId) -> String {
    let mut out = String::new();
    write_type(&mut out, arena, registry, interner, ty);
    out
}

fn write_type(out: &mut String, arena: &TypeArena, registry: &EntityRegistry, interner: &Interner, ty: TypeId) {
    match arena.get(ty) {
        SemaType::Invalid => out.push_str("<invalid>"),
        SemaType::Builtin(kind) => out.push_str(kind.name()),
        SemaType::Struct {
            struct_id,
            type_args,
        } => {
            out.push_str(interner.resolve(registry.structs.get(*struct_id).name));
            write_args(out, arena, registry, interner, type_args);
        }
        SemaType::Class {
            class_id,
            type_args,
        } => {
            out.push_str(interner.resolve(registry.classes.get(*class_id).name));
            write_args(out, arena, registry, interner, type_args);
        }
        SemaType::Enum(enum_id) => out.push_str(interner.resolve(registry.enums.get(*enum_id).name)),
        SemaType::Function { params, ret } => {
            out.push_str("func<");
            write_type(out, arena, registry, interner, *ret);
            for p in params {
                out.push_str(", ");
                write_type(out, arena, registry, interner, *p);
            }
            out.push('>');
        }
        SemaType::Pointer(inner) => {
            write_type(out, arena, registry, interner, *inner);
            out.push('*');
        }
        SemaType::StackArray { element, size } => {
            write_type(out, arena, registry, interner, *element);
            out.push_str(&format!("[{}]", size));
        }
        SemaType::GenericPlaceholder(name) => out.push_str(interner.resolve(*name)),
    }
}

fn write_args(out: &mut String, arena: &TypeArena, registry: &EntityRegistry, interner: &Interner, args: &[TypeId]) {
    if args.is_empty() {
        return;
    }
    out.push('<');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_type(out, arena, registry, interner, *arg);
    }
    out.push('>');
}

/// `name(int, float*)`
pub fn display_signature(
    arena: &TypeArena,
    registry: &EntityRegistry,
    interner: &Interner,
    name: Symbol,
    arg_types: &[TypeId],
) -> String {
    let args: Vec<String> = arg_types
        .iter()
        .map(|t| display_type(arena, registry, interner, *t))
        .collect();
    format!("{}({})", interner.display_name(name), args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn renders_compound_types() {
        let mut arena = TypeArena::new();
        let registry = EntityRegistry::new();
        let mut interner = Interner::new();
        let ptr = arena.pointer(TypeId::CHAR);
        let arr = arena.stack_array(ptr, 4);
        let func = arena.function(smallvec![TypeId::INTEGER, arr], TypeId::FLOAT);
        assert_eq!(display_type(&arena, &registry, &interner, func), "func<float, int, char*[4]>");

        let name = interner.intern("f");
        assert_eq!(
            display_signature(&arena, &registry, &interner, name, &[TypeId::INTEGER, ptr]),
            "f(int, char*)"
        );
    }
}
