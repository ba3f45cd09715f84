// src/address.rs
//
// Storage addresses of lvalue expressions.
//
// Nothing is cached: every query walks the expression again, so results
// always reflect the current layout.
//
// Struct fields add their packed offset to the enclosing value. Going through
// a pointer, a class reference or a `ref` parameter moves into a referenced
// object: the offset restarts from that object, and from then on the offset
// is relative to it. Once in the heap an address stays in the heap.

use brim_identity::{Interner, Span, Symbol};
use brim_syntax::{Expr, ExprKind};

use crate::consteval::{ComputeEnv, ComputeMemo, try_compute};
use crate::diagnostics::{SemaResult, sema_err};
use crate::entity_defs::GeneralKind;
use crate::entity_registry::{EntityRegistry, OwnerKey};
use crate::layout::Layout;
use crate::type_arena::{SemaType, TypeArena, TypeId};
use crate::type_display::display_type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    /// Global area
    Absolute,
    BasePointerRelative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueAddress {
    pub offset: i32,
    pub mode: AddressMode,
    /// The slot holds the address of the value rather than the value
    pub is_reference: bool,
    pub in_heap: bool,
}

impl ValueAddress {
    pub fn local(offset: i32) -> Self {
        Self {
            offset,
            mode: AddressMode::BasePointerRelative,
            is_reference: false,
            in_heap: false,
        }
    }

    pub fn global(offset: i32) -> Self {
        Self {
            offset,
            mode: AddressMode::Absolute,
            is_reference: false,
            in_heap: false,
        }
    }
}

/// Where named variables live.
pub trait StorageLookup {
    fn storage_of(&self, name: Symbol) -> Option<(ValueAddress, TypeId)>;
}

/// Intermediate result of walking an lvalue.
#[derive(Debug, Clone, Copy)]
struct Walk {
    base: ValueAddress,
    offset: i32,
    indirect: bool,
    in_heap: bool,
    ty: TypeId,
}

pub struct AddressResolver<'a> {
    arena: &'a mut TypeArena,
    registry: &'a EntityRegistry,
    interner: &'a Interner,
    memo: Option<&'a ComputeMemo>,
}

impl<'a> AddressResolver<'a> {
    pub fn new(arena: &'a mut TypeArena, registry: &'a EntityRegistry, interner: &'a Interner) -> Self {
        Self {
            arena,
            registry,
            interner,
            memo: None,
        }
    }

    /// Consult values folded during analysis before evaluating indices.
    pub fn with_memo(mut self, memo: &'a ComputeMemo) -> Self {
        self.memo = Some(memo);
        self
    }

    /// Address and type of `expr`. The offset is absolute for direct
    /// storage and relative to the referenced object otherwise.
    pub fn resolve(
        &mut self,
        expr: &Expr,
        storage: &dyn StorageLookup,
        env: &mut dyn ComputeEnv,
    ) -> SemaResult<(ValueAddress, TypeId)> {
        let walk = self.walk(expr, storage, env)?;
        let offset = if walk.indirect {
            walk.offset
        } else {
            walk.base.offset + walk.offset
        };
        Ok((
            ValueAddress {
                offset,
                mode: walk.base.mode,
                is_reference: walk.base.is_reference,
                in_heap: walk.in_heap,
            },
            walk.ty,
        ))
    }

    /// Storage of the variable at the bottom of `expr`.
    pub fn base_address(
        &mut self,
        expr: &Expr,
        storage: &dyn StorageLookup,
        env: &mut dyn ComputeEnv,
    ) -> SemaResult<ValueAddress> {
        Ok(self.walk(expr, storage, env)?.base)
    }

    /// Offset of the accessed data from the start of the object it lives in.
    pub fn data_offset(
        &mut self,
        expr: &Expr,
        storage: &dyn StorageLookup,
        env: &mut dyn ComputeEnv,
    ) -> SemaResult<i32> {
        Ok(self.walk(expr, storage, env)?.offset)
    }

    fn layout(&mut self) -> Layout<'_> {
        Layout::new(self.arena, self.registry, self.interner)
    }

    fn type_name(&self, ty: TypeId) -> String {
        display_type(self.arena, self.registry, self.interner, ty)
    }

    fn walk(&mut self, expr: &Expr, storage: &dyn StorageLookup, env: &mut dyn ComputeEnv) -> SemaResult<Walk> {
        match &expr.kind {
            ExprKind::Identifier(name) => {
                let Some((base, ty)) = storage.storage_of(*name) else {
                    return Err(sema_err!(expr.span, UndefinedVariable {
                        name: self.interner.display_name(*name).to_string(),
                    }));
                };
                Ok(Walk {
                    base,
                    offset: 0,
                    indirect: base.is_reference,
                    in_heap: false,
                    ty,
                })
            }
            ExprKind::Grouping(inner) => self.walk(inner, storage, env),
            ExprKind::Field(field) => {
                let inner = self.walk(&field.object, storage, env)?;
                self.field(inner, field.field, expr.span)
            }
            ExprKind::Index(index) => {
                let inner = self.walk(&index.object, storage, env)?;
                self.index(inner, &index.index, env, expr.span)
            }
            ExprKind::Deref(inner) => {
                let inner = self.walk(inner, storage, env)?;
                let Some(pointee) = self.arena.unwrap_pointer(inner.ty) else {
                    return Err(sema_err!(expr.span, InvalidDeref {
                        ty: self.type_name(inner.ty),
                    }));
                };
                Ok(Walk {
                    offset: 0,
                    indirect: true,
                    in_heap: true,
                    ty: pointee,
                    ..inner
                })
            }
            _ => Err(sema_err!(expr.span, NotAnLvalue {})),
        }
    }

    fn field(&mut self, inner: Walk, name: Symbol, span: Span) -> SemaResult<Walk> {
        // `p.x` on a pointer reaches through it
        let (object_ty, through_pointer) = match self.arena.unwrap_pointer(inner.ty) {
            Some(pointee) => (pointee, true),
            None => (inner.ty, false),
        };
        let enters_heap = through_pointer || self.arena.is_class(object_ty);
        if !matches!(self.arena.get(object_ty), SemaType::Struct { .. } | SemaType::Class { .. }) {
            return Err(sema_err!(span, FieldNotFound {
                ty: self.type_name(inner.ty),
                field: self.interner.display_name(name).to_string(),
            }));
        }
        let Some(slot) = self.layout().field_offset(object_ty, name, span)? else {
            return Err(sema_err!(span, FieldNotFound {
                ty: self.type_name(object_ty),
                field: self.interner.display_name(name).to_string(),
            }));
        };
        let field_offset = i32::try_from(slot.offset).map_err(|_| sema_err!(span, AddressOverflow {}))?;
        let offset = if enters_heap {
            field_offset
        } else {
            inner
                .offset
                .checked_add(field_offset)
                .ok_or_else(|| sema_err!(span, AddressOverflow {}))?
        };
        Ok(Walk {
            offset,
            indirect: inner.indirect || enters_heap,
            in_heap: inner.in_heap || enters_heap,
            ty: slot.ty,
            ..inner
        })
    }

    fn index(&mut self, inner: Walk, index: &Expr, env: &mut dyn ComputeEnv, span: Span) -> SemaResult<Walk> {
        if let Some(owner) = OwnerKey::of(self.arena, inner.ty)
            && self.has_indexer(owner)
        {
            return Err(sema_err!(span, AddressRequiresIndexer {
                ty: self.type_name(inner.ty),
            }));
        }

        match self.arena.get(inner.ty).clone() {
            SemaType::StackArray { element, size } => {
                let i = self.constant_index(index, env)?;
                if i < 0 || i >= size as i64 {
                    return Err(sema_err!(index.span, IndexOutOfBounds { index: i, size }));
                }
                let element_size = self.layout().size_on_stack(element, span)?;
                let offset = element_offset(i, element_size)
                    .and_then(|o| o.checked_add(inner.offset))
                    .ok_or_else(|| sema_err!(span, AddressOverflow {}))?;
                Ok(Walk {
                    offset,
                    ty: element,
                    ..inner
                })
            }
            SemaType::Pointer(element) => {
                let i = self.constant_index(index, env)?;
                let element_size = self.layout().size_on_stack(element, span)?;
                let offset = element_offset(i, element_size).ok_or_else(|| sema_err!(span, AddressOverflow {}))?;
                Ok(Walk {
                    offset,
                    indirect: true,
                    in_heap: true,
                    ty: element,
                    ..inner
                })
            }
            _ => Err(sema_err!(span, NotAnLvalue {})),
        }
    }

    fn constant_index(&self, index: &Expr, env: &mut dyn ComputeEnv) -> SemaResult<i64> {
        try_compute(index, Some(TypeId::INTEGER), env, self.memo)
            .and_then(|v| v.as_integer())
            .ok_or_else(|| sema_err!(index.span, IndexNotConstant {}))
    }

    fn has_indexer(&self, owner: OwnerKey) -> bool {
        [GeneralKind::IndexerGet, GeneralKind::IndexerSet]
            .into_iter()
            .any(|kind| !self.registry.general_functions_for(self.arena, owner, kind).is_empty())
    }
}

/// Slot offset of element `index`, or `None` when it does not fit in an `i32`.
fn element_offset(index: i64, element_size: u32) -> Option<i32> {
    index
        .checked_mul(i64::from(element_size))
        .and_then(|offset| i32::try_from(offset).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brim_identity::FileId;
    use brim_syntax::AstBuilder;
    use rustc_hash::FxHashMap;
    use smallvec::smallvec;

    use crate::consteval::LiteralEnv;
    use crate::entity_defs::{AggregateDef, CallableDef, CallableKind, FieldDef, ParamDef};
    use crate::errors::SemanticError;
    use crate::generic::TypeArguments;

    struct Frame(FxHashMap<Symbol, (ValueAddress, TypeId)>);

    impl StorageLookup for Frame {
        fn storage_of(&self, name: Symbol) -> Option<(ValueAddress, TypeId)> {
            self.0.get(&name).copied()
        }
    }

    struct Fixture {
        b: AstBuilder,
        arena: TypeArena,
        registry: EntityRegistry,
        frame: Frame,
        vec2: TypeId,
        line: TypeId,
    }

    fn aggregate(b: &mut AstBuilder, name: &str, fields: &[(&str, TypeId)]) -> AggregateDef {
        AggregateDef {
            name: b.sym(name),
            file: FileId::new(0),
            type_params: Vec::new(),
            fields: fields
                .iter()
                .map(|(n, ty)| FieldDef {
                    name: b.sym(n),
                    ty: *ty,
                    span: Span::default(),
                })
                .collect(),
            span: Span::default(),
        }
    }

    // struct Vec2 { x: int, y: int }
    // struct Line { tag: byte, a: Vec2, b: Vec2 }
    // class Shape { id: int, line: Line }
    fn fixture() -> Fixture {
        let mut b = AstBuilder::new();
        let mut arena = TypeArena::new();
        let mut registry = EntityRegistry::new();
        let vec2_id = registry
            .structs
            .push(aggregate(&mut b, "Vec2", &[("x", TypeId::INTEGER), ("y", TypeId::INTEGER)]));
        let vec2 = arena.struct_type(vec2_id, smallvec![]);
        let line_id = registry
            .structs
            .push(aggregate(&mut b, "Line", &[("tag", TypeId::BYTE), ("a", vec2), ("b", vec2)]));
        let line = arena.struct_type(line_id, smallvec![]);
        let shape_id = registry
            .classes
            .push(aggregate(&mut b, "Shape", &[("id", TypeId::INTEGER), ("line", line)]));
        let shape = arena.class_type(shape_id, smallvec![]);
        let line_ptr = arena.pointer(line);
        let points = arena.stack_array(vec2, 3);

        let mut frame = FxHashMap::default();
        frame.insert(b.sym("l"), (ValueAddress::local(4), line));
        frame.insert(b.sym("s"), (ValueAddress::local(9), shape));
        frame.insert(b.sym("p"), (ValueAddress::global(20), line_ptr));
        frame.insert(b.sym("pts"), (ValueAddress::local(10), points));
        let by_ref = ValueAddress {
            is_reference: true,
            ..ValueAddress::local(-3)
        };
        frame.insert(b.sym("r"), (by_ref, line));
        Fixture {
            b,
            arena,
            registry,
            frame: Frame(frame),
            vec2,
            line,
        }
    }

    impl Fixture {
        fn resolve(&mut self, expr: &Expr) -> SemaResult<(ValueAddress, TypeId)> {
            let interner = self.b.interner().clone();
            AddressResolver::new(&mut self.arena, &self.registry, &interner).resolve(expr, &self.frame, &mut LiteralEnv)
        }
    }

    #[test]
    fn nested_struct_fields_add_offsets() {
        let mut f = fixture();
        let l = f.b.ident("l");
        let b_field = f.b.field(l, "b");
        let y = f.b.field(b_field, "y");
        let (addr, ty) = f.resolve(&y).unwrap();
        // l at 4, b after tag(1) + a(2), y after x(1)
        assert_eq!(addr, ValueAddress::local(4 + 3 + 1));
        assert_eq!(ty, TypeId::INTEGER);

        let l = f.b.ident("l");
        let grouped = f.b.group(l);
        let (addr, ty) = f.resolve(&grouped).unwrap();
        assert_eq!(addr, ValueAddress::local(4));
        assert_eq!(ty, f.line);
    }

    #[test]
    fn base_and_data_offset_split_the_address() {
        let mut f = fixture();
        let s = f.b.ident("s");
        let line = f.b.field(s, "line");
        let a = f.b.field(line, "a");
        let interner = f.b.interner().clone();
        let mut resolver = AddressResolver::new(&mut f.arena, &f.registry, &interner);
        let base = resolver.base_address(&a, &f.frame, &mut LiteralEnv).unwrap();
        let offset = resolver.data_offset(&a, &f.frame, &mut LiteralEnv).unwrap();
        assert_eq!(base, ValueAddress::local(9));
        // id(1) + tag(1)
        assert_eq!(offset, 2);
    }

    #[test]
    fn class_and_pointer_access_restart_in_heap() {
        let mut f = fixture();
        let s = f.b.ident("s");
        let line = f.b.field(s, "line");
        let a = f.b.field(line, "a");
        let y = f.b.field(a, "y");
        let (addr, _) = f.resolve(&y).unwrap();
        assert!(addr.in_heap);
        // id(1) + tag(1) + x(1)
        assert_eq!(addr.offset, 3);
        assert_eq!(addr.mode, AddressMode::BasePointerRelative);

        let p = f.b.ident("p");
        let b_field = f.b.field(p, "b");
        let (addr, ty) = f.resolve(&b_field).unwrap();
        assert!(addr.in_heap);
        assert_eq!(addr.offset, 3);
        assert_eq!(addr.mode, AddressMode::Absolute);
        assert_eq!(ty, f.vec2);

        let p = f.b.ident("p");
        let deref = f.b.deref(p);
        let (addr, ty) = f.resolve(&deref).unwrap();
        assert!(addr.in_heap);
        assert_eq!(addr.offset, 0);
        assert_eq!(ty, f.line);
    }

    #[test]
    fn reference_parameters_are_indirect() {
        let mut f = fixture();
        let r = f.b.ident("r");
        let a = f.b.field(r, "a");
        let (addr, _) = f.resolve(&a).unwrap();
        assert!(addr.is_reference);
        assert!(!addr.in_heap);
        assert_eq!(addr.offset, 1);
    }

    #[test]
    fn array_indexing_needs_constant_in_bounds() {
        let mut f = fixture();
        let pts = f.b.ident("pts");
        let two = f.b.int(2);
        let elem = f.b.index(pts, two);
        let y = f.b.field(elem, "y");
        let (addr, _) = f.resolve(&y).unwrap();
        assert_eq!(addr, ValueAddress::local(10 + 4 + 1));

        let pts = f.b.ident("pts");
        let three = f.b.int(3);
        let out = f.b.index(pts, three);
        let err = f.resolve(&out).unwrap_err();
        assert!(matches!(
            err.as_semantic(),
            Some(SemanticError::IndexOutOfBounds { index: 3, size: 3, .. })
        ));

        let pts = f.b.ident("pts");
        let i = f.b.ident("i");
        let dynamic = f.b.index(pts, i);
        let err = f.resolve(&dynamic).unwrap_err();
        assert!(matches!(err.as_semantic(), Some(SemanticError::IndexNotConstant { .. })));
    }

    #[test]
    fn pointer_offset_that_overflows_is_an_error() {
        let mut f = fixture();
        let p = f.b.ident("p");
        let far = f.b.int(1_000_000_000);
        let elem = f.b.index(p, far);
        let a = f.b.field(elem, "a");
        let err = f.resolve(&a).unwrap_err();
        assert!(matches!(err.as_semantic(), Some(SemanticError::AddressOverflow { .. })));
    }

    #[test]
    fn rvalues_and_indexers_have_no_address() {
        let mut f = fixture();
        let call = f.b.call("make", vec![]);
        let err = f.resolve(&call).unwrap_err();
        assert!(matches!(err.as_semantic(), Some(SemanticError::NotAnLvalue { .. })));

        let this = f.b.sym("this");
        let index = f.b.sym("index");
        let getter = f.b.sym("indexer_get");
        let line = f.line;
        f.registry.push_callable(CallableDef {
            name: getter,
            kind: CallableKind::General(GeneralKind::IndexerGet),
            file: FileId::new(0),
            params: vec![
                ParamDef {
                    name: this,
                    ty: line,
                    modifier: None,
                },
                ParamDef {
                    name: index,
                    ty: TypeId::INTEGER,
                    modifier: None,
                },
            ],
            ret: TypeId::INTEGER,
            type_params: Vec::new(),
            owner: Some(line),
            owner_type_params: Vec::new(),
            is_template: false,
            body: None,
            external: None,
            template_origin: None,
            type_args: TypeArguments::new(),
            span: Span::default(),
        });
        let l = f.b.ident("l");
        let zero = f.b.int(0);
        let indexed = f.b.index(l, zero);
        let err = f.resolve(&indexed).unwrap_err();
        assert!(matches!(err.as_semantic(), Some(SemanticError::AddressRequiresIndexer { .. })));
    }
}
