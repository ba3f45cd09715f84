// src/type_resolution.rs
//
// Turns written type expressions into interned TypeIds.
//
// Builtin keywords, pointers, arrays and inline function types are handled
// here; every other name goes to the context, which knows the symbol tables
// and the generic parameters in scope.

use smallvec::SmallVec;

use brim_identity::{Span, Symbol};
use brim_syntax::{Expr, TypeExpr, TypeExprKind};

use crate::data_item::DataItem;
use crate::diagnostics::{SemaResult, sema_err};
use crate::type_arena::{TypeArena, TypeId, TypeIdVec};
use crate::well_known::WellKnownNames;

pub trait TypeResolutionContext {
    fn arena_mut(&mut self) -> &mut TypeArena;

    fn well_known(&self) -> &WellKnownNames;

    /// Resolve a user-visible name with its already resolved type arguments.
    /// `Ok(None)` means the name is unknown.
    fn resolve_name(&mut self, name: Symbol, args: TypeIdVec, span: Span) -> SemaResult<Option<TypeId>>;

    /// Compile-time value of an array size expression.
    fn evaluate_size(&mut self, expr: &Expr) -> Option<DataItem>;

    fn name_of(&self, name: Symbol) -> String;
}

pub fn resolve_type_expr(ty: &TypeExpr, ctx: &mut dyn TypeResolutionContext) -> SemaResult<TypeId> {
    match &ty.kind {
        TypeExprKind::Pointer(inner) => {
            let inner = resolve_type_expr(inner, ctx)?;
            Ok(ctx.arena_mut().pointer(inner))
        }
        TypeExprKind::StackArray { element, size } => {
            let element = resolve_type_expr(element, ctx)?;
            let value = ctx
                .evaluate_size(size)
                .and_then(DataItem::as_integer)
                .ok_or_else(|| sema_err!(size.span, ArraySizeNotConstant {}))?;
            let size = u32::try_from(value).map_err(|_| sema_err!(ty.span, InvalidArraySize { size: value }))?;
            Ok(ctx.arena_mut().stack_array(element, size))
        }
        TypeExprKind::Named { name, args } => resolve_named(*name, args, ty.span, ctx),
    }
}

fn builtin_keyword(name: Symbol, wk: &WellKnownNames) -> Option<TypeId> {
    if name == wk.void {
        Some(TypeId::VOID)
    } else if name == wk.byte {
        Some(TypeId::BYTE)
    } else if name == wk.int {
        Some(TypeId::INTEGER)
    } else if name == wk.float {
        Some(TypeId::FLOAT)
    } else if name == wk.char {
        Some(TypeId::CHAR)
    } else {
        None
    }
}

fn resolve_named(
    name: Symbol,
    args: &[TypeExpr],
    span: Span,
    ctx: &mut dyn TypeResolutionContext,
) -> SemaResult<TypeId> {
    if let Some(builtin) = builtin_keyword(name, ctx.well_known()) {
        if !args.is_empty() {
            return Err(sema_err!(span, WrongTypeArgCount {
                expected: 0,
                found: args.len(),
            }));
        }
        return Ok(builtin);
    }

    let mut resolved: TypeIdVec = SmallVec::with_capacity(args.len());
    for arg in args {
        resolved.push(resolve_type_expr(arg, ctx)?);
    }

    // func<R, P1, P2, ...>; bare `func` is void()
    if name == ctx.well_known().func {
        let (ret, params) = match resolved.split_first() {
            Some((ret, params)) => (*ret, params.iter().copied().collect()),
            None => (TypeId::VOID, TypeIdVec::new()),
        };
        return Ok(ctx.arena_mut().function(params, ret));
    }

    match ctx.resolve_name(name, resolved, span)? {
        Some(ty) => Ok(ty),
        None => Err(sema_err!(span, TypeNotFound {
            name: ctx.name_of(name),
        })),
    }
}
