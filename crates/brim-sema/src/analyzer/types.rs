// src/analyzer/types.rs
//
// Type-level helpers of the analyzer: name resolution for type expressions,
// implicit conversions, condition types and cast rules.

use brim_identity::{Span, Symbol};
use brim_syntax::{Expr, ExprKind, TypeExpr};

use super::Analyzer;
use crate::consteval::try_compute;
use crate::data_item::DataItem;
use crate::diagnostics::{SemaResult, sema_err};
use crate::entity_defs::AggregateDef;
use crate::type_arena::{SemaType, TypeArena, TypeId, TypeIdVec};
use crate::type_resolution::{TypeResolutionContext, resolve_type_expr};
use crate::well_known::WellKnownNames;

impl TypeResolutionContext for Analyzer {
    fn arena_mut(&mut self) -> &mut TypeArena {
        &mut self.arena
    }

    fn well_known(&self) -> &WellKnownNames {
        &self.well_known
    }

    /// Struct, class, enum, type replacer, generic parameter, function
    /// (its signature type), global (its type), in that order.
    fn resolve_name(&mut self, name: Symbol, args: TypeIdVec, span: Span) -> SemaResult<Option<TypeId>> {
        let file = self.ctx.file;
        if let Some(id) = self.registry.find_struct(name, file) {
            check_arity(self.registry.structs.get(id), &args, span)?;
            return Ok(Some(self.arena.struct_type(id, args)));
        }
        if let Some(id) = self.registry.find_class(name, file) {
            check_arity(self.registry.classes.get(id), &args, span)?;
            return Ok(Some(self.arena.class_type(id, args)));
        }

        let plain = |found: TypeId| -> SemaResult<Option<TypeId>> {
            if !args.is_empty() {
                return Err(sema_err!(span, WrongTypeArgCount {
                    expected: 0,
                    found: args.len(),
                }));
            }
            Ok(Some(found))
        };

        if let Some(id) = self.registry.find_enum(name, file) {
            let ty = self.arena.enum_type(id);
            return plain(ty);
        }
        if let Some(ty) = self.registry.type_replacer(self.interner.resolve(name)) {
            return plain(ty);
        }
        if let Some(ty) = self.ctx.generics.get(&name).copied() {
            return plain(ty);
        }
        let function = self
            .registry
            .free_functions_named(name)
            .into_iter()
            .find(|f| !self.registry.callable(*f).is_template);
        if let Some(function) = function {
            let def = self.registry.callable(function);
            let params: TypeIdVec = def.param_types().collect();
            let ret = def.ret;
            let ty = self.arena.function(params, ret);
            return plain(ty);
        }
        if let Some(id) = self.registry.find_global(name, file) {
            return plain(self.registry.globals.get(id).ty);
        }
        Ok(None)
    }

    fn evaluate_size(&mut self, expr: &Expr) -> Option<DataItem> {
        let value = try_compute(expr, Some(TypeId::INTEGER), self, None)?;
        self.expr_data.set_constant(expr.id, value);
        Some(value)
    }

    fn name_of(&self, name: Symbol) -> String {
        self.name(name)
    }
}

fn check_arity(def: &AggregateDef, args: &TypeIdVec, span: Span) -> SemaResult<()> {
    if def.type_params.len() != args.len() {
        return Err(sema_err!(span, WrongTypeArgCount {
            expected: def.type_params.len(),
            found: args.len(),
        }));
    }
    Ok(())
}

impl Analyzer {
    pub(crate) fn resolve_type(&mut self, ty: &TypeExpr) -> SemaResult<TypeId> {
        resolve_type_expr(ty, self)
    }

    /// Run `f` with `names` bound to their own placeholders, as in the
    /// signature or fields of a template.
    pub(crate) fn with_generics<T>(
        &mut self,
        names: &[Symbol],
        f: impl FnOnce(&mut Self) -> SemaResult<T>,
    ) -> SemaResult<T> {
        let saved = self.ctx.generics.clone();
        for name in names {
            let placeholder = self.arena.placeholder(*name);
            self.ctx.generics.insert(*name, placeholder);
        }
        let result = f(self);
        self.ctx.generics = saved;
        result
    }

    /// Identity, byte to int or float, int to float, char to int, and an
    /// enum to its underlying builtin.
    pub(crate) fn implicitly_converts(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }
        if matches!(
            (from, to),
            (TypeId::BYTE, TypeId::INTEGER)
                | (TypeId::BYTE, TypeId::FLOAT)
                | (TypeId::INTEGER, TypeId::FLOAT)
                | (TypeId::CHAR, TypeId::INTEGER)
        ) {
            return true;
        }
        match self.arena.unwrap_enum(from) {
            Some(id) => self.registry.enums.get(id).underlying == to,
            None => false,
        }
    }

    /// Whether `value` of type `from` may be stored where `to` is expected.
    /// Integer literals that fit a byte are accepted as bytes.
    pub(crate) fn assignable(&self, value: &Expr, from: TypeId, to: TypeId) -> bool {
        self.implicitly_converts(from, to) || (to == TypeId::BYTE && fits_byte(value))
    }

    pub(crate) fn expect_assignable(&self, value: &Expr, from: TypeId, to: TypeId) -> SemaResult<()> {
        if self.assignable(value, from, to) {
            return Ok(());
        }
        Err(sema_err!(value.span, TypeMismatch {
            expected: self.type_name(to),
            found: self.type_name(from),
        }))
    }

    /// Integral builtins, the boolean type and enums can be conditions.
    pub(crate) fn is_condition_type(&self, ty: TypeId) -> bool {
        ty.is_integral() || ty == self.bool_type() || self.arena.unwrap_enum(ty).is_some()
    }

    /// Builtins and enums compare and combine without user operators.
    pub(crate) fn is_scalar(&self, ty: TypeId) -> bool {
        ty.is_numeric() || self.arena.unwrap_enum(ty).is_some()
    }

    /// Builtin of an enum, or the type itself.
    pub(crate) fn underlying(&self, ty: TypeId) -> TypeId {
        match self.arena.unwrap_enum(ty) {
            Some(id) => self.registry.enums.get(id).underlying,
            None => ty,
        }
    }

    /// Explicit casts: between numeric builtins, enums and their integral
    /// values, pointers and pointers, and pointers and int.
    pub(crate) fn can_cast(&self, from: TypeId, to: TypeId) -> bool {
        let from_ptr = self.arena.is_pointer(from);
        let to_ptr = self.arena.is_pointer(to);
        match (from_ptr, to_ptr) {
            (true, true) => true,
            (true, false) => to == TypeId::INTEGER,
            (false, true) => from == TypeId::INTEGER,
            (false, false) => {
                let from = self.underlying(from);
                let to = self.underlying(to);
                from.is_numeric() && to.is_numeric() && !(from == TypeId::FLOAT && to == TypeId::CHAR)
            }
        }
    }

    /// Struct or class behind a value, looking through one pointer.
    pub(crate) fn aggregate_type(&self, ty: TypeId) -> Option<TypeId> {
        match self.arena.get(ty) {
            SemaType::Struct { .. } | SemaType::Class { .. } => Some(ty),
            SemaType::Pointer(inner) => match self.arena.get(*inner) {
                SemaType::Struct { .. } | SemaType::Class { .. } => Some(*inner),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Non-negative integer literal small enough for a byte.
pub(crate) fn fits_byte(expr: &Expr) -> bool {
    matches!(expr.ungrouped().kind, ExprKind::IntLiteral(v) if (0..=255).contains(&v))
}
