// src/analyzer/expr.rs
//
// Expression checking. Every checked expression gets its type recorded in
// ExpressionData; calls, operators and indexing also record what they
// resolved to.

use brim_identity::Symbol;
use brim_syntax::ast::*;

use super::Analyzer;
use super::types::fits_byte;
use crate::consteval::try_compute;
use crate::data_item::DataItem;
use crate::diagnostics::{SemaResult, sema_err};
use crate::entity_defs::{CallableRef, GeneralKind};
use crate::entity_registry::OwnerKey;
use crate::errors::SemanticHint;
use crate::expression_data::ResolvedCall;
use crate::overload::select_function_value;
use crate::type_arena::TypeId;

/// What an index expression turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum IndexOutcome {
    /// Readable (and, for arrays and pointers, writable) element
    Value(TypeId),
    /// Assignment through a user indexer; the whole statement is the call
    Setter,
}

/// Byte < char < int < float.
fn promote(left: TypeId, right: TypeId) -> TypeId {
    let rank = |ty: TypeId| match ty {
        TypeId::BYTE => 0,
        TypeId::CHAR => 1,
        TypeId::INTEGER => 2,
        _ => 3,
    };
    if rank(left) >= rank(right) { left } else { right }
}

impl Analyzer {
    /// Check `expr` and record its type. `expected` only guides literal
    /// widths; callers check assignability themselves.
    pub(crate) fn check_expr(&mut self, expr: &Expr, expected: Option<TypeId>) -> SemaResult<TypeId> {
        let ty = self.check_expr_kind(expr, expected)?;
        self.expr_data.set_type(expr.id, ty);
        Ok(ty)
    }

    fn check_expr_kind(&mut self, expr: &Expr, expected: Option<TypeId>) -> SemaResult<TypeId> {
        match &expr.kind {
            ExprKind::IntLiteral(v) => {
                if expected == Some(TypeId::BYTE) && (0..=255).contains(v) {
                    Ok(TypeId::BYTE)
                } else {
                    Ok(TypeId::INTEGER)
                }
            }
            ExprKind::FloatLiteral(_) => Ok(TypeId::FLOAT),
            ExprKind::CharLiteral(_) => Ok(TypeId::CHAR),
            ExprKind::BoolLiteral(_) => Ok(self.bool_type()),
            ExprKind::StringLiteral(_) => Ok(self.string_type()),
            ExprKind::Identifier(name) => self.check_identifier(expr, *name, expected),
            ExprKind::Binary(bin) => self.check_binary(expr, bin, expected),
            ExprKind::Unary(un) => self.check_unary(expr, un),
            ExprKind::Call(call) => self.check_call(expr, call, expected),
            ExprKind::MethodCall(call) => self.check_method_call(expr, call),
            ExprKind::Field(field) => self.check_field(expr, field),
            ExprKind::Index(index) => match self.check_index(expr, index, None)? {
                IndexOutcome::Value(ty) => Ok(ty),
                IndexOutcome::Setter => Ok(TypeId::VOID),
            },
            ExprKind::Cast(cast) => self.check_cast(expr, cast),
            ExprKind::New(construct) => self.check_construct(expr, construct, true),
            ExprKind::Construct(construct) => self.check_construct(expr, construct, false),
            ExprKind::AddressOf(inner) => {
                if !inner.is_lvalue_shape() {
                    return Err(sema_err!(inner.span, NotAnLvalue {}));
                }
                let ty = self.check_expr(inner, None)?;
                self.validate_address(inner)?;
                Ok(self.arena.pointer(ty))
            }
            ExprKind::Deref(inner) => {
                let ty = self.check_expr(inner, None)?;
                self.arena.unwrap_pointer(ty).ok_or_else(|| {
                    sema_err!(expr.span, InvalidDeref {
                        ty: self.type_name(ty),
                    })
                })
            }
            ExprKind::Keyword(kw) => self.check_keyword(expr, kw),
            ExprKind::Grouping(inner) => {
                let ty = self.check_expr(inner, expected)?;
                if let Some(value) = self.expr_data.constant(inner.id) {
                    self.expr_data.set_constant(expr.id, value);
                }
                Ok(ty)
            }
        }
    }

    /// Local, constant, global, function value, in that order.
    fn check_identifier(
        &mut self,
        expr: &Expr,
        name: Symbol,
        expected: Option<TypeId>,
    ) -> SemaResult<TypeId> {
        if let Some(local) = self.locals.lookup(name) {
            return Ok(local.ty);
        }
        if let Some(constant) = self.constants.lookup(name) {
            let (value, ty) = (constant.value, constant.ty);
            self.expr_data.set_constant(expr.id, value);
            return Ok(ty);
        }
        if let Some(id) = self.registry.find_global(name, self.ctx.file) {
            return Ok(self.registry.globals.get(id).ty);
        }

        let candidates = self.registry.free_functions_named(name);
        if !candidates.is_empty() {
            let selected = select_function_value(&self.registry, &self.arena, &candidates, expected);
            let Ok(Some(function)) = selected else {
                return Err(sema_err!(expr.span, AmbiguousFunction { name: self.name(name) }));
            };
            self.expr_data.set_call(expr.id, ResolvedCall::FunctionValue(function));
            self.note_reference(function);
            let def = self.registry.callable(function);
            let params = def.param_types().collect();
            let ret = def.ret;
            return Ok(self.arena.function(params, ret));
        }

        if self.registry.find_macro(name, self.ctx.file).is_some() {
            return Err(sema_err!(expr.span, MacroAsValue { name: self.name(name) }));
        }
        Err(sema_err!(expr.span, UndefinedVariable { name: self.name(name) }))
    }

    /// Record the compile-time value of an expression built from builtins,
    /// when it has one.
    fn fold(&mut self, expr: &Expr, expected: Option<TypeId>) {
        if let Some(value) = try_compute(expr, expected, self, None) {
            self.expr_data.set_constant(expr.id, value);
        }
    }

    fn check_binary(&mut self, expr: &Expr, bin: &BinaryExpr, expected: Option<TypeId>) -> SemaResult<TypeId> {
        if bin.op.is_logical() {
            let bool_type = self.bool_type();
            for operand in [&bin.left, &bin.right] {
                let ty = self.check_expr(operand, Some(bool_type))?;
                if !self.is_condition_type(ty) {
                    return Err(sema_err!(operand.span, InvalidCondition {
                        found: self.type_name(ty),
                    }));
                }
            }
            self.expr_data.set_call(expr.id, ResolvedCall::BuiltinOperator);
            self.fold(expr, None);
            return Ok(bool_type);
        }

        let hint = if bin.op.is_comparison() {
            None
        } else {
            expected.filter(|ty| ty.is_numeric())
        };
        let left = self.check_expr(&bin.left, hint)?;
        let right = self.check_expr(&bin.right, Some(left))?;

        if let Some(result) = self.builtin_binary(bin.op, left, right) {
            self.expr_data.set_call(expr.id, ResolvedCall::BuiltinOperator);
            self.fold(expr, hint);
            return Ok(result);
        }

        let candidates = self.registry.operators_for(OperatorKind::Binary(bin.op));
        let operands = [&bin.left, &bin.right];
        match self.resolve_callable(&candidates, &[left, right], &operands, &[], expr.span)? {
            Some(operator) => {
                self.expr_data.set_call(expr.id, ResolvedCall::Callable(operator));
                self.settle_args(operator, &operands)?;
                Ok(self.registry.callable(operator).ret)
            }
            None => Err(sema_err!(expr.span, OperatorNotFound {
                signature: format!(
                    "operator{}({}, {})",
                    bin.op.as_str(),
                    self.type_name(left),
                    self.type_name(right)
                ),
            })),
        }
    }

    /// Result type of a binary operator applied to builtin operands, or
    /// `None` when a user operator is needed.
    fn builtin_binary(&self, op: BinaryOp, left: TypeId, right: TypeId) -> Option<TypeId> {
        let bool_type = self.bool_type();
        if self.arena.is_pointer(left) {
            return match op {
                BinaryOp::Add | BinaryOp::Sub if right.is_integral() => Some(left),
                BinaryOp::Sub if right == left => Some(TypeId::INTEGER),
                BinaryOp::Eq | BinaryOp::Ne if right == left => Some(bool_type),
                _ => None,
            };
        }
        if !self.is_scalar(left) || !self.is_scalar(right) {
            return None;
        }
        if let (Some(a), Some(b)) = (self.arena.unwrap_enum(left), self.arena.unwrap_enum(right))
            && a != b
        {
            return None;
        }

        let left = self.underlying(left);
        let right = self.underlying(right);
        if op.is_comparison() {
            return Some(bool_type);
        }
        if (op.is_bitwise() || op == BinaryOp::Mod) && !(left.is_integral() && right.is_integral()) {
            return None;
        }
        Some(promote(left, right))
    }

    fn check_unary(&mut self, expr: &Expr, un: &UnaryExpr) -> SemaResult<TypeId> {
        let operand = self.check_expr(&un.operand, None)?;
        let base = self.underlying(operand);
        let builtin = match un.op {
            UnaryOp::Not if self.is_condition_type(operand) => Some(self.bool_type()),
            UnaryOp::Neg if base.is_numeric() && base != TypeId::CHAR => Some(base),
            UnaryOp::BitNot if base.is_integral() => Some(base),
            _ => None,
        };
        if let Some(result) = builtin {
            self.expr_data.set_call(expr.id, ResolvedCall::BuiltinOperator);
            self.fold(expr, None);
            return Ok(result);
        }

        let candidates = self.registry.operators_for(OperatorKind::Unary(un.op));
        let operands = [&un.operand];
        match self.resolve_callable(&candidates, &[operand], &operands, &[], expr.span)? {
            Some(operator) => {
                self.expr_data.set_call(expr.id, ResolvedCall::Callable(operator));
                self.settle_args(operator, &operands)?;
                Ok(self.registry.callable(operator).ret)
            }
            None => Err(sema_err!(expr.span, OperatorNotFound {
                signature: format!("operator{}({})", un.op.as_str(), self.type_name(operand)),
            })),
        }
    }

    fn check_field(&mut self, expr: &Expr, field: &FieldExpr) -> SemaResult<TypeId> {
        if let Some(id) = self.enum_named_by(&field.object) {
            let def = self.registry.enums.get(id);
            let Some(member) = def.member(field.field) else {
                return Err(sema_err!(expr.span, FieldNotFound {
                    ty: self.name(def.name),
                    field: self.name(field.field),
                }));
            };
            let value = member.value;
            self.expr_data.set_constant(expr.id, value);
            return Ok(self.arena.enum_type(id));
        }

        let object = self.check_expr(&field.object, None)?;
        if field.field == self.well_known.length
            && let Some((_, size)) = self.arena.unwrap_stack_array(object)
        {
            self.expr_data.set_constant(expr.id, DataItem::Integer(size as i32));
            return Ok(TypeId::INTEGER);
        }
        if let Some(aggregate) = self.aggregate_type(object)
            && let Some(slot) = self.layout().field_offset(aggregate, field.field, expr.span)?
        {
            return Ok(slot.ty);
        }
        Err(sema_err!(expr.span, FieldNotFound {
            ty: self.type_name(object),
            field: self.name(field.field),
        }))
    }

    /// Indexing. `assigned` is the right-hand side when the index expression
    /// is the target of an assignment, so a declared setter can take over.
    pub(super) fn check_index(
        &mut self,
        expr: &Expr,
        index: &IndexExpr,
        assigned: Option<&Expr>,
    ) -> SemaResult<IndexOutcome> {
        let object = self.check_expr(&index.object, None)?;

        if let Some(owner) = OwnerKey::of(&self.arena, object) {
            let index_ty = self.check_expr(&index.index, Some(TypeId::INTEGER))?;
            let not_found = |this: &Self| {
                sema_err!(expr.span, IndexerNotFound {
                    ty: this.type_name(object),
                })
            };
            if let Some(value) = assigned {
                let value_ty = self.check_expr(value, None)?;
                let candidates = self
                    .registry
                    .general_functions_for(&self.arena, owner, GeneralKind::IndexerSet);
                let args = [&index.index, value];
                let setter = self
                    .resolve_callable(&candidates, &[object, index_ty, value_ty], &args, &[], expr.span)?
                    .ok_or_else(|| not_found(self))?;
                self.expr_data.set_call(expr.id, ResolvedCall::Callable(setter));
                self.settle_args(setter, &args)?;
                return Ok(IndexOutcome::Setter);
            }
            let candidates = self
                .registry
                .general_functions_for(&self.arena, owner, GeneralKind::IndexerGet);
            let args = [&index.index];
            let getter = self
                .resolve_callable(&candidates, &[object, index_ty], &args, &[], expr.span)?
                .ok_or_else(|| not_found(self))?;
            self.expr_data.set_call(expr.id, ResolvedCall::Callable(getter));
            self.settle_args(getter, &args)?;
            return Ok(IndexOutcome::Value(self.registry.callable(getter).ret));
        }

        let index_ty = self.check_expr(&index.index, Some(TypeId::INTEGER))?;
        if !self.underlying(index_ty).is_integral() {
            return Err(sema_err!(index.index.span, TypeMismatch {
                expected: "int".to_string(),
                found: self.type_name(index_ty),
            }));
        }

        if let Some((element, size)) = self.arena.unwrap_stack_array(object) {
            if let Some(value) = try_compute(&index.index, Some(TypeId::INTEGER), self, None)
                && let Some(at) = value.as_integer()
            {
                if at < 0 || at >= size as i64 {
                    return Err(sema_err!(index.index.span, IndexOutOfBounds { index: at, size }));
                }
                self.expr_data.set_constant(index.index.id, value);
            }
            let element_size = self.layout().size_on_stack(element, expr.span)?;
            self.expr_data
                .set_call(expr.id, ResolvedCall::ArrayElement { element_size });
            return Ok(IndexOutcome::Value(element));
        }
        if let Some(pointee) = self.arena.unwrap_pointer(object) {
            let element_size = self.layout().size_on_stack(pointee, expr.span)?;
            self.expr_data
                .set_call(expr.id, ResolvedCall::PointerOffset { element_size });
            return Ok(IndexOutcome::Value(pointee));
        }
        Err(sema_err!(expr.span, IndexerNotFound {
            ty: self.type_name(object),
        }))
    }

    fn check_cast(&mut self, expr: &Expr, cast: &CastExpr) -> SemaResult<TypeId> {
        let target = self.resolve_type(&cast.ty)?;
        let from = self.check_expr(&cast.value, None)?;
        if from == target {
            let hint = SemanticHint::RedundantCast {
                ty: self.type_name(target),
                span: expr.span.into(),
            };
            self.hint(hint, expr.span);
            return Ok(target);
        }
        if !self.can_cast(from, target) {
            return Err(sema_err!(expr.span, InvalidCast {
                from: self.type_name(from),
                to: self.type_name(target),
            }));
        }
        if target.is_numeric() {
            self.fold(expr, Some(target));
        }
        Ok(target)
    }

    /// Literal arguments that fit a byte parameter become bytes, and `ref`
    /// parameters need lvalues. `args` lines up with the trailing parameters
    /// (the receiver, if any, is not in it).
    pub(super) fn settle_args(&mut self, callable: CallableRef, args: &[&Expr]) -> SemaResult<()> {
        let params: Vec<(TypeId, Option<ParamModifier>)> = self
            .registry
            .callable(callable)
            .params
            .iter()
            .map(|p| (p.ty, p.modifier))
            .collect();
        let skip = params.len().saturating_sub(args.len());
        for ((ty, modifier), arg) in params[skip..].iter().zip(args) {
            if *ty == TypeId::BYTE && fits_byte(arg) {
                self.expr_data.set_type(arg.id, TypeId::BYTE);
                self.expr_data.set_type(arg.ungrouped().id, TypeId::BYTE);
            }
            if *modifier == Some(ParamModifier::Ref) && !arg.is_lvalue_shape() {
                return Err(sema_err!(arg.span, NotAnLvalue {}));
            }
        }
        Ok(())
    }
}
