// src/analyzer/calls.rs
//
// Calls of every shape: free functions, function values, methods,
// constructors, `sizeof`, macros and the `delete`/`clone` keywords. All of
// them go through the same overload resolution and template instantiation.

use brim_identity::{MacroId, Span, Symbol};
use brim_syntax::ast::*;

use super::Analyzer;
use super::env::ScopeConstants;
use super::types::fits_byte;
use crate::consteval::try_compute;
use crate::data_item::DataItem;
use crate::diagnostics::{SemaResult, internal_err, sema_err};
use crate::entity_defs::{CallableRef, GeneralKind};
use crate::entity_registry::OwnerKey;
use crate::errors::SemanticHint;
use crate::expression_data::ResolvedCall;
use crate::overload::{CallShape, Resolution, instantiate, resolve_overload};
use crate::transforms::{InlineResult, collapse, inline_macro};
use crate::type_arena::{TypeId, TypeIdVec};
use crate::type_display::display_signature;

impl Analyzer {
    pub(super) fn check_call(&mut self, expr: &Expr, call: &CallExpr, expected: Option<TypeId>) -> SemaResult<TypeId> {
        if call.callee == self.well_known.sizeof {
            return self.check_sizeof(expr, call);
        }
        if let Some(id) = self.registry.find_macro(call.callee, self.ctx.file) {
            return self.check_macro_call(expr, call, id, expected);
        }
        if call.type_args.is_empty()
            && let Some(ty) = self.variable_type(call.callee)
        {
            return self.check_indirect_call(expr, call, ty);
        }

        let explicit = self.resolve_type_args(&call.type_args)?;
        let arg_types = self.check_args(&call.args)?;
        let args: Vec<&Expr> = call.args.iter().map(|a| &a.value).collect();
        let candidates = self.registry.free_functions_named(call.callee);
        let Some(function) = self.resolve_callable(&candidates, &arg_types, &args, &explicit, expr.span)? else {
            return Err(sema_err!(expr.span, FunctionNotFound {
                signature: self.signature(call.callee, &arg_types),
            }));
        };
        self.expr_data.set_call(expr.id, ResolvedCall::Callable(function));
        self.settle_args(function, &args)?;
        Ok(self.registry.callable(function).ret)
    }

    /// `sizeof<T>()` or `sizeof(value)`. The value is typed, never evaluated.
    fn check_sizeof(&mut self, expr: &Expr, call: &CallExpr) -> SemaResult<TypeId> {
        let measured = match (call.type_args.as_slice(), call.args.as_slice()) {
            ([ty], []) => self.resolve_type(ty)?,
            ([], [arg]) => self.check_expr(&arg.value, None)?,
            _ => return Err(sema_err!(expr.span, SizeOfShape {})),
        };
        let size = self.layout().size(measured, expr.span)?;
        self.expr_data.set_call(expr.id, ResolvedCall::SizeOf(size));
        self.expr_data
            .set_constant(expr.id, DataItem::Integer(size as i32));
        Ok(TypeId::INTEGER)
    }

    /// Inline the macro and check the expansion in place of the call. A body
    /// that reduces to one expression keeps the call's value; anything else
    /// is collapsed and checked as a block of statements.
    fn check_macro_call(
        &mut self,
        expr: &Expr,
        call: &CallExpr,
        id: MacroId,
        expected: Option<TypeId>,
    ) -> SemaResult<TypeId> {
        let def = self.registry.macros.get(id).clone();
        let args: Vec<Expr> = call.args.iter().map(|a| a.value.clone()).collect();
        let inlined = inline_macro(&def.params, &def.body, &args, &mut self.ids, &mut self.interner, expr.span)?;
        self.expr_data.set_call(expr.id, ResolvedCall::Macro(id));
        tracing::trace!(name = %self.name(def.name), "inlining macro");

        if let Some(body) = inlined.as_expr().cloned() {
            let ty = self.with_scope(|this| this.check_expr(&body, expected))?;
            let value = match self.expr_data.constant(body.id) {
                Some(value) => Some(value),
                None => try_compute(&body, expected, self, None),
            };
            if let Some(value) = value {
                self.expr_data.set_constant(expr.id, value);
            }
            self.expr_data.set_inlined(expr.id, inlined);
            return Ok(ty);
        }

        let mut env = ScopeConstants {
            constants: &self.constants,
            locals: &self.locals,
        };
        let stmts = collapse(inlined.into_stmts(), &mut env, &mut self.ids)?;
        let block = Block {
            stmts,
            span: expr.span,
        };
        self.with_scope(|this| this.check_stmts(&block.stmts))?;
        self.expr_data
            .set_inlined(expr.id, InlineResult::Block(block));
        Ok(TypeId::VOID)
    }

    /// Call through a variable of function type.
    fn check_indirect_call(&mut self, expr: &Expr, call: &CallExpr, ty: TypeId) -> SemaResult<TypeId> {
        let Some((params, ret)) = self.arena.unwrap_function(ty).map(|(p, r)| (p.clone(), r)) else {
            return Err(sema_err!(expr.span, NotCallable {
                name: self.name(call.callee),
            }));
        };
        if params.len() != call.args.len() {
            return Err(sema_err!(expr.span, WrongArgumentCount {
                expected: params.len(),
                found: call.args.len(),
            }));
        }
        for (arg, param) in call.args.iter().zip(params) {
            let found = self.check_expr(&arg.value, Some(param))?;
            self.expect_assignable(&arg.value, found, param)?;
        }
        self.expr_data.set_call(expr.id, ResolvedCall::Indirect);
        Ok(ret)
    }

    pub(super) fn check_method_call(&mut self, expr: &Expr, call: &MethodCallExpr) -> SemaResult<TypeId> {
        let object = self.check_expr(&call.object, None)?;
        let receiver = self.aggregate_type(object);
        let owner = receiver.and_then(|ty| OwnerKey::of(&self.arena, ty));
        let (Some(receiver), Some(owner)) = (receiver, owner) else {
            return Err(sema_err!(expr.span, MethodNotFound {
                ty: self.type_name(object),
                method: self.name(call.method),
            }));
        };

        let explicit = self.resolve_type_args(&call.type_args)?;
        let mut arg_types = TypeIdVec::new();
        arg_types.push(receiver);
        arg_types.extend(self.check_args(&call.args)?);
        let args: Vec<&Expr> = call.args.iter().map(|a| &a.value).collect();

        let candidates = self.registry.methods_named(&self.arena, owner, call.method);
        let Some(method) = self.resolve_callable(&candidates, &arg_types, &args, &explicit, expr.span)? else {
            return Err(sema_err!(expr.span, MethodNotFound {
                ty: self.type_name(receiver),
                method: self.signature(call.method, &arg_types[1..]),
            }));
        };
        self.expr_data.set_call(expr.id, ResolvedCall::Callable(method));
        self.settle_args(method, &args)?;
        Ok(self.registry.callable(method).ret)
    }

    /// `T(args)` on the stack or `new T(args)` on the heap. Types without
    /// constructors may still be created without arguments.
    pub(super) fn check_construct(&mut self, expr: &Expr, construct: &ConstructExpr, heap: bool) -> SemaResult<TypeId> {
        let ty = self.resolve_type(&construct.ty)?;
        let user_types = self.check_args(&construct.args)?;
        let result = if heap && !self.arena.is_class(ty) {
            self.arena.pointer(ty)
        } else {
            ty
        };

        let not_found = |this: &Self| {
            sema_err!(expr.span, ConstructorNotFound {
                signature: format!(
                    "{}({})",
                    this.type_name(ty),
                    user_types
                        .iter()
                        .map(|t| this.type_name(*t))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
        };

        let Some(owner) = OwnerKey::of(&self.arena, ty) else {
            if construct.args.is_empty() {
                return Ok(result);
            }
            return Err(not_found(self));
        };
        let candidates = self.registry.constructors_for(&self.arena, owner);
        if candidates.is_empty() && construct.args.is_empty() {
            return Ok(result);
        }

        let mut arg_types = TypeIdVec::new();
        arg_types.push(ty);
        arg_types.extend(user_types.iter().copied());
        let args: Vec<&Expr> = construct.args.iter().map(|a| &a.value).collect();
        let constructor = self
            .resolve_callable(&candidates, &arg_types, &args, &[], expr.span)?
            .ok_or_else(|| not_found(self))?;
        self.expr_data.set_call(expr.id, ResolvedCall::Callable(constructor));
        self.settle_args(constructor, &args)?;
        Ok(result)
    }

    pub(super) fn check_keyword(&mut self, expr: &Expr, kw: &KeywordExpr) -> SemaResult<TypeId> {
        let operand = self.check_expr(&kw.operand, None)?;
        match kw.keyword {
            Keyword::Delete => {
                let target = if self.arena.is_class(operand) {
                    Some(operand)
                } else {
                    self.arena.unwrap_pointer(operand)
                };
                let Some(target) = target else {
                    return Err(sema_err!(kw.operand.span, TypeMismatch {
                        expected: "pointer or class".to_string(),
                        found: self.type_name(operand),
                    }));
                };
                let destructors = match OwnerKey::of(&self.arena, target) {
                    Some(owner) => self
                        .registry
                        .general_functions_for(&self.arena, owner, GeneralKind::Destructor),
                    None => Default::default(),
                };
                let resolved = match self.resolve_callable(&destructors, &[target], &[], &[], expr.span)? {
                    Some(destructor) => ResolvedCall::Callable(destructor),
                    None => ResolvedCall::BuiltinDelete,
                };
                self.expr_data.set_call(expr.id, resolved);
                Ok(TypeId::VOID)
            }
            Keyword::Clone => {
                let invalid = |this: &Self| {
                    sema_err!(expr.span, InvalidClone {
                        ty: this.type_name(operand),
                    })
                };
                let Some(owner) = OwnerKey::of(&self.arena, operand) else {
                    return Err(invalid(self));
                };
                let candidates = self
                    .registry
                    .general_functions_for(&self.arena, owner, GeneralKind::Clone);
                let clone = self
                    .resolve_callable(&candidates, &[operand], &[], &[], expr.span)?
                    .ok_or_else(|| invalid(self))?;
                self.expr_data.set_call(expr.id, ResolvedCall::Callable(clone));
                Ok(self.registry.callable(clone).ret)
            }
        }
    }

    /// Type every argument. `ref` needs something addressable; `temp` on a
    /// value that is already temporary is only worth a hint.
    fn check_args(&mut self, args: &[Argument]) -> SemaResult<TypeIdVec> {
        let mut types = TypeIdVec::with_capacity(args.len());
        for arg in args {
            types.push(self.check_expr(&arg.value, None)?);
            match arg.modifier {
                Some(ArgModifier::Ref) if !arg.value.is_lvalue_shape() => {
                    return Err(sema_err!(arg.value.span, NotAnLvalue {}));
                }
                Some(ArgModifier::Temp) if !arg.value.is_lvalue_shape() => {
                    let hint = SemanticHint::RedundantTemp {
                        span: arg.value.span.into(),
                    };
                    self.hint(hint, arg.value.span);
                }
                _ => {}
            }
        }
        Ok(types)
    }

    fn resolve_type_args(&mut self, args: &[TypeExpr]) -> SemaResult<TypeIdVec> {
        args.iter().map(|ty| self.resolve_type(ty)).collect()
    }

    /// Resolve a call among `candidates`, instantiating a template when one
    /// wins. `args` holds the expressions behind the trailing `arg_types`
    /// (a receiver has a type but no expression here).
    pub(super) fn resolve_callable(
        &mut self,
        candidates: &[CallableRef],
        arg_types: &[TypeId],
        args: &[&Expr],
        explicit: &[TypeId],
        span: Span,
    ) -> SemaResult<Option<CallableRef>> {
        let skip = arg_types.len().saturating_sub(args.len());
        let converts = |i: usize, param: TypeId| {
            self.implicitly_converts(arg_types[i], param)
                || (param == TypeId::BYTE && i >= skip && fits_byte(args[i - skip]))
        };
        let shape = CallShape {
            arg_types,
            explicit_type_args: explicit,
        };
        let resolution = match resolve_overload(&self.registry, &self.arena, candidates, shape, &converts) {
            Ok(resolution) => resolution,
            Err(ambiguous) => {
                let name = ambiguous
                    .candidates
                    .first()
                    .map(|c| self.registry.callable(*c).name)
                    .ok_or_else(|| {
                        internal_err!(span, ImpossibleState {
                            detail: "ambiguity without candidates".to_string(),
                        })
                    })?;
                return Err(sema_err!(span, DuplicatedDefinitions {
                    signature: self.signature(name, arg_types),
                }));
            }
        };

        let target = match resolution {
            None => return Ok(None),
            Some(Resolution::Exact(found)) => found,
            Some(Resolution::Template { origin, args }) => {
                let (instance, created) = instantiate(
                    &mut self.registry,
                    &mut self.arena,
                    &mut self.templates,
                    &self.interner,
                    origin,
                    args,
                    span,
                )?;
                if created {
                    self.worklist.push_back(instance);
                }
                instance
            }
        };
        self.note_reference(target);
        Ok(Some(target))
    }

    pub(super) fn signature(&self, name: Symbol, types: &[TypeId]) -> String {
        display_signature(&self.arena, &self.registry, &self.interner, name, types)
    }
}
