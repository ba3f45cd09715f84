// src/analyzer/stmt.rs
//
// Pass 4: globals, top-level statements, callable bodies and the template
// instances they request.

use brim_identity::{FileId, Span, Symbol};
use brim_syntax::ast::*;

use super::expr::IndexOutcome;
use super::{Analyzer, BodyContext};
use crate::consteval::try_compute;
use crate::diagnostics::{SemaResult, sema_err};
use crate::entity_defs::{CallableKind, CallableRef, GlobalDef};
use crate::errors::SemanticWarning;
use crate::scope::CompiledConstant;
use crate::transforms::{is_unrollable, iteration_values, unrolled_blocks};
use crate::type_arena::TypeId;

impl Analyzer {
    #[tracing::instrument(skip_all)]
    pub(super) fn check_bodies(&mut self, program: &Program) -> SemaResult<()> {
        // Globals first, so top-level code of any file sees all of them
        for (i, file) in program.files.iter().enumerate() {
            let id = FileId::new(i as u32);
            self.enter_top_level(id);
            for decl in &file.declarations {
                if let Decl::Global(var) = decl {
                    self.declare_global(var).map_err(|e| e.in_file(id))?;
                }
            }
        }

        // Top-level constants stay visible to every body checked afterwards
        for (i, file) in program.files.iter().enumerate() {
            let id = FileId::new(i as u32);
            self.enter_top_level(id);
            self.check_stmts(&file.statements).map_err(|e| e.in_file(id))?;
        }

        for callable in self.registry.all_callables() {
            let def = self.registry.callable(callable);
            if def.is_template || def.is_instance() {
                continue;
            }
            self.check_callable(callable)?;
        }

        let mut instances = 0usize;
        while let Some(instance) = self.worklist.pop_front() {
            self.check_callable(instance)?;
            instances += 1;
        }
        tracing::debug!(instances, globals = self.registry.globals.len(), "bodies checked");
        Ok(())
    }

    fn enter_top_level(&mut self, file: FileId) {
        self.ctx = BodyContext {
            file,
            ..BodyContext::default()
        };
        self.locals.reset();
    }

    fn declare_global(&mut self, var: &VarStmt) -> SemaResult<()> {
        let file = self.ctx.file;
        if self.registry.globals.find(|g| g.name == var.name && g.file == file).is_some() {
            return Err(sema_err!(var.span, AlreadyDefined {
                kind: "global".to_string(),
                name: self.name(var.name),
            }));
        }
        let ty = self.var_type(var.name, var.ty.as_ref(), var.init.as_ref(), var.span)?;
        let slots = self.layout().size_on_stack(ty, var.span)?;
        let offset = self.global_slots;
        self.global_slots = offset.checked_add(slots).ok_or_else(|| {
            sema_err!(var.span, TypeTooLarge {
                ty: self.type_name(ty),
            })
        })?;
        self.registry.globals.push(GlobalDef {
            name: var.name,
            file,
            ty,
            offset,
            span: var.span,
        });
        Ok(())
    }

    fn check_callable(&mut self, callable: CallableRef) -> SemaResult<()> {
        let def = self.registry.callable(callable).clone();
        let Some(body) = def.body.clone() else {
            return Ok(());
        };
        tracing::trace!(name = %self.name(def.name), ?callable, "checking body");

        self.ctx = BodyContext {
            file: def.file,
            current: Some(callable),
            return_type: if def.kind == CallableKind::Constructor {
                TypeId::VOID
            } else {
                def.ret
            },
            generics: def.type_args.to_map(),
            loop_depth: 0,
        };
        self.locals.reset();

        let mut params = Vec::with_capacity(def.params.len());
        for param in &def.params {
            let is_ref = param.modifier == Some(ParamModifier::Ref);
            let slots = if is_ref {
                1
            } else {
                self.layout()
                    .size_on_stack(param.ty, def.span)
                    .map_err(|e| e.in_file(def.file))?
            };
            params.push((param.name, param.ty, slots, is_ref));
        }
        self.locals.declare_params(&params);

        self.with_scope(|this| this.check_stmts(&body.stmts))
            .map_err(|e| e.in_file(def.file))
    }

    /// Check statements in order. Anything after a `return`, `break` or
    /// `continue` is reported once and still checked.
    pub(super) fn check_stmts(&mut self, stmts: &[Stmt]) -> SemaResult<()> {
        let mut terminated = false;
        let mut reported = false;
        for stmt in stmts {
            if terminated && !reported {
                let warning = SemanticWarning::UnreachableStatement {
                    span: stmt.span().into(),
                };
                self.warn(warning, stmt.span());
                reported = true;
            }
            self.check_stmt(stmt)?;
            if matches!(stmt, Stmt::Return(_) | Stmt::Break(_) | Stmt::Continue(_)) {
                terminated = true;
            }
        }
        Ok(())
    }

    fn check_block(&mut self, block: &Block) -> SemaResult<()> {
        self.with_scope(|this| this.check_stmts(&block.stmts))
    }

    fn in_loop(&mut self, f: impl FnOnce(&mut Self) -> SemaResult<()>) -> SemaResult<()> {
        self.ctx.loop_depth += 1;
        let result = f(self);
        self.ctx.loop_depth -= 1;
        result
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> SemaResult<()> {
        match stmt {
            Stmt::Var(var) => {
                let ty = self.var_type(var.name, var.ty.as_ref(), var.init.as_ref(), var.span)?;
                let slots = self.layout().size_on_stack(ty, var.span)?;
                self.locals.declare_local(var.name, ty, slots);
                Ok(())
            }
            Stmt::Const(c) => self.check_const(c),
            Stmt::Assign(assign) => self.check_assign(assign),
            Stmt::Expr(e) => self.check_expr(&e.expr, None).map(drop),
            Stmt::If(s) => self.check_if(s),
            Stmt::While(w) => {
                self.check_condition(&w.condition)?;
                self.in_loop(|this| this.check_block(&w.body))
            }
            Stmt::For(f) => self.check_for(f),
            Stmt::Return(r) => self.check_return(r),
            Stmt::Break(span) | Stmt::Continue(span) => {
                if self.ctx.loop_depth == 0 {
                    return Err(sema_err!(*span, InvalidBreak {}));
                }
                Ok(())
            }
            Stmt::Block(block) => self.check_block(block),
        }
    }

    /// Declared type, checked against the initializer, or the initializer's
    /// type when nothing is declared.
    fn var_type(&mut self, name: Symbol, ty: Option<&TypeExpr>, init: Option<&Expr>, span: Span) -> SemaResult<TypeId> {
        let declared = ty.map(|t| self.resolve_type(t)).transpose()?;
        let Some(init) = init else {
            return declared.ok_or_else(|| sema_err!(span, VarNeedsType { name: self.name(name) }));
        };
        let found = self.check_expr(init, declared)?;
        match declared {
            Some(declared) => {
                self.expect_assignable(init, found, declared)?;
                Ok(declared)
            }
            None if found.is_void() => Err(sema_err!(span, VarNeedsType { name: self.name(name) })),
            None => Ok(found),
        }
    }

    fn check_const(&mut self, c: &ConstStmt) -> SemaResult<()> {
        let declared = c.ty.as_ref().map(|t| self.resolve_type(t)).transpose()?;
        let found = self.check_expr(&c.value, declared)?;
        if let Some(declared) = declared {
            self.expect_assignable(&c.value, found, declared)?;
        }
        let ty = declared.unwrap_or(found);
        let value = try_compute(&c.value, Some(ty), self, None)
            .ok_or_else(|| sema_err!(c.value.span, ConstantNotComputable { name: self.name(c.name) }))?;
        let value = match self.arena.builtin_kind(ty) {
            Some(kind) => value.convert_to(kind).unwrap_or(value),
            None => value,
        };
        tracing::trace!(name = %self.name(c.name), %value, "constant");
        self.constants.push(
            CompiledConstant {
                name: c.name,
                value,
                ty,
                span: c.span,
            },
            &self.interner,
        )?;
        self.expr_data.set_constant(c.value.id, value);
        Ok(())
    }

    fn check_assign(&mut self, assign: &AssignStmt) -> SemaResult<()> {
        let target = assign.target.ungrouped();
        if !target.is_lvalue_shape() {
            return Err(sema_err!(target.span, NotAnLvalue {}));
        }
        if let ExprKind::Identifier(name) = target.kind
            && self.variable_type(name).is_none()
            && self.constants.lookup(name).is_some()
        {
            return Err(sema_err!(target.span, AssignToConstant { name: self.name(name) }));
        }

        let target_ty = match &target.kind {
            ExprKind::Index(index) => match self.check_index(target, index, Some(&assign.value))? {
                IndexOutcome::Setter => return Ok(()),
                IndexOutcome::Value(ty) => {
                    self.expr_data.set_type(target.id, ty);
                    self.expr_data.set_type(assign.target.id, ty);
                    ty
                }
            },
            _ => self.check_expr(&assign.target, None)?,
        };
        let found = self.check_expr(&assign.value, Some(target_ty))?;
        self.expect_assignable(&assign.value, found, target_ty)?;
        self.validate_address(&assign.target)
    }

    fn check_if(&mut self, s: &IfStmt) -> SemaResult<()> {
        self.check_condition(&s.condition)?;
        self.check_block(&s.then_branch)?;
        match &s.else_branch {
            Some(ElseBranch::Block(block)) => self.check_block(block),
            Some(ElseBranch::If(nested)) => self.check_if(nested),
            None => Ok(()),
        }
    }

    /// Conditions must be integral, boolean or enum. A condition known at
    /// compile time is recorded and, unless written as a literal, reported.
    fn check_condition(&mut self, condition: &Expr) -> SemaResult<()> {
        let bool_type = self.bool_type();
        let ty = self.check_expr(condition, Some(bool_type))?;
        if !self.is_condition_type(ty) {
            return Err(sema_err!(condition.span, InvalidCondition {
                found: self.type_name(ty),
            }));
        }
        if let Some(value) = try_compute(condition, None, self, None)
            && let Some(truth) = value.truthy()
        {
            self.expr_data.set_constant(condition.id, value);
            if !condition.is_literal() {
                let warning = SemanticWarning::ConstantCondition {
                    value: truth,
                    span: condition.span.into(),
                };
                self.warn(warning, condition.span);
            }
        }
        Ok(())
    }

    fn check_for(&mut self, f: &ForStmt) -> SemaResult<()> {
        self.with_scope(|this| {
            if let Some(init) = &f.init {
                this.check_stmt(init)?;
            }
            if let Some(condition) = &f.condition {
                this.check_condition(condition)?;
            }
            if let Some(update) = &f.update {
                this.check_stmt(update)?;
            }
            this.in_loop(|this| this.check_block(&f.body))?;
            if this.config.unroll_loops {
                this.unroll_for(f)?;
            }
            Ok(())
        })
    }

    /// Record one checked block per iteration for a loop whose iteration
    /// count is known at compile time.
    fn unroll_for(&mut self, f: &ForStmt) -> SemaResult<()> {
        if !is_unrollable(f, self) {
            return Ok(());
        }
        let limit = self.config.max_unroll_iterations;
        let values = iteration_values(f, self, limit, f.span)?;
        let blocks = unrolled_blocks(f, &values, &mut self.ids, f.span);
        for block in &blocks {
            self.check_block(block)?;
        }
        self.expr_data.set_unrolled(f.id, blocks);
        Ok(())
    }

    fn check_return(&mut self, ret: &ReturnStmt) -> SemaResult<()> {
        let expected = self.ctx.return_type;
        match &ret.value {
            None if expected.is_void() => Ok(()),
            None => Err(sema_err!(ret.span, TypeMismatch {
                expected: self.type_name(expected),
                found: "void".to_string(),
            })),
            Some(value) if expected.is_void() => {
                let found = self.check_expr(value, None)?;
                Err(sema_err!(value.span, TypeMismatch {
                    expected: "void".to_string(),
                    found: self.type_name(found),
                }))
            }
            Some(value) => {
                let found = self.check_expr(value, Some(expected))?;
                self.expect_assignable(value, found, expected)
            }
        }
    }
}
