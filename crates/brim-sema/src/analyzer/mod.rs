// src/analyzer/mod.rs
//
// The semantic analyzer. Owns every table of the compilation unit and runs
// the passes in order:
//
// 1. type declarations, fields, enum values and type replacers
// 2. free functions, operators and macros
// 3. methods, constructors and general functions
// 4. globals, top-level code and callable bodies, then template instances
// 5. reference collection
// 6. unused-callable elimination

mod calls;
mod declarations;
mod env;
mod expr;
mod output;
mod references;
mod stmt;
mod types;

#[cfg(test)]
mod tests;

pub use output::{AnalysisOutput, AnalyzerBuilder, LiveCallables};

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use brim_identity::{FileId, Interner, Span, Symbol};
use brim_syntax::{NodeIdGen, Program};

use crate::config::SemaConfig;
use crate::diagnostics::{CompileHint, CompileWarning, SemaResult, sema_err};
use crate::entity_defs::CallableRef;
use crate::entity_registry::{EntityRegistry, UsageTable};
use crate::errors::{SemanticHint, SemanticWarning};
use crate::expression_data::ExpressionData;
use crate::generic::TemplateCache;
use crate::layout::Layout;
use crate::scope::{ConstantStack, LocalScopes};
use crate::type_arena::{TypeArena, TypeId};
use crate::type_display::display_type;
use crate::well_known::WellKnownNames;

/// Per-body state, replaced when the analyzer moves to another body.
#[derive(Debug, Clone)]
pub(crate) struct BodyContext {
    pub file: FileId,
    /// `None` while checking globals and top-level statements
    pub current: Option<CallableRef>,
    pub return_type: TypeId,
    /// Generic names in scope and what they stand for
    pub generics: FxHashMap<Symbol, TypeId>,
    pub loop_depth: u32,
}

impl Default for BodyContext {
    fn default() -> Self {
        Self {
            file: FileId::new(0),
            current: None,
            return_type: TypeId::VOID,
            generics: FxHashMap::default(),
            loop_depth: 0,
        }
    }
}

/// One reference from a body (or top-level code, `None`) to a callable.
pub(crate) type Reference = (Option<CallableRef>, CallableRef);

pub struct Analyzer {
    config: SemaConfig,
    interner: Interner,
    well_known: WellKnownNames,
    arena: TypeArena,
    registry: EntityRegistry,
    expr_data: ExpressionData,
    templates: TemplateCache,
    /// Template instances whose bodies still need checking
    worklist: VecDeque<CallableRef>,
    constants: ConstantStack,
    locals: LocalScopes,
    ctx: BodyContext,
    references: Vec<Reference>,
    global_slots: u32,
    live: LiveCallables,
    usage: UsageTable,
    warnings: Vec<CompileWarning>,
    hints: Vec<CompileHint>,
    ids: NodeIdGen,
}

impl Analyzer {
    /// Analyze a whole compilation unit. The first fatal error stops analysis.
    #[tracing::instrument(skip_all, fields(files = program.files.len()))]
    pub fn analyze(&mut self, program: &Program) -> SemaResult<()> {
        self.ids = NodeIdGen::starting_at(program.next_node_id.max(self.ids.peek()));

        // Pass 1: struct, class and enum declarations
        self.declare_types(program)?;

        // Pass 2: free functions, operators and macros
        self.declare_functions(program)?;

        // Pass 3: methods, constructors and general functions
        self.declare_members(program)?;

        if self.config.require_entry_point && self.registry.entry_point().is_none() {
            return Err(sema_err!(Span::default(), MissingEntryPoint {}));
        }

        // Pass 4: bodies, then every template instance they requested
        self.check_bodies(program)?;

        // Pass 5: usage counts from the reference log
        self.collect_usage();

        // Pass 6: unused-callable elimination
        self.eliminate_unused();

        tracing::debug!(
            callables = self.registry.all_callables().len(),
            live = self.live.len(),
            instances = self.templates.len(),
            cache_hits = self.templates.hits(),
            warnings = self.warnings.len(),
            "analysis complete"
        );
        Ok(())
    }

    pub fn warnings(&self) -> &[CompileWarning] {
        &self.warnings
    }

    pub fn hints(&self) -> &[CompileHint] {
        &self.hints
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn arena(&self) -> &TypeArena {
        &self.arena
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn expression_data(&self) -> &ExpressionData {
        &self.expr_data
    }

    pub fn into_output(self) -> AnalysisOutput {
        let template_instances = self
            .templates
            .instances()
            .iter()
            .copied()
            .filter(|i| self.live.contains(*i))
            .collect();
        AnalysisOutput {
            registry: self.registry,
            arena: self.arena,
            interner: self.interner,
            expression_data: self.expr_data,
            usage: self.usage,
            live: self.live,
            template_instances,
            global_slots: self.global_slots,
            warnings: self.warnings,
            hints: self.hints,
        }
    }

    /// Run `f` in a nested scope. Constants and locals declared inside are
    /// dropped afterwards, on success and on error.
    pub(crate) fn with_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> SemaResult<T>) -> SemaResult<T> {
        let constants = self.constants.mark();
        let locals = self.locals.mark();
        let result = f(self);
        self.constants.restore(constants);
        self.locals.restore(locals);
        result
    }

    pub(crate) fn layout(&mut self) -> Layout<'_> {
        Layout::new(&mut self.arena, &self.registry, &self.interner)
    }

    pub(crate) fn type_name(&self, ty: TypeId) -> String {
        display_type(&self.arena, &self.registry, &self.interner, ty)
    }

    pub(crate) fn name(&self, sym: Symbol) -> String {
        self.interner.display_name(sym).to_string()
    }

    pub(crate) fn warn(&mut self, warning: SemanticWarning, span: Span) {
        tracing::debug!(%warning, "warning");
        self.warnings.push(CompileWarning {
            warning,
            span,
            file: self.ctx.file,
        });
    }

    pub(crate) fn hint(&mut self, hint: SemanticHint, span: Span) {
        self.hints.push(CompileHint {
            hint,
            span,
            file: self.ctx.file,
        });
    }

    /// Type of conditions and comparisons: the `boolean` replacer if one is
    /// defined, else byte.
    pub(crate) fn bool_type(&self) -> TypeId {
        self.registry.type_replacer("boolean").unwrap_or(TypeId::BYTE)
    }

    /// Type of string literals: the `string` replacer if one is defined,
    /// else `char*`.
    pub(crate) fn string_type(&mut self) -> TypeId {
        match self.registry.type_replacer("string") {
            Some(ty) => ty,
            None => self.arena.pointer(TypeId::CHAR),
        }
    }

    /// Log a reference from the body being checked.
    pub(crate) fn note_reference(&mut self, target: CallableRef) {
        self.references.push((self.ctx.current, target));
    }
}
