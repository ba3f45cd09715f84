// src/analyzer/env.rs
//
// The analyzer as an environment for constant evaluation and addressing.

use brim_identity::{EnumId, FileId, Span, Symbol};
use brim_syntax::{CallExpr, Expr, ExprKind, FieldExpr};

use super::Analyzer;
use crate::address::{AddressResolver, StorageLookup, ValueAddress};
use crate::consteval::ComputeEnv;
use crate::data_item::DataItem;
use crate::diagnostics::SemaResult;
use crate::entity_registry::EntityRegistry;
use crate::errors::SemanticError;
use crate::scope::{ConstantStack, LocalScopes};
use crate::transforms::inline_macro;
use crate::type_arena::TypeId;

/// Constants in scope, unless a local of the same name hides them.
fn visible_constant(constants: &ConstantStack, locals: &LocalScopes, name: Symbol) -> Option<DataItem> {
    if locals.lookup(name).is_some() {
        return None;
    }
    constants.lookup(name).map(|c| c.value)
}

impl ComputeEnv for Analyzer {
    fn constant(&self, name: Symbol) -> Option<DataItem> {
        visible_constant(&self.constants, &self.locals, name)
    }

    fn size_of(&mut self, call: &CallExpr, span: Span) -> Option<u32> {
        if call.callee != self.well_known.sizeof {
            return None;
        }
        let ty = match (call.type_args.as_slice(), call.args.as_slice()) {
            ([ty], []) => self.resolve_type(ty).ok()?,
            ([], [arg]) => self.static_type_of(&arg.value)?,
            _ => return None,
        };
        self.layout().size(ty, span).ok()
    }

    fn field_value(&mut self, field: &FieldExpr) -> Option<DataItem> {
        if let Some(value) = self.enum_member_value(field) {
            return Some(value);
        }
        if field.field != self.well_known.length {
            return None;
        }
        let ty = self.static_type_of(&field.object)?;
        let (_, size) = self.arena.unwrap_stack_array(ty)?;
        Some(DataItem::Integer(size as i32))
    }

    fn expand_macro(&mut self, call: &CallExpr, span: Span) -> Option<Expr> {
        let id = self.registry.find_macro(call.callee, self.ctx.file)?;
        let def = self.registry.macros.get(id).clone();
        let args: Vec<Expr> = call.args.iter().map(|a| a.value.clone()).collect();
        let inlined = inline_macro(&def.params, &def.body, &args, &mut self.ids, &mut self.interner, span).ok()?;
        inlined.as_expr().cloned()
    }
}

impl Analyzer {
    /// Type of an expression without checking it: recorded types first,
    /// then variables and constants by name.
    pub(crate) fn static_type_of(&self, expr: &Expr) -> Option<TypeId> {
        if let Some(ty) = self.expr_data.get_type(expr.id) {
            return Some(ty);
        }
        match &expr.ungrouped().kind {
            ExprKind::Identifier(name) => self
                .variable_type(*name)
                .or_else(|| self.constants.lookup(*name).map(|c| c.ty)),
            _ => None,
        }
    }

    /// Local or global variable type.
    pub(crate) fn variable_type(&self, name: Symbol) -> Option<TypeId> {
        if let Some(local) = self.locals.lookup(name) {
            return Some(local.ty);
        }
        let id = self.registry.find_global(name, self.ctx.file)?;
        Some(self.registry.globals.get(id).ty)
    }

    /// The enum an expression names, when it is a bare name that is not a
    /// variable.
    pub(crate) fn enum_named_by(&self, object: &Expr) -> Option<EnumId> {
        let ExprKind::Identifier(name) = object.ungrouped().kind else {
            return None;
        };
        if self.variable_type(name).is_some() {
            return None;
        }
        self.registry.find_enum(name, self.ctx.file)
    }

    /// `Enum.Member` when the object names an enum rather than a variable.
    pub(crate) fn enum_member_value(&self, field: &FieldExpr) -> Option<DataItem> {
        let id = self.enum_named_by(&field.object)?;
        self.registry.enums.get(id).member(field.field).map(|m| m.value)
    }

    /// Walk an lvalue through the address resolver. Indices that are only
    /// known at run time are fine here; every other addressing error is
    /// reported.
    pub(crate) fn validate_address(&mut self, expr: &Expr) -> SemaResult<()> {
        let storage = FrameStorage {
            locals: &self.locals,
            registry: &self.registry,
            file: self.ctx.file,
        };
        let mut env = ScopeConstants {
            constants: &self.constants,
            locals: &self.locals,
        };
        let resolved = AddressResolver::new(&mut self.arena, &self.registry, &self.interner)
            .with_memo(self.expr_data.constants())
            .resolve(expr, &storage, &mut env);
        match resolved {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.as_semantic(), Some(SemanticError::IndexNotConstant { .. })) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Storage of the frame being checked.
struct FrameStorage<'a> {
    locals: &'a LocalScopes,
    registry: &'a EntityRegistry,
    file: FileId,
}

impl StorageLookup for FrameStorage<'_> {
    fn storage_of(&self, name: Symbol) -> Option<(ValueAddress, TypeId)> {
        if let Some(local) = self.locals.lookup(name) {
            let mut address = ValueAddress::local(local.offset);
            address.is_reference = local.is_reference;
            return Some((address, local.ty));
        }
        let id = self.registry.find_global(name, self.file)?;
        let global = self.registry.globals.get(id);
        Some((ValueAddress::global(global.offset as i32), global.ty))
    }
}

/// Constants visible in the current scope, for transforms that also need
/// the analyzer's node id generator.
pub(super) struct ScopeConstants<'a> {
    pub(super) constants: &'a ConstantStack,
    pub(super) locals: &'a LocalScopes,
}

impl ComputeEnv for ScopeConstants<'_> {
    fn constant(&self, name: Symbol) -> Option<DataItem> {
        visible_constant(self.constants, self.locals, name)
    }
}
