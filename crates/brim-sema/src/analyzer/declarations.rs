// src/analyzer/declarations.rs
//
// Passes 1 to 3: register every type, callable and macro of the unit before
// any body is checked, so declarations may refer to each other in any order.

use std::rc::Rc;

use brim_identity::{FileId, Span, Symbol};
use brim_syntax::ast::*;

use super::Analyzer;
use crate::consteval::try_compute_simple;
use crate::data_item::DataItem;
use crate::diagnostics::{CompileError, SemaResult, internal_err, sema_err};
use crate::entity_defs::{
    AggregateDef, CallableDef, CallableKind, CallableRef, EnumDef, EnumMemberDef, FieldDef, GeneralKind,
    MacroDef, ParamDef,
};
use crate::entity_registry::OwnerKey;
use crate::errors::SemanticWarning;
use crate::generic::TypeArguments;
use crate::type_arena::{TypeId, TypeIdVec};
use crate::type_display::display_signature;

/// Every declaration of the unit with the file it belongs to.
pub(super) fn file_decls(program: &Program) -> impl Iterator<Item = (FileId, &Decl)> {
    program.files.iter().enumerate().flat_map(|(i, file)| {
        let id = FileId::new(i as u32);
        file.declarations.iter().map(move |decl| (id, decl))
    })
}

fn type_param_names(params: &[TypeParam]) -> Vec<Symbol> {
    params.iter().map(|p| p.name).collect()
}

fn missing_declaration(span: Span) -> CompileError {
    internal_err!(span, ImpossibleState {
        detail: "declaration was not registered in pass 1".to_string(),
    })
}

/// The struct or class whose members are being declared.
struct MemberOwner {
    /// Owner type over its own placeholders
    ty: TypeId,
    type_params: Vec<Symbol>,
    is_struct: bool,
}

impl Analyzer {
    // Pass 1

    #[tracing::instrument(skip_all)]
    pub(super) fn declare_types(&mut self, program: &Program) -> SemaResult<()> {
        for (file, decl) in file_decls(program) {
            self.ctx.file = file;
            self.register_type_shell(decl).map_err(|e| e.in_file(file))?;
        }
        for (file, decl) in file_decls(program) {
            self.ctx.file = file;
            self.complete_type(decl).map_err(|e| e.in_file(file))?;
        }
        // Sizes need every field of every struct
        for (file, decl) in file_decls(program) {
            if let Decl::Struct(s) = decl
                && s.type_params.is_empty()
            {
                let id = self.registry.find_struct(s.name, file).ok_or_else(|| missing_declaration(s.span))?;
                let ty = self.arena.struct_type(id, TypeIdVec::new());
                self.layout().size_on_stack(ty, s.span).map_err(|e| e.in_file(file))?;
            }
        }
        tracing::debug!(
            structs = self.registry.structs.len(),
            classes = self.registry.classes.len(),
            enums = self.registry.enums.len(),
            "types declared"
        );
        Ok(())
    }

    fn register_type_shell(&mut self, decl: &Decl) -> SemaResult<()> {
        let file = self.ctx.file;
        let (name, span) = match decl {
            Decl::Struct(s) => (s.name, s.span),
            Decl::Class(c) => (c.name, c.span),
            Decl::Enum(e) => (e.name, e.span),
            _ => return Ok(()),
        };
        if self.registry.type_defined_in_file(name, file) {
            return Err(sema_err!(span, AlreadyDefined {
                kind: "type".to_string(),
                name: self.name(name),
            }));
        }
        match decl {
            Decl::Struct(s) => {
                self.registry.structs.push(AggregateDef {
                    name,
                    file,
                    type_params: type_param_names(&s.type_params),
                    fields: Vec::new(),
                    span,
                });
            }
            Decl::Class(c) => {
                self.registry.classes.push(AggregateDef {
                    name,
                    file,
                    type_params: type_param_names(&c.type_params),
                    fields: Vec::new(),
                    span,
                });
            }
            _ => {
                self.registry.enums.push(EnumDef {
                    name,
                    file,
                    members: Vec::new(),
                    underlying: TypeId::INTEGER,
                    span,
                });
            }
        }
        Ok(())
    }

    fn complete_type(&mut self, decl: &Decl) -> SemaResult<()> {
        let file = self.ctx.file;
        match decl {
            Decl::Struct(s) => {
                let id = self.registry.find_struct(s.name, file).ok_or_else(|| missing_declaration(s.span))?;
                let names = type_param_names(&s.type_params);
                let fields = self.resolve_fields(&s.members.fields, &names)?;
                self.registry.structs.get_mut(id).fields = fields;
                let ty = self.declared_type(OwnerKey::Struct(id));
                self.apply_type_attributes(&s.attributes, ty)
            }
            Decl::Class(c) => {
                let id = self.registry.find_class(c.name, file).ok_or_else(|| missing_declaration(c.span))?;
                let names = type_param_names(&c.type_params);
                let fields = self.resolve_fields(&c.members.fields, &names)?;
                self.registry.classes.get_mut(id).fields = fields;
                let ty = self.declared_type(OwnerKey::Class(id));
                self.apply_type_attributes(&c.attributes, ty)
            }
            Decl::Enum(e) => {
                let id = self.registry.find_enum(e.name, file).ok_or_else(|| missing_declaration(e.span))?;
                let members = self.enum_members(e)?;
                let def = self.registry.enums.get_mut(id);
                def.underlying = members.first().map_or(TypeId::INTEGER, |m| m.value.type_id());
                def.members = members;
                let ty = self.arena.enum_type(id);
                self.apply_type_attributes(&e.attributes, ty)
            }
            _ => Ok(()),
        }
    }

    fn resolve_fields(&mut self, decls: &[FieldDecl], generics: &[Symbol]) -> SemaResult<Vec<FieldDef>> {
        self.with_generics(generics, |this| {
            let mut fields: Vec<FieldDef> = Vec::with_capacity(decls.len());
            for field in decls {
                if fields.iter().any(|f| f.name == field.name) {
                    return Err(sema_err!(field.span, AlreadyDefined {
                        kind: "field".to_string(),
                        name: this.name(field.name),
                    }));
                }
                let ty = this.resolve_type(&field.ty)?;
                fields.push(FieldDef {
                    name: field.name,
                    ty,
                    span: field.span,
                });
            }
            Ok(fields)
        })
    }

    /// Member values: explicit values must be literal expressions, implicit
    /// ones continue from the previous member (starting at 0). Every member
    /// shares one type.
    fn enum_members(&mut self, decl: &EnumDecl) -> SemaResult<Vec<EnumMemberDef>> {
        let mut members: Vec<EnumMemberDef> = Vec::with_capacity(decl.members.len());
        let mut next = DataItem::Integer(0);
        for member in &decl.members {
            if members.iter().any(|m| m.name == member.name) {
                return Err(sema_err!(member.span, AlreadyDefined {
                    kind: "enum member".to_string(),
                    name: self.name(member.name),
                }));
            }
            let value = match &member.value {
                Some(expr) => try_compute_simple(expr).ok_or_else(|| {
                    sema_err!(expr.span, EnumValueNotConstant {
                        member: self.name(member.name),
                    })
                })?,
                None => next,
            };
            if let Some(first) = members.first()
                && !first.value.same_type(value)
            {
                return Err(sema_err!(member.span, EnumMixedTypes {
                    name: self.name(decl.name),
                }));
            }
            next = successor(value);
            members.push(EnumMemberDef {
                name: member.name,
                value,
            });
        }
        Ok(members)
    }

    /// Struct or class type over its own placeholders.
    fn declared_type(&mut self, owner: OwnerKey) -> TypeId {
        let params = self.registry.aggregate(owner).type_params.clone();
        let args: TypeIdVec = params.iter().map(|p| self.arena.placeholder(*p)).collect();
        match owner {
            OwnerKey::Struct(id) => self.arena.struct_type(id, args),
            OwnerKey::Class(id) => self.arena.class_type(id, args),
        }
    }

    fn apply_type_attributes(&mut self, attributes: &[Attribute], ty: TypeId) -> SemaResult<()> {
        for attr in attributes {
            if attr.name == self.well_known.define {
                for alias in &attr.args {
                    if !self.registry.define_type_replacer(alias, ty) {
                        return Err(sema_err!(attr.span, DuplicateTypeReplacer {
                            alias: alias.clone(),
                        }));
                    }
                    tracing::debug!(%alias, "type replacer defined");
                }
            } else if !self.well_known.is_known_attribute(attr.name) {
                self.warn_unknown_attribute(attr);
            }
        }
        Ok(())
    }

    fn warn_unknown_attribute(&mut self, attr: &Attribute) {
        let warning = SemanticWarning::UnknownAttribute {
            name: self.name(attr.name),
            span: attr.span.into(),
        };
        self.warn(warning, attr.span);
    }

    // Pass 2

    #[tracing::instrument(skip_all)]
    pub(super) fn declare_functions(&mut self, program: &Program) -> SemaResult<()> {
        for (file, decl) in file_decls(program) {
            self.ctx.file = file;
            let result = match decl {
                Decl::Function(f) => self.declare_function(f, None).map(|_| ()),
                Decl::Operator(o) => self.declare_operator(o),
                Decl::Macro(m) => self.declare_macro(m),
                _ => Ok(()),
            };
            result.map_err(|e| e.in_file(file))?;
        }
        tracing::debug!(
            functions = self.registry.functions.len(),
            operators = self.registry.operators.len(),
            macros = self.registry.macros.len(),
            "functions declared"
        );
        Ok(())
    }

    /// Parameter and return types of a declaration with `generics` in scope.
    fn build_signature(
        &mut self,
        params: &[Param],
        return_type: Option<&TypeExpr>,
        generics: &[Symbol],
    ) -> SemaResult<(Vec<ParamDef>, TypeId)> {
        self.with_generics(generics, |this| {
            let mut defs = Vec::with_capacity(params.len());
            for p in params {
                if defs.iter().any(|d: &ParamDef| d.name == p.name) {
                    return Err(sema_err!(p.span, AlreadyDefined {
                        kind: "parameter".to_string(),
                        name: this.name(p.name),
                    }));
                }
                defs.push(ParamDef {
                    name: p.name,
                    ty: this.resolve_type(&p.ty)?,
                    modifier: p.modifier,
                });
            }
            let ret = match return_type {
                Some(ty) => this.resolve_type(ty)?,
                None => TypeId::VOID,
            };
            Ok((defs, ret))
        })
    }

    fn declare_function(&mut self, f: &FuncDecl, owner: Option<&MemberOwner>) -> SemaResult<CallableRef> {
        let type_params = type_param_names(&f.type_params);
        let owner_type_params = owner.map(|o| o.type_params.clone()).unwrap_or_default();
        let generics: Vec<Symbol> = owner_type_params.iter().chain(&type_params).copied().collect();
        let (mut params, ret) = self.build_signature(&f.params, f.return_type.as_ref(), &generics)?;
        if let Some(owner) = owner {
            params.insert(0, self.this_param(owner));
        }

        let mut external = None;
        let mut is_entry = false;
        for attr in &f.attributes {
            if attr.name == self.well_known.external {
                let host = attr.args.first().cloned().unwrap_or_else(|| self.name(f.name));
                self.check_external(&host, f.name, &params, ret, attr.span)?;
                external = Some(host);
            } else if attr.name == self.well_known.code_entry {
                if owner.is_some() {
                    return Err(sema_err!(attr.span, MethodEntryPoint {}));
                }
                if !generics.is_empty() {
                    return Err(sema_err!(attr.span, TemplateEntryPoint {}));
                }
                if self.registry.entry_point().is_some() {
                    return Err(sema_err!(attr.span, DuplicateEntryPoint {}));
                }
                is_entry = true;
            } else if !self.well_known.is_known_attribute(attr.name) {
                self.warn_unknown_attribute(attr);
            }
        }

        let def = CallableDef {
            name: f.name,
            kind: CallableKind::Function,
            file: self.ctx.file,
            params,
            ret,
            type_params,
            owner: owner.map(|o| o.ty),
            owner_type_params,
            is_template: !generics.is_empty(),
            body: f.body.clone().map(Rc::new),
            external,
            template_origin: None,
            type_args: TypeArguments::new(),
            span: f.span,
        };
        let kind = if owner.is_some() { "method" } else { "function" };
        let handle = self.register_callable(def, kind)?;
        if is_entry && let CallableRef::Function(id) = handle {
            self.registry.set_entry_point(id);
        }
        Ok(handle)
    }

    /// `[External]` functions must match the host signature exactly.
    fn check_external(&mut self, host: &str, name: Symbol, params: &[ParamDef], ret: TypeId, span: Span) -> SemaResult<()> {
        let Some(host_fn) = self.config.host_function(host).cloned() else {
            return Err(sema_err!(span, UnknownExternal {
                name: host.to_string(),
            }));
        };
        let host_params: Vec<TypeId> = host_fn.params.iter().map(|p| p.to_type_id(&mut self.arena)).collect();
        let host_ret = host_fn.ret.to_type_id(&mut self.arena);
        let matches = host_ret == ret
            && host_params.len() == params.len()
            && host_params.iter().zip(params).all(|(h, p)| *h == p.ty);
        if !matches {
            let signature = display_signature(&self.arena, &self.registry, &self.interner, name, &host_params);
            return Err(sema_err!(span, ExternalSignatureMismatch {
                name: host.to_string(),
                expected: format!("{} -> {}", signature, self.type_name(host_ret)),
            }));
        }
        Ok(())
    }

    fn declare_operator(&mut self, o: &OperatorDecl) -> SemaResult<()> {
        let expected = match o.op {
            OperatorKind::Binary(_) => 2,
            OperatorKind::Unary(_) => 1,
        };
        if o.params.len() != expected {
            return Err(sema_err!(o.span, WrongArgumentCount {
                expected,
                found: o.params.len(),
            }));
        }
        let symbol = match o.op {
            OperatorKind::Binary(op) => op.as_str(),
            OperatorKind::Unary(op) => op.as_str(),
        };
        let name = self.interner.intern(&format!("operator{}", symbol));
        let type_params = type_param_names(&o.type_params);
        let (params, ret) = self.build_signature(&o.params, o.return_type.as_ref(), &type_params)?;
        for attr in &o.attributes {
            if !self.well_known.is_known_attribute(attr.name) {
                self.warn_unknown_attribute(attr);
            }
        }
        let def = CallableDef {
            name,
            kind: CallableKind::Operator(o.op),
            file: self.ctx.file,
            params,
            ret,
            is_template: !type_params.is_empty(),
            type_params,
            owner: None,
            owner_type_params: Vec::new(),
            body: Some(Rc::new(o.body.clone())),
            external: None,
            template_origin: None,
            type_args: TypeArguments::new(),
            span: o.span,
        };
        self.register_callable(def, "operator")?;
        Ok(())
    }

    fn declare_macro(&mut self, m: &MacroDecl) -> SemaResult<()> {
        let file = self.ctx.file;
        if self.registry.macros.find(|d| d.name == m.name && d.file == file).is_some() {
            return Err(sema_err!(m.span, AlreadyDefined {
                kind: "macro".to_string(),
                name: self.name(m.name),
            }));
        }
        self.registry.macros.push(MacroDef {
            name: m.name,
            file,
            params: m.params.clone(),
            body: Rc::new(m.body.clone()),
            span: m.span,
        });
        Ok(())
    }

    /// Store a callable, rejecting a second non-template declaration with
    /// the same name, owner and parameter types.
    fn register_callable(&mut self, def: CallableDef, kind: &str) -> SemaResult<CallableRef> {
        if !def.is_template && self.registry.find_duplicate_callable(&self.arena, &def).is_some() {
            return Err(sema_err!(def.span, AlreadyDefined {
                kind: kind.to_string(),
                name: self.name(def.name),
            }));
        }
        let handle = self.registry.push_callable(def);
        tracing::trace!(?handle, kind, "callable declared");
        Ok(handle)
    }

    // Pass 3

    #[tracing::instrument(skip_all)]
    pub(super) fn declare_members(&mut self, program: &Program) -> SemaResult<()> {
        for (file, decl) in file_decls(program) {
            self.ctx.file = file;
            let (members, owner, span) = match decl {
                Decl::Struct(s) => {
                    let id = self.registry.find_struct(s.name, file).ok_or_else(|| missing_declaration(s.span))?;
                    (&s.members, OwnerKey::Struct(id), s.span)
                }
                Decl::Class(c) => {
                    let id = self.registry.find_class(c.name, file).ok_or_else(|| missing_declaration(c.span))?;
                    (&c.members, OwnerKey::Class(id), c.span)
                }
                _ => continue,
            };
            let owner = MemberOwner {
                ty: self.declared_type(owner),
                type_params: self.registry.aggregate(owner).type_params.clone(),
                is_struct: matches!(owner, OwnerKey::Struct(_)),
            };
            self.declare_type_members(members, &owner, span).map_err(|e| e.in_file(file))?;
        }
        Ok(())
    }

    fn this_param(&self, owner: &MemberOwner) -> ParamDef {
        ParamDef {
            name: self.well_known.this,
            ty: owner.ty,
            // Structs are values; methods reach them through a reference
            modifier: owner.is_struct.then_some(ParamModifier::Ref),
        }
    }

    fn declare_type_members(&mut self, members: &TypeMembers, owner: &MemberOwner, span: Span) -> SemaResult<()> {
        for method in &members.methods {
            self.declare_function(method, Some(owner))?;
        }

        let owner_name = self
            .registry
            .aggregate_of(&self.arena, owner.ty)
            .map(|def| def.name)
            .ok_or_else(|| missing_declaration(span))?;
        for ctor in &members.constructors {
            let (mut params, _) = self.build_signature(&ctor.params, None, &owner.type_params)?;
            params.insert(0, self.this_param(owner));
            for attr in &ctor.attributes {
                if !self.well_known.is_known_attribute(attr.name) {
                    self.warn_unknown_attribute(attr);
                }
            }
            let def = CallableDef {
                name: owner_name,
                kind: CallableKind::Constructor,
                file: self.ctx.file,
                params,
                ret: owner.ty,
                type_params: Vec::new(),
                owner: Some(owner.ty),
                owner_type_params: owner.type_params.clone(),
                is_template: !owner.type_params.is_empty(),
                body: Some(Rc::new(ctor.body.clone())),
                external: None,
                template_origin: None,
                type_args: TypeArguments::new(),
                span: ctor.span,
            };
            self.register_callable(def, "constructor")?;
        }

        for general in &members.general_functions {
            self.declare_general_function(general, owner)?;
        }
        Ok(())
    }

    fn declare_general_function(&mut self, f: &FuncDecl, owner: &MemberOwner) -> SemaResult<()> {
        let wk = self.well_known;
        let kind = if f.name == wk.destructor {
            GeneralKind::Destructor
        } else if f.name == wk.clone {
            GeneralKind::Clone
        } else if f.name == wk.indexer_get {
            GeneralKind::IndexerGet
        } else if f.name == wk.indexer_set {
            GeneralKind::IndexerSet
        } else {
            return Err(sema_err!(f.span, UnknownGeneralFunction {
                name: self.name(f.name),
            }));
        };

        let (mut params, ret) = self.build_signature(&f.params, f.return_type.as_ref(), &owner.type_params)?;
        let shape_ok = match kind {
            GeneralKind::Destructor => params.is_empty() && ret == TypeId::VOID,
            GeneralKind::Clone => params.is_empty() && ret == owner.ty,
            GeneralKind::IndexerGet => params.len() == 1 && params[0].ty == TypeId::INTEGER && ret != TypeId::VOID,
            GeneralKind::IndexerSet => params.len() == 2 && params[0].ty == TypeId::INTEGER && ret == TypeId::VOID,
        };
        if !shape_ok || !f.type_params.is_empty() {
            return Err(match kind {
                GeneralKind::Destructor => sema_err!(f.span, InvalidDestructor {}),
                GeneralKind::Clone => sema_err!(f.span, InvalidClone {
                    ty: self.type_name(owner.ty),
                }),
                GeneralKind::IndexerGet => sema_err!(f.span, InvalidIndexerGet {}),
                GeneralKind::IndexerSet => sema_err!(f.span, InvalidIndexerSet {}),
            });
        }
        params.insert(0, self.this_param(owner));

        let def = CallableDef {
            name: f.name,
            kind: CallableKind::General(kind),
            file: self.ctx.file,
            params,
            ret,
            type_params: Vec::new(),
            owner: Some(owner.ty),
            owner_type_params: owner.type_params.clone(),
            is_template: !owner.type_params.is_empty(),
            body: f.body.clone().map(Rc::new),
            external: None,
            template_origin: None,
            type_args: TypeArguments::new(),
            span: f.span,
        };
        self.register_callable(def, "general function")?;
        Ok(())
    }
}

/// Value of the member after `value`, for members without an explicit value.
fn successor(value: DataItem) -> DataItem {
    match value {
        DataItem::Integer(v) => DataItem::Integer(v.wrapping_add(1)),
        DataItem::Byte(v) => DataItem::Byte(v.wrapping_add(1)),
        DataItem::Bool(b) => DataItem::Byte(b as u8 + 1),
        DataItem::Float(v) => DataItem::Float(v + 1.0),
        DataItem::Char(c) => DataItem::Char(char::from_u32(c as u32 + 1).unwrap_or(c)),
    }
}
