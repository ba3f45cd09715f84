// src/entity_defs.rs
//
// Definition records stored in the EntityRegistry arenas.

use std::rc::Rc;

use brim_identity::{
    ConstructorId, FileId, FunctionId, GeneralFunctionId, OperatorId, Span, Symbol,
};
use brim_syntax::{Block, OperatorKind, ParamModifier};

use crate::data_item::DataItem;
use crate::generic::TypeArguments;
use crate::type_arena::TypeId;

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: Symbol,
    /// May mention the owner's type parameters
    pub ty: TypeId,
    pub span: Span,
}

/// Struct or class definition. Fields are filled in after every type name
/// of the compilation unit is registered.
#[derive(Debug, Clone)]
pub struct AggregateDef {
    pub name: Symbol,
    pub file: FileId,
    pub type_params: Vec<Symbol>,
    pub fields: Vec<FieldDef>,
    pub span: Span,
}

impl AggregateDef {
    pub fn field(&self, name: Symbol) -> Option<(usize, &FieldDef)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct EnumMemberDef {
    pub name: Symbol,
    pub value: DataItem,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: Symbol,
    pub file: FileId,
    pub members: Vec<EnumMemberDef>,
    /// Builtin type shared by every member value
    pub underlying: TypeId,
    pub span: Span,
}

impl EnumDef {
    pub fn member(&self, name: Symbol) -> Option<&EnumMemberDef> {
        self.members.iter().find(|m| m.name == name)
    }
}

/// Special member functions with fixed shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneralKind {
    Destructor,
    Clone,
    IndexerGet,
    IndexerSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Operator(OperatorKind),
    Constructor,
    General(GeneralKind),
}

/// Handle to any callable, tagged by the arena it lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallableRef {
    Function(FunctionId),
    Operator(OperatorId),
    Constructor(ConstructorId),
    General(GeneralFunctionId),
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: Symbol,
    pub ty: TypeId,
    pub modifier: Option<ParamModifier>,
}

/// One entity type for functions, methods, operators, constructors and
/// general functions. Template instances are ordinary entries whose
/// `template_origin` points back at the generic declaration.
#[derive(Debug, Clone)]
pub struct CallableDef {
    pub name: Symbol,
    pub kind: CallableKind,
    pub file: FileId,
    /// Methods, constructors and general functions carry the receiver as
    /// `this` first.
    pub params: Vec<ParamDef>,
    /// Return type, or the constructed type for constructors
    pub ret: TypeId,
    pub type_params: Vec<Symbol>,
    /// Owning struct/class type, in its generic form for templates
    pub owner: Option<TypeId>,
    /// Type parameters of the owner, bound alongside `type_params`
    pub owner_type_params: Vec<Symbol>,
    /// Own type parameters or a generic owner
    pub is_template: bool,
    pub body: Option<Rc<Block>>,
    /// Host function name from `[External("name")]`
    pub external: Option<String>,
    pub template_origin: Option<CallableRef>,
    /// Bindings this instance was created with (empty for declarations)
    pub type_args: TypeArguments,
    pub span: Span,
}

impl CallableDef {
    pub fn param_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.params.iter().map(|p| p.ty)
    }

    /// Every generic name that must be bound to instantiate this callable.
    pub fn generic_names(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.owner_type_params
            .iter()
            .chain(self.type_params.iter())
            .copied()
    }

    pub fn is_instance(&self) -> bool {
        self.template_origin.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: Symbol,
    pub file: FileId,
    pub params: Vec<Symbol>,
    pub body: Rc<Block>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct GlobalDef {
    pub name: Symbol,
    pub file: FileId,
    pub ty: TypeId,
    /// Absolute slot offset in the global area
    pub offset: u32,
    pub span: Span,
}
