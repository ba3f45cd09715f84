// src/lib.rs
//
// Semantic core of the Brim compiler: type model, symbol tables, overload
// and template resolution, compile-time evaluation, macro inlining, loop
// unrolling and address layout. Consumes the AST from brim-syntax and hands
// an AnalysisOutput to the code generators.

pub mod address;
pub mod analyzer;
pub mod config;
pub mod consteval;
pub mod data_item;
pub mod diagnostics;
pub mod entity_defs;
pub mod entity_registry;
pub mod errors;
pub mod expression_data;
pub mod generic;
pub mod layout;
pub mod overload;
pub mod scope;
pub mod transforms;
pub mod type_arena;
pub mod type_display;
pub mod type_resolution;
pub mod well_known;

pub use address::{AddressMode, AddressResolver, StorageLookup, ValueAddress};
pub use analyzer::{AnalysisOutput, Analyzer, AnalyzerBuilder, LiveCallables};
pub use config::{HostFunction, HostType, SemaConfig};
pub use data_item::DataItem;
pub use diagnostics::{CompileError, CompileHint, CompileWarning, ErrorKind, SemaError, SemaResult};
pub use entity_defs::{CallableDef, CallableKind, CallableRef, GeneralKind};
pub use entity_registry::{EntityRegistry, OwnerKey, UsageCount, UsageTable};
pub use errors::{InternalError, SemanticError, SemanticHint, SemanticWarning};
pub use expression_data::{ExpressionData, ResolvedCall};
pub use type_arena::{BuiltinKind, SemaType, TypeArena, TypeId};
