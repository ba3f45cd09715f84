// Analysis output and builder for the analyzer.

use brim_identity::{ConstructorId, FunctionId, GeneralFunctionId, Interner, OperatorId};
use brim_syntax::{Expr, NodeIdGen};

use crate::address::{AddressResolver, StorageLookup, ValueAddress};
use crate::config::{HostFunction, SemaConfig};
use crate::consteval::LiteralEnv;
use crate::diagnostics::{CompileHint, CompileWarning, SemaResult};
use crate::entity_defs::CallableRef;
use crate::entity_registry::{EntityRegistry, UsageTable};
use crate::expression_data::ExpressionData;
use crate::generic::TemplateCache;
use crate::scope::{ConstantStack, LocalScopes};
use crate::type_arena::{TypeArena, TypeId};
use crate::well_known::WellKnownNames;

use super::{Analyzer, BodyContext};

/// Callables that survived unused-elimination, per arena, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveCallables {
    pub functions: Vec<FunctionId>,
    pub operators: Vec<OperatorId>,
    pub constructors: Vec<ConstructorId>,
    pub general_functions: Vec<GeneralFunctionId>,
}

impl LiveCallables {
    pub fn contains(&self, callable: CallableRef) -> bool {
        match callable {
            CallableRef::Function(id) => self.functions.contains(&id),
            CallableRef::Operator(id) => self.operators.contains(&id),
            CallableRef::Constructor(id) => self.constructors.contains(&id),
            CallableRef::General(id) => self.general_functions.contains(&id),
        }
    }

    pub(crate) fn push(&mut self, callable: CallableRef) {
        match callable {
            CallableRef::Function(id) => self.functions.push(id),
            CallableRef::Operator(id) => self.operators.push(id),
            CallableRef::Constructor(id) => self.constructors.push(id),
            CallableRef::General(id) => self.general_functions.push(id),
        }
    }

    pub fn len(&self) -> usize {
        self.functions.len() + self.operators.len() + self.constructors.len() + self.general_functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output from semantic analysis, bundling everything the code generators read.
pub struct AnalysisOutput {
    pub registry: EntityRegistry,
    pub arena: TypeArena,
    pub interner: Interner,
    /// Per-node types, call resolutions, constants, inlined macros and unrolled loops
    pub expression_data: ExpressionData,
    pub usage: UsageTable,
    pub live: LiveCallables,
    /// Live template instances in creation order
    pub template_instances: Vec<CallableRef>,
    /// Slots of the global area
    pub global_slots: u32,
    pub warnings: Vec<CompileWarning>,
    pub hints: Vec<CompileHint>,
}

impl AnalysisOutput {
    /// Address of an lvalue, computed from the current layout. Constant
    /// indices folded during analysis are reused.
    pub fn resolve_address(
        &mut self,
        expr: &Expr,
        storage: &dyn StorageLookup,
    ) -> SemaResult<(ValueAddress, TypeId)> {
        AddressResolver::new(&mut self.arena, &self.registry, &self.interner)
            .with_memo(self.expression_data.constants())
            .resolve(expr, storage, &mut LiteralEnv)
    }

    pub fn is_live(&self, callable: CallableRef) -> bool {
        self.live.contains(callable)
    }
}

/// Builder for creating Analyzer instances.
pub struct AnalyzerBuilder {
    interner: Interner,
    config: SemaConfig,
}

impl AnalyzerBuilder {
    /// Start from the parser's interner, so symbols in the AST stay valid.
    pub fn new(interner: Interner) -> Self {
        Self {
            interner,
            config: SemaConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SemaConfig) -> Self {
        self.config = config;
        self
    }

    /// Make a host function available to `[External("name")]`.
    pub fn with_host_function(mut self, host: HostFunction) -> Self {
        self.config.host_functions.push(host);
        self
    }

    pub fn unroll_loops(mut self, unroll: bool) -> Self {
        self.config.unroll_loops = unroll;
        self
    }

    pub fn eliminate_unused(mut self, eliminate: bool) -> Self {
        self.config.eliminate_unused = eliminate;
        self
    }

    pub fn require_entry_point(mut self, require: bool) -> Self {
        self.config.require_entry_point = require;
        self
    }

    pub fn build(self) -> Analyzer {
        let mut interner = self.interner;
        let well_known = WellKnownNames::new(&mut interner);
        Analyzer {
            config: self.config,
            interner,
            well_known,
            arena: TypeArena::new(),
            registry: EntityRegistry::new(),
            expr_data: ExpressionData::new(),
            templates: TemplateCache::new(),
            worklist: Default::default(),
            constants: ConstantStack::new(),
            locals: LocalScopes::new(),
            ctx: BodyContext::default(),
            references: Vec::new(),
            global_slots: 0,
            live: LiveCallables::default(),
            usage: UsageTable::new(),
            warnings: Vec::new(),
            hints: Vec::new(),
            ids: NodeIdGen::starting_at(0),
        }
    }
}
