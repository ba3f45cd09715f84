//! Node-level results of analysis.
//!
//! ExpressionData holds everything the code generators need per `NodeId`:
//! the type of each expression, what each call resolved to, folded
//! constants, inlined macro bodies and unrolled loops. Addresses are not
//! stored; they are recomputed from types through `AddressResolver`.

use rustc_hash::FxHashMap;

use brim_identity::MacroId;
use brim_syntax::{Block, NodeId};

use crate::data_item::DataItem;
use crate::entity_defs::CallableRef;
use crate::transforms::InlineResult;
use crate::type_arena::TypeId;

/// What a call, operator use or index expression resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedCall {
    /// User function, method, operator, constructor or general function,
    /// template instances included
    Callable(CallableRef),
    /// Operator on builtin operands, emitted directly
    BuiltinOperator,
    /// Indexing a pointer without a declared indexer: deref + offset
    PointerOffset { element_size: u32 },
    /// Indexing a fixed-size stack array
    ArrayElement { element_size: u32 },
    /// Inlined macro; the expansion is in `inlined`
    Macro(MacroId),
    /// `sizeof`, already folded
    SizeOf(u32),
    /// Call through a function-typed value
    Indirect,
    /// `delete` of a value whose type has no destructor
    BuiltinDelete,
    /// Function named as a value
    FunctionValue(CallableRef),
}

#[derive(Debug, Clone, Default)]
pub struct ExpressionData {
    types: FxHashMap<NodeId, TypeId>,
    calls: FxHashMap<NodeId, ResolvedCall>,
    constants: FxHashMap<NodeId, DataItem>,
    inlined: FxHashMap<NodeId, InlineResult>,
    unrolled: FxHashMap<NodeId, Vec<Block>>,
}

impl ExpressionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type(&mut self, node: NodeId, ty: TypeId) {
        self.types.insert(node, ty);
    }

    pub fn get_type(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).copied()
    }

    pub fn set_call(&mut self, node: NodeId, call: ResolvedCall) {
        self.calls.insert(node, call);
    }

    pub fn call(&self, node: NodeId) -> Option<ResolvedCall> {
        self.calls.get(&node).copied()
    }

    pub fn calls(&self) -> impl Iterator<Item = (NodeId, ResolvedCall)> + '_ {
        self.calls.iter().map(|(n, c)| (*n, *c))
    }

    pub fn set_constant(&mut self, node: NodeId, value: DataItem) {
        self.constants.insert(node, value);
    }

    pub fn constant(&self, node: NodeId) -> Option<DataItem> {
        self.constants.get(&node).copied()
    }

    /// Known values, usable as a `try_compute` memo.
    pub fn constants(&self) -> &FxHashMap<NodeId, DataItem> {
        &self.constants
    }

    pub fn set_inlined(&mut self, node: NodeId, result: InlineResult) {
        self.inlined.insert(node, result);
    }

    pub fn inlined(&self, node: NodeId) -> Option<&InlineResult> {
        self.inlined.get(&node)
    }

    pub fn set_unrolled(&mut self, node: NodeId, blocks: Vec<Block>) {
        self.unrolled.insert(node, blocks);
    }

    /// Per-iteration blocks of an unrolled `for`, keyed by the loop's id.
    pub fn unrolled(&self, node: NodeId) -> Option<&[Block]> {
        self.unrolled.get(&node).map(Vec::as_slice)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
