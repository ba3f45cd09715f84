// src/scope.rs
//
// Scoped analyzer state: the compile-time constant stack and the locals and
// parameters of the callable being checked. Both are plain stacks unwound to
// a saved mark; every push made inside a scope is popped when it ends, on
// error paths too.

use std::ops::{Deref, DerefMut};

use brim_identity::{Interner, Span, Symbol};

use crate::data_item::DataItem;
use crate::diagnostics::{SemaResult, sema_err};
use crate::type_arena::TypeId;

/// Slots between the parameters and the first local (return address and
/// saved base pointer).
pub const SAVED_FRAME_SLOTS: i32 = 2;

#[derive(Debug, Clone)]
pub struct CompiledConstant {
    pub name: Symbol,
    pub value: DataItem,
    pub ty: TypeId,
    pub span: Span,
}

/// Saved stack height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeMark(usize);

#[derive(Debug, Default)]
pub struct ConstantStack {
    constants: Vec<CompiledConstant>,
}

impl ConstantStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a constant. The name must not be visible anywhere in the stack,
    /// outer scopes included.
    pub fn push(&mut self, constant: CompiledConstant, interner: &Interner) -> SemaResult<()> {
        if self.constants.iter().any(|c| c.name == constant.name) {
            return Err(sema_err!(constant.span, ConstantAlreadyDefined {
                name: interner.display_name(constant.name).to_string(),
            }));
        }
        self.constants.push(constant);
        Ok(())
    }

    pub fn lookup(&self, name: Symbol) -> Option<&CompiledConstant> {
        self.constants.iter().rev().find(|c| c.name == name)
    }

    pub fn mark(&self) -> ScopeMark {
        ScopeMark(self.constants.len())
    }

    pub fn restore(&mut self, mark: ScopeMark) {
        self.constants.truncate(mark.0);
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Guard that pops everything pushed through it when dropped.
    pub fn scope(&mut self) -> ConstantScope<'_> {
        let mark = self.mark();
        ConstantScope { stack: self, mark }
    }
}

pub struct ConstantScope<'a> {
    stack: &'a mut ConstantStack,
    mark: ScopeMark,
}

impl Deref for ConstantScope<'_> {
    type Target = ConstantStack;

    fn deref(&self) -> &ConstantStack {
        self.stack
    }
}

impl DerefMut for ConstantScope<'_> {
    fn deref_mut(&mut self) -> &mut ConstantStack {
        self.stack
    }
}

impl Drop for ConstantScope<'_> {
    fn drop(&mut self) {
        self.stack.restore(self.mark);
    }
}

/// A local variable or parameter of the current frame.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub name: Symbol,
    pub ty: TypeId,
    /// Base-pointer relative slot offset
    pub offset: i32,
    /// `ref` parameters hold the address of the caller's value
    pub is_reference: bool,
    pub is_param: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalMark {
    len: usize,
    next_offset: i32,
}

/// Locals get non-negative offsets in declaration order; parameters sit
/// below the saved frame.
#[derive(Debug, Default)]
pub struct LocalScopes {
    vars: Vec<LocalVar>,
    next_offset: i32,
    high_water: i32,
}

impl LocalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame.
    pub fn reset(&mut self) {
        self.vars.clear();
        self.next_offset = 0;
        self.high_water = 0;
    }

    /// Declare the parameters of a frame, `this` first. Each entry is
    /// `(name, type, slots, is_reference)`.
    pub fn declare_params(&mut self, params: &[(Symbol, TypeId, u32, bool)]) {
        let mut below: i32 = params.iter().map(|(_, _, slots, _)| *slots as i32).sum();
        for (name, ty, slots, is_reference) in params {
            self.vars.push(LocalVar {
                name: *name,
                ty: *ty,
                offset: -(SAVED_FRAME_SLOTS + below),
                is_reference: *is_reference,
                is_param: true,
            });
            below -= *slots as i32;
        }
    }

    /// Declare a local occupying `slots` and return its offset.
    pub fn declare_local(&mut self, name: Symbol, ty: TypeId, slots: u32) -> i32 {
        let offset = self.next_offset;
        self.vars.push(LocalVar {
            name,
            ty,
            offset,
            is_reference: false,
            is_param: false,
        });
        self.next_offset += slots as i32;
        self.high_water = self.high_water.max(self.next_offset);
        offset
    }

    /// Innermost declaration wins.
    pub fn lookup(&self, name: Symbol) -> Option<&LocalVar> {
        self.vars.iter().rev().find(|v| v.name == name)
    }

    pub fn mark(&self) -> LocalMark {
        LocalMark {
            len: self.vars.len(),
            next_offset: self.next_offset,
        }
    }

    pub fn restore(&mut self, mark: LocalMark) {
        self.vars.truncate(mark.len);
        self.next_offset = mark.next_offset;
    }

    /// Largest number of local slots live at once in this frame
    pub fn frame_size(&self) -> u32 {
        self.high_water as u32
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
