//! Usage counters, kept apart from the definitions they describe.
//!
//! Only the reference collector writes this table. Definitions themselves
//! stay immutable after the body pass.

use rustc_hash::FxHashMap;

use crate::entity_defs::CallableRef;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageCount {
    /// References from code that survives unused-elimination
    pub times_used: u32,
    /// References from anywhere, including eliminated code
    pub times_used_total: u32,
}

#[derive(Debug, Clone, Default)]
pub struct UsageTable {
    counts: FxHashMap<CallableRef, UsageCount>,
}

impl UsageTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, callable: CallableRef) -> UsageCount {
        self.counts.get(&callable).copied().unwrap_or_default()
    }

    pub fn record_total(&mut self, callable: CallableRef) {
        self.counts.entry(callable).or_default().times_used_total += 1;
    }

    pub fn record_live(&mut self, callable: CallableRef) {
        self.counts.entry(callable).or_default().times_used += 1;
    }

    pub fn clear_live(&mut self) {
        for count in self.counts.values_mut() {
            count.times_used = 0;
        }
    }
}
