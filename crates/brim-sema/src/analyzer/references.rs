// src/analyzer/references.rs
//
// Passes 5 and 6: usage counts from the reference log, then fixed-point
// elimination of callables nothing live refers to.

use rustc_hash::FxHashSet;

use super::{Analyzer, LiveCallables};
use crate::entity_defs::{CallableKind, CallableRef, GeneralKind};

impl Analyzer {
    /// Count every reference, from any body, eliminated or not. A body
    /// calling itself does not count as a use.
    pub(super) fn collect_usage(&mut self) {
        for (source, target) in &self.references {
            if *source != Some(*target) {
                self.usage.record_total(*target);
            }
        }
    }

    /// Callables that stay regardless of references: the entry point and
    /// destructors, which run implicitly.
    fn elimination_roots(&self) -> FxHashSet<CallableRef> {
        let mut roots: FxHashSet<CallableRef> = self
            .registry
            .all_callables()
            .into_iter()
            .filter(|c| {
                let def = self.registry.callable(*c);
                !def.is_template && def.kind == CallableKind::General(GeneralKind::Destructor)
            })
            .collect();
        roots.extend(self.registry.entry_point().map(CallableRef::Function));
        roots
    }

    /// Start with everything alive and repeatedly drop callables whose only
    /// references come from dropped code, until nothing changes.
    #[tracing::instrument(skip_all)]
    pub(super) fn eliminate_unused(&mut self) {
        let candidates: Vec<CallableRef> = self
            .registry
            .all_callables()
            .into_iter()
            .filter(|c| !self.registry.callable(*c).is_template)
            .collect();
        let mut live: FxHashSet<CallableRef> = candidates.iter().copied().collect();
        let roots = self.elimination_roots();
        let passes = if self.config.eliminate_unused {
            self.config.max_elimination_passes.max(1)
        } else {
            1
        };

        for pass in 0..passes {
            self.usage.clear_live();
            for (source, target) in &self.references {
                let counts = match source {
                    None => true,
                    Some(source) => source != target && live.contains(source),
                };
                if counts {
                    self.usage.record_live(*target);
                }
            }
            if !self.config.eliminate_unused {
                break;
            }

            let next: FxHashSet<CallableRef> = candidates
                .iter()
                .copied()
                .filter(|c| roots.contains(c) || self.usage.get(*c).times_used > 0)
                .collect();
            let stable = next == live;
            tracing::trace!(pass, live = next.len(), "elimination pass");
            live = next;
            if stable {
                break;
            }
        }

        self.live = LiveCallables::default();
        for callable in candidates {
            if live.contains(&callable) {
                self.live.push(callable);
            }
        }
        tracing::debug!(live = self.live.len(), "unused callables eliminated");
    }
}
