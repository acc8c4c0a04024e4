//! Solving under assumptions.
//!
//! Assumptions are enqueued as pseudo decisions, one decision level each, before any real decision
//! is made. An assumption that is already true still opens its own, empty, decision level so that
//! the assumption index always matches the decision level.

use partial_ref::{partial, PartialRef};

use indsup_formula::Lit;

use crate::context::{parts::*, Context};
use crate::prop::{enqueue_assignment, full_restart, Reason};

#[derive(Default, Clone)]
pub struct Assumptions {
    assumptions: Vec<Lit>,
    assumption_levels: usize,
}

impl Assumptions {
    /// Current number of decision levels used for assumptions.
    pub fn assumption_levels(&self) -> usize {
        self.assumption_levels
    }

    /// Lower the number of assumption levels after backtracking to `level`.
    pub fn backtracked_to(&mut self, level: usize) {
        self.assumption_levels = self.assumption_levels.min(level);
    }

    /// Resets assumption_levels to zero on a full restart.
    pub fn full_restart(&mut self) {
        self.assumption_levels = 0;
    }
}

/// Return type of [`enqueue_assumption`].
pub enum EnqueueAssumption {
    Done,
    Enqueued,
    Conflict,
}

/// Change the currently active assumptions.
pub fn set_assumptions(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut SearchStateP,
        mut TrailP,
        mut VsidsP,
    ),
    assumptions: &[Lit],
) {
    full_restart(ctx.borrow());

    ctx.part_mut(SearchStateP).invalidate();

    let target = ctx.part_mut(AssumptionsP);
    target.full_restart();
    target.assumptions.clear();
    target.assumptions.extend_from_slice(assumptions);
}

/// Enqueue another assumption if possible.
///
/// Returns whether an assumption was enqueued, whether no assumptions are left or whether the
/// assumptions result in a conflict.
pub fn enqueue_assumption(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ImplGraphP,
        mut TrailP,
    ),
) -> EnqueueAssumption {
    while let Some(&assumption) = ctx
        .part(AssumptionsP)
        .assumptions
        .get(ctx.part(TrailP).current_level())
    {
        match ctx.part(AssignmentP).lit_value(assumption) {
            Some(false) => return EnqueueAssumption::Conflict,
            Some(true) => {
                ctx.part_mut(TrailP).new_decision_level();
            }
            None => {
                ctx.part_mut(TrailP).new_decision_level();
                enqueue_assignment(ctx.borrow(), assumption, Reason::Unit);
                let level = ctx.part(TrailP).current_level();
                ctx.part_mut(AssumptionsP).assumption_levels = level;
                return EnqueueAssumption::Enqueued;
            }
        }
        let level = ctx.part(TrailP).current_level();
        ctx.part_mut(AssumptionsP).assumption_levels = level;
    }
    EnqueueAssumption::Done
}
