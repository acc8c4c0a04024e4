//! Unit propagation.
use partial_ref::{partial, PartialRef};

use indsup_formula::Lit;

use crate::context::{parts::*, Context};

pub mod assignment;
pub mod graph;
pub mod long;
pub mod watch;

pub use assignment::{backtrack, enqueue_assignment, full_restart, Assignment, Trail};
pub use graph::{Conflict, ImplGraph, Reason};
pub use watch::{Watch, Watchlists};

/// Propagate enqueued assignments.
///
/// Returns when all enqueued assignments are propagated, including newly propagated assignemnts,
/// or if there is a conflict.
pub fn propagate(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut TrailP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
) -> Result<(), Conflict> {
    while let Some(lit) = ctx.part(TrailP).queue_head() {
        ctx.part_mut(TrailP).pop_queue();
        propagate_binary(ctx.borrow(), lit)?;
        long::propagate_long(ctx.borrow(), lit)?;
    }
    Ok(())
}

/// Enqueue the literals implied by `lit` through binary clauses.
fn propagate_binary(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut TrailP,
        BinaryClausesP,
    ),
    lit: Lit,
) -> Result<(), Conflict> {
    let (binary_clauses, mut ctx) = ctx.split_part(BinaryClausesP);
    let reason = Reason::Binary([!lit]);

    for &implied in binary_clauses.implied(lit) {
        match ctx.part(AssignmentP).lit_value(implied) {
            Some(true) => (),
            Some(false) => return Err(Conflict::Binary([implied, !lit])),
            None => enqueue_assignment(ctx.borrow(), implied, reason),
        }
    }

    Ok(())
}

/// Restart the search, keeping assumptions and level 0 assignments.
pub fn restart(
    mut ctx: partial!(Context, mut AssignmentP, mut TrailP, mut VsidsP, AssumptionsP),
) {
    let level = ctx.part(AssumptionsP).assumption_levels();
    backtrack(ctx.borrow(), level);
}
