//! Learned clause database reduction.
use ordered_float::OrderedFloat;
use partial_ref::{partial, PartialRef};

use crate::context::{parts::*, Context};

/// Learned clauses with a glue level up to this are never deleted.
const KEEP_GLUE: u32 = 2;

/// Delete the less active half of the learned clauses.
///
/// Clauses that are reasons for current assignments and clauses with a very low glue level are
/// kept. Watches of deleted clauses are removed, after which their slots are reused.
pub fn reduce_learned(
    mut ctx: partial!(
        Context,
        mut ClauseDbP,
        mut WatchlistsP,
        AssignmentP,
        ImplGraphP,
    ),
) {
    let (db, mut ctx) = ctx.split_part_mut(ClauseDbP);

    let mut candidates = vec![];
    for &cref in db.redundant() {
        if db.clause(cref).header.glue > KEEP_GLUE && !db.is_locked(&ctx.borrow(), cref) {
            candidates.push(cref);
        }
    }

    candidates.sort_unstable_by_key(|&cref| OrderedFloat(db.clause(cref).header.activity));
    candidates.truncate(candidates.len() / 2);

    if candidates.is_empty() {
        return;
    }

    db.delete_clauses(&candidates);

    ctx.part_mut(WatchlistsP)
        .retain(|watch| !db.is_deleted(watch.cref));

    db.release_deleted();

    log::trace!("deleted {} learned clauses", candidates.len());
}
