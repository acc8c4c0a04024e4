//! Loading clauses into the oracle.
use partial_ref::{partial, PartialRef};

use indsup_formula::Lit;

use crate::clause::{db, ClauseHeader};
use crate::context::{parts::*, Context};
use crate::prop::{enqueue_assignment, full_restart, Reason};
use crate::state::SearchState;

/// Adds a clause to the current formula.
///
/// Removes duplicated literals, ignores tautological clauses (eg. x v -x v y), handles empty
/// clauses and dispatches among unit, binary and long clauses.
///
/// Every non-tautological clause is stored, even when it is satisfied or propagating at level 0,
/// so that the irredundant clauses can be enumerated exactly as they were added.
pub fn load_clause(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SearchStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
    lits: &[Lit],
) {
    if *ctx.part(SearchStateP) == SearchState::Unsat {
        return;
    }
    ctx.part_mut(SearchStateP).invalidate();

    full_restart(ctx.borrow());
    ctx.part_mut(AssumptionsP).full_restart();

    let (tmp_data, mut ctx) = ctx.split_part_mut(TmpDataP);

    let lits_buf = &mut tmp_data.lits;
    lits_buf.clear();
    lits_buf.extend_from_slice(lits);
    lits_buf.sort_unstable();
    lits_buf.dedup();

    // Sorted by code, so complementary literals are adjacent
    if lits_buf.windows(2).any(|pair| pair[0] == !pair[1]) {
        return;
    }

    // Non-false literals first, so that they are watched.
    let assignment = ctx.part(AssignmentP);
    lits_buf.sort_by_key(|&lit| assignment.lit_is_false(lit));
    let non_false = lits_buf
        .iter()
        .take_while(|&&lit| !assignment.lit_is_false(lit))
        .count();
    let first_unassigned = lits_buf.first().map_or(false, |&lit| assignment.lit_is_unk(lit));
    let any_true = lits_buf.iter().any(|&lit| assignment.lit_is_true(lit));

    if lits_buf.is_empty() || non_false == 0 {
        if let [lit] = lits_buf[..] {
            ctx.part_mut(ClauseDbP).add_unit(lit);
        }
        *ctx.part_mut(SearchStateP) = SearchState::Unsat;
        return;
    }

    let propagating = non_false == 1 && first_unassigned && !any_true;

    match lits_buf[..] {
        [lit] => {
            ctx.part_mut(ClauseDbP).add_unit(lit);
            if propagating {
                enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
            }
        }
        [a, b] => {
            ctx.part_mut(BinaryClausesP).add_binary_clause([a, b], false);
            if propagating {
                enqueue_assignment(ctx.borrow(), a, Reason::Binary([b]));
            }
        }
        _ => {
            let header = ClauseHeader::default();
            let cref = db::add_clause(ctx.borrow(), header, lits_buf);
            if propagating {
                enqueue_assignment(ctx.borrow(), lits_buf[0], Reason::Long(cref));
            }
        }
    }
}
