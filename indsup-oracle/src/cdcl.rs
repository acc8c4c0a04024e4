//! Conflict driven clause learning.

use partial_ref::{partial, PartialRef};

use crate::analyze_conflict::analyze_conflict;
use crate::assumptions::{enqueue_assumption, EnqueueAssumption};
use crate::clause::{bump_clause_activity, db, decay_clause_activities, ClauseHeader};
use crate::context::{parts::*, Context};
use crate::glue::compute_glue;
use crate::prop::{backtrack, enqueue_assignment, propagate, Conflict, Reason};
use crate::state::SearchState;

/// Why [`find_conflict`] stopped without a satisfying assignment.
pub enum FoundConflict {
    Conflict(Conflict),
    /// An assumption is falsified by the formula and the other assumptions.
    Assumption,
}

impl From<Conflict> for FoundConflict {
    fn from(conflict: Conflict) -> FoundConflict {
        FoundConflict::Conflict(conflict)
    }
}

/// Find a conflict, learn a clause and backtrack.
///
/// Returns whether a conflict was analyzed.
pub fn conflict_step(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut AssignmentP,
        mut AssumptionsP,
        mut BinaryClausesP,
        mut ClauseActivityP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SearchStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
    ),
) -> bool {
    let conflict = match find_conflict(ctx.borrow()) {
        Ok(()) => {
            *ctx.part_mut(SearchStateP) = SearchState::Sat;
            return false;
        }
        Err(FoundConflict::Assumption) => {
            *ctx.part_mut(SearchStateP) = SearchState::FailedAssumptions;
            return false;
        }
        Err(FoundConflict::Conflict(conflict)) => conflict,
    };

    let backtrack_to = analyze_conflict(ctx.borrow(), conflict);

    let (analyze, mut ctx) = ctx.split_part(AnalyzeConflictP);

    for &cref in analyze.involved() {
        bump_clause_activity(ctx.borrow(), cref);
    }

    decay_clause_activities(ctx.borrow());

    backtrack(ctx.borrow(), backtrack_to);
    ctx.part_mut(AssumptionsP).backtracked_to(backtrack_to);

    let clause = analyze.clause();

    let reason = match clause.len() {
        0 => {
            *ctx.part_mut(SearchStateP) = SearchState::Unsat;
            return true;
        }
        1 => Reason::Unit,
        2 => {
            ctx.part_mut(BinaryClausesP)
                .add_binary_clause([clause[0], clause[1]], true);
            Reason::Binary([clause[1]])
        }
        _ => {
            let glue = compute_glue(ctx.borrow(), clause) as u32;
            let header = ClauseHeader {
                redundant: true,
                glue,
                ..ClauseHeader::default()
            };
            let cref = db::add_clause(ctx.borrow(), header, clause);
            bump_clause_activity(ctx.borrow(), cref);
            Reason::Long(cref)
        }
    };

    enqueue_assignment(ctx.borrow(), clause[0], reason);

    true
}

/// Find a conflict.
///
/// Returns `Err` if a conflict was found and `Ok` if a satisfying assignment was found instead.
pub fn find_conflict(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
) -> Result<(), FoundConflict> {
    loop {
        propagate(ctx.borrow())?;

        match enqueue_assumption(ctx.borrow()) {
            EnqueueAssumption::Enqueued => continue,
            EnqueueAssumption::Conflict => return Err(FoundConflict::Assumption),
            EnqueueAssumption::Done => (),
        }

        if !decide(ctx.borrow()) {
            return Ok(());
        }
    }
}

/// Enqueue the unassigned variable of highest activity on a new decision level, using its saved
/// phase.
///
/// Returns `false` when the assignment is complete.
fn decide(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP
    ),
) -> bool {
    let (vsids, mut ctx) = ctx.split_part_mut(VsidsP);
    let assignment = ctx.part(AssignmentP);
    let var = match vsids.find(|&var| assignment.var_value(var).is_none()) {
        Some(var) => var,
        None => return false,
    };
    let phase = ctx.part(AssignmentP).last_var_value(var);

    ctx.part_mut(TrailP).new_decision_level();
    enqueue_assignment(ctx.borrow(), var.lit(phase), Reason::Unit);

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use partial_ref::IntoPartialRefMut;

    use indsup_formula::test::{sat_formula, sgen_unsat_formula};
    use indsup_formula::CnfFormula;

    use crate::context::set_var_count;
    use crate::load::load_clause;

    fn solve(formula: &CnfFormula) -> (SearchState, Vec<Option<bool>>) {
        let mut ctx = Context::default();
        let mut ctx = ctx.into_partial_ref_mut();

        set_var_count(ctx.borrow(), formula.var_count());

        for clause in formula.iter() {
            load_clause(ctx.borrow(), clause);
        }

        while *ctx.part(SearchStateP) == SearchState::Unknown {
            conflict_step(ctx.borrow());
        }

        (
            *ctx.part(SearchStateP),
            ctx.part(AssignmentP).assignment().to_vec(),
        )
    }

    #[test]
    fn level_0_unsat() {
        let formula = cnf_formula![
            1, 2, 3;
            -1;
            1, -2;
            2, -3;
        ];

        assert_eq!(solve(&formula).0, SearchState::Unsat);
    }

    proptest! {
        #[test]
        fn sgen_unsat(formula in sgen_unsat_formula(1..7usize)) {
            prop_assert_eq!(solve(&formula).0, SearchState::Unsat);
        }

        #[test]
        fn sat(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let (state, assignment) = solve(&formula);
            prop_assert_eq!(state, SearchState::Sat);

            for clause in formula.iter() {
                prop_assert!(clause
                    .iter()
                    .any(|&lit| assignment[lit.index()] == Some(lit.is_positive())));
            }
        }
    }
}
