//! Failed literal probing.
use partial_ref::{partial, PartialRef};

use indsup_formula::{Lit, Var};

use crate::context::{parts::*, Context};
use crate::prop::{backtrack, enqueue_assignment, full_restart, propagate, Reason};
use crate::state::SearchState;

/// Results of probing every unassigned variable in both polarities.
#[derive(Clone, Debug, Default)]
pub struct ProbeReport {
    /// Literals proven true, either because their negation failed or because both polarities of
    /// a variable implied them.
    pub failed: Vec<Lit>,
    /// Pairs of equivalent literals `(a, b)` with `a` positive.
    pub equivalences: Vec<(Lit, Lit)>,
    /// Number of literals implied when probing each variable, summed over both polarities.
    pub propagations: Vec<u32>,
}

/// Outcome of probing a single literal.
enum Probe {
    Failed,
    Implied(Vec<Lit>),
}

/// Probe every variable unassigned at level 0.
///
/// Literals found to be true are kept as level 0 assignments. Returns `None` if probing shows the
/// formula to be unsatisfiable.
pub fn probe_all(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut AssumptionsP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SearchStateP,
        mut TmpDataP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
) -> Option<ProbeReport> {
    full_restart(ctx.borrow());
    ctx.part_mut(AssumptionsP).full_restart();

    if *ctx.part(SearchStateP) == SearchState::Unsat || !propagate_level_0(ctx.borrow()) {
        return None;
    }

    let var_count = ctx.part(AssignmentP).var_count();
    let mut report = ProbeReport {
        propagations: vec![0; var_count],
        ..ProbeReport::default()
    };

    for index in 0..var_count {
        let var = Var::from_index(index);
        let mut implied = [vec![], vec![]];

        for (slot, &polarity) in [true, false].iter().enumerate() {
            let lit = var.lit(polarity);
            if ctx.part(AssignmentP).var_value(var).is_some() {
                break;
            }
            match probe_lit(ctx.borrow(), lit) {
                Probe::Failed => {
                    report.failed.push(!lit);
                    if !assert_level_0(ctx.borrow(), !lit) {
                        return None;
                    }
                }
                Probe::Implied(lits) => {
                    report.propagations[index] += lits.len() as u32;
                    implied[slot] = lits;
                }
            }
        }

        if ctx.part(AssignmentP).var_value(var).is_some() {
            continue;
        }

        let [positive, negative] = implied;

        let flags = &mut ctx.part_mut(TmpDataP).flags;
        for &lit in negative.iter() {
            flags[lit.code()] = true;
        }
        let mut forced = vec![];
        for &lit in positive.iter() {
            if flags[lit.code()] {
                forced.push(lit);
            } else if flags[(!lit).code()] {
                report.equivalences.push((var.positive(), lit));
            }
        }
        for &lit in negative.iter() {
            flags[lit.code()] = false;
        }

        for lit in forced {
            if ctx.part(AssignmentP).lit_is_true(lit) {
                continue;
            }
            report.failed.push(lit);
            if !assert_level_0(ctx.borrow(), lit) {
                return None;
            }
        }
    }

    log::trace!(
        "probing: {} failed, {} equivalences",
        report.failed.len(),
        report.equivalences.len()
    );

    Some(report)
}

/// Assign a literal on a new decision level and collect its consequences.
fn probe_lit(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut TrailP,
        mut VsidsP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
    lit: Lit,
) -> Probe {
    ctx.part_mut(TrailP).new_decision_level();
    let start = ctx.part(TrailP).trail().len();
    enqueue_assignment(ctx.borrow(), lit, Reason::Unit);

    let result = match propagate(ctx.borrow()) {
        Err(_) => Probe::Failed,
        Ok(()) => Probe::Implied(ctx.part(TrailP).trail()[start + 1..].to_vec()),
    };

    backtrack(ctx.borrow(), 0);
    result
}

/// Add a literal as level 0 assignment and propagate it.
fn assert_level_0(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SearchStateP,
        mut TrailP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
    lit: Lit,
) -> bool {
    if ctx.part(AssignmentP).lit_is_false(lit) {
        *ctx.part_mut(SearchStateP) = SearchState::Unsat;
        return false;
    }
    if ctx.part(AssignmentP).lit_is_unk(lit) {
        enqueue_assignment(ctx.borrow(), lit, Reason::Unit);
    }
    propagate_level_0(ctx.borrow())
}

/// Propagate at level 0, marking the formula unsatisfiable on conflict.
pub fn propagate_level_0(
    mut ctx: partial!(
        Context,
        mut AssignmentP,
        mut ClauseDbP,
        mut ImplGraphP,
        mut SearchStateP,
        mut TrailP,
        mut WatchlistsP,
        BinaryClausesP,
    ),
) -> bool {
    if propagate(ctx.borrow()).is_err() {
        *ctx.part_mut(SearchStateP) = SearchState::Unsat;
        false
    } else {
        true
    }
}
