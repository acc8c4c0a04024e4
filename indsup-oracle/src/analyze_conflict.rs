//! Learns a new clause by analyzing a conflict.
use std::mem::swap;

use partial_ref::{partial, PartialRef};

use indsup_formula::{Lit, Var};

use crate::clause::ClauseRef;
use crate::context::{parts::*, Context};
use crate::prop::{Conflict, ImplGraph, Reason};
use crate::vsids::Vsids;

/// Temporaries for conflict analysis
#[derive(Default, Clone)]
pub struct AnalyzeConflict {
    /// This is the learned clause after analysis finishes.
    clause: Vec<Lit>,
    /// Number of literals in the current clause at the current level.
    current_level_count: usize,
    /// Variables in the current clause.
    var_flags: Vec<bool>,
    /// Entries to clean in `var_flags`.
    to_clean: Vec<Var>,
    /// Long clauses resolved on, including the conflict clause.
    involved: Vec<ClauseRef>,
}

impl AnalyzeConflict {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_flags.resize(count, false);
    }

    /// The learned clause.
    pub fn clause(&self) -> &[Lit] {
        &self.clause
    }

    /// Long clauses involved in the last analysis.
    pub fn involved(&self) -> &[ClauseRef] {
        &self.involved
    }
}

/// Learns a new clause by analyzing a conflict.
///
/// Variables of the resolved clauses are bumped. Returns the lowest decision level that makes the
/// learned clause asserting.
pub fn analyze_conflict(
    mut ctx: partial!(
        Context,
        mut AnalyzeConflictP,
        mut VsidsP,
        ClauseDbP,
        ImplGraphP,
        TrailP,
    ),
    conflict: Conflict,
) -> usize {
    let (analyze, mut ctx) = ctx.split_part_mut(AnalyzeConflictP);
    let (vsids, ctx) = ctx.split_part_mut(VsidsP);
    let clause_db = ctx.part(ClauseDbP);
    let impl_graph = ctx.part(ImplGraphP);
    let trail = ctx.part(TrailP);

    analyze.clause.clear();
    analyze.involved.clear();
    analyze.current_level_count = 0;

    let current_level = trail.current_level();

    if current_level == 0 {
        // Conflict with no decisions, generate empty clause
        return 0;
    }

    if let Conflict::Long(cref) = conflict {
        analyze.involved.push(cref);
    }

    for &lit in conflict.lits(clause_db) {
        analyze.add_literal(vsids, impl_graph, current_level, lit);
    }

    // Resolve away all but one literal of the current level, in reverse chronological order.
    for &lit in trail.trail().iter().rev() {
        let lit_present = &mut analyze.var_flags[lit.index()];
        if *lit_present {
            *lit_present = false;
            analyze.current_level_count -= 1;
            if analyze.current_level_count == 0 {
                // The learned clause asserts !lit, which goes to position 0
                analyze.clause.push(!lit);
                let end = analyze.clause.len() - 1;
                analyze.clause.swap(0, end);

                break;
            } else {
                let reason = impl_graph.reason(lit.var());

                if let Reason::Long(cref) = *reason {
                    analyze.involved.push(cref);
                }

                for &lit in reason.lits(clause_db) {
                    analyze.add_literal(vsids, impl_graph, current_level, lit);
                }
            }
        }
    }

    for var in analyze.to_clean.drain(..) {
        analyze.var_flags[var.index()] = false;
    }

    // The highest level literal besides the asserted one goes to position 1, so that the watches
    // stay valid after backtracking.
    let mut backtrack_to = 0;

    if analyze.clause.len() > 1 {
        let (prefix, rest) = analyze.clause.split_at_mut(2);
        let lit_1 = &mut prefix[1];
        backtrack_to = impl_graph.level(lit_1.var());
        for lit in rest.iter_mut() {
            let lit_level = impl_graph.level(lit.var());
            if lit_level > backtrack_to {
                backtrack_to = lit_level;
                swap(lit_1, lit);
            }
        }
    }

    vsids.decay();

    backtrack_to
}

impl AnalyzeConflict {
    /// Add a literal to the current clause.
    fn add_literal(
        &mut self,
        vsids: &mut Vsids,
        impl_graph: &ImplGraph,
        current_level: usize,
        lit: Lit,
    ) {
        let lit_level = impl_graph.level(lit.var());
        // Level 0 literals and literals already present are skipped
        if lit_level > 0 && !self.var_flags[lit.index()] {
            vsids.bump(lit.var());
            self.var_flags[lit.index()] = true;
            if lit_level == current_level {
                self.current_level_count += 1;
            } else {
                self.clause.push(lit);
                self.to_clean.push(lit.var());
            }
        }
    }
}
