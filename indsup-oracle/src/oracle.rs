//! The oracle interface used by the minimizer.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use partial_ref::{IntoPartialRef, IntoPartialRefMut, PartialRef};
use thiserror::Error;

use indsup_formula::{ExtendFormula, Formula, Lit, Var, XorClause};

use crate::assumptions::set_assumptions;
use crate::config::{OracleConfig, OracleConfigUpdate};
use crate::context::{ensure_var_count, parts::*, Context};
use crate::encode::{encode_card, encode_xor};
use crate::load::load_clause;
use crate::probe::{probe_all, propagate_level_0, ProbeReport};
use crate::prop::full_restart;
use crate::schedule::schedule_step;
use crate::state::SearchState;
use crate::structure::{self, AndGate};

/// Limit on the search effort of a single query.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Budget {
    /// Maximal number of conflicts, unlimited if `None`.
    pub conflicts: Option<u64>,
}

impl Budget {
    pub fn unlimited() -> Budget {
        Budget { conflicts: None }
    }

    pub fn conflicts(limit: u64) -> Budget {
        Budget {
            conflicts: Some(limit),
        }
    }
}

/// Result of a query.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A model satisfying the formula and the assumptions was found.
    Sat,
    /// The formula is unsatisfiable under the assumptions.
    Unsat,
    /// The budget was exhausted or the search was interrupted.
    Unknown,
}

/// Errors of the structural queries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum OracleError {
    #[error("the formula is unsatisfiable")]
    Unsat,
}

/// Search statistics, accumulated over all queries.
#[derive(Copy, Clone, Debug, Default)]
pub struct OracleStats {
    pub solves: u64,
    pub conflicts: u64,
    pub restarts: u64,
    /// Irredundant clauses, including those added by encodings.
    pub clauses: usize,
    /// Learned long clauses currently kept.
    pub learned: usize,
}

/// Incremental satisfiability oracle.
///
/// Clauses can only be added. Queries take assumptions and a conflict budget. Cloning an oracle
/// copies the complete state including learned clauses.
#[derive(Clone)]
pub struct Oracle {
    ctx: Box<Context>,
    frozen: Vec<bool>,
    interrupt: Option<Arc<AtomicBool>>,
    config: OracleConfig,
    solves: u64,
}

impl Default for Oracle {
    fn default() -> Oracle {
        Oracle::new(OracleConfig::default())
    }
}

impl Oracle {
    pub fn new(config: OracleConfig) -> Oracle {
        let mut oracle = Oracle {
            ctx: Box::new(Context::default()),
            frozen: vec![],
            interrupt: None,
            config: OracleConfig::default(),
            solves: 0,
        };
        oracle.set_config(config);
        oracle
    }

    /// Change the configuration.
    pub fn configure(&mut self, update: &OracleConfigUpdate) {
        let mut config = self.config.clone();
        update.apply(&mut config);
        self.set_config(config);
    }

    fn set_config(&mut self, config: OracleConfig) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ctx.part_mut(VsidsP).set_decay(config.vsids_decay);
        ctx.part_mut(ClauseActivityP)
            .set_decay(config.clause_activity_decay);
        ctx.part_mut(ScheduleP)
            .configure(config.luby_restart_interval_scale, config.reduce_interval);
        self.config = config;
    }

    /// Use a flag to interrupt running queries.
    ///
    /// A query returns [`SolveOutcome::Unknown`] soon after the flag is set.
    pub fn set_interrupt(&mut self, interrupt: Arc<AtomicBool>) {
        self.interrupt = Some(interrupt);
    }

    pub fn var_count(&self) -> usize {
        let mut ctx = self.ctx.into_partial_ref();
        ctx.part(AssignmentP).var_count()
    }

    fn ensure_var_count(&mut self, count: usize) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        ensure_var_count(ctx.borrow(), count);
        if self.frozen.len() < count {
            self.frozen.resize(count, false);
        }
    }

    /// Whether the added clauses are unsatisfiable.
    pub fn is_unsat(&self) -> bool {
        let mut ctx = self.ctx.into_partial_ref();
        *ctx.part(SearchStateP) == SearchState::Unsat
    }

    /// Add a clause.
    ///
    /// The new clause is propagated at level 0. Returns `false` if the formula is unsatisfiable
    /// afterwards, either because of an empty clause or because of a level 0 conflict.
    pub fn add_clause(&mut self, lits: &[Lit]) -> bool {
        let count = lits.iter().map(|lit| lit.index() + 1).max().unwrap_or(0);
        self.ensure_var_count(count);
        let mut ctx = self.ctx.into_partial_ref_mut();
        load_clause(ctx.borrow(), lits);
        *ctx.part(SearchStateP) != SearchState::Unsat && propagate_level_0(ctx.borrow())
    }

    /// Add the constraint that the XOR of `vars` equals `rhs`.
    pub fn add_xor_clause(&mut self, vars: &[Var], rhs: bool) -> bool {
        let count = vars.iter().map(|var| var.index() + 1).max().unwrap_or(0);
        self.ensure_var_count(count);
        encode_xor(self, vars, rhs);
        !self.is_unsat()
    }

    /// Add the constraint that at least `cutoff` of `lits` are true.
    ///
    /// With an `output` literal, the output is constrained to be equivalent to the condition
    /// instead.
    pub fn add_card_clause(&mut self, lits: &[Lit], cutoff: usize, output: Option<Lit>) -> bool {
        let count = lits
            .iter()
            .chain(output.iter())
            .map(|lit| lit.index() + 1)
            .max()
            .unwrap_or(0);
        self.ensure_var_count(count);
        encode_card(self, lits, cutoff, output);
        !self.is_unsat()
    }

    /// Add all constraints of a formula.
    ///
    /// The sampling set of the formula is ignored.
    pub fn add_formula(&mut self, formula: &Formula) -> bool {
        self.ensure_var_count(formula.var_count());
        for clause in formula.cnf.iter() {
            self.add_clause(clause);
        }
        for xor in formula.xors.iter() {
            self.add_xor_clause(&xor.vars, xor.rhs);
        }
        for card in formula.cards.iter() {
            self.add_card_clause(&card.lits, card.cutoff, card.output);
        }
        !self.is_unsat()
    }

    /// Search for a model satisfying all assumptions.
    pub fn solve(&mut self, assumptions: &[Lit], budget: Budget) -> SolveOutcome {
        self.solves += 1;

        let count = assumptions
            .iter()
            .map(|lit| lit.index() + 1)
            .max()
            .unwrap_or(0);
        self.ensure_var_count(count);

        let interval = self.config.interrupt_check_interval.max(1);
        let interrupt = self.interrupt.clone();

        let mut ctx = self.ctx.into_partial_ref_mut();
        set_assumptions(ctx.borrow(), assumptions);

        let start = ctx.part(ScheduleP).conflicts;

        while *ctx.part(SearchStateP) == SearchState::Unknown {
            let conflicts = ctx.part(ScheduleP).conflicts - start;
            if let Some(limit) = budget.conflicts {
                if conflicts >= limit {
                    log::trace!("query budget of {} conflicts exhausted", limit);
                    return SolveOutcome::Unknown;
                }
            }
            if conflicts % interval == 0 {
                if let Some(flag) = &interrupt {
                    if flag.load(Ordering::Relaxed) {
                        return SolveOutcome::Unknown;
                    }
                }
            }
            schedule_step(ctx.borrow());
        }

        match *ctx.part(SearchStateP) {
            SearchState::Sat => SolveOutcome::Sat,
            SearchState::Unsat | SearchState::FailedAssumptions => SolveOutcome::Unsat,
            SearchState::Unknown => SolveOutcome::Unknown,
        }
    }

    /// Model found by the last query, if it was satisfiable.
    pub fn model(&self) -> Option<Vec<Lit>> {
        let mut ctx = self.ctx.into_partial_ref();
        if *ctx.part(SearchStateP) != SearchState::Sat {
            return None;
        }
        Some(
            ctx.part(AssignmentP)
                .assignment()
                .iter()
                .enumerate()
                .flat_map(|(index, value)| value.map(|polarity| Lit::from_index(index, polarity)))
                .collect(),
        )
    }

    /// Value of a literal in the model found by the last query.
    pub fn value(&self, lit: Lit) -> Option<bool> {
        let mut ctx = self.ctx.into_partial_ref();
        if *ctx.part(SearchStateP) != SearchState::Sat || lit.index() >= self.var_count() {
            return None;
        }
        ctx.part(AssignmentP).lit_value(lit)
    }

    /// Undo the last search, keeping level 0.
    fn reset_search(&mut self) {
        let mut ctx = self.ctx.into_partial_ref_mut();
        full_restart(ctx.borrow());
        ctx.part_mut(AssumptionsP).full_restart();
        ctx.part_mut(SearchStateP).invalidate();
    }

    /// Occurrences of each literal in the irredundant clauses, indexed by literal code.
    pub fn lit_incidence(&self) -> Vec<u32> {
        let mut ctx = self.ctx.into_partial_ref();
        structure::lit_incidence(&ctx.borrow(), self.var_count())
    }

    /// All clauses added to the oracle or produced by encodings, in their loaded form.
    pub fn irred_clauses(&self) -> Vec<Vec<Lit>> {
        let mut ctx = self.ctx.into_partial_ref();
        let mut clauses = vec![];
        structure::for_each_irred_clause(&ctx.borrow(), |clause| clauses.push(clause.to_vec()));
        clauses
    }

    /// Literals assigned at level 0 after propagation.
    pub fn zero_assigned(&mut self) -> Result<Vec<Lit>, OracleError> {
        self.reset_search();
        let mut ctx = self.ctx.into_partial_ref_mut();
        if *ctx.part(SearchStateP) == SearchState::Unsat || !propagate_level_0(ctx.borrow())
        {
            return Err(OracleError::Unsat);
        }
        Ok(ctx.part(TrailP).level_0().to_vec())
    }

    /// Failed literal probing on all unassigned variables.
    ///
    /// Literals found to be true become level 0 assignments.
    pub fn probe(&mut self) -> Result<ProbeReport, OracleError> {
        self.reset_search();
        let mut ctx = self.ctx.into_partial_ref_mut();
        probe_all(ctx.borrow()).ok_or(OracleError::Unsat)
    }

    /// Equivalent literals found in the binary implication graph.
    pub fn binary_equivalences(&self) -> Result<Vec<(Lit, Lit)>, OracleError> {
        let mut ctx = self.ctx.into_partial_ref();
        structure::binary_equivalences(&ctx.borrow(), self.var_count()).ok_or(OracleError::Unsat)
    }

    /// Gate definitions found in the irredundant clauses.
    pub fn and_gates(&self) -> Vec<AndGate> {
        let mut ctx = self.ctx.into_partial_ref();
        structure::and_gates(&ctx.borrow())
    }

    /// XOR constraints encoded by the irredundant clauses.
    pub fn xor_constraints(&self) -> Vec<XorClause> {
        let mut ctx = self.ctx.into_partial_ref();
        structure::xor_constraints(&ctx.borrow())
    }

    /// Mark variables as not to be eliminated.
    ///
    /// The oracle performs no variable elimination, so this only records the variables, but
    /// callers must freeze every variable whose value they inspect.
    pub fn freeze(&mut self, lits: &[Lit]) {
        for &lit in lits {
            if lit.index() >= self.frozen.len() {
                self.frozen.resize(lit.index() + 1, false);
            }
            self.frozen[lit.index()] = true;
        }
    }

    pub fn is_frozen(&self, var: Var) -> bool {
        self.frozen.get(var.index()).cloned().unwrap_or(false)
    }

    pub fn stats(&self) -> OracleStats {
        let mut ctx = self.ctx.into_partial_ref();
        let schedule = ctx.part(ScheduleP);
        let db = ctx.part(ClauseDbP);
        OracleStats {
            solves: self.solves,
            conflicts: schedule.conflicts,
            restarts: schedule.restarts,
            clauses: db.units().len() + ctx.part(BinaryClausesP).irred().len() + db.irred_count(),
            learned: db.redundant_count(),
        }
    }
}

impl ExtendFormula for Oracle {
    fn add_clause(&mut self, clause: &[Lit]) {
        Oracle::add_clause(self, clause);
    }

    fn new_var(&mut self) -> Var {
        let var = Var::from_index(self.var_count());
        self.ensure_var_count(var.index() + 1);
        var
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    use indsup_formula::test::{sat_formula, sgen_unsat_formula};
    use indsup_formula::{CardConstraint, CnfFormula};

    fn with_cnf(formula: &CnfFormula) -> Oracle {
        let mut oracle = Oracle::default();
        oracle.add_formula(&Formula::from(formula.clone()));
        oracle
    }

    #[test]
    fn assumptions_are_temporary() {
        let mut oracle = with_cnf(&cnf_formula![
            1, 2;
            -1, 3;
        ]);

        assert_eq!(
            oracle.solve(&lits![-2, -3], Budget::unlimited()),
            SolveOutcome::Unsat
        );
        assert_eq!(
            oracle.solve(&lits![-2], Budget::unlimited()),
            SolveOutcome::Sat
        );
        assert_eq!(oracle.value(lit!(1)), Some(true));
        assert_eq!(oracle.value(lit!(3)), Some(true));
        assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Sat);
    }

    #[test]
    fn repeated_and_implied_assumptions() {
        let mut oracle = with_cnf(&cnf_formula![
            -1, 2;
        ]);

        assert_eq!(
            oracle.solve(&lits![1, 2, 1], Budget::unlimited()),
            SolveOutcome::Sat
        );
        assert_eq!(
            oracle.solve(&lits![1, -2], Budget::unlimited()),
            SolveOutcome::Unsat
        );
        assert!(!oracle.is_unsat());
    }

    #[test]
    fn interrupt_returns_unknown() {
        let mut oracle = with_cnf(&cnf_formula![1, 2;]);
        let flag = Arc::new(AtomicBool::new(true));
        oracle.set_interrupt(flag.clone());

        assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Unknown);

        flag.store(false, Ordering::Relaxed);
        assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Sat);
    }

    #[test]
    fn zero_assigned_and_probing() {
        let mut oracle = with_cnf(&cnf_formula![
            1;
            -1, 2;
            -3, 4;
            -3, -4;
            5, -6;
            -5, 6;
        ]);

        let zero = oracle.zero_assigned().unwrap();
        assert!(zero.contains(&lit!(1)));
        assert!(zero.contains(&lit!(2)));

        let report = oracle.probe().unwrap();
        assert!(report.failed.contains(&lit!(-3)));
        assert!(report.equivalences.contains(&(lit!(5), lit!(6))));
        assert!(report.propagations[4] > 0);

        assert!(oracle.zero_assigned().unwrap().contains(&lit!(-3)));
    }

    #[test]
    fn unsat_structure_queries() {
        let mut oracle = with_cnf(&cnf_formula![
            1;
            -1;
        ]);
        assert!(oracle.is_unsat());
        assert_eq!(oracle.zero_assigned(), Err(OracleError::Unsat));
        assert!(oracle.probe().is_err());
        assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Unsat);
    }

    #[test]
    fn xor_and_card_constraints() {
        let mut oracle = Oracle::default();
        let output = lit!(7);
        // The card constraint allocates the output first, so auxiliary variables come after it
        oracle.add_card_clause(&lits![1, 2, 3], 2, Some(output));
        oracle.add_xor_clause(&vars![1, 2, 3, 4, 5, 6], true);

        let mut formula = Formula::default();
        formula.add_xor_clause(XorClause::new(vars![1, 2, 3, 4, 5, 6].to_vec(), true));
        formula.add_card_constraint(CardConstraint {
            lits: lits![1, 2, 3].to_vec(),
            cutoff: 2,
            output: Some(output),
        });

        for bits in 0..(1 << 7) {
            let assumptions = (0..7)
                .map(|index| Lit::from_index(index, bits & (1 << index) != 0))
                .collect::<Vec<_>>();
            let assignment = assumptions
                .iter()
                .map(|lit| lit.is_positive())
                .collect::<Vec<_>>();
            let expected = if formula.is_satisfied(&assignment) {
                SolveOutcome::Sat
            } else {
                SolveOutcome::Unsat
            };
            assert_eq!(oracle.solve(&assumptions, Budget::unlimited()), expected);
        }
    }

    #[test]
    fn clone_is_independent() {
        let mut oracle = with_cnf(&cnf_formula![1, 2;]);
        let mut copy = oracle.clone();
        assert!(copy.add_clause(&lits![-1]));
        assert!(!copy.add_clause(&lits![-2]));

        assert!(copy.is_unsat());
        assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Sat);
    }

    #[test]
    fn add_clause_reports_level_0_conflicts() {
        let mut oracle = Oracle::default();
        assert!(oracle.add_clause(&lits![1, 2, 3]));
        assert!(oracle.add_clause(&lits![-1, 2]));
        assert!(oracle.add_clause(&lits![-2]));
        assert!(!oracle.add_clause(&lits![-3]));
        assert!(oracle.is_unsat());
        assert!(!oracle.add_clause(&lits![4]));

        let mut formula = Formula::default();
        formula.add_clause(&lits![1, 2]);
        formula.add_clause(&lits![-1]);
        formula.add_clause(&lits![-2]);
        assert!(!Oracle::default().add_formula(&formula));
    }

    proptest! {
        #[test]
        fn sgen_unsat(formula in sgen_unsat_formula(1..7usize)) {
            let mut oracle = with_cnf(&formula);
            prop_assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Unsat);
        }

        #[test]
        fn exhausted_budget(formula in sgen_unsat_formula(6..8usize)) {
            let mut oracle = with_cnf(&formula);
            prop_assert_eq!(oracle.solve(&[], Budget::conflicts(0)), SolveOutcome::Unknown);
            prop_assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Unsat);
        }

        #[test]
        fn sat(formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0)) {
            let mut oracle = with_cnf(&formula);

            prop_assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Sat);

            let model = oracle.model().unwrap();

            for clause in formula.iter() {
                prop_assert!(clause.iter().any(|lit| model.contains(lit)));
            }
        }

        #[test]
        fn sat_under_model_assumptions(
            formula in sat_formula(4..20usize, 10..100usize, 0.05..0.2, 0.9..1.0),
        ) {
            let mut oracle = with_cnf(&formula);

            prop_assert_eq!(oracle.solve(&[], Budget::unlimited()), SolveOutcome::Sat);
            let model = oracle.model().unwrap();

            let half = &model[..model.len() / 2];
            prop_assert_eq!(oracle.solve(half, Budget::unlimited()), SolveOutcome::Sat);

            let flipped = half.iter().map(|&lit| !lit).collect::<Vec<_>>();
            let outcome = oracle.solve(&flipped, Budget::unlimited());
            prop_assert!(outcome != SolveOutcome::Unknown);
        }
    }
}
