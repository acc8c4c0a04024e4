//! Independent support minimizer.
use std::io;
use std::mem;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::{Duration, Instant};

use log::info;
use thiserror::Error;

use indsup_dimacs::DimacsParser;
use indsup_formula::{ExtendFormula, Formula, Lit, Var};
use indsup_oracle::{Budget, Oracle, OracleConfigUpdate, ProbeReport, SolveOutcome};

use crate::backward::backward_round;
use crate::community::Communities;
use crate::config::{MinimizerConfig, MinimizerConfigUpdate, Ordering};
use crate::encode::duplicate;
use crate::group::Groups;
use crate::forward::forward_round;
use crate::guess::guess_round;
use crate::incidence::{occurs, Incidence};
use crate::order::{sort_vars, Ranking};
use crate::prefilter::prefilter;
use crate::state::{EngineState, RemovedBy};
use crate::verify::{verify_final, Verification};

/// Errors of the minimizer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("the formula is unsatisfiable")]
    Unsat,
    #[error("sampling variable {var} is out of range, the formula has {var_count} variables")]
    VarOutOfRange { var: Var, var_count: usize },
    #[error("variable {var} is a member of more than one group")]
    OverlappingGroups { var: Var },
}

/// Summary of a minimization run.
#[derive(Clone, Debug, Default)]
pub struct Report {
    /// Size of the starting sampling set. With variable groups, groups are counted.
    pub orig_size: usize,
    /// Size of the computed independent support. With variable groups, groups are counted.
    pub final_size: usize,
    /// Number of variables removed by each stage.
    pub removed_by: RemovedBy,
    pub elapsed: Duration,
    /// Whether the run was interrupted, in which case the result may not be minimal.
    pub interrupted: bool,
    /// Whether the formula is unsatisfiable. The independent support is empty then.
    pub unsat: bool,
    /// Result of the final check, if it ran.
    pub verification: Option<Verification>,
}

impl Report {
    /// Percentage of the starting sampling set that was removed.
    pub fn reduction(&self) -> f64 {
        if self.orig_size == 0 {
            0.0
        } else {
            100.0 * (self.orig_size - self.final_size) as f64 / self.orig_size as f64
        }
    }
}

/// Computes a small independent support of a formula.
///
/// Constraints and the starting sampling set are added first, then [`run`](Minimizer::run)
/// performs the minimization. A minimizer can only run once.
pub struct Minimizer {
    config: MinimizerConfig,
    oracle: Oracle,
    sampling_set: Option<Vec<Var>>,
    groups: Groups,
    interrupt: Arc<AtomicBool>,
    indep_set: Vec<Var>,
    indep_groups: Vec<Var>,
    orig_sampling_size: usize,
    empty_occ_vars: Vec<Var>,
    finished: bool,
}

impl Default for Minimizer {
    fn default() -> Minimizer {
        Minimizer::new(MinimizerConfig::default())
    }
}

impl Minimizer {
    pub fn new(config: MinimizerConfig) -> Minimizer {
        let interrupt = Arc::new(AtomicBool::new(false));
        let mut oracle = Oracle::default();
        oracle.set_interrupt(interrupt.clone());
        Minimizer {
            config,
            oracle,
            sampling_set: None,
            groups: Groups::default(),
            interrupt,
            indep_set: vec![],
            indep_groups: vec![],
            orig_sampling_size: 0,
            empty_occ_vars: vec![],
            finished: false,
        }
    }

    /// Change the minimizer configuration.
    pub fn configure(&mut self, update: &MinimizerConfigUpdate) {
        update.apply(&mut self.config);
    }

    /// Change the configuration of the oracle.
    pub fn configure_oracle(&mut self, update: &OracleConfigUpdate) {
        self.oracle.configure(update);
    }

    pub fn config(&self) -> &MinimizerConfig {
        &self.config
    }

    /// Use a flag to interrupt the minimization.
    ///
    /// When the flag is set, the running round stops after the current query and the best set
    /// found so far is reported.
    pub fn set_interrupt(&mut self, interrupt: Arc<AtomicBool>) {
        self.oracle.set_interrupt(interrupt.clone());
        self.interrupt = interrupt;
    }

    /// The flag used to interrupt the minimization.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        self.interrupt.clone()
    }

    pub fn var_count(&self) -> usize {
        self.oracle.var_count()
    }

    /// Add all constraints of a formula.
    ///
    /// The sampling set of the formula, if present, is added to the starting sampling set. It is
    /// checked by [`run`](Minimizer::run).
    pub fn add_formula(&mut self, formula: &Formula) {
        self.oracle.add_formula(formula);
        if let Some(sampling_set) = &formula.sampling_set {
            self.sampling_set
                .get_or_insert_with(Vec::new)
                .extend(sampling_set.iter().cloned());
        }
    }

    /// Reads and adds a formula in DIMACS CNF format.
    pub fn add_dimacs_cnf(&mut self, input: impl io::Read) -> Result<(), anyhow::Error> {
        let formula = DimacsParser::parse(input)?;
        info!(
            "Parsed formula with {} variables and {} clauses",
            formula.var_count(),
            formula.cnf.len() + formula.xors.len()
        );
        self.add_formula(&formula);
        Ok(())
    }

    pub fn add_clause(&mut self, lits: &[Lit]) {
        self.oracle.add_clause(lits);
    }

    /// Add the constraint that the XOR of `vars` equals `rhs`.
    pub fn add_xor_clause(&mut self, vars: &[Var], rhs: bool) {
        self.oracle.add_xor_clause(vars, rhs);
    }

    /// Add the constraint that at least `cutoff` of `lits` are true.
    ///
    /// With an `output` literal, `output` is constrained to be true exactly when the threshold is
    /// met instead.
    pub fn add_card_clause(&mut self, lits: &[Lit], cutoff: usize, output: Option<Lit>) {
        self.oracle.add_card_clause(lits, cutoff, output);
    }

    /// Set the sampling set to start from.
    ///
    /// Duplicates are ignored. Returns the size of the sampling set.
    pub fn set_starting_sampling_set(&mut self, vars: Vec<Var>) -> Result<usize, EngineError> {
        let var_count = self.var_count();
        let mut seen = vec![false; var_count];
        let mut sampling_set = Vec::with_capacity(vars.len());
        for var in vars {
            if var.index() >= var_count {
                return Err(EngineError::VarOutOfRange { var, var_count });
            }
            if !mem::replace(&mut seen[var.index()], true) {
                sampling_set.push(var);
            }
        }
        let len = sampling_set.len();
        self.sampling_set = Some(sampling_set);
        Ok(len)
    }

    /// Start from all variables that are not constant at decision level 0.
    ///
    /// Returns the size of the sampling set.
    pub fn start_with_clean_sampling_set(&mut self) -> usize {
        let var_count = self.var_count();
        let mut constant = vec![false; var_count];
        if let Ok(units) = self.oracle.zero_assigned() {
            for lit in units {
                constant[lit.index()] = true;
            }
        }
        let sampling_set: Vec<Var> = (0..var_count)
            .filter(|&index| !constant[index])
            .map(Var::from_index)
            .collect();
        let len = sampling_set.len();
        self.sampling_set = Some(sampling_set);
        len
    }

    /// Minimize over groups of variables instead of single variables.
    ///
    /// A group stays in the independent support or is removed as a whole, so the result is a set
    /// of groups whose members together determine the members of all other groups. The starting
    /// sampling set becomes the set of all groups. Sampling variables added later that are not
    /// in any group form singleton groups. Returns the number of groups.
    pub fn set_variable_groups(&mut self, groups: Vec<Vec<Var>>) -> Result<usize, EngineError> {
        let var_count = self.var_count();
        for &var in groups.iter().flatten() {
            if var.index() >= var_count {
                return Err(EngineError::VarOutOfRange { var, var_count });
            }
        }
        self.groups = Groups::new(groups).map_err(|var| EngineError::OverlappingGroups { var })?;
        self.sampling_set = Some(self.groups.representatives().to_vec());
        Ok(self.groups.representatives().len())
    }

    /// The computed independent support.
    ///
    /// With variable groups, this contains all members of the kept groups.
    pub fn indep_set(&self) -> &[Var] {
        &self.indep_set
    }

    /// Kept groups, each given by its first member.
    pub fn indep_groups(&self) -> &[Var] {
        &self.indep_groups
    }

    /// Size of the sampling set the minimization started from.
    pub fn orig_sampling_size(&self) -> usize {
        self.orig_sampling_size
    }

    /// Sampling variables that occur in no constraint.
    pub fn empty_occ_vars(&self) -> &[Var] {
        &self.empty_occ_vars
    }

    /// Minimize the sampling set.
    ///
    /// Without a starting sampling set, all variables not constant at level 0 are used. An
    /// unsatisfiable formula is not an error, it is reported with an empty independent support.
    pub fn run(&mut self) -> Result<Report, EngineError> {
        assert!(!self.finished, "a minimizer can only run once");
        let start = Instant::now();

        let sampling_set = match self.sampling_set.take() {
            Some(vars) if !self.groups.is_empty() => {
                let representatives: Vec<Var> = vars
                    .into_iter()
                    .map(|var| self.groups.representative(var))
                    .collect();
                self.set_starting_sampling_set(representatives)?;
                self.sampling_set.clone().unwrap_or_default()
            }
            Some(vars) => {
                self.set_starting_sampling_set(vars)?;
                self.sampling_set.clone().unwrap_or_default()
            }
            None => {
                self.start_with_clean_sampling_set();
                self.sampling_set.clone().unwrap_or_default()
            }
        };
        self.finished = true;
        self.orig_sampling_size = sampling_set.len();
        info!("Minimizing a sampling set of {} variables", sampling_set.len());

        let oracle = mem::take(&mut self.oracle);
        let mut state = EngineState::new(
            self.config.clone(),
            oracle,
            sampling_set.clone(),
            self.interrupt.clone(),
        );
        state.groups = self.groups.clone();

        let result = self.minimize(&mut state, &sampling_set);

        let mut report = Report {
            orig_size: sampling_set.len(),
            removed_by: state.removed_by,
            interrupted: state.stopped_early(),
            ..Report::default()
        };

        match result {
            Ok(verification) => {
                report.verification = verification;
                self.indep_set = state.groups.expand(state.support());
                self.indep_groups = state.into_support();
            }
            Err(EngineError::Unsat) => {
                info!("The formula is unsatisfiable");
                report.unsat = true;
                self.indep_set = vec![];
                self.indep_groups = vec![];
            }
            Err(err) => return Err(err),
        }

        report.final_size = self.indep_groups.len();
        report.elapsed = start.elapsed();

        info!(
            "Independent support of {} variables, {} removed ({:.1}%) in {:.2}s",
            report.final_size,
            report.orig_size - report.final_size,
            report.reduction(),
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    fn minimize(
        &mut self,
        state: &mut EngineState,
        sampling_set: &[Var],
    ) -> Result<Option<Verification>, EngineError> {
        state.check_unsat()?;
        let probe = self.analyze(state)?;

        prefilter(state, probe.as_ref())?;

        // Queries can not tell global unsatisfiability from failed assumptions
        if state.oracle.solve(&[], Budget::unlimited()) == SolveOutcome::Unsat {
            return Err(EngineError::Unsat);
        }

        state.duplication = Some(duplicate(&mut state.oracle)?);

        if state.config.guess {
            guess_round(state)?;
        }
        if state.config.forward {
            forward_round(state)?;
        }
        if state.config.backward {
            backward_round(state)?;
        }

        if state.config.verify_final && !state.stopped_early() {
            let (verification, readded) = verify_final(state, sampling_set)?;
            if readded > 0 {
                log::error!("{} variables were added back by the final check", readded);
            }
            return Ok(Some(verification));
        }

        Ok(None)
    }

    /// Collect the ordering statistics and order the sampling set.
    fn analyze(&mut self, state: &mut EngineState) -> Result<Option<ProbeReport>, EngineError> {
        let config = state.config.clone();
        let lit_incidence = state.oracle.lit_incidence();
        let mut incidence = Incidence::from_lit_incidence(&lit_incidence, config.incidence_mode);

        let probe_ordering = match config.ordering {
            Ordering::IncidenceThenProbing | Ordering::Probing | Ordering::CrossCommunity => true,
            _ => false,
        };
        let probe = if config.probe_based || probe_ordering {
            let report = state.oracle.probe().map_err(|_| EngineError::Unsat)?;
            info!(
                "Probing found {} failed literals and {} equivalences",
                report.failed.len(),
                report.equivalences.len()
            );
            incidence.by_probing = report.propagations.clone();
            Some(report)
        } else {
            None
        };

        let community_ordering = match config.ordering {
            Ordering::Community | Ordering::CrossCommunity => true,
            _ => false,
        };
        let communities = if config.communities && community_ordering {
            let clauses = state.oracle.irred_clauses();
            let mut communities = Communities::from_clauses(
                state.oracle.var_count(),
                clauses.iter().map(|clause| &clause[..]),
            );
            communities.compute();
            info!("Found {} communities", communities.cluster_count());
            Some(communities)
        } else {
            None
        };

        let mut order = state.support().to_vec();
        sort_vars(
            &mut order,
            config.ordering,
            &incidence,
            communities.as_ref(),
            &mut state.rng,
        );
        state.ranking = Ranking::new(&order);
        state.set_support(order);

        self.empty_occ_vars.clear();
        if config.empty_occs_based {
            for &var in state.support() {
                // A group with a free member is never determined
                if state
                    .groups
                    .members(&var)
                    .iter()
                    .any(|&member| !occurs(&lit_incidence, member))
                {
                    self.empty_occ_vars.push(var);
                }
            }
            for &var in self.empty_occ_vars.iter() {
                state.keep(var);
            }
            if !self.empty_occ_vars.is_empty() {
                info!(
                    "{} sampling variables occur in no constraint",
                    self.empty_occ_vars.len()
                );
            }
        }

        Ok(probe)
    }
}

impl ExtendFormula for Minimizer {
    fn add_clause(&mut self, clause: &[Lit]) {
        Minimizer::add_clause(self, clause);
    }

    fn new_var(&mut self) -> Var {
        self.oracle.new_var()
    }
}
