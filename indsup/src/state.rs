//! State shared by all minimization stages.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rand::{rngs::StdRng, SeedableRng};
use rustc_hash::FxHashSet;

use indsup_formula::Var;
use indsup_oracle::{Budget, Oracle};

use crate::config::MinimizerConfig;
use crate::encode::{link, Duplication, Linking};
use crate::group::Groups;
use crate::order::Ranking;
use crate::query::{self, Determination};
use crate::EngineError;

/// Per-stage removal counts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RemovedBy {
    pub zero_assigned: usize,
    pub probing: usize,
    pub binary_eq: usize,
    pub gates: usize,
    pub xors: usize,
    pub backbone: usize,
    pub guess: usize,
    pub forward: usize,
    pub backward: usize,
}

impl RemovedBy {
    pub fn total(&self) -> usize {
        self.zero_assigned
            + self.probing
            + self.binary_eq
            + self.gates
            + self.xors
            + self.backbone
            + self.guess
            + self.forward
            + self.backward
    }
}

/// Mutable state of a minimization run.
pub struct EngineState {
    pub config: MinimizerConfig,
    pub oracle: Oracle,
    pub rng: StdRng,
    pub ranking: Ranking,
    pub duplication: Option<Duplication>,
    pub removed_by: RemovedBy,
    /// Groups represented by support variables.
    pub groups: Groups,
    support: Vec<Var>,
    kept: Vec<bool>,
    generation: u64,
    linking: Option<(u64, Linking)>,
    interrupt: Arc<AtomicBool>,
    queries: u64,
    stopped: bool,
}

impl EngineState {
    pub fn new(
        config: MinimizerConfig,
        oracle: Oracle,
        support: Vec<Var>,
        interrupt: Arc<AtomicBool>,
    ) -> EngineState {
        let rng = StdRng::seed_from_u64(config.seed);
        EngineState {
            config,
            oracle,
            rng,
            ranking: Ranking::default(),
            duplication: None,
            removed_by: RemovedBy::default(),
            groups: Groups::default(),
            support,
            kept: vec![],
            generation: 0,
            linking: None,
            interrupt,
            queries: 0,
            stopped: false,
        }
    }

    /// The current support set.
    pub fn support(&self) -> &[Var] {
        &self.support
    }

    pub fn into_support(self) -> Vec<Var> {
        self.support
    }

    /// Replace the support set.
    pub fn set_support(&mut self, support: Vec<Var>) {
        self.support = support;
        self.generation += 1;
    }

    /// Remove variables from the support set.
    pub fn remove_vars(&mut self, vars: &[Var]) {
        if vars.is_empty() {
            return;
        }
        let removed: FxHashSet<Var> = vars.iter().cloned().collect();
        let support = self
            .support
            .iter()
            .cloned()
            .filter(|var| !removed.contains(var))
            .collect();
        self.set_support(support);
    }

    /// Add variables to the support set, keeping the ranking order.
    pub fn add_vars(&mut self, vars: &[Var]) {
        let mut support = self.support.clone();
        support.extend(vars.iter().filter(|var| !self.support.contains(var)));
        self.ranking.sort(&mut support);
        self.set_support(support);
    }

    /// Whether a variable was proven necessary or is exempt from queries.
    pub fn is_kept(&self, var: Var) -> bool {
        self.kept.get(var.index()).cloned().unwrap_or(false)
    }

    pub fn keep(&mut self, var: Var) {
        if var.index() >= self.kept.len() {
            self.kept.resize(var.index() + 1, false);
        }
        self.kept[var.index()] = true;
    }

    /// Support variables that are not kept, in ranking order.
    pub fn candidates(&self) -> Vec<Var> {
        let mut candidates: Vec<Var> = self
            .support
            .iter()
            .cloned()
            .filter(|&var| !self.is_kept(var))
            .collect();
        self.ranking.sort(&mut candidates);
        candidates
    }

    /// Offset between variables and their copies.
    ///
    /// Panics if the formula was not duplicated yet.
    pub fn offset(&self) -> usize {
        match self.duplication {
            Some(duplication) => duplication.offset,
            None => panic!("formula was not duplicated"),
        }
    }

    /// Indicators for the current support set.
    ///
    /// Fresh indicators are created if the support set changed since the last call. Queries can
    /// use any subset of the support set the linking was created for.
    pub fn relink(&mut self) -> Result<Linking, EngineError> {
        if let Some((generation, linking)) = &self.linking {
            if *generation == self.generation {
                return Ok(linking.clone());
            }
        }
        let offset = self.offset();
        let linking = link(&mut self.oracle, &self.support, offset, &self.groups)?;
        self.linking = Some((self.generation, linking.clone()));
        Ok(linking)
    }

    /// Whether the running round has to stop.
    ///
    /// This is the case once the interrupt flag is set or the query limit is reached. A positive
    /// answer is recorded, see [`stopped_early`](EngineState::stopped_early).
    pub fn interrupted(&mut self) -> bool {
        if !self.stopped
            && (self.interrupt.load(Ordering::Relaxed) || self.queries >= self.config.max_queries)
        {
            log::debug!("stopping after {} queries", self.queries);
            self.stopped = true;
        }
        self.stopped
    }

    /// Whether a round stopped before visiting all of its candidates.
    pub fn stopped_early(&self) -> bool {
        self.stopped
    }

    /// Number of determination queries so far.
    pub fn queries(&self) -> u64 {
        self.queries
    }

    /// Count a query that was made on a copy of the oracle.
    pub fn count_query(&mut self) {
        self.queries += 1;
    }

    /// Check whether all of `differ` are determined by `equal`, using the oracle of the run.
    pub fn determined(
        &mut self,
        linking: &Linking,
        equal: &[Var],
        differ: &[Var],
        budget: Budget,
    ) -> Result<Determination, EngineError> {
        self.count_query();
        query::determined(&mut self.oracle, linking, equal, differ, budget)
    }

    pub fn check_unsat(&self) -> Result<(), EngineError> {
        if self.oracle.is_unsat() {
            Err(EngineError::Unsat)
        } else {
            Ok(())
        }
    }
}
