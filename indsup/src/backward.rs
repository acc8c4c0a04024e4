//! Shrinking the support set one candidate at a time.
use indsup_formula::Var;
use indsup_oracle::Budget;

use crate::encode::Linking;
use crate::query::Determination;
use crate::state::EngineState;
use crate::EngineError;

/// Try to remove every candidate of the support set.
///
/// A candidate that can not be removed is kept for the rest of the run. Returns the number of
/// removed variables.
pub fn backward_round(state: &mut EngineState) -> Result<usize, EngineError> {
    let linking = state.relink()?;
    let candidates = state.candidates();

    let mut round = Round {
        linking,
        budget: Budget::conflicts(state.config.backw_max_confl),
        removed: 0,
        unknown: 0,
        equal: vec![],
    };

    if state.config.fast_backw {
        let group = state.config.backw_group.max(1);
        for chunk in candidates.chunks(group) {
            if state.interrupted() {
                break;
            }
            round.bisect(state, chunk)?;
        }
    } else {
        for &var in candidates.iter() {
            if state.interrupted() {
                break;
            }
            round.try_remove(state, &[var])?;
        }
    }

    if state.interrupted() {
        log::info!("backward round interrupted");
    }

    state.removed_by.backward += round.removed;
    log::info!(
        "backward removed {} of {} candidates ({} inconclusive), {} variables remain",
        round.removed,
        candidates.len(),
        round.unknown,
        state.support().len()
    );

    Ok(round.removed)
}

struct Round {
    linking: Linking,
    budget: Budget,
    removed: usize,
    unknown: usize,
    equal: Vec<Var>,
}

impl Round {
    /// Query whether all of `group` can be removed at once and remove them if so.
    fn try_remove(&mut self, state: &mut EngineState, group: &[Var]) -> Result<bool, EngineError> {
        self.equal.clear();
        self.equal.extend(
            state
                .support()
                .iter()
                .cloned()
                .filter(|var| !group.contains(var)),
        );

        match state.determined(&self.linking, &self.equal, group, self.budget)? {
            Determination::Determined => {
                log::debug!("removed {:?}", group);
                state.remove_vars(group);
                self.removed += group.len();
                Ok(true)
            }
            result => {
                if result == Determination::Unknown {
                    self.unknown += 1;
                }
                if let [var] = *group {
                    state.keep(var);
                }
                Ok(false)
            }
        }
    }

    /// Remove a group at once, or split it and retry both halves.
    fn bisect(&mut self, state: &mut EngineState, group: &[Var]) -> Result<(), EngineError> {
        if group.is_empty() || state.interrupted() {
            return Ok(());
        }
        if !self.try_remove(state, group)? && group.len() > 1 {
            let (first, second) = group.split_at(group.len() / 2);
            self.bisect(state, first)?;
            self.bisect(state, second)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use indsup_formula::CnfFormula;
    use indsup_oracle::Oracle;

    use crate::config::MinimizerConfig;
    use crate::encode::duplicate;
    use crate::order::Ranking;

    fn state(
        formula: &CnfFormula,
        config: MinimizerConfig,
        interrupt: Arc<AtomicBool>,
    ) -> EngineState {
        let mut oracle = Oracle::default();
        for clause in formula.iter() {
            oracle.add_clause(clause);
        }
        let support: Vec<Var> = (0..formula.var_count()).map(Var::from_index).collect();
        let mut state = EngineState::new(config, oracle, support.clone(), interrupt);
        state.duplication = Some(duplicate(&mut state.oracle).unwrap());
        state.ranking = Ranking::new(&support);
        state
    }

    fn formula() -> CnfFormula {
        // 1 <-> 2, 3 free, 4 <-> 3 xor 1
        cnf_formula![
            1, -2;
            -1, 2;
            -4, 3, 1;
            -4, -3, -1;
            4, -3, 1;
            4, 3, -1;
        ]
    }

    #[test]
    fn single_mode() {
        let mut state = state(
            &formula(),
            MinimizerConfig::default(),
            Arc::new(AtomicBool::new(false)),
        );
        let removed = backward_round(&mut state).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(state.support(), &vars![3, 4]);
        assert!(state.is_kept(var!(3)));
        assert!(state.is_kept(var!(4)));
    }

    #[test]
    fn fast_mode_matches_single_mode() {
        let mut config = MinimizerConfig::default();
        config.fast_backw = true;
        config.backw_group = 4;
        let mut state = state(&formula(), config, Arc::new(AtomicBool::new(false)));
        let removed = backward_round(&mut state).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(state.support().len(), 2);
    }

    #[test]
    fn interrupted_round_keeps_set() {
        let interrupt = Arc::new(AtomicBool::new(false));
        let mut state = state(&formula(), MinimizerConfig::default(), interrupt.clone());
        interrupt.store(true, Ordering::Relaxed);
        let removed = backward_round(&mut state).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(state.support().len(), 4);
        assert!(state.stopped_early());
    }

    #[test]
    fn query_limit_stops_round() {
        let mut config = MinimizerConfig::default();
        config.max_queries = 1;
        let mut limited = state(&formula(), config, Arc::new(AtomicBool::new(false)));
        let removed = backward_round(&mut limited).unwrap();
        assert_eq!(limited.queries(), 1);
        assert!(limited.stopped_early());
        assert_eq!(limited.support().len(), 4 - removed);
        assert!(limited.support().len() >= 3);

        let mut complete = state(
            &formula(),
            MinimizerConfig::default(),
            Arc::new(AtomicBool::new(false)),
        );
        backward_round(&mut complete).unwrap();
        assert_eq!(complete.queries(), 4);
        assert!(!complete.stopped_early());
    }
}
