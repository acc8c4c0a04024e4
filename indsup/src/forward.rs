//! Growing a set of necessary variables.
//!
//! The confirmed set starts with the kept variables. Each query asks whether some unconfirmed
//! variable can still differ while the confirmed ones agree with their copies. Variables that
//! differ in a model are confirmed. Once no unconfirmed variable can differ, all of them are
//! determined by the confirmed set and are removed.
use indsup_formula::Var;
use indsup_oracle::{Budget, Oracle};

use crate::encode::Linking;
use crate::query::{determined, Determination};
use crate::state::EngineState;
use crate::EngineError;

/// Confirmed variables, either as assumptions or as units on a copy of the oracle.
enum Confirmed {
    Assumed,
    Fixed { oracle: Oracle, fixed: usize },
}

/// Run the forward round. Returns the number of removed variables.
pub fn forward_round(state: &mut EngineState) -> Result<usize, EngineError> {
    let linking = state.relink()?;
    let budget = Budget::conflicts(state.config.forward_max_confl);
    let group = state.config.forward_group.max(1);

    let mut confirmed: Vec<Var> = state
        .support()
        .iter()
        .cloned()
        .filter(|&var| state.is_kept(var))
        .collect();
    let mut unknown = state.candidates();
    let initial = unknown.len();

    let mut mode = if state.config.assign_fwd_val {
        Confirmed::Fixed {
            oracle: state.oracle.clone(),
            fixed: 0,
        }
    } else {
        Confirmed::Assumed
    };

    let mut iterations = 0;
    let mut unknown_outcomes = 0;

    while !unknown.is_empty() {
        if state.interrupted() {
            log::info!("forward round interrupted");
            confirmed.append(&mut unknown);
            break;
        }
        if iterations >= state.config.forward_max_iters {
            log::warn!(
                "forward round hit its iteration limit, confirming {} variables",
                unknown.len()
            );
            confirmed.append(&mut unknown);
            break;
        }
        iterations += 1;

        let result = match &mut mode {
            Confirmed::Assumed => state.determined(&linking, &confirmed, &unknown, budget)?,
            Confirmed::Fixed { oracle, fixed } => {
                fix_confirmed(oracle, &linking, &confirmed[*fixed..])?;
                *fixed = confirmed.len();
                state.count_query();
                determined(oracle, &linking, &[], &unknown, budget)?
            }
        };

        let moving: Vec<Var> = match result {
            Determination::Determined => break,
            Determination::Witness(differing) if !differing.is_empty() => {
                differing.into_iter().take(group).collect()
            }
            Determination::Witness(_) | Determination::Unknown => {
                unknown_outcomes += 1;
                unknown.iter().cloned().take(group).collect()
            }
        };

        log::debug!("forward query {} confirmed {:?}", iterations, moving);

        unknown.retain(|var| !moving.contains(var));
        confirmed.extend(moving);
    }

    let removed = unknown.len();
    let mut support = confirmed;
    state.ranking.sort(&mut support);
    state.set_support(support);
    state.removed_by.forward += removed;

    log::info!(
        "forward removed {} of {} candidates in {} queries ({} inconclusive), {} variables remain",
        removed,
        initial,
        iterations,
        unknown_outcomes,
        state.support().len()
    );

    Ok(removed)
}

/// Force newly confirmed variables to agree with their copies.
fn fix_confirmed(oracle: &mut Oracle, linking: &Linking, vars: &[Var]) -> Result<(), EngineError> {
    for &var in vars {
        if !oracle.add_clause(&[linking.indicator(var).negative()]) {
            return Err(EngineError::Unsat);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{atomic::AtomicBool, Arc};

    use indsup_formula::CnfFormula;

    use crate::config::MinimizerConfig;
    use crate::encode::duplicate;
    use crate::order::Ranking;

    fn run(formula: CnfFormula, config: MinimizerConfig) -> (Vec<Var>, usize) {
        let mut oracle = Oracle::default();
        for clause in formula.iter() {
            oracle.add_clause(clause);
        }
        let support: Vec<Var> = (0..formula.var_count()).map(Var::from_index).collect();
        let mut state = EngineState::new(
            config,
            oracle,
            support.clone(),
            Arc::new(AtomicBool::new(false)),
        );
        state.duplication = Some(duplicate(&mut state.oracle).unwrap());
        state.ranking = Ranking::new(&support);
        let removed = forward_round(&mut state).unwrap();
        (state.into_support(), removed)
    }

    fn chain() -> CnfFormula {
        // 4 <-> 1 & 2, 5 <-> 4 | 3
        cnf_formula![
            -4, 1;
            -4, 2;
            4, -1, -2;
            5, -4;
            5, -3;
            -5, 4, 3;
        ]
    }

    #[test]
    fn confirms_inputs() {
        let mut config = MinimizerConfig::default();
        config.forward_group = 1;
        let (support, removed) = run(chain(), config);
        // The lowest differing variable is always an input.
        assert_eq!(support, vars![1, 2, 3]);
        assert_eq!(removed, 2);
    }

    #[test]
    fn fixed_confirmations() {
        let mut config = MinimizerConfig::default();
        config.forward_group = 1;
        config.assign_fwd_val = true;
        let (support, _) = run(chain(), config);
        assert_eq!(support, vars![1, 2, 3]);
    }

    #[test]
    fn iteration_limit_keeps_everything() {
        let mut config = MinimizerConfig::default();
        config.forward_group = 1;
        config.forward_max_iters = 1;
        let (support, removed) = run(chain(), config);
        assert_eq!(support.len(), 5);
        assert_eq!(removed, 0);
    }
}
