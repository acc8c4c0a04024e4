//! Removal of whole groups of variables.
//!
//! Each pass splits the candidates into groups and tries to remove a group with a single query.
//! The group size starts at a fraction of the candidate count and is halved after each pass until
//! it drops below two.
use rand::seq::SliceRandom;

use indsup_formula::Var;
use indsup_oracle::Budget;

use crate::state::EngineState;
use crate::EngineError;

/// Remove groups of variables that are determined by the rest of the support set.
///
/// Returns the number of removed variables.
pub fn guess_round(state: &mut EngineState) -> Result<usize, EngineError> {
    let linking = state.relink()?;
    let budget = Budget::conflicts(state.config.guess_max_confl);

    let initial = state.candidates().len();
    let mut group_size = (initial / state.config.guess_div.max(1)).max(2);
    let mut removed = 0;
    let mut equal: Vec<Var> = vec![];

    'passes: while group_size >= 2 {
        let mut candidates = state.candidates();
        if state.config.guess_shuffle {
            candidates.shuffle(&mut state.rng);
        }

        let mut pass_removed = 0;
        for group in candidates.chunks(group_size) {
            if state.interrupted() {
                break 'passes;
            }

            equal.clear();
            equal.extend(
                state
                    .support()
                    .iter()
                    .cloned()
                    .filter(|var| !group.contains(var)),
            );

            if state.determined(&linking, &equal, group, budget)?.is_determined() {
                state.remove_vars(group);
                pass_removed += group.len();
            }
        }

        log::debug!(
            "guess pass with groups of {} removed {} variables",
            group_size,
            pass_removed
        );
        removed += pass_removed;
        group_size /= 2;
    }

    state.removed_by.guess += removed;
    log::info!(
        "guess removed {} of {} candidates, {} variables remain",
        removed,
        initial,
        state.support().len()
    );

    Ok(removed)
}
