//! Final check of the minimized support set.
use indsup_formula::Var;
use indsup_oracle::Budget;

use crate::encode::link;
use crate::query::Determination;
use crate::state::EngineState;
use crate::EngineError;

/// Outcome of the final check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Verification {
    /// All removed variables are determined by the final set.
    Confirmed,
    /// The check ran out of budget or was interrupted.
    Inconclusive,
}

/// Check with a single query that all removed sampling variables are determined.
///
/// Variables found to be undetermined are added back and the check is repeated. These indicate an
/// error in one of the rounds and are logged as such. Returns the outcome and the number of
/// variables added back.
pub fn verify_final(
    state: &mut EngineState,
    sampling_set: &[Var],
) -> Result<(Verification, usize), EngineError> {
    let offset = state.offset();
    let linking = link(&mut state.oracle, sampling_set, offset, &state.groups)?;
    let budget = Budget::conflicts(state.config.verify_max_confl);

    let mut readded = 0;

    loop {
        let dropped: Vec<Var> = sampling_set
            .iter()
            .cloned()
            .filter(|var| !state.support().contains(var))
            .collect();

        if dropped.is_empty() {
            return Ok((Verification::Confirmed, readded));
        }

        let equal = state.support().to_vec();
        match state.determined(&linking, &equal, &dropped, budget)? {
            Determination::Determined => {
                log::info!("verified that {} removed variables are determined", dropped.len());
                return Ok((Verification::Confirmed, readded));
            }
            Determination::Witness(differing) => {
                log::error!(
                    "removed variables {:?} are not determined by the final set, adding them back",
                    differing
                );
                let differing = if differing.is_empty() {
                    dropped
                } else {
                    differing
                };
                readded += differing.len();
                state.add_vars(&differing);
            }
            Determination::Unknown => {
                log::warn!("verification of the final set was inconclusive");
                return Ok((Verification::Inconclusive, readded));
            }
        }
    }
}
