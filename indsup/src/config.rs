//! Minimizer configuration.
use serde::Deserialize;

use indsup_macros::{ConfigUpdate, DocDefault};

/// Order in which candidate variables are visited by the minimization rounds.
///
/// Variables early in the order are the first to be tried for removal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ordering {
    /// Descending literal incidence.
    Incidence,
    /// Descending literal incidence, then descending probing incidence.
    IncidenceThenProbing,
    /// Descending probing incidence.
    Probing,
    /// Clusters by ascending maximal incidence, clusterless variables last.
    Community,
    /// Ascending number of neighbouring clusters, then descending probing incidence.
    CrossCommunity,
    /// Seeded random shuffle.
    Random,
}

/// How the occurrence counts of both literals of a variable are combined.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IncidenceMode {
    Min,
    Max,
    Sum,
}

impl IncidenceMode {
    pub fn combine(self, positive: u32, negative: u32) -> u32 {
        match self {
            IncidenceMode::Min => positive.min(negative),
            IncidenceMode::Max => positive.max(negative),
            IncidenceMode::Sum => positive.saturating_add(negative),
        }
    }
}

/// Configurable parameters of the minimization.
#[derive(DocDefault, ConfigUpdate, Clone, Debug)]
pub struct MinimizerConfig {
    /// Seed for random orderings and shuffles. (Default: 0)
    pub seed: u64,

    /// Remove groups of variables at once before the other rounds. (Default: false)
    pub guess: bool,

    /// Initial guess group size as a fraction of the candidates. (Default: 10)
    pub guess_div: usize,

    /// Conflict budget of a single guess query. (Default: 1000)
    pub guess_max_confl: u64,

    /// Shuffle the candidates before each guess pass. (Default: false)
    pub guess_shuffle: bool,

    /// Grow a set of necessary variables before the backward round. (Default: false)
    pub forward: bool,

    /// Number of variables confirmed per forward query. (Default: 10)
    pub forward_group: usize,

    /// Maximal number of forward queries. (Default: 1000)
    pub forward_max_iters: usize,

    /// Conflict budget of a single forward query. (Default: 1000)
    pub forward_max_confl: u64,

    /// Fix the confirmed variables by units on a copy of the oracle during the forward round.
    /// (Default: false)
    pub assign_fwd_val: bool,

    /// Try to remove each remaining variable individually. (Default: true)
    pub backward: bool,

    /// Try to remove variables in bisected groups during the backward round. (Default: false)
    pub fast_backw: bool,

    /// Group size for the fast backward round. (Default: 20)
    pub backw_group: usize,

    /// Conflict budget of a single backward query. (Default: 500)
    pub backw_max_confl: u64,

    /// Order in which candidates are visited. (Default: Ordering::IncidenceThenProbing)
    pub ordering: Ordering,

    /// Combination of positive and negative literal occurrences. (Default: IncidenceMode::Min)
    pub incidence_mode: IncidenceMode,

    /// Allow computing the community partition. Community orderings fall back to incidence
    /// ordering when disabled. (Default: true)
    pub communities: bool,

    /// Remove variables assigned at decision level 0. (Default: true)
    pub zero_assigned_based: bool,

    /// Remove constant and equivalent variables found by failed literal probing. (Default: true)
    pub probe_based: bool,

    /// Remove variables equivalent by binary clauses. (Default: true)
    pub binary_eq_based: bool,

    /// Remove outputs of AND and OR gates. (Default: false)
    pub gate_based: bool,

    /// Remove variables defined by XOR constraints. (Default: false)
    pub xor_based: bool,

    /// Search for backbone literals before minimizing. (Default: false)
    pub backbone_simpl: bool,

    /// Conflict budget of a single backbone query. (Default: 10000)
    pub backbone_max_confl: u64,

    /// Keep variables without occurrences without querying them. (Default: true)
    pub empty_occs_based: bool,

    /// Check the final set with a single query over all removed variables. (Default: false)
    pub verify_final: bool,

    /// Conflict budget of the final check. (Default: 100000)
    pub verify_max_confl: u64,

    /// Stop the minimization after this many determination queries, keeping the variables that
    /// were not visited. (Default: u64::MAX)
    pub max_queries: u64,
}
