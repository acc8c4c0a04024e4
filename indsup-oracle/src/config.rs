//! Oracle configuration.
use indsup_macros::{ConfigUpdate, DocDefault};

/// Configurable parameters used during solving.
#[derive(DocDefault, ConfigUpdate, Clone, Debug)]
pub struct OracleConfig {
    /// Multiplicative decay for the VSIDS decision heuristic. (Default: 0.95)
    pub vsids_decay: f32,

    /// Multiplicative decay for clause activities. (Default: 0.999)
    pub clause_activity_decay: f32,

    /// Scaling factor for luby sequence based restarts (number of conflicts). (Default: 128)
    pub luby_restart_interval_scale: u64,

    /// Number of conflicts between reductions of the learned clauses. (Default: 2000)
    pub reduce_interval: u64,

    /// Number of conflicts between checks of the interrupt flag. (Default: 64)
    pub interrupt_check_interval: u64,
}
