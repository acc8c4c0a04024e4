//! Incremental CDCL satisfiability oracle used by the indsup minimizer.
//!
//! Besides solving under assumptions with a conflict budget, the oracle answers structural
//! questions about the irredundant part of its formula: literal incidence, constant literals,
//! failed literal probing, equivalences, gate and XOR definitions.

#[cfg(test)]
#[macro_use]
extern crate indsup_formula;

pub mod config;
pub mod oracle;

mod analyze_conflict;
mod assumptions;
mod binary;
mod cdcl;
mod clause;
mod context;
mod encode;
mod glue;
mod load;
mod probe;
mod prop;
mod schedule;
mod state;
mod structure;
mod tmp;
mod vsids;

pub use config::{OracleConfig, OracleConfigUpdate};
pub use oracle::{Budget, Oracle, OracleError, OracleStats, SolveOutcome};
pub use probe::ProbeReport;
pub use structure::AndGate;

pub use indsup_formula::{Lit, Var, XorClause};
