//! Minimal independent support computation.
//!
//! An independent support of a formula is a subset of its sampling variables whose values
//! determine the values of all other sampling variables in every model. Starting from the full
//! sampling set, the [`Minimizer`] removes variables that are determined by the remaining ones.
//!
//! Determination is checked on a duplicated formula: a variable `u` is determined by a set `S` iff
//! there are no two models that agree on `S` but differ on `u`. Cheap structural arguments
//! (constants, equivalences, gate and XOR definitions) remove some variables before any such
//! query. The remaining candidates are processed by up to three rounds of queries: group guesses,
//! a forward round growing a set of necessary variables and a backward round trying to remove
//! each variable individually.

#[cfg(test)]
#[macro_use]
extern crate indsup_formula;

pub mod community;
pub mod config;
pub mod encode;
pub mod group;
pub mod incidence;
pub mod minimizer;
pub mod order;
pub mod query;
pub mod state;
pub mod verify;

mod backward;
mod forward;
mod guess;
mod prefilter;

pub use config::{IncidenceMode, MinimizerConfig, MinimizerConfigUpdate, Ordering};
pub use minimizer::{EngineError, Minimizer, Report};
pub use state::RemovedBy;
pub use verify::Verification;

pub use indsup_formula::{CnfFormula, ExtendFormula, Formula, Lit, Var};
pub use indsup_oracle::{OracleConfig, OracleConfigUpdate};

pub mod dimacs {
    //! DIMACS CNF parser and writer.
    pub use indsup_dimacs::*;
}
