//! Clause storage.
//!
//! Unit and binary clauses are not stored here: irredundant units are recorded in [`ClauseDb`] for
//! enumeration, binary clauses live in [`BinaryClauses`](crate::binary::BinaryClauses).
use indsup_formula::Lit;

pub mod activity;
pub mod db;
pub mod reduce;

pub use activity::{bump_clause_activity, decay_clause_activities, ClauseActivity};
pub use db::ClauseDb;

/// Index of a long clause in the [`ClauseDb`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct ClauseRef(u32);

impl ClauseRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Metadata of a long clause.
#[derive(Copy, Clone, Debug, Default)]
pub struct ClauseHeader {
    /// Learned clauses are redundant and may be deleted.
    pub redundant: bool,
    pub deleted: bool,
    /// Smallest glue level observed, see [`glue`](crate::glue).
    pub glue: u32,
    pub activity: f32,
}

/// A clause of length three or more.
#[derive(Clone, Debug)]
pub struct Clause {
    pub header: ClauseHeader,
    lits: Vec<Lit>,
}

impl Clause {
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    pub fn lits_mut(&mut self) -> &mut [Lit] {
        &mut self.lits
    }
}
