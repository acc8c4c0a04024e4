//! Outcome of the most recent search.

/// What is known about the satisfiability of the formula under the current assumptions.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SearchState {
    /// No search finished since the formula or the assumptions last changed.
    Unknown,
    /// The current assignment is a model.
    Sat,
    /// The formula itself is unsatisfiable. This is final.
    Unsat,
    /// The formula is unsatisfiable under the current assumptions.
    FailedAssumptions,
}

impl Default for SearchState {
    fn default() -> SearchState {
        SearchState::Unknown
    }
}

impl SearchState {
    /// Forget the outcome of the last search, unless the formula is unsatisfiable.
    pub fn invalidate(&mut self) {
        if *self != SearchState::Unsat {
            *self = SearchState::Unknown;
        }
    }
}
