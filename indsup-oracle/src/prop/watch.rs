//! Watchlists to detect clauses that became unit.
//!
//! Every long clause is watched by its literals in position 0 and 1. While a clause is not unit,
//! both watched literals are non-false. When it becomes unit, the true literal is moved to position
//! 0 and position 1 holds the false literal of the highest decision level. Backtracking never
//! invalidates this, so watchlists are only updated during propagation.
//!
//! Each watch carries a blocking literal of the same clause. If the blocking literal is true, the
//! clause is satisfied and does not have to be accessed at all.
//!
//! Deleting clauses requires a [`Watchlists::retain`] pass before their slots can be reused.
use indsup_formula::Lit;

use crate::clause::ClauseRef;

/// A watch on a long clause.
#[derive(Copy, Clone)]
pub struct Watch {
    /// Clause which has the referring lit in position 0 or 1.
    pub cref: ClauseRef,
    /// A lit of the clause, different from the referring lit.
    pub blocking: Lit,
}

/// Watches indexed by the literal whose assignment to true falsifies the watched literal.
#[derive(Default, Clone)]
pub struct Watchlists {
    watches: Vec<Vec<Watch>>,
}

impl Watchlists {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.watches.resize(count * 2, vec![]);
    }

    /// Start watching a clause.
    ///
    /// `lits` have to be the first two literals of the given clause.
    pub fn watch_clause(&mut self, cref: ClauseRef, lits: [Lit; 2]) {
        for i in 0..2 {
            let watch = Watch {
                cref,
                blocking: lits[i ^ 1],
            };
            self.add_watch(!lits[i], watch);
        }
    }

    /// Return watches for a given literal.
    pub fn watched_by_mut(&mut self, lit: Lit) -> &mut Vec<Watch> {
        &mut self.watches[lit.code()]
    }

    /// Keep only the watches satisfying a predicate.
    pub fn retain(&mut self, mut keep: impl FnMut(&Watch) -> bool) {
        for watchlist in self.watches.iter_mut() {
            watchlist.retain(|watch| keep(watch));
        }
    }

    /// Make a literal watch a clause.
    pub fn add_watch(&mut self, lit: Lit, watch: Watch) {
        self.watches[lit.code()].push(watch)
    }
}
