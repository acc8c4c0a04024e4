//! Database for long clauses and irredundant units.
use partial_ref::{partial, PartialRef};

use indsup_formula::Lit;

use crate::context::{parts::*, Context};
use crate::prop::Reason;

use super::{Clause, ClauseHeader, ClauseRef};

/// Database for long clauses.
///
/// Slots of deleted clauses are reused, so a [`ClauseRef`] is only valid until its clause is
/// deleted.
#[derive(Default, Clone)]
pub struct ClauseDb {
    clauses: Vec<Clause>,
    /// Slots of deleted clauses that are no longer watched.
    free: Vec<ClauseRef>,
    /// Slots of deleted clauses that may still be watched.
    pending_free: Vec<ClauseRef>,
    /// Unit clauses added to the oracle, without derived units.
    units: Vec<Lit>,
    irred_count: usize,
    redundant: Vec<ClauseRef>,
}

impl ClauseDb {
    pub fn clause(&self, cref: ClauseRef) -> &Clause {
        &self.clauses[cref.index()]
    }

    pub fn clause_mut(&mut self, cref: ClauseRef) -> &mut Clause {
        &mut self.clauses[cref.index()]
    }

    /// Record an irredundant unit clause.
    pub fn add_unit(&mut self, lit: Lit) {
        self.units.push(lit);
    }

    pub fn units(&self) -> &[Lit] {
        &self.units
    }

    /// Number of irredundant long clauses.
    pub fn irred_count(&self) -> usize {
        self.irred_count
    }

    /// Number of learned long clauses currently kept.
    pub fn redundant_count(&self) -> usize {
        self.redundant.len()
    }

    /// Learned long clauses.
    pub fn redundant(&self) -> &[ClauseRef] {
        &self.redundant
    }

    /// Irredundant long clauses.
    pub fn irred_clauses(&self) -> impl Iterator<Item = &[Lit]> {
        self.clauses
            .iter()
            .filter(|clause| !clause.header.deleted && !clause.header.redundant)
            .map(|clause| clause.lits())
    }

    /// Whether a clause is the reason of a current assignment.
    pub fn is_locked(
        &self,
        ctx: &partial!(Context, AssignmentP, ImplGraphP),
        cref: ClauseRef,
    ) -> bool {
        let first = self.clause(cref).lits[0];
        ctx.part(AssignmentP).lit_is_true(first)
            && *ctx.part(ImplGraphP).reason(first.var()) == Reason::Long(cref)
    }

    /// Mark clauses as deleted.
    ///
    /// Their watches have to be removed before any further propagation.
    pub fn delete_clauses(&mut self, crefs: &[ClauseRef]) {
        for &cref in crefs {
            let clause = &mut self.clauses[cref.index()];
            debug_assert!(!clause.header.deleted);
            clause.header.deleted = true;
            clause.lits = vec![];
            if !clause.header.redundant {
                self.irred_count -= 1;
            }
            self.pending_free.push(cref);
        }
        let clauses = &self.clauses;
        self.redundant
            .retain(|&cref| !clauses[cref.index()].header.deleted);
    }

    /// Make slots of deleted clauses available once no watches refer to them.
    pub fn release_deleted(&mut self) {
        self.free.append(&mut self.pending_free);
    }

    /// Invoke a function on each live clause's header.
    pub fn for_each_header_mut(&mut self, mut f: impl FnMut(&mut ClauseHeader)) {
        for clause in self.clauses.iter_mut() {
            if !clause.header.deleted {
                f(&mut clause.header)
            }
        }
    }

    /// Whether a clause slot holds a deleted clause.
    pub fn is_deleted(&self, cref: ClauseRef) -> bool {
        self.clauses[cref.index()].header.deleted
    }
}

/// Add a long clause and watch its first two literals.
///
/// The caller has to make sure that watching the first two literals is valid under the current
/// assignment.
pub fn add_clause(
    mut ctx: partial!(Context, mut ClauseDbP, mut WatchlistsP),
    header: ClauseHeader,
    lits: &[Lit],
) -> ClauseRef {
    debug_assert!(lits.len() >= 3);
    let db = ctx.part_mut(ClauseDbP);

    let clause = Clause {
        header,
        lits: lits.to_vec(),
    };

    let cref = match db.free.pop() {
        Some(cref) => {
            db.clauses[cref.index()] = clause;
            cref
        }
        None => {
            db.clauses.push(clause);
            ClauseRef((db.clauses.len() - 1) as u32)
        }
    };

    if header.redundant {
        db.redundant.push(cref);
    } else {
        db.irred_count += 1;
    }

    ctx.part_mut(WatchlistsP)
        .watch_clause(cref, [lits[0], lits[1]]);

    cref
}
