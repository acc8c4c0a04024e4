//! Binary clauses.
use indsup_formula::Lit;

/// Binary clauses.
///
/// Stored as implication lists, plus a list of the irredundant ones for enumeration.
#[derive(Default, Clone)]
pub struct BinaryClauses {
    by_lit: Vec<Vec<Lit>>,
    irred: Vec<[Lit; 2]>,
}

impl BinaryClauses {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.by_lit.resize(count * 2, vec![]);
    }

    /// Add a binary clause.
    pub fn add_binary_clause(&mut self, lits: [Lit; 2], redundant: bool) {
        for i in 0..2 {
            self.by_lit[(!lits[i]).code()].push(lits[i ^ 1]);
        }
        if !redundant {
            self.irred.push(lits);
        }
    }

    /// Implications of a given literal
    pub fn implied(&self, lit: Lit) -> &[Lit] {
        &self.by_lit[lit.code()]
    }

    /// Irredundant binary clauses in insertion order.
    pub fn irred(&self) -> &[[Lit; 2]] {
        &self.irred
    }
}
