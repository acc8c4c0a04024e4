//! Formulas in conjunctive normal form.
use std::{cmp::max, fmt, iter::Extend, ops::Range};

use crate::lit::{Lit, Var};

/// A CNF formula stored as one flat literal buffer plus a range per clause.
#[derive(Default, Clone, Eq)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    clause_ranges: Vec<Range<usize>>,
}

impl CnfFormula {
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Number of variables, including unused variables below the largest used one.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Raise the variable count to at least `count`.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count)
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clause_ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clause_ranges.is_empty()
    }

    /// Total number of literals over all clauses.
    pub fn lit_count(&self) -> usize {
        self.literals.len()
    }

    /// Append a clause.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        let end = self.literals.len();

        if let Some(max_index) = self.literals[begin..end].iter().map(|lit| lit.index()).max() {
            self.var_count = max(self.var_count, max_index + 1);
        }

        self.clause_ranges.push(begin..end);
    }

    /// The clause at position `index`.
    pub fn clause(&self, index: usize) -> &[Lit] {
        &self.literals[self.clause_ranges[index].clone()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        self.clause_ranges
            .iter()
            .map(move |range| &literals[range.clone()])
    }

    /// Variables that occur in at least one clause, as a dense flag vector.
    pub fn occurring_vars(&self) -> Vec<bool> {
        let mut occurs = vec![false; self.var_count];
        for &lit in self.literals.iter() {
            occurs[lit.index()] = true;
        }
        occurs
    }
}

/// Anything clauses and fresh variables can be added to.
pub trait ExtendFormula {
    fn add_clause(&mut self, clause: &[Lit]);

    fn new_var(&mut self) -> Var;

    fn new_lit(&mut self) -> Lit {
        self.new_var().positive()
    }

    fn new_vars(&mut self, count: usize) -> Vec<Var> {
        (0..count).map(|_| self.new_var()).collect()
    }
}

impl ExtendFormula for CnfFormula {
    fn add_clause(&mut self, clause: &[Lit]) {
        CnfFormula::add_clause(self, clause.iter().cloned());
    }

    fn new_var(&mut self) -> Var {
        let var = Var::from_index(self.var_count);
        self.var_count += 1;
        var
    }
}

/// Collect clauses from nested iterables.
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(clauses: F) -> CnfFormula {
        let mut formula = CnfFormula::new();
        for clause in clauses {
            formula.add_clause(clause);
        }
        formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} vars ", self.var_count)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count == other.var_count
            && self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    /// Random clauses over `vars` variables, as nested vectors.
    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
        })
    }

    /// Random clauses over `vars` variables with the variable count set to `vars`.
    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();
        vars.prop_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
            .prop_map(move |clauses| {
                let mut formula = CnfFormula::from(clauses);
                formula.set_var_count(vars);
                formula
            })
            .no_shrink()
        })
    }
}
