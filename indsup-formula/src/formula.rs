//! Formulas with XOR and cardinality constraints and a sampling set.
use std::cmp::max;

use crate::{
    cnf::{CnfFormula, ExtendFormula},
    lit::{Lit, Var},
};

/// Parity constraint: the XOR of `vars` equals `rhs`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XorClause {
    pub vars: Vec<Var>,
    pub rhs: bool,
}

impl XorClause {
    pub fn new(vars: Vec<Var>, rhs: bool) -> XorClause {
        XorClause { vars, rhs }
    }

    /// Build from literals, folding negations into the right hand side.
    pub fn from_lits(lits: &[Lit]) -> XorClause {
        let mut rhs = true;
        let vars = lits
            .iter()
            .map(|lit| {
                rhs ^= lit.is_negative();
                lit.var()
            })
            .collect();
        XorClause { vars, rhs }
    }

    /// Whether the constraint holds under a full assignment.
    pub fn is_satisfied(&self, assignment: &[bool]) -> bool {
        let parity = self
            .vars
            .iter()
            .fold(false, |acc, var| acc ^ assignment[var.index()]);
        parity == self.rhs
    }
}

/// At least `cutoff` of `lits` are true.
///
/// With an `output` literal the constraint is reified: `output` is true exactly when the
/// threshold is met.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardConstraint {
    pub lits: Vec<Lit>,
    pub cutoff: usize,
    pub output: Option<Lit>,
}

impl CardConstraint {
    pub fn is_satisfied(&self, assignment: &[bool]) -> bool {
        let value = |lit: Lit| assignment[lit.index()] ^ lit.is_negative();
        let met = self.lits.iter().filter(|&&lit| value(lit)).count() >= self.cutoff;
        match self.output {
            Some(output) => value(output) == met,
            None => met,
        }
    }
}

/// Everything a minimizer input can contain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Formula {
    pub cnf: CnfFormula,
    pub xors: Vec<XorClause>,
    pub cards: Vec<CardConstraint>,
    /// Variables to project on, `None` if the input did not specify any.
    pub sampling_set: Option<Vec<Var>>,
}

impl Formula {
    pub fn new() -> Formula {
        Formula::default()
    }

    /// Number of variables used by any constraint, the sampling set or the header.
    pub fn var_count(&self) -> usize {
        let mut count = self.cnf.var_count();
        for xor in self.xors.iter() {
            for var in xor.vars.iter() {
                count = max(count, var.index() + 1);
            }
        }
        for card in self.cards.iter() {
            for lit in card.lits.iter().chain(card.output.iter()) {
                count = max(count, lit.index() + 1);
            }
        }
        if let Some(sampling_set) = &self.sampling_set {
            for var in sampling_set.iter() {
                count = max(count, var.index() + 1);
            }
        }
        count
    }

    pub fn set_var_count(&mut self, count: usize) {
        self.cnf.set_var_count(count);
    }

    pub fn add_xor_clause(&mut self, xor: XorClause) {
        self.xors.push(xor);
    }

    pub fn add_card_constraint(&mut self, card: CardConstraint) {
        self.cards.push(card);
    }

    /// Extend the sampling set, creating it if necessary.
    pub fn add_sampling_vars(&mut self, vars: impl IntoIterator<Item = Var>) {
        self.sampling_set
            .get_or_insert_with(Vec::new)
            .extend(vars);
    }

    /// Whether a full assignment satisfies every constraint.
    pub fn is_satisfied(&self, assignment: &[bool]) -> bool {
        self.cnf.iter().all(|clause| {
            clause
                .iter()
                .any(|lit| assignment[lit.index()] ^ lit.is_negative())
        }) && self.xors.iter().all(|xor| xor.is_satisfied(assignment))
            && self.cards.iter().all(|card| card.is_satisfied(assignment))
    }
}

impl From<CnfFormula> for Formula {
    fn from(cnf: CnfFormula) -> Formula {
        Formula {
            cnf,
            ..Formula::default()
        }
    }
}

impl ExtendFormula for Formula {
    fn add_clause(&mut self, clause: &[Lit]) {
        self.cnf.add_clause(clause.iter().cloned());
    }

    fn new_var(&mut self) -> Var {
        let var = Var::from_index(self.var_count());
        self.cnf.set_var_count(var.index() + 1);
        var
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_from_lits_folds_negations() {
        let xor = XorClause::from_lits(&lits![1, -2, -3]);
        assert_eq!(xor.vars, vars![1, 2, 3].to_vec());
        assert!(xor.rhs);

        let xor = XorClause::from_lits(&lits![-1, 2]);
        assert!(!xor.rhs);
        assert!(xor.is_satisfied(&[true, true]));
        assert!(!xor.is_satisfied(&[true, false]));
    }

    #[test]
    fn reified_cardinality() {
        let card = CardConstraint {
            lits: lits![1, 2, -3].to_vec(),
            cutoff: 2,
            output: Some(lit!(4)),
        };
        assert!(card.is_satisfied(&[true, true, true, true]));
        assert!(card.is_satisfied(&[true, false, true, false]));
        assert!(!card.is_satisfied(&[true, false, true, true]));
        assert!(!card.is_satisfied(&[false, false, false, true]));
    }

    #[test]
    fn var_count_covers_all_parts() {
        let mut formula = Formula::from(cnf_formula![
            1, 2;
        ]);
        assert_eq!(formula.var_count(), 2);

        formula.add_xor_clause(XorClause::new(vars![5].to_vec(), true));
        assert_eq!(formula.var_count(), 5);

        formula.add_sampling_vars(vars![9].iter().cloned());
        assert_eq!(formula.var_count(), 9);

        assert_eq!(formula.new_var(), var!(10));
        assert_eq!(formula.var_count(), 10);
    }
}
