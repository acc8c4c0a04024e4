//! Duplicated formula and indicator variables.
//!
//! The formula is copied onto fresh variables, shifted by the variable count `N` at the time of
//! duplication. For every variable `v` of the support set an indicator `i_v` is added that is true
//! exactly when `v` and its copy `v + N` take different values. A variable `u` outside the support
//! set is determined by it, iff no model exists in which all indicators of the support set are
//! false while `u` and `u + N` differ.
use bimap::BiHashMap;

use indsup_formula::{ExtendFormula, Lit, Var};
use indsup_oracle::Oracle;

use crate::group::Groups;
use crate::EngineError;

/// Result of duplicating the formula.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Duplication {
    /// Offset between a variable and its copy.
    pub offset: usize,
    /// Number of clauses copied.
    pub clauses: usize,
}

/// Add a shifted copy of every irredundant clause of the oracle.
pub fn duplicate(oracle: &mut Oracle) -> Result<Duplication, EngineError> {
    let offset = oracle.var_count();
    let clauses = oracle.irred_clauses();
    oracle.new_vars(offset);

    let mut shifted = vec![];
    for clause in clauses.iter() {
        shifted.clear();
        shifted.extend(clause.iter().map(|lit| lit.shifted(offset)));
        if !oracle.add_clause(&shifted) {
            return Err(EngineError::Unsat);
        }
    }

    log::debug!(
        "duplicated {} clauses over {} variables",
        clauses.len(),
        offset
    );

    Ok(Duplication {
        offset,
        clauses: clauses.len(),
    })
}

/// Indicator variables for a support set.
#[derive(Clone, Debug)]
pub struct Linking {
    indicators: BiHashMap<Var, Var>,
}

impl Linking {
    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Indicator of a linked variable.
    ///
    /// Panics if the variable was not part of the linked set.
    pub fn indicator(&self, var: Var) -> Var {
        match self.indicators.get_by_left(&var) {
            Some(&indicator) => indicator,
            None => panic!("variable {} has no indicator", var),
        }
    }

    /// Variable linked to an indicator.
    pub fn var_of(&self, indicator: Var) -> Option<Var> {
        self.indicators.get_by_right(&indicator).cloned()
    }

    pub fn contains(&self, var: Var) -> bool {
        self.indicators.contains_left(&var)
    }
}

/// The four clauses defining `indicator <-> (var xor mirror)`.
fn indicator_clauses(var: Var, mirror: Var, indicator: Var) -> [[Lit; 3]; 4] {
    let (v, m, i) = (var.positive(), mirror.positive(), indicator.positive());
    [[v, !m, i], [!v, m, i], [v, m, !i], [!v, !m, !i]]
}

/// Clauses defining `indicator` as the disjunction of per-member difference indicators.
///
/// The member indicators are numbered consecutively from `first_differs`.
pub fn group_clauses(
    members: &[Var],
    offset: usize,
    indicator: Var,
    first_differs: Var,
) -> Vec<Vec<Lit>> {
    let mut clauses = Vec::with_capacity(members.len() * 5 + 1);
    let mut any = Vec::with_capacity(members.len() + 1);
    any.push(indicator.negative());
    for (index, &member) in members.iter().enumerate() {
        let differs = first_differs.shifted(index);
        clauses.extend(
            indicator_clauses(member, member.shifted(offset), differs)
                .iter()
                .map(|clause| clause.to_vec()),
        );
        clauses.push(vec![differs.negative(), indicator.positive()]);
        any.push(differs.positive());
    }
    clauses.push(any);
    clauses
}

/// Add fresh indicators for all variables of `support`.
///
/// Variables representing a group of `groups` get an indicator for the whole group.
pub fn link(
    oracle: &mut Oracle,
    support: &[Var],
    offset: usize,
    groups: &Groups,
) -> Result<Linking, EngineError> {
    let first_indicator = Var::from_index(oracle.var_count());
    for &var in support {
        for &member in groups.members(&var) {
            assert!(
                member.index() < offset,
                "copy variable {} in the support set",
                member
            );
        }
    }

    oracle.new_vars(support.len());

    let mut clauses: Vec<Vec<Lit>> = vec![];
    let mut singletons = vec![];
    for (index, &var) in support.iter().enumerate() {
        let indicator = first_indicator.shifted(index);
        let members = groups.members(&var);
        if members.len() == 1 {
            singletons.push((var, indicator));
        } else {
            let first_differs = Var::from_index(oracle.var_count());
            oracle.new_vars(members.len());
            clauses.extend(group_clauses(members, offset, indicator, first_differs));
        }
    }

    for &(var, indicator) in singletons.iter() {
        clauses.extend(
            indicator_clauses(var, var.shifted(offset), indicator)
                .iter()
                .map(|clause| clause.to_vec()),
        );
    }

    for clause in clauses {
        if !oracle.add_clause(&clause) {
            return Err(EngineError::Unsat);
        }
    }

    let mut indicators = BiHashMap::new();
    for (index, &var) in support.iter().enumerate() {
        let indicator = first_indicator.shifted(index);
        indicators.insert(var, indicator);
        oracle.freeze(&[indicator.positive()]);
        for &member in groups.members(&var) {
            oracle.freeze(&[member.positive(), member.shifted(offset).positive()]);
        }
    }

    log::debug!(
        "linked {} variables, {} of them groups",
        support.len(),
        support.len() - singletons.len()
    );

    Ok(Linking { indicators })
}

#[cfg(test)]
mod tests {
    use super::*;

    use indsup_oracle::{Budget, SolveOutcome};

    #[test]
    fn indicator_tracks_difference() {
        let clauses = indicator_clauses(var!(2), var!(5), var!(7));

        for &(a, b) in [(false, false), (false, true), (true, false), (true, true)].iter() {
            for &i in [false, true].iter() {
                let value = |lit: Lit| {
                    let polarity = match lit.var() {
                        v if v == var!(2) => a,
                        v if v == var!(5) => b,
                        _ => i,
                    };
                    polarity == lit.is_positive()
                };
                let satisfied = clauses.iter().all(|clause| clause.iter().any(|&l| value(l)));
                assert_eq!(satisfied, i == (a != b));
            }
        }
    }

    #[test]
    fn group_indicator_is_disjunction() {
        // Members 1 and 2 with copies 3 and 4, group indicator 5, member indicators 6 and 7
        let clauses = group_clauses(&vars![1, 2], 2, var!(5), var!(6));
        assert_eq!(clauses.len(), 11);

        for bits in 0u32..(1 << 5) {
            let extensible = (0u32..4).any(|differs| {
                let assignment = bits | (differs << 5);
                clauses.iter().all(|clause| {
                    clause
                        .iter()
                        .any(|lit| (assignment & (1 << lit.index()) != 0) == lit.is_positive())
                })
            });
            let bit = |index: usize| bits & (1 << index) != 0;
            let any_differs = bit(0) != bit(2) || bit(1) != bit(3);
            assert_eq!(extensible, bit(4) == any_differs);
        }
    }

    #[test]
    fn duplicate_and_link() {
        let mut oracle = Oracle::default();
        oracle.add_clause(&lits![1, 2]);
        oracle.add_clause(&lits![-1, 3]);

        let before = oracle.stats().clauses;
        let duplication = duplicate(&mut oracle).unwrap();
        assert_eq!(duplication.offset, 3);
        assert_eq!(duplication.clauses, 2);
        assert_eq!(oracle.var_count(), 6);

        let linking = link(&mut oracle, &vars![1, 2, 3], 3, &Groups::default()).unwrap();
        assert_eq!(oracle.stats().clauses, 2 * before + 4 * 3);
        assert_eq!(linking.len(), 3);
        assert_eq!(linking.indicator(var!(2)), var!(8));
        assert_eq!(linking.var_of(var!(9)), Some(var!(3)));
        assert!(oracle.is_frozen(var!(5)));

        // Copies may differ only through their indicators.
        let equal: Vec<Lit> = vars![1, 2]
            .iter()
            .map(|&var| linking.indicator(var).negative())
            .collect();
        let mut assumptions = equal.clone();
        assumptions.push(linking.indicator(var!(3)).positive());
        assert_eq!(
            oracle.solve(&assumptions, Budget::unlimited()),
            SolveOutcome::Sat
        );
        assert_ne!(oracle.value(lit!(3)), oracle.value(lit!(6)));
    }

    #[test]
    #[should_panic(expected = "has no indicator")]
    fn unlinked_variable() {
        let mut oracle = Oracle::default();
        oracle.add_clause(&lits![1, 2]);
        let duplication = duplicate(&mut oracle).unwrap();
        let linking = link(&mut oracle, &vars![1], duplication.offset, &Groups::default()).unwrap();
        linking.indicator(var!(2));
    }

    #[test]
    fn linked_group() {
        let mut oracle = Oracle::default();
        oracle.add_clause(&lits![1, 2, 3]);
        let duplication = duplicate(&mut oracle).unwrap();
        let groups = Groups::new(vec![vars![1, 2].to_vec()]).unwrap();
        let linking = link(&mut oracle, &vars![1, 3], duplication.offset, &groups).unwrap();
        assert_eq!(linking.len(), 2);
        assert!(oracle.is_frozen(var!(5)));

        let group = linking.indicator(var!(1));
        assert_eq!(
            oracle.solve(&[group.negative()], Budget::unlimited()),
            SolveOutcome::Sat
        );
        assert_eq!(oracle.value(lit!(1)), oracle.value(lit!(4)));
        assert_eq!(oracle.value(lit!(2)), oracle.value(lit!(5)));

        assert_eq!(
            oracle.solve(&[group.positive(), lit!(1), lit!(4)], Budget::unlimited()),
            SolveOutcome::Sat
        );
        assert_ne!(oracle.value(lit!(2)), oracle.value(lit!(5)));
    }
}
