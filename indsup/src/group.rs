//! Variable groups that are kept or removed as a whole.
//!
//! Every group is represented by its first member. The engine works on representatives only, the
//! indicator of a representative is true iff some member of its group differs from its copy.
//! Variables outside of all groups behave like singleton groups.
use std::slice;

use rustc_hash::{FxHashMap, FxHashSet};

use indsup_formula::Var;

#[derive(Clone, Debug, Default)]
pub struct Groups {
    representatives: Vec<Var>,
    members: FxHashMap<Var, Vec<Var>>,
    representative_of: FxHashMap<Var, Var>,
}

impl Groups {
    /// Build the groups from member lists.
    ///
    /// Repeated members of a group and empty groups are ignored. Fails with the first variable
    /// that is a member of two groups.
    pub fn new(groups: impl IntoIterator<Item = Vec<Var>>) -> Result<Groups, Var> {
        let mut result = Groups::default();
        for group in groups {
            let mut seen = FxHashSet::default();
            let members: Vec<Var> = group.into_iter().filter(|&var| seen.insert(var)).collect();
            let representative = match members.first() {
                Some(&var) => var,
                None => continue,
            };
            for &member in members.iter() {
                if result
                    .representative_of
                    .insert(member, representative)
                    .is_some()
                {
                    return Err(member);
                }
            }
            result.representatives.push(representative);
            result.members.insert(representative, members);
        }
        Ok(result)
    }

    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }

    /// Representatives in the order the groups were given.
    pub fn representatives(&self) -> &[Var] {
        &self.representatives
    }

    /// The representative of the group containing `var`.
    pub fn representative(&self, var: Var) -> Var {
        self.representative_of.get(&var).cloned().unwrap_or(var)
    }

    /// Members of the group represented by `var`.
    pub fn members<'a>(&'a self, var: &'a Var) -> &'a [Var] {
        match self.members.get(var) {
            Some(members) => members,
            None => slice::from_ref(var),
        }
    }

    /// Whether `var` represents a group with more than one member.
    pub fn is_proper(&self, var: Var) -> bool {
        self.members(&var).len() > 1
    }

    /// All members of the groups represented by `vars`.
    pub fn expand(&self, vars: &[Var]) -> Vec<Var> {
        vars.iter()
            .flat_map(|var| self.members(var).iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_and_representatives() {
        let groups = Groups::new(vec![
            vars![3, 1, 3].to_vec(),
            vec![],
            vars![2].to_vec(),
        ])
        .unwrap();

        assert_eq!(groups.representatives(), &vars![3, 2]);
        assert_eq!(groups.members(&var!(3)), &vars![3, 1]);
        assert_eq!(groups.representative(var!(1)), var!(3));
        assert_eq!(groups.representative(var!(5)), var!(5));
        assert_eq!(groups.members(&var!(5)), &vars![5]);
        assert!(groups.is_proper(var!(3)));
        assert!(!groups.is_proper(var!(2)));
        assert_eq!(groups.expand(&vars![2, 3, 4]), vars![2, 3, 1, 4].to_vec());
    }

    #[test]
    fn overlapping_groups() {
        let result = Groups::new(vec![vars![1, 2].to_vec(), vars![3, 2].to_vec()]);
        assert_eq!(result.err(), Some(var!(2)));
    }
}
