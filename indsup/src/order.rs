//! Candidate orderings.
use std::cmp::Reverse;

use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashMap;

use indsup_formula::Var;

use crate::community::Communities;
use crate::config::Ordering;
use crate::incidence::Incidence;

/// Sort variables according to an ordering.
///
/// Ties are broken by ascending variable index. Community orderings without a community
/// partition fall back to [`Ordering::Incidence`].
pub fn sort_vars(
    vars: &mut [Var],
    ordering: Ordering,
    incidence: &Incidence,
    communities: Option<&Communities>,
    rng: &mut impl Rng,
) {
    vars.sort_unstable();
    match (ordering, communities) {
        (Ordering::Incidence, _)
        | (Ordering::Community, None)
        | (Ordering::CrossCommunity, None) => {
            vars.sort_by_key(|&var| Reverse(incidence.occurrence(var)));
        }
        (Ordering::IncidenceThenProbing, _) => {
            vars.sort_by_key(|&var| {
                (
                    Reverse(incidence.occurrence(var)),
                    Reverse(incidence.probing(var)),
                )
            });
        }
        (Ordering::Probing, _) => {
            vars.sort_by_key(|&var| Reverse(incidence.probing(var)));
        }
        (Ordering::Community, Some(communities)) => {
            let mut cluster_max: FxHashMap<usize, u32> = FxHashMap::default();
            for node in 0..communities.node_count() {
                if let Some(cluster) = communities.cluster_of(node) {
                    let max = cluster_max.entry(cluster).or_insert(0);
                    *max = (*max).max(incidence.occurrence(Var::from_index(node)));
                }
            }
            vars.sort_by_key(|&var| match communities.cluster_of(var.index()) {
                Some(cluster) => (
                    false,
                    cluster_max[&cluster],
                    cluster,
                    Reverse(incidence.occurrence(var)),
                ),
                None => (true, 0, 0, Reverse(incidence.occurrence(var))),
            });
        }
        (Ordering::CrossCommunity, Some(communities)) => {
            vars.sort_by_key(|&var| {
                (
                    communities.cross_degree(var),
                    Reverse(incidence.probing(var)),
                )
            });
        }
        (Ordering::Random, _) => {
            vars.shuffle(rng);
        }
    }
}

/// Fixed positions of variables in an ordering.
#[derive(Clone, Debug, Default)]
pub struct Ranking {
    position: Vec<usize>,
}

impl Ranking {
    /// Ranking in which `order` comes first, followed by all other variables by index.
    pub fn new(order: &[Var]) -> Ranking {
        let len = order.iter().map(|var| var.index() + 1).max().unwrap_or(0);
        let mut position: Vec<usize> = (0..len).map(|index| order.len() + index).collect();
        for (rank, &var) in order.iter().enumerate() {
            position[var.index()] = rank;
        }
        Ranking { position }
    }

    pub fn position(&self, var: Var) -> usize {
        self.position
            .get(var.index())
            .cloned()
            .unwrap_or(usize::max_value())
    }

    /// Sort variables by their position.
    pub fn sort(&self, vars: &mut [Var]) {
        vars.sort_by_key(|&var| (self.position(var), var));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::StdRng, SeedableRng};

    fn incidence() -> Incidence {
        Incidence {
            by_occurrence: vec![2, 5, 2, 0, 5],
            by_probing: vec![1, 0, 7, 3, 2],
        }
    }

    fn sorted(ordering: Ordering, communities: Option<&Communities>, seed: u64) -> Vec<Var> {
        let mut vars = vars![5, 4, 3, 2, 1].to_vec();
        let mut rng = StdRng::seed_from_u64(seed);
        sort_vars(&mut vars, ordering, &incidence(), communities, &mut rng);
        vars
    }

    #[test]
    fn incidence_orderings() {
        assert_eq!(sorted(Ordering::Incidence, None, 0), vars![2, 5, 1, 3, 4]);
        assert_eq!(
            sorted(Ordering::IncidenceThenProbing, None, 0),
            vars![5, 2, 3, 1, 4]
        );
        assert_eq!(sorted(Ordering::Probing, None, 0), vars![3, 4, 5, 1, 2]);
        assert_eq!(sorted(Ordering::Community, None, 0), vars![2, 5, 1, 3, 4]);
    }

    #[test]
    fn community_orderings() {
        let mut communities = Communities::new(5);
        communities.add_edge(0, 2, 1.0);
        communities.add_edge(1, 4, 1.0);
        communities.add_edge(2, 4, 0.01);
        communities.compute();
        assert_eq!(communities.cluster_of(3), None);

        let order = sorted(Ordering::Community, Some(&communities), 0);
        assert_eq!(order, vars![1, 3, 2, 5, 4]);

        let order = sorted(Ordering::CrossCommunity, Some(&communities), 0);
        assert_eq!(order, vars![4, 1, 2, 3, 5]);
    }

    #[test]
    fn random_ordering_depends_on_seed() {
        let first = sorted(Ordering::Random, None, 3);
        assert_eq!(first, sorted(Ordering::Random, None, 3));
        let mut sorted_first = first.clone();
        sorted_first.sort();
        assert_eq!(sorted_first, vars![1, 2, 3, 4, 5]);
    }

    #[test]
    fn ranking_positions() {
        let ranking = Ranking::new(&vars![3, 1]);
        let mut vars = vars![4, 1, 2, 3].to_vec();
        ranking.sort(&mut vars);
        assert_eq!(vars, vars![3, 1, 2, 4]);
        assert_eq!(ranking.position(var!(3)), 0);
    }
}
