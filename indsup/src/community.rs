//! Community detection on the variable interaction graph.
//!
//! Two variables are connected if they occur in a common clause. A clause of length `k` adds
//! `1 / C(k, 2)` to the weight of each pair of its variables, so every clause contributes a total
//! weight of one. Variables are clustered by greedily moving single nodes to the neighbouring
//! cluster with the largest modularity gain until no move improves the modularity.
use rustc_hash::FxHashMap;

use indsup_formula::{Lit, Var};

/// Upper bound on the number of full passes over all nodes.
const MAX_PASSES: usize = 32;

/// Modularity gains below this are treated as zero.
const MIN_GAIN: f64 = 1e-12;

/// Weighted undirected graph and its clustering.
#[derive(Clone, Debug, Default)]
pub struct Communities {
    adjacency: Vec<FxHashMap<usize, f64>>,
    cluster: Vec<Option<usize>>,
    cluster_count: usize,
}

impl Communities {
    pub fn new(node_count: usize) -> Communities {
        Communities {
            adjacency: vec![FxHashMap::default(); node_count],
            cluster: vec![None; node_count],
            cluster_count: 0,
        }
    }

    /// Interaction graph of a set of clauses.
    pub fn from_clauses<'a>(
        var_count: usize,
        clauses: impl IntoIterator<Item = &'a [Lit]>,
    ) -> Communities {
        let mut communities = Communities::new(var_count);
        let mut vars: Vec<usize> = vec![];
        for clause in clauses {
            vars.clear();
            vars.extend(clause.iter().map(|lit| lit.index()));
            vars.sort_unstable();
            vars.dedup();

            let k = vars.len();
            if k < 2 {
                continue;
            }
            let weight = 2.0 / (k * (k - 1)) as f64;
            for (position, &a) in vars.iter().enumerate() {
                for &b in vars[position + 1..].iter() {
                    communities.add_edge(a, b, weight);
                }
            }
        }
        communities
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Add weight to the edge between two distinct nodes.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        assert_ne!(a, b, "self loops are not supported");
        let needed = a.max(b) + 1;
        if needed > self.adjacency.len() {
            self.adjacency.resize(needed, FxHashMap::default());
            self.cluster.resize(needed, None);
        }
        *self.adjacency[a].entry(b).or_insert(0.0) += weight;
        *self.adjacency[b].entry(a).or_insert(0.0) += weight;
    }

    /// Cluster the nodes.
    ///
    /// Nodes without edges are not assigned to any cluster. Cluster ids are dense and numbered
    /// by their smallest node.
    pub fn compute(&mut self) {
        let node_count = self.adjacency.len();
        let degree: Vec<f64> = self
            .adjacency
            .iter()
            .map(|edges| edges.values().sum())
            .collect();
        let total: f64 = degree.iter().sum();

        let mut community: Vec<usize> = (0..node_count).collect();
        let mut community_degree = degree.clone();

        if total > 0.0 {
            let mut weights: FxHashMap<usize, f64> = FxHashMap::default();
            let mut candidates: Vec<(usize, f64)> = vec![];

            for pass in 0..MAX_PASSES {
                let mut moved = 0;
                for node in 0..node_count {
                    if self.adjacency[node].is_empty() {
                        continue;
                    }

                    weights.clear();
                    for (&neighbour, &weight) in self.adjacency[node].iter() {
                        *weights.entry(community[neighbour]).or_insert(0.0) += weight;
                    }
                    candidates.clear();
                    candidates.extend(weights.iter().map(|(&c, &w)| (c, w)));
                    candidates.sort_unstable_by_key(|&(c, _)| c);

                    let current = community[node];
                    community_degree[current] -= degree[node];

                    let gain = |c: usize, weight: f64| {
                        weight - community_degree[c] * degree[node] / total
                    };

                    let mut best = current;
                    let current_weight = weights.get(&current).cloned().unwrap_or(0.0);
                    let mut best_gain = gain(current, current_weight);
                    for &(c, weight) in candidates.iter() {
                        let candidate_gain = gain(c, weight);
                        if candidate_gain > best_gain + MIN_GAIN {
                            best = c;
                            best_gain = candidate_gain;
                        }
                    }

                    community_degree[best] += degree[node];
                    if best != current {
                        community[node] = best;
                        moved += 1;
                    }
                }
                log::trace!("community pass {}: {} moves", pass, moved);
                if moved == 0 {
                    break;
                }
            }
        }

        let mut renumber: FxHashMap<usize, usize> = FxHashMap::default();
        for node in 0..node_count {
            self.cluster[node] = if self.adjacency[node].is_empty() {
                None
            } else {
                let next = renumber.len();
                Some(*renumber.entry(community[node]).or_insert(next))
            };
        }
        self.cluster_count = renumber.len();
    }

    /// Cluster of a node after [`compute`](Communities::compute).
    pub fn cluster_of(&self, node: usize) -> Option<usize> {
        self.cluster.get(node).cloned().flatten()
    }

    pub fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Number of distinct foreign clusters among the neighbours of a variable.
    pub fn cross_degree(&self, var: Var) -> usize {
        let own = self.cluster_of(var.index());
        let mut seen: Vec<usize> = self
            .adjacency
            .get(var.index())
            .into_iter()
            .flat_map(|edges| edges.keys())
            .filter_map(|&neighbour| self.cluster_of(neighbour))
            .filter(|&cluster| Some(cluster) != own)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_cliques() {
        let mut communities = Communities::new(8);
        for &offset in [0, 4].iter() {
            for a in 0..4 {
                for b in a + 1..4 {
                    communities.add_edge(offset + a, offset + b, 1.0);
                }
            }
        }
        communities.add_edge(3, 4, 0.1);
        communities.compute();

        assert_eq!(communities.cluster_count(), 2);
        for node in 0..4 {
            assert_eq!(communities.cluster_of(node), Some(0));
            assert_eq!(communities.cluster_of(node + 4), Some(1));
        }
        assert_eq!(communities.cross_degree(Var::from_index(3)), 1);
        assert_eq!(communities.cross_degree(Var::from_index(0)), 0);
    }

    #[test]
    fn isolated_nodes_have_no_cluster() {
        let clauses = cnf![
            1, 2, 3;
            5;
            -1, 2;
        ];
        let mut communities = Communities::from_clauses(6, clauses.iter().cloned());
        communities.compute();

        assert_eq!(communities.node_count(), 6);
        assert_eq!(communities.cluster_of(3), None);
        assert_eq!(communities.cluster_of(4), None);
        assert_eq!(communities.cluster_of(5), None);
        assert!(communities.cluster_of(0).is_some());
        assert_eq!(communities.cluster_of(0), communities.cluster_of(1));
        assert_eq!(communities.cluster_of(9), None);
    }

    #[test]
    fn clause_weights_sum_to_one() {
        let clauses = cnf![
            1, 2, 3, 4;
        ];
        let communities = Communities::from_clauses(4, clauses.iter().cloned());
        let total: f64 = communities
            .adjacency
            .iter()
            .flat_map(|edges| edges.values())
            .sum();
        assert!((total - 2.0).abs() < 1e-9);
    }
}
