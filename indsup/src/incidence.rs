//! Per-variable occurrence statistics.
use indsup_formula::Var;

use crate::config::IncidenceMode;

/// Incidence tables indexed by variable.
#[derive(Clone, Debug, Default)]
pub struct Incidence {
    /// Combined occurrence count of both literals.
    pub by_occurrence: Vec<u32>,
    /// Number of literals implied when probing the variable, empty if probing did not run.
    pub by_probing: Vec<u32>,
}

impl Incidence {
    /// Build from occurrence counts indexed by literal code.
    pub fn from_lit_incidence(lit_incidence: &[u32], mode: IncidenceMode) -> Incidence {
        let by_occurrence = lit_incidence
            .chunks(2)
            .map(|pair| match *pair {
                [positive, negative] => mode.combine(positive, negative),
                [positive] => mode.combine(positive, 0),
                _ => 0,
            })
            .collect();

        Incidence {
            by_occurrence,
            by_probing: vec![],
        }
    }

    pub fn occurrence(&self, var: Var) -> u32 {
        self.by_occurrence.get(var.index()).cloned().unwrap_or(0)
    }

    pub fn probing(&self, var: Var) -> u32 {
        self.by_probing.get(var.index()).cloned().unwrap_or(0)
    }
}

/// Whether either literal of `var` occurs in a clause.
pub fn occurs(lit_incidence: &[u32], var: Var) -> bool {
    let index = var.index() * 2;
    lit_incidence
        .get(index..index + 2)
        .map_or(false, |pair| pair.iter().any(|&count| count > 0))
}
