//! Removal of determined variables without determination queries.
//!
//! Runs before the formula is duplicated. Constant variables are removed outright. A variable
//! defined by others (equivalences, gates, XORs) is only removed while all defining variables are
//! still in the working set, these are then pinned so they cannot be removed by a definition
//! themselves. This keeps the definitions acyclic, so every removed variable is a function of the
//! remaining ones.
use indsup_formula::{Lit, Var};
use indsup_oracle::{Budget, ProbeReport, SolveOutcome};

use crate::group::Groups;
use crate::state::EngineState;
use crate::EngineError;

/// Working set of the pre-filter.
///
/// Contains all members of the groups in the support set. Members of groups with more than one
/// variable are locked, such groups are never removed here.
struct Filter {
    in_set: Vec<bool>,
    pinned: Vec<bool>,
    locked: Vec<bool>,
}

impl Filter {
    fn new(support: &[Var], groups: &Groups) -> Filter {
        let members = groups.expand(support);
        let len = members.iter().map(|var| var.index() + 1).max().unwrap_or(0);
        let mut in_set = vec![false; len];
        for &var in members.iter() {
            in_set[var.index()] = true;
        }
        let mut locked = vec![false; len];
        for &var in support.iter().filter(|&&var| groups.is_proper(var)) {
            for &member in groups.members(&var) {
                locked[member.index()] = true;
            }
        }
        Filter {
            in_set,
            pinned: vec![false; len],
            locked,
        }
    }

    fn contains(&self, var: Var) -> bool {
        self.in_set.get(var.index()).cloned().unwrap_or(false)
    }

    fn remove_constant(&mut self, var: Var) -> bool {
        if self.contains(var) && !self.locked[var.index()] {
            self.in_set[var.index()] = false;
            true
        } else {
            false
        }
    }

    fn remove_defined(&mut self, var: Var, defining: &[Var]) -> bool {
        if !self.contains(var) || self.pinned[var.index()] || self.locked[var.index()] {
            return false;
        }
        if defining
            .iter()
            .any(|&other| other == var || !self.contains(other))
        {
            return false;
        }
        self.in_set[var.index()] = false;
        for &other in defining {
            self.pinned[other.index()] = true;
        }
        true
    }

    /// Remove one side of an equivalence.
    fn remove_equivalent(&mut self, a: Lit, b: Lit) -> bool {
        self.remove_defined(b.var(), &[a.var()]) || self.remove_defined(a.var(), &[b.var()])
    }
}

/// Run all enabled pre-filter steps on the support set.
///
/// `probe` is the result of a probing pass run during the analysis, if any.
pub fn prefilter(state: &mut EngineState, probe: Option<&ProbeReport>) -> Result<(), EngineError> {
    let mut filter = Filter::new(state.support(), &state.groups);

    if state.config.backbone_simpl {
        let found = backbone(state)?;
        for &lit in found.iter() {
            if filter.remove_constant(lit.var()) {
                state.removed_by.backbone += 1;
            }
        }
    }

    if state.config.zero_assigned_based {
        let units = state.oracle.zero_assigned().map_err(|_| EngineError::Unsat)?;
        for &lit in units.iter() {
            if filter.remove_constant(lit.var()) {
                state.removed_by.zero_assigned += 1;
            }
        }
    }

    if state.config.probe_based {
        if let Some(report) = probe {
            for &lit in report.failed.iter() {
                if filter.remove_constant(lit.var()) {
                    state.removed_by.probing += 1;
                }
            }
            for &(a, b) in report.equivalences.iter() {
                if filter.remove_equivalent(a, b) {
                    state.removed_by.probing += 1;
                }
            }
        }
    }

    if state.config.binary_eq_based {
        let equivalences = state
            .oracle
            .binary_equivalences()
            .map_err(|_| EngineError::Unsat)?;
        for &(a, b) in equivalences.iter() {
            if filter.remove_equivalent(a, b) {
                state.removed_by.binary_eq += 1;
            }
        }
    }

    if state.config.gate_based {
        let mut inputs = vec![];
        for gate in state.oracle.and_gates() {
            inputs.clear();
            inputs.extend(gate.inputs.iter().map(|lit| lit.var()));
            if filter.remove_defined(gate.output.var(), &inputs) {
                state.removed_by.gates += 1;
            }
        }
    }

    if state.config.xor_based {
        let mut others = vec![];
        for xor in state.oracle.xor_constraints() {
            let mut vars = xor.vars.clone();
            // Prefer removing variables late in the ordering.
            vars.sort_by_key(|&var| std::cmp::Reverse(state.ranking.position(var)));
            for &var in vars.iter() {
                others.clear();
                others.extend(xor.vars.iter().cloned().filter(|&other| other != var));
                if filter.remove_defined(var, &others) {
                    state.removed_by.xors += 1;
                    break;
                }
            }
        }
    }

    state.check_unsat()?;

    let support: Vec<_> = state
        .support()
        .iter()
        .cloned()
        .filter(|&var| filter.contains(var))
        .collect();

    log::info!(
        "pre-filter removed {} variables, {} remain",
        state.support().len() - support.len(),
        support.len()
    );

    state.set_support(support);

    Ok(())
}

/// Find backbone literals of support variables and add them as units.
///
/// Every query runs with the backbone conflict budget, variables whose query runs out of budget
/// are skipped.
pub fn backbone(state: &mut EngineState) -> Result<Vec<Lit>, EngineError> {
    let budget = Budget::conflicts(state.config.backbone_max_confl);

    match state.oracle.solve(&[], budget) {
        SolveOutcome::Unsat => return Err(EngineError::Unsat),
        SolveOutcome::Unknown => {
            log::warn!("backbone search skipped, initial query exceeded its budget");
            return Ok(vec![]);
        }
        SolveOutcome::Sat => (),
    }

    let mut candidates: Vec<Option<Lit>> = state
        .support()
        .iter()
        .map(|&var| state.oracle.value(var.positive()).map(|value| var.lit(value)))
        .collect();

    let constant = state.oracle.zero_assigned().map_err(|_| EngineError::Unsat)?;
    let mut is_constant = vec![false; state.oracle.var_count()];
    for lit in constant {
        is_constant[lit.index()] = true;
    }

    let mut found = vec![];
    let mut unknown = 0;

    for index in 0..candidates.len() {
        if state.interrupted() {
            break;
        }
        let lit = match candidates[index] {
            Some(lit) if is_constant[lit.index()] => {
                // Already a unit, possibly learned by the first query
                found.push(lit);
                continue;
            }
            Some(lit) => lit,
            None => continue,
        };

        match state.oracle.solve(&[!lit], budget) {
            SolveOutcome::Unsat => {
                if !state.oracle.add_clause(&[lit]) {
                    return Err(EngineError::Unsat);
                }
                found.push(lit);
            }
            SolveOutcome::Sat => {
                for candidate in candidates[index..].iter_mut() {
                    if let Some(other) = *candidate {
                        if state.oracle.value(other) == Some(false) {
                            *candidate = None;
                        }
                    }
                }
            }
            SolveOutcome::Unknown => unknown += 1,
        }
    }

    log::info!(
        "backbone: {} literals found, {} queries out of budget",
        found.len(),
        unknown
    );

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{atomic::AtomicBool, Arc};

    use indsup_formula::CnfFormula;
    use indsup_oracle::Oracle;

    use crate::config::MinimizerConfig;

    fn state(formula: CnfFormula, config: MinimizerConfig) -> EngineState {
        let mut oracle = Oracle::default();
        for clause in formula.iter() {
            oracle.add_clause(clause);
        }
        let support = (0..formula.var_count()).map(Var::from_index).collect();
        EngineState::new(config, oracle, support, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn constants_are_removed() {
        let mut state = state(
            cnf_formula![
                1;
                -1, 2;
                3, 4;
            ],
            MinimizerConfig::default(),
        );
        prefilter(&mut state, None).unwrap();
        assert_eq!(state.support(), &vars![3, 4]);
        assert_eq!(state.removed_by.zero_assigned, 2);
    }

    #[test]
    fn equivalence_chain_keeps_one() {
        let mut state = state(
            cnf_formula![
                1, -2;
                -1, 2;
                2, -3;
                -2, 3;
                3, 4, 5;
            ],
            MinimizerConfig::default(),
        );
        prefilter(&mut state, None).unwrap();
        let support = state.support().to_vec();
        assert_eq!(support.len(), 3);
        assert!(support.contains(&var!(4)) && support.contains(&var!(5)));
        assert_eq!(state.removed_by.binary_eq, 2);
    }

    #[test]
    fn gates_need_their_inputs() {
        let formula = cnf_formula![
            -3, 1;
            -3, 2;
            3, -1, -2;
        ];
        let mut config = MinimizerConfig::default();
        config.gate_based = true;

        let mut full = state(formula.clone(), config.clone());
        prefilter(&mut full, None).unwrap();
        assert_eq!(full.support(), &vars![1, 2]);
        assert_eq!(full.removed_by.gates, 1);

        // Without its inputs in the support set the output is not determined.
        let mut partial = state(formula, config);
        partial.set_support(vars![1, 3].to_vec());
        prefilter(&mut partial, None).unwrap();
        assert_eq!(partial.support(), &vars![1, 3]);
    }

    #[test]
    fn xor_removes_one_variable() {
        let formula = cnf_formula![
            1, 2, 3;
            1, -2, -3;
            -1, 2, -3;
            -1, -2, 3;
        ];
        let mut config = MinimizerConfig::default();
        config.xor_based = true;
        let mut state = state(formula, config);
        prefilter(&mut state, None).unwrap();
        assert_eq!(state.support().len(), 2);
        assert_eq!(state.removed_by.xors, 1);
    }

    #[test]
    fn backbone_literals() {
        let mut config = MinimizerConfig::default();
        config.backbone_simpl = true;
        config.zero_assigned_based = false;
        let mut state = state(
            cnf_formula![
                1, 2;
                1, -2;
                3, 4;
            ],
            config,
        );
        prefilter(&mut state, None).unwrap();
        assert_eq!(state.support(), &vars![2, 3, 4]);
        assert_eq!(state.removed_by.backbone, 1);
    }

    #[test]
    fn backbone_reports_units() {
        let mut config = MinimizerConfig::default();
        config.backbone_simpl = true;
        let mut state = state(
            cnf_formula![
                1;
                -1, 2;
                3, 4;
            ],
            config,
        );
        let found = backbone(&mut state).unwrap();
        assert_eq!(found, lits![1, 2].to_vec());
    }

    #[test]
    fn groups_are_removed_whole() {
        let mut state = state(
            cnf_formula![
                1;
                2, -3;
                -2, 3;
                4, 5;
            ],
            MinimizerConfig::default(),
        );
        state.groups = Groups::new(vec![vars![1, 4].to_vec(), vars![2, 5].to_vec()]).unwrap();
        state.set_support(vars![1, 2, 3].to_vec());
        prefilter(&mut state, None).unwrap();
        // 3 is defined by the member 2 of the kept group
        assert_eq!(state.support(), &vars![1, 2]);
        assert_eq!(state.removed_by.zero_assigned, 0);
        assert_eq!(state.removed_by.binary_eq, 1);
    }

    #[test]
    fn unsat_formula() {
        let mut state = state(
            cnf_formula![
                1, 2;
                1, -2;
                -1, 2;
                -1, -2;
            ],
            MinimizerConfig::default(),
        );
        let mut probe_oracle = state.oracle.clone();
        assert!(probe_oracle.probe().is_err());
        assert_eq!(state.oracle.zero_assigned(), Ok(vec![]));
        let mut config = MinimizerConfig::default();
        config.backbone_simpl = true;
        state.config = config;
        assert_eq!(prefilter(&mut state, None), Err(EngineError::Unsat));
    }
}
