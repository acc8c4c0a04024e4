//! Structural queries over the irredundant clauses.
//!
//! These never look at learned clauses, so their results only depend on the clauses added to the
//! oracle.
use partial_ref::{partial, PartialRef};
use rustc_hash::{FxHashMap, FxHashSet};

use indsup_formula::{Lit, Var, XorClause};

use crate::context::{parts::*, Context};

/// Largest clause length considered when recovering XOR constraints.
const MAX_XOR_LEN: usize = 5;

/// A gate definition `output <-> inputs[0] & inputs[1] & ...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AndGate {
    pub output: Lit,
    pub inputs: Vec<Lit>,
}

/// Invoke `f` on every irredundant clause: units, then binary, then long clauses.
pub fn for_each_irred_clause(
    ctx: &partial!(Context, BinaryClausesP, ClauseDbP),
    mut f: impl FnMut(&[Lit]),
) {
    let db = ctx.part(ClauseDbP);
    for &unit in db.units() {
        f(&[unit]);
    }
    for binary in ctx.part(BinaryClausesP).irred() {
        f(binary);
    }
    for clause in db.irred_clauses() {
        f(clause);
    }
}

/// Number of irredundant clauses containing each literal, indexed by literal code.
pub fn lit_incidence(
    ctx: &partial!(Context, BinaryClausesP, ClauseDbP),
    var_count: usize,
) -> Vec<u32> {
    let mut incidence = vec![0; var_count * 2];
    for_each_irred_clause(ctx, |clause| {
        for &lit in clause {
            incidence[lit.code()] += 1;
        }
    });
    incidence
}

/// Equivalent literals from strongly connected components of the binary implication graph.
///
/// Returns pairs `(representative, lit)` where the representative is the positive literal of the
/// smallest variable in its component. Returns `None` if some literal is equivalent to its
/// negation.
pub fn binary_equivalences(
    ctx: &partial!(Context, BinaryClausesP),
    var_count: usize,
) -> Option<Vec<(Lit, Lit)>> {
    let mut implications = vec![vec![]; var_count * 2];
    for &[a, b] in ctx.part(BinaryClausesP).irred() {
        implications[(!a).code()].push(b.code());
        implications[(!b).code()].push(a.code());
    }

    let component = strongly_connected_components(&implications);

    for index in 0..var_count {
        if component[index * 2] == component[index * 2 + 1] {
            return None;
        }
    }

    let mut members: FxHashMap<usize, Vec<Lit>> = FxHashMap::default();
    for (code, &id) in component.iter().enumerate() {
        members.entry(id).or_default().push(Lit::from_code(code));
    }

    let mut equivalences = vec![];
    for lits in members.values() {
        // Codes are visited in increasing order, so the first literal has the smallest variable
        let representative = lits[0];
        if lits.len() < 2 || representative.is_negative() {
            continue;
        }
        for &lit in &lits[1..] {
            equivalences.push((representative, lit));
        }
    }
    equivalences.sort_unstable();
    Some(equivalences)
}

/// Tarjan's algorithm without recursion. Returns a component id for each node.
fn strongly_connected_components(edges: &[Vec<usize>]) -> Vec<usize> {
    const UNVISITED: usize = usize::max_value();

    let node_count = edges.len();
    let mut index = vec![UNVISITED; node_count];
    let mut lowlink = vec![0; node_count];
    let mut on_stack = vec![false; node_count];
    let mut component = vec![UNVISITED; node_count];

    let mut next_index = 0;
    let mut next_component = 0;
    let mut stack = vec![];
    let mut call_stack: Vec<(usize, usize)> = vec![];

    for root in 0..node_count {
        if index[root] != UNVISITED {
            continue;
        }
        call_stack.push((root, 0));
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(&(node, edge)) = call_stack.last() {
            if let Some(&target) = edges[node].get(edge) {
                let top = call_stack.len() - 1;
                call_stack[top].1 += 1;
                if index[target] == UNVISITED {
                    index[target] = next_index;
                    lowlink[target] = next_index;
                    next_index += 1;
                    stack.push(target);
                    on_stack[target] = true;
                    call_stack.push((target, 0));
                } else if on_stack[target] {
                    lowlink[node] = lowlink[node].min(index[target]);
                }
                continue;
            }

            call_stack.pop();
            if let Some(&(parent, _)) = call_stack.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[node]);
            }

            if lowlink[node] == index[node] {
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component[member] = next_component;
                    if member == node {
                        break;
                    }
                }
                next_component += 1;
            }
        }
    }

    component
}

/// Gate definitions of the form `o <-> !l1 & ... & !lk` found as a long clause `o | l1 | ... | lk`
/// together with the binary clauses `!o | !li`.
pub fn and_gates(ctx: &partial!(Context, BinaryClausesP, ClauseDbP)) -> Vec<AndGate> {
    let binaries = ctx
        .part(BinaryClausesP)
        .irred()
        .iter()
        .map(|&[a, b]| if a < b { [a, b] } else { [b, a] })
        .collect::<FxHashSet<_>>();

    let has_binary = |a: Lit, b: Lit| binaries.contains(&if a < b { [a, b] } else { [b, a] });

    let mut gates = vec![];

    for clause in ctx.part(ClauseDbP).irred_clauses() {
        for (position, &output) in clause.iter().enumerate() {
            let others = clause
                .iter()
                .enumerate()
                .filter(|&(other_position, _)| other_position != position)
                .map(|(_, &lit)| lit);
            if others.clone().all(|lit| has_binary(!output, !lit)) {
                gates.push(AndGate {
                    output,
                    inputs: others.map(|lit| !lit).collect(),
                });
            }
        }
    }

    gates
}

/// XOR constraints over up to five variables recovered from complete sets of clauses.
///
/// A set of `2^(k-1)` clauses over the same `k` variables, forbidding every assignment of one
/// parity, is equivalent to an XOR constraint.
pub fn xor_constraints(ctx: &partial!(Context, BinaryClausesP, ClauseDbP)) -> Vec<XorClause> {
    let mut by_vars: FxHashMap<Vec<Var>, FxHashSet<usize>> = FxHashMap::default();

    for_each_irred_clause(ctx, |clause| {
        if clause.len() < 2 || clause.len() > MAX_XOR_LEN {
            return;
        }
        let mut lits = clause.to_vec();
        lits.sort_unstable();
        // Bit i is set if the literal of the i-th smallest variable is negative
        let mask = lits
            .iter()
            .enumerate()
            .fold(0, |mask, (bit, lit)| mask | ((lit.is_negative() as usize) << bit));
        let vars = lits.iter().map(|lit| lit.var()).collect();
        by_vars.entry(vars).or_default().insert(mask);
    });

    let mut xors = vec![];

    for (vars, masks) in by_vars {
        let needed = 1 << (vars.len() - 1);
        let even = masks
            .iter()
            .filter(|mask| mask.count_ones() % 2 == 0)
            .count();
        let odd = masks.len() - even;

        // A clause with mask m forbids the assignment m, so all even masks leave odd parity.
        if even == needed {
            xors.push(XorClause::new(vars, true));
        } else if odd == needed {
            xors.push(XorClause::new(vars, false));
        }
    }

    xors.sort_unstable_by(|a, b| a.vars.cmp(&b.vars));
    xors
}

#[cfg(test)]
mod tests {
    use super::*;

    use partial_ref::IntoPartialRefMut;

    use crate::context::set_var_count;
    use crate::load::load_clause;

    fn loaded(var_count: usize, clauses: &[&[Lit]]) -> Context {
        let mut ctx = Context::default();
        {
            let mut ctx = ctx.into_partial_ref_mut();
            set_var_count(ctx.borrow(), var_count);
            for clause in clauses {
                load_clause(ctx.borrow(), clause);
            }
        }
        ctx
    }

    #[test]
    fn incidence_counts_irredundant_clauses() {
        let mut ctx = loaded(3, &cnf![1; -1, 2; 1, 2, -3;]);
        let mut ctx = ctx.into_partial_ref_mut();

        let incidence = lit_incidence(&ctx.borrow(), 3);
        assert_eq!(incidence, vec![2, 1, 2, 0, 0, 1]);
    }

    #[test]
    fn equivalence_cycle() {
        let mut ctx = loaded(4, &cnf![-1, 2; -2, -3; 3, 1; 4, 1;]);
        let mut ctx = ctx.into_partial_ref_mut();

        let equivalences = binary_equivalences(&ctx.borrow(), 4).unwrap();
        assert_eq!(equivalences, vec![(lit!(1), lit!(2)), (lit!(1), lit!(-3))]);
    }

    #[test]
    fn contradictory_equivalence() {
        let mut ctx = loaded(2, &cnf![-1, 2; -2, -1; 1, 2; -2, 1;]);
        let mut ctx = ctx.into_partial_ref_mut();

        assert_eq!(binary_equivalences(&ctx.borrow(), 2), None);
    }

    #[test]
    fn and_and_or_gates() {
        // 3 <-> 1 & 2, -4 <-> -1 & -2
        let mut ctx = loaded(
            4,
            &cnf![
                -3, 1; -3, 2; 3, -1, -2;
                4, -1; 4, -2; -4, 1, 2;
            ],
        );
        let mut ctx = ctx.into_partial_ref_mut();

        let gates = and_gates(&ctx.borrow());
        assert!(gates.contains(&AndGate {
            output: lit!(3),
            inputs: lits![1, 2].to_vec(),
        }));
        assert!(gates.contains(&AndGate {
            output: lit!(-4),
            inputs: lits![-1, -2].to_vec(),
        }));
    }

    #[test]
    fn recovers_xors() {
        let mut ctx = loaded(
            5,
            &cnf![
                // 1 ^ 2 ^ 3 == true
                1, 2, 3; 1, -2, -3; -1, 2, -3; -1, -2, 3;
                // 4 ^ 5 == false
                -4, 5; 4, -5;
                // incomplete
                1, 4, 5;
            ],
        );
        let mut ctx = ctx.into_partial_ref_mut();

        let xors = xor_constraints(&ctx.borrow());
        assert_eq!(
            xors,
            vec![
                XorClause::new(vars![1, 2, 3].to_vec(), true),
                XorClause::new(vars![4, 5].to_vec(), false),
            ]
        );

        for xor in xors.iter() {
            for bits in 0..32usize {
                let assignment = (0..5).map(|i| bits & (1 << i) != 0).collect::<Vec<_>>();
                let clauses_hold = cnf![1, 2, 3; 1, -2, -3; -1, 2, -3; -1, -2, 3; -4, 5; 4, -5;]
                    .iter()
                    .filter(|clause| clause.iter().all(|lit| xor.vars.contains(&lit.var())))
                    .all(|clause| {
                        clause
                            .iter()
                            .any(|lit| assignment[lit.index()] == lit.is_positive())
                    });
                assert_eq!(clauses_hold, xor.is_satisfied(&assignment));
            }
        }
    }
}
