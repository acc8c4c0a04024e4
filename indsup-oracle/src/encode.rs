//! Clausal encodings of XOR and cardinality constraints.
//!
//! Both encodings introduce auxiliary variables through [`ExtendFormula`], so they can target the
//! oracle as well as a plain [`CnfFormula`](indsup_formula::CnfFormula).
use indsup_formula::{ExtendFormula, Lit, Var};

/// Largest number of variables encoded by one chunk of an XOR.
const XOR_CHUNK: usize = 4;

/// Encode `vars[0] ^ vars[1] ^ ... == rhs`.
///
/// Long XORs are cut into chunks. Each chunk but the last XORs three variables into a fresh
/// auxiliary variable which takes their place. A chunk of `k` variables needs `2^(k-1)` clauses.
pub fn encode_xor(target: &mut impl ExtendFormula, vars: &[Var], rhs: bool) {
    let mut vars = vars.to_vec();
    vars.sort_unstable();

    // x ^ x == false
    let mut reduced: Vec<Var> = vec![];
    for var in vars {
        if reduced.last() == Some(&var) {
            reduced.pop();
        } else {
            reduced.push(var);
        }
    }

    while reduced.len() > XOR_CHUNK {
        let aux = target.new_var();
        let mut chunk = reduced.drain(..XOR_CHUNK - 1).collect::<Vec<_>>();
        chunk.push(aux);
        xor_chunk(target, &chunk, false);
        reduced.push(aux);
    }

    xor_chunk(target, &reduced, rhs);
}

/// Forbid every assignment of `vars` with the wrong parity.
fn xor_chunk(target: &mut impl ExtendFormula, vars: &[Var], rhs: bool) {
    let mut clause = Vec::with_capacity(vars.len());
    for assignment in 0..(1usize << vars.len()) {
        if (assignment.count_ones() % 2 == 1) == rhs {
            continue;
        }
        clause.clear();
        clause.extend(
            vars.iter()
                .enumerate()
                .map(|(bit, var)| var.lit(assignment & (1 << bit) == 0)),
        );
        target.add_clause(&clause);
    }
}

/// Value of a counter output during the cardinality encoding.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Signal {
    True,
    False,
    Lit(Lit),
}

/// Encode that at least `cutoff` of `lits` are true.
///
/// With an `output` literal the constraint is reified, so `output` is true exactly when at least
/// `cutoff` literals are true. Uses a sequential counter where every counter output is defined by
/// an equivalence, which keeps the encoding correct in both directions.
pub fn encode_card(
    target: &mut impl ExtendFormula,
    lits: &[Lit],
    cutoff: usize,
    output: Option<Lit>,
) {
    let result = if cutoff == 0 {
        Signal::True
    } else if cutoff > lits.len() {
        Signal::False
    } else {
        // counts[j] says whether at least j of the literals seen so far are true
        let mut counts = vec![Signal::False; cutoff + 1];
        counts[0] = Signal::True;

        for (seen, &lit) in lits.iter().enumerate() {
            let top = cutoff.min(seen + 1);
            for j in (1..=top).rev() {
                counts[j] = counter_step(target, counts[j], counts[j - 1], lit);
            }
        }
        counts[cutoff]
    };

    match (result, output) {
        (Signal::True, None) => (),
        (Signal::False, None) => target.add_clause(&[]),
        (Signal::Lit(lit), None) => target.add_clause(&[lit]),
        (Signal::True, Some(output)) => target.add_clause(&[output]),
        (Signal::False, Some(output)) => target.add_clause(&[!output]),
        (Signal::Lit(lit), Some(output)) => {
            target.add_clause(&[!output, lit]);
            target.add_clause(&[output, !lit]);
        }
    }
}

/// Define `r <-> a | (b & x)`.
fn counter_step(target: &mut impl ExtendFormula, a: Signal, b: Signal, x: Lit) -> Signal {
    match (a, b) {
        (Signal::True, _) => Signal::True,
        (a, Signal::False) => a,
        (Signal::False, Signal::True) => Signal::Lit(x),
        (Signal::False, Signal::Lit(b)) => {
            let r = target.new_lit();
            target.add_clause(&[!b, !x, r]);
            target.add_clause(&[!r, b]);
            target.add_clause(&[!r, x]);
            Signal::Lit(r)
        }
        (Signal::Lit(a), Signal::True) => {
            let r = target.new_lit();
            target.add_clause(&[!a, r]);
            target.add_clause(&[!x, r]);
            target.add_clause(&[!r, a, x]);
            Signal::Lit(r)
        }
        (Signal::Lit(a), Signal::Lit(b)) => {
            let r = target.new_lit();
            target.add_clause(&[!a, r]);
            target.add_clause(&[!b, !x, r]);
            target.add_clause(&[!r, a, b]);
            target.add_clause(&[!r, a, x]);
            Signal::Lit(r)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indsup_formula::{CardConstraint, CnfFormula, XorClause};

    /// Whether some assignment of the variables above `inputs` satisfies `formula`, for each
    /// assignment of the first `inputs` variables.
    fn projected_models(formula: &CnfFormula, inputs: usize) -> Vec<bool> {
        let total = formula.var_count().max(inputs);
        let mut result = vec![false; 1 << inputs];
        let mut assignment = vec![false; total];
        for bits in 0..(1usize << total) {
            for (index, value) in assignment.iter_mut().enumerate() {
                *value = bits & (1 << index) != 0;
            }
            let satisfied = formula.iter().all(|clause| {
                clause
                    .iter()
                    .any(|lit| assignment[lit.index()] == lit.is_positive())
            });
            if satisfied {
                result[bits & ((1 << inputs) - 1)] = true;
            }
        }
        result
    }

    fn input_assignment(bits: usize, inputs: usize) -> Vec<bool> {
        (0..inputs).map(|index| bits & (1 << index) != 0).collect()
    }

    #[test]
    fn xor_matches_parity() {
        for len in 0..8 {
            for &rhs in [false, true].iter() {
                let vars = (0..len).map(Var::from_index).collect::<Vec<_>>();
                let mut formula = CnfFormula::new();
                formula.set_var_count(len);
                encode_xor(&mut formula, &vars, rhs);

                let xor = XorClause::new(vars.clone(), rhs);
                let models = projected_models(&formula, len);
                for (bits, &model) in models.iter().enumerate() {
                    assert_eq!(model, xor.is_satisfied(&input_assignment(bits, len)));
                }
            }
        }
    }

    #[test]
    fn xor_cancels_repeated_vars() {
        let mut formula = CnfFormula::new();
        formula.set_var_count(2);
        encode_xor(&mut formula, &vars![1, 2, 1], true);

        assert_eq!(formula, cnf_formula![2;]);
    }

    #[test]
    fn cardinality_matches_count() {
        for len in 0..5 {
            for cutoff in 0..=len + 1 {
                for &reified in [false, true].iter() {
                    let lits = (0..len)
                        .map(|index| Lit::from_index(index, index % 2 == 0))
                        .collect::<Vec<_>>();
                    let output = if reified {
                        Some(Lit::from_index(len, true))
                    } else {
                        None
                    };
                    let inputs = len + reified as usize;

                    let mut formula = CnfFormula::new();
                    formula.set_var_count(inputs);
                    encode_card(&mut formula, &lits, cutoff, output);

                    let card = CardConstraint {
                        lits: lits.clone(),
                        cutoff,
                        output,
                    };
                    let models = projected_models(&formula, inputs);
                    for (bits, &model) in models.iter().enumerate() {
                        assert_eq!(
                            model,
                            card.is_satisfied(&input_assignment(bits, inputs)),
                            "len {} cutoff {} reified {} bits {:b}",
                            len,
                            cutoff,
                            reified,
                            bits
                        );
                    }
                }
            }
        }
    }
}
