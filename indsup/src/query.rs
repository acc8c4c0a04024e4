//! Determination queries on the duplicated formula.
use indsup_formula::{ExtendFormula, Lit, Var};
use indsup_oracle::{Budget, Oracle, SolveOutcome};

use crate::encode::Linking;
use crate::EngineError;

/// Assumptions forcing each variable to agree with its copy.
pub fn equal_assumptions<'a>(
    linking: &'a Linking,
    vars: impl IntoIterator<Item = &'a Var> + 'a,
) -> impl Iterator<Item = Lit> + 'a {
    vars.into_iter()
        .map(move |&var| linking.indicator(var).negative())
}

/// Add a clause requiring at least one of `vars` to differ from its copy.
///
/// The clause is guarded by a fresh activation literal which is returned and has to be assumed.
/// Afterwards it must be passed to [`retire`].
pub fn differ_any(
    oracle: &mut Oracle,
    linking: &Linking,
    vars: &[Var],
) -> Result<Lit, EngineError> {
    let act = oracle.new_lit();
    let mut clause = Vec::with_capacity(vars.len() + 1);
    clause.push(!act);
    clause.extend(vars.iter().map(|&var| linking.indicator(var).positive()));
    if !oracle.add_clause(&clause) {
        return Err(EngineError::Unsat);
    }
    oracle.freeze(&[act]);
    Ok(act)
}

/// Permanently disable the clause of an activation literal.
///
/// Adding the unit discards the model of the last query.
pub fn retire(oracle: &mut Oracle, act: Lit) -> Result<(), EngineError> {
    if oracle.add_clause(&[!act]) {
        Ok(())
    } else {
        Err(EngineError::Unsat)
    }
}

/// Members of `vars` whose indicator is true in the last model.
pub fn disagreeing(oracle: &Oracle, linking: &Linking, vars: &[Var]) -> Vec<Var> {
    vars.iter()
        .cloned()
        .filter(|&var| oracle.value(linking.indicator(var).positive()) == Some(true))
        .collect()
}

/// Answer of a determination query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Determination {
    /// Every queried variable is determined.
    Determined,
    /// A model in which the listed variables differ from their copies.
    Witness(Vec<Var>),
    /// The budget ran out or the query was interrupted.
    Unknown,
}

impl Determination {
    pub fn is_determined(&self) -> bool {
        *self == Determination::Determined
    }
}

/// Check whether all of `differ` are determined by `equal`.
///
/// A single variable is queried by assuming its indicator, larger groups use an activation
/// clause. Fails if the query shows the formula itself to be unsatisfiable.
pub fn determined(
    oracle: &mut Oracle,
    linking: &Linking,
    equal: &[Var],
    differ: &[Var],
    budget: Budget,
) -> Result<Determination, EngineError> {
    let mut assumptions: Vec<Lit> = equal_assumptions(linking, equal).collect();

    let act = match differ {
        [] => return Ok(Determination::Determined),
        &[var] => {
            assumptions.push(linking.indicator(var).positive());
            None
        }
        _ => {
            let act = differ_any(oracle, linking, differ)?;
            assumptions.push(act);
            Some(act)
        }
    };

    let result = match oracle.solve(&assumptions, budget) {
        SolveOutcome::Unsat if oracle.is_unsat() => return Err(EngineError::Unsat),
        SolveOutcome::Unsat => Determination::Determined,
        SolveOutcome::Sat => Determination::Witness(disagreeing(oracle, linking, differ)),
        SolveOutcome::Unknown => Determination::Unknown,
    };

    if let Some(act) = act {
        retire(oracle, act)?;
    }

    log::trace!(
        "query {} equal, {} differ: {:?}",
        equal.len(),
        differ.len(),
        result
    );

    Ok(result)
}
