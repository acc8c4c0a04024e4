use std::sync::atomic::Ordering;

use proptest::prelude::*;

use indsup::{CnfFormula, EngineError, Formula, Minimizer, MinimizerConfig, Var};
use indsup_formula::{cnf_formula, lit, test::defined_formula, var, vars};

/// All models of a small formula, by brute force.
fn models(formula: &CnfFormula) -> Vec<Vec<bool>> {
    let var_count = formula.var_count();
    assert!(var_count <= 16);
    let mut models = vec![];
    for bits in 0u32..(1 << var_count) {
        let assignment: Vec<bool> = (0..var_count).map(|index| bits & (1 << index) != 0).collect();
        let satisfied = formula.iter().all(|clause| {
            clause
                .iter()
                .any(|lit| assignment[lit.index()] == lit.is_positive())
        });
        if satisfied {
            models.push(assignment);
        }
    }
    models
}

/// Whether `target` is determined by `support` in all models.
fn is_determined(models: &[Vec<bool>], support: &[Var], target: &[Var]) -> bool {
    let project = |model: &Vec<bool>, vars: &[Var]| -> Vec<bool> {
        vars.iter().map(|var| model[var.index()]).collect()
    };
    for a in models {
        for b in models {
            if project(a, support) == project(b, support)
                && project(a, target) != project(b, target)
            {
                return false;
            }
        }
    }
    true
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn minimize(formula: &CnfFormula, sampling_set: &[Var], config: MinimizerConfig) -> Vec<Var> {
    init_logging();
    let mut minimizer = Minimizer::new(config);
    minimizer.add_formula(&Formula::from(formula.clone()));
    minimizer
        .set_starting_sampling_set(sampling_set.to_vec())
        .unwrap();
    let report = minimizer.run().unwrap();
    assert!(!report.unsat);
    assert_eq!(report.final_size, minimizer.indep_set().len());
    assert!(report.final_size <= report.orig_size);
    minimizer.indep_set().to_vec()
}

fn sorted(mut vars: Vec<Var>) -> Vec<Var> {
    vars.sort();
    vars
}

#[test]
fn undetermined_variable_is_kept() {
    let formula = cnf_formula![
        1, 2;
        -1, 3;
    ];
    let result = minimize(&formula, &vars![1, 2, 3], MinimizerConfig::default());
    assert!(result.contains(&indsup_formula::var!(3)));
    let models = models(&formula);
    assert!(is_determined(&models, &result, &vars![1, 2, 3]));
}

#[test]
fn constants_and_free_variables() {
    let mut minimizer = Minimizer::default();
    minimizer.add_clause(&[lit!(1)]);
    minimizer.add_clause(&[lit!(2), lit!(-2)]);
    assert_eq!(
        minimizer.set_starting_sampling_set(vars![1, 2].to_vec()),
        Ok(2)
    );
    let report = minimizer.run().unwrap();
    assert_eq!(minimizer.indep_set(), &vars![2]);
    assert_eq!(report.removed_by.zero_assigned, 1);
    assert_eq!(minimizer.empty_occ_vars(), &vars![2]);
}

#[test]
fn equivalent_pair_keeps_one() {
    let formula = cnf_formula![
        1, -2;
        -1, 2;
    ];
    for &(binary_eq_based, probe_based) in [(true, true), (false, false)].iter() {
        let mut config = MinimizerConfig::default();
        config.binary_eq_based = binary_eq_based;
        config.probe_based = probe_based;
        config.verify_final = true;
        let result = minimize(&formula, &vars![1, 2], config);
        assert!(result == vars![1] || result == vars![2]);
        let dropped: Vec<Var> = vars![1, 2]
            .iter()
            .cloned()
            .filter(|var| !result.contains(var))
            .collect();
        assert!(is_determined(&models(&formula), &result, &dropped));
    }
}

#[test]
fn dimacs_sampling_set() {
    init_logging();
    let mut minimizer = Minimizer::default();
    minimizer
        .add_dimacs_cnf(&b"p cnf 4 3\nc ind 1 2 4 0\n1 -2 0\n-1 2 0\n3 4 0\n"[..])
        .unwrap();
    let report = minimizer.run().unwrap();
    assert_eq!(report.orig_size, 3);
    assert_eq!(report.final_size, 2);
    assert!(minimizer.indep_set().contains(&indsup_formula::var!(4)));
}

#[test]
fn out_of_range_sampling_variable() {
    let mut minimizer = Minimizer::default();
    minimizer.add_clause(&[lit!(1), lit!(2)]);
    assert_eq!(
        minimizer.set_starting_sampling_set(vars![1, 3].to_vec()),
        Err(EngineError::VarOutOfRange {
            var: indsup_formula::var!(3),
            var_count: 2
        })
    );
}

#[test]
fn unsat_formula_reports_empty_set() {
    let mut minimizer = Minimizer::default();
    minimizer.add_formula(&Formula::from(cnf_formula![
        1, 2;
        1, -2;
        -1, 2;
        -1, -2;
    ]));
    let report = minimizer.run().unwrap();
    assert!(report.unsat);
    assert!(minimizer.indep_set().is_empty());
    assert_eq!(report.orig_size, 2);
}

#[test]
fn unsat_formula_without_pre_filter() {
    let mut config = MinimizerConfig::default();
    config.zero_assigned_based = false;
    config.probe_based = false;
    config.binary_eq_based = false;

    for &fast_backw in [false, true].iter() {
        config.fast_backw = fast_backw;
        let mut minimizer = Minimizer::new(config.clone());
        minimizer.add_formula(&Formula::from(cnf_formula![
            1, 2, 3;
            1, 2, -3;
            1, -2, 3;
            1, -2, -3;
            -1, 2, 3;
            -1, 2, -3;
            -1, -2, 3;
            -1, -2, -3;
        ]));
        minimizer
            .set_starting_sampling_set(vars![1, 2, 3].to_vec())
            .unwrap();
        let report = minimizer.run().unwrap();
        assert!(report.unsat);
        assert!(minimizer.indep_set().is_empty());
        assert_eq!(report.removed_by.backward, 0);
    }
}

#[test]
fn variable_groups_are_kept_whole() {
    // 5 <-> 1 & 2, 6 <-> 3
    let formula = cnf_formula![
        -5, 1;
        -5, 2;
        5, -1, -2;
        6, -3;
        -6, 3;
        1, 2, 3, 4, 5, 6;
    ];

    for &fast_backw in [false, true].iter() {
        let mut config = MinimizerConfig::default();
        config.fast_backw = fast_backw;
        config.verify_final = true;
        let mut minimizer = Minimizer::new(config);
        minimizer.add_formula(&Formula::from(formula.clone()));
        let groups = vec![
            vars![1, 2].to_vec(),
            vars![3, 4].to_vec(),
            vars![5].to_vec(),
            vars![6].to_vec(),
        ];
        assert_eq!(minimizer.set_variable_groups(groups).unwrap(), 4);

        let report = minimizer.run().unwrap();
        assert_eq!(report.orig_size, 4);
        assert_eq!(report.final_size, 2);
        assert_eq!(sorted(minimizer.indep_groups().to_vec()), vars![1, 3].to_vec());
        assert_eq!(sorted(minimizer.indep_set().to_vec()), vars![1, 2, 3, 4].to_vec());

        let models = models(&formula);
        assert!(is_determined(&models, minimizer.indep_set(), &vars![5, 6]));
    }
}

#[test]
fn overlapping_groups() {
    let mut minimizer = Minimizer::default();
    minimizer.add_formula(&Formula::from(cnf_formula![1, 2, 3;]));
    let result = minimizer.set_variable_groups(vec![vars![1, 2].to_vec(), vars![2, 3].to_vec()]);
    assert_eq!(result, Err(EngineError::OverlappingGroups { var: var!(2) }));
    let result = minimizer.set_variable_groups(vec![vars![1, 4].to_vec()]);
    assert!(result.is_err());
}

#[test]
fn clean_sampling_set_skips_constants() {
    let mut minimizer = Minimizer::default();
    minimizer.add_formula(&Formula::from(cnf_formula![
        1;
        -1, 2;
        3, 4;
    ]));
    assert_eq!(minimizer.start_with_clean_sampling_set(), 2);
    minimizer.run().unwrap();
    assert_eq!(minimizer.orig_sampling_size(), 2);
    assert_eq!(minimizer.indep_set().len(), 2);
}

#[test]
fn xor_constraint_removes_one_variable() {
    let mut minimizer = Minimizer::default();
    minimizer.add_xor_clause(&vars![1, 2, 3], true);
    minimizer.add_clause(&[lit!(4), lit!(1)]);
    minimizer
        .set_starting_sampling_set(vars![1, 2, 3, 4].to_vec())
        .unwrap();
    minimizer.run().unwrap();
    assert_eq!(minimizer.indep_set().len(), 3);
}

/// Pairs `i` and `i + half` are equivalent, with only the query rounds to find this.
fn equivalent_pairs(half: usize) -> (CnfFormula, MinimizerConfig) {
    let mut formula = CnfFormula::new();
    for index in 0..half {
        let a = Var::from_index(index);
        let b = Var::from_index(index + half);
        formula.add_clause(vec![a.positive(), b.negative()]);
        formula.add_clause(vec![a.negative(), b.positive()]);
    }
    let mut config = MinimizerConfig::default();
    config.binary_eq_based = false;
    config.probe_based = false;
    (formula, config)
}

fn sound_for_pairs(result: &[Var], half: usize) -> bool {
    (0..half).all(|index| {
        result.contains(&Var::from_index(index)) || result.contains(&Var::from_index(index + half))
    })
}

#[test]
fn interrupted_before_start() {
    let (formula, config) = equivalent_pairs(30);
    let mut minimizer = Minimizer::new(config);
    minimizer.add_formula(&Formula::from(formula));
    minimizer.start_with_clean_sampling_set();
    minimizer.interrupt_flag().store(true, Ordering::Relaxed);
    let report = minimizer.run().unwrap();
    assert!(report.interrupted);
    assert_eq!(minimizer.indep_set().len(), 60);
}

#[test]
fn interrupted_during_backward_round() {
    let (formula, config) = equivalent_pairs(30);
    let sampling_set: Vec<Var> = (0..60).map(Var::from_index).collect();

    let mut minimizer = Minimizer::new(config.clone());
    minimizer.add_formula(&Formula::from(formula.clone()));
    minimizer.set_starting_sampling_set(sampling_set.clone()).unwrap();
    let report = minimizer.run().unwrap();
    assert!(!report.interrupted);
    let complete = minimizer.indep_set().to_vec();
    assert_eq!(complete.len(), 30);
    assert!(sound_for_pairs(&complete, 30));

    let mut limited = config;
    limited.max_queries = 10;
    let mut minimizer = Minimizer::new(limited);
    minimizer.add_formula(&Formula::from(formula));
    minimizer.set_starting_sampling_set(sampling_set).unwrap();
    let report = minimizer.run().unwrap();
    assert!(report.interrupted);

    let interrupted = minimizer.indep_set().to_vec();
    assert!(sound_for_pairs(&interrupted, 30));
    assert!(complete.iter().all(|var| interrupted.contains(var)));
    assert!(interrupted.len() > complete.len());
    assert!(interrupted.len() >= 50);
    assert_eq!(report.removed_by.backward, 60 - interrupted.len());
}

#[test]
fn flag_set_after_run_is_not_an_interruption() {
    let (formula, config) = equivalent_pairs(4);
    let mut minimizer = Minimizer::new(config);
    minimizer.add_formula(&Formula::from(formula));
    minimizer.start_with_clean_sampling_set();
    let flag = minimizer.interrupt_flag();
    let report = minimizer.run().unwrap();
    flag.store(true, Ordering::Relaxed);
    assert!(!report.interrupted);
    assert_eq!(minimizer.indep_set().len(), 4);
}

#[test]
fn every_round_combination_is_sound() {
    let (formula, base) = equivalent_pairs(6);
    let sampling_set: Vec<Var> = (0..12).map(Var::from_index).collect();

    for &guess in [false, true].iter() {
        for &forward in [false, true].iter() {
            for &fast_backw in [false, true].iter() {
                let mut config = base.clone();
                config.guess = guess;
                config.guess_div = 2;
                config.forward = forward;
                config.forward_group = 2;
                config.fast_backw = fast_backw;
                config.backw_group = 4;
                let result = minimize(&formula, &sampling_set, config);
                assert!(sound_for_pairs(&result, 6));
                assert_eq!(result.len(), 6);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 48, ..ProptestConfig::default() })]

    #[test]
    fn minimized_set_is_sound_and_minimal(
        (inputs, formula) in defined_formula(1..5usize, 0..7usize),
        ordering in prop_oneof![
            Just(indsup::Ordering::Incidence),
            Just(indsup::Ordering::IncidenceThenProbing),
            Just(indsup::Ordering::Community),
            Just(indsup::Ordering::CrossCommunity),
            Just(indsup::Ordering::Random),
        ],
        gate_based in proptest::bool::ANY,
        guess in proptest::bool::ANY,
        forward in proptest::bool::ANY,
    ) {
        let mut config = MinimizerConfig::default();
        config.ordering = ordering;
        config.gate_based = gate_based;
        config.xor_based = gate_based;
        config.guess = guess;
        config.forward = forward;

        let sampling_set: Vec<Var> = (0..formula.var_count()).map(Var::from_index).collect();
        let result = minimize(&formula, &sampling_set, config.clone());
        let models = models(&formula);

        prop_assert!(is_determined(&models, &result, &sampling_set));
        prop_assert!(is_determined(&models, &inputs, &result));

        for &var in result.iter() {
            let rest: Vec<Var> = result.iter().cloned().filter(|&other| other != var).collect();
            prop_assert!(!is_determined(&models, &rest, &[var]));
        }

        // Minimizing again does not change the set.
        let again = minimize(&formula, &result, config);
        prop_assert_eq!(sorted(again), sorted(result));
    }
}
