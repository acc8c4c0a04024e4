use std::env;
use std::fs;
use std::io::{self, Read, Write};

use anyhow::Error;
use clap::{value_t, values_t, App, AppSettings, Arg};
use env_logger::{fmt, Builder, Target};
use log::{error, info};
use log::{Level, LevelFilter, Record};

use indsup::dimacs::{write_dimacs, DimacsParser};
use indsup::{Formula, Minimizer, MinimizerConfig, MinimizerConfigUpdate, OracleConfig};

mod config;
mod interrupt;

use config::ConfigUpdates;

fn main() {
    let exit_code = match main_with_err() {
        Err(err) => {
            error!("{}", err);
            1
        }
        Ok(exit_code) => exit_code,
    };
    std::process::exit(exit_code);
}

fn init_logging(verbosity: u64) {
    let format = |buf: &mut fmt::Formatter, record: &Record| {
        if record.level() == Level::Info {
            writeln!(buf, "c {}", record.args())
        } else {
            writeln!(buf, "c {}: {}", record.level(), record.args())
        }
    };

    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = Builder::new();
    builder.target(Target::Stdout).format(format).filter(None, level);

    if let Ok(ref env_var) = env::var("INDSUP_LOG") {
        builder.parse_filters(env_var);
    }

    builder.init();
}

fn banner() {
    info!("This is indsup {}", env!("INDSUP_VERSION"));
    info!(
        "  {} build - {}",
        env!("INDSUP_PROFILE"),
        env!("INDSUP_RUSTC_VERSION")
    );
}

fn main_with_err() -> Result<i32, Error> {
    let matches = App::new("indsup")
        .version(env!("INDSUP_VERSION"))
        .setting(AppSettings::DisableHelpSubcommand)
        .arg_from_usage("[INPUT] 'The input file to use (stdin if omitted)'")
        .arg_from_usage("[config-file] --config=[FILE] 'Read parameters from configuration file'")
        .arg(
            Arg::from_usage("[config-option] -C --config-option")
                .value_name("OPTION>=<VALUE")
                .help(
                    "Specify a single config option, see 'indsup -C help' for a list of options.",
                )
                .multiple(true)
                .number_of_values(1),
        )
        .arg_from_usage("[seed] --seed=[SEED] 'Seed for random orderings'")
        .arg(
            Arg::from_usage("[verb] -v --verb=[LEVEL] 'Verbosity from 0 (quiet) to 3'")
                .default_value("1"),
        )
        .arg_from_usage(
            "[output-file] --output=[FILE] \
             'Write the formula with the minimized sampling set to the specified file'",
        )
        .arg_from_usage(
            "[recompute] --recompute \
             'Start from all non-constant variables, ignoring the sampling set of the input'",
        )
        .get_matches();

    let config_options = values_t!(matches, "config-option", String).unwrap_or_default();

    if config_options.iter().any(|option| option == "help") {
        print!("{}", MinimizerConfig::help());
        println!();
        println!("Oracle options, prefixed with 'oracle.':");
        print!("{}", OracleConfig::help());
        return Ok(0);
    }

    init_logging(value_t!(matches, "verb", u64)?);
    banner();

    let mut updates = ConfigUpdates::default();

    if let Some(config_path) = matches.value_of("config-file") {
        let mut config_contents = String::new();
        fs::File::open(config_path)?.read_to_string(&mut config_contents)?;

        updates.merge_toml(&config_contents)?;
    }

    for config_option in config_options.iter() {
        updates.merge_toml(config_option)?;
    }

    if matches.is_present("seed") {
        let mut seed_update = MinimizerConfigUpdate::new();
        seed_update.seed = Some(value_t!(matches, "seed", u64)?);
        updates.minimizer.merge(seed_update);
    }

    let mut minimizer = Minimizer::default();
    minimizer.configure(&updates.minimizer);
    minimizer.configure_oracle(&updates.oracle);
    info!("Using seed {}", minimizer.config().seed);

    interrupt::install(minimizer.interrupt_flag());

    let stdin = io::stdin();

    let mut locked_stdin;
    let mut opened_file;

    let file = match matches.value_of("INPUT") {
        Some(path) => {
            info!("Reading file '{}'", path);
            opened_file = fs::File::open(path)?;
            &mut opened_file as &mut dyn io::Read
        }
        None => {
            info!("Reading from stdin");
            locked_stdin = stdin.lock();
            &mut locked_stdin as &mut dyn io::Read
        }
    };

    let formula = DimacsParser::parse(file)?;
    info!(
        "Parsed formula with {} variables and {} clauses",
        formula.var_count(),
        formula.cnf.len() + formula.xors.len()
    );

    minimizer.add_formula(&formula);

    if matches.is_present("recompute") {
        let size = minimizer.start_with_clean_sampling_set();
        info!("Recomputing the sampling set, starting from {} variables", size);
    }

    let report = minimizer.run()?;

    if report.unsat {
        println!("s UNSATISFIABLE");
        return Ok(20);
    }

    let stdout = io::stdout();
    let mut locked_stdout = stdout.lock();
    write!(locked_stdout, "v")?;
    for var in minimizer.indep_set() {
        write!(locked_stdout, " {}", var)?;
    }
    writeln!(locked_stdout, " 0")?;
    writeln!(
        locked_stdout,
        "c orig {} final {} reduction {:.2}% time {:.2}s",
        report.orig_size,
        report.final_size,
        report.reduction(),
        report.elapsed.as_secs_f64()
    )?;
    locked_stdout.flush()?;
    drop(locked_stdout);

    if report.interrupted {
        info!("Minimization was interrupted, the set may not be minimal");
    }

    if let Some(path) = matches.value_of("output-file") {
        info!("Writing minimized formula to file '{}'", path);
        let mut target = io::BufWriter::new(fs::File::create(path)?);
        write_dimacs(&mut target, &with_sampling_set(formula, minimizer.indep_set()))?;
        target.flush()?;
    }

    Ok(0)
}

/// Replace the sampling set of a formula.
fn with_sampling_set(mut formula: Formula, vars: &[indsup::Var]) -> Formula {
    formula.sampling_set = Some(vars.to_vec());
    formula
}
