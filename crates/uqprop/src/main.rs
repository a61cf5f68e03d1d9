use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use uqprop_core::{
    DistributionKind, Exploration, ExplorationReport, QuantifyRequest, UncertaintyEngine,
};

mod demo;
mod logging;
mod run_config;

use demo::CoffeeCup;
use logging::init_logging;
use run_config::RunConfig;

#[derive(Parser, Debug)]
#[command(name = "uqprop")]
#[command(about = "Uncertainty quantification for the coffee cup cooling model")]
struct Args {
    /// YAML run configuration (engine settings, parameters, correlation)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Number of evaluation threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Drop failed model evaluations instead of aborting
    #[arg(long)]
    allow_incomplete: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propagate uncertainty once and print the result
    Quantify {
        /// pc, mc or custom
        #[arg(long, default_value = "pc")]
        method: String,
        #[arg(long, default_value = "regression")]
        pc_method: String,
        /// Decorrelate dependent parameters
        #[arg(long)]
        rosenblatt: bool,
        /// One isolated run per uncertain parameter
        #[arg(long)]
        single: bool,
        /// Comma-separated parameter names (default: all with distributions)
        #[arg(long, value_delimiter = ',')]
        uncertain: Vec<String>,
    },
    /// Sweep distribution widths for every parameter
    Explore {
        /// uniform or normal
        #[arg(long, default_value = "uniform")]
        kind: String,
        #[arg(long, value_delimiter = ',', default_values_t = [0.01, 0.05, 0.1, 0.2])]
        intervals: Vec<f64>,
        #[arg(long, default_value = "pc")]
        method: String,
    },
    /// Compare Monte Carlo sample counts against a polynomial chaos run
    CompareMc {
        #[arg(long, value_delimiter = ',', default_values_t = [50, 100, 500, 1000])]
        samples: Vec<usize>,
    },
}

/// JSON shape of one exploration entry.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum ReportEntry<'a> {
    Ok(&'a uqprop_core::QuantifyOutput),
    Error(String),
}

fn report_json(report: &ExplorationReport) -> BTreeMap<&str, ReportEntry<'_>> {
    report
        .entries
        .iter()
        .map(|(label, entry)| {
            let entry = match entry {
                Ok(output) => ReportEntry::Ok(output),
                Err(err) => ReportEntry::Error(err.to_string()),
            };
            (label.as_str(), entry)
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let _guard = init_logging(&args.log_level, args.log_file.as_deref())?;

    let mut run_config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    if args.seed.is_some() {
        run_config.engine.seed = args.seed;
    }
    if let Some(workers) = args.workers {
        run_config.engine.workers = workers;
    }
    if args.allow_incomplete {
        run_config.engine.allow_incomplete = true;
    }

    let space = run_config.build_space()?;
    let engine = UncertaintyEngine::new(CoffeeCup::new(), space, run_config.engine.clone())?
        .with_features(CoffeeCup::features());

    match args.command {
        Command::Quantify {
            method,
            pc_method,
            rosenblatt,
            single,
            uncertain,
        } => {
            let mut request = QuantifyRequest::parse(&method, &pc_method)?
                .rosenblatt(rosenblatt)
                .single(single);
            if !uncertain.is_empty() {
                request.uncertain_parameters = Some(uncertain);
            }
            let output = engine.quantify(&request)?;
            print_json(&output)?;
        }
        Command::Explore {
            kind,
            intervals,
            method,
        } => {
            let kind: DistributionKind = kind.parse()?;
            let request = QuantifyRequest::parse(&method, "regression")?;
            let mut exploration = Exploration::new(engine);
            let report = exploration.explore_parameters(&[(kind, intervals)], &request);
            print_json(&report_json(&report))?;
        }
        Command::CompareMc { samples } => {
            let exploration = Exploration::new(engine);
            let report = exploration.compare_mc(&samples, &QuantifyRequest::default());
            print_json(&report_json(&report))?;
        }
    }

    tracing::info!("uqprop finished");
    Ok(())
}
