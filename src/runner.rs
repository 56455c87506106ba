use std::path::PathBuf;

use clap::{ArgAction, Args, Command, FromArgMatches as _};
use log::{info, LevelFilter};

use crate::context::Context;
use crate::error::EpigridError;
use crate::log::{set_log_level, set_module_filters};
use crate::parameters::{load_parameters, Parameters};
use crate::random::ContextRandomExt;
use crate::report::ContextReportExt;
use crate::simulation::ContextSimulationExt;
use crate::statistics::ContextStatisticsExt;

/// Command line arguments of the simulator
#[derive(Args, Debug, Clone, PartialEq)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path to a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional directory for the statistics reports; no reports are written without it
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Prefix for the report file names
    #[arg(long, default_value = "")]
    pub file_prefix: String,

    /// Overwrite existing report files
    #[arg(short, long)]
    pub force_overwrite: bool,

    /// Stop after this many ticks even if the epidemic is not over
    #[arg(short = 't', long, default_value = "1000")]
    pub max_ticks: usize,

    /// Log level, either a single level (`debug`) or a list of `module=level` filters
    #[arg(long)]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            output_dir: None,
            file_prefix: String::new(),
            force_overwrite: false,
            max_ticks: 1000,
            log_level: None,
            verbose: 0,
        }
    }
}

fn create_epigrid_cli() -> Command {
    let cli = Command::new("epigrid");
    BaseArgs::augment_args(cli)
}

type LogLevels = (Option<LevelFilter>, Vec<(String, LevelFilter)>);

/// Parses a `--log-level` value: a bare level sets the global level, `module=level` entries set
/// module filters. Entries are separated by commas.
fn parse_log_levels(spec: &str) -> Result<LogLevels, EpigridError> {
    let parse_level = |level: &str| {
        level.trim().parse::<LevelFilter>().map_err(|_| {
            EpigridError::ConfigError(format!("invalid log level \"{}\"", level.trim()))
        })
    };

    let mut global = None;
    let mut modules = Vec::new();
    for entry in spec.split(',').filter(|entry| !entry.trim().is_empty()) {
        match entry.split_once('=') {
            Some((module, level)) => {
                modules.push((module.trim().to_string(), parse_level(level)?));
            }
            None => global = Some(parse_level(entry)?),
        }
    }
    Ok((global, modules))
}

fn verbosity_level(verbose: u8) -> Option<LevelFilter> {
    match verbose {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    }
}

fn configure_logging(args: &BaseArgs) -> Result<(), EpigridError> {
    let (global, modules) = match &args.log_level {
        Some(spec) => parse_log_levels(spec)?,
        None => (None, Vec::new()),
    };
    let level = match (global, verbosity_level(args.verbose)) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    if let Some(level) = level {
        set_log_level(level);
    } else if !modules.is_empty() {
        // Module filters only show anything if the root logger is enabled.
        set_log_level(LevelFilter::Error);
    }
    if !modules.is_empty() {
        let filters: Vec<(&str, LevelFilter)> = modules
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        set_module_filters(&filters);
    }
    Ok(())
}

/// Runs a simulation configured from the command line.
///
/// # Errors
/// Returns an error if argument parsing, loading the parameters, or opening the reports fails
pub fn run_with_args() -> Result<Context, Box<dyn std::error::Error>> {
    let matches = create_epigrid_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    run_with_args_internal(args)
}

/// Builds, runs and returns the simulation described by `args`.
///
/// # Errors
/// Returns an error if loading the parameters or opening the reports fails
pub fn run_with_args_internal(args: BaseArgs) -> Result<Context, Box<dyn std::error::Error>> {
    configure_logging(&args)?;

    let parameters = match &args.config {
        Some(path) => {
            info!("loading parameters from {}", path.display());
            load_parameters(path)?
        }
        None => Parameters::default(),
    };

    let mut context = Context::new();
    context.init_random(args.random_seed);
    context.init_simulation(parameters)?;

    if let Some(output_dir) = &args.output_dir {
        context
            .report_options()
            .directory(output_dir)
            .file_prefix(args.file_prefix.as_str())
            .overwrite(args.force_overwrite);
        context.add_statistics_reports()?;
    }

    let steps = context.run_simulation(args.max_ticks);
    // Record the state the last step left behind.
    context.collect_statistics();
    info!(
        "simulation {} after {steps} ticks",
        if context.is_running() { "stopped" } else { "finished" }
    );
    Ok(context)
}
