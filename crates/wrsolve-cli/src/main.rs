use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};
use wrsolve_core::CycleDefinition;
use wrsolve_highs::HighsBackend;
use wrsolve_solver::{SolveEngine, SolveResult, SolverConfig};

const TRACE_ENV: &str = "WRSOLVE_TRACE";
const FORMAT_ENV: &str = "WRSOLVE_LOG_FORMAT";
const FILE_ENV: &str = "WRSOLVE_LOG_FILE";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Solve water-rights allocation cycles and diagnose infeasible ones"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve one cycle through the strategy cascade
    Solve(SolveArgs),
    /// Solve one cycle and always write an infeasibility report on failure
    Diagnose(DiagnoseArgs),
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Cycle definition (name, cycle, variables, constraints, weights) as JSON
    #[arg(long)]
    input: PathBuf,

    /// Solver configuration as JSON; defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for trace and model dump files
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    /// Per-solve time limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,
}

#[derive(Parser, Debug)]
struct SolveArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Write the full result as JSON here instead of printing a summary
    #[arg(long)]
    output: Option<PathBuf>,

    /// Exit with an error when the cycle has no accepted solution
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct DiagnoseArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Infeasibility report destination
    #[arg(long, default_value = "infeasibility.json")]
    output: PathBuf,

    /// Constraint names searched first
    #[arg(long = "priority", value_delimiter = ',')]
    priority: Vec<String>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;
    let cli = Cli::parse();
    match cli.command {
        Command::Solve(args) => solve_command(args),
        Command::Diagnose(args) => diagnose_command(args),
    }
}

fn solve_command(args: SolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.common)?;
    let mut engine = open_engine(&args.common, config)?;
    let result = engine.solve()?;
    engine.close();

    match &args.output {
        Some(path) => write_json(path, &result)?,
        None => print_result(&result),
    }
    if args.strict {
        result.ensure_success()?;
    }
    Ok(())
}

fn diagnose_command(args: DiagnoseArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.common)?;
    if !args.priority.is_empty() {
        config = config.with_iis_priority(args.priority.iter().cloned());
    }
    let mut engine = open_engine(&args.common, config)?;
    let result = engine.solve_with_infeasibility_analysis(&args.output)?;
    engine.close();

    print_result(&result);
    if !result.is_success() {
        println!("infeasibility report: {}", args.output.display());
    }
    Ok(())
}

fn open_engine(
    common: &CommonArgs,
    config: SolverConfig,
) -> Result<SolveEngine<HighsBackend>, Box<dyn std::error::Error>> {
    let definition: CycleDefinition = read_json(&common.input)?;
    let mut engine = SolveEngine::new(HighsBackend::new(), config)?;
    engine.initialize()?;
    engine.load_cycle(definition)?;
    Ok(engine)
}

fn load_config(common: &CommonArgs) -> Result<SolverConfig, Box<dyn std::error::Error>> {
    let mut config = match &common.config {
        Some(path) => read_json::<SolverConfig>(path)?,
        None => SolverConfig::new(),
    };
    if let Some(dir) = &common.diagnostics {
        config = config.with_diagnostics_dir(dir.clone());
    }
    if let Some(limit) = common.time_limit {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(boxed_input_error("time-limit must be a positive number"));
        }
        config = config.with_time_limit(limit);
    }
    Ok(config)
}

fn print_result(result: &SolveResult) {
    println!(
        "{} cycle {}: {} ({:.3} ms)",
        result.model,
        result.cycle.inner(),
        result.status.as_str(),
        result.solve_time_ms
    );
    if let Some(objective) = result.objective {
        println!("objective: {objective}");
    }
    println!(
        "{:<6} {:<14} {:>10} {:>10} {:>12}",
        "tag", "status", "tolerance", "violations", "duration_ms"
    );
    for attempt in &result.attempts {
        println!(
            "{:<6} {:<14} {:>10.0e} {:>10} {:>12.3}",
            attempt.tag,
            attempt.status.status.as_str(),
            attempt.primal_tolerance,
            attempt.violations,
            attempt.duration_ms,
        );
    }
    for note in &result.notes {
        println!("{note}");
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn std::error::Error>> {
    let file = File::open(path)
        .map_err(|err| boxed_input_error(&format!("cannot open {}: {err}", path.display())))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Installs a global subscriber driven by `WRSOLVE_TRACE`, `WRSOLVE_LOG_FORMAT`
/// and `WRSOLVE_LOG_FILE`. Logging stays off unless `WRSOLVE_TRACE` is set.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }
    let level = std::env::var(TRACE_ENV).unwrap_or_else(|_| "off".to_string());
    let format = std::env::var(FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());
    let file = std::env::var(FILE_ENV).ok().map(PathBuf::from);
    install_subscriber(&level, &format, file.as_deref())
}

fn build_filter(level: &str) -> Result<EnvFilter, Box<dyn std::error::Error>> {
    if level.trim().eq_ignore_ascii_case("off") {
        return Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()));
    }
    EnvFilter::try_new(level)
        .map_err(|err| boxed_input_error(&format!("invalid {TRACE_ENV} value '{level}': {err}")))
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn stderr_layer(format: &str) -> Result<BoxedLayer, Box<dyn std::error::Error>> {
    match format.trim().to_ascii_lowercase().as_str() {
        "json" => Ok(fmt::layer().with_writer(std::io::stderr).json().boxed()),
        "pretty" => Ok(fmt::layer().with_writer(std::io::stderr).pretty().boxed()),
        other => Err(boxed_input_error(&format!(
            "invalid {FORMAT_ENV} value '{other}', expected 'json' or 'pretty'"
        ))),
    }
}

fn install_subscriber(
    level: &str,
    format: &str,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = build_filter(level)?;
    let mut layers = vec![stderr_layer(format)?];
    if let Some(path) = file {
        let log_file = OpenOptions::new().create(true).append(true).open(path)?;
        layers.push(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(log_file))
                .with_ansi(false)
                .boxed(),
        );
    }
    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;
    Ok(())
}

fn boxed_input_error(message: &str) -> Box<dyn std::error::Error> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        message.to_string(),
    ))
}
