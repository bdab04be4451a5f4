//! Binary entry point for the cachesim CLI.
#![forbid(unsafe_code)]

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::Color;
use tracing_subscriber::EnvFilter;

use cachesim::config::{AdmissionKind, PolicyKind, ScaffoldedDecision, SimulatorConfig, TraceFormat};
use cachesim::driver::SimulationDriver;
use cachesim::reader;
use cachesim::Result;

#[derive(Parser, Debug)]
#[command(
    name = "sim",
    version,
    about = "Trace-driven cache simulator",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(long, global = true, action = clap::ArgAction::SetTrue, help = "Disable colored output")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a trace against a cache and report miss ratio and throughput.
    Run(RunArgs),
    /// Print working-set-size statistics for a trace without simulating.
    Wss(WssArgs),
    /// Emit shell completion scripts.
    Completions { shell: clap_complete::Shell },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(value_name = "TRACE")]
    trace_path: PathBuf,

    #[arg(long, value_enum, help = "Trace format; auto-detected from suffix if omitted")]
    trace_type: Option<TraceTypeArg>,

    #[arg(long, help = "Cache capacity in bytes")]
    cache_size: u64,

    #[arg(long, value_enum, default_value_t = PolicyArg::Lru, help = "Eviction policy")]
    algo: PolicyArg,

    #[arg(long, help = "Reader params: key=value(,key=value)*")]
    reader_params: Option<String>,

    #[arg(long, value_enum, default_value_t = AdmissionArg::None, help = "Admission gate")]
    admission: AdmissionArg,

    #[arg(long, default_value_t = 0, help = "Warmup duration in trace-time seconds")]
    warmup: u64,

    #[arg(long, default_value_t = 3600, help = "Interval report period in trace-time seconds")]
    report_interval: u64,

    #[arg(long, help = "Spatial sampling ratio in [0,1]")]
    sample_ratio: Option<f64>,

    #[arg(long, action = clap::ArgAction::SetTrue, help = "Treat every object as size 1")]
    ignore_obj_size: bool,

    #[arg(long, help = "Append the summary line to this file")]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct WssArgs {
    #[arg(value_name = "TRACE")]
    trace_path: PathBuf,

    #[arg(long, value_enum)]
    trace_type: Option<TraceTypeArg>,

    #[arg(long, help = "Reader params: key=value(,key=value)*")]
    reader_params: Option<String>,

    #[arg(long, default_value_t = 1, help = "Sampling scale factor for the distinct-object scan")]
    scale: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TraceTypeArg {
    Csv,
    Txt,
    Binary,
    Vscsi,
    Twitter,
    TwitterNs,
    OracleGeneral,
    OracleSysTwrns,
    Valpin,
    Lcs,
}

impl From<TraceTypeArg> for TraceFormat {
    fn from(value: TraceTypeArg) -> Self {
        match value {
            TraceTypeArg::Csv => TraceFormat::Csv,
            TraceTypeArg::Txt => TraceFormat::PlainText,
            TraceTypeArg::Binary => TraceFormat::Binary,
            TraceTypeArg::Vscsi => TraceFormat::Vscsi,
            TraceTypeArg::Twitter => TraceFormat::TwitterCache,
            TraceTypeArg::TwitterNs => TraceFormat::TwitterCacheNs,
            TraceTypeArg::OracleGeneral => TraceFormat::OracleGeneral,
            TraceTypeArg::OracleSysTwrns => TraceFormat::OracleSysTwrNs,
            TraceTypeArg::Valpin => TraceFormat::Valpin,
            TraceTypeArg::Lcs => TraceFormat::Lcs,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Lru,
    Lfu,
    ScaffoldedLru,
    ScaffoldedFifo,
    ScaffoldedLfu,
}

impl From<PolicyArg> for PolicyKind {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Lru => PolicyKind::Lru,
            PolicyArg::Lfu => PolicyKind::FrequencyLfu,
            PolicyArg::ScaffoldedLru => PolicyKind::Scaffolded(ScaffoldedDecision::Lru),
            PolicyArg::ScaffoldedFifo => PolicyKind::Scaffolded(ScaffoldedDecision::Fifo),
            PolicyArg::ScaffoldedLfu => PolicyKind::Scaffolded(ScaffoldedDecision::Lfu),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AdmissionArg {
    None,
    BloomFilter,
    Prob,
    Size,
    SizeProb,
    AdaptSize,
}

impl From<AdmissionArg> for AdmissionKind {
    fn from(value: AdmissionArg) -> Self {
        match value {
            AdmissionArg::None => AdmissionKind::None,
            AdmissionArg::BloomFilter => AdmissionKind::BloomFilter,
            AdmissionArg::Prob => AdmissionKind::Probabilistic,
            AdmissionArg::Size => AdmissionKind::Size,
            AdmissionArg::SizeProb => AdmissionKind::SizeProbabilistic,
            AdmissionArg::AdaptSize => AdmissionKind::AdaptSize,
        }
    }
}

/// A quiet, best-effort progress spinner: absent under `--quiet` or when
/// stderr isn't a terminal, so piped/logged output stays clean.
fn spinner(label: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .expect("valid template")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Some(pb)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", Color::Red.paint("error"));
            tracing::error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => run(args, cli.quiet),
        Command::Wss(args) => wss(args, cli.quiet),
        Command::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let mut config = SimulatorConfig::new(&args.trace_path, args.cache_size);
    if let Some(trace_type) = args.trace_type {
        config.trace_format = trace_type.into();
    }
    if let Some(params) = &args.reader_params {
        config.reader = cachesim::config::parse_reader_params(params)?;
    }
    config.policy = args.algo.into();
    config.admission = args.admission.into();
    config.warmup_seconds = args.warmup;
    config.report_interval_seconds = args.report_interval;
    config.sampler_ratio = args.sample_ratio;
    config.reader.ignore_obj_size = args.ignore_obj_size;
    config.output_path = args.output;

    if !quiet {
        println!(
            "{} replaying {} against a {} cache",
            Color::Cyan.paint("sim"),
            config.trace_path.display(),
            Color::Yellow.paint(format!("{:?}", config.policy)),
        );
    }

    let driver = SimulationDriver::new(config)?;
    let pb = spinner("simulating", quiet);
    let summary = driver.run()?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    if !quiet {
        println!(
            "{}: {} requests, {:.4} miss ratio, {:.2} MQPS",
            Color::Green.paint("done"),
            summary.req_count,
            summary.miss_ratio,
            summary.throughput_mqps,
        );
    }
    Ok(())
}

fn wss(args: WssArgs, quiet: bool) -> Result<()> {
    let mut config = SimulatorConfig::new(&args.trace_path, 0);
    if let Some(trace_type) = args.trace_type {
        config.trace_format = trace_type.into();
    }
    if let Some(params) = &args.reader_params {
        config.reader = cachesim::config::parse_reader_params(params)?;
    }

    let mut reader = reader::open(&config)?;
    let pb = spinner("scanning working set", quiet);
    let wss = reader.working_set_size(args.scale)?;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    let disable_metadata = reader.should_disable_metadata()?;

    if quiet {
        println!("{wss}");
    } else {
        println!(
            "{}: {} distinct objects observed (scale {}), metadata {}",
            Color::Cyan.paint("wss"),
            wss,
            args.scale,
            if disable_metadata { "disabled" } else { "present" },
        );
    }
    Ok(())
}
