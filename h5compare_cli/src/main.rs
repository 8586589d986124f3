mod report;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::{Parser, ValueEnum};
use h5compare_common::{load_config, AppConfig, ContainerGroup, DiffRecord, H5CompareError};
use h5compare_core::{open_container, ContainerFormat, DiffEngine, DiffOptions};
use report::{build_json_report, TextReporter};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: h5compare <file1> <file2>";

/// Exit status when the comparison found differences and `--fail-on-diff` is set
const EXIT_DIFFERENCES: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "h5compare")]
#[command(author = "H5Compare Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Structural and value comparison of hierarchical data files", long_about = None)]
struct Cli {
    /// First file
    file1: PathBuf,

    /// Second file
    file2: PathBuf,

    /// Output the report as JSON
    #[arg(long)]
    json: bool,

    /// Disable ANSI colors in text output
    #[arg(long)]
    no_color: bool,

    /// Hide datasets whose values are identical
    #[arg(short = 'd', long)]
    diff_only: bool,

    /// Report children of unrecognized kind and keep comparing
    #[arg(short = 'k', long)]
    keep_going: bool,

    /// Compare declared attribute types on groups as well as datasets
    #[arg(long)]
    group_attr_types: bool,

    /// Exit with status 2 when differences are found
    #[arg(long)]
    fail_on_diff: bool,

    /// Container format of both inputs
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Auto,
    Snapshot,
    Hdf5,
}

impl From<FormatArg> for ContainerFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => ContainerFormat::Auto,
            FormatArg::Snapshot => ContainerFormat::Snapshot,
            FormatArg::Hdf5 => ContainerFormat::Hdf5,
        }
    }
}

impl Cli {
    /// Command-line flags only ever switch settings on
    fn apply_to(&self, config: &mut AppConfig) {
        config.keep_going |= self.keep_going;
        config.group_attr_types |= self.group_attr_types;
        config.fail_on_diff |= self.fail_on_diff;
        config.diff_only |= self.diff_only;
    }
}

fn main() {
    // Logs go to stderr so the report on stdout stays clean
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
            _ => {
                debug!("Argument error: {}", e);
                println!("{}", USAGE);
                std::process::exit(1);
            }
        },
    };

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            println!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let loaded = load_config(false).context("Failed to load configuration")?;
    debug!(
        "Using config {} (exists: {})",
        loaded.path.display(),
        loaded.exists
    );
    let mut config = loaded.config;
    cli.apply_to(&mut config);

    let format = ContainerFormat::from(cli.format);
    let root_a = open_input(&cli.file1, format)?;
    let root_b = open_input(&cli.file2, format)?;

    let label_a = cli.file1.display().to_string();
    let label_b = cli.file2.display().to_string();
    let engine = DiffEngine::new().with_options(DiffOptions::from(&config));

    let summary = if cli.json {
        let records: Vec<DiffRecord> = engine
            .diff_to_vec(root_a.as_ref(), root_b.as_ref())
            .map_err(log_fatal)?;
        let report = build_json_report(&label_a, &label_b, records, config.diff_only);
        println!("{}", serde_json::to_string_pretty(&report)?);
        report.summary
    } else {
        let use_color = !cli.no_color && std::io::stdout().is_terminal();
        let mut reporter = TextReporter::new(std::io::stdout().lock(), &label_a, &label_b)
            .with_diff_only(config.diff_only)
            .with_color(use_color);
        reporter.header();
        engine
            .diff(root_a.as_ref(), root_b.as_ref(), &mut reporter)
            .map_err(log_fatal)?;
        reporter.finish().context("Failed to write report")?
    };

    if config.fail_on_diff && summary.has_differences() {
        Ok(EXIT_DIFFERENCES)
    } else {
        Ok(0)
    }
}

fn open_input(path: &Path, format: ContainerFormat) -> anyhow::Result<Box<dyn ContainerGroup>> {
    open_container(path, format).map_err(|e| {
        if let H5CompareError::FileOpen { reason, .. } = &e {
            warn!("{}: {}", path.display(), reason);
        }
        anyhow::Error::from(e)
    })
}

fn log_fatal(e: H5CompareError) -> anyhow::Error {
    error!("Comparison aborted: {}", e);
    anyhow::Error::from(e)
}
