use std::{
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use esroll::{Bundle, ExportMode, OutputFormat, config::Config};
use log::{LevelFilter, debug, error};

#[derive(Parser, Debug)]
#[command(author, version, about = "Bundle an ES module graph into one CommonJS file")]
struct Cli {
    /// Entry module
    #[arg(short, long)]
    entry: Option<PathBuf>,

    /// Write the bundle to this file
    #[arg(short, long, conflicts_with = "stdout")]
    output: Option<PathBuf>,

    /// Print the bundle to stdout
    #[arg(long)]
    stdout: bool,

    /// How the entry module's exports are exposed
    #[arg(long, value_enum)]
    exports: Option<ExportMode>,

    /// Output module format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file, applied over the user and project files
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(entry) = cli.entry {
        config.entry = Some(entry);
    }
    if let Some(output) = cli.output {
        config.output = Some(output);
    }
    if cli.stdout {
        config.output = None;
    }
    if let Some(exports) = cli.exports {
        config.exports = exports;
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    debug!("Running with {config:?}");

    let Some(entry) = config.entry.as_deref() else {
        bail!("No entry module given; pass --entry or set `entry` in esroll.toml");
    };
    let bundle = Bundle::build(entry)?;
    let options = config.generate_options();

    match &config.output {
        Some(dest) => bundle.write(dest, &options),
        None => {
            let output = bundle.generate(&options)?;
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", output.code).context("Failed to write bundle to stdout")?;
            stdout.flush().context("Failed to flush stdout")
        }
    }
}
