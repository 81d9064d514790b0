//! # nibrs-cli
//!
//! Command-line interface for the NIBRS flat-file toolkit.
//!
//! Decodes submissions, validates them and writes the fixed-width error
//! report, re-encodes flat files and prints the error catalog.

mod config;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use config::CliConfig;
use nibrs_catalog::Catalog;
use nibrs_flatfile::{DecodeEvent, Decoder, Encoder, ErrorReportWriter};
use nibrs_pipeline::Pipeline;
use nibrs_validation::ReportValidator;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nibrs")]
#[command(about = "NIBRS flat-file decoder and validator")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a submission and write the error report
    Validate {
        /// Input flat file
        input: PathBuf,

        /// Error report path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a submission into JSON lines
    Decode {
        /// Input flat file
        input: PathBuf,

        /// Pretty-print each event
        #[arg(long)]
        pretty: bool,
    },

    /// Decode a submission and write it back as a flat file
    Reformat {
        /// Input flat file
        input: PathBuf,

        /// Output flat file
        output: PathBuf,
    },

    /// Print error catalog entries
    Catalog {
        /// Only this error code
        #[arg(long)]
        code: Option<String>,

        /// Print the codes of a code list instead
        #[arg(long, conflicts_with = "code")]
        list: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };

    match cli.command {
        Commands::Validate { input, output } => validate(&config, &input, output.as_deref()).await,
        Commands::Decode { input, pretty } => decode(&config, &input, pretty),
        Commands::Reformat { input, output } => reformat(&config, &input, &output),
        Commands::Catalog { code, list } => {
            let catalog = config.catalog()?;
            print_catalog(&catalog, code.as_deref(), list.as_deref())
        }
    }
}

/// Logs go to stderr so stdout stays clean for reports.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open(input: &Path) -> Result<BufReader<File>> {
    let file =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    Ok(BufReader::new(file))
}

fn output_writer(output: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    })
}

async fn validate(config: &CliConfig, input: &Path, output: Option<&Path>) -> Result<()> {
    info!("Validating {}", input.display());
    let catalog = config.catalog()?;
    let validator =
        ReportValidator::new(&catalog)?.with_config(config.validation.clone());
    let outcome = Pipeline::new(validator)
        .with_decoder(config.decoder_for(input))
        .with_config(config.pipeline.clone())
        .run(open(input)?)
        .await?;

    ErrorReportWriter::new(catalog)
        .write(output_writer(output)?, &outcome.errors)
        .context("failed to write error report")?;

    let stats = &outcome.stats;
    info!(
        reports = stats.reports,
        failures = stats.failures,
        errors = stats.errors,
        warnings = stats.warnings,
        throughput = stats.throughput(),
        "Validation complete"
    );
    if let Some(path) = output {
        info!("Error report written to {}", path.display());
    }
    Ok(())
}

fn decode(config: &CliConfig, input: &Path, pretty: bool) -> Result<()> {
    let mut decoder = Decoder::new(open(input)?, config.decoder_for(input));
    let mut out = std::io::stdout().lock();
    for event in decoder.by_ref() {
        let json = if pretty {
            serde_json::to_string_pretty(&event)?
        } else {
            serde_json::to_string(&event)?
        };
        writeln!(out, "{json}")?;
    }
    out.flush()?;
    if let Some(error) = decoder.take_error() {
        return Err(error).with_context(|| format!("failed to read {}", input.display()));
    }
    Ok(())
}

fn reformat(config: &CliConfig, input: &Path, output: &Path) -> Result<()> {
    info!("Reformatting {} -> {}", input.display(), output.display());
    let mut decoder = Decoder::new(open(input)?, config.decoder_for(input));
    let mut reports = Vec::new();
    for event in decoder.by_ref() {
        match event {
            DecodeEvent::Report(report) => reports.push(report),
            DecodeEvent::Failure(failure) => warn!(
                identifier = failure.identifier.as_deref().unwrap_or_default(),
                code = %failure.error.code,
                "Skipping report that could not be decoded"
            ),
        }
    }
    if let Some(error) = decoder.take_error() {
        return Err(error).with_context(|| format!("failed to read {}", input.display()));
    }

    let file =
        File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    Encoder::new().write(BufWriter::new(file), &reports)?;
    info!(reports = reports.len(), "Reformat complete");
    Ok(())
}

fn print_catalog(catalog: &Catalog, code: Option<&str>, list: Option<&str>) -> Result<()> {
    let mut out = std::io::stdout().lock();
    if let Some(name) = list {
        let Some(list) = catalog.code_lists.get(name) else {
            bail!("unknown code list: {name}");
        };
        for value in list.codes() {
            writeln!(out, "{value}")?;
        }
        return Ok(());
    }

    let entries: Vec<_> = match code {
        Some(code) => match catalog.errors.get(code) {
            Some(definition) => vec![definition],
            None => bail!("unknown error code: {code}"),
        },
        None => catalog.errors.iter().collect(),
    };
    for definition in entries {
        let severity = if definition.warning { "W" } else { "E" };
        writeln!(out, "{} {severity} {}", definition.code, definition.message)?;
    }
    Ok(())
}
