//! Command-line interface for the redaction pipeline.
//!
//! `redax redact` mirrors the primary detect-and-apply operation;
//! `redax apply` is the secondary trusted-application mode that takes a
//! previously returned (possibly client-edited) audit trail.

use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{Arg, ArgMatches, Command};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use redax::{
    AppliedRedaction, CategoryTable, LopdfEngine, OpenAiClient, RedactionConfig, Redactor,
    SemanticConfig,
};

fn build_cli() -> Command {
    Command::new("redax")
        .about("Detects and destructively redacts legally sensitive text in PDF documents")
        .subcommand_required(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("info")
                .help("Log verbosity"),
        )
        .subcommand(
            Command::new("redact")
                .about("Detect sensitive text, redact it, and emit the audit trail")
                .arg(Arg::new("input").required(true).help("Input PDF path"))
                .arg(
                    Arg::new("output")
                        .long("out")
                        .short('o')
                        .help("Output PDF path (default: <input>_redacted.pdf)"),
                )
                .arg(
                    Arg::new("audit")
                        .long("audit")
                        .help("Write the audit trail as JSON to this path"),
                )
                .arg(
                    Arg::new("categories")
                        .long("categories")
                        .help("YAML category table replacing the built-in California table"),
                )
                .arg(
                    Arg::new("api-key")
                        .long("api-key")
                        .help("Classification service API key (default: $OPENAI_API_KEY)"),
                )
                .arg(
                    Arg::new("model")
                        .long("model")
                        .help("Classification model name"),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_parser(clap::value_parser!(u64))
                        .help("Classification call timeout in seconds"),
                ),
        )
        .subcommand(
            Command::new("apply")
                .about("Apply a caller-supplied redaction set, trusting its geometry")
                .arg(Arg::new("input").required(true).help("Input PDF path"))
                .arg(
                    Arg::new("records")
                        .long("records")
                        .required(true)
                        .help("JSON file holding the redaction records to apply"),
                )
                .arg(
                    Arg::new("output")
                        .long("out")
                        .short('o')
                        .help("Output PDF path (default: <input>_redacted.pdf)"),
                ),
        )
}

fn build_config(matches: &ArgMatches) -> redax::Result<RedactionConfig> {
    let categories = match matches.get_one::<String>("categories") {
        Some(path) => CategoryTable::from_yaml_path(Path::new(path))?,
        None => CategoryTable::california(),
    };

    let mut semantic = SemanticConfig {
        api_key: matches
            .get_one::<String>("api-key")
            .cloned()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_default(),
        ..SemanticConfig::default()
    };
    if let Some(model) = matches.get_one::<String>("model") {
        semantic.model = model.clone();
    }
    if let Some(secs) = matches.get_one::<u64>("timeout") {
        semantic.timeout = Duration::from_secs(*secs);
    }

    Ok(RedactionConfig {
        categories,
        semantic,
    })
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    input.with_file_name(format!("{stem}_redacted.pdf"))
}

async fn run_redact(matches: &ArgMatches) -> redax::Result<()> {
    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output(&input));

    let config = build_config(matches)?;
    let client = OpenAiClient::new(&config.semantic)?;
    let redactor = Redactor::new(LopdfEngine, client, config);

    let report = redactor.redact_document(&input, &output).await?;
    info!(
        total = report.total_redactions,
        output = %report.output_path.display(),
        "redaction complete"
    );

    if let Some(audit) = matches.get_one::<String>("audit") {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| redax::Error::Save(format!("audit serialization: {e}")))?;
        std::fs::write(audit, json)?;
        info!(audit = %audit, "audit trail written");
    }

    println!(
        "{} redaction(s) applied -> {}",
        report.total_redactions,
        report.output_path.display()
    );
    Ok(())
}

async fn run_apply(matches: &ArgMatches) -> redax::Result<()> {
    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output(&input));
    let records_path = matches.get_one::<String>("records").unwrap();

    let raw = std::fs::read_to_string(records_path)?;
    let records: Vec<AppliedRedaction> = serde_json::from_str(&raw)
        .map_err(|e| redax::Error::Config(format!("invalid records file: {e}")))?;

    // Trusted application never talks to the classification service.
    let config = RedactionConfig::default();
    let client = OpenAiClient::new(&config.semantic)?;
    let redactor = Redactor::new(LopdfEngine, client, config);

    let applied = redactor.apply_redactions(&input, &records, &output).await?;
    println!("{applied} redaction(s) applied -> {}", output.display());
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();

    let level = matches
        .get_one::<String>("log-level")
        .map(String::as_str)
        .unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("redax={level}")))
        .init();

    let result = match matches.subcommand() {
        Some(("redact", sub)) => run_redact(sub).await,
        Some(("apply", sub)) => run_apply(sub).await,
        _ => unreachable!("subcommand is required"),
    };

    if let Err(e) = result {
        error!("{e}");
        process::exit(1);
    }
}
