mod report;

use anyhow::{Context, Result, bail};
use argtree::{Command, TriggerHook};
use argtree_metadata::CommandSchema;
use clap::{Parser, Subcommand};
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::{EnvFilter, fmt};

use crate::report::{CheckReport, ParseReport};

#[derive(Parser)]
#[command(name = "argtree")]
#[command(version, about = "Check and try out argtree command definitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a command definition and report registration errors
    Check(CheckArgs),

    /// Parse tokens against a command definition
    Parse(ParseArgs),

    /// Print the built command tree as JSON
    Inspect(InspectArgs),
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the JSON command definition
    #[arg(value_name = "FILE")]
    schema: PathBuf,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the JSON command definition
    #[arg(value_name = "FILE")]
    schema: PathBuf,

    /// Tokens to parse, given after `--`
    #[arg(last = true, value_name = "TOKENS")]
    tokens: Vec<String>,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Parser)]
struct InspectArgs {
    /// Path to the JSON command definition
    #[arg(value_name = "FILE")]
    schema: PathBuf,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => check_command(args),
        Commands::Parse(args) => parse_command(args),
        Commands::Inspect(args) => inspect_command(args),
    }
}

fn load_schema(path: &Path) -> Result<CommandSchema> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    CommandSchema::from_json(&json)
        .with_context(|| format!("failed to parse schema: {}", path.display()))
}

fn build_command(path: &Path) -> Result<Command> {
    let schema = load_schema(path)?;
    schema
        .build()
        .with_context(|| format!("invalid command definition: {}", path.display()))
}

fn check_command(args: CheckArgs) -> Result<ExitCode> {
    tracing::debug!("executing check command");

    let cmd = build_command(&args.schema)?;
    let (commands, arg_count) = count_tree(&cmd);
    let report = CheckReport {
        schema: args.schema.display().to_string(),
        commands,
        args: arg_count,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!(
            "OK: {} ({} command(s), {} argument(s))",
            cmd.name(),
            report.commands,
            report.args
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn count_tree(cmd: &Command) -> (usize, usize) {
    cmd.subcommands()
        .iter()
        .map(count_tree)
        .fold((1, cmd.args().len()), |(c, a), (cc, ca)| (c + cc, a + ca))
}

/// Logs triggers; rendering is out of scope for this tool.
struct LogTriggers;

impl TriggerHook for LogTriggers {
    fn help(&mut self, command: &Command, path: &[String]) {
        tracing::info!(
            command = %path.join(" "),
            subcommands = command.subcommands().len(),
            "help requested"
        );
    }

    fn version(&mut self, command: &Command, path: &[String]) {
        tracing::info!(
            command = %path.join(" "),
            version = command.version().unwrap_or_default(),
            "version requested"
        );
    }
}

fn parse_command(args: ParseArgs) -> Result<ExitCode> {
    tracing::debug!(tokens = args.tokens.len(), "executing parse command");

    if args.output.as_deref() == Some(args.schema.as_path()) {
        bail!("refusing to overwrite the schema with the report");
    }
    let cmd = build_command(&args.schema)?;
    let report = ParseReport::from(cmd.parse_with_hook(&args.tokens, &mut LogTriggers));
    let json = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory: {}", parent.display()))?;
            }
            fs::write(path, &json)
                .with_context(|| format!("failed to write report: {}", path.display()))?;
            eprintln!("Report: {}", path.display());
        }
        None => println!("{json}"),
    }

    if report.is_error() {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn inspect_command(args: InspectArgs) -> Result<ExitCode> {
    tracing::debug!("executing inspect command");

    let cmd = build_command(&args.schema)?;
    let snapshot = CommandSchema::from_command(&cmd);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
