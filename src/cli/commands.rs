//! CLI command definitions for swe-submit.
//!
//! Formats benchmark submissions for task instances whose working
//! directories an agent has already modified.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::environment::EnvironmentKind;
use crate::submission::{Submission, SubmissionBridge};
use crate::swebench::{load_instances, swebench_image_name, TaskInstance};

/// Model name used when neither the config file nor `--model` sets one.
const DEFAULT_MODEL_NAME: &str = "gpt-4o";

/// Working directory used when neither the config file nor `--cwd` sets one.
const DEFAULT_CWD: &str = "/testbed";

/// Benchmark submission formatter.
#[derive(Parser)]
#[command(name = "swe-submit")]
#[command(about = "Extract agent patches and format SWE-bench submissions")]
#[command(version)]
#[command(
    long_about = "swe-submit reads the changes an agent made to a task's working directory \
(locally or inside a container) and writes them as SWE-bench prediction records.\n\n\
Example usage:\n  swe-submit submit --config config.yaml --instances instances.jsonl --output preds.jsonl"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Format one submission per task instance.
    Submit(SubmitArgs),

    /// Print the SWE-bench evaluation image for an instance id.
    Image(ImageArgs),
}

/// Arguments for `swe-submit submit`.
#[derive(Parser, Debug)]
pub struct SubmitArgs {
    /// YAML configuration with `model` and `environment` sections.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Task instances: a JSON object, a JSON array, or JSON Lines.
    #[arg(short = 'i', long)]
    pub instances: PathBuf,

    /// Only format these instance ids (repeatable).
    #[arg(long = "instance-id")]
    pub instance_ids: Vec<String>,

    /// Environment kind override (local, docker).
    #[arg(short = 'e', long)]
    pub environment: Option<String>,

    /// Working directory override.
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Model name override.
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Append records to this predictions JSONL file.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Print records as JSON lines instead of key/value rows.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `swe-submit image`.
#[derive(Parser, Debug)]
pub struct ImageArgs {
    /// SWE-bench instance id (e.g. django__django-11099).
    pub instance_id: String,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Runs the command selected by already-parsed arguments.
pub fn run_with_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Submit(args) => run_submit(args),
        Commands::Image(args) => {
            println!("{}", swebench_image_name(&args.instance_id));
            Ok(())
        }
    }
}

fn run_submit(args: SubmitArgs) -> Result<()> {
    let config = build_config(&args)?;
    let instances = select_instances(
        load_instances(&args.instances)
            .with_context(|| format!("Failed to load instances from {}", args.instances.display()))?,
        &args.instance_ids,
    )?;

    let mut output = match &args.output {
        Some(path) => Some(open_predictions(path)?),
        None => None,
    };

    let bridge = SubmissionBridge::new();
    let total = instances.len();
    let mut failed = 0usize;

    for instance in &instances {
        info!(instance_id = %instance.instance_id, "Formatting submission");
        match bridge.format_submission(instance, &config) {
            Ok(submission) => match output.as_mut() {
                Some(file) => {
                    writeln!(file, "{}", submission.to_json_line()?)?;
                    file.flush()?;
                }
                None if args.json => println!("{}", submission.to_json_line()?),
                None => print_rows(&submission),
            },
            Err(e) => {
                failed += 1;
                warn!(instance_id = %instance.instance_id, error = %e, "Submission failed");
            }
        }
    }

    info!(total = total, failed = failed, "Done");
    if failed > 0 {
        bail!("{failed} of {total} submissions failed");
    }
    Ok(())
}

/// Loads the config file and applies overrides, then entry-point defaults.
fn build_config(args: &SubmitArgs) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => BridgeConfig::default(),
    };

    if let Some(model) = &args.model {
        config.model.model_name = Some(model.clone());
    }
    if let Some(cwd) = &args.cwd {
        config.environment.cwd = Some(cwd.clone());
    }
    if let Some(name) = &args.environment {
        EnvironmentKind::from_name(name)?;
        config.environment.environment_class = Some(name.clone());
    }

    Ok(config.with_defaults(DEFAULT_MODEL_NAME, DEFAULT_CWD))
}

fn select_instances(instances: Vec<TaskInstance>, ids: &[String]) -> Result<Vec<TaskInstance>> {
    if ids.is_empty() {
        return Ok(instances);
    }

    let selected: Vec<TaskInstance> = instances
        .into_iter()
        .filter(|instance| ids.contains(&instance.instance_id))
        .collect();

    if selected.is_empty() {
        bail!("None of the requested instance ids were found: {}", ids.join(", "));
    }
    Ok(selected)
}

fn open_predictions(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))
}

fn print_rows(submission: &Submission) {
    for (key, value) in submission.rows() {
        println!("{key:<20}: {value}");
    }
}
