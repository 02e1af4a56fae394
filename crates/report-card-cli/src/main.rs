mod settings;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use report_card_core::{known_types, load_config, render_report, OutputFormat, Runner};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::settings::Settings;

const DEFAULT_CONFIG: &str = "report-card.yml";

#[derive(Parser, Debug)]
#[command(
    name = "report-card",
    author,
    version,
    about = "Score a project against a declarative list of checks"
)]
struct Cli {
    /// Report card configuration file (relative paths resolve against --root)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Project directory the checks run against
    #[arg(long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Optional settings file providing defaults for the options above
    #[arg(long, value_name = "FILE", global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every configured check and print the report card
    Run {
        /// Emit the report as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// List the supported check types and their config keys
    ListChecks {
        /// Emit check types as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(cli.settings.as_deref())?;
    match cli.command.unwrap_or(Commands::Run { json: false }) {
        Commands::Run { json } => {
            let root = cli
                .root
                .or_else(|| settings.root.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let config = cli
                .config
                .or_else(|| settings.config.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
            let format = if json {
                OutputFormat::Json
            } else {
                settings.output_format()?.unwrap_or(OutputFormat::Human)
            };
            run(&root, &config, format)?
        }
        Commands::ListChecks { json } => list_checks(json)?,
    }
    Ok(())
}

fn run(root: &Path, config_path: &Path, format: OutputFormat) -> Result<()> {
    let config_path = root.join(config_path);
    debug!(config = %config_path.display(), "loading report card configuration");
    let config = load_config(&config_path)?;
    let card = Runner::new(root)
        .run(&config)
        .with_context(|| format!("report card run aborted for {}", root.display()))?;
    print!("{}", render_report(&card, format)?);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn list_checks(json: bool) -> Result<()> {
    let types = known_types();
    if json {
        println!("{}", serde_json::to_string_pretty(&types)?);
        return Ok(());
    }

    println!("{} check type(s) available", types.len());
    for info in types {
        let aliases = if info.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aka {})", info.aliases.join(", "))
        };
        println!(
            "- {tag:<22} keys: {keys}{aliases}",
            tag = info.tag,
            keys = info.fields.join(", "),
            aliases = aliases
        );
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
