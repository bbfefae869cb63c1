//! formassist CLI
//!
//! Commands:
//!   suggest      - Suggest a value for one field
//!   autofill     - Generate values for several fields
//!   availability - Probe the local model
//!   order        - Show the resolved provider order

use clap::{Parser, Subcommand};
use formassist::{AssistConfig, AssistEngine, AssistError, AssistResult, FormContext, ProviderKind};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formassist")]
#[command(about = "AI field suggestions and autofill against configured providers")]
#[command(version)]
struct Cli {
    /// Custom server base URL (overrides FORMASSIST_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Comma-separated provider order, e.g. "custom-server,openai"
    #[arg(long)]
    order: Option<String>,

    /// Per-provider timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest a value for one field
    Suggest {
        /// Field name
        field: String,

        /// What the user has typed so far
        #[arg(default_value = "")]
        value: String,

        /// Other form values as key=value
        #[arg(short, long = "context")]
        context: Vec<String>,
    },

    /// Generate values for several fields
    Autofill {
        /// Field names
        #[arg(required = true)]
        fields: Vec<String>,

        /// Values already entered, as key=value
        #[arg(short, long = "context")]
        context: Vec<String>,
    },

    /// Probe the local model
    Availability,

    /// Show the resolved provider order
    Order,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("formassist=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_context(pairs: &[String]) -> AssistResult<FormContext> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), serde_json::Value::from(v.trim())))
                .ok_or_else(|| AssistError::Config(format!("Expected key=value, got '{}'", pair)))
        })
        .collect()
}

fn load_config(cli: &Cli) -> AssistResult<AssistConfig> {
    let mut config = AssistConfig::from_env()?;

    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(timeout) = cli.timeout_ms {
        config.request_timeout_ms = timeout;
    }
    if let Some(order) = &cli.order {
        config.execution_order = order
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|name| {
                ProviderKind::parse(name)
                    .ok_or_else(|| AssistError::Config(format!("Unknown provider: {}", name.trim())))
            })
            .collect::<AssistResult<Vec<_>>>()?;
    }

    Ok(config)
}

fn print_json(value: &impl serde::Serialize) -> AssistResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AssistError::Runtime(format!("Failed to render output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

async fn run(cli: Cli) -> AssistResult<()> {
    let config = load_config(&cli)?;
    // No in-process model outside a host application
    let engine = AssistEngine::builder().config(config).build();

    match cli.command {
        Commands::Suggest { field, value, context } => {
            let context = parse_context(&context)?;
            let suggestion = engine.suggest_value(&field, &value, context).await;
            print_json(&serde_json::json!({ "field": field, "suggestion": suggestion }))
        }
        Commands::Autofill { fields, context } => {
            let context = parse_context(&context)?;
            let progress: formassist::ProgressCallback = Arc::new(|p: f64| {
                eprintln!("[download] {:.1}%", p);
            });
            let values = engine.autofill(&fields, context, Some(progress)).await;
            print_json(&values)
        }
        Commands::Availability => print_json(&engine.check_availability().await),
        Commands::Order => print_json(&engine.execution_order()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
