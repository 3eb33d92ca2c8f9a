//! Intent Router Command Line Interface
//!
//! # Usage
//!
//! ```bash
//! # Answer one query (needs GEMINI_API_KEY)
//! router_cli ask "Add a new product: Gaming Laptop, price: 1500"
//!
//! # Answer one query per stdin line against the same in-memory store
//! printf 'Add a product named X\nHow many products are there?\n' | router_cli ask
//!
//! # Validate raw completion text offline
//! echo '```json {"tool": "weather", "action": "get"} ```' | router_cli extract
//!
//! # Show how an entity noun resolves
//! router_cli normalize Category
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, BufRead, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use intent_router::database::{is_wildcard, normalize, EntityScope};
use intent_router::{extract, IntentRouter, RouterConfig, RouterResponse};

#[derive(Parser)]
#[command(name = "router_cli")]
#[command(version)]
#[command(about = "Route natural-language queries to weather lookups and record operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "pretty", value_enum)]
    format: OutputFormat,

    /// YAML configuration file (overrides ROUTER_CONFIG)
    #[arg(long, short, global = true, env = "ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a query (reads one query per stdin line if omitted)
    Ask {
        query: Option<String>,
    },

    /// Extract and validate an instruction from raw completion text
    Extract {
        /// Input file (reads stdin if not provided)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Resolve an entity noun to its storage tag
    Normalize {
        entity: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask { query } => cmd_ask(cli.config, query, cli.format).await,
        Commands::Extract { file } => cmd_extract(file, cli.format),
        Commands::Normalize { entity } => cmd_normalize(&entity, cli.format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn load_config(path: Option<PathBuf>) -> Result<RouterConfig> {
    let mut config = match path {
        Some(path) => RouterConfig::from_yaml_file(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RouterConfig::default(),
    };
    config.apply_env(std::env::vars());
    config.validate()?;
    Ok(config)
}

async fn build_router(config: RouterConfig) -> Result<IntentRouter> {
    #[allow(unused_mut)]
    let mut builder = IntentRouter::builder(config.clone());

    #[cfg(feature = "database")]
    if let Some(pg_config) =
        intent_router::database::PgStoreConfig::from_store_config(&config.store)
    {
        let store = intent_router::database::PgRecordStore::connect(&pg_config).await?;
        store.ensure_schema().await?;
        builder = builder.store(std::sync::Arc::new(store));
    }

    Ok(builder.build()?)
}

async fn cmd_ask(
    config: Option<PathBuf>,
    query: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let router = build_router(load_config(config)?).await?;

    if let Some(query) = query {
        return answer(&router, &query, format).await;
    }

    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        if format == OutputFormat::Pretty {
            println!("{} {}", ">".cyan().bold(), line.trim());
        }
        if let Err(e) = answer(&router, line.trim(), format).await {
            eprintln!("{}: {:#}", "error".red().bold(), e);
        }
    }
    Ok(())
}

async fn answer(router: &IntentRouter, query: &str, format: OutputFormat) -> Result<()> {
    match router.handle(query).await {
        Ok(response) => print_response(&response, format),
        Err(e) => {
            tracing::debug!(error = %e, "Query failed");
            anyhow::bail!(e.user_message())
        }
    }
}

fn print_response(response: &RouterResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Pretty => {
            println!("{}", response.response_text.green());
            if let Some(data) = &response.structured_data {
                println!("{}", serde_json::to_string_pretty(data)?.dimmed());
            }
        }
    }
    Ok(())
}

fn cmd_extract(file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let raw = read_input(file)?;
    let instruction = extract(&raw)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&instruction)?),
        OutputFormat::Pretty => {
            let status = if instruction.is_dispatchable() {
                "DISPATCHABLE".green().bold()
            } else {
                "INSUFFICIENT".yellow().bold()
            };
            println!("{} tool={} action={}", status, instruction.tool, instruction.action);
            if let Some(missing) = &instruction.missing_info {
                println!("  missing:  {}", missing);
            }
            if let Some(guidance) = &instruction.guided_response {
                println!("  guidance: {}", guidance);
            }
            println!("{}", serde_json::to_string_pretty(&instruction.parameters)?);
        }
    }
    Ok(())
}

fn cmd_normalize(entity: &str, format: OutputFormat) -> Result<()> {
    let scope = EntityScope::resolve(Some(entity));
    let tag = normalize(Some(entity));
    let wildcard = is_wildcard(entity);

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "entity": entity,
                "tag": tag,
                "wildcard": wildcard,
                "label": scope.label(),
            })
        ),
        OutputFormat::Pretty => match scope.tag() {
            Some(tag) => println!("{} -> {}", entity, tag.green()),
            None => println!("{} -> {}", entity, "(all records)".yellow()),
        },
    }
    Ok(())
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("reading stdin")?;
            Ok(buffer)
        }
    }
}
