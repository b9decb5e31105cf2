//! SBGUARD CLI
//!
//! Command-line interface for checking URLs and messages against Safe Browsing.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sbguard_core::{Action, SafebrowsingConfig};
use sbguard_extract::MessagePart;
use sbguard_lookup::{LookupOrchestrator, LookupOutcome, MessageExaminer, SkipReason};

/// SBGUARD - Safe Browsing URL checks for mail filtering
#[derive(Parser)]
#[command(name = "sbguard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

/// Settings that take precedence over `SBGUARD_*` environment variables.
#[derive(Args)]
struct ConfigOverrides {
    /// Safe Browsing API key
    #[arg(long, global = true, env = "SBGUARD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Action on a positive result (dunno, accept, delete, reject, defer)
    #[arg(long, global = true)]
    action: Option<String>,

    /// Whitespace-separated threat types
    #[arg(long, global = true)]
    threat_types: Option<String>,

    /// Whitespace-separated platforms
    #[arg(long, global = true)]
    threat_platforms: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Lookup endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check URLs against Safe Browsing
    Check {
        /// URLs to check
        #[arg(required = true)]
        urls: Vec<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract URLs from a message file and return the verdict action
    Scan {
        /// Text or HTML file, or a JSON array of message parts with --parts
        file: PathBuf,
        /// Treat the file as a JSON array of message parts
        #[arg(long)]
        parts: bool,
    },

    /// Check the configuration
    Lint,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "sbguard=debug,info"
    } else {
        "sbguard=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli.overrides)?;
    debug!(?config, "Resolved configuration");

    match cli.command {
        Commands::Check { urls, json } => cmd_check(config, &urls, json).await,
        Commands::Scan { file, parts } => cmd_scan(config, &file, parts).await,
        Commands::Lint => Ok(cmd_lint(config)),
    }
}

/// Environment first, then command-line overrides.
fn resolve_config(overrides: &ConfigOverrides) -> Result<SafebrowsingConfig> {
    let mut config = SafebrowsingConfig::from_env().context("Invalid SBGUARD_* environment")?;

    if let Some(key) = &overrides.api_key {
        config.api_key = key.trim().to_string();
    }
    if let Some(action) = &overrides.action {
        config.action = action.parse::<Action>().context("Invalid --action")?;
    }
    if let Some(types) = &overrides.threat_types {
        config = config.with_threat_types(types);
    }
    if let Some(platforms) = &overrides.threat_platforms {
        config = config.with_threat_platforms(platforms);
    }
    if let Some(timeout) = overrides.timeout {
        config = config.with_timeout(timeout);
    }
    if let Some(endpoint) = &overrides.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }

    Ok(config)
}

/// Check URLs
async fn cmd_check(config: SafebrowsingConfig, urls: &[String], json: bool) -> Result<ExitCode> {
    let lookup = LookupOrchestrator::new(config).context("Failed to create lookup client")?;

    let result = match lookup.check_outcome(urls).await {
        LookupOutcome::Completed(result) => result,
        LookupOutcome::Skipped(SkipReason::NoApiKey) => {
            eprintln!("{}", "No API key configured (set SBGUARD_API_KEY or --api-key).".yellow());
            return Ok(ExitCode::from(2));
        }
        LookupOutcome::Skipped(SkipReason::NoUrls) => {
            println!("{}", "Nothing to check.".yellow());
            return Ok(ExitCode::SUCCESS);
        }
        LookupOutcome::Failed(e) => {
            return Err(e).context("Safe Browsing lookup failed");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.is_empty() {
        println!("{} {} URL(s) clean", "✅".green(), urls.len());
    } else {
        println!("{} {} URL(s) flagged:", "⚠️ ".red().bold(), result.len());
        for m in &result.matches {
            println!(
                "   {} {} {}",
                m.threat_type.as_deref().unwrap_or("UNKNOWN").red(),
                m.url(),
                m.platform_type.as_deref().unwrap_or_default().dimmed(),
            );
        }
    }

    Ok(if result.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Scan a message file
async fn cmd_scan(config: SafebrowsingConfig, file: &Path, parts: bool) -> Result<ExitCode> {
    let message = load_parts(file, parts)?;
    let examiner = MessageExaminer::new(config).context("Failed to create lookup client")?;

    let action = examiner.examine(&message).await;

    if action.is_dunno() {
        println!("{} {}", "Verdict:".green().bold(), action);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} {}", "Verdict:".red().bold(), action);
        Ok(ExitCode::from(1))
    }
}

/// Lint configuration
fn cmd_lint(config: SafebrowsingConfig) -> ExitCode {
    let issues = config.lint();

    if issues.is_empty() {
        println!("{}", "✅ Configuration OK".green());
        return ExitCode::SUCCESS;
    }

    for issue in &issues {
        println!("{} {}", "✗".red(), issue);
    }
    ExitCode::FAILURE
}

/// Reads a message file into parts.
///
/// Without `as_parts`, the whole file is one part typed by its extension.
fn load_parts(file: &Path, as_parts: bool) -> Result<Vec<MessagePart>> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if as_parts {
        return serde_json::from_str(&content).context("Invalid message parts JSON");
    }

    let is_html = file
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    let content_type = if is_html { "text/html" } else { "text/plain" };

    Ok(vec![MessagePart::new(content_type, content)])
}
