//! shared-stack - maintainer for a shared EUPS software stack
//!
//! Usage:
//!   shared-stack              # Bring the stack up to date (default)
//!   shared-stack status       # Show installed versions and tags
//!   shared-stack remote       # List matching tags on the server

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stack_core::commands::{
    RemoteCommand, RemoteReport, StackContext, StatusCommand, StatusReport, UpdateCommand,
    UpdateReport,
};
use stack_core::config::StackConfig;

#[derive(Parser)]
#[command(name = "shared-stack", version)]
#[command(about = "Keep a shared EUPS stack in step with the distribution server", long_about = None)]
struct Cli {
    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Settings that override the configuration file.
#[derive(Args)]
struct Overrides {
    /// Configuration file (default: ~/.config/shared-stack/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Root directory of the stack
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Products to maintain
    #[arg(long, global = true, num_args = 1..)]
    products: Option<Vec<String>>,

    /// Regular expression selecting release tags
    #[arg(long = "version-glob", global = true)]
    version_glob: Option<String>,

    /// Base URL of the distribution server
    #[arg(long, global = true)]
    pkgroot: Option<String>,

    /// Verbose logging, including commands and captured environments
    #[arg(long, global = true)]
    debug: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Install missing tags and move `current` to the newest release
    Update,

    /// Show installed versions and tags
    Status,

    /// List matching tags on the distribution server
    Remote,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Only show problems
    ///
    /// Unlike the other formats, `update` exits 1 when any tag was skipped
    /// or `current` could not be declared.
    Quiet,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.overrides)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if config.debug {
                    "shared_stack=debug,stack_core=debug,info".into()
                } else {
                    "shared_stack=info,stack_core=info,warn".into()
                }
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let format = cli.overrides.format;
    let ctx = StackContext::new(config);
    tracing::debug!(
        root = %ctx.root().display(),
        products = ?ctx.config().products,
        "Configuration loaded"
    );

    match cli.command.unwrap_or(Commands::Update) {
        Commands::Update => run_update(ctx, format),
        Commands::Status => run_status(ctx, format),
        Commands::Remote => run_remote(ctx, format),
    }
}

fn load_config(overrides: &Overrides) -> Result<StackConfig> {
    let mut config = match &overrides.config {
        Some(path) => StackConfig::load(path)?,
        None => StackConfig::load_default()?,
    };

    if let Some(root) = &overrides.root {
        config.root = root.clone();
    }
    if let Some(products) = &overrides.products {
        config.products = products.clone();
    }
    if let Some(pattern) = &overrides.version_glob {
        config.tag_pattern = pattern.clone();
    }
    if let Some(pkgroot) = &overrides.pkgroot {
        config.pkgroot = pkgroot.clone();
    }
    config.debug |= overrides.debug;

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_update(ctx: StackContext, format: OutputFormat) -> Result<()> {
    let root = ctx.root().to_path_buf();
    let report = UpdateCommand::new(ctx)
        .execute()
        .with_context(|| format!("Failed to update stack at {}", root.display()))?;

    match format {
        OutputFormat::Table => print_update_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => print_update_failures(&report),
    }

    let code = update_exit_code(&report, format);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Skipped tags only affect the exit status in quiet mode.
fn update_exit_code(report: &UpdateReport, format: OutputFormat) -> i32 {
    match format {
        OutputFormat::Quiet if report.reconcile.failure_count() > 0 => 1,
        _ => 0,
    }
}

fn print_update_table(report: &UpdateReport) {
    println!("Stack: {}", report.root.display());
    if report.bootstrapped {
        println!("Bootstrapped a new stack");
    }
    println!("Remote tags: {}", report.remote_tags);
    println!();

    println!(
        "  {:<16} {:<10} {:<10} {:<8} Current",
        "Product", "Candidates", "Installed", "Failed"
    );
    println!("  {}", "-".repeat(64));
    for product in &report.reconcile.products {
        println!(
            "  {:<16} {:<10} {:<10} {:<8} {}",
            product.product,
            product.candidates.len(),
            product.installed.len(),
            product.failed.len(),
            product.current.as_deref().unwrap_or("-")
        );
    }
    println!();

    print_update_failures(report);
    println!(
        "Summary: {} tags installed, {} skipped",
        report.reconcile.installed_count(),
        report.reconcile.failure_count()
    );
}

fn print_update_failures(report: &UpdateReport) {
    for product in &report.reconcile.products {
        for failure in &product.failed {
            println!(
                "⚠ Skipped {} {}: {}",
                product.product, failure.tag, failure.error
            );
        }
        if let Some(error) = &product.current_error {
            println!("⚠ Could not mark {} current: {}", product.product, error);
        }
    }
}

fn run_status(ctx: StackContext, format: OutputFormat) -> Result<()> {
    let products = ctx.config().products.clone();
    let report = StatusCommand::new(ctx)
        .execute(&products)
        .context("Failed to read the local stack")?;

    match format {
        OutputFormat::Table => print_status_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {
            for product in report.products.iter().filter(|p| !p.installed) {
                println!("✗ {} is not installed", product.product);
            }
        }
    }
    Ok(())
}

fn print_status_table(report: &StatusReport) {
    for product in &report.products {
        let current = product.current.as_deref().unwrap_or("-");
        println!("{} (current: {})", product.product, current);
        if !product.installed {
            println!("  not installed");
        }
        for version in &product.versions {
            let marker = if Some(version.version.as_str()) == product.current.as_deref() {
                "*"
            } else {
                " "
            };
            println!(
                "  {} {:<24} {}",
                marker,
                version.version,
                version.tags.join(" ")
            );
        }
        println!();
    }
}

fn run_remote(ctx: StackContext, format: OutputFormat) -> Result<()> {
    let pkgroot = ctx.config().pkgroot.clone();
    let report = RemoteCommand::new(ctx)
        .execute()
        .with_context(|| format!("Failed to read tags from {pkgroot}"))?;

    match format {
        OutputFormat::Table => print_remote_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Quiet => {}
    }
    Ok(())
}

fn print_remote_table(report: &RemoteReport) {
    if report.tags.is_empty() {
        println!("No matching tags.");
        return;
    }

    println!("  {:<24} {:<26} Products", "Tag", "Published");
    println!("  {}", "-".repeat(60));
    for tag in &report.tags {
        println!(
            "  {:<24} {:<26} {}",
            tag.tag,
            tag.published.to_rfc2822(),
            tag.products
        );
    }
}
