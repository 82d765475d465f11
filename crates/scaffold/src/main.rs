//! Scaffold CLI: materialize the check suite into a website project

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use sitecheck_scaffold::{materialize, TEMPLATES};

/// Create the site check scaffolding: harness config, HTTP checks, e2e, a11y
#[derive(Parser, Debug)]
#[command(name = "sitecheck-scaffold")]
#[command(author, version, about)]
struct Cli {
    /// Overwrite existing files
    #[arg(long)]
    force: bool,

    /// Project directory to scaffold into
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let report = materialize(&cli.root, TEMPLATES, cli.force)
        .with_context(|| format!("scaffolding into {}", cli.root.display()))?;

    if !report.created.is_empty() {
        println!("{}", "Created:".green().bold());
        for path in &report.created {
            println!("  - {}", path);
        }
    }

    if !report.skipped.is_empty() {
        println!("{}", "Skipped (use --force to overwrite):".yellow().bold());
        for path in &report.skipped {
            println!("  - {}", path);
        }
    }

    println!();
    println!("Next steps:");
    println!("  npm install playwright && npx playwright install   # browser checks");
    println!();
    println!("  cargo test -p sitecheck-harness --test checks                # everything");
    println!("  cargo test -p sitecheck-harness --test checks -- --tag http  # HTTP checks only");
    println!("  cargo test -p sitecheck-harness --test checks -- --tag e2e --update-baselines");

    Ok(())
}
