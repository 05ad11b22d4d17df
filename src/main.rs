use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beaverdam::config::DamConfig;
use beaverdam::matcher::MatchMode;
use beaverdam::models::Milestone;
use beaverdam::packager::Packager;
use beaverdam::store::CardStore;
use beaverdam::synth::Numbering;
use beaverdam::vault::CredentialVault;
use beaverdam::{catalog, pipeline, tree_render};

#[derive(Parser)]
#[command(name = "dam")]
#[command(about = "Generate TDD work cards and package them per milestone")]
struct Cli {
    /// Directory holding work_cards/ and milestone_vaults/
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// YAML milestone registry replacing the built-in catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// How card numbers are assigned
    #[arg(long, global = true, value_enum)]
    numbering: Option<Numbering>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write one YAML card per task
    Generate,
    /// Zip cards per milestone and record milestone credentials
    Package {
        /// How selection patterns are interpreted
        #[arg(long, value_enum)]
        match_mode: Option<MatchMode>,

        /// Credential date as YYYYMMDD (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Print the registry with assigned card numbers
    Catalog {
        /// Show one milestone (name or identifier) as YAML instead
        milestone: Option<String>,
    },
    /// Report milestones whose task counts disagree with their card ranges
    Check,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y%m%d").map_err(|e| format!("expected YYYYMMDD: {}", e))
}

/// Initialize tracing on stderr so stdout carries only command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "beaverdam=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_registry(config: &DamConfig) -> anyhow::Result<Vec<Milestone>> {
    match &config.catalog {
        Some(path) => catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(catalog::builtin()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = DamConfig::load(cli.config.as_deref())?.with_env();
    if let Some(root) = cli.root {
        config.root = root;
    }
    if let Some(path) = cli.catalog {
        config.catalog = Some(path);
    }
    if let Some(numbering) = cli.numbering {
        config.numbering = numbering;
    }

    let registry = load_registry(&config)?;
    let store = CardStore::new(config.cards_path());

    match cli.command {
        Commands::Generate => {
            pipeline::generate(&registry, config.numbering, &store)
                .context("Failed to generate work cards")?;
            println!("All work cards generated successfully!");
        }
        Commands::Package { match_mode, date } => {
            let mode = match_mode.unwrap_or(config.match_mode);
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());

            let packager = Packager::new(store, config.vaults_path(), mode);
            let vault = CredentialVault::new(&config.vault_base_dir);

            pipeline::package(&registry, &packager, &vault, date)
                .context("Failed to package milestones")?;
            println!("Milestone cards zipped and passwords secured!");
        }
        Commands::Catalog { milestone: None } => {
            print!(
                "{}",
                tree_render::render_registry(&registry, config.numbering)?
            );
        }
        Commands::Catalog {
            milestone: Some(key),
        } => {
            let milestone = catalog::find(&registry, &key)
                .with_context(|| format!("No milestone named {}", key))?;
            print!("{}", serde_yaml::to_string(milestone)?);
        }
        Commands::Check => {
            let mismatches = catalog::audit(&registry, config.numbering)?;
            if mismatches.is_empty() {
                println!("All {} milestones are consistent.", registry.len());
            } else {
                for mismatch in &mismatches {
                    println!("{}", mismatch);
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
