mod catalog;
mod collector;
mod fetcher;
mod menu;
mod model;
mod parser;
mod settings;
mod snapshot;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use catalog::Catalog;
use fetcher::{HttpFetcher, ReplayFetcher};
use menu::{truncate, Menu};
use model::Institution;
use settings::{Settings, Source};

#[derive(Parser)]
#[command(name = "jupiter_catalog", about = "Jupiter Web course catalog collector and query menu")]
struct Cli {
    /// Settings file (default: ./jupiter.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect the first N institutions, print a summary and open the menu
    Collect {
        /// Number of institutions to collect
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
        /// Saved session directory or http(s) mirror (overrides settings)
        #[arg(short, long)]
        source: Option<String>,
        /// Write the collected catalog to a JSON snapshot
        #[arg(long)]
        save: Option<PathBuf>,
        /// Print the summary and exit
        #[arg(long)]
        no_menu: bool,
    },
    /// Open the query menu over a saved snapshot
    Open { snapshot: PathBuf },
    /// Per-institution totals of a saved snapshot
    Stats { snapshot: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Collect {
            count,
            source,
            save,
            no_menu,
        } => {
            let mut settings = match &cli.config {
                Some(path) => Settings::load_from(path)?,
                None => Settings::load()?,
            };
            if let Some(source) = source {
                settings.source = source;
            }

            let institutions = collect(&settings, count as usize).await?;
            println!(
                "Collected {} institutions in {}",
                institutions.len(),
                format_duration(t0.elapsed())
            );
            if let Some(path) = &save {
                snapshot::save(path, &institutions)?;
            }

            let catalog = Catalog::new(institutions);
            print_summary(&catalog);
            if no_menu {
                Ok(())
            } else {
                open_menu(&catalog)
            }
        }
        Commands::Open { snapshot } => {
            let catalog = load_catalog(&snapshot)?;
            open_menu(&catalog)
        }
        Commands::Stats { snapshot } => {
            let catalog = load_catalog(&snapshot)?;
            print_summary(&catalog);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn collect(settings: &Settings, count: usize) -> anyhow::Result<Vec<Institution>> {
    let waits = settings.waits();
    let institutions = match settings.source() {
        Source::Directory(root) => {
            println!("Collecting {} institutions from {}...", count, root.display());
            collector::collect(ReplayFetcher::new(root, waits), count).await
        }
        Source::Http(base) => {
            println!("Collecting {} institutions from {}...", count, base);
            let fetcher = HttpFetcher::new(&base, waits, settings.request_timeout())
                .context("Failed to build HTTP client")?;
            collector::collect(fetcher, count).await
        }
    }?;
    Ok(institutions)
}

fn load_catalog(path: &Path) -> anyhow::Result<Catalog> {
    let snapshot = snapshot::load(path)?;
    println!(
        "Snapshot from {} ({} institutions)",
        snapshot.collected_at.format("%Y-%m-%d %H:%M UTC"),
        snapshot.institutions.len()
    );
    Ok(Catalog::new(snapshot.institutions))
}

fn open_menu(catalog: &Catalog) -> anyhow::Result<()> {
    let stdin = io::stdin();
    Menu::new(catalog, stdin.lock(), io::stdout()).run()?;
    Ok(())
}

fn print_summary(catalog: &Catalog) {
    if catalog.institutions().is_empty() {
        println!("No institutions.");
        return;
    }

    println!(
        "{:>3} | {:<48} | {:<8} | {:>8} | {:>11} | {:>8}",
        "#", "Institution", "Acronym", "Programs", "Disciplines", "Workload"
    );
    println!("{}", "-".repeat(102));

    let mut totals = (0, 0, 0);
    for (i, institution) in catalog.institutions().iter().enumerate() {
        let Some(report) = catalog.institution_report(&institution.name) else {
            continue;
        };
        let acronym = institution.acronym();
        println!(
            "{:>3} | {:<48} | {:<8} | {:>8} | {:>11} | {:>8}",
            i + 1,
            truncate(&institution.name, 48),
            if acronym.is_empty() { "-" } else { acronym },
            report.programs.len(),
            report.total_disciplines,
            report.total_workload
        );
        totals.0 += report.programs.len();
        totals.1 += report.total_disciplines;
        totals.2 += report.total_workload;
    }

    let common = catalog.common_disciplines().len();
    println!(
        "\n{} programs | {} disciplines | {} h | {} codes shared by several programs",
        totals.0, totals.1, totals.2, common
    );
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
