//! agstat-tidy CLI
//!
//! ```bash
//! agstat-tidy run agstat.toml                     # every configured dataset
//! agstat-tidy run agstat.toml --product Butter    # one product
//! agstat-tidy trade imports.csv --direction imports --code 405002000 --product Butter
//! agstat-tidy stats stock.csv --kind stocks --item BUTTER --output ButterStocks
//! ```

use std::io;
use std::path::PathBuf;

use agstat_tidy::{
    io::write_csv, run, Config, Direction, StatisticKind, StatisticsReshaper, TradeVolumeReshaper,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use polars::prelude::DataFrame;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agstat-tidy")]
#[command(about = "Reshape agricultural trade and survey reports into tidy monthly tables", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every dataset in a TOML config
    Run {
        config: PathBuf,

        /// Only run these products (repeatable)
        #[arg(short, long = "product")]
        products: Vec<String>,
    },

    /// Reshape one GATS trade report
    Trade {
        source: PathBuf,

        /// imports or exports
        #[arg(short, long)]
        direction: Direction,

        /// Commodity code to keep (repeatable)
        #[arg(short, long = "code", required = true)]
        codes: Vec<u64>,

        /// Output column name
        #[arg(short, long)]
        product: String,

        /// Write <OUTPUT>.csv instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reshape one QuickStats export
    Stats {
        source: PathBuf,

        /// stocks, production or any other measure name
        #[arg(short, long)]
        kind: StatisticKind,

        /// Item name, paired with Data Item labels in order of appearance
        #[arg(short, long = "item")]
        items: Vec<String>,

        /// Explicit LABEL=ITEM pair; replaces positional pairing
        #[arg(short, long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,

        /// Write <OUTPUT>.csv instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_label(raw: &str) -> std::result::Result<(String, String), String> {
    let (label, item) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected LABEL=ITEM, got '{raw}'"))?;
    Ok((label.trim().to_string(), item.trim().to_string()))
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so printed tables stay clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn emit(mut df: DataFrame) -> Result<()> {
    let stdout = io::stdout();
    write_csv(&mut df, stdout.lock()).context("writing table to stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command {
        Commands::Run { config, products } => {
            let cfg = Config::load(&config)
                .with_context(|| format!("loading config {}", config.display()))?;
            let saved = run(&cfg, &products)?;
            for dataset in &saved {
                println!("{}\t{}", dataset.path.display(), dataset.rows);
            }
        }

        Commands::Trade {
            source,
            direction,
            codes,
            product,
            output,
        } => {
            let shaper = TradeVolumeReshaper::new(&source, direction, codes, &product);
            match output {
                Some(title) => {
                    let df = shaper
                        .save(&title)
                        .with_context(|| format!("reshaping {}", source.display()))?;
                    info!(rows = df.height(), "done");
                }
                None => emit(
                    shaper
                        .transform()
                        .with_context(|| format!("reshaping {}", source.display()))?,
                )?,
            }
        }

        Commands::Stats {
            source,
            kind,
            items,
            labels,
            output,
        } => {
            if items.is_empty() && labels.is_empty() {
                return Err(anyhow!("give at least one --item or --label"));
            }
            let mut shaper = StatisticsReshaper::new(&source, kind, items);
            if !labels.is_empty() {
                shaper = shaper.with_labels(labels);
            }
            match output {
                Some(title) => {
                    let df = shaper
                        .save(&title)
                        .with_context(|| format!("reshaping {}", source.display()))?;
                    info!(rows = df.height(), "done");
                }
                None => emit(
                    shaper
                        .transform()
                        .with_context(|| format!("reshaping {}", source.display()))?,
                )?,
            }
        }
    }

    Ok(())
}
