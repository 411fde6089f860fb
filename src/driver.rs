use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{Config, ProductConfig};
use crate::error::{Result, TidyError};
use crate::io::csv_path;

/// One CSV written by [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedDataset {
    pub product: String,
    pub kind: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Reshape every configured dataset, or only the products named in `only`
/// (case-insensitive). Stops at the first failing dataset.
pub fn run(config: &Config, only: &[String]) -> Result<Vec<SavedDataset>> {
    let selected: Vec<&ProductConfig> = config
        .products
        .iter()
        .filter(|p| only.is_empty() || only.iter().any(|o| o.eq_ignore_ascii_case(&p.name)))
        .collect();

    for name in only {
        if !config.products.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            return Err(TidyError::Config(format!("No product named '{name}'")));
        }
    }

    let mut saved = Vec::new();
    for product in selected {
        saved.extend(run_product(config, product)?);
    }
    info!(datasets = saved.len(), "run complete");
    Ok(saved)
}

fn run_product(config: &Config, product: &ProductConfig) -> Result<Vec<SavedDataset>> {
    let dir = config.base_dir.join(&product.name);
    fs::create_dir_all(&dir)?;

    let mut saved = Vec::new();

    for shaper in product.trade_reshapers() {
        let kind = shaper.direction().label().to_string();
        let title = config.output_title(&product.name, &kind);
        let df = shaper.save(&title)?;
        saved.push(dataset(product, kind, title, df.height()));
    }

    for shaper in product.statistics_reshapers()? {
        let kind = shaper.kind().label().replace(' ', "");
        let title = config.output_title(&product.name, &kind);
        let df = shaper.save(&title)?;
        saved.push(dataset(product, kind, title, df.height()));
    }

    if saved.is_empty() {
        warn!(product = %product.name, "no datasets configured");
    }
    Ok(saved)
}

fn dataset(product: &ProductConfig, kind: String, title: PathBuf, rows: usize) -> SavedDataset {
    SavedDataset {
        product: product.name.clone(),
        kind,
        path: csv_path(title),
        rows,
    }
}
