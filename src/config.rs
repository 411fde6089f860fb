use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, TidyError};
use crate::statistics::{StatisticKind, StatisticsReshaper};
use crate::trade::{Direction, TradeVolumeReshaper};

/// Driver configuration: which reports feed which product outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Outputs land in `<base_dir>/<Product>/<Product><Kind>.csv`.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductConfig {
    pub name: String,
    pub imports: Option<TradeConfig>,
    pub exports: Option<TradeConfig>,
    pub stocks: Option<StatisticsConfig>,
    pub production: Option<StatisticsConfig>,
    /// Statistics of any other kind, e.g. prices. Each entry names its `kind`.
    #[serde(default)]
    pub statistics: Vec<StatisticsConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TradeConfig {
    pub source: PathBuf,
    pub codes: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatisticsConfig {
    /// Only read for `[[products.statistics]]` entries.
    pub kind: Option<String>,
    pub source: PathBuf,
    /// Item names paired with `Data Item` labels by position.
    #[serde(default)]
    pub items: Vec<String>,
    /// Explicit `Data Item` label -> item name table; wins over `items`.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Extra period labels -> month number.
    #[serde(default)]
    pub periods: BTreeMap<String, u32>,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Config {
    /// Read and validate a TOML configuration file.
    ///
    /// Relative paths inside it are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::parse(&text)?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve(root))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(TidyError::Config("product name must not be empty".into()));
            }
            for (kind, trade) in [("imports", &product.imports), ("exports", &product.exports)] {
                if let Some(trade) = trade {
                    if trade.codes.is_empty() {
                        return Err(TidyError::Config(format!(
                            "{} {kind}: no commodity codes",
                            product.name
                        )));
                    }
                }
            }
            if product.statistics.iter().any(|s| s.kind.is_none()) {
                return Err(TidyError::Config(format!(
                    "{}: every [[products.statistics]] entry needs a `kind`",
                    product.name
                )));
            }
            for (kind, stats) in product.statistics_sections() {
                if stats.items.is_empty() && stats.labels.is_empty() {
                    return Err(TidyError::Config(format!(
                        "{} {kind}: needs `items` or `labels`",
                        product.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn resolve(mut self, root: &Path) -> Self {
        self.base_dir = root.join(&self.base_dir);
        for product in &mut self.products {
            for trade in [&mut product.imports, &mut product.exports].into_iter().flatten() {
                trade.source = root.join(&trade.source);
            }
            let sections = [&mut product.stocks, &mut product.production]
                .into_iter()
                .flatten()
                .chain(product.statistics.iter_mut());
            for stats in sections {
                stats.source = root.join(&stats.source);
            }
        }
        self
    }

    /// Output title (without `.csv`) for one product dataset.
    pub fn output_title(&self, product: &str, kind: &str) -> PathBuf {
        self.base_dir.join(product).join(format!("{product}{kind}"))
    }
}

impl ProductConfig {
    /// Every statistics section with its kind label, stocks and production first.
    pub fn statistics_sections(&self) -> Vec<(String, &StatisticsConfig)> {
        let mut sections = Vec::new();
        if let Some(stocks) = &self.stocks {
            sections.push(("stocks".to_string(), stocks));
        }
        if let Some(production) = &self.production {
            sections.push(("production".to_string(), production));
        }
        for other in &self.statistics {
            sections.push((other.kind.clone().unwrap_or_default(), other));
        }
        sections
    }

    /// Trade reshapers for the configured directions.
    pub fn trade_reshapers(&self) -> Vec<TradeVolumeReshaper> {
        [
            (Direction::Imports, &self.imports),
            (Direction::Exports, &self.exports),
        ]
        .into_iter()
        .filter_map(|(direction, trade)| {
            trade.as_ref().map(|t| {
                TradeVolumeReshaper::new(
                    &t.source,
                    direction,
                    t.codes.iter().copied(),
                    &self.name,
                )
            })
        })
        .collect()
    }

    /// Statistics reshapers for every configured section.
    pub fn statistics_reshapers(&self) -> Result<Vec<StatisticsReshaper>> {
        self.statistics_sections()
            .into_iter()
            .map(|(kind, stats)| {
                let kind: StatisticKind = kind.parse()?;
                let mut shaper = StatisticsReshaper::new(&stats.source, kind, stats.items.clone());
                if !stats.labels.is_empty() {
                    shaper = shaper.with_labels(stats.labels.clone());
                }
                Ok(shaper.with_periods(stats.periods.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::ItemNames;

    const BUTTER: &str = r#"
base_dir = "out"

[[products]]
name = "Butter"

[products.imports]
source = "imports.csv"
codes = [405002000, 405004000, 405101000, 405102000]

[products.exports]
source = "exports.csv"
codes = [405005000, 405100000, 405105000]

[products.stocks]
source = "Butter/stock.csv"
items = ["BUTTER"]

[products.production]
source = "Butter/production.csv"
labels = { "BUTTER - PRODUCTION, MEASURED IN LB" = "BUTTER" }
periods = { "MARKETING YEAR" = 12 }

[[products.statistics]]
kind = "price received"
source = "Butter/price.csv"
items = ["Butter"]
"#;

    #[test]
    fn parses_full_product() -> Result<()> {
        let config = Config::parse(BUTTER)?;
        assert_eq!(config.base_dir, PathBuf::from("out"));
        assert_eq!(config.products.len(), 1);

        let butter = &config.products[0];
        assert_eq!(butter.imports.as_ref().map(|t| t.codes.len()), Some(4));
        assert_eq!(butter.exports.as_ref().map(|t| t.codes.len()), Some(3));

        let kinds: Vec<String> = butter
            .statistics_sections()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(kinds, vec!["stocks", "production", "price received"]);
        Ok(())
    }

    #[test]
    fn builds_reshapers_per_section() -> Result<()> {
        let config = Config::parse(BUTTER)?;
        let butter = &config.products[0];

        let trade = butter.trade_reshapers();
        assert_eq!(trade.len(), 2);
        assert_eq!(trade[0].direction(), Direction::Imports);
        assert!(trade[1].codes().contains(&405105000));

        let stats = butter.statistics_reshapers()?;
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].kind(), &StatisticKind::Stocks);
        assert!(matches!(stats[0].items(), ItemNames::Positional(_)));
        assert!(matches!(stats[1].items(), ItemNames::Explicit(_)));
        assert_eq!(stats[2].kind().label(), "Price Received");
        Ok(())
    }

    #[test]
    fn relative_paths_follow_the_config_file() -> Result<()> {
        let config = Config::parse(BUTTER)?.resolve(Path::new("/data/dairy"));
        assert_eq!(config.base_dir, PathBuf::from("/data/dairy/out"));
        let imports = config.products[0].imports.as_ref().map(|t| t.source.clone());
        assert_eq!(imports, Some(PathBuf::from("/data/dairy/imports.csv")));
        assert_eq!(
            config.output_title("Butter", "Imports"),
            PathBuf::from("/data/dairy/out/Butter/ButterImports")
        );
        Ok(())
    }

    #[test]
    fn empty_code_list_is_rejected() {
        let text = r#"
[[products]]
name = "Cheddar"
[products.imports]
source = "imports.csv"
codes = []
"#;
        assert!(matches!(Config::parse(text), Err(TidyError::Config(_))));
    }

    #[test]
    fn statistics_without_items_are_rejected() {
        let text = r#"
[[products]]
name = "Cheddar"
[products.stocks]
source = "stock.csv"
"#;
        assert!(matches!(Config::parse(text), Err(TidyError::Config(_))));
    }

    #[test]
    fn other_statistics_need_a_kind() {
        let text = r#"
[[products]]
name = "Cheddar"
[[products.statistics]]
source = "price.csv"
items = ["Cheddar"]
"#;
        assert!(matches!(Config::parse(text), Err(TidyError::Config(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = r#"
[[products]]
name = "Cheddar"
colour = "orange"
"#;
        assert!(matches!(Config::parse(text), Err(TidyError::Toml(_))));
    }
}
