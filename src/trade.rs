use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use polars::prelude::*;
use tracing::{debug, info};

use crate::convert::{date_column, month_start, numeric_column, title_case};
use crate::error::{Result, TidyError};
use crate::io::{read_csv_as_strings, require_columns, save_csv};
use crate::reshape::{pivot, unpivot, PivotAgg};
use crate::schema::tidy::DATE;
use crate::schema::trade::*;

/// Trade flow direction; doubles as the value column label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Imports,
    Exports,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Imports => "Imports",
            Self::Exports => "Exports",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Direction {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "import" | "imports" => Ok(Self::Imports),
            "export" | "exports" => Ok(Self::Exports),
            other => Err(TidyError::Config(format!(
                "Invalid direction: '{other}'. Must be 'imports' or 'exports'"
            ))),
        }
    }
}

/// Turns a GATS monthly trade report into one column of pounds per product,
/// indexed by month.
#[derive(Debug, Clone)]
pub struct TradeVolumeReshaper {
    path: PathBuf,
    direction: Direction,
    codes: BTreeSet<u64>,
    product: String,
}

impl TradeVolumeReshaper {
    pub fn new(
        path: impl Into<PathBuf>,
        direction: Direction,
        codes: impl IntoIterator<Item = u64>,
        product: &str,
    ) -> Self {
        Self {
            path: path.into(),
            direction,
            codes: codes.into_iter().collect(),
            product: title_case(product),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn codes(&self) -> &BTreeSet<u64> {
        &self.codes
    }

    /// Read the report as-is, banner removed.
    pub fn load(&self) -> Result<DataFrame> {
        read_csv_as_strings(&self.path, BANNER_LINES)
    }

    /// Read the source file and run every reshape step on it.
    ///
    /// The file is re-read on each call.
    #[tracing::instrument(level = "info", skip(self), fields(path = %self.path.display(), product = %self.product, direction = %self.direction))]
    pub fn transform(&self) -> Result<DataFrame> {
        let value = self.direction.label();

        let raw = self.load()?;
        let filtered = filter_codes(&raw, &self.codes, &self.product)?;
        debug!(rows = filtered.height(), "filtered to product codes");

        let melted = melt_months(&filtered, value)?;
        debug!(rows = melted.height(), "melted month columns");

        let pounds = to_pounds(&melted, value)?;
        let tidy = pivot_products(&pounds, value)?;
        debug!(rows = tidy.height(), "pivoted products");
        Ok(tidy)
    }

    /// Transform and write `<title>.csv`; returns the written table.
    pub fn save(&self, title: impl AsRef<Path>) -> Result<DataFrame> {
        let mut df = self.transform()?;
        let path = save_csv(&mut df, title)?;
        info!(path = %path.display(), rows = df.height(), "saved {} {}", self.product, self.direction);
        Ok(df)
    }
}

/// Keep rows whose product code is in `codes` and stamp them with `product`.
///
/// Codes are compared numerically, so `"0405002000"` matches `405002000`.
/// Rows with a non-numeric code (report footers) never match.
pub fn filter_codes(df: &DataFrame, codes: &BTreeSet<u64>, product: &str) -> Result<DataFrame> {
    require_columns(df, &[PRODUCT_CODE, PRODUCT, YEAR])?;

    let wanted = Series::new("codes".into(), codes.iter().copied().collect::<Vec<u64>>());
    let df = df
        .clone()
        .lazy()
        .filter(
            col(PRODUCT_CODE)
                .str()
                .strip_chars(lit(" \t\r\n"))
                .cast(DataType::UInt64)
                .is_in(lit(wanted), false),
        )
        .with_columns([lit(product).alias(PRODUCT)])
        .collect()?;
    Ok(df)
}

/// Names of the twelve monthly quantity columns, January first.
pub fn quantity_columns(df: &DataFrame) -> Result<Vec<String>> {
    let found: Vec<String> = df
        .get_column_names_str()
        .iter()
        .filter(|name| {
            let lower = name.to_lowercase();
            QUANTITY_MARKERS.iter().any(|m| lower.contains(m))
        })
        .take(MONTHS)
        .map(|name| name.to_string())
        .collect();

    if found.len() < MONTHS {
        return Err(TidyError::MissingColumn(format!(
            "{MONTHS} monthly quantity columns (found {})",
            found.len()
        )));
    }
    Ok(found)
}

/// Unpivot the monthly quantity columns into (`Month`, `value_name`) rows and
/// add the month-start `Date`.
pub fn melt_months(df: &DataFrame, value_name: &str) -> Result<DataFrame> {
    require_columns(df, &[PRODUCT_CODE, PRODUCT, YEAR])?;
    let quantities = quantity_columns(df)?;

    let months: Vec<String> = (1..=MONTHS).map(|m| m.to_string()).collect();
    let renamed = df
        .clone()
        .lazy()
        .rename(quantities.iter(), months.iter(), true)
        .collect()?;

    let month_refs: Vec<&str> = months.iter().map(String::as_str).collect();
    let mut melted = unpivot(
        &renamed,
        &[PRODUCT_CODE, PRODUCT, YEAR],
        &month_refs,
        MONTH,
        value_name,
    )?;

    let years = melted.column(YEAR)?.str()?;
    let labels = melted.column(MONTH)?.str()?;
    let mut month_numbers: Vec<u32> = Vec::with_capacity(melted.height());
    let mut dates = Vec::with_capacity(melted.height());
    for (year, label) in years.into_iter().zip(labels.into_iter()) {
        let label = label.unwrap_or_default();
        let month: u32 = label.parse().map_err(|_| TidyError::Parse {
            column: MONTH.to_string(),
            value: label.to_string(),
        })?;
        let year = year.ok_or_else(|| TidyError::InvalidYear(String::new()))?;
        month_numbers.push(month);
        dates.push(Some(month_start(year, month)?));
    }

    let date = date_column(DATE, &dates)?;
    melted.with_column(Column::new(MONTH.into(), month_numbers))?;
    melted.with_column(date)?;
    Ok(melted)
}

/// Metric-ton quantity strings to whole pounds.
pub fn to_pounds(df: &DataFrame, value_name: &str) -> Result<DataFrame> {
    let pounds = numeric_column(df, value_name, POUNDS_PER_METRIC_TON)?;
    let mut df = df.clone();
    df.with_column(pounds)?;
    Ok(df)
}

/// One row per date, one summed column per product.
pub fn pivot_products(df: &DataFrame, value_name: &str) -> Result<DataFrame> {
    pivot(df, DATE, PRODUCT, value_name, PivotAgg::Sum)
}
