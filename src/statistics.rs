use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::convert::{date_column, month_start, numeric_column, title_case};
use crate::error::{Result, TidyError};
use crate::io::{read_csv_as_strings, require_columns, save_csv};
use crate::labels::{distinct_in_order, LabelMap};
use crate::reshape::{drop_empty_columns, fill_null_zero, pivot, with_lagged, PivotAgg};
use crate::schema::statistics::*;
use crate::schema::tidy::DATE;

/// What the `Value` column measures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatisticKind {
    Stocks,
    Production,
    /// Any other measure; pivoted like production.
    Other(String),
}

impl StatisticKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Stocks => "Stocks",
            Self::Production => "Production",
            Self::Other(label) => label.as_str(),
        }
    }
}

impl fmt::Display for StatisticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatisticKind {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Err(TidyError::Config("Statistic kind must not be empty".into())),
            "stock" | "stocks" => Ok(Self::Stocks),
            "production" => Ok(Self::Production),
            other => Ok(Self::Other(title_case(other))),
        }
    }
}

/// How `Data Item` labels are resolved to tracked item names.
#[derive(Debug, Clone)]
pub enum ItemNames {
    /// Paired with the distinct labels in first-encountered order; counts must agree.
    Positional(Vec<String>),
    /// Label -> item name.
    Explicit(Vec<(String, String)>),
}

/// Turns a QuickStats export into one column per tracked item, indexed by
/// month.
#[derive(Debug, Clone)]
pub struct StatisticsReshaper {
    path: PathBuf,
    kind: StatisticKind,
    items: ItemNames,
    periods: LabelMap<u32>,
}

impl StatisticsReshaper {
    /// `items` pair with the distinct `Data Item` labels in first-encountered
    /// order.
    ///
    /// Periods are not numbered by first appearance: each label resolves
    /// through [`LabelMap::calendar`] to its own month, so an export starting
    /// at `MAR` dates its first row in March. Labels outside the calendar
    /// fail with `UnknownLabel` unless added through [`Self::with_periods`].
    pub fn new<S: Into<String>>(
        path: impl Into<PathBuf>,
        kind: StatisticKind,
        items: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            path: path.into(),
            kind,
            items: ItemNames::Positional(items.into_iter().map(Into::into).collect()),
            periods: LabelMap::calendar(),
        }
    }

    /// Resolve `Data Item` labels through an explicit table instead of by position.
    pub fn with_labels<K: Into<String>, V: Into<String>>(
        mut self,
        labels: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        self.items = ItemNames::Explicit(
            labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Accept extra period labels on top of the calendar months.
    pub fn with_periods<K: AsRef<str>>(mut self, periods: impl IntoIterator<Item = (K, u32)>) -> Self {
        self.periods.extend(periods);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &StatisticKind {
        &self.kind
    }

    pub fn items(&self) -> &ItemNames {
        &self.items
    }

    /// Read the export with fully empty columns dropped.
    pub fn load(&self) -> Result<DataFrame> {
        let raw = read_csv_as_strings(&self.path, 0)?;
        drop_empty_columns(&raw)
    }

    /// Read the source file and run every reshape step on it.
    ///
    /// The file is re-read on each call.
    #[tracing::instrument(level = "info", skip(self), fields(path = %self.path.display(), kind = %self.kind))]
    pub fn transform(&self) -> Result<DataFrame> {
        let loaded = self.load()?;
        require_columns(&loaded, &[YEAR, PERIOD, DATA_ITEM, VALUE])?;

        let dated = reconstruct_dates(&loaded, &self.periods)?;
        debug!(rows = dated.height(), "reconstructed dates");

        let converted = convert_values(&dated, &self.kind)?;
        let (labels, items) = self.item_map(&converted)?;
        let tidy = pivot_items(&converted, &self.kind, &labels, &items)?;
        debug!(rows = tidy.height(), columns = tidy.width(), "pivoted items");
        Ok(tidy)
    }

    /// Transform and write `<title>.csv`; returns the written table.
    pub fn save(&self, title: impl AsRef<Path>) -> Result<DataFrame> {
        let mut df = self.transform()?;
        let path = save_csv(&mut df, title)?;
        info!(path = %path.display(), rows = df.height(), "saved {}", self.kind);
        Ok(df)
    }

    /// Label table for `Data Item` plus the item names in output order.
    fn item_map(&self, df: &DataFrame) -> Result<(LabelMap<String>, Vec<String>)> {
        let canonical = |name: &str| match self.kind {
            StatisticKind::Stocks => name.to_uppercase(),
            _ => name.to_string(),
        };

        match &self.items {
            ItemNames::Positional(names) => {
                let names: Vec<String> = names.iter().map(|n| canonical(n.as_str())).collect();
                let encountered = distinct_in_order(df.column(DATA_ITEM)?)?;
                let map = LabelMap::positional(DATA_ITEM, &encountered, &names)?;
                Ok((map, names))
            }
            ItemNames::Explicit(pairs) => {
                let map = LabelMap::explicit(
                    DATA_ITEM,
                    pairs.iter().map(|(label, name)| (label, canonical(name.as_str()))),
                );
                let encountered = distinct_in_order(df.column(DATA_ITEM)?)?;
                for label in map.unused(encountered.iter().map(String::as_str)) {
                    warn!(label, "label table entry not present in data");
                }

                let mut seen = HashSet::new();
                let names = pairs
                    .iter()
                    .map(|(_, name)| canonical(name.as_str()))
                    .filter(|name| seen.insert(name.clone()))
                    .collect();
                Ok((map, names))
            }
        }
    }
}

/// Drop annual rows, map `Period` to a month, add `Date` and sort by it.
pub fn reconstruct_dates(df: &DataFrame, periods: &LabelMap<u32>) -> Result<DataFrame> {
    require_columns(df, &[YEAR, PERIOD])?;

    let mut monthly = df
        .clone()
        .lazy()
        // Blank periods must reach the lookup and fail there.
        .filter(col(PERIOD).fill_null(lit("")).neq(lit(YEAR_MARKER)))
        .collect()?;

    let years = monthly.column(YEAR)?.str()?;
    let labels = monthly.column(PERIOD)?.str()?;
    let mut dates = Vec::with_capacity(monthly.height());
    for (year, label) in years.into_iter().zip(labels.into_iter()) {
        let month = *periods.get(label.unwrap_or_default())?;
        let year = year.ok_or_else(|| TidyError::InvalidYear(String::new()))?;
        dates.push(Some(month_start(year, month)?));
    }

    let date = date_column(DATE, &dates)?;
    monthly.with_column(date)?;

    Ok(monthly
        .lazy()
        .sort([DATE], SortMultipleOptions::default().with_maintain_order(true))
        .collect()?)
}

/// Parse `Value` into whole numbers and rename it after the statistic.
///
/// Stocks also get `Beginning Stock`, the previous row's value; rows must
/// already be in date order for it to mean anything.
pub fn convert_values(df: &DataFrame, kind: &StatisticKind) -> Result<DataFrame> {
    require_columns(df, &[VALUE])?;

    let values = numeric_column(df, VALUE, 1.0)?;
    let mut df = df.clone();
    df.with_column(values)?;

    let label = kind.label();
    let renamed = df.lazy().rename([VALUE], [label], true).collect()?;

    match kind {
        StatisticKind::Stocks => with_lagged(renamed, &[(label, BEGINNING_STOCK.to_string())]),
        _ => Ok(renamed),
    }
}

/// One row per date, one column per item.
///
/// Stocks gain `<ITEM> Beginning Stock` columns; every other kind has its
/// missing cells filled with zero.
pub fn pivot_items(
    df: &DataFrame,
    kind: &StatisticKind,
    labels: &LabelMap<String>,
    items: &[String],
) -> Result<DataFrame> {
    let values = kind.label();
    require_columns(df, &[DATE, DATA_ITEM, values])?;

    let renamed = df
        .column(DATA_ITEM)?
        .str()?
        .into_iter()
        .map(|label| labels.get(label.unwrap_or_default()).cloned())
        .collect::<Result<Vec<String>>>()?;

    let mut df = df.clone();
    df.with_column(Column::new(DATA_ITEM.into(), renamed))?;
    let wide = pivot(&df, DATE, DATA_ITEM, values, PivotAgg::Unique)?;

    match kind {
        StatisticKind::Stocks => {
            require_columns(&wide, &items.iter().map(String::as_str).collect::<Vec<_>>())?;
            let lags: Vec<(&str, String)> = items
                .iter()
                .map(|item| (item.as_str(), format!("{item} {BEGINNING_STOCK}")))
                .collect();
            with_lagged(wide, &lags)
        }
        _ => {
            let item_columns: Vec<String> = wide
                .get_column_names_str()
                .iter()
                .filter(|c| **c != DATE)
                .map(|c| c.to_string())
                .collect();
            fill_null_zero(wide, &item_columns)
        }
    }
}
