//! Reshape USDA agricultural reports into tidy monthly tables.
//!
//! Two report families are supported:
//! GATS trade reports ([`TradeVolumeReshaper`]) become one pounds column per
//! product, and QuickStats exports ([`StatisticsReshaper`]) become one column
//! per tracked item. Both produce a `Date` column of first-of-month dates.

pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod io;
pub mod labels;
pub mod reshape;
pub mod schema;
pub mod statistics;
pub mod trade;

#[cfg(feature = "python")]
mod python;

pub use config::Config;
pub use driver::{run, SavedDataset};
pub use error::{Result, TidyError};
pub use labels::LabelMap;
pub use statistics::{ItemNames, StatisticKind, StatisticsReshaper};
pub use trade::{Direction, TradeVolumeReshaper};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Export column names as Python submodules.
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let trade = PyModule::new(m.py(), "trade")?;
    trade.add("PRODUCT_CODE", schema::trade::PRODUCT_CODE)?;
    trade.add("PRODUCT", schema::trade::PRODUCT)?;
    trade.add("YEAR", schema::trade::YEAR)?;
    trade.add("POUNDS_PER_METRIC_TON", schema::trade::POUNDS_PER_METRIC_TON)?;
    m.add_submodule(&trade)?;

    let statistics = PyModule::new(m.py(), "statistics")?;
    statistics.add("YEAR", schema::statistics::YEAR)?;
    statistics.add("PERIOD", schema::statistics::PERIOD)?;
    statistics.add("DATA_ITEM", schema::statistics::DATA_ITEM)?;
    statistics.add("VALUE", schema::statistics::VALUE)?;
    statistics.add("BEGINNING_STOCK", schema::statistics::BEGINNING_STOCK)?;
    m.add_submodule(&statistics)?;

    let tidy = PyModule::new(m.py(), "tidy")?;
    tidy.add("DATE", schema::tidy::DATE)?;
    m.add_submodule(&tidy)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn agstat_tidy(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::PyTradeVolumeReshaper>()?;
    m.add_class::<python::PyStatisticsReshaper>()?;
    add_schema_exports(m)?;
    Ok(())
}
