use std::collections::HashMap;

use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::statistics::{self, StatisticKind};
use crate::trade::{self, Direction};

/// Python handle for one GATS trade report.
#[pyclass(name = "TradeVolumeReshaper")]
pub struct PyTradeVolumeReshaper {
    inner: trade::TradeVolumeReshaper,
}

#[pymethods]
impl PyTradeVolumeReshaper {
    #[new]
    fn new(path: String, direction: &str, codes: Vec<u64>, product: &str) -> PyResult<Self> {
        let direction: Direction = direction.parse()?;
        Ok(Self {
            inner: trade::TradeVolumeReshaper::new(path, direction, codes, product),
        })
    }

    #[getter]
    fn product(&self) -> String {
        self.inner.product().to_string()
    }

    #[getter]
    fn direction(&self) -> &'static str {
        self.inner.direction().label()
    }

    /// Report with the banner removed, all columns as strings.
    fn load(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.load()?))
    }

    /// Date column plus one pounds column for the product.
    fn transform(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.transform()?))
    }

    /// Transform and write `<title>.csv`.
    fn save(&self, title: &str) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.save(title)?))
    }
}

/// Python handle for one QuickStats export.
#[pyclass(name = "StatisticsReshaper")]
pub struct PyStatisticsReshaper {
    inner: statistics::StatisticsReshaper,
}

#[pymethods]
impl PyStatisticsReshaper {
    #[new]
    #[pyo3(signature = (path, kind, items=Vec::new(), labels=None, periods=None))]
    fn new(
        path: String,
        kind: &str,
        items: Vec<String>,
        labels: Option<HashMap<String, String>>,
        periods: Option<HashMap<String, u32>>,
    ) -> PyResult<Self> {
        let kind: StatisticKind = kind.parse()?;
        let mut inner = statistics::StatisticsReshaper::new(path, kind, items);
        if let Some(labels) = labels {
            // Stable column order regardless of dict hashing.
            let mut labels: Vec<(String, String)> = labels.into_iter().collect();
            labels.sort();
            inner = inner.with_labels(labels);
        }
        if let Some(periods) = periods {
            inner = inner.with_periods(periods);
        }
        Ok(Self { inner })
    }

    #[getter]
    fn kind(&self) -> String {
        self.inner.kind().label().to_string()
    }

    /// Export with fully empty columns dropped.
    fn load(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.load()?))
    }

    fn transform(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.transform()?))
    }

    fn save(&self, title: &str) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.save(title)?))
    }
}
