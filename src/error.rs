#[cfg(feature = "python")]
use pyo3::exceptions::PyRuntimeError;
#[cfg(feature = "python")]
use pyo3::PyErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TidyError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}': cannot parse '{value}' as a number")]
    Parse { column: String, value: String },

    #[error("Invalid year '{0}'")]
    InvalidYear(String),

    #[error("{kind}: found {found} distinct labels but {expected} names were supplied")]
    CardinalityMismatch {
        kind: String,
        found: usize,
        expected: usize,
    },

    #[error("No mapping for {kind} label '{label}'")]
    UnknownLabel { kind: String, label: String },

    #[error("Duplicate entry for '{key}' at {index}")]
    DuplicateEntry { index: String, key: String },

    #[error("Config: {0}")]
    Config(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TidyError>;

#[cfg(feature = "python")]
impl From<TidyError> for PyErr {
    fn from(err: TidyError) -> PyErr {
        PyRuntimeError::new_err(err.to_string())
    }
}
