use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::debug;

use crate::error::{Result, TidyError};

/// Read a report CSV with every column as String dtype.
///
/// The first `skip_lines` physical lines (report banners) are dropped before
/// the header row is parsed. Column names are trimmed of surrounding
/// whitespace. Empty cells come back as nulls.
pub fn read_csv_as_strings(path: &Path, skip_lines: usize) -> Result<DataFrame> {
    // The handle is closed before parsing starts.
    let text = fs::read_to_string(path)?;
    let body = strip_banner(&text, skip_lines).ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!(
                "{} ends inside its {skip_lines}-line banner",
                path.display()
            ),
        )
    })?;

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(body.as_bytes().to_vec()))
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read report"
    );
    Ok(df)
}

/// Write `df` to `<title>.csv`, replacing any existing file.
pub fn save_csv(df: &mut DataFrame, title: impl AsRef<Path>) -> Result<PathBuf> {
    let path = csv_path(title);

    let mut file = File::create(&path)?;
    write_csv(df, &mut file)?;

    debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(path)
}

/// `<title>.csv`. Appends rather than replaces, so dots already in the
/// title survive.
pub fn csv_path(title: impl AsRef<Path>) -> PathBuf {
    let mut name = title.as_ref().as_os_str().to_owned();
    name.push(".csv");
    PathBuf::from(name)
}

/// Write `df` as CSV with a header row.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<()> {
    CsvWriter::new(writer).include_header(true).finish(df)?;
    Ok(())
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(TidyError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

fn strip_banner(text: &str, lines: usize) -> Option<&str> {
    let mut rest = text;
    for _ in 0..lines {
        let pos = rest.find('\n')?;
        rest = &rest[pos + 1..];
    }
    Some(rest)
}
