use polars::prelude::*;

use crate::error::{Result, TidyError};
use crate::labels::distinct_in_order;

const ROWS_PER_CELL: &str = "__rows_per_cell";

/// How `pivot` combines several rows landing in the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotAgg {
    Sum,
    /// Every (index, column) pair must occur at most once.
    Unique,
}

/// Drop every column that is null in all rows. Tables without rows are
/// returned unchanged.
pub fn drop_empty_columns(df: &DataFrame) -> Result<DataFrame> {
    let height = df.height();
    if height == 0 {
        return Ok(df.clone());
    }

    let keep: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| c.null_count() < height)
        .map(|c| c.name().to_string())
        .collect();

    Ok(df.select(keep)?)
}

/// Stack the `on` columns into a (`variable_name`, `value_name`) pair.
///
/// Output is grouped by source column: all rows for `on[0]` first, then
/// `on[1]`, and so on. Row order inside each block is preserved.
pub fn unpivot(
    df: &DataFrame,
    index: &[&str],
    on: &[&str],
    variable_name: &str,
    value_name: &str,
) -> Result<DataFrame> {
    let mut output: Vec<Expr> = index.iter().map(|c| col(*c)).collect();
    output.push(col(variable_name));
    output.push(col(value_name));

    let blocks: Vec<LazyFrame> = on
        .iter()
        .map(|name| {
            let mut exprs: Vec<Expr> = index.iter().map(|c| col(*c)).collect();
            exprs.push(col(*name).alias(value_name));
            df.clone()
                .lazy()
                .select(exprs)
                .with_columns([lit(*name).alias(variable_name)])
                .select(output.clone())
        })
        .collect();

    if blocks.is_empty() {
        return Err(TidyError::MissingColumn(format!(
            "no value columns to unpivot into '{value_name}'"
        )));
    }

    Ok(concat(blocks, UnionArgs::default())?.collect()?)
}

/// Spread `on` into one column per distinct value, indexed by `index`.
///
/// Output columns are `index` followed by the distinct `on` values in sorted
/// order; rows are sorted ascending by `index`. Cells with no source row are
/// null.
///
/// With [`PivotAgg::Unique`] every cell is checked before spreading, so a
/// second row for the same cell fails with `DuplicateEntry` instead of one
/// value being kept.
pub fn pivot(
    df: &DataFrame,
    index: &str,
    on: &str,
    values: &str,
    agg: PivotAgg,
) -> Result<DataFrame> {
    let combine = match agg {
        PivotAgg::Sum => col(values).sum(),
        PivotAgg::Unique => col(values).first(),
    };

    let cells = df
        .clone()
        .lazy()
        .group_by_stable([col(index), col(on)])
        .agg([
            combine,
            col(values).len().cast(DataType::UInt64).alias(ROWS_PER_CELL),
        ])
        .collect()?;

    if agg == PivotAgg::Unique {
        ensure_unique_cells(&cells, index, on)?;
    }

    let mut keys = distinct_in_order(cells.column(on)?)?;
    keys.sort();

    let dates = cells.column(index)?.as_materialized_series().unique()?;
    let mut wide = DataFrame::new(vec![dates.into()])?.lazy();

    for key in &keys {
        let part = cells
            .clone()
            .lazy()
            .filter(col(on).eq(lit(key.as_str())))
            .select([col(index), col(values).alias(key.as_str())]);
        wide = wide.join(
            part,
            [col(index)],
            [col(index)],
            JoinArgs::new(JoinType::Left),
        );
    }

    Ok(wide
        .sort([index], SortMultipleOptions::default())
        .collect()?)
}

fn ensure_unique_cells(cells: &DataFrame, index: &str, on: &str) -> Result<()> {
    let counts = cells.column(ROWS_PER_CELL)?.u64()?;
    for (i, n) in counts.into_iter().enumerate() {
        if n.unwrap_or(0) > 1 {
            let at = cells.column(index)?.get(i)?;
            let key = cells.column(on)?.get(i)?;
            return Err(TidyError::DuplicateEntry {
                index: format!("{at}"),
                key: match key {
                    AnyValue::String(s) => s.to_string(),
                    other => format!("{other}"),
                },
            });
        }
    }
    Ok(())
}

/// Add `target = source shifted down one row` for every pair. Row 0 of each
/// target is null.
pub fn with_lagged(df: DataFrame, pairs: &[(&str, String)]) -> Result<DataFrame> {
    if pairs.is_empty() {
        return Ok(df);
    }
    let exprs: Vec<Expr> = pairs
        .iter()
        .map(|(source, target)| col(*source).shift(lit(1)).alias(target.as_str()))
        .collect();
    Ok(df.lazy().with_columns(exprs).collect()?)
}

/// Replace nulls in `columns` with zero.
pub fn fill_null_zero(df: DataFrame, columns: &[String]) -> Result<DataFrame> {
    if columns.is_empty() {
        return Ok(df);
    }
    let exprs: Vec<Expr> = columns
        .iter()
        .map(|c| col(c.as_str()).fill_null(lit(0i64)))
        .collect();
    Ok(df.lazy().with_columns(exprs).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_table() -> Result<DataFrame> {
        Ok(DataFrame::new(vec![
            Column::new("Date".into(), &["2020-02", "2020-01", "2020-01", "2020-01"]),
            Column::new("Product".into(), &["Butter", "Butter", "Butter", "Cheese"]),
            Column::new("Imports".into(), &[Some(5i64), Some(1), Some(2), None]),
        ])?)
    }

    fn i64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
        Ok(df.column(name)?.i64()?.into_iter().collect())
    }

    #[test]
    fn drops_only_fully_empty_columns() -> Result<()> {
        let df = DataFrame::new(vec![
            Column::new("Year".into(), &[Some("2020"), Some("2021")]),
            Column::new("".into(), &[None::<&str>, None]),
            Column::new("CV (%)".into(), &[None, Some("1.2")]),
        ])?;
        let out = drop_empty_columns(&df)?;
        assert_eq!(out.get_column_names_str(), vec!["Year", "CV (%)"]);
        Ok(())
    }

    #[test]
    fn unpivot_stacks_blocks_in_column_order() -> Result<()> {
        let df = DataFrame::new(vec![
            Column::new("Code".into(), &["a", "b"]),
            Column::new("1".into(), &["10", "20"]),
            Column::new("2".into(), &["11", "21"]),
        ])?;
        let out = unpivot(&df, &["Code"], &["1", "2"], "Month", "Qty")?;
        assert_eq!(out.height(), 4);
        assert_eq!(out.get_column_names_str(), vec!["Code", "Month", "Qty"]);
        let months: Vec<Option<&str>> = out.column("Month")?.str()?.into_iter().collect();
        assert_eq!(months, vec![Some("1"), Some("1"), Some("2"), Some("2")]);
        let qty: Vec<Option<&str>> = out.column("Qty")?.str()?.into_iter().collect();
        assert_eq!(qty, vec![Some("10"), Some("20"), Some("11"), Some("21")]);
        Ok(())
    }

    #[test]
    fn unpivot_without_value_columns_is_a_schema_error() -> Result<()> {
        let df = DataFrame::new(vec![Column::new("Code".into(), &["a"])])?;
        assert!(matches!(
            unpivot(&df, &["Code"], &[], "Month", "Qty"),
            Err(TidyError::MissingColumn(_))
        ));
        Ok(())
    }

    #[test]
    fn pivot_sums_duplicates_and_sorts_by_index() -> Result<()> {
        let out = pivot(&long_table()?, "Date", "Product", "Imports", PivotAgg::Sum)?;
        assert_eq!(out.get_column_names_str(), vec!["Date", "Butter", "Cheese"]);
        let dates: Vec<Option<&str>> = out.column("Date")?.str()?.into_iter().collect();
        assert_eq!(dates, vec![Some("2020-01"), Some("2020-02")]);
        assert_eq!(i64_values(&out, "Butter")?, vec![Some(3), Some(5)]);
        assert_eq!(i64_values(&out, "Cheese")?[1], None);
        Ok(())
    }

    #[test]
    fn unique_pivot_rejects_duplicate_cells() -> Result<()> {
        match pivot(&long_table()?, "Date", "Product", "Imports", PivotAgg::Unique) {
            Err(TidyError::DuplicateEntry { index, key }) => {
                assert!(index.contains("2020-01"));
                assert_eq!(key, "Butter");
            }
            other => panic!("unexpected: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn pivot_of_empty_table_keeps_index_column() -> Result<()> {
        let empty = long_table()?.head(Some(0));
        let out = pivot(&empty, "Date", "Product", "Imports", PivotAgg::Sum)?;
        assert_eq!(out.height(), 0);
        assert_eq!(out.get_column_names_str(), vec!["Date"]);
        Ok(())
    }

    #[test]
    fn lag_shifts_down_one_row() -> Result<()> {
        let df = DataFrame::new(vec![Column::new("BUTTER".into(), &[10i64, 20, 30])])?;
        let out = with_lagged(df, &[("BUTTER", "BUTTER Beginning Stock".to_string())])?;
        assert_eq!(
            i64_values(&out, "BUTTER Beginning Stock")?,
            vec![None, Some(10), Some(20)]
        );
        Ok(())
    }

    #[test]
    fn nulls_become_zero() -> Result<()> {
        let df = DataFrame::new(vec![Column::new("Cheese".into(), &[None, Some(4i64)])])?;
        let out = fill_null_zero(df, &["Cheese".to_string()])?;
        assert_eq!(i64_values(&out, "Cheese")?, vec![Some(0), Some(4)]);
        Ok(())
    }
}
