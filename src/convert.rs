use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::{Result, TidyError};

/// Parse a report number such as `"1,234.5"`. Thousands separators and
/// surrounding whitespace are ignored.
pub fn parse_number(column: &str, raw: &str) -> Result<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().map_err(|_| TidyError::Parse {
        column: column.to_string(),
        value: raw.to_string(),
    })
}

/// Round half to even, the way the report tooling rounds.
pub fn round_to_i64(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Convert a String column of report numbers into a rounded Int64 column,
/// scaling each value by `factor` first. Nulls stay null.
pub fn numeric_column(df: &DataFrame, column: &str, factor: f64) -> Result<Column> {
    let values = df
        .column(column)?
        .str()?
        .into_iter()
        .map(|v| {
            v.map(|raw| parse_number(column, raw).map(|n| round_to_i64(n * factor)))
                .transpose()
        })
        .collect::<Result<Vec<Option<i64>>>>()?;

    Ok(Column::new(column.into(), values))
}

/// First day of `month` in the year given by the last four characters of
/// `year`. GATS labels partial years as e.g. `"Jan-Dec 2020"`.
pub fn month_start(year: &str, month: u32) -> Result<NaiveDate> {
    let trimmed = year.trim();
    let start = trimmed
        .char_indices()
        .rev()
        .nth(3)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let digits = &trimmed[start..];

    let y: i32 = digits
        .parse()
        .map_err(|_| TidyError::InvalidYear(year.to_string()))?;
    NaiveDate::from_ymd_opt(y, month, 1).ok_or_else(|| TidyError::InvalidYear(year.to_string()))
}

/// Build a Date column from calendar dates.
pub fn date_column(name: &str, dates: &[Option<NaiveDate>]) -> Result<Column> {
    // NaiveDate::default() is 1970-01-01, the Date epoch.
    let epoch = NaiveDate::default();
    let days: Vec<Option<i32>> = dates
        .iter()
        .map(|d| d.map(|d| (d - epoch).num_days() as i32))
        .collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

/// Upper-case the first letter of every word, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::trade::POUNDS_PER_METRIC_TON;

    #[test]
    fn thousands_separators_are_stripped() -> Result<()> {
        assert_eq!(parse_number("Value", "1,000")?, 1000.0);
        assert_eq!(parse_number("Value", " 12,345.5 ")?, 12345.5);
        Ok(())
    }

    #[test]
    fn metric_tons_to_pounds_is_exact() -> Result<()> {
        let tons = parse_number("Imports", "1,000")?;
        assert_eq!(round_to_i64(tons * POUNDS_PER_METRIC_TON), 2_204_623);
        let tons = parse_number("Imports", "100")?;
        assert_eq!(round_to_i64(tons * POUNDS_PER_METRIC_TON), 220_462);
        Ok(())
    }

    #[test]
    fn suppressed_values_fail_with_the_literal() {
        match parse_number("Value", "(D)") {
            Err(TidyError::Parse { column, value }) => {
                assert_eq!(column, "Value");
                assert_eq!(value, "(D)");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round_to_i64(2.5), 2);
        assert_eq!(round_to_i64(3.5), 4);
        assert_eq!(round_to_i64(-0.4), 0);
    }

    #[test]
    fn numeric_column_keeps_nulls() -> Result<()> {
        let df = DataFrame::new(vec![Column::new(
            "Value".into(),
            &[Some("1,200"), None, Some("7")],
        )])?;
        let converted = numeric_column(&df, "Value", 1.0)?;
        let values: Vec<Option<i64>> = converted.i64()?.into_iter().collect();
        assert_eq!(values, vec![Some(1200), None, Some(7)]);
        Ok(())
    }

    #[test]
    fn month_start_uses_trailing_year() -> Result<()> {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 1);
        assert_eq!(Some(month_start("2020", 3)?), expected);
        assert_eq!(Some(month_start("Jan-Dec 2020", 3)?), expected);
        assert!(matches!(
            month_start("n/a", 1),
            Err(TidyError::InvalidYear(_))
        ));
        assert!(matches!(
            month_start("2020", 13),
            Err(TidyError::InvalidYear(_))
        ));
        Ok(())
    }

    #[test]
    fn date_column_renders_iso_dates() -> Result<()> {
        let dates = [NaiveDate::from_ymd_opt(2020, 1, 1), None];
        let column = date_column("Date", &dates)?;
        assert_eq!(column.dtype(), &DataType::Date);
        let rendered = column.cast(&DataType::String)?;
        assert_eq!(rendered.str()?.get(0), Some("2020-01-01"));
        assert_eq!(rendered.str()?.get(1), None);
        Ok(())
    }

    #[test]
    fn title_case_matches_report_names() {
        assert_eq!(title_case("butter"), "Butter");
        assert_eq!(title_case("NONFAT dry-milk"), "Nonfat Dry-Milk");
        assert_eq!(title_case("imports"), "Imports");
    }
}
