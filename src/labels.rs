use std::collections::{HashMap, HashSet};

use polars::prelude::*;

use crate::error::{Result, TidyError};

const MONTHS: [(&str, &str); 12] = [
    ("JAN", "JANUARY"),
    ("FEB", "FEBRUARY"),
    ("MAR", "MARCH"),
    ("APR", "APRIL"),
    ("MAY", "MAY"),
    ("JUN", "JUNE"),
    ("JUL", "JULY"),
    ("AUG", "AUGUST"),
    ("SEP", "SEPTEMBER"),
    ("OCT", "OCTOBER"),
    ("NOV", "NOVEMBER"),
    ("DEC", "DECEMBER"),
];

/// Explicit lookup table from a report label to a canonical value.
///
/// Labels are matched after trimming and upper-casing. Looking up a label
/// with no entry is an error, never a silent pass-through.
#[derive(Debug, Clone)]
pub struct LabelMap<T> {
    kind: String,
    entries: HashMap<String, T>,
}

impl<T: Clone> LabelMap<T> {
    pub fn explicit<K: AsRef<str>>(
        kind: impl Into<String>,
        pairs: impl IntoIterator<Item = (K, T)>,
    ) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (normalize(k.as_ref()), v))
            .collect();
        Self {
            kind: kind.into(),
            entries,
        }
    }

    /// Pair labels, in the order they were first encountered, with `canonical`.
    ///
    /// Both sides must have the same length.
    pub fn positional(
        kind: impl Into<String>,
        encountered: &[String],
        canonical: &[T],
    ) -> Result<Self> {
        let kind = kind.into();
        if encountered.len() != canonical.len() {
            return Err(TidyError::CardinalityMismatch {
                kind,
                found: encountered.len(),
                expected: canonical.len(),
            });
        }
        Ok(Self::explicit(
            kind,
            encountered.iter().zip(canonical.iter().cloned()),
        ))
    }

    pub fn extend<K: AsRef<str>>(&mut self, pairs: impl IntoIterator<Item = (K, T)>) {
        self.entries
            .extend(pairs.into_iter().map(|(k, v)| (normalize(k.as_ref()), v)));
    }

    pub fn get(&self, label: &str) -> Result<&T> {
        self.entries
            .get(&normalize(label))
            .ok_or_else(|| TidyError::UnknownLabel {
                kind: self.kind.clone(),
                label: label.to_string(),
            })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries none of `seen` resolved to, sorted.
    pub fn unused<'s>(&self, seen: impl IntoIterator<Item = &'s str>) -> Vec<&str> {
        let seen: HashSet<String> = seen.into_iter().map(normalize).collect();
        let mut unused: Vec<&str> = self
            .entries
            .keys()
            .filter(|k| !seen.contains(*k))
            .map(String::as_str)
            .collect();
        unused.sort_unstable();
        unused
    }
}

impl LabelMap<u32> {
    /// Period labels used by QuickStats monthly series.
    pub fn calendar() -> Self {
        let mut pairs: Vec<(String, u32)> = Vec::with_capacity(MONTHS.len() * 5);
        for (i, (abbr, full)) in MONTHS.iter().enumerate() {
            let month = i as u32 + 1;
            pairs.push((abbr.to_string(), month));
            pairs.push((full.to_string(), month));
            pairs.push((format!("END OF {abbr}"), month));
            pairs.push((format!("END OF {full}"), month));
            pairs.push((format!("FIRST OF {abbr}"), month));
        }
        Self::explicit("period", pairs)
    }
}

fn normalize(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Distinct non-null values of a String column, in first-encountered order.
pub fn distinct_in_order(column: &Column) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in column.str()?.into_iter().flatten() {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_covers_stock_and_production_periods() -> Result<()> {
        let periods = LabelMap::calendar();
        assert_eq!(*periods.get("JAN")?, 1);
        assert_eq!(*periods.get("END OF DEC")?, 12);
        assert_eq!(*periods.get(" first of mar ")?, 3);
        assert_eq!(*periods.get("September")?, 9);
        Ok(())
    }

    #[test]
    fn unknown_label_is_an_error() {
        let periods = LabelMap::calendar();
        match periods.get("MARKETING YEAR") {
            Err(TidyError::UnknownLabel { kind, label }) => {
                assert_eq!(kind, "period");
                assert_eq!(label, "MARKETING YEAR");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn extended_periods_resolve() -> Result<()> {
        let mut periods = LabelMap::calendar();
        periods.extend([("MARKETING YEAR", 12u32)]);
        assert_eq!(*periods.get("marketing year")?, 12);
        Ok(())
    }

    #[test]
    fn positional_requires_matching_counts() -> Result<()> {
        let labels = vec![
            "BUTTER - STOCKS, MEASURED IN LB".to_string(),
            "CHEESE, AMERICAN - STOCKS, MEASURED IN LB".to_string(),
        ];
        let items = LabelMap::positional(
            "data item",
            &labels,
            &["BUTTER".to_string(), "AMERICAN".to_string()],
        )?;
        assert_eq!(items.get(&labels[1])?, "AMERICAN");

        match LabelMap::positional("data item", &labels, &["BUTTER".to_string()]) {
            Err(TidyError::CardinalityMismatch {
                found, expected, ..
            }) => {
                assert_eq!(found, 2);
                assert_eq!(expected, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn unused_entries_are_listed() {
        let items = LabelMap::explicit("data item", [("A", "x"), ("B", "y"), ("C", "z")]);
        assert_eq!(items.unused(["a", "C"]), vec!["B"]);
    }

    #[test]
    fn distinct_values_keep_first_seen_order() -> Result<()> {
        let column = Column::new(
            "Period".into(),
            &[Some("FEB"), Some("JAN"), None, Some("FEB"), Some("MAR")],
        );
        assert_eq!(distinct_in_order(&column)?, vec!["FEB", "JAN", "MAR"]);
        Ok(())
    }
}
