//! Row filters applied after normalization
//!
//! Filters never fail. When their target column is missing they hand the
//! table back untouched and report [`FilterStatus::NotApplied`] so the caller
//! can warn.

use crate::keywords::KeywordSet;
use crate::table::TabularResult;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADCOUNT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s*(?:-\s*(\S+))?\s*$").unwrap()
});

/// Target column plus the keywords to look for in it
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub keywords: KeywordSet,
}

impl FilterSpec {
    pub fn new(column: impl Into<String>, keywords: KeywordSet) -> Self {
        FilterSpec {
            column: column.into(),
            keywords,
        }
    }
}

/// Whether a filter touched the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStatus {
    Applied { kept: usize, dropped: usize },
    NotApplied { column: String },
}

/// A table after filtering
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered {
    pub table: TabularResult,
    pub status: FilterStatus,
}

/// Keep rows whose target column contains any keyword, ignoring case
pub struct KeywordFilter;

impl KeywordFilter {
    pub fn apply(table: &TabularResult, spec: &FilterSpec) -> Filtered {
        let column = match table.column(&spec.column) {
            Some(c) => c,
            None => return not_applied(table, &spec.column),
        };

        let keep: Vec<bool> = column
            .cells
            .iter()
            .map(|cell| {
                let text = cell.as_text().to_lowercase();
                spec.keywords.iter().any(|k| text.contains(k))
            })
            .collect();

        applied(table, &keep)
    }
}

/// Keep rows whose head-count range exceeds a threshold
pub struct HeadcountFilter;

impl HeadcountFilter {
    pub fn apply(table: &TabularResult, column: &str, threshold: u64) -> Filtered {
        let column = match table.column(column) {
            Some(c) => c,
            None => return not_applied(table, column),
        };

        let keep: Vec<bool> = column
            .cells
            .iter()
            .map(|cell| parse_headcount(&cell.as_text()) > threshold)
            .collect();

        applied(table, &keep)
    }
}

/// Upper bound of a range like `1,001-5,000`, the number in `10,001+` or
/// `500`. Anything else counts as zero.
pub fn parse_headcount(raw: &str) -> u64 {
    let cleaned: String = raw.chars().filter(|c| *c != '+' && *c != ',').collect();
    let caps = match HEADCOUNT_REGEX.captures(&cleaned) {
        Some(caps) => caps,
        None => return 0,
    };

    match caps.get(2) {
        Some(upper) => upper.as_str().parse().unwrap_or(0),
        None => caps[1].parse().unwrap_or(0),
    }
}

fn not_applied(table: &TabularResult, column: &str) -> Filtered {
    Filtered {
        table: table.clone(),
        status: FilterStatus::NotApplied {
            column: column.to_string(),
        },
    }
}

fn applied(table: &TabularResult, keep: &[bool]) -> Filtered {
    let kept = keep.iter().filter(|k| **k).count();
    Filtered {
        table: table.retain_rows(keep),
        status: FilterStatus::Applied {
            kept,
            dropped: keep.len() - kept,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column};

    fn profiles() -> TabularResult {
        TabularResult::from_columns(vec![
            Column::new("name", vec!["Ada".into(), "Grace".into(), "Linus".into(), "Ken".into()]),
            Column::new(
                "headline",
                vec![
                    "Founder & CEO at Analytical Engines".into(),
                    "Rear Admiral".into(),
                    Cell::Null,
                    "VP of Engineering".into(),
                ],
            ),
        ])
    }

    #[test]
    fn test_keeps_matching_rows_in_order() {
        let spec = FilterSpec::new("headline", KeywordSet::new(["ceo", "vp of engineering"]));

        let filtered = KeywordFilter::apply(&profiles(), &spec);

        assert_eq!(filtered.status, FilterStatus::Applied { kept: 2, dropped: 2 });
        let names: Vec<String> = filtered
            .table
            .column("name")
            .unwrap()
            .cells
            .iter()
            .map(|c| c.as_text().into_owned())
            .collect();
        assert_eq!(names, vec!["Ada", "Ken"]);
        // matching never rewrites the target column
        assert_eq!(
            filtered.table.cell(0, "headline").unwrap().as_text(),
            "Founder & CEO at Analytical Engines"
        );
    }

    #[test]
    fn test_survivors_match_and_dropped_rows_do_not() {
        let keywords = KeywordSet::decision_makers();
        let spec = FilterSpec::new("headline", keywords.clone());
        let table = profiles();

        let filtered = KeywordFilter::apply(&table, &spec);

        let matches = |text: &str| {
            let text = text.to_lowercase();
            keywords.iter().any(|k| text.contains(k))
        };
        for cell in &filtered.table.column("headline").unwrap().cells {
            assert!(matches(&cell.as_text()));
        }
        let dropped = table.column("headline").unwrap().cells.len() - filtered.table.len();
        let non_matching = table
            .column("headline")
            .unwrap()
            .cells
            .iter()
            .filter(|c| !matches(&c.as_text()))
            .count();
        assert_eq!(dropped, non_matching);
    }

    #[test]
    fn test_missing_column_passes_table_through() {
        let spec = FilterSpec::new("liProfileHeadline", KeywordSet::decision_makers());
        let table = profiles();

        let filtered = KeywordFilter::apply(&table, &spec);

        assert_eq!(filtered.table, table);
        assert_eq!(
            filtered.status,
            FilterStatus::NotApplied { column: "liProfileHeadline".into() }
        );
    }

    #[test]
    fn test_parse_headcount() {
        assert_eq!(parse_headcount("1,001-5,000"), 5000);
        assert_eq!(parse_headcount("10,001+"), 10001);
        assert_eq!(parse_headcount("500"), 500);
        assert_eq!(parse_headcount("51 - 200"), 200);
        assert_eq!(parse_headcount("self-employed"), 0);
        assert_eq!(parse_headcount("1-abc"), 0);
        assert_eq!(parse_headcount(""), 0);
    }

    #[test]
    fn test_headcount_filter() {
        let table = TabularResult::from_columns(vec![Column::new(
            "profile_headcountRange",
            vec!["11-50".into(), "1,001-5,000".into(), Cell::Number(451.0), Cell::Null],
        )]);

        let filtered = HeadcountFilter::apply(&table, "profile_headcountRange", 450);

        assert_eq!(filtered.status, FilterStatus::Applied { kept: 2, dropped: 2 });
        assert!(matches!(
            HeadcountFilter::apply(&table, "headcount", 450).status,
            FilterStatus::NotApplied { .. }
        ));
    }
}
