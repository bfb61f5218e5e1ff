//! Tabular results - ordered, named, equal-length columns of scalar cells
//!
//! Every stage of a pipeline ends up here: the normalizer produces a
//! [`TabularResult`], filters remove rows from it, merges glue two of them
//! side by side and the report writer turns them into sheets.

pub mod normalizer;

pub use normalizer::{NormalizeConfig, NormalizeReport, TableNormalizer};

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// A single scalar cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    /// Integral values, kept exact so 19-digit activity and URN ids survive
    Integer(i64),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// True for null cells and empty text
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Null => true,
            Cell::Text(s) => s.is_empty(),
            Cell::Integer(_) | Cell::Number(_) => false,
        }
    }

    /// Textual form used for matching and export. Null renders as "".
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Null => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
            Cell::Integer(i) => Cow::Owned(i.to_string()),
            Cell::Number(n) => Cow::Owned(format_number(*n)),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Integer(i) => Some(*i as f64),
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<i64> for Cell {
    fn from(i: i64) -> Self {
        Cell::Integer(i)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Integral values print without a trailing ".0" so ids and counts survive export
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One named column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Column {
            name: name.into(),
            cells,
        }
    }

    /// All cells null, or all cells empty text
    pub fn is_empty_column(&self) -> bool {
        self.cells.iter().all(Cell::is_null)
            || self.cells.iter().all(|c| matches!(c, Cell::Text(s) if s.is_empty()))
    }

    /// At least one number and nothing but numbers or nulls
    pub fn is_numeric(&self) -> bool {
        self.cells.iter().any(|c| matches!(c, Cell::Integer(_) | Cell::Number(_)))
            && self
                .cells
                .iter()
                .all(|c| matches!(c, Cell::Integer(_) | Cell::Number(_) | Cell::Null))
    }
}

/// An ordered set of equal-length columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularResult {
    columns: Vec<Column>,
}

impl TabularResult {
    pub fn new() -> Self {
        TabularResult::default()
    }

    /// Build from columns. Shorter columns are padded with nulls so that the
    /// equal-length invariant always holds.
    pub fn from_columns(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.cells.len()).max().unwrap_or(0);
        for column in columns.iter_mut() {
            column.cells.resize(rows, Cell::Null);
        }
        TabularResult { columns }
    }

    /// Build from a header and row-major data. Rows are padded or truncated
    /// to the header width.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut columns: Vec<Column> = header
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let mut row = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(row.next().unwrap_or(Cell::Null));
            }
        }

        TabularResult { columns }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        self.column(column).and_then(|c| c.cells.get(row))
    }

    /// Row `index` as (column name, cell) pairs
    pub fn row(&self, index: usize) -> Vec<(&str, &Cell)> {
        self.columns
            .iter()
            .filter_map(|c| c.cells.get(index).map(|cell| (c.name.as_str(), cell)))
            .collect()
    }

    /// Append a column, padding or truncating it to the current row count.
    /// The first column of an empty table sets the row count.
    pub fn push_column(&mut self, mut column: Column) {
        if !self.columns.is_empty() {
            column.cells.resize(self.len(), Cell::Null);
        }
        self.columns.push(column);
    }

    /// Keep the rows whose `keep` flag is set, in their original order
    pub fn retain_rows(&self, keep: &[bool]) -> TabularResult {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let cells = c
                    .cells
                    .iter()
                    .zip(keep.iter())
                    .filter(|(_, k)| **k)
                    .map(|(cell, _)| cell.clone())
                    .collect();
                Column::new(c.name.clone(), cells)
            })
            .collect();
        TabularResult { columns }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> TabularResult {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), c.cells.iter().take(n).cloned().collect()))
            .collect();
        TabularResult { columns }
    }

    /// Project onto the named columns that exist, in the order given
    pub fn select(&self, names: &[&str]) -> TabularResult {
        let columns = names
            .iter()
            .filter_map(|name| self.column(name).cloned())
            .collect();
        TabularResult { columns }
    }

    /// Remove columns that are entirely null or entirely empty text
    pub fn drop_empty_columns(mut self) -> TabularResult {
        self.columns.retain(|c| !c.is_empty_column());
        self
    }

    /// Prefix every column name except those matching `keep` (case-insensitive)
    pub fn prefix_columns(mut self, prefix: &str, keep: &str) -> TabularResult {
        for column in self.columns.iter_mut() {
            if !column.name.eq_ignore_ascii_case(keep) {
                column.name = format!("{}{}", prefix, column.name);
            }
        }
        self
    }

    /// Row-wise positional concatenation: both tables are cut to the shorter
    /// length and `other`'s columns are appended. When a name collides the
    /// first occurrence wins.
    pub fn concat_columns(&self, other: &TabularResult) -> TabularResult {
        let rows = self.len().min(other.len());
        let mut seen = HashSet::new();
        let columns = self
            .columns
            .iter()
            .chain(other.columns.iter())
            .filter(|c| seen.insert(c.name.clone()))
            .map(|c| Column::new(c.name.clone(), c.cells.iter().take(rows).cloned().collect()))
            .collect();
        TabularResult { columns }
    }

    /// Unique non-blank values of `column` as text, in row order
    pub fn unique_values(&self, column: &str) -> Option<Vec<String>> {
        let column = self.column(column)?;
        let mut seen = HashSet::new();
        Some(
            column
                .cells
                .iter()
                .filter(|c| !c.is_blank())
                .map(|c| c.as_text().into_owned())
                .filter(|v| seen.insert(v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> TabularResult {
        TabularResult::from_columns(vec![
            Column::new("name", vec!["Ada".into(), "Grace".into(), "Linus".into()]),
            Column::new("age", vec![36.0.into(), 85.0.into(), Cell::Null]),
        ])
    }

    #[test]
    fn test_from_columns_pads_short_columns() {
        let table = TabularResult::from_columns(vec![
            Column::new("a", vec![1.0.into(), 2.0.into()]),
            Column::new("b", vec!["x".into()]),
        ]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "b"), Some(&Cell::Null));
    }

    #[test]
    fn test_retain_rows_preserves_order() {
        let table = people().retain_rows(&[true, false, true]);

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "name").unwrap().as_text(), "Ada");
        assert_eq!(table.cell(1, "name").unwrap().as_text(), "Linus");
    }

    #[test]
    fn test_concat_columns_cuts_to_shorter_and_dedupes() {
        let left = people();
        let right = TabularResult::from_columns(vec![
            Column::new("name", vec!["dup".into(), "dup".into()]),
            Column::new("city", vec!["London".into(), "Arlington".into()]),
        ]);

        let merged = left.concat_columns(&right);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.column_names(), vec!["name", "age", "city"]);
        assert_eq!(merged.cell(0, "name").unwrap().as_text(), "Ada");
        assert_eq!(merged.cell(1, "city").unwrap().as_text(), "Arlington");
    }

    #[test]
    fn test_prefix_columns_keeps_join_column() {
        let table = TabularResult::from_columns(vec![
            Column::new("liPublicProfileUrl", vec!["u".into()]),
            Column::new("headline", vec!["h".into()]),
        ])
        .prefix_columns("profile_", "liPublicProfileURL");

        assert_eq!(table.column_names(), vec!["liPublicProfileUrl", "profile_headline"]);
    }

    #[test]
    fn test_unique_values_skips_blanks_and_repeats() {
        let table = TabularResult::from_columns(vec![Column::new(
            "url",
            vec!["b".into(), Cell::Null, "a".into(), "b".into(), "".into()],
        )]);

        assert_eq!(table.unique_values("url").unwrap(), vec!["b", "a"]);
        assert!(table.unique_values("missing").is_none());
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(Cell::Number(42.0).as_text(), "42");
        assert_eq!(Cell::Number(2.5).as_text(), "2.5");
        assert_eq!(Cell::Integer(7123456789012345678).as_text(), "7123456789012345678");
        assert_eq!(Cell::Null.as_text(), "");
    }
}
