//! Reading seed tables from CSV or Excel files

use crate::error::ConfigurationError;
use crate::table::{Cell, TabularResult};
use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto, DataType, Reader};
use std::path::Path;
use tracing::debug;

/// Read the first worksheet of an Excel file, or a whole CSV file.
/// The first row names the columns.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<TabularResult> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let table = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path)?,
        other => bail!("Unsupported input format {:?} for {}", other, path.display()),
    };

    debug!(rows = table.len(), columns = table.width(), path = %path.display(), "input read");
    Ok(table)
}

/// Unique non-blank values of `column` in file order
pub fn unique_column_values(table: &TabularResult, column: &str) -> Result<Vec<String>, ConfigurationError> {
    table
        .unique_values(column)
        .ok_or_else(|| ConfigurationError::MissingColumn(column.to_string()))
}

/// CSV fields are kept as text; empty fields become nulls
fn read_csv(path: &Path) -> Result<TabularResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read CSV record")?;
        rows.push(
            record
                .iter()
                .map(|field| if field.is_empty() { Cell::Null } else { Cell::from(field) })
                .collect(),
        );
    }

    Ok(TabularResult::from_rows(header, rows))
}

fn read_workbook(path: &Path) -> Result<TabularResult> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {} has no worksheets", path.display()))?
        .with_context(|| format!("Failed to read first worksheet of {}", path.display()))?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(row) => row
            .iter()
            .enumerate()
            .map(|(i, c)| match cell_from_excel(c) {
                Cell::Null => format!("col{}", i + 1),
                other => other.as_text().trim().to_string(),
            })
            .collect(),
        None => return Ok(TabularResult::new()),
    };

    let rows = rows
        .map(|row| row.iter().map(cell_from_excel).collect())
        .collect();
    Ok(TabularResult::from_rows(header, rows))
}

fn cell_from_excel(cell: &DataType) -> Cell {
    match cell {
        DataType::Empty => Cell::Null,
        DataType::Int(i) => Cell::Integer(*i),
        DataType::Float(f) => Cell::Number(*f),
        DataType::String(s) if s.trim().is_empty() => Cell::Null,
        DataType::String(s) => Cell::Text(s.clone()),
        DataType::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_csv_with_duplicates_and_blanks() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(
            file,
            "liPublicProfileURL,owner\nhttps://linkedin.com/in/a,x\n,y\nhttps://linkedin.com/in/b,z\nhttps://linkedin.com/in/a,w"
        )
        .unwrap();

        let table = read_table(file.path()).unwrap();

        assert_eq!(table.len(), 4);
        assert!(table.cell(1, "liPublicProfileURL").unwrap().is_null());
        assert_eq!(
            unique_column_values(&table, "liPublicProfileURL").unwrap(),
            vec!["https://linkedin.com/in/a", "https://linkedin.com/in/b"]
        );
    }

    #[test]
    fn test_missing_column_is_a_configuration_error() {
        let table = TabularResult::from_rows(vec!["a".into()], vec![vec!["1".into()]]);
        assert_eq!(
            unique_column_values(&table, "liPostContent").unwrap_err(),
            ConfigurationError::MissingColumn("liPostContent".into())
        );
    }

    #[test]
    fn test_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(read_table(file.path()).is_err());
    }

    #[test]
    fn test_excel_cells() {
        assert_eq!(cell_from_excel(&DataType::Int(3)), Cell::Integer(3));
        assert_eq!(cell_from_excel(&DataType::String("  ".into())), Cell::Null);
        assert_eq!(cell_from_excel(&DataType::Bool(true)), Cell::Text("true".into()));
    }
}
