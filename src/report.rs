//! Export of named tables, one sheet per table

use crate::table::TabularResult;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Longest sheet name spreadsheet tools accept
const MAX_SHEET_NAME: usize = 31;

/// Replace characters spreadsheet tools reject and cap the length
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '*' | '[' | ']' | ':' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();

    if cleaned.trim().is_empty() {
        "sheet".to_string()
    } else {
        cleaned
    }
}

/// Writes a table as CSV: header row, then one record per row
pub fn write_table<W: Write>(table: &TabularResult, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(table.column_names())
        .context("Failed to write header")?;

    for row in 0..table.len() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.cells[row].as_text().into_owned())
            .collect();
        csv.write_record(&record).context("Failed to write row")?;
    }

    csv.flush().context("Failed to flush writer")?;
    Ok(())
}

/// Named tables collected for one export
#[derive(Debug, Clone, Default)]
pub struct ReportAssembler {
    sheets: Vec<(String, TabularResult)>,
}

impl ReportAssembler {
    pub fn new() -> Self {
        ReportAssembler::default()
    }

    /// Add a table. A second table with the same sheet name replaces the first.
    pub fn add(&mut self, name: impl AsRef<str>, table: TabularResult) {
        let name = sanitize_sheet_name(name.as_ref());
        match self.sheets.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = table,
            None => self.sheets.push((name, table)),
        }
    }

    pub fn sheets(&self) -> &[(String, TabularResult)] {
        &self.sheets
    }

    /// Sheets that would be written: empty tables are left out
    pub fn exportable(&self) -> impl Iterator<Item = &(String, TabularResult)> {
        self.sheets.iter().filter(|(_, t)| !t.is_empty() && t.width() > 0)
    }

    /// Write one `<sheet>.csv` per non-empty table into `dir`
    pub fn write_csv_dir<P: AsRef<Path>>(&self, dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let mut written = Vec::new();
        for (name, table) in self.exportable() {
            let path = dir.join(format!("{}.csv", name));
            let file = std::fs::File::create(&path)
                .with_context(|| format!("Failed to create file: {}", path.display()))?;
            write_table(table, file)
                .with_context(|| format!("Failed to write sheet {}", name))?;
            debug!(sheet = %name, rows = table.len(), "sheet written");
            written.push(path);
        }

        info!(sheets = written.len(), dir = %dir.display(), "report exported");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Cell, Column};

    fn table() -> TabularResult {
        TabularResult::from_columns(vec![
            Column::new("name", vec!["Ada".into(), "Grace, Rear Admiral".into()]),
            Column::new("age", vec![Cell::Number(36.0), Cell::Null]),
        ])
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b\\c?d*e[f]g:h"), "a_b_c_d_e_f_g_h");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sanitize_sheet_name(""), "sheet");
    }

    #[test]
    fn test_write_table_quotes_and_blanks() {
        let mut buffer = Vec::new();
        write_table(&table(), &mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output, "name,age\nAda,36\n\"Grace, Rear Admiral\",\n");
    }

    #[test]
    fn test_write_csv_dir_skips_empty_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ReportAssembler::new();
        report.add("post", table());
        report.add("likers", TabularResult::new());
        report.add("comments:export", table());

        let written = report.write_csv_dir(dir.path().join("out")).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["post.csv", "comments_export.csv"]);
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.starts_with("name,age\n"));
    }

    #[test]
    fn test_same_sheet_name_replaces() {
        let mut report = ReportAssembler::new();
        report.add("post", TabularResult::new());
        report.add("post", table());

        assert_eq!(report.sheets().len(), 1);
        assert_eq!(report.exportable().count(), 1);
    }
}
