use crate::error::SheetReportError;
use crate::report::ProcessedReport;
use crate::spreadsheet::CellValue;
use rust_xlsxwriter::{Format, Workbook};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

/// Longest worksheet name Excel accepts.
const MAX_SHEET_NAME: usize = 31;

/// Output side of the workbook codec.
pub trait ReportSink {
    fn write_report(&mut self, report: &ProcessedReport) -> Result<(), SheetReportError>;
}

/// Writes every processed table to its own worksheet of an `.xlsx` file.
#[derive(Clone, Debug)]
pub struct XlsxReportWriter {
    path: PathBuf,
}

impl XlsxReportWriter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for XlsxReportWriter {
    fn write_report(&mut self, report: &ProcessedReport) -> Result<(), SheetReportError> {
        let mut xlsx = Workbook::new();
        let header_format = Format::new().set_bold();
        let mut names = HashSet::<String>::new();

        for table in report.iter() {
            let name = unique_sheet_name(&sheet_name(&table.name), &mut names);
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(&name)?;
            for (col, column) in table.columns.iter().enumerate() {
                worksheet.write_string_with_format(0, col as u16, column, &header_format)?;
            }
            for (row, cells) in table.rows.iter().enumerate() {
                let row = row as u32 + 1;
                for (col, cell) in cells.iter().enumerate() {
                    match cell {
                        CellValue::Empty => {}
                        CellValue::Number(value) => {
                            worksheet.write_number(row, col as u16, *value)?;
                        }
                        CellValue::Text(text) => {
                            worksheet.write_string(row, col as u16, text)?;
                        }
                    }
                }
            }
            info!(table = %table.name, sheet = %name, rows = table.rows.len(), "exported table");
        }

        // an empty workbook is not a valid xlsx file
        if report.is_empty() {
            xlsx.add_worksheet();
        }
        xlsx.save(&self.path)?;
        Ok(())
    }
}

/// Worksheet name of a table: the ordinal prefix up to the first `、` is
/// dropped, characters Excel rejects become `_` and the result is cut to 31
/// characters.
pub fn sheet_name(table_name: &str) -> String {
    let name = table_name
        .split_once('、')
        .map(|(_, name)| name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(table_name)
        .trim();
    let name: String = name
        .chars()
        .map(|character| match character {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            _ => character,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    if name.is_empty() {
        "Sheet".to_owned()
    } else {
        name
    }
}

/// Appends `~N` to names already taken, shortening the name so the suffix fits.
fn unique_sheet_name(name: &str, taken: &mut HashSet<String>) -> String {
    let mut candidate = name.to_owned();
    let mut counter = 1;
    while taken.contains(&candidate.to_lowercase()) {
        counter += 1;
        let suffix = format!("~{counter}");
        let stem: String = name.chars().take(MAX_SHEET_NAME - suffix.chars().count()).collect();
        candidate = format!("{stem}{suffix}");
    }
    taken.insert(candidate.to_lowercase());
    candidate
}
