//! # Spreadsheet Module
//!
//! Reads one named worksheet of a workbook into a [`Grid`] of typed cells.
//! The table pipeline only depends on the [`Workbook`] trait; the bundled
//! [`XlsxWorkbook`] reads Office Open XML (`.xlsx`, `.xlsm`) files.
pub mod cell;
pub mod grid;
pub(crate) mod reference;
pub mod xlsx;

use crate::error::SheetReportError;
pub use cell::CellValue;
pub use grid::Grid;
use thiserror::Error;
pub use xlsx::XlsxWorkbook;

#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Worksheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Workbook part '{0}' is missing")]
    FileError(String),

    #[error("Workbook '{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),
}

/// Named-worksheet accessor of a workbook codec.
pub trait Workbook {
    /// Name of the workbook source, used in diagnostics.
    fn name(&self) -> String;

    /// Worksheet names in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Reads a worksheet into a grid, failing with [`SpreadsheetError::SheetNotFound`]
    /// when no worksheet has that name.
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, SheetReportError>;
}

/// In-memory workbook, mainly for callers that obtain grids from another codec.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<(String, Grid)>,
}

impl MemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, grid: Grid) -> Self {
        self.sheets.push((name.to_owned(), grid));
        self
    }
}

impl Workbook for MemoryWorkbook {
    fn name(&self) -> String {
        "memory".to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, SheetReportError> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet_name.to_owned()).into())
    }
}
