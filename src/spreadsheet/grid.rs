use crate::spreadsheet::cell::CellValue;

/// Rectangular cell matrix of one worksheet. Row and column indices are 0-based.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl Grid {
    /// Builds a grid from ragged rows; short rows are padded with empty cells.
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();
        Self { rows, width }
    }

    /// Builds a grid from sparse `(row, col, value)` cells.
    pub(crate) fn from_cells(cells: Vec<(usize, usize, CellValue)>) -> Self {
        let height = cells.iter().map(|(row, _, _)| row + 1).max().unwrap_or(0);
        let width = cells.iter().map(|(_, col, _)| col + 1).max().unwrap_or(0);
        let mut rows = vec![vec![CellValue::Empty; width]; height];
        for (row, col, value) in cells {
            rows[row][col] = value;
        }
        Self { rows, width }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, row: usize) -> Option<&[CellValue]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// A row is blank when every cell is empty or whitespace. Rows past the end count as blank.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.row(row)
            .map(|cells| cells.iter().all(CellValue::is_blank))
            .unwrap_or(true)
    }
}
