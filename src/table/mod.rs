//! # Table Module
//!
//! Turns one unstructured worksheet grid into named tables: heading-based
//! segmentation, column resolution against aliases, subtotal row removal and
//! merged-cell recovery.
pub mod column;
pub mod fill;
pub mod filter;
pub mod segment;
pub mod spec;

use crate::spreadsheet::CellValue;
use std::collections::HashSet;
use thiserror::Error;

pub use column::resolve_columns;
pub use fill::fill_down;
pub use filter::remove_subtotals;
pub use segment::{segment, SegmentOptions, Segmentation};
pub use spec::{Boundary, ColumnKind, ColumnSpec, HeaderLocation, HeadingRule, HeadingScope, TableSpec};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Table '{name}' spans {rows} row(s), at least a header and one data row are required")]
    TableTooShort { name: String, rows: usize },

    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },
}

/// Folds full-width ASCII forms and the ideographic space to their half-width
/// counterparts so that `（1）` and `(1)` compare equal. The result is trimmed.
pub fn normalize_width(text: &str) -> String {
    text.chars()
        .map(|character| match character {
            '\u{3000}' => ' ',
            '\u{FF01}'..='\u{FF5E}' => char::from_u32(character as u32 - 0xFEE0).unwrap_or(character),
            _ => character,
        })
        .collect::<String>()
        .trim()
        .to_owned()
}

/// A table sliced out of the grid: raw header labels and the body rows aligned to them.
#[derive(Clone, Debug, PartialEq)]
pub struct RawTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A table whose columns carry canonical names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// Columns absent in the source and filled with a default value
    pub defaulted: HashSet<String>,
}

impl CanonicalTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// True when the column exists and was resolved from a source column.
    pub fn is_from_source(&self, column: &str) -> bool {
        self.column_index(column).is_some() && !self.defaulted.contains(column)
    }

    /// Value of `column` in `row`, empty when either is out of range.
    pub fn value<'a>(&'a self, row: &'a [CellValue], column: &str) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.column_index(column)
            .and_then(|index| row.get(index))
            .unwrap_or(&EMPTY)
    }

    /// Sets `column` to `values` row by row, appending the column when missing.
    pub fn set_column(&mut self, column: &str, values: Vec<CellValue>) {
        let index = match self.column_index(column) {
            Some(index) => index,
            None => {
                self.columns.push(column.to_owned());
                self.rows.iter_mut().for_each(|row| row.push(CellValue::Empty));
                self.columns.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            row[index] = value;
        }
        self.defaulted.remove(column);
    }

    /// Keeps only `columns`, in that order. Unknown columns are created empty.
    pub fn select(&self, columns: &[String]) -> CanonicalTable {
        let indexes: Vec<Option<usize>> = columns.iter().map(|column| self.column_index(column)).collect();
        let rows = self.rows
            .iter()
            .map(|row| {
                indexes
                    .iter()
                    .map(|index| index.and_then(|index| row.get(index)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        let defaulted = columns
            .iter()
            .filter(|column| !self.is_from_source(column))
            .cloned()
            .collect();
        CanonicalTable {
            name: self.name.to_owned(),
            columns: columns.to_vec(),
            rows,
            defaulted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> CanonicalTable {
        CanonicalTable {
            name: "t".to_owned(),
            columns: vec!["客户".to_owned(), "金额/万元".to_owned()],
            rows: vec![
                vec![CellValue::text("ClientA"), CellValue::Number(1000.0)],
                vec![CellValue::text("ClientB"), CellValue::Number(800.0)],
            ],
            defaulted: HashSet::new(),
        }
    }

    #[test]
    fn width_normalization() {
        assert_eq!(normalize_width("二、付款逾期未到货（1）"), "二、付款逾期未到货(1)");
        assert_eq!(normalize_width("\u{3000}金额（万元）："), "金额(万元):");
        assert_eq!(normalize_width("ＯＡ"), "OA");
    }

    #[test]
    fn select_reorders_and_creates_columns() {
        let selected = table().select(&["金额/万元".to_owned(), "备注".to_owned()]);
        assert_eq!(selected.columns, vec!["金额/万元".to_owned(), "备注".to_owned()]);
        assert_eq!(selected.rows[1], vec![CellValue::Number(800.0), CellValue::Empty]);
        assert!(selected.defaulted.contains("备注"));
        assert!(selected.is_from_source("金额/万元"));
    }

    #[test]
    fn set_column_appends() {
        let mut table = table();
        table.set_column("类型", vec![CellValue::text("a"), CellValue::text("b")]);
        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.value(&table.rows[1].clone(), "类型"), &CellValue::text("b"));
    }
}
