use crate::table::CanonicalTable;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Comparison {
    /// Keeps values strictly above the threshold
    Greater,
    /// Keeps values strictly below the threshold
    Less,
}

impl Comparison {
    pub fn qualifies(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Greater => value > threshold,
            Self::Less => value < threshold,
        }
    }
}

/// Single-column threshold filter of the tables that are not bucketed.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdFilter {
    pub column: String,
    pub comparison: Comparison,
}

impl ThresholdFilter {
    pub fn new(column: &str, comparison: Comparison) -> Self {
        Self {
            column: column.to_owned(),
            comparison,
        }
    }

    /// Removes the rows whose filter value does not qualify. Blank and
    /// non-numeric values never qualify.
    pub fn apply(&self, mut table: CanonicalTable, threshold: f64) -> CanonicalTable {
        let Some(index) = table.column_index(&self.column) else {
            table.rows.clear();
            return table;
        };
        table.rows.retain(|row| {
            row.get(index)
                .and_then(|cell| cell.as_number())
                .map(|value| self.comparison.qualifies(value, threshold))
                .unwrap_or(false)
        });
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;

    fn table() -> CanonicalTable {
        CanonicalTable {
            name: "保证金比例".to_owned(),
            columns: vec!["经营单位".to_owned(), "保证金比例".to_owned()],
            rows: vec![
                vec![CellValue::text("一部"), CellValue::Number(0.3)],
                vec![CellValue::text("二部"), CellValue::Number(0.2)],
                vec![CellValue::text("三部"), CellValue::text("0.1")],
                vec![CellValue::text("四部"), CellValue::Empty],
                vec![CellValue::text("五部"), CellValue::text("待定")],
            ],
            ..Default::default()
        }
    }

    fn units(table: &CanonicalTable) -> Vec<String> {
        table.rows.iter().map(|row| row[0].to_text()).collect()
    }

    #[test]
    fn value_equal_to_threshold_is_excluded() {
        let filtered = ThresholdFilter::new("保证金比例", Comparison::Greater).apply(table(), 0.2);
        assert_eq!(units(&filtered), vec!["一部"]);
    }

    #[test]
    fn less_than_keeps_numeric_rows_only() {
        let filtered = ThresholdFilter::new("保证金比例", Comparison::Less).apply(table(), 0.3);
        assert_eq!(units(&filtered), vec!["二部", "三部"]);
    }

    #[test]
    fn missing_column_keeps_nothing() {
        let filtered = ThresholdFilter::new("倒挂金额", Comparison::Greater).apply(table(), 0.0);
        assert!(filtered.rows.is_empty());
    }
}
