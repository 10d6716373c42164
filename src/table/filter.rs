use crate::table::spec::TableSpec;
use crate::table::CanonicalTable;
use tracing::debug;

/// Labels of grand-total and subtotal rows.
const SUBTOTAL_MARKERS: [&str; 2] = ["合计", "小计"];

/// Drops subtotal and grand-total rows.
///
/// When the key column was found in the source, rows with a blank key are
/// dropped. Otherwise rows whose label column (or first column) mentions a
/// subtotal marker are dropped.
pub fn remove_subtotals(mut table: CanonicalTable, spec: &TableSpec) -> CanonicalTable {
    let before = table.rows.len();
    let key = spec
        .key_column
        .as_ref()
        .map(|column| column.name.as_str())
        .filter(|column| table.is_from_source(column));

    match key.and_then(|column| table.column_index(column)) {
        Some(index) => table
            .rows
            .retain(|row| row.get(index).map(|cell| !cell.is_blank()).unwrap_or(false)),
        None => {
            let label = spec
                .label_column
                .as_deref()
                .filter(|column| table.is_from_source(column))
                .and_then(|column| table.column_index(column))
                .unwrap_or(0);
            table.rows.retain(|row| {
                let text = row.get(label).map(|cell| cell.to_text()).unwrap_or_default();
                !SUBTOTAL_MARKERS.iter().any(|marker| text.contains(marker))
            });
        }
    }

    debug!(table = %table.name, removed = before - table.rows.len(), "removed subtotal rows");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::CellValue;
    use crate::table::spec::ColumnSpec;
    use std::collections::HashSet;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>, defaulted: &[&str]) -> CanonicalTable {
        CanonicalTable {
            name: "t".to_owned(),
            columns: columns.iter().map(|column| (*column).to_owned()).collect(),
            rows,
            defaulted: defaulted.iter().map(|column| (*column).to_owned()).collect::<HashSet<_>>(),
        }
    }

    #[test]
    fn key_column_keeps_non_blank_rows() {
        let spec = TableSpec::new("t").key_column(ColumnSpec::text("合同号", &[]));
        let rows = vec![
            vec![CellValue::text("HT-1"), CellValue::text("小计 ClientA")],
            vec![CellValue::text(" "), CellValue::text("ClientA")],
            vec![CellValue::Number(7.0), CellValue::Empty],
            vec![CellValue::Empty, CellValue::text("合计")],
        ];
        let filtered = remove_subtotals(table(&["合同号", "客户"], rows, &[]), &spec);
        assert_eq!(filtered.rows.len(), 2);
        assert_eq!(filtered.rows[0][1], CellValue::text("小计 ClientA"));
    }

    #[test]
    fn defaulted_key_falls_back_to_label() {
        let spec = TableSpec::new("t")
            .key_column(ColumnSpec::text("合同号", &[]))
            .label_column("经营单位");
        let rows = vec![
            vec![CellValue::text("钢铁"), CellValue::text("一部"), CellValue::text("")],
            vec![CellValue::text("钢铁"), CellValue::text("小计"), CellValue::text("")],
            vec![CellValue::text("总合计"), CellValue::text(""), CellValue::text("")],
        ];
        let filtered = remove_subtotals(table(&["板群", "经营单位", "合同号"], rows, &["合同号"]), &spec);
        // the grand total sits in the first column, the label column does not carry it
        assert_eq!(filtered.rows.len(), 2);
        assert_eq!(filtered.rows[1][0], CellValue::text("总合计"));
    }

    #[test]
    fn first_column_without_key_or_label() {
        let rows = vec![
            vec![CellValue::text("钢材"), CellValue::Number(1.0)],
            vec![CellValue::text("合计"), CellValue::Number(1.0)],
            vec![CellValue::Number(3.0), CellValue::Empty],
        ];
        let filtered = remove_subtotals(table(&["产品", "库存/万元"], rows, &[]), &TableSpec::new("t"));
        assert_eq!(filtered.rows.len(), 2);
    }
}
