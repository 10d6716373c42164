use crate::table::CanonicalTable;

/// Forward-fills blank cells of `column` with the nearest non-blank value
/// above them, recovering the values of vertically merged cells. Leading
/// blanks stay blank. Returns the number of filled cells.
pub fn fill_down(table: &mut CanonicalTable, column: &str) -> usize {
    let Some(index) = table.column_index(column) else {
        return 0;
    };
    let mut last = None;
    let mut filled = 0;
    for row in table.rows.iter_mut() {
        let Some(cell) = row.get_mut(index) else {
            continue;
        };
        if !cell.is_blank() {
            last = Some(cell.clone());
        } else if let Some(value) = &last {
            *cell = value.clone();
            filled += 1;
        }
    }
    filled
}
