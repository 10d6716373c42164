use crate::spreadsheet::{CellValue, Grid};
use crate::table::spec::{Boundary, HeaderLocation, TableSpec};
use crate::table::{normalize_width, RawTable, TableError};
use tracing::{debug, info, warn};

/// Tuning knobs of the segmentation heuristics.
#[derive(Copy, Clone, Debug)]
pub struct SegmentOptions {
    /// Consecutive blank rows that end a blank-run bounded table
    pub blank_run: usize,
    /// Rows after the title searched for a token header row
    pub header_window: usize,
}

impl Default for SegmentOptions {
    fn default() -> Self {
        Self {
            blank_run: 3,
            header_window: 5,
        }
    }
}

/// Result of one segmentation pass: extracted tables in row order and the
/// tables that were skipped with the reason.
#[derive(Clone, Debug, Default)]
pub struct Segmentation {
    pub tables: Vec<RawTable>,
    pub skipped: Vec<TableError>,
}

/// A table whose title and header rows have been found.
#[derive(Copy, Clone, Debug)]
struct Located<'a> {
    spec: &'a TableSpec,
    title_row: usize,
    header_row: usize,
}

/// Slices every table of `specs` out of `grid`.
///
/// Tables are located independently, ordered by header row, bounded by their
/// boundary strategy and then split into header labels and body rows. Tables
/// that cannot be located or that span fewer than two rows are skipped.
pub fn segment(grid: &Grid, specs: &[TableSpec], options: &SegmentOptions) -> Segmentation {
    let mut segmentation = Segmentation::default();
    let mut located = Vec::<Located>::new();
    for spec in specs {
        match locate(grid, spec, options) {
            Ok(table) => located.push(table),
            Err(error) => {
                warn!(table = %spec.name, "{error}");
                segmentation.skipped.push(error);
            }
        }
    }
    located.sort_by_key(|table| table.header_row);

    for (index, table) in located.iter().enumerate() {
        let next_title = located.get(index + 1).map(|next| next.title_row);
        let end = table_end(grid, table, next_title, options);
        match slice(grid, table.spec, table.header_row, end) {
            Ok(raw) => {
                info!(table = %raw.name, header_row = table.header_row, end, rows = raw.rows.len(), "extracted table");
                segmentation.tables.push(raw);
            }
            Err(error) => {
                warn!(table = %table.spec.name, "{error}");
                segmentation.skipped.push(error);
            }
        }
    }
    segmentation
}

/// Finds the title row of a table and the header row below it.
fn locate<'a>(grid: &Grid, spec: &'a TableSpec, options: &SegmentOptions) -> Result<Located<'a>, TableError> {
    let title_row = grid
        .rows()
        .position(|cells| spec.matches_title_row(cells))
        .ok_or_else(|| TableError::TableNotFound(spec.name.to_owned()))?;
    debug!(table = %spec.name, title_row, "found table title");

    let header_row = match &spec.header {
        HeaderLocation::NextRow => title_row + 1,
        HeaderLocation::Tokens(tokens) => {
            let last = (title_row + options.header_window).min(grid.height().saturating_sub(1));
            (title_row + 1..=last)
                .find(|row| grid.row(*row).map(|cells| contains_tokens(cells, tokens)).unwrap_or(false))
                .ok_or_else(|| TableError::TableNotFound(spec.name.to_owned()))?
        }
    };
    Ok(Located {
        spec,
        title_row,
        header_row,
    })
}

/// True when every token appears in at least one cell of the row.
fn contains_tokens(cells: &[CellValue], tokens: &[String]) -> bool {
    let labels: Vec<String> = cells.iter().map(|cell| normalize_width(&cell.to_text())).collect();
    tokens.iter().all(|token| {
        let token = normalize_width(token);
        labels.iter().any(|label| label.contains(&token))
    })
}

/// Exclusive end row of a located table.
fn table_end(grid: &Grid, table: &Located, next_title: Option<usize>, options: &SegmentOptions) -> usize {
    match &table.spec.boundary {
        Boundary::NextHeading => match next_title {
            Some(next_title) => next_title,
            None => blank_run_end(grid, table.header_row, grid.height(), options.blank_run),
        },
        Boundary::BlankRun => blank_run_end(grid, table.header_row, grid.height(), options.blank_run),
        Boundary::NumericGap(column) => {
            let limit = next_title.unwrap_or(grid.height());
            numeric_gap_end(grid, table.header_row, limit, column)
                .unwrap_or_else(|| blank_run_end(grid, table.header_row, limit, options.blank_run))
        }
    }
}

/// First row of the first run of `run` consecutive blank rows after the header,
/// or `limit` when there is no such run.
fn blank_run_end(grid: &Grid, header_row: usize, limit: usize, run: usize) -> usize {
    let run = run.max(1);
    let mut count = 0usize;
    for row in header_row + 1..limit {
        if grid.is_blank_row(row) {
            count += 1;
            if count >= run {
                return row + 1 - run;
            }
        } else {
            count = 0;
        }
    }
    limit
}

/// First non-blank row where the designated numeric column is blank.
fn numeric_gap_end(grid: &Grid, header_row: usize, limit: usize, column: &str) -> Option<usize> {
    let column = normalize_width(column);
    let index = grid
        .row(header_row)?
        .iter()
        .position(|cell| normalize_width(&cell.to_text()) == column)?;
    (header_row + 1..limit).find(|row| {
        grid.row(*row)
            .map(|cells| {
                cells.get(index).map(CellValue::is_blank).unwrap_or(true)
                    && cells.iter().enumerate().any(|(col, cell)| col != index && !cell.is_blank())
            })
            .unwrap_or(false)
    })
}

/// Splits rows `[header_row, end)` into header labels and non-blank body rows.
fn slice(grid: &Grid, spec: &TableSpec, header_row: usize, end: usize) -> Result<RawTable, TableError> {
    let end = end.min(grid.height());
    let span = end.saturating_sub(header_row);
    if span < 2 {
        return Err(TableError::TableTooShort {
            name: spec.name.to_owned(),
            rows: span,
        });
    }

    let header = grid
        .row(header_row)
        .map(|cells| cells.iter().map(CellValue::to_text).collect())
        .unwrap_or_default();
    let rows = (header_row + 1..end)
        .filter(|row| !grid.is_blank_row(*row))
        .filter_map(|row| grid.row(row).map(<[CellValue]>::to_vec))
        .collect();
    Ok(RawTable {
        name: spec.name.to_owned(),
        header,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::spec::{HeadingRule, HeadingScope};

    fn row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|cell| CellValue::from(*cell)).collect()
    }

    fn blank() -> Vec<CellValue> {
        Vec::new()
    }

    fn spec(name: &str, pattern: &str) -> TableSpec {
        TableSpec::new(name).heading(HeadingRule::new(pattern, HeadingScope::FirstCell).unwrap())
    }

    #[test]
    fn last_table_ends_at_blank_run() {
        let mut rows = vec![blank(); 5];
        rows.push(row(&["一、逾期还款业务"]));
        rows.push(row(&["客户", "金额/万元"]));
        rows.push(row(&["ClientA", "1000"]));
        rows.push(row(&["ClientA", "2500"]));
        rows.push(row(&["ClientB", "800"]));
        rows.push(row(&["合计", "4300"]));
        rows.extend(vec![blank(); 3]);
        rows.push(row(&["备注：单位万元"]));
        let grid = Grid::new(rows);

        let segmentation = segment(&grid, &[spec("一、逾期还款业务", r"一、\s*逾期还款业务")], &SegmentOptions::default());
        assert!(segmentation.skipped.is_empty());
        let table = &segmentation.tables[0];
        assert_eq!(table.header, vec!["客户".to_owned(), "金额/万元".to_owned()]);
        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.rows[3][0], CellValue::text("合计"));
    }

    #[test]
    fn tables_end_before_next_heading() {
        let grid = Grid::new(vec![
            row(&["二、付款逾期未到货（1）"]),
            row(&["供应商", "金额/万元"]),
            row(&["S1", "10"]),
            blank(),
            row(&["S2", "20"]),
            row(&["一、逾期还款业务"]),
            row(&["客户", "金额/万元"]),
            row(&["C1", "5"]),
        ]);
        let specs = [
            spec("一、逾期还款业务", r"一、\s*逾期还款业务"),
            spec("二、付款逾期未到货(1)", r"二、\s*付款逾期未到货\(1\)"),
        ];
        let segmentation = segment(&grid, &specs, &SegmentOptions::default());
        let names: Vec<&str> = segmentation.tables.iter().map(|table| table.name.as_str()).collect();
        assert_eq!(names, vec!["二、付款逾期未到货(1)", "一、逾期还款业务"]);
        assert_eq!(segmentation.tables[0].rows.len(), 2);
        assert_eq!(segmentation.tables[0].rows[1][0], CellValue::text("S2"));
        assert_eq!(segmentation.tables[1].rows.len(), 1);
    }

    #[test]
    fn body_count_excludes_blank_rows() {
        let grid = Grid::new(vec![
            row(&["八、现货敞口90天及以上库存"]),
            row(&["产品", "库存/万元"]),
            row(&["钢材", "1"]),
            row(&["", "  "]),
            row(&["铜", "2"]),
        ]);
        let segmentation = segment(&grid, &[spec("八", r"八、\s*现货敞口")], &SegmentOptions::default());
        let table = &segmentation.tables[0];
        // span [1, 5): header plus three rows, one of them blank
        assert_eq!(table.rows.len(), 5 - 1 - 1 - 1);
    }

    #[test]
    fn missing_and_short_tables_are_skipped() {
        let grid = Grid::new(vec![
            row(&["一、逾期还款业务"]),
            row(&["客户"]),
            row(&["二、付款逾期未到货(1)"]),
            row(&["供应商"]),
            row(&["S1"]),
        ]);
        let specs = [
            spec("一、逾期还款业务", r"一、\s*逾期还款业务"),
            spec("二、付款逾期未到货(1)", r"二、\s*付款逾期未到货\(1\)"),
            spec("九、期现结合90天及以上库存", r"九、\s*期现结合"),
        ];
        let segmentation = segment(&grid, &specs, &SegmentOptions::default());
        assert_eq!(segmentation.tables.len(), 1);
        assert_eq!(segmentation.tables[0].name, "二、付款逾期未到货(1)");
        assert_eq!(
            segmentation.skipped,
            vec![
                TableError::TableNotFound("九、期现结合90天及以上库存".to_owned()),
                TableError::TableTooShort {
                    name: "一、逾期还款业务".to_owned(),
                    rows: 1
                },
            ]
        );
    }

    #[test]
    fn table_without_blank_run_ends_at_grid_end() {
        let grid = Grid::new(vec![
            row(&["一、逾期还款业务"]),
            row(&["客户"]),
            row(&["C1"]),
            blank(),
            blank(),
            row(&["C2"]),
        ]);
        let segmentation = segment(&grid, &[spec("一", r"一、")], &SegmentOptions::default());
        assert_eq!(segmentation.tables[0].rows.len(), 2);
    }

    #[test]
    fn token_header_and_numeric_gap() {
        let grid = Grid::new(vec![
            row(&["", "十、保证金比例情况"]),
            row(&["单位：万元"]),
            row(&["板群", "经营单位", "保证金比例"]),
            row(&["钢铁", "一部", "0.3"]),
            row(&["", "二部", "0.1"]),
            row(&["注：", "比例为保证金/合同金额", ""]),
            row(&["钢铁", "三部", "0.5"]),
        ]);
        let spec = TableSpec::new("保证金比例")
            .heading(HeadingRule::new(r"保证金比例", HeadingScope::AnyCell).unwrap())
            .header(HeaderLocation::Tokens(vec!["经营单位".to_owned(), "保证金比例".to_owned()]))
            .boundary(Boundary::NumericGap("保证金比例".to_owned()));
        let segmentation = segment(&grid, &[spec], &SegmentOptions::default());
        let table = &segmentation.tables[0];
        assert_eq!(table.header[2], "保证金比例");
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn token_header_outside_window() {
        let mut rows = vec![row(&["十、保证金比例情况"])];
        rows.extend(vec![row(&["说明"]); 5]);
        rows.push(row(&["经营单位", "保证金比例"]));
        rows.push(row(&["一部", "0.3"]));
        let grid = Grid::new(rows);
        let spec = TableSpec::new("保证金比例")
            .heading(HeadingRule::new(r"保证金比例", HeadingScope::FirstCell).unwrap())
            .header(HeaderLocation::Tokens(vec!["经营单位".to_owned()]));
        let segmentation = segment(&grid, &[spec], &SegmentOptions::default());
        assert!(segmentation.tables.is_empty());
        assert_eq!(segmentation.skipped, vec![TableError::TableNotFound("保证金比例".to_owned())]);
    }
}
