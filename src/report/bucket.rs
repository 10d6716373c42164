use crate::report::aggregate::{aggregate_rows, AggregatedRow, AggregatedTable, Aggregation};
use crate::spreadsheet::CellValue;
use std::collections::HashMap;
use tracing::debug;

/// Entity label of collapsed small entities.
pub const OTHER_ENTITY: &str = "其他";

/// Marker written into the detail columns of collapsed rows.
pub const SEE_DETAIL: &str = "见明细表";

/// Large/small split of aggregated rows by per-entity total.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucketing {
    /// Dimension column holding the entity, usually the innermost key
    pub entity: String,
    /// Numeric column totalled per entity
    pub total: String,
    /// Free-text columns rewritten on collapsed rows
    pub details: Vec<String>,
}

impl Bucketing {
    pub fn new(entity: &str, total: &str, details: &[&str]) -> Self {
        Self {
            entity: entity.to_owned(),
            total: total.to_owned(),
            details: details.iter().map(|detail| (*detail).to_owned()).collect(),
        }
    }
}

/// Keeps the rows of entities whose total reaches `threshold` and collapses the
/// others into one `其他` row per outer dimension.
///
/// Collapsed rows get their detail columns replaced by `见明细表` and are
/// re-aggregated with `aggregation`. Large rows come first, unchanged.
pub fn bucketize(
    table: AggregatedTable,
    aggregation: &Aggregation,
    bucketing: &Bucketing,
    threshold: f64,
) -> AggregatedTable {
    if table.is_empty() {
        return table;
    }
    let (Some(entity), Some(total)) = (table.column_index(&bucketing.entity), table.column_index(&bucketing.total))
    else {
        debug!(entity = %bucketing.entity, total = %bucketing.total, "bucketing columns absent, rows kept");
        return table;
    };
    let details: Vec<usize> = bucketing
        .details
        .iter()
        .filter_map(|detail| table.column_index(detail))
        .collect();

    let cells: Vec<Vec<CellValue>> = table.rows.iter().map(AggregatedRow::cells).collect();
    let mut totals = HashMap::<String, f64>::new();
    for row in &cells {
        *totals.entry(row[entity].to_text()).or_default() += row[total].to_number();
    }
    let is_large = |row: &[CellValue]| totals.get(&row[entity].to_text()).copied().unwrap_or(0.0) >= threshold;

    let mut small = Vec::new();
    let mut rows = Vec::new();
    for (row, aggregated) in cells.into_iter().zip(table.rows) {
        if is_large(&row) {
            rows.push(aggregated);
        } else {
            small.push(row);
        }
    }
    debug!(large = rows.len(), small = small.len(), threshold, "bucketed entities");

    for row in small.iter_mut() {
        row[entity] = CellValue::text(OTHER_ENTITY);
        for detail in &details {
            row[*detail] = CellValue::text(SEE_DETAIL);
        }
    }
    rows.extend(aggregate_rows(&table.columns, &small, aggregation).rows);
    AggregatedTable {
        columns: table.columns,
        rows,
    }
}
