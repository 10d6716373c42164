use crate::spreadsheet::CellValue;
use crate::table::spec::{ColumnKind, ColumnSpec, TableSpec};
use crate::table::{normalize_width, CanonicalTable, RawTable, TableError};
use std::collections::HashSet;
use tracing::debug;

/// Maps the raw header of a table onto the canonical columns of its spec.
///
/// Exact labels are matched first for every column, then aliases in declared
/// order; a raw column is claimed by at most one canonical column. Required
/// columns without a match fail the resolution, optional ones (and the key
/// column) are created with a default value. Raw columns not named by the
/// spec are dropped.
pub fn resolve_columns(raw: &RawTable, spec: &TableSpec) -> Result<CanonicalTable, TableError> {
    let columns = canonical_columns(spec);
    let labels: Vec<String> = raw.header.iter().map(|label| normalize_width(label)).collect();
    let mut claimed = HashSet::<usize>::new();
    let mut sources: Vec<Option<usize>> = vec![None; columns.len()];

    for (slot, column) in columns.iter().enumerate() {
        sources[slot] = claim(&labels, &mut claimed, &column.name);
    }
    for (slot, column) in columns.iter().enumerate() {
        if sources[slot].is_none() {
            sources[slot] = column.aliases.iter().find_map(|alias| claim(&labels, &mut claimed, alias));
        }
    }

    let mut defaulted = HashSet::new();
    for (slot, column) in columns.iter().enumerate() {
        if sources[slot].is_some() {
            continue;
        }
        if spec.required.iter().any(|required| required.name == column.name) {
            return Err(TableError::MissingColumn {
                table: spec.name.to_owned(),
                column: column.name.to_owned(),
            });
        }
        debug!(table = %spec.name, column = %column.name, "column absent, using default");
        defaulted.insert(column.name.to_owned());
    }

    let rows = raw
        .rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(&sources)
                .map(|(column, source)| match source {
                    Some(index) => row.get(*index).cloned().unwrap_or_default(),
                    None => default_value(column.kind),
                })
                .collect()
        })
        .collect();

    Ok(CanonicalTable {
        name: raw.name.to_owned(),
        columns: columns.iter().map(|column| column.name.to_owned()).collect(),
        rows,
        defaulted,
    })
}

/// Required columns, then optional columns, then the key column unless already listed.
fn canonical_columns(spec: &TableSpec) -> Vec<&ColumnSpec> {
    let mut columns: Vec<&ColumnSpec> = spec.required.iter().chain(&spec.optional).collect();
    if let Some(key) = &spec.key_column {
        if !columns.iter().any(|column| column.name == key.name) {
            columns.push(key);
        }
    }
    columns
}

fn claim(labels: &[String], claimed: &mut HashSet<usize>, label: &str) -> Option<usize> {
    let label = normalize_width(label);
    let index = (0..labels.len()).find(|index| !claimed.contains(index) && labels[*index] == label)?;
    claimed.insert(index);
    Some(index)
}

fn default_value(kind: ColumnKind) -> CellValue {
    match kind {
        ColumnKind::Text => CellValue::text(""),
        ColumnKind::Number => CellValue::Number(0.0),
    }
}
