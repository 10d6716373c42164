use crate::spreadsheet::CellValue;
use crate::table::CanonicalTable;
use std::collections::HashMap;

/// Delimiter of joined text values.
pub const JOIN_DELIMITER: &str = "/";

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Reducer {
    /// Arithmetic sum, non-numeric values count as 0
    Sum,
    /// Distinct non-blank values in first-seen order joined by `/`
    Join,
}

/// Group-by definition: ordered dimension key columns and the reduced columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregation {
    pub keys: Vec<String>,
    pub values: Vec<(String, Reducer)>,
}

impl Aggregation {
    pub fn new(keys: &[&str], values: &[(&str, Reducer)]) -> Self {
        Self {
            keys: keys.iter().map(|key| (*key).to_owned()).collect(),
            values: values
                .iter()
                .map(|(column, reducer)| ((*column).to_owned(), *reducer))
                .collect(),
        }
    }

    /// Key columns followed by reduced columns.
    pub fn columns(&self) -> Vec<String> {
        self.keys
            .iter()
            .cloned()
            .chain(self.values.iter().map(|(column, _)| column.to_owned()))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AggregatedRow {
    pub key: Vec<String>,
    pub values: Vec<CellValue>,
}

impl AggregatedRow {
    /// Key cells followed by reduced values.
    pub fn cells(&self) -> Vec<CellValue> {
        self.key
            .iter()
            .map(|key| CellValue::from(key.as_str()))
            .chain(self.values.iter().cloned())
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AggregatedTable {
    pub columns: Vec<String>,
    pub rows: Vec<AggregatedRow>,
}

impl AggregatedTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

enum Accumulator {
    Sum(f64),
    Join(Vec<String>),
}

impl Accumulator {
    fn new(reducer: Reducer) -> Self {
        match reducer {
            Reducer::Sum => Self::Sum(0.0),
            Reducer::Join => Self::Join(Vec::new()),
        }
    }

    fn push(&mut self, value: &CellValue) {
        match self {
            Self::Sum(total) => *total += value.to_number(),
            Self::Join(parts) => {
                let text = value.to_text();
                let text = text.trim();
                if !text.is_empty() && !parts.iter().any(|existing| existing == text) {
                    parts.push(text.to_owned());
                }
            }
        }
    }

    fn finish(self) -> CellValue {
        match self {
            Self::Sum(total) => CellValue::Number(total),
            Self::Join(parts) => CellValue::from(parts.join(JOIN_DELIMITER).as_str()),
        }
    }
}

/// Groups the rows of a canonical table.
pub fn aggregate(table: &CanonicalTable, aggregation: &Aggregation) -> AggregatedTable {
    aggregate_rows(&table.columns, &table.rows, aggregation)
}

/// Groups `rows` laid out as `columns` by the key tuple of `aggregation`.
/// Groups keep the order in which their key was first seen. Columns missing
/// from the layout read as blank.
pub fn aggregate_rows<I, R>(columns: &[String], rows: I, aggregation: &Aggregation) -> AggregatedTable
where
    I: IntoIterator<Item = R>,
    R: AsRef<[CellValue]>,
{
    let position = |column: &str| columns.iter().position(|name| name == column);
    let key_indexes: Vec<Option<usize>> = aggregation.keys.iter().map(|key| position(key)).collect();
    let value_indexes: Vec<Option<usize>> = aggregation
        .values
        .iter()
        .map(|(column, _)| position(column))
        .collect();

    let mut groups = HashMap::<Vec<String>, usize>::new();
    let mut keys = Vec::<Vec<String>>::new();
    let mut accumulators = Vec::<Vec<Accumulator>>::new();
    for row in rows {
        let row = row.as_ref();
        let cell = |index: &Option<usize>| index.and_then(|index| row.get(index));
        let key: Vec<String> = key_indexes
            .iter()
            .map(|index| cell(index).map(CellValue::to_text).unwrap_or_default())
            .collect();
        let group = *groups.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            accumulators.push(
                aggregation
                    .values
                    .iter()
                    .map(|(_, reducer)| Accumulator::new(*reducer))
                    .collect(),
            );
            keys.len() - 1
        });
        for (accumulator, index) in accumulators[group].iter_mut().zip(&value_indexes) {
            if let Some(value) = cell(index) {
                accumulator.push(value);
            }
        }
    }

    let rows = keys
        .into_iter()
        .zip(accumulators)
        .map(|(key, accumulators)| AggregatedRow {
            key,
            values: accumulators.into_iter().map(Accumulator::finish).collect(),
        })
        .collect();
    AggregatedTable {
        columns: aggregation.columns(),
        rows,
    }
}
