//! # Report Module
//!
//! Per-table processing of the extracted tables into the size-bucketed report:
//!
//! - Amount tables are categorized, aggregated by business dimensions and
//!   bucketed by entity total against the operator threshold.
//! - Ratio and risk tables are reordered, forward-filled and filtered by a
//!   single numeric column.
//!
//! A [`Processor`] owns the raw tables of one worksheet and the
//! [`ProcessedReport`]; every table is processed independently and a failure
//! only affects that table.
pub mod aggregate;
pub mod bucket;
pub mod catalog;
pub mod categorize;
pub mod threshold;
pub mod variant;
pub mod writer;

use crate::error::{ResultMessage, SheetReportError};
use crate::spreadsheet::{CellValue, Grid, Workbook};
use crate::table::{fill_down, remove_subtotals, resolve_columns, segment, RawTable, SegmentOptions, TableError, TableSpec};
use aggregate::{aggregate, AggregatedRow, Aggregation};
use bucket::{bucketize, Bucketing};
use categorize::{categorize, SplitRule};
use thiserror::Error;
use tracing::{info, warn};
use variant::ThresholdFilter;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("Table '{0}' has no processing rule")]
    NoProcessingRule(String),

    #[error("Table '{0}' has no data rows")]
    EmptyTable(String),

    #[error("Table '{0}' is not defined")]
    UnknownTable(String),
}

/// Processing steps applied to a resolved table.
#[derive(Clone, Debug, PartialEq)]
pub enum Pipeline {
    /// Split, aggregate and bucket by entity total
    Bucketed {
        fill_down: Vec<String>,
        split: Option<SplitRule>,
        aggregation: Aggregation,
        bucketing: Bucketing,
    },
    /// Reorder, fill one column and keep the rows passing a threshold filter
    Filtered {
        columns: Vec<String>,
        fill_down: String,
        filter: ThresholdFilter,
        /// Cut-off used by [`Processor::process_all`]
        default_threshold: f64,
    },
}

/// A table of the worksheet together with how it is processed.
#[derive(Clone, Debug)]
pub struct TableDefinition {
    pub spec: TableSpec,
    pub pipeline: Option<Pipeline>,
}

impl TableDefinition {
    pub fn new(spec: TableSpec, pipeline: Option<Pipeline>) -> Self {
        Self { spec, pipeline }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Threshold that replaces the operator threshold when processing the
    /// whole worksheet, set for the filter-only tables.
    pub fn default_threshold(&self) -> Option<f64> {
        match &self.pipeline {
            Some(Pipeline::Filtered { default_threshold, .. }) => Some(*default_threshold),
            _ => None,
        }
    }
}

/// Final rows of one table, ready for export.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessedTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl ProcessedTable {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }
}

/// Processed tables keyed by display name, in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessedReport {
    tables: Vec<ProcessedTable>,
}

impl ProcessedReport {
    /// Adds a table, replacing a previous table of the same name in place.
    pub fn insert(&mut self, table: ProcessedTable) {
        match self.tables.iter_mut().find(|existing| existing.name == table.name) {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ProcessedTable> {
        let index = self.tables.iter().position(|table| table.name == name)?;
        Some(self.tables.remove(index))
    }

    pub fn get(&self, name: &str) -> Option<&ProcessedTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessedTable> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Result of processing one table.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub table: String,
    pub success: bool,
    pub message: String,
}

/// Extracts the tables of one worksheet and processes them on demand.
#[derive(Clone, Debug)]
pub struct Processor {
    definitions: Vec<TableDefinition>,
    tables: Vec<RawTable>,
    skipped: Vec<TableError>,
    report: ProcessedReport,
}

impl Processor {
    pub fn new(definitions: Vec<TableDefinition>) -> Self {
        Self {
            definitions,
            tables: Vec::new(),
            skipped: Vec::new(),
            report: ProcessedReport::default(),
        }
    }

    /// Reads `sheet_name` from the workbook and extracts its tables.
    /// Returns the number of extracted tables.
    pub fn load<W: Workbook>(
        &mut self,
        workbook: &mut W,
        sheet_name: &str,
        options: &SegmentOptions,
    ) -> Result<usize, SheetReportError> {
        let grid = workbook.read_sheet(sheet_name).with_prefix(&workbook.name())?;
        info!(sheet = %sheet_name, rows = grid.height(), cols = grid.width(), "loaded worksheet");
        Ok(self.load_grid(&grid, options))
    }

    /// Extracts the tables of an already loaded grid, discarding previous results.
    pub fn load_grid(&mut self, grid: &Grid, options: &SegmentOptions) -> usize {
        let specs: Vec<TableSpec> = self.definitions.iter().map(|definition| definition.spec.clone()).collect();
        let segmentation = segment(grid, &specs, options);
        self.tables = segmentation.tables;
        self.skipped = segmentation.skipped;
        self.report = ProcessedReport::default();
        self.tables.len()
    }

    pub fn definitions(&self) -> &[TableDefinition] {
        &self.definitions
    }

    pub fn raw_tables(&self) -> &[RawTable] {
        &self.tables
    }

    pub fn raw_table(&self, name: &str) -> Option<&RawTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    /// Tables that could not be extracted by the last load, with the reason.
    pub fn skipped(&self) -> &[TableError] {
        &self.skipped
    }

    pub fn report(&self) -> &ProcessedReport {
        &self.report
    }

    pub fn processed_table(&self, name: &str) -> Option<&ProcessedTable> {
        self.report.get(name)
    }

    /// Processes one table with `threshold`, replacing its previous result.
    /// The threshold buckets amount tables and is the cut-off of filter-only
    /// tables. On failure the table is removed from the report.
    pub fn process(&mut self, name: &str, threshold: f64) -> Outcome {
        match self.run_pipeline(name, threshold) {
            Ok(table) => {
                let message = format!("Processed '{}' with threshold {}: {} row(s)", name, threshold, table.rows.len());
                info!(table = %name, threshold, rows = table.rows.len(), "processed table");
                self.report.insert(table);
                Outcome {
                    table: name.to_owned(),
                    success: true,
                    message,
                }
            }
            Err(error) => {
                warn!(table = %name, "{error}");
                self.report.remove(name);
                Outcome {
                    table: name.to_owned(),
                    success: false,
                    message: error.to_string(),
                }
            }
        }
    }

    /// Processes every table that has a processing rule. The operator
    /// threshold buckets the amount tables; filter-only tables use their own
    /// default cut-off.
    pub fn process_all(&mut self, threshold: f64) -> Vec<Outcome> {
        let tables: Vec<(String, f64)> = self
            .definitions
            .iter()
            .filter(|definition| definition.pipeline.is_some())
            .map(|definition| {
                let cutoff = definition.default_threshold().unwrap_or(threshold);
                (definition.name().to_owned(), cutoff)
            })
            .collect();
        tables
            .iter()
            .map(|(name, cutoff)| self.process(name, *cutoff))
            .collect()
    }

    fn run_pipeline(&self, name: &str, threshold: f64) -> Result<ProcessedTable, SheetReportError> {
        let definition = self
            .definitions
            .iter()
            .find(|definition| definition.name() == name)
            .ok_or_else(|| ReportError::UnknownTable(name.to_owned()))?;
        let raw = self.raw_table(name).ok_or_else(|| self.extraction_error(name))?;
        let pipeline = definition
            .pipeline
            .as_ref()
            .ok_or_else(|| ReportError::NoProcessingRule(name.to_owned()))?;
        if raw.is_empty() {
            return Err(ReportError::EmptyTable(name.to_owned()).into());
        }

        let table = resolve_columns(raw, &definition.spec)?;
        let mut table = remove_subtotals(table, &definition.spec);
        match pipeline {
            Pipeline::Bucketed {
                fill_down: columns,
                split,
                aggregation,
                bucketing,
            } => {
                for column in columns {
                    fill_down(&mut table, column);
                }
                if let Some(rule) = split {
                    categorize(&mut table, rule);
                }
                let aggregated = bucketize(aggregate(&table, aggregation), aggregation, bucketing, threshold);
                Ok(ProcessedTable {
                    name: name.to_owned(),
                    columns: aggregated.columns.clone(),
                    rows: aggregated.rows.iter().map(AggregatedRow::cells).collect(),
                })
            }
            Pipeline::Filtered {
                columns,
                fill_down: column,
                filter,
                ..
            } => {
                let mut table = table.select(columns);
                fill_down(&mut table, column);
                let table = filter.apply(table, threshold);
                Ok(ProcessedTable {
                    name: name.to_owned(),
                    columns: table.columns,
                    rows: table.rows,
                })
            }
        }
    }

    /// Reason a table is missing from the raw tables.
    fn extraction_error(&self, name: &str) -> SheetReportError {
        self.skipped
            .iter()
            .find(|error| match error {
                TableError::TableNotFound(table)
                | TableError::TableTooShort { name: table, .. }
                | TableError::MissingColumn { table, .. } => table == name,
            })
            .cloned()
            .unwrap_or_else(|| TableError::TableNotFound(name.to_owned()))
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::aggregate::Reducer;
    use crate::spreadsheet::MemoryWorkbook;
    use crate::table::{ColumnSpec, HeadingRule, HeadingScope};

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells
            .iter()
            .map(|cell| match cell.parse::<f64>() {
                Ok(value) => CellValue::Number(value),
                Err(_) => CellValue::from(*cell),
            })
            .collect()
    }

    fn definitions() -> Vec<TableDefinition> {
        let spec = TableSpec::new("一、逾期还款业务")
            .heading(HeadingRule::new(r"一、\s*逾期还款业务", HeadingScope::FirstCell).unwrap())
            .required(vec![
                ColumnSpec::text("逾期事由", &["原因"]),
                ColumnSpec::number("金额/万元", &["金额"]),
                ColumnSpec::text("板群", &[]),
                ColumnSpec::text("经营单位", &[]),
                ColumnSpec::text("客户", &["客户名称"]),
                ColumnSpec::text("产品", &[]),
            ])
            .key_column(ColumnSpec::text("合同号", &[]))
            .label_column("经营单位");
        let pipeline = Pipeline::Bucketed {
            fill_down: vec!["板群".to_owned()],
            split: Some(SplitRule::new("金额/万元", "逾期事由", &["控货逾期未收款"], "控货类", "授信类")),
            aggregation: Aggregation::new(
                &["板群", "经营单位", "客户"],
                &[
                    ("产品", Reducer::Join),
                    ("金额/万元", Reducer::Sum),
                    ("控货类", Reducer::Sum),
                    ("授信类", Reducer::Sum),
                ],
            ),
            bucketing: Bucketing::new("客户", "金额/万元", &["产品"]),
        };
        let unprocessed = TableSpec::new("五、签约未到货")
            .heading(HeadingRule::new(r"五、\s*签约未到货", HeadingScope::FirstCell).unwrap());
        vec![TableDefinition::new(spec, Some(pipeline)), TableDefinition::new(unprocessed, None)]
    }

    fn grid() -> Grid {
        let mut rows = vec![text_row(&["贸易经营风险指标"]), Vec::new()];
        rows.extend([
            text_row(&["一、逾期还款业务"]),
            text_row(&["合同号", "板群", "经营单位", "客户名称", "产品", "金额", "逾期事由"]),
            text_row(&["HT1", "钢铁", "一部", "ClientA", "热卷", "1000", "控货逾期未收款"]),
            text_row(&["HT2", "", "一部", "ClientA", "冷轧", "2500", "资金紧张"]),
            text_row(&["HT3", "", "二部", "ClientB", "螺纹钢", "800", "资金紧张"]),
            text_row(&["", "", "小计", "", "", "4300", ""]),
            text_row(&["五、签约未到货"]),
            text_row(&["合同号", "供应商"]),
            text_row(&["HT9", "S1"]),
        ]);
        Grid::new(rows)
    }

    fn processor() -> Processor {
        let mut processor = Processor::new(definitions());
        let mut workbook = MemoryWorkbook::new().with_sheet("贸易经营风险指标", grid());
        let loaded = processor
            .load(&mut workbook, "贸易经营风险指标", &SegmentOptions::default())
            .unwrap();
        assert_eq!(loaded, 2);
        processor
    }

    #[test]
    fn bucketed_table() {
        let mut processor = processor();
        let outcome = processor.process("一、逾期还款业务", 3000.0);
        assert!(outcome.success, "{}", outcome.message);

        let table = processor.processed_table("一、逾期还款业务").unwrap();
        assert_eq!(table.columns, vec!["板群", "经营单位", "客户", "产品", "金额/万元", "控货类", "授信类"]);
        assert_eq!(
            table.rows,
            vec![
                text_row(&["钢铁", "一部", "ClientA", "热卷/冷轧", "3500", "1000", "2500"]),
                text_row(&["钢铁", "二部", "其他", "见明细表", "800", "0", "800"]),
            ]
        );
    }

    #[test]
    fn rerun_replaces_result() {
        let mut processor = processor();
        processor.process("一、逾期还款业务", 3000.0);
        processor.process("一、逾期还款业务", 100.0);
        assert_eq!(processor.report().len(), 1);
        let table = processor.processed_table("一、逾期还款业务").unwrap();
        let client = table.column_index("客户").unwrap();
        assert_eq!(table.rows[1][client], CellValue::text("ClientB"));
    }

    #[test]
    fn failures_are_reported_per_table() {
        let mut processor = processor();
        let outcome = processor.process("五、签约未到货", 3000.0);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Table '五、签约未到货' has no processing rule");
        assert!(processor.raw_table("五、签约未到货").is_some());

        let outcome = processor.process("九、期现结合90天及以上库存", 3000.0);
        assert_eq!(outcome.message, "Table '九、期现结合90天及以上库存' is not defined");

        let outcomes = processor.process_all(3000.0);
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].success);
    }

    #[test]
    fn missing_sheet() {
        let mut processor = Processor::new(definitions());
        let mut workbook = MemoryWorkbook::new();
        let error = processor
            .load(&mut workbook, "贸易经营风险指标", &SegmentOptions::default())
            .unwrap_err();
        assert_eq!(error.to_string(), "memory: Worksheet '贸易经营风险指标' not found");
    }

    #[test]
    fn missing_column_fails_only_that_table() {
        let mut definitions = definitions();
        definitions[0].spec.required.push(ColumnSpec::text("担保方式", &[]));
        let mut processor = Processor::new(definitions);
        processor.load_grid(&grid(), &SegmentOptions::default());
        let outcome = processor.process("一、逾期还款业务", 3000.0);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Table '一、逾期还款业务' is missing required column '担保方式'");
        assert!(processor.report().is_empty());
    }
}
