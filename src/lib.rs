//! # Sheet Report
//!
//! Extracts the named tables of an unstructured risk-indicator worksheet and
//! turns them into a size-bucketed report.
//!
//! ## Features
//!
//! - **Heading-based segmentation**: tables are located by title patterns that
//!   tolerate full-width punctuation, with explicit boundary strategies
//!   (next heading, blank-row run, numeric-column gap)
//! - **Column aliases**: source headers are mapped onto canonical columns,
//!   optional columns are defaulted
//! - **Subtotal removal** and **merged-cell recovery** by forward filling
//! - **Aggregation** by business dimensions with sum and join reducers
//! - **Bucketing**: counterparties below the amount threshold are collapsed
//!   into one `其他` row per business unit
//! - **Pure Rust xlsx codec**: reads `.xlsx` worksheets and writes the report
//!   workbook, one worksheet per table
//!
//! ## Example
//!
//! ```no_run
//! let outcomes = sheet_report::run("risk.xlsx", "report.xlsx", "3000")?;
//! for outcome in outcomes {
//!     println!("{}: {}", outcome.table, outcome.message);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```
mod error;
mod helpers;
pub mod report;
pub mod spreadsheet;
pub mod table;

use crate::report::catalog::{risk_indicator_tables, SHEET_NAME};
use crate::report::threshold::threshold_or_default;
use crate::report::writer::{ReportSink, XlsxReportWriter};
use crate::report::{Outcome, Processor};
use crate::spreadsheet::XlsxWorkbook;
use crate::table::SegmentOptions;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

pub use crate::error::SheetReportError;

/// Processes the risk indicator worksheet of `input` and writes every
/// processed table to `output`.
///
/// The threshold text applies to the amount-bucketed tables and falls back
/// to 3000 when it is not a finite number. Tables that fail are reported in
/// the returned outcomes and left out of the output file.
pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q, threshold: &str) -> Result<Vec<Outcome>> {
    let input = input.as_ref();
    let output = output.as_ref();
    let threshold = threshold_or_default(threshold);

    let mut workbook = XlsxWorkbook::open(input)
        .with_context(|| format!("Failed to open workbook '{}'", input.display()))?;
    let mut processor = Processor::new(risk_indicator_tables());
    let tables = processor
        .load(&mut workbook, SHEET_NAME, &SegmentOptions::default())
        .with_context(|| format!("Failed to read worksheet '{}'", SHEET_NAME))?;
    info!(input = %input.display(), tables, "extracted tables");

    let outcomes = processor.process_all(threshold);
    XlsxReportWriter::new(output)
        .write_report(processor.report())
        .with_context(|| format!("Failed to write report '{}'", output.display()))?;
    info!(output = %output.display(), tables = processor.report().len(), "report written");
    Ok(outcomes)
}
