use crate::spreadsheet::CellValue;
use crate::table::{normalize_width, CanonicalTable};

/// Splits one amount column into two mutually exclusive amount columns by a
/// reason code.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitRule {
    /// Amount column that is split
    pub source: String,
    /// Column holding the reason code
    pub discriminator: String,
    /// Reason codes routed to the `matched` column
    pub codes: Vec<String>,
    pub matched: String,
    pub unmatched: String,
}

impl SplitRule {
    pub fn new(source: &str, discriminator: &str, codes: &[&str], matched: &str, unmatched: &str) -> Self {
        Self {
            source: source.to_owned(),
            discriminator: discriminator.to_owned(),
            codes: codes.iter().map(|code| normalize_width(code)).collect(),
            matched: matched.to_owned(),
            unmatched: unmatched.to_owned(),
        }
    }

    /// Amounts of the matched and unmatched columns for one row.
    fn split(&self, reason: &CellValue, amount: &CellValue) -> (f64, f64) {
        let amount = amount.to_number();
        let reason = normalize_width(&reason.to_text());
        if self.codes.iter().any(|code| *code == reason) {
            (amount, 0.0)
        } else {
            (0.0, amount)
        }
    }
}

/// Adds (or overwrites) the two derived amount columns of `rule`.
pub fn categorize(table: &mut CanonicalTable, rule: &SplitRule) {
    let (matched, unmatched): (Vec<CellValue>, Vec<CellValue>) = table
        .rows
        .iter()
        .map(|row| {
            let (matched, unmatched) = rule.split(table.value(row, &rule.discriminator), table.value(row, &rule.source));
            (CellValue::Number(matched), CellValue::Number(unmatched))
        })
        .unzip();
    table.set_column(&rule.matched, matched);
    table.set_column(&rule.unmatched, unmatched);
}
