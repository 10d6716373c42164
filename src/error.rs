use thiserror::Error;

/// Main error type for the sheet report crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum SheetReportError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    // Table module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    // Report module errors
    #[error("{0}")]
    ReportError(#[from] crate::report::ReportError),

    #[error("{0}")]
    ThresholdParseError(#[from] crate::report::threshold::ThresholdParseError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetReportError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetReportError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableError;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), SheetReportError> = Err(TableError::TableNotFound("一、逾期还款业务".to_owned()).into());
        let error = result.with_prefix("segment").unwrap_err();
        assert_eq!(error.to_string(), "segment: Table '一、逾期还款业务' not found");
    }
}
