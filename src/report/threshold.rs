use crate::spreadsheet::cell::parse_number;
use thiserror::Error;
use tracing::warn;

/// Threshold used when the operator input is not a finite number.
pub const DEFAULT_THRESHOLD: f64 = 3000.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdParseError {
    #[error("Threshold is empty")]
    Empty,

    #[error("Threshold '{0}' is not a finite number")]
    InvalidNumber(String),
}

/// Parses an operator supplied threshold.
pub fn parse_threshold(input: &str) -> Result<f64, ThresholdParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ThresholdParseError::Empty);
    }
    parse_number(input).ok_or_else(|| ThresholdParseError::InvalidNumber(input.to_owned()))
}

/// Parses a threshold, falling back to [`DEFAULT_THRESHOLD`].
pub fn threshold_or_default(input: &str) -> f64 {
    parse_threshold(input).unwrap_or_else(|error| {
        warn!(fallback = DEFAULT_THRESHOLD, "{error}");
        DEFAULT_THRESHOLD
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(parse_threshold(" 1500.5 "), Ok(1500.5));
        assert_eq!(parse_threshold("5,000"), Ok(5000.0));
        assert_eq!(parse_threshold(""), Err(ThresholdParseError::Empty));
        assert_eq!(
            parse_threshold("三千"),
            Err(ThresholdParseError::InvalidNumber("三千".to_owned()))
        );
        assert!(parse_threshold("inf").is_err());
        assert!(parse_threshold("NaN").is_err());
    }

    #[test]
    fn fallback() {
        assert_eq!(threshold_or_default("abc"), DEFAULT_THRESHOLD);
        assert_eq!(threshold_or_default("100"), 100.0);
    }
}
