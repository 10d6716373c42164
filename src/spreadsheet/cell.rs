use chrono::Duration;
use chrono::NaiveDate;
use std::fmt::Display;

/// A typed cell value as handed to the table pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn text<S: Into<String>>(value: S) -> Self {
        Self::Text(value.into())
    }

    /// True for empty cells and text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(_) => false,
            Self::Text(text) => text.trim().is_empty(),
        }
    }

    /// Numeric view of the cell; blank or unparsable content yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Number(value) => Some(*value).filter(|value| value.is_finite()),
            Self::Text(text) => parse_number(text),
        }
    }

    /// Numeric coercion used by reducers: anything that is not a number counts as 0.
    pub fn to_number(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Trimmed display text, empty for blank cells.
    pub fn to_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(value) => format_number(*value),
            Self::Text(text) => text.trim().to_owned(),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_owned())
        }
    }
}

/// Parses a number written with a `.` decimal point. Thousands separators and
/// a leading plus sign are tolerated; non-finite results are rejected.
pub(crate) fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Integral values print without a fractional part (`1000`, not `1000.0`).
pub(crate) fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Raw cell kinds as declared by the xlsx cell attributes and number formats.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    Boolean,
    Number,
    /// Date/time serial numbers, 1900 or 1904 epoch
    NumberDateTime(bool),
    NumberDate(bool),
    NumberTime,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    InlineString,
    /// Index into the shared string table
    SharedString,
    Error,
}

impl CellType {
    /// Maps built-in Excel number format IDs to date/time kinds.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(Self::NumberDateTime(is_1904)),
            "14" | "15" | "16" | "17" => Some(Self::NumberDate(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::NumberTime),
            _ => None,
        }
    }

    /// Scans a custom number format code for date and time tokens,
    /// ignoring quoted literals, escapes and bracketed colors.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::NumberDateTime(is_1904),
            (true, false) => Self::NumberDate(is_1904),
            (false, true) => Self::NumberTime,
            (false, false) => Self::Number,
        }
    }

    /// Converts a raw `<v>` payload into a cell value. Shared strings must be
    /// resolved by the caller; error cells and unparsable dates become empty.
    pub(crate) fn to_value(self, raw: &str) -> CellValue {
        match self {
            Self::Empty | Self::Error => CellValue::Empty,
            Self::Boolean => CellValue::text(if raw == "1" { "TRUE" } else { "FALSE" }),
            Self::Number => match raw.trim().parse::<f64>() {
                Ok(value) => CellValue::Number(value),
                Err(_) => CellValue::from(raw),
            },
            Self::NumberDateTime(is_1904) => to_datetime_string(raw, is_1904)
                .map(CellValue::Text)
                .unwrap_or_default(),
            Self::NumberDate(is_1904) => to_date_string(raw, is_1904)
                .map(CellValue::Text)
                .unwrap_or_default(),
            Self::NumberTime => to_time_string(raw)
                .map(CellValue::Text)
                .unwrap_or_default(),
            Self::IsoDateTime => CellValue::text(raw.replace('T', " ")),
            Self::InlineString | Self::SharedString => CellValue::from(raw),
        }
    }
}

/// Converts an Excel serial day number to an ISO date string.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 epoch.
fn to_date_string(value: &str, is_1904: bool) -> Option<String> {
    let days = value.trim().parse::<f64>().ok()?.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)? + Duration::days(days + offset);
    Some(date.format("%Y-%m-%d").to_string())
}

/// Converts the fractional part of a serial number to `HH:MM:SS`.
fn to_time_string(value: &str) -> Option<String> {
    let factor = value.trim().parse::<f64>().ok()?.fract();
    let mut seconds = (factor * 86_400f64).round() as i64;
    let second = seconds % 60; seconds /= 60;
    let minute = seconds % 60; seconds /= 60;
    Some(format!("{seconds:02}:{minute:02}:{second:02}"))
}

fn to_datetime_string(value: &str, is_1904: bool) -> Option<String> {
    let date = to_date_string(value, is_1904)?;
    let time = to_time_string(value)?;
    Some(format!("{date} {time}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::text("  \t").is_blank());
        assert!(!CellValue::Number(0.0).is_blank());
        assert!(!CellValue::text("客户").is_blank());
    }

    #[test]
    fn number_coercion() {
        assert_eq!(CellValue::Number(12.5).to_number(), 12.5);
        assert_eq!(CellValue::text(" 1,250.5 ").to_number(), 1250.5);
        assert_eq!(CellValue::text("+7").to_number(), 7.0);
        assert_eq!(CellValue::text("见明细表").to_number(), 0.0);
        assert_eq!(CellValue::text("NaN").as_number(), None);
        assert_eq!(CellValue::Empty.to_number(), 0.0);
    }

    #[test]
    fn display_text() {
        assert_eq!(CellValue::Number(1000.0).to_text(), "1000");
        assert_eq!(CellValue::Number(12.25).to_text(), "12.25");
        assert_eq!(CellValue::text("  ClientA ").to_text(), "ClientA");
        assert_eq!(CellValue::Empty.to_text(), "");
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate(false));
        assert_eq!(CellType::parse_custom_number_format("yyyy/m/d h:mm", true), CellType::NumberDateTime(true));
        assert_eq!(CellType::parse_custom_number_format("[h]:mm:ss", false), CellType::NumberTime);
        assert_eq!(CellType::parse_custom_number_format("\"days\" 0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("[Red]#,##0", false), CellType::Number);
    }

    #[test]
    fn raw_values() {
        assert_eq!(CellType::Number.to_value("3500"), CellValue::Number(3500.0));
        assert_eq!(CellType::Boolean.to_value("1"), CellValue::text("TRUE"));
        assert_eq!(CellType::NumberDate(false).to_value("45292"), CellValue::text("2024-01-01"));
        assert_eq!(CellType::NumberDateTime(false).to_value("45292.5"), CellValue::text("2024-01-01 12:00:00"));
        assert_eq!(CellType::Error.to_value("#N/A"), CellValue::Empty);
    }
}
