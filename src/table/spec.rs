use crate::spreadsheet::CellValue;
use crate::table::normalize_width;
use regex::Regex;

/// Where a heading rule looks for the table title.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum HeadingScope {
    /// Only the first cell of each row
    FirstCell,
    /// Every cell of each row
    AnyCell,
}

/// Pattern identifying the title row of a table. Matching is done on
/// width-normalized cell text, so patterns are written with half-width punctuation.
#[derive(Clone, Debug)]
pub struct HeadingRule {
    pattern: Regex,
    scope: HeadingScope,
}

impl HeadingRule {
    pub fn new(pattern: &str, scope: HeadingScope) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            scope,
        })
    }

    pub fn scope(&self) -> HeadingScope {
        self.scope
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(&normalize_width(text))
    }
}

/// How the header row is found once the title row is known.
#[derive(Clone, Debug, PartialEq)]
pub enum HeaderLocation {
    /// The row right below the title
    NextRow,
    /// The first row within the header window whose cells contain every token
    Tokens(Vec<String>),
}

/// How the last row of a table is found.
#[derive(Clone, Debug, PartialEq)]
pub enum Boundary {
    /// Ends before the title of the next located table; the last located table ends at a blank run
    NextHeading,
    /// Ends before the first run of consecutive blank rows, or at the end of the grid
    BlankRun,
    /// Ends at the first row where the named numeric column is blank but the row is not;
    /// falls back to a blank run and never passes the next located title
    NumericGap(String),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ColumnKind {
    Text,
    Number,
}

/// A canonical column with the alternative labels it may carry in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    /// Alternative labels, tried in order
    pub aliases: Vec<String>,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn text(name: &str, aliases: &[&str]) -> Self {
        Self::new(name, aliases, ColumnKind::Text)
    }

    pub fn number(name: &str, aliases: &[&str]) -> Self {
        Self::new(name, aliases, ColumnKind::Number)
    }

    fn new(name: &str, aliases: &[&str], kind: ColumnKind) -> Self {
        Self {
            name: name.to_owned(),
            aliases: aliases.iter().map(|alias| (*alias).to_owned()).collect(),
            kind,
        }
    }
}

/// Static definition of one named table of the worksheet.
#[derive(Clone, Debug)]
pub struct TableSpec {
    pub name: String,
    pub headings: Vec<HeadingRule>,
    pub header: HeaderLocation,
    pub boundary: Boundary,
    pub required: Vec<ColumnSpec>,
    pub optional: Vec<ColumnSpec>,
    /// Column that is blank on subtotal and grand-total rows
    pub key_column: Option<ColumnSpec>,
    /// Column scanned for subtotal markers when the key column is unavailable
    pub label_column: Option<String>,
}

impl TableSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            headings: Vec::new(),
            header: HeaderLocation::NextRow,
            boundary: Boundary::NextHeading,
            required: Vec::new(),
            optional: Vec::new(),
            key_column: None,
            label_column: None,
        }
    }

    pub fn heading(mut self, rule: HeadingRule) -> Self {
        self.headings.push(rule);
        self
    }

    pub fn header(mut self, header: HeaderLocation) -> Self {
        self.header = header;
        self
    }

    pub fn boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn required(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.required = columns;
        self
    }

    pub fn optional(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.optional = columns;
        self
    }

    pub fn key_column(mut self, column: ColumnSpec) -> Self {
        self.key_column = Some(column);
        self
    }

    pub fn label_column(mut self, column: &str) -> Self {
        self.label_column = Some(column.to_owned());
        self
    }

    /// True when any heading rule matches the row within its scope.
    pub(crate) fn matches_title_row(&self, cells: &[CellValue]) -> bool {
        self.headings.iter().any(|rule| match rule.scope() {
            HeadingScope::FirstCell => cells
                .first()
                .map(|cell| rule.matches(&cell.to_text()))
                .unwrap_or(false),
            HeadingScope::AnyCell => cells
                .iter()
                .filter(|cell| !cell.is_blank())
                .any(|cell| rule.matches(&cell.to_text())),
        })
    }
}
