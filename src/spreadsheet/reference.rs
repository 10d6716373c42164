use once_cell::sync::Lazy;
use regex::Regex;

static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?(\d+)$").expect("Hardcode regex pattern"));

/// Converts an A1-style reference (e.g. "B12") into 0-based `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let captures = REFERENCE.captures(reference.trim())?;
    let col = captures
        .get(1)?
        .as_str()
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, letter| acc * 26 + (letter - b'A' + 1) as usize);
    let row = captures.get(2)?.as_str().parse::<usize>().ok()?;
    (row > 0).then(|| (row - 1, col - 1))
}
