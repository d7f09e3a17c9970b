//! Table grid recovery from page text.
//!
//! Return PDFs render their tables as text lines where a row label is
//! followed by its numeric cells. A grid is rebuilt by splitting each line
//! into cells:
//! - **Gap-delimited lines**: runs of two or more spaces (or tabs) separate
//!   cells, as produced by most layout-preserving extractors
//! - **Single-spaced lines**: trailing numeric or placeholder tokens become
//!   cells and everything before them is the label
//!
//! Labels that wrap onto a second line are joined back onto the line that
//! opened them with an item marker such as `(3)` or `C.`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static GAP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{2,}").unwrap_or_else(|_| unreachable!()));

static VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[-–—]|(?:₹|Rs\.?)?\s?[\d,]*\d(?:\.\d+)?)$").unwrap_or_else(|_| unreachable!())
});

static ITEM_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\(\s*[0-9A-Za-z]{1,3}\s*\)|(?:\d{1,2}|[A-Za-z])\.(?:\s|$))")
        .unwrap_or_else(|_| unreachable!())
});

/// A table recovered from text: rows of cells, label first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableGrid {
    pub rows: Vec<Vec<String>>,
}

impl TableGrid {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Returns `true` if `token` is a numeric cell or a "no data" dash.
#[must_use]
pub fn is_value_token(token: &str) -> bool {
    VALUE_RE.is_match(token.trim())
}

/// Returns `true` if `text` opens with a row item marker (`(3)`, `(a)`,
/// `C.`, `4.`).
#[must_use]
pub fn starts_with_item_marker(text: &str) -> bool {
    ITEM_MARKER_RE.is_match(text.trim_start())
}

/// Splits one line into cells.
///
/// Returns an empty vector for blank lines. The first cell is the label
/// (possibly empty when the line holds only values).
#[must_use]
pub fn split_cells(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }

    let gap_cells: Vec<&str> = GAP_RE
        .split(line)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    if gap_cells.len() > 1 {
        let mut cells = Vec::with_capacity(gap_cells.len());
        for cell in gap_cells {
            let tokens: Vec<&str> = cell.split_whitespace().collect();
            if tokens.len() > 1 && tokens.iter().all(|t| is_value_token(t)) {
                cells.extend(tokens.into_iter().map(str::to_owned));
            } else {
                cells.push(cell.to_owned());
            }
        }
        return cells;
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let value_start = tokens
        .iter()
        .rposition(|t| !is_value_token(t))
        .map_or(0, |idx| idx + 1);

    let label_tokens = &tokens[..value_start];
    let mut cells = Vec::with_capacity(tokens.len() - value_start + 2);

    match label_tokens {
        [serial, rest @ ..]
            if !rest.is_empty() && serial.chars().all(|c| c.is_ascii_digit()) =>
        {
            cells.push((*serial).to_owned());
            cells.push(rest.join(" "));
        }
        _ => cells.push(label_tokens.join(" ")),
    }

    cells.extend(tokens[value_start..].iter().map(|t| (*t).to_owned()));
    cells
}

/// Builds the table grids found in a block of text.
///
/// A grid is a run of lines carrying at least one value cell. Blank lines
/// and unmarked value-less lines end the current grid.
#[must_use]
pub fn grids_from_text(text: &str) -> Vec<TableGrid> {
    let mut grids = Vec::new();
    let mut current = TableGrid::default();
    let mut pending_label: Option<String> = None;

    for line in text.lines() {
        let mut cells = split_cells(line);

        if cells.len() < 2 {
            match cells.pop() {
                Some(label) if starts_with_item_marker(&label) => {
                    pending_label = Some(label);
                }
                _ => {
                    pending_label = None;
                    if !current.is_empty() {
                        grids.push(std::mem::take(&mut current));
                    }
                }
            }
            continue;
        }

        if let Some(prefix) = pending_label.take()
            && !starts_with_item_marker(line)
        {
            cells = split_cells(&format!("{prefix} {}", line.trim()));
        }

        current.rows.push(cells);
    }

    if !current.is_empty() {
        grids.push(current);
    }

    grids
}
