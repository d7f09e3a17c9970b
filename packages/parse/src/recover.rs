//! Category table recovery.
//!
//! A category table has a fixed list of row labels and a fixed number of
//! value columns. Rows are recovered by running the table's strategies in
//! order over the section window:
//!
//! 1. **Grid**: rows of the window's table grid whose label cell contains
//!    every keyword of a category
//! 2. **Anchored regex**: the category's regex variants, strictest first
//! 3. **Line scan**: numbers from the first line carrying the category's
//!    keywords
//!
//! The first strategy that recovers any category decides the table; every
//! category it missed is zero-filled. The output always has one row per
//! category in schema order.

use gstr_extract_pdf::grid::grids_from_text;
use gstr_extract_returns_models::{RecoveryStrategy, TableRow, TableSchema};
use regex::Regex;

use crate::numeric::{normalize_amount, numbers_in_line, parse_amount};
use crate::section::SectionAnchors;

/// Everything needed to recover one category row.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub label: String,
    /// Lowercase substrings that must all occur in a grid row's label.
    pub grid_keywords: Vec<String>,
    /// Regex variants tried in order; each captures the row's values.
    pub patterns: Vec<Regex>,
    /// Case-sensitive substrings that must all occur in a line.
    pub line_keywords: Vec<String>,
}

/// A compiled category table.
#[derive(Debug, Clone)]
pub struct TableRule {
    pub schema: TableSchema,
    pub section: SectionAnchors,
    pub strategies: Vec<RecoveryStrategy>,
    pub categories: Vec<CategoryRule>,
    /// Minimum numbers a line must carry for the line scan to accept it.
    pub min_line_values: usize,
}

impl TableRule {
    /// Number of value columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.schema.columns.len()
    }
}

type Recovered = Vec<Option<Vec<f64>>>;

/// Recovers every category row of `rule` from a document's full text.
#[must_use]
pub fn recover_table(document: &str, text: &str, rule: &TableRule) -> Vec<TableRow> {
    let window = rule.section.locate(text);
    if window.is_empty() {
        log::warn!("{document}: {} section not found", rule.schema.title);
    }

    let mut recovered: Recovered = vec![None; rule.categories.len()];
    let mut strategy = RecoveryStrategy::Default;

    if !window.is_empty() {
        for candidate in &rule.strategies {
            recovered = match candidate {
                RecoveryStrategy::Grid => from_grid(window, rule),
                RecoveryStrategy::AnchoredRegex => from_patterns(window, rule),
                RecoveryStrategy::LineScan => from_lines(window, rule),
                RecoveryStrategy::Default => continue,
            };

            let found = recovered.iter().filter(|v| v.is_some()).count();
            if found > 0 {
                log::debug!(
                    "{document}: {} recovered {found}/{} rows via {candidate}",
                    rule.schema.title,
                    rule.categories.len(),
                );
                strategy = *candidate;
                break;
            }
        }
    }

    rule.categories
        .iter()
        .zip(recovered)
        .map(|(category, values)| {
            let (values, strategy) = values.map_or_else(
                || (vec![0.0; rule.width()], RecoveryStrategy::Default),
                |v| (v, strategy),
            );
            TableRow {
                document: document.to_owned(),
                table: rule.schema.id.clone(),
                label: category.label.clone(),
                values,
                strategy,
            }
        })
        .collect()
}

fn from_grid(window: &str, rule: &TableRule) -> Recovered {
    let width = rule.width();
    let mut recovered: Recovered = vec![None; rule.categories.len()];

    for grid in grids_from_text(window) {
        for row in &grid.rows {
            if row.len() < width + 1 {
                continue;
            }
            let label = row[0].to_lowercase();
            let Some(idx) = rule.categories.iter().position(|c| {
                !c.grid_keywords.is_empty()
                    && c.grid_keywords.iter().all(|k| label.contains(k.as_str()))
            }) else {
                continue;
            };

            let values: Vec<f64> = row[1..=width]
                .iter()
                .map(|cell| normalize_amount(Some(cell)))
                .collect();

            if recovered[idx].is_none() && values.iter().any(|v| *v != 0.0) {
                recovered[idx] = Some(values);
            }
        }
    }

    recovered
}

fn from_patterns(window: &str, rule: &TableRule) -> Recovered {
    let width = rule.width();

    rule.categories
        .iter()
        .map(|category| {
            category.patterns.iter().find_map(|pattern| {
                let caps = pattern.captures(window)?;
                let mut values = caps
                    .iter()
                    .skip(1)
                    .map(|group| group.and_then(|m| parse_amount(m.as_str())))
                    .collect::<Option<Vec<f64>>>()?;
                values.resize(width, 0.0);
                Some(values)
            })
        })
        .collect()
}

fn from_lines(window: &str, rule: &TableRule) -> Recovered {
    let width = rule.width();

    rule.categories
        .iter()
        .map(|category| {
            if category.line_keywords.is_empty() {
                return None;
            }
            window.lines().find_map(|line| {
                let tail = category
                    .line_keywords
                    .iter()
                    .map(|k| line.find(k.as_str()).map(|idx| idx + k.len()))
                    .collect::<Option<Vec<usize>>>()?
                    .into_iter()
                    .max()?;

                let numbers = numbers_in_line(&line[tail..]);
                if numbers.len() < rule.min_line_values.max(1) {
                    return None;
                }

                // Labels precede values, so surplus numbers are label text.
                let skip = numbers.len().saturating_sub(width);
                let mut values: Vec<f64> = numbers.into_iter().skip(skip).collect();
                values.resize(width, 0.0);
                Some(values)
            })
        })
        .collect()
}
