//! Handles all user-facing output for the CLI.
//!
//! Result tables for DEBUG queries and line diffs for failed comparisons are
//! rendered here so every report looks the same.

use crate::value::{Row, Scalar};
use difference::{Changeset, Difference};
use std::io;
use termcolor::{ColorSpec, WriteColor};
use unicode_width::UnicodeWidthStr;

// ============================================================================
// RESULT TABLES
// ============================================================================

/// Prints rows as a boxed table with centred cells and a bold header row.
///
/// ```text
/// +---+-------+
/// | x | name  |
/// +---+-------+
/// | 1 | alice |
/// +---+-------+
/// ```
///
/// An empty result prints nothing.
pub fn print_table<W: WriteColor>(
    out: &mut W,
    headers: &[String],
    rows: &[Row],
) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.values().iter().map(Scalar::to_cell).collect())
        .collect();
    let widths = column_widths(headers, &cells);
    let separator = separator(&widths);

    writeln!(out, "{}", separator)?;
    if !headers.is_empty() {
        out.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(out, "{}", format_row(headers, &widths))?;
        out.reset()?;
        writeln!(out, "{}", separator)?;
    }
    for row in &cells {
        writeln!(out, "{}", format_row(row, &widths))?;
    }
    writeln!(out, "{}", separator)
}

fn column_widths(headers: &[String], cells: &[Vec<String>]) -> Vec<usize> {
    let columns = cells
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(headers.len()))
        .max()
        .unwrap_or(0);
    (0..columns)
        .map(|i| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .chain(headers.get(i))
                .map(|text| text.width())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

fn separator(widths: &[usize]) -> String {
    let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
    format!("+{}+", dashes.join("+"))
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| center(cells.get(i).map(String::as_str).unwrap_or(""), width))
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Centres `text` in `width` columns; odd padding goes to the right.
fn center(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(text.width());
    let left = pad / 2;
    format!("{}{}{}", " ".repeat(left), text, " ".repeat(pad - left))
}

// ============================================================================
// DIFFS
// ============================================================================

/// Line diff of expected vs actual, one output line per input line:
/// `"  "` unchanged, `"- "` only expected, `"+ "` only actual.
pub fn diff_lines(expected: &[String], actual: &[String]) -> Vec<String> {
    if expected.is_empty() {
        return actual.iter().map(|l| format!("+ {}", l)).collect();
    }
    if actual.is_empty() {
        return expected.iter().map(|l| format!("- {}", l)).collect();
    }

    let changeset = Changeset::new(&expected.join("\n"), &actual.join("\n"), "\n");
    let mut lines = Vec::new();
    for diff in &changeset.diffs {
        let (prefix, text) = match diff {
            Difference::Same(x) => ("  ", x),
            Difference::Rem(x) => ("- ", x),
            Difference::Add(x) => ("+ ", x),
        };
        lines.extend(text.split('\n').map(|l| format!("{}{}", prefix, l)));
    }
    lines
}
