//! Pipe-table extraction from free-form answer text.
//!
//! Backend answers mix natural language with markdown-style pipe tables.
//! [`extract_table`] pulls the first such table out as a structured grid and
//! returns the surrounding prose separately, so the UI can render a real
//! grid instead of raw pipes.
//!
//! The parse is best-effort and never fails: malformed fragments degrade to
//! prose. Rows whose cell count differs from the header are dropped silently.

use serde::Serialize;

/// A parsed pipe table: header cells plus data rows.
///
/// Invariant: every row has exactly `headers.len()` cells, and headers are
/// unique within the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Extract the first pipe table from `text`.
///
/// Returns the table (if one parses) and the remainder text. On success the
/// remainder is `text` with the whole scanned table block removed; when no
/// table parses, the original text comes back unchanged.
pub fn extract_table(text: &str) -> (Option<TableView>, String) {
    let lines: Vec<&str> = text.lines().collect();

    let Some((start, end)) = find_table_run(&lines) else {
        return (None, text.to_string());
    };

    // Drop header/body divider lines ("---|---") inside the run.
    let kept: Vec<&str> = lines[start..end]
        .iter()
        .copied()
        .filter(|line| !is_separator_line(line))
        .collect();

    // Need a header plus at least one data row.
    if kept.len() < 2 {
        return (None, text.to_string());
    }

    let headers = split_cells(kept[0]);
    if has_duplicates(&headers) {
        return (None, text.to_string());
    }

    let rows: Vec<Vec<String>> = kept[1..]
        .iter()
        .map(|line| split_cells(line))
        .filter(|cells| cells.len() == headers.len())
        .collect();

    if rows.is_empty() {
        return (None, text.to_string());
    }

    let remainder: String = lines[..start]
        .iter()
        .chain(lines[end..].iter())
        .copied()
        .collect::<Vec<&str>>()
        .join("\n");

    (Some(TableView { headers, rows }), remainder)
}

// ── Line classification ───────────────────────────────────────────────────────

/// A line belongs to a table run when splitting on `|` yields at least two
/// non-empty cells. Blank lines and undelimited prose end the run.
fn is_table_line(line: &str) -> bool {
    line.contains('|') && line.split('|').filter(|c| !c.trim().is_empty()).count() >= 2
}

/// Divider between header and body: every non-empty cell is only `-` chars.
fn is_separator_line(line: &str) -> bool {
    line.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .all(|c| c.chars().all(|ch| ch == '-'))
}

/// First contiguous run of table lines, as a `[start, end)` index range.
fn find_table_run(lines: &[&str]) -> Option<(usize, usize)> {
    let start = lines.iter().position(|l| is_table_line(l))?;
    let end = lines[start..]
        .iter()
        .position(|l| !is_table_line(l))
        .map_or(lines.len(), |off| start + off);
    Some((start, end))
}

fn split_cells(line: &str) -> Vec<String> {
    line.split('|')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

fn has_duplicates(cells: &[String]) -> bool {
    let mut seen = std::collections::HashSet::new();
    cells.iter().any(|c| !seen.insert(c.as_str()))
}
