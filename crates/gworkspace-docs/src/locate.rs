//! Text-location resolution over a fetched document.
//!
//! Only top-level body paragraphs are scanned, in document order, and the
//! first match wins. Offsets are Docs indices, which count UTF-16 code units.

use crate::error::LocateError;
use crate::types::{Document, ParagraphElement, Table};

/// Length of `text` in Docs index units.
pub fn utf16_len(text: &str) -> i64 {
    text.encode_utf16().count() as i64
}

/// Non-empty text runs of the body's paragraphs, in order.
fn text_runs(doc: &Document) -> impl Iterator<Item = (&ParagraphElement, &str)> {
    doc.body
        .content
        .iter()
        .filter_map(|element| element.paragraph.as_ref())
        .flat_map(|paragraph| paragraph.elements.iter())
        .filter_map(|element| {
            element
                .text_run
                .as_ref()
                .map(|run| (element, run.content.as_str()))
        })
        .filter(|(_, content)| !content.is_empty())
}

/// End index of the last structural element.
pub fn body_end_index(doc: &Document) -> Result<i64, LocateError> {
    doc.body
        .content
        .last()
        .map(|element| element.end_index)
        .ok_or(LocateError::EmptyBody)
}

/// Where appended content goes: just before the body's final newline.
pub fn append_index(doc: &Document) -> Result<i64, LocateError> {
    Ok(body_end_index(doc)? - 1)
}

/// Insertion point right after the line `start_line`, provided `end_line`
/// appears later in the document.
pub fn between_lines_index(
    doc: &Document,
    start_line: &str,
    end_line: &str,
) -> Result<i64, LocateError> {
    let mut start = None;
    let mut end = None;

    for (element, content) in text_runs(doc) {
        let line = content.trim();
        if line == start_line && start.is_none() {
            start = Some(element.start_index);
        } else if line == end_line && end.is_none() {
            end = Some(element.start_index);
        }
    }

    let start = start.ok_or_else(|| LocateError::StartLineNotFound(start_line.to_string()))?;
    let end = end.ok_or_else(|| LocateError::EndLineNotFound(end_line.to_string()))?;
    if start >= end {
        return Err(LocateError::LinesOutOfOrder {
            start: start_line.to_string(),
            end: end_line.to_string(),
        });
    }

    // Skip the line itself and its newline.
    Ok(start + utf16_len(start_line) + 1)
}

/// End index of the first run whose trimmed content is `line`.
pub fn after_line_index(doc: &Document, line: &str) -> Result<i64, LocateError> {
    text_runs(doc)
        .find(|(_, content)| content.trim() == line)
        .map(|(element, _)| element.end_index)
        .ok_or_else(|| LocateError::LineNotFound(line.to_string()))
}

/// Index just past the first occurrence of `pattern` inside a run.
pub fn after_pattern_index(doc: &Document, pattern: &str) -> Result<i64, LocateError> {
    find_in_runs(doc, pattern)
        .map(|start| start + utf16_len(pattern))
        .ok_or_else(|| LocateError::PatternNotFound(pattern.to_string()))
}

/// `[start, end)` of the first occurrence of `text` inside a run.
pub fn text_range(doc: &Document, text: &str) -> Result<(i64, i64), LocateError> {
    find_in_runs(doc, text)
        .map(|start| (start, start + utf16_len(text)))
        .ok_or_else(|| LocateError::TextNotFound(text.to_string()))
}

fn find_in_runs(doc: &Document, needle: &str) -> Option<i64> {
    text_runs(doc).find_map(|(element, content)| {
        content
            .find(needle)
            .map(|byte_offset| element.start_index + utf16_len(&content[..byte_offset]))
    })
}

/// The `n`-th table of the body (0-based) with its start index.
pub fn nth_table(doc: &Document, n: usize) -> Result<(i64, &Table), LocateError> {
    doc.body
        .content
        .iter()
        .filter_map(|element| element.table.as_ref().map(|table| (element.start_index, table)))
        .nth(n)
        .ok_or(LocateError::TableNotFound(n))
}

/// Index inside the given cell, where cell text can be inserted.
pub fn table_cell_index(
    doc: &Document,
    table: usize,
    row: usize,
    column: usize,
) -> Result<i64, LocateError> {
    let (_, found) = nth_table(doc, table)?;
    found
        .table_rows
        .get(row)
        .and_then(|r| r.table_cells.get(column))
        .map(|cell| cell.start_index + 1)
        .ok_or(LocateError::CellOutOfRange { table, row, column })
}
