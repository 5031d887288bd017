//! Table pagination (import) and grid reassembly (export).
//!
//! Both functions are total: declared geometry that disagrees with the data is
//! repaired on a best-effort basis instead of being rejected.

use crate::blocks::BlockId;

/// Maximum body rows held by a single imported table block.
pub const TABLE_ROW_LIMIT: usize = 9;

/// A slice of an oversized table that becomes one table block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSegment<T> {
    pub rows: Vec<Vec<T>>,
}

/// Split `rows` into segments of at most `row_limit` rows, every row padded or
/// truncated to `column_count` cells.
///
/// An empty input still yields one empty segment so a header-only table keeps
/// its block. A zero `row_limit` is treated as one.
pub fn paginate<T: Clone + Default>(
    rows: &[Vec<T>],
    column_count: usize,
    row_limit: usize,
) -> Vec<TableSegment<T>> {
    let row_limit = row_limit.max(1);
    if rows.is_empty() {
        return vec![TableSegment { rows: Vec::new() }];
    }

    rows.chunks(row_limit)
        .map(|chunk| TableSegment {
            rows: chunk
                .iter()
                .map(|row| normalize_row(row, column_count))
                .collect(),
        })
        .collect()
}

/// Pad or truncate `row` to exactly `column_count` cells.
pub fn normalize_row<T: Clone + Default>(row: &[T], column_count: usize) -> Vec<T> {
    let mut out: Vec<T> = row.iter().take(column_count).cloned().collect();
    out.resize(column_count, T::default());
    out
}

/// Rebuild a row-major grid from a flat list of cell ids.
///
/// Only complete rows are produced (`cells.len() / column_count`), whatever
/// `row_count` claims. Empty ids become `None` gaps.
pub fn reassemble(cells: &[BlockId], row_count: usize, column_count: usize) -> Vec<Vec<Option<&str>>> {
    if column_count == 0 {
        return Vec::new();
    }

    let complete_rows = cells.len() / column_count;
    if complete_rows != row_count || cells.len() % column_count != 0 {
        tracing::debug!(
            declared_rows = row_count,
            columns = column_count,
            cells = cells.len(),
            "table geometry does not match its cell list; rendering complete rows only"
        );
    }

    cells
        .chunks_exact(column_count)
        .map(|row| {
            row.iter()
                .map(|id| if id.is_empty() { None } else { Some(id.as_str()) })
                .collect()
        })
        .collect()
}
