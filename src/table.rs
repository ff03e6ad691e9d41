//! Structural analysis of tables for header mapping.
//!
//! Word tables often start with a caption row and end with footnote or
//! signature rows. The true header row is the row with the most non-empty,
//! pairwise distinct cells; trailing rows that are mostly empty are cut.

use std::collections::HashSet;

use log::debug;

use crate::model::Table;
use crate::normalize::{header_label, normalize_whitespace, Vocabulary};

/// Rectangular cell-text view of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableGrid {
    /// Rows padded to `width`
    pub rows: Vec<Vec<String>>,
    /// Column count, the widest raw row
    pub width: usize,
}

impl TableGrid {
    /// Build the grid with normalized cell text.
    pub fn from_table(table: &Table) -> Self {
        let rows = table
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| normalize_whitespace(&cell.plain_text()))
                    .collect()
            })
            .collect();
        Self::from_rows(rows)
    }

    /// Build a grid from raw rows, padding them to the widest one.
    pub fn from_rows(mut rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, String::new());
        }
        Self { rows, width }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn non_empty_count(row: &[String]) -> usize {
    row.iter().filter(|cell| !cell.trim().is_empty()).count()
}

fn has_distinct_cells(row: &[String]) -> bool {
    let mut seen = HashSet::new();
    row.iter()
        .map(|cell| normalize_whitespace(cell))
        .filter(|cell| !cell.is_empty())
        .all(|cell| seen.insert(cell))
}

/// Index of the true header row.
///
/// Rows with pairwise distinct non-empty cells qualify; the one with the
/// most non-empty cells wins, earlier rows win ties. Rows without any text
/// never qualify.
pub fn find_header_row(grid: &TableGrid) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for (idx, row) in grid.rows.iter().enumerate() {
        let count = non_empty_count(row);
        if count == 0 || !has_distinct_cells(row) {
            continue;
        }
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((idx, count));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Truncate the body at the first run of `window` sparse rows.
///
/// A row is sparse when it has fewer non-empty cells than
/// `threshold_ratio × ncols`.
pub fn trim_table_end(
    mut body: Vec<Vec<String>>,
    ncols: usize,
    window: usize,
    threshold_ratio: f64,
) -> Vec<Vec<String>> {
    if window == 0 || body.len() < window {
        return body;
    }
    let threshold = threshold_ratio * ncols as f64;
    let sparse: Vec<bool> = body
        .iter()
        .map(|row| (non_empty_count(row) as f64) < threshold)
        .collect();

    let cut = sparse
        .windows(window)
        .position(|run| run.iter().all(|s| *s));
    if let Some(cut) = cut {
        debug!("Trimming {} trailing rows", body.len() - cut);
        body.truncate(cut);
    }
    body
}

/// Header row, headers and trimmed body of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStructure {
    /// Index of the header row in the grid
    pub header_index: usize,
    /// Header labels, one per grid column
    pub headers: Vec<String>,
    /// Body rows after the header, trailing noise removed
    pub body: Vec<Vec<String>>,
}

impl TableStructure {
    /// Analyze a grid; `None` when no row qualifies as header.
    pub fn analyze(
        grid: &TableGrid,
        vocab: &Vocabulary,
        window: usize,
        threshold_ratio: f64,
    ) -> Option<Self> {
        let header_index = find_header_row(grid)?;
        let headers = grid.rows[header_index]
            .iter()
            .map(|cell| header_label(cell, vocab))
            .collect();
        let body = grid.rows[header_index + 1..].to_vec();
        let body = trim_table_end(body, grid.width, window, threshold_ratio);
        Some(Self {
            header_index,
            headers,
            body,
        })
    }

    /// Distinct non-empty headers in column order.
    pub fn distinct_headers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.headers
            .iter()
            .filter(|h| !h.is_empty() && seen.insert(h.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> TableGrid {
        TableGrid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn test_grid_pads_rows() {
        let table = Table::from_rows(vec![vec!["a"], vec!["b", "c", "d"]]);
        let g = TableGrid::from_table(&table);
        assert_eq!(g.width, 3);
        assert_eq!(g.rows[0], vec!["a", "", ""]);
    }

    #[test]
    fn test_header_prefers_most_cells() {
        let g = grid(&[
            &["Composition", "", "", "", ""],
            &["A", "B", "C", "", ""],
            &["Name", "CAS", "EC", "Conc", "Function"],
            &["x", "1", "2", "3", "4"],
        ]);
        assert_eq!(find_header_row(&g), Some(2));
    }

    #[test]
    fn test_header_skips_duplicate_rows() {
        let g = grid(&[
            &["Section 3", "Section 3", "Section 3"],
            &["Name", "CAS", ""],
        ]);
        assert_eq!(find_header_row(&g), Some(1));
    }

    #[test]
    fn test_header_first_wins_ties() {
        let g = grid(&[&["a", "b"], &["c", "d"]]);
        assert_eq!(find_header_row(&g), Some(0));
    }

    #[test]
    fn test_no_header_row() {
        assert_eq!(find_header_row(&grid(&[&["", ""], &["x", "x"]])), None);
        assert_eq!(find_header_row(&TableGrid::default()), None);
    }

    #[test]
    fn test_trim_trailing_sparse_rows() {
        let body: Vec<Vec<String>> = [
            ["a", "b", "c", "d"],
            ["e", "f", "g", "h"],
            ["note", "", "", ""],
            ["", "", "", ""],
            ["sig", "", "", ""],
        ]
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();

        let trimmed = trim_table_end(body, 4, 3, 0.5);
        assert_eq!(trimmed.len(), 2);
    }

    #[test]
    fn test_trim_keeps_short_sparse_runs() {
        let body: Vec<Vec<String>> = [
            ["a", "b"],
            ["", ""],
            ["", ""],
            ["c", "d"],
        ]
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();

        assert_eq!(trim_table_end(body, 2, 3, 0.5).len(), 4);
    }

    #[test]
    fn test_analyze() {
        let vocab = Vocabulary::from_labels(["Concentration (%)"]);
        let g = grid(&[
            &["Table 1", "", ""],
            &["Name", "Concen tration", "CAS"],
            &["Water", "50", "7732-18-5"],
            &["Notes", "", ""],
        ]);
        let structure = TableStructure::analyze(&g, &vocab, 3, 0.5).unwrap();
        assert_eq!(structure.header_index, 1);
        assert_eq!(structure.headers, vec!["Name", "Concentration", "CAS"]);
        assert_eq!(structure.body.len(), 2);
        assert_eq!(structure.distinct_headers().len(), 3);
    }
}
