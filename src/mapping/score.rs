//! Table relevance scoring.

use super::schema::CanonicalSchema;
use crate::similarity::similarity;

const TIE_EPSILON: f64 = 1e-9;

/// Mean, over canonical columns, of the best similarity against any header.
pub fn table_score(headers: &[String], schema: &CanonicalSchema) -> f64 {
    let headers: Vec<&str> = headers
        .iter()
        .map(|h| h.as_str())
        .filter(|h| !h.trim().is_empty())
        .collect();
    if headers.is_empty() || schema.is_empty() {
        return 0.0;
    }

    let total: f64 = schema
        .iter()
        .map(|column| {
            headers
                .iter()
                .map(|header| similarity(header, column))
                .fold(0.0, f64::max)
        })
        .sum();
    total / schema.len() as f64
}

/// Indices of the tables tied at the maximum score, if it reaches `min_score`.
///
/// Tables without a score (no header row) never qualify.
pub fn select_tables(scores: &[Option<f64>], min_score: f64) -> Vec<usize> {
    let Some(max) = scores.iter().flatten().copied().reduce(f64::max) else {
        return Vec::new();
    };
    if max < min_score {
        return Vec::new();
    }
    scores
        .iter()
        .enumerate()
        .filter_map(|(idx, score)| match score {
            Some(score) if (max - score).abs() < TIE_EPSILON => Some(idx),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_table_score_full_match() {
        let schema = CanonicalSchema::new(["Name", "Value"]).unwrap();
        let score = table_score(&headers(&["value", "NAME", "extra"]), &schema);
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_table_score_empty_headers() {
        let schema = CanonicalSchema::default();
        assert_eq!(table_score(&headers(&["", " "]), &schema), 0.0);
    }

    #[test]
    fn test_composition_table_beats_unrelated() {
        let schema = CanonicalSchema::default();
        let composition = table_score(
            &headers(&["Chemical Name", "CAS #", "Concentration (%)", "Function"]),
            &schema,
        );
        let revision = table_score(&headers(&["Version", "Date", "Author"]), &schema);
        assert!(composition > revision);
    }

    #[test]
    fn test_select_tables_ties() {
        assert_eq!(select_tables(&[Some(0.7), Some(0.9), None, Some(0.9)], 0.6), vec![1, 3]);
    }

    #[test]
    fn test_select_tables_below_minimum() {
        assert!(select_tables(&[Some(0.5), Some(0.55)], 0.6).is_empty());
        assert!(select_tables(&[None, None], 0.6).is_empty());
        assert!(select_tables(&[], 0.6).is_empty());
    }
}
