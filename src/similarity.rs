//! Blended label similarity.
//!
//! Score = max(sequence ratio, token Jaccard) over comparison keys. The
//! sequence ratio is the normalized indel similarity `2·LCS / (|a| + |b|)`,
//! which catches abbreviations and typos; token Jaccard catches reordered
//! words ("Number CAS" vs "CAS Number").

use std::cmp::Ordering;
use std::collections::HashSet;

use rapidfuzz::distance::indel;

use crate::normalize::comparison_key;

/// Similarity between two labels in `[0.0, 1.0]`. Symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ka = comparison_key(a);
    let kb = comparison_key(b);
    key_similarity(&ka, &kb)
}

/// Similarity between two already-normalized comparison keys.
pub fn key_similarity(ka: &str, kb: &str) -> f64 {
    let sequence = indel::normalized_similarity(ka.chars(), kb.chars());
    sequence.max(token_jaccard(ka, kb)).clamp(0.0, 1.0)
}

/// Jaccard index of the whitespace token sets; 0 when both are empty.
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let ta: HashSet<&str> = a.split_whitespace().collect();
    let tb: HashSet<&str> = b.split_whitespace().collect();
    let union = ta.union(&tb).count();
    if union == 0 {
        return 0.0;
    }
    ta.intersection(&tb).count() as f64 / union as f64
}

/// A candidate label with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<'a> {
    /// Candidate label
    pub label: &'a str,
    /// Similarity score
    pub score: f64,
}

/// Rank candidates by descending similarity to `label`; ties keep input order.
pub fn rank<'a, I>(label: &str, candidates: I) -> Vec<Scored<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    let key = comparison_key(label);
    let mut scored: Vec<Scored<'a>> = candidates
        .into_iter()
        .map(|candidate| Scored {
            label: candidate,
            score: key_similarity(&key, &comparison_key(candidate)),
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored
}

/// Best-scoring candidate, first wins ties.
pub fn best_match<'a, I>(label: &str, candidates: I) -> Option<Scored<'a>>
where
    I: IntoIterator<Item = &'a str>,
{
    rank(label, candidates).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_labels() {
        assert!((similarity("CAS Number", "cas number") - 1.0).abs() < 1e-9);
        assert!((similarity("Document Info:", "document info") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [
            ("CAS Number", "CAS #"),
            ("Chemical Name", "Name of chemical"),
            ("", "Function"),
            ("Conc. (%)", "Concentration (%)"),
            ("abc", "cba"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a} / {b}");
        }
    }

    #[test]
    fn test_token_jaccard_reordered() {
        assert!((token_jaccard("number cas", "cas number") - 1.0).abs() < 1e-9);
        assert!((token_jaccard("a b", "b c") - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(token_jaccard("", ""), 0.0);
    }

    #[test]
    fn test_unrelated_labels_score_low() {
        assert!(similarity("Hazard Statements", "Supplier") < 0.5);
    }

    #[test]
    fn test_rank_orders_by_score() {
        let candidates = ["Function", "Chemical Name", "CAS #"];
        let ranked = rank("chemical", candidates);
        assert_eq!(ranked[0].label, "Chemical Name");
        assert!(ranked[0].score >= ranked[1].score);
        assert!(ranked[1].score >= ranked[2].score);
    }

    #[test]
    fn test_best_match_empty() {
        assert!(best_match("x", Vec::<&str>::new()).is_none());
    }
}
