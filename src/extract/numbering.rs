//! List numbering reconstruction.
//!
//! Word stores only the list id and indent level on each paragraph; the
//! visible numbers are derived by counting in document order.

use std::collections::HashMap;

use crate::model::NumberingRef;

/// Number of indent levels Word supports per list.
pub const MAX_LEVELS: usize = 9;

/// Rendered numbering of one list paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListNumber {
    /// Dot-joined counters, e.g. `2.1`
    pub text: String,
    /// Indent level, 0-based
    pub level: u8,
}

/// Per-list counters for one document walk.
#[derive(Debug, Clone, Default)]
pub struct NumberingState {
    counters: HashMap<String, [u32; MAX_LEVELS]>,
}

impl NumberingState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counters for a list paragraph and render its number.
    ///
    /// Returns `None` when the paragraph has no explicit level or uses the
    /// reserved list id `0`.
    pub fn next(&mut self, num_id: &str, level: Option<u8>) -> Option<ListNumber> {
        let level = level?;
        if num_id.is_empty() || num_id == "0" {
            return None;
        }
        let idx = (level as usize).min(MAX_LEVELS - 1);

        let counters = self
            .counters
            .entry(num_id.to_string())
            .or_insert([0; MAX_LEVELS]);
        counters[idx] += 1;
        for deeper in counters.iter_mut().skip(idx + 1) {
            *deeper = 0;
        }

        let text = counters[..=idx]
            .iter()
            .filter(|c| **c != 0)
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".");

        Some(ListNumber {
            text,
            level: idx as u8,
        })
    }

    /// Advance for a paragraph's numbering reference, if any.
    pub fn next_for(&mut self, numbering: Option<&NumberingRef>) -> Option<ListNumber> {
        let numbering = numbering?;
        self.next(&numbering.num_id, numbering.level)
    }

    /// Number of lists seen so far.
    pub fn list_count(&self) -> usize {
        self.counters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(state: &mut NumberingState, id: &str, levels: &[u8]) -> Vec<String> {
        levels
            .iter()
            .map(|l| state.next(id, Some(*l)).unwrap().text)
            .collect()
    }

    #[test]
    fn test_hierarchical_sequence() {
        let mut state = NumberingState::new();
        assert_eq!(
            texts(&mut state, "1", &[0, 0, 1, 1, 0]),
            vec!["1", "2", "2.1", "2.2", "3"]
        );
    }

    #[test]
    fn test_deeper_levels_reset() {
        let mut state = NumberingState::new();
        assert_eq!(
            texts(&mut state, "1", &[0, 1, 2, 1, 2]),
            vec!["1", "1.1", "1.1.1", "1.2", "1.2.1"]
        );
    }

    #[test]
    fn test_lists_are_independent() {
        let mut state = NumberingState::new();
        assert_eq!(state.next("1", Some(0)).unwrap().text, "1");
        assert_eq!(state.next("2", Some(0)).unwrap().text, "1");
        assert_eq!(state.next("1", Some(0)).unwrap().text, "2");
        assert_eq!(state.list_count(), 2);
    }

    #[test]
    fn test_skipped_level_omits_zero_counters() {
        let mut state = NumberingState::new();
        let n = state.next("7", Some(2)).unwrap();
        assert_eq!(n.text, "1");
        assert_eq!(n.level, 2);
    }

    #[test]
    fn test_missing_level_has_no_numbering() {
        let mut state = NumberingState::new();
        assert!(state.next("1", None).is_none());
        assert!(state.next("0", Some(0)).is_none());
        assert_eq!(state.list_count(), 0);
    }

    #[test]
    fn test_level_clamped() {
        let mut state = NumberingState::new();
        let n = state.next("1", Some(12)).unwrap();
        assert_eq!(n.level, 8);
    }
}
