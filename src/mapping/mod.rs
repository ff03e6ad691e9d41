//! Header mapping onto the canonical schema.
//!
//! Tables are analyzed for their true header row, scored against the
//! canonical schema, and the best-scoring ones have their headers reconciled
//! and their bodies re-laid out in canonical column order.

mod engine;
mod schema;
mod score;
mod store;

pub use engine::{
    AcceptTopSuggestion, Assignment, AssignmentSource, Candidate, Decision, HeaderResolver,
    LeaveUnmapped, Prompt, ReconcileReport, Reconciler, ResolverFeedback,
};
pub use schema::{CanonicalSchema, DEFAULT_COLUMNS};
pub use score::{select_tables, table_score};
pub use store::{MappingStore, DEFAULT_STORE_FILE};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::Table;
use crate::table::{TableGrid, TableStructure};

/// Options for header mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Similarity at which a header is mapped without asking
    pub auto_assign_threshold: f64,

    /// Minimum table score for a table to be mapped
    pub mapping_similarity_threshold: f64,

    /// Consecutive sparse rows that end a table body
    pub trim_window: usize,

    /// Fraction of columns a row must fill to not count as sparse
    pub trim_threshold_ratio: f64,

    /// Candidates offered per prompt; 0 offers the whole schema
    pub max_candidates: usize,

    /// Target columns
    pub schema: CanonicalSchema,
}

impl MappingOptions {
    /// Create new mapping options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the auto-assign threshold.
    pub fn with_auto_assign_threshold(mut self, threshold: f64) -> Self {
        self.auto_assign_threshold = threshold;
        self
    }

    /// Set the minimum table score.
    pub fn with_min_table_score(mut self, score: f64) -> Self {
        self.mapping_similarity_threshold = score;
        self
    }

    /// Set the trailing-row trim parameters.
    pub fn with_trim(mut self, window: usize, threshold_ratio: f64) -> Self {
        self.trim_window = window;
        self.trim_threshold_ratio = threshold_ratio;
        self
    }

    /// Set the number of candidates per prompt.
    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max;
        self
    }

    /// Replace the canonical schema.
    pub fn with_schema(mut self, schema: CanonicalSchema) -> Self {
        self.schema = schema;
        self
    }
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            auto_assign_threshold: 0.8,
            mapping_similarity_threshold: 0.6,
            trim_window: 3,
            trim_threshold_ratio: 0.5,
            max_candidates: 0,
            schema: CanonicalSchema::default(),
        }
    }
}

/// A table re-laid out in canonical column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappedTable {
    /// Index of the source table in the document
    pub source_index: usize,
    /// Canonical header row
    pub headers: Vec<String>,
    /// Body rows, one cell per canonical column
    pub rows: Vec<Vec<String>>,
}

impl MappedTable {
    /// Build from an analyzed table and the mapping store.
    ///
    /// Values of several source columns mapped onto the same canonical
    /// column are joined with `\n`; unmapped columns are dropped.
    pub fn build(
        source_index: usize,
        structure: &TableStructure,
        store: &MappingStore,
        schema: &CanonicalSchema,
    ) -> Self {
        let targets: Vec<Option<usize>> = structure
            .headers
            .iter()
            .map(|header| store.get(header).and_then(|target| schema.position(target)))
            .collect();

        let rows = structure
            .body
            .iter()
            .map(|row| {
                let mut out = vec![String::new(); schema.len()];
                for (value, target) in row.iter().zip(&targets) {
                    let (Some(target), false) = (target, value.is_empty()) else {
                        continue;
                    };
                    let cell = &mut out[*target];
                    if !cell.is_empty() {
                        cell.push('\n');
                    }
                    cell.push_str(value);
                }
                out
            })
            .collect();

        Self {
            source_index,
            headers: schema.columns().to_vec(),
            rows,
        }
    }
}

/// Mapping-mode result for one document.
#[derive(Debug, Clone)]
pub struct MappingOutcome {
    /// Cell grids of every table, for the raw sheet
    pub grids: Vec<TableGrid>,
    /// Structure per table; `None` when no header row was found
    pub structures: Vec<Option<TableStructure>>,
    /// Score per table with a header row
    pub scores: Vec<Option<f64>>,
    /// Indices of the selected tables
    pub selected: Vec<usize>,
    /// Canonical tables, one per selected table
    pub mapped: Vec<MappedTable>,
    /// Reconciliation summary
    pub report: ReconcileReport,
}

/// Analyze, score, reconcile and re-lay out the tables of one document.
pub fn map_tables<R>(
    tables: &[&Table],
    options: &MappingOptions,
    store: &mut MappingStore,
    resolver: &mut R,
) -> Result<MappingOutcome>
where
    R: HeaderResolver + ?Sized,
{
    let schema = &options.schema;
    let vocab = schema.vocabulary();

    let grids: Vec<TableGrid> = tables.iter().map(|t| TableGrid::from_table(t)).collect();
    let structures: Vec<Option<TableStructure>> = grids
        .iter()
        .map(|grid| {
            TableStructure::analyze(
                grid,
                &vocab,
                options.trim_window,
                options.trim_threshold_ratio,
            )
        })
        .collect();
    let scores: Vec<Option<f64>> = structures
        .iter()
        .map(|s| s.as_ref().map(|s| table_score(&s.headers, schema)))
        .collect();
    let selected = select_tables(&scores, options.mapping_similarity_threshold);
    debug!(
        "Scored {} tables, selected {:?} (scores {:?})",
        tables.len(),
        selected,
        scores
    );

    let reconciler = Reconciler::new(schema, options);
    let mut report = ReconcileReport::default();
    let mut mapped = Vec::with_capacity(selected.len());
    for &idx in &selected {
        let Some(structure) = &structures[idx] else {
            continue;
        };
        report.merge(reconciler.reconcile(&structure.headers, store, resolver)?);
        mapped.push(MappedTable::build(idx, structure, store, schema));
    }

    Ok(MappingOutcome {
        grids,
        structures,
        scores,
        selected,
        mapped,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composition_table() -> Table {
        Table::from_rows(vec![
            vec!["Composition", "", "", ""],
            vec!["Chemical Name", "CAS #", "Concentration (%)", "Function"],
            vec!["Water", "7732-18-5", "60", "Solvent"],
            vec!["Glycerin", "56-81-5", "40", "Humectant"],
        ])
    }

    #[test]
    fn test_default_options() {
        let options = MappingOptions::default();
        assert_eq!(options.auto_assign_threshold, 0.8);
        assert_eq!(options.mapping_similarity_threshold, 0.6);
        assert_eq!(options.trim_window, 3);
        assert_eq!(options.schema.len(), 10);
    }

    #[test]
    fn test_mapped_table_joins_collisions() {
        let structure = TableStructure {
            header_index: 0,
            headers: vec!["Name".into(), "INCI Name".into(), "Notes".into()],
            body: vec![vec!["Water".into(), "Aqua".into(), "x".into()]],
        };
        let store = MappingStore::with_entries([
            ("Name", "Chemical Name"),
            ("INCI Name", "Chemical Name"),
            ("Notes", ""),
        ]);
        let schema = CanonicalSchema::default();
        let mapped = MappedTable::build(0, &structure, &store, &schema);
        assert_eq!(mapped.headers.len(), 10);
        assert_eq!(mapped.rows[0][0], "Water\nAqua");
        assert!(mapped.rows[0][1..].iter().all(String::is_empty));
    }

    #[test]
    fn test_map_tables_selects_composition() {
        let composition = composition_table();
        let revisions = Table::from_rows(vec![vec!["Version", "Date"], vec!["1", "2024"]]);
        let tables = [&revisions, &composition];
        let options = MappingOptions::default().with_min_table_score(0.0);
        let mut store = MappingStore::in_memory();

        let outcome = map_tables(&tables, &options, &mut store, &mut LeaveUnmapped).unwrap();
        assert_eq!(outcome.selected, vec![1]);
        assert_eq!(outcome.grids.len(), 2);
        assert_eq!(outcome.mapped.len(), 1);

        let mapped = &outcome.mapped[0];
        assert_eq!(mapped.rows.len(), 2);
        assert_eq!(mapped.rows[0][0], "Water");
        assert_eq!(mapped.rows[0][1], "7732-18-5");
        assert_eq!(mapped.rows[0][3], "60");
        assert_eq!(outcome.report.prompts, 0);
    }

    #[test]
    fn test_map_tables_nothing_selected() {
        let revisions = Table::from_rows(vec![vec!["Version", "Date"], vec!["1", "2024"]]);
        let mut store = MappingStore::in_memory();
        let outcome = map_tables(
            &[&revisions],
            &MappingOptions::default(),
            &mut store,
            &mut LeaveUnmapped,
        )
        .unwrap();
        assert!(outcome.selected.is_empty());
        assert!(outcome.mapped.is_empty());
        assert!(store.is_empty());
    }
}
