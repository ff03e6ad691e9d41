//! Header reconciliation.
//!
//! Every distinct header is resolved once: skipped if the store already
//! knows it, mapped by analogy with a previously mapped header, auto-assigned
//! to a close canonical column, or handed to a [`HeaderResolver`].
//! Operator decisions form a log so the most recent one can be undone.

use log::debug;
use serde::Serialize;

use super::schema::CanonicalSchema;
use super::store::MappingStore;
use super::MappingOptions;
use crate::error::Result;
use crate::similarity::{rank, similarity};

/// A ranked canonical column offered to the resolver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    /// Canonical column name
    pub column: String,
    /// Similarity to the header
    pub score: f64,
}

/// What the resolver is asked to decide.
#[derive(Debug, Clone)]
pub struct Prompt<'a> {
    /// Header being resolved
    pub header: &'a str,
    /// Candidates, best first
    pub candidates: &'a [Candidate],
    /// 1-based position of the header in this pass
    pub position: usize,
    /// Number of distinct headers in this pass
    pub total: usize,
    /// Whether a previous manual decision can be undone
    pub can_undo: bool,
}

/// A resolver's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Take the best candidate
    AcceptTop,
    /// Take candidate `n` (1-based); `0` leaves the header unmapped
    Pick(usize),
    /// Record the header as explicitly unmapped
    LeaveUnmapped,
    /// Revert the most recent manual decision
    Undo,
}

/// Why a decision was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverFeedback {
    /// Pick index outside `0..=max`
    InvalidChoice {
        /// Rejected index
        choice: usize,
        /// Highest valid index
        max: usize,
    },
    /// Undo requested with no manual decision on record
    NothingToUndo,
    /// A manual decision was reverted; the header will be asked again
    Undone {
        /// Header whose mapping was removed
        header: String,
    },
}

impl std::fmt::Display for ResolverFeedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverFeedback::InvalidChoice { choice, max } => {
                write!(f, "Invalid choice {}: enter a number from 0 to {}", choice, max)
            }
            ResolverFeedback::NothingToUndo => write!(f, "Nothing to undo"),
            ResolverFeedback::Undone { header } => write!(f, "Undid mapping for '{}'", header),
        }
    }
}

/// Strategy that decides headers the engine cannot map on its own.
pub trait HeaderResolver {
    /// Decide one header.
    fn resolve(&mut self, prompt: &Prompt<'_>) -> Result<Decision>;

    /// Notification about a rejected or reverted decision.
    fn feedback(&mut self, _feedback: &ResolverFeedback) {}
}

/// Headless resolver: records every unresolved header as unmapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveUnmapped;

impl HeaderResolver for LeaveUnmapped {
    fn resolve(&mut self, _prompt: &Prompt<'_>) -> Result<Decision> {
        Ok(Decision::LeaveUnmapped)
    }
}

/// Headless resolver: accepts the best candidate for every header.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptTopSuggestion;

impl HeaderResolver for AcceptTopSuggestion {
    fn resolve(&mut self, _prompt: &Prompt<'_>) -> Result<Decision> {
        Ok(Decision::AcceptTop)
    }
}

/// How a header got its mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignmentSource {
    /// Copied from a similar, previously mapped header
    Reused {
        /// The header the target was copied from
        from: String,
    },
    /// Best canonical column above the auto-assign threshold
    Auto,
    /// Decided by the resolver
    Manual,
}

/// One mapping made during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    /// Raw header
    pub header: String,
    /// Canonical column, empty when left unmapped
    pub target: String,
    /// How it was decided
    pub source: AssignmentSource,
}

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileReport {
    /// Headers already in the store
    pub skipped: usize,
    /// Mappings made, in order; undone ones are removed
    pub assignments: Vec<Assignment>,
    /// Number of resolver prompts
    pub prompts: usize,
    /// Number of undone decisions
    pub undone: usize,
}

impl ReconcileReport {
    /// Merge another pass into this one.
    pub fn merge(&mut self, other: ReconcileReport) {
        self.skipped += other.skipped;
        self.assignments.extend(other.assignments);
        self.prompts += other.prompts;
        self.undone += other.undone;
    }

    /// Number of assignments from a given source kind.
    pub fn count(&self, matches: impl Fn(&AssignmentSource) -> bool) -> usize {
        self.assignments.iter().filter(|a| matches(&a.source)).count()
    }
}

/// Reconciles discovered headers against the canonical schema.
#[derive(Debug, Clone)]
pub struct Reconciler<'a> {
    schema: &'a CanonicalSchema,
    options: &'a MappingOptions,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler.
    pub fn new(schema: &'a CanonicalSchema, options: &'a MappingOptions) -> Self {
        Self { schema, options }
    }

    /// Canonical columns ranked for a header, truncated to `max_candidates`.
    pub fn candidates(&self, header: &str) -> Vec<Candidate> {
        let limit = match self.options.max_candidates {
            0 => self.schema.len(),
            n => n,
        };
        rank(header, self.schema.iter())
            .into_iter()
            .take(limit)
            .map(|s| Candidate {
                column: s.label.to_string(),
                score: s.score,
            })
            .collect()
    }

    /// Resolve every distinct non-empty header, persisting each change.
    pub fn reconcile<R>(
        &self,
        headers: &[String],
        store: &mut MappingStore,
        resolver: &mut R,
    ) -> Result<ReconcileReport>
    where
        R: HeaderResolver + ?Sized,
    {
        let headers = distinct_headers(headers);
        let mut report = ReconcileReport::default();
        let mut undo_log: Vec<usize> = Vec::new();
        let threshold = self.options.auto_assign_threshold;

        let mut i = 0;
        'headers: while i < headers.len() {
            let header = headers[i].as_str();

            if store.contains(header) {
                report.skipped += 1;
                i += 1;
                continue;
            }

            if let Some((from, target)) = self.reusable_mapping(header, store) {
                debug!("Reusing mapping of '{}' for '{}'", from, header);
                store.assign(header, &target)?;
                report.assignments.push(Assignment {
                    header: header.to_string(),
                    target,
                    source: AssignmentSource::Reused { from },
                });
                i += 1;
                continue;
            }

            let candidates = self.candidates(header);
            if let Some(best) = candidates.first().filter(|c| c.score >= threshold) {
                store.assign(header, &best.column)?;
                report.assignments.push(Assignment {
                    header: header.to_string(),
                    target: best.column.clone(),
                    source: AssignmentSource::Auto,
                });
                i += 1;
                continue;
            }

            loop {
                report.prompts += 1;
                let prompt = Prompt {
                    header,
                    candidates: &candidates,
                    position: i + 1,
                    total: headers.len(),
                    can_undo: !undo_log.is_empty(),
                };
                let target = match resolver.resolve(&prompt)? {
                    Decision::AcceptTop => match candidates.first() {
                        Some(top) => top.column.clone(),
                        None => String::new(),
                    },
                    Decision::LeaveUnmapped | Decision::Pick(0) => String::new(),
                    Decision::Pick(n) => match candidates.get(n - 1) {
                        Some(candidate) => candidate.column.clone(),
                        None => {
                            resolver.feedback(&ResolverFeedback::InvalidChoice {
                                choice: n,
                                max: candidates.len(),
                            });
                            continue;
                        }
                    },
                    Decision::Undo => {
                        let Some(previous) = undo_log.pop() else {
                            resolver.feedback(&ResolverFeedback::NothingToUndo);
                            continue;
                        };
                        let undone = headers[previous].clone();
                        store.remove(&undone)?;
                        if let Some(pos) = report
                            .assignments
                            .iter()
                            .rposition(|a| a.header == undone)
                        {
                            report.assignments.remove(pos);
                        }
                        report.undone += 1;
                        resolver.feedback(&ResolverFeedback::Undone { header: undone });
                        i = previous;
                        continue 'headers;
                    }
                };

                store.assign(header, &target)?;
                report.assignments.push(Assignment {
                    header: header.to_string(),
                    target,
                    source: AssignmentSource::Manual,
                });
                undo_log.push(i);
                break;
            }
            i += 1;
        }

        Ok(report)
    }

    /// Best previously mapped header similar enough to reuse its target.
    fn reusable_mapping(&self, header: &str, store: &MappingStore) -> Option<(String, String)> {
        let mut best: Option<(f64, &str, &str)> = None;
        for (known, target) in store.entries() {
            if target.is_empty() || known == header || !self.schema.contains(target) {
                continue;
            }
            let score = similarity(header, known);
            if score >= self.options.auto_assign_threshold
                && best.map_or(true, |(best_score, _, _)| score > best_score)
            {
                best = Some((score, known, target));
            }
        }
        best.map(|(_, known, target)| (known.to_string(), target.to_string()))
    }
}

/// Distinct non-empty headers in first-seen order.
fn distinct_headers(headers: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for header in headers {
        let header = header.trim();
        if !header.is_empty() && !out.iter().any(|h| h == header) {
            out.push(header.to_string());
        }
    }
    out
}
