//! Canonical column schema.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::normalize::Vocabulary;

/// Columns of the default chemical-composition schema.
pub const DEFAULT_COLUMNS: [&str; 10] = [
    "Chemical Name",
    "CAS #",
    "EC Number",
    "Concentration (%)",
    "Function",
    "Classification",
    "Hazard Statements",
    "Regulatory Status",
    "Source",
    "Comments",
];

/// Ordered list of canonical column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalSchema {
    columns: Vec<String>,
}

impl CanonicalSchema {
    /// Create a schema, rejecting empty, blank or duplicate columns.
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schema = Self {
            columns: columns.into_iter().map(Into::into).collect(),
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Check the schema invariants.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(Error::Config("canonical schema has no columns".into()));
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.trim().is_empty() {
                return Err(Error::Config("canonical schema has a blank column".into()));
            }
            if !seen.insert(column.as_str()) {
                return Err(Error::Config(format!(
                    "canonical schema lists '{}' twice",
                    column
                )));
            }
        }
        Ok(())
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Iterate over column names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Check whether a column belongs to the schema.
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Position of a column.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Words used to rejoin split header tokens.
    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary::from_labels(&self.columns)
    }
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }
}
