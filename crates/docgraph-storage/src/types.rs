//! Option types for find operations.

use indexmap::IndexMap;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Ascending,
    /// Descending.
    Descending,
}

/// Ordered path → direction sort specification.
pub type SortSpec = IndexMap<String, SortOrder>;

/// Field selection applied to returned documents.
#[derive(Debug, Clone, Default)]
pub enum Projection {
    /// Return whole documents.
    #[default]
    All,
    /// Return only the listed top-level paths (`_id` always included).
    Fields(Vec<String>),
}

impl Projection {
    /// Whether this projection selects everything.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

/// Options for `find_many`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Sort specification, applied before skip/limit.
    pub sort: Option<SortSpec>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Field selection.
    pub projection: Projection,
}

impl FindOptions {
    /// Options with only a limit set.
    #[must_use]
    pub fn with_limit(limit: u64) -> Self {
        Self { limit: Some(limit), ..Default::default() }
    }
}
