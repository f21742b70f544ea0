//! Search results handed back to callers.
//!
//! Results are copied out of the index store so they stay valid after the
//! searcher that produced them is dropped.

use serde::{Deserialize, Serialize};

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestNeighbor {
    /// Metadata string stored alongside the matched record.
    pub metadata: String,
    /// Distance from the query under the index metric. Never negative.
    pub distance: f32,
}

/// Ranked matches, closest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub nearest_neighbors: Vec<NearestNeighbor>,
}

impl SearchResult {
    #[must_use]
    pub fn len(&self) -> usize {
        self.nearest_neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nearest_neighbors.is_empty()
    }

    /// The closest match, if any.
    #[must_use]
    pub fn best(&self) -> Option<&NearestNeighbor> {
        self.nearest_neighbors.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NearestNeighbor> {
        self.nearest_neighbors.iter()
    }
}

impl IntoIterator for SearchResult {
    type Item = NearestNeighbor;
    type IntoIter = std::vec::IntoIter<NearestNeighbor>;

    fn into_iter(self) -> Self::IntoIter {
        self.nearest_neighbors.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a NearestNeighbor;
    type IntoIter = std::slice::Iter<'a, NearestNeighbor>;

    fn into_iter(self) -> Self::IntoIter {
        self.nearest_neighbors.iter()
    }
}
