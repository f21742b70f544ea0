//! Exact nearest-neighbor search over a loaded index.
//!
//! The engine scans every record, so results are exact. Selection keeps a
//! bounded max-heap of the current best `k` candidates, giving O(N log k)
//! work and O(k) extra memory per query.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::vector::{IndexStore, NearestNeighbor, SearchResult, distance};

/// Number of records scanned between two cancellation checks.
pub const CANCELLATION_CHECK_INTERVAL: usize = 1024;

static ALL_RECORDS: MetadataFilter = MetadataFilter::All;

/// Restricts which records may appear in results, by exact metadata match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MetadataFilter {
    /// Every record is eligible.
    #[default]
    All,
    /// Only records whose metadata is in the set.
    Allow(HashSet<String>),
    /// Every record except those whose metadata is in the set.
    Deny(HashSet<String>),
}

impl MetadataFilter {
    #[must_use]
    pub fn accepts(&self, metadata: &str) -> bool {
        match self {
            Self::All => true,
            Self::Allow(allowed) => allowed.contains(metadata),
            Self::Deny(denied) => !denied.contains(metadata),
        }
    }
}

/// Parameters of a single search call.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub max_results: usize,
    pub filter: &'a MetadataFilter,
    pub cancellation: Option<&'a CancellationToken>,
}

impl SearchRequest<'static> {
    /// Unfiltered, non-cancellable request for `max_results` neighbors.
    #[must_use]
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results,
            filter: &ALL_RECORDS,
            cancellation: None,
        }
    }
}

impl<'a> SearchRequest<'a> {
    #[must_use]
    pub fn with_filter(self, filter: &'a MetadataFilter) -> SearchRequest<'a> {
        SearchRequest { filter, ..self }
    }

    #[must_use]
    pub fn with_cancellation(self, token: &'a CancellationToken) -> SearchRequest<'a> {
        SearchRequest {
            cancellation: Some(token),
            ..self
        }
    }
}

/// Heap entry. Ordered by distance, then by record position, so the heap
/// top is always the worst candidate kept so far.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f32,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Ranks query embeddings against an owned [`IndexStore`].
///
/// Searching borrows the engine immutably, so one engine can serve many
/// threads at once.
#[derive(Debug, Clone)]
pub struct SimilaritySearchEngine {
    store: IndexStore,
}

impl SimilaritySearchEngine {
    pub fn new(store: IndexStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Returns the `k` records closest to `query`, ascending by distance.
    ///
    /// Equal distances keep the original index order. If the index holds
    /// fewer than `k` records, every record is returned.
    pub fn search(&self, query: &[f32], k: usize) -> Result<SearchResult, SearchError> {
        self.search_with(query, &SearchRequest::new(k))
    }

    /// Like [`search`](Self::search), with a metadata filter and optional
    /// cancellation.
    ///
    /// Filtered-out records are skipped before ranking, so up to
    /// `max_results` eligible records are returned.
    pub fn search_with(
        &self,
        query: &[f32],
        request: &SearchRequest<'_>,
    ) -> Result<SearchResult, SearchError> {
        let k = request.max_results;
        if k == 0 {
            return Err(SearchError::invalid_argument(
                "Invalid `max_results` option: value must be != 0",
            ));
        }
        self.store.dimension().validate_vector(query)?;
        if !query.iter().all(|v| v.is_finite()) {
            return Err(SearchError::invalid_argument(
                "Query embedding contains non-finite values",
            ));
        }

        let total = self.store.size();
        if k > total {
            warn!(
                requested = k,
                available = total,
                "max_results exceeds index size, returning all eligible records"
            );
        }

        let started = Instant::now();
        let metric = self.store.metric();
        let mut heap: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k.min(total) + 1);

        for (index, record) in self.store.iter().enumerate() {
            if index % CANCELLATION_CHECK_INTERVAL == 0
                && request.cancellation.is_some_and(|t| t.is_cancelled())
            {
                warn!(scanned = index, total, "Search cancelled");
                return Err(SearchError::Cancelled {
                    scanned: index,
                    total,
                });
            }

            if !request.filter.accepts(record.metadata) {
                continue;
            }

            let candidate = Candidate {
                distance: distance(metric, query, record.embedding),
                index,
            };

            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(mut worst) = heap.peek_mut() {
                if candidate < *worst {
                    *worst = candidate;
                }
            }
        }

        let nearest_neighbors: Vec<NearestNeighbor> = heap
            .into_sorted_vec()
            .into_iter()
            .filter_map(|candidate| {
                self.store
                    .record_at(candidate.index)
                    .map(|record| NearestNeighbor {
                        metadata: record.metadata.to_string(),
                        distance: candidate.distance,
                    })
            })
            .collect();

        debug!(
            k,
            results = nearest_neighbors.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Search completed"
        );

        Ok(SearchResult { nearest_neighbors })
    }
}
