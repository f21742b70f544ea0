//! Index storage and similarity search.
//!
//! # Architecture
//! An [`IndexStore`] is decoded once from an [`IndexSource`] (a memory-mapped
//! file or an in-memory buffer) into a contiguous row-major buffer. The
//! [`SimilaritySearchEngine`] owns the store and answers exact top-k queries
//! with a bounded heap. Nothing is mutated after load.

mod distance;
mod engine;
mod result;
mod storage;
mod types;

// Re-export core types for public API
pub use distance::{cosine_similarity, distance, squared_l2};
pub use engine::{
    CANCELLATION_CHECK_INTERVAL, MetadataFilter, SearchRequest, SimilaritySearchEngine,
};
pub use result::{NearestNeighbor, SearchResult};
pub use storage::{
    FORMAT_VERSION, HEADER_SIZE, IndexBytes, IndexRecord, IndexSource, IndexStore, MAGIC_BYTES,
};
#[cfg(test)]
pub(crate) use storage::encode_raw;
pub use types::{DistanceMetric, Embedding, VectorDimension};
