//! Nearest-neighbor search over pre-built embedding indices.
//!
//! A [`Searcher`] validates its options, loads a read-only [`IndexStore`],
//! obtains an [`EmbeddingProvider`] through a factory, and answers queries
//! with the `k` closest records ranked by distance.

pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod searcher;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use error::{ErrorKind, SearchError};
pub use searcher::{
    BaseOptions, BoundingBox, EmbeddingOptions, EmbeddingProvider, EmbeddingProviderFactory,
    ExternalFile, SearchOptions, Searcher, SearcherOptions, ValidatedOptions,
};
pub use vector::{
    DistanceMetric, Embedding, IndexRecord, IndexSource, IndexStore, MetadataFilter,
    NearestNeighbor, SearchRequest, SearchResult, SimilaritySearchEngine, VectorDimension,
};
