//! Searcher facade: validated options, the embedding provider seam, and the
//! [`Searcher`] that ties them to the similarity engine.
//!
//! Control flow for one call: input → provider → optional L2 normalization
//! → engine over the index store → [`SearchResult`](crate::vector::SearchResult).

mod embedding;
mod facade;
mod options;

#[cfg(test)]
pub use embedding::MockEmbeddingProvider;
pub use embedding::{EmbeddingProvider, EmbeddingProviderFactory};
pub use facade::Searcher;
pub use options::{
    BaseOptions, BoundingBox, DEFAULT_MAX_RESULTS, EmbeddingOptions, ExternalFile, SearchOptions,
    SearcherOptions, ValidatedOptions, check_max_results, metadata_filter,
};
