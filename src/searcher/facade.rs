//! The searcher: an embedding provider composed with a similarity engine.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::SearchError;
use crate::searcher::{
    BoundingBox, EmbeddingProvider, EmbeddingProviderFactory, SearcherOptions, ValidatedOptions,
};
use crate::vector::{
    IndexStore, SearchRequest, SearchResult, SimilaritySearchEngine, VectorDimension,
};

/// Finds the indexed records closest to an input.
///
/// Built only through [`Searcher::create`], which validates options, loads
/// the index and the provider, and checks that their dimensions agree. A
/// searcher that exists is always ready to search. Searching takes `&self`
/// and never mutates, so a `Searcher` can be shared through an `Arc` when
/// its provider is `Sync`.
pub struct Searcher<P: EmbeddingProvider> {
    provider: P,
    engine: SimilaritySearchEngine,
    options: ValidatedOptions,
}

impl<P: EmbeddingProvider> Searcher<P> {
    /// Validates `options`, then loads the index and the provider.
    ///
    /// Option errors are reported before any file is opened.
    pub fn create<F>(options: SearcherOptions, factory: F) -> Result<Self, SearchError>
    where
        F: EmbeddingProviderFactory<Provider = P>,
    {
        let options = options.validate()?;

        let store = IndexStore::load(options.index_file())?;
        let provider = factory.load(options.model_file(), options.embedding_options())?;

        let expected = store.dimension();
        let actual = provider.dimension();
        if actual != expected {
            return Err(SearchError::DimensionMismatch {
                expected: expected.get(),
                actual: actual.get(),
            });
        }

        info!(
            records = store.size(),
            dimension = expected.get(),
            metric = %store.metric(),
            max_results = options.max_results(),
            l2_normalize = options.embedding_options().l2_normalize,
            "Searcher created"
        );

        Ok(Self {
            provider,
            engine: SimilaritySearchEngine::new(store),
            options,
        })
    }

    /// Builds a searcher with default options from a model and an index path.
    pub fn create_from_files<F>(
        model_path: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        factory: F,
    ) -> Result<Self, SearchError>
    where
        F: EmbeddingProviderFactory<Provider = P>,
    {
        Self::create(SearcherOptions::from_files(model_path, index_path), factory)
    }

    /// Embeds `input` and returns its nearest neighbors.
    pub fn search(&self, input: &P::Input) -> Result<SearchResult, SearchError> {
        self.run(input, None, None)
    }

    /// Like [`search`](Self::search), embedding only the region of interest.
    pub fn search_with_roi(
        &self,
        input: &P::Input,
        roi: BoundingBox,
    ) -> Result<SearchResult, SearchError> {
        roi.validate()?;
        self.run(input, Some(&roi), None)
    }

    /// Like [`search`](Self::search), giving up once `token` is cancelled.
    pub fn search_with_cancellation(
        &self,
        input: &P::Input,
        token: &CancellationToken,
    ) -> Result<SearchResult, SearchError> {
        self.run(input, None, Some(token))
    }

    fn run(
        &self,
        input: &P::Input,
        roi: Option<&BoundingBox>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<SearchResult, SearchError> {
        let mut embedding = self.provider.embed(input, roi)?;
        if self.options.embedding_options().l2_normalize {
            embedding = embedding.l2_normalized();
        }

        let request = SearchRequest {
            max_results: self.options.max_results(),
            filter: self.options.filter(),
            cancellation,
        };
        self.engine.search_with(embedding.as_slice(), &request)
    }

    /// User info string stored in the index, empty if none was set.
    pub fn user_info(&self) -> &str {
        self.engine.store().user_info()
    }

    /// Number of records in the index.
    pub fn index_size(&self) -> usize {
        self.engine.store().size()
    }

    pub fn dimension(&self) -> VectorDimension {
        self.engine.store().dimension()
    }

    pub fn options(&self) -> &ValidatedOptions {
        &self.options
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}
