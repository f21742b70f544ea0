//! Embedding provider seam.
//!
//! Model loading and inference live outside this crate. A searcher only
//! needs something that turns an input into a fixed-length vector and
//! reports how long that vector is.

use crate::error::SearchError;
use crate::searcher::{BoundingBox, EmbeddingOptions, ExternalFile};
use crate::vector::{Embedding, VectorDimension};

/// Turns raw inputs into embeddings.
///
/// A searcher calls `embed` through a shared reference, so a provider that
/// is used from several threads must synchronize its own internal state.
pub trait EmbeddingProvider {
    /// What the provider embeds, e.g. decoded image pixels or text.
    type Input: ?Sized;

    /// Generate the embedding of `input`, restricted to `roi` when given.
    ///
    /// Failures should be reported as [`SearchError::Embedding`]; they are
    /// passed through to the caller unchanged.
    fn embed(
        &self,
        input: &Self::Input,
        roi: Option<&BoundingBox>,
    ) -> Result<Embedding, SearchError>;

    /// Get the dimension of embeddings produced by this provider.
    #[must_use]
    fn dimension(&self) -> VectorDimension;
}

/// Loads a provider from a model file.
///
/// Any `Fn(&ExternalFile, &EmbeddingOptions) -> Result<P, SearchError>`
/// closure is a factory.
pub trait EmbeddingProviderFactory {
    type Provider: EmbeddingProvider;

    fn load(
        &self,
        model: &ExternalFile,
        options: &EmbeddingOptions,
    ) -> Result<Self::Provider, SearchError>;
}

impl<F, P> EmbeddingProviderFactory for F
where
    F: Fn(&ExternalFile, &EmbeddingOptions) -> Result<P, SearchError>,
    P: EmbeddingProvider,
{
    type Provider = P;

    fn load(
        &self,
        model: &ExternalFile,
        options: &EmbeddingOptions,
    ) -> Result<Self::Provider, SearchError> {
        self(model, options)
    }
}

/// Mock embedding provider for testing.
///
/// Inputs are already vectors; the provider returns them unchanged, or a
/// fixed error when built with [`MockEmbeddingProvider::failing`].
#[cfg(test)]
pub struct MockEmbeddingProvider {
    dimension: VectorDimension,
    fail_with: Option<&'static str>,
}

#[cfg(test)]
impl MockEmbeddingProvider {
    /// Create a provider with custom dimension for testing.
    #[must_use]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: VectorDimension::new(dimension).expect("non-zero test dimension"),
            fail_with: None,
        }
    }

    #[must_use]
    pub fn failing(dimension: usize, message: &'static str) -> Self {
        Self {
            fail_with: Some(message),
            ..Self::with_dimension(dimension)
        }
    }
}

#[cfg(test)]
impl EmbeddingProvider for MockEmbeddingProvider {
    type Input = [f32];

    fn embed(&self, input: &[f32], _roi: Option<&BoundingBox>) -> Result<Embedding, SearchError> {
        if let Some(message) = self.fail_with {
            return Err(SearchError::embedding(message));
        }
        Embedding::new(input.to_vec())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}
