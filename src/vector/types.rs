//! Type-safe wrappers and core types for embedding search.
//!
//! Newtypes here prevent primitive obsession at the engine boundary: a
//! dimension can never be zero and an embedding always knows its own size.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};

/// Type-safe wrapper for vector dimensions.
///
/// Ensures runtime validation of vector dimensions to prevent dimension
/// mismatches between the index, the embedding provider and queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, SearchError> {
        if dim == 0 {
            return Err(SearchError::invalid_argument(
                "Vector dimension cannot be zero",
            ));
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), SearchError> {
        if vector.len() != self.0 {
            return Err(SearchError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A feature vector produced by an embedding provider.
///
/// Immutable once created; use [`Embedding::l2_normalized`] to derive a
/// normalized copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wraps raw values as an embedding.
    ///
    /// Fails on an empty vector, since a zero-dimensional embedding can
    /// never match an index.
    pub fn new(values: Vec<f32>) -> Result<Self, SearchError> {
        VectorDimension::new(values.len())?;
        Ok(Self(values))
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        VectorDimension(self.0.len())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Returns a copy scaled to unit L2 norm.
    ///
    /// A zero vector has no direction and is returned unchanged.
    #[must_use]
    pub fn l2_normalized(&self) -> Self {
        let norm = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm <= f32::EPSILON {
            return self.clone();
        }
        Self(self.0.iter().map(|x| x / norm).collect())
    }
}

impl AsRef<[f32]> for Embedding {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// Distance function an index was built for.
///
/// Recorded in the index header; queries are always ranked with the metric
/// of the index they run against. Lower is closer for every metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Sum of squared component differences.
    #[default]
    SquaredL2,
    /// Euclidean distance.
    L2,
    /// `1 - cosine similarity`, clamped to be non-negative.
    Cosine,
}

impl DistanceMetric {
    /// Identifier stored in the index header.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::SquaredL2 => 0,
            Self::L2 => 1,
            Self::Cosine => 2,
        }
    }

    /// Parses a header identifier.
    #[must_use]
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::SquaredL2),
            1 => Some(Self::L2),
            2 => Some(Self::Cosine),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SquaredL2 => "squared_l2",
            Self::L2 => "l2",
            Self::Cosine => "cosine",
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
