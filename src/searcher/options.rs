//! Searcher configuration and its eager validation.
//!
//! [`SearcherOptions`] is what callers fill in. The only way to obtain a
//! [`ValidatedOptions`] is [`SearcherOptions::validate`], so a searcher can
//! never be built from options that were not checked.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::vector::{IndexBytes, IndexSource, MetadataFilter};

/// Default number of neighbors returned per search.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// A file given either by name or by its content already in memory.
///
/// When both are set, non-empty content wins and the name is only used for
/// diagnostics. Empty content counts as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalFile {
    pub file_name: Option<PathBuf>,
    pub file_content: Option<Vec<u8>>,
}

impl ExternalFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: Some(path.into()),
            file_content: None,
        }
    }

    pub fn from_content(content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            file_content: Some(content.into()),
        }
    }

    /// True when neither a non-empty name nor non-empty content is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let has_name = self
            .file_name
            .as_deref()
            .is_some_and(|p| !p.as_os_str().is_empty());
        let has_content = self.file_content.as_ref().is_some_and(|c| !c.is_empty());
        !has_name && !has_content
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    fn content(&self) -> Option<&Vec<u8>> {
        self.file_content.as_ref().filter(|c| !c.is_empty())
    }
}

impl IndexSource for ExternalFile {
    fn describe(&self) -> String {
        match (self.content(), &self.file_name) {
            (Some(content), _) => content.describe(),
            (None, Some(path)) => path.describe(),
            (None, None) => "<unset>".to_string(),
        }
    }

    fn open(&self) -> Result<IndexBytes<'_>, SearchError> {
        match (self.content(), &self.file_name) {
            (Some(content), _) => content.open(),
            (None, Some(path)) => path.open(),
            (None, None) => Err(SearchError::invalid_index(
                "ExternalFile has neither a file name nor file content",
            )),
        }
    }
}

/// Options shared by every task: where the model lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseOptions {
    pub model_file: ExternalFile,
}

/// Post-processing applied to embeddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingOptions {
    /// Scale query embeddings to unit L2 norm before searching.
    #[serde(default)]
    pub l2_normalize: bool,

    /// Scalar quantization. Not supported by searchers.
    #[serde(default)]
    pub quantize: bool,
}

/// Index and ranking options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    pub index_file: ExternalFile,
    pub max_results: usize,
    /// Only records whose metadata appears here are returned.
    pub metadata_allowlist: Vec<String>,
    /// Records whose metadata appears here are never returned.
    pub metadata_denylist: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            index_file: ExternalFile::default(),
            max_results: DEFAULT_MAX_RESULTS,
            metadata_allowlist: Vec::new(),
            metadata_denylist: Vec::new(),
        }
    }
}

/// Everything needed to build a searcher, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearcherOptions {
    pub base_options: BaseOptions,
    pub embedding_options: EmbeddingOptions,
    pub search_options: SearchOptions,
}

impl SearcherOptions {
    /// Options for a model file and an index file with every other field
    /// at its default.
    pub fn from_files(model_path: impl Into<PathBuf>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            base_options: BaseOptions {
                model_file: ExternalFile::from_path(model_path),
            },
            search_options: SearchOptions {
                index_file: ExternalFile::from_path(index_path),
                ..SearchOptions::default()
            },
            ..Self::default()
        }
    }

    /// Checks the options without touching the filesystem.
    ///
    /// Checks run in a fixed order and the first failure is reported.
    pub fn validate(self) -> Result<ValidatedOptions, SearchError> {
        if self.base_options.model_file.is_empty() {
            return Err(SearchError::invalid_argument(
                "Missing mandatory `model_file` field in `base_options`",
            ));
        }
        if self.search_options.index_file.is_empty() {
            return Err(SearchError::invalid_argument(
                "Missing mandatory `index_file` field in `search_options`",
            ));
        }
        if self.embedding_options.quantize {
            return Err(SearchError::invalid_argument(
                "Setting EmbeddingOptions.quantize = true is not allowed in searchers.",
            ));
        }
        let filter = metadata_filter(
            self.search_options.metadata_allowlist,
            self.search_options.metadata_denylist,
        )?;
        check_max_results(self.search_options.max_results)?;

        Ok(ValidatedOptions {
            model_file: self.base_options.model_file,
            index_file: self.search_options.index_file,
            embedding_options: self.embedding_options,
            max_results: self.search_options.max_results,
            filter,
        })
    }
}

/// Builds the record filter from allow and deny lists.
///
/// The lists are mutually exclusive; empty lists mean no filtering.
pub fn metadata_filter(
    allowlist: Vec<String>,
    denylist: Vec<String>,
) -> Result<MetadataFilter, SearchError> {
    match (allowlist.is_empty(), denylist.is_empty()) {
        (false, false) => Err(SearchError::invalid_argument(
            "`metadata_allowlist` and `metadata_denylist` are mutually exclusive options.",
        )),
        (false, true) => Ok(MetadataFilter::Allow(allowlist.into_iter().collect())),
        (true, false) => Ok(MetadataFilter::Deny(denylist.into_iter().collect())),
        (true, true) => Ok(MetadataFilter::All),
    }
}

/// Rejects a zero result count.
pub fn check_max_results(max_results: usize) -> Result<(), SearchError> {
    if max_results == 0 {
        return Err(SearchError::invalid_argument(
            "Invalid `max_results` option: value must be != 0",
        ));
    }
    Ok(())
}

/// Options that passed [`SearcherOptions::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedOptions {
    model_file: ExternalFile,
    index_file: ExternalFile,
    embedding_options: EmbeddingOptions,
    max_results: usize,
    filter: MetadataFilter,
}

impl ValidatedOptions {
    pub fn model_file(&self) -> &ExternalFile {
        &self.model_file
    }

    pub fn index_file(&self) -> &ExternalFile {
        &self.index_file
    }

    pub fn embedding_options(&self) -> &EmbeddingOptions {
        &self.embedding_options
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn filter(&self) -> &MetadataFilter {
        &self.filter
    }
}

/// Region of interest within an input, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Result<Self, SearchError> {
        let bbox = Self {
            left,
            top,
            width,
            height,
        };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Fails when the box covers no area.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.width == 0 || self.height == 0 {
            return Err(SearchError::invalid_argument(format!(
                "Invalid region of interest: {}x{} box has no area",
                self.width, self.height
            )));
        }
        Ok(())
    }
}
