//! Read-only index storage.
//!
//! An index is loaded once, validated completely, and never mutated again,
//! so a loaded [`IndexStore`] can be shared freely between threads.
//!
//! # Storage Format
//!
//! All integers are little-endian.
//! - Header (24 bytes): magic, version, dimension, record count, metric id,
//!   user info length
//! - User info: UTF-8 bytes
//! - Records: metadata length, UTF-8 metadata, record dimension, then
//!   `dimension` f32 values
//!
//! Files are memory-mapped for loading; the mapping is released as soon as
//! the records have been decoded.

use std::fs::File;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tracing::{debug, info};

use crate::error::SearchError;
use crate::vector::{DistanceMetric, VectorDimension};

/// Current storage format version.
pub const FORMAT_VERSION: u32 = 1;

/// Size of the storage header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Magic bytes to identify index files.
pub const MAGIC_BYTES: &[u8; 4] = b"EMBX";

/// Number of bytes per f32 value.
const BYTES_PER_F32: usize = 4;

/// Number of bytes per length prefix (u32).
const BYTES_PER_LEN: usize = 4;

/// Raw index bytes handed out by an [`IndexSource`].
#[derive(Debug)]
pub enum IndexBytes<'a> {
    /// Memory-mapped file contents.
    Mapped(Mmap),
    /// Caller-owned buffer.
    Borrowed(&'a [u8]),
}

impl Deref for IndexBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(mmap) => mmap,
            Self::Borrowed(bytes) => bytes,
        }
    }
}

/// Anything that can provide the bytes of a persisted index.
pub trait IndexSource {
    /// Short human-readable description used in logs.
    fn describe(&self) -> String;

    /// Opens the source and returns its full contents.
    fn open(&self) -> Result<IndexBytes<'_>, SearchError>;
}

impl IndexSource for Path {
    fn describe(&self) -> String {
        self.display().to_string()
    }

    fn open(&self) -> Result<IndexBytes<'_>, SearchError> {
        let unreadable = |source| SearchError::IndexUnreadable {
            path: self.to_path_buf(),
            source,
        };

        let file = File::open(self).map_err(unreadable)?;
        let len = file.metadata().map_err(unreadable)?.len();
        if len == 0 {
            // Mapping an empty file fails on some platforms
            return Ok(IndexBytes::Borrowed(&[]));
        }

        // SAFETY: the mapping is read-only and dropped before load returns.
        let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(unreadable)?;
        Ok(IndexBytes::Mapped(mmap))
    }
}

impl IndexSource for PathBuf {
    fn describe(&self) -> String {
        self.as_path().describe()
    }

    fn open(&self) -> Result<IndexBytes<'_>, SearchError> {
        self.as_path().open()
    }
}

impl IndexSource for [u8] {
    fn describe(&self) -> String {
        format!("<in-memory buffer, {} bytes>", self.len())
    }

    fn open(&self) -> Result<IndexBytes<'_>, SearchError> {
        Ok(IndexBytes::Borrowed(self))
    }
}

impl IndexSource for Vec<u8> {
    fn describe(&self) -> String {
        self.as_slice().describe()
    }

    fn open(&self) -> Result<IndexBytes<'_>, SearchError> {
        Ok(IndexBytes::Borrowed(self))
    }
}

/// A single indexed entry, borrowed from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexRecord<'a> {
    pub metadata: &'a str,
    pub embedding: &'a [f32],
}

/// Immutable, fully validated collection of index records.
///
/// Embeddings are kept in one contiguous row-major buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexStore {
    dimension: VectorDimension,
    metric: DistanceMetric,
    user_info: String,
    vectors: Vec<f32>,
    metadata: Vec<String>,
}

impl IndexStore {
    /// Loads and validates an index from `source`.
    ///
    /// Fails with an invalid-index error if the source is missing, truncated,
    /// empty, has inconsistent dimensionality, or is otherwise malformed.
    pub fn load<S>(source: &S) -> Result<Self, SearchError>
    where
        S: IndexSource + ?Sized,
    {
        let bytes = source.open()?;
        let store = Self::decode(&bytes)?;

        info!(
            source = %source.describe(),
            records = store.size(),
            dimension = store.dimension.get(),
            metric = %store.metric,
            "Loaded index"
        );
        Ok(store)
    }

    /// Builds a store from in-memory records with the same invariants as
    /// [`IndexStore::load`].
    pub fn from_records(
        metric: DistanceMetric,
        user_info: impl Into<String>,
        records: Vec<(String, Vec<f32>)>,
    ) -> Result<Self, SearchError> {
        let first = records
            .first()
            .ok_or_else(|| SearchError::invalid_index("Index contains no records"))?;
        let dimension = VectorDimension::new(first.1.len())
            .map_err(|_| SearchError::invalid_index("Index dimension cannot be zero"))?;

        let mut vectors = Vec::with_capacity(records.len() * dimension.get());
        let mut metadata = Vec::with_capacity(records.len());
        for (i, (label, embedding)) in records.into_iter().enumerate() {
            if embedding.len() != dimension.get() {
                return Err(SearchError::invalid_index(format!(
                    "Record {i} has dimension {}, expected {dimension}",
                    embedding.len()
                )));
            }
            check_finite(&embedding, i)?;
            vectors.extend_from_slice(&embedding);
            metadata.push(label);
        }

        Ok(Self {
            dimension,
            metric,
            user_info: user_info.into(),
            vectors,
            metadata,
        })
    }

    /// Number of records.
    #[must_use]
    pub fn size(&self) -> usize {
        self.metadata.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Free-form string the index builder attached to the index.
    #[must_use]
    pub fn user_info(&self) -> &str {
        &self.user_info
    }

    /// Returns the record at position `i`, in original index order.
    #[must_use]
    pub fn record_at(&self, i: usize) -> Option<IndexRecord<'_>> {
        let metadata = self.metadata.get(i)?;
        let dim = self.dimension.get();
        Some(IndexRecord {
            metadata,
            embedding: &self.vectors[i * dim..(i + 1) * dim],
        })
    }

    /// Iterates records in original index order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = IndexRecord<'_>> + '_ {
        self.metadata
            .iter()
            .zip(self.vectors.chunks_exact(self.dimension.get()))
            .map(|(metadata, embedding)| IndexRecord {
                metadata,
                embedding,
            })
    }

    fn decode(bytes: &[u8]) -> Result<Self, SearchError> {
        let header = read_header(bytes)?;
        let mut reader = Reader::new(bytes, HEADER_SIZE);

        let user_info = reader.read_str(header.user_info_len, "user info")?;

        let dim = header.dimension.get();
        let row_bytes = dim
            .checked_mul(BYTES_PER_F32)
            .ok_or_else(|| SearchError::invalid_index(format!("Dimension {dim} is too large")))?;

        // A corrupt count must not drive a huge allocation
        let min_record = 2 * BYTES_PER_LEN + row_bytes;
        let plausible = reader.remaining() / min_record;
        let capacity = header.record_count.min(plausible);
        let mut vectors = Vec::with_capacity(capacity * dim);
        let mut metadata = Vec::with_capacity(capacity);

        for i in 0..header.record_count {
            let label_len = reader.read_len("record metadata length")?;
            let label = reader.read_str(label_len, "record metadata")?;

            let record_dim = reader.read_len("record dimension")?;
            if record_dim != dim {
                return Err(SearchError::invalid_index(format!(
                    "Record {i} has dimension {record_dim}, expected {dim}"
                )));
            }

            let raw = reader.read_bytes(row_bytes, "record embedding")?;
            let start = vectors.len();
            vectors.extend(raw.chunks_exact(BYTES_PER_F32).map(|chunk| {
                let mut buf = [0u8; BYTES_PER_F32];
                buf.copy_from_slice(chunk);
                f32::from_le_bytes(buf)
            }));
            check_finite(&vectors[start..], i)?;

            metadata.push(label);
        }

        if reader.remaining() != 0 {
            return Err(SearchError::invalid_index(format!(
                "{} unexpected trailing bytes after the last record",
                reader.remaining()
            )));
        }

        debug!(records = metadata.len(), "Decoded index records");

        Ok(Self {
            dimension: header.dimension,
            metric: header.metric,
            user_info,
            vectors,
            metadata,
        })
    }
}

/// Parsed fixed-size header.
#[derive(Debug, Clone, Copy)]
struct Header {
    dimension: VectorDimension,
    record_count: usize,
    metric: DistanceMetric,
    user_info_len: usize,
}

fn read_header(bytes: &[u8]) -> Result<Header, SearchError> {
    if bytes.len() < HEADER_SIZE {
        return Err(SearchError::invalid_index(
            "File too small to contain header",
        ));
    }

    // Check magic bytes
    if &bytes[0..4] != MAGIC_BYTES {
        return Err(SearchError::invalid_index("Invalid magic bytes"));
    }

    let mut reader = Reader::new(bytes, 4);
    let version = reader.read_u32("format version")?;
    if version != FORMAT_VERSION {
        return Err(SearchError::invalid_index(format!(
            "Unsupported format version: expected {FORMAT_VERSION}, got {version}"
        )));
    }

    let dim_value = reader.read_len("dimension")?;
    let dimension = VectorDimension::new(dim_value)
        .map_err(|_| SearchError::invalid_index("Index dimension cannot be zero"))?;

    let record_count = reader.read_len("record count")?;
    if record_count == 0 {
        return Err(SearchError::invalid_index("Index contains no records"));
    }

    let metric_id = reader.read_u32("metric")?;
    let metric = DistanceMetric::from_id(metric_id).ok_or_else(|| {
        SearchError::invalid_index(format!("Unknown distance metric id {metric_id}"))
    })?;

    let user_info_len = reader.read_len("user info length")?;

    Ok(Header {
        dimension,
        record_count,
        metric,
        user_info_len,
    })
}

fn check_finite(values: &[f32], record: usize) -> Result<(), SearchError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(SearchError::invalid_index(format!(
            "Record {record} contains non-finite values"
        )))
    }
}

/// Bounds-checked cursor over the index bytes.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    fn read_bytes(&mut self, len: usize, what: &str) -> Result<&'a [u8], SearchError> {
        if len > self.remaining() {
            return Err(SearchError::invalid_index(format!(
                "Truncated while reading {what} at offset {}: need {len} bytes, {} left",
                self.offset,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read_u32(&mut self, what: &str) -> Result<u32, SearchError> {
        let raw = self.read_bytes(BYTES_PER_LEN, what)?;
        let mut buf = [0u8; BYTES_PER_LEN];
        buf.copy_from_slice(raw);
        Ok(u32::from_le_bytes(buf))
    }

    fn read_len(&mut self, what: &str) -> Result<usize, SearchError> {
        self.read_u32(what).map(|v| v as usize)
    }

    fn read_str(&mut self, len: usize, what: &str) -> Result<String, SearchError> {
        let raw = self.read_bytes(len, what)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| SearchError::invalid_index(format!("{what} is not valid UTF-8")))
    }
}

/// Serializes records in the on-disk layout without any validation, so
/// tests can also produce malformed indices.
#[cfg(test)]
pub(crate) fn encode_raw(
    dim: u32,
    metric: u32,
    user_info: &str,
    records: &[(&str, Vec<f32>)],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC_BYTES);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&dim.to_le_bytes());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&metric.to_le_bytes());
    out.extend_from_slice(&(user_info.len() as u32).to_le_bytes());
    out.extend_from_slice(user_info.as_bytes());
    for (label, vector) in records {
        out.extend_from_slice(&(label.len() as u32).to_le_bytes());
        out.extend_from_slice(label.as_bytes());
        out.extend_from_slice(&(vector.len() as u32).to_le_bytes());
        for v in vector {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}
