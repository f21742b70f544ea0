use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use embedsearch::{
    BoundingBox, Embedding, EmbeddingOptions, EmbeddingProvider, ExternalFile, SearchError,
    VectorDimension,
};
use tempfile::TempDir;

/// Query embedding the fake model returns for `burger.jpg`.
pub const QUERY: [f32; 4] = [0.5, -1.25, 2.0, 0.75];

/// Expected neighbors of [`QUERY`], closest first.
pub const EXPECTED: [(&str, f32); 5] = [
    ("burger", 198.456329),
    ("car", 226.022186),
    ("bird", 227.297668),
    ("dog", 229.133789),
    ("cat", 229.718948),
];

/// Per-record offsets from [`QUERY`], in 1/256 units.
///
/// Each offset is a sum of four squares equal to the expected squared
/// distance times 2^16, so every intermediate value is exact in f32.
const OFFSETS: [(&str, [u32; 4]); 5] = [
    ("cat", [3880, 21, 4, 2]),
    ("dog", [3872, 152, 32, 0]),
    ("burger", [3606, 51, 14, 1]),
    ("bird", [3859, 65, 7, 5]),
    ("car", [3848, 74, 3, 1]),
];

/// The five records of the end-to-end fixture, in file order.
pub fn fixture_records() -> Vec<(&'static str, Vec<f32>)> {
    OFFSETS
        .iter()
        .map(|(label, offset)| {
            let embedding = QUERY
                .iter()
                .zip(offset)
                .map(|(q, o)| q + *o as f32 / 256.0)
                .collect();
            (*label, embedding)
        })
        .collect()
}

/// Serializes records in the index file layout. Performs no validation so
/// malformed indices can be produced too.
pub fn encode_index(
    dimension: u32,
    metric: u32,
    user_info: &str,
    records: &[(&str, Vec<f32>)],
) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"EMBX");
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&dimension.to_le_bytes());
    out.extend_from_slice(&(records.len() as u32).to_le_bytes());
    out.extend_from_slice(&metric.to_le_bytes());
    out.extend_from_slice(&(user_info.len() as u32).to_le_bytes());
    out.extend_from_slice(user_info.as_bytes());
    for (label, embedding) in records {
        out.extend_from_slice(&(label.len() as u32).to_le_bytes());
        out.extend_from_slice(label.as_bytes());
        out.extend_from_slice(&(embedding.len() as u32).to_le_bytes());
        for value in embedding {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    out
}

/// Removes every `ES_`-prefixed variable so settings files are read as
/// written, whatever the surrounding environment sets.
pub fn clear_env_overrides() {
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("ES_") {
            // SAFETY: no test in this binary sets `ES_` variables.
            unsafe { std::env::remove_var(&key) };
        }
    }
}

pub fn fixture_index_bytes() -> Vec<u8> {
    encode_index(4, 0, "food and friends, v1", &fixture_records())
}

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &[u8]) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Writes the end-to-end fixture index and returns its path.
    pub fn add_fixture_index(&self) -> PathBuf {
        self.add_file("searcher_index.ldb", &fixture_index_bytes())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Stand-in for an image embedding model: maps image names to fixed
/// embeddings and remembers the last region of interest it was given.
pub struct FakeImageEmbedder {
    dimension: VectorDimension,
    images: HashMap<String, Vec<f32>>,
    pub last_roi: Mutex<Option<BoundingBox>>,
}

impl FakeImageEmbedder {
    pub fn new() -> Self {
        let mut images = HashMap::new();
        images.insert("burger.jpg".to_string(), QUERY.to_vec());
        // Scaled copy of the query, equal to it after L2 normalization
        images.insert(
            "burger_bright.jpg".to_string(),
            QUERY.iter().map(|v| v * 3.0).collect(),
        );
        images.insert("thumbnail.jpg".to_string(), vec![0.0, 0.0]);
        Self {
            dimension: VectorDimension::new(4).expect("non-zero dimension"),
            images,
            last_roi: Mutex::new(None),
        }
    }
}

impl EmbeddingProvider for FakeImageEmbedder {
    type Input = str;

    fn embed(&self, image: &str, roi: Option<&BoundingBox>) -> Result<Embedding, SearchError> {
        *self.last_roi.lock().expect("roi lock") = roi.copied();
        let values = self
            .images
            .get(image)
            .ok_or_else(|| SearchError::embedding(format!("cannot decode image '{image}'")))?;
        Embedding::new(values.clone())
    }

    fn dimension(&self) -> VectorDimension {
        self.dimension
    }
}

/// Factory that loads [`FakeImageEmbedder`] for any model file.
pub fn fake_model(
    _model: &ExternalFile,
    _options: &EmbeddingOptions,
) -> Result<FakeImageEmbedder, SearchError> {
    Ok(FakeImageEmbedder::new())
}

/// Loads [`FakeImageEmbedder`] only when the model file exists on disk.
pub fn strict_fake_model(
    model: &ExternalFile,
    _options: &EmbeddingOptions,
) -> Result<FakeImageEmbedder, SearchError> {
    match model.path() {
        Some(path) if path.exists() => Ok(FakeImageEmbedder::new()),
        _ => Err(SearchError::embedding("model file not found")),
    }
}
