//! Payloads printed by CLI commands.
//!
//! Each report serializes as the JSON `data` field and renders as a table in
//! text mode.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::display::{create_properties_table, create_results_table};
use crate::vector::{DistanceMetric, IndexStore, SearchResult};

/// Summary of a loaded index.
#[derive(Debug, Clone, Serialize)]
pub struct IndexInfo {
    pub path: PathBuf,
    pub dimension: usize,
    pub records: usize,
    pub metric: DistanceMetric,
    pub user_info: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl IndexInfo {
    pub fn new(path: PathBuf, store: &IndexStore) -> Self {
        let file_size = std::fs::metadata(&path).ok().map(|m| m.len());
        Self {
            dimension: store.dimension().get(),
            records: store.size(),
            metric: store.metric(),
            user_info: store.user_info().to_string(),
            file_size,
            path,
        }
    }
}

impl fmt::Display for IndexInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rows = vec![
            ("Index", self.path.display().to_string()),
            ("Dimension", self.dimension.to_string()),
            ("Records", self.records.to_string()),
            ("Metric", self.metric.to_string()),
            ("User info", self.user_info.clone()),
        ];
        if let Some(size) = self.file_size {
            rows.push(("File size", format!("{size} bytes")));
        }
        write!(f, "{}", create_properties_table(&rows))
    }
}

/// Outcome of a CLI search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub index: PathBuf,
    pub max_results: usize,
    #[serde(flatten)]
    pub result: SearchResult,
}

impl fmt::Display for SearchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} nearest neighbors in {}",
            self.result.len(),
            self.index.display()
        )?;
        write!(f, "{}", create_results_table(&self.result))
    }
}
