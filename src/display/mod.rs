//! Terminal rendering for CLI output.

pub mod tables;

pub use tables::{TableBuilder, create_properties_table, create_results_table};
