//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::vector::SearchResult;

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    /// Create a new table builder.
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        // Apply rounded corners
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Set the table headers.
    pub fn set_headers(mut self, headers: Vec<&str>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    /// Add a row to the table.
    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Build and return the formatted table.
    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// Ranked neighbors, one row each.
pub fn create_results_table(result: &SearchResult) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        Cell::new("Rank").add_attribute(Attribute::Bold),
        Cell::new("Metadata").add_attribute(Attribute::Bold),
        Cell::new("Distance").add_attribute(Attribute::Bold),
    ]);

    for (rank, neighbor) in result.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).set_alignment(CellAlignment::Right),
            Cell::new(&neighbor.metadata),
            Cell::new(format!("{:.6}", neighbor.distance)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.to_string()
}

/// Two-column key/value table.
pub fn create_properties_table(rows: &[(&str, String)]) -> String {
    rows.iter()
        .fold(
            TableBuilder::new().set_headers(vec!["Property", "Value"]),
            |builder, (key, value)| builder.add_row(vec![key.to_string(), value.clone()]),
        )
        .build()
}
