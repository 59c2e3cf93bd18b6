//! Table formatting utilities for structured output.

use comfy_table::{
    Attribute, Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

use crate::bridge::{LoadState, NativeBridge};
use crate::vector::SimilarityResult;

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

/// Scores in row order, one line per embedding.
pub fn create_scores_table(results: &[SimilarityResult]) -> String {
    let mut builder = TableBuilder::new().set_headers(vec!["Index", "Score"]);
    for result in results {
        builder = builder.add_row(vec![result.index.to_string(), format!("{:.6}", result.score)]);
    }
    builder.build()
}

/// Native library status for the `probe` command.
pub fn create_probe_table(bridge: &NativeBridge) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.apply_modifier(UTF8_ROUND_CORNERS);

    table.set_header(vec![
        Cell::new("Property").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    // Querying availability performs the one-time load
    let available = bridge.is_available();
    let state = bridge.state();
    let color = if state == LoadState::Available {
        Color::Green
    } else {
        Color::Yellow
    };
    table.add_row(vec![
        Cell::new("State"),
        Cell::new(state.to_string())
            .fg(color)
            .add_attribute(Attribute::Bold),
    ]);

    if available {
        if let Some(path) = bridge.loaded_path() {
            table.add_row(vec!["Loaded from".to_string(), path.display().to_string()]);
        }
        table.add_row(vec![
            "Native version".to_string(),
            bridge.native_version().unwrap_or_else(|| "unknown".to_string()),
        ]);
        table.add_row(vec![
            "Native SIMD".to_string(),
            bridge.native_has_simd().unwrap_or(false).to_string(),
        ]);
    } else if let Some(reason) = bridge.unavailable_reason() {
        table.add_row(vec!["Reason", reason]);
        table.add_row(vec!["Fallback", "Rust reference implementation"]);
    }

    table.add_row(vec![
        "Candidates".to_string(),
        bridge.candidates().paths().len().to_string(),
    ]);

    table.to_string()
}
