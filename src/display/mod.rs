//! Terminal display utilities for CLI output.
//!
//! Provides styled tables and a shared color theme.

pub mod tables;
pub mod theme;

pub use tables::{TableBuilder, create_probe_table, create_scores_table};
pub use theme::{ERROR_THEME, OutputStream, THEME, Theme};
