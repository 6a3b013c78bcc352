//! Terminal display utilities for the CLI.
//!
//! Provides styled result tables and a spinner for the index build.

pub mod progress;
pub mod tables;

pub use progress::create_spinner;
pub use tables::create_match_table;
