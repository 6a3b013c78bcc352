//! Input/Output handling for the CLI.
//!
//! This module provides consistent exit codes and the JSON shape of query
//! results shared by the CLI and the HTTP server.

pub mod exit_code;
pub mod response;

pub use exit_code::ExitCode;
pub use response::{ErrorResponse, QueryResponse};
