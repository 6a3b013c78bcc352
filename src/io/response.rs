//! JSON bodies for query results and errors.
//!
//! A match is returned as its whole source row, like the rows of the CSV it
//! came from; distances travel in a parallel array in the same order.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::SearchError;
use crate::service::Match;

#[derive(Debug, Serialize)]
pub struct QueryResponse<'a> {
    pub matches: Vec<&'a BTreeMap<String, String>>,
    pub distances: Vec<f32>,
}

impl<'a> QueryResponse<'a> {
    pub fn from_matches(matches: &[Match<'a>]) -> Self {
        Self {
            matches: matches.iter().map(|m| &m.record.fields).collect(),
            distances: matches.iter().map(|m| m.distance.get()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl From<&SearchError> for ErrorResponse {
    fn from(error: &SearchError) -> Self {
        Self {
            error: error.to_string(),
            code: error.status_code(),
        }
    }
}
