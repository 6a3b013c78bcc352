//! Corpus records and CSV ingestion.
//!
//! A corpus is an ordered list of [`Record`]s. Each record remembers its
//! row position, the text that gets embedded, and every column of its
//! source row so a match can be returned whole.

use crate::error::{SearchError, SearchResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// One source entry. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Position in the original ordered sequence
    pub position: usize,

    /// Text used for embedding
    pub text: String,

    /// All columns of the source row, including the text column
    pub fields: BTreeMap<String, String>,
}

impl Record {
    /// A record with only a text field, stored under `text`.
    pub fn new(position: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut fields = BTreeMap::new();
        fields.insert("text".to_string(), text.clone());
        Self {
            position,
            text,
            fields,
        }
    }

    /// Add or replace a named field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Build records from plain texts, numbering them in order.
pub fn records_from_texts<I, S>(texts: I) -> Vec<Record>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    texts
        .into_iter()
        .enumerate()
        .map(|(position, text)| Record::new(position, text))
        .collect()
}

/// Load a CSV corpus, embedding the column named `text_column`.
pub fn load_csv(path: impl AsRef<Path>, text_column: &str) -> SearchResult<Vec<Record>> {
    let path = path.as_ref();
    let load_error = |reason: String| SearchError::CorpusLoad {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path).map_err(|e| load_error(e.to_string()))?;
    let records = parse_csv(file, text_column).map_err(load_error)?;

    tracing::info!(
        "Loaded {} records from {} (text column '{text_column}')",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parse CSV from any reader.
///
/// The first row is the header. Returns a plain reason string on failure;
/// [`load_csv`] attaches the path.
pub fn parse_csv(mut reader: impl Read, text_column: &str) -> Result<Vec<Record>, String> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(|e| format!("cannot read input: {e}"))?;
    let input = input.strip_prefix('\u{feff}').unwrap_or(&input);

    let mut rows = split_rows(input)?.into_iter();
    let Some(header) = rows.next() else {
        return Err("missing header row".to_string());
    };
    let text_index = header
        .iter()
        .position(|name| name == text_column)
        .ok_or_else(|| format!("header has no column named '{text_column}'"))?;

    let mut records = Vec::new();
    for (row_index, row) in rows.enumerate() {
        // 1-based data row number, header excluded
        let row_number = row_index + 1;
        if row.len() != header.len() {
            return Err(format!(
                "row {row_number} has {} fields, header has {}",
                row.len(),
                header.len()
            ));
        }
        let text = row[text_index].trim();
        if text.is_empty() {
            return Err(format!("row {row_number} has an empty '{text_column}' field"));
        }

        let position = records.len();
        let text = text.to_string();
        let fields = header.iter().cloned().zip(row).collect();
        records.push(Record {
            position,
            text,
            fields,
        });
    }

    Ok(records)
}

/// Split CSV text into rows of fields.
///
/// Handles quoted fields with doubled quotes, separators and line breaks
/// inside quotes, and CRLF line endings. Blank lines are skipped.
fn split_rows(input: &str) -> Result<Vec<Vec<String>>, String> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // A quoted empty field is a real row, not a blank line
    let mut row_quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => {
                in_quotes = true;
                row_quoted = true;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                row.push(std::mem::take(&mut field));
                let blank_line = row.len() == 1 && row[0].is_empty() && !row_quoted;
                if blank_line {
                    row.clear();
                } else {
                    rows.push(std::mem::take(&mut row));
                }
                row_quoted = false;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(format!("unterminated quoted field in row {}", rows.len()));
    }
    if !field.is_empty() || !row.is_empty() || row_quoted {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let csv = "id,text\nA,cat\nB,dog\n";
        let records = parse_csv(csv.as_bytes(), "text").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].position, 0);
        assert_eq!(records[0].text, "cat");
        assert_eq!(records[0].field("id"), Some("A"));
        assert_eq!(records[1].position, 1);
        assert_eq!(records[1].field("text"), Some("dog"));
    }

    #[test]
    fn test_parse_quoted_fields() {
        let csv = "Item,Description\r\n\"Wallet, black\",\"Leather wallet with \"\"ID\"\" card\"\r\nUmbrella,\"Blue\nfolding umbrella\"\r\n";
        let records = parse_csv(csv.as_bytes(), "Description").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].field("Item"), Some("Wallet, black"));
        assert_eq!(records[0].text, "Leather wallet with \"ID\" card");
        assert_eq!(records[1].text, "Blue\nfolding umbrella");
    }

    #[test]
    fn test_no_trailing_newline_and_blank_lines() {
        let csv = "text\n\nfirst\n\nsecond";
        let records = parse_csv(csv.as_bytes(), "text").unwrap();
        let texts: Vec<_> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(records[1].position, 1);
    }

    #[test]
    fn test_header_only_is_empty_corpus() {
        let records = parse_csv("id,text\n".as_bytes(), "text").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_text_column() {
        let err = parse_csv("id,body\n1,x\n".as_bytes(), "text").unwrap_err();
        assert!(err.contains("'text'"));
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let err = parse_csv("id,text\n1,a,extra\n".as_bytes(), "text").unwrap_err();
        assert!(err.contains("row 1"));
    }

    #[test]
    fn test_blank_text_is_rejected() {
        let err = parse_csv("id,text\n1,ok\n2,   \n".as_bytes(), "text").unwrap_err();
        assert!(err.contains("row 2"));
    }

    #[test]
    fn test_quoted_empty_field_is_a_row() {
        let err = parse_csv("text\ncat\n\"\"\ndog\n".as_bytes(), "text").unwrap_err();
        assert!(err.contains("row 2"), "unexpected error: {err}");

        // Same at end of input without a trailing newline
        let err = parse_csv("text\ncat\n\"\"".as_bytes(), "text").unwrap_err();
        assert!(err.contains("row 2"), "unexpected error: {err}");
    }

    #[test]
    fn test_unterminated_quote() {
        assert!(parse_csv("text\n\"open\n".as_bytes(), "text").is_err());
    }

    #[test]
    fn test_records_from_texts() {
        let records = records_from_texts(["cat", "dog"]);
        assert_eq!(records[1], Record::new(1, "dog"));
    }
}
