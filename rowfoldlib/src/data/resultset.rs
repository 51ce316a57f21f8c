//! Result sets: the schema and rows returned by the query service.
//!
//! The service answers with a payload of the form
//!
//! ```json
//! { "columns": ["id", "friend"], "results": [["2", "Bob"], ["3", "Sue"]] }
//! ```
//!
//! where each row is either a positional array zipped with `columns` or an
//! object keyed by column name. Both shapes load into the same [`ResultSet`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::value::{Record, Scalar};
use crate::error::RowfoldError;
use crate::Result;

/// Where a result set came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Endpoint the query was sent to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Database name the query ran against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

impl Source {
    pub fn is_empty(&self) -> bool {
        self.url.is_none() && self.database.is_none()
    }
}

/// A fully materialized query result.
///
/// Every row's columns are expected to be a subset of `columns`; rows that
/// lack a column simply have no value for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    #[serde(skip_serializing_if = "Source::is_empty")]
    pub source: Source,
    /// Column names advertised by the query, in order
    pub columns: Vec<String>,
    /// Result rows, in order
    pub results: Vec<Record>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRow {
    Positional(Vec<Scalar>),
    Named(Record),
}

#[derive(Deserialize)]
struct RawResultSet {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    database: Option<String>,
    columns: Vec<String>,
    #[serde(default)]
    results: Vec<RawRow>,
}

impl ResultSet {
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        results: Vec<Record>,
    ) -> Self {
        Self {
            source: Source::default(),
            columns: columns.into_iter().map(Into::into).collect(),
            results,
        }
    }

    /// Builder: attach the source description
    pub fn with_source(mut self, url: Option<String>, database: Option<String>) -> Self {
        self.source = Source { url, database };
        self
    }

    /// True when the query returned no rows
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// A copy holding only the rows for which `predicate` returns true.
    ///
    /// Source and columns are carried over unchanged.
    pub fn filter<F>(&self, predicate: F) -> ResultSet
    where
        F: Fn(&Record) -> bool,
    {
        ResultSet {
            source: self.source.clone(),
            columns: self.columns.clone(),
            results: self
                .results
                .iter()
                .filter(|row| predicate(row))
                .cloned()
                .collect(),
        }
    }

    /// Parse a results payload from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: RawResultSet = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse a results payload from any reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let raw: RawResultSet = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    /// Load a results payload from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| RowfoldError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }

    fn from_raw(raw: RawResultSet) -> Result<Self> {
        let mut results = Vec::with_capacity(raw.results.len());
        for (index, row) in raw.results.into_iter().enumerate() {
            let record = match row {
                RawRow::Named(record) => record,
                RawRow::Positional(cells) => {
                    if cells.len() > raw.columns.len() {
                        return Err(RowfoldError::RowLength {
                            row: index,
                            expected: raw.columns.len(),
                            found: cells.len(),
                        });
                    }
                    raw.columns.iter().cloned().zip(cells).collect()
                }
            };
            results.push(record);
        }

        tracing::debug!(
            columns = raw.columns.len(),
            rows = results.len(),
            "loaded result set"
        );

        Ok(ResultSet {
            source: Source {
                url: raw.url,
                database: raw.database,
            },
            columns: raw.columns,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> ResultSet {
        ResultSet::new(
            ["id", "name"],
            vec![
                Record::new().with("id", "7").with("name", "Bob"),
                Record::new().with("id", "7").with("name", "Sue"),
                Record::new().with("id", "9").with("name", "Fred"),
            ],
        )
        .with_source(Some("https://db.example.org/".into()), Some("people".into()))
    }

    #[test]
    fn test_is_empty() {
        assert!(!sample().is_empty());
        assert!(ResultSet::new(["id"], vec![]).is_empty());
    }

    #[test]
    fn test_filter_keeps_schema_and_source() {
        let rs = sample();
        let filtered = rs.filter(|row| row.get("name").and_then(Scalar::as_str) != Some("Sue"));

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.columns, rs.columns);
        assert_eq!(filtered.source.database.as_deref(), Some("people"));
        // Original untouched
        assert_eq!(rs.len(), 3);
    }

    #[test]
    fn test_load_positional_rows() {
        let rs = ResultSet::from_json_str(
            r#"{"columns": ["id", "friend"], "results": [["2", "Bob"], ["3"]]}"#,
        )
        .unwrap();

        assert_eq!(rs.columns, vec!["id", "friend"]);
        assert_eq!(rs.results[0].get("friend"), Some(&Scalar::from("Bob")));
        // Short rows leave trailing columns absent
        assert!(!rs.results[1].contains("friend"));
        assert!(rs.source.is_empty());
    }

    #[test]
    fn test_load_named_rows_with_source() {
        let rs = ResultSet::from_json_str(
            r#"{
                "url": "https://db.example.org/",
                "database": "people",
                "columns": ["id", "age"],
                "results": [{"id": 1, "age": null}]
            }"#,
        )
        .unwrap();

        assert_eq!(rs.source.url.as_deref(), Some("https://db.example.org/"));
        assert_eq!(rs.results[0].get("id"), Some(&Scalar::from(1)));
        assert!(rs.results[0].get("age").unwrap().is_null());
    }

    #[test]
    fn test_load_rejects_long_rows() {
        let err = ResultSet::from_json_str(r#"{"columns": ["id"], "results": [["1", "2"]]}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            RowfoldError::RowLength {
                row: 0,
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn test_load_rejects_missing_columns() {
        let err = ResultSet::from_json_str(r#"{"results": []}"#).unwrap_err();
        assert!(matches!(err, RowfoldError::Json(_)));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"columns": ["id"], "results": [["1"], ["2"]]}}"#).unwrap();

        let rs = ResultSet::from_path(file.path()).unwrap();
        assert_eq!(rs.len(), 2);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = ResultSet::from_path("/nonexistent/results.json").unwrap_err();
        assert!(matches!(err, RowfoldError::FileRead { .. }));
    }
}
