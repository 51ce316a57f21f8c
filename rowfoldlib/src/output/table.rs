//! Table-ready data structures for merged results.
//!
//! This module provides `ResultTable`, a presentation-ready structure that
//! renderers consume directly or serialize to JSON. It also owns the
//! interactive sort behavior of a rendered table:
//!
//! - clicking a column for the first time stably sorts the rows by that
//!   column's text, case-insensitively, ascending;
//! - clicking the same column again reverses the current order, which for a
//!   stable sort is the stable descending order;
//! - clicking another column forgets the previous state and sorts afresh.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::data::ResultSet;
use crate::error::RowfoldError;
use crate::query::{Field, MergedRecord, MergedResultSet, OrderDirection};
use crate::sort::{compare_text_case_insensitive, merge_sort_by};
use crate::Result;

/// Formatter for a computed column; receives the whole row.
pub type Formatter = Arc<dyn Fn(&MergedRecord) -> Cell + Send + Sync>;

/// One displayed column.
#[derive(Clone)]
pub enum ColumnSpec {
    /// A field shown under its own name
    Field(String),
    /// A field shown under a different header
    Labeled { label: String, field: String },
    /// A value computed from the whole row
    Computed { label: String, formatter: Formatter },
}

impl ColumnSpec {
    pub fn field(name: impl Into<String>) -> Self {
        ColumnSpec::Field(name.into())
    }

    pub fn labeled(label: impl Into<String>, field: impl Into<String>) -> Self {
        ColumnSpec::Labeled {
            label: label.into(),
            field: field.into(),
        }
    }

    pub fn computed<F>(label: impl Into<String>, formatter: F) -> Self
    where
        F: Fn(&MergedRecord) -> Cell + Send + Sync + 'static,
    {
        ColumnSpec::Computed {
            label: label.into(),
            formatter: Arc::new(formatter),
        }
    }

    /// Header text
    pub fn label(&self) -> &str {
        match self {
            ColumnSpec::Field(name) => name,
            ColumnSpec::Labeled { label, .. } | ColumnSpec::Computed { label, .. } => label,
        }
    }

    fn cell(&self, record: &MergedRecord) -> Cell {
        match self {
            ColumnSpec::Field(field) | ColumnSpec::Labeled { field, .. } => {
                Cell::from_field(record.get(field))
            }
            ColumnSpec::Computed { formatter, .. } => formatter(record),
        }
    }
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSpec::Field(name) => f.debug_tuple("Field").field(name).finish(),
            ColumnSpec::Labeled { label, field } => f
                .debug_struct("Labeled")
                .field("label", label)
                .field("field", field)
                .finish(),
            ColumnSpec::Computed { label, .. } => f
                .debug_struct("Computed")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}

impl FromStr for ColumnSpec {
    type Err = String;

    /// `Label=field` or just `field`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((label, field)) => {
                let (label, field) = (label.trim(), field.trim());
                if label.is_empty() || field.is_empty() {
                    return Err(format!("Invalid column spec: {}", s));
                }
                Ok(ColumnSpec::labeled(label, field))
            }
            None if s.trim().is_empty() => Err("Empty column spec".to_string()),
            None => Ok(ColumnSpec::field(s.trim())),
        }
    }
}

/// Display content of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    /// Multi-valued field, rendered as a list
    List(Vec<String>),
}

impl Cell {
    fn from_field(field: Option<&Field>) -> Self {
        match field {
            None => Cell::Text(String::new()),
            Some(Field::Single(item)) => Cell::Text(item.to_string()),
            Some(Field::List(items)) => {
                Cell::List(items.iter().map(|item| item.to_string()).collect())
            }
        }
    }

    /// Text used for sorting: list entries run together, as in the rendered cell.
    ///
    /// Entries are joined without a separator, so `["ab", "c"]` and
    /// `["a", "bc"]` sort as equal and keep their relative order.
    pub fn sort_text(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::List(items) => items.concat(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::Text(text.to_string())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::Text(text)
    }
}

/// A single row of cells, one per header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<Cell>,
}

/// Column the rows are currently ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: usize,
    pub direction: OrderDirection,
}

/// Table-ready result data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultTable {
    /// Column headers
    pub headers: Vec<String>,
    /// Data rows, in display order
    pub rows: Vec<TableRow>,
    /// Current sort, if any column has been clicked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortState>,
}

impl ResultTable {
    /// Create a table from merged records.
    ///
    /// An empty `columns` list shows every column of `merged` under its own
    /// name.
    pub fn from_merged(merged: &MergedResultSet, columns: &[ColumnSpec]) -> Self {
        let defaults: Vec<ColumnSpec>;
        let columns: &[ColumnSpec] = if columns.is_empty() {
            defaults = merged
                .columns
                .iter()
                .map(|name| ColumnSpec::field(name.as_str()))
                .collect();
            &defaults
        } else {
            columns
        };

        let headers = columns.iter().map(|c| c.label().to_string()).collect();
        let rows = merged
            .records
            .iter()
            .map(|record| TableRow {
                cells: columns.iter().map(|c| c.cell(record)).collect(),
            })
            .collect();

        ResultTable {
            headers,
            rows,
            sort: None,
        }
    }

    /// Create a table from unmerged rows.
    pub fn from_result_set(result_set: &ResultSet, columns: &[ColumnSpec]) -> Self {
        Self::from_merged(&MergedResultSet::from(result_set), columns)
    }

    pub fn sort_state(&self) -> Option<SortState> {
        self.sort
    }

    /// Index of the column with header `label`
    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }

    /// Handle a click on the header of `column`; returns the new direction.
    pub fn click(&mut self, column: usize) -> Result<OrderDirection> {
        if column >= self.headers.len() {
            return Err(RowfoldError::ColumnOutOfRange {
                index: column,
                len: self.headers.len(),
            });
        }

        let state = match self.sort {
            Some(current) if current.column == column => {
                self.rows.reverse();
                SortState {
                    column,
                    direction: current.direction.reversed(),
                }
            }
            _ => {
                self.rows = merge_sort_by(&self.rows, |a, b| {
                    compare_text_case_insensitive(&sort_key(a, column), &sort_key(b, column))
                });
                SortState {
                    column,
                    direction: OrderDirection::Ascending,
                }
            }
        };

        tracing::debug!(column, direction = ?state.direction, "sorted table");
        self.sort = Some(state);
        Ok(state.direction)
    }

    /// Handle a click on the header labeled `label`.
    pub fn click_header(&mut self, label: &str) -> Result<OrderDirection> {
        let column = self
            .column_index(label)
            .ok_or_else(|| RowfoldError::UnknownColumn(label.to_string()))?;
        self.click(column)
    }
}

fn sort_key(row: &TableRow, column: usize) -> String {
    row.cells
        .get(column)
        .map(Cell::sort_text)
        .unwrap_or_default()
}
