//! Output formatting: present merged records as tables.
//!
//! This module handles the last stage of the pipeline - turning merged
//! records into headers and display cells, and reordering rows when a column
//! header is clicked. It provides:
//!
//! - **ResultTable**: headers, rows of cells, current sort state
//! - **ColumnSpec**: which columns to show, under which labels, or computed
//! - **Cell**: plain text or a list of entries
//!
//! ## Example
//!
//! ```rust
//! use rowfoldlib::data::{Record, ResultSet};
//! use rowfoldlib::output::{ColumnSpec, ResultTable};
//!
//! let rs = ResultSet::new(
//!     ["name"],
//!     vec![Record::new().with("name", "bob"), Record::new().with("name", "Ann")],
//! );
//! let mut table = ResultTable::from_result_set(&rs, &[ColumnSpec::labeled("Name", "name")]);
//! table.click(0).unwrap();
//! assert_eq!(table.rows[0].cells[0].to_string(), "Ann");
//! ```

pub mod table;

pub use table::{Cell, ColumnSpec, Formatter, ResultTable, SortState, TableRow};
