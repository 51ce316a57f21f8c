//! # rowfoldlib
//!
//! Turn the flat rows of a join query back into one record per entity, and
//! keep result tables sortable without losing row order on ties.
//!
//! ## Overview
//!
//! A query such as `SELECT * FROM profile, interests WHERE ...` returns the
//! profile columns once per matching interest. This library folds those rows
//! back together:
//!
//! - **Grouping**: rows sharing a key column value form one group, in order
//!   of first appearance
//! - **Folding**: each group becomes one record; columns that disagree within
//!   the group become ordered lists of their distinct values
//! - **Composite fields**: named objects projected from several columns,
//!   collected per row so related values stay together
//! - **Stable sorting**: merge sort with an injectable comparator, and a
//!   table model whose repeated header clicks simply reverse the order
//!
//! The pipeline is:
//! 1. `data` - a `ResultSet` as delivered by the query service
//! 2. `query` - grouped and folded into a `MergedResultSet`
//! 3. `output` - a `ResultTable` of display cells, sorted on demand
//!
//! ## Example
//!
//! ```rust
//! use rowfoldlib::{serialize_by, CompositeField, Field, ResultSet};
//!
//! let rs = ResultSet::from_json_str(r#"{
//!     "columns": ["id", "friend", "pubtitle", "pubyear"],
//!     "results": [
//!         ["2", "Bob",  "Jump Up",     "2006"],
//!         ["2", "Bob",  "Sit Down",    "2008"],
//!         ["2", "Doug", "Fly Fishing", "2010"],
//!         ["3", "Sue",  "Old Times",   "2009"]
//!     ]
//! }"#).unwrap();
//!
//! let publication = CompositeField::new("publication")
//!     .attribute("title", "pubtitle")
//!     .attribute("year", "pubyear");
//! let merged = serialize_by(&rs, "id", &[publication]);
//!
//! assert_eq!(merged.records.len(), 2);
//! let friends = merged.records[0].get("friend").unwrap();
//! assert_eq!(friends.items().len(), 2);
//! assert!(matches!(merged.records[1].get("friend"), Some(Field::Single(_))));
//! ```

pub mod data;
pub mod error;
pub mod output;
pub mod query;
pub mod sort;

pub use data::{Record, ResultSet, Scalar, Source};
pub use error::RowfoldError;
pub use output::{Cell, ColumnSpec, ResultTable, SortState, TableRow};
pub use query::{
    group_by, serialize, serialize_by, serialize_legacy, CompositeField, Field, Group, Item,
    JoinMode, JoinOptions, MergedRecord, MergedResultSet, OrderDirection,
};
pub use sort::{compare_text_case_insensitive, merge_sort, merge_sort_by};

/// Result type for rowfoldlib operations
pub type Result<T> = std::result::Result<T, RowfoldError>;
