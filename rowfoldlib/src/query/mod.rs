//! Query processing: group joined rows and fold them into merged records.
//!
//! This module handles the second stage of the pipeline. It provides:
//!
//! - **Grouping**: partition rows by a key column (`group_by`)
//! - **Serialization**: one merged record per group (`serialize_by`,
//!   `serialize_legacy`, or options-driven `serialize`)
//! - **Options**: `JoinOptions`, `CompositeField`, `JoinMode`
//!
//! ## Example
//!
//! ```rust
//! use rowfoldlib::data::{Record, ResultSet};
//! use rowfoldlib::query::{serialize, CompositeField, JoinOptions};
//!
//! let rs = ResultSet::new(
//!     ["id", "pubtitle", "pubyear"],
//!     vec![
//!         Record::new().with("id", "2").with("pubtitle", "Jump Up").with("pubyear", "2006"),
//!         Record::new().with("id", "2").with("pubtitle", "Sit Down").with("pubyear", "2008"),
//!     ],
//! );
//! let options = JoinOptions::new("id").composite(
//!     CompositeField::new("publication")
//!         .attribute("title", "pubtitle")
//!         .attribute("year", "pubyear"),
//! );
//!
//! let merged = serialize(&rs, &options).unwrap();
//! assert_eq!(merged.records.len(), 1);
//! assert!(merged.records[0].get("pubtitle").unwrap().is_list());
//! ```

pub mod group;
pub mod options;
pub mod serialize;

pub use group::{group_by, Group};
pub use options::{CompositeField, JoinMode, JoinOptions, OrderDirection};
pub use serialize::{
    serialize, serialize_by, serialize_legacy, Field, Item, MergedRecord, MergedResultSet,
};
