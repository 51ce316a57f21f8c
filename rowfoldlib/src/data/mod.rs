//! Input data: scalar values, flat records and result sets.
//!
//! This is the first stage of the pipeline. A [`ResultSet`] arrives fully
//! materialized from the query service (or a JSON file holding its payload)
//! and is never mutated by later stages.
//!
//! ## Example
//!
//! ```rust
//! use rowfoldlib::data::{ResultSet, Scalar};
//!
//! let rs = ResultSet::from_json_str(
//!     r#"{"columns": ["id", "friend"], "results": [["2", "Bob"], ["3", "Sue"]]}"#,
//! ).unwrap();
//! assert_eq!(rs.results[1].get("friend"), Some(&Scalar::from("Sue")));
//! ```

pub mod resultset;
pub mod value;

pub use resultset::{ResultSet, Source};
pub use value::{Record, Scalar};
