//! The record manager: schema-driven fixed-width tuples laid out in
//! per-page slot directories, a free-page list threaded through data
//! pages, and full-table scans over an opaque predicate.

mod page_layout;
mod record;
mod rid;
mod scan;
mod schema;
mod table;
pub mod value;

pub use record::Record;
pub use rid::Rid;
pub use scan::{Scan, ScanPredicate};
pub use schema::{Attribute, Schema};
pub use table::Table;
pub use value::{DataType, Value};
