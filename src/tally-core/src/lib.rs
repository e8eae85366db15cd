//! Core data model for Tally.
//!
//! This crate provides the order-line row store the aggregators read from:
//! - `OrderLine` for typed records
//! - `OrderTable`, an Arrow-backed table sorted by purchase time
//! - `CsvLoader` for reading the cleaned export
//! - `YearMonth` and timestamp helpers for month bucketing

pub mod loader;
pub mod record;
pub mod schema;
pub mod table;
pub mod testing;
pub mod time;

// Re-export commonly used types
pub use loader::CsvLoader;
pub use record::OrderLine;
pub use schema::order_line_schema;
pub use table::OrderTable;
pub use time::YearMonth;
