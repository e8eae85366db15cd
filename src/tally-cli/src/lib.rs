//! Tally CLI - text reports for the order dashboard
//!
//! # Usage
//!
//! ```bash
//! # Everything, over the whole store
//! tally report --data all_data.csv
//!
//! # One section over a window and a category
//! tally products --start 2018-01-01 --end 2018-06-30 --category toys
//! ```
//!
//! Logging goes to stderr; set `RUST_LOG=tally=debug` for per-stage timings.

pub mod args;
pub mod render;
pub mod report;

pub use args::{Cli, Command, Options};
pub use render::{format_batch, format_value, section};
pub use report::full_report;
