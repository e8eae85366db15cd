//! Tally - order analytics over a static e-commerce export
//!
//! Loads a cleaned order-line CSV once, restricts it by date range and
//! category, and derives the monthly trend, category ranking, customers per
//! state and all-time RFM segmentation.
//!
//! ```no_run
//! use tally::config::DataConfig;
//! use tally::engine::Dashboard;
//!
//! # fn main() -> tally::error::TallyResult<()> {
//! let dashboard = Dashboard::load(&DataConfig::default())?;
//! if let Some(params) = dashboard.default_params()? {
//!     let view = dashboard.refresh(&params)?;
//!     println!("{} orders", view.metrics.total_orders);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export member crates
pub use common_config as config;
pub use common_display as display;
pub use common_error as error;
pub use tally_core as core;
pub use tally_engine as engine;

/// Tally version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
