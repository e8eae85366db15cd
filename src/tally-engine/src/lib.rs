//! Evaluation engine for Tally.
//!
//! Turns the order-line store into dashboard summaries:
//!
//! ```text
//! OrderTable ──▶ apply_filter ──▶ monthly_orders
//!     │                       ├──▶ category_sales
//!     │                       └──▶ customers_by_state
//!     └──────────────────────────▶ rfm (unfiltered)
//! ```
//!
//! Every stage is a synchronous pure function over an immutable table;
//! [`Dashboard::refresh`] runs them in sequence and records per-stage
//! [`OperatorMetrics`].

#![allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)] // counts fit comfortably in f64/i64

pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod metrics;

pub use aggregate::{
    CategoryRow, CategorySummary, MonthlyRow, MonthlySummary, RfmRow, RfmSummary, StateRow,
    StateSummary, category_sales, customers_by_state, monthly_orders, rfm,
};
pub use dashboard::{Dashboard, DashboardView};
pub use filter::{CategoryFilter, FilterParams, apply_filter};
pub use metrics::{DashboardMetrics, ExecutionTimer, MetricsSink, OperatorMetrics};
