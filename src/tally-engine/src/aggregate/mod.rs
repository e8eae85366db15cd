//! The four summary aggregators.
//!
//! Each aggregator is a pure function from an [`OrderTable`](tally_core::OrderTable)
//! to a fresh summary. None depends on another's output.

pub mod accumulator;
pub mod category;
pub mod geography;
pub mod monthly;
pub mod rfm;
pub mod sort;

pub use accumulator::{Accumulator, CountDistinct, Groups, MaxInt64, SumFloat64, SumInt64};
pub use category::{CategoryRow, CategorySummary, category_sales};
pub use geography::{StateRow, StateSummary, customers_by_state};
pub use monthly::{MonthlyRow, MonthlySummary, monthly_orders};
pub use rfm::{RfmRow, RfmSummary, rfm};
pub use sort::{Direction, reorder, stable_order};
