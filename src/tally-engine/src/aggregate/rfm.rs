//! Per-customer Recency / Frequency / Monetary scores.
//!
//! RFM is computed over the whole store rather than the filtered view so that
//! segmentation reflects all-time behavior. Recency is a whole-month distance
//! from the latest purchase month in the store, so any two purchases in the
//! same calendar month are equally recent.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDateTime;

use common_display::short_id;
use common_error::{TallyError, TallyResult};
use tally_core::time::from_millis;
use tally_core::{OrderTable, YearMonth};

use super::accumulator::{Accumulator, CountDistinct, Groups, MaxInt64, SumFloat64};
use super::sort::{Direction, reorder, stable_order};

/// RFM scores for one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct RfmRow {
    /// Customer identifier.
    pub customer_id: String,
    /// Latest purchase instant.
    pub last_purchase: NaiveDateTime,
    /// Distinct orders.
    pub frequency: u64,
    /// Summed line prices.
    pub monetary: f64,
    /// Whole months between the store's latest purchase month and this
    /// customer's latest purchase month.
    pub recency: i64,
}

impl RfmRow {
    /// Leading characters of the customer id for compact display.
    pub fn short_customer_id(&self, len: usize) -> String {
        short_id(&self.customer_id, len)
    }
}

/// RFM rows in order of each customer's first purchase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RfmSummary {
    rows: Vec<RfmRow>,
    reference_month: Option<YearMonth>,
}

impl RfmSummary {
    /// All customers.
    pub fn rows(&self) -> &[RfmRow] {
        &self.rows
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store had no customers.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The latest purchase month in the store, recency 0.
    pub fn reference_month(&self) -> Option<YearMonth> {
        self.reference_month
    }

    /// Mean recency in months; 0 when empty.
    pub fn mean_recency(&self) -> f64 {
        self.mean(|r| r.recency as f64)
    }

    /// Mean order count; 0 when empty.
    pub fn mean_frequency(&self) -> f64 {
        self.mean(|r| r.frequency as f64)
    }

    /// Mean spend; 0 when empty.
    pub fn mean_monetary(&self) -> f64 {
        self.mean(|r| r.monetary)
    }

    fn mean<F: Fn(&RfmRow) -> f64>(&self, f: F) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.rows.iter().map(f).sum::<f64>() / self.rows.len() as f64
    }

    /// The `n` most recent customers (smallest recency).
    pub fn top_by_recency(&self, n: usize) -> TallyResult<Vec<RfmRow>> {
        let values: ArrayRef = Arc::new(Int64Array::from_iter_values(
            self.rows.iter().map(|r| r.recency),
        ));
        self.top(values, Direction::Ascending, n)
    }

    /// The `n` customers with the most orders.
    pub fn top_by_frequency(&self, n: usize) -> TallyResult<Vec<RfmRow>> {
        let values: ArrayRef = Arc::new(UInt64Array::from_iter_values(
            self.rows.iter().map(|r| r.frequency),
        ));
        self.top(values, Direction::Descending, n)
    }

    /// The `n` customers with the highest spend.
    pub fn top_by_monetary(&self, n: usize) -> TallyResult<Vec<RfmRow>> {
        let values: ArrayRef = Arc::new(Float64Array::from_iter_values(
            self.rows.iter().map(|r| r.monetary),
        ));
        self.top(values, Direction::Descending, n)
    }

    fn top(&self, values: ArrayRef, direction: Direction, n: usize) -> TallyResult<Vec<RfmRow>> {
        let mut order = stable_order(values, direction)?;
        order.truncate(n);
        Ok(reorder(&self.rows, &order))
    }

    /// Render as an Arrow batch with `customer_id`, `frequency`, `monetary`
    /// and `recency` columns.
    pub fn to_record_batch(&self) -> TallyResult<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("customer_id", DataType::Utf8, false),
            Field::new("frequency", DataType::UInt64, false),
            Field::new("monetary", DataType::Float64, false),
            Field::new("recency", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(|r| r.customer_id.as_str()),
            )),
            Arc::new(UInt64Array::from_iter_values(
                self.rows.iter().map(|r| r.frequency),
            )),
            Arc::new(Float64Array::from_iter_values(
                self.rows.iter().map(|r| r.monetary),
            )),
            Arc::new(Int64Array::from_iter_values(
                self.rows.iter().map(|r| r.recency),
            )),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

#[derive(Default)]
struct CustomerState<'a> {
    last_purchase: MaxInt64,
    orders: CountDistinct<'a>,
    spend: SumFloat64,
}

/// Compute RFM scores for every customer in `table`.
///
/// Pass the unfiltered store.
pub fn rfm(table: &OrderTable) -> TallyResult<RfmSummary> {
    let customers = table.customer_ids()?;
    let timestamps = table.purchase_timestamps()?;
    let order_ids = table.order_ids()?;
    let prices = table.prices()?;

    let mut groups: Groups<&str, CustomerState<'_>> = Groups::new();
    let mut latest = MaxInt64::default();
    for row in 0..table.num_rows() {
        let ts = timestamps.value(row);
        latest.update(Some(ts));

        let state = groups.entry(customers.value(row));
        state.last_purchase.update(Some(ts));
        state.orders.update(Some(order_ids.value(row)));
        state.spend.update(Some(prices.value(row)));
    }

    let Some(latest) = latest.finalize() else {
        return Ok(RfmSummary::default());
    };
    let reference_month = YearMonth::from_millis(latest)?;

    let rows = groups
        .into_ordered()
        .map(|(customer_id, state)| {
            let last_millis = state.last_purchase.finalize().ok_or_else(|| {
                TallyError::internal(format!("customer {customer_id} has no purchase"))
            })?;
            let last_purchase = from_millis(last_millis)?;
            Ok(RfmRow {
                customer_id: customer_id.to_string(),
                last_purchase,
                frequency: state.orders.finalize(),
                monetary: state.spend.finalize(),
                recency: reference_month.months_since(&YearMonth::of(&last_purchase)),
            })
        })
        .collect::<TallyResult<Vec<_>>>()?;

    Ok(RfmSummary {
        rows,
        reference_month: Some(reference_month),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::testing::OrderFixture;

    fn by_customer<'a>(summary: &'a RfmSummary, id: &str) -> &'a RfmRow {
        summary
            .rows()
            .iter()
            .find(|r| r.customer_id == id)
            .unwrap()
    }

    #[test]
    fn test_two_customer_example() {
        let summary = rfm(&OrderFixture::two_customers().build()).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.reference_month(), Some(YearMonth::new(2018, 7).unwrap()));

        let a = by_customer(&summary, "A");
        assert_eq!((a.frequency, a.monetary, a.recency), (2, 30.0, 0));
        let b = by_customer(&summary, "B");
        assert_eq!((b.frequency, b.monetary, b.recency), (1, 5.0, 0));
    }

    #[test]
    fn test_recency_counts_calendar_months() {
        let table = OrderFixture::new()
            .line("o1", "early", "2017-12-31 23:59:59", 10.0)
            .line("o2", "mid", "2018-02-01 00:00:00", 10.0)
            .line("o3", "late", "2018-03-01 00:00:01", 10.0)
            .build();
        let summary = rfm(&table).unwrap();
        assert_eq!(by_customer(&summary, "early").recency, 3);
        assert_eq!(by_customer(&summary, "mid").recency, 1);
        assert_eq!(by_customer(&summary, "late").recency, 0);
    }

    #[test]
    fn test_multi_line_orders_count_once() {
        let table = OrderFixture::new()
            .line("o1", "c1", "2018-01-01 10:00:00", 10.0)
            .line("o1", "c1", "2018-01-01 10:00:00", 15.0)
            .line("o2", "c1", "2018-02-01 10:00:00", 5.0)
            .build();
        let report = rfm(&table).unwrap();
        let row = &report.rows()[0];
        assert_eq!(row.frequency, 2);
        assert!((row.monetary - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_rankings_and_means() {
        let table = OrderFixture::small_store().build();
        let summary = rfm(&table).unwrap();
        assert_eq!(summary.len(), 4);

        let recent: Vec<_> = summary
            .top_by_recency(2)
            .unwrap()
            .into_iter()
            .map(|r| r.customer_id)
            .collect();
        assert_eq!(recent, vec!["c-01", "c-04"]);

        let frequent = summary.top_by_frequency(1).unwrap();
        assert_eq!(frequent[0].customer_id, "c-01");
        assert_eq!(frequent[0].frequency, 2);

        let spenders = summary.top_by_monetary(1).unwrap();
        assert_eq!(spenders[0].customer_id, "c-04");

        // Recency: c-01 0, c-02 2, c-03 1, c-04 0
        assert!((summary.mean_recency() - 0.75).abs() < 1e-9);
        assert!((summary.mean_frequency() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_short_customer_id() {
        let summary = rfm(&OrderFixture::two_customers().build()).unwrap();
        assert_eq!(summary.rows()[0].short_customer_id(3), "A");
    }

    #[test]
    fn test_empty_input() {
        let summary = rfm(&OrderTable::empty()).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.reference_month(), None);
        assert_eq!(summary.mean_recency(), 0.0);
        assert_eq!(summary.mean_monetary(), 0.0);
        assert!(summary.top_by_monetary(5).unwrap().is_empty());
    }
}
