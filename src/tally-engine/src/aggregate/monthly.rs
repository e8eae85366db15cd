//! Monthly order and revenue resampling.

use std::collections::BTreeMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use common_error::TallyResult;
use tally_core::{OrderTable, YearMonth};

use super::accumulator::{Accumulator, CountDistinct, SumFloat64};

/// Orders and revenue for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRow {
    /// The bucket.
    pub month: YearMonth,
    /// Distinct orders placed in the month.
    pub order_count: u64,
    /// Summed line prices.
    pub revenue: f64,
}

impl MonthlyRow {
    /// Full month name, e.g. `"February"`.
    pub fn label(&self) -> &'static str {
        self.month.name()
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.month.year()
    }
}

/// Monthly trend in chronological order. Months without orders are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthlySummary {
    rows: Vec<MonthlyRow>,
}

impl MonthlySummary {
    /// Rows in chronological order.
    pub fn rows(&self) -> &[MonthlyRow] {
        &self.rows
    }

    /// Number of months present.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no month is present.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the monthly order counts.
    pub fn total_orders(&self) -> u64 {
        self.rows.iter().map(|r| r.order_count).sum()
    }

    /// Sum of the monthly revenue.
    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    /// Render as an Arrow batch with `month`, `year`, `month_number`,
    /// `order_count` and `revenue` columns.
    pub fn to_record_batch(&self) -> TallyResult<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("month", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("month_number", DataType::UInt32, false),
            Field::new("order_count", DataType::UInt64, false),
            Field::new("revenue", DataType::Float64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                self.rows.iter().map(MonthlyRow::label),
            )),
            Arc::new(Int32Array::from_iter_values(
                self.rows.iter().map(MonthlyRow::year),
            )),
            Arc::new(UInt32Array::from_iter_values(
                self.rows.iter().map(|r| r.month.month()),
            )),
            Arc::new(UInt64Array::from_iter_values(
                self.rows.iter().map(|r| r.order_count),
            )),
            Arc::new(Float64Array::from_iter_values(
                self.rows.iter().map(|r| r.revenue),
            )),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

#[derive(Default)]
struct MonthState<'a> {
    orders: CountDistinct<'a>,
    revenue: SumFloat64,
}

/// Bucket order lines by purchase month: distinct orders and summed price.
pub fn monthly_orders(table: &OrderTable) -> TallyResult<MonthlySummary> {
    let timestamps = table.purchase_timestamps()?;
    let order_ids = table.order_ids()?;
    let prices = table.prices()?;

    let mut buckets: BTreeMap<YearMonth, MonthState<'_>> = BTreeMap::new();
    for row in 0..table.num_rows() {
        let month = YearMonth::from_millis(timestamps.value(row))?;
        let state = buckets.entry(month).or_default();
        state.orders.update(Some(order_ids.value(row)));
        state.revenue.update(Some(prices.value(row)));
    }

    let rows = buckets
        .into_iter()
        .map(|(month, state)| MonthlyRow {
            month,
            order_count: state.orders.finalize(),
            revenue: state.revenue.finalize(),
        })
        .collect();
    Ok(MonthlySummary { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::testing::OrderFixture;

    #[test]
    fn test_monthly_buckets() {
        let table = OrderFixture::small_store().build();
        let summary = monthly_orders(&table).unwrap();

        let months: Vec<_> = summary.rows().iter().map(|r| r.month.to_string()).collect();
        assert_eq!(months, vec!["November 2017", "December 2017", "January 2018"]);

        let nov = &summary.rows()[0];
        assert_eq!(nov.order_count, 2);
        assert!((nov.revenue - (120.0 + 35.5 + 59.9)).abs() < 1e-9);

        let jan = &summary.rows()[2];
        assert_eq!(jan.order_count, 2);
        assert!((jan.revenue - 589.0).abs() < 1e-9);

        assert_eq!(summary.total_orders(), 5);
    }

    #[test]
    fn test_gap_months_are_absent() {
        let table = OrderFixture::new()
            .line("o1", "c1", "2017-01-10 10:00:00", 1.0)
            .line("o2", "c1", "2017-04-10 10:00:00", 1.0)
            .build();
        let summary = monthly_orders(&table).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary.rows()[0].label(), "January");
        assert_eq!(summary.rows()[1].label(), "April");
    }

    #[test]
    fn test_empty_input() {
        let summary = monthly_orders(&OrderTable::empty()).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.total_orders(), 0);
        assert_eq!(summary.total_revenue(), 0.0);
        assert_eq!(summary.to_record_batch().unwrap().num_rows(), 0);
    }

    #[test]
    fn test_record_batch_layout() {
        let table = OrderFixture::two_customers().build();
        let batch = monthly_orders(&table).unwrap().to_record_batch().unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);
        assert_eq!(batch.schema().field(0).name(), "month");
    }
}
