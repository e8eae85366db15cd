//! The in-memory row store.

use std::collections::HashSet;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, Float64Builder, Int64Array, Int64Builder,
    StringArray, StringBuilder, TimestampMillisecondArray, TimestampMillisecondBuilder,
};
use arrow::compute::{SortColumn, SortOptions, filter_record_batch, lexsort_to_indices, take};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use common_error::{TallyError, TallyResult};

use crate::record::OrderLine;
use crate::schema::{self, order_line_schema, validate_schema};
use crate::time::{from_millis, to_millis};

/// An immutable, purchase-time-ordered table of order lines.
///
/// Filtering produces a new `OrderTable` sharing no mutable state with the
/// original; aggregators only ever read from it.
#[derive(Debug, Clone)]
pub struct OrderTable {
    batch: RecordBatch,
}

impl OrderTable {
    /// An empty table with the row store schema.
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(order_line_schema()),
        }
    }

    /// Wrap a batch that is already in row store layout and order.
    pub fn try_new(batch: RecordBatch) -> TallyResult<Self> {
        validate_schema(batch.schema().as_ref())?;
        Ok(Self { batch })
    }

    /// Build a table from records, stably sorted by purchase timestamp.
    pub fn from_records(records: &[OrderLine]) -> TallyResult<Self> {
        let mut order_id = StringBuilder::new();
        let mut customer_id = StringBuilder::new();
        let mut purchase_ts = TimestampMillisecondBuilder::with_capacity(records.len());
        let mut delivered_ts = TimestampMillisecondBuilder::with_capacity(records.len());
        let mut price = Float64Builder::with_capacity(records.len());
        let mut category = StringBuilder::new();
        let mut item_id = Int64Builder::with_capacity(records.len());
        let mut state = StringBuilder::new();

        for record in records {
            order_id.append_value(&record.order_id);
            customer_id.append_value(&record.customer_id);
            purchase_ts.append_value(to_millis(&record.purchase_ts));
            delivered_ts.append_option(record.delivered_ts.as_ref().map(to_millis));
            price.append_value(record.price);
            category.append_option(record.category.as_deref());
            item_id.append_value(record.order_item_id);
            state.append_option(record.customer_state.as_deref());
        }

        let columns: Vec<ArrayRef> = vec![
            Arc::new(order_id.finish()),
            Arc::new(customer_id.finish()),
            Arc::new(purchase_ts.finish()),
            Arc::new(delivered_ts.finish()),
            Arc::new(price.finish()),
            Arc::new(category.finish()),
            Arc::new(item_id.finish()),
            Arc::new(state.finish()),
        ];
        let batch = RecordBatch::try_new(order_line_schema(), columns)?;
        Self::sorted_by_purchase(batch)
    }

    /// Stable sort of a row store batch by purchase timestamp.
    fn sorted_by_purchase(batch: RecordBatch) -> TallyResult<Self> {
        if batch.num_rows() < 2 {
            return Self::try_new(batch);
        }

        // Row position as a secondary key keeps equal timestamps in input order.
        let position: ArrayRef = Arc::new(Int64Array::from_iter_values(
            0..batch.num_rows() as i64,
        ));
        let ts = batch
            .column_by_name(schema::PURCHASE_TS)
            .ok_or_else(|| TallyError::column_not_found(schema::PURCHASE_TS))?;
        let sort_columns = [
            SortColumn {
                values: Arc::clone(ts),
                options: Some(SortOptions {
                    descending: false,
                    nulls_first: false,
                }),
            },
            SortColumn {
                values: position,
                options: None,
            },
        ];
        let indices = lexsort_to_indices(&sort_columns, None)?;
        let columns = batch
            .columns()
            .iter()
            .map(|col| take(col.as_ref(), &indices, None))
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_new(RecordBatch::try_new(batch.schema(), columns)?)
    }

    /// Keep the rows where `mask` is true.
    pub fn filter(&self, mask: &BooleanArray) -> TallyResult<Self> {
        if mask.len() != self.num_rows() {
            return Err(TallyError::execution(format!(
                "filter mask has {} rows, table has {}",
                mask.len(),
                self.num_rows()
            )));
        }
        Ok(Self {
            batch: filter_record_batch(&self.batch, mask)?,
        })
    }

    /// The underlying Arrow batch.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of order lines.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// `order_id` column.
    pub fn order_ids(&self) -> TallyResult<&StringArray> {
        self.typed_column(schema::ORDER_ID)
    }

    /// `customer_id` column.
    pub fn customer_ids(&self) -> TallyResult<&StringArray> {
        self.typed_column(schema::CUSTOMER_ID)
    }

    /// `order_purchase_timestamp` column, milliseconds.
    pub fn purchase_timestamps(&self) -> TallyResult<&TimestampMillisecondArray> {
        self.typed_column(schema::PURCHASE_TS)
    }

    /// `order_delivered_customer_date` column, milliseconds.
    pub fn delivered_timestamps(&self) -> TallyResult<&TimestampMillisecondArray> {
        self.typed_column(schema::DELIVERED_TS)
    }

    /// `price` column.
    pub fn prices(&self) -> TallyResult<&Float64Array> {
        self.typed_column(schema::PRICE)
    }

    /// `product_category_name_english` column.
    pub fn categories(&self) -> TallyResult<&StringArray> {
        self.typed_column(schema::CATEGORY)
    }

    /// `order_item_id` column.
    pub fn order_item_ids(&self) -> TallyResult<&Int64Array> {
        self.typed_column(schema::ORDER_ITEM_ID)
    }

    /// `customer_state` column.
    pub fn customer_states(&self) -> TallyResult<&StringArray> {
        self.typed_column(schema::CUSTOMER_STATE)
    }

    fn typed_column<T: Array + 'static>(&self, name: &str) -> TallyResult<&T> {
        self.batch
            .column_by_name(name)
            .ok_or_else(|| TallyError::column_not_found(name))?
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| TallyError::type_error(format!("unexpected type for column '{name}'")))
    }

    /// Earliest and latest purchase dates, or `None` for an empty table.
    ///
    /// Relies on the store being sorted by purchase timestamp.
    pub fn purchase_date_bounds(&self) -> TallyResult<Option<(NaiveDate, NaiveDate)>> {
        if self.is_empty() {
            return Ok(None);
        }
        let ts = self.purchase_timestamps()?;
        let first = from_millis(ts.value(0))?;
        let last = from_millis(ts.value(ts.len() - 1))?;
        Ok(Some((first.date(), last.date())))
    }

    /// Distinct non-null categories in order of first appearance.
    pub fn distinct_categories(&self) -> TallyResult<Vec<String>> {
        let categories = self.categories()?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for category in categories.iter().flatten() {
            if seen.insert(category) {
                out.push(category.to_string());
            }
        }
        Ok(out)
    }

    /// Materialize one row; mainly for tests and diagnostics.
    pub fn row(&self, index: usize) -> TallyResult<OrderLine> {
        if index >= self.num_rows() {
            return Err(TallyError::value_error(format!(
                "row {index} out of bounds for table of {} rows",
                self.num_rows()
            )));
        }
        let delivered = self.delivered_timestamps()?;
        let categories = self.categories()?;
        let states = self.customer_states()?;

        Ok(OrderLine {
            order_id: self.order_ids()?.value(index).to_string(),
            customer_id: self.customer_ids()?.value(index).to_string(),
            purchase_ts: from_millis(self.purchase_timestamps()?.value(index))?,
            delivered_ts: if delivered.is_null(index) {
                None
            } else {
                Some(from_millis(delivered.value(index))?)
            },
            price: self.prices()?.value(index),
            category: (!categories.is_null(index)).then(|| categories.value(index).to_string()),
            order_item_id: self.order_item_ids()?.value(index),
            customer_state: (!states.is_null(index)).then(|| states.value(index).to_string()),
        })
    }
}

impl Default for OrderTable {
    fn default() -> Self {
        Self::empty()
    }
}
