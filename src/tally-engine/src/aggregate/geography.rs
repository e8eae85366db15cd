//! Distinct customers per state.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use common_error::TallyResult;
use tally_core::OrderTable;

use super::accumulator::{Accumulator, CountDistinct, Groups};
use super::sort::{Direction, reorder, stable_order};

/// Customer count for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRow {
    /// State code; `None` collects customers without one.
    pub state: Option<String>,
    /// Distinct customers.
    pub customer_count: u64,
}

/// States ranked by distinct customers, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateSummary {
    rows: Vec<StateRow>,
}

impl StateSummary {
    /// Rows in descending order of customers.
    pub fn rows(&self) -> &[StateRow] {
        &self.rows
    }

    /// Number of states.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no states.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of the per-state counts.
    pub fn total_customers(&self) -> u64 {
        self.rows.iter().map(|r| r.customer_count).sum()
    }

    /// The first `n` states followed by one `other_label` row holding the rest.
    ///
    /// The trailing row is always present, with a count of zero when nothing
    /// is left over.
    pub fn top_with_other(&self, n: usize, other_label: &str) -> Vec<StateRow> {
        let top = &self.rows[..n.min(self.rows.len())];
        let top_total: u64 = top.iter().map(|r| r.customer_count).sum();

        let mut rows = top.to_vec();
        rows.push(StateRow {
            state: Some(other_label.to_string()),
            customer_count: self.total_customers() - top_total,
        });
        rows
    }

    fn counts_array(&self) -> ArrayRef {
        Arc::new(UInt64Array::from_iter_values(
            self.rows.iter().map(|r| r.customer_count),
        ))
    }

    /// Render as an Arrow batch with `customer_state` and `customer_count`.
    pub fn to_record_batch(&self) -> TallyResult<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("customer_state", DataType::Utf8, true),
            Field::new("customer_count", DataType::UInt64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter(
                self.rows.iter().map(|r| r.state.as_deref()),
            )),
            self.counts_array(),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

/// Count distinct customers per state, ranked descending with stable ties.
pub fn customers_by_state(table: &OrderTable) -> TallyResult<StateSummary> {
    let states = table.customer_states()?;
    let customers = table.customer_ids()?;

    let mut groups: Groups<Option<&str>, CountDistinct<'_>> = Groups::new();
    for row in 0..table.num_rows() {
        let key = (!states.is_null(row)).then(|| states.value(row));
        groups.entry(key).update(Some(customers.value(row)));
    }

    let unordered = StateSummary {
        rows: groups
            .into_ordered()
            .map(|(state, customers)| StateRow {
                state: state.map(str::to_string),
                customer_count: customers.finalize(),
            })
            .collect(),
    };
    let order = stable_order(unordered.counts_array(), Direction::Descending)?;
    Ok(StateSummary {
        rows: reorder(&unordered.rows, &order),
    })
}
