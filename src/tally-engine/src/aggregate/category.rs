//! Category sales ranking.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use common_error::{TallyError, TallyResult};
use tally_core::OrderTable;

use super::accumulator::{Accumulator, Groups, SumInt64};
use super::sort::{Direction, reorder, stable_order};

/// Items sold for one product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRow {
    /// Category label; `None` collects lines without a category.
    pub category: Option<String>,
    /// Summed `order_item_id`.
    pub items_sold: i64,
}

/// Categories ranked by items sold, largest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySummary {
    rows: Vec<CategoryRow>,
}

impl CategorySummary {
    /// Rows in descending order of items sold.
    pub fn rows(&self) -> &[CategoryRow] {
        &self.rows
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no categories.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Items sold across all categories.
    pub fn total_items(&self) -> TallyResult<i64> {
        self.rows
            .iter()
            .try_fold(0i64, |acc, r| acc.checked_add(r.items_sold))
            .ok_or_else(|| TallyError::execution("total items sold overflowed i64"))
    }

    /// The `n` best-selling categories.
    pub fn best(&self, n: usize) -> &[CategoryRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// The `n` worst-selling categories, smallest first.
    pub fn worst(&self, n: usize) -> TallyResult<Vec<CategoryRow>> {
        let order = stable_order(self.items_array(), Direction::Ascending)?;
        let mut rows = reorder(&self.rows, &order);
        rows.truncate(n);
        Ok(rows)
    }

    fn items_array(&self) -> ArrayRef {
        Arc::new(Int64Array::from_iter_values(
            self.rows.iter().map(|r| r.items_sold),
        ))
    }

    /// Render as an Arrow batch with `category` and `items_sold` columns.
    pub fn to_record_batch(&self) -> TallyResult<RecordBatch> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("category", DataType::Utf8, true),
            Field::new("items_sold", DataType::Int64, false),
        ]));
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter(
                self.rows.iter().map(|r| r.category.as_deref()),
            )),
            self.items_array(),
        ];
        Ok(RecordBatch::try_new(schema, columns)?)
    }
}

/// Sum `order_item_id` per category, ranked descending with stable ties.
pub fn category_sales(table: &OrderTable) -> TallyResult<CategorySummary> {
    let categories = table.categories()?;
    let item_ids = table.order_item_ids()?;

    let mut groups: Groups<Option<&str>, SumInt64> = Groups::new();
    for row in 0..table.num_rows() {
        let key = (!categories.is_null(row)).then(|| categories.value(row));
        groups.entry(key).update(Some(item_ids.value(row)));
    }

    let unordered = groups
        .into_ordered()
        .map(|(category, sum)| {
            Ok(CategoryRow {
                category: category.map(str::to_string),
                items_sold: sum.finalize()?,
            })
        })
        .collect::<TallyResult<Vec<_>>>()?;

    let summary = CategorySummary { rows: unordered };
    let order = stable_order(summary.items_array(), Direction::Descending)?;
    Ok(CategorySummary {
        rows: reorder(&summary.rows, &order),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::testing::OrderFixture;

    fn labels(rows: &[CategoryRow]) -> Vec<&str> {
        rows.iter()
            .map(|r| r.category.as_deref().unwrap_or("-"))
            .collect()
    }

    #[test]
    fn test_ranking() {
        let table = OrderFixture::small_store().build();
        let summary = category_sales(&table).unwrap();

        // bed_bath_table 1+2, health_beauty 1+1, toys 1, watches_gifts 1+2
        assert_eq!(
            labels(summary.rows()),
            vec!["bed_bath_table", "watches_gifts", "health_beauty", "toys"]
        );
        assert_eq!(summary.rows()[0].items_sold, 3);
        assert_eq!(summary.total_items().unwrap(), 9);
    }

    #[test]
    fn test_best_and_worst() {
        let table = OrderFixture::small_store().build();
        let summary = category_sales(&table).unwrap();

        assert_eq!(labels(summary.best(2)), vec!["bed_bath_table", "watches_gifts"]);
        assert_eq!(summary.best(10).len(), 4);

        let worst = summary.worst(2).unwrap();
        assert_eq!(labels(&worst), vec!["toys", "health_beauty"]);
    }

    #[test]
    fn test_ties_keep_first_appearance() {
        let table = OrderFixture::new()
            .line_with("o1", "c1", "2018-01-01 10:00:00", 1.0, |l| {
                l.category = Some("zeta".to_string());
            })
            .line_with("o2", "c1", "2018-01-02 10:00:00", 1.0, |l| {
                l.category = Some("alpha".to_string());
            })
            .line_with("o3", "c1", "2018-01-03 10:00:00", 1.0, |l| {
                l.category = Some("mid".to_string());
                l.order_item_id = 5;
            })
            .build();
        let summary = category_sales(&table).unwrap();
        assert_eq!(labels(summary.rows()), vec!["mid", "zeta", "alpha"]);

        let worst = summary.worst(3).unwrap();
        assert_eq!(labels(&worst), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_null_category_is_its_own_group() {
        let table = OrderFixture::new()
            .line_with("o1", "c1", "2018-01-01 10:00:00", 1.0, |l| l.category = None)
            .line_with("o2", "c2", "2018-01-02 10:00:00", 1.0, |l| l.category = None)
            .line("o3", "c3", "2018-01-03 10:00:00", 1.0)
            .build();
        let summary = category_sales(&table).unwrap();
        assert_eq!(summary.rows()[0].category, None);
        assert_eq!(summary.rows()[0].items_sold, 2);
        assert_eq!(summary.total_items().unwrap(), 3);
    }

    #[test]
    fn test_item_sum_overflow_is_an_error() {
        let huge = |l: &mut tally_core::OrderLine| l.order_item_id = 5_000_000_000_000_000_000;
        let table = OrderFixture::new()
            .line_with("o1", "c1", "2018-01-01 10:00:00", 1.0, huge)
            .line_with("o2", "c2", "2018-01-02 10:00:00", 1.0, huge)
            .build();
        let err = category_sales(&table).unwrap_err();
        assert!(matches!(err, TallyError::ExecutionError(_)));

        let split = OrderFixture::new()
            .line_with("o1", "c1", "2018-01-01 10:00:00", 1.0, huge)
            .line_with("o2", "c2", "2018-01-02 10:00:00", 1.0, |l| {
                huge(l);
                l.category = Some("auto".to_string());
            })
            .build();
        let summary = category_sales(&split).unwrap();
        assert_eq!(summary.len(), 2);
        assert!(summary.total_items().is_err());
    }

    #[test]
    fn test_empty_input() {
        let summary = category_sales(&OrderTable::empty()).unwrap();
        assert!(summary.is_empty());
        assert!(summary.best(5).is_empty());
        assert!(summary.worst(5).unwrap().is_empty());
    }
}
