//! Date-range and category restriction of the row store.

use std::fmt;
use std::str::FromStr;

use arrow::array::{BooleanArray, StringArray, TimestampMillisecondArray};
use arrow::compute::and;
use arrow::compute::kernels::cmp::{eq, gt_eq, lt};
use chrono::NaiveDate;
use tracing::debug;

use common_error::{TallyError, TallyResult};
use tally_core::OrderTable;
use tally_core::time::{parse_date, start_of_day_millis};

/// Category restriction for a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// No restriction.
    #[default]
    All,
    /// Only lines whose category equals this label. Null categories never match.
    Only(String),
}

impl CategoryFilter {
    /// Whether this filter keeps every row.
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

impl FromStr for CategoryFilter {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.is_empty() {
            return Err(TallyError::invalid_parameter("empty category"));
        }
        if label.eq_ignore_ascii_case("all") || label.eq_ignore_ascii_case("all products") {
            Ok(Self::All)
        } else {
            Ok(Self::Only(label.to_string()))
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Only(label) => write!(f, "{label}"),
        }
    }
}

/// Parameters of one dashboard view: a closed date interval and a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterParams {
    /// First included day.
    pub start_date: NaiveDate,
    /// Last included day; the whole day is in range.
    pub end_date: NaiveDate,
    /// Category restriction.
    pub category: CategoryFilter,
}

impl FilterParams {
    /// A view over `[start_date, end_date]` with no category restriction.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            category: CategoryFilter::All,
        }
    }

    /// Parse `YYYY-MM-DD` bounds.
    pub fn parse(start_date: &str, end_date: &str) -> TallyResult<Self> {
        Ok(Self::new(parse_date(start_date)?, parse_date(end_date)?))
    }

    /// Replace the category restriction.
    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    /// The whole purchase range of `table`, or `None` when it is empty.
    pub fn full_range(table: &OrderTable) -> TallyResult<Option<Self>> {
        Ok(table
            .purchase_date_bounds()?
            .map(|(start, end)| Self::new(start, end)))
    }

    /// Whether the interval is empty because it ends before it starts.
    pub fn is_inverted(&self) -> bool {
        self.end_date < self.start_date
    }

    /// Half-open millisecond bounds `[lower, upper)` of the interval.
    fn millis_bounds(&self) -> (i64, i64) {
        let lower = start_of_day_millis(self.start_date);
        let upper = self
            .end_date
            .succ_opt()
            .map_or(i64::MAX, start_of_day_millis);
        (lower, upper)
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({})",
            self.start_date, self.end_date, self.category
        )
    }
}

/// Restrict `table` to the rows selected by `params`.
///
/// An inverted interval or a category with no lines yields an empty table.
pub fn apply_filter(table: &OrderTable, params: &FilterParams) -> TallyResult<OrderTable> {
    if params.is_inverted() {
        debug!(%params, "inverted date range, empty view");
        return table.filter(&BooleanArray::from(vec![false; table.num_rows()]));
    }

    let mask = build_mask(table, params)?;
    let filtered = table.filter(&mask)?;
    debug!(
        %params,
        rows_in = table.num_rows(),
        rows_out = filtered.num_rows(),
        "applied filter"
    );
    Ok(filtered)
}

fn build_mask(table: &OrderTable, params: &FilterParams) -> TallyResult<BooleanArray> {
    let (lower, upper) = params.millis_bounds();
    let timestamps = table.purchase_timestamps()?;

    let after_start = gt_eq(timestamps, &TimestampMillisecondArray::new_scalar(lower))?;
    let before_end = lt(timestamps, &TimestampMillisecondArray::new_scalar(upper))?;
    let mut mask = and(&after_start, &before_end)?;

    if let CategoryFilter::Only(label) = &params.category {
        let matches = eq(table.categories()?, &StringArray::new_scalar(label.as_str()))?;
        mask = and(&mask, &matches)?;
    }
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::testing::OrderFixture;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_category_filter_parsing() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("all products".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            " toys ".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only("toys".to_string())
        );
        assert!("  ".parse::<CategoryFilter>().is_err());
        assert_eq!(CategoryFilter::Only("toys".into()).to_string(), "toys");
    }

    #[test]
    fn test_end_day_is_inclusive() {
        let table = OrderFixture::new()
            .line("o1", "c1", "2018-01-31 23:59:59", 1.0)
            .line("o2", "c1", "2018-02-01 00:00:00", 1.0)
            .build();
        let params = FilterParams::new(date("2018-01-01"), date("2018-01-31"));
        let view = apply_filter(&table, &params).unwrap();
        assert_eq!(view.num_rows(), 1);
        assert_eq!(view.order_ids().unwrap().value(0), "o1");
    }

    #[test]
    fn test_start_day_is_inclusive() {
        let table = OrderFixture::new()
            .line("o1", "c1", "2017-12-31 23:59:59", 1.0)
            .line("o2", "c1", "2018-01-01 00:00:00", 1.0)
            .build();
        let params = FilterParams::new(date("2018-01-01"), date("2018-01-31"));
        let view = apply_filter(&table, &params).unwrap();
        assert_eq!(view.order_ids().unwrap().value(0), "o2");
        assert_eq!(view.num_rows(), 1);
    }

    #[test]
    fn test_category_restriction() {
        let table = OrderFixture::small_store().build();
        let params = FilterParams::new(date("2017-01-01"), date("2018-12-31"))
            .with_category(CategoryFilter::Only("health_beauty".into()));
        let view = apply_filter(&table, &params).unwrap();
        assert_eq!(view.num_rows(), 2);
        assert!(
            view.categories()
                .unwrap()
                .iter()
                .all(|c| c == Some("health_beauty"))
        );
    }

    #[test]
    fn test_null_category_never_matches() {
        let table = OrderFixture::new()
            .line_with("o1", "c1", "2018-01-01 10:00:00", 1.0, |l| l.category = None)
            .line("o2", "c1", "2018-01-02 10:00:00", 1.0)
            .build();
        let params = FilterParams::new(date("2018-01-01"), date("2018-01-31"))
            .with_category(CategoryFilter::Only("toys".into()));
        assert_eq!(apply_filter(&table, &params).unwrap().num_rows(), 1);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let table = OrderFixture::small_store().build();
        let params = FilterParams::new(date("2018-01-31"), date("2017-11-01"));
        assert!(params.is_inverted());
        let view = apply_filter(&table, &params).unwrap();
        assert!(view.is_empty());
    }

    #[test]
    fn test_full_range_keeps_everything() {
        let table = OrderFixture::small_store().build();
        let params = FilterParams::full_range(&table).unwrap().unwrap();
        assert_eq!(params.start_date, date("2017-11-03"));
        assert_eq!(params.end_date, date("2018-01-30"));
        assert_eq!(apply_filter(&table, &params).unwrap().num_rows(), table.num_rows());

        assert!(FilterParams::full_range(&OrderTable::empty()).unwrap().is_none());
    }

    #[test]
    fn test_parse_bounds() {
        let params = FilterParams::parse("2018-01-01", "2018-03-31").unwrap();
        assert_eq!(params.to_string(), "2018-01-01 to 2018-03-31 (All)");
        assert!(FilterParams::parse("2018-13-01", "2018-03-31").is_err());
    }
}
