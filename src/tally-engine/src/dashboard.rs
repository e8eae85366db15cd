//! One dashboard refresh: filter, aggregate, summarize.

use chrono::NaiveDate;
use tracing::{debug, info};

use common_config::DataConfig;
use common_error::TallyResult;
use tally_core::{CsvLoader, OrderTable};

use crate::aggregate::{
    CategorySummary, MonthlySummary, RfmSummary, StateSummary, category_sales, customers_by_state,
    monthly_orders, rfm,
};
use crate::filter::{FilterParams, apply_filter};
use crate::metrics::{DashboardMetrics, ExecutionTimer, MetricsSink, OperatorMetrics};

/// Everything one refresh produces.
#[derive(Debug, Clone)]
pub struct DashboardView {
    /// The parameters the view was computed for.
    pub params: FilterParams,
    /// Rows that passed the filter.
    pub filtered_rows: usize,
    /// Monthly trend of the filtered view.
    pub monthly: MonthlySummary,
    /// Category ranking of the filtered view.
    pub categories: CategorySummary,
    /// Customers per state in the filtered view.
    pub states: StateSummary,
    /// All-time RFM scores, independent of the filter.
    pub rfm: RfmSummary,
    /// Headline numbers.
    pub metrics: DashboardMetrics,
    /// Per-stage execution metrics.
    pub operator_metrics: MetricsSink,
}

/// The loaded store and the entry point for view refreshes.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    table: OrderTable,
}

impl Dashboard {
    /// Wrap an already loaded table.
    pub fn new(table: OrderTable) -> Self {
        Self { table }
    }

    /// Load the store described by `config`. Any failure is fatal to the caller.
    pub fn load(config: &DataConfig) -> TallyResult<Self> {
        let table = CsvLoader::new()
            .with_delimiter(config.delimiter_byte())
            .load_path(&config.path)?;
        Ok(Self::new(table))
    }

    /// The unfiltered store.
    pub fn table(&self) -> &OrderTable {
        &self.table
    }

    /// Categories available for the filter, in first-appearance order.
    pub fn categories(&self) -> TallyResult<Vec<String>> {
        self.table.distinct_categories()
    }

    /// First and last purchase date in the store.
    pub fn date_bounds(&self) -> TallyResult<Option<(NaiveDate, NaiveDate)>> {
        self.table.purchase_date_bounds()
    }

    /// Parameters covering the whole store with no category restriction.
    ///
    /// `None` for an empty store.
    pub fn default_params(&self) -> TallyResult<Option<FilterParams>> {
        FilterParams::full_range(&self.table)
    }

    /// Compute a complete view for `params`.
    pub fn refresh(&self, params: &FilterParams) -> TallyResult<DashboardView> {
        let mut sink = MetricsSink::new();
        let total_rows = self.table.num_rows();

        let filtered = timed(
            &mut sink,
            "filter",
            total_rows,
            || apply_filter(&self.table, params),
            OrderTable::num_rows,
        )?;
        let rows = filtered.num_rows();

        let monthly = timed(
            &mut sink,
            "monthly",
            rows,
            || monthly_orders(&filtered),
            MonthlySummary::len,
        )?;
        let categories = timed(
            &mut sink,
            "categories",
            rows,
            || category_sales(&filtered),
            CategorySummary::len,
        )?;
        let states = timed(
            &mut sink,
            "states",
            rows,
            || customers_by_state(&filtered),
            StateSummary::len,
        )?;
        let segments = timed(
            &mut sink,
            "rfm",
            total_rows,
            || rfm(&self.table),
            RfmSummary::len,
        )?;

        let metrics = DashboardMetrics::compute(&monthly, &segments);
        info!(
            %params,
            rows,
            orders = metrics.total_orders,
            elapsed = ?sink.total_time(),
            "dashboard refreshed"
        );

        Ok(DashboardView {
            params: params.clone(),
            filtered_rows: rows,
            monthly,
            categories,
            states,
            rfm: segments,
            metrics,
            operator_metrics: sink,
        })
    }
}

fn timed<T, F, L>(
    sink: &mut MetricsSink,
    stage: &str,
    rows_in: usize,
    run: F,
    rows_out: L,
) -> TallyResult<T>
where
    F: FnOnce() -> TallyResult<T>,
    L: Fn(&T) -> usize,
{
    let timer = ExecutionTimer::start();
    let output = run()?;

    let mut metrics = OperatorMetrics::new();
    metrics.add_rows_in(rows_in);
    metrics.add_rows_out(rows_out(&output));
    metrics.add_time(timer.stop());
    debug!(stage, %metrics, "stage complete");

    sink.record(stage, metrics);
    Ok(output)
}
