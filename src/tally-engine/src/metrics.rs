//! Scalar dashboard metrics and per-stage execution metrics.

use std::fmt::{self, Write};
use std::time::{Duration, Instant};

use common_display::{format_currency, round_to};

use crate::aggregate::{MonthlySummary, RfmSummary};

/// Headline numbers shown above the charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardMetrics {
    /// Sum of monthly distinct order counts in the view.
    pub total_orders: u64,
    /// Sum of monthly revenue in the view.
    pub total_revenue: f64,
    /// Mean RFM recency in months, one decimal.
    pub avg_recency: f64,
    /// Mean RFM frequency, two decimals.
    pub avg_frequency: f64,
    /// Mean RFM monetary value.
    pub avg_monetary: f64,
}

impl DashboardMetrics {
    /// Derive the metrics from the monthly summary of the view and the
    /// all-time RFM summary.
    pub fn compute(monthly: &MonthlySummary, rfm: &RfmSummary) -> Self {
        Self {
            total_orders: monthly.total_orders(),
            total_revenue: monthly.total_revenue(),
            avg_recency: round_to(rfm.mean_recency(), 1),
            avg_frequency: round_to(rfm.mean_frequency(), 2),
            avg_monetary: rfm.mean_monetary(),
        }
    }

    /// Total revenue as a currency string.
    pub fn revenue_display(&self, currency: &str) -> String {
        format_currency(self.total_revenue, currency)
    }

    /// Average monetary value as a currency string.
    pub fn monetary_display(&self, currency: &str) -> String {
        format_currency(self.avg_monetary, currency)
    }
}

/// Metrics for one evaluation stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorMetrics {
    /// Rows read.
    pub rows_in: u64,
    /// Rows produced.
    pub rows_out: u64,
    /// Wall time.
    pub exec_time: Duration,
}

impl OperatorMetrics {
    /// Create empty metrics.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rows_in: 0,
            rows_out: 0,
            exec_time: Duration::ZERO,
        }
    }

    /// Add to the input row count.
    pub fn add_rows_in(&mut self, count: usize) {
        self.rows_in += count as u64;
    }

    /// Add to the output row count.
    pub fn add_rows_out(&mut self, count: usize) {
        self.rows_out += count as u64;
    }

    /// Add execution time.
    pub fn add_time(&mut self, duration: Duration) {
        self.exec_time += duration;
    }
}

impl fmt::Display for OperatorMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows_in={}, rows_out={}, time={:?}",
            self.rows_in, self.rows_out, self.exec_time
        )
    }
}

/// Stage metrics of one refresh, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSink {
    entries: Vec<(String, OperatorMetrics)>,
}

impl MetricsSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record metrics for a stage, replacing an earlier entry of the same name.
    pub fn record(&mut self, stage: &str, metrics: OperatorMetrics) {
        match self.entries.iter_mut().find(|(name, _)| name == stage) {
            Some((_, existing)) => *existing = metrics,
            None => self.entries.push((stage.to_string(), metrics)),
        }
    }

    /// Metrics for a stage.
    pub fn get(&self, stage: &str) -> Option<&OperatorMetrics> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, m)| m)
    }

    /// All entries in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OperatorMetrics)> {
        self.entries.iter().map(|(name, m)| (name.as_str(), m))
    }

    /// Number of recorded stages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no stage has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wall time across all stages.
    pub fn total_time(&self) -> Duration {
        self.entries.iter().map(|(_, m)| m.exec_time).sum()
    }

    /// One line per stage.
    pub fn format_analyze(&self) -> String {
        let mut output = String::new();
        for (stage, m) in &self.entries {
            let _ = writeln!(output, "{stage}: {m}");
        }
        if output.is_empty() {
            output.push_str("No metrics collected.\n");
        }
        output
    }
}

/// Wall-clock timer for a stage.
#[derive(Debug)]
pub struct ExecutionTimer {
    start: Instant,
}

impl ExecutionTimer {
    /// Start timing.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop and return the elapsed time.
    #[must_use]
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for ExecutionTimer {
    fn default() -> Self {
        Self::start()
    }
}
