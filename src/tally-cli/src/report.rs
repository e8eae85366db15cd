//! Report sections built from a dashboard view.

use std::fmt::Write;

use common_config::ReportConfig;
use common_display::{Align, TextTable, format_currency, group_thousands, indent};
use common_error::TallyResult;
use tally_engine::{Dashboard, DashboardView, RfmRow};

use crate::render::{UNKNOWN, format_batch, section};

/// Headline metrics of the view.
pub fn metrics_section(view: &DashboardView, config: &ReportConfig) -> String {
    let m = &view.metrics;
    let mut body = String::new();
    let _ = writeln!(body, "View:                    {}", view.params);
    let _ = writeln!(body, "Total orders:            {}", group_thousands(m.total_orders));
    let _ = writeln!(body, "Total revenue:           {}", m.revenue_display(&config.currency));
    let _ = writeln!(body, "Average recency (month): {}", m.avg_recency);
    let _ = writeln!(body, "Average frequency:       {}", m.avg_frequency);
    let _ = writeln!(body, "Average monetary:        {}", m.monetary_display(&config.currency));
    section("Summary", &body)
}

/// Monthly order count and revenue.
pub fn monthly_section(view: &DashboardView) -> TallyResult<String> {
    let batch = view.monthly.to_record_batch()?;
    let table = format_batch(&batch, batch.num_rows());
    Ok(section("Monthly Orders", &table.to_string()))
}

/// Best and worst performing categories.
pub fn products_section(view: &DashboardView, config: &ReportConfig) -> TallyResult<String> {
    let n = config.top_n;
    let best = category_table(view.categories.best(n));
    let worst = category_table(&view.categories.worst(n)?);
    let body = format!("Best performing\n{best}\nWorst performing\n{worst}");
    Ok(section("Best & Worst Performing Product", &body))
}

fn category_table(rows: &[tally_engine::CategoryRow]) -> TextTable {
    let mut table = TextTable::new(["category", "sales"]).align(1, Align::Right);
    for row in rows {
        table.push_row([
            row.category.as_deref().unwrap_or(UNKNOWN).to_string(),
            row.items_sold.to_string(),
        ]);
    }
    table
}

/// Customers per state, top states plus the remainder.
pub fn states_section(view: &DashboardView, config: &ReportConfig) -> String {
    let mut table = TextTable::new(["customer_state", "customer_count"]).align(1, Align::Right);
    for row in view.states.top_with_other(config.top_n, &config.other_label) {
        table.push_row([
            row.state.unwrap_or_else(|| UNKNOWN.to_string()),
            group_thousands(row.customer_count),
        ]);
    }
    section(
        &format!("Customers by State (top {} and other)", config.top_n),
        &table.to_string(),
    )
}

/// Best customers by each RFM parameter, over the whole store.
pub fn rfm_section(view: &DashboardView, config: &ReportConfig) -> TallyResult<String> {
    let n = config.top_n;
    let rfm = &view.rfm;
    let mut body = String::new();
    if let Some(month) = rfm.reference_month() {
        let _ = writeln!(body, "Reference month: {month}\n");
    }

    let by_recency = rfm_table(&rfm.top_by_recency(n)?, config, "recency", |r| {
        r.recency.to_string()
    });
    let by_frequency = rfm_table(&rfm.top_by_frequency(n)?, config, "frequency", |r| {
        r.frequency.to_string()
    });
    let by_monetary = rfm_table(&rfm.top_by_monetary(n)?, config, "monetary", |r| {
        format_currency(r.monetary, &config.currency)
    });
    let _ = write!(
        body,
        "By recency (month)\n{by_recency}\nBy frequency\n{by_frequency}\nBy monetary\n{by_monetary}"
    );
    Ok(section("Best Customer Based on RFM Parameters", &body))
}

fn rfm_table<F>(rows: &[RfmRow], config: &ReportConfig, metric: &str, value: F) -> TextTable
where
    F: Fn(&RfmRow) -> String,
{
    let mut table = TextTable::new(["short_customer_id", metric]).align(1, Align::Right);
    for row in rows {
        table.push_row([row.short_customer_id(config.short_id_len), value(row)]);
    }
    table
}

/// Store overview: size, purchase range and filterable categories.
pub fn info_section(dashboard: &Dashboard) -> TallyResult<String> {
    let mut body = String::new();
    let _ = writeln!(body, "Order lines: {}", group_thousands(dashboard.table().num_rows() as u64));
    match dashboard.date_bounds()? {
        Some((first, last)) => {
            let _ = writeln!(body, "Purchases:   {first} to {last}");
        }
        None => {
            let _ = writeln!(body, "Purchases:   none");
        }
    }
    let categories = dashboard.categories()?;
    let _ = writeln!(body, "Categories ({}):", categories.len());
    if !categories.is_empty() {
        let _ = writeln!(body, "{}", indent(&categories.join("\n"), "  "));
    }
    Ok(section("Store", &body))
}

/// Every section in dashboard order.
pub fn full_report(view: &DashboardView, config: &ReportConfig) -> TallyResult<String> {
    Ok([
        metrics_section(view, config),
        monthly_section(view)?,
        products_section(view, config)?,
        states_section(view, config),
        rfm_section(view, config)?,
    ]
    .concat())
}
