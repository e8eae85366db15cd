//! Typed order-line records.

use chrono::NaiveDateTime;
use serde::Deserialize;

use common_error::{TallyError, TallyResult};

use crate::time::parse_timestamp;

/// One line item of one order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// Order identifier.
    pub order_id: String,
    /// Customer identifier.
    pub customer_id: String,
    /// Purchase instant.
    pub purchase_ts: NaiveDateTime,
    /// Delivery instant, if delivered.
    pub delivered_ts: Option<NaiveDateTime>,
    /// Line price.
    pub price: f64,
    /// English category label.
    pub category: Option<String>,
    /// Item sequence number within the order.
    pub order_item_id: i64,
    /// Customer region.
    pub customer_state: Option<String>,
}

/// A CSV row before type normalization. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct RawOrderLine {
    order_id: String,
    customer_id: String,
    order_purchase_timestamp: String,
    order_delivered_customer_date: Option<String>,
    price: String,
    product_category_name_english: Option<String>,
    order_item_id: String,
    customer_state: Option<String>,
}

impl RawOrderLine {
    /// Normalize into an [`OrderLine`]; `line` is used for error context.
    pub(crate) fn into_order_line(self, line: u64) -> TallyResult<OrderLine> {
        let order_id = required(self.order_id, "order_id", line)?;
        let customer_id = required(self.customer_id, "customer_id", line)?;

        let purchase_ts = parse_timestamp(&self.order_purchase_timestamp).ok_or_else(|| {
            TallyError::parse(
                line,
                format!(
                    "invalid order_purchase_timestamp '{}'",
                    self.order_purchase_timestamp
                ),
            )
        })?;

        let delivered_ts = match non_blank(self.order_delivered_customer_date) {
            Some(raw) => Some(parse_timestamp(&raw).ok_or_else(|| {
                TallyError::parse(
                    line,
                    format!("invalid order_delivered_customer_date '{raw}'"),
                )
            })?),
            None => None,
        };

        let price: f64 = self
            .price
            .trim()
            .parse()
            .map_err(|_| TallyError::parse(line, format!("invalid price '{}'", self.price)))?;
        if !price.is_finite() || price < 0.0 {
            return Err(TallyError::parse(
                line,
                format!("price must be a non-negative number, got {price}"),
            ));
        }

        let order_item_id = parse_count(&self.order_item_id).ok_or_else(|| {
            TallyError::parse(
                line,
                format!("invalid order_item_id '{}'", self.order_item_id),
            )
        })?;

        Ok(OrderLine {
            order_id,
            customer_id,
            purchase_ts,
            delivered_ts,
            price,
            category: non_blank(self.product_category_name_english),
            order_item_id,
            customer_state: non_blank(self.customer_state),
        })
    }
}

fn required(value: String, column: &str, line: u64) -> TallyResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TallyError::parse(line, format!("{column} is empty")));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Integer counts sometimes arrive float-formatted (`"1.0"`) from the export.
///
/// Floats outside the `i64` range are rejected rather than saturated.
fn parse_count(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    let float: f64 = value.parse().ok()?;
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.is_finite() && float.fract() == 0.0 && in_range).then_some(float as i64)
}
