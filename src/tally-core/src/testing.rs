//! Testing utilities and fixtures for tally crates.
//!
//! [`OrderFixture`] builds small row stores from readable literals so tests
//! in this crate and downstream crates do not hand-assemble Arrow arrays.

use crate::record::OrderLine;
use crate::table::OrderTable;
use crate::time::parse_timestamp;

/// Builder for order-line tables.
#[derive(Debug, Clone, Default)]
pub struct OrderFixture {
    lines: Vec<OrderLine>,
}

impl OrderFixture {
    /// Create an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a line with default category (`"toys"`), state (`"SP"`) and item id 1.
    ///
    /// # Panics
    ///
    /// Panics if `purchase_ts` is not a valid timestamp literal.
    pub fn line(self, order_id: &str, customer_id: &str, purchase_ts: &str, price: f64) -> Self {
        self.line_with(order_id, customer_id, purchase_ts, price, |_| {})
    }

    /// Add a line and adjust it with `edit`.
    ///
    /// # Panics
    ///
    /// Panics if `purchase_ts` is not a valid timestamp literal.
    pub fn line_with<F>(
        mut self,
        order_id: &str,
        customer_id: &str,
        purchase_ts: &str,
        price: f64,
        edit: F,
    ) -> Self
    where
        F: FnOnce(&mut OrderLine),
    {
        let purchase_ts = parse_timestamp(purchase_ts)
            .unwrap_or_else(|| panic!("invalid fixture timestamp '{purchase_ts}'"));
        let mut line = OrderLine {
            order_id: order_id.to_string(),
            customer_id: customer_id.to_string(),
            purchase_ts,
            delivered_ts: None,
            price,
            category: Some("toys".to_string()),
            order_item_id: 1,
            customer_state: Some("SP".to_string()),
        };
        edit(&mut line);
        self.lines.push(line);
        self
    }

    /// Build the row store.
    ///
    /// # Panics
    ///
    /// Panics if the Arrow batch cannot be assembled.
    pub fn build(&self) -> OrderTable {
        OrderTable::from_records(&self.lines).expect("fixture lines form a valid table")
    }

    /// Three orders: customer A in May (10) and July (20), customer B in July (5).
    pub fn two_customers() -> Self {
        Self::new()
            .line("a-1", "A", "2018-05-14 09:00:00", 10.0)
            .line("a-2", "A", "2018-07-02 12:30:00", 20.0)
            .line("b-1", "B", "2018-07-28 17:45:00", 5.0)
    }

    /// A small store spanning three months, four categories and three states.
    pub fn small_store() -> Self {
        Self::new()
            .line_with("o-01", "c-01", "2017-11-03 10:15:00", 120.0, |l| {
                l.category = Some("bed_bath_table".to_string());
            })
            .line_with("o-01", "c-01", "2017-11-03 10:15:00", 35.5, |l| {
                l.category = Some("bed_bath_table".to_string());
                l.order_item_id = 2;
            })
            .line_with("o-02", "c-02", "2017-11-20 21:40:00", 59.9, |l| {
                l.category = Some("health_beauty".to_string());
                l.customer_state = Some("RJ".to_string());
            })
            .line_with("o-03", "c-03", "2017-12-01 08:00:00", 15.0, |l| {
                l.category = Some("toys".to_string());
                l.customer_state = Some("MG".to_string());
            })
            .line_with("o-04", "c-01", "2018-01-15 14:22:00", 89.0, |l| {
                l.category = Some("health_beauty".to_string());
            })
            .line_with("o-05", "c-04", "2018-01-30 19:05:00", 250.0, |l| {
                l.category = Some("watches_gifts".to_string());
                l.customer_state = Some("RJ".to_string());
            })
            .line_with("o-05", "c-04", "2018-01-30 19:05:00", 250.0, |l| {
                l.category = Some("watches_gifts".to_string());
                l.customer_state = Some("RJ".to_string());
                l.order_item_id = 2;
            })
    }
}
