//! Column layout of the order-line row store.

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};

use common_error::{TallyError, TallyResult};

/// Order identifier; several lines may share it.
pub const ORDER_ID: &str = "order_id";
/// Customer identifier.
pub const CUSTOMER_ID: &str = "customer_id";
/// Purchase instant, the store's sort key.
pub const PURCHASE_TS: &str = "order_purchase_timestamp";
/// Delivery instant, absent for undelivered orders.
pub const DELIVERED_TS: &str = "order_delivered_customer_date";
/// Line price.
pub const PRICE: &str = "price";
/// English product category label.
pub const CATEGORY: &str = "product_category_name_english";
/// Item sequence number within the order, summed as a sales count.
pub const ORDER_ITEM_ID: &str = "order_item_id";
/// Customer region.
pub const CUSTOMER_STATE: &str = "customer_state";

/// Columns that must be present in the input file, in store order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    ORDER_ID,
    CUSTOMER_ID,
    PURCHASE_TS,
    DELIVERED_TS,
    PRICE,
    CATEGORY,
    ORDER_ITEM_ID,
    CUSTOMER_STATE,
];

static ORDER_LINE_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    let ts = DataType::Timestamp(TimeUnit::Millisecond, None);
    Arc::new(Schema::new(vec![
        Field::new(ORDER_ID, DataType::Utf8, false),
        Field::new(CUSTOMER_ID, DataType::Utf8, false),
        Field::new(PURCHASE_TS, ts.clone(), false),
        Field::new(DELIVERED_TS, ts, true),
        Field::new(PRICE, DataType::Float64, false),
        Field::new(CATEGORY, DataType::Utf8, true),
        Field::new(ORDER_ITEM_ID, DataType::Int64, false),
        Field::new(CUSTOMER_STATE, DataType::Utf8, true),
    ]))
});

/// The Arrow schema of the row store.
pub fn order_line_schema() -> SchemaRef {
    Arc::clone(&ORDER_LINE_SCHEMA)
}

/// Verify that `schema` matches the row store layout.
pub fn validate_schema(schema: &Schema) -> TallyResult<()> {
    let expected = order_line_schema();
    for field in expected.fields() {
        let actual = schema
            .field_with_name(field.name())
            .map_err(|_| TallyError::column_not_found(field.name().as_str()))?;
        if actual.data_type() != field.data_type() {
            return Err(TallyError::type_error(format!(
                "column '{}' has type {}, expected {}",
                field.name(),
                actual.data_type(),
                field.data_type()
            )));
        }
    }
    if schema.fields().len() != expected.fields().len() {
        return Err(TallyError::schema_error(format!(
            "expected {} columns, got {}",
            expected.fields().len(),
            schema.fields().len()
        )));
    }
    Ok(())
}

/// Find the first required column missing from a header row.
pub fn missing_column<'a, I>(headers: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str> + Clone,
{
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|required| !headers.clone().into_iter().any(|h| h.trim() == *required))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_layout() {
        let schema = order_line_schema();
        assert_eq!(schema.fields().len(), REQUIRED_COLUMNS.len());
        for (field, name) in schema.fields().iter().zip(REQUIRED_COLUMNS) {
            assert_eq!(field.name(), name);
        }
        assert!(!schema.field_with_name(PURCHASE_TS).unwrap().is_nullable());
        assert!(schema.field_with_name(CATEGORY).unwrap().is_nullable());
        assert!(validate_schema(&schema).is_ok());
    }

    #[test]
    fn test_validate_schema_rejects_wrong_type() {
        let schema = Schema::new(
            order_line_schema()
                .fields()
                .iter()
                .map(|f| {
                    if f.name() == PRICE {
                        Field::new(PRICE, DataType::Utf8, false)
                    } else {
                        f.as_ref().clone()
                    }
                })
                .collect::<Vec<_>>(),
        );
        assert!(matches!(
            validate_schema(&schema),
            Err(TallyError::TypeError(_))
        ));
    }

    #[test]
    fn test_missing_column() {
        let mut headers: Vec<&str> = REQUIRED_COLUMNS.to_vec();
        headers.push("seller_id");
        assert_eq!(missing_column(headers.iter().copied()), None);

        headers.retain(|h| *h != CUSTOMER_STATE);
        assert_eq!(missing_column(headers.iter().copied()), Some(CUSTOMER_STATE));
    }
}
