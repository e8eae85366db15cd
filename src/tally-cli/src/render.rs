//! Text rendering of Arrow batches and report sections.

use arrow::record_batch::RecordBatch;
use arrow_array::cast::AsArray;
use arrow_array::{Array, ArrayRef};
use arrow_schema::DataType;

use common_display::{Align, TextTable, truncate_string};

/// Placeholder for a missing category or state.
pub const UNKNOWN: &str = "(unknown)";

const MAX_CELL: usize = 32;

/// Render a batch as a text table; numeric columns are right aligned.
///
/// Only the first `max_rows` rows are included.
pub fn format_batch(batch: &RecordBatch, max_rows: usize) -> TextTable {
    let schema = batch.schema();
    let mut table = TextTable::new(schema.fields().iter().map(|f| f.name().as_str()));
    for (i, field) in schema.fields().iter().enumerate() {
        if field.data_type().is_numeric() {
            table = table.align(i, Align::Right);
        }
    }

    for row in 0..batch.num_rows().min(max_rows) {
        table.push_row(
            batch
                .columns()
                .iter()
                .map(|col| truncate_string(&format_value(col, row), MAX_CELL)),
        );
    }
    table
}

/// Format one Arrow value for display.
pub fn format_value(array: &ArrayRef, row: usize) -> String {
    if array.is_null(row) {
        return UNKNOWN.to_string();
    }

    match array.data_type() {
        DataType::Boolean => array.as_boolean().value(row).to_string(),
        DataType::Int32 => array
            .as_primitive::<arrow_array::types::Int32Type>()
            .value(row)
            .to_string(),
        DataType::Int64 => array
            .as_primitive::<arrow_array::types::Int64Type>()
            .value(row)
            .to_string(),
        DataType::UInt32 => array
            .as_primitive::<arrow_array::types::UInt32Type>()
            .value(row)
            .to_string(),
        DataType::UInt64 => array
            .as_primitive::<arrow_array::types::UInt64Type>()
            .value(row)
            .to_string(),
        DataType::Float64 => {
            let value = array
                .as_primitive::<arrow_array::types::Float64Type>()
                .value(row);
            format!("{value:.2}")
        }
        DataType::Utf8 => array.as_string::<i32>().value(row).to_string(),
        other => format!("{other:?}"),
    }
}

/// A titled report section.
pub fn section(title: &str, body: &str) -> String {
    let rule = "=".repeat(60);
    format!("\n{rule}\n  {title}\n{rule}\n{body}")
}
