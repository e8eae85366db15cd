//! CSV loading into the row store.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use common_error::{TallyError, TallyResult};

use crate::record::{OrderLine, RawOrderLine};
use crate::schema::missing_column;
use crate::table::OrderTable;

/// Reads the cleaned order export.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    /// Create a loader for comma-separated input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter.
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Load a file. A missing or malformed file is an error.
    pub fn load_path<P: AsRef<Path>>(&self, path: P) -> TallyResult<OrderTable> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TallyError::load(format!("cannot open {}: {e}", path.display()))
        })?;
        let table = self.load_reader(file).map_err(|e| match e {
            TallyError::CsvError(err) => {
                TallyError::load(format!("{}: {err}", path.display()))
            }
            other => other,
        })?;
        info!(
            path = %path.display(),
            rows = table.num_rows(),
            "loaded order lines"
        );
        Ok(table)
    }

    /// Load from any reader with a header row.
    pub fn load_reader<R: Read>(&self, reader: R) -> TallyResult<OrderTable> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let names: Vec<&str> = headers.iter().collect();
        if let Some(column) = missing_column(names.iter().copied()) {
            return Err(TallyError::column_not_found(column));
        }

        let mut records: Vec<OrderLine> = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let raw: RawOrderLine = record.deserialize(Some(&headers)).map_err(|e| {
                TallyError::parse(line, format!("malformed row: {e}"))
            })?;
            records.push(raw.into_order_line(line)?);
        }
        debug!(rows = records.len(), "parsed order lines");

        OrderTable::from_records(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "order_id,customer_id,order_purchase_timestamp,order_delivered_customer_date,price,product_category_name_english,order_item_id,customer_state";

    #[test]
    fn test_load_reader() {
        let data = format!(
            "{HEADER}\n\
             o2,c2,2018-01-10 09:00:00,,15.5,toys,1,RJ\n\
             o1,c1,2017-12-24 18:30:00,2018-01-02 10:00:00,99.9,housewares,1,SP\n"
        );
        let table = CsvLoader::new().load_reader(data.as_bytes()).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.row(0).unwrap().order_id, "o1");
        assert_eq!(table.row(1).unwrap().delivered_ts, None);
    }

    #[test]
    fn test_extra_columns_ignored() {
        let data = format!(
            "index,{HEADER},seller_id\n0,o1,c1,2017-12-24 18:30:00,,10,toys,1,SP,s1\n"
        );
        let table = CsvLoader::new().load_reader(data.as_bytes()).unwrap();
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_missing_column() {
        let data = "order_id,customer_id\no1,c1\n";
        let err = CsvLoader::new().load_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TallyError::ColumnNotFound(_)));
    }

    #[test]
    fn test_bad_timestamp_reports_line() {
        let data = format!(
            "{HEADER}\n\
             o1,c1,2017-12-24 18:30:00,,10,toys,1,SP\n\
             o2,c2,yesterday,,10,toys,1,SP\n"
        );
        let err = CsvLoader::new().load_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TallyError::ParseError { line: 3, .. }));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let data = format!(
            "{}\no1;c1;2017-12-24 18:30:00;;10;toys;1;SP\n",
            HEADER.replace(',', ";")
        );
        let table = CsvLoader::new()
            .with_delimiter(b';')
            .load_reader(data.as_bytes())
            .unwrap();
        assert_eq!(table.num_rows(), 1);
    }

    #[test]
    fn test_header_only_is_empty_table() {
        let data = format!("{HEADER}\n");
        let table = CsvLoader::new().load_reader(data.as_bytes()).unwrap();
        assert!(table.is_empty());
    }
}
