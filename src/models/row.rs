//! Rows are the unit of exchange with the durable store: a mapping from
//! column header to cell text.
use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime};

pub type Row = BTreeMap<String, String>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Models that can be stored as a row of the durable store
pub trait ToRow {
    fn to_row(&self) -> Row;
}

/// Builds a row from `(column, value)` pairs.
pub fn row_from<I, K, V>(cells: I) -> Row
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    cells.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

/// Returns a non-blank trimmed cell value.
pub fn cell<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).map(|value| value.trim()).filter(|value| !value.is_empty())
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Boolean cells are written by the spreadsheet as `TRUE`/`FALSE`.
pub fn format_flag(flag: bool) -> String {
    if flag { "TRUE".to_string() } else { "FALSE".to_string() }
}

/// Local wall-clock time, the clock the spreadsheet rows are written in.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Record identifiers like `BK-20240101093000`.
pub fn record_id(prefix: &str, at: NaiveDateTime) -> String {
    format!("{}-{}", prefix, at.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cells_are_missing() {
        let row = row_from(vec![("coupon_code", "  "), ("phone_number", " 0712345678 ")]);
        assert_eq!(cell(&row, "coupon_code"), None);
        assert_eq!(cell(&row, "phone_number"), Some("0712345678"));
        assert_eq!(cell(&row, "absent"), None);
    }

    #[test]
    fn record_ids_carry_the_timestamp() {
        let at = NaiveDate::from_ymd(2024, 3, 1).and_hms(9, 30, 0);
        assert_eq!(record_id("BK", at), "BK-20240301093000");
        assert_eq!(format_timestamp(at), "2024-03-01 09:30:00");
    }
}
