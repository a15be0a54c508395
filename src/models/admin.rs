//! Read-only views for the clinic administration: dashboard totals and
//! filtered listings over the recorded tables.
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use failure::Error as FailureError;
use percent_encoding::percent_decode;
use serde_json::Value;

use errors::Error;
use models::payment::{format_amount, parse_amount};
use models::row::{cell, Row, DATE_FORMAT, TIMESTAMP_FORMAT};

pub const RECENT_ACTIVITY_LIMIT: usize = 10;

const UNKNOWN: &str = "Unknown";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Activity {
    pub date: String,
    pub user: String,
    pub activity: String,
    pub details: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct DashboardMetrics {
    pub total_bookings: usize,
    pub total_payments: usize,
    pub total_subscriptions: usize,
    pub total_revenue: f64,
    pub active_subscriptions: usize,
    pub active_coupons: usize,
    pub emergency_bookings: usize,
    pub revenue_by_country: BTreeMap<String, f64>,
    pub bookings_by_doctor: BTreeMap<String, usize>,
    pub recent_activity: Vec<Activity>,
}

impl DashboardMetrics {
    pub fn new(bookings: &[Row], payments: &[Row], subscriptions: &[Row], active_coupons: usize, today: NaiveDate) -> Self {
        let mut metrics = DashboardMetrics {
            total_bookings: bookings.len(),
            total_payments: payments.len(),
            total_subscriptions: subscriptions.len(),
            active_coupons,
            ..Default::default()
        };

        for booking in bookings {
            let doctor = cell(booking, "doctor_type").unwrap_or(UNKNOWN);
            *metrics.bookings_by_doctor.entry(doctor.to_string()).or_insert(0) += 1;
            if is_flag_set(booking, "emergency") {
                metrics.emergency_bookings += 1;
            }
        }

        for payment in payments {
            let amount = row_amount(payment);
            let country = cell(payment, "country").unwrap_or(UNKNOWN);
            metrics.total_revenue += amount;
            *metrics.revenue_by_country.entry(country.to_string()).or_insert(0.0) += amount;
            metrics.recent_activity.push(Activity {
                date: cell(payment, "timestamp").unwrap_or("").to_string(),
                user: cell(payment, "name").unwrap_or(UNKNOWN).to_string(),
                activity: format!("Booked {}", cell(payment, "doctor_type").unwrap_or(UNKNOWN)),
                details: format!("Amount: {}", format_amount(amount)),
            });
        }

        metrics.active_subscriptions = subscriptions
            .iter()
            .filter_map(|subscription| cell(subscription, "expiry_date"))
            .filter_map(|expiry| NaiveDate::parse_from_str(expiry, DATE_FORMAT).ok())
            .filter(|expiry| *expiry > today)
            .count();

        // timestamps are zero padded, so text order is time order
        metrics.recent_activity.sort_by(|a, b| b.date.cmp(&a.date));
        metrics.recent_activity.truncate(RECENT_ACTIVITY_LIMIT);
        metrics
    }
}

fn is_flag_set(row: &Row, column: &str) -> bool {
    cell(row, column).map_or(false, |flag| flag.eq_ignore_ascii_case("true"))
}

fn row_amount(row: &Row) -> f64 {
    match cell(row, "amount") {
        Some(raw) => parse_amount(&Value::String(raw.to_string())).unwrap_or_else(|e| {
            warn!("Payment {:?} has an unreadable amount: {}", row.get("id"), e);
            0.0
        }),
        None => 0.0,
    }
}

/// Date range of `GET /api/admin/payments`, both ends inclusive
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PaymentsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl PaymentsQuery {
    /// Reads `start_date` and `end_date` (`YYYY-MM-DD`) from a query string.
    pub fn from_query(query: Option<&str>) -> Result<Self, FailureError> {
        let mut parsed = PaymentsQuery::default();
        for pair in query.unwrap_or("").split('&').filter(|pair| !pair.is_empty()) {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next().unwrap_or("");
            let raw = percent_decode(parts.next().unwrap_or("").as_bytes()).decode_utf8_lossy();
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            let date = || {
                NaiveDate::parse_from_str(value, DATE_FORMAT)
                    .map_err(|_| FailureError::from(Error::MalformedInput(format!("Invalid {}: {}", key, value))))
            };
            match key {
                "start_date" => parsed.start_date = Some(date()?),
                "end_date" => parsed.end_date = Some(date()?),
                _ => (),
            }
        }
        Ok(parsed)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }

    /// Rows without a readable timestamp only pass an unbounded query.
    pub fn matches(&self, row: &Row) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let paid_on = match cell(row, "timestamp").and_then(|value| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()) {
            Some(at) => at.date(),
            None => return false,
        };
        self.start_date.map_or(true, |start| paid_on >= start) && self.end_date.map_or(true, |end| paid_on <= end)
    }
}
