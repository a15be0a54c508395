//! Model coupons
use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use failure::Error as FailureError;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use models::phone::normalize_phone;
use models::row::{cell, format_date, format_flag, format_timestamp, Row, ToRow, DATE_FORMAT, TIMESTAMP_FORMAT};
use models::validation_rules::*;

/// Symbols used in generated codes: `A-Z` and `0-9` without the look-alikes `O`, `0`, `I`, `1`.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 8;
/// Coupons can be redeemed for this many days after purchase
pub const VALIDITY_DAYS: i64 = 30;

pub const STATUS_ACTIVE: &str = "Active";
pub const STATUS_INACTIVE: &str = "Inactive";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CouponId(pub Uuid);

impl CouponId {
    pub fn new() -> Self {
        CouponId(Uuid::new_v4())
    }
}

impl fmt::Display for CouponId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CouponCode(pub String);

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Codes typed by users are matched case-insensitively.
impl<'a> From<&'a str> for CouponCode {
    fn from(code: &'a str) -> Self {
        CouponCode(code.trim().to_uppercase())
    }
}

/// Redeemable entitlement bought together with a care package
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Coupon {
    pub id: CouponId,
    pub code: CouponCode,
    /// normalized, see `models::phone`
    pub owner_phone: String,
    pub package_type: String,
    pub doctor_type: String,
    pub call_limit: u32,
    pub calls_used: u32,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDate,
    pub is_active: bool,
}

impl Coupon {
    pub fn new(code: CouponCode, payload: &NewCoupon, now: NaiveDateTime) -> Self {
        Coupon {
            id: CouponId::new(),
            code,
            owner_phone: normalize_phone(&payload.phone_number),
            package_type: payload.package_type.clone(),
            doctor_type: payload.doctor_type.clone(),
            call_limit: payload.call_limit,
            calls_used: 0,
            created_at: now,
            expires_at: (now + Duration::days(VALIDITY_DAYS)).date(),
            is_active: true,
        }
    }

    pub fn calls_remaining(&self) -> u32 {
        self.call_limit.saturating_sub(self.calls_used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.calls_used >= self.call_limit
    }

    /// A coupon stops being valid once the expiry date begins.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        now > self.expires_at.and_hms(0, 0, 0)
    }

    /// Counts one redemption. Deactivation happens on the call that reaches the limit.
    pub fn record_use(&mut self) {
        if self.calls_used < self.call_limit {
            self.calls_used += 1;
        }
        if self.is_exhausted() {
            self.is_active = false;
        }
    }

    pub fn status(&self) -> &'static str {
        if self.is_active {
            STATUS_ACTIVE
        } else {
            STATUS_INACTIVE
        }
    }

    /// Columns of a durable row owned by the coupon
    pub fn usage_cells(&self) -> Row {
        let mut row = Row::new();
        row.insert("calls_used".to_string(), self.calls_used.to_string());
        row.insert("status".to_string(), self.status().to_string());
        row
    }

    /// Reads a coupon from a durable row.
    ///
    /// Returns `Ok(None)` for rows that carry no coupon (other entries of a shared
    /// transaction log). Rows without an id get a fresh one.
    pub fn from_row(row: &Row, now: NaiveDateTime) -> Result<Option<Coupon>, FailureError> {
        let code = match cell(row, "coupon_code") {
            Some(code) => CouponCode::from(code),
            None => return Ok(None),
        };

        // informational, a timestamp written in another format must not hide the coupon
        let created_at = cell(row, "timestamp").or_else(|| cell(row, "created_at")).and_then(|value| {
            NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
                .map_err(|e| warn!("Unreadable timestamp {:?} for coupon {}: {}", value, code, e))
                .ok()
        });

        let expires_at = match cell(row, "expires_at") {
            Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
                .map_err(|e| format_err!("Invalid expiry date {:?} for coupon {}: {}", value, code, e))?,
            None => (created_at.unwrap_or(now) + Duration::days(VALIDITY_DAYS)).date(),
        };
        let created_at = created_at.unwrap_or(now);

        let call_limit = parse_count(row, "call_limit", &code)?;
        let calls_used = parse_count(row, "calls_used", &code)?;

        let id = cell(row, "id")
            .and_then(|id| Uuid::from_str(id).ok())
            .map(CouponId)
            .unwrap_or_else(CouponId::new);

        Ok(Some(Coupon {
            id,
            owner_phone: normalize_phone(cell(row, "phone_number").or_else(|| cell(row, "phone")).unwrap_or_default()),
            package_type: cell(row, "package_type").unwrap_or_default().to_string(),
            doctor_type: cell(row, "doctor_type").unwrap_or_default().to_string(),
            call_limit,
            calls_used,
            created_at,
            expires_at,
            is_active: cell(row, "status").map_or(false, |status| status.eq_ignore_ascii_case(STATUS_ACTIVE)),
            code,
        }))
    }
}

fn parse_count(row: &Row, column: &str, code: &CouponCode) -> Result<u32, FailureError> {
    match cell(row, column) {
        Some(value) => value
            .parse::<u32>()
            .map_err(|e| format_err!("Invalid {} {:?} for coupon {}: {}", column, value, code, e)),
        None => Ok(0),
    }
}

impl ToRow for Coupon {
    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), self.id.to_string());
        row.insert("name".to_string(), "Coupon".to_string());
        row.insert("phone_number".to_string(), self.owner_phone.clone());
        row.insert("payment_method".to_string(), "Subscription".to_string());
        row.insert("amount".to_string(), "0".to_string());
        row.insert("package_type".to_string(), self.package_type.clone());
        row.insert("doctor_type".to_string(), self.doctor_type.clone());
        row.insert("is_emergency".to_string(), format_flag(false));
        row.insert("country".to_string(), "Tanzania".to_string());
        row.insert("coupon_code".to_string(), self.code.to_string());
        row.insert("call_limit".to_string(), self.call_limit.to_string());
        row.insert("expires_at".to_string(), format_date(self.expires_at));
        row.insert("timestamp".to_string(), format_timestamp(self.created_at));
        row.extend(self.usage_cells());
        row
    }
}

/// Payload for creating coupon
#[derive(Serialize, Deserialize, Clone, Validate, Debug)]
pub struct NewCoupon {
    #[validate(custom = "validate_phone")]
    pub phone_number: String,
    #[validate(custom = "validate_not_blank")]
    pub package_type: String,
    #[validate(range(min = "1", max = "1000"))]
    pub call_limit: u32,
    #[validate(custom = "validate_not_blank")]
    pub doctor_type: String,
}

/// Payload for validating coupon. The code is kept loosely typed so that a
/// non-string code is reported as malformed input rather than a parse error.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ValidateCouponPayload {
    pub coupon_code: Option<Value>,
    pub phone_number: Option<String>,
}

/// Payload for redeeming coupon
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RedeemCouponPayload {
    pub coupon_code: Option<Value>,
}

/// Extracts a non-blank string coupon code from request payload
pub fn required_code(code: Option<&Value>) -> Option<CouponCode> {
    code.and_then(Value::as_str).map(CouponCode::from).filter(|code| !code.0.is_empty())
}
