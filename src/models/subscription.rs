//! Care package subscriptions. Every subscription comes with a coupon.
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde_json::Value;

use models::coupons::VALIDITY_DAYS;
use models::payment::format_amount;
use models::row::{format_date, format_timestamp, record_id, Row, ToRow};

pub const SUBSCRIPTION_ID_PREFIX: &str = "SUB";

fn unknown() -> String {
    "Unknown".to_string()
}

fn zero() -> Value {
    Value::from(0)
}

/// Payload of `POST /api/subscriptions`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewSubscription {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "unknown")]
    pub package: String,
    #[serde(default = "zero")]
    pub amount: Value,
    #[serde(default = "unknown")]
    pub payment_method: String,
    /// Calls included in the package, the configured default when absent
    #[serde(default)]
    pub call_limit: Option<u32>,
    #[serde(default)]
    pub doctor_type: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub package: String,
    pub amount: f64,
    pub payment_method: String,
    pub coupon_code: String,
    pub start_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl Subscription {
    /// `id` is the subscription id or, for checkouts, the payment id it was paid with.
    pub fn new(id: String, payload: &NewSubscription, amount: f64, coupon_code: String, now: NaiveDateTime) -> Self {
        let start_date = now.date();
        Subscription {
            id,
            name: payload.name.clone(),
            phone: payload.phone.clone(),
            package: payload.package.clone(),
            amount,
            payment_method: payload.payment_method.clone(),
            coupon_code,
            start_date,
            expiry_date: start_date + Duration::days(VALIDITY_DAYS),
            created_at: now,
        }
    }

    pub fn new_id(now: NaiveDateTime) -> String {
        record_id(SUBSCRIPTION_ID_PREFIX, now)
    }
}

impl ToRow for Subscription {
    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), self.id.clone());
        row.insert("name".to_string(), self.name.clone());
        row.insert("phone".to_string(), self.phone.clone());
        row.insert("package".to_string(), self.package.clone());
        row.insert("amount".to_string(), format_amount(self.amount));
        row.insert("payment_method".to_string(), self.payment_method.clone());
        row.insert("coupon".to_string(), self.coupon_code.clone());
        row.insert("start_date".to_string(), format_date(self.start_date));
        row.insert("expiry_date".to_string(), format_date(self.expiry_date));
        row.insert("timestamp".to_string(), format_timestamp(self.created_at));
        row
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SubscriptionCreated {
    pub success: bool,
    pub subscription_id: String,
    pub coupon_code: String,
    pub expiry_date: NaiveDate,
    pub message: String,
}

impl<'a> From<&'a Subscription> for SubscriptionCreated {
    fn from(subscription: &'a Subscription) -> Self {
        SubscriptionCreated {
            success: true,
            subscription_id: subscription.id.clone(),
            coupon_code: subscription.coupon_code.clone(),
            expiry_date: subscription.expiry_date,
            message: "Subscription created successfully".to_string(),
        }
    }
}
