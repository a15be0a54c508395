//! Payments, mobile-money checkout and gateway notifications
use std::fmt;

use chrono::NaiveDateTime;
use failure::Error as FailureError;
use serde_json::Value;

use errors::Error;
use models::phone::normalize_phone;
use models::row::{format_flag, format_timestamp, record_id, Row, ToRow};
use models::subscription::NewSubscription;

pub const PAYMENT_ID_PREFIX: &str = "PY";

/// Mobile money operators accepted by the payment gateway
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MobileMoneyProvider {
    Mpesa,
    Tigo,
    Airtel,
    Halopesa,
}

impl MobileMoneyProvider {
    /// Maps the many spellings clients send (`M-Pesa`, `tigo_pesa`, `Airtel Money`) to a provider.
    pub fn from_method(method: &str) -> Result<Self, FailureError> {
        let normalized: String = method
            .to_lowercase()
            .chars()
            .filter(|c| *c != ' ' && *c != '-' && *c != '_')
            .collect();

        match normalized.as_str() {
            "mpesa" | "mpesatz" | "mpesatanzania" | "vodacom" => Ok(MobileMoneyProvider::Mpesa),
            "tigo" | "tigopesa" | "tigomoney" | "mixx" | "mixxbyyas" => Ok(MobileMoneyProvider::Tigo),
            "airtel" | "airtelmoney" | "airteltanzania" | "airteltz" => Ok(MobileMoneyProvider::Airtel),
            "halo" | "halopesa" | "halopesatz" | "halotel" => Ok(MobileMoneyProvider::Halopesa),
            _ => Err(Error::MalformedInput(format!("Unsupported payment method: {}", method)).into()),
        }
    }
}

impl fmt::Display for MobileMoneyProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            MobileMoneyProvider::Mpesa => "Mpesa",
            MobileMoneyProvider::Tigo => "Tigo",
            MobileMoneyProvider::Airtel => "Airtel",
            MobileMoneyProvider::Halopesa => "Halopesa",
        };
        f.write_str(name)
    }
}

/// Parses an amount sent either as a JSON number or as text like `"15,000"` or `"12,5"`.
///
/// A lone comma followed by other than three digits is a decimal separator
/// (`"12,5"`), otherwise commas group thousands. All other characters except
/// digits and `.` are dropped.
pub fn parse_amount(raw: &Value) -> Result<f64, FailureError> {
    let text = match *raw {
        Value::Number(ref number) => {
            return number
                .as_f64()
                .ok_or_else(|| Error::MalformedInput(format!("Invalid amount format: {}", number)).into())
        }
        Value::String(ref text) => text.clone(),
        Value::Null => "0".to_string(),
        ref other => return Err(Error::MalformedInput(format!("Invalid amount format: {}", other)).into()),
    };

    let decimal_comma = !text.contains('.')
        && text.matches(',').count() == 1
        && text.rsplit(',').next().map_or(false, |fraction| fraction.trim().len() != 3);
    let text = if decimal_comma { text.replace(',', ".") } else { text };
    let sanitized: String = text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();

    sanitized
        .parse::<f64>()
        .map_err(|_| Error::MalformedInput(format!("Invalid amount format: {}", raw)).into())
}

/// Amounts are written without a fractional part when they have none.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{}", amount as i64)
    } else {
        format!("{}", amount)
    }
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn zero() -> Value {
    Value::from(0)
}

/// Payload of `POST /api/payments`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewPayment {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default = "unknown")]
    pub phone: String,
    #[serde(default = "unknown")]
    pub payment_method: String,
    #[serde(default = "zero")]
    pub amount: Value,
    #[serde(default = "unknown")]
    pub package_type: String,
    #[serde(default = "unknown")]
    pub doctor_type: String,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default = "unknown")]
    pub country: String,
}

/// Row of the payments table
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Payment {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub payment_method: String,
    pub amount: f64,
    pub package_type: String,
    pub doctor_type: String,
    pub emergency: bool,
    pub country: String,
    pub created_at: NaiveDateTime,
}

impl Payment {
    pub fn new(payload: NewPayment, amount: f64, now: NaiveDateTime) -> Self {
        Payment {
            id: record_id(PAYMENT_ID_PREFIX, now),
            name: payload.name,
            phone: payload.phone,
            payment_method: payload.payment_method,
            amount,
            package_type: payload.package_type,
            doctor_type: payload.doctor_type,
            emergency: payload.emergency,
            country: payload.country,
            created_at: now,
        }
    }
}

impl ToRow for Payment {
    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), self.id.clone());
        row.insert("name".to_string(), self.name.clone());
        row.insert("phone_number".to_string(), self.phone.clone());
        row.insert("payment_method".to_string(), self.payment_method.clone());
        row.insert("amount".to_string(), format_amount(self.amount));
        row.insert("package_type".to_string(), self.package_type.clone());
        row.insert("doctor_type".to_string(), self.doctor_type.clone());
        row.insert("is_emergency".to_string(), format_flag(self.emergency));
        row.insert("country".to_string(), self.country.clone());
        row.insert("timestamp".to_string(), format_timestamp(self.created_at));
        row
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaymentCreated {
    pub success: bool,
    pub payment_id: String,
    pub message: String,
}

/// Package bought together with a subscription checkout
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct CheckoutPackage {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub call_limit: Option<u32>,
}

/// Payload of `POST /api/payments/azampay/checkout`
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CheckoutPayload {
    #[serde(default = "unknown")]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default = "zero")]
    pub amount: Value,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default = "unknown")]
    pub package_type: String,
    #[serde(default)]
    pub doctor_type: Option<String>,
    #[serde(default)]
    pub emergency: bool,
    #[serde(default = "unknown")]
    pub country: String,
    #[serde(default)]
    pub package: Option<CheckoutPackage>,
}

impl CheckoutPayload {
    pub fn is_subscription(&self) -> bool {
        self.package_type.eq_ignore_ascii_case("subscription")
    }

    /// The payment row recorded once the gateway accepts the request
    pub fn to_new_payment(&self, amount: f64) -> NewPayment {
        NewPayment {
            name: self.name.clone(),
            phone: self.phone.clone(),
            payment_method: self.payment_method.clone(),
            amount: Value::from(amount),
            package_type: self.package_type.clone(),
            doctor_type: self.doctor_type.clone().unwrap_or_else(unknown),
            emergency: self.emergency,
            country: self.country.clone(),
        }
    }

    /// The subscription bought by a checkout of a `subscription` package
    pub fn to_new_subscription(&self, amount: f64) -> NewSubscription {
        let package = self.package.clone().unwrap_or_default();
        NewSubscription {
            name: self.name.clone(),
            phone: self.phone.clone(),
            package: package.name.unwrap_or_else(unknown),
            amount: Value::from(amount),
            payment_method: self.payment_method.clone(),
            call_limit: package.call_limit,
            doctor_type: self.doctor_type.clone(),
        }
    }
}

/// Request sent to the mobile-money gateway
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MobileCheckoutRequest {
    /// normalized, see `models::phone`
    pub account_number: String,
    pub amount: f64,
    pub provider: MobileMoneyProvider,
    pub external_id: String,
}

impl MobileCheckoutRequest {
    pub fn new(phone: &str, amount: f64, provider: MobileMoneyProvider, external_id: String) -> Self {
        MobileCheckoutRequest {
            account_number: normalize_phone(phone),
            amount,
            provider,
            external_id,
        }
    }
}

/// Transaction ids sent to the gateway: `PONA-<unix seconds>`
pub fn transaction_id(unix_seconds: i64) -> String {
    format!("PONA-{}", unix_seconds)
}

/// Gateway answer to an accepted checkout
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckoutReceipt {
    pub transaction_id: String,
    pub reference: String,
    pub response: Value,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CheckoutResponse {
    pub success: bool,
    pub payment_id: String,
    pub transaction_id: String,
    pub message: String,
    pub azampay_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon_code: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PaymentStatus {
    pub success: bool,
    pub transaction_id: String,
    pub status: String,
    pub data: Value,
}

/// Payload the gateway posts to `POST /api/payments/azampay/callback`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CallbackPayload {
    #[serde(default)]
    pub external_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CallbackOutcome {
    pub success: bool,
    pub transaction_id: String,
    pub status: String,
    pub message: String,
}

impl<'a> From<&'a CallbackPayload> for CallbackOutcome {
    fn from(payload: &'a CallbackPayload) -> Self {
        if payload.status.eq_ignore_ascii_case("SUCCESS") {
            CallbackOutcome {
                success: true,
                transaction_id: payload.external_id.clone(),
                status: "SUCCESS".to_string(),
                message: "Payment completed successfully".to_string(),
            }
        } else {
            CallbackOutcome {
                success: false,
                transaction_id: payload.external_id.clone(),
                status: payload.status.clone(),
                message: payload.message.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json;

    use super::*;

    #[test]
    fn provider_spellings() {
        assert_eq!(MobileMoneyProvider::from_method("M-Pesa").unwrap(), MobileMoneyProvider::Mpesa);
        assert_eq!(MobileMoneyProvider::from_method("tigo_pesa").unwrap(), MobileMoneyProvider::Tigo);
        assert_eq!(MobileMoneyProvider::from_method("Airtel Money").unwrap(), MobileMoneyProvider::Airtel);
        assert_eq!(MobileMoneyProvider::from_method("HaloPesa").unwrap(), MobileMoneyProvider::Halopesa);
        assert!(MobileMoneyProvider::from_method("cash").is_err());
    }

    #[test]
    fn amounts_from_numbers_and_text() {
        assert_eq!(parse_amount(&json!(5000)).unwrap(), 5000.0);
        assert_eq!(parse_amount(&json!("15,000.50")).unwrap(), 15000.5);
        assert_eq!(parse_amount(&json!("15,000")).unwrap(), 15000.0);
        assert_eq!(parse_amount(&json!("12,5")).unwrap(), 12.5);
        assert_eq!(parse_amount(&json!("TZS 30 000")).unwrap(), 30000.0);
        assert!(parse_amount(&json!("free")).is_err());
        assert!(parse_amount(&json!([1])).is_err());
    }

    #[test]
    fn payment_row() {
        let at = NaiveDate::from_ymd(2024, 3, 1).and_hms(9, 30, 0);
        let payload: NewPayment = serde_json::from_value(json!({"name": "Jane", "phone": "0712345678", "amount": "5,000"})).unwrap();
        let payment = Payment::new(payload, 5000.0, at);
        let row = payment.to_row();

        assert_eq!(row["id"], "PY-20240301093000");
        assert_eq!(row["amount"], "5000");
        assert_eq!(row["payment_method"], "Unknown");
        assert_eq!(row["is_emergency"], "FALSE");
    }

    #[test]
    fn callback_outcomes() {
        let payload: CallbackPayload = serde_json::from_value(json!({"externalId": "PONA-1", "status": "success"})).unwrap();
        assert!(CallbackOutcome::from(&payload).success);

        let payload: CallbackPayload =
            serde_json::from_value(json!({"externalId": "PONA-2", "status": "FAILED", "message": "Insufficient funds"})).unwrap();
        let outcome = CallbackOutcome::from(&payload);
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Insufficient funds");
    }

    #[test]
    fn checkout_request_normalizes_account() {
        let request = MobileCheckoutRequest::new("0687511886", 5000.0, MobileMoneyProvider::Airtel, transaction_id(1700000000));
        assert_eq!(request.account_number, "255687511886");
        assert_eq!(request.external_id, "PONA-1700000000");
    }
}
