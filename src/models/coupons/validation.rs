//! Outcomes of coupon validation and redemption and their JSON shapes
use chrono::NaiveDate;

use super::{Coupon, CouponCode};

/// Reasons a coupon can not be used. These are expected outcomes, not faults.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponInvalidReason {
    NotFound,
    Inactive,
    Expired,
    CallsExhausted,
    OwnershipMismatch,
}

impl CouponInvalidReason {
    pub fn message(&self) -> &'static str {
        match *self {
            CouponInvalidReason::NotFound => "Invalid coupon code",
            CouponInvalidReason::Inactive => "Coupon is inactive",
            CouponInvalidReason::Expired => "Coupon has expired",
            CouponInvalidReason::CallsExhausted => "All calls for this coupon have been used",
            CouponInvalidReason::OwnershipMismatch => "Coupon does not belong to this phone number",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CouponValidate {
    Valid(Coupon),
    Invalid(CouponInvalidReason, Option<Coupon>),
}

impl CouponValidate {
    pub fn is_valid(&self) -> bool {
        match *self {
            CouponValidate::Valid(_) => true,
            CouponValidate::Invalid(..) => false,
        }
    }

    pub fn reason(&self) -> Option<CouponInvalidReason> {
        match *self {
            CouponValidate::Valid(_) => None,
            CouponValidate::Invalid(reason, _) => Some(reason),
        }
    }

    pub fn coupon(&self) -> Option<&Coupon> {
        match *self {
            CouponValidate::Valid(ref coupon) => Some(coupon),
            CouponValidate::Invalid(_, ref coupon) => coupon.as_ref(),
        }
    }
}

/// Client-facing view of a coupon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CouponSummary {
    pub code: CouponCode,
    pub package_type: String,
    pub doctor_type: String,
    pub call_limit: u32,
    pub calls_used: u32,
    pub calls_remaining: u32,
    pub expires_at: NaiveDate,
    pub is_active: bool,
}

impl<'a> From<&'a Coupon> for CouponSummary {
    fn from(coupon: &'a Coupon) -> Self {
        CouponSummary {
            code: coupon.code.clone(),
            package_type: coupon.package_type.clone(),
            doctor_type: coupon.doctor_type.clone(),
            call_limit: coupon.call_limit,
            calls_used: coupon.calls_used,
            calls_remaining: coupon.calls_remaining(),
            expires_at: coupon.expires_at,
            is_active: coupon.is_active,
        }
    }
}

/// Response of `POST /api/coupons/validate`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CouponValidationResponse {
    pub valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponInvalidReason>,
    #[serde(flatten)]
    pub coupon: Option<CouponSummary>,
}

impl From<CouponValidate> for CouponValidationResponse {
    fn from(result: CouponValidate) -> Self {
        match result {
            CouponValidate::Valid(coupon) => CouponValidationResponse {
                valid: true,
                message: "Coupon is valid".to_string(),
                reason: None,
                coupon: Some(CouponSummary::from(&coupon)),
            },
            CouponValidate::Invalid(reason, _) => CouponValidationResponse {
                valid: false,
                message: reason.message().to_string(),
                reason: Some(reason),
                coupon: None,
            },
        }
    }
}

/// Response of `POST /api/coupons/use`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CouponRedemptionResponse {
    pub success: bool,
    pub valid: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<CouponInvalidReason>,
    #[serde(flatten)]
    pub coupon: Option<CouponSummary>,
}

impl From<CouponValidate> for CouponRedemptionResponse {
    fn from(result: CouponValidate) -> Self {
        match result {
            CouponValidate::Valid(coupon) => CouponRedemptionResponse {
                success: true,
                valid: true,
                message: "Coupon used successfully".to_string(),
                reason: None,
                coupon: Some(CouponSummary::from(&coupon)),
            },
            CouponValidate::Invalid(reason, _) => CouponRedemptionResponse {
                success: false,
                valid: false,
                message: reason.message().to_string(),
                reason: Some(reason),
                coupon: None,
            },
        }
    }
}

/// Response of `POST /api/coupons`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CouponCreated {
    pub success: bool,
    pub message: String,
    pub coupon: CouponSummary,
}

impl<'a> From<&'a Coupon> for CouponCreated {
    fn from(coupon: &'a Coupon) -> Self {
        CouponCreated {
            success: true,
            message: "Coupon created successfully".to_string(),
            coupon: CouponSummary::from(coupon),
        }
    }
}

/// Response of `GET /api/coupons/user/<phone>`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CouponList {
    pub success: bool,
    pub message: String,
    pub data: Vec<CouponSummary>,
}

impl From<Vec<Coupon>> for CouponList {
    fn from(coupons: Vec<Coupon>) -> Self {
        CouponList {
            success: true,
            message: format!("Found {} coupons", coupons.len()),
            data: coupons.iter().map(CouponSummary::from).collect(),
        }
    }
}
