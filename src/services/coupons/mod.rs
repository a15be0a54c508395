//! Coupons Services, the lifecycle of a coupon: issue, validate, redeem, list

pub mod code;
pub mod locks;

pub use self::locks::CouponLocks;

use chrono::NaiveDateTime;
use failure::Error as FailureError;
use serde_json::Value;
use validator::Validate;

use errors::Error;
use models::*;
use repos::error::Error as RepoError;
use repos::{CouponSearch, CouponsRepo, ReposFactory};
use services::types::ServiceFuture;
use services::Service;

pub trait CouponsService {
    /// Creates new coupon with a fresh code
    fn create_coupon(&self, payload: NewCoupon) -> ServiceFuture<Coupon>;
    /// Checks whether a coupon can be used, optionally by a given phone
    fn validate_coupon(&self, payload: ValidateCouponPayload) -> ServiceFuture<CouponValidate>;
    /// Uses one call of a coupon
    fn redeem_coupon(&self, payload: RedeemCouponPayload) -> ServiceFuture<CouponValidate>;
    /// Returns coupons owned by a phone number
    fn list_coupons_for_phone(&self, phone: String) -> ServiceFuture<Vec<Coupon>>;
}

/// Checks a looked up coupon against the clock and, when given, the caller's phone.
///
/// Reasons are checked in this order: `NotFound`, `CallsExhausted`, `Inactive`,
/// `Expired`, `OwnershipMismatch`. A coupon used up is reported as exhausted
/// even though it is inactive as well.
pub fn check_coupon(coupon: Option<Coupon>, phone: Option<&str>, now: NaiveDateTime) -> CouponValidate {
    let coupon = match coupon {
        Some(coupon) => coupon,
        None => return CouponValidate::Invalid(CouponInvalidReason::NotFound, None),
    };
    let phone = phone.map(str::trim).filter(|phone| !phone.is_empty());

    let reason = if coupon.is_exhausted() {
        Some(CouponInvalidReason::CallsExhausted)
    } else if !coupon.is_active {
        Some(CouponInvalidReason::Inactive)
    } else if coupon.is_expired_at(now) {
        Some(CouponInvalidReason::Expired)
    } else if phone.map_or(false, |phone| !same_phone(phone, &coupon.owner_phone)) {
        Some(CouponInvalidReason::OwnershipMismatch)
    } else {
        None
    };

    match reason {
        Some(reason) => CouponValidate::Invalid(reason, Some(coupon)),
        None => CouponValidate::Valid(coupon),
    }
}

fn is_constraint_violation(err: &FailureError) -> bool {
    err.iter_chain().any(|cause| match cause.downcast_ref::<RepoError>() {
        Some(RepoError::ConstraintViolation(_)) => true,
        _ => false,
    })
}

/// Validates the payload and stores a coupon under a code no other coupon uses.
/// Shared by coupon creation and subscription purchases.
pub fn issue_coupon(coupons_repo: &CouponsRepo, payload: NewCoupon, now: NaiveDateTime) -> Result<Coupon, FailureError> {
    payload.validate().map_err(Error::Validate)?;

    loop {
        let code = code::generate_code(|code| coupons_repo.code_exists(code))?;
        match coupons_repo.create(Coupon::new(code, &payload, now)) {
            Ok(coupon) => {
                info!("Issued coupon {} for {} with {} calls.", coupon.code, coupon.owner_phone, coupon.call_limit);
                return Ok(coupon);
            }
            Err(ref e) if is_constraint_violation(e) => debug!("Coupon code was taken concurrently, drawing again: {}", e),
            Err(e) => return Err(e),
        }
    }
}

fn required_coupon_code(code: Option<&Value>) -> Result<CouponCode, Error> {
    required_code(code).ok_or_else(|| Error::MalformedInput("coupon_code must be a non-empty string".to_string()))
}

impl<F: ReposFactory> CouponsService for Service<F> {
    fn create_coupon(&self, payload: NewCoupon) -> ServiceFuture<Coupon> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let coupons_repo = repo_factory.create_coupons_repo(gateway);
            issue_coupon(&*coupons_repo, payload, now())
                .map_err(|e| e.context("Service Coupons, create endpoint error occurred.").into())
        })
    }

    fn validate_coupon(&self, payload: ValidateCouponPayload) -> ServiceFuture<CouponValidate> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let code = required_coupon_code(payload.coupon_code.as_ref())?;
            let coupons_repo = repo_factory.create_coupons_repo(gateway);

            coupons_repo
                .get_by_code(&code)
                .map(|coupon| check_coupon(coupon, payload.phone_number.as_ref().map(String::as_str), now()))
                .map_err(|e| e.context("Service Coupons, validate endpoint error occurred.").into())
        })
    }

    fn redeem_coupon(&self, payload: RedeemCouponPayload) -> ServiceFuture<CouponValidate> {
        let repo_factory = self.static_context.repo_factory.clone();
        let coupon_locks = self.static_context.coupon_locks.clone();

        self.spawn_on_pool(move |gateway| {
            let code = required_coupon_code(payload.coupon_code.as_ref())?;
            let coupons_repo = repo_factory.create_coupons_repo(gateway);

            coupon_locks
                .with_lock(&code, || -> Result<CouponValidate, FailureError> {
                    let coupon = coupons_repo.get_by_code(&code)?;
                    match check_coupon(coupon, None, now()) {
                        CouponValidate::Valid(mut coupon) => {
                            coupon.record_use();
                            let coupon = coupons_repo.update(coupon)?;
                            info!("Coupon {} used, {} calls remaining.", coupon.code, coupon.calls_remaining());
                            Ok(CouponValidate::Valid(coupon))
                        }
                        invalid => Ok(invalid),
                    }
                })
                .map_err(|e: FailureError| e.context("Service Coupons, use endpoint error occurred.").into())
        })
    }

    fn list_coupons_for_phone(&self, phone: String) -> ServiceFuture<Vec<Coupon>> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            if normalize_phone(&phone).is_empty() {
                return Err(Error::MalformedInput(format!("Invalid phone number: {}", phone)).into());
            }
            let coupons_repo = repo_factory.create_coupons_repo(gateway);

            coupons_repo
                .find_by(CouponSearch::Phone(phone))
                .map_err(|e| e.context("Service Coupons, list for phone endpoint error occurred.").into())
        })
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate};
    use futures::future;
    use tokio_core::reactor::Core;

    use super::*;
    use errors::find_error;
    use models::coupons::tests::create_new_coupon;
    use repos::gateway::{InMemoryGateway, PersistenceGateway};
    use repos::repo_factory::tests::*;

    fn validate_payload(code: &str, phone: Option<&str>) -> ValidateCouponPayload {
        ValidateCouponPayload {
            coupon_code: Some(json!(code)),
            phone_number: phone.map(String::from),
        }
    }

    fn redeem_payload(code: &CouponCode) -> RedeemCouponPayload {
        RedeemCouponPayload {
            coupon_code: Some(json!(code.to_string())),
        }
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd(y, m, d).and_hms(10, 0, 0)
    }

    #[test]
    fn check_order_prefers_exhaustion() {
        let mut coupon = Coupon::new(CouponCode::from("ABCD2345"), &create_new_coupon(1), at(2024, 1, 10));
        coupon.record_use();
        let late = at(2024, 6, 1);
        assert_eq!(check_coupon(Some(coupon.clone()), None, late).reason(), Some(CouponInvalidReason::CallsExhausted));

        let mut deactivated = Coupon::new(CouponCode::from("ABCD2345"), &create_new_coupon(3), at(2024, 1, 10));
        deactivated.is_active = false;
        assert_eq!(check_coupon(Some(deactivated), None, late).reason(), Some(CouponInvalidReason::Inactive));

        let fresh = Coupon::new(CouponCode::from("ABCD2345"), &create_new_coupon(3), at(2024, 1, 10));
        assert_eq!(
            check_coupon(Some(fresh.clone()), Some("0687511886"), late).reason(),
            Some(CouponInvalidReason::Expired)
        );
        assert_eq!(
            check_coupon(Some(fresh.clone()), Some("0687511886"), at(2024, 1, 11)).reason(),
            Some(CouponInvalidReason::OwnershipMismatch)
        );
        assert!(check_coupon(Some(fresh.clone()), Some(" "), at(2024, 1, 11)).is_valid());
        assert_eq!(check_coupon(None, None, late).reason(), Some(CouponInvalidReason::NotFound));
    }

    #[test]
    fn test_create_coupon() {
        let (service, gateway) = create_memory_service();
        let mut core = Core::new().unwrap();

        let coupon = core.run(service.create_coupon(create_new_coupon(15))).unwrap();

        assert_eq!(coupon.code.0.len(), 8);
        assert_eq!(coupon.calls_remaining(), 15);
        assert_eq!(coupon.expires_at, (coupon.created_at + Duration::days(30)).date());
        let rows = gateway.read_all("coupons").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["coupon_code"], coupon.code.0);
    }

    #[test]
    fn test_create_coupon_with_invalid_payload() {
        let (service, _) = create_memory_service();
        let mut core = Core::new().unwrap();
        let mut payload = create_new_coupon(0);
        payload.phone_number = "12".to_string();

        let err = core.run(service.create_coupon(payload)).unwrap_err();

        let found = find_error(&err).unwrap();
        assert_eq!(found.code(), ::hyper::StatusCode::BadRequest);
        let message = found.message();
        assert!(message.contains("phone_number"));
        assert!(message.contains("call_limit"));
    }

    #[test]
    fn test_redeem_until_exhausted() {
        let (service, gateway) = create_memory_service();
        let mut core = Core::new().unwrap();
        let coupon = core.run(service.create_coupon(create_new_coupon(15))).unwrap();

        for used in 1..16 {
            let result = core.run(service.redeem_coupon(redeem_payload(&coupon.code))).unwrap();
            let redeemed = result.coupon().unwrap();
            assert!(result.is_valid());
            assert_eq!(redeemed.calls_used, used);
            assert_eq!(redeemed.is_active, used < 15);
        }

        let result = core.run(service.redeem_coupon(redeem_payload(&coupon.code))).unwrap();
        assert_eq!(result.reason(), Some(CouponInvalidReason::CallsExhausted));

        let validation = core
            .run(service.validate_coupon(validate_payload(&coupon.code.0, None)))
            .unwrap();
        assert_eq!(validation.reason(), Some(CouponInvalidReason::CallsExhausted));

        let rows = gateway.read_all("coupons").unwrap();
        assert_eq!(rows[0]["calls_used"], "15");
        assert_eq!(rows[0]["status"], "Inactive");
    }

    #[test]
    fn test_validate_coupon_ownership() {
        let (service, _) = create_memory_service();
        let mut core = Core::new().unwrap();
        let coupon = core.run(service.create_coupon(create_new_coupon(15))).unwrap();

        let owner = core
            .run(service.validate_coupon(validate_payload(&coupon.code.0.to_lowercase(), Some("+255 712 345 678"))))
            .unwrap();
        assert!(owner.is_valid());

        let stranger = core
            .run(service.validate_coupon(validate_payload(&coupon.code.0, Some("0687511886"))))
            .unwrap();
        assert_eq!(stranger.reason(), Some(CouponInvalidReason::OwnershipMismatch));

        let unknown = core.run(service.validate_coupon(validate_payload("ZZZZ9999", None))).unwrap();
        assert_eq!(unknown.reason(), Some(CouponInvalidReason::NotFound));
    }

    #[test]
    fn test_missing_code_is_malformed() {
        let (service, _) = create_memory_service();
        let mut core = Core::new().unwrap();

        let err = core.run(service.validate_coupon(ValidateCouponPayload::default())).unwrap_err();
        match find_error(&err) {
            Some(Error::MalformedInput(_)) => {}
            other => panic!("unexpected error {:?}", other),
        }

        let err = core
            .run(service.redeem_coupon(RedeemCouponPayload {
                coupon_code: Some(json!("   ")),
            }))
            .unwrap_err();
        assert!(find_error(&err).is_some());
    }

    #[test]
    fn test_durable_rows_are_found_and_updated() {
        let today = now().date();
        let valid_until = format_date(today + Duration::days(10));
        let expired_on = format_date(today - Duration::days(1));
        let gateway = InMemoryGateway::with_rows(
            "coupons",
            vec![
                row_from(vec![
                    ("coupon_code", "QWER5678"),
                    ("phone_number", "0687511886"),
                    ("call_limit", "3"),
                    ("calls_used", "1"),
                    ("expires_at", valid_until.as_str()),
                    ("status", "Active"),
                ]),
                row_from(vec![
                    ("coupon_code", "OLDC2345"),
                    ("phone_number", "0687511886"),
                    ("call_limit", "3"),
                    ("calls_used", "0"),
                    ("expires_at", expired_on.as_str()),
                    ("status", "Active"),
                ]),
            ],
        );
        let service = create_service(Arc::new(gateway.clone()));
        let mut core = Core::new().unwrap();

        let expired = core.run(service.validate_coupon(validate_payload("OLDC2345", None))).unwrap();
        assert_eq!(expired.reason(), Some(CouponInvalidReason::Expired));

        let result = core
            .run(service.redeem_coupon(RedeemCouponPayload {
                coupon_code: Some(json!("qwer5678")),
            }))
            .unwrap();
        assert_eq!(result.coupon().unwrap().calls_used, 2);
        assert_eq!(gateway.read_all("coupons").unwrap()[0]["calls_used"], "2");

        let owned = core.run(service.list_coupons_for_phone("255687511886".to_string())).unwrap();
        assert_eq!(owned.len(), 2);
    }

    #[test]
    fn test_store_failure_keeps_coupons_usable() {
        let gateway = FailingGateway::default();
        let service = create_service(Arc::new(gateway.clone()));
        let mut core = Core::new().unwrap();

        let coupon = core.run(service.create_coupon(create_new_coupon(2))).unwrap();
        let result = core.run(service.redeem_coupon(redeem_payload(&coupon.code))).unwrap();

        assert!(result.is_valid());
        assert_eq!(result.coupon().unwrap().calls_used, 1);
        let owned = core.run(service.list_coupons_for_phone("0712345678".to_string())).unwrap();
        assert_eq!(owned.len(), 1);
        assert!(gateway.calls.load(::std::sync::atomic::Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_concurrent_redeems_respect_limit() {
        let gateway = InMemoryGateway::new();
        let service = Service::new(create_context(Arc::new(gateway.clone()), 8));
        let mut core = Core::new().unwrap();
        let coupon = core.run(service.create_coupon(create_new_coupon(5))).unwrap();

        let redeems: Vec<_> = (0..20).map(|_| service.redeem_coupon(redeem_payload(&coupon.code))).collect();
        let results = core.run(future::join_all(redeems)).unwrap();

        let successes = results.iter().filter(|result| result.is_valid()).count();
        assert_eq!(successes, 5);
        assert!(results
            .iter()
            .filter(|result| !result.is_valid())
            .all(|result| result.reason() == Some(CouponInvalidReason::CallsExhausted)));
        assert_eq!(gateway.read_all("coupons").unwrap()[0]["calls_used"], "5");
    }

    #[test]
    fn test_list_coupons_for_phone() {
        let (service, _) = create_memory_service();
        let mut core = Core::new().unwrap();
        core.run(service.create_coupon(create_new_coupon(15))).unwrap();
        core.run(service.create_coupon(create_new_coupon(5))).unwrap();
        let mut other = create_new_coupon(5);
        other.phone_number = "0687511886".to_string();
        core.run(service.create_coupon(other)).unwrap();

        let owned = core.run(service.list_coupons_for_phone("255712345678".to_string())).unwrap();
        assert_eq!(owned.len(), 2);
        assert!(core.run(service.list_coupons_for_phone("none".to_string())).is_err());
    }
}
