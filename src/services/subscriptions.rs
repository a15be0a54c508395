//! Subscriptions Services, every purchase issues a coupon for the package's calls
use chrono::NaiveDateTime;
use failure::Error as FailureError;

use config::Coupons as CouponDefaults;
use models::*;
use repos::{CouponsRepo, RecordsRepo, ReposFactory, Table};
use services::coupons::issue_coupon;
use services::types::ServiceFuture;
use services::{service_error, Service};

pub trait SubscriptionsService {
    /// Records a subscription and issues its coupon
    fn create_subscription(&self, payload: NewSubscription) -> ServiceFuture<SubscriptionCreated>;
}

/// Coupon bought with a subscription, configured defaults fill what the payload omits
pub fn coupon_for(payload: &NewSubscription, defaults: &CouponDefaults) -> NewCoupon {
    NewCoupon {
        phone_number: payload.phone.clone(),
        package_type: payload.package.clone(),
        call_limit: payload.call_limit.unwrap_or(defaults.default_call_limit),
        doctor_type: payload
            .doctor_type
            .clone()
            .filter(|doctor_type| !doctor_type.trim().is_empty())
            .unwrap_or_else(|| defaults.default_doctor_type.clone()),
    }
}

/// Issues the coupon and appends the subscription row
pub fn purchase_subscription(
    coupons_repo: &CouponsRepo,
    records_repo: &RecordsRepo,
    id: String,
    payload: &NewSubscription,
    new_coupon: NewCoupon,
    amount: f64,
    now: NaiveDateTime,
) -> Result<Subscription, FailureError> {
    let coupon = issue_coupon(coupons_repo, new_coupon, now)?;
    let subscription = Subscription::new(id, payload, amount, coupon.code.to_string(), now);
    records_repo.append(Table::Subscriptions, subscription.to_row())?;
    Ok(subscription)
}

impl<F: ReposFactory> SubscriptionsService for Service<F> {
    fn create_subscription(&self, payload: NewSubscription) -> ServiceFuture<SubscriptionCreated> {
        let repo_factory = self.static_context.repo_factory.clone();
        let config = self.static_context.config.clone();

        self.spawn_on_pool(move |gateway| {
            let coupons_repo = repo_factory.create_coupons_repo(gateway);
            let records_repo = repo_factory.create_records_repo(gateway);

            parse_amount(&payload.amount)
                .and_then(|amount| {
                    let at = now();
                    let new_coupon = coupon_for(&payload, &config.coupons);
                    purchase_subscription(
                        &*coupons_repo,
                        &*records_repo,
                        Subscription::new_id(at),
                        &payload,
                        new_coupon,
                        amount,
                        at,
                    )
                })
                .map(|subscription| SubscriptionCreated::from(&subscription))
                .map_err(|e| service_error(e, "Service Subscriptions, create endpoint error occurred."))
        })
    }
}
