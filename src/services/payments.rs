//! Payments Services: recorded payments and mobile-money checkout
use chrono::Utc;
use futures::future;
use validator::Validate;

use errors::Error;
use models::*;
use repos::{ReposFactory, Table};
use services::subscriptions::{coupon_for, purchase_subscription};
use services::types::ServiceFuture;
use services::{service_error, Service};

pub trait PaymentsService {
    /// Records a payment made outside the gateway
    fn create_payment(&self, payload: NewPayment) -> ServiceFuture<PaymentCreated>;
    /// Charges a customer through the mobile-money gateway
    fn checkout(&self, payload: CheckoutPayload) -> ServiceFuture<CheckoutResponse>;
    /// Asks the gateway for the state of a checkout
    fn payment_status(&self, transaction_id: String) -> ServiceFuture<PaymentStatus>;
    /// Interprets a gateway notification
    fn handle_callback(&self, payload: CallbackPayload) -> ServiceFuture<CallbackOutcome>;
}

impl<F: ReposFactory> PaymentsService for Service<F> {
    fn create_payment(&self, payload: NewPayment) -> ServiceFuture<PaymentCreated> {
        let repo_factory = self.static_context.repo_factory.clone();

        self.spawn_on_pool(move |gateway| {
            let records_repo = repo_factory.create_records_repo(gateway);

            parse_amount(&payload.amount)
                .and_then(|amount| {
                    let payment = Payment::new(payload, amount, now());
                    records_repo.append(Table::Payments, payment.to_row()).map(|_| PaymentCreated {
                        success: true,
                        payment_id: payment.id,
                        message: "Payment created successfully".to_string(),
                    })
                })
                .map_err(|e| service_error(e, "Service Payments, create endpoint error occurred."))
        })
    }

    fn checkout(&self, payload: CheckoutPayload) -> ServiceFuture<CheckoutResponse> {
        let repo_factory = self.static_context.repo_factory.clone();
        let payment_gateway = self.static_context.payment_gateway.clone();
        let config = self.static_context.config.clone();

        self.spawn_on_pool(move |gateway| {
            let amount = parse_amount(&payload.amount)?;
            let provider = MobileMoneyProvider::from_method(&payload.payment_method)?;
            if normalize_phone(&payload.phone).is_empty() {
                return Err(Error::MalformedInput("phone is required".to_string()).into());
            }

            // the coupon payload is checked before the customer is charged
            let subscription = if payload.is_subscription() {
                let new_subscription = payload.to_new_subscription(amount);
                let new_coupon = coupon_for(&new_subscription, &config.coupons);
                new_coupon.validate().map_err(Error::Validate)?;
                Some((new_subscription, new_coupon))
            } else {
                None
            };

            let request = MobileCheckoutRequest::new(&payload.phone, amount, provider, transaction_id(Utc::now().timestamp()));
            let receipt = payment_gateway
                .checkout(&request)
                .map_err(|e| e.context(format!("Checkout {} was not accepted", request.external_id)))?;

            let records_repo = repo_factory.create_records_repo(gateway);
            let at = now();
            let payment = Payment::new(payload.to_new_payment(amount), amount, at);
            records_repo
                .append(Table::Payments, payment.to_row())
                .map_err(|e| service_error(e, "Service Payments, checkout endpoint error occurred."))?;

            let coupon_code = match subscription {
                Some((new_subscription, new_coupon)) => {
                    let coupons_repo = repo_factory.create_coupons_repo(gateway);
                    let subscription = purchase_subscription(
                        &*coupons_repo,
                        &*records_repo,
                        payment.id.clone(),
                        &new_subscription,
                        new_coupon,
                        amount,
                        at,
                    ).map_err(|e| service_error(e, "Service Payments, checkout endpoint error occurred."))?;
                    Some(subscription.coupon_code)
                }
                None => None,
            };

            Ok(CheckoutResponse {
                success: true,
                payment_id: payment.id,
                transaction_id: receipt.transaction_id,
                message: "Payment processed successfully".to_string(),
                azampay_reference: receipt.reference,
                coupon_code,
            })
        })
    }

    fn payment_status(&self, transaction_id: String) -> ServiceFuture<PaymentStatus> {
        let payment_gateway = self.static_context.payment_gateway.clone();

        self.spawn_on_pool(move |_| {
            payment_gateway
                .payment_status(&transaction_id)
                .map_err(|e| e.context("Service Payments, status endpoint error occurred.").into())
        })
    }

    fn handle_callback(&self, payload: CallbackPayload) -> ServiceFuture<CallbackOutcome> {
        let outcome = CallbackOutcome::from(&payload);
        if outcome.success {
            info!("Payment {} completed, gateway reference {:?}.", outcome.transaction_id, payload.reference);
        } else {
            warn!(
                "Payment {} not completed, status {}: {}",
                outcome.transaction_id, outcome.status, outcome.message
            );
        }
        Box::new(future::ok(outcome))
    }
}
