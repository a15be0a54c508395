//! Providers are clients of third-party services the app depends on
pub mod azampay;

pub use self::azampay::*;

use failure::Error as FailureError;

use models::{CheckoutReceipt, MobileCheckoutRequest, PaymentStatus};

/// Mobile-money payment gateway
pub trait PaymentGateway: Send + Sync {
    /// Asks the operator to push a payment prompt to the customer's phone
    fn checkout(&self, request: &MobileCheckoutRequest) -> Result<CheckoutReceipt, FailureError>;

    /// Queries the state of an earlier checkout
    fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus, FailureError>;
}

#[cfg(test)]
pub mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use errors::Error;

    #[derive(Clone, Default)]
    pub struct MockPaymentGateway {
        pub reject: bool,
        pub requests: Arc<Mutex<Vec<MobileCheckoutRequest>>>,
    }

    impl MockPaymentGateway {
        pub fn rejecting() -> Self {
            MockPaymentGateway {
                reject: true,
                ..Default::default()
            }
        }
    }

    impl PaymentGateway for MockPaymentGateway {
        fn checkout(&self, request: &MobileCheckoutRequest) -> Result<CheckoutReceipt, FailureError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.reject {
                return Err(Error::PaymentGateway("Payment request failed: insufficient balance".to_string()).into());
            }
            Ok(CheckoutReceipt {
                transaction_id: request.external_id.clone(),
                reference: format!("REF-{}", request.external_id),
                response: json!({"success": true}),
            })
        }

        fn payment_status(&self, transaction_id: &str) -> Result<PaymentStatus, FailureError> {
            Ok(PaymentStatus {
                success: true,
                transaction_id: transaction_id.to_string(),
                status: "SUCCESS".to_string(),
                data: json!({"status": "SUCCESS"}),
            })
        }
    }
}
