//! Services is a core layer for the app business logic like
//! validation, coupon bookkeeping and talking to the payment gateway.

pub mod admin;
pub mod bookings;
pub mod coupons;
pub mod payments;
pub mod subscriptions;
pub mod system;
pub mod types;

use failure::{Error as FailureError, Fail};

use controller::context::StaticContext;
use errors::{error_chain, Error};
use repos::error::Error as RepoError;
use repos::gateway::PersistenceGateway;
use repos::repo_factory::ReposFactory;

use self::types::ServiceFuture;

/// Service
pub struct Service<F: ReposFactory> {
    pub static_context: StaticContext<F>,
}

impl<F: ReposFactory> Service<F> {
    /// Create a new service
    pub fn new(static_context: StaticContext<F>) -> Self {
        Self { static_context }
    }

    /// Runs blocking store and gateway calls on the cpu pool
    pub fn spawn_on_pool<T, Func>(&self, f: Func) -> ServiceFuture<T>
    where
        T: Send + 'static,
        Func: FnOnce(&PersistenceGateway) -> Result<T, FailureError> + Send + 'static,
    {
        let gateway = self.static_context.gateway.clone();
        let cpu_pool = self.static_context.cpu_pool.clone();
        Box::new(cpu_pool.spawn_fn(move || f(&*gateway)))
    }
}

/// Adds the endpoint context to a failure. A durable store that can not be
/// reached is reported as `Error::StoreUnavailable`.
pub fn service_error(e: FailureError, context: &str) -> FailureError {
    let unreachable = e.iter_chain().any(|cause| match cause.downcast_ref::<RepoError>() {
        Some(&RepoError::Connection(_)) => true,
        _ => false,
    });
    if unreachable {
        FailureError::from(Error::StoreUnavailable.context(format!("{} {}", context, error_chain(&e))))
    } else {
        FailureError::from(e.context(context.to_string()))
    }
}
