//! System Services, health of the app
use futures::future;

use models::{now, Health};
use repos::ReposFactory;
use services::types::ServiceFuture;
use services::Service;

pub trait SystemService {
    /// Healthcheck
    fn healthcheck(&self) -> ServiceFuture<Health>;
}

impl<F: ReposFactory> SystemService for Service<F> {
    fn healthcheck(&self) -> ServiceFuture<Health> {
        Box::new(future::ok(Health {
            status: "healthy".to_string(),
            timestamp: now(),
        }))
    }
}
