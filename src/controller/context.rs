use std::sync::Arc;

use futures_cpupool::CpuPool;

use config::Config;
use providers::PaymentGateway;
use repos::gateway::PersistenceGateway;
use repos::repo_factory::ReposFactory;
use services::coupons::CouponLocks;

/// Static context for all app
pub struct StaticContext<F>
where
    F: ReposFactory,
{
    pub cpu_pool: CpuPool,
    pub gateway: Arc<PersistenceGateway>,
    pub config: Arc<Config>,
    pub repo_factory: F,
    pub payment_gateway: Arc<PaymentGateway>,
    pub coupon_locks: CouponLocks,
}

impl<F: ReposFactory> StaticContext<F> {
    /// Create a new static context
    pub fn new(
        cpu_pool: CpuPool,
        gateway: Arc<PersistenceGateway>,
        config: Arc<Config>,
        repo_factory: F,
        payment_gateway: Arc<PaymentGateway>,
    ) -> Self {
        Self {
            cpu_pool,
            gateway,
            config,
            repo_factory,
            payment_gateway,
            coupon_locks: CouponLocks::default(),
        }
    }
}

impl<F: ReposFactory> Clone for StaticContext<F> {
    fn clone(&self) -> Self {
        Self {
            cpu_pool: self.cpu_pool.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
            repo_factory: self.repo_factory.clone(),
            payment_gateway: self.payment_gateway.clone(),
            coupon_locks: self.coupon_locks.clone(),
        }
    }
}
