use config::Tables;
use repos::*;

pub trait ReposFactory: Clone + Send + 'static {
    fn create_coupons_repo<'a>(&self, gateway: &'a PersistenceGateway) -> Box<CouponsRepo + 'a>;
    fn create_records_repo<'a>(&self, gateway: &'a PersistenceGateway) -> Box<RecordsRepo + 'a>;
}

#[derive(Clone)]
pub struct ReposFactoryImpl {
    coupon_cache: CouponCacheImpl,
    tables: Tables,
}

impl ReposFactoryImpl {
    pub fn new(coupon_cache: CouponCacheImpl, tables: Tables) -> Self {
        Self { coupon_cache, tables }
    }
}

impl ReposFactory for ReposFactoryImpl {
    fn create_coupons_repo<'a>(&self, gateway: &'a PersistenceGateway) -> Box<CouponsRepo + 'a> {
        let durable = Box::new(CouponsRepoImpl::new(gateway, self.tables.coupons.clone())) as Box<CouponsRepo + 'a>;
        Box::new(CouponStoreImpl::new(self.coupon_cache.clone(), durable)) as Box<CouponsRepo + 'a>
    }
    fn create_records_repo<'a>(&self, gateway: &'a PersistenceGateway) -> Box<RecordsRepo + 'a> {
        Box::new(RecordsRepoImpl::new(gateway, self.tables.clone())) as Box<RecordsRepo + 'a>
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use futures_cpupool::CpuPool;

    use config::{Config, Tables};
    use models::Row;
    use repos::error::Error as RepoError;
    use repos::types::RepoResult;
    use repos::*;
    use controller::context::StaticContext;
    use services::Service;

    pub const TEST_RUN_MODE: &str = "test";

    pub fn create_tables() -> Tables {
        Tables {
            bookings: "bookings".to_string(),
            payments: "payments".to_string(),
            subscriptions: "subscriptions".to_string(),
            coupons: "coupons".to_string(),
        }
    }

    pub fn create_factory() -> ReposFactoryImpl {
        ReposFactoryImpl::new(CouponCacheImpl::default(), create_tables())
    }

    /// Durable store that is down
    #[derive(Clone, Default)]
    pub struct FailingGateway {
        pub calls: Arc<AtomicUsize>,
    }

    impl FailingGateway {
        fn fail<T>(&self, operation: &str, table: &str) -> RepoResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepoError::Connection(format!("{} on {} refused", operation, table)).into())
        }
    }

    impl PersistenceGateway for FailingGateway {
        fn read_all(&self, table: &str) -> RepoResult<Vec<Row>> {
            self.fail("read_all", table)
        }

        fn append(&self, table: &str, _row: Row) -> RepoResult<()> {
            self.fail("append", table)
        }

        fn update(&self, table: &str, _row_index: usize, _row: Row) -> RepoResult<()> {
            self.fail("update", table)
        }
    }

    pub fn create_config() -> Config {
        Config::with_env(TEST_RUN_MODE).unwrap()
    }

    pub fn create_context(gateway: Arc<PersistenceGateway>, pool_size: usize) -> StaticContext<ReposFactoryImpl> {
        StaticContext::new(
            CpuPool::new(pool_size),
            gateway,
            Arc::new(create_config()),
            create_factory(),
            Arc::new(::providers::tests::MockPaymentGateway::default()),
        )
    }

    pub fn create_service(gateway: Arc<PersistenceGateway>) -> Service<ReposFactoryImpl> {
        Service::new(create_context(gateway, 1))
    }

    pub fn create_memory_service() -> (Service<ReposFactoryImpl>, InMemoryGateway) {
        let gateway = InMemoryGateway::new();
        let service = create_service(Arc::new(gateway.clone()));
        (service, gateway)
    }
}
