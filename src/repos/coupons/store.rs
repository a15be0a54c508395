//! Write-through coupon store.
//!
//! The cache is authoritative for the lifetime of the process. Durable writes
//! are best effort: a failure is logged and the cached state stands. Reads
//! that miss the cache merge matching durable rows into it; when the durable
//! store can not be read, the cached view is served alone.
use models::{Coupon, CouponCode};
use repos::coupons::{CouponCacheImpl, CouponSearch, CouponsRepo};
use repos::types::RepoResult;

pub struct CouponStoreImpl<'a> {
    pub cache: CouponCacheImpl,
    pub durable: Box<CouponsRepo + 'a>,
}

impl<'a> CouponStoreImpl<'a> {
    pub fn new(cache: CouponCacheImpl, durable: Box<CouponsRepo + 'a>) -> Self {
        Self { cache, durable }
    }

    fn merge_durable(&self, coupons: RepoResult<Vec<Coupon>>) {
        match coupons {
            Ok(coupons) => {
                let added = self.cache.merge(coupons);
                if added > 0 {
                    debug!("Merged {} coupons from durable store into cache.", added);
                }
            }
            Err(e) => warn!("Durable store is unavailable, serving cached coupons only: {}", e),
        }
    }
}

impl<'a> CouponsRepo for CouponStoreImpl<'a> {
    fn create(&self, coupon: Coupon) -> RepoResult<Coupon> {
        let coupon = self.cache.create(coupon)?;
        if let Err(e) = self.durable.create(coupon.clone()) {
            error!("Coupon {} is kept in memory only, durable write failed: {}", coupon.code, e);
        }
        Ok(coupon)
    }

    fn list(&self) -> RepoResult<Vec<Coupon>> {
        self.merge_durable(self.durable.list());
        self.cache.list()
    }

    fn get_by_code(&self, code: &CouponCode) -> RepoResult<Option<Coupon>> {
        if let Some(coupon) = self.cache.get(code) {
            return Ok(Some(coupon));
        }
        self.merge_durable(self.durable.get_by_code(code).map(|found| found.into_iter().collect()));
        Ok(self.cache.get(code))
    }

    fn code_exists(&self, code: &CouponCode) -> RepoResult<bool> {
        if self.cache.contains(code) {
            return Ok(true);
        }
        match self.durable.code_exists(code) {
            Ok(exists) => Ok(exists),
            Err(e) => {
                warn!("Durable store is unavailable, checking code {} against cache only: {}", code, e);
                Ok(false)
            }
        }
    }

    fn find_by(&self, search: CouponSearch) -> RepoResult<Vec<Coupon>> {
        self.merge_durable(self.durable.find_by(search.clone()));
        self.cache.find_by(search)
    }

    fn update(&self, coupon: Coupon) -> RepoResult<Coupon> {
        let coupon = self.cache.update(coupon)?;
        if let Err(e) = self.durable.update(coupon.clone()) {
            error!(
                "Coupon {} usage {}/{} is kept in memory only, durable write failed: {}",
                coupon.code, coupon.calls_used, coupon.call_limit, e
            );
        }
        Ok(coupon)
    }
}
