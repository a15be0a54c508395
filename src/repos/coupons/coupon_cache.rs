//! CouponCache keeps every coupon the process has seen. It is created once per
//! server and shared by all requests; entries are never evicted.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use failure::Fail;

use models::{Coupon, CouponCode};
use repos::coupons::{CouponSearch, CouponsRepo};
use repos::error::Error as RepoError;
use repos::types::RepoResult;

#[derive(Clone, Default)]
pub struct CouponCacheImpl {
    inner: Arc<Mutex<HashMap<CouponCode, Coupon>>>,
}

impl CouponCacheImpl {
    pub fn get(&self, code: &CouponCode) -> Option<Coupon> {
        self.inner.lock().unwrap().get(code).cloned()
    }

    pub fn contains(&self, code: &CouponCode) -> bool {
        let hash_map = self.inner.lock().unwrap();
        hash_map.contains_key(code)
    }

    /// Adds coupons read from the durable store. Cached entries win, so a
    /// durable row never rolls back usage recorded by this process.
    /// Returns the number of coupons added.
    pub fn merge(&self, coupons: Vec<Coupon>) -> usize {
        let mut hash_map = self.inner.lock().unwrap();
        let mut added = 0;
        for coupon in coupons {
            if !hash_map.contains_key(&coupon.code) {
                hash_map.insert(coupon.code.clone(), coupon);
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl CouponsRepo for CouponCacheImpl {
    fn create(&self, coupon: Coupon) -> RepoResult<Coupon> {
        let mut hash_map = self.inner.lock().unwrap();
        if hash_map.contains_key(&coupon.code) {
            return Err(RepoError::ConstraintViolation(format!("Coupon code {} already exists", coupon.code))
                .context(format!("Creates new coupon: {:?} error occurred", coupon))
                .into());
        }
        hash_map.insert(coupon.code.clone(), coupon.clone());
        Ok(coupon)
    }

    fn list(&self) -> RepoResult<Vec<Coupon>> {
        let hash_map = self.inner.lock().unwrap();
        let mut coupons: Vec<Coupon> = hash_map.values().cloned().collect();
        coupons.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.code.cmp(&b.code)));
        Ok(coupons)
    }

    fn get_by_code(&self, code: &CouponCode) -> RepoResult<Option<Coupon>> {
        Ok(self.get(code))
    }

    fn code_exists(&self, code: &CouponCode) -> RepoResult<bool> {
        Ok(self.contains(code))
    }

    fn find_by(&self, search: CouponSearch) -> RepoResult<Vec<Coupon>> {
        self.list().map(|coupons| coupons.into_iter().filter(|coupon| search.matches(coupon)).collect())
    }

    fn update(&self, coupon: Coupon) -> RepoResult<Coupon> {
        let mut hash_map = self.inner.lock().unwrap();
        hash_map.insert(coupon.code.clone(), coupon.clone());
        Ok(coupon)
    }
}
