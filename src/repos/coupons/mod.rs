pub mod coupon_cache;
pub mod coupons;
pub mod store;

pub use self::coupon_cache::*;
pub use self::coupons::*;
pub use self::store::*;

use models::{normalize_phone, Coupon, CouponCode};
use repos::types::RepoResult;

/// Search coupons
#[derive(Clone, Debug)]
pub enum CouponSearch {
    /// Owner phone, in any accepted format
    Phone(String),
}

impl CouponSearch {
    pub fn matches(&self, coupon: &Coupon) -> bool {
        match *self {
            CouponSearch::Phone(ref phone) => {
                let phone = normalize_phone(phone);
                !phone.is_empty() && coupon.owner_phone == phone
            }
        }
    }
}

pub trait CouponsRepo {
    /// Creates new coupon
    fn create(&self, coupon: Coupon) -> RepoResult<Coupon>;

    /// List all coupons
    fn list(&self) -> RepoResult<Vec<Coupon>>;

    /// Get coupon by code
    fn get_by_code(&self, code: &CouponCode) -> RepoResult<Option<Coupon>>;

    /// Checks whether a code is taken
    fn code_exists(&self, code: &CouponCode) -> RepoResult<bool>;

    /// Search coupons
    fn find_by(&self, search: CouponSearch) -> RepoResult<Vec<Coupon>>;

    /// Update coupon
    fn update(&self, coupon: Coupon) -> RepoResult<Coupon>;
}
