//! Coupons stored as rows of a durable table. The table may be shared with
//! other records (the payments log), rows without a coupon code are ignored.
use failure::Error as FailureError;

use models::{now, Coupon, CouponCode, Row, ToRow};
use repos::coupons::{CouponSearch, CouponsRepo};
use repos::gateway::PersistenceGateway;
use repos::types::RepoResult;

/// Coupons repository, responsible for handling coupon rows
pub struct CouponsRepoImpl<'a> {
    pub gateway: &'a PersistenceGateway,
    pub table: String,
}

impl<'a> CouponsRepoImpl<'a> {
    pub fn new(gateway: &'a PersistenceGateway, table: String) -> Self {
        Self { gateway, table }
    }

    /// Coupons with their row index in the table
    fn read_coupons(&self) -> RepoResult<Vec<(usize, Row, Coupon)>> {
        let read_at = now();
        let rows = self.gateway.read_all(&self.table)?;
        Ok(rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match Coupon::from_row(&row, read_at) {
                Ok(Some(coupon)) => Some((index, row, coupon)),
                Ok(None) => None,
                Err(e) => {
                    warn!("Skipping row {} of table {}: {}", index, self.table, e);
                    None
                }
            })
            .collect())
    }
}

impl<'a> CouponsRepo for CouponsRepoImpl<'a> {
    /// Creates new coupon
    fn create(&self, coupon: Coupon) -> RepoResult<Coupon> {
        debug!("Create new coupon {:?}.", coupon);
        self.gateway
            .append(&self.table, coupon.to_row())
            .map(|_| coupon.clone())
            .map_err(|e: FailureError| e.context(format!("Creates new coupon: {:?} error occurred", coupon)).into())
    }

    /// List all coupons
    fn list(&self) -> RepoResult<Vec<Coupon>> {
        debug!("Find all coupons.");
        self.read_coupons()
            .map(|coupons| coupons.into_iter().map(|(_, _, coupon)| coupon).collect())
            .map_err(|e: FailureError| e.context("List all coupons").into())
    }

    /// Get coupon by code
    fn get_by_code(&self, code: &CouponCode) -> RepoResult<Option<Coupon>> {
        debug!("Find in coupons with code {}.", code);
        self.read_coupons()
            .map(|coupons| {
                coupons
                    .into_iter()
                    .map(|(_, _, coupon)| coupon)
                    .find(|coupon| coupon.code == *code)
            })
            .map_err(|e: FailureError| e.context(format!("Find coupon by code: {} error occurred", code)).into())
    }

    fn code_exists(&self, code: &CouponCode) -> RepoResult<bool> {
        self.get_by_code(code).map(|coupon| coupon.is_some())
    }

    /// Search coupons
    fn find_by(&self, search: CouponSearch) -> RepoResult<Vec<Coupon>> {
        debug!("Get coupons by search: {:?}.", search);
        self.read_coupons()
            .map(|coupons| {
                coupons
                    .into_iter()
                    .map(|(_, _, coupon)| coupon)
                    .filter(|coupon| search.matches(coupon))
                    .collect()
            })
            .map_err(|e: FailureError| e.context("Search coupons failed.").into())
    }

    /// Rewrites usage columns of the first row with the same code, keeping
    /// the other columns as they are. Appends a new row when none matches.
    fn update(&self, coupon: Coupon) -> RepoResult<Coupon> {
        debug!("Updating coupon {} with usage {}/{}.", coupon.code, coupon.calls_used, coupon.call_limit);
        self.read_coupons()
            .and_then(|coupons| match coupons.into_iter().find(|&(_, _, ref stored)| stored.code == coupon.code) {
                Some((index, mut row, _)) => {
                    row.extend(coupon.usage_cells());
                    self.gateway.update(&self.table, index, row)
                }
                None => self.gateway.append(&self.table, coupon.to_row()),
            })
            .map(|_| coupon.clone())
            .map_err(|e: FailureError| e.context(format!("Updates specific coupon: {} error occurred", coupon.code)).into())
    }
}
