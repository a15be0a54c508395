//! Per-code serialization of coupon mutations.
//!
//! Every code gets its own mutex; the check and the update of a redemption run
//! while holding it, so concurrent redemptions of one coupon can not both
//! observe the same `calls_used`. Different codes never wait for each other.
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use models::CouponCode;

/// Entries are never evicted: the map holds one mutex per code ever redeemed,
/// the same lifetime as the coupon cache.
#[derive(Clone, Default)]
pub struct CouponLocks {
    inner: Arc<Mutex<HashMap<CouponCode, Arc<Mutex<()>>>>>,
}

impl CouponLocks {
    fn lock_for(&self, code: &CouponCode) -> Arc<Mutex<()>> {
        let mut hash_map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        hash_map.entry(code.clone()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Runs `f` while holding the lock of `code`
    pub fn with_lock<T, F>(&self, code: &CouponCode, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let lock = self.lock_for(code);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn same_code_is_serialized() {
        let locks = CouponLocks::default();
        let inside = Arc::new(AtomicUsize::new(0));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let overlaps = overlaps.clone();
                thread::spawn(move || {
                    locks.with_lock(&CouponCode::from("ABCD2345"), || {
                        if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_millis(5));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn codes_get_distinct_locks() {
        let locks = CouponLocks::default();
        let first = locks.lock_for(&CouponCode::from("ABCD2345"));
        let second = locks.lock_for(&CouponCode::from("QWER5678"));
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &locks.lock_for(&CouponCode::from("abcd2345"))));
    }

    #[test]
    fn one_entry_per_code_ever_locked() {
        let locks = CouponLocks::default();
        for code in &["ABCD2345", "abcd2345", "QWER5678"] {
            locks.with_lock(&CouponCode::from(*code), || ());
        }
        assert_eq!(locks.inner.lock().unwrap().len(), 2);
    }
}
