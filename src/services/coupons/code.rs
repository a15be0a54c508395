//! Coupon code generation
use rand::{thread_rng, Rng};

use models::{CouponCode, CODE_ALPHABET, CODE_LENGTH};
use repos::types::RepoResult;

/// Draws a code of `CODE_LENGTH` symbols uniformly from `CODE_ALPHABET`.
pub fn random_code<R: Rng>(rng: &mut R) -> CouponCode {
    let code: String = (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0, CODE_ALPHABET.len())] as char)
        .collect();
    CouponCode(code)
}

/// Draws codes until `is_taken` reports a free one. There is no retry bound:
/// with 32^8 possible codes a collision is rare enough.
pub fn generate_code<T>(mut is_taken: T) -> RepoResult<CouponCode>
where
    T: FnMut(&CouponCode) -> RepoResult<bool>,
{
    let mut rng = thread_rng();
    loop {
        let code = random_code(&mut rng);
        if !is_taken(&code)? {
            return Ok(code);
        }
        debug!("Generated coupon code {} is taken, drawing again.", code);
    }
}
