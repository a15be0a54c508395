pub mod coupons;
pub mod validation;

pub use self::coupons::*;
pub use self::validation::*;
