//! Models contains all structures that are used in different
//! modules of the app

pub mod admin;
pub mod booking;
pub mod coupons;
pub mod payment;
pub mod phone;
pub mod row;
pub mod subscription;
pub mod system;
pub mod validation_rules;

pub use self::admin::*;
pub use self::booking::*;
pub use self::coupons::*;
pub use self::payment::*;
pub use self::phone::*;
pub use self::row::*;
pub use self::subscription::*;
pub use self::system::*;
pub use self::validation_rules::*;
