//! Repos is a module responsible for interacting with the durable store
pub mod coupons;
pub mod error;
pub mod gateway;
pub mod records;
pub mod repo_factory;
pub mod types;

pub use self::coupons::*;
pub use self::gateway::*;
pub use self::records::*;
pub use self::repo_factory::*;
pub use self::types::*;
