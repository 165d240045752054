//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (PostgreSQL BIGSERIAL), all timestamps Unix millis.

pub mod discount;
pub mod item;
pub mod project;
pub mod region;
pub mod reimburse;
pub mod retailer;
pub mod transaction;
pub mod user;
pub mod voucher;
pub mod voucher_limit;
pub mod wholesale;

// Re-exports
pub use discount::*;
pub use item::*;
pub use project::*;
pub use region::*;
pub use reimburse::*;
pub use retailer::*;
pub use transaction::*;
pub use user::*;
pub use voucher::*;
pub use voucher_limit::*;
pub use wholesale::*;
