//! Database access layer
//!
//! Free functions over `&PgPool` (or a transaction connection for the
//! multi-step lifecycle workflows). Every function returns
//! [`ServiceResult`](crate::error::ServiceResult) so handlers can `?` both
//! business-rule refusals and infrastructure failures.

pub mod discounts;
pub mod items;
pub mod limits;
pub mod projects;
pub mod refresh_tokens;
pub mod regions;
pub mod registration;
pub mod reimburses;
pub mod retailers;
pub mod transactions;
pub mod users;
pub mod vouchers;
pub mod wholesales;
