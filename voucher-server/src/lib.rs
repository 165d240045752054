//! Voucher Server
//!
//! Backend for a retailer voucher campaign: public retailer registration
//! with photo evidence, office review against campaign quotas, redemption
//! by wholesalers, purchase recording and reimbursement settlement.
//!
//! # Layout
//!
//! - [`api`]: HTTP routes and handlers
//! - [`db`]: PostgreSQL queries and transactional workflows
//! - [`lifecycle`], [`hierarchy`]: pure business rules
//! - [`auth`]: JWT access tokens, guard middleware, rate limiting
//! - [`media`], [`notify`]: photo storage and office email

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod hierarchy;
pub mod lifecycle;
pub mod logging;
pub mod media;
pub mod notify;
pub mod state;
pub mod time;
pub mod util;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use config::Config;
pub use error::{ServiceError, ServiceResult};
pub use state::AppState;
