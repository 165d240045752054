//! User Model

use serde::{Deserialize, Serialize};

/// Account without credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub wholesale_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Account with its wholesaler contact, as shown on the profile page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub wholesale_id: Option<i64>,
    pub wholesale_name: Option<String>,
    pub wholesale_phone_number: Option<String>,
}

/// Register user payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub is_staff: Option<bool>,
    pub wholesale_id: Option<i64>,
}

/// Update user payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
    pub is_staff: Option<bool>,
    pub wholesale_id: Option<i64>,
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token pair plus the user info the clients display after login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub access: String,
    pub refresh: String,
    pub userid: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_staff: bool,
    pub wholesale: Option<i64>,
    pub wholesale_name: Option<String>,
    pub wholesale_phone_number: Option<String>,
}

/// Refresh / logout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refreshed token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Change password request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
