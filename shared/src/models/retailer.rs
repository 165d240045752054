//! Retailer Model

use serde::{Deserialize, Serialize};

/// Retailer entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Retailer {
    pub id: i64,
    pub wholesale_id: Option<i64>,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub kelurahan: Option<String>,
    pub kecamatan: Option<String>,
    pub kota: Option<String>,
    pub provinsi: Option<String>,
    pub created_at: i64,
}

/// Create retailer payload (office CRUD, no voucher is issued)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerCreate {
    pub wholesale_id: Option<i64>,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub kelurahan: Option<String>,
    pub kecamatan: Option<String>,
    pub kota: Option<String>,
    pub provinsi: Option<String>,
}

/// Update retailer payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetailerUpdate {
    pub wholesale_id: Option<i64>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub kelurahan: Option<String>,
    pub kecamatan: Option<String>,
    pub kota: Option<String>,
    pub provinsi: Option<String>,
}

/// Photo evidence attached to a retailer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct RetailerPhoto {
    pub id: i64,
    pub retailer_id: i64,
    pub image_url: String,
    pub remarks: Option<String>,
    pub is_verified: bool,
    pub is_approved: bool,
    pub is_rejected: bool,
    pub verified_at: Option<i64>,
    pub approved_at: Option<i64>,
    pub rejected_at: Option<i64>,
}

/// Result of a successful registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub message: String,
    pub voucher_code: String,
    pub retailer_id: i64,
}

/// Retailer row in the `list_retailers` view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerListEntry {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub kelurahan: Option<String>,
    pub kecamatan: Option<String>,
    pub kota: Option<String>,
    pub provinsi: Option<String>,
    pub wholesale_id: Option<i64>,
    pub wholesale_name: Option<String>,
    pub voucher_code: Option<String>,
    pub voucher_status: Option<super::VoucherStage>,
    pub created_at: i64,
}

/// Photos of one retailer grouped for the verification screens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetailerPhotoGroup {
    pub retailer_id: i64,
    pub retailer_name: String,
    pub phone_number: String,
    pub address: String,
    pub wholesale_name: Option<String>,
    pub voucher_code: Option<String>,
    pub photos: Vec<RetailerPhoto>,
}

/// Entry of the office verification report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct VerificationReportRow {
    pub retailer_id: i64,
    pub retailer_name: String,
    pub wholesale_name: Option<String>,
    pub voucher_code: Option<String>,
    pub total_photos: i64,
    pub unverified_photos: i64,
    pub registered_at: i64,
}
