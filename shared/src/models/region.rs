//! Region (postal code) reference data

use serde::{Deserialize, Serialize};

/// One row of the postal code table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Kodepos {
    pub id: i64,
    pub kodepos: String,
    pub kelurahan: String,
    pub kecamatan: String,
    pub kota: String,
    pub provinsi: String,
}
