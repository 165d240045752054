//! Retailers, their photos and office review listings

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ReimburseStatusKind, Retailer, RetailerCreate, RetailerListEntry, RetailerPhoto,
    RetailerPhotoGroup, RetailerUpdate, VerificationReportRow, VoucherStage,
};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::{ServiceResult, foreign_key_or};
use crate::util::{
    MAX_NAME_LEN, MAX_REGION_LEN, MAX_TEXT_LEN, validate_optional_text, validate_phone,
    validate_required_text,
};

const RETAILER_COLUMNS: &str = "id, wholesale_id, name, phone_number, address, kelurahan, \
     kecamatan, kota, provinsi, created_at";

const PHOTO_COLUMNS: &str = "id, retailer_id, image_url, remarks, is_verified, is_approved, \
     is_rejected, verified_at, approved_at, rejected_at";

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::RetailerNotFound).with_detail("retailer_id", id)
}

fn wholesale_missing(wholesale_id: Option<i64>) -> AppError {
    AppError::new(ErrorCode::WholesaleNotFound).with_detail("wholesale_id", wholesale_id)
}

fn validate_regions(
    kelurahan: Option<&str>,
    kecamatan: Option<&str>,
    kota: Option<&str>,
    provinsi: Option<&str>,
) -> Result<(), AppError> {
    validate_optional_text(kelurahan, "kelurahan", MAX_REGION_LEN)?;
    validate_optional_text(kecamatan, "kecamatan", MAX_REGION_LEN)?;
    validate_optional_text(kota, "kota", MAX_REGION_LEN)?;
    validate_optional_text(provinsi, "provinsi", MAX_REGION_LEN)?;
    Ok(())
}

// ── CRUD ──

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<Retailer> {
    let row: Option<Retailer> =
        sqlx::query_as(&format!("SELECT {RETAILER_COLUMNS} FROM retailers WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    row.ok_or_else(|| not_found(id).into())
}

pub async fn create(pool: &PgPool, data: &RetailerCreate) -> ServiceResult<Retailer> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&data.address, "address", MAX_TEXT_LEN)?;
    validate_regions(
        data.kelurahan.as_deref(),
        data.kecamatan.as_deref(),
        data.kota.as_deref(),
        data.provinsi.as_deref(),
    )?;
    let phone = validate_phone(&data.phone_number, "phone_number")?;

    let row = sqlx::query_as(&format!(
        r#"
        INSERT INTO retailers (wholesale_id, name, phone_number, address, kelurahan, kecamatan, kota, provinsi, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {RETAILER_COLUMNS}
        "#
    ))
    .bind(data.wholesale_id)
    .bind(data.name.trim())
    .bind(&phone)
    .bind(data.address.trim())
    .bind(&data.kelurahan)
    .bind(&data.kecamatan)
    .bind(&data.kota)
    .bind(&data.provinsi)
    .bind(now_millis())
    .fetch_one(pool)
    .await
    .map_err(|e| foreign_key_or(e, wholesale_missing(data.wholesale_id)))?;
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: &RetailerUpdate) -> ServiceResult<Retailer> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(address) = &data.address {
        validate_required_text(address, "address", MAX_TEXT_LEN)?;
    }
    validate_regions(
        data.kelurahan.as_deref(),
        data.kecamatan.as_deref(),
        data.kota.as_deref(),
        data.provinsi.as_deref(),
    )?;
    let phone = data
        .phone_number
        .as_deref()
        .map(|p| validate_phone(p, "phone_number"))
        .transpose()?;

    let row: Option<Retailer> = sqlx::query_as(&format!(
        r#"
        UPDATE retailers SET
            wholesale_id = COALESCE($1, wholesale_id),
            name = COALESCE($2, name),
            phone_number = COALESCE($3, phone_number),
            address = COALESCE($4, address),
            kelurahan = COALESCE($5, kelurahan),
            kecamatan = COALESCE($6, kecamatan),
            kota = COALESCE($7, kota),
            provinsi = COALESCE($8, provinsi)
        WHERE id = $9
        RETURNING {RETAILER_COLUMNS}
        "#
    ))
    .bind(data.wholesale_id)
    .bind(data.name.as_deref().map(str::trim))
    .bind(phone)
    .bind(data.address.as_deref().map(str::trim))
    .bind(&data.kelurahan)
    .bind(&data.kecamatan)
    .bind(&data.kota)
    .bind(&data.provinsi)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| foreign_key_or(e, wholesale_missing(data.wholesale_id)))?;
    row.ok_or_else(|| not_found(id).into())
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let rows = sqlx::query("DELETE FROM retailers WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(not_found(id).into());
    }
    Ok(())
}

pub async fn photos(pool: &PgPool, retailer_id: i64) -> ServiceResult<Vec<RetailerPhoto>> {
    get(pool, retailer_id).await?;
    let rows = sqlx::query_as(&format!(
        "SELECT {PHOTO_COLUMNS} FROM retailer_photos WHERE retailer_id = $1 ORDER BY id"
    ))
    .bind(retailer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ── Listings ──

/// `list_retailers` filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetailerFilter {
    pub ws_id: Option<i64>,
    pub voucher_code: Option<String>,
    pub retailer_name: Option<String>,
    /// Stage label, e.g. `PENDING` or `WAITING PAYMENT`
    pub voucher_status: Option<String>,
}

#[derive(sqlx::FromRow)]
struct RetailerListRow {
    #[sqlx(flatten)]
    retailer: Retailer,
    wholesale_name: Option<String>,
    voucher_code: Option<String>,
    is_approved: Option<bool>,
    is_rejected: Option<bool>,
    redeemed: Option<bool>,
    reimburse_status: Option<String>,
}

impl RetailerListRow {
    fn stage(&self) -> Option<VoucherStage> {
        self.voucher_code.as_ref()?;
        let reimburse = self
            .reimburse_status
            .as_deref()
            .and_then(|s| s.parse::<ReimburseStatusKind>().ok());
        Some(VoucherStage::derive(
            self.is_approved.unwrap_or(false),
            self.is_rejected.unwrap_or(false),
            self.redeemed.unwrap_or(false),
            reimburse,
        ))
    }
}

/// Retailers with their latest voucher and its derived stage
pub async fn list(pool: &PgPool, filter: &RetailerFilter) -> ServiceResult<Vec<RetailerListEntry>> {
    let wanted = filter
        .voucher_status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|label| {
            VoucherStage::from_label(label).ok_or_else(|| {
                AppError::validation(format!("Unknown voucher_status '{label}'"))
                    .with_detail("field", "voucher_status")
            })
        })
        .transpose()?;

    let rows: Vec<RetailerListRow> = sqlx::query_as(
        r#"
        SELECT r.id, r.wholesale_id, r.name, r.phone_number, r.address, r.kelurahan,
               r.kecamatan, r.kota, r.provinsi, r.created_at,
               w.name AS wholesale_name,
               v.code AS voucher_code, v.is_approved, v.is_rejected, v.redeemed,
               rs.status AS reimburse_status
        FROM retailers r
        LEFT JOIN wholesales w ON w.id = r.wholesale_id
        LEFT JOIN LATERAL (
            SELECT id, code, is_approved, is_rejected, redeemed
            FROM vouchers WHERE retailer_id = r.id
            ORDER BY created_at DESC, id DESC LIMIT 1
        ) v ON TRUE
        LEFT JOIN reimburses rb ON rb.voucher_id = v.id
        LEFT JOIN reimburse_statuses rs ON rs.id = rb.status_id
        WHERE ($1::BIGINT IS NULL OR r.wholesale_id = $1)
          AND ($2::TEXT IS NULL OR v.code = $2)
          AND ($3::TEXT IS NULL OR r.name ILIKE '%' || $3 || '%')
        ORDER BY r.created_at DESC, r.id DESC
        "#,
    )
    .bind(filter.ws_id)
    .bind(filter.voucher_code.as_deref())
    .bind(filter.retailer_name.as_deref())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let stage = row.stage();
            if wanted.is_some() && stage != wanted {
                return None;
            }
            let r = row.retailer;
            Some(RetailerListEntry {
                id: r.id,
                name: r.name,
                phone_number: r.phone_number,
                address: r.address,
                kelurahan: r.kelurahan,
                kecamatan: r.kecamatan,
                kota: r.kota,
                provinsi: r.provinsi,
                wholesale_id: r.wholesale_id,
                wholesale_name: row.wholesale_name,
                voucher_code: row.voucher_code,
                voucher_status: stage,
                created_at: r.created_at,
            })
        })
        .collect())
}

/// `list_photos` filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoFilter {
    pub is_verified: Option<bool>,
    pub is_approved: Option<bool>,
    pub is_rejected: Option<bool>,
    pub ws_id: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct PhotoRow {
    #[sqlx(flatten)]
    photo: RetailerPhoto,
    retailer_name: String,
    phone_number: String,
    address: String,
    wholesale_name: Option<String>,
    voucher_code: Option<String>,
}

/// Photos grouped per retailer; `NoPhotosFound` when nothing matches
pub async fn list_photos(pool: &PgPool, filter: &PhotoFilter) -> ServiceResult<Vec<RetailerPhotoGroup>> {
    let rows: Vec<PhotoRow> = sqlx::query_as(
        r#"
        SELECT p.id, p.retailer_id, p.image_url, p.remarks, p.is_verified, p.is_approved,
               p.is_rejected, p.verified_at, p.approved_at, p.rejected_at,
               r.name AS retailer_name, r.phone_number, r.address,
               w.name AS wholesale_name,
               (SELECT code FROM vouchers WHERE retailer_id = r.id
                ORDER BY created_at DESC, id DESC LIMIT 1) AS voucher_code
        FROM retailer_photos p
        JOIN retailers r ON r.id = p.retailer_id
        LEFT JOIN wholesales w ON w.id = r.wholesale_id
        WHERE ($1::BOOLEAN IS NULL OR p.is_verified = $1)
          AND ($2::BOOLEAN IS NULL OR p.is_approved = $2)
          AND ($3::BOOLEAN IS NULL OR p.is_rejected = $3)
          AND ($4::BIGINT IS NULL OR r.wholesale_id = $4)
        ORDER BY r.created_at DESC, r.id DESC, p.id
        "#,
    )
    .bind(filter.is_verified)
    .bind(filter.is_approved)
    .bind(filter.is_rejected)
    .bind(filter.ws_id)
    .fetch_all(pool)
    .await?;

    if rows.is_empty() {
        return Err(AppError::new(ErrorCode::NoPhotosFound).into());
    }

    // Rows arrive grouped by retailer
    let mut groups: Vec<RetailerPhotoGroup> = Vec::new();
    for row in rows {
        match groups.last_mut() {
            Some(group) if group.retailer_id == row.photo.retailer_id => group.photos.push(row.photo),
            _ => groups.push(RetailerPhotoGroup {
                retailer_id: row.photo.retailer_id,
                retailer_name: row.retailer_name,
                phone_number: row.phone_number,
                address: row.address,
                wholesale_name: row.wholesale_name,
                voucher_code: row.voucher_code,
                photos: vec![row.photo],
            }),
        }
    }
    Ok(groups)
}

/// Retailers with photos still awaiting review
pub async fn verification_report(pool: &PgPool) -> ServiceResult<Vec<VerificationReportRow>> {
    let rows = sqlx::query_as(
        r#"
        SELECT r.id AS retailer_id, r.name AS retailer_name, w.name AS wholesale_name,
               (SELECT code FROM vouchers WHERE retailer_id = r.id
                ORDER BY created_at DESC, id DESC LIMIT 1) AS voucher_code,
               COUNT(p.id) AS total_photos,
               COUNT(p.id) FILTER (WHERE NOT p.is_verified) AS unverified_photos,
               r.created_at AS registered_at
        FROM retailers r
        JOIN retailer_photos p ON p.retailer_id = r.id
        LEFT JOIN wholesales w ON w.id = r.wholesale_id
        GROUP BY r.id, w.name
        HAVING COUNT(p.id) FILTER (WHERE NOT p.is_verified) > 0
        ORDER BY r.created_at, r.id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
