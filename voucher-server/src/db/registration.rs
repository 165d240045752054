//! Retailer self-registration
//!
//! One transaction creates the retailer, its photos and a pending voucher.
//! Photo files are already on the media store when [`register`] runs; only
//! their URLs are persisted here.

use shared::error::{AppError, ErrorCode};
use shared::util::{generate_voucher_code, now_millis};
use sqlx::PgPool;

use crate::error::ServiceResult;
use crate::util::{
    MAX_NAME_LEN, MAX_REGION_LEN, MAX_REMARKS_LEN, MAX_TEXT_LEN, non_blank,
    validate_optional_text, validate_phone, validate_required_text,
};

/// Attempts at drawing an unused voucher code
pub const CODE_ATTEMPTS: usize = 5;

/// Registration form fields (photos travel separately)
#[derive(Debug, Clone, Default)]
pub struct NewRegistration {
    pub ws_name: String,
    pub name: String,
    pub phone_number: String,
    pub address: String,
    pub kecamatan: String,
    pub kelurahan: Option<String>,
    pub kota: Option<String>,
    pub provinsi: Option<String>,
    pub project_id: Option<i64>,
    /// Used when no project is given
    pub expired_at: Option<i64>,
}

impl NewRegistration {
    /// Check required fields and normalize the phone number in place
    pub fn validate(&mut self) -> Result<(), AppError> {
        validate_required_text(&self.ws_name, "ws_name", MAX_NAME_LEN)?;
        validate_required_text(&self.name, "name", MAX_NAME_LEN)?;
        validate_required_text(&self.address, "address", MAX_TEXT_LEN)?;
        validate_required_text(&self.kecamatan, "kecamatan", MAX_REGION_LEN)?;
        self.kelurahan = non_blank(self.kelurahan.take());
        self.kota = non_blank(self.kota.take());
        self.provinsi = non_blank(self.provinsi.take());
        validate_optional_text(self.kelurahan.as_deref(), "kelurahan", MAX_REGION_LEN)?;
        validate_optional_text(self.kota.as_deref(), "kota", MAX_REGION_LEN)?;
        validate_optional_text(self.provinsi.as_deref(), "provinsi", MAX_REGION_LEN)?;
        self.phone_number = validate_phone(&self.phone_number, "phone_number")?;
        Ok(())
    }
}

/// A stored photo awaiting its database row
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub image_url: String,
    pub remarks: Option<String>,
}

impl NewPhoto {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_optional_text(self.remarks.as_deref(), "photo_remarks", MAX_REMARKS_LEN)
    }
}

/// What a successful registration created
#[derive(Debug, Clone)]
pub struct Registered {
    pub retailer_id: i64,
    pub voucher_id: i64,
    pub voucher_code: String,
    pub wholesale_name: String,
}

#[derive(sqlx::FromRow)]
struct WholesaleRef {
    id: i64,
    name: String,
    is_active: bool,
}

#[derive(sqlx::FromRow)]
struct ProjectRef {
    is_active: bool,
    periode_end: i64,
}

pub async fn register(
    pool: &PgPool,
    reg: &NewRegistration,
    photos: &[NewPhoto],
) -> ServiceResult<Registered> {
    if photos.is_empty() {
        return Err(AppError::new(ErrorCode::PhotoRequired).into());
    }
    for photo in photos {
        photo.validate()?;
    }

    let mut tx = pool.begin().await?;

    let wholesale: Option<WholesaleRef> = sqlx::query_as(
        "SELECT id, name, is_active FROM wholesales WHERE name = $1 ORDER BY id LIMIT 1",
    )
    .bind(reg.ws_name.trim())
    .fetch_optional(&mut *tx)
    .await?;
    let wholesale = wholesale.ok_or_else(|| {
        AppError::new(ErrorCode::WholesaleNotFound).with_detail("ws_name", reg.ws_name.trim())
    })?;
    if !wholesale.is_active {
        return Err(AppError::new(ErrorCode::WholesaleInactive)
            .with_detail("wholesale_id", wholesale.id)
            .into());
    }

    // Serialize registrations of the same phone number
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&reg.phone_number)
        .execute(&mut *tx)
        .await?;

    // A phone may register again only when every earlier voucher was rejected
    let blocked: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM retailers r
            WHERE r.phone_number = $1
              AND (
                  NOT EXISTS (SELECT 1 FROM vouchers v WHERE v.retailer_id = r.id)
                  OR EXISTS (SELECT 1 FROM vouchers v WHERE v.retailer_id = r.id AND NOT v.is_rejected)
              )
        )
        "#,
    )
    .bind(&reg.phone_number)
    .fetch_one(&mut *tx)
    .await?;
    if blocked {
        return Err(AppError::new(ErrorCode::PhoneAlreadyRegistered)
            .with_detail("phone_number", reg.phone_number.as_str())
            .into());
    }

    let expired_at = match reg.project_id {
        Some(project_id) => {
            let project: Option<ProjectRef> =
                sqlx::query_as("SELECT is_active, periode_end FROM voucher_projects WHERE id = $1")
                    .bind(project_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let project = project.ok_or_else(|| {
                AppError::new(ErrorCode::ProjectNotFound).with_detail("project_id", project_id)
            })?;
            if !project.is_active {
                return Err(AppError::new(ErrorCode::ProjectInactive)
                    .with_detail("project_id", project_id)
                    .into());
            }
            Some(project.periode_end)
        }
        None => reg.expired_at,
    };

    let now = now_millis();
    let retailer_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO retailers (wholesale_id, name, phone_number, address, kelurahan, kecamatan, kota, provinsi, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(wholesale.id)
    .bind(reg.name.trim())
    .bind(&reg.phone_number)
    .bind(reg.address.trim())
    .bind(&reg.kelurahan)
    .bind(reg.kecamatan.trim())
    .bind(&reg.kota)
    .bind(&reg.provinsi)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for photo in photos {
        sqlx::query("INSERT INTO retailer_photos (retailer_id, image_url, remarks) VALUES ($1, $2, $3)")
            .bind(retailer_id)
            .bind(&photo.image_url)
            .bind(&photo.remarks)
            .execute(&mut *tx)
            .await?;
    }

    let mut issued: Option<(i64, String)> = None;
    for attempt in 1..=CODE_ATTEMPTS {
        let code = generate_voucher_code();
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO vouchers (code, retailer_id, project_id, created_at, expired_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&code)
        .bind(retailer_id)
        .bind(reg.project_id)
        .bind(now)
        .bind(expired_at)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(id) = id {
            issued = Some((id, code));
            break;
        }
        tracing::debug!(attempt, "Voucher code collision, retrying");
    }
    let (voucher_id, voucher_code) = issued.ok_or_else(|| {
        tracing::error!(retailer_id, "No unused voucher code after {CODE_ATTEMPTS} attempts");
        AppError::new(ErrorCode::VoucherCodeExhausted)
    })?;

    tx.commit().await?;

    tracing::info!(
        retailer_id,
        voucher_id,
        voucher_code = %voucher_code,
        wholesale_id = wholesale.id,
        photos = photos.len(),
        "Retailer registered"
    );

    Ok(Registered {
        retailer_id,
        voucher_id,
        voucher_code,
        wholesale_name: wholesale.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> NewRegistration {
        NewRegistration {
            ws_name: "Grosir Sumber Rejeki".into(),
            name: "Toko Maju".into(),
            phone_number: "081234567890".into(),
            address: "Jl. Merdeka 1".into(),
            kecamatan: "Gambir".into(),
            kelurahan: Some("  ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_normalizes_phone() {
        let mut reg = form();
        reg.validate().unwrap();
        assert_eq!(reg.phone_number, "6281234567890");
        assert_eq!(reg.kelurahan, None);
    }

    #[test]
    fn test_validate_requires_kecamatan() {
        let mut reg = form();
        reg.kecamatan = String::new();
        let err = reg.validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
    }

    #[test]
    fn test_validate_rejects_bad_phone() {
        let mut reg = form();
        reg.phone_number = "0812-3456".into();
        assert_eq!(reg.validate().unwrap_err().code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_photo_remarks_length() {
        let photo = NewPhoto {
            image_url: "/media/retailer_photos/a.jpg".into(),
            remarks: Some("x".repeat(MAX_REMARKS_LEN + 1)),
        };
        assert!(photo.validate().is_err());
    }
}
