//! Postal code reference lookups

use serde::Deserialize;
use shared::error::AppError;
use shared::models::Kodepos;
use sqlx::PgPool;

use crate::error::ServiceResult;

pub async fn kodepos(pool: &PgPool) -> ServiceResult<Vec<String>> {
    let rows = sqlx::query_scalar("SELECT DISTINCT kodepos FROM kodepos ORDER BY kodepos")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn provinsi(pool: &PgPool) -> ServiceResult<Vec<String>> {
    let rows = sqlx::query_scalar("SELECT DISTINCT provinsi FROM kodepos ORDER BY provinsi")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn kota(pool: &PgPool, provinsi: Option<&str>) -> ServiceResult<Vec<String>> {
    let rows = sqlx::query_scalar(
        "SELECT DISTINCT kota FROM kodepos WHERE ($1::TEXT IS NULL OR provinsi = $1) ORDER BY kota",
    )
    .bind(provinsi)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn kecamatan(pool: &PgPool, kota: Option<&str>) -> ServiceResult<Vec<String>> {
    let rows = sqlx::query_scalar(
        "SELECT DISTINCT kecamatan FROM kodepos WHERE ($1::TEXT IS NULL OR kota = $1) ORDER BY kecamatan",
    )
    .bind(kota)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn kelurahan(pool: &PgPool, kecamatan: Option<&str>) -> ServiceResult<Vec<String>> {
    let rows = sqlx::query_scalar(
        "SELECT DISTINCT kelurahan FROM kodepos WHERE ($1::TEXT IS NULL OR kecamatan = $1) ORDER BY kelurahan",
    )
    .bind(kecamatan)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Address parts identifying one postal code row
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KodeposQuery {
    pub kelurahan: Option<String>,
    pub kecamatan: Option<String>,
    pub kota: Option<String>,
    pub provinsi: Option<String>,
}

pub async fn detail(pool: &PgPool, query: &KodeposQuery) -> ServiceResult<Kodepos> {
    let row: Option<Kodepos> = sqlx::query_as(
        r#"
        SELECT id, kodepos, kelurahan, kecamatan, kota, provinsi
        FROM kodepos
        WHERE ($1::TEXT IS NULL OR kelurahan = $1)
          AND ($2::TEXT IS NULL OR kecamatan = $2)
          AND ($3::TEXT IS NULL OR kota = $3)
          AND ($4::TEXT IS NULL OR provinsi = $4)
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(query.kelurahan.as_deref())
    .bind(query.kecamatan.as_deref())
    .bind(query.kota.as_deref())
    .bind(query.provinsi.as_deref())
    .fetch_optional(pool)
    .await?;
    row.ok_or_else(|| AppError::not_found("Kodepos").into())
}
