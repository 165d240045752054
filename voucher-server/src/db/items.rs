//! Item catalogue

use shared::error::{AppError, ErrorCode};
use shared::models::{Item, ItemCreate, ItemUpdate};
use sqlx::PgPool;

use crate::error::{ServiceResult, unique_or};
use crate::util::{MAX_NAME_LEN, MAX_SKU_LEN, validate_required_text};

const ITEM_COLUMNS: &str = "id, sku, name, price, is_active";

fn sku_exists(sku: &str) -> AppError {
    AppError::new(ErrorCode::ItemSkuExists).with_detail("sku", sku)
}

fn check_price(price: rust_decimal::Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "price must not be negative",
        ));
    }
    Ok(())
}

pub async fn list(pool: &PgPool) -> ServiceResult<Vec<Item>> {
    let rows = sqlx::query_as(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY sku"))
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn create(pool: &PgPool, data: &ItemCreate) -> ServiceResult<Item> {
    let sku = data.sku.trim().to_ascii_uppercase();
    validate_required_text(&sku, "sku", MAX_SKU_LEN)?;
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    check_price(data.price)?;

    let row: Item = sqlx::query_as(&format!(
        "INSERT INTO items (sku, name, price, is_active) VALUES ($1, $2, $3, $4) RETURNING {ITEM_COLUMNS}"
    ))
    .bind(&sku)
    .bind(data.name.trim())
    .bind(data.price)
    .bind(data.is_active.unwrap_or(true))
    .fetch_one(pool)
    .await
    .map_err(|e| unique_or(e, sku_exists(&sku)))?;

    tracing::info!(item_id = row.id, sku = %row.sku, "Item created");
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: &ItemUpdate) -> ServiceResult<Item> {
    let sku = data.sku.as_deref().map(|s| s.trim().to_ascii_uppercase());
    if let Some(sku) = &sku {
        validate_required_text(sku, "sku", MAX_SKU_LEN)?;
    }
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(price) = data.price {
        check_price(price)?;
    }

    let row: Option<Item> = sqlx::query_as(&format!(
        r#"
        UPDATE items SET
            sku = COALESCE($1, sku),
            name = COALESCE($2, name),
            price = COALESCE($3, price),
            is_active = COALESCE($4, is_active)
        WHERE id = $5
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(&sku)
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.price)
    .bind(data.is_active)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| unique_or(e, sku_exists(sku.as_deref().unwrap_or_default())))?;

    row.ok_or_else(|| {
        AppError::new(ErrorCode::ItemNotFound)
            .with_detail("item_id", id)
            .into()
    })
}
