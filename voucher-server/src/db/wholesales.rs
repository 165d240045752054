//! Wholesaler CRUD and hierarchy queries
//!
//! Every hierarchy read is one recursive CTE. Depth is bounded by
//! [`MAX_DEPTH`] so a corrupt parent loop cannot recurse forever; writes
//! reject cycles up front.

use std::collections::BTreeMap;

use shared::error::{AppError, ErrorCode};
use shared::models::{
    Wholesale, WholesaleCreate, WholesaleHierarchy, WholesaleNode, WholesaleUpdate,
    WholesaleWithLevel,
};
use shared::util::now_millis;
use sqlx::{PgConnection, PgPool};

use crate::error::ServiceResult;
use crate::hierarchy;
use crate::util::{
    MAX_NAME_LEN, MAX_REGION_LEN, MAX_SHORT_TEXT_LEN, MAX_TEXT_LEN, validate_optional_text,
    validate_phone, validate_required_text,
};

/// Recursion bound for hierarchy queries
const MAX_DEPTH: i32 = 64;

/// Serializes re-parenting so concurrent moves cannot form a cycle
const HIERARCHY_LOCK_KEY: i64 = 0x5748_4C53; // "WHLS"

fn cols(alias: &str) -> String {
    [
        "id",
        "name",
        "phone_number",
        "address",
        "pic",
        "city",
        "parent_id",
        "is_active",
        "created_at",
        "updated_at",
    ]
    .iter()
    .map(|c| format!("{alias}.{c}"))
    .collect::<Vec<_>>()
    .join(", ")
}

fn not_found(id: i64) -> AppError {
    AppError::new(ErrorCode::WholesaleNotFound).with_detail("wholesale_id", id)
}

// ── CRUD ──

pub async fn list(pool: &PgPool) -> ServiceResult<Vec<Wholesale>> {
    let rows = sqlx::query_as(&format!(
        "SELECT {} FROM wholesales w ORDER BY w.name, w.id",
        cols("w")
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find(pool: &PgPool, id: i64) -> ServiceResult<Option<Wholesale>> {
    let row = sqlx::query_as(&format!("SELECT {} FROM wholesales w WHERE w.id = $1", cols("w")))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn get(pool: &PgPool, id: i64) -> ServiceResult<Wholesale> {
    find(pool, id).await?.ok_or_else(|| not_found(id).into())
}

fn validate_fields(
    name: Option<&str>,
    address: Option<&str>,
    pic: Option<&str>,
    city: Option<&str>,
) -> Result<(), AppError> {
    if let Some(name) = name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(address, "address", MAX_TEXT_LEN)?;
    validate_optional_text(pic, "pic", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(city, "city", MAX_REGION_LEN)?;
    Ok(())
}

/// Parent followed by all its ancestors
async fn lineage(conn: &mut PgConnection, parent_id: i64) -> ServiceResult<Vec<i64>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        r#"
        WITH RECURSIVE lineage AS (
            SELECT id, parent_id, 0 AS depth FROM wholesales WHERE id = $1
            UNION ALL
            SELECT p.id, p.parent_id, l.depth + 1
            FROM wholesales p JOIN lineage l ON l.parent_id = p.id
            WHERE l.depth < $2
        )
        SELECT id FROM lineage ORDER BY depth
        "#,
    )
    .bind(parent_id)
    .bind(MAX_DEPTH)
    .fetch_all(&mut *conn)
    .await?;
    if ids.is_empty() {
        return Err(AppError::with_message(
            ErrorCode::WholesaleNotFound,
            format!("Parent wholesaler {parent_id} not found"),
        )
        .with_detail("parent_id", parent_id)
        .into());
    }
    Ok(ids)
}

pub async fn create(pool: &PgPool, data: &WholesaleCreate) -> ServiceResult<Wholesale> {
    validate_fields(
        Some(&data.name),
        data.address.as_deref(),
        data.pic.as_deref(),
        data.city.as_deref(),
    )?;
    let phone = validate_phone(&data.phone_number, "phone_number")?;

    let mut tx = pool.begin().await?;
    if let Some(parent_id) = data.parent_id {
        lineage(&mut tx, parent_id).await?;
    }
    let now = now_millis();
    let row: Wholesale = sqlx::query_as(&format!(
        r#"
        INSERT INTO wholesales AS w (name, phone_number, address, pic, city, parent_id, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING {}
        "#,
        cols("w")
    ))
    .bind(data.name.trim())
    .bind(&phone)
    .bind(&data.address)
    .bind(&data.pic)
    .bind(&data.city)
    .bind(data.parent_id)
    .bind(data.is_active.unwrap_or(true))
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    tracing::info!(wholesale_id = row.id, name = %row.name, "Wholesaler created");
    Ok(row)
}

pub async fn update(pool: &PgPool, id: i64, data: &WholesaleUpdate) -> ServiceResult<Wholesale> {
    validate_fields(
        data.name.as_deref(),
        data.address.as_deref(),
        data.pic.as_deref(),
        data.city.as_deref(),
    )?;
    let phone = data
        .phone_number
        .as_deref()
        .map(|p| validate_phone(p, "phone_number"))
        .transpose()?;

    let mut tx = pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(HIERARCHY_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM wholesales WHERE id = $1)")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    if !exists {
        return Err(not_found(id).into());
    }

    // Some(None) detaches, Some(Some(p)) re-parents, None keeps the parent
    let (set_parent, parent_id) = match data.parent_id {
        Some(Some(parent_id)) => {
            let chain = lineage(&mut tx, parent_id).await?;
            hierarchy::check_parent(id, &chain)?;
            (true, Some(parent_id))
        }
        Some(None) => (true, None),
        None => (false, None),
    };

    let row: Wholesale = sqlx::query_as(&format!(
        r#"
        UPDATE wholesales AS w SET
            name = COALESCE($1, name),
            phone_number = COALESCE($2, phone_number),
            address = COALESCE($3, address),
            pic = COALESCE($4, pic),
            city = COALESCE($5, city),
            parent_id = CASE WHEN $6 THEN $7 ELSE parent_id END,
            is_active = COALESCE($8, is_active),
            updated_at = $9
        WHERE w.id = $10
        RETURNING {}
        "#,
        cols("w")
    ))
    .bind(data.name.as_deref().map(str::trim))
    .bind(phone)
    .bind(&data.address)
    .bind(&data.pic)
    .bind(&data.city)
    .bind(set_parent)
    .bind(parent_id)
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(row)
}

/// Delete a wholesaler; its children become roots.
pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<()> {
    let result = sqlx::query("DELETE FROM wholesales WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;
    match result {
        Ok(rows) if rows.rows_affected() == 0 => Err(not_found(id).into()),
        Ok(_) => {
            tracing::info!(wholesale_id = id, "Wholesaler deleted");
            Ok(())
        }
        Err(e) if e.as_database_error().is_some_and(|d| d.is_foreign_key_violation()) => {
            Err(AppError::invalid_request("Wholesaler has redemptions and cannot be deleted")
                .with_detail("wholesale_id", id)
                .into())
        }
        Err(e) => Err(e.into()),
    }
}

// ── Hierarchy ──

/// Every wholesaler with its depth (root = 0)
pub async fn all_with_level(pool: &PgPool) -> ServiceResult<Vec<WholesaleWithLevel>> {
    let rows = sqlx::query_as(&format!(
        r#"
        WITH RECURSIVE tree AS (
            SELECT {}, 0 AS level FROM wholesales r WHERE r.parent_id IS NULL
            UNION ALL
            SELECT {}, t.level + 1 FROM wholesales c JOIN tree t ON c.parent_id = t.id
            WHERE t.level < $1
        )
        SELECT * FROM tree ORDER BY level, name, id
        "#,
        cols("r"),
        cols("c")
    ))
    .bind(MAX_DEPTH)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Root wholesalers with their nested subtrees
pub async fn roots(pool: &PgPool) -> ServiceResult<Vec<WholesaleNode>> {
    let rows = all_with_level(pool).await?;
    Ok(hierarchy::build_forest(&rows))
}

/// Wholesalers without children
pub async fn leaves(pool: &PgPool) -> ServiceResult<Vec<Wholesale>> {
    let rows = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM wholesales w
        WHERE NOT EXISTS (SELECT 1 FROM wholesales c WHERE c.parent_id = w.id)
        ORDER BY w.name, w.id
        "#,
        cols("w")
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn children(pool: &PgPool, id: i64) -> ServiceResult<Vec<Wholesale>> {
    get(pool, id).await?;
    let rows = sqlx::query_as(&format!(
        "SELECT {} FROM wholesales w WHERE w.parent_id = $1 ORDER BY w.name, w.id",
        cols("w")
    ))
    .bind(id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Ancestors of `id`, nearest first
pub async fn ancestors(pool: &PgPool, id: i64) -> ServiceResult<Vec<Wholesale>> {
    get(pool, id).await?;
    let rows = sqlx::query_as(&format!(
        r#"
        WITH RECURSIVE anc AS (
            SELECT {}, 1 AS depth
            FROM wholesales p JOIN wholesales w ON w.parent_id = p.id
            WHERE w.id = $1
            UNION ALL
            SELECT {}, a.depth + 1
            FROM wholesales p JOIN anc a ON a.parent_id = p.id
            WHERE a.depth < $2
        )
        SELECT * FROM anc ORDER BY depth
        "#,
        cols("p"),
        cols("p")
    ))
    .bind(id)
    .bind(MAX_DEPTH)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Depth of `id` (root = 0)
pub async fn level(pool: &PgPool, id: i64) -> ServiceResult<i32> {
    Ok(ancestors(pool, id).await?.len() as i32)
}

/// All descendants of `id` with absolute depth
pub async fn descendants(pool: &PgPool, id: i64) -> ServiceResult<Vec<WholesaleWithLevel>> {
    let base_level = level(pool, id).await?;
    let rows = sqlx::query_as(&format!(
        r#"
        WITH RECURSIVE sub AS (
            SELECT {}, $2 + 1 AS level FROM wholesales c WHERE c.parent_id = $1
            UNION ALL
            SELECT {}, s.level + 1 FROM wholesales c JOIN sub s ON c.parent_id = s.id
            WHERE s.level < $3
        )
        SELECT * FROM sub ORDER BY level, name, id
        "#,
        cols("c"),
        cols("c")
    ))
    .bind(id)
    .bind(base_level)
    .bind(base_level + MAX_DEPTH)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Subtree rooted at `id`
pub async fn tree(pool: &PgPool, id: i64) -> ServiceResult<WholesaleNode> {
    let node = get(pool, id).await?;
    let base_level = level(pool, id).await?;
    let mut rows = descendants(pool, id).await?;
    rows.push(with_level(node, base_level));
    hierarchy::build_forest(&rows)
        .into_iter()
        .find(|n| n.id == id)
        .ok_or_else(|| not_found(id).into())
}

/// Position of `id` in the hierarchy
pub async fn hierarchy_info(pool: &PgPool, id: i64) -> ServiceResult<WholesaleHierarchy> {
    let wholesale = get(pool, id).await?;
    let ancestors = ancestors(pool, id).await?;
    let children = children(pool, id).await?;
    let descendants = descendants(pool, id).await?;
    Ok(WholesaleHierarchy {
        is_root: wholesale.parent_id.is_none(),
        is_leaf: children.is_empty(),
        level: ancestors.len() as i32,
        wholesale,
        children,
        descendants,
        ancestors,
    })
}

/// All wholesalers grouped by depth
pub async fn by_level(pool: &PgPool) -> ServiceResult<BTreeMap<i32, Vec<WholesaleWithLevel>>> {
    let rows = all_with_level(pool).await?;
    Ok(hierarchy::group_by_level(rows))
}

fn with_level(w: Wholesale, level: i32) -> WholesaleWithLevel {
    WholesaleWithLevel {
        id: w.id,
        name: w.name,
        phone_number: w.phone_number,
        address: w.address,
        pic: w.pic,
        city: w.city,
        parent_id: w.parent_id,
        is_active: w.is_active,
        created_at: w.created_at,
        updated_at: w.updated_at,
        level,
    }
}
