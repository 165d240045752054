//! End-to-end lifecycle against a real PostgreSQL.
//!
//! Run with `TEST_DATABASE_URL=postgres://... cargo test -- --ignored`.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ItemCreate, RetailerCreate, RetailerUpdate, TransactionLine, UserCreate, VoucherLimitCreate,
    VoucherProjectCreate, VoucherProjectUpdate, WholesaleCreate,
};
use sqlx::PgPool;
use voucher_server::ServiceError;
use voucher_server::db::registration::{self, NewPhoto, NewRegistration, Registered};
use voucher_server::db::transactions::{self, NewTransaction};
use voucher_server::db::{
    items, limits, projects, refresh_tokens, reimburses, retailers, users, vouchers, wholesales,
};
use voucher_server::lifecycle::PhotoDecision;

async fn pool() -> PgPool {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPool::connect(&url).await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

fn suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

fn random_phone() -> String {
    format!("628{:09}", rand::random::<u32>() % 1_000_000_000)
}

fn app_error(err: ServiceError) -> AppError {
    match err {
        ServiceError::App(e) => e,
        ServiceError::Db(e) => panic!("unexpected database error: {e}"),
    }
}

fn app_code(err: ServiceError) -> ErrorCode {
    app_error(err).code
}

struct Campaign {
    ws_id: i64,
    ws_name: String,
    project_id: i64,
    limit_id: i64,
}

async fn campaign(pool: &PgPool, quota: i32) -> Campaign {
    let ws_name = format!("Grosir {}", suffix());
    let ws = wholesales::create(
        pool,
        &WholesaleCreate {
            name: ws_name.clone(),
            phone_number: "6281100000000".to_string(),
            address: None,
            pic: None,
            city: Some("Bandung".to_string()),
            parent_id: None,
            is_active: Some(true),
        },
    )
    .await
    .unwrap();

    let project = projects::create(
        pool,
        &VoucherProjectCreate {
            name: format!("Campaign {}", suffix()),
            description: None,
            periode_start: "2020-01-01".to_string(),
            periode_end: "2099-12-31".to_string(),
            is_active: Some(true),
        },
        "tester",
    )
    .await
    .unwrap();

    let limit = limits::create(
        pool,
        &VoucherLimitCreate {
            description: None,
            limit: quota,
            current_count: None,
            voucher_project_id: Some(project.id),
        },
    )
    .await
    .unwrap();

    Campaign {
        ws_id: ws.id,
        ws_name,
        project_id: project.id,
        limit_id: limit.id,
    }
}

async fn register(pool: &PgPool, campaign: &Campaign) -> Registered {
    let mut reg = NewRegistration {
        ws_name: campaign.ws_name.clone(),
        name: "Toko Sinar".to_string(),
        phone_number: random_phone(),
        address: "Jl. Merdeka 1".to_string(),
        kecamatan: "Coblong".to_string(),
        project_id: Some(campaign.project_id),
        ..Default::default()
    };
    reg.validate().unwrap();
    let photos = [NewPhoto {
        image_url: "/media/retailer_photos/test.jpg".to_string(),
        remarks: Some("storefront".to_string()),
    }];
    registration::register(pool, &reg, &photos).await.unwrap()
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_approvals_respect_quota() {
    let pool = pool().await;
    let campaign = campaign(&pool, 5).await;

    let mut retailer_ids = Vec::new();
    for _ in 0..10 {
        retailer_ids.push(register(&pool, &campaign).await.retailer_id);
    }

    let handles: Vec<_> = retailer_ids
        .into_iter()
        .map(|id| {
            let pool = pool.clone();
            tokio::spawn(async move { vouchers::decide(&pool, id, PhotoDecision::Approve).await })
        })
        .collect();

    let mut approved = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => approved += 1,
            Err(e) => {
                assert_eq!(app_code(e), ErrorCode::QuotaExceeded);
                refused += 1;
            }
        }
    }
    assert_eq!(approved, 5);
    assert_eq!(refused, 5);

    let limit = limits::get(&pool, campaign.limit_id).await.unwrap();
    assert_eq!(limit.current_count, 5);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_same_phone_blocked_until_rejected() {
    let pool = pool().await;
    let campaign = campaign(&pool, 10).await;
    let first = register(&pool, &campaign).await;

    let phone: String = sqlx::query_scalar("SELECT phone_number FROM retailers WHERE id = $1")
        .bind(first.retailer_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let again = NewRegistration {
        ws_name: campaign.ws_name.clone(),
        name: "Toko Sinar".to_string(),
        phone_number: phone,
        address: "Jl. Merdeka 1".to_string(),
        kecamatan: "Coblong".to_string(),
        ..Default::default()
    };
    let photos = [NewPhoto {
        image_url: "/media/retailer_photos/again.jpg".to_string(),
        remarks: None,
    }];

    let err = registration::register(&pool, &again, &photos).await.unwrap_err();
    assert_eq!(app_code(err), ErrorCode::PhoneAlreadyRegistered);

    vouchers::decide(&pool, first.retailer_id, PhotoDecision::Reject)
        .await
        .unwrap();
    let second = registration::register(&pool, &again, &photos).await.unwrap();
    assert_ne!(second.voucher_code, first.voucher_code);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_voucher_lifecycle_to_paid() {
    let pool = pool().await;
    let campaign = campaign(&pool, 10).await;
    let registered = register(&pool, &campaign).await;
    let code = registered.voucher_code.clone();

    // Not approved yet
    let err = vouchers::redeem(&pool, &code, campaign.ws_id).await.unwrap_err();
    assert_eq!(app_code(err), ErrorCode::PhotosNotVerified);

    let outcome = vouchers::decide(&pool, registered.retailer_id, PhotoDecision::Approve)
        .await
        .unwrap();
    assert_eq!(outcome.quota.map(|q| q.current_count), Some(1));

    let err = vouchers::decide(&pool, registered.retailer_id, PhotoDecision::Reject)
        .await
        .unwrap_err();
    assert_eq!(app_code(err), ErrorCode::VoucherAlreadyDecided);

    let err = vouchers::redeem(&pool, &code, campaign.ws_id + 1_000_000)
        .await
        .unwrap_err();
    assert_eq!(app_code(err), ErrorCode::WholesalerMismatch);

    let redeem = vouchers::redeem(&pool, &code, campaign.ws_id).await.unwrap();
    assert_eq!(redeem.wholesale_id, campaign.ws_id);

    let err = vouchers::redeem(&pool, &code, campaign.ws_id).await.unwrap_err();
    assert_eq!(app_code(err), ErrorCode::VoucherInvalid);

    let sku = suffix()[..3].to_ascii_uppercase();
    let item = items::create(
        &pool,
        &ItemCreate {
            sku,
            name: "Semen 50kg".to_string(),
            price: Decimal::from(65_000),
            is_active: None,
        },
    )
    .await
    .unwrap();

    let input = NewTransaction {
        voucher_code: code.clone(),
        ws_id: campaign.ws_id,
        total_price: Decimal::from(130_000),
        total_price_after_discount: Decimal::from(120_000),
        image_url: "/media/wholesale_transactions/receipt.jpg".to_string(),
        lines: vec![TransactionLine {
            item_id: item.id,
            qty: Decimal::from(2),
            sub_total: Decimal::from(130_000),
        }],
    };
    let (_, transaction) = transactions::submit(&pool, &input, "agent").await.unwrap();
    assert_eq!(transaction.details.len(), 1);
    assert_eq!(transaction.transaction.created_by.as_deref(), Some("agent"));

    let err = transactions::submit(&pool, &input, "agent").await.unwrap_err();
    assert_eq!(app_code(err), ErrorCode::TransactionAlreadySubmitted);

    let results = reimburses::submit(&pool, &[code.clone(), "NOPE000000".to_string()], "office")
        .await
        .unwrap();
    assert!(results[0].success);
    assert!(!results[1].success);
    assert_eq!(results[1].error_code, Some(ErrorCode::VoucherNotFound.code()));
    let reimburse_id = results[0].reimburse_id.unwrap();

    let err = reimburses::update_status(&pool, reimburse_id, "waiting", "office")
        .await
        .unwrap_err();
    assert_eq!(app_code(err), ErrorCode::InvalidReimburseStatus);

    let claim = reimburses::update_status(&pool, reimburse_id, "completed", "office")
        .await
        .unwrap();
    assert!(claim.completed_at.is_some());
    let claim = reimburses::update_status(&pool, reimburse_id, "paid", "office")
        .await
        .unwrap();
    assert!(claim.paid_at.is_some());

    let err = reimburses::update_status(&pool, reimburse_id, "completed", "office")
        .await
        .unwrap_err();
    assert_eq!(app_code(err), ErrorCode::ReimburseTransitionInvalid);
}

/// Register, approve and redeem one voucher; returns its code
async fn redeemed_voucher(pool: &PgPool, campaign: &Campaign) -> String {
    let registered = register(pool, campaign).await;
    vouchers::decide(pool, registered.retailer_id, PhotoDecision::Approve)
        .await
        .unwrap();
    vouchers::redeem(pool, &registered.voucher_code, campaign.ws_id)
        .await
        .unwrap();
    registered.voucher_code
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_reimburse_history_and_single_claim() {
    let pool = pool().await;
    let campaign = campaign(&pool, 10).await;
    let code = redeemed_voucher(&pool, &campaign).await;

    let results = reimburses::submit(&pool, &[code.clone()], "office").await.unwrap();
    let reimburse_id = results[0].reimburse_id.unwrap();

    let again = reimburses::submit(&pool, &[code.clone()], "office").await.unwrap();
    assert!(!again[0].success);
    assert_eq!(
        again[0].error_code,
        Some(ErrorCode::ReimburseAlreadySubmitted.code())
    );

    reimburses::update_status(&pool, reimburse_id, "completed", "office")
        .await
        .unwrap();
    let claim = reimburses::update_status(&pool, reimburse_id, "paid", "office")
        .await
        .unwrap();

    let history: Vec<(i64, String)> = sqlx::query_as(
        "SELECT id, status FROM reimburse_statuses WHERE reimburse_id = $1 ORDER BY id",
    )
    .bind(reimburse_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    let statuses: Vec<&str> = history.iter().map(|(_, s)| s.as_str()).collect();
    assert_eq!(statuses, ["waiting", "completed", "paid"]);
    assert_eq!(claim.status_id, history.last().map(|(id, _)| *id));

    // Two batches racing for the same voucher: one claim
    let code = redeemed_voucher(&pool, &campaign).await;
    let codes = [code.clone()];
    let (a, b) = tokio::join!(
        reimburses::submit(&pool, &codes, "office"),
        reimburses::submit(&pool, &codes, "office"),
    );
    let successes = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|r| r[0].success)
        .count();
    assert_eq!(successes, 1);
    let claims: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reimburses r JOIN vouchers v ON v.id = r.voucher_id WHERE v.code = $1",
    )
    .bind(&code)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(claims, 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_project_end_moves_unredeemed_expiry() {
    let pool = pool().await;
    let campaign = campaign(&pool, 10).await;
    let open = register(&pool, &campaign).await;
    let used_code = redeemed_voucher(&pool, &campaign).await;

    let before = projects::get(&pool, campaign.project_id).await.unwrap();
    let project = projects::update(
        &pool,
        campaign.project_id,
        &VoucherProjectUpdate {
            periode_end: Some("2098-06-30".to_string()),
            ..Default::default()
        },
        "office",
    )
    .await
    .unwrap();
    assert_ne!(project.periode_end, before.periode_end);

    let open_expiry: Option<i64> =
        sqlx::query_scalar("SELECT expired_at FROM vouchers WHERE id = $1")
            .bind(open.voucher_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(open_expiry, Some(project.periode_end));

    let used = vouchers::find_by_code(&pool, &used_code).await.unwrap().unwrap();
    assert_eq!(used.expired_at, Some(before.periode_end));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_increment_refusal_reports_unchanged_counter() {
    let pool = pool().await;
    let campaign = campaign(&pool, 3).await;

    let status = limits::increment(&pool, campaign.limit_id, 2).await.unwrap();
    assert_eq!((status.current_count, status.remaining), (2, 1));

    let err = app_error(limits::increment(&pool, campaign.limit_id, 2).await.unwrap_err());
    assert_eq!(err.code, ErrorCode::QuotaExceeded);
    let details = err.details.unwrap();
    assert_eq!(details["current_count"], 2);
    assert_eq!(details["limit"], 3);
    assert_eq!(details["remaining"], 1);

    let limit = limits::get(&pool, campaign.limit_id).await.unwrap();
    assert_eq!(limit.current_count, 2);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_retailer_unknown_wholesale_is_not_found() {
    let pool = pool().await;
    let campaign = campaign(&pool, 1).await;
    let registered = register(&pool, &campaign).await;

    let err = retailers::update(
        &pool,
        registered.retailer_id,
        &RetailerUpdate {
            wholesale_id: Some(i64::MAX),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(app_code(err), ErrorCode::WholesaleNotFound);

    let err = retailers::create(
        &pool,
        &RetailerCreate {
            wholesale_id: Some(i64::MAX),
            name: "Toko Baru".to_string(),
            phone_number: random_phone(),
            address: "Jl. Asia Afrika 8".to_string(),
            kelurahan: None,
            kecamatan: None,
            kota: None,
            provinsi: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(app_code(err), ErrorCode::WholesaleNotFound);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_refresh_tokens_belong_to_their_owner() {
    let pool = pool().await;
    let mut accounts = Vec::new();
    for _ in 0..2 {
        let user = users::create(
            &pool,
            &UserCreate {
                username: format!("agent_{}", suffix()),
                email: None,
                password: String::new(),
                is_staff: None,
                wholesale_id: None,
            },
            "$argon2id$placeholder",
        )
        .await
        .unwrap();
        accounts.push(user);
    }
    let (owner, other) = (&accounts[0], &accounts[1]);

    let token = refresh_tokens::create(&pool, owner.id, 7).await.unwrap();
    assert!(!refresh_tokens::revoke(&pool, &token, other.id).await.unwrap());
    assert!(refresh_tokens::revoke(&pool, &token, owner.id).await.unwrap());

    refresh_tokens::purge_stale(&pool).await.unwrap();
    let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens WHERE id = $1")
        .bind(&token)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(left, 0);

    // Deleting one's own account ends every session
    let live = refresh_tokens::create(&pool, other.id, 7).await.unwrap();
    refresh_tokens::revoke_all(&pool, other.id).await.unwrap();
    users::delete(&pool, other.id).await.unwrap();
    assert!(users::find_by_id(&pool, other.id).await.unwrap().is_none());
    assert!(refresh_tokens::rotate(&pool, &live, 7).await.unwrap().is_none());
}
