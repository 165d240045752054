//! Wholesale Transaction Handlers

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{TransactionLine, TransactionWithDetails, VoucherRedeem};

use crate::api::form::{self, Upload};
use crate::auth::CurrentUser;
use crate::db::transactions::{self, NewTransaction};
use crate::media::TRANSACTION_IMAGES_DIR;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubmitTransactionResponse {
    pub message: &'static str,
    pub voucher_redeem: VoucherRedeem,
    pub transaction: TransactionWithDetails,
}

#[derive(Default)]
struct TransactionForm {
    voucher_code: Option<String>,
    ws_id: Option<i64>,
    total_price: Option<Decimal>,
    total_price_after_discount: Option<Decimal>,
    lines: Option<Vec<TransactionLine>>,
    image: Option<Upload>,
}

/// `items` arrives as a JSON array inside one form field
fn parse_lines(raw: &str) -> Result<Vec<TransactionLine>, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid items: {e}"))
            .with_detail("field", "items")
    })
}

async fn read_form(mut multipart: Multipart) -> Result<TransactionForm, AppError> {
    let mut form = TransactionForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form::multipart_error)? {
        let name = form::field_name(&field);
        match name.as_str() {
            "image" => form.image = Some(form::upload(field).await?),
            "voucher_code" => form.voucher_code = form::optional(form::text(field).await?),
            "ws_id" => form.ws_id = Some(form::parse_field(&form::text(field).await?, "ws_id")?),
            "total_price" => {
                form.total_price = Some(form::parse_field(&form::text(field).await?, "total_price")?)
            }
            "total_price_after_discount" => {
                form.total_price_after_discount = Some(form::parse_field(
                    &form::text(field).await?,
                    "total_price_after_discount",
                )?)
            }
            "items" => form.lines = Some(parse_lines(&form::text(field).await?)?),
            other => tracing::debug!(field = other, "Ignoring unknown transaction field"),
        }
    }

    Ok(form)
}

/// POST /submit_redeem_voucher/ - record the sale behind a redemption
pub async fn submit(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmitTransactionResponse>), AppError> {
    let form = read_form(multipart).await?;

    let voucher_code = form
        .voucher_code
        .ok_or_else(|| AppError::required("voucher_code"))?;
    let ws_id = form.ws_id.ok_or_else(|| AppError::required("ws_id"))?;
    user.require_wholesale(ws_id)?;

    let mut input = NewTransaction {
        voucher_code,
        ws_id,
        total_price: form.total_price.ok_or_else(|| AppError::required("total_price"))?,
        total_price_after_discount: form
            .total_price_after_discount
            .ok_or_else(|| AppError::required("total_price_after_discount"))?,
        image_url: String::new(),
        lines: form.lines.ok_or_else(|| AppError::required("items"))?,
    };
    input.validate()?;

    let image = form.image.ok_or_else(|| AppError::required("image"))?;
    let mut staged = state.media.stage();
    let outcome = async {
        let relative = staged
            .store_image(TRANSACTION_IMAGES_DIR, image.data, image.file_name)
            .await?;
        input.image_url = state.media.url(&relative);
        Ok::<_, AppError>(transactions::submit(&state.pool, &input, &user.username).await?)
    }
    .await;
    let (voucher_redeem, transaction) = match outcome {
        Ok(saved) => {
            staged.commit();
            saved
        }
        Err(e) => {
            staged.discard().await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitTransactionResponse {
            message: "Voucher redeemed and transaction saved successfully",
            voucher_redeem,
            transaction,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lines() {
        let lines = parse_lines(r#"[{"item_id": 3, "qty": 2, "sub_total": "15000.50"}]"#).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_id, 3);
        assert_eq!(lines[0].qty, Decimal::from(2));

        let err = parse_lines("not json").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }
}
