//! Registration Handler

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use shared::error::{AppError, ErrorCode};
use shared::models::RegistrationReceipt;

use super::MAX_PHOTOS;
use crate::api::form::{self, Upload};
use crate::db::registration::{self, NewPhoto, NewRegistration};
use crate::media::RETAILER_PHOTOS_DIR;
use crate::notify::RegistrationNotice;
use crate::state::AppState;
use crate::time::{BUSINESS_TZ, parse_expiry};

#[derive(Default)]
struct RegistrationForm {
    reg: NewRegistration,
    photos: Vec<Upload>,
    remarks: Vec<Option<String>>,
}

async fn read_form(mut multipart: Multipart) -> Result<RegistrationForm, AppError> {
    let mut form = RegistrationForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form::multipart_error)? {
        let name = form::field_name(&field);
        match name.as_str() {
            "photos" | "photo" => {
                if form.photos.len() == MAX_PHOTOS {
                    return Err(AppError::with_message(
                        ErrorCode::ValueOutOfRange,
                        format!("At most {MAX_PHOTOS} photos per registration"),
                    ));
                }
                form.photos.push(form::upload(field).await?);
            }
            "photo_remarks" => form.remarks.push(form::optional(form::text(field).await?)),
            "ws_name" => form.reg.ws_name = form::text(field).await?,
            "name" => form.reg.name = form::text(field).await?,
            "phone_number" => form.reg.phone_number = form::text(field).await?,
            "address" => form.reg.address = form::text(field).await?,
            "kecamatan" => form.reg.kecamatan = form::text(field).await?,
            "kelurahan" => form.reg.kelurahan = form::optional(form::text(field).await?),
            "kota" => form.reg.kota = form::optional(form::text(field).await?),
            "provinsi" => form.reg.provinsi = form::optional(form::text(field).await?),
            "project_id" => {
                if let Some(raw) = form::optional(form::text(field).await?) {
                    form.reg.project_id = Some(form::parse_field(&raw, "project_id")?);
                }
            }
            "expired_at" => {
                if let Some(raw) = form::optional(form::text(field).await?) {
                    form.reg.expired_at = Some(parse_expiry(&raw)?);
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown registration field"),
        }
    }

    Ok(form)
}

/// POST /retailer_register_upload/
pub async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RegistrationReceipt>), AppError> {
    let RegistrationForm {
        mut reg,
        photos: uploads,
        mut remarks,
    } = read_form(multipart).await?;

    reg.validate()?;
    if uploads.is_empty() {
        return Err(AppError::new(ErrorCode::PhotoRequired));
    }
    // Remarks pair with photos by position
    remarks.resize(uploads.len(), None);

    let pending: Vec<NewPhoto> = remarks
        .into_iter()
        .map(|remarks| NewPhoto {
            image_url: String::new(),
            remarks,
        })
        .collect();
    for photo in &pending {
        photo.validate()?;
    }

    // Files written for a registration that is then refused are removed again
    let mut staged = state.media.stage();
    let outcome = async {
        let mut photos = Vec::with_capacity(pending.len());
        for (upload, photo) in uploads.into_iter().zip(pending) {
            let relative = staged
                .store_image(RETAILER_PHOTOS_DIR, upload.data, upload.file_name)
                .await?;
            photos.push(NewPhoto {
                image_url: state.media.url(&relative),
                ..photo
            });
        }
        Ok::<_, AppError>(registration::register(&state.pool, &reg, &photos).await?)
    }
    .await;
    let registered = match outcome {
        Ok(registered) => {
            staged.commit();
            registered
        }
        Err(e) => {
            staged.discard().await;
            return Err(e);
        }
    };

    state.notifier.spawn_registration_notice(RegistrationNotice {
        retailer_name: reg.name.trim().to_string(),
        phone_number: reg.phone_number.clone(),
        wholesale_name: registered.wholesale_name.clone(),
        submitted_on: chrono::Utc::now()
            .with_timezone(&BUSINESS_TZ)
            .format("%Y-%m-%d")
            .to_string(),
    });

    Ok((
        StatusCode::CREATED,
        Json(RegistrationReceipt {
            message: "Retailer registered successfully".to_string(),
            voucher_code: registered.voucher_code,
            retailer_id: registered.retailer_id,
        }),
    ))
}
