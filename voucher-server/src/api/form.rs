//! Multipart form reading shared by the upload routes

use axum::extract::multipart::{Field, MultipartError};
use shared::error::{AppError, ErrorCode};

/// An uploaded file held in memory until validation passes
#[derive(Debug)]
pub struct Upload {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
}

pub fn multipart_error(e: MultipartError) -> AppError {
    AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
}

/// Field name with any `[]` array suffix removed
pub fn field_name(field: &Field<'_>) -> String {
    field
        .name()
        .unwrap_or_default()
        .trim_end_matches("[]")
        .to_string()
}

pub async fn text(field: Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

pub async fn upload(field: Field<'_>) -> Result<Upload, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let data = field.bytes().await.map_err(multipart_error)?.to_vec();
    if data.is_empty() {
        return Err(AppError::with_message(ErrorCode::InvalidRequest, "Empty file"));
    }
    Ok(Upload { data, file_name })
}

/// Parse a numeric form value, naming the field on failure
pub fn parse_field<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::with_message(ErrorCode::InvalidFormat, format!("Invalid {field}: {value}"))
            .with_detail("field", field)
    })
}

/// Blank form values count as absent
pub fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
