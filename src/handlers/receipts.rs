use axum::extract::{Multipart, State};
use axum::response::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::receipts::{is_allowed_file_name, is_safe_component, ImageKind, DEFAULT_FOLDER};
use crate::schemas::{ApiResponse, AppState};

/// Multipart form accepted by the upload endpoint
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ReceiptUploadForm {
    /// png, jpg, jpeg or tiff
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
    /// Target sub-folder, `receipts` when omitted
    folder_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, PartialEq)]
pub struct ReceiptUploadResponse {
    pub filename: String,
    pub folder: String,
    pub store_name: Option<String>,
    pub amount: Option<Decimal>,
}

struct UploadedFile {
    name: String,
    bytes: Vec<u8>,
}

/// Store a receipt image and read store name and total from it
#[utoipa::path(
    post,
    path = "/image/upload-receipt",
    tag = "receipts",
    security(("bearer_auth" = [])),
    request_body(content = ReceiptUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Receipt stored", body = ApiResponse<ReceiptUploadResponse>),
        (status = 400, description = "Missing, disallowed or unreadable file", body = crate::schemas::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::schemas::ErrorResponse)
    )
)]
#[instrument(skip(state, multipart))]
pub async fn upload_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> ApiResult<Json<ApiResponse<ReceiptUploadResponse>>> {
    let mut upload: Option<UploadedFile> = None;
    let mut folder = DEFAULT_FOLDER.to_string();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("Malformed multipart body: {}", e);
        ApiError::bad_request(e.body_text())
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                upload = Some(UploadedFile {
                    name,
                    bytes: bytes.to_vec(),
                });
            }
            Some("folder_name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                let text = text.trim();
                if !text.is_empty() {
                    folder = text.to_string();
                }
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let upload = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if !is_allowed_file_name(&upload.name) {
        warn!("Rejected upload file name '{}'", upload.name);
        return Err(ApiError::bad_request("Invalid file"));
    }
    if !is_safe_component(&folder) {
        warn!("Rejected upload folder '{}'", folder);
        return Err(ApiError::bad_request("Invalid folder name"));
    }

    let kind = ImageKind::sniff(&upload.bytes).ok_or_else(|| {
        ApiError::bad_request("Image processing failed: unrecognised image format")
    })?;

    let directory: PathBuf = [state.config.upload_dir.as_str(), folder.as_str()]
        .iter()
        .collect();
    tokio::fs::create_dir_all(&directory).await.map_err(|e| {
        error!("Cannot create upload directory {:?}: {}", directory, e);
        ApiError::Internal(format!("Cannot create upload directory: {e}"))
    })?;
    let path = directory.join(&upload.name);
    tokio::fs::write(&path, &upload.bytes).await.map_err(|e| {
        error!("Cannot write upload {:?}: {}", path, e);
        ApiError::Internal(format!("Cannot store upload: {e}"))
    })?;

    let scan = state.scanner.scan(kind, &upload.bytes);
    info!(
        "User {} uploaded {} receipt '{}' ({} bytes) into '{}'",
        auth.user_id,
        kind,
        upload.name,
        upload.bytes.len(),
        folder
    );

    Ok(Json(ApiResponse {
        data: ReceiptUploadResponse {
            filename: upload.name,
            folder,
            store_name: scan.store_name,
            amount: scan.amount,
        },
        message: "Receipt uploaded".to_string(),
        success: true,
    }))
}
