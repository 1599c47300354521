//! Storage routes over the upload action layer.
//!
//! Every response body is an `ActionResponse`; the status code follows the
//! error kind.

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::MultipartError,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Serialize;
use tracing::{error, warn};

use crate::AppState;
use crate::actions::{ActionError, ActionResponse, ActionResult, UploadForm};
use crate::client::UploadKind;
use stowage_core::storage::{
    FileContent, MAX_FILE_SIZE, MAX_IMAGE_SIZE, StorageError, UploadResult,
};
use stowage_shared::AppError;

/// Creates the storage router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/storage/files", post(upload_file))
        .route("/storage/images", post(upload_image))
        .route("/storage/url/{*key}", get(get_file_url))
        .route("/storage/meta/{*key}", get(get_file_meta))
        .route("/storage/objects/{*key}", delete(delete_file))
        .layer(DefaultBodyLimit::max(body_limit()))
}

fn respond<T: Serialize>(success: StatusCode, result: ActionResult<T>) -> Response {
    let status = match &result {
        Ok(_) => success,
        Err(e) => StatusCode::from_u16(AppError::from(e).status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    };
    (status, Json(ActionResponse::from(result))).into_response()
}

/// Multipart body cap: room for framing around the largest allowed file.
fn body_limit() -> usize {
    usize::try_from(MAX_FILE_SIZE).map_or(usize::MAX, |max| max.saturating_mul(2))
}

/// Maps a multipart read error to the message the caller sees.
///
/// A body over the cap is reported as the policy size violation for the
/// route, naming its limit. Anything else is a malformed upload.
fn multipart_error(err: &MultipartError, max_size: u64) -> ActionError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        let size = u64::try_from(body_limit()).unwrap_or(u64::MAX);
        return ActionError::Validation(StorageError::file_too_large(size, max_size).to_string());
    }
    ActionError::Validation(format!("Invalid upload body: {}", err.body_text()))
}

/// Reads the `file`, `folder` and `isPublic` fields.
async fn read_form(mut multipart: Multipart, max_size: u64) -> ActionResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Malformed multipart body");
        multipart_error(&e, max_size)
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    warn!(error = %e, "Failed to read file field");
                    multipart_error(&e, max_size)
                })?;
                // Browsers send an empty unnamed part when nothing was picked.
                if !(bytes.is_empty() && filename.is_empty()) {
                    form.file = Some(FileContent::new(bytes, filename, content_type));
                }
            }
            "folder" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&e, max_size))?;
                form.folder = Some(value);
            }
            "isPublic" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(&e, max_size))?;
                form.is_public = value.trim().eq_ignore_ascii_case("true");
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Session first, then the body, then the action.
///
/// The body is not read for an anonymous caller.
async fn handle_upload(
    state: &AppState,
    headers: &HeaderMap,
    multipart: Multipart,
    kind: UploadKind,
) -> Response {
    if let Err(e) = state.actions.require_session(headers).await {
        return respond::<UploadResult>(StatusCode::CREATED, Err(e));
    }

    let max_size = match kind {
        UploadKind::File => MAX_FILE_SIZE,
        UploadKind::Image => MAX_IMAGE_SIZE,
    };
    let form = match read_form(multipart, max_size).await {
        Ok(form) => form,
        Err(e) => return respond::<UploadResult>(StatusCode::CREATED, Err(e)),
    };

    let result = match kind {
        UploadKind::File => state.actions.upload_file(headers, form).await,
        UploadKind::Image => state.actions.upload_image(headers, form).await,
    };
    respond(StatusCode::CREATED, result)
}

/// POST /storage/files - Upload a file.
async fn upload_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    handle_upload(&state, &headers, multipart, UploadKind::File).await
}

/// POST /storage/images - Upload an image.
async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    handle_upload(&state, &headers, multipart, UploadKind::Image).await
}

/// GET /storage/url/{key} - Signed download URL.
async fn get_file_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    respond(StatusCode::OK, state.actions.get_file_url(&headers, &key).await)
}

/// GET /storage/meta/{key} - Object metadata.
async fn get_file_meta(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    respond(StatusCode::OK, state.actions.get_file_meta(&headers, &key).await)
}

/// DELETE /storage/objects/{key} - Delete an object.
async fn delete_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Response {
    let result = state.actions.delete_file(&headers, &key).await;
    if let Err(e) = &result {
        error!(key = %key, error = %e, "Delete request failed");
    }
    respond(StatusCode::OK, result)
}
