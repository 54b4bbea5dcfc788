use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use super::{
    error::ApiError,
    models::{MessageBody, SwapReady, UploadAccepted},
    state::AppState,
};
use crate::queue::QueueError;
use crate::task::SwapState;

/// Plain-text greeting (GET /)
pub async fn welcome() -> &'static str {
    "Welcome to the Faceswap API."
}

/// Swap submission endpoint (POST /upload_image)
///
/// Accepts multipart form-data with two binary image fields, `source` and
/// `target`. Both are written to upload storage under random names, a pending
/// task is inserted, and its id is pushed onto the work queue.
///
/// The enqueue is the system's sole admission control: a full queue rejects
/// the submission with a distinct overloaded response instead of blocking the
/// event loop. The inserted record stays pending in that case and is
/// re-enqueued by the next restart's recovery pass.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut source: Option<(String, Bytes)> = None;
    let mut target: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadUpload(e.to_string()))?
    {
        let name = field.name().map(str::to_owned);
        let filename = field.file_name().unwrap_or_default().to_owned();
        match name.as_deref() {
            Some("source") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadUpload(e.to_string()))?;
                source = Some((filename, data));
            }
            Some("target") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadUpload(e.to_string()))?;
                target = Some((filename, data));
            }
            _ => {}
        }
    }

    let (Some((source_name, source_data)), Some((target_name, target_data))) = (source, target)
    else {
        return Err(ApiError::MissingImage);
    };

    let source_key = state
        .media
        .save_upload(&source_name, source_data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {e}")))?;
    let target_key = state
        .media
        .save_upload(&target_name, target_data)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to store upload: {e}")))?;

    let task = state
        .store
        .insert(&source_key, &target_key)
        .map_err(|e| ApiError::Internal(format!("Failed to store task: {e}")))?;

    match state.queue.enqueue(task.id.clone()) {
        Ok(()) => {}
        Err(QueueError::Full(_)) => {
            state.metrics.task_rejected();
            return Err(ApiError::Overloaded);
        }
        Err(QueueError::Closed) => {
            return Err(ApiError::Internal("Work queue is closed".to_string()));
        }
    }

    state.metrics.task_submitted();
    info!(id = %task.id, "Swap task accepted");

    Ok((
        StatusCode::CREATED,
        Json(UploadAccepted {
            msg: "file uploaded".to_string(),
            id: task.id,
        }),
    ))
}

/// Swap status endpoint (GET /result/{id})
///
/// A pure read over the task store; never touches the queue.
pub async fn swap_result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    if Uuid::parse_str(&id).is_err() {
        return Err(ApiError::InvalidTaskId);
    }

    let task = state
        .store
        .get(&id)
        .map_err(|e| ApiError::Internal(format!("Failed to fetch task: {e}")))?
        .ok_or(ApiError::TaskNotFound)?;

    let response = match task.state() {
        SwapState::Pending => (
            StatusCode::ACCEPTED,
            Json(MessageBody {
                msg: "Swapping in progress.".to_string(),
            }),
        )
            .into_response(),
        SwapState::FacesNotFound { source, target } => {
            let mut sides = Vec::new();
            if source {
                sides.push("source");
            }
            if target {
                sides.push("target");
            }
            (
                StatusCode::BAD_REQUEST,
                Json(MessageBody {
                    msg: format!("Faces not found on: {}", sides.join(", ")),
                }),
            )
                .into_response()
        }
        SwapState::Done { result_path } => (
            StatusCode::OK,
            Json(SwapReady {
                msg: "Swapping done!".to_string(),
                result_url: state.media.result_url(&result_path),
            }),
        )
            .into_response(),
    };

    Ok(response)
}
