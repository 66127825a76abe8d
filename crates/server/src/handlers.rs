//! Storage request handlers
//!
//! Each handler checks the activation flag before anything else, builds the
//! object key from the two route segments and makes exactly one call into the
//! `ObjectStore`.

use std::io;
use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::{Bytes, BytesMut};
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use utoipa::ToSchema;

use fsg_core::{ByteStream, Error, ObjectInfo, ObjectKey};

use crate::error::ApiError;
use crate::router::AppState;

/// Content type of every downloaded file, whatever it actually holds
pub const FILE_CONTENT_TYPE: &str = "text/plain";

/// Multipart field name clients are expected to use for the payload
pub const FILE_FIELD: &str = "file";

/// Chunks buffered between a multipart field and the storage upload
const UPLOAD_CHANNEL_DEPTH: usize = 8;

/// Download a file, buffered in full
#[utoipa::path(
    get,
    path = "/api/s3/{path}/{file_name}",
    tag = "files",
    params(
        ("path" = String, Path, description = "Directory part of the key; nested directories percent-encoded"),
        ("file_name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File contents", body = String, content_type = "text/plain"),
        (status = 400, description = "Is not active, File not found or Error find file", body = String),
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path((path, file_name)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let key = state.object_key(path, file_name)?;

    let stream = state
        .store
        .get_object(&state.bucket, &key.to_string())
        .await
        .map_err(|e| match e {
            e if e.is_not_found() => ApiError::FileNotFound,
            e => {
                tracing::warn!(key = %key, "Failed to get object: {e}");
                ApiError::FindFailed
            }
        })?;

    let data = collect_body(stream).await.map_err(|e| {
        tracing::warn!(key = %key, "Failed to read object body: {e}");
        ApiError::FindFailed
    })?;

    Ok(([(header::CONTENT_TYPE, FILE_CONTENT_TYPE)], data).into_response())
}

/// List every object in the bucket
///
/// The listing stream is consumed to its end, which is the completion
/// signal, and is requested once per call.
#[utoipa::path(
    get,
    path = "/api/s3",
    tag = "files",
    responses(
        (status = 200, description = "Every object in the bucket", body = Vec<ObjectInfo>),
        (status = 400, description = "Is not active or Error list files", body = String),
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ObjectInfo>>, ApiError> {
    state.ensure_active()?;

    let items: Vec<ObjectInfo> = state
        .store
        .list_objects(&state.bucket)
        .try_collect()
        .await
        .map_err(|e| {
            tracing::warn!(bucket = %state.bucket, "Failed to list objects: {e}");
            ApiError::ListFailed
        })?;

    tracing::debug!(bucket = %state.bucket, count = items.len(), "listing complete");
    Ok(Json(items))
}

/// Upload a file, overwriting any object at the same key
///
/// Accepts a `multipart/form-data` body carrying one file field, or a raw
/// body. The payload is streamed to storage as it arrives.
#[utoipa::path(
    post,
    path = "/api/s3/{path}/{file_name}",
    tag = "files",
    params(
        ("path" = String, Path, description = "Directory part of the key; nested directories percent-encoded"),
        ("file_name" = String, Path, description = "File name")
    ),
    request_body(
        content = String,
        content_type = "application/octet-stream",
        description = "Raw file bytes, or multipart/form-data with a `file` field"
    ),
    responses(
        (status = 200, description = "File stored"),
        (status = 400, description = "Is not active or File is required", body = String),
        (status = 500, description = "Backend failure", body = String),
    )
)]
pub async fn save_file(
    State(state): State<Arc<AppState>>,
    Path((path, file_name)): Path<(String, String)>,
    request: Request,
) -> Result<StatusCode, ApiError> {
    let key = state.object_key(path, file_name)?;

    if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload_multipart(&state, &key, multipart).await?;
    } else {
        let length = content_length(request.headers());
        let body: ByteStream = request
            .into_body()
            .into_data_stream()
            .map_err(io::Error::other)
            .boxed();

        state
            .store
            .put_object(&state.bucket, &key.to_string(), body, length)
            .await
            .map_err(|e| upload_failed(&key, e))?;
    }

    tracing::info!(key = %key, "file saved");
    Ok(StatusCode::OK)
}

/// Delete a file; a missing file is not an error
#[utoipa::path(
    delete,
    path = "/api/s3/{path}/{file_name}",
    tag = "files",
    params(
        ("path" = String, Path, description = "Directory part of the key; nested directories percent-encoded"),
        ("file_name" = String, Path, description = "File name")
    ),
    responses(
        (status = 200, description = "File deleted or already absent"),
        (status = 400, description = "Is not active", body = String),
        (status = 500, description = "Backend failure", body = String),
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path((path, file_name)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let key = state.object_key(path, file_name)?;

    state
        .store
        .delete_object(&state.bucket, &key.to_string())
        .await
        .map_err(|e| {
            tracing::error!(key = %key, "Failed to delete object: {e}");
            ApiError::Internal
        })?;

    tracing::info!(key = %key, "file deleted");
    Ok(StatusCode::OK)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Health {
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
    pub active: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Process is up", body = Health))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        active: state.is_active,
    })
}

/// Stream the first file field of a multipart body into storage
async fn upload_multipart(
    state: &AppState,
    key: &ObjectKey,
    mut multipart: Multipart,
) -> Result<(), ApiError> {
    let mut field = loop {
        match multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            Some(field) if field.file_name().is_some() || field.name() == Some(FILE_FIELD) => {
                break field;
            }
            Some(_) => continue,
            None => return Err(ApiError::MissingFile),
        }
    };

    let length = content_length(field.headers());

    // The field borrows the request, so it is pumped through a channel
    // while the upload consumes the other end.
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(UPLOAD_CHANNEL_DEPTH);
    let body: ByteStream = ReceiverStream::new(rx).boxed();

    let object_key = key.to_string();
    let upload = state
        .store
        .put_object(&state.bucket, &object_key, body, length);

    let pump = async move {
        loop {
            match field.chunk().await {
                Ok(Some(chunk)) => {
                    if tx.send(Ok(chunk)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(io::Error::other(e))).await;
                    break;
                }
            }
        }
    };

    let (result, ()) = tokio::join!(upload, pump);
    result.map_err(|e| upload_failed(key, e))
}

fn upload_failed(key: &ObjectKey, err: Error) -> ApiError {
    tracing::error!(key = %key, "Failed to upload object: {err}");
    ApiError::Internal
}

async fn collect_body(stream: ByteStream) -> io::Result<Bytes> {
    let buffer = stream
        .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
            buffer.extend_from_slice(&chunk);
            Ok(buffer)
        })
        .await?;
    Ok(buffer.freeze())
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().starts_with("multipart/form-data"))
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
