//! Registered-file download handler.
//!
//! The file registry is the newer per-file upstream: the request path is the
//! object-store key verbatim, and the registry's lifecycle state decides both
//! visibility and the retrieval mode. `PUBLISHED` files are still held
//! encrypted; `DECRYPTED` files have been moved to the public store and
//! stream straight through.

use crate::auth;
use crate::content::Streamer;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use sluice_core::files::{FileMetadata, FileState};
use sluice_storage::ByteStream;

/// GET /v1/files/{*path}
pub async fn download_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let path = path.trim_start_matches('/').to_string();
    let token = auth::extract_token(&headers);

    let metadata = state.files.get_file(&token, &path).await.map_err(|e| {
        tracing::error!(error = %e, %path, "file metadata fetch failed");
        ApiError::from(e)
    })?;

    if metadata.upload_incomplete() {
        return Err(ApiError::NotFound(format!("upload incomplete: {path}")));
    }

    if metadata.is_unpublished() && !caller_may_see_unpublished(&state, &token).await {
        return Err(ApiError::Unauthorized(format!(
            "unpublished file: {path}"
        )));
    }

    let streamer = Streamer::new(
        state.secrets.clone(),
        state.storage.clone(),
        &state.config.vault.path,
    );
    let stream: ByteStream = match metadata.state {
        // Already decrypted into the public store.
        FileState::Decrypted => streamer.stream_plain(&path).await,
        _ => streamer.stream_decrypted(&path, metadata.filename()).await,
    }
    .map_err(|e| {
        tracing::error!(error = %e, %path, "file stream failed to open");
        ApiError::from(e)
    })?;

    respond(&metadata, stream)
}

/// Unpublished files are only visible on the publishing subnet to callers
/// the identity service vouches for.
async fn caller_may_see_unpublished(state: &AppState, token: &str) -> bool {
    if !state.config.server.is_publishing {
        return false;
    }
    match auth::resolve_identity(state.identity.as_ref(), token).await {
        Ok(identifier) => {
            tracing::debug!(%identifier, "caller authorised for unpublished file");
            true
        }
        Err(error) => {
            tracing::info!(%error, "rejecting unpublished file download");
            false
        }
    }
}

fn respond(metadata: &FileMetadata, stream: ByteStream) -> ApiResult<Response> {
    let media_type = if metadata.media_type.is_empty() {
        "application/octet-stream"
    } else {
        &metadata.media_type
    };
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, media_type)
        .header(header::CONTENT_LENGTH, metadata.content_length())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", metadata.filename()),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
