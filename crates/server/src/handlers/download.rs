//! Legacy download handlers: datasets, filter outputs, instances and images.
//!
//! Every route runs the same per-request state machine:
//! resolve, then redirect to the public URL when the artefact is published
//! and has one, then stream the private object when the caller may see it,
//! otherwise 404. A 404 is deliberately the only refusal the public ever
//! sees; the response never says whether the artefact exists.

use crate::auth;
use crate::content::Streamer;
use crate::downloads::{Resolved, Resolver};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use sluice_clients::RequestAuth;
use sluice_core::{ArtefactReference, Format, PrivateLocator};

/// GET /downloads/datasets/{dataset_id}/editions/{edition}/versions/{file}
pub async fn download_dataset_version(
    State(state): State<AppState>,
    Path((dataset_id, edition, file)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (version, format) = Format::split_suffixed(&file)?;
    let reference = ArtefactReference::DatasetVersion {
        dataset_id,
        edition,
        version: version.to_string(),
        format,
    };
    serve_download(&state, &headers, reference).await
}

/// GET /downloads/filter-outputs/{file}
pub async fn download_filter_output(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (filter_output_id, format) = Format::split_suffixed(&file)?;
    let reference = ArtefactReference::FilterOutput {
        filter_output_id: filter_output_id.to_string(),
        format,
    };
    serve_download(&state, &headers, reference).await
}

/// GET /downloads/instances/{file}
pub async fn download_instance(
    State(state): State<AppState>,
    Path(file): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let (instance_id, format) = Format::split_suffixed(&file)?;
    let reference = ArtefactReference::Instance {
        instance_id: instance_id.to_string(),
        format,
    };
    serve_download(&state, &headers, reference).await
}

/// GET /images/{image_id}/{variant}/{filename}
pub async fn download_image(
    State(state): State<AppState>,
    Path((image_id, variant, filename)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let reference = ArtefactReference::Image {
        image_id,
        variant,
        filename,
    };
    serve_download(&state, &headers, reference).await
}

/// Per-request caller credentials, built from the incoming headers.
pub(crate) fn request_auth(headers: &HeaderMap) -> RequestAuth {
    let token = auth::extract_token(headers);
    let collection_id = headers
        .get("Collection-Id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    RequestAuth {
        user_token: (!token.is_empty()).then_some(token),
        collection_id,
    }
}

async fn serve_download(
    state: &AppState,
    headers: &HeaderMap,
    reference: ArtefactReference,
) -> ApiResult<Response> {
    let caller = request_auth(headers);
    let resolver = Resolver::new(
        state.dataset.clone(),
        state.filter.clone(),
        state.image.clone(),
    );
    let resolved = resolver.resolve(&caller, &reference).await.map_err(|e| {
        tracing::error!(error = %e, "download resolution failed");
        ApiError::from(e)
    })?;

    let variant = reference.variant_key();
    if let Some(public) = resolved.downloads.public_link(variant) {
        return redirect(public);
    }

    // A skipped variant was deliberately not generated upstream.
    if resolved
        .downloads
        .available
        .get(variant)
        .is_some_and(|entry| entry.skipped)
    {
        return Err(ApiError::NotFound(format!("variant {variant} skipped")));
    }

    if let Some(locator) = &resolved.locator
        && authorised(state, headers, &resolved).await
    {
        let size = resolved
            .downloads
            .available
            .get(variant)
            .and_then(|entry| entry.size.parse::<u64>().ok());
        let streamer = Streamer::new(
            state.secrets.clone(),
            state.storage.clone(),
            &state.config.vault.path,
        );
        return stream_attachment(&streamer, locator, size).await;
    }

    Err(ApiError::NotFound("download not available".to_string()))
}

/// Published artefacts may be streamed by anyone. Unpublished artefacts are
/// only served on the publishing subnet, and only to callers the identity
/// service vouches for.
async fn authorised(state: &AppState, headers: &HeaderMap, resolved: &Resolved) -> bool {
    if resolved.downloads.is_published {
        return true;
    }
    if !state.config.server.is_publishing {
        return false;
    }
    let token = auth::extract_token(headers);
    match auth::resolve_identity(state.identity.as_ref(), &token).await {
        Ok(identifier) => {
            tracing::debug!(%identifier, "caller authorised for unpublished artefact");
            true
        }
        Err(error) => {
            tracing::info!(%error, "rejecting unpublished download");
            false
        }
    }
}

fn redirect(location: &str) -> ApiResult<Response> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// Stream a private object as an attachment, decrypting on the way through.
async fn stream_attachment(
    streamer: &Streamer,
    locator: &PrivateLocator,
    size: Option<u64>,
) -> ApiResult<Response> {
    let stream = streamer
        .stream_decrypted(&locator.key, &locator.filename)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %locator.key, "private stream failed to open");
            ApiError::from(e)
        })?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", locator.filename),
        );
    if let Some(size) = size {
        builder = builder.header(header::CONTENT_LENGTH, size);
    }
    builder
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
