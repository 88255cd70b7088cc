//! Admission control for the download paths.
//!
//! A fixed pool of slots bounds how many requests may be inside the download
//! handlers at once. Requests that find the pool empty are rejected with
//! `429 Too Many Requests` immediately; there is no queueing and no ordering
//! guarantee among concurrent arrivals.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::{Body, BodyDataStream};
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A bounded admission gate. Cloning shares the underlying slot pool.
#[derive(Clone)]
pub struct AdmissionGate {
    semaphore: Option<Arc<Semaphore>>,
}

/// An occupied slot. The slot is returned to the pool on drop, which covers
/// every exit path of the guarded work including panics and cancellation.
pub struct AdmissionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl AdmissionGate {
    /// Build a gate with `limit` slots. A limit below one disables the gate
    /// entirely; such a gate admits everything.
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: (limit >= 1).then(|| Arc::new(Semaphore::new(limit))),
        }
    }

    /// Try to occupy a slot without waiting.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        match &self.semaphore {
            Some(semaphore) => semaphore
                .clone()
                .try_acquire_owned()
                .ok()
                .map(|permit| AdmissionPermit {
                    _permit: Some(permit),
                }),
            None => Some(AdmissionPermit { _permit: None }),
        }
    }

    /// Slots currently free, for observability. `None` when unbounded.
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }
}

/// Middleware guarding the download routes. The permit is moved into the
/// response body, so the slot stays occupied through resolution, streaming
/// setup and the byte copy itself; it frees when the body is fully drained
/// or the connection is dropped.
pub async fn admission_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(permit) = state.admission.try_admit() else {
        tracing::warn!(
            path = %request.uri().path(),
            "admission gate full, rejecting request"
        );
        return ApiError::TooManyRequests.into_response();
    };
    let (parts, body) = next.run(request).await.into_parts();
    let body = Body::from_stream(GuardedBody {
        inner: body.into_data_stream(),
        _permit: permit,
    });
    Response::from_parts(parts, body)
}

/// A response body that owns its admission slot. Dropping the body, for a
/// completed copy or a cancelled connection, returns the slot.
struct GuardedBody {
    inner: BodyDataStream,
    _permit: AdmissionPermit,
}

impl Stream for GuardedBody {
    type Item = Result<Bytes, axum::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}
