//! `GET /resource/{*path}` — byte-range resource serving.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, header};
use axum::response::Response;
use tracing::debug;

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::resource::serve::serve_resource;

/// A missing resource answers 404 whatever its `Range` header says.
pub async fn resource_handler<S>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Response>
where
    S: Send + Sync + 'static,
{
    debug!(path = %path, "resource request");

    let Some(provider) = &state.resources else {
        return Err(ApiError::NotFound(path));
    };
    let Some(resource) = provider.open(&path).await? else {
        return Err(ApiError::NotFound(path));
    };

    let range = headers
        .get(header::RANGE)
        .map(|v| {
            v.to_str()
                .map_err(|_| ApiError::BadRange("non-ASCII range header".into()))
        })
        .transpose()?;

    serve_resource(resource, range).await
}
