//! `POST /` — envelope dispatch.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dashkit_core::DispatchReply;
use serde_json::json;

use crate::AppState;

/// Dispatch outcomes, structured errors included, are answered with 200.
/// A result that cannot be serialized is answered with 500 and `{}`.
pub async fn dispatch_handler<S>(State(state): State<AppState<S>>, body: Bytes) -> Response
where
    S: Send + Sync + 'static,
{
    match state.dispatcher.dispatch_bytes(&body).await {
        DispatchReply::Json(value) => Json(value).into_response(),
        DispatchReply::SerializationFailed => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response()
        }
    }
}
