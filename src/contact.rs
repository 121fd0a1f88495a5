use axum::{routing::post, Json, Router};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/contact", post(submit))
}

/// Acknowledges any submission; nothing is validated or stored.
pub async fn submit(body: Bytes) -> Json<Value> {
    info!(body = %String::from_utf8_lossy(&body), "form submission");
    Json(json!({ "message": "Form submitted successfully" }))
}
