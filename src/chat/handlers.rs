use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use crate::{
    chat::{
        dto::{ChatRequest, ChatResponse},
        services,
    },
    error::AppResult,
    extract::{body_or_missing, BodyRejection, JsonOrForm},
    state::AppState,
};

pub fn chat_routes() -> Router<AppState> {
    Router::new().route("/api/afyadada-chat", post(afyadada_chat))
}

#[instrument(skip(state, payload))]
pub async fn afyadada_chat(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<ChatRequest>, BodyRejection>,
) -> AppResult<Json<ChatResponse>> {
    let req = body_or_missing(payload, "Missing prompt")?;
    let reply = services::ask(state.chat.as_ref(), &state.config.chat, req.prompt).await?;
    Ok(Json(ChatResponse { reply }))
}
