use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, SignupRequest, TokenUser},
        extractors::AuthUser,
        jwt::JwtKeys,
        services,
    },
    error::AppResult,
    extract::{body_or_missing, BodyRejection, JsonOrForm},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<SignupRequest>, BodyRejection>,
) -> AppResult<Json<AuthResponse>> {
    let req = body_or_missing(payload, "Missing fields")?;
    let keys = JwtKeys::from_ref(&state);
    services::signup(state.users.as_ref(), &keys, req).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<JsonOrForm<LoginRequest>, BodyRejection>,
) -> AppResult<Json<AuthResponse>> {
    let req = body_or_missing(payload, "Missing fields")?;
    let keys = JwtKeys::from_ref(&state);
    services::login(state.users.as_ref(), &keys, req).await.map(Json)
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn me(user: AuthUser) -> Json<TokenUser> {
    Json(TokenUser {
        id: user.id,
        email: user.email,
    })
}
