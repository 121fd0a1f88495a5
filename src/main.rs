use anyhow::Context;

mod app;
mod auth;
mod chat;
mod config;
mod contact;
mod error;
mod extract;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "afyadada=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env().context("load configuration")?;
    if config.chat.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY not set; /api/afyadada-chat will answer 500");
    }
    let (host, port) = (config.host.clone(), config.port);

    let (app_state, db) = AppState::init(config).await?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    app::serve(app::build_app(app_state), &host, port).await
}
