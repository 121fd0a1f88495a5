use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    auth::repo::{PgUserStore, UserStore},
    chat::client::{CompletionClient, OpenAiClient},
    config::AppConfig,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub chat: Arc<dyn CompletionClient>,
}

impl AppState {
    /// Connects to Postgres and builds the production collaborators.
    /// Returns the pool as well so the caller can run migrations on it.
    pub async fn init(config: AppConfig) -> anyhow::Result<(Self, PgPool)> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let chat = OpenAiClient::new(&config.chat).context("build provider http client")?;

        let state = Self::from_parts(
            Arc::new(config),
            Arc::new(PgUserStore::new(db.clone())),
            Arc::new(chat),
        );
        Ok((state, db))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        chat: Arc<dyn CompletionClient>,
    ) -> Self {
        Self { config, users, chat }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory store, stub provider with no key configured.
    pub fn fake() -> Self {
        Self::fake_with_chat(Arc::new(fakes::StubCompletion::replying("ok")), None)
    }

    pub fn fake_with_chat(chat: Arc<dyn CompletionClient>, api_key: Option<&str>) -> Self {
        Self::fake_in(chat, api_key, std::path::PathBuf::from("."))
    }

    pub fn fake_in(
        chat: Arc<dyn CompletionClient>,
        api_key: Option<&str>,
        static_dir: std::path::PathBuf,
    ) -> Self {
        use crate::config::{ChatConfig, JwtConfig, TOKEN_TTL_MINUTES};

        let config = Arc::new(AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "postgres://unused".into(),
            static_dir,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                ttl_minutes: TOKEN_TTL_MINUTES,
            },
            chat: ChatConfig {
                api_key: api_key.map(str::to_owned),
                base_url: "http://provider.invalid/v1".into(),
                timeout_secs: None,
            },
        });
        Self::from_parts(config, Arc::new(fakes::MemoryUserStore::default()), chat)
    }
}
