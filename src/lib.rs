// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod i18n;
pub mod kvs;
pub mod types;
pub mod usecases;

// Transport
pub mod api;
pub mod rpc;
pub mod server;

// Re-export key types and functions
pub use api::{AppState, create_router};
pub use config::{KvsBackend, ServiceConfig};
pub use db::{DatabaseConfig, Db, create_connection, ensure_schema};
pub use usecases::UseCases;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use auth::{SessionStore, TokenCodec, UserStore};
use i18n::Catalog;
use kvs::{KeyValueStore, MemoryStore, SurrealStore};

/// Fully wired service: router state plus the handles the CLI needs.
///
/// OAuth sign-in stays disabled until an exchange is attached with
/// [`AppState::with_oauth`].
pub struct App {
    pub state: AppState,
    pub kvs: Arc<dyn KeyValueStore>,
    pub users: UserStore,
    pub codec: Arc<TokenCodec>,
    pub sessions: SessionStore,
}

/// Validate `config`, connect to the database and wire every use-case.
pub async fn build_app(config: &ServiceConfig) -> Result<App> {
    config.validate()?;

    let db = create_connection(config.database.clone()).await?;
    ensure_schema(&db).await?;

    let kvs: Arc<dyn KeyValueStore> = match config.kvs {
        KvsBackend::Memory => Arc::new(MemoryStore::new()),
        KvsBackend::Surreal => Arc::new(SurrealStore::new(db.clone())),
    };
    info!(backend = ?config.kvs, "session store ready");

    let codec = Arc::new(TokenCodec::new(&config.jwt_secret));
    let sessions = SessionStore::new(kvs.clone());
    let users = UserStore::new(db);

    let state = AppState {
        usecases: UseCases::new(codec.clone(), sessions.clone(), Arc::new(users.clone())),
        localizer: Arc::new(Catalog),
        default_language: config.default_language,
        oauth: None,
    };

    Ok(App {
        state,
        kvs,
        users,
        codec,
        sessions,
    })
}
