use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use tracing::debug;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "splitpay".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "auth".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    debug!(url = %config.url, "connecting to database");
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

/// Define the tables used by the user repository and the session registry.
///
/// Every statement is idempotent so this can run on each start.
pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = vec![
        // Users
        "DEFINE TABLE IF NOT EXISTS user SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS user_uid ON TABLE user COLUMNS uid UNIQUE;
         DEFINE INDEX IF NOT EXISTS user_email ON TABLE user COLUMNS email;",
        // Sign-in credentials (password hashes and OAuth links)
        "DEFINE TABLE IF NOT EXISTS credential SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS credential_user ON TABLE credential COLUMNS user_uid;
         DEFINE INDEX IF NOT EXISTS credential_external ON TABLE credential COLUMNS provider, external_uid;",
        // Session registry entries
        "DEFINE TABLE IF NOT EXISTS kv_entry SCHEMALESS;
         DEFINE INDEX IF NOT EXISTS kv_entry_key ON TABLE kv_entry COLUMNS entry_key UNIQUE;
         DEFINE INDEX IF NOT EXISTS kv_entry_expires ON TABLE kv_entry COLUMNS expires_at;",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}
