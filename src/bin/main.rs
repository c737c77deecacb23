use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use splitpay_auth::auth::Session;
use splitpay_auth::auth::password::hash_password;
use splitpay_auth::i18n::Language;
use splitpay_auth::types::{Email, UserId};
use splitpay_auth::{DatabaseConfig, KvsBackend, ServiceConfig, build_app};

#[derive(Parser)]
#[command(name = "splitpay-auth")]
#[command(about = "Token authentication and session service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the auth and user RPC services over HTTP
    Serve {
        /// Bind address, e.g. 0.0.0.0:8080
        #[arg(long, env = "SPLITPAY_BIND", default_value = "0.0.0.0:8080")]
        bind: String,
        /// Language for error messages when Accept-Language does not decide
        #[arg(long, env = "SPLITPAY_DEFAULT_LANGUAGE", default_value = "en")]
        default_language: Language,
        /// Seconds between sweeps of expired session keys (0 disables)
        #[arg(long, default_value_t = 300)]
        purge_interval_secs: u64,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Initialize the database
    Init {
        #[arg(long, env = "SURREALDB_URL", default_value = "memory")]
        db_url: String,
    },
    /// Create a user that signs in with email and password
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: Option<String>,
        #[arg(long, env = "SURREALDB_URL", default_value = "memory")]
        db_url: String,
    },
    /// Issue and register a token pair for a user (debugging aid)
    IssueToken {
        #[arg(long)]
        user_id: String,
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// HS256 secret for signing access and refresh tokens
    #[arg(long, env = "SPLITPAY_JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,
    /// Session key store
    #[arg(long, env = "SPLITPAY_KVS", value_enum, default_value = "memory")]
    kvs: KvsBackend,
    #[arg(long, env = "SURREALDB_URL", default_value = "memory")]
    db_url: String,
}

impl CommonArgs {
    fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            jwt_secret: self.jwt_secret,
            kvs: self.kvs,
            database: DatabaseConfig {
                url: self.db_url,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("splitpay_auth=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            default_language,
            purge_interval_secs,
            common,
        } => {
            let config = ServiceConfig {
                bind,
                default_language,
                purge_interval: (purge_interval_secs > 0)
                    .then(|| Duration::from_secs(purge_interval_secs)),
                ..common.into_config()
            };
            info!(
                "Starting splitpay-auth on {} (kvs={:?}, db_url={})",
                config.bind, config.kvs, config.database.url
            );

            let app = build_app(&config).await?;
            let purge = config.purge_interval.map(|interval| (app.kvs.clone(), interval));

            splitpay_auth::server::start_http(app.state, &config.bind, purge).await?;
        }
        Commands::Init { db_url } => {
            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            info!("Using database url for initialization: {}", db_config.url);

            info!("Initializing database...");
            let db = splitpay_auth::create_connection(db_config).await?;
            splitpay_auth::ensure_schema(&db).await?;
            info!("Database initialized successfully");
        }
        Commands::CreateUser {
            email,
            password,
            display_name,
            db_url,
        } => {
            if email.trim().is_empty() || password.is_empty() {
                bail!("email and password must not be empty");
            }

            let db_config = DatabaseConfig {
                url: db_url,
                ..Default::default()
            };
            let db = splitpay_auth::create_connection(db_config).await?;
            splitpay_auth::ensure_schema(&db).await?;

            let users = splitpay_auth::auth::UserStore::new(db);
            let user = users
                .create_password_user(&Email::new(email), hash_password(&password)?, display_name)
                .await?;

            println!("User created successfully!");
            println!();
            println!("  Id:      {}", user.id);
            if let Some(email) = &user.email {
                println!("  Email:   {}", email);
            }
            if let Some(name) = &user.display_name {
                println!("  Name:    {}", name);
            }
        }
        Commands::IssueToken { user_id, common } => {
            let config = common.into_config();
            if config.kvs == KvsBackend::Memory {
                warn!("kvs=memory: the issued pair is only registered for the lifetime of this command");
            }

            let app = build_app(&config).await?;
            let user_id = UserId::new(user_id);
            let tokens = app.codec.issue(&user_id)?;
            let session = Session { user_id, tokens };
            app.sessions.create(&session).await?;

            println!("Access token (expires {}):", session.tokens.access.expires_at.to_rfc3339());
            println!("  {}", session.tokens.access.value);
            println!();
            println!("Refresh token (expires {}):", session.tokens.refresh.expires_at.to_rfc3339());
            println!("  {}", session.tokens.refresh.value);
        }
    }

    Ok(())
}
