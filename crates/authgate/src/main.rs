//! Authgate - JWT authentication and user-management service

use anyhow::{Result, bail};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use authgate_api::{AppState, TokenTtls, create_router};
use authgate_auth::{ScopeMap, TokenIssuer, fingerprint, hash_password};
use authgate_db::models::{NewUser, RoleName};
use authgate_db::Database;
use chrono::Duration;
use config::Config;

/// Authgate - JWT authentication and user-management service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "AUTHGATE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "AUTHGATE_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;

    init_logging(&config.logging.level);

    info!("Starting Authgate v{}", env!("CARGO_PKG_VERSION"));

    // A missing signing secret is a configuration error: fail now, not
    // on the first login
    if config.auth.jwt_secret.is_empty() {
        bail!("No signing secret configured: set auth.jwt_secret or AUTHGATE_JWT_SECRET");
    }

    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_url = format!("sqlite:{}", config.database.path);
    let db = Database::new(&db_url).await?;
    db.bootstrap_roles().await?;

    // Create a default admin user on first start
    if !db.has_users().await? {
        info!("Creating default admin user");
        db.insert_user(NewUser {
            email: fingerprint("admin@example.com"),
            name: "admin".to_string(),
            password_hash: hash_password("admin")?,
            role: RoleName::Admin,
            is_active: true,
        })
        .await?;
        warn!("Default admin user created (admin@example.com / admin); change the password");
    }

    // Initialize the token issuer with the role → scope table
    let issuer = Arc::new(TokenIssuer::new(&config.auth.jwt_secret, ScopeMap::default())?);

    let ttls = TokenTtls {
        access: Duration::minutes(config.auth.access_ttl_minutes),
        refresh: Duration::days(config.auth.refresh_ttl_days),
    };

    let state = AppState::new(db, issuer, ttls, config.auth.app_name.clone());

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with an env-filter on top of the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("authgate={level},tower_http=info")));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
