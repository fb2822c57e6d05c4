//! Service entry point.

use tracing::info;
use tracing_subscriber::EnvFilter;

use session_gate::store::CredentialStore;
use session_gate::{router, AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let db_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "sessions.db".to_string());
    let store = CredentialStore::open(&db_path)?;

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let state = AppState::new(config, store)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, db = %db_path, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
