use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use newsdesk_api::routes::build_router;
use newsdesk_api::state::AppStateInner;
use newsdesk_media::HttpMediaUploader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsdesk=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let token_secret =
        std::env::var("NEWSDESK_TOKEN_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("NEWSDESK_DB_PATH").unwrap_or_else(|_| "newsdesk.db".into());
    let host = std::env::var("NEWSDESK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("NEWSDESK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let media_url =
        std::env::var("NEWSDESK_MEDIA_URL").unwrap_or_else(|_| "http://localhost:9000".into());
    let media_key = std::env::var("NEWSDESK_MEDIA_KEY").unwrap_or_default();
    let media_timeout: u64 = std::env::var("NEWSDESK_MEDIA_TIMEOUT_SECS")
        .unwrap_or_else(|_| "15".into())
        .parse()?;

    // Init database
    let db = newsdesk_db::Database::open(&PathBuf::from(&db_path))?;

    // Media collaborator
    let media = Arc::new(HttpMediaUploader::new(
        media_url,
        media_key,
        Duration::from_secs(media_timeout),
    ));

    let state = Arc::new(AppStateInner {
        db,
        token_secret,
        media,
    });

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Newsdesk server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
