use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use voyage_api::{app, AppState};
use voyage_core::{RecordStore, RoomClaims};
use voyage_store::{app_config::Config, LocalClaims, RedisClient, RestRecordStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyage_api=debug,voyage_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Voyage API on port {}", config.server.port);

    let store: Arc<dyn RecordStore> = Arc::new(
        RestRecordStore::new(&config.record_store).context("Failed to build record store client")?,
    );

    // Cabin claims
    let claims: Arc<dyn RoomClaims> = match &config.redis {
        Some(redis) => Arc::new(
            RedisClient::new(&redis.url, config.booking.room_claim_seconds)
                .await
                .context("Failed to connect to Redis")?,
        ),
        None => {
            tracing::warn!("No Redis configured; cabin claims are local to this process");
            Arc::new(LocalClaims::new())
        }
    };

    let state = AppState::new(store, claims, &config.booking, &config.layout);
    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
