use std::sync::Arc;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use kaleido_client::{
    FsImageStore, GeminiBackend, ImageService, LlmRouter, OpenAiBackend, PortalClient,
    PortalConfig, ReqwestImageOrigin, VendorConfig,
};
use kaleido_server::routes;
use kaleido_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("kaleido_server=info".parse()?)
                .add_directive("kaleido_client=info".parse()?)
                .add_directive("kaleido_core=info".parse()?),
        )
        .with_target(false)
        .init();

    let port = std::env::var("KALEIDO_SERVER_PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("0.0.0.0:{port}");

    let portal_config = PortalConfig::from_env()?;
    let vendor_config = VendorConfig::from_env()?;
    let image_dir = std::env::var("KALEIDO_IMAGE_DIR").unwrap_or_else(|_| "data".to_string());

    let image_url = portal_config.image_url.clone();
    let portal = PortalClient::new(portal_config)?;
    let images = ImageService::new(
        FsImageStore::new(image_dir),
        ReqwestImageOrigin::new()?,
        image_url,
    );
    let llm = LlmRouter::new(
        OpenAiBackend::new(&vendor_config.openai_api_key)?,
        GeminiBackend::new(&vendor_config.gemini_api_key)?,
    );

    let state = Arc::new(AppState {
        portal,
        images,
        llm,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
