use std::sync::Arc;

use anyhow::Context;

use config::build_config;
use error::AppResult;
use platform::instagram::InstagramSessionFactory;
use state::AppState;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

mod config;
mod error;
mod handler;
mod platform;
mod service;
mod state;


#[tokio::main]
async fn main() -> AppResult<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    info!("Starting relay...");
    let config = build_config()?;
    info!(
        "Mode: {:?}, cookies file: {}, download root: {}, max retries: {}",
        config.relay.mode,
        config.relay.cookies_file.display(),
        config.relay.download_root.display(),
        config.relay.max_retries
    );

    let factory = Arc::new(InstagramSessionFactory::new(config.instagram.clone()));
    let state = AppState::new(&config, factory);
    let app = handler::router(state);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, app).await.context("Server stopped unexpectedly")?;

    Ok(())
}
