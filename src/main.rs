mod config;
mod dispatcher;
mod error;
mod handlers;
mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use log::{info, warn};

use config::Config;
use dispatcher::DelayedDispatcher;
use handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env();
    match config.request_timeout {
        Some(timeout) => info!("Outbound timeout: {:?}", timeout),
        None => warn!("No outbound timeout set; a silent webhook can hold a send open indefinitely"),
    }

    let client = config.http_client()?;
    let state = Arc::new(AppState::new(DelayedDispatcher::new(client)));
    let app = handlers::router(state);

    let addr = config.bind_addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
