use std::error::Error;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use user_admin::{config::log_filter_from_env, routes::make_app, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // subscriber first, so warnings raised while reading the config are kept
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_filter_from_env()))
        .init();
    let config = Config::init();

    let bind_addr = config.bind_addr.clone();
    let app = make_app(config).await?;
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("🚀 Server started successfully on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
