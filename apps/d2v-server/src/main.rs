use d2v_server::config::ServerConfig;
use d2v_server::server::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Config file path is the first argument
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "d2v.yaml".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        tracing::info!("Loading configuration from: {}", config_path);
        ServerConfig::load_from_file(&config_path)?
    } else {
        tracing::warn!("Config file not found, loading from environment variables");
        ServerConfig::load_from_env()?
    };

    let mut server = Server::new(config).await?;
    server.start().await?;

    tracing::info!(
        documents = server.index().len(),
        dimensions = server.index().dimensions(),
        "d2v server is ready"
    );

    tokio::signal::ctrl_c().await?;

    tracing::info!("Received shutdown signal, gracefully shutting down...");
    server.shutdown().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
