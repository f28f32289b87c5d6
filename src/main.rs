use std::sync::Arc;

use candidates_api::config::ServerConfig;
use candidates_api::server::app;
use candidates_api::service::ProposalService;
use candidates_api::store::{LibSqlStore, ProposalStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = ServerConfig::from_env()?;

    eprintln!("Candidates API v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Listening: http://0.0.0.0:{}", config.port);
    eprintln!("   Database:  {}", config.db_path);

    let db_path = std::path::Path::new(&config.db_path);
    let store: Arc<dyn ProposalStore> = Arc::new(
        LibSqlStore::new_local(db_path).await.unwrap_or_else(|e| {
            eprintln!("Error: Failed to open database at {}: {}", config.db_path, e);
            std::process::exit(1);
        }),
    );

    let service = Arc::new(ProposalService::new(store));
    let router = app(service);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    tracing::info!(port = config.port, "Server started");
    axum::serve(listener, router).await?;

    Ok(())
}
