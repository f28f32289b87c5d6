use candidates_api::config::WorkerConfig;
use candidates_api::worker::{ApiClient, Worker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = WorkerConfig::from_env()?;

    // RUST_LOG wins when set; otherwise the enumerated LOG_LEVEL applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.log_level.to_string())
            }),
        )
        .with_target(false)
        .init();

    tracing::info!(
        backend_url = %config.backend_url,
        interval_secs = config.job_check_interval.as_secs_f64(),
        log_level = %config.log_level,
        "Worker configuration loaded"
    );

    let client = ApiClient::connect(&config.backend_url)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: {e}");
            std::process::exit(1);
        });
    tracing::info!(backend_url = %client.base_url(), "Connected to backend");

    Worker::new(client, config.job_check_interval).work().await;

    Ok(())
}
