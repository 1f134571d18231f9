//! solvedd - accepted-answer daemon.

use solvedd::config::{self, Config};
use solvedd::db::Database;
use solvedd::{SolvedService, http, metrics};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s), see messages above",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        allow_all = config.solved.allow_solved_on_all_topics,
        "Starting solvedd"
    );

    let db = Database::new(&config.database.path).await?;
    let service = SolvedService::new(db, &config.solved);

    // Warm the category cache so the first request doesn't pay for the scan.
    let cache = service.permission_cache();
    if cache.allows_all() {
        info!("Accepted answers enabled on all topics");
    } else {
        match cache.get_or_build().await {
            Ok(set) => info!(categories = set.len(), "Accepted-answer categories loaded"),
            Err(e) => tracing::warn!(error = %e, "Failed to preload category cache"),
        }
    }

    // Convention: metrics_port = 0 disables the metrics endpoint.
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        tokio::spawn(async move {
            http::run_metrics_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    http::run_http_server(config.listen.address, service).await?;

    Ok(())
}
