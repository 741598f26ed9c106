mod scheduler;

use std::sync::Arc;
use std::time::Duration;

use pitchside_pipeline::Pipeline;
use tracing_subscriber::EnvFilter;

use crate::scheduler::CycleRunner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = pitchside_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        env = %config.env,
        interval_secs = config.processing_interval_secs,
        "starting pitchside-server"
    );
    for (var, purpose) in config.missing_integrations() {
        tracing::warn!(var, purpose, "integration not configured");
    }

    let pool_config = pitchside_db::PoolConfig::from_app_config(&config);
    let pool = pitchside_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = pitchside_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let pipeline = Pipeline::from_config(pool, &config)?;
    // fail at startup rather than on every tick
    pipeline.processor()?;

    let runner = CycleRunner::new(Arc::new(pipeline));
    let mut scheduler = scheduler::build_scheduler(
        runner.clone(),
        Duration::from_secs(config.processing_interval_secs),
    )
    .await?;

    let first_cycle = tokio::spawn(async move { runner.run().await });

    shutdown_signal().await;
    first_cycle.abort();
    scheduler.shutdown().await?;
    tracing::info!("scheduler stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
