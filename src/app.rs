//! Application lifecycle: register, init, migrate, start, serve, stop.

use anyhow::Context;
use libris_kernel::settings::Settings;
use libris_kernel::{InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

use crate::modules;

/// Connect to the database and register every module against it
async fn bootstrap(settings: &Settings) -> anyhow::Result<(SqlitePool, ModuleRegistry)> {
    let pool = libris_db::connect(&settings.database)
        .await
        .context("failed to open database")?;

    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, &pool);
    tracing::info!(modules = registry.module_count(), "modules registered");

    Ok((pool, registry))
}

async fn apply_migrations(pool: &SqlitePool, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let migrations = registry.collect_migrations();
    let applied = libris_db::run_migrations(pool, &migrations).await?;
    tracing::info!(applied, total = migrations.len(), "migrations complete");
    Ok(applied)
}

/// Run the full service until a shutdown signal arrives
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let (pool, registry) = bootstrap(&settings).await?;
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.init_modules(&ctx).await?;
    apply_migrations(&pool, &registry).await?;
    registry.start_modules(&ctx).await?;

    let served = libris_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry.stop_modules().await?;
    pool.close().await;
    served
}

/// Apply pending migrations and exit; returns how many were applied
pub async fn migrate(settings: Settings) -> anyhow::Result<usize> {
    let (pool, registry) = bootstrap(&settings).await?;
    let applied = apply_migrations(&pool, &registry).await?;
    pool.close().await;
    Ok(applied)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
