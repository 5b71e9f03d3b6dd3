use std::sync::Arc;

use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use backbone_api::{
    api::{create_router, router::AppState},
    application::{ports::UserRepository, UserService},
    config::Settings,
    i18n,
    infrastructure::{PostgresUserRepository, S3StorageService},
};

/// Initialize tracing: console output always, plus daily-rotated debug and
/// error files under `<log_dir>/<env>/` when file logging is enabled.
/// The returned guards must stay alive for the process lifetime.
fn init_tracing(settings: &Settings) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (debug_layer, error_layer) = if settings.log.enabled {
        let log_dir = format!("{}/{}", settings.log.dir, settings.app.env);

        let (debug_writer, debug_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "debug.log"));
        guards.push(debug_guard);

        let (error_writer, error_guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "error.log"));
        guards.push(error_guard);

        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(debug_writer),
            ),
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(error_writer)
                    .with_filter(LevelFilter::ERROR),
            ),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(debug_layer)
        .with(error_layer)
        .init();

    guards
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    settings.validate().map_err(anyhow::Error::msg)?;

    let _log_guards = init_tracing(&settings);
    info!(service = %settings.app.name, env = %settings.app.env, "Starting service");

    i18n::init(&settings.i18n.fallback_lang);

    info!("Connecting to database");
    let pool = PgPool::connect(&settings.database_url).await.map_err(|e| {
        tracing::error!("Failed to connect to database: {}", e);
        e
    })?;

    let user_repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let user_service = Arc::new(UserService::new(user_repo));
    let storage = Arc::new(S3StorageService::new(&settings.aws_s3));
    info!("Application layer initialized");

    let addr = settings.listen_addr();
    let state = AppState {
        settings: Arc::new(settings),
        user_service,
        storage,
        pool: Some(pool),
    };

    let app = create_router(state);

    info!("Listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
