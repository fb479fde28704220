use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use whatsapp_hub::config::AppConfig;
use whatsapp_hub::db;
use whatsapp_hub::handlers;
use whatsapp_hub::services::log_sink::{FileLogSink, LogSink};
use whatsapp_hub::services::messaging::whatsapp::CloudApiProvider;
use whatsapp_hub::services::settings::{self, SettingsStore, SqliteSettings};
use whatsapp_hub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    let settings: Arc<dyn SettingsStore> = Arc::new(SqliteSettings::new(Arc::new(Mutex::new(conn))));

    for (key, value) in [
        (settings::ACCESS_TOKEN, &config.bootstrap.access_token),
        (settings::PHONE_NUMBER_ID, &config.bootstrap.phone_number_id),
        (settings::VERIFY_TOKEN, &config.bootstrap.verify_token),
    ] {
        if settings.seed(key, value)? {
            tracing::info!(option = key, "seeded option from environment");
        }
    }

    let log: Arc<dyn LogSink> = Arc::new(
        FileLogSink::open(&config.log_path)
            .with_context(|| format!("failed to open event log at {}", config.log_path))?,
    );
    tracing::info!("event log at {}", config.log_path);

    let messaging = CloudApiProvider::new(
        Arc::clone(&settings),
        Arc::clone(&log),
        config.graph_api_base.clone(),
        Duration::from_secs(config.send_timeout_secs),
    )?;

    let state = Arc::new(AppState {
        config: config.clone(),
        settings,
        log,
        messaging: Box::new(messaging),
    });

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
