pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Commands;
pub use config::Settings;
use db::Store;

pub async fn run(settings: Settings, command: Commands) -> anyhow::Result<()> {
    init_tracing(&settings);
    if let Some(path) = &settings.env_file {
        info!("Loaded environment from: {}", path.display());
    }
    settings.validate()?;

    match command {
        Commands::Serve => run_server(settings).await,
        Commands::Migrate => run_migrations(&settings).await,
        Commands::CheckConfig => check_config(&settings),
    }
}

fn init_tracing(settings: &Settings) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if settings.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(settings: Settings) -> anyhow::Result<()> {
    info!(
        "{} (anilink v{}) starting...",
        settings.project_name,
        env!("CARGO_PKG_VERSION")
    );

    let prometheus_handle = if settings.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    let addr = format!("{}:{}", settings.host, settings.port);
    let api_prefix = settings.api_v1_str.clone();

    let api_state = api::create_app_state_from_settings(settings, prometheus_handle).await?;
    let app = api::router(api_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web API running at http://{}{}", addr, api_prefix);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn run_migrations(settings: &Settings) -> anyhow::Result<()> {
    Store::with_pool_options(&settings.database_url()?, 1, 1).await?;
    info!("Migrations applied");
    Ok(())
}

fn check_config(settings: &Settings) -> anyhow::Result<()> {
    let database_url = settings.database_url()?;
    let database = url::Url::parse(&database_url).map_or_else(
        |_| "<unparsable>".to_string(),
        |u| format!("{}://{}{}", u.scheme(), u.host_str().unwrap_or("-"), u.path()),
    );

    info!(
        project = %settings.project_name,
        server_name = %settings.server_name,
        api_prefix = %settings.api_v1_str,
        database = %database,
        cors_origins = settings.backend_cors_origins.len(),
        "Configuration is valid"
    );
    Ok(())
}
