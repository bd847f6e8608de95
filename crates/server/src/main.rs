//! Civicreport server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use civicreport_api::{middleware::AppState, router as api_router};
use civicreport_common::Config;
use civicreport_core::{CategoryService, DashboardService, ReportService};
use civicreport_db::repositories::{CategoryRepository, ReportRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;

    let db = Arc::new(civicreport_db::init(&config).await?);
    civicreport_db::migrate(&db).await?;
    info!("Database connected and migrated");

    let report_repo = ReportRepository::new(db.clone());
    let category_repo = CategoryRepository::new(db);

    let state = AppState {
        report_service: ReportService::new(report_repo.clone(), category_repo.clone()),
        dashboard_service: DashboardService::new(
            report_repo,
            category_repo.clone(),
            config.dashboard.week_starts_on,
        ),
        category_service: CategoryService::new(category_repo),
        config: Arc::new(config.clone()),
    };

    let app = Router::new()
        .merge(api_router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "Starting civicreport server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
