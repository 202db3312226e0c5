// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{routing::{get, post, put}, Router};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_service::DashboardService;
use crate::application::page_repository::{DatasetSource, PageStore};
use crate::application::page_service::PageService;
use crate::infrastructure::config::load_config;
use crate::infrastructure::file_dataset_source::FileDatasetSource;
use crate::infrastructure::json_page_store::JsonPageStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    add_chart, create_page, dataset_schema, delete_chart, delete_page, edit_chart, health_check,
    list_datasets, list_pages, page_positions, render_page, update_page,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_config()?;
    let grid = config.grid_template()?;
    info!(rows = grid.rows().len(), "page grid loaded");

    // Create repositories (infrastructure layer)
    let store: Arc<dyn PageStore> = Arc::new(JsonPageStore::new(config.storage.pages_file.clone()));
    let datasets: Arc<dyn DatasetSource> = Arc::new(FileDatasetSource::new(config.storage.data_dir.clone()));

    // Create services (application layer)
    let page_service = PageService::new(store.clone(), datasets.clone(), grid.clone());
    let dashboard_service = DashboardService::new(store, datasets.clone(), grid);

    // Create application state
    let state = Arc::new(AppState {
        page_service,
        dashboard_service,
        datasets,
    });

    // Build router (presentation layer)
    // Compression is applied per response in the JSON builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/pages", get(list_pages).post(create_page))
        .route("/pages/:title", put(update_page).delete(delete_page))
        .route("/pages/:title/positions", get(page_positions))
        .route("/pages/:title/charts", post(add_chart))
        .route("/pages/:title/charts/:chart_id", put(edit_chart).delete(delete_chart))
        .route("/pages/:title/render", post(render_page))
        .route("/datasets", get(list_datasets))
        .route("/datasets/schema", get(dataset_schema))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;
    info!(%addr, pages_file = %config.storage.pages_file.display(), "starting dashboard-builder");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
