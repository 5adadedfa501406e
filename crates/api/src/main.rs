use std::env;

use anyhow::Result;
use atoll_api::build_app;
use atoll_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("atoll_api");

    let catalog_root =
        env::var("ATOLL_CATALOG_ROOT").unwrap_or_else(|_| "data/catalog".to_string());
    let bind = env::var("ATOLL_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = build_app(&catalog_root).await?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(bind = %bind, catalog_root = %catalog_root, "atoll planner api started");

    axum::serve(listener, app).await?;
    Ok(())
}
