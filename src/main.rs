mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod models;
mod routes;
mod templates;
mod validation;

use std::sync::Arc;

use crate::{catalog::Catalog, config::Config, models::Pagination};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
}

impl AppState {
    pub fn pagination(&self, page: Option<u64>, per_page: Option<u64>) -> Pagination {
        Pagination::resolve(page, per_page, self.config.page_size, self.config.max_page_size)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,movies=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::connect_and_migrate(&config.database_url, config.db_max_connections).await?;
    let catalog = Catalog::new(db);

    let state = Arc::new(AppState { config: config.clone(), catalog });
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
