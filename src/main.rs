//! Binary entrypoint: env settings, pool, router, serve.

use axum::Router;
use datagate::{common_routes_with_ready, entity_routes, AppState, Settings};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("datagate=info".parse()?))
        .init();

    let settings = Settings::from_env()?;
    let bind_addr = settings.bind_addr.clone();
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await?;

    let state = AppState {
        pool,
        settings: Arc::new(settings),
    };
    let app = Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api", entity_routes(state));

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
