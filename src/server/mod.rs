use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::assets::LayeredAssets;
use crate::config::SqlPracticeConfig;
use crate::exercise::ExerciseCatalog;
use crate::storage::DatasetStore;

pub mod routes;

/// Server state
pub struct AppState {
    pub config: SqlPracticeConfig,
    pub store: DatasetStore,
    pub assets: LayeredAssets,
    pub catalog: Arc<dyn ExerciseCatalog + Send + Sync>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/datasets", get(routes::list_datasets))
        .route("/datasets/{name}/load", post(routes::load_dataset))
        .route("/datasets/{name}/query", post(routes::run_query))
        .route("/datasets/{name}/compare", post(routes::compare_queries))
        .route("/exercises", get(routes::list_exercises))
        .route("/exercises/{id}", get(routes::get_exercise))
        .route("/exercises/{id}/check", post(routes::check_exercise))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Starting server on {}", addr);
    println!("{} Server running at http://{}", crate::ui::Icons::GLOBE, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
