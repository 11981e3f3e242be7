use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::exercise::{self, Exercise};
use crate::query::{Comparison, ResultSet};
use crate::server::AppState;
use crate::storage::{LoadOutcome, TracingObserver};
use crate::Error;

#[derive(Deserialize)]
pub struct QueryRequest {
    pub sql: String,
}

#[derive(Deserialize)]
pub struct CompareRequest {
    pub query: String,
    pub reference: String,
}

#[derive(Deserialize)]
pub struct CheckRequest {
    pub query: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DatasetInfo {
    pub name: String,
    pub script: String,
    pub loaded: bool,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

fn from_error(e: Error) -> ApiError {
    let status = match &e {
        Error::DatasetNotFound(_) | Error::UnknownDataset(_) | Error::ExerciseNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        Error::InvalidDatasetName(_) | Error::Query(_) | Error::Storage(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e.to_string())
}

/// Run SQLite work off the async executor
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("worker failed: {}", e)))?
}

pub async fn list_datasets(State(state): State<Arc<AppState>>) -> Json<Vec<DatasetInfo>> {
    let infos = state
        .config
        .datasets
        .iter()
        .map(|d| DatasetInfo {
            name: d.name.clone(),
            script: d.script.clone(),
            loaded: state.store.exists(&d.name),
        })
        .collect();
    Json(infos)
}

pub async fn load_dataset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<LoadOutcome>, ApiError> {
    let spec = state
        .config
        .dataset(&name)
        .cloned()
        .ok_or_else(|| from_error(Error::UnknownDataset(name.clone())))?;

    blocking(move || {
        Ok(Json(state.store.ensure(
            &spec.name,
            &state.assets,
            &spec.script,
            state.config.split_mode,
            &TracingObserver,
        )))
    })
    .await
}

pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<ResultSet>, ApiError> {
    blocking(move || state.store.run(&name, &req.sql).map(Json).map_err(from_error)).await
}

pub async fn compare_queries(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<Comparison>, ApiError> {
    blocking(move || Ok(Json(state.store.compare(&name, &req.query, &req.reference)))).await
}

pub async fn list_exercises(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Exercise>>, ApiError> {
    blocking(move || state.catalog.list().map(Json).map_err(from_error)).await
}

pub async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Exercise>, ApiError> {
    blocking(move || {
        state
            .catalog
            .get(id)
            .map_err(from_error)?
            .map(Json)
            .ok_or_else(|| from_error(Error::ExerciseNotFound(id)))
    })
    .await
}

pub async fn check_exercise(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<CheckRequest>,
) -> Result<Json<Comparison>, ApiError> {
    blocking(move || {
        let ex = state
            .catalog
            .get(id)
            .map_err(from_error)?
            .ok_or_else(|| from_error(Error::ExerciseNotFound(id)))?;
        let dataset = &state.config.exercise_dataset;
        Ok(Json(exercise::grade(&state.store, dataset, &ex, &req.query)))
    })
    .await
}
