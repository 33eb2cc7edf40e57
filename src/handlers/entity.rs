//! Entity CRUD handlers over request-time table names.
//!
//! The project path segment is accepted for route shape and namespacing but
//! carries no behavior of its own.

use crate::error::AppError;
use crate::response::{status_message, success_many};
use crate::service::{EntityService, PasswordCheck};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::Validation("body must be a JSON object".into())),
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path((_project, table)): Path<(String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let rows = EntityService::list(&state.pool, &table).await?;
    Ok(success_many(rows))
}

pub async fn get_by_key(
    State(state): State<AppState>,
    Path((_project, table, key, value)): Path<(String, String, String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let rows = EntityService::get_by_key(&state.pool, &table, &key, &value).await?;
    Ok(success_many(rows))
}

pub async fn create(
    State(state): State<AppState>,
    Path((_project, table)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let body = body_to_map(body)?;
    EntityService::create(&state.pool, &table, body).await?;
    Ok(status_message(StatusCode::CREATED, "entity created"))
}

pub async fn update(
    State(state): State<AppState>,
    Path((_project, table, key, value)): Path<(String, String, String, String)>,
    Json(body): Json<Value>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let body = body_to_map(body)?;
    let affected = EntityService::update(&state.pool, &table, &key, &value, body).await?;
    Ok(status_message(
        StatusCode::OK,
        format!("entity updated ({affected} rows)"),
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((_project, table, key, value)): Path<(String, String, String, String)>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let affected = EntityService::delete(&state.pool, &table, &key, &value).await?;
    Ok(status_message(
        StatusCode::OK,
        format!("entity deleted ({affected} rows)"),
    ))
}

pub async fn verify_password(
    State(state): State<AppState>,
    Path((_project, table)): Path<(String, String)>,
    Json(check): Json<PasswordCheck>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    EntityService::verify_password(&state.pool, &table, &check).await?;
    Ok(status_message(StatusCode::OK, "password verified"))
}

#[derive(Debug, serde::Deserialize)]
pub struct RawQueryRequest {
    pub query: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

pub async fn raw_query(
    State(state): State<AppState>,
    Path((_project, _table)): Path<(String, String)>,
    Json(req): Json<RawQueryRequest>,
) -> Result<impl axum::response::IntoResponse, AppError> {
    let rows = EntityService::raw_query(&state.pool, &req.query, &req.params).await?;
    Ok(success_many(rows))
}
