//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaCount,
}

#[derive(Serialize)]
pub struct MetaCount {
    pub count: u64,
}

/// Record-sequence envelope with its count.
pub fn success_many<T: Serialize>(data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaCount { count },
        }),
    )
}

#[derive(Serialize)]
pub struct StatusMessage {
    pub status: &'static str,
    pub message: String,
}

/// Mutation-success envelope: a status plus a human-readable message.
pub fn status_message(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<StatusMessage>) {
    (
        status,
        Json(StatusMessage {
            status: "ok",
            message: message.into(),
        }),
    )
}
