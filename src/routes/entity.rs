//! Entity CRUD routes. Every path is parameterized on project and table so
//! the same handlers serve any schema the database holds.

use crate::handlers::entity::{
    create, delete as delete_handler, get_by_key, list, raw_query, update, verify_password,
};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::{routing::get, routing::post, Router};

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:project/:table", get(list).post(create))
        .route("/:project/:table/verify-password", post(verify_password))
        .route("/:project/:table/query", post(raw_query))
        .route(
            "/:project/:table/:key/:value",
            get(get_by_key).put(update).delete(delete_handler),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .with_state(state)
}
