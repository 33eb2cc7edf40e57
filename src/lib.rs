//! datagate: generic CRUD gateway over PostgreSQL for request-time table
//! names.
//!
//! Tables and columns are not known at compile time; every request names
//! them, the identifiers are validated, values are coerced against the
//! column types the database reports, and statements always bind values as
//! parameters.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;

pub use config::{Provider, Settings};
pub use db::DbSession;
pub use error::{AppError, ConfigError};
pub use response::{status_message, success_many};
pub use routes::{common_routes_with_ready, entity_routes};
pub use service::{EntityService, PasswordCheck};
pub use state::AppState;
