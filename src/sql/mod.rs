//! Safe SQL construction: validated identifiers, typed values, parameterized
//! statements.

pub mod builder;
pub mod coerce;
pub mod ident;
pub mod params;

pub use builder::Statement;
pub use coerce::{coerce_key_value, json_to_sql_value, KeyComparison};
pub use ident::Ident;
pub use params::{placeholder, BoundParameter, SqlValue};
