//! Validated SQL identifiers.
//!
//! Table, column, and key names arrive at request time as plain strings, so
//! every one of them passes through this allow-list before it may be
//! interpolated into statement text. Values never travel this path; they are
//! always bound as parameters.

use crate::error::AppError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

static IDENT_RE: OnceLock<Regex> = OnceLock::new();

fn ident_re() -> &'static Regex {
    IDENT_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static identifier pattern")
    })
}

/// A table or column name that passed the identifier allow-list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    pub fn new(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("identifier cannot be empty".into()));
        }
        if !ident_re().is_match(trimmed) {
            return Err(AppError::Validation(format!(
                "invalid identifier '{raw}': only letters, digits and underscore are allowed"
            )));
        }
        Ok(Ident(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quote for PostgreSQL. The allow-list excludes quote characters, so no
    /// escaping is needed.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
