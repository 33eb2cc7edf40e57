//! Password-field detection, hashing, and verification.
//!
//! Incoming bodies are scanned for password-like field names; the first
//! match is replaced with a salted bcrypt hash before it ever reaches the
//! statement builder. bcrypt runs on the blocking pool.

use crate::error::AppError;
use serde_json::{Map, Value};

/// Field-name tokens that mark a column as password-like, matched as
/// case-insensitive substrings.
const SECRET_TOKENS: &[&str] = &["password", "contrasena", "passw", "clave"];

/// bcrypt hashes start with `$2` (2a/2b/2y).
pub const HASH_MARKER: &str = "$2";

/// First field whose name matches a secret token, in body iteration order.
pub fn find_secret_field(body: &Map<String, Value>) -> Option<String> {
    body.keys()
        .find(|k| {
            let lower = k.to_ascii_lowercase();
            SECRET_TOKENS.iter().any(|t| lower.contains(t))
        })
        .cloned()
}

/// Replace the first password-like field with its bcrypt hash. Null and
/// empty values are left untouched.
pub async fn hash_secret_fields(body: &mut Map<String, Value>) -> Result<(), AppError> {
    let Some(field) = find_secret_field(body) else {
        return Ok(());
    };
    let plain = match body.get(&field) {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    if plain.is_empty() {
        return Ok(());
    }
    let hashed = hash_password(&plain).await?;
    body.insert(field, Value::String(hashed));
    Ok(())
}

pub async fn hash_password(plain: &str) -> Result<String, AppError> {
    let plain = plain.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(plain, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Verify a plaintext against a stored hash. The stored value must carry the
/// bcrypt marker; anything else means the row was written outside this
/// surface and verification cannot proceed.
pub async fn verify_password(plain: &str, stored_hash: &str) -> Result<bool, AppError> {
    if !stored_hash.starts_with(HASH_MARKER) {
        return Err(AppError::Internal(
            "stored password is not a bcrypt hash".into(),
        ));
    }
    let plain = plain.to_string();
    let stored = stored_hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password verification failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn finds_first_matching_field_in_order() {
        let b = body(json!({"email": "a@b.com", "user_password": "x", "clave": "y"}));
        assert_eq!(find_secret_field(&b).as_deref(), Some("user_password"));
    }

    #[test]
    fn matches_are_case_insensitive_substrings() {
        let b = body(json!({"Contrasena": "x"}));
        assert_eq!(find_secret_field(&b).as_deref(), Some("Contrasena"));
        let none = body(json!({"email": "a@b.com", "age": 3}));
        assert_eq!(find_secret_field(&none), None);
    }

    #[tokio::test]
    async fn hashing_replaces_plaintext_with_marked_hash() {
        let mut b = body(json!({"email": "a@b.com", "password": "123"}));
        hash_secret_fields(&mut b).await.expect("hash");
        let stored = b["password"].as_str().expect("string");
        assert_ne!(stored, "123");
        assert!(stored.starts_with(HASH_MARKER));
        // non-password fields are untouched
        assert_eq!(b["email"], json!("a@b.com"));
    }

    #[tokio::test]
    async fn empty_and_null_passwords_are_left_alone() {
        let mut b = body(json!({"password": ""}));
        hash_secret_fields(&mut b).await.expect("no-op");
        assert_eq!(b["password"], json!(""));

        let mut b = body(json!({"password": null}));
        hash_secret_fields(&mut b).await.expect("no-op");
        assert_eq!(b["password"], json!(null));
    }

    #[tokio::test]
    async fn verify_succeeds_only_for_the_original_plaintext() {
        let hash = hash_password("s3cret").await.expect("hash");
        assert!(verify_password("s3cret", &hash).await.expect("verify"));
        assert!(!verify_password("wrong", &hash).await.expect("verify"));
    }

    #[tokio::test]
    async fn verify_rejects_unmarked_stored_values() {
        let err = verify_password("x", "plaintext-in-db").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
