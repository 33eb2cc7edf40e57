//! Environment-driven settings: provider, connection string, JWT material.

use crate::error::ConfigError;
use std::str::FromStr;

/// Relational backend selected at configuration time. Only PostgreSQL is
/// wired today; the identifier is still resolved through configuration so an
/// unknown provider fails loudly instead of defaulting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    Postgres,
}

impl Provider {
    /// Placeholder prefix for bound parameters ("$1", "$2", ...).
    pub fn param_prefix(&self) -> &'static str {
        "$"
    }

    pub fn as_str(&self) -> &'static str {
        "postgres"
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Provider::Postgres),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Signing material consumed by the token-issuance layer. The data core
/// loads it so one settings struct describes the whole deployment, but never
/// reads it.
#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub provider: Provider,
    pub database_url: String,
    pub bind_addr: String,
    pub jwt: Option<JwtSettings>,
}

impl Settings {
    /// Read settings from the environment (a `.env` file counts once dotenvy
    /// has run). Provider and connection string are required; blank values
    /// are treated as missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider_raw = env_nonblank("DATABASE_PROVIDER").ok_or(ConfigError::MissingProvider)?;
        let provider: Provider = provider_raw.parse()?;
        let database_url = env_nonblank("DATABASE_URL")
            .ok_or(ConfigError::MissingConnectionString(provider_raw))?;
        let bind_addr = env_nonblank("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".into());
        let jwt = match (
            env_nonblank("JWT_SECRET"),
            env_nonblank("JWT_ISSUER"),
            env_nonblank("JWT_AUDIENCE"),
        ) {
            (Some(secret), Some(issuer), Some(audience)) => Some(JwtSettings {
                secret,
                issuer,
                audience,
            }),
            _ => None,
        };
        Ok(Settings {
            provider,
            database_url,
            bind_addr,
            jwt,
        })
    }
}

fn env_nonblank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_names() {
        assert_eq!("postgres".parse::<Provider>().ok(), Some(Provider::Postgres));
        assert_eq!(
            "PostgreSQL".parse::<Provider>().ok(),
            Some(Provider::Postgres)
        );
    }

    #[test]
    fn provider_rejects_unknown_names() {
        let err = "oracle".parse::<Provider>().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedProvider(p) if p == "oracle"));
    }

    #[test]
    fn param_prefix_is_positional() {
        assert_eq!(Provider::Postgres.param_prefix(), "$");
    }
}
