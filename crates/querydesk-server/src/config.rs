use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Development defaults. Fine on a laptop, never in production.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];
const PLACEHOLDER_ADMIN_PASSWORD: &str = "admin123";
const PLACEHOLDER_STUDENT_PASSWORD: &str = "student123";

pub struct Config {
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub host: String,
    pub port: u16,
    pub admin_password: String,
    pub student_id: String,
    pub student_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            db_path: var_or("QUERYDESK_DB_PATH", "querydesk.db").into(),
            session_secret: secret_or("QUERYDESK_SESSION_SECRET", PLACEHOLDER_SECRETS[0]),
            session_ttl_hours: parse_or("QUERYDESK_SESSION_TTL_HOURS", "12")?,
            host: var_or("QUERYDESK_HOST", "0.0.0.0"),
            port: parse_or("QUERYDESK_PORT", "5000")?,
            admin_password: secret_or("QUERYDESK_ADMIN_PASSWORD", PLACEHOLDER_ADMIN_PASSWORD),
            student_id: var_or("QUERYDESK_STUDENT_ID", "student"),
            student_password: secret_or("QUERYDESK_STUDENT_PASSWORD", PLACEHOLDER_STUDENT_PASSWORD),
        };

        if config.session_ttl_hours <= 0 {
            anyhow::bail!("QUERYDESK_SESSION_TTL_HOURS must be positive");
        }

        config.warn_on_placeholders();
        Ok(config)
    }

    fn warn_on_placeholders(&self) {
        if PLACEHOLDER_SECRETS.contains(&self.session_secret.as_str()) {
            warn!("QUERYDESK_SESSION_SECRET is a placeholder; sessions can be forged. Development use only.");
        }
        if self.admin_password == PLACEHOLDER_ADMIN_PASSWORD {
            warn!("QUERYDESK_ADMIN_PASSWORD is the placeholder default. Development use only.");
        }
        if self.student_password == PLACEHOLDER_STUDENT_PASSWORD {
            warn!("Student login uses the placeholder credential. Development use only.");
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{} not set, using default: {}", key, default);
        default.to_string()
    })
}

/// Like [`var_or`] but never logs the value.
fn secret_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        info!("{} not set, using placeholder", key);
        default.to_string()
    })
}

fn parse_or<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = var_or(key, default);
    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("Invalid {} value '{}'", key, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_variables_fall_back_to_parsed_defaults() {
        let port: u16 = parse_or("QUERYDESK_TEST_UNSET_PORT", "5000").unwrap();
        assert_eq!(port, 5000);
        assert_eq!(var_or("QUERYDESK_TEST_UNSET_HOST", "127.0.0.1"), "127.0.0.1");
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = parse_or::<u16>("QUERYDESK_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("QUERYDESK_TEST_UNSET_PORT"));
    }
}
